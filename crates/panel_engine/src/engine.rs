use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use panel_core::{ApiError, Effect, SessionId, StreamEvent};
use panel_logging::{panel_debug, panel_info, panel_warn};
use tokio_util::sync::CancellationToken;

use crate::client::{ClientSettings, PanelApi, QuerySink, ReqwestApi};
use crate::sync::{load_settings, save_settings};
use crate::{EngineError, EngineEvent, StreamEnd};

enum EngineCommand {
    Execute(Effect),
}

type QueryTokens = Arc<Mutex<HashMap<SessionId, CancellationToken>>>;

/// Runs effects on a background tokio runtime and reports results as events.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: ClientSettings) -> Result<Self, EngineError> {
        let api = ReqwestApi::new(settings)?;
        Self::with_api(Arc::new(api))
    }

    pub fn with_api(api: Arc<dyn PanelApi>) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Runtime::new()?;
        let tokens: QueryTokens = Arc::default();

        thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Execute(Effect::CancelQuery { session_id }) => {
                        cancel_query(&tokens, session_id);
                    }
                    EngineCommand::Execute(Effect::StartQuery {
                        session_id,
                        query,
                        online_search,
                    }) => {
                        let token = register_query(&tokens, session_id);
                        let api = api.clone();
                        let tokens = tokens.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            run_query(api.as_ref(), session_id, &query, online_search, &token, event_tx)
                                .await;
                            if let Ok(mut map) = tokens.lock() {
                                map.remove(&session_id);
                            }
                        });
                    }
                    EngineCommand::Execute(effect) => {
                        let api = api.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            if let Some(event) = handle_effect(api.as_ref(), effect).await {
                                let _ = event_tx.send(event);
                            }
                        });
                    }
                }
            }
            panel_debug!("engine command channel closed");
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn execute(&self, effect: Effect) {
        let _ = self.cmd_tx.send(EngineCommand::Execute(effect));
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

/// A new session supersedes every other in-flight one.
fn register_query(tokens: &QueryTokens, session_id: SessionId) -> CancellationToken {
    let token = CancellationToken::new();
    if let Ok(mut map) = tokens.lock() {
        for (old, previous) in map.drain() {
            panel_debug!("superseding query session {}", old);
            previous.cancel();
        }
        map.insert(session_id, token.clone());
    }
    token
}

fn cancel_query(tokens: &QueryTokens, session_id: SessionId) {
    if let Ok(mut map) = tokens.lock() {
        if let Some(token) = map.remove(&session_id) {
            panel_debug!("cancelling query session {}", session_id);
            token.cancel();
        }
    }
}

struct ChannelQuerySink {
    session_id: SessionId,
    tx: mpsc::Sender<EngineEvent>,
}

impl QuerySink for ChannelQuerySink {
    fn emit(&self, event: StreamEvent) {
        let _ = self.tx.send(EngineEvent::Query {
            session_id: self.session_id,
            event,
        });
    }
}

async fn run_query(
    api: &dyn PanelApi,
    session_id: SessionId,
    query: &str,
    online_search: bool,
    cancel: &CancellationToken,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let sink = ChannelQuerySink {
        session_id,
        tx: event_tx.clone(),
    };
    match api.stream_query(query, online_search, &sink, cancel).await {
        Ok(StreamEnd::Terminal) => panel_info!("query session {} finished", session_id),
        Ok(StreamEnd::Cancelled) => panel_info!("query session {} superseded", session_id),
        Err(error) => {
            panel_warn!("query session {} failed: {}", session_id, error);
            let _ = event_tx.send(EngineEvent::QueryFailed { session_id, error });
        }
    }
}

async fn handle_effect(api: &dyn PanelApi, effect: Effect) -> Option<EngineEvent> {
    let event = match effect {
        Effect::RunDailyWorkflow(request) => {
            panel_info!(
                "running daily workflow {}..{}",
                request.start_date,
                request.end_date
            );
            EngineEvent::DailyFinished(api.run_daily_workflow(&request).await)
        }
        Effect::RunCategoryCollection => {
            panel_info!("running category collection");
            EngineEvent::CategoryCollectionFinished(api.run_category_collection().await)
        }
        Effect::ProposeMerges => EngineEvent::MergesProposed(api.propose_merges().await),
        Effect::ExecuteMerges { confirmed } => {
            panel_info!("executing {} merges", confirmed.len());
            EngineEvent::MergesExecuted(api.execute_merges(&confirmed).await)
        }
        Effect::ListReports => EngineEvent::ReportsListed(api.list_reports().await),
        Effect::FetchReport { name } => {
            let result = api.fetch_report(&name).await;
            EngineEvent::ReportFetched { name, result }
        }
        Effect::LoadCategories => EngineEvent::CategoriesLoaded(api.categories().await),
        Effect::LoadSettings => EngineEvent::SettingsLoaded(load_settings(api).await),
        Effect::SaveSettings(write) => EngineEvent::SettingsSaved(save_settings(api, &write).await),
        Effect::StartQuery { session_id, .. } => {
            // Queries run through `run_query`; reaching here is a wiring bug.
            EngineEvent::QueryFailed {
                session_id,
                error: ApiError::Transport("query dispatched without a stream".to_string()),
            }
        }
        Effect::CancelQuery { .. } => return None,
    };
    Some(event)
}
