use std::path::PathBuf;
use std::time::Duration;

use panel_core::{Effect, Msg};
use panel_engine::{AtomicFileWriter, EngineEvent, EngineHandle};
use panel_logging::{panel_info, panel_warn};

/// Hands effects to the engine and turns its events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
    reports: AtomicFileWriter,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, reports_dir: PathBuf) -> Self {
        Self {
            engine,
            reports: AtomicFileWriter::new(reports_dir),
        }
    }

    pub fn set_reports_dir(&mut self, dir: PathBuf) {
        self.reports = AtomicFileWriter::new(dir);
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            self.engine.execute(effect);
        }
    }

    /// Waits up to `timeout` for the next engine result.
    pub fn next_msg(&self, timeout: Duration) -> Option<Msg> {
        let event = self.engine.recv_timeout(timeout)?;
        Some(self.to_msg(event))
    }

    fn to_msg(&self, event: EngineEvent) -> Msg {
        match event {
            EngineEvent::Query { session_id, event } => Msg::QueryEvent { session_id, event },
            EngineEvent::QueryFailed { session_id, error } => Msg::QueryFailed { session_id, error },
            EngineEvent::DailyFinished(result) => Msg::DailyFinished(result),
            EngineEvent::CategoryCollectionFinished(result) => {
                Msg::CategoryCollectionFinished(result)
            }
            EngineEvent::MergesProposed(result) => Msg::MergeProposalsReceived(result),
            EngineEvent::MergesExecuted(result) => Msg::MergesExecuted(result),
            EngineEvent::ReportsListed(result) => Msg::ReportsListed(result),
            EngineEvent::ReportFetched { name, result } => {
                let result = match result {
                    Ok(bytes) => self.store_report(&name, &bytes),
                    Err(err) => Err(err.to_string()),
                };
                Msg::ReportSaved { name, result }
            }
            EngineEvent::CategoriesLoaded(result) => Msg::CategoriesLoaded(result),
            EngineEvent::SettingsLoaded(result) => Msg::SettingsLoaded(result),
            EngineEvent::SettingsSaved(result) => Msg::SettingsSaved(result),
        }
    }

    fn store_report(&self, name: &str, bytes: &[u8]) -> Result<String, String> {
        match self.reports.write(name, bytes) {
            Ok(path) => {
                panel_info!("saved report {} ({} bytes) to {:?}", name, bytes.len(), path);
                Ok(path.display().to_string())
            }
            Err(err) => {
                panel_warn!("failed to save report {} under {:?}: {}", name, self.reports.dir(), err);
                Err(err.to_string())
            }
        }
    }
}
