use std::time::Duration;

use futures_util::StreamExt;
use panel_core::{
    ApiError, CategoryRef, CategoryTaxonomy, DailyRunRequest, DailyRunSummary, GlobalSettings,
    MergeProposal, QualityLists, StreamEvent,
};
use panel_logging::{panel_debug, panel_info};
use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::frame::FrameDecoder;
use crate::StreamEnd;

/// Reported when the query stream closes without a terminal record.
pub const PREMATURE_CLOSE: &str = "stream closed before a final answer";

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5002/";
pub const DEFAULT_API_PREFIX: &str = "/api";
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Backend origin; relative document links resolve against it.
    pub base_url: Url,
    /// Path prefix of every API endpoint.
    pub api_prefix: String,
    pub connect_timeout: Duration,
    /// Unset means requests (and streams) may take as long as they need.
    pub request_timeout: Option<Duration>,
}

impl ClientSettings {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|err| ApiError::Transport(format!("invalid base url {base_url}: {err}")))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: None,
        })
    }

    /// Absolute URL of an API endpoint such as `"settings/global"`.
    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let prefix = self.api_prefix.trim_matches('/');
        let path = path.trim_start_matches('/');
        let joined = if prefix.is_empty() {
            path.to_string()
        } else {
            format!("{prefix}/{path}")
        };
        self.base_url
            .join(&joined)
            .map_err(|err| ApiError::Transport(format!("invalid endpoint {joined}: {err}")))
    }

    pub fn document_base(&self) -> &Url {
        &self.base_url
    }
}

/// Receives decoded events of one query stream as they arrive.
pub trait QuerySink: Send + Sync {
    fn emit(&self, event: StreamEvent);
}

/// The backend, one method per endpoint.
#[async_trait::async_trait]
pub trait PanelApi: Send + Sync {
    /// Streams one query into `sink` until a terminal record, a transport
    /// failure, or cancellation.
    async fn stream_query(
        &self,
        query: &str,
        online_search: bool,
        sink: &dyn QuerySink,
        cancel: &CancellationToken,
    ) -> Result<StreamEnd, ApiError>;

    async fn run_daily_workflow(
        &self,
        request: &DailyRunRequest,
    ) -> Result<DailyRunSummary, ApiError>;
    async fn run_category_collection(&self) -> Result<String, ApiError>;
    async fn propose_merges(&self) -> Result<Vec<MergeProposal>, ApiError>;
    async fn execute_merges(&self, confirmed: &[MergeProposal]) -> Result<String, ApiError>;

    async fn list_reports(&self) -> Result<Vec<String>, ApiError>;
    async fn fetch_report(&self, name: &str) -> Result<Vec<u8>, ApiError>;

    async fn global_settings(&self) -> Result<GlobalSettings, ApiError>;
    async fn save_global_settings(&self, settings: &GlobalSettings) -> Result<(), ApiError>;
    async fn available_models(&self) -> Result<Vec<String>, ApiError>;
    async fn user_preferences(&self) -> Result<Vec<CategoryRef>, ApiError>;
    async fn save_user_preferences(&self, selected: &[CategoryRef]) -> Result<(), ApiError>;
    async fn categories(&self) -> Result<CategoryTaxonomy, ApiError>;
    async fn quality_lists(&self) -> Result<QualityLists, ApiError>;
    async fn save_quality_lists(&self, lists: &QualityLists) -> Result<(), ApiError>;
}

#[derive(Serialize)]
struct QueryBody<'a> {
    query_text: &'a str,
    online_search_enabled: bool,
}

#[derive(Deserialize)]
struct StatusMessage {
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct ProposalList {
    #[serde(default)]
    proposals: Vec<MergeProposal>,
}

#[derive(Serialize)]
struct ExecuteMergesBody<'a> {
    confirmed_merges: &'a [MergeProposal],
}

#[derive(Serialize, Deserialize)]
struct PreferencesBody {
    #[serde(default)]
    selected_categories: Vec<CategoryRef>,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct ReqwestApi {
    settings: ClientSettings,
    client: reqwest::Client,
}

impl ReqwestApi {
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder().connect_timeout(settings.connect_timeout);
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(map_reqwest_error)?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(map_reqwest_error)?;
        check_status(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.settings.endpoint(path)?;
        panel_debug!("GET {}", url);
        let response = self.send(self.client.get(url)).await?;
        decode_json(response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.settings.endpoint(path)?;
        panel_debug!("POST {}", url);
        let mut request = self.client.post(url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = self.send(request).await?;
        decode_json(response).await
    }

    async fn post_discarding<B>(&self, path: &str, body: &B) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let url = self.settings.endpoint(path)?;
        panel_debug!("POST {}", url);
        self.send(self.client.post(url).json(body)).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl PanelApi for ReqwestApi {
    async fn stream_query(
        &self,
        query: &str,
        online_search: bool,
        sink: &dyn QuerySink,
        cancel: &CancellationToken,
    ) -> Result<StreamEnd, ApiError> {
        let url = self.settings.endpoint("query")?;
        panel_info!("POST {} (online_search={})", url, online_search);
        let request = self.client.post(url).json(&QueryBody {
            query_text: query,
            online_search_enabled: online_search,
        });

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(StreamEnd::Cancelled),
            response = self.send(request) => response?,
        };

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(ToOwned::to_owned);
        let mut decoder = FrameDecoder::for_content_type(content_type.as_deref());
        let mut stream = response.bytes_stream();

        loop {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    panel_debug!("query stream cancelled");
                    return Ok(StreamEnd::Cancelled);
                }
                chunk = stream.next() => chunk,
            };
            match chunk {
                Some(Ok(bytes)) => {
                    for event in decoder.push(&bytes) {
                        sink.emit(event);
                    }
                    if decoder.is_terminated() {
                        return Ok(StreamEnd::Terminal);
                    }
                }
                Some(Err(err)) => return Err(map_reqwest_error(err)),
                None => break,
            }
        }

        decoder.finish();
        Err(ApiError::Transport(PREMATURE_CLOSE.to_string()))
    }

    async fn run_daily_workflow(
        &self,
        request: &DailyRunRequest,
    ) -> Result<DailyRunSummary, ApiError> {
        self.post_json("run/daily_workflow", Some(request)).await
    }

    async fn run_category_collection(&self) -> Result<String, ApiError> {
        let status: StatusMessage = self
            .post_json::<(), _>("run/category_collection", None)
            .await?;
        Ok(status.message)
    }

    async fn propose_merges(&self) -> Result<Vec<MergeProposal>, ApiError> {
        let list: ProposalList = self
            .post_json::<(), _>("categories/propose-merges", None)
            .await?;
        Ok(list.proposals)
    }

    async fn execute_merges(&self, confirmed: &[MergeProposal]) -> Result<String, ApiError> {
        let status: StatusMessage = self
            .post_json(
                "categories/execute-merges",
                Some(&ExecuteMergesBody {
                    confirmed_merges: confirmed,
                }),
            )
            .await?;
        Ok(status.message)
    }

    async fn list_reports(&self) -> Result<Vec<String>, ApiError> {
        self.get_json("reports").await
    }

    async fn fetch_report(&self, name: &str) -> Result<Vec<u8>, ApiError> {
        let mut url = self.settings.endpoint("reports")?;
        url.path_segments_mut()
            .map_err(|()| ApiError::Transport(format!("cannot address report {name}")))?
            .push(name);
        panel_debug!("GET {}", url);
        let response = self.send(self.client.get(url)).await?;
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        Ok(bytes.to_vec())
    }

    async fn global_settings(&self) -> Result<GlobalSettings, ApiError> {
        self.get_json("settings/global").await
    }

    async fn save_global_settings(&self, settings: &GlobalSettings) -> Result<(), ApiError> {
        self.post_discarding("settings/global", settings).await
    }

    async fn available_models(&self) -> Result<Vec<String>, ApiError> {
        self.get_json("settings/available-models").await
    }

    async fn user_preferences(&self) -> Result<Vec<CategoryRef>, ApiError> {
        let body: PreferencesBody = self.get_json("user/preferences").await?;
        Ok(body.selected_categories)
    }

    async fn save_user_preferences(&self, selected: &[CategoryRef]) -> Result<(), ApiError> {
        let body = PreferencesBody {
            selected_categories: selected.to_vec(),
        };
        self.post_discarding("user/preferences", &body).await
    }

    async fn categories(&self) -> Result<CategoryTaxonomy, ApiError> {
        self.get_json("categories").await
    }

    async fn quality_lists(&self) -> Result<QualityLists, ApiError> {
        self.get_json("quality-lists").await
    }

    async fn save_quality_lists(&self, lists: &QualityLists) -> Result<(), ApiError> {
        self.post_discarding("quality-lists", lists).await
    }
}

/// Passes success through; otherwise surfaces the backend's `detail` verbatim.
async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.bytes().await.unwrap_or_default();
    let detail = serde_json::from_slice::<ErrorBody>(&body)
        .ok()
        .and_then(|body| body.detail)
        .map(|detail| match detail {
            Value::String(text) => text,
            other => other.to_string(),
        })
        .unwrap_or_else(|| status.to_string());
    Err(ApiError::Server {
        status: status.as_u16(),
        detail,
    })
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&bytes).map_err(|err| ApiError::Decode(err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::Transport(format!("timed out: {err}"));
    }
    ApiError::Transport(err.to_string())
}
