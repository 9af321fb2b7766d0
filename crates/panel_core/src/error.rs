use chrono::NaiveDate;
use thiserror::Error;

/// Failure of a single request against the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Connection refused, dropped, or the body never arrived.
    #[error("request failed: {0}")]
    Transport(String),
    /// Non-success status. `detail` is the backend's own message when it sent one.
    #[error("{detail}")]
    Server { status: u16, detail: String },
    /// The body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Problems caught before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("query must not be empty")]
    EmptyQuery,
    #[error("select at least one merge proposal")]
    EmptyMergeSelection,
    #[error("end date {end} is before start date {start}")]
    InvertedDateWindow { start: NaiveDate, end: NaiveDate },
    #[error("field `{field}` is malformed: {message}")]
    MalformedField { field: String, message: String },
    #[error("report name `{0}` is not a plain file name")]
    UnsafeReportName(String),
    #[error("no settings loaded")]
    SettingsNotLoaded,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PanelError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Api(#[from] ApiError),
    /// One member of an all-or-nothing request group failed.
    #[error("{resource}: {source}")]
    Group {
        resource: &'static str,
        #[source]
        source: ApiError,
    },
}

impl PanelError {
    pub fn group(resource: &'static str) -> impl FnOnce(ApiError) -> PanelError {
        move |source| PanelError::Group { resource, source }
    }
}
