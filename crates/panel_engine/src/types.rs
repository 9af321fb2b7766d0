use std::io;

use panel_core::{
    ApiError, CategoryTaxonomy, DailyRunSummary, MergeProposal, PanelError, SessionId,
    SettingsSnapshot, StreamEvent,
};
use thiserror::Error;

/// Results reported by the engine, one per executed effect (a query reports
/// one per decoded event).
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Query {
        session_id: SessionId,
        event: StreamEvent,
    },
    QueryFailed {
        session_id: SessionId,
        error: ApiError,
    },
    DailyFinished(Result<DailyRunSummary, ApiError>),
    CategoryCollectionFinished(Result<String, ApiError>),
    MergesProposed(Result<Vec<MergeProposal>, ApiError>),
    MergesExecuted(Result<String, ApiError>),
    ReportsListed(Result<Vec<String>, ApiError>),
    ReportFetched {
        name: String,
        result: Result<Vec<u8>, ApiError>,
    },
    CategoriesLoaded(Result<CategoryTaxonomy, ApiError>),
    SettingsLoaded(Result<SettingsSnapshot, PanelError>),
    SettingsSaved(Result<(), PanelError>),
}

/// How a query stream ended without a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// A `final` or `error` record arrived.
    Terminal,
    /// The session was superseded and the transport dropped.
    Cancelled,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start runtime: {0}")]
    Runtime(#[from] io::Error),
    #[error(transparent)]
    Api(#[from] ApiError),
}
