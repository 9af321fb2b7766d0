use chrono::NaiveDate;

use crate::{
    ApiError, CategoryTaxonomy, DailyDraftEdit, DailyRunSummary, MergeProposal, PanelError,
    SessionId, SettingsEdit, SettingsSnapshot, StreamEvent,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User submitted a query.
    QuerySubmitted { text: String, online_search: bool },
    /// A decoded stream event for a query session.
    QueryEvent {
        session_id: SessionId,
        event: StreamEvent,
    },
    /// Transport failure or premature close of a query stream.
    QueryFailed {
        session_id: SessionId,
        error: ApiError,
    },

    /// User asked to plan a daily run; `today` is the local calendar date.
    DailyPlanRequested { today: NaiveDate },
    DailyDraftEdited(DailyDraftEdit),
    DailyConfirmed,
    DailyCancelled,
    DailyFinished(Result<DailyRunSummary, ApiError>),

    CategoryCollectionRequested,
    CategoryCollectionFinished(Result<String, ApiError>),

    MergeProposalsRequested,
    MergeProposalsReceived(Result<Vec<MergeProposal>, ApiError>),
    /// User flipped the agreement checkbox of one proposal.
    MergeAgreementToggled { index: usize },
    /// User asked to execute the agreed proposals; asks for confirmation first.
    MergeExecuteClicked,
    MergeExecutionConfirmed,
    MergeExecutionDeclined,
    MergeReviewClosed,
    MergesExecuted(Result<String, ApiError>),

    ReportsRefreshRequested,
    ReportsListed(Result<Vec<String>, ApiError>),
    ReportDownloadRequested { name: String },
    /// The platform stored (or failed to store) a fetched report.
    ReportSaved {
        name: String,
        result: Result<String, String>,
    },

    CategoriesLoaded(Result<CategoryTaxonomy, ApiError>),

    SettingsLoadRequested,
    SettingsLoaded(Result<SettingsSnapshot, PanelError>),
    SettingsEdited(SettingsEdit),
    SettingsSaveRequested,
    SettingsSaved(Result<(), PanelError>),

    NotificationDismissed { id: u64 },
}
