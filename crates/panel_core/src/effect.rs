use crate::{DailyRunRequest, MergeProposal, SessionId, SettingsWrite};

/// Side effects requested by `update`; executed by the platform.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    StartQuery {
        session_id: SessionId,
        query: String,
        online_search: bool,
    },
    /// Abort the transport of a superseded session.
    CancelQuery { session_id: SessionId },
    RunDailyWorkflow(DailyRunRequest),
    RunCategoryCollection,
    ProposeMerges,
    ExecuteMerges { confirmed: Vec<MergeProposal> },
    ListReports,
    FetchReport { name: String },
    LoadCategories,
    LoadSettings,
    SaveSettings(SettingsWrite),
}
