use crate::notify::Notice;
use crate::{CategoryRef, DailyDraft, MergeProposal, QueryAnswer, SessionId, SettingsDraft, SettingsPhase};

/// Immutable snapshot handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub query: Option<QueryView>,
    pub daily: DailyView,
    pub merges: MergeView,
    pub collecting: bool,
    pub reports: Vec<String>,
    pub reports_loading: bool,
    pub categories: Vec<CategoryRef>,
    pub settings: SettingsView,
    pub notices: Vec<Notice>,
    pub dirty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Pending,
    Answered,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryView {
    pub session_id: SessionId,
    pub query: String,
    pub online_search: bool,
    pub status: QueryStatus,
    pub progress: Vec<String>,
    pub answer: Option<QueryAnswer>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DailyView {
    #[default]
    Idle,
    Reviewing(DailyDraft),
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeStage {
    #[default]
    Idle,
    Proposing,
    Reviewing,
    Confirming,
    Executing,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MergeView {
    pub stage: MergeStage,
    pub proposals: Vec<MergeProposal>,
    pub agreed_count: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SettingsView {
    pub phase: SettingsPhase,
    pub draft: Option<SettingsDraft>,
    pub available_models: Vec<String>,
}
