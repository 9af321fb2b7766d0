use crate::notify::{NoticeLevel, Notifications};
use crate::view_model::{AppViewModel, DailyView, MergeStage, MergeView, QueryStatus, QueryView, SettingsView};
use crate::{
    CategoryTaxonomy, DailyPhase, MergePhase, QueryController, QueryOutcome, ReportsState,
    SettingsState,
};

/// All client state, owned explicitly and threaded through `update`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub(crate) query: QueryController,
    pub(crate) daily: DailyPhase,
    pub(crate) merges: MergePhase,
    pub(crate) collecting: bool,
    pub(crate) reports: ReportsState,
    pub(crate) categories: Option<CategoryTaxonomy>,
    pub(crate) categories_loading: bool,
    pub(crate) settings: SettingsState,
    pub(crate) notices: Notifications,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &QueryController {
        &self.query
    }

    pub fn settings(&self) -> &SettingsState {
        &self.settings
    }

    /// True while any network-backed action is outstanding.
    pub fn is_busy(&self) -> bool {
        self.query.in_flight().is_some()
            || matches!(self.daily, DailyPhase::Running)
            || self.merges.is_busy()
            || self.collecting
            || self.categories_loading
            || self.reports.loading
            || self.reports.downloading.is_some()
            || self.settings.phase != crate::SettingsPhase::Idle
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            query: self.query.session().map(|session| {
                let (status, answer, error) = match &session.outcome {
                    None => (QueryStatus::Pending, None, None),
                    Some(QueryOutcome::Answered(answer)) => {
                        (QueryStatus::Answered, Some(answer.clone()), None)
                    }
                    Some(QueryOutcome::Failed(message)) => {
                        (QueryStatus::Failed, None, Some(message.clone()))
                    }
                };
                QueryView {
                    session_id: session.id,
                    query: session.query.clone(),
                    online_search: session.online_search,
                    status,
                    progress: session.progress.clone(),
                    answer,
                    error,
                }
            }),
            daily: match &self.daily {
                DailyPhase::Idle => DailyView::Idle,
                DailyPhase::Reviewing(draft) => DailyView::Reviewing(draft.clone()),
                DailyPhase::Running => DailyView::Running,
            },
            merges: MergeView {
                stage: match &self.merges {
                    MergePhase::Idle => MergeStage::Idle,
                    MergePhase::Proposing => MergeStage::Proposing,
                    MergePhase::Reviewing(_) => MergeStage::Reviewing,
                    MergePhase::Confirming(_) => MergeStage::Confirming,
                    MergePhase::Executing(_) => MergeStage::Executing,
                },
                proposals: self.merges.proposals().to_vec(),
                agreed_count: self.merges.proposals().iter().filter(|p| p.agreed).count(),
            },
            collecting: self.collecting,
            reports: self.reports.names.clone(),
            reports_loading: self.reports.loading,
            categories: self
                .categories
                .as_ref()
                .map(CategoryTaxonomy::categories)
                .unwrap_or_default(),
            settings: SettingsView {
                phase: self.settings.phase,
                draft: self.settings.draft.clone(),
                available_models: self
                    .settings
                    .snapshot
                    .as_ref()
                    .map(|snapshot| snapshot.available_models.clone())
                    .unwrap_or_default(),
            },
            notices: self.notices.items().cloned().collect(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push(level, message);
        self.mark_dirty();
    }
}
