//! Panel core: data model, pure state machine and view-model helpers.
mod effect;
mod error;
mod model;
mod msg;
mod notify;
mod query;
mod settings;
mod state;
mod update;
mod view_model;
mod workflow;

pub use effect::Effect;
pub use error::{ApiError, PanelError, ValidationError};
pub use model::{
    is_plain_report_name, CategoryRef, CategoryTaxonomy, DailyRunRequest, DailyRunSummary,
    DomainEntry, GlobalSettings, MergeProposal, PdfStrategy, QualityLists, QueryAnswer,
    SettingsSnapshot, SettingsWrite, Source, StreamEvent, ARXIV_DOMAINS_KEY,
    CATEGORY_KEY_SEPARATOR, MODEL_NAME_KEY, PDF_STRATEGY_KEY, REPORT_AUTHOR_KEY,
};
pub use msg::Msg;
pub use notify::{Notice, NoticeLevel, Notifications};
pub use query::{QueryController, QueryOutcome, QuerySession, SessionId};
pub use settings::{
    join_domains, parse_tunable, split_domains, SettingsDraft, SettingsEdit, SettingsPhase,
    SettingsState, AUTHORS_FIELD,
};
pub use state::AppState;
pub use update::{update, NO_REDUNDANCY_NOTICE};
pub use view_model::{
    AppViewModel, DailyView, MergeStage, MergeView, QueryStatus, QueryView, SettingsView,
};
pub use workflow::{
    agreed_subset, default_window, DailyDraft, DailyDraftEdit, DailyPhase, MergePhase,
    ReportsState, DEFAULT_WINDOW_DAYS,
};
