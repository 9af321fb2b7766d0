use chrono::{Days, NaiveDate};

use crate::{DailyRunRequest, MergeProposal, ValidationError};

/// Days between the default window's start and today.
pub const DEFAULT_WINDOW_DAYS: u64 = 3;

/// `(today - 3 days, today)`.
pub fn default_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = today
        .checked_sub_days(Days::new(DEFAULT_WINDOW_DAYS))
        .unwrap_or(today);
    (start, today)
}

/// Editable plan shown on the daily-run review surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyDraft {
    pub research_plan: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DailyDraft {
    pub fn for_today(today: NaiveDate) -> Self {
        let (start_date, end_date) = default_window(today);
        Self {
            research_plan: String::new(),
            start_date,
            end_date,
        }
    }

    pub fn to_request(&self) -> Result<DailyRunRequest, ValidationError> {
        if self.end_date < self.start_date {
            return Err(ValidationError::InvertedDateWindow {
                start: self.start_date,
                end: self.end_date,
            });
        }
        let plan = self.research_plan.trim();
        Ok(DailyRunRequest {
            research_plan: (!plan.is_empty()).then(|| plan.to_string()),
            start_date: self.start_date,
            end_date: self.end_date,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DailyDraftEdit {
    ResearchPlan(String),
    StartDate(NaiveDate),
    EndDate(NaiveDate),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DailyPhase {
    #[default]
    Idle,
    Reviewing(DailyDraft),
    Running,
}

/// Propose, review, execute. Every non-idle phase after a successful
/// proposal keeps the full list so a failed execution can fall back to review.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MergePhase {
    #[default]
    Idle,
    Proposing,
    Reviewing(Vec<MergeProposal>),
    Confirming(Vec<MergeProposal>),
    Executing(Vec<MergeProposal>),
}

impl MergePhase {
    pub fn proposals(&self) -> &[MergeProposal] {
        match self {
            MergePhase::Reviewing(list)
            | MergePhase::Confirming(list)
            | MergePhase::Executing(list) => list,
            MergePhase::Idle | MergePhase::Proposing => &[],
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, MergePhase::Proposing | MergePhase::Executing(_))
    }
}

pub fn agreed_subset(proposals: &[MergeProposal]) -> Vec<MergeProposal> {
    proposals.iter().filter(|p| p.agreed).cloned().collect()
}

/// Listing of generated reports.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReportsState {
    pub names: Vec<String>,
    pub loading: bool,
    pub downloading: Option<String>,
}
