use crate::notify::NoticeLevel;
use crate::query::Applied;
use crate::workflow::agreed_subset;
use crate::{
    is_plain_report_name, AppState, DailyDraft, DailyDraftEdit, DailyPhase, Effect, MergePhase,
    Msg, SettingsDraft, SettingsPhase, ValidationError,
};

/// Shown when proposing merges finds nothing to merge.
pub const NO_REDUNDANCY_NOTICE: &str = "No redundant categories found.";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::QuerySubmitted {
            text,
            online_search,
        } => submit_query(&mut state, text, online_search),
        Msg::QueryEvent { session_id, event } => {
            let Some(session) = state.query.current_mut(session_id) else {
                // Stale session; its events are discarded.
                return (state, Vec::new());
            };
            match session.apply(event) {
                Applied::Ignored => {}
                Applied::Progress | Applied::Answered => state.mark_dirty(),
                Applied::Failed(message) => state.notify(NoticeLevel::Error, message),
            }
            Vec::new()
        }
        Msg::QueryFailed { session_id, error } => {
            let Some(session) = state.query.current_mut(session_id) else {
                return (state, Vec::new());
            };
            if let Applied::Failed(message) = session.apply(crate::StreamEvent::Error {
                message: error.to_string(),
            }) {
                state.notify(NoticeLevel::Error, message);
            }
            Vec::new()
        }

        Msg::DailyPlanRequested { today } => {
            if state.daily == DailyPhase::Idle {
                state.daily = DailyPhase::Reviewing(DailyDraft::for_today(today));
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::DailyDraftEdited(edit) => {
            if let DailyPhase::Reviewing(draft) = &mut state.daily {
                match edit {
                    DailyDraftEdit::ResearchPlan(plan) => draft.research_plan = plan,
                    DailyDraftEdit::StartDate(date) => draft.start_date = date,
                    DailyDraftEdit::EndDate(date) => draft.end_date = date,
                }
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::DailyConfirmed => confirm_daily(&mut state),
        Msg::DailyCancelled => {
            if matches!(state.daily, DailyPhase::Reviewing(_)) {
                state.daily = DailyPhase::Idle;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::DailyFinished(result) => {
            if state.daily != DailyPhase::Running {
                return (state, Vec::new());
            }
            state.daily = DailyPhase::Idle;
            match result {
                Ok(summary) => {
                    let message = match summary.message.as_str() {
                        "" => format!("Daily workflow processed {} papers.", summary.papers_processed),
                        detail => format!(
                            "Daily workflow processed {} papers. {detail}",
                            summary.papers_processed
                        ),
                    };
                    state.notify(NoticeLevel::Success, message);
                    state.reports.loading = true;
                    vec![Effect::ListReports]
                }
                Err(err) => {
                    state.notify(NoticeLevel::Error, format!("Daily workflow failed: {err}"));
                    Vec::new()
                }
            }
        }

        Msg::CategoryCollectionRequested => {
            if state.collecting {
                return (state, Vec::new());
            }
            state.collecting = true;
            state.mark_dirty();
            vec![Effect::RunCategoryCollection]
        }
        Msg::CategoryCollectionFinished(result) => {
            if !state.collecting {
                return (state, Vec::new());
            }
            state.collecting = false;
            match result {
                Ok(message) => state.notify(NoticeLevel::Success, message),
                Err(err) => {
                    state.notify(NoticeLevel::Error, format!("Category collection failed: {err}"))
                }
            }
            Vec::new()
        }

        Msg::MergeProposalsRequested => {
            if state.merges != MergePhase::Idle {
                return (state, Vec::new());
            }
            state.merges = MergePhase::Proposing;
            state.mark_dirty();
            vec![Effect::ProposeMerges]
        }
        Msg::MergeProposalsReceived(result) => {
            if state.merges != MergePhase::Proposing {
                return (state, Vec::new());
            }
            match result {
                Ok(proposals) if proposals.is_empty() => {
                    state.merges = MergePhase::Idle;
                    state.notify(NoticeLevel::Info, NO_REDUNDANCY_NOTICE);
                }
                Ok(mut proposals) => {
                    for proposal in &mut proposals {
                        proposal.agreed = true;
                    }
                    state.merges = MergePhase::Reviewing(proposals);
                    state.mark_dirty();
                }
                Err(err) => {
                    state.merges = MergePhase::Idle;
                    state.notify(NoticeLevel::Error, format!("Could not propose merges: {err}"));
                }
            }
            Vec::new()
        }
        Msg::MergeAgreementToggled { index } => {
            if let MergePhase::Reviewing(proposals) = &mut state.merges {
                if let Some(proposal) = proposals.get_mut(index) {
                    proposal.agreed = !proposal.agreed;
                    state.mark_dirty();
                }
            }
            Vec::new()
        }
        Msg::MergeExecuteClicked => {
            let MergePhase::Reviewing(proposals) = &state.merges else {
                return (state, Vec::new());
            };
            if proposals.iter().any(|p| p.agreed) {
                let proposals = proposals.clone();
                state.merges = MergePhase::Confirming(proposals);
                state.mark_dirty();
            } else {
                state.notify(
                    NoticeLevel::Error,
                    ValidationError::EmptyMergeSelection.to_string(),
                );
            }
            Vec::new()
        }
        Msg::MergeExecutionConfirmed => {
            let MergePhase::Confirming(proposals) = &mut state.merges else {
                return (state, Vec::new());
            };
            let proposals = std::mem::take(proposals);
            let confirmed = agreed_subset(&proposals);
            state.merges = MergePhase::Executing(proposals);
            state.mark_dirty();
            vec![Effect::ExecuteMerges { confirmed }]
        }
        Msg::MergeExecutionDeclined => {
            if let MergePhase::Confirming(proposals) = &mut state.merges {
                let proposals = std::mem::take(proposals);
                state.merges = MergePhase::Reviewing(proposals);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::MergeReviewClosed => {
            if matches!(state.merges, MergePhase::Reviewing(_)) {
                state.merges = MergePhase::Idle;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::MergesExecuted(result) => {
            let MergePhase::Executing(proposals) = &mut state.merges else {
                return (state, Vec::new());
            };
            let proposals = std::mem::take(proposals);
            state.merges = MergePhase::Idle;
            match result {
                Ok(message) => {
                    state.notify(NoticeLevel::Success, message);
                    state.categories_loading = true;
                    let mut effects = vec![Effect::LoadCategories];
                    // The backend realigns saved preferences to the merged taxonomy.
                    if state.settings.snapshot.take().is_some() {
                        state.settings.draft = None;
                        if state.settings.phase == SettingsPhase::Idle {
                            state.settings.phase = SettingsPhase::Loading;
                            effects.push(Effect::LoadSettings);
                        }
                    }
                    effects
                }
                Err(err) => {
                    // Keep the review open so the user can retry without re-fetching.
                    state.merges = MergePhase::Reviewing(proposals);
                    state.notify(NoticeLevel::Error, format!("Merge execution failed: {err}"));
                    Vec::new()
                }
            }
        }

        Msg::ReportsRefreshRequested => {
            if state.reports.loading {
                return (state, Vec::new());
            }
            state.reports.loading = true;
            state.mark_dirty();
            vec![Effect::ListReports]
        }
        Msg::ReportsListed(result) => {
            state.reports.loading = false;
            match result {
                Ok(names) => {
                    state.reports.names = names;
                    state.mark_dirty();
                }
                Err(err) => {
                    state.notify(NoticeLevel::Error, format!("Could not list reports: {err}"))
                }
            }
            Vec::new()
        }
        Msg::ReportDownloadRequested { name } => {
            if state.reports.downloading.is_some() {
                return (state, Vec::new());
            }
            if !is_plain_report_name(&name) {
                state.notify(
                    NoticeLevel::Error,
                    ValidationError::UnsafeReportName(name).to_string(),
                );
                return (state, Vec::new());
            }
            state.reports.downloading = Some(name.clone());
            state.mark_dirty();
            vec![Effect::FetchReport { name }]
        }
        Msg::ReportSaved { name, result } => {
            if state.reports.downloading.as_deref() != Some(name.as_str()) {
                return (state, Vec::new());
            }
            state.reports.downloading = None;
            match result {
                Ok(path) => state.notify(NoticeLevel::Success, format!("Saved {name} to {path}")),
                Err(err) => {
                    state.notify(NoticeLevel::Error, format!("Could not save {name}: {err}"))
                }
            }
            Vec::new()
        }

        Msg::CategoriesLoaded(result) => {
            state.categories_loading = false;
            match result {
                Ok(taxonomy) => {
                    if let Some(snapshot) = state.settings.snapshot.as_mut() {
                        snapshot.taxonomy = taxonomy.clone();
                    }
                    state.categories = Some(taxonomy);
                    state.mark_dirty();
                }
                Err(err) => {
                    state.notify(NoticeLevel::Error, format!("Could not load categories: {err}"))
                }
            }
            Vec::new()
        }

        Msg::SettingsLoadRequested => {
            if state.settings.phase != SettingsPhase::Idle {
                return (state, Vec::new());
            }
            state.settings.phase = SettingsPhase::Loading;
            state.mark_dirty();
            vec![Effect::LoadSettings]
        }
        Msg::SettingsLoaded(result) => {
            if state.settings.phase != SettingsPhase::Loading {
                return (state, Vec::new());
            }
            state.settings.phase = SettingsPhase::Idle;
            match result {
                Ok(snapshot) => {
                    state.settings.draft = Some(SettingsDraft::from_snapshot(&snapshot));
                    state.categories = Some(snapshot.taxonomy.clone());
                    state.settings.snapshot = Some(snapshot);
                    state.mark_dirty();
                }
                Err(err) => {
                    state.notify(NoticeLevel::Error, format!("Could not load settings: {err}"))
                }
            }
            Vec::new()
        }
        Msg::SettingsEdited(edit) => {
            let Some(draft) = state.settings.draft.as_mut() else {
                return (state, Vec::new());
            };
            match draft.apply(edit) {
                Ok(()) => state.mark_dirty(),
                Err(err) => state.notify(NoticeLevel::Error, err.to_string()),
            }
            Vec::new()
        }
        Msg::SettingsSaveRequested => save_settings(&mut state),
        Msg::SettingsSaved(result) => {
            if state.settings.phase != SettingsPhase::Saving {
                return (state, Vec::new());
            }
            match result {
                Ok(()) => {
                    state.settings.commit_save();
                    state.notify(NoticeLevel::Success, "Settings saved.");
                }
                Err(err) => {
                    state.settings.abort_save();
                    state.notify(NoticeLevel::Error, format!("Could not save settings: {err}"));
                }
            }
            Vec::new()
        }

        Msg::NotificationDismissed { id } => {
            if state.notices.dismiss(id) {
                state.mark_dirty();
            }
            Vec::new()
        }
    };

    (state, effects)
}

fn submit_query(state: &mut AppState, text: String, online_search: bool) -> Vec<Effect> {
    let query = text.trim();
    if query.is_empty() {
        state.notify(NoticeLevel::Error, ValidationError::EmptyQuery.to_string());
        return Vec::new();
    }

    let (session_id, superseded) = state.query.begin(query.to_string(), online_search);
    state.mark_dirty();

    let mut effects = Vec::with_capacity(2);
    if let Some(old) = superseded {
        effects.push(Effect::CancelQuery { session_id: old });
    }
    effects.push(Effect::StartQuery {
        session_id,
        query: query.to_string(),
        online_search,
    });
    effects
}

fn confirm_daily(state: &mut AppState) -> Vec<Effect> {
    let DailyPhase::Reviewing(draft) = &state.daily else {
        return Vec::new();
    };
    match draft.to_request() {
        Ok(request) => {
            state.daily = DailyPhase::Running;
            state.mark_dirty();
            vec![Effect::RunDailyWorkflow(request)]
        }
        Err(err) => {
            state.notify(NoticeLevel::Error, err.to_string());
            Vec::new()
        }
    }
}

fn save_settings(state: &mut AppState) -> Vec<Effect> {
    if state.settings.phase != SettingsPhase::Idle {
        return Vec::new();
    }
    let Some(draft) = state.settings.draft.as_ref() else {
        state.notify(
            NoticeLevel::Error,
            ValidationError::SettingsNotLoaded.to_string(),
        );
        return Vec::new();
    };
    match draft.compose() {
        Ok(write) => {
            state.settings.begin_save(write.clone());
            state.mark_dirty();
            vec![Effect::SaveSettings(write)]
        }
        Err(err) => {
            state.notify(NoticeLevel::Error, err.to_string());
            Vec::new()
        }
    }
}
