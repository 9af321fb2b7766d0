use chrono::NaiveDate;
use panel_core::{
    default_window, update, ApiError, AppState, DailyDraft, DailyDraftEdit, DailyRunRequest,
    DailyRunSummary, DailyView, Effect, Msg, NoticeLevel,
};
use pretty_assertions::assert_eq;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn planned(today: NaiveDate) -> AppState {
    let (state, effects) = update(AppState::new(), Msg::DailyPlanRequested { today });
    assert!(effects.is_empty());
    state
}

#[test]
fn default_window_spans_three_days_back() {
    assert_eq!(default_window(date(2024, 3, 2)), (date(2024, 2, 28), date(2024, 3, 2)));
    assert_eq!(default_window(date(2025, 1, 1)), (date(2024, 12, 29), date(2025, 1, 1)));
}

#[test]
fn plan_opens_review_with_default_window() {
    let state = planned(date(2024, 5, 10));

    assert_eq!(
        state.view().daily,
        DailyView::Reviewing(DailyDraft {
            research_plan: String::new(),
            start_date: date(2024, 5, 7),
            end_date: date(2024, 5, 10),
        })
    );
}

#[test]
fn cancel_discards_draft_without_effects() {
    let state = planned(date(2024, 5, 10));
    let (state, _) = update(
        state,
        Msg::DailyDraftEdited(DailyDraftEdit::ResearchPlan("robots".to_string())),
    );
    let (state, effects) = update(state, Msg::DailyCancelled);

    assert!(effects.is_empty());
    assert_eq!(state.view().daily, DailyView::Idle);

    // A new plan starts from a fresh draft.
    let (state, _) = update(state, Msg::DailyPlanRequested { today: date(2024, 5, 10) });
    match state.view().daily {
        DailyView::Reviewing(draft) => assert!(draft.research_plan.is_empty()),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn confirm_sends_one_request_and_blocks_replanning() {
    let state = planned(date(2024, 5, 10));
    let (state, _) = update(
        state,
        Msg::DailyDraftEdited(DailyDraftEdit::ResearchPlan("  multimodal driving  ".to_string())),
    );
    let (state, effects) = update(state, Msg::DailyConfirmed);

    assert_eq!(
        effects,
        vec![Effect::RunDailyWorkflow(DailyRunRequest {
            research_plan: Some("multimodal driving".to_string()),
            start_date: date(2024, 5, 7),
            end_date: date(2024, 5, 10),
        })]
    );
    assert_eq!(state.view().daily, DailyView::Running);

    let (state, effects) = update(state, Msg::DailyPlanRequested { today: date(2024, 5, 11) });
    assert!(effects.is_empty());
    assert_eq!(state.view().daily, DailyView::Running);
}

#[test]
fn blank_plan_is_sent_as_null() {
    let state = planned(date(2024, 5, 10));
    let (_state, effects) = update(state, Msg::DailyConfirmed);

    match effects.as_slice() {
        [Effect::RunDailyWorkflow(request)] => assert_eq!(request.research_plan, None),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn inverted_window_is_rejected_locally() {
    let state = planned(date(2024, 5, 10));
    let (state, _) = update(
        state,
        Msg::DailyDraftEdited(DailyDraftEdit::StartDate(date(2024, 5, 12))),
    );
    let (state, effects) = update(state, Msg::DailyConfirmed);

    assert!(effects.is_empty());
    let view = state.view();
    assert!(matches!(view.daily, DailyView::Reviewing(_)));
    assert_eq!(view.notices.last().map(|n| n.level), Some(NoticeLevel::Error));
}

#[test]
fn success_refreshes_reports() {
    let state = planned(date(2024, 5, 10));
    let (state, _) = update(state, Msg::DailyConfirmed);
    let (state, effects) = update(
        state,
        Msg::DailyFinished(Ok(DailyRunSummary {
            message: "Done.".to_string(),
            papers_processed: 4,
            report_path: None,
        })),
    );

    assert_eq!(effects, vec![Effect::ListReports]);
    let view = state.view();
    assert_eq!(view.daily, DailyView::Idle);
    assert!(view.reports_loading);
    assert_eq!(
        view.notices.last().map(|n| n.message.as_str()),
        Some("Daily workflow processed 4 papers. Done.")
    );

    let (state, _) = update(
        state,
        Msg::ReportsListed(Ok(vec!["Daily_arXiv_Report_2024-05-10.pdf".to_string()])),
    );
    let view = state.view();
    assert!(!view.reports_loading);
    assert_eq!(view.reports, vec!["Daily_arXiv_Report_2024-05-10.pdf".to_string()]);
}

#[test]
fn failure_surfaces_detail_and_returns_to_idle() {
    let state = planned(date(2024, 5, 10));
    let (state, _) = update(state, Msg::DailyConfirmed);
    let (state, effects) = update(
        state,
        Msg::DailyFinished(Err(ApiError::Server {
            status: 422,
            detail: "end_date must not precede start_date".to_string(),
        })),
    );

    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.daily, DailyView::Idle);
    let notice = view.notices.last().expect("notice");
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.message.ends_with("end_date must not precede start_date"));
}

#[test]
fn category_collection_is_busy_guarded() {
    let (state, effects) = update(AppState::new(), Msg::CategoryCollectionRequested);
    assert_eq!(effects, vec![Effect::RunCategoryCollection]);
    let (state, effects) = update(state, Msg::CategoryCollectionRequested);
    assert!(effects.is_empty());
    assert!(state.view().collecting);

    let (state, _) = update(
        state,
        Msg::CategoryCollectionFinished(Ok("12 categories added".to_string())),
    );
    let view = state.view();
    assert!(!view.collecting);
    assert_eq!(view.notices.last().map(|n| n.level), Some(NoticeLevel::Success));
}

#[test]
fn unsafe_report_name_never_reaches_network() {
    let (state, effects) = update(
        AppState::new(),
        Msg::ReportDownloadRequested {
            name: "../secrets.pdf".to_string(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.view().notices.last().map(|n| n.level), Some(NoticeLevel::Error));

    let (state, effects) = update(
        state,
        Msg::ReportDownloadRequested {
            name: "report.pdf".to_string(),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::FetchReport {
            name: "report.pdf".to_string()
        }]
    );
    let (state, _) = update(
        state,
        Msg::ReportSaved {
            name: "report.pdf".to_string(),
            result: Ok("reports/report.pdf".to_string()),
        },
    );
    assert_eq!(
        state.view().notices.last().map(|n| n.message.as_str()),
        Some("Saved report.pdf to reports/report.pdf")
    );
}
