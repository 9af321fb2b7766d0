use std::sync::Once;

use panel_core::{
    update, ApiError, AppState, Effect, Msg, NoticeLevel, QueryAnswer, QueryStatus, Source,
    StreamEvent,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(panel_logging::initialize_for_tests);
}

fn submit(state: AppState, text: &str) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::QuerySubmitted {
            text: text.to_string(),
            online_search: false,
        },
    )
}

fn progress(message: &str) -> StreamEvent {
    StreamEvent::Progress {
        message: message.to_string(),
    }
}

#[test]
fn empty_query_is_rejected_locally() {
    init_logging();
    let (mut state, effects) = submit(AppState::new(), "   \n ");

    assert!(effects.is_empty());
    let view = state.view();
    assert!(view.query.is_none());
    assert_eq!(view.notices.len(), 1);
    assert_eq!(view.notices[0].level, NoticeLevel::Error);
    assert!(state.consume_dirty());
}

#[test]
fn submit_trims_and_starts_stream() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::QuerySubmitted {
            text: "  hi  ".to_string(),
            online_search: true,
        },
    );

    assert_eq!(
        effects,
        vec![Effect::StartQuery {
            session_id: 1,
            query: "hi".to_string(),
            online_search: true,
        }]
    );
    let view = state.view().query.expect("session");
    assert_eq!(view.status, QueryStatus::Pending);
    assert!(view.online_search);
}

#[test]
fn progress_then_final_clears_progress_log() {
    init_logging();
    let (state, _) = submit(AppState::new(), "hi");

    let (state, _) = update(
        state,
        Msg::QueryEvent {
            session_id: 1,
            event: progress("searching"),
        },
    );
    let view = state.view().query.expect("session");
    assert_eq!(view.progress, vec!["searching".to_string()]);
    assert_eq!(view.status, QueryStatus::Pending);

    let (state, _) = update(
        state,
        Msg::QueryEvent {
            session_id: 1,
            event: StreamEvent::Final(QueryAnswer {
                answer: "# Hi".to_string(),
                sources: Vec::new(),
            }),
        },
    );
    let view = state.view().query.expect("session");
    assert_eq!(view.status, QueryStatus::Answered);
    assert!(view.progress.is_empty());
    assert_eq!(
        view.answer,
        Some(QueryAnswer {
            answer: "# Hi".to_string(),
            sources: Vec::new(),
        })
    );
}

#[test]
fn nothing_is_applied_after_a_terminal_event() {
    init_logging();
    let (state, _) = submit(AppState::new(), "hi");
    let (state, _) = update(
        state,
        Msg::QueryEvent {
            session_id: 1,
            event: StreamEvent::Error {
                message: "model offline".to_string(),
            },
        },
    );
    let (state, _) = update(
        state,
        Msg::QueryEvent {
            session_id: 1,
            event: progress("late"),
        },
    );
    let (state, _) = update(
        state,
        Msg::QueryEvent {
            session_id: 1,
            event: StreamEvent::Final(QueryAnswer::default()),
        },
    );

    let view = state.view();
    let query = view.query.expect("session");
    assert_eq!(query.status, QueryStatus::Failed);
    assert_eq!(query.error.as_deref(), Some("model offline"));
    assert!(query.progress.is_empty());
    assert_eq!(view.notices.len(), 1);
    assert_eq!(view.notices[0].message, "model offline");
}

#[test]
fn transport_failure_is_a_session_error() {
    init_logging();
    let (state, _) = submit(AppState::new(), "hi");
    let (state, _) = update(
        state,
        Msg::QueryEvent {
            session_id: 1,
            event: progress("searching"),
        },
    );
    let (state, _) = update(
        state,
        Msg::QueryFailed {
            session_id: 1,
            error: ApiError::Server {
                status: 500,
                detail: "Internal Server Error".to_string(),
            },
        },
    );

    let view = state.view();
    let query = view.query.expect("session");
    assert_eq!(query.status, QueryStatus::Failed);
    assert_eq!(query.error.as_deref(), Some("Internal Server Error"));
    assert_eq!(query.progress, vec!["searching".to_string()]);
    assert_eq!(view.notices[0].level, NoticeLevel::Error);
}

#[test]
fn new_submit_supersedes_in_flight_session() {
    init_logging();
    let (state, _) = submit(AppState::new(), "first");
    let (state, effects) = submit(state, "second");

    assert_eq!(
        effects,
        vec![
            Effect::CancelQuery { session_id: 1 },
            Effect::StartQuery {
                session_id: 2,
                query: "second".to_string(),
                online_search: false,
            },
        ]
    );

    // Late events from the first session are discarded.
    let (state, _) = update(
        state,
        Msg::QueryEvent {
            session_id: 1,
            event: progress("stale"),
        },
    );
    let view = state.view().query.expect("session");
    assert_eq!(view.session_id, 2);
    assert_eq!(view.query, "second");
    assert!(view.progress.is_empty());
}

#[test]
fn finished_session_is_not_cancelled_on_resubmit() {
    init_logging();
    let (state, _) = submit(AppState::new(), "first");
    let (state, _) = update(
        state,
        Msg::QueryEvent {
            session_id: 1,
            event: StreamEvent::Final(QueryAnswer {
                answer: "done".to_string(),
                sources: vec![Source {
                    title: "Attention".to_string(),
                    arxiv_id: "1706.03762".to_string(),
                    pdf_url: Some("/papers/pdf/1706.03762".to_string()),
                    ..Source::default()
                }],
            }),
        },
    );
    let (_state, effects) = submit(state, "second");

    assert_eq!(
        effects,
        vec![Effect::StartQuery {
            session_id: 2,
            query: "second".to_string(),
            online_search: false,
        }]
    );
}
