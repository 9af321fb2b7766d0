use panel_core::{update, AppState, Msg};

#[test]
fn out_of_phase_messages_are_noops() {
    let state = AppState::new();
    for msg in [
        Msg::DailyConfirmed,
        Msg::DailyCancelled,
        Msg::MergeExecuteClicked,
        Msg::MergeExecutionConfirmed,
        Msg::MergeReviewClosed,
        Msg::NotificationDismissed { id: 42 },
    ] {
        let (next, effects) = update(state.clone(), msg);
        assert_eq!(state, next);
        assert!(effects.is_empty());
    }
}

#[test]
fn dismissing_a_notice_marks_dirty() {
    let (mut state, _) = update(
        AppState::new(),
        Msg::QuerySubmitted {
            text: String::new(),
            online_search: false,
        },
    );
    let id = state.view().notices[0].id;
    assert!(state.consume_dirty());

    let (mut state, _) = update(state, Msg::NotificationDismissed { id });
    assert!(state.view().notices.is_empty());
    assert!(state.consume_dirty());

    let (mut state, _) = update(state, Msg::NotificationDismissed { id });
    assert!(!state.consume_dirty());
}
