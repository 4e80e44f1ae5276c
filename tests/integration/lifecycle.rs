use recgate::RecError;
use recgate::host::DocumentId;
use recgate::suggestions::{
    Command, Dispatch, FetchDisposition, HostEvent, SelectionOrigin, SessionState, TriggerType,
};
use recgate::test_utils::{CoordinatorHarness, ScriptedFetcher};

use crate::helpers::{DOC, expect_fetch, focus, keystroke, manual};

fn displayed(harness: &mut CoordinatorHarness, request_id: &str) {
    let request = expect_fetch(harness.coordinator.dispatch(manual(DOC, 1)));
    let disposition = harness.coordinator.complete_fetch(
        request.ticket,
        Ok(ScriptedFetcher::response(request_id, &["one", "two"])),
    );
    assert_eq!(disposition, FetchDisposition::Displayed { candidates: 2 });
}

#[test]
fn test_supersede_records_old_session_before_new_one_opens() {
    let mut harness = CoordinatorHarness::consented();
    displayed(&mut harness, "req-1");
    let first_id = harness.coordinator.current_session().map(|s| s.id);

    let second = expect_fetch(harness.coordinator.dispatch(manual(DOC, 2)));

    let records = harness.sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(Some(records[0].session_id), first_id.map(|id| id.0));
    assert_eq!(records[0].outcome, "superseded");
    assert_eq!(records[0].request_id, "req-1");

    let current = harness.coordinator.current_session().unwrap();
    assert_eq!(current.id, second.ticket.session);
    assert_eq!(current.state, SessionState::Requested);
    assert!(second.ticket.session > first_id.unwrap());
}

#[test]
fn test_only_latest_of_interleaved_fetches_displays() {
    let mut harness = CoordinatorHarness::consented();
    harness.coordinator.dispatch(focus(DOC));

    let requests: Vec<_> = ["a", "b", "c"]
        .into_iter()
        .map(|text| expect_fetch(harness.coordinator.dispatch(keystroke(DOC, "python", text))))
        .collect();

    // Responses arrive in reverse order.
    let dispositions: Vec<_> = requests
        .iter()
        .rev()
        .enumerate()
        .map(|(n, request)| {
            harness.coordinator.complete_fetch(
                request.ticket,
                Ok(ScriptedFetcher::response(&format!("req-{n}"), &["x"])),
            )
        })
        .collect();

    assert_eq!(
        dispositions,
        vec![
            FetchDisposition::Displayed { candidates: 1 },
            FetchDisposition::Stale,
            FetchDisposition::Stale,
        ]
    );
    assert_eq!(harness.ui.log().rendered, vec!["req-0".to_string()]);
    let outcomes: Vec<_> = harness.sink.records().into_iter().map(|r| r.outcome).collect();
    assert_eq!(outcomes, ["superseded", "superseded"]);
}

#[test]
fn test_each_rejection_signal_resolves_displayed_session() {
    let signals = [
        HostEvent::DocumentSaved {
            document: DocumentId::new(DOC),
        },
        HostEvent::VisibleEditorsChanged,
        HostEvent::ActiveEditorChanged { document: None },
        HostEvent::SelectionChanged {
            origin: SelectionOrigin::Pointer,
        },
        HostEvent::DocumentClosed {
            document: DocumentId::new(DOC),
        },
    ];

    for signal in signals {
        let mut harness = CoordinatorHarness::consented();
        displayed(&mut harness, "req-s");
        let kind = signal.kind();

        let dispatch = harness.coordinator.dispatch(signal);

        assert!(
            matches!(dispatch, Dispatch::Resolved(ref record) if record.decision_index == -1),
            "{kind} should reject, got {dispatch:?}"
        );
        assert!(harness.coordinator.current_session().is_none(), "{kind}");
        assert_eq!(harness.sink.records().len(), 1, "{kind}");
    }
}

#[test]
fn test_duplicate_completion_leaves_displayed_session_alone() {
    let mut harness = CoordinatorHarness::consented();
    let request = expect_fetch(harness.coordinator.dispatch(manual(DOC, 1)));
    harness.coordinator.complete_fetch(
        request.ticket,
        Ok(ScriptedFetcher::response("req-d", &["one", "two"])),
    );

    let late_success = harness.coordinator.complete_fetch(
        request.ticket,
        Ok(ScriptedFetcher::response("req-d", &["three"])),
    );
    let late_failure = harness.coordinator.complete_fetch(
        request.ticket,
        Err(RecError::Collaborator("late".to_string())),
    );

    assert_eq!(late_success, FetchDisposition::Stale);
    assert_eq!(late_failure, FetchDisposition::Stale);
    let session = harness.coordinator.current_session().unwrap();
    assert_eq!(session.state, SessionState::Displayed);
    assert_eq!(session.candidates, ["one", "two"]);
    assert!(harness.sink.records().is_empty());
}

#[test]
fn test_keyboard_selection_and_foreign_close_keep_session() {
    let mut harness = CoordinatorHarness::consented();
    displayed(&mut harness, "req-k");

    for event in [
        HostEvent::SelectionChanged {
            origin: SelectionOrigin::Keyboard,
        },
        HostEvent::SelectionChanged {
            origin: SelectionOrigin::Command,
        },
        HostEvent::DocumentClosed {
            document: DocumentId::new("file:///elsewhere.py"),
        },
    ] {
        assert_eq!(harness.coordinator.dispatch(event), Dispatch::Ignored);
    }

    let session = harness.coordinator.current_session().unwrap();
    assert_eq!(session.state, SessionState::Displayed);
    assert!(harness.sink.records().is_empty());
}

#[test]
fn test_accept_after_rejection_is_ignored() {
    let mut harness = CoordinatorHarness::consented();
    displayed(&mut harness, "req-r");
    harness.coordinator.dispatch(HostEvent::VisibleEditorsChanged);

    let late_accept = harness.coordinator.execute(Command::AcceptRecommendation(
        CoordinatorHarness::accept_args("req-r", 0),
    ));

    assert_eq!(late_accept, Dispatch::Ignored);
    let records = harness.sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].decision_index, -1);
}

#[test]
fn test_paused_blocks_keystrokes_but_not_manual_invocation() {
    let mut harness = CoordinatorHarness::consented();
    harness.coordinator.dispatch(focus(DOC));
    harness.coordinator.execute(Command::PauseSuggestions);

    let auto = harness.coordinator.dispatch(keystroke(DOC, "python", "x"));
    assert!(matches!(auto, Dispatch::Suppressed(_)));

    let manual_request = expect_fetch(harness.coordinator.execute(Command::InvokeSuggestion(
        recgate::suggestions::ManualTrigger {
            document: DocumentId::new(DOC),
            language: "python".to_string(),
            line: 4,
        },
    )));
    assert_eq!(manual_request.trigger_type, TriggerType::Manual);
    assert_eq!(manual_request.tab_size, 4);
    assert_eq!(manual_request.auto_closing_brackets, "languageDefined");
}

#[test]
fn test_background_document_keystroke_suppressed() {
    let mut harness = CoordinatorHarness::consented();
    harness.coordinator.dispatch(focus("file:///workspace/other.py"));
    let dispatch = harness.coordinator.dispatch(keystroke(DOC, "python", "x"));
    assert!(matches!(dispatch, Dispatch::Suppressed(_)));
}
