use recgate::host::DocumentId;
use recgate::state::StateKey;
use recgate::suggestions::{
    Command, Dispatch, FetchDisposition, HostEvent, SuppressReason, TriggerType,
};
use recgate::test_utils::{CoordinatorHarness, ScriptedFetcher};

use crate::helpers::{DOC, expect_fetch, focus, keystroke, manual};

#[test]
fn scenario_a_accept_terms_enables_auto_and_welcomes_once() {
    let mut harness = CoordinatorHarness::new();
    harness.enable_preview(true);
    assert_eq!(harness.stored("auto-trigger-enabled"), None);

    let first = harness.coordinator.execute(Command::AcceptTerms);
    assert!(matches!(first, Dispatch::Consent(consent) if consent.terms_accepted && consent.auto_trigger_enabled));
    assert_eq!(harness.stored("terms-accepted"), Some(true));
    assert_eq!(harness.stored("auto-trigger-enabled"), Some(true));
    assert_eq!(harness.ui.log().welcomes, 1);

    harness.coordinator.execute(Command::AcceptTerms);
    assert_eq!(harness.ui.log().welcomes, 1);
    assert_eq!(harness.ui.log().consent_refreshes, 2);
    assert!(harness.coordinator.state().get(StateKey::WelcomeMessageShown));
}

#[test]
fn scenario_b_plaintext_keystroke_is_suppressed() {
    let mut harness = CoordinatorHarness::consented();
    harness.coordinator.dispatch(focus("file:///notes.txt"));

    let dispatch = harness
        .coordinator
        .dispatch(keystroke("file:///notes.txt", "plaintext", "a"));

    assert_eq!(
        dispatch,
        Dispatch::Suppressed(SuppressReason::UnsupportedLanguage)
    );
    assert!(harness.coordinator.current_session().is_none());
    assert!(harness.sink.records().is_empty());
}

#[test]
fn scenario_c_save_before_fetch_rejects_and_discards_result() {
    let mut harness = CoordinatorHarness::consented();
    let request = expect_fetch(harness.coordinator.dispatch(manual(DOC, 3)));

    let saved = harness.coordinator.dispatch(HostEvent::DocumentSaved {
        document: DocumentId::new(DOC),
    });
    let Dispatch::Resolved(record) = saved else {
        panic!("save should reject the requested session, got {saved:?}");
    };
    assert_eq!(record.decision_index, -1);
    assert_eq!(record.outcome, "rejected");

    let mut fetcher = ScriptedFetcher::new([ScriptedFetcher::response("req-c", &["pass"])]);
    let late = harness.coordinator.fetch_and_complete(&request, &mut fetcher);

    assert_eq!(late, FetchDisposition::Stale);
    assert!(harness.ui.log().rendered.is_empty());
    assert_eq!(harness.sink.records().len(), 1);
}

#[test]
fn scenario_d_accept_index_two() {
    let mut harness = CoordinatorHarness::consented();
    let request = expect_fetch(harness.coordinator.dispatch(manual(DOC, 7)));
    let disposition = harness.coordinator.complete_fetch(
        request.ticket,
        Ok(ScriptedFetcher::response("req-d", &["a()", "b()", "c()"])),
    );
    assert_eq!(disposition, FetchDisposition::Displayed { candidates: 3 });

    let accepted = harness.coordinator.execute(Command::AcceptRecommendation(
        CoordinatorHarness::accept_args("req-d", 2),
    ));

    let Dispatch::Resolved(record) = accepted else {
        panic!("accept should resolve the session, got {accepted:?}");
    };
    assert_eq!(record.decision_index, 2);
    assert_eq!(record.outcome, "accepted");
    assert_eq!(record.request_id, "req-d");
    assert_eq!(record.trigger_type, TriggerType::Manual);
    assert_eq!(record.line, 7);
    assert_eq!(harness.sink.records(), vec![record]);
}

#[test]
fn scenario_e_shutdown_flushes_displayed_session() {
    let mut harness = CoordinatorHarness::consented();
    harness.coordinator.dispatch(focus(DOC));
    let request = expect_fetch(harness.coordinator.dispatch(keystroke(DOC, "python", "(")));
    harness.coordinator.complete_fetch(
        request.ticket,
        Ok(ScriptedFetcher::response("req-e", &["x)"])),
    );

    let shut = harness.coordinator.dispatch(HostEvent::Shutdown);

    let Dispatch::ShutDown(Some(record)) = shut else {
        panic!("shutdown should report the forced rejection, got {shut:?}");
    };
    assert_eq!(record.decision_index, -1);
    assert_eq!(record.trigger_type, TriggerType::Automatic);
    assert_eq!(harness.sink.records().len(), 1);
    assert_eq!(harness.sink.flushes(), 1);

    // A second shutdown, including the one run on drop, records nothing.
    assert_eq!(harness.coordinator.shutdown(), None);
    let sink = harness.sink.clone();
    drop(harness);
    assert_eq!(sink.records().len(), 1);
}
