use std::collections::HashSet;

use proptest::prelude::*;
use serde_json::Value;

use recgate::host::DocumentId;
use recgate::host::settings::PREVIEW_ENABLED;
use recgate::suggestions::{
    Command, ConfigurationChange, ContentChange, Dispatch, FetchDisposition, FetchTicket,
    HostEvent, ManualTrigger, SelectionOrigin, TextChange,
};
use recgate::test_utils::{CoordinatorHarness, ScriptedFetcher};

const DOCS: [&str; 2] = ["file:///a.py", "file:///b.rs"];
const LANGUAGES: [&str; 3] = ["python", "rust", "plaintext"];

#[derive(Debug, Clone)]
enum Op {
    Manual { doc: usize, line: u32 },
    Keystroke { doc: usize, language: usize },
    Focus(usize),
    Save(usize),
    Close(usize),
    VisibleEditors,
    Selection(SelectionOrigin),
    CompleteLatest(usize),
    CompleteOldest(usize),
    FailLatest,
    Accept(usize),
    Pause,
    Resume,
    Preview(bool),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..DOCS.len(), 0u32..50).prop_map(|(doc, line)| Op::Manual { doc, line }),
        (0..DOCS.len(), 0..LANGUAGES.len()).prop_map(|(doc, language)| Op::Keystroke { doc, language }),
        (0..DOCS.len()).prop_map(Op::Focus),
        (0..DOCS.len()).prop_map(Op::Save),
        (0..DOCS.len()).prop_map(Op::Close),
        Just(Op::VisibleEditors),
        prop_oneof![
            Just(SelectionOrigin::Pointer),
            Just(SelectionOrigin::Keyboard),
            Just(SelectionOrigin::Command),
        ]
        .prop_map(Op::Selection),
        (0usize..4).prop_map(Op::CompleteLatest),
        (0usize..4).prop_map(Op::CompleteOldest),
        Just(Op::FailLatest),
        (0usize..4).prop_map(Op::Accept),
        Just(Op::Pause),
        Just(Op::Resume),
        any::<bool>().prop_map(Op::Preview),
    ]
}

/// Drives a harness and counts what the coordinator reported.
struct Driver {
    harness: CoordinatorHarness,
    tickets: Vec<FetchTicket>,
    opened: usize,
    resolved: usize,
    completions: usize,
}

impl Driver {
    fn new() -> Self {
        Self {
            harness: CoordinatorHarness::consented(),
            tickets: Vec::new(),
            opened: 0,
            resolved: 0,
            completions: 0,
        }
    }

    fn observe(&mut self, dispatch: Dispatch) {
        match dispatch {
            Dispatch::Fetch(request) => {
                self.opened += 1;
                self.tickets.push(request.ticket);
            }
            Dispatch::Resolved(_) | Dispatch::ShutDown(Some(_)) => self.resolved += 1,
            _ => {}
        }
    }

    fn complete(&mut self, ticket: FetchTicket, candidates: usize) {
        self.completions += 1;
        let texts: Vec<String> = (0..candidates).map(|n| format!("candidate {n}")).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let response = ScriptedFetcher::response(&format!("req-{}", self.completions), &refs);
        let disposition = self.harness.coordinator.complete_fetch(ticket, Ok(response));
        if !matches!(disposition, FetchDisposition::Displayed { .. } | FetchDisposition::Stale) {
            self.resolved += 1;
        }
    }

    fn apply(&mut self, op: Op) {
        let coordinator = &mut self.harness.coordinator;
        let dispatch = match op {
            Op::Manual { doc, line } => coordinator.dispatch(HostEvent::InvokeSuggestion(ManualTrigger {
                document: DocumentId::new(DOCS[doc]),
                language: "python".to_string(),
                line,
            })),
            Op::Keystroke { doc, language } => coordinator.dispatch(HostEvent::TextChanged(TextChange {
                document: DocumentId::new(DOCS[doc]),
                language: LANGUAGES[language].to_string(),
                line: 1,
                changes: vec![ContentChange {
                    text: "x".to_string(),
                    range_length: 0,
                }],
            })),
            Op::Focus(doc) => coordinator.dispatch(HostEvent::ActiveEditorChanged {
                document: Some(DocumentId::new(DOCS[doc])),
            }),
            Op::Save(doc) => coordinator.dispatch(HostEvent::DocumentSaved {
                document: DocumentId::new(DOCS[doc]),
            }),
            Op::Close(doc) => coordinator.dispatch(HostEvent::DocumentClosed {
                document: DocumentId::new(DOCS[doc]),
            }),
            Op::VisibleEditors => coordinator.dispatch(HostEvent::VisibleEditorsChanged),
            Op::Selection(origin) => coordinator.dispatch(HostEvent::SelectionChanged { origin }),
            Op::CompleteLatest(candidates) => {
                if let Some(ticket) = self.tickets.last().copied() {
                    self.complete(ticket, candidates);
                }
                return;
            }
            Op::CompleteOldest(candidates) => {
                if let Some(ticket) = self.tickets.first().copied() {
                    self.complete(ticket, candidates);
                }
                return;
            }
            Op::FailLatest => {
                if let Some(ticket) = self.tickets.last().copied() {
                    let disposition = coordinator.complete_fetch(
                        ticket,
                        Err(recgate::RecError::Collaborator("offline".to_string())),
                    );
                    if disposition == FetchDisposition::Failed {
                        self.resolved += 1;
                    }
                }
                return;
            }
            Op::Accept(index) => {
                let request_id = coordinator
                    .current_session()
                    .and_then(|session| session.request_id.clone())
                    .unwrap_or_default();
                coordinator.execute(Command::AcceptRecommendation(
                    CoordinatorHarness::accept_args(&request_id, index),
                ))
            }
            Op::Pause => coordinator.execute(Command::PauseSuggestions),
            Op::Resume => coordinator.execute(Command::ResumeSuggestions),
            Op::Preview(enabled) => {
                self.harness
                    .settings
                    .set(PREVIEW_ENABLED, Value::Bool(enabled));
                self.harness
                    .coordinator
                    .dispatch(HostEvent::ConfigurationChanged(ConfigurationChange::new([
                        PREVIEW_ENABLED,
                    ])))
            }
        };
        self.observe(dispatch);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn every_opened_session_is_recorded_exactly_once(ops in prop::collection::vec(arb_op(), 0..60)) {
        let mut driver = Driver::new();
        for op in ops {
            driver.apply(op);
        }
        let shutdown = driver.harness.coordinator.dispatch(HostEvent::Shutdown);
        driver.observe(shutdown);

        let records = driver.harness.sink.records();
        prop_assert_eq!(records.len(), driver.opened);
        prop_assert!(driver.resolved <= records.len());

        let ids: HashSet<u64> = records.iter().map(|r| r.session_id).collect();
        prop_assert_eq!(ids.len(), records.len());
        prop_assert!(driver.harness.coordinator.current_session().is_none());
    }

    #[test]
    fn only_accepts_carry_a_candidate_index(ops in prop::collection::vec(arb_op(), 0..60)) {
        let mut driver = Driver::new();
        for op in ops {
            driver.apply(op);
        }
        driver.harness.coordinator.shutdown();

        for record in driver.harness.sink.records() {
            if record.outcome == "accepted" {
                prop_assert!(record.decision_index >= 0);
            } else {
                prop_assert_eq!(record.decision_index, -1);
            }
        }
    }

    #[test]
    fn at_most_one_session_is_live(ops in prop::collection::vec(arb_op(), 1..40)) {
        let mut driver = Driver::new();
        for op in ops {
            driver.apply(op);
            let live = driver.harness.coordinator.current_session().map(|s| s.id);
            let recorded: HashSet<u64> = driver
                .harness
                .sink
                .records()
                .iter()
                .map(|r| r.session_id)
                .collect();
            if let Some(id) = live {
                prop_assert!(!recorded.contains(&id.0));
                prop_assert_eq!(Some(&FetchTicket { session: id }), driver.tickets.last());
            }
        }
    }

    #[test]
    fn revoked_consent_never_opens_sessions(ops in prop::collection::vec(arb_op(), 0..40)) {
        let mut driver = Driver::new();
        driver.apply(Op::Preview(false));
        let opened_before = driver.opened;
        for op in ops.into_iter().filter(|op| !matches!(op, Op::Preview(_))) {
            driver.apply(op);
        }
        prop_assert_eq!(driver.opened, opened_before);
    }
}
