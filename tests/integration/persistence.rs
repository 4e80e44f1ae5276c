use recgate::host::settings::{FileSettings, PREVIEW_ENABLED, SettingsSource};
use recgate::host::TerminalUi;
use recgate::state::{PersistedState, SqliteStore, StateKey, WriterStats};
use recgate::suggestions::{
    Command, Coordinator, CoordinatorOptions, JsonlSink, TelemetryRecorder, load_records,
};
use recgate::test_utils::fixtures::UnitTestFixture;
use recgate::test_utils::{FailingStore, MemorySink, RecordingUi, StaticSettings};
use serde_json::Value;

use crate::helpers::{DOC, expect_fetch, manual};

fn open_coordinator(fixture: &UnitTestFixture) -> Coordinator {
    let store = SqliteStore::open(fixture.data_path.join("state.db")).unwrap();
    let sink = JsonlSink::open(fixture.data_path.join("telemetry.jsonl")).unwrap();
    let mut coordinator = Coordinator::new(
        PersistedState::load(Box::new(store)).unwrap(),
        Box::new(FileSettings::new(fixture.data_path.join("settings.json"))),
        Box::new(TerminalUi::new(None, false)),
        TelemetryRecorder::new(Box::new(sink)),
        CoordinatorOptions::default(),
    );
    coordinator.activate();
    coordinator
}

#[test]
fn test_consent_survives_restart() {
    let fixture = UnitTestFixture::new();
    let _ = fixture.with_preview(true);

    {
        let mut coordinator = open_coordinator(&fixture);
        coordinator.execute(Command::AcceptTerms);
        coordinator.execute(Command::PauseSuggestions);
    }

    let coordinator = open_coordinator(&fixture);
    let snapshot = coordinator.state().snapshot();
    assert!(snapshot.terms_accepted);
    assert!(!snapshot.auto_trigger_enabled);
    assert!(snapshot.welcome_message_shown);
    assert!(coordinator.gate().manual_trigger_allowed());
    assert!(!coordinator.gate().automatic_trigger_allowed());
}

#[test]
fn test_activation_writes_editor_defaults_to_settings_file() {
    let fixture = UnitTestFixture::new();
    let path = fixture.write_settings(&[("editor.tabSize", Value::from(2))]);

    let coordinator = open_coordinator(&fixture);

    let settings = FileSettings::new(path);
    assert_eq!(
        settings.get("editor.snippetSuggestions").unwrap(),
        Some(Value::String("top".into()))
    );
    assert_eq!(coordinator.editor().tab_size, 2);
}

#[test]
fn test_open_session_at_drop_lands_in_decision_log() {
    let fixture = UnitTestFixture::new();
    let _ = fixture.with_preview(true);
    {
        let mut coordinator = open_coordinator(&fixture);
        coordinator.execute(Command::AcceptTerms);
        expect_fetch(coordinator.dispatch(manual(DOC, 5)));
    }

    let records = load_records(&fixture.data_path.join("telemetry.jsonl")).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].decision_index, -1);
    assert_eq!(records[0].line, 5);
}

#[test]
fn test_failed_persisted_writes_keep_running_state() {
    let settings = StaticSettings::new();
    settings.set(PREVIEW_ENABLED, Value::Bool(true));
    let ui = RecordingUi::new();
    let mut coordinator = Coordinator::new(
        PersistedState::load(Box::new(FailingStore)).unwrap(),
        Box::new(settings),
        Box::new(ui.clone()),
        TelemetryRecorder::new(Box::new(MemorySink::new())),
        CoordinatorOptions::default(),
    );
    coordinator.activate();

    coordinator.execute(Command::AcceptTerms);

    assert!(coordinator.state().get(StateKey::TermsAccepted));
    assert!(coordinator.gate().automatic_trigger_allowed());
    assert_eq!(ui.log().welcomes, 1);
    assert_eq!(
        coordinator.state().drain(),
        WriterStats {
            persisted: 0,
            failed: 3
        }
    );
}
