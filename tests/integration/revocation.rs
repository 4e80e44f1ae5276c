use recgate::host::settings::PREVIEW_ENABLED;
use recgate::suggestions::{
    Command, ConfigurationChange, ConsentState, Dispatch, HostEvent, SuppressReason,
};
use recgate::test_utils::CoordinatorHarness;

use crate::helpers::{DOC, focus, keystroke, manual};

fn preview_changed() -> HostEvent {
    HostEvent::ConfigurationChanged(ConfigurationChange::new([PREVIEW_ENABLED]))
}

#[test]
fn test_disabling_preview_revokes_terms_and_auto() {
    let mut harness = CoordinatorHarness::consented();
    harness.enable_preview(false);

    let dispatch = harness.coordinator.dispatch(preview_changed());

    assert_eq!(dispatch, Dispatch::Consent(ConsentState::default()));
    assert_eq!(harness.stored("terms-accepted"), Some(false));
    assert_eq!(harness.stored("auto-trigger-enabled"), Some(false));
    assert_eq!(harness.ui.log().consent_refreshes, 1);

    let next = harness.coordinator.dispatch(manual(DOC, 1));
    assert_eq!(next, Dispatch::Suppressed(SuppressReason::ManualNotAllowed));
}

#[test]
fn test_re_enabling_preview_does_not_restore_terms() {
    let mut harness = CoordinatorHarness::consented();
    harness.enable_preview(false);
    harness.coordinator.dispatch(preview_changed());

    harness.enable_preview(true);
    let dispatch = harness.coordinator.dispatch(preview_changed());

    let Dispatch::Consent(consent) = dispatch else {
        panic!("expected consent refresh, got {dispatch:?}");
    };
    assert!(consent.preview_enabled);
    assert!(!consent.terms_accepted);
    assert!(!harness.coordinator.gate().manual_trigger_allowed());

    let resume = harness.coordinator.execute(Command::ResumeSuggestions);
    assert!(matches!(resume, Dispatch::Refused(_)));
}

#[test]
fn test_preview_flip_takes_effect_without_any_event() {
    let mut harness = CoordinatorHarness::consented();
    harness.coordinator.dispatch(focus(DOC));
    harness.enable_preview(false);

    // No configuration event yet: the gate still reads the live value.
    let dispatch = harness.coordinator.dispatch(keystroke(DOC, "python", "x"));
    assert_eq!(
        dispatch,
        Dispatch::Suppressed(SuppressReason::AutomaticNotAllowed)
    );
    assert_eq!(harness.stored("terms-accepted"), Some(true));
}

#[test]
fn test_unrelated_configuration_change_leaves_consent_alone() {
    let mut harness = CoordinatorHarness::consented();
    harness.enable_preview(false);

    let dispatch = harness
        .coordinator
        .dispatch(HostEvent::ConfigurationChanged(ConfigurationChange::new([
            "workbench.colorTheme",
        ])));

    assert_eq!(dispatch, Dispatch::Ignored);
    assert_eq!(harness.stored("terms-accepted"), Some(true));
    assert_eq!(harness.ui.log().consent_refreshes, 0);
}

#[test]
fn test_unreadable_settings_fail_closed() {
    let mut harness = CoordinatorHarness::consented();
    harness.settings.set_unavailable(true);

    let dispatch = harness.coordinator.dispatch(manual(DOC, 1));

    assert_eq!(dispatch, Dispatch::Suppressed(SuppressReason::ManualNotAllowed));
}
