//! Consent gating.
//!
//! Whether suggestions may be requested depends on persisted flags and on the
//! live feature-preview setting. A [`ConsentGate`] borrows both and samples
//! them on every call; nothing here is cached, because the setting can flip
//! between a trigger arriving and the decision being made.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::host::settings::{PREVIEW_ENABLED, SettingsSource, read_bool};
use crate::host::HostUi;
use crate::state::{PersistedState, StateKey};

/// Consent flags as seen at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConsentState {
    pub terms_accepted: bool,
    pub preview_enabled: bool,
    pub auto_trigger_enabled: bool,
}

impl ConsentState {
    #[must_use]
    pub const fn trigger_config(&self) -> TriggerConfig {
        let manual_allowed = self.terms_accepted && self.preview_enabled;
        TriggerConfig {
            manual_allowed,
            automatic_allowed: manual_allowed && self.auto_trigger_enabled,
        }
    }
}

/// Which trigger kinds are currently permitted. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TriggerConfig {
    pub manual_allowed: bool,
    pub automatic_allowed: bool,
}

pub struct ConsentGate<'a> {
    state: &'a PersistedState,
    settings: &'a dyn SettingsSource,
}

impl<'a> ConsentGate<'a> {
    #[must_use]
    pub fn new(state: &'a PersistedState, settings: &'a dyn SettingsSource) -> Self {
        Self { state, settings }
    }

    #[must_use]
    pub fn current_consent(&self) -> ConsentState {
        ConsentState {
            terms_accepted: self.state.get(StateKey::TermsAccepted),
            preview_enabled: read_bool(self.settings, PREVIEW_ENABLED),
            auto_trigger_enabled: self.state.get(StateKey::AutoTriggerEnabled),
        }
    }

    #[must_use]
    pub fn manual_trigger_allowed(&self) -> bool {
        self.current_consent().trigger_config().manual_allowed
    }

    #[must_use]
    pub fn automatic_trigger_allowed(&self) -> bool {
        self.current_consent().trigger_config().automatic_allowed
    }

    #[must_use]
    pub fn trigger_config(&self) -> TriggerConfig {
        self.current_consent().trigger_config()
    }

    /// Cascading revocation after the preview setting was switched off.
    ///
    /// Clears accepted terms and automatic triggering, then asks the UI to
    /// redraw. Returns the consent state the UI was refreshed with.
    pub fn on_preview_feature_disabled(
        state: &mut PersistedState,
        settings: &dyn SettingsSource,
        ui: &mut dyn HostUi,
    ) -> ConsentState {
        state.set(StateKey::TermsAccepted, false);
        state.set(StateKey::AutoTriggerEnabled, false);
        let consent = ConsentGate::new(state, settings).current_consent();
        info!(target: "recgate::consent", "preview disabled; terms and automatic triggering revoked");
        ui.refresh_consent_surface(&consent);
        consent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MemoryStore;
    use crate::test_utils::{RecordingUi, StaticSettings, TestCase, run_table_tests};
    use serde_json::Value;

    fn state_with(terms: bool, auto: bool) -> PersistedState {
        PersistedState::load(Box::new(MemoryStore::with_entries([
            ("terms-accepted", terms),
            ("auto-trigger-enabled", auto),
        ])))
        .unwrap()
    }

    #[test]
    fn test_trigger_config_table() -> Result<(), String> {
        let cases = vec![
            TestCase {
                name: "nothing_enabled",
                input: (false, false, false),
                expected: (false, false),
                should_panic: false,
            },
            TestCase {
                name: "terms_without_preview",
                input: (true, false, true),
                expected: (false, false),
                should_panic: false,
            },
            TestCase {
                name: "manual_only",
                input: (true, true, false),
                expected: (true, false),
                should_panic: false,
            },
            TestCase {
                name: "everything",
                input: (true, true, true),
                expected: (true, true),
                should_panic: false,
            },
            TestCase {
                name: "stale_auto_flag_without_terms",
                input: (false, true, true),
                expected: (false, false),
                should_panic: false,
            },
        ];

        run_table_tests(cases, |(terms, preview, auto)| {
            let config = ConsentState {
                terms_accepted: terms,
                preview_enabled: preview,
                auto_trigger_enabled: auto,
            }
            .trigger_config();
            (config.manual_allowed, config.automatic_allowed)
        })
    }

    #[test]
    fn test_gate_samples_settings_on_every_call() {
        let state = state_with(true, true);
        let settings = StaticSettings::new();
        settings.set(PREVIEW_ENABLED, Value::Bool(true));

        let gate = ConsentGate::new(&state, &settings);
        assert!(gate.manual_trigger_allowed());

        settings.set(PREVIEW_ENABLED, Value::Bool(false));
        assert!(!gate.manual_trigger_allowed());
        assert!(!gate.automatic_trigger_allowed());
    }

    #[test]
    fn test_unavailable_settings_fail_closed() {
        let state = state_with(true, true);
        let settings = StaticSettings::new();
        settings.set(PREVIEW_ENABLED, Value::Bool(true));
        settings.set_unavailable(true);

        let consent = ConsentGate::new(&state, &settings).current_consent();
        assert!(!consent.preview_enabled);
        assert_eq!(consent.trigger_config(), TriggerConfig::default());
    }

    #[test]
    fn test_preview_disabled_cascades() {
        let mut state = state_with(true, true);
        let settings = StaticSettings::new();
        let ui = RecordingUi::new();
        let mut ui_handle = ui.clone();

        let consent = ConsentGate::on_preview_feature_disabled(&mut state, &settings, &mut ui_handle);

        assert!(!state.get(StateKey::TermsAccepted));
        assert!(!state.get(StateKey::AutoTriggerEnabled));
        assert_eq!(consent, ConsentState::default());
        assert_eq!(ui.log().consent_refreshes, 1);
    }
}
