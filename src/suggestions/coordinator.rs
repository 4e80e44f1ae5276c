//! Event dispatch and the recommendation lifecycle.
//!
//! [`Coordinator`] is the only caller of the session state machine. Hosts
//! feed it [`HostEvent`]s and [`Command`]s; it consults a fresh
//! [`ConsentGate`] per decision, keeps the single session slot, and hands
//! every resolved session to telemetry exactly once.
//!
//! The fetch is the one step that happens outside: a trigger returns
//! [`Dispatch::Fetch`] and the host later calls
//! [`Coordinator::complete_fetch`] with the ticket. Anything dispatched in
//! between can resolve or replace the session, so completion first checks
//! that the ticket still names the live session and drops the result
//! otherwise.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::host::settings::{
    self, AUTO_CLOSING_BRACKETS, DEFAULT_AUTO_CLOSING_BRACKETS, DEFAULT_TAB_SIZE, PREVIEW_ENABLED,
    SettingsSource, TAB_SIZE,
};
use crate::host::{HostUi, SuggestionFetcher};
use crate::state::{PersistedState, StateKey};

use super::consent::{ConsentGate, ConsentState};
use super::events::{AcceptArgs, Command, ConfigurationChange, HostEvent};
use super::fetch::{FetchDisposition, FetchRequest, FetchResponse, FetchTicket};
use super::session::{
    RecommendationSession, Resolution, ResolvedSession, SessionId, SessionSlot, SessionState,
};
use super::telemetry::{DecisionRecord, TelemetryRecorder, TelemetryStats};
use super::trigger::{EditorContext, SuppressReason, TriggerArbiter, TriggerEvent, Verdict};
use super::watchdog::{RejectionWatchdog, WatchdogStats};

pub const DEFAULT_INTRODUCTION_URL: &str = "https://github.com/recgate/recgate#readme";

#[derive(Debug, Clone)]
pub struct CoordinatorOptions {
    pub unsupported_languages: Vec<String>,
    pub introduction_url: String,
    pub apply_editor_defaults: bool,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            unsupported_languages: vec![super::trigger::PLAINTEXT_LANGUAGE.to_string()],
            introduction_url: DEFAULT_INTRODUCTION_URL.to_string(),
            apply_editor_defaults: true,
        }
    }
}

/// Result of dispatching an event or executing a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "detail", rename_all = "snake_case")]
pub enum Dispatch {
    /// Nothing to do.
    Ignored,
    Suppressed(SuppressReason),
    /// A session was opened; the host should fetch candidates for it.
    Fetch(FetchRequest),
    Resolved(DecisionRecord),
    Consent(ConsentState),
    /// The command was understood but not carried out.
    Refused(String),
    /// A delegated host action succeeded.
    Completed,
    ShutDown(Option<DecisionRecord>),
}

#[derive(Debug, Clone, Serialize)]
pub struct CoordinatorStatus {
    pub consent: ConsentState,
    pub manual_allowed: bool,
    pub automatic_allowed: bool,
    pub session: Option<RecommendationSession>,
    pub editor: EditorContext,
    pub telemetry: TelemetryStats,
    pub watchdog: WatchdogStats,
    pub shut_down: bool,
}

pub struct Coordinator {
    state: PersistedState,
    settings: Box<dyn SettingsSource>,
    ui: Box<dyn HostUi>,
    telemetry: TelemetryRecorder,
    arbiter: TriggerArbiter,
    watchdog: RejectionWatchdog,
    slot: SessionSlot,
    editor: EditorContext,
    options: CoordinatorOptions,
    shut_down: bool,
}

impl Coordinator {
    #[must_use]
    pub fn new(
        state: PersistedState,
        settings: Box<dyn SettingsSource>,
        ui: Box<dyn HostUi>,
        telemetry: TelemetryRecorder,
        options: CoordinatorOptions,
    ) -> Self {
        Self {
            state,
            settings,
            ui,
            telemetry,
            arbiter: TriggerArbiter::new(options.unsupported_languages.clone()),
            watchdog: RejectionWatchdog::new(),
            slot: SessionSlot::new(),
            editor: EditorContext::default(),
            options,
            shut_down: false,
        }
    }

    /// Startup wiring: write editor defaults and read cached editor settings.
    pub fn activate(&mut self) {
        if self.options.apply_editor_defaults {
            for (key, value) in settings::editor_defaults() {
                if let Err(err) = self.settings.update(key, value) {
                    debug!(target: "recgate::activation", key, error = %err, "editor default not applied");
                }
            }
        }
        self.refresh_editor_settings();
        let consent = self.consent();
        info!(
            target: "recgate::activation",
            terms = consent.terms_accepted,
            preview = consent.preview_enabled,
            auto = consent.auto_trigger_enabled,
            "coordinator activated"
        );
    }

    /// Gate over the current persisted state and live settings.
    #[must_use]
    pub fn gate(&self) -> ConsentGate<'_> {
        ConsentGate::new(&self.state, self.settings.as_ref())
    }

    #[must_use]
    pub fn consent(&self) -> ConsentState {
        self.gate().current_consent()
    }

    #[must_use]
    pub const fn current_session(&self) -> Option<&RecommendationSession> {
        self.slot.current()
    }

    #[must_use]
    pub const fn state(&self) -> &PersistedState {
        &self.state
    }

    #[must_use]
    pub const fn editor(&self) -> &EditorContext {
        &self.editor
    }

    #[must_use]
    pub const fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    #[must_use]
    pub fn status(&self) -> CoordinatorStatus {
        let consent = self.consent();
        let config = consent.trigger_config();
        CoordinatorStatus {
            consent,
            manual_allowed: config.manual_allowed,
            automatic_allowed: config.automatic_allowed,
            session: self.slot.current().cloned(),
            editor: self.editor.clone(),
            telemetry: self.telemetry.stats(),
            watchdog: self.watchdog.stats(),
            shut_down: self.shut_down,
        }
    }

    /// Single entry point for host events.
    pub fn dispatch(&mut self, event: HostEvent) -> Dispatch {
        if self.shut_down {
            debug!(target: "recgate::dispatch", kind = event.kind(), "event after shutdown ignored");
            return Dispatch::Ignored;
        }
        debug!(target: "recgate::dispatch", kind = event.kind(), "event");

        match event {
            HostEvent::InvokeSuggestion(trigger) => self.trigger(TriggerEvent::Manual(&trigger)),
            HostEvent::TextChanged(change) => self.trigger(TriggerEvent::Automatic(&change)),
            HostEvent::ConfigurationChanged(change) => self.on_configuration_changed(&change),
            HostEvent::Shutdown => Dispatch::ShutDown(self.shutdown()),
            HostEvent::ActiveEditorChanged { ref document } => {
                self.editor.active_document.clone_from(document);
                self.implicit_rejection(&event)
            }
            other => self.implicit_rejection(&other),
        }
    }

    /// Execute a host command.
    pub fn execute(&mut self, command: Command) -> Dispatch {
        if self.shut_down {
            debug!(target: "recgate::dispatch", command = command.name(), "command after shutdown ignored");
            return Dispatch::Ignored;
        }
        debug!(target: "recgate::dispatch", command = command.name(), "command");

        match command {
            Command::PauseSuggestions | Command::CancelTerms => {
                self.state.set(StateKey::AutoTriggerEnabled, false);
                Dispatch::Consent(self.refresh_consent())
            }
            Command::ResumeSuggestions => {
                if !self.gate().manual_trigger_allowed() {
                    return Dispatch::Refused(
                        "terms not accepted or preview disabled".to_string(),
                    );
                }
                self.state.set(StateKey::AutoTriggerEnabled, true);
                Dispatch::Consent(self.refresh_consent())
            }
            Command::AcceptTerms => self.accept_terms(),
            Command::OpenSettings => {
                let result = self.ui.open_settings();
                Self::delegated("open-settings", result)
            }
            Command::OpenIntroduction => {
                let result = self.ui.open_url(&self.options.introduction_url);
                Self::delegated("open-introduction", result)
            }
            Command::EnableSuggestionsView => {
                let result = self.ui.enable_suggestions_view();
                Self::delegated("enable-suggestions-view", result)
            }
            Command::InvokeSuggestion(trigger) => self.trigger(TriggerEvent::Manual(&trigger)),
            Command::AcceptRecommendation(args) => self.accept_recommendation(&args),
        }
    }

    /// Deliver the outcome of a fetch started by [`Dispatch::Fetch`].
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<FetchResponse>,
    ) -> FetchDisposition {
        let id = ticket.session;
        if self.shut_down || !self.slot.is_awaiting(id) {
            debug!(target: "recgate::session", session = %id, "discarding stale fetch result");
            return FetchDisposition::Stale;
        }

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                warn!(target: "recgate::session", session = %id, error = %err, "suggestion fetch failed");
                self.resolve_session(id, Resolution::Rejected);
                return FetchDisposition::Failed;
            }
        };

        let count = match self.slot.fill(id, response) {
            super::session::FillOutcome::Filled { candidates } => candidates,
            super::session::FillOutcome::Stale => {
                debug!(target: "recgate::session", session = %id, "fetch result arrived after display");
                return FetchDisposition::Stale;
            }
        };
        if count == 0 {
            self.resolve_session(id, Resolution::Rejected);
            return FetchDisposition::NoSuggestions;
        }

        let rendered = match self.slot.current() {
            Some(session) => self.ui.render_candidates(session),
            None => false,
        };
        if rendered && self.slot.mark_displayed(id) {
            FetchDisposition::Displayed { candidates: count }
        } else {
            self.resolve_session(id, Resolution::Rejected);
            FetchDisposition::NotRendered
        }
    }

    /// Run a synchronous fetch for `request` and deliver its result.
    pub fn fetch_and_complete(
        &mut self,
        request: &FetchRequest,
        fetcher: &mut dyn SuggestionFetcher,
    ) -> FetchDisposition {
        let result = fetcher.fetch(request);
        self.complete_fetch(request.ticket, result)
    }

    /// Force-resolve any live session, flush telemetry and wait for queued
    /// state writes. Idempotent.
    pub fn shutdown(&mut self) -> Option<DecisionRecord> {
        if self.shut_down {
            return None;
        }
        self.shut_down = true;
        let record = self
            .slot
            .resolve(Resolution::Rejected)
            .map(|resolved| self.telemetry.record(resolved));
        self.telemetry.flush();
        let writes = self.state.drain();
        info!(
            target: "recgate::activation",
            recorded = self.telemetry.stats().recorded,
            flushed_open_session = record.is_some(),
            persisted_writes = writes.persisted,
            failed_writes = writes.failed,
            "coordinator shut down"
        );
        record
    }

    fn trigger(&mut self, event: TriggerEvent<'_>) -> Dispatch {
        let config = self.gate().trigger_config();
        let params = match self.arbiter.evaluate(event, &config, &self.editor) {
            Verdict::Suppress(reason) => {
                debug!(target: "recgate::trigger", ?reason, "trigger suppressed");
                return Dispatch::Suppressed(reason);
            }
            Verdict::Open(params) => params,
        };

        let (id, superseded) = self.slot.open(params.clone());
        if let Some(superseded) = superseded {
            self.telemetry.record(superseded);
        }
        info!(
            target: "recgate::trigger",
            session = %id,
            trigger = %params.trigger_type,
            language = %params.language,
            "recommendation requested"
        );
        Dispatch::Fetch(FetchRequest {
            ticket: FetchTicket { session: id },
            trigger_type: params.trigger_type,
            document: params.document,
            language: params.language,
            line: params.line,
            tab_size: self.editor.tab_size,
            auto_closing_brackets: self.editor.auto_closing_brackets.clone(),
        })
    }

    fn implicit_rejection(&mut self, event: &HostEvent) -> Dispatch {
        match self.watchdog.observe(event, &mut self.slot) {
            Some(resolved) => Dispatch::Resolved(self.telemetry.record(resolved)),
            None => Dispatch::Ignored,
        }
    }

    fn accept_terms(&mut self) -> Dispatch {
        self.state.set(StateKey::TermsAccepted, true);
        self.state.set(StateKey::AutoTriggerEnabled, true);
        if !self.state.get(StateKey::WelcomeMessageShown) {
            self.ui.show_welcome();
            self.state.set(StateKey::WelcomeMessageShown, true);
        }
        info!(target: "recgate::consent", "terms accepted");
        Dispatch::Consent(self.refresh_consent())
    }

    fn accept_recommendation(&mut self, args: &AcceptArgs) -> Dispatch {
        let Some(session) = self.slot.current() else {
            debug!(target: "recgate::session", request = %args.request_id, "accept with no live session");
            return Dispatch::Ignored;
        };
        if session.state != SessionState::Displayed
            || session.request_id.as_deref() != Some(args.request_id.as_str())
        {
            debug!(
                target: "recgate::session",
                session = %session.id,
                request = %args.request_id,
                "accept does not match displayed session"
            );
            return Dispatch::Ignored;
        }
        if args.index >= session.candidates.len() {
            return Dispatch::Refused(format!(
                "candidate index {} out of range ({} candidates)",
                args.index,
                session.candidates.len()
            ));
        }
        match self.slot.resolve(Resolution::Accepted(args.index)) {
            Some(resolved) => Dispatch::Resolved(self.telemetry.record(resolved)),
            None => Dispatch::Ignored,
        }
    }

    fn on_configuration_changed(&mut self, change: &ConfigurationChange) -> Dispatch {
        if change.affects(TAB_SIZE) || change.affects(AUTO_CLOSING_BRACKETS) {
            self.refresh_editor_settings();
        }
        if !change.affects(PREVIEW_ENABLED) {
            return Dispatch::Ignored;
        }
        if settings::read_bool(self.settings.as_ref(), PREVIEW_ENABLED) {
            Dispatch::Consent(self.refresh_consent())
        } else {
            Dispatch::Consent(ConsentGate::on_preview_feature_disabled(
                &mut self.state,
                self.settings.as_ref(),
                self.ui.as_mut(),
            ))
        }
    }

    fn refresh_editor_settings(&mut self) {
        let source = self.settings.as_ref();
        self.editor.tab_size = settings::read_u32(source, TAB_SIZE, DEFAULT_TAB_SIZE);
        self.editor.auto_closing_brackets =
            settings::read_string(source, AUTO_CLOSING_BRACKETS, DEFAULT_AUTO_CLOSING_BRACKETS);
    }

    fn refresh_consent(&mut self) -> ConsentState {
        let consent = self.consent();
        self.ui.refresh_consent_surface(&consent);
        consent
    }

    fn resolve_session(&mut self, id: SessionId, resolution: Resolution) -> Option<DecisionRecord> {
        self.slot
            .resolve_if(id, resolution)
            .map(|resolved: ResolvedSession| self.telemetry.record(resolved))
    }

    fn delegated(action: &str, result: Result<()>) -> Dispatch {
        match result {
            Ok(()) => Dispatch::Completed,
            Err(err) => {
                warn!(target: "recgate::dispatch", action, error = %err, "host action failed");
                Dispatch::Refused(err.to_string())
            }
        }
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("state", &self.state)
            .field("slot", &self.slot)
            .field("editor", &self.editor)
            .field("telemetry", &self.telemetry)
            .field("shut_down", &self.shut_down)
            .finish_non_exhaustive()
    }
}
