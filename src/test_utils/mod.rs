//! Shared test utilities for recgate.
//!
//! In-memory collaborators for the coordinator. Each one is a cheap handle
//! over shared state, so a test can box one clone into the coordinator and
//! inspect another afterwards.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::error::{RecError, Result};
use crate::host::settings::{PREVIEW_ENABLED, SettingsSource};
use crate::host::{DocumentId, HostUi, SuggestionFetcher};
use crate::state::{KeyValueStore, MemoryStore, PersistedState};
use crate::suggestions::consent::ConsentState;
use crate::suggestions::coordinator::{Coordinator, CoordinatorOptions};
use crate::suggestions::events::{AcceptArgs, HostEvent, TriggerType};
use crate::suggestions::fetch::{FetchRequest, FetchResponse};
use crate::suggestions::session::RecommendationSession;
use crate::suggestions::telemetry::{DecisionRecord, TelemetryRecorder, TelemetrySink};

pub mod fixtures;
pub mod logging;

/// Table-driven test case structure.
#[derive(Debug, Clone)]
pub struct TestCase<I, E> {
    pub name: &'static str,
    pub input: I,
    pub expected: E,
    pub should_panic: bool,
}

/// Run table-driven tests with detailed logging.
pub fn run_table_tests<I, E, F>(
    cases: Vec<TestCase<I, E>>,
    test_fn: F,
) -> std::result::Result<(), String>
where
    I: std::fmt::Debug + Clone + std::panic::RefUnwindSafe,
    E: std::fmt::Debug + PartialEq,
    F: Fn(I) -> E + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    for case in cases {
        let start = std::time::Instant::now();
        println!("[TEST] Running: {}", case.name);
        println!("[TEST] Input: {:?}", case.input);

        let result = std::panic::catch_unwind(|| test_fn(case.input.clone()));
        let elapsed = start.elapsed();

        if case.should_panic {
            if result.is_ok() {
                return Err(format!("Test '{}' expected panic", case.name));
            }
            println!("[TEST] PASSED: {} ({:?}, panicked)\n", case.name, elapsed);
            continue;
        }

        let Ok(actual) = result else {
            return Err(format!("Test '{}' panicked unexpectedly", case.name));
        };

        println!("[TEST] Expected: {:?}", case.expected);
        println!("[TEST] Actual: {actual:?}");

        if actual != case.expected {
            return Err(format!(
                "Test '{}' failed: expected {:?}, got {:?}",
                case.name, case.expected, actual
            ));
        }
        println!("[TEST] PASSED: {} ({:?})\n", case.name, elapsed);
    }
    Ok(())
}

/// Store whose writes always fail. Reads see nothing.
#[derive(Debug, Clone, Default)]
pub struct FailingStore;

impl KeyValueStore for FailingStore {
    fn get(&self, _key: &str) -> Result<Option<bool>> {
        Ok(None)
    }

    fn put(&mut self, key: &str, _value: bool) -> Result<()> {
        Err(RecError::PersistedWrite {
            key: key.to_string(),
            reason: "store is read-only".to_string(),
        })
    }
}

#[derive(Debug, Default)]
struct SinkInner {
    records: Vec<DecisionRecord>,
    flushes: usize,
    failing: bool,
}

/// Telemetry sink that keeps records in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    inner: Arc<Mutex<SinkInner>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every emit fails.
    #[must_use]
    pub fn failing() -> Self {
        let sink = Self::default();
        sink.inner.lock().failing = true;
        sink
    }

    #[must_use]
    pub fn records(&self) -> Vec<DecisionRecord> {
        self.inner.lock().records.clone()
    }

    #[must_use]
    pub fn flushes(&self) -> usize {
        self.inner.lock().flushes
    }
}

impl TelemetrySink for MemorySink {
    fn emit(&mut self, record: &DecisionRecord) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.failing {
            return Err(RecError::Telemetry("sink offline".to_string()));
        }
        inner.records.push(record.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.lock().flushes += 1;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct SettingsInner {
    values: HashMap<String, Value>,
    unavailable: bool,
}

/// Settings held in memory. Mutable through a shared reference so a test can
/// flip values while a gate borrows the source.
#[derive(Debug, Clone, Default)]
pub struct StaticSettings {
    inner: Arc<Mutex<SettingsInner>>,
}

impl StaticSettings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: &str, value: Value) {
        self.inner.lock().values.insert(key.to_string(), value);
    }

    /// Make every read and write fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().unavailable = unavailable;
    }

    #[must_use]
    pub fn value(&self, key: &str) -> Option<Value> {
        self.inner.lock().values.get(key).cloned()
    }
}

impl SettingsSource for StaticSettings {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let inner = self.inner.lock();
        if inner.unavailable {
            return Err(RecError::ConfigurationUnavailable(format!("{key}: settings offline")));
        }
        Ok(inner.values.get(key).cloned())
    }

    fn update(&mut self, key: &str, value: Value) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.unavailable {
            return Err(RecError::ConfigurationUnavailable(format!("{key}: settings offline")));
        }
        inner.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Everything a [`RecordingUi`] was asked to do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiLog {
    pub consent_refreshes: usize,
    pub last_consent: Option<ConsentState>,
    pub welcomes: usize,
    pub settings_opened: usize,
    pub opened_urls: Vec<String>,
    pub views_enabled: usize,
    /// Request ids of rendered sessions, in order.
    pub rendered: Vec<String>,
}

#[derive(Debug)]
struct UiInner {
    log: UiLog,
    render: bool,
    fail_actions: bool,
}

#[derive(Debug, Clone)]
pub struct RecordingUi {
    inner: Arc<Mutex<UiInner>>,
}

impl Default for RecordingUi {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingUi {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(UiInner {
                log: UiLog::default(),
                render: true,
                fail_actions: false,
            })),
        }
    }

    #[must_use]
    pub fn log(&self) -> UiLog {
        self.inner.lock().log.clone()
    }

    /// Whether `render_candidates` reports success.
    pub fn set_render(&self, render: bool) {
        self.inner.lock().render = render;
    }

    /// Make settings, link and view actions fail.
    pub fn fail_actions(&self, fail: bool) {
        self.inner.lock().fail_actions = fail;
    }

    fn action(&self, what: &str) -> Result<()> {
        if self.inner.lock().fail_actions {
            Err(RecError::Collaborator(format!("{what} unavailable")))
        } else {
            Ok(())
        }
    }
}

impl HostUi for RecordingUi {
    fn refresh_consent_surface(&mut self, consent: &ConsentState) {
        let mut inner = self.inner.lock();
        inner.log.consent_refreshes += 1;
        inner.log.last_consent = Some(*consent);
    }

    fn show_welcome(&mut self) {
        self.inner.lock().log.welcomes += 1;
    }

    fn open_settings(&mut self) -> Result<()> {
        self.action("settings")?;
        self.inner.lock().log.settings_opened += 1;
        Ok(())
    }

    fn open_url(&mut self, url: &str) -> Result<()> {
        self.action("browser")?;
        self.inner.lock().log.opened_urls.push(url.to_string());
        Ok(())
    }

    fn enable_suggestions_view(&mut self) -> Result<()> {
        self.action("view")?;
        self.inner.lock().log.views_enabled += 1;
        Ok(())
    }

    fn render_candidates(&mut self, session: &RecommendationSession) -> bool {
        let mut inner = self.inner.lock();
        if !inner.render || session.candidates.is_empty() {
            return false;
        }
        inner
            .log
            .rendered
            .push(session.request_id.clone().unwrap_or_default());
        true
    }
}

/// Fetcher that replays queued results in order.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    queue: VecDeque<Result<FetchResponse>>,
    requests: Vec<FetchRequest>,
}

impl ScriptedFetcher {
    #[must_use]
    pub fn new(responses: impl IntoIterator<Item = FetchResponse>) -> Self {
        Self {
            queue: responses.into_iter().map(Ok).collect(),
            requests: Vec::new(),
        }
    }

    /// A fetcher whose next call fails with `reason`.
    #[must_use]
    pub fn failing(reason: &str) -> Self {
        Self {
            queue: VecDeque::from([Err(RecError::Collaborator(reason.to_string()))]),
            requests: Vec::new(),
        }
    }

    #[must_use]
    pub fn response(request_id: &str, candidates: &[&str]) -> FetchResponse {
        FetchResponse {
            request_id: request_id.to_string(),
            candidates: candidates.iter().map(ToString::to_string).collect(),
            completion_type: "line".to_string(),
        }
    }

    #[must_use]
    pub fn requests(&self) -> &[FetchRequest] {
        &self.requests
    }
}

impl SuggestionFetcher for ScriptedFetcher {
    fn fetch(&mut self, request: &FetchRequest) -> Result<FetchResponse> {
        self.requests.push(request.clone());
        self.queue
            .pop_front()
            .unwrap_or_else(|| Err(RecError::Collaborator("no scripted response".to_string())))
    }
}

/// An activated coordinator wired to in-memory collaborators.
pub struct CoordinatorHarness {
    pub coordinator: Coordinator,
    pub store: MemoryStore,
    pub settings: StaticSettings,
    pub ui: RecordingUi,
    pub sink: MemorySink,
}

impl Default for CoordinatorHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordinatorHarness {
    /// Fresh install: nothing accepted, preview off.
    #[must_use]
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new(), false)
    }

    /// Terms accepted, preview on, automatic triggering on.
    #[must_use]
    pub fn consented() -> Self {
        Self::with_store(
            MemoryStore::with_entries([
                ("terms-accepted", true),
                ("auto-trigger-enabled", true),
                ("welcome-message-shown", true),
            ]),
            true,
        )
    }

    #[must_use]
    pub fn with_store(store: MemoryStore, preview: bool) -> Self {
        let settings = StaticSettings::new();
        settings.set(PREVIEW_ENABLED, Value::Bool(preview));
        let ui = RecordingUi::new();
        let sink = MemorySink::new();
        let mut coordinator = Coordinator::new(
            PersistedState::load(Box::new(store.clone())).expect("spawn state writer"),
            Box::new(settings.clone()),
            Box::new(ui.clone()),
            TelemetryRecorder::new(Box::new(sink.clone())),
            CoordinatorOptions::default(),
        );
        coordinator.activate();
        Self {
            coordinator,
            store,
            settings,
            ui,
            sink,
        }
    }

    /// Value in the backing store once queued writes have landed.
    #[must_use]
    pub fn stored(&self, key: &str) -> Option<bool> {
        self.coordinator.state().drain();
        self.store.value(key)
    }

    pub fn enable_preview(&self, enabled: bool) {
        self.settings.set(PREVIEW_ENABLED, Value::Bool(enabled));
    }

    /// Make `document` the active editor.
    pub fn focus(&mut self, document: &str) {
        self.coordinator.dispatch(HostEvent::ActiveEditorChanged {
            document: Some(DocumentId::new(document)),
        });
    }

    #[must_use]
    pub fn accept_args(request_id: &str, index: usize) -> AcceptArgs {
        AcceptArgs {
            line: 0,
            index,
            text: String::new(),
            request_id: request_id.to_string(),
            trigger_type: TriggerType::Manual,
            completion_type: "line".to_string(),
            language: "python".to_string(),
        }
    }
}
