//! recgate replay <script.json>
//!
//! Feeds a scripted sequence of host events, commands and fetch completions
//! through one coordinator and reports every outcome together with the
//! decision records produced along the way.
//!
//! By default the script runs against a throwaway world: an in-memory store
//! seeded from the script's `state`, and a settings file in a temporary
//! directory seeded from its `settings`. `--persist` runs it against the real
//! root instead.
//!
//! ```json
//! {
//!   "settings": { "recgate.preview.enabled": true },
//!   "state": { "terms-accepted": true, "auto-trigger-enabled": true },
//!   "steps": [
//!     { "event": { "type": "active_editor_changed", "document": "file:///a.py" } },
//!     { "event": { "type": "invoke_suggestion", "document": "file:///a.py", "language": "python", "line": 3 } },
//!     { "complete_fetch": { "response": { "candidates": ["print()"] } } },
//!     { "accept_displayed": { "index": 0 } }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tempfile::TempDir;
use tracing::{debug, info};
use uuid::Uuid;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok};
use crate::error::{RecError, Result};
use crate::host::TerminalUi;
use crate::host::settings::{FileSettings, SettingsSource};
use crate::state::{KeyValueStore, SqliteStore, StateKey};
use crate::suggestions::coordinator::{Coordinator, CoordinatorStatus, Dispatch};
use crate::suggestions::events::{AcceptArgs, Command, HostEvent};
use crate::suggestions::fetch::{FetchRequest, FetchResponse};
use crate::suggestions::telemetry::{DecisionRecord, NullSink, TelemetrySink};

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Script file (JSON)
    pub script: PathBuf,

    /// Run against the persisted store, settings and telemetry under the root
    #[arg(long)]
    pub persist: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplayScript {
    #[serde(default)]
    pub settings: Map<String, Value>,
    #[serde(default)]
    pub state: BTreeMap<String, bool>,
    pub steps: Vec<ReplayStep>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayStep {
    Event(HostEvent),
    Command(Command),
    /// Write one live setting. Follow with a `configuration_changed` event.
    SetSetting { key: String, value: Value },
    /// Deliver a response for the `fetch`-th fetch request (0-based), or the
    /// most recent one when omitted.
    CompleteFetch {
        #[serde(default)]
        fetch: Option<usize>,
        response: FetchResponse,
    },
    FailFetch {
        #[serde(default)]
        fetch: Option<usize>,
        reason: String,
    },
    /// Accept candidate `index` of whatever session is displayed.
    AcceptDisplayed { index: usize },
}

impl ReplayStep {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Event(_) => "event",
            Self::Command(_) => "command",
            Self::SetSetting { .. } => "set_setting",
            Self::CompleteFetch { .. } => "complete_fetch",
            Self::FailFetch { .. } => "fail_fetch",
            Self::AcceptDisplayed { .. } => "accept_displayed",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub step: &'static str,
    pub outcome: Value,
    pub summary: String,
}

#[derive(Debug, Serialize)]
pub struct ReplayReport {
    pub steps: Vec<StepReport>,
    pub decisions: Vec<DecisionRecord>,
    pub final_status: CoordinatorStatus,
}

/// Forwards to another sink while keeping a copy of every record.
struct CollectingSink {
    inner: Box<dyn TelemetrySink>,
    records: Arc<Mutex<Vec<DecisionRecord>>>,
}

impl TelemetrySink for CollectingSink {
    fn emit(&mut self, record: &DecisionRecord) -> Result<()> {
        self.records.lock().push(record.clone());
        self.inner.emit(record)
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }
}

pub fn run(ctx: &AppContext, args: &ReplayArgs) -> Result<()> {
    let script = load_script(&args.script)?;
    let records = Arc::new(Mutex::new(Vec::new()));

    // Holds the throwaway settings file until the replay finishes.
    let sandbox = if args.persist {
        None
    } else {
        Some(TempDir::new()?)
    };
    let (mut store, settings_path, sink): (Box<dyn KeyValueStore>, PathBuf, Box<dyn TelemetrySink>) =
        match &sandbox {
            None => (
                Box::new(SqliteStore::open(ctx.state_db_path())?),
                ctx.settings_path(),
                ctx.telemetry_sink()?,
            ),
            Some(dir) => (
                Box::new(SqliteStore::open_in_memory()?),
                dir.path().join("settings.json"),
                Box::new(NullSink),
            ),
        };

    seed_state(store.as_mut(), &script.state)?;
    let mut settings = FileSettings::new(settings_path.clone());
    for (key, value) in &script.settings {
        settings.update(key, value.clone())?;
    }

    let sink = Box::new(CollectingSink {
        inner: sink,
        records: Arc::clone(&records),
    });
    let (mut coordinator, ui) = ctx.build_coordinator(store, settings_path, sink, false)?;

    let report = {
        let mut runner = Runner {
            coordinator: &mut coordinator,
            settings: &mut settings,
            ui: &ui,
            fetches: Vec::new(),
        };
        let mut steps = Vec::with_capacity(script.steps.len());
        for (index, step) in script.steps.into_iter().enumerate() {
            steps.push(runner.step(index, step)?);
        }
        steps
    };

    coordinator.shutdown();
    info!(target: "recgate::replay", steps = report.len(), decisions = records.lock().len(), "replay finished");

    let replay = ReplayReport {
        steps: report,
        decisions: records.lock().clone(),
        final_status: coordinator.status(),
    };

    drop(sandbox);

    if ctx.robot_mode {
        return emit_json(&robot_ok(replay, ui.take_notices()));
    }
    emit_human(human_layout(&replay));
    Ok(())
}

pub fn load_script(path: &std::path::Path) -> Result<ReplayScript> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| RecError::Replay(format!("read {}: {err}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|err| RecError::Replay(format!("parse {}: {err}", path.display())))
}

fn seed_state(store: &mut dyn KeyValueStore, state: &BTreeMap<String, bool>) -> Result<()> {
    for (key, value) in state {
        if !StateKey::all().iter().any(|known| known.as_str() == key.as_str()) {
            return Err(RecError::Replay(format!("unknown state key {key}")));
        }
        store.put(key, *value)?;
    }
    Ok(())
}

struct Runner<'a> {
    coordinator: &'a mut Coordinator,
    settings: &'a mut FileSettings,
    ui: &'a TerminalUi,
    fetches: Vec<FetchRequest>,
}

impl Runner<'_> {
    fn step(&mut self, index: usize, step: ReplayStep) -> Result<StepReport> {
        let kind = step.kind();
        debug!(target: "recgate::replay", index, step = kind, "step");

        let (outcome, summary) = match step {
            ReplayStep::Event(event) => {
                let dispatch = self.coordinator.dispatch(event);
                self.dispatched(dispatch)?
            }
            ReplayStep::Command(command) => {
                let dispatch = self.coordinator.execute(command);
                self.dispatched(dispatch)?
            }
            ReplayStep::SetSetting { key, value } => {
                self.settings.update(&key, value.clone())?;
                (Value::Null, format!("{key} = {value}"))
            }
            ReplayStep::CompleteFetch { fetch, mut response } => {
                let request = self.fetch(fetch)?;
                if response.request_id.is_empty() {
                    response.request_id = Uuid::new_v4().to_string();
                }
                let disposition = self.coordinator.complete_fetch(request.ticket, Ok(response));
                (to_value(&disposition)?, format!("session {}: {disposition:?}", request.ticket.session))
            }
            ReplayStep::FailFetch { fetch, reason } => {
                let request = self.fetch(fetch)?;
                let disposition = self
                    .coordinator
                    .complete_fetch(request.ticket, Err(RecError::Collaborator(reason)));
                (to_value(&disposition)?, format!("session {}: {disposition:?}", request.ticket.session))
            }
            ReplayStep::AcceptDisplayed { index: candidate } => {
                let Some(session) = self.coordinator.current_session() else {
                    return Err(RecError::Replay(format!(
                        "step {index}: no displayed session to accept"
                    )));
                };
                let args = AcceptArgs {
                    line: session.origin_line,
                    index: candidate,
                    text: session.candidates.get(candidate).cloned().unwrap_or_default(),
                    request_id: session.request_id.clone().unwrap_or_default(),
                    trigger_type: session.trigger_type,
                    completion_type: session.completion_type.clone(),
                    language: session.language.clone(),
                };
                let dispatch = self.coordinator.execute(Command::AcceptRecommendation(args));
                self.dispatched(dispatch)?
            }
        };

        for notice in self.ui.take_notices() {
            debug!(target: "recgate::replay", index, notice = %notice, "ui");
        }
        Ok(StepReport {
            index,
            step: kind,
            outcome,
            summary,
        })
    }

    fn dispatched(&mut self, dispatch: Dispatch) -> Result<(Value, String)> {
        if let Dispatch::Fetch(request) = &dispatch {
            self.fetches.push(request.clone());
        }
        Ok((to_value(&dispatch)?, super::describe(&dispatch)))
    }

    fn fetch(&self, which: Option<usize>) -> Result<FetchRequest> {
        let found = match which {
            Some(n) => self.fetches.get(n),
            None => self.fetches.last(),
        };
        found.cloned().ok_or_else(|| {
            RecError::Replay(format!(
                "no fetch request {} ({} issued so far)",
                which.map_or_else(|| "latest".to_string(), |n| n.to_string()),
                self.fetches.len()
            ))
        })
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|err| RecError::Serialization(format!("replay outcome: {err}")))
}

fn human_layout(replay: &ReplayReport) -> HumanLayout {
    let mut layout = HumanLayout::new();
    layout.title("recgate replay").section("Steps");
    for step in &replay.steps {
        layout.push_line(format!("{:>3}  {:<16} {}", step.index, step.step, step.summary));
    }
    layout.blank().section("Decisions");
    if replay.decisions.is_empty() {
        layout.push_line("none");
    }
    for record in &replay.decisions {
        layout.bullet(&format!(
            "session {} {} (index {}, {}, request {})",
            record.session_id,
            record.outcome,
            record.decision_index,
            record.trigger_type,
            if record.request_id.is_empty() { "-" } else { &record.request_id }
        ));
    }
    layout
        .blank()
        .flag("manual allowed", replay.final_status.manual_allowed)
        .flag("automatic allowed", replay.final_status.automatic_allowed);
    layout
}
