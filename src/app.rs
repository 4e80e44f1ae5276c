use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::Config;
use crate::error::{RecError, Result};
use crate::host::{FileSettings, TerminalUi};
use crate::state::{KeyValueStore, PersistedState, SqliteStore};
use crate::suggestions::coordinator::Coordinator;
use crate::suggestions::telemetry::{NullSink, TelemetryRecorder, TelemetrySink};
use crate::suggestions::telemetry_storage::JsonlSink;

pub struct AppContext {
    pub root: PathBuf,
    pub config: Config,
    pub robot_mode: bool,
    pub verbosity: u8,
}

impl AppContext {
    pub fn from_cli(cli: &crate::cli::Cli) -> Result<Self> {
        let root = Self::find_root()?;
        let config = Config::load(cli.config.as_deref(), &root)?;
        debug!(target: "recgate::activation", root = %root.display(), "recgate root resolved");

        Ok(Self {
            root,
            config,
            robot_mode: cli.robot,
            verbosity: cli.verbose,
        })
    }

    #[must_use]
    pub fn state_db_path(&self) -> PathBuf {
        self.root.join("state.db")
    }

    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.root.join("settings.json")
    }

    #[must_use]
    pub fn telemetry_path(&self) -> PathBuf {
        self.config.telemetry.resolve_file(&self.root)
    }

    /// Sink for decision records: the JSON-lines file, or nothing when
    /// telemetry is disabled.
    pub fn telemetry_sink(&self) -> Result<Box<dyn TelemetrySink>> {
        if self.config.telemetry.enabled {
            Ok(Box::new(JsonlSink::open(self.telemetry_path())?))
        } else {
            Ok(Box::new(NullSink))
        }
    }

    /// Open the store and sinks under the root and build an activated
    /// coordinator. The returned UI handle shares notices with the one inside
    /// the coordinator.
    pub fn coordinator(&self, launch: bool) -> Result<(Coordinator, TerminalUi)> {
        let store = SqliteStore::open(self.state_db_path())?;
        let sink = self.telemetry_sink()?;
        self.build_coordinator(Box::new(store), self.settings_path(), sink, launch)
    }

    pub fn build_coordinator(
        &self,
        store: Box<dyn KeyValueStore>,
        settings_path: PathBuf,
        sink: Box<dyn TelemetrySink>,
        launch: bool,
    ) -> Result<(Coordinator, TerminalUi)> {
        let ui = TerminalUi::new(Some(settings_path.clone()), launch);
        let mut coordinator = Coordinator::new(
            PersistedState::load(store)?,
            Box::new(FileSettings::new(settings_path)),
            Box::new(ui.clone()),
            TelemetryRecorder::new(sink),
            self.config.coordinator_options(),
        );
        coordinator.activate();
        Ok((coordinator, ui))
    }

    fn find_root() -> Result<PathBuf> {
        if let Ok(root) = std::env::var("RECGATE_ROOT") {
            return Ok(PathBuf::from(root));
        }
        let cwd = std::env::current_dir()?;
        if let Some(found) = find_upwards(&cwd, ".recgate") {
            return Ok(found);
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| RecError::MissingConfig("data directory not found".to_string()))?;
        Ok(data_dir.join("recgate"))
    }
}

fn find_upwards(start: &Path, name: &str) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        let candidate = dir.join(name);
        if candidate.is_dir() {
            return Some(candidate);
        }
        current = dir.parent();
    }
    None
}
