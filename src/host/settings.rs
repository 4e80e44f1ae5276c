//! Live editor settings.
//!
//! Settings are read through [`SettingsSource`] on every decision. Reads that
//! fail or return nothing fall back to the "feature off" value.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{RecError, Result};

pub const PREVIEW_ENABLED: &str = "recgate.preview.enabled";
pub const TAB_SIZE: &str = "editor.tabSize";
pub const AUTO_CLOSING_BRACKETS: &str = "editor.autoClosingBrackets";
pub const SUGGEST_SHOW_METHODS: &str = "editor.suggest.showMethods";
pub const SUGGEST_PREVIEW: &str = "editor.suggest.preview";
pub const ACCEPT_ON_ENTER: &str = "editor.acceptSuggestionOnEnter";
pub const SNIPPET_SUGGESTIONS: &str = "editor.snippetSuggestions";

pub const DEFAULT_TAB_SIZE: u32 = 4;
pub const DEFAULT_AUTO_CLOSING_BRACKETS: &str = "languageDefined";

pub trait SettingsSource {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn update(&mut self, key: &str, value: Value) -> Result<()>;
}

/// Editor settings written once at activation so suggestions integrate with
/// the completion widget.
#[must_use]
pub fn editor_defaults() -> Vec<(&'static str, Value)> {
    vec![
        (SUGGEST_SHOW_METHODS, Value::Bool(true)),
        (SUGGEST_PREVIEW, Value::Bool(true)),
        (ACCEPT_ON_ENTER, Value::String("on".to_string())),
        (SNIPPET_SUGGESTIONS, Value::String("top".to_string())),
    ]
}

/// Read a boolean setting, failing closed.
pub fn read_bool(source: &dyn SettingsSource, key: &str) -> bool {
    match source.get(key) {
        Ok(Some(Value::Bool(value))) => value,
        Ok(Some(other)) => {
            debug!(target: "recgate::settings", key, value = %other, "non-boolean setting treated as off");
            false
        }
        Ok(None) => false,
        Err(err) => {
            debug!(target: "recgate::settings", key, error = %err, "setting unavailable; treated as off");
            false
        }
    }
}

pub fn read_u32(source: &dyn SettingsSource, key: &str, default: u32) -> u32 {
    match source.get(key) {
        Ok(Some(value)) => value
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(default),
        Ok(None) => default,
        Err(err) => {
            debug!(target: "recgate::settings", key, error = %err, "setting unavailable; using default");
            default
        }
    }
}

pub fn read_string(source: &dyn SettingsSource, key: &str, default: &str) -> String {
    match source.get(key) {
        Ok(Some(Value::String(value))) => value,
        Ok(_) => default.to_string(),
        Err(err) => {
            debug!(target: "recgate::settings", key, error = %err, "setting unavailable; using default");
            default.to_string()
        }
    }
}

/// Settings backed by a flat JSON object on disk, re-read on every access so
/// edits made by other processes are always visible.
#[derive(Debug, Clone)]
pub struct FileSettings {
    path: PathBuf,
}

impl FileSettings {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let raw = std::fs::read_to_string(&self.path).map_err(|err| {
            RecError::ConfigurationUnavailable(format!("read {}: {err}", self.path.display()))
        })?;
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(RecError::ConfigurationUnavailable(format!(
                "{} is not a JSON object",
                self.path.display()
            ))),
            Err(err) => Err(RecError::ConfigurationUnavailable(format!(
                "parse {}: {err}",
                self.path.display()
            ))),
        }
    }
}

impl SettingsSource for FileSettings {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.read_all()?.get(key).cloned())
    }

    fn update(&mut self, key: &str, value: Value) -> Result<()> {
        let mut map = self.read_all()?;
        map.insert(key.to_string(), value);
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(&Value::Object(map))
            .map_err(|err| RecError::Serialization(format!("settings serialize: {err}")))?;
        std::fs::write(&self.path, payload)?;
        Ok(())
    }
}
