use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RecError, Result};
use crate::suggestions::coordinator::{CoordinatorOptions, DEFAULT_INTRODUCTION_URL};
use crate::suggestions::trigger::PLAINTEXT_LANGUAGE;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub trigger: TriggerSection,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub links: LinksConfig,
    #[serde(default)]
    pub editor: EditorConfig,
}

impl Config {
    pub fn load(explicit_path: Option<&Path>, root: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("RECGATE_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            match Self::load_patch(&path)? {
                Some(patch) => config.merge_patch(patch),
                None => {
                    return Err(RecError::MissingConfig(format!(
                        "config file {} does not exist",
                        path.display()
                    )));
                }
            }
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_project(root)? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides()?;

        Ok(config)
    }

    /// Options handed to the coordinator.
    #[must_use]
    pub fn coordinator_options(&self) -> CoordinatorOptions {
        CoordinatorOptions {
            unsupported_languages: self.trigger.unsupported_languages.clone(),
            introduction_url: self.links.introduction_url.clone(),
            apply_editor_defaults: self.editor.apply_defaults,
        }
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(dir) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&dir.join("recgate/config.toml"))
    }

    fn load_project(root: &Path) -> Result<Option<ConfigPatch>> {
        Self::load_patch(&root.join("config.toml"))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| RecError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| RecError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.trigger {
            self.trigger.merge(patch);
        }
        if let Some(patch) = patch.telemetry {
            self.telemetry.merge(patch);
        }
        if let Some(patch) = patch.links {
            self.links.merge(patch);
        }
        if let Some(patch) = patch.editor {
            self.editor.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if env_bool("RECGATE_TELEMETRY_DISABLED").unwrap_or(false) {
            self.telemetry.enabled = false;
        }

        if let Some(values) = env_list("RECGATE_TRIGGER_UNSUPPORTED_LANGUAGES") {
            self.trigger.unsupported_languages =
                merge_unique(values, &self.trigger.unsupported_languages);
        }

        if let Some(value) = env_bool("RECGATE_TELEMETRY_ENABLED") {
            self.telemetry.enabled = value;
        }
        if let Some(value) = env_string("RECGATE_TELEMETRY_FILE") {
            self.telemetry.file = PathBuf::from(value);
        }

        if let Some(value) = env_string("RECGATE_LINKS_INTRODUCTION_URL") {
            if value.trim().is_empty() {
                return Err(RecError::Config(
                    "RECGATE_LINKS_INTRODUCTION_URL must not be empty".to_string(),
                ));
            }
            self.links.introduction_url = value;
        }

        if let Some(value) = env_bool("RECGATE_EDITOR_APPLY_DEFAULTS") {
            self.editor.apply_defaults = value;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerSection {
    /// Language ids that never get automatic suggestions.
    #[serde(default)]
    pub unsupported_languages: Vec<String>,
}

impl Default for TriggerSection {
    fn default() -> Self {
        Self {
            unsupported_languages: vec![PLAINTEXT_LANGUAGE.to_string()],
        }
    }
}

impl TriggerSection {
    fn merge(&mut self, patch: TriggerPatch) {
        if let Some(values) = patch.unsupported_languages {
            self.unsupported_languages = merge_unique(values, &self.unsupported_languages);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Decision log, relative to the recgate root unless absolute.
    #[serde(default)]
    pub file: PathBuf,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file: PathBuf::from("telemetry.jsonl"),
        }
    }
}

impl TelemetryConfig {
    fn merge(&mut self, patch: TelemetryPatch) {
        if let Some(value) = patch.enabled {
            self.enabled = value;
        }
        if let Some(value) = patch.file {
            self.file = value;
        }
    }

    #[must_use]
    pub fn resolve_file(&self, root: &Path) -> PathBuf {
        if self.file.is_absolute() {
            self.file.clone()
        } else {
            root.join(&self.file)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinksConfig {
    #[serde(default)]
    pub introduction_url: String,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            introduction_url: DEFAULT_INTRODUCTION_URL.to_string(),
        }
    }
}

impl LinksConfig {
    fn merge(&mut self, patch: LinksPatch) {
        if let Some(value) = patch.introduction_url {
            self.introduction_url = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Write the completion-widget defaults on activation.
    #[serde(default)]
    pub apply_defaults: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            apply_defaults: true,
        }
    }
}

impl EditorConfig {
    fn merge(&mut self, patch: EditorPatch) {
        if let Some(value) = patch.apply_defaults {
            self.apply_defaults = value;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    trigger: Option<TriggerPatch>,
    telemetry: Option<TelemetryPatch>,
    links: Option<LinksPatch>,
    editor: Option<EditorPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TriggerPatch {
    unsupported_languages: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TelemetryPatch {
    enabled: Option<bool>,
    file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct LinksPatch {
    introduction_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct EditorPatch {
    apply_defaults: Option<bool>,
}

fn merge_unique(values: Vec<String>, existing: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in values.into_iter().chain(existing.iter().cloned()) {
        if seen.insert(value.to_lowercase()) {
            out.push(value);
        }
    }
    out
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|value| {
        matches!(
            value.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn env_list(key: &str) -> Option<Vec<String>> {
    std::env::var(key).ok().map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(ToString::to_string)
            .collect()
    })
}
