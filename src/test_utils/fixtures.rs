use std::path::PathBuf;

use serde_json::{Map, Value};
use tempfile::TempDir;

use crate::host::settings::PREVIEW_ENABLED;

/// Isolated recgate root in a temporary directory.
pub struct UnitTestFixture {
    pub temp_dir: TempDir,
    pub data_path: PathBuf,
}

impl Default for UnitTestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitTestFixture {
    #[must_use]
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_path = temp_dir.path().to_path_buf();

        println!("[FIXTURE] Created temp directory: {data_path:?}");

        Self {
            temp_dir,
            data_path,
        }
    }

    /// Create a file with content under the root.
    #[must_use]
    pub fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let full_path = self.data_path.join(relative_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&full_path, content).expect("Failed to write file");
        println!(
            "[FIXTURE] Created file: {:?} ({} bytes)",
            full_path,
            content.len()
        );
        full_path
    }

    /// Write `settings.json` from key/value pairs.
    #[must_use]
    pub fn write_settings(&self, entries: &[(&str, Value)]) -> PathBuf {
        let map: Map<String, Value> = entries
            .iter()
            .map(|(key, value)| ((*key).to_string(), value.clone()))
            .collect();
        let content = serde_json::to_string_pretty(&Value::Object(map))
            .expect("Failed to serialize settings");
        self.create_file("settings.json", &content)
    }

    /// Write `settings.json` with only the preview flag set.
    #[must_use]
    pub fn with_preview(&self, enabled: bool) -> PathBuf {
        self.write_settings(&[(PREVIEW_ENABLED, Value::Bool(enabled))])
    }
}

impl Drop for UnitTestFixture {
    fn drop(&mut self) {
        println!("[FIXTURE] Cleaning up temp directory: {:?}", self.data_path);
    }
}
