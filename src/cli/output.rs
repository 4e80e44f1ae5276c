use chrono::{DateTime, Utc};
use console::style;
use serde::Serialize;

use crate::error::{RecError, Result};

#[derive(Serialize)]
pub struct RobotResponse<T> {
    pub status: RobotStatus,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub data: T,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RobotStatus {
    Ok,
    /// The command ran but the coordinator declined it.
    Refused { reason: String },
}

pub fn robot_ok<T: Serialize>(data: T, notices: Vec<String>) -> RobotResponse<T> {
    RobotResponse {
        status: RobotStatus::Ok,
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        data,
        notices,
    }
}

pub fn robot_refused<T: Serialize>(
    reason: impl Into<String>,
    data: T,
    notices: Vec<String>,
) -> RobotResponse<T> {
    RobotResponse {
        status: RobotStatus::Refused {
            reason: reason.into(),
        },
        ..robot_ok(data, notices)
    }
}

pub fn emit_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value)
        .map_err(|err| RecError::Serialization(format!("serialize output: {err}")))?;
    println!("{payload}");
    Ok(())
}

pub struct HumanLayout {
    lines: Vec<String>,
    key_width: usize,
}

impl Default for HumanLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl HumanLayout {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lines: Vec::new(),
            key_width: 22,
        }
    }

    pub fn title(&mut self, text: &str) -> &mut Self {
        self.lines.push(style(text).bold().to_string());
        self.lines.push(String::new());
        self
    }

    pub fn section(&mut self, text: &str) -> &mut Self {
        self.lines.push(style(text).bold().to_string());
        self.lines.push("-".repeat(text.len().max(3)));
        self
    }

    pub fn kv(&mut self, key: &str, value: &str) -> &mut Self {
        let key_style = style(format!("{key:width$}", width = self.key_width))
            .dim()
            .to_string();
        self.lines.push(format!("{key_style} {value}"));
        self
    }

    pub fn flag(&mut self, key: &str, value: bool) -> &mut Self {
        let shown = if value {
            style("on").green().to_string()
        } else {
            style("off").red().to_string()
        };
        self.kv(key, &shown)
    }

    pub fn bullet(&mut self, text: &str) -> &mut Self {
        self.lines.push(format!("- {text}"));
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.lines.push(String::new());
        self
    }

    pub fn push_line(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.push(line.into());
        self
    }

    #[must_use]
    pub fn build(self) -> String {
        self.lines.join("\n")
    }
}

pub fn emit_human(layout: HumanLayout) {
    println!("{}", layout.build());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refused_response_shape() {
        let response = robot_refused("terms not accepted", serde_json::json!({"x": 1}), vec![]);
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"]["refused"]["reason"], "terms not accepted");
        assert_eq!(value["data"]["x"], 1);
        assert!(value.get("notices").is_none());
    }

    #[test]
    fn test_layout_lines() {
        console::set_colors_enabled(false);
        let mut layout = HumanLayout::new();
        layout.title("recgate").kv("root", "/tmp/r").flag("terms accepted", true);
        let text = layout.build();
        assert!(text.starts_with("recgate\n\n"));
        assert!(text.contains("root"));
        assert!(text.contains("/tmp/r"));
        assert!(text.ends_with("on"));
    }
}
