//! Trigger arbitration: should this event open a recommendation?

use serde::{Deserialize, Serialize};

use crate::host::DocumentId;
use crate::host::settings::{DEFAULT_AUTO_CLOSING_BRACKETS, DEFAULT_TAB_SIZE};

use super::consent::TriggerConfig;
use super::events::{ManualTrigger, TextChange, TriggerType};

/// Language id that never receives automatic suggestions by default.
pub const PLAINTEXT_LANGUAGE: &str = "plaintext";

/// Editor state the coordinator tracks between events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorContext {
    pub active_document: Option<DocumentId>,
    pub tab_size: u32,
    pub auto_closing_brackets: String,
}

impl Default for EditorContext {
    fn default() -> Self {
        Self {
            active_document: None,
            tab_size: DEFAULT_TAB_SIZE,
            auto_closing_brackets: DEFAULT_AUTO_CLOSING_BRACKETS.to_string(),
        }
    }
}

/// An event that may start a recommendation.
#[derive(Debug, Clone, Copy)]
pub enum TriggerEvent<'a> {
    Manual(&'a ManualTrigger),
    Automatic(&'a TextChange),
}

/// Everything needed to open a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionParams {
    pub trigger_type: TriggerType,
    pub document: DocumentId,
    pub language: String,
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressReason {
    ManualNotAllowed,
    AutomaticNotAllowed,
    InactiveDocument,
    UnsupportedLanguage,
    EmptyChange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Suppress(SuppressReason),
    Open(SessionParams),
}

#[derive(Debug, Clone)]
pub struct TriggerArbiter {
    unsupported_languages: Vec<String>,
}

impl Default for TriggerArbiter {
    fn default() -> Self {
        Self::new(vec![PLAINTEXT_LANGUAGE.to_string()])
    }
}

impl TriggerArbiter {
    #[must_use]
    pub fn new(unsupported_languages: Vec<String>) -> Self {
        Self {
            unsupported_languages,
        }
    }

    #[must_use]
    pub fn is_supported(&self, language: &str) -> bool {
        !self
            .unsupported_languages
            .iter()
            .any(|sentinel| sentinel.eq_ignore_ascii_case(language))
    }

    /// Decide whether `event` opens a session under `config`.
    ///
    /// `config` must be sampled immediately before the call.
    #[must_use]
    pub fn evaluate(
        &self,
        event: TriggerEvent<'_>,
        config: &TriggerConfig,
        editor: &EditorContext,
    ) -> Verdict {
        match event {
            TriggerEvent::Manual(trigger) => {
                if !config.manual_allowed {
                    return Verdict::Suppress(SuppressReason::ManualNotAllowed);
                }
                Verdict::Open(SessionParams {
                    trigger_type: TriggerType::Manual,
                    document: trigger.document.clone(),
                    language: trigger.language.clone(),
                    line: trigger.line,
                })
            }
            TriggerEvent::Automatic(change) => {
                if editor.active_document.as_ref() != Some(&change.document) {
                    return Verdict::Suppress(SuppressReason::InactiveDocument);
                }
                if !self.is_supported(&change.language) {
                    return Verdict::Suppress(SuppressReason::UnsupportedLanguage);
                }
                if change.changes.is_empty() {
                    return Verdict::Suppress(SuppressReason::EmptyChange);
                }
                if !config.automatic_allowed {
                    return Verdict::Suppress(SuppressReason::AutomaticNotAllowed);
                }
                Verdict::Open(SessionParams {
                    trigger_type: TriggerType::Automatic,
                    document: change.document.clone(),
                    language: change.language.clone(),
                    line: change.line,
                })
            }
        }
    }
}
