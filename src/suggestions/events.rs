//! Host events and commands consumed by the coordinator.

use serde::{Deserialize, Serialize};

use crate::host::DocumentId;

/// How a recommendation was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    Manual,
    Automatic,
}

impl TriggerType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Automatic => "automatic",
        }
    }
}

impl std::fmt::Display for TriggerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explicit invocation of the suggestion command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualTrigger {
    pub document: DocumentId,
    pub language: String,
    #[serde(default)]
    pub line: u32,
}

/// One edit within a text-change event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentChange {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub range_length: u32,
}

/// Text changed in some document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChange {
    pub document: DocumentId,
    pub language: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub changes: Vec<ContentChange>,
}

/// What caused a selection change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionOrigin {
    Pointer,
    Keyboard,
    Command,
}

/// Set of settings keys touched by a configuration change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationChange {
    #[serde(default)]
    pub keys: Vec<String>,
}

impl ConfigurationChange {
    #[must_use]
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// True when `key` or any section containing it changed.
    #[must_use]
    pub fn affects(&self, key: &str) -> bool {
        self.keys.iter().any(|changed| {
            changed == key
                || key
                    .strip_prefix(changed.as_str())
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }
}

/// Every event the host can deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    InvokeSuggestion(ManualTrigger),
    TextChanged(TextChange),
    DocumentSaved { document: DocumentId },
    ActiveEditorChanged { document: Option<DocumentId> },
    VisibleEditorsChanged,
    SelectionChanged { origin: SelectionOrigin },
    DocumentClosed { document: DocumentId },
    ConfigurationChanged(ConfigurationChange),
    Shutdown,
}

impl HostEvent {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvokeSuggestion(_) => "invoke_suggestion",
            Self::TextChanged(_) => "text_changed",
            Self::DocumentSaved { .. } => "document_saved",
            Self::ActiveEditorChanged { .. } => "active_editor_changed",
            Self::VisibleEditorsChanged => "visible_editors_changed",
            Self::SelectionChanged { .. } => "selection_changed",
            Self::DocumentClosed { .. } => "document_closed",
            Self::ConfigurationChanged(_) => "configuration_changed",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Arguments of the accept-recommendation command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptArgs {
    #[serde(default)]
    pub line: u32,
    pub index: usize,
    #[serde(default)]
    pub text: String,
    pub request_id: String,
    pub trigger_type: TriggerType,
    #[serde(default)]
    pub completion_type: String,
    #[serde(default)]
    pub language: String,
}

/// Commands exposed to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum Command {
    PauseSuggestions,
    ResumeSuggestions,
    AcceptTerms,
    CancelTerms,
    OpenSettings,
    OpenIntroduction,
    InvokeSuggestion(ManualTrigger),
    AcceptRecommendation(AcceptArgs),
    EnableSuggestionsView,
}

impl Command {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PauseSuggestions => "pause-suggestions",
            Self::ResumeSuggestions => "resume-suggestions",
            Self::AcceptTerms => "accept-terms",
            Self::CancelTerms => "cancel-terms",
            Self::OpenSettings => "open-settings",
            Self::OpenIntroduction => "open-introduction",
            Self::InvokeSuggestion(_) => "invoke-suggestion",
            Self::AcceptRecommendation(_) => "accept-recommendation",
            Self::EnableSuggestionsView => "enable-suggestions-view",
        }
    }
}
