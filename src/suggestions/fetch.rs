//! Request/response types exchanged with the suggestion fetch client.

use serde::{Deserialize, Serialize};

use crate::host::DocumentId;

use super::events::TriggerType;
use super::session::SessionId;

/// Handle tying a fetch to the session that asked for it.
///
/// The host passes the ticket back with the result; a ticket whose session
/// is no longer current is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchTicket {
    pub session: SessionId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub ticket: FetchTicket,
    pub trigger_type: TriggerType,
    pub document: DocumentId,
    pub language: String,
    pub line: u32,
    pub tab_size: u32,
    pub auto_closing_brackets: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FetchResponse {
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub candidates: Vec<String>,
    #[serde(default)]
    pub completion_type: String,
}

/// What happened to a fetch result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "disposition", rename_all = "snake_case")]
pub enum FetchDisposition {
    Displayed { candidates: usize },
    /// Zero candidates; the session was rejected.
    NoSuggestions,
    /// The display surface showed nothing; the session was rejected.
    NotRendered,
    /// The fetch client failed; the session was rejected.
    Failed,
    /// The session was already resolved or replaced; result dropped.
    Stale,
}
