//! The recommendation session slot.
//!
//! At most one session is live at a time. The slot owns it from the moment a
//! trigger opens it until it is resolved, at which point it is evicted and
//! handed back to the caller as a [`ResolvedSession`] for recording. Because a
//! resolved session never re-enters the slot, resolving twice is impossible:
//! the second attempt finds nothing.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::host::DocumentId;

use super::events::TriggerType;
use super::fetch::FetchResponse;
use super::trigger::SessionParams;

/// Monotonically assigned session identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Requested,
    Displayed,
    Resolved,
}

/// Terminal outcome of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Accepted(usize),
    Rejected,
    Superseded,
}

impl Resolution {
    /// Index reported to telemetry: the chosen candidate, or -1.
    #[must_use]
    pub fn decision_index(&self) -> i64 {
        match self {
            Self::Accepted(index) => i64::try_from(*index).unwrap_or(i64::MAX),
            Self::Rejected | Self::Superseded => -1,
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Accepted(_) => "accepted",
            Self::Rejected => "rejected",
            Self::Superseded => "superseded",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationSession {
    pub id: SessionId,
    pub request_id: Option<String>,
    pub trigger_type: TriggerType,
    pub completion_type: String,
    pub language: String,
    pub document: DocumentId,
    pub origin_line: u32,
    pub candidates: Vec<String>,
    pub state: SessionState,
    pub resolution: Option<Resolution>,
}

impl RecommendationSession {
    fn new(id: SessionId, params: SessionParams) -> Self {
        Self {
            id,
            request_id: None,
            trigger_type: params.trigger_type,
            completion_type: String::new(),
            language: params.language,
            document: params.document,
            origin_line: params.line,
            candidates: Vec::new(),
            state: SessionState::Requested,
            resolution: None,
        }
    }
}

/// A session that left the slot with its resolution fixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSession {
    session: RecommendationSession,
    resolution: Resolution,
}

impl ResolvedSession {
    #[must_use]
    pub const fn session(&self) -> &RecommendationSession {
        &self.session
    }

    #[must_use]
    pub const fn resolution(&self) -> Resolution {
        self.resolution
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    Filled { candidates: usize },
    Stale,
}

#[derive(Debug, Default)]
pub struct SessionSlot {
    current: Option<RecommendationSession>,
    last_id: u64,
}

impl SessionSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn current(&self) -> Option<&RecommendationSession> {
        self.current.as_ref()
    }

    /// True when `id` names the live session.
    #[must_use]
    pub fn is_current(&self, id: SessionId) -> bool {
        self.current.as_ref().is_some_and(|session| session.id == id)
    }

    /// True when `id` is the live session and its fetch is still outstanding.
    #[must_use]
    pub fn is_awaiting(&self, id: SessionId) -> bool {
        self.current
            .as_ref()
            .is_some_and(|session| session.id == id && session.state == SessionState::Requested)
    }

    /// Open a new session. Any live session is superseded first and returned.
    pub fn open(&mut self, params: SessionParams) -> (SessionId, Option<ResolvedSession>) {
        let superseded = self.resolve(Resolution::Superseded);
        self.last_id += 1;
        let id = SessionId(self.last_id);
        debug!(target: "recgate::session", session = %id, trigger = %params.trigger_type, "session opened");
        self.current = Some(RecommendationSession::new(id, params));
        (id, superseded)
    }

    /// Attach a fetch result to session `id` if it is still live and waiting.
    pub fn fill(&mut self, id: SessionId, response: FetchResponse) -> FillOutcome {
        let Some(session) = self.current.as_mut() else {
            return FillOutcome::Stale;
        };
        if session.id != id || session.state != SessionState::Requested {
            return FillOutcome::Stale;
        }
        session.request_id = Some(response.request_id);
        session.completion_type = response.completion_type;
        session.candidates = response.candidates;
        FillOutcome::Filled {
            candidates: session.candidates.len(),
        }
    }

    /// Requested → Displayed for session `id`.
    pub fn mark_displayed(&mut self, id: SessionId) -> bool {
        match self.current.as_mut() {
            Some(session) if session.id == id && session.state == SessionState::Requested => {
                session.state = SessionState::Displayed;
                true
            }
            _ => false,
        }
    }

    /// Resolve and evict the live session, if any.
    pub fn resolve(&mut self, resolution: Resolution) -> Option<ResolvedSession> {
        let session = self.current.take()?;
        Some(Self::take_resolved(session, resolution))
    }

    /// Resolve only if `id` is still the live session.
    pub fn resolve_if(&mut self, id: SessionId, resolution: Resolution) -> Option<ResolvedSession> {
        if self.is_current(id) {
            self.resolve(resolution)
        } else {
            None
        }
    }

    fn take_resolved(mut session: RecommendationSession, resolution: Resolution) -> ResolvedSession {
        session.state = SessionState::Resolved;
        session.resolution = Some(resolution);
        debug!(target: "recgate::session", session = %session.id, outcome = resolution.label(), "session resolved");
        ResolvedSession {
            session,
            resolution,
        }
    }
}
