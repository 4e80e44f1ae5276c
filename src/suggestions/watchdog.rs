//! Implicit rejection.
//!
//! Editor activity that moves the user's attention away from a suggestion
//! rejects it: saving, switching or rearranging editors, clicking elsewhere.
//! Keyboard-driven selection changes are deliberately not signals, since
//! ordinary typing moves the caret constantly.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::events::{HostEvent, SelectionOrigin};
use super::session::{RecommendationSession, Resolution, ResolvedSession, SessionSlot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionSignal {
    DocumentSaved,
    VisibleEditorsChanged,
    ActiveEditorChanged,
    PointerSelection,
    SessionDocumentClosed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WatchdogStats {
    /// Signals that resolved a session.
    pub fired: u64,
    /// Signals that arrived with no live session.
    pub idle: u64,
}

#[derive(Debug, Default)]
pub struct RejectionWatchdog {
    stats: WatchdogStats,
}

impl RejectionWatchdog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a host event to a rejection signal.
    ///
    /// A closed document only counts when it is the one the live session was
    /// opened in.
    #[must_use]
    pub fn classify(
        event: &HostEvent,
        session: Option<&RecommendationSession>,
    ) -> Option<RejectionSignal> {
        match event {
            HostEvent::DocumentSaved { .. } => Some(RejectionSignal::DocumentSaved),
            HostEvent::VisibleEditorsChanged => Some(RejectionSignal::VisibleEditorsChanged),
            HostEvent::ActiveEditorChanged { .. } => Some(RejectionSignal::ActiveEditorChanged),
            HostEvent::SelectionChanged {
                origin: SelectionOrigin::Pointer,
            } => Some(RejectionSignal::PointerSelection),
            HostEvent::DocumentClosed { document } => session
                .filter(|s| &s.document == document)
                .map(|_| RejectionSignal::SessionDocumentClosed),
            _ => None,
        }
    }

    /// Resolve the live session to rejected if `event` is a rejection signal.
    pub fn observe(&mut self, event: &HostEvent, slot: &mut SessionSlot) -> Option<ResolvedSession> {
        let signal = Self::classify(event, slot.current())?;
        match slot.resolve(Resolution::Rejected) {
            Some(resolved) => {
                self.stats.fired += 1;
                debug!(target: "recgate::watchdog", ?signal, session = %resolved.session().id, "implicit rejection");
                Some(resolved)
            }
            None => {
                self.stats.idle += 1;
                None
            }
        }
    }

    #[must_use]
    pub const fn stats(&self) -> WatchdogStats {
        self.stats
    }
}
