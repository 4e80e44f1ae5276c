//! Boundaries to the editor host.
//!
//! The coordinator never talks to an editor directly. Everything it needs
//! from the outside world comes through the traits in this module: live
//! settings, UI surfaces and the suggestion fetch client.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::suggestions::consent::ConsentState;
use crate::suggestions::fetch::{FetchRequest, FetchResponse};
use crate::suggestions::session::RecommendationSession;

pub mod settings;
pub mod terminal;

pub use settings::{FileSettings, SettingsSource};
pub use terminal::TerminalUi;

/// Opaque editor document identifier (usually a URI).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub String);

impl DocumentId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// UI surfaces owned by the host.
pub trait HostUi {
    /// Consent or toggle flags changed; redraw whatever shows them.
    fn refresh_consent_surface(&mut self, consent: &ConsentState);

    /// One-time welcome shown after the first terms acceptance.
    fn show_welcome(&mut self);

    fn open_settings(&mut self) -> Result<()>;

    fn open_url(&mut self, url: &str) -> Result<()>;

    fn enable_suggestions_view(&mut self) -> Result<()>;

    /// Render the session's candidates. Returns whether anything was shown.
    fn render_candidates(&mut self, session: &RecommendationSession) -> bool;
}

/// Client that asks the backend for candidates.
///
/// The coordinator does not retry; a failed fetch resolves the session.
pub trait SuggestionFetcher {
    fn fetch(&mut self, request: &FetchRequest) -> Result<FetchResponse>;
}
