//! Host UI for the command-line driver.
//!
//! There is no editor attached, so surfaces become notices that the calling
//! command prints once it finishes. Links and the settings file are handed to
//! the desktop opener only when `launch` is enabled.
//!
//! Clones share one notice buffer, so the command can keep a handle after
//! boxing the UI into the coordinator.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::error::{RecError, Result};
use crate::suggestions::consent::ConsentState;
use crate::suggestions::session::RecommendationSession;

use super::HostUi;

#[derive(Debug, Clone, Default)]
pub struct TerminalUi {
    settings_path: Option<PathBuf>,
    launch: bool,
    notices: Arc<Mutex<Vec<String>>>,
}

impl TerminalUi {
    #[must_use]
    pub fn new(settings_path: Option<PathBuf>, launch: bool) -> Self {
        Self {
            settings_path,
            launch,
            notices: Arc::default(),
        }
    }

    #[must_use]
    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().clone()
    }

    pub fn take_notices(&self) -> Vec<String> {
        std::mem::take(&mut *self.notices.lock())
    }

    fn notice(&self, text: String) {
        debug!(target: "recgate::ui", notice = %text);
        self.notices.lock().push(text);
    }
}

impl HostUi for TerminalUi {
    fn refresh_consent_surface(&mut self, consent: &ConsentState) {
        self.notice(format!(
            "consent: terms={} preview={} auto={}",
            consent.terms_accepted, consent.preview_enabled, consent.auto_trigger_enabled
        ));
    }

    fn show_welcome(&mut self) {
        self.notice("Welcome! Suggestions will now appear automatically as you type.".to_string());
    }

    fn open_settings(&mut self) -> Result<()> {
        let Some(path) = self.settings_path.clone() else {
            return Err(RecError::Collaborator("no settings file configured".to_string()));
        };
        if self.launch {
            open::that(&path).map_err(|err| {
                RecError::Collaborator(format!("open {}: {err}", path.display()))
            })?;
        }
        self.notice(format!("settings: {}", path.display()));
        Ok(())
    }

    fn open_url(&mut self, url: &str) -> Result<()> {
        if self.launch {
            open::that(url).map_err(|err| RecError::Collaborator(format!("open {url}: {err}")))?;
        }
        self.notice(format!("link: {url}"));
        Ok(())
    }

    fn enable_suggestions_view(&mut self) -> Result<()> {
        info!(target: "recgate::ui", "suggestions view enabled");
        self.notice("suggestions view enabled".to_string());
        Ok(())
    }

    fn render_candidates(&mut self, session: &RecommendationSession) -> bool {
        if session.candidates.is_empty() {
            return false;
        }
        self.notice(format!(
            "showing {} candidate(s) for line {} ({})",
            session.candidates.len(),
            session.origin_line,
            session.request_id.as_deref().unwrap_or("-"),
        ));
        true
    }
}
