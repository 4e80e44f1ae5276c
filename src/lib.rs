//! recgate: consent-gated coordination of in-editor code suggestions.
//!
//! The crate decides whether a suggestion may be requested, keeps at most one
//! recommendation session alive, resolves it on acceptance or on implicit
//! rejection, and records exactly one decision per session.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod state;
pub mod suggestions;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{RecError, Result};
