//! recgate preview <on|off>
//!
//! Writes the feature-preview setting and tells the coordinator it changed.
//! Switching it off revokes accepted terms and automatic triggering.

use clap::{Args, ValueEnum};
use serde_json::Value;
use tracing::info;

use crate::app::AppContext;
use crate::error::Result;
use crate::host::settings::{FileSettings, PREVIEW_ENABLED, SettingsSource};
use crate::suggestions::events::{ConfigurationChange, HostEvent};

#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// New value of the preview setting
    #[arg(value_enum)]
    pub state: PreviewState,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewState {
    On,
    Off,
}

pub fn run(ctx: &AppContext, args: &PreviewArgs) -> Result<()> {
    let (mut coordinator, ui) = ctx.coordinator(false)?;

    let enabled = args.state == PreviewState::On;
    FileSettings::new(ctx.settings_path()).update(PREVIEW_ENABLED, Value::Bool(enabled))?;
    info!(target: "recgate::consent", enabled, "preview setting written");

    let dispatch = coordinator.dispatch(HostEvent::ConfigurationChanged(
        ConfigurationChange::new([PREVIEW_ENABLED]),
    ));
    let action = if enabled { "preview on" } else { "preview off" };
    super::report(ctx, action, &dispatch, &coordinator, &ui)
}
