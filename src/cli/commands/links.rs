//! recgate open-settings / intro / enable-view

use clap::Args;

use crate::app::AppContext;
use crate::error::Result;
use crate::suggestions::events::Command;

#[derive(Args, Debug, Default)]
pub struct LaunchArgs {
    /// Hand the target to the desktop opener instead of only printing it
    #[arg(long)]
    pub open: bool,
}

pub fn open_settings(ctx: &AppContext, args: &LaunchArgs) -> Result<()> {
    execute(ctx, "open-settings", Command::OpenSettings, args.open)
}

pub fn introduction(ctx: &AppContext, args: &LaunchArgs) -> Result<()> {
    execute(ctx, "intro", Command::OpenIntroduction, args.open)
}

pub fn enable_view(ctx: &AppContext) -> Result<()> {
    execute(ctx, "enable-view", Command::EnableSuggestionsView, false)
}

fn execute(ctx: &AppContext, action: &str, command: Command, launch: bool) -> Result<()> {
    let (mut coordinator, ui) = ctx.coordinator(launch)?;
    let dispatch = coordinator.execute(command);
    super::report(ctx, action, &dispatch, &coordinator, &ui)
}
