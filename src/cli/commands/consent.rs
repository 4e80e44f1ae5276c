//! recgate pause / resume / accept-terms / cancel-terms

use crate::app::AppContext;
use crate::error::Result;
use crate::suggestions::events::Command;

pub fn pause(ctx: &AppContext) -> Result<()> {
    execute(ctx, "pause", Command::PauseSuggestions)
}

pub fn resume(ctx: &AppContext) -> Result<()> {
    execute(ctx, "resume", Command::ResumeSuggestions)
}

pub fn accept_terms(ctx: &AppContext) -> Result<()> {
    execute(ctx, "accept-terms", Command::AcceptTerms)
}

pub fn cancel_terms(ctx: &AppContext) -> Result<()> {
    execute(ctx, "cancel-terms", Command::CancelTerms)
}

fn execute(ctx: &AppContext, action: &str, command: Command) -> Result<()> {
    let (mut coordinator, ui) = ctx.coordinator(false)?;
    let dispatch = coordinator.execute(command);
    super::report(ctx, action, &dispatch, &coordinator, &ui)
}
