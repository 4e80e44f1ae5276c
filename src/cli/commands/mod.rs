//! CLI command implementations
//!
//! Each subcommand builds an activated coordinator over the recgate root,
//! drives one command or event through it and reports the outcome.

use clap::Subcommand;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok, robot_refused};
use crate::error::Result;
use crate::host::TerminalUi;
use crate::suggestions::consent::ConsentState;
use crate::suggestions::coordinator::{Coordinator, Dispatch};

pub mod consent;
pub mod links;
pub mod preview;
pub mod replay;
pub mod status;

pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Status(args) => status::run(ctx, args),
        Commands::Pause => consent::pause(ctx),
        Commands::Resume => consent::resume(ctx),
        Commands::AcceptTerms => consent::accept_terms(ctx),
        Commands::CancelTerms => consent::cancel_terms(ctx),
        Commands::OpenSettings(args) => links::open_settings(ctx, args),
        Commands::Intro(args) => links::introduction(ctx, args),
        Commands::EnableView => links::enable_view(ctx),
        Commands::Preview(args) => preview::run(ctx, args),
        Commands::Replay(args) => replay::run(ctx, args),
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show consent flags, trigger permissions and telemetry counts
    Status(status::StatusArgs),

    /// Pause automatic suggestions
    Pause,

    /// Resume automatic suggestions
    Resume,

    /// Accept the terms of service
    AcceptTerms,

    /// Withdraw from automatic suggestions
    CancelTerms,

    /// Open the settings file
    OpenSettings(links::LaunchArgs),

    /// Open the introduction page
    Intro(links::LaunchArgs),

    /// Enable the suggestions view
    EnableView,

    /// Switch the feature-preview setting on or off
    Preview(preview::PreviewArgs),

    /// Drive a scripted sequence of events through the coordinator
    Replay(replay::ReplayArgs),
}

#[derive(Serialize)]
struct ActionReport<'a> {
    action: &'a str,
    result: &'a Dispatch,
    consent: ConsentState,
}

/// Print the outcome of a single command or event.
pub(crate) fn report(
    ctx: &AppContext,
    action: &str,
    dispatch: &Dispatch,
    coordinator: &Coordinator,
    ui: &TerminalUi,
) -> Result<()> {
    let consent = coordinator.consent();
    let notices = ui.take_notices();

    if ctx.robot_mode {
        let data = ActionReport {
            action,
            result: dispatch,
            consent,
        };
        return match dispatch {
            Dispatch::Refused(reason) => emit_json(&robot_refused(reason.clone(), data, notices)),
            _ => emit_json(&robot_ok(data, notices)),
        };
    }

    let mut layout = HumanLayout::new();
    layout.title(action);
    layout.kv("result", &describe(dispatch));
    layout
        .flag("terms accepted", consent.terms_accepted)
        .flag("preview enabled", consent.preview_enabled)
        .flag("automatic triggering", consent.auto_trigger_enabled);
    if !notices.is_empty() {
        layout.blank();
        for notice in &notices {
            layout.bullet(notice);
        }
    }
    emit_human(layout);
    Ok(())
}

/// One-line human description of a dispatch outcome.
pub(crate) fn describe(dispatch: &Dispatch) -> String {
    match dispatch {
        Dispatch::Ignored => "ignored".to_string(),
        Dispatch::Suppressed(reason) => format!("suppressed ({reason:?})"),
        Dispatch::Fetch(request) => format!(
            "fetch requested for session {} ({})",
            request.ticket.session, request.trigger_type
        ),
        Dispatch::Resolved(record) => format!(
            "session {} {} (index {})",
            record.session_id, record.outcome, record.decision_index
        ),
        Dispatch::Consent(_) => "consent updated".to_string(),
        Dispatch::Refused(reason) => format!("refused: {reason}"),
        Dispatch::Completed => "done".to_string(),
        Dispatch::ShutDown(record) => match record {
            Some(record) => format!("shut down; session {} rejected", record.session_id),
            None => "shut down".to_string(),
        },
    }
}
