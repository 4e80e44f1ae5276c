//! recgate status

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok};
use crate::error::Result;
use crate::state::StateSnapshot;
use crate::suggestions::coordinator::CoordinatorStatus;
use crate::suggestions::telemetry_storage::load_records;

#[derive(Args, Debug, Default)]
pub struct StatusArgs {
    /// Also list the most recent decision records
    #[arg(long, default_value_t = 0)]
    pub recent: usize,
}

#[derive(Serialize)]
struct StatusReport {
    root: PathBuf,
    settings_file: PathBuf,
    telemetry_file: Option<PathBuf>,
    persisted: StateSnapshot,
    coordinator: CoordinatorStatus,
    decisions_logged: usize,
    recent_decisions: Vec<crate::suggestions::telemetry::DecisionRecord>,
}

pub fn run(ctx: &AppContext, args: &StatusArgs) -> Result<()> {
    let (coordinator, ui) = ctx.coordinator(false)?;

    let telemetry_file = ctx
        .config
        .telemetry
        .enabled
        .then(|| ctx.telemetry_path());
    let records = match &telemetry_file {
        Some(path) => load_records(path)?,
        None => Vec::new(),
    };
    let recent = records
        .iter()
        .rev()
        .take(args.recent)
        .cloned()
        .collect::<Vec<_>>();

    let report = StatusReport {
        root: ctx.root.clone(),
        settings_file: ctx.settings_path(),
        telemetry_file,
        persisted: coordinator.state().snapshot(),
        coordinator: coordinator.status(),
        decisions_logged: records.len(),
        recent_decisions: recent,
    };

    if ctx.robot_mode {
        return emit_json(&robot_ok(report, ui.take_notices()));
    }

    let mut layout = HumanLayout::new();
    layout
        .title("recgate status")
        .kv("root", &report.root.display().to_string())
        .kv("settings", &report.settings_file.display().to_string())
        .blank()
        .section("Consent")
        .flag("terms accepted", report.persisted.terms_accepted)
        .flag("preview enabled", report.coordinator.consent.preview_enabled)
        .flag("automatic triggering", report.persisted.auto_trigger_enabled)
        .flag("welcome shown", report.persisted.welcome_message_shown)
        .blank()
        .section("Triggers")
        .flag("manual allowed", report.coordinator.manual_allowed)
        .flag("automatic allowed", report.coordinator.automatic_allowed)
        .kv("tab size", &report.coordinator.editor.tab_size.to_string())
        .kv(
            "auto-closing brackets",
            &report.coordinator.editor.auto_closing_brackets,
        )
        .blank()
        .section("Telemetry");
    match &report.telemetry_file {
        Some(path) => {
            layout
                .kv("file", &path.display().to_string())
                .kv("decisions logged", &report.decisions_logged.to_string());
        }
        None => {
            layout.kv("file", "disabled");
        }
    }
    for record in &report.recent_decisions {
        layout.bullet(&format!(
            "session {} {} (index {}, {} {}, line {})",
            record.session_id,
            record.outcome,
            record.decision_index,
            record.trigger_type,
            record.language,
            record.line
        ));
    }
    emit_human(layout);
    Ok(())
}
