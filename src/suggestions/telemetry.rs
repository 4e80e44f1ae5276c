//! Decision telemetry.
//!
//! Every resolved session produces exactly one [`DecisionRecord`]. The
//! recorder is handed each [`ResolvedSession`] once, at the moment it leaves
//! the slot; sink failures are logged and counted but never undo or delay the
//! resolution itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

use super::events::TriggerType;
use super::session::ResolvedSession;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub session_id: u64,
    /// Accepted candidate index, or -1 for every other outcome.
    pub decision_index: i64,
    pub outcome: String,
    pub request_id: String,
    pub trigger_type: TriggerType,
    pub completion_type: String,
    pub language: String,
    pub line: u32,
    pub recorded_at: DateTime<Utc>,
}

impl DecisionRecord {
    #[must_use]
    pub fn from_resolved(resolved: &ResolvedSession) -> Self {
        let session = resolved.session();
        let resolution = resolved.resolution();
        Self {
            session_id: session.id.0,
            decision_index: resolution.decision_index(),
            outcome: resolution.label().to_string(),
            request_id: session.request_id.clone().unwrap_or_default(),
            trigger_type: session.trigger_type,
            completion_type: session.completion_type.clone(),
            language: session.language.clone(),
            line: session.origin_line,
            recorded_at: Utc::now(),
        }
    }
}

/// Transport for decision records.
pub trait TelemetrySink {
    fn emit(&mut self, record: &DecisionRecord) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Sink used when telemetry is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn emit(&mut self, _record: &DecisionRecord) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TelemetryStats {
    pub recorded: u64,
    pub sink_failures: u64,
}

pub struct TelemetryRecorder {
    sink: Box<dyn TelemetrySink>,
    stats: TelemetryStats,
}

impl TelemetryRecorder {
    #[must_use]
    pub fn new(sink: Box<dyn TelemetrySink>) -> Self {
        Self {
            sink,
            stats: TelemetryStats::default(),
        }
    }

    /// Record a resolved session. Consumes it so it cannot be recorded twice.
    pub fn record(&mut self, resolved: ResolvedSession) -> DecisionRecord {
        let record = DecisionRecord::from_resolved(&resolved);
        self.stats.recorded += 1;
        match self.sink.emit(&record) {
            Ok(()) => {
                debug!(
                    target: "recgate::telemetry",
                    session = record.session_id,
                    decision_index = record.decision_index,
                    outcome = %record.outcome,
                    "decision recorded"
                );
            }
            Err(err) => {
                self.stats.sink_failures += 1;
                warn!(target: "recgate::telemetry", session = record.session_id, error = %err, "telemetry emit failed");
            }
        }
        record
    }

    pub fn flush(&mut self) {
        if let Err(err) = self.sink.flush() {
            warn!(target: "recgate::telemetry", error = %err, "telemetry flush failed");
        }
    }

    #[must_use]
    pub const fn stats(&self) -> TelemetryStats {
        self.stats
    }
}

impl std::fmt::Debug for TelemetryRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryRecorder")
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
