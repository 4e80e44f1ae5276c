//! Suggestion coordination: consent, triggering, sessions, rejection and
//! decision telemetry.

pub mod consent;
pub mod coordinator;
pub mod events;
pub mod fetch;
pub mod session;
pub mod telemetry;
pub mod telemetry_storage;
pub mod trigger;
pub mod watchdog;

pub use consent::{ConsentGate, ConsentState, TriggerConfig};
pub use coordinator::{Coordinator, CoordinatorOptions, CoordinatorStatus, Dispatch};
pub use events::{
    AcceptArgs, Command, ConfigurationChange, ContentChange, HostEvent, ManualTrigger,
    SelectionOrigin, TextChange, TriggerType,
};
pub use fetch::{FetchDisposition, FetchRequest, FetchResponse, FetchTicket};
pub use session::{
    RecommendationSession, Resolution, ResolvedSession, SessionId, SessionSlot, SessionState,
};
pub use telemetry::{DecisionRecord, NullSink, TelemetryRecorder, TelemetrySink, TelemetryStats};
pub use telemetry_storage::{JsonlSink, load_records};
pub use trigger::{EditorContext, SuppressReason, TriggerArbiter, Verdict};
pub use watchdog::{RejectionSignal, RejectionWatchdog, WatchdogStats};
