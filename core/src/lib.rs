pub mod catalog;
pub mod census;
pub mod context;
pub mod debriefing;
pub mod error;
pub mod events;
pub mod log;
pub mod reconcile;
pub mod synth;
pub mod watcher;

// Re-exports for convenience
pub use catalog::{TableCatalog, UnitCatalog};
pub use census::{UnitCensus, build_census, select_snapshot};
pub use context::AppConfig;
pub use debriefing::{DebriefingLog, MissionInputs, load_snapshot, process_debriefing};
pub use error::{DebriefError, Result, StructuralParseError};
pub use events::{DeadUnitSet, EventIssue, TriggerState, extract_events};
pub use log::{ParsedLog, SchemaVariant, parse_log};
pub use reconcile::{Reconciliation, reconcile};
pub use synth::synthesize_outcome;
pub use watcher::{DebriefingOutcome, DebriefingWatcher, WatchHandle, WatchState};
