pub mod duration;
pub mod orchestrator;
pub mod query;

pub use duration::{parse_iso8601_duration, DurationCategory};
pub use orchestrator::{SearchOptions, SearchOrchestrator, SearchSummary};
