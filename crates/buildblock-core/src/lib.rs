//! buildblock - build-queue admission control
//!
//! Decides whether a queued job must wait because another job is running
//! or queued:
//! - by display name, using full-match regex patterns (one per line)
//! - by shared resource key, using environment variable names whose value
//!   on the candidate equals the value in a running job's environment
//!
//! Evaluation never fails. Malformed patterns match nothing and missing
//! configuration disables blocking, so a bad spec can delay nothing.

pub mod cache;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod model;
pub mod obs;
pub mod pattern;
pub mod spec;
pub mod telemetry;

pub use cache::SpecCache;
pub use dispatcher::{ActivitySource, BlockageCause, BlockerDispatcher, BlockerProperty};
pub use engine::{BlockingDecisionEngine, CompiledSpec};
pub use error::{BlockerError, Result};
pub use model::{
    ActiveJob, ActivitySnapshot, BlockingJob, BlockingReason, CandidateItem, JobSource,
    Parameters, QueuedItem,
};
pub use obs::{emit_blocking_found, emit_invalid_pattern, emit_not_blocked, emit_spec_compiled};
pub use pattern::{try_match, CompiledPattern};
pub use spec::BlockingSpec;
pub use telemetry::init_tracing;

/// buildblock version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
