//! Queue admission hook for host schedulers.
//!
//! The host calls [`BlockerDispatcher::can_run`] each time it considers a
//! queued item for dispatch. A returned [`BlockageCause`] means the item
//! stays queued; the host shows [`BlockageCause::short_description`] in its
//! queue status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::engine::BlockingDecisionEngine;
use crate::error::{read_to_string, Result};
use crate::model::{ActivitySnapshot, BlockingJob, CandidateItem};
use crate::spec::BlockingSpec;

/// Per-job blocker configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockerProperty {
    /// Master switch; a disabled property never blocks.
    #[serde(default = "default_enabled", alias = "useBuildBlocker")]
    pub use_build_blocker: bool,

    #[serde(flatten)]
    pub spec: BlockingSpec,
}

fn default_enabled() -> bool {
    true
}

impl BlockerProperty {
    pub fn enabled(spec: BlockingSpec) -> Self {
        Self {
            use_build_blocker: true,
            spec,
        }
    }

    pub fn disabled(spec: BlockingSpec) -> Self {
        Self {
            use_build_blocker: false,
            spec,
        }
    }

    /// The spec to evaluate, or `None` when blocking is switched off.
    pub fn active_spec(&self) -> Option<&BlockingSpec> {
        self.use_build_blocker.then_some(&self.spec)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&read_to_string(path.as_ref())?)
    }
}

/// Host view of running and queued work.
///
/// Implementations must return one consistent point in time per call; the
/// dispatcher does not lock or re-query.
pub trait ActivitySource {
    fn snapshot(&self) -> ActivitySnapshot;
}

impl ActivitySource for ActivitySnapshot {
    fn snapshot(&self) -> ActivitySnapshot {
        self.clone()
    }
}

/// Why a queued item may not leave the queue yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockageCause {
    pub blocking_job: BlockingJob,
}

impl BlockageCause {
    /// Queue-status message, e.g. `Blocked by deploy-prod`.
    pub fn short_description(&self) -> String {
        format!("Blocked by {}", self.blocking_job.display_name)
    }
}

impl fmt::Display for BlockageCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_description())
    }
}

/// Admission hook binding the engine to a host activity source.
pub struct BlockerDispatcher<S: ActivitySource> {
    engine: BlockingDecisionEngine,
    source: S,
}

impl<S: ActivitySource> BlockerDispatcher<S> {
    pub fn new(source: S) -> Self {
        Self::with_engine(BlockingDecisionEngine::new(), source)
    }

    pub fn with_engine(engine: BlockingDecisionEngine, source: S) -> Self {
        Self { engine, source }
    }

    pub fn engine(&self) -> &BlockingDecisionEngine {
        &self.engine
    }

    /// Decide whether `candidate` may be dispatched now.
    ///
    /// Jobs without a property, or with blocking switched off, always run.
    pub fn can_run(
        &self,
        property: Option<&BlockerProperty>,
        candidate: &CandidateItem,
    ) -> Option<BlockageCause> {
        let spec = property.and_then(BlockerProperty::active_spec)?;
        let snapshot = self.source.snapshot();
        self.engine
            .find_blocking_job(
                Some(spec),
                Some(candidate),
                &snapshot.running,
                &snapshot.queued,
            )
            .map(|blocking_job| BlockageCause { blocking_job })
    }
}
