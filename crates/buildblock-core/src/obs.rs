//! Structured observability hooks for blocking decisions.
//!
//! Events carry an `event` field so they can be filtered in JSON log
//! pipelines. Per-evaluation events are emitted at `debug!` level because
//! the host re-evaluates every queued item on each queue-maintenance tick.

use tracing::{debug, info, warn};

use crate::model::BlockingJob;

/// Emit event: a spec was compiled into the cache.
pub fn emit_spec_compiled(digest: &str, patterns: usize, invalid: usize, env_vars: usize) {
    info!(
        event = "spec.compiled",
        digest = %digest,
        patterns = patterns,
        invalid_patterns = invalid,
        env_vars = env_vars,
    );
}

/// Emit event: a pattern line failed to compile and will match nothing.
pub fn emit_invalid_pattern(digest: &str, pattern: &str) {
    warn!(event = "spec.invalid_pattern", digest = %digest, pattern = %pattern);
}

/// Emit event: a blocking job was found for the candidate.
pub fn emit_blocking_found(candidate: Option<&str>, job: &BlockingJob) {
    debug!(
        event = "admission.blocked",
        candidate = candidate.unwrap_or("-"),
        blocked_by = %job.display_name,
        source = %job.source,
    );
}

/// Emit event: nothing blocks the candidate.
pub fn emit_not_blocked(candidate: Option<&str>) {
    debug!(event = "admission.clear", candidate = candidate.unwrap_or("-"));
}
