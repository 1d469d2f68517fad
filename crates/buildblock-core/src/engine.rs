//! Blocking-decision engine: first-match-wins, default-clear.
//!
//! Name patterns are checked first, over running jobs and then queued
//! items. Shared environment values are checked second, over running jobs
//! only, because queued items have no resolved environment. Nothing found
//! means the candidate may run.

use std::sync::Arc;

use crate::cache::SpecCache;
use crate::model::{ActiveJob, BlockingJob, BlockingReason, CandidateItem, JobSource, QueuedItem};
use crate::obs;
use crate::pattern::CompiledPattern;
use crate::spec::BlockingSpec;

/// A [`BlockingSpec`] with its pattern lines compiled once.
#[derive(Debug, Clone)]
pub struct CompiledSpec {
    digest: String,
    patterns: Vec<CompiledPattern>,
    env_var_names: Vec<String>,
}

impl CompiledSpec {
    pub fn compile(spec: &BlockingSpec) -> Self {
        let digest = spec.digest();
        let patterns: Vec<CompiledPattern> = spec
            .pattern_lines()
            .into_iter()
            .map(CompiledPattern::compile)
            .collect();
        let env_var_names: Vec<String> = spec
            .env_var_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        for p in patterns.iter().filter(|p| p.is_invalid()) {
            obs::emit_invalid_pattern(&digest, p.source());
        }
        obs::emit_spec_compiled(
            &digest,
            patterns.len(),
            patterns.iter().filter(|p| p.is_invalid()).count(),
            env_var_names.len(),
        );

        Self {
            digest,
            patterns,
            env_var_names,
        }
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn patterns(&self) -> &[CompiledPattern] {
        &self.patterns
    }

    pub fn env_var_names(&self) -> &[String] {
        &self.env_var_names
    }

    /// Pattern lines that failed to compile.
    pub fn invalid_patterns(&self) -> Vec<&str> {
        self.patterns
            .iter()
            .filter(|p| p.is_invalid())
            .map(CompiledPattern::source)
            .collect()
    }

    pub fn is_disabled(&self) -> bool {
        self.patterns.is_empty() && self.env_var_names.is_empty()
    }

    /// Find the job that blocks `candidate`, if any.
    pub fn find_blocking_job(
        &self,
        candidate: Option<&CandidateItem>,
        active_jobs: &[ActiveJob],
        queued_items: &[QueuedItem],
    ) -> Option<BlockingJob> {
        self.match_by_name(candidate, active_jobs, queued_items)
            .or_else(|| candidate.and_then(|c| self.match_by_env(c, active_jobs)))
    }

    fn match_by_name(
        &self,
        candidate: Option<&CandidateItem>,
        active_jobs: &[ActiveJob],
        queued_items: &[QueuedItem],
    ) -> Option<BlockingJob> {
        if self.patterns.is_empty() {
            return None;
        }

        for job in active_jobs {
            if let Some(pattern) = self.first_matching_pattern(&job.display_name) {
                return Some(BlockingJob {
                    display_name: job.display_name.clone(),
                    id: job.id.clone(),
                    source: JobSource::Running,
                    reason: BlockingReason::NamePattern {
                        pattern: pattern.to_string(),
                    },
                });
            }
        }

        let candidate_id = candidate.and_then(|c| c.id.as_deref());
        for item in queued_items {
            if candidate_id.is_some() && item.id.as_deref() == candidate_id {
                continue;
            }
            if let Some(pattern) = self.first_matching_pattern(&item.display_name) {
                return Some(BlockingJob {
                    display_name: item.display_name.clone(),
                    id: item.id.clone(),
                    source: JobSource::Queued,
                    reason: BlockingReason::NamePattern {
                        pattern: pattern.to_string(),
                    },
                });
            }
        }

        None
    }

    fn first_matching_pattern(&self, name: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|p| p.matches(name))
            .map(CompiledPattern::source)
    }

    fn match_by_env(
        &self,
        candidate: &CandidateItem,
        active_jobs: &[ActiveJob],
    ) -> Option<BlockingJob> {
        if self.env_var_names.is_empty() || !candidate.has_parameters() {
            return None;
        }

        for name in &self.env_var_names {
            let Some(value) = candidate.blocking_value(name) else {
                continue;
            };
            if let Some(job) = active_jobs
                .iter()
                .find(|job| job.environment.get(name).map(String::as_str) == Some(value))
            {
                return Some(BlockingJob {
                    display_name: job.display_name.clone(),
                    id: job.id.clone(),
                    source: JobSource::Running,
                    reason: BlockingReason::SharedEnvVar {
                        name: name.clone(),
                        value: value.to_string(),
                    },
                });
            }
        }

        None
    }
}

/// Stateless-per-call evaluator with a shared compile cache.
///
/// Safe to share across threads; each call reads only the snapshot it is
/// given.
#[derive(Debug, Default)]
pub struct BlockingDecisionEngine {
    cache: SpecCache,
}

impl BlockingDecisionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(cache: SpecCache) -> Self {
        Self { cache }
    }

    /// Compiled form of `spec`, reused while its text is unchanged.
    pub fn compiled(&self, spec: &BlockingSpec) -> Arc<CompiledSpec> {
        self.cache.get_or_compile(spec)
    }

    /// Decide whether `candidate` must wait.
    ///
    /// An absent spec, or one with both fields empty, never blocks. An
    /// absent candidate still gets name matching; environment matching
    /// needs a candidate with parameters.
    pub fn find_blocking_job(
        &self,
        spec: Option<&BlockingSpec>,
        candidate: Option<&CandidateItem>,
        active_jobs: &[ActiveJob],
        queued_items: &[QueuedItem],
    ) -> Option<BlockingJob> {
        let candidate_name = candidate.and_then(|c| c.display_name.as_deref());
        let found = spec
            .filter(|s| !s.is_disabled())
            .and_then(|s| {
                self.compiled(s)
                    .find_blocking_job(candidate, active_jobs, queued_items)
            });

        match &found {
            Some(job) => obs::emit_blocking_found(candidate_name, job),
            None => obs::emit_not_blocked(candidate_name),
        }
        found
    }
}
