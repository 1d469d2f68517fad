//! Jobs, queued items and the blocking result.

use crate::error::{read_to_string, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Variable name to string value.
pub type Parameters = BTreeMap<String, String>;

/// The queued item asking to be dispatched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CandidateItem {
    /// Host identity, used to keep the candidate from blocking itself.
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub display_name: Option<String>,

    /// Build parameters; absent when the item is not parameterized yet.
    #[serde(default)]
    pub parameters: Option<Parameters>,
}

impl CandidateItem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Set one build parameter, creating the parameter set if needed.
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters
            .get_or_insert_with(Parameters::new)
            .insert(name.into(), value.into());
        self
    }

    /// Value of `name` if the candidate carries it with a non-blank value.
    pub fn blocking_value(&self, name: &str) -> Option<&str> {
        self.parameters
            .as_ref()?
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&read_to_string(path.as_ref())?)
    }

    pub(crate) fn has_parameters(&self) -> bool {
        self.parameters.as_ref().is_some_and(|p| !p.is_empty())
    }
}

/// A job currently executing, with its resolved runtime environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActiveJob {
    #[serde(default)]
    pub id: Option<String>,

    pub display_name: String,

    /// Environment as actually resolved for the build, which may differ
    /// from the parameters it was queued with.
    #[serde(default)]
    pub environment: Parameters,
}

impl ActiveJob {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(name.into(), value.into());
        self
    }
}

/// Another item waiting in the queue. Its environment is not resolved yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueuedItem {
    #[serde(default)]
    pub id: Option<String>,

    pub display_name: String,

    #[serde(default)]
    pub parameters: Option<Parameters>,
}

impl QueuedItem {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Point-in-time view of running and queued work, supplied by the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivitySnapshot {
    #[serde(default)]
    pub running: Vec<ActiveJob>,

    #[serde(default)]
    pub queued: Vec<QueuedItem>,
}

impl ActivitySnapshot {
    pub fn new(running: Vec<ActiveJob>, queued: Vec<QueuedItem>) -> Self {
        Self { running, queued }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&read_to_string(path.as_ref())?)
    }
}

/// Where the blocking job was found.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobSource {
    Running,
    Queued,
}

impl fmt::Display for JobSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobSource::Running => write!(f, "running"),
            JobSource::Queued => write!(f, "queued"),
        }
    }
}

/// Which rule produced the match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockingReason {
    /// A name pattern matched the job's full display name.
    NamePattern { pattern: String },
    /// The job's environment holds the candidate's value for `name`.
    SharedEnvVar { name: String, value: String },
}

/// The job that keeps the candidate waiting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockingJob {
    pub display_name: String,
    pub id: Option<String>,
    pub source: JobSource,
    pub reason: BlockingReason,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_parameter_is_not_a_blocking_value() {
        let c = CandidateItem::new()
            .with_parameter("GIT_BRANCH", "")
            .with_parameter("SPACES", "   ")
            .with_parameter("branchName", "someBlockingBranch");
        assert_eq!(c.blocking_value("GIT_BRANCH"), None);
        assert_eq!(c.blocking_value("SPACES"), None);
        assert_eq!(c.blocking_value("missing"), None);
        assert_eq!(c.blocking_value("branchName"), Some("someBlockingBranch"));
    }

    #[test]
    fn test_has_parameters() {
        assert!(!CandidateItem::new().has_parameters());
        let empty = CandidateItem {
            parameters: Some(Parameters::new()),
            ..CandidateItem::default()
        };
        assert!(!empty.has_parameters());
        assert!(CandidateItem::new().with_parameter("a", "b").has_parameters());
    }

    #[test]
    fn test_snapshot_from_json() {
        let snap = ActivitySnapshot::from_json_str(
            r#"{
                "running": [
                    {"display_name": "blockingJob", "environment": {"branchName": "main"}}
                ],
                "queued": [{"id": "q-1", "display_name": "random"}]
            }"#,
        )
        .expect("parse failed");
        assert_eq!(snap.running.len(), 1);
        assert_eq!(snap.running[0].environment["branchName"], "main");
        assert_eq!(snap.queued[0].id.as_deref(), Some("q-1"));
        assert!(snap.queued[0].parameters.is_none());
    }

    #[test]
    fn test_candidate_from_json() {
        let c = CandidateItem::from_json_str(
            r#"{"id": "q-2", "parameters": {"branchName": "someBlockingBranch"}}"#,
        )
        .expect("parse failed");
        assert_eq!(c.id.as_deref(), Some("q-2"));
        assert_eq!(c.blocking_value("branchName"), Some("someBlockingBranch"));
        assert!(c.display_name.is_none());
    }

    #[test]
    fn test_candidate_from_missing_file_is_io_error() {
        let err = CandidateItem::from_json_file("/definitely/not/candidate.json")
            .expect_err("missing file should fail");
        assert!(matches!(err, crate::error::BlockerError::Io { .. }));
    }

    #[test]
    fn test_blocking_reason_serializes_tagged() {
        let reason = BlockingReason::SharedEnvVar {
            name: "branchName".into(),
            value: "main".into(),
        };
        let json = serde_json::to_value(&reason).unwrap();
        assert_eq!(json["type"], "shared_env_var");
        assert_eq!(json["name"], "branchName");
    }
}
