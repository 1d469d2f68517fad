//! Blocking specification: the operator-configured matching rules.

use crate::error::{read_to_string, BlockerError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Blocking rules for one job.
///
/// Both fields hold free-form multi-line text as entered by an operator.
/// Each non-blank line is one entry; blank lines are ignored. An absent or
/// empty field disables that matching mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockingSpec {
    /// Regex patterns matched against the full display name of other jobs.
    #[serde(default, alias = "nameRegexLines")]
    pub name_regex_lines: Option<String>,

    /// Environment variable names acting as shared resource keys.
    #[serde(default, alias = "envVarNameLines")]
    pub env_var_name_lines: Option<String>,
}

impl BlockingSpec {
    /// Create a spec from optional multi-line fields.
    pub fn new(name_regex_lines: Option<String>, env_var_name_lines: Option<String>) -> Self {
        Self {
            name_regex_lines,
            env_var_name_lines,
        }
    }

    /// Spec that only matches by display name.
    pub fn names(lines: impl Into<String>) -> Self {
        Self::new(Some(lines.into()), None)
    }

    /// Spec that only matches by shared environment values.
    pub fn env_vars(lines: impl Into<String>) -> Self {
        Self::new(None, Some(lines.into()))
    }

    /// Non-blank pattern lines, in declared order.
    pub fn pattern_lines(&self) -> Vec<&str> {
        split_lines(self.name_regex_lines.as_deref())
    }

    /// Non-blank environment variable names, in declared order.
    pub fn env_var_names(&self) -> Vec<&str> {
        split_lines(self.env_var_name_lines.as_deref())
    }

    /// Whether neither matching mode has any entries.
    pub fn is_disabled(&self) -> bool {
        self.pattern_lines().is_empty() && self.env_var_names().is_empty()
    }

    /// Deterministic SHA-256 digest of both fields.
    ///
    /// Each present field is length-prefixed, so field text containing NUL
    /// cannot shift bytes into the neighbouring field. Absent and empty
    /// fields hash differently; both compile to the same empty rule set.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for field in [&self.name_regex_lines, &self.env_var_name_lines] {
            match field {
                Some(text) => {
                    hasher.update(b"\x01");
                    hasher.update((text.len() as u64).to_le_bytes());
                    hasher.update(text.as_bytes());
                }
                None => hasher.update(b"\x00"),
            }
        }
        hex::encode(hasher.finalize())
    }

    /// Parse a spec from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a spec from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&read_to_string(path.as_ref())?)
    }

    /// Reject the spec if any pattern line fails to compile.
    ///
    /// Evaluation tolerates invalid patterns; this is for tooling that wants
    /// to report them up front.
    pub fn validate(&self) -> Result<()> {
        let invalid: Vec<&str> = self
            .pattern_lines()
            .into_iter()
            .filter(|line| crate::pattern::CompiledPattern::compile(line).is_invalid())
            .collect();
        if invalid.is_empty() {
            Ok(())
        } else {
            Err(BlockerError::InvalidSpec(format!(
                "{} invalid pattern(s): {}",
                invalid.len(),
                invalid.join(", ")
            )))
        }
    }
}

fn split_lines(text: Option<&str>) -> Vec<&str> {
    text.map(|t| {
        t.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect()
    })
    .unwrap_or_default()
}
