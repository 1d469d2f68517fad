//! buildblock - build-queue admission control CLI
//!
//! Evaluates a blocking spec against a snapshot of running and queued jobs,
//! the same way a host scheduler's admission hook would.
//!
//! ## Commands
//!
//! - `evaluate`: decide whether a candidate is blocked
//! - `check-spec`: report pattern lines that fail to compile

use anyhow::{Context, Result};
use buildblock_core::{
    ActivitySnapshot, BlockageCause, BlockingDecisionEngine, BlockingJob, BlockingSpec,
    CandidateItem,
};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "buildblock")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build-queue admission control", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide whether a candidate must wait
    Evaluate {
        /// Blocking spec (JSON)
        #[arg(short, long, env = "BUILDBLOCK_SPEC")]
        spec: PathBuf,

        /// Running/queued snapshot (JSON)
        #[arg(long)]
        snapshot: PathBuf,

        /// Candidate item (JSON); omit to ask whether anything would block
        #[arg(short, long)]
        candidate: Option<PathBuf>,
    },

    /// Validate pattern lines in a blocking spec
    CheckSpec {
        /// Blocking spec (JSON)
        #[arg(short, long, env = "BUILDBLOCK_SPEC")]
        spec: PathBuf,
    },
}

/// Decision printed by `evaluate`.
#[derive(Debug, Serialize)]
struct Decision {
    blocked: bool,
    blocking_job: Option<BlockingJob>,
    message: String,
    evaluated_at: DateTime<Utc>,
}

impl Decision {
    fn new(blocking_job: Option<BlockingJob>) -> Self {
        let message = match &blocking_job {
            Some(job) => BlockageCause {
                blocking_job: job.clone(),
            }
            .short_description(),
            None => "Not blocked".to_string(),
        };
        Self {
            blocked: blocking_job.is_some(),
            blocking_job,
            message,
            evaluated_at: Utc::now(),
        }
    }
}

/// Report printed by `check-spec`.
#[derive(Debug, Serialize)]
struct SpecReport {
    digest: String,
    patterns: Vec<String>,
    env_vars: Vec<String>,
    invalid_patterns: Vec<String>,
    disabled: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    buildblock_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Evaluate {
            spec,
            snapshot,
            candidate,
        } => cmd_evaluate(&spec, &snapshot, candidate.as_deref()),
        Commands::CheckSpec { spec } => cmd_check_spec(&spec),
    }
}

fn cmd_evaluate(
    spec_path: &Path,
    snapshot_path: &Path,
    candidate_path: Option<&Path>,
) -> Result<()> {
    let decision = evaluate(spec_path, snapshot_path, candidate_path)?;
    info!(blocked = decision.blocked, "{}", decision.message);
    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}

fn evaluate(
    spec_path: &Path,
    snapshot_path: &Path,
    candidate_path: Option<&Path>,
) -> Result<Decision> {
    let spec = BlockingSpec::from_json_file(spec_path)
        .with_context(|| format!("Failed to load spec from {}", spec_path.display()))?;
    let snapshot = ActivitySnapshot::from_json_file(snapshot_path)
        .with_context(|| format!("Failed to load snapshot from {}", snapshot_path.display()))?;
    let candidate = candidate_path
        .map(|path| {
            CandidateItem::from_json_file(path)
                .with_context(|| format!("Failed to load candidate from {}", path.display()))
        })
        .transpose()?;

    let engine = BlockingDecisionEngine::new();
    let blocking_job = engine.find_blocking_job(
        Some(&spec),
        candidate.as_ref(),
        &snapshot.running,
        &snapshot.queued,
    );
    Ok(Decision::new(blocking_job))
}

fn cmd_check_spec(spec_path: &Path) -> Result<()> {
    let report = check_spec(spec_path)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.invalid_patterns.is_empty() {
        anyhow::bail!(
            "{} pattern(s) will never match: {}",
            report.invalid_patterns.len(),
            report.invalid_patterns.join(", ")
        );
    }
    Ok(())
}

fn check_spec(spec_path: &Path) -> Result<SpecReport> {
    let spec = BlockingSpec::from_json_file(spec_path)
        .with_context(|| format!("Failed to load spec from {}", spec_path.display()))?;
    let compiled = BlockingDecisionEngine::new().compiled(&spec);

    Ok(SpecReport {
        digest: compiled.digest().to_string(),
        patterns: compiled
            .patterns()
            .iter()
            .map(|p| p.source().to_string())
            .collect(),
        env_vars: compiled.env_var_names().to_vec(),
        invalid_patterns: compiled
            .invalid_patterns()
            .into_iter()
            .map(str::to_string)
            .collect(),
        disabled: compiled.is_disabled(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).expect("write failed");
        path
    }

    #[test]
    fn test_evaluate_blocked_by_name() {
        let dir = TempDir::new().unwrap();
        let spec = write(&dir, "spec.json", r#"{"name_regex_lines": "block.*"}"#);
        let snapshot = write(
            &dir,
            "snapshot.json",
            r#"{"running": [{"display_name": "blockingJob"}]}"#,
        );

        let decision = evaluate(&spec, &snapshot, None).expect("evaluate failed");
        assert!(decision.blocked);
        assert_eq!(decision.message, "Blocked by blockingJob");
    }

    #[test]
    fn test_evaluate_env_with_candidate() {
        let dir = TempDir::new().unwrap();
        let spec = write(&dir, "spec.json", r#"{"envVarNameLines": "branchName"}"#);
        let snapshot = write(
            &dir,
            "snapshot.json",
            r#"{"running": [{"display_name": "blockingJob",
                             "environment": {"branchName": "other"}}]}"#,
        );
        let candidate = write(
            &dir,
            "candidate.json",
            r#"{"parameters": {"branchName": "someBlockingBranch"}}"#,
        );

        let decision = evaluate(&spec, &snapshot, Some(&candidate)).expect("evaluate failed");
        assert!(!decision.blocked);
        assert_eq!(decision.message, "Not blocked");
    }

    #[test]
    fn test_evaluate_missing_snapshot_errors() {
        let dir = TempDir::new().unwrap();
        let spec = write(&dir, "spec.json", "{}");
        let err = evaluate(&spec, &dir.path().join("nope.json"), None).unwrap_err();
        assert!(err.to_string().contains("Failed to load snapshot"));
    }

    #[test]
    fn test_evaluate_bad_candidate_errors() {
        let dir = TempDir::new().unwrap();
        let spec = write(&dir, "spec.json", "{}");
        let snapshot = write(&dir, "snapshot.json", "{}");
        let candidate = write(&dir, "candidate.json", "{ nope");
        let err = evaluate(&spec, &snapshot, Some(&candidate)).unwrap_err();
        assert!(err.to_string().contains("Failed to load candidate"));
    }

    #[test]
    fn test_check_spec_lists_invalid_patterns() {
        let dir = TempDir::new().unwrap();
        let spec = write(
            &dir,
            "spec.json",
            r#"{"name_regex_lines": "xxx\n\n*BW2S.*QRT.\nblock.*"}"#,
        );
        let report = check_spec(&spec).expect("check failed");
        assert_eq!(report.patterns, vec!["xxx", "*BW2S.*QRT.", "block.*"]);
        assert_eq!(report.invalid_patterns, vec!["*BW2S.*QRT."]);
        assert!(!report.disabled);
        assert!(cmd_check_spec(&spec).is_err());
    }

    #[test]
    fn test_cli_parses_evaluate() {
        let cli = Cli::try_parse_from([
            "buildblock",
            "--json",
            "evaluate",
            "--spec",
            "s.json",
            "--snapshot",
            "snap.json",
        ])
        .expect("parse failed");
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Evaluate { candidate: None, .. }));
    }
}
