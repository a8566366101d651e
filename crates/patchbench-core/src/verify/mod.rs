//! Scores a mutated target: passed-test count from the test runner, and
//! medium/high findings from the security scanner.

use crate::config::BenchConfig;
use crate::errors::BenchError;
use crate::model::Verification;
use async_trait::async_trait;
use regex::Regex;
use std::process::Stdio;
use std::sync::OnceLock;
use tokio::process::Command;

#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(&self) -> Result<Verification, BenchError>;
}

fn passed_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+) passed").expect("static regex"))
}

/// First `N passed` in the runner's output; 0 when absent.
pub fn parse_passed_count(stdout: &str) -> u32 {
    passed_re()
        .captures(stdout)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Sum of `SEVERITY.HIGH` and `SEVERITY.MEDIUM` under `metrics._totals` in a
/// bandit-style JSON report. Anything unparseable counts as 0.
pub fn parse_security_findings(stdout: &str) -> u64 {
    let doc: serde_json::Value = match serde_json::from_str(stdout) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(error = %e, "scanner output is not JSON; counting 0 findings");
            return 0;
        }
    };
    let totals = doc.pointer("/metrics/_totals");
    ["SEVERITY.HIGH", "SEVERITY.MEDIUM"]
        .iter()
        .map(|key| {
            totals
                .and_then(|t| t.get(*key))
                .and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f.max(0.0) as u64)))
                .unwrap_or(0)
        })
        .sum()
}

/// Run `argv` to completion and return its stdout. A non-zero exit status is
/// not an error: test runners and scanners use it to report findings.
/// Dropping the returned future kills the child.
pub async fn run_capture(argv: &[String]) -> Result<String, BenchError> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| BenchError::config("empty command"))?;
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| BenchError::process(program.clone(), e))?;
    tracing::debug!(
        program = %program,
        status = ?output.status.code(),
        stdout_bytes = output.stdout.len(),
        "command finished"
    );
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Runs the configured test and scan commands as child processes.
#[derive(Debug, Clone)]
pub struct ProcessVerifier {
    test: Vec<String>,
    scan: Vec<String>,
}

impl ProcessVerifier {
    pub fn new(test: Vec<String>, scan: Vec<String>) -> Self {
        Self { test, scan }
    }

    pub fn from_config(cfg: &BenchConfig) -> Self {
        Self::new(
            cfg.expand_command(&cfg.commands.test),
            cfg.expand_command(&cfg.commands.scan),
        )
    }
}

#[async_trait]
impl Verifier for ProcessVerifier {
    async fn verify(&self) -> Result<Verification, BenchError> {
        let passed = parse_passed_count(&run_capture(&self.test).await?);
        let security_findings = parse_security_findings(&run_capture(&self.scan).await?);
        Ok(Verification {
            passed,
            security_findings,
        })
    }
}
