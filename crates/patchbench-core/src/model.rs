use serde::{Deserialize, Serialize};

/// One model configuration under evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Candidate {
    /// Display name used in console output and the report.
    pub name: String,
    /// Model identifier sent to the provider.
    pub model: String,
}

impl Candidate {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub provider: String,
    pub model: String,
    pub usage: Option<TokenUsage>,
}

impl LlmResponse {
    pub fn total_tokens(&self) -> u64 {
        self.usage.map(|u| u.total_tokens).unwrap_or(0)
    }
}

/// Counters scraped from the test runner and the security scanner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub passed: u32,
    pub security_findings: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrialOutcome {
    Completed {
        passed: bool,
        tokens: u64,
        security_findings: u64,
    },
    Errored {
        message: String,
    },
}

impl TrialOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            TrialOutcome::Completed { passed: true, .. } => "PASS",
            TrialOutcome::Completed { passed: false, .. } => "FAIL",
            TrialOutcome::Errored { .. } => "ERROR",
        }
    }
}

/// Running totals for one candidate. Errored trials still count as iterations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    pub iterations: u32,
    pub successes: u32,
    pub errors: u32,
    pub total_tokens: u64,
    pub total_security: u64,
}

impl Tally {
    pub fn record(&mut self, outcome: &TrialOutcome) {
        self.iterations += 1;
        match outcome {
            TrialOutcome::Completed {
                passed,
                tokens,
                security_findings,
            } => {
                if *passed {
                    self.successes += 1;
                }
                self.total_tokens += tokens;
                self.total_security += security_findings;
            }
            TrialOutcome::Errored { .. } => self.errors += 1,
        }
    }

    pub fn finish(&self, candidate: &Candidate) -> AggregateResult {
        let (consistency_pct, avg_tokens) = if self.iterations == 0 {
            (0.0, 0)
        } else {
            (
                f64::from(self.successes) / f64::from(self.iterations) * 100.0,
                self.total_tokens / u64::from(self.iterations),
            )
        };
        AggregateResult {
            name: candidate.name.clone(),
            model: candidate.model.clone(),
            iterations: self.iterations,
            successes: self.successes,
            errors: self.errors,
            consistency_pct,
            avg_tokens,
            total_security: self.total_security,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub name: String,
    pub model: String,
    pub iterations: u32,
    pub successes: u32,
    pub errors: u32,
    pub consistency_pct: f64,
    pub avg_tokens: u64,
    pub total_security: u64,
}

impl AggregateResult {
    pub fn consistency_label(&self) -> String {
        format!("{:.1}%", self.consistency_pct)
    }
}
