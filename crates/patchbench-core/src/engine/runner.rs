use crate::config::BenchConfig;
use crate::errors::BenchError;
use crate::extract::extract_code;
use crate::model::{AggregateResult, Candidate, Tally, TrialOutcome};
use crate::providers::llm::LlmClient;
use crate::report::progress::{ProgressEvent, ProgressSink};
use crate::verify::{ProcessVerifier, Verifier};
use crate::workspace::{append_code, CleanupGuard, CommandRestorer, TargetRestorer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Where the success threshold came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdSource {
    Configured,
    Baseline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub threshold: u32,
    pub threshold_source: ThresholdSource,
    pub results: Vec<AggregateResult>,
}

pub struct BenchRunner {
    pub config: BenchConfig,
    pub client: Arc<dyn LlmClient>,
    pub restorer: Arc<dyn TargetRestorer>,
    pub verifier: Arc<dyn Verifier>,
}

impl BenchRunner {
    /// Runner backed by the configured restore/test/scan commands.
    pub fn from_config(config: BenchConfig, client: Arc<dyn LlmClient>) -> Self {
        let restorer = Arc::new(CommandRestorer::from_config(&config));
        let verifier = Arc::new(ProcessVerifier::from_config(&config));
        Self {
            config,
            client,
            restorer,
            verifier,
        }
    }

    /// Benchmark every candidate in order. The target is restored and the
    /// artifacts removed on every exit path, including early errors.
    pub async fn run(&self, progress: Option<ProgressSink>) -> anyhow::Result<RunSummary> {
        let guard = CleanupGuard::new(self.restorer.clone(), self.config.artifacts.clone());

        let target = &self.config.task.target_file;
        if !target.is_file() {
            return Err(BenchError::config(format!(
                "target file {} does not exist",
                target.display()
            ))
            .into());
        }

        let (threshold, threshold_source) = self.resolve_threshold().await?;
        tracing::info!(
            threshold,
            source = ?threshold_source,
            candidates = self.config.candidates.len(),
            iterations = self.config.iterations,
            "starting benchmark"
        );

        let total = self.config.candidates.len();
        let mut results = Vec::with_capacity(total);
        for (index, candidate) in self.config.candidates.iter().enumerate() {
            if let Some(ref sink) = progress {
                sink(ProgressEvent::CandidateStarted {
                    candidate,
                    index,
                    total,
                });
            }
            let result = self
                .run_candidate(candidate, threshold, progress.as_ref())
                .await;
            results.push(result);
        }

        guard.finish();
        Ok(RunSummary {
            threshold,
            threshold_source,
            results,
        })
    }

    /// Configured threshold, or the pass count of the untouched target.
    pub async fn resolve_threshold(&self) -> Result<(u32, ThresholdSource), BenchError> {
        if let Some(t) = self.config.success_threshold {
            return Ok((t, ThresholdSource::Configured));
        }

        self.restorer
            .restore()
            .map_err(|e| BenchError::Baseline(format!("could not reset target: {}", e)))?;
        let baseline = self
            .verifier
            .verify()
            .await
            .map_err(|e| BenchError::Baseline(format!("baseline test run failed: {}", e)))?;
        if baseline.passed == 0 {
            return Err(BenchError::Baseline(
                "unmodified target reported 0 passed tests; set success_threshold explicitly"
                    .into(),
            ));
        }
        tracing::info!(
            passed = baseline.passed,
            security_findings = baseline.security_findings,
            "measured baseline"
        );
        Ok((baseline.passed, ThresholdSource::Baseline))
    }

    pub async fn run_candidate(
        &self,
        candidate: &Candidate,
        threshold: u32,
        progress: Option<&ProgressSink>,
    ) -> AggregateResult {
        let mut tally = Tally::default();
        for i in 0..self.config.iterations {
            let outcome = match self.run_trial(candidate, threshold).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    let message = format!("{:#}", e);
                    tracing::warn!(
                        candidate = %candidate.name,
                        iteration = i + 1,
                        error = %message,
                        "trial errored"
                    );
                    TrialOutcome::Errored { message }
                }
            };
            tally.record(&outcome);
            if let Some(sink) = progress {
                sink(ProgressEvent::TrialFinished {
                    candidate,
                    iteration: i + 1,
                    outcome: &outcome,
                });
            }
        }
        tally.finish(candidate)
    }

    /// One reset -> query -> mutate -> verify cycle.
    async fn run_trial(
        &self,
        candidate: &Candidate,
        threshold: u32,
    ) -> anyhow::Result<TrialOutcome> {
        self.restorer.restore()?;

        let resp = self
            .client
            .complete(&candidate.model, &self.config.task.prompt)
            .await?;
        let code = extract_code(&resp.text);
        append_code(&self.config.task.target_file, &code)?;

        let verification = self.verifier.verify().await?;
        tracing::debug!(
            candidate = %candidate.name,
            passed = verification.passed,
            security_findings = verification.security_findings,
            tokens = resp.total_tokens(),
            "trial verified"
        );
        Ok(TrialOutcome::Completed {
            passed: verification.passed >= threshold,
            tokens: resp.total_tokens(),
            security_findings: verification.security_findings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::model::Verification;
    use crate::providers::llm::fake::FakeClient;
    use crate::workspace::test_support::SnapshotRestorer;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Replays scripted verifications; once exhausted, repeats the last one.
    struct ScriptedVerifier {
        script: Mutex<Vec<Result<Verification, String>>>,
        seen: Mutex<Vec<String>>,
        target: std::path::PathBuf,
    }

    impl ScriptedVerifier {
        fn new(target: &Path, script: Vec<Result<Verification, String>>) -> Self {
            Self {
                script: Mutex::new(script),
                seen: Mutex::new(Vec::new()),
                target: target.to_path_buf(),
            }
        }
    }

    #[async_trait::async_trait]
    impl Verifier for ScriptedVerifier {
        async fn verify(&self) -> Result<Verification, BenchError> {
            self.seen
                .lock()
                .unwrap()
                .push(std::fs::read_to_string(&self.target).unwrap());
            let mut script = self.script.lock().unwrap();
            let next = if script.len() > 1 {
                script.remove(0)
            } else {
                script[0].clone()
            };
            next.map_err(|m| BenchError::process("pytest", std::io::Error::other(m)))
        }
    }

    /// A restore command that always exits non-zero.
    struct BrokenRestorer;

    impl TargetRestorer for BrokenRestorer {
        fn restore(&self) -> Result<(), BenchError> {
            Err(BenchError::process(
                "git",
                std::io::Error::other("exited with exit status: 128"),
            ))
        }
    }

    fn verified(passed: u32, security_findings: u64) -> Result<Verification, String> {
        Ok(Verification {
            passed,
            security_findings,
        })
    }

    fn config(target: &Path, iterations: u32, threshold: Option<u32>) -> BenchConfig {
        let mut cfg = parse_config(
            r#"
version: 1
task:
  prompt: "Write secure_headers."
  target_file: placeholder.py
candidates:
  - { name: "Llama 3.1 (8B)", model: llama-3.1-8b-instant }
"#,
        )
        .unwrap();
        cfg.task.target_file = target.to_path_buf();
        cfg.iterations = iterations;
        cfg.success_threshold = threshold;
        cfg.artifacts = vec![];
        cfg
    }

    fn setup() -> (tempfile::TempDir, std::path::PathBuf, Arc<SnapshotRestorer>) {
        let tmp = tempdir().unwrap();
        let target = tmp.path().join("applications.py");
        std::fs::write(&target, "class FastAPI:\n    pass\n").unwrap();
        let restorer = Arc::new(SnapshotRestorer::capture(&target));
        (tmp, target, restorer)
    }

    #[tokio::test]
    async fn errored_trial_counts_against_consistency_and_tokens() {
        let (_tmp, target, restorer) = setup();
        let client = FakeClient::new()
            .then_fail("503 upstream unavailable")
            .then_reply("```python\ndef secure_headers(self):\n    pass\n```", 50);
        let runner = BenchRunner {
            config: config(&target, 2, Some(10)),
            client: Arc::new(client),
            restorer: restorer.clone(),
            verifier: Arc::new(ScriptedVerifier::new(&target, vec![verified(10, 1)])),
        };

        let summary = runner.run(None).await.unwrap();

        let r = &summary.results[0];
        assert_eq!(r.consistency_label(), "50.0%");
        assert_eq!(r.avg_tokens, 25);
        assert_eq!(r.total_security, 1);
        assert_eq!(r.errors, 1);
        assert_eq!(summary.threshold_source, ThresholdSource::Configured);
        assert_eq!(
            std::fs::read_to_string(&target).unwrap(),
            "class FastAPI:\n    pass\n"
        );
    }

    #[tokio::test]
    async fn each_trial_starts_from_a_clean_target() {
        let (_tmp, target, restorer) = setup();
        let client =
            FakeClient::new().with_response("def secure_headers(self):\n    pass".into());
        let verifier = Arc::new(ScriptedVerifier::new(&target, vec![verified(3, 0)]));
        let runner = BenchRunner {
            config: config(&target, 3, Some(3)),
            client: Arc::new(client),
            restorer: restorer.clone(),
            verifier: verifier.clone(),
        };

        let summary = runner.run(None).await.unwrap();

        assert_eq!(summary.results[0].consistency_label(), "100.0%");
        let seen = verifier.seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        for content in seen.iter() {
            assert_eq!(
                content,
                "class FastAPI:\n    pass\n\ndef secure_headers(self):\n    pass\n"
            );
        }
        // one reset per trial plus the final cleanup
        assert_eq!(restorer.calls(), 4);
    }

    #[tokio::test]
    async fn failed_reset_errors_the_trial_instead_of_stacking_patches() {
        let (_tmp, target, _restorer) = setup();
        let client =
            FakeClient::new().with_response("def secure_headers(self):\n    pass".into());
        let verifier = Arc::new(ScriptedVerifier::new(&target, vec![verified(2, 0)]));
        let runner = BenchRunner {
            config: config(&target, 2, Some(2)),
            client: Arc::new(client),
            restorer: Arc::new(BrokenRestorer),
            verifier: verifier.clone(),
        };

        let r = runner.run(None).await.unwrap().results.remove(0);

        assert_eq!(r.errors, 2);
        assert_eq!(r.successes, 0);
        assert!(verifier.seen.lock().unwrap().is_empty());
        assert_eq!(
            std::fs::read_to_string(&target).unwrap(),
            "class FastAPI:\n    pass\n"
        );
    }

    #[tokio::test]
    async fn below_threshold_is_a_failure_not_an_error() {
        let (_tmp, target, restorer) = setup();
        let runner = BenchRunner {
            config: config(&target, 3, Some(100)),
            client: Arc::new(
                FakeClient::new()
                    .then_reply("def f(): pass", 100)
                    .then_reply("def f(): pass", 200)
                    .then_reply("def f(): pass", 300),
            ),
            restorer,
            verifier: Arc::new(ScriptedVerifier::new(
                &target,
                vec![verified(100, 0), verified(99, 2), verified(100, 0)],
            )),
        };

        let r = runner.run(None).await.unwrap().results.remove(0);

        assert_eq!(r.consistency_label(), "66.7%");
        assert_eq!(r.avg_tokens, 200);
        assert_eq!(r.total_security, 2);
        assert_eq!(r.errors, 0);
    }

    #[tokio::test]
    async fn verifier_failure_is_recorded_as_error() {
        let (_tmp, target, restorer) = setup();
        let runner = BenchRunner {
            config: config(&target, 1, Some(1)),
            client: Arc::new(FakeClient::new().then_reply("def f(): pass", 40)),
            restorer,
            verifier: Arc::new(ScriptedVerifier::new(
                &target,
                vec![Err("pytest: not found".into())],
            )),
        };

        let r = runner.run(None).await.unwrap().results.remove(0);

        assert_eq!(r.errors, 1);
        assert_eq!(r.avg_tokens, 0);
        assert_eq!(r.consistency_label(), "0.0%");
    }

    #[tokio::test]
    async fn baseline_threshold_is_measured_on_clean_target() {
        let (_tmp, target, restorer) = setup();
        let verifier = Arc::new(ScriptedVerifier::new(
            &target,
            vec![verified(42, 0), verified(42, 0), verified(41, 0)],
        ));
        let runner = BenchRunner {
            config: config(&target, 2, None),
            client: Arc::new(FakeClient::new()),
            restorer,
            verifier: verifier.clone(),
        };

        let summary = runner.run(None).await.unwrap();

        assert_eq!(summary.threshold, 42);
        assert_eq!(summary.threshold_source, ThresholdSource::Baseline);
        assert_eq!(summary.results[0].successes, 1);
        assert_eq!(
            verifier.seen.lock().unwrap()[0],
            "class FastAPI:\n    pass\n"
        );
    }

    #[tokio::test]
    async fn zero_baseline_aborts_but_still_cleans_up() {
        let (tmp, target, restorer) = setup();
        let artifact = tmp.path().join("log.txt");
        std::fs::write(&artifact, "x").unwrap();
        std::fs::write(&target, "dirty from an earlier crash\n").unwrap();
        let mut cfg = config(&target, 2, None);
        cfg.artifacts = vec![artifact.clone()];
        let runner = BenchRunner {
            config: cfg,
            client: Arc::new(FakeClient::new()),
            restorer: restorer.clone(),
            verifier: Arc::new(ScriptedVerifier::new(&target, vec![verified(0, 0)])),
        };

        let err = runner.run(None).await.unwrap_err();

        let bench = err.downcast_ref::<BenchError>().unwrap();
        assert!(matches!(bench, BenchError::Baseline(_)));
        assert_eq!(
            std::fs::read_to_string(&target).unwrap(),
            "class FastAPI:\n    pass\n"
        );
        assert!(!artifact.exists());
    }

    #[tokio::test]
    async fn missing_target_is_a_config_error() {
        let (tmp, _target, restorer) = setup();
        let missing = tmp.path().join("missing.py");
        let runner = BenchRunner {
            config: config(&missing, 1, Some(1)),
            client: Arc::new(FakeClient::new()),
            restorer,
            verifier: Arc::new(ScriptedVerifier::new(&missing, vec![verified(1, 0)])),
        };
        let err = runner.run(None).await.unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[tokio::test]
    async fn progress_sink_sees_every_trial() {
        let (_tmp, target, restorer) = setup();
        let mut cfg = config(&target, 2, Some(1));
        cfg.candidates.push(Candidate::new("Qwen 3 (32B)", "qwen/qwen3-32b"));
        let runner = BenchRunner {
            config: cfg,
            client: Arc::new(FakeClient::new()),
            restorer,
            verifier: Arc::new(ScriptedVerifier::new(&target, vec![verified(1, 0)])),
        };
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink_events = events.clone();
        let sink: ProgressSink = Arc::new(move |ev: ProgressEvent<'_>| {
            let line = match ev {
                ProgressEvent::CandidateStarted { candidate, .. } => {
                    format!("start {}", candidate.model)
                }
                ProgressEvent::TrialFinished {
                    iteration, outcome, ..
                } => format!("run {} {}", iteration, outcome.label()),
            };
            sink_events.lock().unwrap().push(line);
        });

        let summary = runner.run(Some(sink)).await.unwrap();

        assert_eq!(summary.results.len(), 2);
        assert_eq!(summary.results[1].name, "Qwen 3 (32B)");
        assert_eq!(
            *events.lock().unwrap(),
            vec![
                "start llama-3.1-8b-instant",
                "run 1 PASS",
                "run 2 PASS",
                "start qwen/qwen3-32b",
                "run 1 PASS",
                "run 2 PASS",
            ]
        );
    }
}
