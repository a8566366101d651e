use crate::errors::BenchError;
use crate::model::Candidate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;
pub const DEFAULT_CONFIG_PATH: &str = "patchbench.yaml";
pub const SAMPLE_CONFIG: &str = include_str!("../../templates/patchbench.yaml");

pub const TARGET_PLACEHOLDER: &str = "{target}";
pub const TEST_DIR_PLACEHOLDER: &str = "{test_dir}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BenchConfig {
    pub version: u32,
    pub task: TaskConfig,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Minimum passed-test count for a trial to count as a success. When
    /// unset the runner measures it on the unmodified target.
    #[serde(default)]
    pub success_threshold: Option<u32>,
    #[serde(default)]
    pub provider: ProviderConfig,
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub commands: CommandsConfig,
    #[serde(default = "default_artifacts")]
    pub artifacts: Vec<PathBuf>,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub prompt: String,
    pub target_file: PathBuf,
    #[serde(default = "default_test_dir")]
    pub test_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Any OpenAI-compatible chat completions endpoint.
    #[default]
    Openai,
    /// Canned response, no network.
    Fake,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub fake_response: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            max_tokens: None,
            fake_response: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandsConfig {
    #[serde(default = "default_restore_command")]
    pub restore: Vec<String>,
    #[serde(default = "default_test_command")]
    pub test: Vec<String>,
    #[serde(default = "default_scan_command")]
    pub scan: Vec<String>,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            restore: default_restore_command(),
            test: default_test_command(),
            scan: default_scan_command(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    #[serde(default = "default_html_path")]
    pub html_path: PathBuf,
    #[serde(default)]
    pub json_path: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            html_path: default_html_path(),
            json_path: None,
        }
    }
}

fn default_iterations() -> u32 {
    3
}

fn default_temperature() -> f32 {
    0.7
}

fn default_title() -> String {
    "Code generation benchmark".to_string()
}

fn default_test_dir() -> PathBuf {
    PathBuf::from("tests")
}

fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

fn default_restore_command() -> Vec<String> {
    argv(&["git", "checkout", "--", TARGET_PLACEHOLDER])
}

fn default_test_command() -> Vec<String> {
    argv(&[
        "pytest",
        TEST_DIR_PLACEHOLDER,
        "-q",
        "--disable-warnings",
        "-p",
        "no:cacheprovider",
    ])
}

fn default_scan_command() -> Vec<String> {
    argv(&["bandit", "-r", TARGET_PLACEHOLDER, "-f", "json"])
}

fn default_artifacts() -> Vec<PathBuf> {
    ["log.txt", "coverage", ".pytest_cache"]
        .into_iter()
        .map(PathBuf::from)
        .collect()
}

fn default_html_path() -> PathBuf {
    PathBuf::from("dashboard.html")
}

fn argv(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl BenchConfig {
    pub fn validate(&self) -> Result<(), BenchError> {
        if self.version != SUPPORTED_CONFIG_VERSION {
            return Err(BenchError::config(format!(
                "unsupported config version {} (supported: {})",
                self.version, SUPPORTED_CONFIG_VERSION
            )));
        }
        if self.iterations == 0 {
            return Err(BenchError::config("iterations must be at least 1"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(BenchError::config(format!(
                "temperature {} out of range [0, 2]",
                self.temperature
            )));
        }
        if self.task.prompt.trim().is_empty() {
            return Err(BenchError::config("task.prompt is empty"));
        }
        if self.task.target_file.as_os_str().is_empty() {
            return Err(BenchError::config("task.target_file is empty"));
        }
        if self.candidates.is_empty() {
            return Err(BenchError::config("config has no candidates"));
        }
        for (idx, c) in self.candidates.iter().enumerate() {
            if c.name.trim().is_empty() || c.model.trim().is_empty() {
                return Err(BenchError::config(format!(
                    "candidates[{}] needs both a name and a model",
                    idx
                )));
            }
        }
        for (name, cmd) in [
            ("restore", &self.commands.restore),
            ("test", &self.commands.test),
            ("scan", &self.commands.scan),
        ] {
            if cmd.first().map(|p| p.trim().is_empty()).unwrap_or(true) {
                return Err(BenchError::config(format!(
                    "commands.{} must name a program",
                    name
                )));
            }
        }
        if self.provider.kind == ProviderKind::Openai && self.provider.api_key_env.is_empty() {
            return Err(BenchError::config("provider.api_key_env is empty"));
        }
        Ok(())
    }

    /// Expand `{target}` / `{test_dir}` in a command template.
    pub fn expand_command(&self, template: &[String]) -> Vec<String> {
        let target = self.task.target_file.to_string_lossy();
        let test_dir = self.task.test_dir.to_string_lossy();
        template
            .iter()
            .map(|arg| {
                arg.replace(TARGET_PLACEHOLDER, &target)
                    .replace(TEST_DIR_PLACEHOLDER, &test_dir)
            })
            .collect()
    }
}

pub fn parse_config(raw: &str) -> Result<BenchConfig, BenchError> {
    let cfg: BenchConfig = serde_yaml::from_str(raw)
        .map_err(|e| BenchError::config(format!("failed to parse YAML: {}", e)))?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_config(path: &Path) -> Result<BenchConfig, BenchError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        BenchError::config(format!("failed to read config {}: {}", path.display(), e))
    })?;
    parse_config(&raw)
}

pub fn write_sample_config(path: &Path) -> Result<(), BenchError> {
    std::fs::write(path, SAMPLE_CONFIG).map_err(|e| BenchError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
version: 1
task:
  prompt: "Write a function."
  target_file: pkg/app.py
candidates:
  - name: "Small"
    model: small-1
"#;

    #[test]
    fn sample_config_is_valid() {
        let cfg = parse_config(SAMPLE_CONFIG).expect("sample config parses");
        assert_eq!(cfg.iterations, 3);
        assert_eq!(cfg.candidates.len(), 3);
        assert_eq!(cfg.candidates[2].model, "qwen/qwen3-32b");
        assert_eq!(cfg.success_threshold, None);
        assert_eq!(cfg.task.target_file, PathBuf::from("fastapi/applications.py"));
        assert!(cfg.task.prompt.contains("secure_headers"));
        assert_eq!(cfg.provider.api_key_env, "GROQ_API_KEY");
    }

    #[test]
    fn minimal_config_gets_defaults() {
        let cfg = parse_config(MINIMAL).unwrap();
        assert_eq!(cfg.iterations, 3);
        assert!((cfg.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(cfg.task.test_dir, PathBuf::from("tests"));
        assert_eq!(cfg.provider.kind, ProviderKind::Openai);
        assert_eq!(cfg.report.html_path, PathBuf::from("dashboard.html"));
        assert_eq!(
            cfg.artifacts,
            vec![
                PathBuf::from("log.txt"),
                PathBuf::from("coverage"),
                PathBuf::from(".pytest_cache")
            ]
        );
    }

    #[test]
    fn expands_placeholders() {
        let cfg = parse_config(MINIMAL).unwrap();
        assert_eq!(
            cfg.expand_command(&cfg.commands.restore),
            vec!["git", "checkout", "--", "pkg/app.py"]
        );
        assert_eq!(cfg.expand_command(&cfg.commands.test)[1], "tests");
        assert_eq!(cfg.expand_command(&cfg.commands.scan)[2], "pkg/app.py");
    }

    #[test]
    fn rejects_bad_configs() {
        let cases = [
            (MINIMAL.replace("version: 1", "version: 2"), "unsupported"),
            (format!("{}iterations: 0\n", MINIMAL), "iterations"),
            (format!("{}temperature: 3.5\n", MINIMAL), "temperature"),
            (
                MINIMAL.replace(
                    "candidates:\n  - name: \"Small\"\n    model: small-1\n",
                    "candidates: []\n",
                ),
                "no candidates",
            ),
            (
                format!("{}commands:\n  test: []\n", MINIMAL),
                "commands.test",
            ),
            (format!("{}bogus: true\n", MINIMAL), "unknown field"),
        ];
        for (raw, needle) in cases {
            let err = parse_config(&raw).expect_err(needle).to_string();
            assert!(err.contains(needle), "expected {:?} in {:?}", needle, err);
        }
    }

    #[test]
    fn load_config_reports_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
    }
}
