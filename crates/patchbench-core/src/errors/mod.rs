use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("config error: {0}")]
    Config(String),

    #[error("missing credential: environment variable {var} is not set")]
    MissingCredential { var: String },

    #[error("provider error{}: {detail}", .status.map(|s| format!(" (status {s})")).unwrap_or_default())]
    Provider { status: Option<u16>, detail: String },

    #[error("failed to run `{program}`: {source}")]
    Process {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("io error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("baseline error: {0}")]
    Baseline(String),
}

impl BenchError {
    pub fn config(detail: impl Into<String>) -> Self {
        Self::Config(detail.into())
    }

    pub fn provider(status: Option<u16>, detail: impl Into<String>) -> Self {
        Self::Provider {
            status,
            detail: detail.into(),
        }
    }

    pub fn process(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::Process {
            program: program.into(),
            source,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Errors that abort the whole run, as opposed to a single trial.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::MissingCredential { .. } | Self::Baseline(_)
        )
    }
}
