//! The file under test: resetting it, appending model output to it, and the
//! guard that puts everything back when a run ends.

use crate::config::BenchConfig;
use crate::errors::BenchError;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

/// Puts the target file back into its committed state.
pub trait TargetRestorer: Send + Sync {
    fn restore(&self) -> Result<(), BenchError>;
}

/// Restores by running a version-control command such as
/// `git checkout -- <target>`.
#[derive(Debug, Clone)]
pub struct CommandRestorer {
    argv: Vec<String>,
}

impl CommandRestorer {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }

    pub fn from_config(cfg: &BenchConfig) -> Self {
        Self::new(cfg.expand_command(&cfg.commands.restore))
    }
}

impl TargetRestorer for CommandRestorer {
    fn restore(&self) -> Result<(), BenchError> {
        let (program, args) = self
            .argv
            .split_first()
            .ok_or_else(|| BenchError::config("empty restore command"))?;
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| BenchError::process(program.clone(), e))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BenchError::process(
                program.clone(),
                std::io::Error::other(format!(
                    "exited with {}: {}",
                    output.status,
                    stderr.trim()
                )),
            ));
        }
        Ok(())
    }
}

/// Append `code` to the end of `path`. The file must already exist.
pub fn append_code(path: &Path, code: &str) -> Result<(), BenchError> {
    let mut f = std::fs::OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| BenchError::io(path, e))?;
    f.write_all(code.as_bytes()).map_err(|e| BenchError::io(path, e))
}

/// Remove each path if present; directories recursively. Returns the paths
/// that were actually removed.
pub fn remove_artifacts(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut removed = Vec::new();
    for p in paths {
        let res = match std::fs::symlink_metadata(p) {
            Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(p),
            Ok(_) => std::fs::remove_file(p),
            Err(_) => continue,
        };
        match res {
            Ok(()) => removed.push(p.clone()),
            Err(e) => tracing::warn!(path = %p.display(), error = %e, "failed to remove artifact"),
        }
    }
    removed
}

/// Restores the target and removes generated artifacts exactly once: on
/// [`CleanupGuard::finish`] or, failing that, when dropped.
pub struct CleanupGuard {
    restorer: Arc<dyn TargetRestorer>,
    artifacts: Vec<PathBuf>,
    done: bool,
}

impl CleanupGuard {
    pub fn new(restorer: Arc<dyn TargetRestorer>, artifacts: Vec<PathBuf>) -> Self {
        Self {
            restorer,
            artifacts,
            done: false,
        }
    }

    pub fn finish(mut self) {
        self.cleanup();
    }

    fn cleanup(&mut self) {
        if self.done {
            return;
        }
        self.done = true;
        if let Err(e) = self.restorer.restore() {
            tracing::warn!(error = %e, "failed to restore target during cleanup");
        }
        let removed = remove_artifacts(&self.artifacts);
        tracing::debug!(removed = removed.len(), "cleanup finished");
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        self.cleanup();
    }
}
