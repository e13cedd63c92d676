//! clidiff error types.
//!
//! Every variant is fatal for the run that raised it. A scenario that is
//! missing from the candidate run is not an error: it is reported as
//! [`crate::Outcome::MissingInCandidate`].

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by clidiff operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Required external tools are absent.
    #[error("missing prerequisites: {}", .missing.join(", "))]
    PrerequisiteMissing { missing: Vec<String> },

    /// A comparison was requested but no baseline has been captured.
    #[error("no baseline found at {} - run with --update-baseline first", .path.display())]
    BaselineMissing { path: PathBuf },

    /// The candidate build command failed.
    #[error("build failed: `{command}` exited with {status}\n{stderr}")]
    BuildFailure {
        command: String,
        status: String,
        stderr: String,
    },

    /// The executable under test could not be launched at all.
    #[error("failed to launch {}: {source}", .path.display())]
    SpawnFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The scenario document is malformed.
    #[error("invalid scenario file {}: {message}", .path.display())]
    InvalidScenarios { path: PathBuf, message: String },

    /// The baseline document is malformed.
    #[error("invalid baseline {}: {message}", .path.display())]
    InvalidBaseline { path: PathBuf, message: String },

    /// The configuration file is malformed.
    #[error("invalid config {}: {message}", .path.display())]
    InvalidConfig { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Stable identifier for the error condition.
    pub fn error_type(&self) -> &'static str {
        match self {
            Error::PrerequisiteMissing { .. } => "prerequisite_missing",
            Error::BaselineMissing { .. } => "baseline_missing",
            Error::BuildFailure { .. } => "build_failure",
            Error::SpawnFailure { .. } => "spawn_failure",
            Error::InvalidScenarios { .. } => "invalid_scenarios",
            Error::InvalidBaseline { .. } => "invalid_baseline",
            Error::InvalidConfig { .. } => "invalid_config",
            Error::Io(_) => "io_error",
            Error::Json(_) => "json_error",
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
