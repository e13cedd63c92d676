//! Prerequisite checks and the candidate build step.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// An external program that must be available before anything runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Program name looked up on `PATH`, or a path.
    pub program: String,

    /// How the program is described to the operator.
    pub label: String,
}

impl Requirement {
    pub fn new(program: &str, label: &str) -> Self {
        Self {
            program: program.to_string(),
            label: label.to_string(),
        }
    }
}

/// Resolve every requirement, reporting all missing ones at once.
///
/// Returns the resolved paths in requirement order.
pub fn check_prerequisites(requirements: &[Requirement]) -> Result<Vec<PathBuf>> {
    let mut found = Vec::with_capacity(requirements.len());
    let mut missing = Vec::new();
    for req in requirements {
        match which::which(&req.program) {
            Ok(path) => {
                log::debug!("Found {} at {}", req.program, path.display());
                found.push(path);
            }
            Err(e) => {
                log::debug!("{} not found: {e}", req.program);
                missing.push(req.label.clone());
            }
        }
    }
    if missing.is_empty() {
        Ok(found)
    } else {
        Err(Error::PrerequisiteMissing { missing })
    }
}

/// Produces the candidate binary.
pub trait CandidateBuilder {
    /// Human-readable description, e.g. the command line.
    fn describe(&self) -> String;

    /// Build the candidate, failing with [`Error::BuildFailure`].
    fn build(&self) -> Result<()>;
}

/// Runs the project's build command in the project root.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    program: String,
    args: Vec<String>,
    dir: PathBuf,
}

impl CommandBuilder {
    /// `argv[0]` is the program; `None` if `argv` is empty.
    pub fn from_argv(argv: &[String], dir: impl AsRef<Path>) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            dir: dir.as_ref().to_path_buf(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl CandidateBuilder for CommandBuilder {
    fn describe(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn build(&self) -> Result<()> {
        log::debug!("Running `{}` in {}", self.describe(), self.dir.display());
        let output = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::BuildFailure {
                command: self.describe(),
                status: "spawn error".to_string(),
                stderr: e.to_string(),
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(Error::BuildFailure {
                command: self.describe(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        }
    }
}
