//! Captured invocation records and their on-disk artifacts.

use std::path::{Path, PathBuf};

use fs_err as fs;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const STDOUT_FILE: &str = "stdout.txt";
pub const STDERR_FILE: &str = "stderr.txt";
pub const INFO_FILE: &str = "info.json";

/// Everything observable about one invocation of the tool under test.
///
/// A failing invocation is still a complete record, just with a nonzero
/// `exit_code`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CapturedRecord {
    /// The scenario command string, as written in the scenario file.
    pub command: String,

    /// Complete standard output.
    pub stdout: String,

    /// Complete standard error.
    pub stderr: String,

    /// Exit status. Negative values are the signal that killed the process.
    pub exit_code: i32,

    /// Wall-clock duration in seconds.
    pub duration: f64,
}

/// Metadata written next to the raw output files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureInfo {
    pub command: String,
    pub exit_code: i32,
    pub duration: f64,
}

impl CapturedRecord {
    /// Whether stdout, stderr and exit code are all equal. Duration and the
    /// command string are not observable output and are ignored.
    pub fn same_output(&self, other: &CapturedRecord) -> bool {
        self.exit_code == other.exit_code
            && self.stdout == other.stdout
            && self.stderr == other.stderr
    }

    pub fn info(&self) -> CaptureInfo {
        CaptureInfo {
            command: self.command.clone(),
            exit_code: self.exit_code,
            duration: self.duration,
        }
    }
}

/// Write `record` as `stdout.txt`, `stderr.txt` and `info.json` inside
/// `scenario_dir`, creating it if needed.
pub fn persist(record: &CapturedRecord, scenario_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(scenario_dir)?;
    fs::write(scenario_dir.join(STDOUT_FILE), &record.stdout)?;
    fs::write(scenario_dir.join(STDERR_FILE), &record.stderr)?;
    fs::write(
        scenario_dir.join(INFO_FILE),
        serde_json::to_string_pretty(&record.info())?,
    )?;
    log::debug!("Captured artifacts written to {}", scenario_dir.display());
    Ok(scenario_dir.to_path_buf())
}
