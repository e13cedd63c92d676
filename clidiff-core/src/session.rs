//! Timestamped session directories.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use fs_err as fs;

use crate::error::Result;

pub const SUMMARY_FILE: &str = "summary.md";

/// Which build a capture came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Baseline,
    Candidate,
}

impl Variant {
    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Baseline => "baseline",
            Variant::Candidate => "candidate",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One run's output directory. Never reused and never deleted by clidiff.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    dir: PathBuf,
}

impl Session {
    /// Create `results_dir/<YYYYmmdd_HHMMSS>`.
    pub fn create(results_dir: &Path) -> Result<Self> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        Self::create_with_stamp(results_dir, &stamp)
    }

    /// Create a session named `stamp`, appending `_1`, `_2`, ... if a
    /// session with that name already exists.
    pub fn create_with_stamp(results_dir: &Path, stamp: &str) -> Result<Self> {
        fs::create_dir_all(results_dir)?;
        let mut attempt = 0u32;
        loop {
            let id = if attempt == 0 {
                stamp.to_string()
            } else {
                format!("{stamp}_{attempt}")
            };
            let dir = results_dir.join(&id);
            match fs::create_dir(&dir) {
                Ok(()) => {
                    log::info!("Session directory {}", dir.display());
                    return Ok(Self { id, dir });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Raw artifacts for one variant: `<session>/<variant>/<scenario>/...`.
    pub fn capture_dir(&self, variant: Variant) -> PathBuf {
        self.dir.join(variant.as_str())
    }

    pub fn diff_path(&self, scenario: &str) -> PathBuf {
        self.dir.join(format!("{scenario}.diff"))
    }

    pub fn summary_path(&self) -> PathBuf {
        self.dir.join(SUMMARY_FILE)
    }
}
