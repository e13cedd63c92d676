//! Disposable sandbox for running the tool under test.
//!
//! The tool's configuration-location variable is overridden only in the
//! environment handed to child processes. The harness's own process
//! environment is never modified, so there is nothing to restore when the
//! sandbox scope ends, whether it ends normally or with an error.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use fs_err as fs;
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::error::Result;
use crate::runner::{Env, ProcessRunner};

/// How to build a sandbox.
#[derive(Debug, Clone)]
pub struct SandboxOptions {
    /// Environment variable the tool reads its configuration location from.
    pub env_var: String,

    /// Existing configuration to copy in, if any.
    pub source_config_dir: Option<PathBuf>,

    /// Name of the configuration directory inside the sandbox.
    pub config_dir_name: String,
}

/// A temporary directory holding a copy of the tool's configuration and an
/// empty working directory for child processes.
///
/// The directory is removed when the sandbox is dropped.
pub struct Sandbox {
    temp: TempDir,
    config_dir: PathBuf,
    work_dir: PathBuf,
    env: Env,
}

impl Sandbox {
    /// Create a sandbox. The child environment is the current process
    /// environment with `options.env_var` pointed at the sandbox config dir.
    pub fn new(options: &SandboxOptions) -> Result<Self> {
        let temp = TempDir::new()?;
        let config_dir = temp.path().join(&options.config_dir_name);
        let work_dir = temp.path().join("work");

        match &options.source_config_dir {
            Some(source) => {
                log::debug!(
                    "Copying {} into sandbox {}",
                    source.display(),
                    config_dir.display()
                );
                copy_dir_all(source, &config_dir)?;
            }
            None => fs::create_dir_all(&config_dir)?,
        }
        fs::create_dir_all(&work_dir)?;

        let mut env: Env = std::env::vars_os().collect();
        env.insert(
            OsString::from(&options.env_var),
            config_dir.clone().into_os_string(),
        );

        Ok(Self {
            temp,
            config_dir,
            work_dir,
            env,
        })
    }

    /// Root of the sandbox.
    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Environment for children run inside the sandbox.
    pub fn env(&self) -> &Env {
        &self.env
    }

    /// A process runner whose children start in the sandbox work directory.
    pub fn process_runner(&self) -> ProcessRunner {
        ProcessRunner::in_dir(&self.work_dir)
    }
}

/// Run `body` inside a fresh sandbox; the sandbox is discarded on every exit
/// path.
pub fn with_sandbox<T, F>(options: &SandboxOptions, body: F) -> Result<T>
where
    F: FnOnce(&Sandbox) -> Result<T>,
{
    let sandbox = Sandbox::new(options)?;
    body(&sandbox)
}

/// Pick the configuration to copy into the sandbox: the current value of the
/// configuration variable if it names an existing directory, else the default
/// location if it exists.
pub fn resolve_source_config(
    current: Option<OsString>,
    default_dir: Option<&Path>,
) -> Option<PathBuf> {
    let from_env = current
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .filter(|p| p.is_dir());
    from_env.or_else(|| default_dir.filter(|p| p.is_dir()).map(Path::to_path_buf))
}

/// Recursively copy `src` to `dst`, following symlinks.
pub fn copy_dir_all(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry.map_err(io::Error::from)?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
