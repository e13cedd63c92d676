//! Invocation runner trait and the child-process implementation.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::Instant;

use crate::baseline::ResultSet;
use crate::capture::{persist, CapturedRecord};
use crate::error::{Error, Result};
use crate::scenario::Scenario;

/// The complete environment handed to a child process.
pub type Env = BTreeMap<OsString, OsString>;

/// Split a scenario command into arguments.
///
/// Splitting is on whitespace only: there is no quoting, so an argument that
/// itself contains a space cannot be expressed.
pub fn split_command(command: &str) -> Vec<&str> {
    command.split_whitespace().collect()
}

/// Given a path, produce a [`CapturedRecord`] for a command.
///
/// Implementations:
/// - `ProcessRunner`: spawns the executable as a child process
/// - test runners that replay canned records
pub trait InvocationRunner {
    /// Get the runner name.
    fn name(&self) -> &'static str;

    /// Run `command` against `executable` with exactly `env`.
    ///
    /// A nonzero exit is a normal result. Only a failure to launch the
    /// executable is an error.
    fn execute(&self, executable: &Path, command: &str, env: &Env) -> Result<CapturedRecord>;
}

/// Spawns the executable and blocks until it exits.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    /// Working directory for the child; inherits ours when unset.
    current_dir: Option<PathBuf>,
}

impl ProcessRunner {
    /// Create a runner that inherits the current working directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a runner whose children start in `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            current_dir: Some(dir.into()),
        }
    }
}

impl InvocationRunner for ProcessRunner {
    fn name(&self) -> &'static str {
        "process"
    }

    fn execute(&self, executable: &Path, command: &str, env: &Env) -> Result<CapturedRecord> {
        let mut cmd = Command::new(executable);
        cmd.args(split_command(command))
            .env_clear()
            .envs(env)
            .stdin(Stdio::null());
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }

        let start = Instant::now();
        let output = cmd.output().map_err(|source| Error::SpawnFailure {
            path: executable.to_path_buf(),
            source,
        })?;
        let duration = start.elapsed().as_secs_f64();

        Ok(CapturedRecord {
            command: command.to_string(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: exit_code(output.status),
            duration,
        })
    }
}

/// Exit code, or the negated signal number for a child killed by a signal.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    -1
}

/// Notified around every scenario run by [`capture_all`].
pub trait CaptureObserver {
    /// Called once with the number of scenarios about to run.
    fn begin(&mut self, _total: usize) {}

    fn started(&mut self, _scenario: &Scenario) {}

    fn finished(&mut self, _scenario: &Scenario, _record: &CapturedRecord) {}
}

impl CaptureObserver for () {}

/// Run every scenario in order against `executable`, persisting each record
/// under `capture_dir/<scenario name>`.
///
/// Stops at the first launch failure: if the executable cannot be spawned for
/// one scenario it cannot be spawned for any of them.
pub fn capture_all<R, O>(
    runner: &R,
    executable: &Path,
    scenarios: &[Scenario],
    env: &Env,
    capture_dir: &Path,
    observer: &mut O,
) -> Result<ResultSet>
where
    R: InvocationRunner + ?Sized,
    O: CaptureObserver + ?Sized,
{
    log::debug!(
        "Capturing {} scenarios from {} with the {} runner",
        scenarios.len(),
        executable.display(),
        runner.name()
    );

    observer.begin(scenarios.len());
    let mut results = ResultSet::new();
    for scenario in scenarios {
        observer.started(scenario);
        let record = runner.execute(executable, &scenario.command, env)?;
        persist(&record, &capture_dir.join(&scenario.name))?;
        observer.finished(scenario, &record);
        results.insert(scenario.name.clone(), record);
    }
    Ok(results)
}
