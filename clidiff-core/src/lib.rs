//! clidiff core - behavioral regression testing for command-line tools.
//!
//! Runs a fixed set of named invocations against an installed (baseline) build
//! and a freshly compiled (candidate) build of the same tool, and reports which
//! invocations changed their stdout, stderr, or exit code.
//!
//! # Key Types
//!
//! - [`ScenarioStore`]: the YAML list of named invocations, seeded on first use
//! - [`InvocationRunner`]: produces a [`CapturedRecord`] for one invocation
//! - [`BaselineStore`]: the JSON snapshot of one capture pass
//! - [`Comparison`]: per-scenario outcomes of baseline vs candidate
//! - [`Sandbox`]: disposable configuration directory for the tool under test
//! - [`Harness`]: ties the pieces together for the two top-level runs
//!
//! # Example
//!
//! ```no_run
//! use clidiff_core::{Console, Harness, Project};
//!
//! let project = Project::discover(&std::env::current_dir().unwrap()).unwrap();
//! let baseline = project.baseline_store().load().unwrap();
//! let mut console = Console::stdout(false, false);
//!
//! let run = Harness::new(&project)
//!     .compare(
//!         &baseline,
//!         &project.candidate_path(),
//!         None,
//!         |sandbox| sandbox.process_runner(),
//!         &mut (),
//!         &mut console,
//!     )
//!     .unwrap();
//! println!("{} scenarios differ", run.summary().differing);
//! ```

pub mod baseline;
pub mod build;
pub mod capture;
pub mod compare;
pub mod config;
pub mod console;
pub mod error;
pub mod harness;
pub mod report;
pub mod runner;
pub mod sandbox;
pub mod scenario;
pub mod session;

pub use baseline::{BaselineStore, ResultSet};
pub use build::{check_prerequisites, CandidateBuilder, CommandBuilder, Requirement};
pub use capture::CapturedRecord;
pub use compare::{Comparison, Field, Outcome, ScenarioDiff, ScenarioOutcome, Summary};
pub use config::{Config, Project, CONFIG_FILE_NAME};
pub use console::{Console, Style};
pub use error::{Error, Result};
pub use harness::{BaselineRun, CompareRun, Harness};
pub use report::ReportFiles;
pub use runner::{capture_all, CaptureObserver, Env, InvocationRunner, ProcessRunner};
pub use sandbox::{with_sandbox, Sandbox, SandboxOptions};
pub use scenario::{Scenario, ScenarioStore};
pub use session::{Session, Variant};

#[cfg(test)]
pub(crate) mod testutil {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io;
    use std::path::Path;
    use std::rc::Rc;

    use crate::baseline::ResultSet;
    use crate::capture::CapturedRecord;
    use crate::error::{Error, Result};
    use crate::runner::{Env, InvocationRunner};

    pub fn record(command: &str, stdout: &str, stderr: &str, exit_code: i32) -> CapturedRecord {
        CapturedRecord {
            command: command.to_string(),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            exit_code,
            duration: 0.01,
        }
    }

    pub fn result_set(entries: &[(&str, CapturedRecord)]) -> ResultSet {
        entries
            .iter()
            .map(|(name, rec)| (name.to_string(), rec.clone()))
            .collect()
    }

    pub fn inherited_env() -> Env {
        std::env::vars_os().collect()
    }

    /// Replays canned records keyed by command string.
    ///
    /// Unknown commands fail like a missing executable, unless the runner
    /// echoes. Clones share the call log.
    #[derive(Clone, Default)]
    pub struct CannedRunner {
        records: HashMap<String, CapturedRecord>,
        echo: bool,
        calls: Rc<RefCell<Vec<String>>>,
    }

    impl CannedRunner {
        pub fn new(records: &[(&str, CapturedRecord)]) -> Self {
            Self {
                records: records
                    .iter()
                    .map(|(cmd, rec)| (cmd.to_string(), rec.clone()))
                    .collect(),
                ..Self::default()
            }
        }

        /// Answers every command with its own text on stdout.
        pub fn echoing() -> Self {
            Self {
                echo: true,
                ..Self::default()
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl InvocationRunner for CannedRunner {
        fn name(&self) -> &'static str {
            "canned"
        }

        fn execute(&self, executable: &Path, command: &str, _env: &Env) -> Result<CapturedRecord> {
            self.calls.borrow_mut().push(command.to_string());
            if let Some(rec) = self.records.get(command) {
                return Ok(rec.clone());
            }
            if self.echo {
                return Ok(record(command, &format!("{command}\n"), "", 0));
            }
            Err(Error::SpawnFailure {
                path: executable.to_path_buf(),
                source: io::Error::new(io::ErrorKind::NotFound, "no canned record"),
            })
        }
    }

    /// Write an executable `/bin/sh` script.
    #[cfg(unix)]
    pub fn write_script(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        fs_err::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
        fs_err::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }
}
