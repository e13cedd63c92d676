//! The two top-level runs: capturing a baseline and comparing a candidate.

use std::io::Write;
use std::path::Path;

use crate::baseline::ResultSet;
use crate::compare::{Comparison, Summary};
use crate::config::{home_dir, Project};
use crate::console::Console;
use crate::error::Result;
use crate::report::{self, ReportFiles};
use crate::runner::{capture_all, CaptureObserver, InvocationRunner};
use crate::sandbox::{resolve_source_config, with_sandbox, Sandbox, SandboxOptions};
use crate::scenario::Scenario;
use crate::session::{Session, Variant};

/// Result of a baseline capture.
#[derive(Debug)]
pub struct BaselineRun {
    pub session: Session,
    pub results: ResultSet,
}

/// Result of a comparison run.
#[derive(Debug)]
pub struct CompareRun {
    pub session: Session,
    pub candidate: ResultSet,
    pub comparison: Comparison,
    pub report: ReportFiles,
}

impl CompareRun {
    pub fn summary(&self) -> Summary {
        self.comparison.summary()
    }
}

/// Drives scenario loading, sandboxed capture, and reporting for a project.
pub struct Harness<'p> {
    project: &'p Project,
    sandbox: SandboxOptions,
}

impl<'p> Harness<'p> {
    /// The sandbox copies the configuration named by the tool's config
    /// variable, else its default location, else starts empty.
    pub fn new(project: &'p Project) -> Self {
        let tool = &project.config().tool;
        let home = home_dir();
        let default_dir = project.default_config_dir(home.as_deref());
        let source = resolve_source_config(
            std::env::var_os(&tool.config_env),
            default_dir.as_deref(),
        );
        match &source {
            Some(dir) => log::debug!("Sandbox config source: {}", dir.display()),
            None => log::debug!("No existing {} configuration found", tool.name),
        }
        Self::with_sandbox_options(project, project.sandbox_options(source))
    }

    pub fn with_sandbox_options(project: &'p Project, sandbox: SandboxOptions) -> Self {
        Self { project, sandbox }
    }

    pub fn sandbox_options(&self) -> &SandboxOptions {
        &self.sandbox
    }

    /// Load scenarios, seeding the default set on first use.
    pub fn load_scenarios<W: Write>(
        &self,
        filter: Option<&str>,
        console: &mut Console<W>,
    ) -> Result<Vec<Scenario>> {
        let store = self.project.scenario_store();
        let seeding = !store.exists();
        let scenarios = store.load(filter)?;
        if seeding {
            console.success(&format!(
                "Created default scenarios file: {}",
                store.path().display()
            ));
            console.println("You can edit this file to add more test cases");
        }
        if let Some(pattern) = filter {
            console.detail(&format!(
                "Filter '{pattern}' selected {} scenarios",
                scenarios.len()
            ));
        }
        Ok(scenarios)
    }

    /// Capture every scenario from `installed` and replace the baseline.
    pub fn capture_baseline<R, F, O, W>(
        &self,
        installed: &Path,
        filter: Option<&str>,
        make_runner: F,
        observer: &mut O,
        console: &mut Console<W>,
    ) -> Result<BaselineRun>
    where
        R: InvocationRunner,
        F: FnOnce(&Sandbox) -> R,
        O: CaptureObserver + ?Sized,
        W: Write,
    {
        let tool = self.project.tool_name();
        console.heading(&format!("Capturing baseline from installed {tool}..."));
        let scenarios = self.load_scenarios(filter, console)?;
        if filter.is_some() {
            log::warn!(
                "Baseline will only contain the {} filtered scenarios",
                scenarios.len()
            );
        }

        let session = Session::create(&self.project.results_dir())?;
        let capture_dir = session.capture_dir(Variant::Baseline);
        let results = with_sandbox(&self.sandbox, |sandbox| {
            let runner = make_runner(sandbox);
            capture_all(
                &runner,
                installed,
                &scenarios,
                sandbox.env(),
                &capture_dir,
                observer,
            )
        })?;

        let store = self.project.baseline_store();
        store.save(&results)?;
        console.success(&format!(
            "✓ Baseline saved to: {} ({} scenarios)",
            store.path().display(),
            results.len()
        ));
        Ok(BaselineRun { session, results })
    }

    /// Capture every scenario from `candidate` and compare against `baseline`.
    ///
    /// With a filter, the baseline is narrowed the same way as the scenarios.
    pub fn compare<R, F, O, W>(
        &self,
        baseline: &ResultSet,
        candidate: &Path,
        filter: Option<&str>,
        make_runner: F,
        observer: &mut O,
        console: &mut Console<W>,
    ) -> Result<CompareRun>
    where
        R: InvocationRunner,
        F: FnOnce(&Sandbox) -> R,
        O: CaptureObserver + ?Sized,
        W: Write,
    {
        let tool = self.project.tool_name();
        console.heading(&format!("Capturing candidate output from {}...", candidate.display()));
        let scenarios = self.load_scenarios(filter, console)?;

        let session = Session::create(&self.project.results_dir())?;
        let capture_dir = session.capture_dir(Variant::Candidate);
        let candidate_results = with_sandbox(&self.sandbox, |sandbox| {
            let runner = make_runner(sandbox);
            capture_all(
                &runner,
                candidate,
                &scenarios,
                sandbox.env(),
                &capture_dir,
                observer,
            )
        })?;

        let narrowed;
        let expected = match filter {
            Some(pattern) => {
                narrowed = baseline.filtered(pattern);
                &narrowed
            }
            None => baseline,
        };

        let comparison = Comparison::compare(expected, &candidate_results);
        let report = report::render(tool, expected, &comparison, &session, console)?;
        Ok(CompareRun {
            session,
            candidate: candidate_results,
            comparison,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::Outcome;
    use crate::config::Config;
    use crate::testutil::{record, CannedRunner};
    use fs_err as fs;
    use pretty_assertions::assert_eq;

    fn project(root: &Path) -> Project {
        Project::new(root, Config::default())
    }

    fn harness(project: &Project) -> Harness<'_> {
        Harness::with_sandbox_options(project, project.sandbox_options(None))
    }

    fn write_scenarios(project: &Project, scenarios: &[Scenario]) {
        project.scenario_store().save(scenarios).unwrap();
    }

    fn installed_runner() -> CannedRunner {
        CannedRunner::new(&[
            ("--version", record("--version", "v1.0\n", "", 0)),
            ("add", record("add", "", "missing argument\n", 1)),
            ("managers", record("managers", "brew\nnpm\n", "", 0)),
        ])
    }

    #[test]
    fn first_baseline_seeds_scenarios() {
        let tmp = tempfile::tempdir().unwrap();
        let project = project(tmp.path());
        let runner = CannedRunner::echoing();
        let mut console = Console::new(Vec::new(), false, false);

        let run = harness(&project)
            .capture_baseline(Path::new("plonk"), None, |_| runner.clone(), &mut (), &mut console)
            .unwrap();

        assert!(project.scenario_store().exists());
        assert_eq!(run.results.len(), 17);
        let saved = project.baseline_store().load().unwrap();
        assert_eq!(saved, run.results);
        assert!(run.session.capture_dir(Variant::Baseline).join("help").is_dir());

        let text = String::from_utf8(console.into_inner()).unwrap();
        assert!(text.contains("Created default scenarios file:"));
        assert!(text.contains("You can edit this file to add more test cases"));
    }

    #[test]
    fn runner_is_built_inside_the_sandbox() {
        let tmp = tempfile::tempdir().unwrap();
        let project = project(tmp.path());
        write_scenarios(&project, &[Scenario::new("version", "--version")]);
        let harness = harness(&project);
        let mut seen = Vec::new();
        let mut console = Console::new(Vec::new(), false, false);

        harness
            .capture_baseline(
                Path::new("plonk"),
                None,
                |sandbox| {
                    let var = &harness.sandbox_options().env_var;
                    seen.push(sandbox.env().get(std::ffi::OsStr::new(var)).cloned());
                    installed_runner()
                },
                &mut (),
                &mut console,
            )
            .unwrap();

        assert_eq!(seen.len(), 1);
        assert!(seen[0].is_some());
    }

    #[test]
    fn compare_reports_drift_and_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let project = project(tmp.path());
        let scenarios = vec![
            Scenario::new("version", "--version"),
            Scenario::new("error-add-no-args", "add"),
            Scenario::new("managers", "managers"),
        ];
        write_scenarios(&project, &scenarios);
        let harness = harness(&project);
        let mut console = Console::new(Vec::new(), false, false);

        let baseline = harness
            .capture_baseline(Path::new("plonk"), None, |_| installed_runner(), &mut (), &mut console)
            .unwrap()
            .results;

        write_scenarios(&project, &scenarios[..2]);
        let candidate = CannedRunner::new(&[
            ("--version", record("--version", "v1.1\n", "", 0)),
            ("add", record("add", "", "missing argument\n", 1)),
        ]);
        let run = harness
            .compare(
                &baseline,
                Path::new("bin/plonk"),
                None,
                |_| candidate.clone(),
                &mut (),
                &mut console,
            )
            .unwrap();

        assert!(matches!(run.comparison.get("version"), Some(Outcome::Differing(_))));
        assert_eq!(run.comparison.get("error-add-no-args"), Some(&Outcome::Identical));
        assert_eq!(run.comparison.get("managers"), Some(&Outcome::MissingInCandidate));
        assert_eq!(
            run.summary(),
            Summary {
                total: 3,
                identical: 1,
                differing: 2,
                missing: 1
            }
        );
        assert_eq!(run.report.diffs, vec![run.session.diff_path("version")]);
        assert!(run.session.summary_path().is_file());
    }

    #[test]
    fn filter_matching_nothing_is_an_empty_comparison() {
        let tmp = tempfile::tempdir().unwrap();
        let project = project(tmp.path());
        write_scenarios(&project, &[Scenario::new("version", "--version")]);
        let baseline = crate::testutil::result_set(&[(
            "version",
            record("--version", "v1.0\n", "", 0),
        )]);
        let runner = CannedRunner::new(&[]);
        let mut console = Console::new(Vec::new(), false, false);

        let run = harness(&project)
            .compare(
                &baseline,
                Path::new("bin/plonk"),
                Some("zzz-nothing"),
                |_| runner.clone(),
                &mut (),
                &mut console,
            )
            .unwrap();

        assert!(run.comparison.is_empty());
        assert!(run.candidate.is_empty());
        assert_eq!(run.summary(), Summary::default());
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn filtered_compare_narrows_the_baseline() {
        let tmp = tempfile::tempdir().unwrap();
        let project = project(tmp.path());
        write_scenarios(
            &project,
            &[
                Scenario::new("version", "--version"),
                Scenario::new("managers", "managers"),
            ],
        );
        let baseline = crate::testutil::result_set(&[
            ("version", record("--version", "v1.0\n", "", 0)),
            ("managers", record("managers", "brew\n", "", 0)),
        ]);
        let runner = installed_runner();
        let mut console = Console::new(Vec::new(), false, false);

        let run = harness(&project)
            .compare(
                &baseline,
                Path::new("bin/plonk"),
                Some("version"),
                |_| runner.clone(),
                &mut (),
                &mut console,
            )
            .unwrap();

        assert_eq!(run.comparison.len(), 1);
        assert_eq!(run.comparison.get("version"), Some(&Outcome::Identical));
        assert_eq!(runner.calls(), vec!["--version"]);
    }

    #[test]
    fn spawn_failure_aborts_without_saving() {
        let tmp = tempfile::tempdir().unwrap();
        let project = project(tmp.path());
        write_scenarios(&project, &[Scenario::new("status", "status")]);
        let mut console = Console::new(Vec::new(), false, false);

        let err = harness(&project)
            .capture_baseline(
                Path::new("plonk"),
                None,
                |_| CannedRunner::new(&[]),
                &mut (),
                &mut console,
            )
            .unwrap_err();

        assert_eq!(err.error_type(), "spawn_failure");
        assert!(!project.baseline_store().exists());
    }

    #[test]
    fn new_falls_back_to_default_config_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.tool.config_env = "CLIDIFF_HARNESS_TEST_DIR".to_string();
        config.tool.config_dir = Some(tmp.path().join("default").display().to_string());
        fs::create_dir_all(tmp.path().join("default")).unwrap();
        let project = Project::new(tmp.path(), config);

        let harness = Harness::new(&project);

        assert_eq!(
            harness.sandbox_options().source_config_dir,
            Some(tmp.path().join("default"))
        );
        assert_eq!(harness.sandbox_options().config_dir_name, "plonk-test");
    }
}
