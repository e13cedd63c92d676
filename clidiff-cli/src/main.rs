use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;

use clidiff_core::{
    CandidateBuilder, CommandBuilder, Console, Harness, Project, Requirement, check_prerequisites,
};

mod progress;

use progress::Progress;

/// Compare the command-line behavior of an installed tool against a fresh build.
#[derive(Debug, Parser)]
#[clap(version, author, about)]
pub struct Cli {
    /// Capture output from the installed binary and replace the baseline
    #[clap(long)]
    pub update_baseline: bool,

    /// Only run scenarios whose name or command contains PATTERN
    #[clap(short, long, value_name = "PATTERN")]
    pub filter: Option<String>,

    /// Compare against the existing candidate binary without rebuilding
    #[clap(long)]
    pub skip_build: bool,

    /// Print every invocation and diff path
    #[clap(short, long)]
    pub verbose: bool,

    /// Use this config file instead of searching for clidiff.toml
    #[clap(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[clap(long)]
    pub no_color: bool,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let project = match &cli.config {
        Some(path) => Project::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Project::discover(&std::env::current_dir()?)?,
    };
    let tool = project.tool_name().to_string();
    let color = !cli.no_color && std::io::stdout().is_terminal();
    let mut console = Console::stdout(color, cli.verbose);

    console.heading(&format!("=== {tool} UI/UX Comparison Tool ==="));
    if let Some(path) = project.config_path() {
        console.detail(&format!("Using config {}", path.display()));
    }
    console.blank();

    let builder = if cli.update_baseline || cli.skip_build {
        None
    } else {
        let builder = CommandBuilder::from_argv(&project.config().build.command, project.root())
            .ok_or_else(|| anyhow!("build command is empty"))?;
        Some(builder)
    };

    let mut requirements = vec![Requirement::new(
        &project.config().tool.installed,
        &format!("{tool} (installed version)"),
    )];
    if let Some(builder) = &builder {
        requirements.push(Requirement::new(
            builder.program(),
            &format!("{} (build tool)", builder.program()),
        ));
    }
    let resolved = check_prerequisites(&requirements)?;

    let harness = Harness::new(&project);
    let filter = cli.filter.as_deref();
    let mut progress = Progress::new(&tool, std::io::stderr().is_terminal(), cli.verbose);

    if cli.update_baseline {
        let installed = resolved
            .first()
            .ok_or_else(|| anyhow!("{tool} is not installed"))?;
        harness.capture_baseline(
            installed,
            filter,
            |sandbox| sandbox.process_runner(),
            &mut progress,
            &mut console,
        )?;
        progress.finish();
        return Ok(());
    }

    let baseline = project.baseline_store().load()?;

    if let Some(builder) = &builder {
        console.heading(&format!("Building {tool}..."));
        console.detail(&format!("  {}", builder.describe()));
        builder.build()?;
        console.success("✓ Build complete");
        console.blank();
    }

    let candidate = project.candidate_path();
    if !candidate.is_file() {
        bail!("candidate binary not found at {}", candidate.display());
    }

    harness.compare(
        &baseline,
        &candidate,
        filter,
        |sandbox| sandbox.process_runner(),
        &mut progress,
        &mut console,
    )?;
    progress.finish();
    Ok(())
}

fn main() {
    if let Err(e) = try_main() {
        eprintln!("Error: {e:?}");
        ::std::process::exit(1)
    }
}
