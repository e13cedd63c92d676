//! Scenario definitions and the scenario store.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use fs_err as fs;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A named, fixed invocation of the tool under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Stable identifier, also used as a file name inside a session.
    pub name: String,

    /// Space-delimited argument list passed to the tool.
    pub command: String,
}

impl Scenario {
    /// Create a new scenario.
    pub fn new(name: &str, command: &str) -> Self {
        Self {
            name: name.to_string(),
            command: command.to_string(),
        }
    }

    /// Whether the name or the command contains `pattern` (case-sensitive).
    pub fn matches(&self, pattern: &str) -> bool {
        matches_filter(&self.name, &self.command, pattern)
    }
}

/// Substring filter shared by the scenario store and baseline narrowing.
pub fn matches_filter(name: &str, command: &str, pattern: &str) -> bool {
    name.contains(pattern) || command.contains(pattern)
}

/// Scenarios written when no scenario file exists yet.
///
/// The mutating commands all run with `--dry-run` so they can be executed
/// repeatedly without changing anything.
pub mod standard {
    use super::Scenario;

    /// Basic commands.
    pub fn basics() -> Vec<Scenario> {
        vec![
            Scenario::new("help", "--help"),
            Scenario::new("version", "--version"),
        ]
    }

    /// Read-only listing, status, info, manager and config commands.
    pub fn read_only() -> Vec<Scenario> {
        vec![
            Scenario::new("list-all", "list"),
            Scenario::new("list-packages", "list --packages"),
            Scenario::new("list-dotfiles", "list --dotfiles"),
            Scenario::new("status", "status"),
            Scenario::new("status-verbose", "status -v"),
            Scenario::new("info-brew", "info brew"),
            Scenario::new("info-npm", "info npm"),
            Scenario::new("managers", "managers"),
            Scenario::new("config", "config"),
        ]
    }

    /// Invocations that are expected to fail gracefully.
    pub fn error_cases() -> Vec<Scenario> {
        vec![
            Scenario::new("error-unknown-command", "nonexistent"),
            Scenario::new("error-add-no-args", "add"),
            Scenario::new("error-remove-no-args", "remove"),
        ]
    }

    /// Mutating commands in dry-run mode.
    pub fn dry_runs() -> Vec<Scenario> {
        vec![
            Scenario::new("add-dry-run", "add --dry-run vim"),
            Scenario::new("remove-dry-run", "remove --dry-run vim"),
            Scenario::new("apply-dry-run", "apply --dry-run"),
        ]
    }

    /// All default scenarios, in file order.
    pub fn all() -> Vec<Scenario> {
        let mut scenarios = basics();
        scenarios.extend(read_only());
        scenarios.extend(error_cases());
        scenarios.extend(dry_runs());
        scenarios
    }
}

/// Human-editable YAML list of scenarios.
#[derive(Debug, Clone)]
pub struct ScenarioStore {
    path: PathBuf,
}

impl ScenarioStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the scenario file has been written yet.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Write the default scenario set, creating parent directories.
    pub fn seed(&self) -> Result<()> {
        self.save(&standard::all())?;
        log::info!("Created default scenarios file {}", self.path.display());
        Ok(())
    }

    /// Replace the scenario file with `scenarios`.
    pub fn save(&self, scenarios: &[Scenario]) -> Result<()> {
        validate(&self.path, scenarios)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(scenarios).map_err(|e| Error::InvalidScenarios {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    /// Load scenarios in file order, seeding the defaults if the file is
    /// missing. With a `filter`, only scenarios whose name or command contains
    /// it are kept; an empty result is not an error.
    pub fn load(&self, filter: Option<&str>) -> Result<Vec<Scenario>> {
        if !self.exists() {
            self.seed()?;
        }

        log::debug!("Loading scenarios from {}", self.path.display());
        let content = fs::read_to_string(&self.path)?;
        let scenarios: Vec<Scenario> = if content.trim().is_empty() {
            Vec::new()
        } else {
            serde_yaml::from_str(&content).map_err(|e| Error::InvalidScenarios {
                path: self.path.clone(),
                message: e.to_string(),
            })?
        };
        validate(&self.path, &scenarios)?;

        Ok(match filter {
            Some(pattern) => scenarios.into_iter().filter(|s| s.matches(pattern)).collect(),
            None => scenarios,
        })
    }
}

/// Names must be unique and usable as a single path component.
fn validate(path: &Path, scenarios: &[Scenario]) -> Result<()> {
    let invalid = |message: String| Error::InvalidScenarios {
        path: path.to_path_buf(),
        message,
    };

    let mut seen = HashSet::new();
    for (index, scenario) in scenarios.iter().enumerate() {
        let name = scenario.name.as_str();
        if name.trim().is_empty() {
            return Err(invalid(format!("entry {index} has an empty name")));
        }
        if name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(invalid(format!(
                "entry {index}: name '{name}' cannot be used as a file name"
            )));
        }
        if !seen.insert(name) {
            return Err(invalid(format!("duplicate scenario name '{name}'")));
        }
    }
    Ok(())
}
