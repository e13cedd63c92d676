//! `clidiff.toml` discovery and defaults.

use std::path::{Path, PathBuf};

use fs_err as fs;
use serde::{Deserialize, Serialize};

use crate::baseline::BaselineStore;
use crate::error::{Error, Result};
use crate::sandbox::SandboxOptions;
use crate::scenario::ScenarioStore;

pub const CONFIG_FILE_NAME: &str = "clidiff.toml";

/// The tool under test.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Display name, also used to name the sandbox config directory.
    pub name: String,

    /// Installed (baseline) binary: a name looked up on `PATH`, or a path.
    pub installed: String,

    /// Compiled (candidate) binary, relative to the project root.
    pub candidate: PathBuf,

    /// Environment variable pointing the tool at its configuration directory.
    pub config_env: String,

    /// Default configuration directory, `~/` expands to `$HOME`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_dir: Option<String>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            name: "plonk".to_string(),
            installed: "plonk".to_string(),
            candidate: PathBuf::from("bin/plonk"),
            config_env: "PLONK_DIR".to_string(),
            config_dir: Some("~/.config/plonk".to_string()),
        }
    }
}

/// How to build the candidate.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Program and arguments, run in the project root.
    pub command: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            command: vec!["just".to_string(), "build".to_string()],
        }
    }
}

/// Where clidiff keeps its documents, relative to the project root.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub scenarios: PathBuf,
    pub baseline: PathBuf,
    pub results: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            scenarios: PathBuf::from("scenarios.yaml"),
            baseline: PathBuf::from("baseline.json"),
            results: PathBuf::from("results"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub tool: ToolConfig,
    pub build: BuildConfig,
    pub paths: PathsConfig,
}

impl Config {
    /// Parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| Error::InvalidConfig {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Walk up from `start_dir` to the first directory holding `clidiff.toml`.
pub fn find_project_root(start_dir: impl AsRef<Path>) -> Option<PathBuf> {
    let mut dir = start_dir.as_ref();
    log::debug!("Searching for {CONFIG_FILE_NAME} starting from {}", dir.display());
    loop {
        if dir.join(CONFIG_FILE_NAME).is_file() {
            log::debug!("Found project root at {}", dir.display());
            return Some(dir.to_path_buf());
        }
        dir = dir.parent()?;
    }
}

/// A config plus the root its relative paths resolve against.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    root: PathBuf,
    config: Config,
    config_path: Option<PathBuf>,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            root: root.into(),
            config,
            config_path: None,
        }
    }

    /// Find `clidiff.toml` above `current_dir`; without one, defaults rooted
    /// at `current_dir`.
    pub fn discover(current_dir: &Path) -> Result<Self> {
        match find_project_root(current_dir) {
            Some(root) => Self::load(&root.join(CONFIG_FILE_NAME)),
            None => {
                log::debug!("No {CONFIG_FILE_NAME} found, using defaults");
                Ok(Self::new(current_dir, Config::default()))
            }
        }
    }

    /// Load an explicit config file; its directory is the project root.
    pub fn load(config_path: &Path) -> Result<Self> {
        let config = Config::load(config_path)?;
        let root = match config_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Ok(Self {
            root,
            config,
            config_path: Some(config_path.to_path_buf()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn tool_name(&self) -> &str {
        &self.config.tool.name
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn candidate_path(&self) -> PathBuf {
        self.resolve(&self.config.tool.candidate)
    }

    pub fn scenario_store(&self) -> ScenarioStore {
        ScenarioStore::new(self.resolve(&self.config.paths.scenarios))
    }

    pub fn baseline_store(&self) -> BaselineStore {
        BaselineStore::new(self.resolve(&self.config.paths.baseline))
    }

    pub fn results_dir(&self) -> PathBuf {
        self.resolve(&self.config.paths.results)
    }

    /// The default config directory with `~/` expanded against `home`.
    pub fn default_config_dir(&self, home: Option<&Path>) -> Option<PathBuf> {
        let raw = self.config.tool.config_dir.as_deref()?;
        match raw.strip_prefix("~/") {
            Some(rest) => home.map(|h| h.join(rest)),
            None if raw == "~" => home.map(Path::to_path_buf),
            None => Some(self.resolve(Path::new(raw))),
        }
    }

    /// Sandbox settings given the source configuration to copy in.
    pub fn sandbox_options(&self, source_config_dir: Option<PathBuf>) -> SandboxOptions {
        SandboxOptions {
            env_var: self.config.tool.config_env.clone(),
            source_config_dir,
            config_dir_name: format!("{}-test", self.config.tool.name),
        }
    }
}

/// `$HOME`, if set.
pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}
