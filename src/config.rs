use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::paths;

/// Optional user configuration, read from `~/.claude-helper.yaml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub project_dir: Option<PathBuf>,
    pub settings_path: Option<PathBuf>,
    pub templates_dir: Option<PathBuf>,
    pub verbose: Option<bool>,
}

impl Config {
    /// Load `explicit` if given (it must exist), else the default config file.
    /// Returns default config if the default file doesn't exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => {
                let contents = std::fs::read_to_string(path)
                    .map_err(Error::io("failed to read config file", path))?;
                Self::parse(&contents, path)
            }
            None => match paths::default_config_file() {
                Some(path) => Self::load_from(&path),
                None => Ok(Config::default()),
            },
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents, path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
            Err(e) => Err(Error::io("failed to read config file", path)(e)),
        }
    }

    fn parse(contents: &str, path: &Path) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(contents).map_err(|source| Error::Yaml {
            what: path.display().to_string(),
            source,
        })
    }
}

/// Everything an operation needs to know about where files live. Built once
/// per invocation and passed down explicitly.
#[derive(Debug, Clone)]
pub struct Env {
    pub project_dir: PathBuf,
    pub settings_path: PathBuf,
    /// User template directory, searched before the built-in templates and
    /// written by `create`.
    pub templates_dir: Option<PathBuf>,
}

/// Values given on the command line (or their environment fallbacks).
#[derive(Debug, Default)]
pub struct Overrides {
    pub project_dir: Option<PathBuf>,
    pub settings_path: Option<PathBuf>,
    pub templates_dir: Option<PathBuf>,
}

impl Env {
    /// Command line beats config file beats built-in default.
    pub fn resolve(config: &Config, overrides: Overrides, cwd: &Path) -> Result<Self> {
        let project_dir = overrides
            .project_dir
            .or_else(|| config.project_dir.clone())
            .unwrap_or_else(|| cwd.to_path_buf());
        let settings_path = match overrides
            .settings_path
            .or_else(|| config.settings_path.clone())
        {
            Some(p) => p,
            None => paths::settings_path(&project_dir)?,
        };
        let templates_dir = overrides
            .templates_dir
            .or_else(|| config.templates_dir.clone())
            .or_else(paths::default_templates_dir);
        Ok(Env {
            project_dir,
            settings_path,
            templates_dir,
        })
    }
}
