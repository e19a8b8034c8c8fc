use crate::errors::Result;
use crate::rewriter::DecodePolicy;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Extensions selected when neither the config file nor the command line names any.
pub const DEFAULT_EXTENSIONS: &[&str] = &["c", "h"];

/// Name of the config file picked up from the target directory.
pub const CONFIG_FILE_NAME: &str = "decomment.yaml";

/// Settings shared by the collector and the rewriter.
///
/// Every key is optional in the YAML file; missing keys take the values from
/// [`Config::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// File extensions to process, without the leading dot.
    pub extensions: Vec<String>,
    /// Whether extensions must match exactly (`.C` is not `.c`).
    pub case_sensitive: bool,
    /// Directory names to skip anywhere in the tree.
    pub exclude: Vec<String>,
    /// How bytes that are not valid UTF-8 are handled.
    pub decode: DecodePolicy,
    /// Copy each file to `<file>.bak` before rewriting it.
    pub backup: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            case_sensitive: true,
            exclude: Vec::new(),
            decode: DecodePolicy::default(),
            backup: false,
        }
    }
}

impl Config {
    /// Normalizes extension entries (`" .c"` becomes `"c"`) and rejects an empty selection.
    pub fn validate(mut self) -> Result<Self> {
        self.extensions = normalize_extensions(&self.extensions);
        if self.extensions.is_empty() {
            return Err("At least one file extension must be selected".into());
        }
        self.exclude.retain(|dir| !dir.trim().is_empty());
        Ok(self)
    }
}

/// Strips whitespace and leading dots from extension entries, dropping blanks.
pub fn normalize_extensions(extensions: &[String]) -> Vec<String> {
    extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_string())
        .filter(|e| !e.is_empty())
        .collect()
}

/// A utility for locating and loading configuration files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Finds the configuration file by searching in a prioritized list of locations.
    ///
    /// The search order is:
    /// 1. The path as given (absolute, or relative to the current directory).
    /// 2. A path relative to the `working_dir`.
    /// 3. Inside the user's config directory, under `decomment/`.
    pub fn find_config(config_path: &Path, working_dir: &Path) -> Result<PathBuf> {
        if config_path.exists() {
            return Ok(config_path.to_path_buf());
        }

        let in_working_dir = working_dir.join(config_path);
        if in_working_dir.exists() {
            return Ok(in_working_dir);
        }

        let mut tried_locations = vec![
            config_path.display().to_string(),
            in_working_dir.display().to_string(),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("decomment").join(config_path);
            if user_config.exists() {
                return Ok(user_config);
            }
            tried_locations.push(user_config.display().to_string());
        }

        Err(format!(
            "Config file '{}' not found. Searched in:\n  - {}",
            config_path.display(),
            tried_locations.join("\n  - ")
        )
        .into())
    }

    /// Returns `<dir>/decomment.yaml` if it exists.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        let candidate = dir.join(CONFIG_FILE_NAME);
        candidate.is_file().then_some(candidate)
    }

    /// Loads a `Config` from a YAML file.
    pub fn load(path: &Path) -> Result<Config> {
        let file = File::open(path)?;
        let config: Config = serde_yaml::from_reader(file)?;
        tracing::debug!(path = %path.display(), ?config, "loaded config");
        config.validate()
    }
}
