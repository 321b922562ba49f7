//! Configuration file (`config/default.json`)
//!
//! `zephyrOptions` values are names of environment variables, not the values
//! themselves, so secrets stay out of the file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::driver::http::DEFAULT_TIMEOUT_MS;
use crate::zephyr::{ZephyrSettings, ZEPHYR_BASE_URL};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Environment variable(s) not set: {}", .0.join(", "))]
    MissingEnv(Vec<String>),
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// APIs under test, by name
    #[serde(default)]
    pub api: BTreeMap<String, ApiConfig>,

    pub zephyr_options: ZephyrOptions,

    #[serde(default)]
    pub runner: RunnerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    pub base_url: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Environment variable holding a bearer token, if the API needs one
    #[serde(default)]
    pub token: Option<String>,
}

/// Zephyr options; string fields name environment variables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZephyrOptions {
    #[serde(default = "default_zephyr_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub log_responses: bool,

    pub token: String,
    pub environment: String,
    pub project: String,
    pub cycle_version: String,
    pub cycle_folder: String,
    #[serde(alias = "cycleFolderHieracrhy")]
    pub cycle_folder_hierarchy: String,
    pub cycle_name: String,
    pub update_zephyr: String,
}

/// Zephyr settings with the environment already looked up
#[derive(Debug, Clone)]
pub struct ResolvedZephyr {
    pub base_url: String,
    pub timeout_ms: u64,
    pub token: Option<String>,
    pub settings: ZephyrSettings,
}

/// Runner defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerConfig {
    /// Keep running steps after one failed
    #[serde(default)]
    pub continue_on_failure: bool,

    /// Print the pause after each step
    #[serde(default)]
    pub print_waits: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            continue_on_failure: false,
            print_waits: false,
        }
    }
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_zephyr_url() -> String {
    ZEPHYR_BASE_URL.to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}

impl ZephyrOptions {
    /// Look up the configured variables through `env`
    ///
    /// With updates switched off only the token is read. With updates on,
    /// every variable must be set; all missing names are reported together.
    pub fn resolve<F>(&self, env: F) -> Result<ResolvedZephyr, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let update_zephyr = env(&self.update_zephyr)
            .map(|v| v.trim().eq_ignore_ascii_case("yes"))
            .unwrap_or(false);

        let mut missing = Vec::new();
        let mut lookup = |name: &str| -> String {
            match env(name) {
                Some(value) => value,
                None => {
                    if update_zephyr {
                        missing.push(name.to_string());
                    }
                    String::new()
                }
            }
        };

        let token = lookup(&self.token);
        let settings = ZephyrSettings {
            environment: lookup(&self.environment),
            update_zephyr,
            project_name: lookup(&self.project),
            cycle_version: lookup(&self.cycle_version),
            cycle_folder: lookup(&self.cycle_folder),
            cycle_folder_hierarchy: split_hierarchy(&lookup(&self.cycle_folder_hierarchy)),
            cycle_name: lookup(&self.cycle_name),
            log_responses: self.log_responses,
        };

        if !missing.is_empty() {
            return Err(ConfigError::MissingEnv(missing));
        }

        Ok(ResolvedZephyr {
            base_url: self.base_url.clone(),
            timeout_ms: self.timeout_ms,
            token: Some(token).filter(|t| !t.is_empty()),
            settings,
        })
    }
}

/// "Regression, Sprint 1,,API" -> ["Regression", "Sprint 1", "API"]
pub fn split_hierarchy(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
