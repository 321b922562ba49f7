pub mod context;
pub mod events;
pub mod executor;
pub mod state;

use anyhow::{Context, Result};
use colored::Colorize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::driver::http::ApiHelper;
use crate::driver::traits::HttpClient;
use crate::utils::config::Config;
use crate::zephyr::ZephyrAutomation;

pub use events::*;
pub use state::*;

/// Options of a test run, as given on the command line
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub config_path: PathBuf,
    pub output: PathBuf,
    pub tags: Option<Vec<String>>,
    pub report: bool,
    /// Overrides the configured runner default when set
    pub continue_on_failure: Option<bool>,
}

/// Run test suites from a file or directory
pub async fn run_tests(path: &Path, options: &RunOptions) -> Result<TestSummary> {
    // 1. Load config and build clients
    let config = Config::load(&options.config_path)?;
    let apis = build_api_clients(&config)?;
    let zephyr = build_zephyr(&config, |name| std::env::var(name).ok())?;

    let mut defaults = config.runner.clone();
    if let Some(flag) = options.continue_on_failure {
        defaults.continue_on_failure = flag;
    }

    // 2. Collect all suite files
    let files = collect_suite_files(path);
    if files.is_empty() {
        println!("{} No test files found.", "ℹ".blue());
    }

    // 3. Run sequentially
    let mut executor = executor::TestExecutor::new(
        apis,
        zephyr,
        &options.output,
        defaults,
        options.tags.clone(),
        options.report,
    );
    executor.start();

    for file in &files {
        if let Err(e) = executor.run_file(file).await {
            eprintln!("{} {}: {:#}", "✗".red(), file.display(), e);
            log::error!("could not run {}: {:#}", file.display(), e);
        }
    }

    executor.finish().await
}

/// One client per configured API; tokens come from the named env vars
pub fn build_api_clients(config: &Config) -> Result<HashMap<String, Arc<dyn HttpClient>>> {
    let mut apis: HashMap<String, Arc<dyn HttpClient>> = HashMap::new();
    for (name, api) in &config.api {
        let token = api.token.as_ref().and_then(|var| std::env::var(var).ok());
        let helper = ApiHelper::new(&api.base_url, token, api.timeout_ms)
            .with_context(|| format!("Invalid client settings for API '{}'", name))?;
        apis.insert(name.clone(), Arc::new(helper));
    }
    Ok(apis)
}

/// Build the Zephyr automation. Incomplete settings disable synchronisation
pub fn build_zephyr<F>(config: &Config, env: F) -> Result<Option<ZephyrAutomation>>
where
    F: Fn(&str) -> Option<String>,
{
    let resolved = match config.zephyr_options.resolve(env) {
        Ok(resolved) => resolved,
        Err(e) => {
            eprintln!(
                "{}",
                format!("Zephyr: {}, results will not be synchronised", e).red()
            );
            return Ok(None);
        }
    };

    let client = ApiHelper::new(&resolved.base_url, resolved.token, resolved.timeout_ms)
        .context("Invalid Zephyr client settings")?;
    Ok(Some(ZephyrAutomation::new(
        Arc::new(client),
        resolved.settings,
    )))
}

/// YAML files under `path`, sorted; a file path is returned as is
pub fn collect_suite_files(path: &Path) -> Vec<PathBuf> {
    if !path.is_dir() {
        return vec![path.to_path_buf()];
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_type().is_file()
                && e.path()
                    .extension()
                    .map_or(false, |ext| ext == "yaml" || ext == "yml")
        })
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}
