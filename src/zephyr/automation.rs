//! Folder / cycle / execution discovery before a suite runs, and result
//! synchronisation after it finished.

use chrono::Local;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::folders::check_folders_exist;
use super::results::{generate_execution_details, generate_step_results, StepOutcome};
use super::types::FolderType;
use super::{apis, ZephyrError};
use crate::driver::traits::HttpClient;

/// Static inputs of the synchronisation, resolved from configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZephyrSettings {
    pub environment: String,
    pub update_zephyr: bool,
    /// Display name of the project, shown in setup output
    pub project_name: String,
    /// Jira version id new cycles are linked to; ignored unless numeric
    pub cycle_version: String,
    pub cycle_folder: String,
    /// Ancestor folder names of `cycle_folder`, root first
    pub cycle_folder_hierarchy: Vec<String>,
    pub cycle_name: String,
    /// Print every Zephyr response
    pub log_responses: bool,
}

impl ZephyrSettings {
    /// `cycle_version` as a Jira version id
    pub fn version_id(&self) -> Option<u64> {
        self.cycle_version.trim().parse().ok()
    }
}

/// Every identifier resolved by a successful setup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZephyrIds {
    pub project_key: String,
    pub project_id: u64,
    pub test_case_key: String,
    pub test_case_id: u64,
    pub test_case_folder_id: Option<u64>,
    pub cycle_folder_parent_id: Option<u64>,
    pub cycle_folder_id: u64,
    pub cycle_id: u64,
    pub cycle_key: String,
    pub execution_id: u64,
    pub execution_key: String,
}

/// Outcome of `ZephyrAutomation::setup`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "sync", rename_all = "lowercase")]
pub enum SyncState {
    /// Updates are switched off; nothing was written remotely
    Disabled {
        #[serde(rename = "projectKey")]
        project_key: String,
        #[serde(rename = "projectId")]
        project_id: u64,
    },
    Enabled(ZephyrIds),
}

/// What happened when results were pushed
#[derive(Debug, Clone, PartialEq)]
pub enum SyncReport {
    Skipped,
    Updated { steps_updated: bool },
}

/// Accumulator of the ancestor-folder fold
#[derive(Debug, Clone, Default)]
struct FolderChain {
    /// Names already resolved, root first
    consumed: Vec<String>,
    /// Id of the last resolved folder
    parent_id: Option<u64>,
}

pub struct ZephyrAutomation {
    client: Arc<dyn HttpClient>,
    settings: ZephyrSettings,
}

impl ZephyrAutomation {
    pub fn new(client: Arc<dyn HttpClient>, settings: ZephyrSettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &ZephyrSettings {
        &self.settings
    }

    fn log(&self) -> bool {
        self.settings.log_responses
    }

    /// Resolve (creating where missing) everything needed to report `test_key`
    pub async fn setup(&self, test_key: &str) -> Result<SyncState, ZephyrError> {
        let project_key = project_key_of(test_key)?;
        let project = apis::get_project(self.client.as_ref(), &project_key, self.log()).await?;

        if !self.settings.update_zephyr {
            println!("{}", "\tZephyr: test execution will not be updated".bright_yellow());
            return Ok(SyncState::Disabled {
                project_key,
                project_id: project.id,
            });
        }
        println!(
            "{}",
            format!(
                "\tZephyr: test execution is to be updated in {} ({})",
                self.settings.project_name, project_key
            )
            .yellow()
        );

        let test_case = apis::get_test_case(self.client.as_ref(), test_key, self.log()).await?;

        let mut chain = FolderChain::default();
        for name in &self.settings.cycle_folder_hierarchy {
            chain = self.resolve_ancestor(&project_key, chain, name).await?;
        }

        let cycle_folder_id = self
            .resolve_folder(
                &project_key,
                &self.settings.cycle_folder,
                &self.settings.cycle_folder_hierarchy,
                chain.parent_id,
            )
            .await?;

        let (cycle_id, cycle_key) = self.resolve_cycle(&project_key, cycle_folder_id).await?;
        let (execution_id, execution_key) = self
            .resolve_execution(&project_key, test_key, &cycle_key)
            .await?;

        Ok(SyncState::Enabled(ZephyrIds {
            project_key,
            project_id: project.id,
            test_case_key: test_case.key,
            test_case_id: test_case.id,
            test_case_folder_id: test_case.folder.map(|f| f.id),
            cycle_folder_parent_id: chain.parent_id,
            cycle_folder_id,
            cycle_id,
            cycle_key,
            execution_id,
            execution_key,
        }))
    }

    /// One step of the ancestor fold: resolve `name` under the consumed prefix
    async fn resolve_ancestor(
        &self,
        project_key: &str,
        chain: FolderChain,
        name: &str,
    ) -> Result<FolderChain, ZephyrError> {
        let id = self
            .resolve_folder(project_key, name, &chain.consumed, chain.parent_id)
            .await?;

        let mut consumed = chain.consumed;
        consumed.push(name.to_string());
        Ok(FolderChain {
            consumed,
            parent_id: Some(id),
        })
    }

    /// Find `name` among cycle folders whose ancestors are in `expected`, or create it
    async fn resolve_folder(
        &self,
        project_key: &str,
        name: &str,
        expected: &[String],
        parent_id: Option<u64>,
    ) -> Result<u64, ZephyrError> {
        let check = check_folders_exist(
            self.client.as_ref(),
            FolderType::TestCycle,
            project_key,
            name,
            expected,
            self.log(),
        )
        .await?;

        if let Some(found) = check.first_match() {
            return Ok(found.id);
        }

        println!(
            "{}",
            format!(
                "\tZephyr: Folder {} does not exist in {:?}. Creating folder ...",
                name, expected
            )
            .bright_yellow()
        );
        let created = apis::create_folder(
            self.client.as_ref(),
            FolderType::TestCycle,
            project_key,
            parent_id,
            name,
            self.log(),
        )
        .await?;
        Ok(created.id)
    }

    async fn resolve_cycle(
        &self,
        project_key: &str,
        folder_id: u64,
    ) -> Result<(u64, String), ZephyrError> {
        let cycles = apis::get_test_cycles(
            self.client.as_ref(),
            Some(project_key),
            Some(folder_id),
            None,
            self.log(),
        )
        .await?;

        if let Some(cycle) = cycles
            .values
            .into_iter()
            .find(|c| c.name == self.settings.cycle_name)
        {
            return Ok((cycle.id, cycle.key));
        }

        println!(
            "{}",
            format!(
                "\tZephyr: Cycle {} does not exist in folder {}. Creating Cycle ...",
                self.settings.cycle_name, self.settings.cycle_folder
            )
            .bright_yellow()
        );
        let created = apis::create_cycle(
            self.client.as_ref(),
            project_key,
            folder_id,
            &self.settings.cycle_name,
            self.settings.version_id(),
            self.log(),
        )
        .await?;
        let key = created.key.ok_or_else(|| {
            ZephyrError::NotFound(format!(
                "created cycle {} has no key",
                self.settings.cycle_name
            ))
        })?;
        Ok((created.id, key))
    }

    async fn resolve_execution(
        &self,
        project_key: &str,
        test_key: &str,
        cycle_key: &str,
    ) -> Result<(u64, String), ZephyrError> {
        let executions = apis::get_test_executions(
            self.client.as_ref(),
            project_key,
            test_key,
            Some(cycle_key),
            self.log(),
        )
        .await?;

        if let Some(execution) = executions.values.into_iter().next() {
            return Ok((execution.id, execution.key));
        }

        println!(
            "{}",
            format!(
                "\tZephyr: Test Case {} does not exist in cycle {}. Adding Test Case ...",
                test_key, self.settings.cycle_name
            )
            .bright_yellow()
        );
        let created = apis::create_test_execution(
            self.client.as_ref(),
            project_key,
            test_key,
            cycle_key,
            &self.settings.environment,
            self.log(),
        )
        .await?;

        // the create response carries no key
        let executions = apis::get_test_executions(
            self.client.as_ref(),
            project_key,
            test_key,
            Some(cycle_key),
            self.log(),
        )
        .await?;
        let execution = executions.values.into_iter().next().ok_or_else(|| {
            ZephyrError::NotFound(format!(
                "execution {} for {} not listed in cycle {}",
                created.id, test_key, cycle_key
            ))
        })?;
        Ok((created.id, execution.key))
    }

    /// Push step results and the execution summary for a finished suite
    pub async fn update_test_execution(
        &self,
        state: &SyncState,
        outcomes: &[StepOutcome],
    ) -> Result<SyncReport, ZephyrError> {
        let ids = match state {
            SyncState::Disabled { .. } => return Ok(SyncReport::Skipped),
            SyncState::Enabled(ids) => ids,
        };

        let steps = apis::get_test_execution_steps(
            self.client.as_ref(),
            &ids.execution_key,
            self.log(),
        )
        .await?;
        let step_results = generate_step_results(outcomes);

        let mut warning = String::new();
        let steps_updated = if step_results.len() != steps.values.len() {
            warning = format!(
                "WARNING, test execution steps could not be updated because the number of automation steps ({}) do not match the number of Zephyr steps ({})",
                step_results.len(),
                steps.values.len()
            );
            eprintln!("{}", format!("\tZephyr: {}", warning).bright_yellow());
            log::warn!("{}", warning);
            false
        } else {
            println!("{}", "\tZephyr: Updating test execution steps ...".bright_yellow());
            apis::update_test_execution_steps(
                self.client.as_ref(),
                &ids.execution_key,
                &step_results,
                self.log(),
            )
            .await?;
            true
        };

        println!("{}", "\tZephyr: Updating test execution ...".bright_yellow());
        let details =
            generate_execution_details(outcomes, &self.settings.environment, &warning, Local::now());
        apis::update_test_execution(
            self.client.as_ref(),
            &ids.execution_key,
            &details,
            self.log(),
        )
        .await?;

        Ok(SyncReport::Updated { steps_updated })
    }
}

/// Project key of a Zephyr test key (`SCRUM-T1` -> `SCRUM`)
///
/// The key is the text before the first `-`; both sides must be non-empty.
pub fn project_key_of(test_key: &str) -> Result<String, ZephyrError> {
    match test_key.trim().split_once('-') {
        Some((project, rest)) if !project.trim().is_empty() && !rest.trim().is_empty() => {
            Ok(project.trim().to_string())
        }
        _ => Err(ZephyrError::InvalidTestKey(test_key.to_string())),
    }
}
