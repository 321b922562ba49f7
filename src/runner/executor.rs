use anyhow::{Context, Result};
use colored::Colorize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use super::context::TestContext;
use super::events::{EventEmitter, TestEvent};
use super::state::{ContextEntry, StepState, StepStatus, SuiteState, TestSessionState, TestSummary};
use crate::driver::traits::{HttpClient, Query};
use crate::parser::types::{HttpMethod, TestStep, TestSuite};
use crate::parser::yaml::parse_suite_file;
use crate::utils::config::RunnerConfig;
use crate::utils::date;
use crate::zephyr::{SyncReport, SyncState, ZephyrAutomation};

const SKIP_AFTER_FAILURE: &str = "previous step failed";

pub struct TestExecutor {
    /// Clients of the APIs under test, by config name
    apis: HashMap<String, Arc<dyn HttpClient>>,
    zephyr: Option<ZephyrAutomation>,
    context: TestContext,
    session: TestSessionState,
    emitter: EventEmitter,
    defaults: RunnerConfig,
    target_tags: Option<Vec<String>>,
    report_enabled: bool,
}

impl TestExecutor {
    pub fn new(
        apis: HashMap<String, Arc<dyn HttpClient>>,
        zephyr: Option<ZephyrAutomation>,
        output_dir: &Path,
        defaults: RunnerConfig,
        target_tags: Option<Vec<String>>,
        report: bool,
    ) -> Self {
        let (emitter, _) = EventEmitter::new();
        Self::with_emitter(apis, zephyr, output_dir, defaults, target_tags, report, emitter)
    }

    pub fn with_emitter(
        apis: HashMap<String, Arc<dyn HttpClient>>,
        zephyr: Option<ZephyrAutomation>,
        output_dir: &Path,
        defaults: RunnerConfig,
        target_tags: Option<Vec<String>>,
        report: bool,
        emitter: EventEmitter,
    ) -> Self {
        let context = TestContext::new(
            output_dir,
            defaults.continue_on_failure,
            defaults.print_waits,
        );
        let mut session = TestSessionState::new(&Uuid::new_v4().to_string());
        session.start();

        Self {
            apis,
            zephyr,
            context,
            session,
            emitter,
            defaults,
            target_tags,
            report_enabled: report,
        }
    }

    /// Subscribe to test execution events
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<TestEvent> {
        self.emitter.subscribe()
    }

    pub fn session(&self) -> &TestSessionState {
        &self.session
    }

    pub fn start(&mut self) {
        self.emitter.emit(TestEvent::SessionStarted {
            session_id: self.session.session_id.clone(),
        });
    }

    /// Run a single suite file
    pub async fn run_file(&mut self, path: &Path) -> Result<()> {
        let suite = parse_suite_file(path)?;

        // Filter by tags if specified
        if let Some(ref required_tags) = self.target_tags {
            let matches_all = required_tags.iter().all(|req| suite.tags.contains(req));
            if !matches_all {
                self.emitter.emit(TestEvent::Log {
                    message: format!(
                        "{} Skipping '{}' due to tag mismatch. Required: {:?}, Suite tags: {:?}",
                        "ℹ".blue(),
                        suite.name,
                        required_tags,
                        suite.tags
                    ),
                });
                return Ok(());
            }
        }

        self.run_suite(&suite, &path.display().to_string()).await;
        Ok(())
    }

    /// Run every step of `suite`, synchronising with Zephyr around it
    pub async fn run_suite(&mut self, suite: &TestSuite, suite_path: &str) {
        self.context.reset_for_suite(
            suite,
            self.defaults.continue_on_failure,
            self.defaults.print_waits,
        );

        let steps = suite
            .steps
            .iter()
            .enumerate()
            .map(|(i, s)| StepState::new(i, &s.title))
            .collect();
        let mut state = SuiteState::new(&suite.name, suite_path, suite.zephyr_test.clone(), steps);

        self.emitter.emit(TestEvent::SuiteStarted {
            suite_name: suite.name.clone(),
            suite_path: suite_path.to_string(),
            step_count: suite.steps.len(),
        });
        state.start();

        let sync = self.setup_zephyr(suite, &mut state).await;

        match self.apis.get(&suite.api).cloned() {
            Some(client) => self.run_steps(suite, &mut state, client.as_ref()).await,
            None if !state.steps.is_empty() => {
                let error = format!("no API named '{}' in config", suite.api);
                self.emitter.emit(TestEvent::StepStarted {
                    index: 0,
                    title: state.steps[0].title.clone(),
                });
                state.steps[0].start();
                state.steps[0].fail(error.clone());
                self.emitter.emit(TestEvent::StepFailed {
                    index: 0,
                    error,
                    duration_ms: 0,
                });
                state.skip_remaining(0, SKIP_AFTER_FAILURE);
                for step in state.steps.iter().skip(1) {
                    self.emitter.emit(TestEvent::StepSkipped {
                        index: step.index,
                        title: step.title.clone(),
                        reason: SKIP_AFTER_FAILURE.to_string(),
                    });
                }
            }
            None => {}
        }

        state.finish();

        if let Some(sync) = sync {
            self.report_zephyr(&sync, &state).await;
        }

        self.emitter.emit(TestEvent::SuiteFinished {
            suite_name: state.suite_name.clone(),
            status: state.status.clone(),
            duration_ms: state.total_duration_ms,
        });
        self.session.add_suite(state);
    }

    async fn setup_zephyr(&self, suite: &TestSuite, state: &mut SuiteState) -> Option<SyncState> {
        let zephyr = self.zephyr.as_ref()?;
        let test_key = suite.zephyr_test.as_deref()?;

        match zephyr.setup(test_key).await {
            Ok(sync) => {
                let value = serde_json::to_value(&sync).unwrap_or_default();
                state.context.push(ContextEntry {
                    title: "Zephyr Details".to_string(),
                    value,
                });
                Some(sync)
            }
            Err(e) => {
                eprintln!(
                    "{}",
                    format!(
                        "\tZephyr: setup failed for {}, results will not be synchronised: {}",
                        test_key, e
                    )
                    .red()
                );
                log::error!("Zephyr setup failed for {}: {}", test_key, e);
                None
            }
        }
    }

    async fn report_zephyr(&mut self, sync: &SyncState, state: &SuiteState) {
        let Some(zephyr) = self.zephyr.as_ref() else {
            return;
        };

        match zephyr.update_test_execution(sync, &state.outcomes()).await {
            Ok(SyncReport::Updated { steps_updated }) => {
                let message = if steps_updated {
                    "Zephyr execution and steps updated"
                } else {
                    "Zephyr execution updated, steps left unchanged"
                };
                self.emitter.emit(TestEvent::Log {
                    message: format!("{} {}", "ℹ".blue(), message),
                });
            }
            Ok(SyncReport::Skipped) => {}
            Err(e) => {
                eprintln!(
                    "{}",
                    format!("\tZephyr: could not update test execution: {}", e).red()
                );
                log::error!("Zephyr update failed: {}", e);
            }
        }
    }

    async fn run_steps(&mut self, suite: &TestSuite, state: &mut SuiteState, client: &dyn HttpClient) {
        for (index, step) in suite.steps.iter().enumerate() {
            if step.skip {
                state.steps[index].skip("skipped".to_string());
            }
            if let StepStatus::Skipped { reason } = &state.steps[index].status {
                self.emitter.emit(TestEvent::StepSkipped {
                    index,
                    title: step.title.clone(),
                    reason: reason.clone(),
                });
                continue;
            }

            self.emitter.emit(TestEvent::StepStarted {
                index,
                title: step.title.clone(),
            });
            state.steps[index].start();

            match self.run_step(client, step).await {
                Ok(entries) => {
                    for entry in &entries {
                        self.emitter.emit(TestEvent::Log {
                            message: format!("{}: {}", entry.title, entry.value),
                        });
                    }
                    let current = &mut state.steps[index];
                    current.context = entries;
                    current.pass();
                    self.emitter.emit(TestEvent::StepPassed {
                        index,
                        duration_ms: current.duration_ms.unwrap_or(0),
                    });
                }
                Err(e) => {
                    let error = format!("{:#}", e);
                    let current = &mut state.steps[index];
                    current.fail(error.clone());
                    self.emitter.emit(TestEvent::StepFailed {
                        index,
                        error,
                        duration_ms: current.duration_ms.unwrap_or(0),
                    });
                    if !self.context.continue_on_failure {
                        state.skip_remaining(index, SKIP_AFTER_FAILURE);
                    }
                }
            }
        }
    }

    /// Send the step's request and check, record and save what it asks for
    async fn run_step(&mut self, client: &dyn HttpClient, step: &TestStep) -> Result<Vec<ContextEntry>> {
        let path = self.context.substitute_vars(&step.request.path);
        let query: Query = step
            .request
            .query
            .iter()
            .map(|(k, v)| (k.clone(), self.context.substitute_vars(v)))
            .collect();
        let body = match &step.request.body {
            Some(body) => self.context.substitute_json(body),
            None => serde_json::Value::Null,
        };

        let response = match step.request.method {
            HttpMethod::Get => client.get_request(&path, &query).await,
            HttpMethod::Post => client.post_request(&path, &query, &body).await,
            HttpMethod::Put => client.put_request(&path, &query, &body).await,
        }
        .with_context(|| format!("{:?} {} failed", step.request.method, path))?;

        if response.status != step.expect.status {
            anyhow::bail!(
                "Response Status not as expected: expected {} but got {} {}",
                step.expect.status,
                response.status,
                response.status_text
            );
        }
        if let Some(expected) = &step.expect.status_text {
            if &response.status_text != expected {
                anyhow::bail!(
                    "Status text not as expected: expected '{}' but got '{}'",
                    expected,
                    response.status_text
                );
            }
        }

        let mut entries = Vec::new();
        for capture in &step.context {
            let value = response
                .data
                .pointer(&capture.pointer)
                .cloned()
                .ok_or_else(|| {
                    anyhow::anyhow!("No value at '{}' for '{}'", capture.pointer, capture.title)
                })?;
            entries.push(ContextEntry {
                title: capture.title.clone(),
                value,
            });
        }

        for (var_name, pointer) in &step.save {
            let value = response.data.pointer(pointer).ok_or_else(|| {
                anyhow::anyhow!("No value at '{}' to save as '{}'", pointer, var_name)
            })?;
            let text = match value.as_str() {
                Some(s) => s.to_string(),
                None => value.to_string(),
            };
            self.context.set_var(var_name, &text);
        }

        if let Some(ms) = step.wait_ms {
            date::wait(ms, self.context.print_waits).await;
        }

        Ok(entries)
    }

    /// Finish the test session and write reports
    pub async fn finish(&mut self) -> Result<TestSummary> {
        self.session.finish();
        let summary = self.session.summary();

        self.emitter.emit(TestEvent::SessionFinished {
            summary: summary.clone(),
        });

        if self.report_enabled {
            std::fs::create_dir_all(&self.context.output_dir).with_context(|| {
                format!(
                    "Failed to create output directory {}",
                    self.context.output_dir.display()
                )
            })?;

            let report_data = self.session.to_report();
            let test_results = crate::report::types::TestResults {
                session_id: report_data.session_id,
                suites: report_data.suites,
                summary: report_data.summary,
                generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            };

            let json_path = self.context.output_path("test-results.json");
            crate::report::json::generate(&test_results, Some(&json_path)).await?;
            crate::report::junit::write_report(&test_results, &self.context.output_dir)?;
        }

        Ok(summary)
    }
}
