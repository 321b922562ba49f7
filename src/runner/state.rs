use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::zephyr::{OutcomeState, StepOutcome};

/// Step execution status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Passed,
    Failed { error: String },
    Skipped { reason: String },
}

/// Report entry recorded by a step or a suite
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextEntry {
    pub title: String,
    pub value: serde_json::Value,
}

/// State for a single step execution
#[derive(Debug, Clone)]
pub struct StepState {
    pub index: usize,
    pub title: String,
    pub status: StepStatus,
    pub started_at: Option<Instant>,
    pub duration_ms: Option<u64>,
    pub context: Vec<ContextEntry>,
}

impl StepState {
    pub fn new(index: usize, title: &str) -> Self {
        Self {
            index,
            title: title.to_string(),
            status: StepStatus::Pending,
            started_at: None,
            duration_ms: None,
            context: Vec::new(),
        }
    }

    pub fn start(&mut self) {
        self.status = StepStatus::Running;
        self.started_at = Some(Instant::now());
    }

    pub fn pass(&mut self) {
        self.finish(StepStatus::Passed);
    }

    pub fn fail(&mut self, error: String) {
        self.finish(StepStatus::Failed { error });
    }

    pub fn skip(&mut self, reason: String) {
        self.status = StepStatus::Skipped { reason };
    }

    fn finish(&mut self, status: StepStatus) {
        self.status = status;
        if let Some(start) = self.started_at {
            self.duration_ms = Some(start.elapsed().as_millis() as u64);
        }
    }

    /// What Zephyr gets to see of this step; anything unfinished counts as pending
    pub fn outcome(&self) -> StepOutcome {
        let state = match &self.status {
            StepStatus::Passed => OutcomeState::Passed,
            StepStatus::Failed { error } => OutcomeState::Failed(error.clone()),
            StepStatus::Pending | StepStatus::Running | StepStatus::Skipped { .. } => {
                OutcomeState::Pending
            }
        };
        StepOutcome::new(&self.title, state, self.duration_ms.unwrap_or(0))
    }

    /// Serialize state for reporting (without Instant which isn't serializable)
    pub fn to_report(&self) -> StepStateReport {
        StepStateReport {
            index: self.index,
            title: self.title.clone(),
            status: self.status.clone(),
            duration_ms: self.duration_ms,
            context: self.context.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepStateReport {
    pub index: usize,
    pub title: String,
    pub status: StepStatus,
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub context: Vec<ContextEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SuiteStatus {
    Pending,
    Running,
    Passed,
    Failed,
    PartiallyPassed { passed: u32, failed: u32 },
    /// No step passed or failed
    Skipped,
}

/// State for one suite execution
#[derive(Debug, Clone)]
pub struct SuiteState {
    pub suite_name: String,
    pub suite_path: String,
    pub zephyr_test: Option<String>,
    pub status: SuiteStatus,
    pub steps: Vec<StepState>,
    pub started_at: Option<Instant>,
    pub total_duration_ms: Option<u64>,
    pub error: Option<String>,
    pub context: Vec<ContextEntry>,
}

impl SuiteState {
    pub fn new(name: &str, path: &str, zephyr_test: Option<String>, steps: Vec<StepState>) -> Self {
        Self {
            suite_name: name.to_string(),
            suite_path: path.to_string(),
            zephyr_test,
            status: SuiteStatus::Pending,
            steps,
            started_at: None,
            total_duration_ms: None,
            error: None,
            context: Vec::new(),
        }
    }

    pub fn start(&mut self) {
        self.status = SuiteStatus::Running;
        self.started_at = Some(Instant::now());
    }

    pub fn finish(&mut self) {
        if let Some(start) = self.started_at {
            self.total_duration_ms = Some(start.elapsed().as_millis() as u64);
        }

        let (passed, failed) = self
            .steps
            .iter()
            .fold((0, 0), |(p, f), step| match step.status {
                StepStatus::Passed => (p + 1, f),
                StepStatus::Failed { .. } => (p, f + 1),
                _ => (p, f),
            });

        if self.error.is_none() {
            self.error = self.steps.iter().find_map(|s| match &s.status {
                StepStatus::Failed { error } => Some(format!("{}: {}", s.title, error)),
                _ => None,
            });
        }

        self.status = if failed == 0 && passed == 0 {
            SuiteStatus::Skipped
        } else if failed == 0 {
            SuiteStatus::Passed
        } else if passed == 0 {
            SuiteStatus::Failed
        } else {
            SuiteStatus::PartiallyPassed { passed, failed }
        };
    }

    /// Mark every step after `index` that has not run yet as skipped
    pub fn skip_remaining(&mut self, index: usize, reason: &str) {
        for step in self.steps.iter_mut().skip(index + 1) {
            if matches!(step.status, StepStatus::Pending) {
                step.skip(reason.to_string());
            }
        }
    }

    pub fn outcomes(&self) -> Vec<StepOutcome> {
        self.steps.iter().map(StepState::outcome).collect()
    }

    /// Serialize state for reporting
    pub fn to_report(&self) -> SuiteStateReport {
        SuiteStateReport {
            suite_name: self.suite_name.clone(),
            suite_path: self.suite_path.clone(),
            zephyr_test: self.zephyr_test.clone(),
            status: self.status.clone(),
            steps: self.steps.iter().map(|s| s.to_report()).collect(),
            total_duration_ms: self.total_duration_ms,
            error: self.error.clone(),
            context: self.context.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteStateReport {
    pub suite_name: String,
    pub suite_path: String,
    #[serde(default)]
    pub zephyr_test: Option<String>,
    pub status: SuiteStatus,
    pub steps: Vec<StepStateReport>,
    pub total_duration_ms: Option<u64>,
    pub error: Option<String>,
    #[serde(default)]
    pub context: Vec<ContextEntry>,
}

/// Global test session state
#[derive(Debug, Clone)]
pub struct TestSessionState {
    pub session_id: String,
    pub suites: Vec<SuiteState>,
    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
}

impl TestSessionState {
    pub fn new(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            suites: Vec::new(),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    pub fn add_suite(&mut self, suite: SuiteState) {
        self.suites.push(suite);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Instant::now());
    }

    pub fn summary(&self) -> TestSummary {
        let mut total_steps = 0;
        let mut passed = 0;
        let mut failed = 0;
        let mut skipped = 0;

        for suite in &self.suites {
            for step in &suite.steps {
                total_steps += 1;
                match step.status {
                    StepStatus::Passed => passed += 1,
                    StepStatus::Failed { .. } => failed += 1,
                    StepStatus::Skipped { .. } => skipped += 1,
                    _ => {}
                }
            }
        }

        let total_duration_ms = self.started_at.map(|start| {
            self.finished_at
                .unwrap_or_else(Instant::now)
                .duration_since(start)
                .as_millis() as u64
        });

        TestSummary {
            session_id: self.session_id.clone(),
            total_suites: self.suites.len() as u32,
            total_steps,
            passed,
            failed,
            skipped,
            total_duration_ms,
        }
    }

    /// Serialize state for reporting
    pub fn to_report(&self) -> TestSessionReport {
        TestSessionReport {
            session_id: self.session_id.clone(),
            suites: self.suites.iter().map(|s| s.to_report()).collect(),
            summary: self.summary(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSummary {
    pub session_id: String,
    pub total_suites: u32,
    pub total_steps: u32,
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
    pub total_duration_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSessionReport {
    pub session_id: String,
    pub suites: Vec<SuiteStateReport>,
    pub summary: TestSummary,
}
