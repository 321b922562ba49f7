use crate::runner::state::{SuiteStateReport, TestSummary};
use serde::{Deserialize, Serialize};

/// Test results for report generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResults {
    pub session_id: String,
    pub suites: Vec<SuiteStateReport>,
    pub summary: TestSummary,
    pub generated_at: String,
}
