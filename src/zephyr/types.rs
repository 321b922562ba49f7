use serde::{Deserialize, Serialize};

/// Folder types known to Zephyr Scale
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FolderType {
    TestCase,
    TestCycle,
    TestPlan,
}

impl FolderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FolderType::TestCase => "TEST_CASE",
            FolderType::TestCycle => "TEST_CYCLE",
            FolderType::TestPlan => "TEST_PLAN",
        }
    }
}

/// Status names accepted for executions and execution steps
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExecutionStatus {
    Pass,
    Fail,
    #[serde(rename = "Not Executed")]
    NotExecuted,
    #[serde(rename = "In Progress")]
    InProgress,
    Blocked,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Pass => "Pass",
            ExecutionStatus::Fail => "Fail",
            ExecutionStatus::NotExecuted => "Not Executed",
            ExecutionStatus::InProgress => "In Progress",
            ExecutionStatus::Blocked => "Blocked",
        }
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Paged list envelope (`{"values": [...], ...}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub is_last: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<u64>,
    #[serde(default)]
    pub folder_type: Option<FolderType>,
}

/// Reference to another entity (`{"id": 1, "self": "..."}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub id: u64,
    pub key: String,
    #[serde(default)]
    pub folder: Option<EntityRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCycle {
    pub id: u64,
    pub key: String,
    pub name: String,
}

/// Response of a create call; `key` is absent for some resources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedResource {
    pub id: u64,
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestExecution {
    pub id: u64,
    pub key: String,
}

/// Body of `POST folders`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFolder {
    pub parent_id: Option<u64>,
    pub name: String,
    pub project_key: String,
    pub folder_type: FolderType,
}

/// Body of `POST testcycles`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTestCycle {
    pub project_key: String,
    pub folder_id: u64,
    pub name: String,
    pub description: String,
    pub planned_start_date: String,
    pub planned_end_date: String,
    pub status_name: ExecutionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jira_project_version_id: Option<u64>,
}

/// Body of `POST testexecutions`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTestExecution {
    pub project_key: String,
    pub test_case_key: String,
    pub test_cycle_key: String,
    pub environment_name: String,
    pub status_name: ExecutionStatus,
    pub comment: String,
}

/// One entry of `PUT testexecutions/{key}/teststeps`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    pub actual_result: String,
    pub status_name: ExecutionStatus,
}

/// Aggregated outcome of one execution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionDetails {
    pub status: ExecutionStatus,
    pub comment: String,
    pub environment: String,
    /// Milliseconds
    pub execution_time: u64,
    pub actual_end_date: String,
}

/// Body of `PUT testexecutions/{key}`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionUpdate {
    pub status_name: ExecutionStatus,
    pub environment_name: String,
    pub actual_end_date: String,
    pub execution_time: u64,
    pub comment: String,
}

impl From<&ExecutionDetails> for ExecutionUpdate {
    fn from(details: &ExecutionDetails) -> Self {
        Self {
            status_name: details.status,
            environment_name: details.environment.clone(),
            actual_end_date: details.actual_end_date.clone(),
            execution_time: details.execution_time,
            comment: details.comment.clone(),
        }
    }
}
