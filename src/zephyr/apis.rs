//! Zephyr Scale REST endpoint wrappers
//!
//! One function per endpoint. Every wrapper performs exactly one request,
//! prints a diagnostic when it fails and hands the error back to the caller.
//! With `log` set, the request and the raw response body are printed.

use chrono::{DateTime, Duration, Utc};
use colored::Colorize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::types::{
    CreatedResource, ExecutionDetails, ExecutionStatus, ExecutionUpdate, Folder, FolderType,
    NewFolder, NewTestCycle, NewTestExecution, Page, Project, StepResult, TestCase, TestCycle,
    TestExecution,
};
use super::ZephyrError;
use crate::driver::traits::{ApiResponse, HttpClient, HttpError, Query};

/// Page size used when listing folders; Zephyr caps it server side
pub const FOLDER_PAGE_SIZE: u64 = 999_999;
/// Page size used when listing cycles
pub const CYCLE_PAGE_SIZE: u64 = 1000;

const ZEPHYR_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// GET projects/{key}
pub async fn get_project(
    client: &dyn HttpClient,
    project_key: &str,
    log: bool,
) -> Result<Project, ZephyrError> {
    let path = format!("projects/{}", project_key);
    let response = client.get_request(&path, &[]).await;
    handle(response, log, &format!("getProject response for /{}", path), || {
        format!("Could not get project using projectKey = {}", project_key)
    })
}

/// GET folders?folderType&projectKey&maxResults
pub async fn get_folders(
    client: &dyn HttpClient,
    folder_type: FolderType,
    project_key: &str,
    log: bool,
) -> Result<Page<Folder>, ZephyrError> {
    let query: Query = vec![
        ("folderType".into(), folder_type.as_str().into()),
        ("projectKey".into(), project_key.into()),
        ("maxResults".into(), FOLDER_PAGE_SIZE.to_string()),
    ];
    let response = client.get_request("folders", &query).await;
    handle(response, log, &format!("getFolders response from query {:?}", query), || {
        format!(
            "Could not get a list of {} folders using projectKey = {}",
            folder_type.as_str(),
            project_key
        )
    })
}

/// POST folders
pub async fn create_folder(
    client: &dyn HttpClient,
    folder_type: FolderType,
    project_key: &str,
    parent_id: Option<u64>,
    folder_name: &str,
    log: bool,
) -> Result<CreatedResource, ZephyrError> {
    let body = NewFolder {
        parent_id,
        name: folder_name.to_string(),
        project_key: project_key.to_string(),
        folder_type,
    };
    let body = serde_json::to_value(&body)?;
    let response = client.post_request("folders", &[], &body).await;
    handle(
        response,
        log,
        &format!("created folder {} in parentId {:?} using body {}", folder_name, parent_id, body),
        || format!("Could not create folder {} in parentId {:?}", folder_name, parent_id),
    )
}

/// GET testcases/{key}
pub async fn get_test_case(
    client: &dyn HttpClient,
    test_case_key: &str,
    log: bool,
) -> Result<TestCase, ZephyrError> {
    let path = format!("testcases/{}", test_case_key);
    let response = client.get_request(&path, &[]).await;
    handle(response, log, &format!("getTestCase response for /{}", path), || {
        format!("Could not get test case {}", test_case_key)
    })
}

/// GET testcycles with optional project, folder and version filters
pub async fn get_test_cycles(
    client: &dyn HttpClient,
    project_key: Option<&str>,
    folder_id: Option<u64>,
    project_version: Option<u64>,
    log: bool,
) -> Result<Page<TestCycle>, ZephyrError> {
    let mut query: Query = vec![("maxResults".into(), CYCLE_PAGE_SIZE.to_string())];
    if let Some(key) = project_key {
        query.push(("projectKey".into(), key.into()));
    }
    if let Some(id) = folder_id {
        query.push(("folderId".into(), id.to_string()));
    }
    if let Some(version) = project_version {
        query.push(("jiraProjectVersionId".into(), version.to_string()));
    }

    let response = client.get_request("testcycles", &query).await;
    handle(response, log, &format!("getTestCycles response for {:?}", query), || {
        format!("Could not get a list of test cycles using params {:?}", query)
    })
}

/// Build the body of a new cycle planned from `now` to one hour later
pub fn new_cycle_body(
    project_key: &str,
    folder_id: u64,
    cycle_name: &str,
    project_version: Option<u64>,
    now: DateTime<Utc>,
) -> NewTestCycle {
    NewTestCycle {
        project_key: project_key.to_string(),
        folder_id,
        name: cycle_name.to_string(),
        description: format!("{} created by test automation", cycle_name),
        planned_start_date: now.format(ZEPHYR_DATE_FORMAT).to_string(),
        planned_end_date: (now + Duration::hours(1))
            .format(ZEPHYR_DATE_FORMAT)
            .to_string(),
        status_name: ExecutionStatus::InProgress,
        jira_project_version_id: project_version,
    }
}

/// POST testcycles
pub async fn create_cycle(
    client: &dyn HttpClient,
    project_key: &str,
    folder_id: u64,
    cycle_name: &str,
    project_version: Option<u64>,
    log: bool,
) -> Result<CreatedResource, ZephyrError> {
    let body = new_cycle_body(project_key, folder_id, cycle_name, project_version, Utc::now());
    let body = serde_json::to_value(&body)?;
    let response = client.post_request("testcycles", &[], &body).await;
    handle(response, log, &format!("createCycle response for {}", body), || {
        format!("Could not create cycle using body {}", body)
    })
}

/// GET testexecutions for a test case, optionally narrowed to one cycle
pub async fn get_test_executions(
    client: &dyn HttpClient,
    project_key: &str,
    test_case_key: &str,
    test_cycle_key: Option<&str>,
    log: bool,
) -> Result<Page<TestExecution>, ZephyrError> {
    let mut query: Query = vec![
        ("projectKey".into(), project_key.into()),
        ("testCase".into(), test_case_key.into()),
    ];
    if let Some(cycle) = test_cycle_key {
        query.push(("testCycle".into(), cycle.into()));
    }

    let response = client.get_request("testexecutions", &query).await;
    handle(response, log, &format!("getTestExecutions response for {:?}", query), || {
        format!("Could not get a list of test executions using params {:?}", query)
    })
}

/// POST testexecutions; the response carries the id only
pub async fn create_test_execution(
    client: &dyn HttpClient,
    project_key: &str,
    test_case_key: &str,
    test_cycle_key: &str,
    environment: &str,
    log: bool,
) -> Result<CreatedResource, ZephyrError> {
    let body = NewTestExecution {
        project_key: project_key.to_string(),
        test_case_key: test_case_key.to_string(),
        test_cycle_key: test_cycle_key.to_string(),
        environment_name: environment.to_string(),
        status_name: ExecutionStatus::NotExecuted,
        comment: String::new(),
    };
    let body = serde_json::to_value(&body)?;
    let response = client.post_request("testexecutions", &[], &body).await;
    handle(response, log, &format!("createTestExecution response for {}", body), || {
        format!("Could not create test execution using params {}", body)
    })
}

/// GET testexecutions/{key}/teststeps
pub async fn get_test_execution_steps(
    client: &dyn HttpClient,
    execution_key: &str,
    log: bool,
) -> Result<Page<Value>, ZephyrError> {
    let path = format!("testexecutions/{}/teststeps", execution_key);
    let response = client.get_request(&path, &[]).await;
    handle(response, log, &format!("getTestExecutionSteps response for /{}", path), || {
        format!("Could not get test execution steps using /{}", path)
    })
}

/// PUT testexecutions/{key}/teststeps
///
/// Zephyr answers 422 when the number of steps differs from the test case.
pub async fn update_test_execution_steps(
    client: &dyn HttpClient,
    execution_key: &str,
    step_results: &[StepResult],
    log: bool,
) -> Result<Value, ZephyrError> {
    let path = format!("testexecutions/{}/teststeps", execution_key);
    let body = serde_json::json!({ "steps": step_results });
    let response = client.put_request(&path, &[], &body).await;
    handle(response, log, &format!("updateTestExecutionSteps response for {}", body), || {
        format!("Could not update test execution steps using params {}", body)
    })
}

/// PUT testexecutions/{key}
pub async fn update_test_execution(
    client: &dyn HttpClient,
    execution_key: &str,
    details: &ExecutionDetails,
    log: bool,
) -> Result<Value, ZephyrError> {
    let path = format!("testexecutions/{}", execution_key);
    let body = serde_json::to_value(ExecutionUpdate::from(details))?;
    let response = client.put_request(&path, &[], &body).await;
    handle(response, log, &format!("updateTestExecution response for {}", body), || {
        format!("Could not update test execution {} using params {}", execution_key, body)
    })
}

/// Check status, optionally print the body, decode; print a diagnostic on failure
fn handle<T: DeserializeOwned>(
    response: Result<ApiResponse, HttpError>,
    log: bool,
    label: &str,
    failure: impl FnOnce() -> String,
) -> Result<T, ZephyrError> {
    let result = response
        .and_then(ApiResponse::error_for_status)
        .map_err(ZephyrError::from)
        .and_then(|resp| {
            if log {
                println!("{}", format!("\tZephyr: {}", label).bright_yellow());
                println!("{}", resp.data.to_string().bright_red());
            }
            serde_json::from_value::<T>(resp.data).map_err(ZephyrError::from)
        });

    if let Err(e) = &result {
        let message = format!("{}: {}", failure(), e);
        eprintln!("{}", format!("\tZephyr: {}", message).bright_red());
        log::error!("{}", message);
    }

    result
}
