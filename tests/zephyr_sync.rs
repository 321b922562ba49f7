use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use zephyr_api_tester::driver::http::ApiHelper;
use zephyr_api_tester::driver::traits::HttpError;
use zephyr_api_tester::zephyr::{
    OutcomeState, StepOutcome, SyncReport, SyncState, ZephyrAutomation, ZephyrError, ZephyrIds,
    ZephyrSettings,
};

fn settings(update: bool) -> ZephyrSettings {
    ZephyrSettings {
        environment: "qa".to_string(),
        update_zephyr: update,
        project_name: "SCRUM".to_string(),
        cycle_version: "1.0".to_string(),
        cycle_folder: "API".to_string(),
        cycle_folder_hierarchy: vec!["Regression".to_string()],
        cycle_name: "Nightly".to_string(),
        log_responses: false,
    }
}

fn automation(server: &MockServer, update: bool) -> ZephyrAutomation {
    automation_with(server, settings(update))
}

fn automation_with(server: &MockServer, settings: ZephyrSettings) -> ZephyrAutomation {
    let client = ApiHelper::new(&server.uri(), Some("token".to_string()), 2000).unwrap();
    ZephyrAutomation::new(Arc::new(client), settings)
}

/// Regression (1) > API (2) already exist
async fn mount_existing_folders(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/folders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [
                {"id": 1, "name": "Regression", "parentId": null},
                {"id": 2, "name": "API", "parentId": 1}
            ]
        })))
        .mount(server)
        .await;
}

async fn mount_project_and_case(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/projects/SCRUM"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 10, "key": "SCRUM"})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/testcases/SCRUM-T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 100,
            "key": "SCRUM-T1",
            "folder": {"id": 5}
        })))
        .mount(server)
        .await;
}

fn enabled_ids() -> SyncState {
    SyncState::Enabled(ZephyrIds {
        project_key: "SCRUM".to_string(),
        project_id: 10,
        test_case_key: "SCRUM-T1".to_string(),
        test_case_id: 100,
        test_case_folder_id: Some(5),
        cycle_folder_parent_id: Some(1),
        cycle_folder_id: 2,
        cycle_id: 20,
        cycle_key: "SCRUM-R1".to_string(),
        execution_id: 30,
        execution_key: "SCRUM-E30".to_string(),
    })
}

fn three_passed() -> Vec<StepOutcome> {
    vec![
        StepOutcome::new("Get Lost", OutcomeState::Passed, 120),
        StepOutcome::new("Get Game of Thrones", OutcomeState::Passed, 80),
        StepOutcome::new("Get The Expanse", OutcomeState::Passed, 100),
    ]
}

#[tokio::test]
async fn setup_creates_missing_folders_cycle_and_execution() {
    let server = MockServer::start().await;
    mount_project_and_case(&server).await;

    Mock::given(method("GET"))
        .and(path("/folders"))
        .and(query_param("folderType", "TEST_CYCLE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"values": []})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/folders"))
        .and(body_partial_json(json!({"name": "Regression", "parentId": null})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/folders"))
        .and(body_partial_json(json!({"name": "API", "parentId": 1})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 2})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/testcycles"))
        .and(query_param("folderId", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"values": []})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/testcycles"))
        .and(body_partial_json(json!({"name": "Nightly", "folderId": 2, "projectKey": "SCRUM"})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"id": 20, "key": "SCRUM-R1"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    // empty before the execution is created, listed afterwards
    Mock::given(method("GET"))
        .and(path("/testexecutions"))
        .and(query_param("testCycle", "SCRUM-R1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"values": []})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/testexecutions"))
        .and(query_param("testCycle", "SCRUM-R1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [{"id": 30, "key": "SCRUM-E30"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/testexecutions"))
        .and(body_partial_json(json!({
            "testCaseKey": "SCRUM-T1",
            "testCycleKey": "SCRUM-R1",
            "environmentName": "qa",
            "statusName": "Not Executed"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 30})))
        .expect(1)
        .mount(&server)
        .await;

    let state = automation(&server, true).setup("SCRUM-T1").await.unwrap();

    assert_eq!(state, enabled_ids());
}

#[tokio::test]
async fn setup_reuses_existing_remote_state() {
    let server = MockServer::start().await;
    mount_project_and_case(&server).await;

    Mock::given(method("GET"))
        .and(path("/folders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [
                {"id": 1, "name": "Regression", "parentId": null},
                {"id": 2, "name": "API", "parentId": 1},
                {"id": 3, "name": "API", "parentId": null}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/testcycles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [
                {"id": 19, "key": "SCRUM-R0", "name": "Weekly"},
                {"id": 20, "key": "SCRUM-R1", "name": "Nightly"}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/testexecutions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [{"id": 30, "key": "SCRUM-E30"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let zephyr = automation(&server, true);
    let first = zephyr.setup("SCRUM-T1").await.unwrap();
    let second = zephyr.setup("SCRUM-T1").await.unwrap();

    assert_eq!(first, enabled_ids());
    assert_eq!(first, second);
}

#[tokio::test]
async fn setup_without_updates_only_reads_the_project() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/SCRUM"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 10, "key": "SCRUM"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/testcases/SCRUM-T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 100, "key": "SCRUM-T1"})))
        .expect(0)
        .mount(&server)
        .await;

    let state = automation(&server, false).setup("SCRUM-T1").await.unwrap();

    assert_eq!(
        state,
        SyncState::Disabled {
            project_key: "SCRUM".to_string(),
            project_id: 10
        }
    );
}

#[tokio::test]
async fn setup_fails_when_project_is_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/SCRUM"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "not found"})))
        .mount(&server)
        .await;

    let result = automation(&server, true).setup("SCRUM-T1").await;

    assert!(result.is_err());
}

#[tokio::test]
async fn update_skips_steps_when_counts_differ() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/testexecutions/SCRUM-E30/teststeps"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"values": [{}, {}]})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/testexecutions/SCRUM-E30/teststeps"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/testexecutions/SCRUM-E30"))
        .and(body_partial_json(json!({
            "statusName": "Pass",
            "environmentName": "qa",
            "executionTime": 300
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let report = automation(&server, true)
        .update_test_execution(&enabled_ids(), &three_passed())
        .await
        .unwrap();

    assert_eq!(report, SyncReport::Updated { steps_updated: false });

    let requests = server.received_requests().await.unwrap();
    let update = requests
        .iter()
        .find(|r| r.method.as_str() == "PUT" && r.url.path() == "/testexecutions/SCRUM-E30")
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&update.body).unwrap();
    let comment = body["comment"].as_str().unwrap();
    assert!(comment.starts_with("WARNING, test execution steps could not be updated"));
    assert!(comment.contains("[✔️] Get Lost <br>"));
}

#[tokio::test]
async fn update_pushes_steps_then_summary() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/testexecutions/SCRUM-E30/teststeps"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"values": [{}, {}, {}]})),
        )
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/testexecutions/SCRUM-E30/teststeps"))
        .and(body_partial_json(json!({
            "steps": [
                {"statusName": "Pass"},
                {"statusName": "Fail", "actualResult": "expected 200 but got 404"},
                {"statusName": "Not Executed"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/testexecutions/SCRUM-E30"))
        .and(body_partial_json(json!({"statusName": "Fail"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let outcomes = vec![
        StepOutcome::new("Get Lost", OutcomeState::Passed, 120),
        StepOutcome::new(
            "Get Game of Thrones",
            OutcomeState::Failed("expected 200 but got 404".to_string()),
            80,
        ),
        StepOutcome::new("Get The Expanse", OutcomeState::Pending, 0),
    ];

    let report = automation(&server, true)
        .update_test_execution(&enabled_ids(), &outcomes)
        .await
        .unwrap();

    assert_eq!(report, SyncReport::Updated { steps_updated: true });
}

#[tokio::test]
async fn update_is_a_no_op_when_disabled() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let disabled = SyncState::Disabled {
        project_key: "SCRUM".to_string(),
        project_id: 10,
    };
    let report = automation(&server, true)
        .update_test_execution(&disabled, &three_passed())
        .await
        .unwrap();

    assert_eq!(report, SyncReport::Skipped);
}

#[tokio::test]
async fn setup_threads_parent_ids_through_a_deep_hierarchy() {
    let server = MockServer::start().await;
    mount_project_and_case(&server).await;

    Mock::given(method("GET"))
        .and(path("/folders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"values": []})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/folders"))
        .and(body_partial_json(json!({"name": "A", "parentId": null})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/folders"))
        .and(body_partial_json(json!({"name": "B", "parentId": 1})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 2})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/folders"))
        .and(body_partial_json(json!({"name": "C", "parentId": 2})))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/testcycles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"values": []})))
        .expect(0)
        .mount(&server)
        .await;

    let zephyr = automation_with(
        &server,
        ZephyrSettings {
            cycle_folder: "C".to_string(),
            cycle_folder_hierarchy: vec!["A".to_string(), "B".to_string()],
            ..settings(true)
        },
    );
    let err = zephyr.setup("SCRUM-T1").await.unwrap_err();

    match err {
        ZephyrError::Http(HttpError::UnexpectedStatus { status, .. }) => assert_eq!(status, 500),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn setup_fails_when_created_cycle_has_no_key() {
    let server = MockServer::start().await;
    mount_project_and_case(&server).await;
    mount_existing_folders(&server).await;

    Mock::given(method("GET"))
        .and(path("/testcycles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"values": []})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/testcycles"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 20})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/testexecutions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"values": []})))
        .expect(0)
        .mount(&server)
        .await;

    let err = automation(&server, true).setup("SCRUM-T1").await.unwrap_err();

    assert!(matches!(err, ZephyrError::NotFound(_)), "unexpected error: {err}");
}

#[tokio::test]
async fn setup_fails_when_created_execution_is_not_listed() {
    let server = MockServer::start().await;
    mount_project_and_case(&server).await;
    mount_existing_folders(&server).await;

    Mock::given(method("GET"))
        .and(path("/testcycles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [{"id": 20, "key": "SCRUM-R1", "name": "Nightly"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/testexecutions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"values": []})))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/testexecutions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 30})))
        .expect(1)
        .mount(&server)
        .await;

    let err = automation(&server, true).setup("SCRUM-T1").await.unwrap_err();

    assert!(matches!(err, ZephyrError::NotFound(_)), "unexpected error: {err}");
}

#[tokio::test]
async fn new_cycle_is_linked_to_a_numeric_version() {
    let server = MockServer::start().await;
    mount_project_and_case(&server).await;
    mount_existing_folders(&server).await;

    Mock::given(method("GET"))
        .and(path("/testcycles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"values": []})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/testcycles"))
        .and(body_partial_json(json!({"name": "Nightly", "jiraProjectVersionId": 10042})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"id": 20, "key": "SCRUM-R1"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/testexecutions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [{"id": 30, "key": "SCRUM-E30"}]
        })))
        .mount(&server)
        .await;

    let zephyr = automation_with(
        &server,
        ZephyrSettings {
            cycle_version: "10042".to_string(),
            ..settings(true)
        },
    );
    let state = zephyr.setup("SCRUM-T1").await.unwrap();

    assert_eq!(state, enabled_ids());
}
