use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A parsed test suite: one YAML file, one Zephyr test case
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSuite {
    /// Suite title; `@tag` words in it are added to `tags`
    pub name: String,

    /// Zephyr test case key (e.g. "SCRUM-T1"); no sync without it
    #[serde(default)]
    pub zephyr_test: Option<String>,

    /// Name of the API under test in the config file
    #[serde(default = "default_api")]
    pub api: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub env: Option<HashMap<String, String>>,

    /// Overrides the runner's continue-on-failure default
    #[serde(default)]
    pub continue_on_failure: Option<bool>,

    /// Overrides the runner's print-waits default
    #[serde(default)]
    pub print_waits: Option<bool>,

    pub steps: Vec<TestStep>,
}

fn default_api() -> String {
    "tv".to_string()
}

/// One request plus what to check and keep from its response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestStep {
    pub title: String,

    pub request: RequestSpec,

    #[serde(default)]
    pub expect: Expectation,

    /// Variable name -> JSON pointer into the response body
    #[serde(default)]
    pub save: BTreeMap<String, String>,

    /// Values recorded in the report
    #[serde(default)]
    pub context: Vec<ContextCapture>,

    /// Pause after the step (ms)
    #[serde(default, alias = "wait")]
    pub wait_ms: Option<u64>,

    /// Mark the step pending without running it
    #[serde(default)]
    pub skip: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSpec {
    #[serde(default)]
    pub method: HttpMethod,

    /// Path relative to the API base URL; may contain `${var}`
    pub path: String,

    #[serde(default)]
    pub query: BTreeMap<String, String>,

    #[serde(default)]
    pub body: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Expectation {
    #[serde(default = "default_status")]
    pub status: u16,

    #[serde(default)]
    pub status_text: Option<String>,
}

impl Default for Expectation {
    fn default() -> Self {
        Self {
            status: default_status(),
            status_text: None,
        }
    }
}

fn default_status() -> u16 {
    200
}

/// Report entry taken from the response body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContextCapture {
    pub title: String,
    /// JSON pointer, e.g. "/0/show/image/medium"
    pub pointer: String,
}
