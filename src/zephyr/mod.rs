//! Zephyr Scale synchronisation
//!
//! `apis` wraps the REST endpoints, `folders` resolves the cycle folder
//! hierarchy, `automation` sequences setup and result upload and `results`
//! turns finished steps into what Zephyr expects.

pub mod apis;
pub mod automation;
pub mod folders;
pub mod results;
pub mod types;

use crate::driver::traits::HttpError;

pub use automation::{SyncReport, SyncState, ZephyrAutomation, ZephyrIds, ZephyrSettings};
pub use results::{OutcomeState, StepOutcome};

/// Default versioned base URL of the Zephyr Scale cloud API
pub const ZEPHYR_BASE_URL: &str = "https://api.zephyrscale.smartbear.com/v2";

#[derive(Debug, thiserror::Error)]
pub enum ZephyrError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid Zephyr test key `{0}` (expected e.g. PROJ-T123)")]
    InvalidTestKey(String),
    #[error("Not found: {0}")]
    NotFound(String),
}
