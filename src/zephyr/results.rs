//! Conversion of finished steps into Zephyr step results and execution details

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::types::{ExecutionDetails, ExecutionStatus, StepResult};

/// Final state of one step, as seen by the reporter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum OutcomeState {
    Passed,
    Pending,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    pub title: String,
    pub state: OutcomeState,
    pub duration_ms: u64,
}

impl StepOutcome {
    pub fn new(title: &str, state: OutcomeState, duration_ms: u64) -> Self {
        Self {
            title: title.to_string(),
            state,
            duration_ms,
        }
    }
}

/// One step result per outcome, in order
pub fn generate_step_results(outcomes: &[StepOutcome]) -> Vec<StepResult> {
    outcomes
        .iter()
        .map(|outcome| match &outcome.state {
            OutcomeState::Passed => StepResult {
                actual_result: String::new(),
                status_name: ExecutionStatus::Pass,
            },
            OutcomeState::Pending => StepResult {
                actual_result: String::new(),
                status_name: ExecutionStatus::NotExecuted,
            },
            OutcomeState::Failed(message) => StepResult {
                actual_result: message.clone(),
                status_name: ExecutionStatus::Fail,
            },
        })
        .collect()
}

/// Overall status: any failure fails, otherwise any pass passes
pub fn aggregate_status(outcomes: &[StepOutcome]) -> ExecutionStatus {
    let mut status = ExecutionStatus::NotExecuted;
    for outcome in outcomes {
        match outcome.state {
            OutcomeState::Failed(_) => return ExecutionStatus::Fail,
            OutcomeState::Passed => status = ExecutionStatus::Pass,
            OutcomeState::Pending => {}
        }
    }
    status
}

/// Summarise a finished suite
///
/// `error` is prepended to the comment when non-empty. Pending steps add no
/// execution time.
pub fn generate_execution_details<Tz>(
    outcomes: &[StepOutcome],
    environment: &str,
    error: &str,
    ended_at: DateTime<Tz>,
) -> ExecutionDetails
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut comment = String::new();
    if !error.is_empty() {
        comment.push_str(&format!("{}<br>", error));
    }

    let mut execution_time = 0;
    for outcome in outcomes {
        match outcome.state {
            OutcomeState::Passed => {
                comment.push_str(&format!("[✔️] {} <br>", outcome.title));
                execution_time += outcome.duration_ms;
            }
            OutcomeState::Pending => {
                comment.push_str(&format!("[⏳]  {} <br>", outcome.title));
            }
            OutcomeState::Failed(_) => {
                comment.push_str(&format!("[❌] {} <br>", outcome.title));
                execution_time += outcome.duration_ms;
            }
        }
    }

    ExecutionDetails {
        status: aggregate_status(outcomes),
        comment,
        environment: environment.to_string(),
        execution_time,
        actual_end_date: ended_at.format("%Y-%m-%dT%H:%M:%S%:z").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn passed(title: &str, ms: u64) -> StepOutcome {
        StepOutcome::new(title, OutcomeState::Passed, ms)
    }

    fn pending(title: &str) -> StepOutcome {
        StepOutcome::new(title, OutcomeState::Pending, 0)
    }

    fn failed(title: &str, msg: &str, ms: u64) -> StepOutcome {
        StepOutcome::new(title, OutcomeState::Failed(msg.to_string()), ms)
    }

    #[test]
    fn test_step_results_keep_order() {
        let results = generate_step_results(&[passed("a", 1), pending("b"), failed("c", "X", 1)]);
        assert_eq!(
            results,
            vec![
                StepResult { actual_result: String::new(), status_name: ExecutionStatus::Pass },
                StepResult { actual_result: String::new(), status_name: ExecutionStatus::NotExecuted },
                StepResult { actual_result: "X".into(), status_name: ExecutionStatus::Fail },
            ]
        );
    }

    #[test]
    fn test_failure_wins() {
        assert_eq!(
            aggregate_status(&[failed("a", "boom", 1), passed("b", 1), pending("c")]),
            ExecutionStatus::Fail
        );
        assert_eq!(
            aggregate_status(&[passed("a", 1), pending("b"), failed("c", "boom", 1)]),
            ExecutionStatus::Fail
        );
    }

    #[test]
    fn test_all_pending_is_not_executed() {
        assert_eq!(aggregate_status(&[pending("a"), pending("b")]), ExecutionStatus::NotExecuted);
        assert_eq!(aggregate_status(&[]), ExecutionStatus::NotExecuted);
    }

    #[test]
    fn test_pass_with_pending_is_pass() {
        assert_eq!(aggregate_status(&[passed("a", 1), pending("b")]), ExecutionStatus::Pass);
        assert_eq!(aggregate_status(&[pending("a"), passed("b", 1)]), ExecutionStatus::Pass);
    }

    #[test]
    fn test_execution_details_comment_and_time() {
        let ended = FixedOffset::east_opt(10 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 5, 1, 9, 15, 0)
            .unwrap();
        let details = generate_execution_details(
            &[passed("Get Lost", 120), failed("Get Expanse", "expected 200", 80), pending("Get Dune")],
            "staging",
            "",
            ended,
        );

        assert_eq!(details.status, ExecutionStatus::Fail);
        assert_eq!(details.execution_time, 200);
        assert_eq!(details.environment, "staging");
        assert_eq!(details.actual_end_date, "2024-05-01T09:15:00+10:00");
        assert_eq!(
            details.comment,
            "[✔️] Get Lost <br>[❌] Get Expanse <br>[⏳]  Get Dune <br>"
        );
    }

    #[test]
    fn test_error_prefixes_comment() {
        let details = generate_execution_details(&[passed("a", 5)], "qa", "steps differ", Utc::now());
        assert!(details.comment.starts_with("steps differ<br>[✔️] a <br>"));
    }
}
