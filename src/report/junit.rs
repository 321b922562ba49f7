use super::types::TestResults;
use crate::runner::state::{StepStateReport, StepStatus, SuiteStateReport};
use anyhow::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::Path;

fn seconds(ms: Option<u64>) -> String {
    (ms.unwrap_or(0) as f64 / 1000.0).to_string()
}

fn count(steps: &[StepStateReport], pred: impl Fn(&StepStatus) -> bool) -> usize {
    steps.iter().filter(|s| pred(&s.status)).count()
}

/// Generate JUnit XML report string from TestResults
///
/// Each suite becomes a `<testsuite>` and each of its steps a `<testcase>`.
pub fn generate_junit_xml(results: &TestResults) -> Result<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let total_duration: u64 = results
        .suites
        .iter()
        .map(|s| s.total_duration_ms.unwrap_or(0))
        .sum();

    // <testsuites>
    let mut suites_start = BytesStart::new("testsuites");
    suites_start.push_attribute(("name", "zephyr-api-tester-run"));
    suites_start.push_attribute(("tests", results.summary.total_steps.to_string().as_str()));
    suites_start.push_attribute(("failures", results.summary.failed.to_string().as_str()));
    suites_start.push_attribute(("skipped", results.summary.skipped.to_string().as_str()));
    suites_start.push_attribute(("time", seconds(Some(total_duration)).as_str()));
    writer.write_event(Event::Start(suites_start))?;

    for suite in &results.suites {
        write_test_suite(&mut writer, suite, &results.generated_at)?;
    }

    writer.write_event(Event::End(BytesEnd::new("testsuites")))?;

    let result = writer.into_inner().into_inner();
    let xml = String::from_utf8(result)?;
    Ok(xml)
}

fn write_test_suite<W: std::io::Write>(
    writer: &mut Writer<W>,
    suite: &SuiteStateReport,
    timestamp: &str,
) -> Result<()> {
    let failures = count(&suite.steps, |s| matches!(s, StepStatus::Failed { .. }));
    let skipped = count(&suite.steps, |s| {
        matches!(s, StepStatus::Skipped { .. } | StepStatus::Pending)
    });

    let mut suite_start = BytesStart::new("testsuite");
    suite_start.push_attribute(("name", suite.suite_name.as_str()));
    suite_start.push_attribute(("tests", suite.steps.len().to_string().as_str()));
    suite_start.push_attribute(("failures", failures.to_string().as_str()));
    suite_start.push_attribute(("skipped", skipped.to_string().as_str()));
    suite_start.push_attribute(("time", seconds(suite.total_duration_ms).as_str()));
    suite_start.push_attribute(("timestamp", timestamp));
    if let Some(key) = &suite.zephyr_test {
        suite_start.push_attribute(("id", key.as_str()));
    }
    writer.write_event(Event::Start(suite_start))?;

    // Classname follows the suite file path
    let classname = suite
        .suite_path
        .trim_end_matches(".yaml")
        .trim_end_matches(".yml")
        .replace(['/', '\\'], ".");

    for step in &suite.steps {
        let mut case_start = BytesStart::new("testcase");
        case_start.push_attribute(("name", step.title.as_str()));
        case_start.push_attribute(("classname", classname.as_str()));
        case_start.push_attribute(("time", seconds(step.duration_ms).as_str()));
        writer.write_event(Event::Start(case_start))?;

        match &step.status {
            StepStatus::Failed { error } => {
                let mut fail_start = BytesStart::new("failure");
                fail_start.push_attribute(("message", error.as_str()));
                fail_start.push_attribute(("type", "AssertionError"));
                writer.write_event(Event::Start(fail_start))?;
                writer.write_event(Event::Text(BytesText::new(error)))?;
                writer.write_event(Event::End(BytesEnd::new("failure")))?;
            }
            StepStatus::Skipped { reason } => {
                let mut skip = BytesStart::new("skipped");
                skip.push_attribute(("message", reason.as_str()));
                writer.write_event(Event::Empty(skip))?;
            }
            StepStatus::Pending | StepStatus::Running => {
                writer.write_event(Event::Empty(BytesStart::new("skipped")))?;
            }
            StepStatus::Passed => {}
        }

        writer.write_event(Event::End(BytesEnd::new("testcase")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("testsuite")))?;
    Ok(())
}

/// Write report to file
pub fn write_report(results: &TestResults, output_dir: &Path) -> Result<()> {
    let xml = generate_junit_xml(results)?;
    let path = output_dir.join("junit.xml");
    std::fs::write(&path, xml)?;
    println!("    Generated JUnit report: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::state::{SuiteStatus, TestSummary};

    fn step(index: usize, title: &str, status: StepStatus) -> StepStateReport {
        StepStateReport {
            index,
            title: title.to_string(),
            status,
            duration_ms: Some(250),
            context: vec![],
        }
    }

    #[test]
    fn test_generate_junit_xml() {
        let results = TestResults {
            session_id: "test-session".to_string(),
            suites: vec![SuiteStateReport {
                suite_name: "TV shows @smoke".to_string(),
                suite_path: "suites/api_1.yaml".to_string(),
                zephyr_test: Some("SCRUM-T1".to_string()),
                status: SuiteStatus::PartiallyPassed {
                    passed: 1,
                    failed: 1,
                },
                steps: vec![
                    step(0, "Search lost", StepStatus::Passed),
                    step(
                        1,
                        "Search the expanse",
                        StepStatus::Failed {
                            error: "expected 200 but got 404".to_string(),
                        },
                    ),
                    step(
                        2,
                        "Show cast",
                        StepStatus::Skipped {
                            reason: "previous step failed".to_string(),
                        },
                    ),
                ],
                total_duration_ms: Some(1500),
                error: None,
                context: vec![],
            }],
            summary: TestSummary {
                session_id: "test-session".to_string(),
                total_suites: 1,
                total_steps: 3,
                passed: 1,
                failed: 1,
                skipped: 1,
                total_duration_ms: Some(1500),
            },
            generated_at: "2023-01-01 12:00:00".to_string(),
        };

        let xml = generate_junit_xml(&results).expect("Failed to generate XML");

        assert!(xml.contains(r#"<testsuites name="zephyr-api-tester-run" tests="3""#));
        assert!(xml.contains(r#"<testsuite name="TV shows @smoke""#));
        assert!(xml.contains(r#"id="SCRUM-T1""#));
        assert!(xml.contains(r#"classname="suites.api_1""#));
        assert!(xml.contains(r#"message="expected 200 but got 404""#));
        assert!(xml.contains(r#"<skipped message="previous step failed"/>"#));
    }
}
