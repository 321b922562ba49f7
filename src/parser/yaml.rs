use super::types::TestSuite;
use anyhow::{Context, Result};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Parse a YAML suite file into a TestSuite
pub fn parse_suite_file(path: &Path) -> Result<TestSuite> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    parse_yaml_content(&content, path)
}

/// Parse YAML content into a TestSuite
pub fn parse_yaml_content(content: &str, source_path: &Path) -> Result<TestSuite> {
    let mut suite: TestSuite = serde_yaml::from_str(content)
        .with_context(|| format!("Failed to parse suite: {}", source_path.display()))?;

    if suite.name.trim().is_empty() {
        anyhow::bail!("Suite {} has an empty name", source_path.display());
    }
    if suite.steps.is_empty() {
        anyhow::bail!("Suite '{}' has no steps", suite.name);
    }

    for tag in name_tags(&suite.name) {
        if !suite.tags.contains(&tag) {
            suite.tags.push(tag);
        }
    }

    Ok(suite)
}

/// `@word` tokens of a suite title ("API test 1 @api @smoke" -> api, smoke)
pub fn name_tags(name: &str) -> Vec<String> {
    static TAG: OnceLock<Regex> = OnceLock::new();
    let re = TAG.get_or_init(|| Regex::new(r"@([A-Za-z0-9_-]+)").unwrap());
    re.captures_iter(name).map(|c| c[1].to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::types::HttpMethod;

    #[test]
    fn test_parse_suite() {
        let yaml = r#"
name: "API test 1 @api @smoke $JIRA-1234"
zephyrTest: SCRUM-T1
tags: [regression, smoke]
steps:
  - title: Get Lost
    request:
      path: search/shows
      query: { q: lost }
    expect: { status: 200, statusText: OK }
    context:
      - { title: Get tv show Image, pointer: /0/show/image/medium }
    waitMs: 2000
  - title: Get Game of Thrones
    request:
      path: search/shows
      query: { q: game of thrones }
"#;

        let suite = parse_yaml_content(yaml, Path::new("api_1.yaml")).unwrap();
        assert_eq!(suite.zephyr_test.as_deref(), Some("SCRUM-T1"));
        assert_eq!(suite.api, "tv");
        assert_eq!(suite.tags, vec!["regression", "smoke", "api"]);
        assert_eq!(suite.steps.len(), 2);

        let first = &suite.steps[0];
        assert_eq!(first.request.method, HttpMethod::Get);
        assert_eq!(first.request.query["q"], "lost");
        assert_eq!(first.expect.status_text.as_deref(), Some("OK"));
        assert_eq!(first.wait_ms, Some(2000));

        assert_eq!(suite.steps[1].expect.status, 200);
        assert!(suite.steps[1].context.is_empty());
    }

    #[test]
    fn test_suite_without_steps_is_rejected() {
        let err = parse_yaml_content("name: empty\nsteps: []\n", Path::new("e.yaml")).unwrap_err();
        assert!(err.to_string().contains("no steps"));
    }

    #[test]
    fn test_name_tags() {
        assert_eq!(name_tags("API test 3 @api @smoke $JIRA-1"), vec!["api", "smoke"]);
        assert!(name_tags("no tags here").is_empty());
    }
}
