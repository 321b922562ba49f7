use crate::parser::types::TestSuite;
use crate::utils::date;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Test execution context that holds runtime information
pub struct TestContext {
    /// Output directory for reports
    pub output_dir: PathBuf,

    /// Environment variables declared by the suite
    pub env: HashMap<String, String>,

    /// Variables saved from earlier responses
    pub vars: HashMap<String, String>,

    /// Keep running steps after one failed
    pub continue_on_failure: bool,

    /// Announce the pause after each step
    pub print_waits: bool,
}

impl TestContext {
    pub fn new(output_dir: &Path, continue_on_failure: bool, print_waits: bool) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            env: HashMap::new(),
            vars: HashMap::new(),
            continue_on_failure,
            print_waits,
        }
    }

    /// Start a suite: drop variables of the previous one and apply its header
    pub fn reset_for_suite(&mut self, suite: &TestSuite, continue_default: bool, print_default: bool) {
        self.vars.clear();
        self.env = suite.env.clone().unwrap_or_default();
        self.continue_on_failure = suite.continue_on_failure.unwrap_or(continue_default);
        self.print_waits = suite.print_waits.unwrap_or(print_default);
    }

    /// Get the output path for a file
    pub fn output_path(&self, filename: &str) -> PathBuf {
        self.output_dir.join(filename)
    }

    /// Get a variable from vars, suite env or the process environment
    pub fn get_var(&self, name: &str) -> Option<String> {
        self.vars
            .get(name)
            .cloned()
            .or_else(|| self.env.get(name).cloned())
            .or_else(|| std::env::var(name).ok())
    }

    pub fn set_var(&mut self, name: &str, value: &str) {
        self.vars.insert(name.to_string(), value.to_string());
    }

    /// Substitute `${name}` patterns; unknown names are left as they are
    pub fn substitute_vars(&self, text: &str) -> String {
        static VAR: OnceLock<Regex> = OnceLock::new();
        let re = VAR.get_or_init(|| Regex::new(r"\$\{([a-zA-Z0-9_.]+)\}").unwrap());

        re.replace_all(text, |caps: &regex::Captures| {
            let key = &caps[1];

            if let Some(val) = self.get_var(key) {
                return val;
            }

            match key {
                "time" => chrono::Local::now().format("%H:%M:%S").to_string(),
                "date" => chrono::Local::now().format("%Y-%m-%d").to_string(),
                "timestamp" => chrono::Utc::now().timestamp().to_string(),
                "weekday" => date::get_weekday(chrono::Local::now().date_naive(), true)
                    .format("%Y-%m-%d")
                    .to_string(),
                _ => format!("${{{}}}", key),
            }
        })
        .to_string()
    }

    /// Substitute inside every string of a JSON value, keys included
    pub fn substitute_json(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.substitute_vars(s)),
            Value::Array(items) => {
                Value::Array(items.iter().map(|v| self.substitute_json(v)).collect())
            }
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (self.substitute_vars(k), self.substitute_json(v)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_known_and_unknown() {
        let mut ctx = TestContext::new(Path::new("./output"), false, false);
        ctx.set_var("show", "lost");
        assert_eq!(
            ctx.substitute_vars("search/shows?q=${show}&x=${zz_not_set_anywhere}"),
            "search/shows?q=lost&x=${zz_not_set_anywhere}"
        );
    }

    #[test]
    fn test_vars_shadow_suite_env() {
        let mut ctx = TestContext::new(Path::new("./output"), false, false);
        ctx.env.insert("id".into(), "1".into());
        assert_eq!(ctx.substitute_vars("${id}"), "1");
        ctx.set_var("id", "2");
        assert_eq!(ctx.substitute_vars("${id}"), "2");
    }

    #[test]
    fn test_substitute_json_keeps_quotes_intact() {
        let mut ctx = TestContext::new(Path::new("./output"), false, false);
        ctx.set_var("n", r#"The "Best" \ Show"#);
        ctx.set_var("k", "title");

        let body = serde_json::json!({
            "${k}": "${n}",
            "tags": ["${n}", 3, null],
            "nested": {"count": 2, "label": "by ${n}"}
        });

        assert_eq!(
            ctx.substitute_json(&body),
            serde_json::json!({
                "title": r#"The "Best" \ Show"#,
                "tags": [r#"The "Best" \ Show"#, 3, null],
                "nested": {"count": 2, "label": r#"by The "Best" \ Show"#}
            })
        );
    }

    #[test]
    fn test_dynamic_weekday_is_never_a_weekend() {
        use chrono::{Datelike, NaiveDate, Weekday};
        let ctx = TestContext::new(Path::new("./output"), false, false);
        let day = NaiveDate::parse_from_str(&ctx.substitute_vars("${weekday}"), "%Y-%m-%d").unwrap();
        assert!(!matches!(day.weekday(), Weekday::Sat | Weekday::Sun));
    }

    #[test]
    fn test_dynamic_date() {
        let ctx = TestContext::new(Path::new("./output"), false, false);
        let date = ctx.substitute_vars("${date}");
        assert_eq!(date.len(), 10);
        assert!(!date.contains('$'));
    }
}
