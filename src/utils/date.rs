use chrono::{Datelike, Duration as Days, NaiveDate, ParseResult, Weekday};
use colored::Colorize;
use std::time::Duration;

/// Pause for `ms` milliseconds, optionally announcing it
pub async fn wait(ms: u64, print: bool) {
    if print {
        println!("{}", format!(" \t waiting {} milliseconds ", ms).bright_black());
    }
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// Move a weekend date to the following Monday, or back to the Friday before
pub fn get_weekday(date: NaiveDate, next_weekday: bool) -> NaiveDate {
    let offset = match (date.weekday(), next_weekday) {
        (Weekday::Sat, true) => 2,
        (Weekday::Sun, true) => 1,
        (Weekday::Sat, false) => -1,
        (Weekday::Sun, false) => -2,
        _ => 0,
    };
    date + Days::days(offset)
}

/// `get_weekday` over `YYYY-MM-DD` text, formatting the result with `format`
pub fn weekday_string(date: &str, next_weekday: bool, format: &str) -> ParseResult<String> {
    let parsed = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")?;
    Ok(get_weekday(parsed, next_weekday).format(format).to_string())
}
