use std::convert::TryFrom;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::db::models::{GradingResult, LogType, StudyMode};

pub fn to_i64(value: u32) -> i64 {
    i64::from(value)
}

pub fn to_u32(value: i64, field: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| anyhow!("{field} out of range: {value}"))
}

/// Fixed-width timestamps so that text ordering in SQLite matches time ordering.
pub fn format_datetime(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_mode(value: &str) -> Result<StudyMode> {
    match value {
        "studying" => Ok(StudyMode::Studying),
        "break" => Ok(StudyMode::Break),
        other => Err(anyhow!("unknown study mode {other}")),
    }
}

pub fn parse_log_type(value: &str) -> Result<LogType> {
    match value {
        "Text" => Ok(LogType::Text),
        "OffTopic" => Ok(LogType::OffTopic),
        "Vision" => Ok(LogType::Vision),
        "SimilarTask" => Ok(LogType::SimilarTask),
        "ReviewQuiz" => Ok(LogType::ReviewQuiz),
        "Error" => Ok(LogType::Error),
        other => Err(anyhow!("unknown log type {other}")),
    }
}

/// Stored grading payloads are read defensively: a row whose JSON no longer
/// parses is surfaced without grading instead of failing the whole listing.
pub fn parse_grading(value: Option<String>, record_id: &str) -> Option<GradingResult> {
    let raw = value?;
    match serde_json::from_str(&raw) {
        Ok(grading) => Some(grading),
        Err(err) => {
            log::warn!("ignoring malformed grading payload on {record_id}: {err}");
            None
        }
    }
}
