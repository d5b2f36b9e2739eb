//! Read-only summary of a student's session for the parent view.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::{InteractionRecord, LogType, Progress, Student, StudyMode};

use super::rewards::{is_disengaged_status, is_focused_status};

pub const DEFAULT_HISTORY_ROWS: usize = 20;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum StatusTone {
    Alert,
    Engaged,
    Neutral,
}

pub fn status_tone(status: &str) -> StatusTone {
    if is_disengaged_status(status) {
        StatusTone::Alert
    } else if is_focused_status(status) {
        StatusTone::Engaged
    } else {
        StatusTone::Neutral
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRow {
    pub log_id: String,
    pub at: DateTime<Utc>,
    pub log_type: LogType,
    pub category: String,
    pub status: String,
    pub question: String,
    pub bookmarked: bool,
}

impl From<&InteractionRecord> for HistoryRow {
    fn from(record: &InteractionRecord) -> Self {
        Self {
            log_id: record.id.clone(),
            at: record.created_at,
            log_type: record.log_type,
            category: record.category.clone(),
            status: record.status.clone(),
            question: record.question.clone(),
            bookmarked: record.bookmarked,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentReport {
    pub student_id: String,
    pub display_name: String,
    pub mode: StudyMode,
    pub detail_permission: bool,
    pub progress: Progress,
    pub latest_status: Option<String>,
    pub latest_tone: StatusTone,
    pub latest_question: Option<String>,
    pub category_counts: BTreeMap<String, usize>,
    pub off_topic_count: usize,
    pub total_turns: usize,
    pub history: Vec<HistoryRow>,
}

/// `records` must be newest first, as returned by the store.
pub fn build_report(
    student: &Student,
    records: &[InteractionRecord],
    history_rows: usize,
) -> ParentReport {
    let turns: Vec<&InteractionRecord> = records
        .iter()
        .filter(|record| record.log_type != LogType::Error)
        .collect();

    let latest = turns.first();
    let latest_status = latest.map(|record| record.status.clone());

    let mut category_counts = BTreeMap::new();
    for record in &turns {
        *category_counts.entry(record.category.clone()).or_insert(0) += 1;
    }

    ParentReport {
        student_id: student.id.clone(),
        display_name: student.display_name.clone(),
        mode: student.mode,
        detail_permission: student.detail_permission,
        progress: student.progress,
        latest_tone: latest_status
            .as_deref()
            .map(status_tone)
            .unwrap_or(StatusTone::Neutral),
        latest_status,
        latest_question: latest.map(|record| record.question.clone()),
        category_counts,
        off_topic_count: turns
            .iter()
            .filter(|record| record.log_type == LogType::OffTopic)
            .count(),
        total_turns: turns.len(),
        history: records.iter().take(history_rows).map(HistoryRow::from).collect(),
    }
}
