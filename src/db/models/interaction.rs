//! Interaction log data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum LogType {
    Text,
    OffTopic,
    Vision,
    SimilarTask,
    ReviewQuiz,
    /// Infrastructure failure, kept apart from genuine study/off-topic turns.
    Error,
}

impl LogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogType::Text => "Text",
            LogType::OffTopic => "OffTopic",
            LogType::Vision => "Vision",
            LogType::SimilarTask => "SimilarTask",
            LogType::ReviewQuiz => "ReviewQuiz",
            LogType::Error => "Error",
        }
    }
}

pub const UNSPECIFIED_CONCEPT: &str = "unspecified";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GradingEntry {
    pub question_label: String,
    pub is_correct: bool,
    pub status_text: String,
    pub detailed_explanation: String,
    pub core_concept: String,
}

impl GradingEntry {
    /// Explanations are a parent-granted privilege; without it only the
    /// status line is shown.
    pub fn visible_explanation(&self, detail_permission: bool) -> Option<&str> {
        if detail_permission && !self.detailed_explanation.is_empty() {
            Some(self.detailed_explanation.as_str())
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GradingResult {
    pub entries: Vec<GradingEntry>,
}

impl GradingResult {
    pub fn correct_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_correct).count()
    }

    pub fn missed_concepts(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|entry| !entry.is_correct)
            .map(|entry| entry.core_concept.as_str())
            .filter(|concept| *concept != UNSPECIFIED_CONCEPT)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionRecord {
    pub id: String,
    pub student_id: String,
    pub created_at: DateTime<Utc>,
    pub subject: String,
    pub question: String,
    pub reply: String,
    pub status: String,
    pub category: String,
    pub log_type: LogType,
    pub image_ref: Option<String>,
    pub grading: Option<GradingResult>,
    pub bookmarked: bool,
}

impl InteractionRecord {
    pub fn new(
        student_id: impl Into<String>,
        subject: impl Into<String>,
        question: impl Into<String>,
        reply: impl Into<String>,
        log_type: LogType,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            student_id: student_id.into(),
            created_at: Utc::now(),
            subject: subject.into(),
            question: question.into(),
            reply: reply.into(),
            status: String::new(),
            category: String::new(),
            log_type,
            image_ref: None,
            grading: None,
            bookmarked: false,
        }
    }

    pub fn with_signals(mut self, status: impl Into<String>, category: impl Into<String>) -> Self {
        self.status = status.into();
        self.category = category.into();
        self
    }
}
