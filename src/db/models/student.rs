//! Student data models.
//!
//! A student row carries both the focus score and the level/exp pair; the
//! configured reward policy decides which of the two a turn moves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_FOCUS_SCORE: u8 = 50;
pub const MAX_FOCUS_SCORE: u8 = 100;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum StudyMode {
    Studying,
    Break,
}

impl Default for StudyMode {
    fn default() -> Self {
        StudyMode::Studying
    }
}

impl StudyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudyMode::Studying => "studying",
            StudyMode::Break => "break",
        }
    }
}

impl std::str::FromStr for StudyMode {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "studying" | "study" => Ok(StudyMode::Studying),
            "break" => Ok(StudyMode::Break),
            other => Err(anyhow::anyhow!("unknown study mode '{other}'")),
        }
    }
}

/// Cumulative reward state, written as one unit per turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub focus_score: u8,
    pub level: u32,
    pub exp: u32,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            focus_score: DEFAULT_FOCUS_SCORE,
            level: 1,
            exp: 0,
        }
    }
}

impl Progress {
    /// Exp needed to leave `level`.
    pub fn threshold(level: u32) -> u32 {
        level.saturating_mul(100)
    }

    pub fn exp_to_next_level(&self) -> u32 {
        Self::threshold(self.level).saturating_sub(self.exp)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub display_name: String,
    pub mode: StudyMode,
    pub detail_permission: bool,
    pub progress: Progress,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Why `id` cannot name a student, if it cannot. Ids double as directory
/// names in the image store, so path syntax is refused.
pub fn student_id_problem(id: &str) -> Option<&'static str> {
    if id.is_empty() {
        Some("student id must not be empty")
    } else if id.contains(['/', '\\']) {
        Some("student id must not contain path separators")
    } else if id.contains("..") {
        Some("student id must not contain '..'")
    } else if id.chars().any(char::is_control) {
        Some("student id must not contain control characters")
    } else {
        None
    }
}

impl Student {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            display_name: display_name.into(),
            mode: StudyMode::default(),
            detail_permission: false,
            progress: Progress::default(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// The parent-controlled flags as they stood when a turn began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeSnapshot {
    pub mode: StudyMode,
    pub detail_permission: bool,
}

impl From<&Student> for ModeSnapshot {
    fn from(student: &Student) -> Self {
        Self {
            mode: student.mode,
            detail_permission: student.detail_permission,
        }
    }
}
