use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{LogType, ModeSnapshot, Progress, StudyMode};

use super::rewards::LevelUp;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TurnPhase {
    Idle,
    PersonaBuilt,
    GenerationRequested,
    ParsedSuccess,
    GenerationFailed,
    LoggedAndAggregated,
    ErrorSurfaced,
}

impl Default for TurnPhase {
    fn default() -> Self {
        TurnPhase::Idle
    }
}

impl TurnPhase {
    pub fn can_advance_to(self, next: TurnPhase) -> bool {
        use TurnPhase::*;
        matches!(
            (self, next),
            (Idle, PersonaBuilt)
                | (PersonaBuilt, GenerationRequested)
                | (GenerationRequested, ParsedSuccess)
                | (GenerationRequested, GenerationFailed)
                | (ParsedSuccess, LoggedAndAggregated)
                | (ParsedSuccess, ErrorSurfaced)
                | (GenerationFailed, ErrorSurfaced)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TurnPhase::LoggedAndAggregated | TurnPhase::ErrorSurfaced)
    }
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("turn cannot move from {from:?} to {to:?}")]
pub struct InvalidTransition {
    pub from: TurnPhase,
    pub to: TurnPhase,
}

/// One request/response cycle. The mode snapshot is taken when the turn
/// begins and never re-read.
#[derive(Debug, Clone)]
pub struct Turn {
    pub id: String,
    pub student_id: String,
    pub snapshot: ModeSnapshot,
    pub started_at: DateTime<Utc>,
    phase: TurnPhase,
}

impl Turn {
    pub fn begin(student_id: impl Into<String>, snapshot: ModeSnapshot) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            student_id: student_id.into(),
            snapshot,
            started_at: Utc::now(),
            phase: TurnPhase::Idle,
        }
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn advance(&mut self, next: TurnPhase) -> Result<(), InvalidTransition> {
        if !self.phase.can_advance_to(next) {
            return Err(InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        self.phase = next;
        Ok(())
    }
}

/// What a chat-style turn hands back to the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnReport {
    pub turn_id: String,
    pub reply: String,
    pub status: String,
    pub category: String,
    pub log_type: LogType,
    pub off_topic: bool,
    pub mode: StudyMode,
    pub progress: Progress,
    pub exp_awarded: u32,
    pub score_delta: i32,
    pub level_up: Option<LevelUp>,
    /// `None` when nothing was logged (failed turn without audit logging).
    pub record_id: Option<String>,
    pub phase: TurnPhase,
}

impl TurnReport {
    pub fn is_error(&self) -> bool {
        self.log_type == LogType::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> ModeSnapshot {
        ModeSnapshot {
            mode: StudyMode::Studying,
            detail_permission: false,
        }
    }

    #[test]
    fn success_path_reaches_logged() {
        let mut turn = Turn::begin("s1", snapshot());
        for phase in [
            TurnPhase::PersonaBuilt,
            TurnPhase::GenerationRequested,
            TurnPhase::ParsedSuccess,
            TurnPhase::LoggedAndAggregated,
        ] {
            turn.advance(phase).unwrap();
        }
        assert!(turn.phase().is_terminal());
    }

    #[test]
    fn failure_path_surfaces_error() {
        let mut turn = Turn::begin("s1", snapshot());
        turn.advance(TurnPhase::PersonaBuilt).unwrap();
        turn.advance(TurnPhase::GenerationRequested).unwrap();
        turn.advance(TurnPhase::GenerationFailed).unwrap();
        assert_eq!(
            turn.advance(TurnPhase::LoggedAndAggregated),
            Err(InvalidTransition {
                from: TurnPhase::GenerationFailed,
                to: TurnPhase::LoggedAndAggregated,
            })
        );
        turn.advance(TurnPhase::ErrorSurfaced).unwrap();
        assert!(turn.phase().is_terminal());
    }

    #[test]
    fn phases_cannot_be_skipped_or_reentered() {
        let mut turn = Turn::begin("s1", snapshot());
        assert!(turn.advance(TurnPhase::GenerationRequested).is_err());
        assert_eq!(turn.phase(), TurnPhase::Idle);

        turn.advance(TurnPhase::PersonaBuilt).unwrap();
        assert!(turn.advance(TurnPhase::PersonaBuilt).is_err());

        assert!(!TurnPhase::ErrorSurfaced.can_advance_to(TurnPhase::Idle));
        assert!(!TurnPhase::LoggedAndAggregated.can_advance_to(TurnPhase::ErrorSurfaced));
    }
}
