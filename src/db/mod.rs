mod connection;
pub mod helpers;
mod migrations;
pub mod models;
mod repositories;

pub use connection::Database;
pub use models::{
    student_id_problem, GradingEntry, GradingResult, InteractionRecord, LogType, ModeSnapshot,
    Progress, Student, StudyMode, DEFAULT_FOCUS_SCORE, MAX_FOCUS_SCORE, UNSPECIFIED_CONCEPT,
};
