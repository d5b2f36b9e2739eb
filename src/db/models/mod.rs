pub mod interaction;
pub mod student;

pub use interaction::{GradingEntry, GradingResult, InteractionRecord, LogType, UNSPECIFIED_CONCEPT};
pub use student::{
    student_id_problem, ModeSnapshot, Progress, Student, StudyMode, DEFAULT_FOCUS_SCORE,
    MAX_FOCUS_SCORE,
};
