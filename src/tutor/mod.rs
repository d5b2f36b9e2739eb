//! The tutoring pipeline: persona selection, reply parsing, reward
//! aggregation and the controller that runs a turn end to end.

mod controller;
pub mod grading;
pub mod parser;
pub mod persona;
pub mod report;
pub mod rewards;
mod state;

pub use controller::{
    ControllerConfig, GradingReport, PracticeReport, TutorController, ERROR_CATEGORY, ERROR_STATUS,
};
pub use parser::{parse_reply, ParsedReply};
pub use persona::select_persona;
pub use report::{ParentReport, StatusTone};
pub use rewards::{LevelRollover, LevelUp, RewardPolicy, SignalAggregator, TurnAction, TurnOutcome};
pub use state::{InvalidTransition, Turn, TurnPhase, TurnReport};
