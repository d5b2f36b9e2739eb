//! CLI argument parsing for studymate.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "studymate", about = "Mode-gated study tutor with parent supervision")]
pub struct Cli {
    /// Data directory holding the database, settings and images
    #[arg(short, long, global = true, env = "STUDYMATE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Register a new student
    Register {
        student: String,

        /// Name shown in reports (defaults to the id)
        #[arg(short, long, default_value = "")]
        name: String,
    },

    /// List registered students
    Students,

    /// Ask the tutor a question
    Ask {
        student: String,
        question: String,

        /// Subject of the study session (defaults to the configured subject)
        #[arg(short, long, default_value = "")]
        subject: String,
    },

    /// Submit a photo of worked problems for grading
    SubmitImage {
        student: String,
        image: PathBuf,

        #[arg(short, long, default_value = "")]
        subject: String,
    },

    /// Switch between studying and break mode
    SetMode {
        student: String,

        /// studying | break
        mode: String,
    },

    /// Allow or deny detailed explanations
    SetPermission {
        student: String,

        #[arg(action = clap::ArgAction::Set)]
        allowed: bool,
    },

    /// Toggle the bookmark on a logged interaction
    Bookmark { log_id: String },

    /// Generate practice problems similar to a logged interaction
    Similar {
        log_id: String,

        /// Concept to practise (defaults to the first missed concept)
        #[arg(short, long, default_value = "")]
        concept: String,

        /// Number of problems (1 or 3)
        #[arg(short = 'n', long, default_value = "1")]
        count: u8,
    },

    /// Build a review quiz from given or recently missed concepts
    Review {
        student: String,

        #[arg(short, long, default_value = "")]
        subject: String,

        /// Concepts to cover (repeatable)
        #[arg(short, long)]
        concept: Vec<String>,
    },

    /// Show the interaction log, most recent first
    History {
        student: String,

        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Parent summary for a student
    Report { student: String },

    /// Show or change tutor settings
    Settings {
        /// score | exp
        #[arg(long)]
        policy: Option<String>,

        /// cascade | single
        #[arg(long)]
        rollover: Option<String>,

        #[arg(long)]
        log_failed_turns: Option<bool>,

        #[arg(long)]
        subject: Option<String>,

        /// Fixed Gemini model; "auto" clears it
        #[arg(long)]
        model: Option<String>,

        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

impl Command {
    /// Commands that call the generation backend.
    pub fn needs_generation(&self) -> bool {
        matches!(
            self,
            Command::Ask { .. }
                | Command::SubmitImage { .. }
                | Command::Similar { .. }
                | Command::Review { .. }
        )
    }
}
