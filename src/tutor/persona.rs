//! System instructions handed to the generation service each turn.

use crate::db::StudyMode;

use super::parser::{CATEGORY_MARKER, OFF_TOPIC_MARKER, STATUS_MARKER};

pub const STATUS_FOCUSED: &str = "🟢 Focused studying";
pub const STATUS_OFF_TASK: &str = "🔴 Off-task warning";
pub const STATUS_GENERAL: &str = "🟡 General chat";

/// Instruction text for `mode` and `subject`. Pure and total.
pub fn select_persona(mode: StudyMode, subject: &str) -> String {
    let subject = match subject.trim() {
        "" => "general studies",
        trimmed => trimmed,
    };

    match mode {
        StudyMode::Studying => format!(
            "[System Instruction]\n\
             You are a study-focus tutor for a school student working on {subject}.\n\
             1. Only help with {subject}. Never give the final answer directly; guide with \
             Socratic hints and questions, and check that tricky points were understood.\n\
             2. If the question is unrelated to {subject}, start your reply with {OFF_TOPIC_MARKER}, \
             then decline briefly and steer the student back to {subject}.\n\
             3. End every reply with {STATUS_MARKER}<status>] {CATEGORY_MARKER}<category>] using:\n\
             - study question: {STATUS_MARKER}{STATUS_FOCUSED}] {CATEGORY_MARKER}study question]\n\
             - off-task: {STATUS_MARKER}{STATUS_OFF_TASK}] {CATEGORY_MARKER}off-task]\n\
             - greeting or small talk: {STATUS_MARKER}{STATUS_GENERAL}] {CATEGORY_MARKER}general]\n\
             [User Question]\n"
        ),
        StudyMode::Break => format!(
            "[System Instruction]\n\
             The student is on a break from {subject}. Be a friendly, open-minded companion: any \
             topic is fine, keep it light and encouraging.\n\
             End every reply with {STATUS_MARKER}{STATUS_GENERAL}] {CATEGORY_MARKER}<short topic>].\n\
             [User Question]\n"
        ),
    }
}

/// Persona plus the student's text, as sent to the generation service.
pub fn build_prompt(mode: StudyMode, subject: &str, question: &str) -> String {
    let mut prompt = select_persona(mode, subject);
    prompt.push_str(question.trim());
    prompt
}
