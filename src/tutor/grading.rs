//! Vision grading prompts, grading payload parsing and the follow-up
//! practice prompts (similar problems, review quiz).

use serde_json::{Map, Value};

use crate::db::{GradingEntry, GradingResult, InteractionRecord, LogType, UNSPECIFIED_CONCEPT};

pub const SIMILAR_PROBLEM_COUNTS: [u8; 2] = [1, 3];
pub const REVIEW_QUIZ_MAX_CONCEPTS: usize = 5;

const LABEL_KEYS: [&str; 5] = ["questionLabel", "question_label", "label", "question", "number"];
const CORRECT_KEYS: [&str; 3] = ["isCorrect", "is_correct", "correct"];
const STATUS_KEYS: [&str; 3] = ["statusText", "status_text", "status"];
const EXPLANATION_KEYS: [&str; 3] = ["detailedExplanation", "detailed_explanation", "explanation"];
const CONCEPT_KEYS: [&str; 3] = ["coreConcept", "core_concept", "concept"];
const LIST_KEYS: [&str; 4] = ["questions", "results", "entries", "items"];

pub fn grading_prompt(subject: &str, detail_permission: bool) -> String {
    let explanation_rule = if detail_permission {
        "a step-by-step explanation of the correct solution"
    } else {
        "a short hint only, never the full solution"
    };

    format!(
        "[System Instruction]\n\
         You are grading a student's handwritten {subject} work shown in the attached image.\n\
         For every question in the image, decide whether the student's answer is correct.\n\
         Respond with JSON only: an array where each element has\n\
         \"questionLabel\" (the question number as written), \"isCorrect\" (true/false), \
         \"statusText\" (one short line for the student), \"detailedExplanation\" ({explanation_rule}) \
         and \"coreConcept\" (the key concept the question tests, a few words).\n"
    )
}

pub fn similar_problems_prompt(
    subject: &str,
    concept: &str,
    count: u8,
    detail_permission: bool,
) -> String {
    let plural = if count == 1 { "problem" } else { "problems" };
    let answers = if detail_permission {
        "After the problems, give the answers with brief worked solutions."
    } else {
        "Do not include answers; add one hint per problem instead."
    };

    format!(
        "[System Instruction]\n\
         Write {count} new practice {plural} for a school student studying {subject}, \
         each testing the concept \"{concept}\" at a similar difficulty to the original question.\n\
         {answers}\n"
    )
}

pub fn review_quiz_prompt(subject: &str, concepts: &[String]) -> String {
    let list = concepts
        .iter()
        .map(|concept| format!("- {concept}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "[System Instruction]\n\
         Build a short {subject} review quiz for a school student. Ask one question per concept \
         below, mixing recall and application. Put the answers at the end under \"Answers\".\n\
         Concepts:\n{list}\n"
    )
}

/// Concepts the student missed in recent vision submissions, most recent
/// first, without duplicates.
pub fn collect_review_concepts(records: &[InteractionRecord], max: usize) -> Vec<String> {
    let mut concepts: Vec<String> = Vec::new();
    let missed = records
        .iter()
        .filter(|record| record.log_type == LogType::Vision)
        .filter_map(|record| record.grading.as_ref())
        .flat_map(|grading| grading.missed_concepts());

    for concept in missed {
        if concepts.len() >= max {
            break;
        }
        if !concepts.iter().any(|known| known.eq_ignore_ascii_case(concept)) {
            concepts.push(concept.to_string());
        }
    }
    concepts
}

/// Reads a grading response. Individual fields fall back to safe defaults,
/// but the payload as a whole must hold at least one graded item: an empty
/// list, or objects without any grading field (`{"error": ...}`), are
/// rejected.
pub fn parse_grading_payload(raw: &str) -> Result<GradingResult, String> {
    let value = extract_json(raw).ok_or_else(|| {
        let preview: String = raw.chars().take(80).collect();
        format!("no JSON payload found in grading response: {preview:?}")
    })?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut object) => {
            let listed = LIST_KEYS.iter().find_map(|key| match object.get_mut(*key) {
                Some(Value::Array(items)) => Some(std::mem::take(items)),
                _ => None,
            });
            listed.unwrap_or_else(|| vec![Value::Object(object)])
        }
        other => return Err(format!("grading payload is not a list: {other}")),
    };

    if items.is_empty() {
        return Err("grading payload lists no questions".into());
    }
    if !items.iter().any(is_graded_item) {
        let preview: String = raw.trim().chars().take(80).collect();
        return Err(format!("grading payload has no graded questions: {preview:?}"));
    }

    let entries = items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(fields) => entry_from_fields(index, fields),
            _ => entry_from_fields(index, &Map::new()),
        })
        .collect();

    Ok(GradingResult { entries })
}

fn is_graded_item(item: &Value) -> bool {
    let Value::Object(fields) = item else {
        return false;
    };
    let known: [&[&str]; 5] = [
        &LABEL_KEYS,
        &CORRECT_KEYS,
        &STATUS_KEYS,
        &EXPLANATION_KEYS,
        &CONCEPT_KEYS,
    ];
    known
        .iter()
        .flat_map(|keys| keys.iter())
        .any(|key| fields.contains_key(*key))
}

fn extract_json(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    let unfenced = strip_code_fence(trimmed);
    if let Ok(value) = serde_json::from_str(unfenced) {
        return Some(value);
    }

    let start = unfenced.find(|c: char| c == '[' || c == '{')?;
    let close = if unfenced[start..].starts_with('[') { ']' } else { '}' };
    let end = unfenced.rfind(close)?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&unfenced[start..=end]).ok()
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // drop the info string ("json") on the opening fence line
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn field<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| fields.get(*key)).filter(|value| !value.is_null())
}

fn text_field(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    let text = match field(fields, keys)? {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn correctness(fields: &Map<String, Value>) -> bool {
    match field(fields, &CORRECT_KEYS) {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().map(|n| n > 0.0).unwrap_or(false),
        Some(Value::String(text)) => matches!(
            text.trim().to_lowercase().as_str(),
            "true" | "yes" | "correct" | "o" | "정답"
        ),
        _ => false,
    }
}

fn entry_from_fields(index: usize, fields: &Map<String, Value>) -> GradingEntry {
    GradingEntry {
        question_label: text_field(fields, &LABEL_KEYS).unwrap_or_else(|| (index + 1).to_string()),
        is_correct: correctness(fields),
        status_text: text_field(fields, &STATUS_KEYS).unwrap_or_default(),
        detailed_explanation: text_field(fields, &EXPLANATION_KEYS).unwrap_or_default(),
        core_concept: text_field(fields, &CONCEPT_KEYS)
            .unwrap_or_else(|| UNSPECIFIED_CONCEPT.to_string()),
    }
}

/// Student-facing summary of a graded submission.
pub fn grading_summary(grading: &GradingResult, detail_permission: bool) -> String {
    let mut lines = vec![format!(
        "{}/{} correct",
        grading.correct_count(),
        grading.entries.len()
    )];
    for entry in &grading.entries {
        let mark = if entry.is_correct { "O" } else { "X" };
        let mut line = format!("{}. [{mark}] {}", entry.question_label, entry.status_text);
        if let Some(explanation) = entry.visible_explanation(detail_permission) {
            line.push_str(" - ");
            line.push_str(explanation);
        }
        lines.push(line.trim_end().to_string());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_array() {
        let raw = r#"[
            {"questionLabel": "1", "isCorrect": true, "statusText": "Nice", "detailedExplanation": "2+2=4", "coreConcept": "addition"},
            {"questionLabel": "2", "isCorrect": false, "statusText": "Check the carry", "detailedExplanation": "", "coreConcept": "carrying"}
        ]"#;
        let grading = parse_grading_payload(raw).unwrap();
        assert_eq!(grading.entries.len(), 2);
        assert_eq!(grading.correct_count(), 1);
        assert_eq!(grading.entries[1].core_concept, "carrying");
    }

    #[test]
    fn accepts_fenced_and_wrapped_payloads() {
        let fenced = "```json\n[{\"questionLabel\":\"1\",\"isCorrect\":true,\"coreConcept\":\"ratios\"}]\n```";
        assert_eq!(parse_grading_payload(fenced).unwrap().entries.len(), 1);

        let chatty = "Here is the grading:\n[{\"questionLabel\":\"3\",\"isCorrect\":false}]\nGood luck!";
        let grading = parse_grading_payload(chatty).unwrap();
        assert_eq!(grading.entries[0].question_label, "3");

        let wrapped = r#"{"questions": [{"isCorrect": "correct"}, {"isCorrect": 0}]}"#;
        let grading = parse_grading_payload(wrapped).unwrap();
        assert_eq!(grading.correct_count(), 1);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let grading = parse_grading_payload(r#"[{}, "garbage", {"core_concept": "  ", "question": 7}]"#)
            .unwrap();
        assert_eq!(grading.entries.len(), 3);

        let first = &grading.entries[0];
        assert_eq!(first.question_label, "1");
        assert!(!first.is_correct);
        assert_eq!(first.status_text, "");
        assert_eq!(first.core_concept, UNSPECIFIED_CONCEPT);

        assert_eq!(grading.entries[1].question_label, "2");
        assert_eq!(grading.entries[2].question_label, "7");
        assert_eq!(grading.entries[2].core_concept, UNSPECIFIED_CONCEPT);
    }

    #[test]
    fn single_object_is_one_entry() {
        let grading =
            parse_grading_payload(r#"{"questionLabel":"A","isCorrect":true}"#).unwrap();
        assert_eq!(grading.entries.len(), 1);
        assert!(grading.entries[0].is_correct);
    }

    #[test]
    fn unparseable_payload_is_rejected() {
        assert!(parse_grading_payload("I could not read the image, sorry.").is_err());
        assert!(parse_grading_payload("").is_err());
        assert!(parse_grading_payload("42").is_err());
        assert!(parse_grading_payload("[{\"isCorrect\": tru").is_err());
    }

    #[test]
    fn payloads_without_graded_questions_are_rejected() {
        assert!(parse_grading_payload("[]").is_err());
        assert!(parse_grading_payload(r#"{"questions": []}"#).is_err());
        assert!(parse_grading_payload(r#"{"error": "The image is too blurry to read."}"#).is_err());
        assert!(parse_grading_payload(r#"[{}, "garbage", 3]"#).is_err());
        assert!(parse_grading_payload("```json\n[{\"note\": \"blank page\"}]\n```").is_err());

        let lone = parse_grading_payload(r#"[{"coreConcept": "ratios"}]"#).unwrap();
        assert_eq!(lone.entries.len(), 1);
        assert_eq!(lone.entries[0].core_concept, "ratios");
    }

    #[test]
    fn review_concepts_come_from_missed_vision_entries() {
        let mut vision = InteractionRecord::new("s1", "math", "photo", "", LogType::Vision);
        vision.grading = Some(GradingResult {
            entries: vec![
                entry("1", true, "addition"),
                entry("2", false, "fractions"),
                entry("3", false, UNSPECIFIED_CONCEPT),
                entry("4", false, "Fractions"),
                entry("5", false, "decimals"),
            ],
        });
        let text = InteractionRecord::new("s1", "math", "q", "a", LogType::Text);

        let concepts = collect_review_concepts(&[text, vision], 5);
        assert_eq!(concepts, vec!["fractions".to_string(), "decimals".to_string()]);
    }

    #[test]
    fn explanations_hidden_without_permission() {
        let grading = GradingResult {
            entries: vec![GradingEntry {
                detailed_explanation: "full solution".into(),
                ..entry("1", false, "area")
            }],
        };
        assert!(!grading_summary(&grading, false).contains("full solution"));
        assert!(grading_summary(&grading, true).contains("full solution"));
    }

    #[test]
    fn prompts_reflect_permission_and_count() {
        assert!(grading_prompt("math", false).contains("hint only"));
        assert!(grading_prompt("math", true).contains("step-by-step"));
        assert!(similar_problems_prompt("math", "fractions", 3, false).contains("Write 3 new practice problems"));
        assert!(similar_problems_prompt("math", "fractions", 1, true).contains("Write 1 new practice problem "));
        let quiz = review_quiz_prompt("math", &["fractions".into(), "decimals".into()]);
        assert!(quiz.contains("- fractions\n- decimals"));
    }

    fn entry(label: &str, is_correct: bool, concept: &str) -> GradingEntry {
        GradingEntry {
            question_label: label.into(),
            is_correct,
            status_text: String::new(),
            detailed_explanation: String::new(),
            core_concept: concept.into(),
        }
    }
}
