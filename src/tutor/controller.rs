use std::{collections::HashMap, sync::Arc, time::Duration};

use serde::Serialize;
use tokio::{
    sync::{Mutex, OwnedMutexGuard},
    time,
};

use crate::{
    db::{
        student_id_problem, GradingEntry, GradingResult, InteractionRecord, LogType, ModeSnapshot,
        Progress, Student, StudyMode,
    },
    error::{TutorError, TutorResult},
    generation::{GenerationRequest, GenerationService, ImageAttachment},
    settings::TutorSettings,
    store::{ImageStore, StudentStore},
};

use super::{
    grading::{
        collect_review_concepts, grading_prompt, grading_summary, parse_grading_payload,
        review_quiz_prompt, similar_problems_prompt, REVIEW_QUIZ_MAX_CONCEPTS,
        SIMILAR_PROBLEM_COUNTS,
    },
    parser::parse_reply,
    persona::{build_prompt, STATUS_FOCUSED},
    report::{build_report, ParentReport, DEFAULT_HISTORY_ROWS},
    rewards::{LevelRollover, LevelUp, RewardPolicy, SignalAggregator, TurnAction},
    state::{Turn, TurnPhase, TurnReport},
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

pub const ERROR_STATUS: &str = "🔴 error";
pub const ERROR_CATEGORY: &str = "system";
const ERROR_REPLY: &str = "Sorry, I couldn't answer just now. Please try again in a moment.";
const IMAGE_QUESTION: &str = "[image submission]";
const GRADING_CATEGORY: &str = "grading";
const SIMILAR_CATEGORY: &str = "similar problems";
const REVIEW_CATEGORY: &str = "review quiz";
/// How far back a review quiz looks for missed concepts.
const REVIEW_HISTORY_WINDOW: usize = 50;

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub reward_policy: RewardPolicy,
    pub level_rollover: LevelRollover,
    pub log_failed_turns: bool,
    pub default_subject: String,
    pub generation_timeout: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::from(&TutorSettings::default())
    }
}

impl From<&TutorSettings> for ControllerConfig {
    fn from(settings: &TutorSettings) -> Self {
        Self {
            reward_policy: settings.reward_policy,
            level_rollover: settings.level_rollover,
            log_failed_turns: settings.log_failed_turns,
            default_subject: settings.default_subject.clone(),
            generation_timeout: settings.generation.timeout(),
        }
    }
}

/// Result of a graded image submission. Explanations are blanked when the
/// student has no detail permission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingReport {
    pub turn_id: String,
    pub record_id: String,
    pub image_ref: String,
    pub entries: Vec<GradingEntry>,
    pub correct: usize,
    pub total: usize,
    pub summary: String,
    pub progress: Progress,
    pub exp_awarded: u32,
    pub level_up: Option<LevelUp>,
}

/// Result of a similar-problems or review-quiz request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeReport {
    pub turn_id: String,
    pub record_id: String,
    pub log_type: LogType,
    pub content: String,
    pub concepts: Vec<String>,
    pub progress: Progress,
    pub exp_awarded: u32,
    pub level_up: Option<LevelUp>,
}

struct PracticeTurn {
    subject: String,
    question: String,
    prompt: String,
    log_type: LogType,
    category: &'static str,
    concepts: Vec<String>,
}

/// Runs tutoring turns against injected storage and generation backends.
///
/// Turns for the same student are serialized; turns for different students
/// run independently.
#[derive(Clone)]
pub struct TutorController {
    store: Arc<dyn StudentStore>,
    images: Arc<dyn ImageStore>,
    generator: Arc<dyn GenerationService>,
    config: ControllerConfig,
    aggregator: SignalAggregator,
    turn_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl TutorController {
    pub fn new(
        store: Arc<dyn StudentStore>,
        images: Arc<dyn ImageStore>,
        generator: Arc<dyn GenerationService>,
        config: ControllerConfig,
    ) -> Self {
        let aggregator = SignalAggregator::new(config.reward_policy, config.level_rollover);
        Self {
            store,
            images,
            generator,
            config,
            aggregator,
            turn_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn register_student(&self, student_id: &str, display_name: &str) -> TutorResult<Student> {
        let student_id = student_id.trim();
        if let Some(problem) = student_id_problem(student_id) {
            return Err(TutorError::InvalidInput(format!("{problem}: {student_id:?}")));
        }
        if self.store.get_student(student_id).await?.is_some() {
            return Err(TutorError::InvalidInput(format!(
                "student {student_id} is already registered"
            )));
        }

        let display_name = match display_name.trim() {
            "" => student_id,
            name => name,
        };
        let student = Student::new(student_id, display_name);
        self.store.insert_student(&student).await?;
        log_info!("Registered student {}", student.id);
        Ok(student)
    }

    pub async fn get_student(&self, student_id: &str) -> TutorResult<Student> {
        self.store
            .get_student(student_id)
            .await?
            .ok_or_else(|| TutorError::StudentNotFound(student_id.to_string()))
    }

    pub async fn list_students(&self) -> TutorResult<Vec<Student>> {
        Ok(self.store.list_students().await?)
    }

    /// Takes effect from the next turn; a turn already in flight keeps the
    /// mode it started with.
    pub async fn set_mode(&self, student_id: &str, mode: StudyMode) -> TutorResult<()> {
        if !self.store.set_mode(student_id, mode).await? {
            return Err(TutorError::StudentNotFound(student_id.to_string()));
        }
        log_info!("Student {} switched to {} mode", student_id, mode.as_str());
        Ok(())
    }

    pub async fn set_detail_permission(&self, student_id: &str, allowed: bool) -> TutorResult<()> {
        if !self.store.set_detail_permission(student_id, allowed).await? {
            return Err(TutorError::StudentNotFound(student_id.to_string()));
        }
        log_info!("Detail permission for {} set to {}", student_id, allowed);
        Ok(())
    }

    /// One chat turn. A failed or timed-out generation is reported as an
    /// error reply with unchanged progress rather than as `Err`.
    pub async fn submit_question(
        &self,
        student_id: &str,
        subject: &str,
        question: &str,
    ) -> TutorResult<TurnReport> {
        let question = question.trim();
        if question.is_empty() {
            return Err(TutorError::InvalidInput("question must not be empty".into()));
        }
        let subject = self.subject_or_default(subject);

        let (_guard, student) = self.lock_student(student_id).await?;
        let mut turn = Turn::begin(student_id, ModeSnapshot::from(&student));
        let mode = turn.snapshot.mode;

        let prompt = build_prompt(mode, &subject, question);
        turn.advance(TurnPhase::PersonaBuilt)?;

        turn.advance(TurnPhase::GenerationRequested)?;
        let raw = match self.generate(GenerationRequest::text(prompt)).await {
            Ok(raw) => raw,
            Err(err) => {
                turn.advance(TurnPhase::GenerationFailed)?;
                log_warn!("Turn {} for {} failed: {}", turn.id, student_id, err);
                return self
                    .surface_failed_turn(turn, &student, &subject, question, &err)
                    .await;
            }
        };

        let parsed = parse_reply(&raw, mode);
        turn.advance(TurnPhase::ParsedSuccess)?;
        log_debug!(
            "Turn {} parsed status={:?} category={:?} off_topic={}",
            turn.id,
            parsed.status,
            parsed.category,
            parsed.off_topic
        );

        let log_type = if parsed.off_topic {
            LogType::OffTopic
        } else {
            LogType::Text
        };
        let outcome = self.aggregator.apply(
            &student.progress,
            &TurnAction::Question {
                status: &parsed.status,
                off_topic: parsed.off_topic,
            },
        );

        let record = InteractionRecord::new(student_id, subject.as_str(), question, parsed.reply.as_str(), log_type)
            .with_signals(parsed.status.as_str(), parsed.category.as_str());
        let record_id = record.id.clone();
        self.store
            .commit_turn(student_id, outcome.progress, Some(record))
            .await
            .map_err(|err| {
                log_error!("Turn {} for {} could not be saved: {:#}", turn.id, student_id, err);
                TutorError::StoreUnavailable(err)
            })?;
        turn.advance(TurnPhase::LoggedAndAggregated)?;

        if let Some(level_up) = outcome.level_up {
            log_info!("Student {} reached level {}", student_id, level_up.to);
        }

        Ok(TurnReport {
            turn_id: turn.id.clone(),
            reply: parsed.reply,
            status: parsed.status,
            category: parsed.category,
            log_type,
            off_topic: parsed.off_topic,
            mode,
            progress: outcome.progress,
            exp_awarded: outcome.exp_awarded,
            score_delta: outcome.score_delta,
            level_up: outcome.level_up,
            record_id: Some(record_id),
            phase: turn.phase(),
        })
    }

    /// Grades a photographed worksheet. Any failure leaves the log and the
    /// student's progress untouched.
    pub async fn submit_image(
        &self,
        student_id: &str,
        subject: &str,
        bytes: &[u8],
    ) -> TutorResult<GradingReport> {
        let (mime_type, extension) = sniff_image(bytes)?;
        let subject = self.subject_or_default(subject);

        let (_guard, student) = self.lock_student(student_id).await?;
        let mut turn = Turn::begin(student_id, ModeSnapshot::from(&student));
        let detail_permission = turn.snapshot.detail_permission;

        let prompt = grading_prompt(&subject, detail_permission);
        turn.advance(TurnPhase::PersonaBuilt)?;

        turn.advance(TurnPhase::GenerationRequested)?;
        let request = GenerationRequest::with_image(
            prompt,
            ImageAttachment {
                mime_type: mime_type.to_string(),
                data: bytes.to_vec(),
            },
        );
        let raw = match self.generate(request).await {
            Ok(raw) => raw,
            Err(err) => {
                turn.advance(TurnPhase::GenerationFailed)?;
                turn.advance(TurnPhase::ErrorSurfaced)?;
                log_warn!("Grading turn {} for {} failed: {}", turn.id, student_id, err);
                return Err(err);
            }
        };

        let grading = match parse_grading_payload(&raw) {
            Ok(grading) => grading,
            Err(reason) => {
                turn.advance(TurnPhase::GenerationFailed)?;
                turn.advance(TurnPhase::ErrorSurfaced)?;
                log_warn!("Grading turn {} returned an unreadable payload: {}", turn.id, reason);
                return Err(TutorError::MalformedGradingPayload(reason));
            }
        };
        turn.advance(TurnPhase::ParsedSuccess)?;

        let image_ref = self
            .images
            .put_image(student_id, turn.started_at, extension, bytes)
            .await?;

        let correct = grading.correct_count();
        let total = grading.entries.len();
        let outcome = self
            .aggregator
            .apply(&student.progress, &TurnAction::Vision { correct });

        let summary = grading_summary(&grading, detail_permission);
        let mut record =
            InteractionRecord::new(student_id, subject.as_str(), IMAGE_QUESTION, summary.as_str(), LogType::Vision)
                .with_signals(format!("{correct}/{total} correct"), GRADING_CATEGORY);
        record.image_ref = Some(image_ref.clone());
        record.grading = Some(grading.clone());
        let record_id = record.id.clone();

        if let Err(err) = self
            .store
            .commit_turn(student_id, outcome.progress, Some(record))
            .await
        {
            log_error!("Grading turn {} could not be saved: {:#}", turn.id, err);
            if let Err(cleanup) = self.images.remove_image(&image_ref).await {
                log_warn!("Left unreferenced image {}: {:#}", image_ref, cleanup);
            }
            return Err(TutorError::StoreUnavailable(err));
        }
        turn.advance(TurnPhase::LoggedAndAggregated)?;
        log_info!(
            "Graded submission {} for {}: {}/{} correct, +{} exp",
            record_id,
            student_id,
            correct,
            total,
            outcome.exp_awarded
        );

        Ok(GradingReport {
            turn_id: turn.id,
            record_id,
            image_ref,
            entries: redact_entries(grading, detail_permission),
            correct,
            total,
            summary,
            progress: outcome.progress,
            exp_awarded: outcome.exp_awarded,
            level_up: outcome.level_up,
        })
    }

    /// Practice problems modelled on a logged interaction. A blank
    /// `core_concept` uses the first missed concept from that record's
    /// grading.
    pub async fn request_similar_problems(
        &self,
        log_id: &str,
        core_concept: &str,
        count: u8,
    ) -> TutorResult<PracticeReport> {
        if !SIMILAR_PROBLEM_COUNTS.contains(&count) {
            return Err(TutorError::InvalidInput(format!(
                "similar problem count must be one of {SIMILAR_PROBLEM_COUNTS:?}, got {count}"
            )));
        }

        let source = self
            .store
            .get_interaction(log_id)
            .await?
            .ok_or_else(|| TutorError::InteractionNotFound(log_id.to_string()))?;

        let concept = match core_concept.trim() {
            "" => concept_from_record(&source).ok_or_else(|| {
                TutorError::InvalidInput(format!("interaction {log_id} has no concept to practise"))
            })?,
            concept => concept.to_string(),
        };

        let (_guard, student) = self.lock_student(&source.student_id).await?;
        let prompt = similar_problems_prompt(&source.subject, &concept, count, student.detail_permission);
        let turn = PracticeTurn {
            subject: source.subject.clone(),
            question: format!("similar problems ({count}): {concept}"),
            prompt,
            log_type: LogType::SimilarTask,
            category: SIMILAR_CATEGORY,
            concepts: vec![concept],
        };
        self.run_practice_turn(&student, turn, TurnAction::SimilarProblems { count })
            .await
    }

    /// Review quiz over `concepts`, or over the concepts the student recently
    /// missed when none are given.
    pub async fn request_review_quiz(
        &self,
        student_id: &str,
        subject: &str,
        concepts: &[String],
    ) -> TutorResult<PracticeReport> {
        let subject = self.subject_or_default(subject);

        let (_guard, student) = self.lock_student(student_id).await?;

        let mut concepts: Vec<String> = concepts
            .iter()
            .map(|concept| concept.trim().to_string())
            .filter(|concept| !concept.is_empty())
            .collect();
        if concepts.is_empty() {
            let recent = self
                .store
                .list_interactions(student_id, Some(REVIEW_HISTORY_WINDOW))
                .await?;
            concepts = collect_review_concepts(&recent, REVIEW_QUIZ_MAX_CONCEPTS);
        }
        if concepts.is_empty() {
            return Err(TutorError::InvalidInput(
                "no concepts given and no missed concepts in recent submissions".into(),
            ));
        }

        let turn = PracticeTurn {
            prompt: review_quiz_prompt(&subject, &concepts),
            question: format!("review quiz: {}", concepts.join(", ")),
            subject,
            log_type: LogType::ReviewQuiz,
            category: REVIEW_CATEGORY,
            concepts,
        };
        self.run_practice_turn(&student, turn, TurnAction::ReviewQuiz)
            .await
    }

    /// Flips the bookmark on a record and returns the new value.
    pub async fn toggle_bookmark(&self, log_id: &str) -> TutorResult<bool> {
        self.store
            .toggle_bookmark(log_id)
            .await?
            .ok_or_else(|| TutorError::InteractionNotFound(log_id.to_string()))
    }

    /// Most recent first.
    pub async fn list_interactions(
        &self,
        student_id: &str,
        limit: Option<usize>,
    ) -> TutorResult<Vec<InteractionRecord>> {
        self.get_student(student_id).await?;
        Ok(self.store.list_interactions(student_id, limit).await?)
    }

    pub async fn parent_report(&self, student_id: &str) -> TutorResult<ParentReport> {
        let student = self.get_student(student_id).await?;
        let records = self.store.list_interactions(student_id, None).await?;
        Ok(build_report(&student, &records, DEFAULT_HISTORY_ROWS))
    }

    async fn run_practice_turn(
        &self,
        student: &Student,
        practice: PracticeTurn,
        action: TurnAction<'_>,
    ) -> TutorResult<PracticeReport> {
        let mut turn = Turn::begin(student.id.as_str(), ModeSnapshot::from(student));
        turn.advance(TurnPhase::PersonaBuilt)?;

        turn.advance(TurnPhase::GenerationRequested)?;
        let content = match self.generate(GenerationRequest::text(practice.prompt)).await {
            Ok(raw) => raw.trim().to_string(),
            Err(err) => {
                turn.advance(TurnPhase::GenerationFailed)?;
                turn.advance(TurnPhase::ErrorSurfaced)?;
                log_warn!(
                    "{} turn {} for {} failed: {}",
                    practice.log_type.as_str(),
                    turn.id,
                    student.id,
                    err
                );
                return Err(err);
            }
        };
        turn.advance(TurnPhase::ParsedSuccess)?;

        let outcome = self.aggregator.apply(&student.progress, &action);
        let record = InteractionRecord::new(
            student.id.as_str(),
            practice.subject,
            practice.question,
            content.as_str(),
            practice.log_type,
        )
        .with_signals(STATUS_FOCUSED, practice.category);
        let record_id = record.id.clone();

        self.store
            .commit_turn(&student.id, outcome.progress, Some(record))
            .await?;
        turn.advance(TurnPhase::LoggedAndAggregated)?;

        Ok(PracticeReport {
            turn_id: turn.id,
            record_id,
            log_type: practice.log_type,
            content,
            concepts: practice.concepts,
            progress: outcome.progress,
            exp_awarded: outcome.exp_awarded,
            level_up: outcome.level_up,
        })
    }

    async fn surface_failed_turn(
        &self,
        mut turn: Turn,
        student: &Student,
        subject: &str,
        question: &str,
        err: &TutorError,
    ) -> TutorResult<TurnReport> {
        let record_id = if self.config.log_failed_turns {
            let record = InteractionRecord::new(
                student.id.as_str(),
                subject,
                question,
                err.to_string(),
                LogType::Error,
            )
            .with_signals(ERROR_STATUS, ERROR_CATEGORY);
            let record_id = record.id.clone();
            self.store.append_interaction(&record).await?;
            Some(record_id)
        } else {
            None
        };
        turn.advance(TurnPhase::ErrorSurfaced)?;

        Ok(TurnReport {
            turn_id: turn.id.clone(),
            reply: ERROR_REPLY.to_string(),
            status: ERROR_STATUS.to_string(),
            category: ERROR_CATEGORY.to_string(),
            log_type: LogType::Error,
            off_topic: false,
            mode: turn.snapshot.mode,
            progress: student.progress,
            exp_awarded: 0,
            score_delta: 0,
            level_up: None,
            record_id,
            phase: turn.phase(),
        })
    }

    /// Single attempt, bounded by the configured timeout.
    async fn generate(&self, request: GenerationRequest) -> TutorResult<String> {
        let timeout = self.config.generation_timeout;
        match time::timeout(timeout, self.generator.generate(request)).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(err)) => Err(TutorError::GenerationFailure(format!("{err:#}"))),
            Err(_) => Err(TutorError::GenerationFailure(format!(
                "{} did not answer within {:?}",
                self.generator.model_name(),
                timeout
            ))),
        }
    }

    /// Waits for the student's turn lock and reads the student under it.
    /// Unknown ids are rejected before a lock is created for them.
    async fn lock_student(&self, student_id: &str) -> TutorResult<(OwnedMutexGuard<()>, Student)> {
        self.get_student(student_id).await?;
        let guard = self.turn_lock(student_id).await.lock_owned().await;
        let student = self.get_student(student_id).await?;
        Ok((guard, student))
    }

    async fn turn_lock(&self, student_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.turn_locks.lock().await;
        locks.entry(student_id.to_string()).or_default().clone()
    }

    fn subject_or_default(&self, subject: &str) -> String {
        match subject.trim() {
            "" => self.config.default_subject.clone(),
            subject => subject.to_string(),
        }
    }
}

fn sniff_image(bytes: &[u8]) -> TutorResult<(&'static str, &'static str)> {
    use image::ImageFormat;

    let format = image::guess_format(bytes)
        .map_err(|_| TutorError::InvalidInput("unrecognised image format".into()))?;
    match format {
        ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Gif | ImageFormat::WebP => {
            let extension = format.extensions_str().first().copied().unwrap_or("img");
            Ok((format.to_mime_type(), extension))
        }
        other => Err(TutorError::InvalidInput(format!(
            "unsupported image format {other:?}"
        ))),
    }
}

fn concept_from_record(record: &InteractionRecord) -> Option<String> {
    let grading = record.grading.as_ref()?;
    grading
        .missed_concepts()
        .next()
        .or_else(|| {
            grading
                .entries
                .iter()
                .map(|entry| entry.core_concept.as_str())
                .find(|concept| *concept != crate::db::UNSPECIFIED_CONCEPT)
        })
        .map(str::to_string)
}

fn redact_entries(grading: GradingResult, detail_permission: bool) -> Vec<GradingEntry> {
    grading
        .entries
        .into_iter()
        .map(|mut entry| {
            if !detail_permission {
                entry.detailed_explanation.clear();
            }
            entry
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn sniffs_supported_formats() {
        assert_eq!(sniff_image(PNG_HEADER).unwrap(), ("image/png", "png"));
        assert_eq!(sniff_image(b"\xFF\xD8\xFF\xE0rest").unwrap().0, "image/jpeg");
        assert_eq!(sniff_image(b"GIF89a....").unwrap().0, "image/gif");
    }

    #[test]
    fn rejects_unknown_and_unsupported_formats() {
        assert!(matches!(
            sniff_image(b"not an image"),
            Err(TutorError::InvalidInput(_))
        ));
        assert!(matches!(sniff_image(b""), Err(TutorError::InvalidInput(_))));
        // BMP is recognised but not accepted for grading
        assert!(matches!(sniff_image(b"BM\0\0\0\0"), Err(TutorError::InvalidInput(_))));
    }

    #[test]
    fn redaction_blanks_explanations_only_without_permission() {
        let grading = GradingResult {
            entries: vec![GradingEntry {
                question_label: "1".into(),
                is_correct: false,
                status_text: "Check step 2".into(),
                detailed_explanation: "Multiply both sides by 3".into(),
                core_concept: "equations".into(),
            }],
        };
        let hidden = redact_entries(grading.clone(), false);
        assert_eq!(hidden[0].detailed_explanation, "");
        assert_eq!(hidden[0].status_text, "Check step 2");
        let shown = redact_entries(grading, true);
        assert_eq!(shown[0].detailed_explanation, "Multiply both sides by 3");
    }

    #[tokio::test]
    async fn unknown_students_never_get_a_turn_lock() {
        let tutor = TutorController::new(
            Arc::new(crate::store::MemoryStore::new()),
            Arc::new(crate::store::MemoryImageStore::new()),
            Arc::new(crate::generation::ScriptedGenerator::new()),
            ControllerConfig::default(),
        );

        for id in ["ghost-1", "ghost-2", "ghost-3"] {
            assert!(matches!(
                tutor.submit_question(id, "math", "hello?").await,
                Err(TutorError::StudentNotFound(_))
            ));
            assert!(matches!(
                tutor.submit_image(id, "math", PNG_HEADER).await,
                Err(TutorError::StudentNotFound(_))
            ));
            assert!(matches!(
                tutor.request_review_quiz(id, "math", &["fractions".to_string()]).await,
                Err(TutorError::StudentNotFound(_))
            ));
        }
        assert!(tutor.turn_locks.lock().await.is_empty());

        tutor.register_student("mina", "Mina").await.unwrap();
        let (_guard, student) = tutor.lock_student("mina").await.unwrap();
        assert_eq!(student.id, "mina");
        assert_eq!(tutor.turn_locks.lock().await.len(), 1);
    }

    #[test]
    fn concept_prefers_missed_entries() {
        let mut record = InteractionRecord::new("s1", "math", IMAGE_QUESTION, "", LogType::Vision);
        assert_eq!(concept_from_record(&record), None);

        record.grading = Some(GradingResult {
            entries: vec![
                GradingEntry {
                    question_label: "1".into(),
                    is_correct: true,
                    status_text: String::new(),
                    detailed_explanation: String::new(),
                    core_concept: "addition".into(),
                },
                GradingEntry {
                    question_label: "2".into(),
                    is_correct: false,
                    status_text: String::new(),
                    detailed_explanation: String::new(),
                    core_concept: "fractions".into(),
                },
            ],
        });
        assert_eq!(concept_from_record(&record).as_deref(), Some("fractions"));
    }
}
