use anyhow::Result;
use async_trait::async_trait;

use crate::db::{Database, InteractionRecord, Progress, Student, StudyMode};

use super::StudentStore;

#[async_trait]
impl StudentStore for Database {
    async fn insert_student(&self, student: &Student) -> Result<()> {
        Database::insert_student(self, student).await
    }

    async fn get_student(&self, student_id: &str) -> Result<Option<Student>> {
        Database::get_student(self, student_id).await
    }

    async fn list_students(&self) -> Result<Vec<Student>> {
        Database::list_students(self).await
    }

    async fn set_mode(&self, student_id: &str, mode: StudyMode) -> Result<bool> {
        self.update_student_mode(student_id, mode).await
    }

    async fn set_detail_permission(&self, student_id: &str, allowed: bool) -> Result<bool> {
        self.update_detail_permission(student_id, allowed).await
    }

    async fn commit_turn(
        &self,
        student_id: &str,
        progress: Progress,
        record: Option<InteractionRecord>,
    ) -> Result<()> {
        Database::commit_turn(self, student_id, progress, record).await
    }

    async fn append_interaction(&self, record: &InteractionRecord) -> Result<()> {
        self.insert_interaction(record).await
    }

    async fn get_interaction(&self, log_id: &str) -> Result<Option<InteractionRecord>> {
        Database::get_interaction(self, log_id).await
    }

    async fn list_interactions(
        &self,
        student_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<InteractionRecord>> {
        Database::list_interactions(self, student_id, limit).await
    }

    async fn toggle_bookmark(&self, log_id: &str) -> Result<Option<bool>> {
        Database::toggle_bookmark(self, log_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{GradingEntry, GradingResult, LogType};

    fn open_temp() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("studymate.sqlite3")).unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn student_round_trips_through_sqlite() {
        let (_dir, db) = open_temp();
        let student = Student::new("joshua", "Joshua");
        StudentStore::insert_student(&db, &student).await.unwrap();

        let loaded = StudentStore::get_student(&db, "joshua").await.unwrap().unwrap();
        assert_eq!(loaded.display_name, "Joshua");
        assert_eq!(loaded.mode, StudyMode::Studying);
        assert_eq!(loaded.progress, Progress::default());
        assert!(!loaded.detail_permission);

        assert!(StudentStore::get_student(&db, "nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn mode_and_permission_updates_report_missing_students() {
        let (_dir, db) = open_temp();
        StudentStore::insert_student(&db, &Student::new("s1", "S1")).await.unwrap();

        assert!(db.set_mode("s1", StudyMode::Break).await.unwrap());
        assert!(db.set_detail_permission("s1", true).await.unwrap());
        assert!(!db.set_mode("ghost", StudyMode::Break).await.unwrap());

        let loaded = StudentStore::get_student(&db, "s1").await.unwrap().unwrap();
        assert_eq!(loaded.mode, StudyMode::Break);
        assert!(loaded.detail_permission);
    }

    #[tokio::test]
    async fn commit_turn_writes_progress_and_record_together() {
        let (_dir, db) = open_temp();
        StudentStore::insert_student(&db, &Student::new("s1", "S1")).await.unwrap();

        let mut record = InteractionRecord::new("s1", "math", "photo", "graded", LogType::Vision);
        record.grading = Some(GradingResult {
            entries: vec![GradingEntry {
                question_label: "1".into(),
                is_correct: true,
                status_text: "correct".into(),
                detailed_explanation: String::new(),
                core_concept: "fractions".into(),
            }],
        });
        let progress = Progress { focus_score: 50, level: 2, exp: 30 };

        StudentStore::commit_turn(&db, "s1", progress, Some(record.clone()))
            .await
            .unwrap();

        let loaded = StudentStore::get_student(&db, "s1").await.unwrap().unwrap();
        assert_eq!(loaded.progress, progress);

        let stored = StudentStore::get_interaction(&db, &record.id).await.unwrap().unwrap();
        assert_eq!(stored.log_type, LogType::Vision);
        assert_eq!(stored.grading, record.grading);
    }

    #[tokio::test]
    async fn commit_turn_for_unknown_student_leaves_no_record() {
        let (_dir, db) = open_temp();
        StudentStore::insert_student(&db, &Student::new("s1", "S1")).await.unwrap();
        let record = InteractionRecord::new("s1", "math", "q", "a", LogType::Text);

        let result =
            StudentStore::commit_turn(&db, "ghost", Progress::default(), Some(record.clone())).await;
        assert!(result.is_err());
        assert!(StudentStore::get_interaction(&db, &record.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn interactions_list_most_recent_first() {
        let (_dir, db) = open_temp();
        StudentStore::insert_student(&db, &Student::new("s1", "S1")).await.unwrap();

        let mut first = InteractionRecord::new("s1", "math", "first", "a", LogType::Text);
        first.created_at = chrono::Utc::now() - chrono::Duration::minutes(5);
        let second = InteractionRecord::new("s1", "math", "second", "b", LogType::Text);
        db.append_interaction(&first).await.unwrap();
        db.append_interaction(&second).await.unwrap();

        let all = StudentStore::list_interactions(&db, "s1", None).await.unwrap();
        let questions: Vec<_> = all.iter().map(|r| r.question.as_str()).collect();
        assert_eq!(questions, vec!["second", "first"]);

        let latest = StudentStore::list_interactions(&db, "s1", Some(1)).await.unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].question, "second");
    }

    #[tokio::test]
    async fn bookmark_toggle_twice_restores_original() {
        let (_dir, db) = open_temp();
        StudentStore::insert_student(&db, &Student::new("s1", "S1")).await.unwrap();
        let record = InteractionRecord::new("s1", "math", "q", "a", LogType::Text);
        db.append_interaction(&record).await.unwrap();

        assert_eq!(StudentStore::toggle_bookmark(&db, &record.id).await.unwrap(), Some(true));
        assert_eq!(StudentStore::toggle_bookmark(&db, &record.id).await.unwrap(), Some(false));
        assert_eq!(StudentStore::toggle_bookmark(&db, "missing").await.unwrap(), None);
    }
}
