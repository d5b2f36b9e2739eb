use std::collections::HashMap;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::db::{InteractionRecord, Progress, Student, StudyMode};

use super::StudentStore;

#[derive(Default)]
struct MemoryState {
    students: HashMap<String, Student>,
    // insertion order doubles as the tie-breaker for equal timestamps
    interactions: Vec<InteractionRecord>,
}

/// Process-local store. Every operation runs under one lock, which gives
/// `commit_turn` the same all-or-nothing behaviour as the SQLite store.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StudentStore for MemoryStore {
    async fn insert_student(&self, student: &Student) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.students.contains_key(&student.id) {
            bail!("student {} already exists", student.id);
        }
        state.students.insert(student.id.clone(), student.clone());
        Ok(())
    }

    async fn get_student(&self, student_id: &str) -> Result<Option<Student>> {
        Ok(self.state.lock().await.students.get(student_id).cloned())
    }

    async fn list_students(&self) -> Result<Vec<Student>> {
        let state = self.state.lock().await;
        let mut students: Vec<_> = state.students.values().cloned().collect();
        students.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Ok(students)
    }

    async fn set_mode(&self, student_id: &str, mode: StudyMode) -> Result<bool> {
        let mut state = self.state.lock().await;
        Ok(match state.students.get_mut(student_id) {
            Some(student) => {
                student.mode = mode;
                student.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn set_detail_permission(&self, student_id: &str, allowed: bool) -> Result<bool> {
        let mut state = self.state.lock().await;
        Ok(match state.students.get_mut(student_id) {
            Some(student) => {
                student.detail_permission = allowed;
                student.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn commit_turn(
        &self,
        student_id: &str,
        progress: Progress,
        record: Option<InteractionRecord>,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        let Some(student) = state.students.get_mut(student_id) else {
            bail!("student {student_id} not found");
        };
        student.progress = progress;
        student.updated_at = Utc::now();
        if let Some(record) = record {
            state.interactions.push(record);
        }
        Ok(())
    }

    async fn append_interaction(&self, record: &InteractionRecord) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.students.contains_key(&record.student_id) {
            bail!("student {} not found", record.student_id);
        }
        state.interactions.push(record.clone());
        Ok(())
    }

    async fn get_interaction(&self, log_id: &str) -> Result<Option<InteractionRecord>> {
        let state = self.state.lock().await;
        Ok(state.interactions.iter().find(|r| r.id == log_id).cloned())
    }

    async fn list_interactions(
        &self,
        student_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<InteractionRecord>> {
        let state = self.state.lock().await;
        let mut records: Vec<(usize, &InteractionRecord)> = state
            .interactions
            .iter()
            .enumerate()
            .filter(|(_, record)| record.student_id == student_id)
            .collect();
        records.sort_by(|(ia, a), (ib, b)| b.created_at.cmp(&a.created_at).then(ib.cmp(ia)));

        Ok(records
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn toggle_bookmark(&self, log_id: &str) -> Result<Option<bool>> {
        let mut state = self.state.lock().await;
        Ok(state
            .interactions
            .iter_mut()
            .find(|record| record.id == log_id)
            .map(|record| {
                record.bookmarked = !record.bookmarked;
                record.bookmarked
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::LogType;

    #[tokio::test]
    async fn commit_turn_rejects_unknown_student_without_appending() {
        let store = MemoryStore::new();
        store.insert_student(&Student::new("s1", "S1")).await.unwrap();
        let record = InteractionRecord::new("ghost", "math", "q", "a", LogType::Text);

        assert!(store
            .commit_turn("ghost", Progress::default(), Some(record))
            .await
            .is_err());
        assert!(store.list_interactions("ghost", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_student_ids_are_rejected() {
        let store = MemoryStore::new();
        store.insert_student(&Student::new("s1", "S1")).await.unwrap();
        assert!(store.insert_student(&Student::new("s1", "Other")).await.is_err());
    }

    #[tokio::test]
    async fn same_timestamp_records_list_latest_insert_first() {
        let store = MemoryStore::new();
        store.insert_student(&Student::new("s1", "S1")).await.unwrap();
        let now = Utc::now();
        for question in ["a", "b", "c"] {
            let mut record = InteractionRecord::new("s1", "math", question, "", LogType::Text);
            record.created_at = now;
            store.append_interaction(&record).await.unwrap();
        }

        let listed = store.list_interactions("s1", Some(2)).await.unwrap();
        let questions: Vec<_> = listed.iter().map(|r| r.question.as_str()).collect();
        assert_eq!(questions, vec!["c", "b"]);
    }
}
