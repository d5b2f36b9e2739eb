//! Storage seams for the tutoring pipeline.
//!
//! The controller never touches SQLite or the filesystem directly; it is
//! handed a [`StudentStore`] and an [`ImageStore`]. Production wires in
//! [`Database`](crate::db::Database) and [`FsImageStore`], tests use the
//! in-memory variants.

mod images;
mod memory;
mod sqlite;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::db::{InteractionRecord, Progress, Student, StudyMode};

pub use images::{FsImageStore, MemoryImageStore};
pub use memory::MemoryStore;

#[async_trait]
pub trait StudentStore: Send + Sync {
    async fn insert_student(&self, student: &Student) -> Result<()>;

    async fn get_student(&self, student_id: &str) -> Result<Option<Student>>;

    async fn list_students(&self) -> Result<Vec<Student>>;

    /// Returns false when the student does not exist.
    async fn set_mode(&self, student_id: &str, mode: StudyMode) -> Result<bool>;

    /// Returns false when the student does not exist.
    async fn set_detail_permission(&self, student_id: &str, allowed: bool) -> Result<bool>;

    /// Persists the new progress and, when present, appends the record.
    /// Either both land or neither does.
    async fn commit_turn(
        &self,
        student_id: &str,
        progress: Progress,
        record: Option<InteractionRecord>,
    ) -> Result<()>;

    /// Appends a record without touching progress (failed-turn audit rows).
    async fn append_interaction(&self, record: &InteractionRecord) -> Result<()>;

    async fn get_interaction(&self, log_id: &str) -> Result<Option<InteractionRecord>>;

    /// Most recent first.
    async fn list_interactions(
        &self,
        student_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<InteractionRecord>>;

    /// New bookmark value, or `None` if the record does not exist.
    async fn toggle_bookmark(&self, log_id: &str) -> Result<Option<bool>>;
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Stores a submission image and returns a retrievable reference.
    async fn put_image(
        &self,
        student_id: &str,
        taken_at: DateTime<Utc>,
        extension: &str,
        bytes: &[u8],
    ) -> Result<String>;

    /// Deletes an image previously returned by `put_image`.
    async fn remove_image(&self, reference: &str) -> Result<()>;
}
