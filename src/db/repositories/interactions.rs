use anyhow::{bail, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::{format_datetime, parse_datetime, parse_grading, parse_log_type},
    models::{InteractionRecord, Progress},
};

use super::students::write_progress;

const INTERACTION_COLUMNS: &str = "id, student_id, created_at, subject, question, reply, status, category, log_type, image_ref, grading_json, bookmarked";

fn row_to_interaction(row: &Row) -> Result<InteractionRecord> {
    let id: String = row.get("id")?;
    let created_at: String = row.get("created_at")?;
    let log_type: String = row.get("log_type")?;
    let grading_json: Option<String> = row.get("grading_json")?;
    let grading = parse_grading(grading_json, &id);

    Ok(InteractionRecord {
        student_id: row.get("student_id")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        subject: row.get("subject")?,
        question: row.get("question")?,
        reply: row.get("reply")?,
        status: row.get("status")?,
        category: row.get("category")?,
        log_type: parse_log_type(&log_type)?,
        image_ref: row.get("image_ref")?,
        grading,
        bookmarked: row.get("bookmarked")?,
        id,
    })
}

fn insert_interaction_row(conn: &Connection, record: &InteractionRecord) -> Result<()> {
    let grading_json = record
        .grading
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .context("failed to serialize grading payload")?;

    conn.execute(
        "INSERT INTO interactions (id, student_id, created_at, subject, question, reply, status, category, log_type, image_ref, grading_json, bookmarked)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            record.id,
            record.student_id,
            format_datetime(&record.created_at),
            record.subject,
            record.question,
            record.reply,
            record.status,
            record.category,
            record.log_type.as_str(),
            record.image_ref,
            grading_json,
            record.bookmarked,
        ],
    )?;
    Ok(())
}

impl Database {
    pub async fn insert_interaction(&self, record: &InteractionRecord) -> Result<()> {
        let record = record.clone();
        self.execute(move |conn| insert_interaction_row(conn, &record))
            .await
    }

    /// Progress write and log append for one turn, in one transaction.
    pub async fn commit_turn(
        &self,
        student_id: &str,
        progress: Progress,
        record: Option<InteractionRecord>,
    ) -> Result<()> {
        let student_id = student_id.to_string();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            let updated = write_progress(&tx, &student_id, &progress, Utc::now())?;
            if updated == 0 {
                bail!("student {student_id} not found");
            }
            if let Some(record) = record.as_ref() {
                insert_interaction_row(&tx, record)?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    pub async fn get_interaction(&self, log_id: &str) -> Result<Option<InteractionRecord>> {
        let log_id = log_id.to_string();
        self.execute(move |conn| {
            let query = format!("SELECT {INTERACTION_COLUMNS} FROM interactions WHERE id = ?1");
            let mut stmt = conn.prepare(&query)?;
            let mut rows = stmt.query(params![log_id])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_to_interaction(row)?)),
                None => Ok(None),
            }
        })
        .await
    }

    /// Most recent first. `limit` of `None` returns the full history.
    pub async fn list_interactions(
        &self,
        student_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<InteractionRecord>> {
        let student_id = student_id.to_string();
        let limit = limit.map(|value| value as i64).unwrap_or(-1);
        self.execute(move |conn| {
            let query = format!(
                "SELECT {INTERACTION_COLUMNS}
                 FROM interactions
                 WHERE student_id = ?1
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?2"
            );
            let mut stmt = conn.prepare(&query)?;
            let mut rows = stmt.query(params![student_id, limit])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                records.push(row_to_interaction(row)?);
            }
            Ok(records)
        })
        .await
    }

    /// Flips the bookmark flag, returning the new value, or `None` when the
    /// record does not exist.
    pub async fn toggle_bookmark(&self, log_id: &str) -> Result<Option<bool>> {
        let log_id = log_id.to_string();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            let current: Option<bool> = tx
                .query_row(
                    "SELECT bookmarked FROM interactions WHERE id = ?1",
                    params![log_id],
                    |row| row.get(0),
                )
                .optional()?;

            let Some(current) = current else {
                return Ok(None);
            };

            tx.execute(
                "UPDATE interactions SET bookmarked = ?1 WHERE id = ?2",
                params![!current, log_id],
            )?;
            tx.commit()?;
            Ok(Some(!current))
        })
        .await
    }
}
