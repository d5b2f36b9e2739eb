use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::db::{
    connection::Database,
    helpers::{format_datetime, parse_datetime, parse_mode, to_i64, to_u32},
    models::{Progress, Student, StudyMode},
};

const STUDENT_COLUMNS: &str =
    "id, display_name, mode, focus_score, level, exp, detail_permission, created_at, updated_at";

fn row_to_student(row: &Row) -> Result<Student> {
    let mode: String = row.get("mode")?;
    let focus_score: i64 = row.get("focus_score")?;
    let level: i64 = row.get("level")?;
    let exp: i64 = row.get("exp")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(Student {
        id: row.get("id")?,
        display_name: row.get("display_name")?,
        mode: parse_mode(&mode)?,
        detail_permission: row.get("detail_permission")?,
        progress: Progress {
            focus_score: focus_score.clamp(0, 100) as u8,
            level: to_u32(level, "level")?,
            exp: to_u32(exp, "exp")?,
        },
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

/// Writes score, level and exp together. Shared with the turn commit so the
/// three columns never move separately.
pub(super) fn write_progress(
    conn: &Connection,
    student_id: &str,
    progress: &Progress,
    updated_at: DateTime<Utc>,
) -> Result<usize> {
    let rows = conn.execute(
        "UPDATE students
         SET focus_score = ?1,
             level = ?2,
             exp = ?3,
             updated_at = ?4
         WHERE id = ?5",
        params![
            i64::from(progress.focus_score),
            to_i64(progress.level),
            to_i64(progress.exp),
            format_datetime(&updated_at),
            student_id,
        ],
    )?;
    Ok(rows)
}

impl Database {
    pub async fn insert_student(&self, student: &Student) -> Result<()> {
        let record = student.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO students (id, display_name, mode, focus_score, level, exp, detail_permission, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    record.id,
                    record.display_name,
                    record.mode.as_str(),
                    i64::from(record.progress.focus_score),
                    to_i64(record.progress.level),
                    to_i64(record.progress.exp),
                    record.detail_permission,
                    format_datetime(&record.created_at),
                    format_datetime(&record.updated_at),
                ],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn get_student(&self, student_id: &str) -> Result<Option<Student>> {
        let student_id = student_id.to_string();
        self.execute(move |conn| {
            let query = format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = ?1");
            let mut stmt = conn.prepare(&query)?;
            let mut rows = stmt.query(params![student_id])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_to_student(row)?)),
                None => Ok(None),
            }
        })
        .await
    }

    pub async fn list_students(&self) -> Result<Vec<Student>> {
        self.execute(|conn| {
            let query = format!("SELECT {STUDENT_COLUMNS} FROM students ORDER BY display_name ASC");
            let mut stmt = conn.prepare(&query)?;
            let mut rows = stmt.query([])?;
            let mut students = Vec::new();
            while let Some(row) = rows.next()? {
                students.push(row_to_student(row)?);
            }
            Ok(students)
        })
        .await
    }

    /// Returns false when no such student exists.
    pub async fn update_student_mode(&self, student_id: &str, mode: StudyMode) -> Result<bool> {
        let student_id = student_id.to_string();
        self.execute(move |conn| {
            let rows = conn.execute(
                "UPDATE students SET mode = ?1, updated_at = ?2 WHERE id = ?3",
                params![mode.as_str(), format_datetime(&Utc::now()), student_id],
            )?;
            Ok(rows > 0)
        })
        .await
    }

    /// Returns false when no such student exists.
    pub async fn update_detail_permission(&self, student_id: &str, allowed: bool) -> Result<bool> {
        let student_id = student_id.to_string();
        self.execute(move |conn| {
            let rows = conn.execute(
                "UPDATE students SET detail_permission = ?1, updated_at = ?2 WHERE id = ?3",
                params![allowed, format_datetime(&Utc::now()), student_id],
            )?;
            Ok(rows > 0)
        })
        .await
    }
}
