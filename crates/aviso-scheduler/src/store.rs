//! Optional SQLite checkpoint of the pending-job set.
//!
//! The in-memory set is authoritative while the process runs; the store
//! only exists so pending reminders survive a restart. Rows are inserted
//! on schedule and deleted on fire or cancel, so the table always mirrors
//! the pending set.

use std::str::FromStr;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::warn;

use crate::{
    error::Result,
    types::{JobState, ReminderJob, ReminderPayload},
};

pub struct JobStore {
    conn: Mutex<Connection>,
}

impl JobStore {
    /// Wrap a connection, initialising the schema if needed.
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn insert(&self, job: &ReminderJob) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let payload_json = serde_json::to_string(&job.payload)?;
        conn.execute(
            "INSERT INTO reminder_jobs (id, description, fire_at, payload, state, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                job.id,
                job.description,
                job.fire_at.to_rfc3339(),
                payload_json,
                job.state.to_string(),
                job.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Delete a job's row. Called on both fire and cancel; a missing row is
    /// not an error (the job may have been scheduled without a checkpoint).
    pub fn remove(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM reminder_jobs WHERE id = ?1", [id])?;
        Ok(())
    }

    /// Load every checkpointed pending job, ordered by fire time.
    ///
    /// Rows that no longer parse (schema drift, hand-edited payloads) are
    /// skipped with a warning rather than failing the whole reload.
    pub fn load_pending(&self) -> Result<Vec<ReminderJob>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, description, fire_at, payload, state, created_at
             FROM reminder_jobs WHERE state = 'pending' ORDER BY fire_at",
        )?;

        let jobs = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?, // id
                    row.get::<_, String>(1)?, // description
                    row.get::<_, String>(2)?, // fire_at
                    row.get::<_, String>(3)?, // payload JSON
                    row.get::<_, String>(4)?, // state
                    row.get::<_, String>(5)?, // created_at
                ))
            })?
            .filter_map(|r| r.ok())
            .filter_map(|(id, description, fire_at, payload_json, state, created_at)| {
                let parsed: Option<ReminderJob> = (|| {
                    let payload: ReminderPayload = serde_json::from_str(&payload_json).ok()?;
                    let fire_at = DateTime::parse_from_rfc3339(&fire_at)
                        .ok()?
                        .with_timezone(&Utc);
                    let created_at = DateTime::parse_from_rfc3339(&created_at)
                        .ok()?
                        .with_timezone(&Utc);
                    let state = JobState::from_str(&state).ok()?;
                    Some(ReminderJob {
                        id: id.clone(),
                        description,
                        fire_at,
                        payload,
                        state,
                        created_at,
                    })
                })();
                if parsed.is_none() {
                    warn!(job_id = %id, "skipping unparseable checkpoint row");
                }
                parsed
            })
            .collect();

        Ok(jobs)
    }
}

/// Initialise the checkpoint schema in `conn` (idempotent).
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS reminder_jobs (
            id          TEXT NOT NULL PRIMARY KEY,
            description TEXT NOT NULL,
            fire_at     TEXT NOT NULL,   -- ISO-8601
            payload     TEXT NOT NULL,   -- JSON-encoded ReminderPayload
            state       TEXT NOT NULL DEFAULT 'pending',
            created_at  TEXT NOT NULL
        ) STRICT;

        CREATE INDEX IF NOT EXISTS idx_reminder_jobs_fire_at ON reminder_jobs (fire_at);
        ",
    )?;
    Ok(())
}
