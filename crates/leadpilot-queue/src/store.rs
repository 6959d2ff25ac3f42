//! SQLite-backed job store.
//!
//! One table holds the whole lifecycle — the DLQ is the `dlq` status value,
//! not a separate store. Jobs are never deleted; terminal states stay behind
//! for audit and replay.
//!
//! Concurrency: the connection sits behind a mutex, and every status
//! mutation is a compare-and-set against the expected current status
//! (`UPDATE … WHERE id = ? AND status = ?`). A zero-row update means the
//! caller lost the race and gets `Conflict`, never a silent overwrite.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, params};
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex};

use leadpilot_core::clock::Clock;
use leadpilot_core::error::{LeadPilotError, Result};

use crate::job::{Job, JobStatus, JobType};

/// Per-status job counts, for observability.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusCounts {
    pub queued: u64,
    pub processing: u64,
    pub completed: u64,
    pub failed: u64,
    pub dlq: u64,
}

/// Durable record of job identity, priority, payload, status and attempts.
pub struct JobStore {
    conn: Mutex<Connection>,
    clock: Arc<dyn Clock>,
    default_max_attempts: u32,
}

impl JobStore {
    /// Open or create the job database at `path`.
    pub fn open(path: &Path, clock: Arc<dyn Clock>, default_max_attempts: u32) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .map_err(|e| LeadPilotError::Store(format!("DB open: {e}")))?;
        Self::from_connection(conn, clock, default_max_attempts)
    }

    /// In-memory store, for tests and ephemeral runs.
    pub fn open_in_memory(clock: Arc<dyn Clock>, default_max_attempts: u32) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| LeadPilotError::Store(format!("DB open: {e}")))?;
        Self::from_connection(conn, clock, default_max_attempts)
    }

    fn from_connection(
        conn: Connection,
        clock: Arc<dyn Clock>,
        default_max_attempts: u32,
    ) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
            clock,
            default_max_attempts,
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS jobs (
                id TEXT PRIMARY KEY,
                job_type TEXT NOT NULL,
                priority INTEGER NOT NULL,
                payload TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'queued',
                attempts INTEGER NOT NULL DEFAULT 0,
                max_attempts INTEGER NOT NULL DEFAULT 5,
                idempotency_key TEXT,
                last_error TEXT,
                not_before TEXT,
                created_at TEXT NOT NULL,
                started_at TEXT,
                completed_at TEXT
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_jobs_idempotency
                ON jobs(idempotency_key) WHERE idempotency_key IS NOT NULL;

            CREATE INDEX IF NOT EXISTS idx_jobs_ready
                ON jobs(status, priority DESC, created_at ASC);
         ",
        )
        .map_err(|e| LeadPilotError::Store(format!("Migration: {e}")))?;
        Ok(())
    }

    /// Submit a job. Duplicate-safe: when `idempotency_key` already exists,
    /// the pre-existing job's id is returned and nothing is created.
    pub fn submit(
        &self,
        job_type: JobType,
        payload: serde_json::Value,
        idempotency_key: Option<&str>,
    ) -> Result<String> {
        self.submit_inner(job_type, payload, idempotency_key, None)
    }

    /// Submit a job that only becomes dispatchable at `not_before`. Used by
    /// handlers scheduling follow-up work (e.g. the next sequence step).
    pub fn submit_scheduled(
        &self,
        job_type: JobType,
        payload: serde_json::Value,
        idempotency_key: Option<&str>,
        not_before: DateTime<Utc>,
    ) -> Result<String> {
        self.submit_inner(job_type, payload, idempotency_key, Some(not_before))
    }

    fn submit_inner(
        &self,
        job_type: JobType,
        payload: serde_json::Value,
        idempotency_key: Option<&str>,
        not_before: Option<DateTime<Utc>>,
    ) -> Result<String> {
        let now = self.clock.now();
        let job = Job::new(
            job_type,
            payload,
            idempotency_key.map(String::from),
            self.default_max_attempts,
            now,
        );

        let conn = self.conn.lock().unwrap();
        if let Some(key) = idempotency_key
            && let Some(existing) = Self::find_by_key(&conn, key)?
        {
            tracing::debug!("Duplicate submission for key '{key}' → job {existing}");
            return Ok(existing);
        }

        let inserted = conn.execute(
            "INSERT INTO jobs
               (id, job_type, priority, payload, status, attempts, max_attempts,
                idempotency_key, not_before, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7, ?8, ?9)",
            params![
                job.id,
                job.job_type.as_str(),
                job.priority,
                job.payload.to_string(),
                JobStatus::Queued.as_str(),
                job.max_attempts,
                job.idempotency_key,
                not_before.map(ts),
                ts(now),
            ],
        );

        match inserted {
            Ok(_) => {
                tracing::info!(
                    "📥 Job {} queued: {} (priority {})",
                    job.id,
                    job.job_type,
                    job.priority
                );
                Ok(job.id)
            }
            // Unique-index race on the idempotency key: another submission
            // with the same key landed first. Resolve to that job.
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                let key = idempotency_key.unwrap_or_default();
                Self::find_by_key(&conn, key)?.ok_or_else(|| {
                    LeadPilotError::Store(format!("constraint hit but key '{key}' not found"))
                })
            }
            Err(e) => Err(LeadPilotError::Store(format!("Insert job: {e}"))),
        }
    }

    /// Fetch a job by id.
    pub fn get(&self, id: &str) -> Result<Job> {
        let conn = self.conn.lock().unwrap();
        Self::get_locked(&conn, id)
    }

    /// Compare-and-set status transition. Validates the state machine first,
    /// then races against concurrent mutations at the SQL layer.
    pub fn update_status(&self, id: &str, expected: JobStatus, next: JobStatus) -> Result<()> {
        if !expected.can_transition_to(next) {
            return Err(LeadPilotError::Conflict(format!(
                "illegal transition {expected} → {next} for job {id}"
            )));
        }
        let conn = self.conn.lock().unwrap();
        let changed = conn
            .execute(
                "UPDATE jobs SET status = ?1 WHERE id = ?2 AND status = ?3",
                params![next.as_str(), id, expected.as_str()],
            )
            .map_err(|e| LeadPilotError::Store(format!("Update status: {e}")))?;
        if changed == 0 {
            return Err(Self::cas_miss(&conn, id, expected));
        }
        Ok(())
    }

    /// Claim the next dispatchable job: highest priority first, FIFO within a
    /// tier, `not_before` respected. The claim itself is a CAS to
    /// `processing` (attempts +1, started_at stamped), so at most one worker
    /// wins a given job. Returns `None` when nothing is ready or the race
    /// was lost; the dispatcher just re-polls.
    pub fn claim_next(&self) -> Result<Option<Job>> {
        let now = self.clock.now();
        let conn = self.conn.lock().unwrap();

        let candidate: Option<String> = conn
            .query_row(
                "SELECT id FROM jobs
                 WHERE status = 'queued'
                   AND (not_before IS NULL OR not_before <= ?1)
                 ORDER BY priority DESC, created_at ASC
                 LIMIT 1",
                params![ts(now)],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(ok_if_no_rows)
            .map_err(|e| LeadPilotError::Store(format!("Select ready: {e}")))?;

        let Some(id) = candidate else {
            return Ok(None);
        };

        let changed = conn
            .execute(
                "UPDATE jobs
                 SET status = 'processing', attempts = attempts + 1, started_at = ?2
                 WHERE id = ?1 AND status = 'queued'",
                params![id, ts(now)],
            )
            .map_err(|e| LeadPilotError::Store(format!("Claim job: {e}")))?;
        if changed == 0 {
            // Another worker claimed it between select and update.
            return Ok(None);
        }

        Self::get_locked(&conn, &id).map(Some)
    }

    /// Mark a processing job as successfully completed.
    pub fn complete(&self, id: &str) -> Result<()> {
        let now = self.clock.now();
        let conn = self.conn.lock().unwrap();
        let changed = conn
            .execute(
                "UPDATE jobs SET status = 'completed', completed_at = ?2
                 WHERE id = ?1 AND status = 'processing'",
                params![id, ts(now)],
            )
            .map_err(|e| LeadPilotError::Store(format!("Complete job: {e}")))?;
        if changed == 0 {
            return Err(Self::cas_miss(&conn, id, JobStatus::Processing));
        }
        Ok(())
    }

    /// Requeue a failed job with a resume-not-before timestamp.
    pub fn fail_requeue(&self, id: &str, error: &str, not_before: DateTime<Utc>) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn
            .execute(
                "UPDATE jobs SET status = 'queued', last_error = ?2, not_before = ?3
                 WHERE id = ?1 AND status = 'processing'",
                params![id, error, ts(not_before)],
            )
            .map_err(|e| LeadPilotError::Store(format!("Requeue job: {e}")))?;
        if changed == 0 {
            return Err(Self::cas_miss(&conn, id, JobStatus::Processing));
        }
        Ok(())
    }

    /// Quarantine a job in the dead-letter queue.
    pub fn fail_dlq(&self, id: &str, error: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn
            .execute(
                "UPDATE jobs SET status = 'dlq', last_error = ?2
                 WHERE id = ?1 AND status = 'processing'",
                params![id, error],
            )
            .map_err(|e| LeadPilotError::Store(format!("DLQ job: {e}")))?;
        if changed == 0 {
            return Err(Self::cas_miss(&conn, id, JobStatus::Processing));
        }
        Ok(())
    }

    /// Requeue a deferred job without consuming an attempt. Deferral is a
    /// scheduling event, not a failure: the claim's increment is undone so
    /// the retry budget only counts real errors.
    pub fn defer(&self, id: &str, not_before: DateTime<Utc>) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn
            .execute(
                "UPDATE jobs
                 SET status = 'queued', not_before = ?2, attempts = MAX(attempts - 1, 0)
                 WHERE id = ?1 AND status = 'processing'",
                params![id, ts(not_before)],
            )
            .map_err(|e| LeadPilotError::Store(format!("Defer job: {e}")))?;
        if changed == 0 {
            return Err(Self::cas_miss(&conn, id, JobStatus::Processing));
        }
        Ok(())
    }

    /// Jobs in a given status, ordered `priority DESC, created_at ASC`.
    pub fn list_by_status(&self, status: JobStatus, limit: usize) -> Result<Vec<Job>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT id, job_type, priority, payload, status, attempts, max_attempts,
                        idempotency_key, last_error, not_before, created_at, started_at,
                        completed_at
                 FROM jobs WHERE status = ?1
                 ORDER BY priority DESC, created_at ASC
                 LIMIT ?2",
            )
            .map_err(|e| LeadPilotError::Store(format!("Prepare list: {e}")))?;
        let rows = stmt
            .query_map(params![status.as_str(), limit as i64], row_to_job)
            .map_err(|e| LeadPilotError::Store(format!("List jobs: {e}")))?;
        let mut jobs = Vec::new();
        for row in rows {
            jobs.push(row.map_err(|e| LeadPilotError::Store(format!("Read job row: {e}")))?);
        }
        Ok(jobs)
    }

    /// Per-status counts for the stats surface.
    pub fn counts(&self) -> Result<StatusCounts> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT status, COUNT(*) FROM jobs GROUP BY status")
            .map_err(|e| LeadPilotError::Store(format!("Prepare counts: {e}")))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?))
            })
            .map_err(|e| LeadPilotError::Store(format!("Count jobs: {e}")))?;

        let mut counts = StatusCounts::default();
        for row in rows {
            let (status, n) = row.map_err(|e| LeadPilotError::Store(format!("Read count: {e}")))?;
            match JobStatus::parse(&status) {
                Some(JobStatus::Queued) => counts.queued = n,
                Some(JobStatus::Processing) => counts.processing = n,
                Some(JobStatus::Completed) => counts.completed = n,
                Some(JobStatus::Failed) => counts.failed = n,
                Some(JobStatus::Dlq) => counts.dlq = n,
                None => {}
            }
        }
        Ok(counts)
    }

    /// Replay up to `limit` DLQ jobs (oldest first): reset to queued,
    /// attempts 0, error cleared. Idempotent per job: one that a concurrent
    /// replay already moved out of `dlq` is skipped, not an error.
    pub fn replay_dlq(&self, limit: usize) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT id FROM jobs WHERE status = 'dlq'
                 ORDER BY created_at ASC LIMIT ?1",
            )
            .map_err(|e| LeadPilotError::Store(format!("Prepare replay: {e}")))?;
        let ids: Vec<String> = stmt
            .query_map(params![limit as i64], |row| row.get(0))
            .map_err(|e| LeadPilotError::Store(format!("Select DLQ: {e}")))?
            .filter_map(|r| r.ok())
            .collect();
        drop(stmt);

        let mut replayed = 0;
        for id in ids {
            let changed = conn
                .execute(
                    "UPDATE jobs
                     SET status = 'queued', attempts = 0, last_error = NULL, not_before = NULL
                     WHERE id = ?1 AND status = 'dlq'",
                    params![id],
                )
                .map_err(|e| LeadPilotError::Store(format!("Replay job: {e}")))?;
            if changed > 0 {
                tracing::info!("🔁 Replayed DLQ job {id}");
                replayed += 1;
            }
        }
        Ok(replayed)
    }

    fn find_by_key(conn: &Connection, key: &str) -> Result<Option<String>> {
        conn.query_row(
            "SELECT id FROM jobs WHERE idempotency_key = ?1",
            params![key],
            |row| row.get(0),
        )
        .map(Some)
        .or_else(ok_if_no_rows)
        .map_err(|e| LeadPilotError::Store(format!("Lookup key: {e}")))
    }

    fn get_locked(conn: &Connection, id: &str) -> Result<Job> {
        conn.query_row(
            "SELECT id, job_type, priority, payload, status, attempts, max_attempts,
                    idempotency_key, last_error, not_before, created_at, started_at,
                    completed_at
             FROM jobs WHERE id = ?1",
            params![id],
            row_to_job,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                LeadPilotError::NotFound(format!("job {id}"))
            }
            other => LeadPilotError::Store(format!("Get job: {other}")),
        })
    }

    /// Classify a zero-row CAS: the job is gone, or its status moved.
    fn cas_miss(conn: &Connection, id: &str, expected: JobStatus) -> LeadPilotError {
        match Self::get_locked(conn, id) {
            Ok(job) => LeadPilotError::Conflict(format!(
                "job {id} is {}, expected {expected}",
                job.status
            )),
            Err(e) => e,
        }
    }
}

/// Fixed-width UTC timestamp; lexicographic order matches chronological.
fn ts(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn ok_if_no_rows<T>(e: rusqlite::Error) -> std::result::Result<Option<T>, rusqlite::Error> {
    match e {
        rusqlite::Error::QueryReturnedNoRows => Ok(None),
        other => Err(other),
    }
}

fn row_to_job(row: &rusqlite::Row<'_>) -> rusqlite::Result<Job> {
    let job_type_str: String = row.get(1)?;
    let status_str: String = row.get(4)?;
    let payload_str: String = row.get(3)?;
    let not_before: Option<String> = row.get(9)?;
    let created_at: String = row.get(10)?;
    let started_at: Option<String> = row.get(11)?;
    let completed_at: Option<String> = row.get(12)?;

    Ok(Job {
        id: row.get(0)?,
        job_type: JobType::parse(&job_type_str).unwrap_or(JobType::WebhookReminder),
        priority: row.get(2)?,
        payload: serde_json::from_str(&payload_str).unwrap_or_default(),
        status: JobStatus::parse(&status_str).unwrap_or(JobStatus::Queued),
        attempts: row.get(5)?,
        max_attempts: row.get(6)?,
        idempotency_key: row.get(7)?,
        last_error: row.get(8)?,
        not_before: not_before.as_deref().and_then(parse_ts),
        created_at: parse_ts(&created_at).unwrap_or_default(),
        started_at: started_at.as_deref().and_then(parse_ts),
        completed_at: completed_at.as_deref().and_then(parse_ts),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use leadpilot_core::clock::ManualClock;

    fn test_store() -> (JobStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        ));
        let store = JobStore::open_in_memory(clock.clone(), 5).unwrap();
        (store, clock)
    }

    #[test]
    fn test_submit_same_key_returns_same_id() {
        let (store, _) = test_store();
        let a = store
            .submit(JobType::Engage, serde_json::json!({"lead_id": "L1"}), Some("engage_L1_M1"))
            .unwrap();
        let b = store
            .submit(JobType::Engage, serde_json::json!({"lead_id": "L1"}), Some("engage_L1_M1"))
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(store.counts().unwrap().queued, 1);
    }

    #[test]
    fn test_submit_without_key_creates_distinct_jobs() {
        let (store, _) = test_store();
        let a = store.submit(JobType::Engage, serde_json::json!({}), None).unwrap();
        let b = store.submit(JobType::Engage, serde_json::json!({}), None).unwrap();
        assert_ne!(a, b);
        assert_eq!(store.counts().unwrap().queued, 2);
    }

    #[test]
    fn test_claim_respects_priority_then_fifo() {
        let (store, clock) = test_store();
        let low = store.submit(JobType::WebhookReminder, serde_json::json!({}), None).unwrap();
        clock.advance_secs(1);
        let high_a = store.submit(JobType::Engage, serde_json::json!({}), None).unwrap();
        clock.advance_secs(1);
        let high_b = store.submit(JobType::Engage, serde_json::json!({}), None).unwrap();

        // Both priority-100 jobs dispatch before the priority-50 one,
        // oldest-first within the tier.
        assert_eq!(store.claim_next().unwrap().unwrap().id, high_a);
        assert_eq!(store.claim_next().unwrap().unwrap().id, high_b);
        assert_eq!(store.claim_next().unwrap().unwrap().id, low);
        assert!(store.claim_next().unwrap().is_none());
    }

    #[test]
    fn test_claim_is_single_flight() {
        let (store, _) = test_store();
        let id = store.submit(JobType::Engage, serde_json::json!({}), None).unwrap();

        let claimed = store.claim_next().unwrap().unwrap();
        assert_eq!(claimed.id, id);
        assert_eq!(claimed.status, JobStatus::Processing);
        assert_eq!(claimed.attempts, 1);

        // A second dispatch attempt observes Conflict on the CAS.
        let err = store
            .update_status(&id, JobStatus::Queued, JobStatus::Processing)
            .unwrap_err();
        assert!(matches!(err, LeadPilotError::Conflict(_)));
        assert!(store.claim_next().unwrap().is_none());
    }

    #[test]
    fn test_not_before_gates_dispatch() {
        let (store, clock) = test_store();
        let id = store.submit(JobType::Engage, serde_json::json!({}), None).unwrap();
        store.claim_next().unwrap().unwrap();
        store
            .fail_requeue(&id, "boom", clock.now() + chrono::Duration::seconds(20))
            .unwrap();

        assert!(store.claim_next().unwrap().is_none());
        clock.advance_secs(19);
        assert!(store.claim_next().unwrap().is_none());
        clock.advance_secs(1);
        let job = store.claim_next().unwrap().unwrap();
        assert_eq!(job.id, id);
        assert_eq!(job.last_error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_illegal_transitions_are_conflicts() {
        let (store, _) = test_store();
        let id = store.submit(JobType::Engage, serde_json::json!({}), None).unwrap();
        store.claim_next().unwrap().unwrap();
        store.complete(&id).unwrap();

        let err = store
            .update_status(&id, JobStatus::Completed, JobStatus::Queued)
            .unwrap_err();
        assert!(matches!(err, LeadPilotError::Conflict(_)));

        // Completing twice also conflicts: the CAS no longer matches.
        let err = store.complete(&id).unwrap_err();
        assert!(matches!(err, LeadPilotError::Conflict(_)));
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let (store, _) = test_store();
        assert!(matches!(
            store.get("nope").unwrap_err(),
            LeadPilotError::NotFound(_)
        ));
    }

    #[test]
    fn test_dlq_is_inert_until_replayed() {
        let (store, _) = test_store();
        let id = store.submit(JobType::Engage, serde_json::json!({}), None).unwrap();
        store.claim_next().unwrap().unwrap();
        store.fail_dlq(&id, "fatal").unwrap();

        assert!(store.claim_next().unwrap().is_none());
        assert_eq!(store.counts().unwrap().dlq, 1);

        let replayed = store.replay_dlq(10).unwrap();
        assert_eq!(replayed, 1);
        let job = store.get(&id).unwrap();
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.attempts, 0);
        assert!(job.last_error.is_none());

        // Replaying again is a no-op: the job is no longer in dlq.
        assert_eq!(store.replay_dlq(10).unwrap(), 0);
    }

    #[test]
    fn test_submit_scheduled_waits_for_not_before() {
        let (store, clock) = test_store();
        let id = store
            .submit_scheduled(
                JobType::SequenceStep,
                serde_json::json!({"step": 2}),
                Some("seq_S1_L1_2"),
                clock.now() + chrono::Duration::seconds(300),
            )
            .unwrap();

        assert!(store.claim_next().unwrap().is_none());
        clock.advance_secs(300);
        assert_eq!(store.claim_next().unwrap().unwrap().id, id);
    }

    #[test]
    fn test_defer_returns_the_attempt() {
        let (store, clock) = test_store();
        let id = store.submit(JobType::EmailSequence, serde_json::json!({}), None).unwrap();
        let claimed = store.claim_next().unwrap().unwrap();
        assert_eq!(claimed.attempts, 1);

        store
            .defer(&id, clock.now() + chrono::Duration::seconds(3600))
            .unwrap();
        let job = store.get(&id).unwrap();
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.attempts, 0);
    }

    #[test]
    fn test_counts_across_statuses() {
        let (store, _) = test_store();
        store.submit(JobType::Engage, serde_json::json!({}), None).unwrap();
        let b = store.submit(JobType::BumpUp, serde_json::json!({}), None).unwrap();
        let c = store.submit(JobType::Summarize, serde_json::json!({}), None).unwrap();

        // b → completed, c → dlq, first stays queued.
        while let Some(job) = store.claim_next().unwrap() {
            if job.id == b {
                store.complete(&b).unwrap();
            } else if job.id == c {
                store.fail_dlq(&c, "x").unwrap();
            }
        }

        let counts = store.counts().unwrap();
        assert_eq!(counts.processing, 1);
        assert_eq!(counts.completed, 1);
        assert_eq!(counts.dlq, 1);
        assert_eq!(counts.queued, 0);
    }
}
