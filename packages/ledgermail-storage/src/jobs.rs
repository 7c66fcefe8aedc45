use serde_json::Value;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{Result, db::Db, models::ProcessingJob};

pub const STATE_SCHEDULED: &str = "scheduled";
pub const STATE_QUEUED: &str = "queued";
pub const STATE_RUNNING: &str = "running";
pub const STATE_FINISHED: &str = "finished";
pub const STATE_FAILED: &str = "failed";

/// Inserts a future run for this user. Returns false when the user already has
/// a scheduled, queued, or running job; the partial unique index makes the
/// check-then-insert atomic, so two racing schedulers cannot both succeed.
pub async fn schedule_job_if_absent(
	db: &Db,
	job_id: Uuid,
	user_id: &str,
	run_at: OffsetDateTime,
	now: OffsetDateTime,
) -> Result<bool> {
	insert_job_if_absent(db, job_id, user_id, STATE_SCHEDULED, run_at, now).await
}

/// Same dedup guarantee as [`schedule_job_if_absent`], but the job becomes
/// claimable immediately. Used by manual triggers.
pub async fn enqueue_job_now_if_absent(
	db: &Db,
	job_id: Uuid,
	user_id: &str,
	now: OffsetDateTime,
) -> Result<bool> {
	insert_job_if_absent(db, job_id, user_id, STATE_QUEUED, now, now).await
}

async fn insert_job_if_absent(
	db: &Db,
	job_id: Uuid,
	user_id: &str,
	state: &str,
	run_at: OffsetDateTime,
	now: OffsetDateTime,
) -> Result<bool> {
	let result = sqlx::query(
		"\
INSERT INTO processing_jobs (job_id, user_id, state, run_at, created_at, updated_at)
VALUES ($1, $2, $3, $4, $5, $5)
ON CONFLICT DO NOTHING",
	)
	.bind(job_id)
	.bind(user_id)
	.bind(state)
	.bind(run_at)
	.bind(now)
	.execute(&db.pool)
	.await?;

	Ok(result.rows_affected() == 1)
}

/// Claims the next due job for this worker and moves it to running with a
/// lease. `FOR UPDATE SKIP LOCKED` keeps concurrent workers from claiming the
/// same row.
pub async fn claim_next_job(
	db: &Db,
	now: OffsetDateTime,
	lease_seconds: i64,
) -> Result<Option<ProcessingJob>> {
	let mut tx = db.pool.begin().await?;
	let row = sqlx::query_as::<_, ProcessingJob>(
		"\
SELECT
	job_id,
	user_id,
	state,
	run_at,
	lease_expires_at,
	attempts,
	last_error,
	result,
	created_at,
	updated_at
FROM processing_jobs
WHERE state IN ('scheduled', 'queued') AND run_at <= $1
ORDER BY run_at ASC
LIMIT 1
FOR UPDATE SKIP LOCKED",
	)
	.bind(now)
	.fetch_optional(&mut *tx)
	.await?;

	let job = if let Some(mut job) = row {
		let lease_expires_at = now + Duration::seconds(lease_seconds);

		sqlx::query(
			"\
UPDATE processing_jobs
SET state = $2, lease_expires_at = $3, attempts = attempts + 1, updated_at = $4
WHERE job_id = $1",
		)
		.bind(job.job_id)
		.bind(STATE_RUNNING)
		.bind(lease_expires_at)
		.bind(now)
		.execute(&mut *tx)
		.await?;

		job.state = STATE_RUNNING.to_string();
		job.lease_expires_at = Some(lease_expires_at);
		job.attempts += 1;
		job.updated_at = now;

		Some(job)
	} else {
		None
	};

	tx.commit().await?;

	Ok(job)
}

pub async fn mark_job_finished(
	db: &Db,
	job_id: Uuid,
	result: &Value,
	now: OffsetDateTime,
) -> Result<()> {
	sqlx::query(
		"\
UPDATE processing_jobs
SET state = $2, result = $3, last_error = NULL, lease_expires_at = NULL, updated_at = $4
WHERE job_id = $1",
	)
	.bind(job_id)
	.bind(STATE_FINISHED)
	.bind(result)
	.bind(now)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn mark_job_failed(db: &Db, job_id: Uuid, error: &str, now: OffsetDateTime) -> Result<()> {
	sqlx::query(
		"\
UPDATE processing_jobs
SET state = $2, last_error = $3, lease_expires_at = NULL, updated_at = $4
WHERE job_id = $1",
	)
	.bind(job_id)
	.bind(STATE_FAILED)
	.bind(error)
	.bind(now)
	.execute(&db.pool)
	.await?;

	Ok(())
}

/// Fails running jobs whose worker never reported back. Frees the per-user
/// dedup slot so the next cycle can schedule a fresh run.
pub async fn reap_expired_leases(db: &Db, now: OffsetDateTime) -> Result<u64> {
	let result = sqlx::query(
		"\
UPDATE processing_jobs
SET state = $2, last_error = $3, lease_expires_at = NULL, updated_at = $1
WHERE state = $4 AND lease_expires_at IS NOT NULL AND lease_expires_at <= $1",
	)
	.bind(now)
	.bind(STATE_FAILED)
	.bind("Worker lease expired before the job finished.")
	.bind(STATE_RUNNING)
	.execute(&db.pool)
	.await?;

	Ok(result.rows_affected())
}

pub async fn purge_finished_jobs(db: &Db, cutoff: OffsetDateTime) -> Result<u64> {
	let result = sqlx::query(
		"\
DELETE FROM processing_jobs
WHERE state IN ('finished', 'failed') AND updated_at < $1",
	)
	.bind(cutoff)
	.execute(&db.pool)
	.await?;

	Ok(result.rows_affected())
}

pub async fn pending_states_for_user(db: &Db, user_id: &str) -> Result<Vec<String>> {
	let states: Vec<String> = sqlx::query_scalar(
		"\
SELECT state
FROM processing_jobs
WHERE user_id = $1 AND state IN ('scheduled', 'queued', 'running')
ORDER BY state",
	)
	.bind(user_id)
	.fetch_all(&db.pool)
	.await?;

	Ok(states)
}

pub async fn latest_job_for_user(db: &Db, user_id: &str) -> Result<Option<ProcessingJob>> {
	let job = sqlx::query_as::<_, ProcessingJob>(
		"\
SELECT
	job_id,
	user_id,
	state,
	run_at,
	lease_expires_at,
	attempts,
	last_error,
	result,
	created_at,
	updated_at
FROM processing_jobs
WHERE user_id = $1
ORDER BY updated_at DESC
LIMIT 1",
	)
	.bind(user_id)
	.fetch_optional(&db.pool)
	.await?;

	Ok(job)
}
