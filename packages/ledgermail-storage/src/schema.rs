use sqlx::PgPool;

use crate::Result;

const SCHEMA_LOCK_ID: i64 = 7_231_018;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS email_account_configs (
	user_id TEXT PRIMARY KEY,
	imap_host TEXT NOT NULL,
	imap_port INT NOT NULL DEFAULT 993,
	imap_username TEXT NOT NULL,
	imap_password_enc TEXT NOT NULL,
	enabled BOOLEAN NOT NULL DEFAULT TRUE,
	polling_interval TEXT NOT NULL DEFAULT 'hourly',
	bank_senders JSONB NOT NULL DEFAULT '[]'::jsonb,
	last_check_time TIMESTAMPTZ,
	last_processed_email_id TEXT,
	created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
	updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS processed_messages (
	user_id TEXT NOT NULL,
	provider_message_id TEXT NOT NULL,
	processed_at TIMESTAMPTZ NOT NULL DEFAULT now(),
	PRIMARY KEY (user_id, provider_message_id)
);

CREATE TABLE IF NOT EXISTS processing_jobs (
	job_id UUID PRIMARY KEY,
	user_id TEXT NOT NULL,
	state TEXT NOT NULL,
	run_at TIMESTAMPTZ NOT NULL,
	lease_expires_at TIMESTAMPTZ,
	attempts INT NOT NULL DEFAULT 0,
	last_error TEXT,
	result JSONB,
	created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
	updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE UNIQUE INDEX IF NOT EXISTS processing_jobs_one_pending_per_user
ON processing_jobs (user_id)
WHERE state IN ('scheduled', 'queued', 'running');

CREATE INDEX IF NOT EXISTS processing_jobs_due
ON processing_jobs (state, run_at);

CREATE INDEX IF NOT EXISTS processing_jobs_user_recency
ON processing_jobs (user_id, updated_at DESC)
"#;

pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
	// Advisory locks are held per connection. Use a single transaction so the lock is scoped to
	// one connection and automatically released when the transaction ends.
	let mut tx = pool.begin().await?;

	sqlx::query("SELECT pg_advisory_xact_lock($1)")
		.bind(SCHEMA_LOCK_ID)
		.execute(&mut *tx)
		.await?;

	for statement in SCHEMA_SQL.split(';') {
		let trimmed = statement.trim();

		if trimmed.is_empty() {
			continue;
		}

		sqlx::query(trimmed).execute(&mut *tx).await?;
	}

	tx.commit().await?;

	Ok(())
}
