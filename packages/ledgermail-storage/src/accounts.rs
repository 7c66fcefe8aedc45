use serde_json::Value;
use time::OffsetDateTime;

use crate::{Result, db::Db, models::EmailAccountConfig};

pub struct AccountConfigUpsert<'a> {
	pub user_id: &'a str,
	pub imap_host: &'a str,
	pub imap_port: i32,
	pub imap_username: &'a str,
	pub imap_password_enc: &'a str,
	pub enabled: bool,
	pub polling_interval: &'a str,
	pub bank_senders: &'a [String],
}

pub async fn fetch_account_config(db: &Db, user_id: &str) -> Result<Option<EmailAccountConfig>> {
	let config = sqlx::query_as::<_, EmailAccountConfig>(
		"\
SELECT
	user_id,
	imap_host,
	imap_port,
	imap_username,
	imap_password_enc,
	enabled,
	polling_interval,
	bank_senders,
	last_check_time,
	last_processed_email_id,
	created_at,
	updated_at
FROM email_account_configs
WHERE user_id = $1",
	)
	.bind(user_id)
	.fetch_optional(&db.pool)
	.await?;

	Ok(config)
}

pub async fn list_enabled_configs(db: &Db) -> Result<Vec<EmailAccountConfig>> {
	let configs = sqlx::query_as::<_, EmailAccountConfig>(
		"\
SELECT
	user_id,
	imap_host,
	imap_port,
	imap_username,
	imap_password_enc,
	enabled,
	polling_interval,
	bank_senders,
	last_check_time,
	last_processed_email_id,
	created_at,
	updated_at
FROM email_account_configs
WHERE enabled
ORDER BY user_id",
	)
	.fetch_all(&db.pool)
	.await?;

	Ok(configs)
}

pub async fn upsert_account_config(
	db: &Db,
	upsert: &AccountConfigUpsert<'_>,
	now: OffsetDateTime,
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO email_account_configs (
	user_id,
	imap_host,
	imap_port,
	imap_username,
	imap_password_enc,
	enabled,
	polling_interval,
	bank_senders,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
ON CONFLICT (user_id) DO UPDATE
SET
	imap_host = EXCLUDED.imap_host,
	imap_port = EXCLUDED.imap_port,
	imap_username = EXCLUDED.imap_username,
	imap_password_enc = EXCLUDED.imap_password_enc,
	enabled = EXCLUDED.enabled,
	polling_interval = EXCLUDED.polling_interval,
	bank_senders = EXCLUDED.bank_senders,
	updated_at = EXCLUDED.updated_at",
	)
	.bind(upsert.user_id)
	.bind(upsert.imap_host)
	.bind(upsert.imap_port)
	.bind(upsert.imap_username)
	.bind(upsert.imap_password_enc)
	.bind(upsert.enabled)
	.bind(upsert.polling_interval)
	.bind(Value::from(upsert.bank_senders.to_vec()))
	.bind(now)
	.execute(&db.pool)
	.await?;

	Ok(())
}

/// Records a completed inbox scan. The last processed message id only moves
/// forward; passing `None` keeps the previous value.
pub async fn record_run_progress(
	db: &Db,
	user_id: &str,
	checked_at: OffsetDateTime,
	last_processed_email_id: Option<&str>,
) -> Result<()> {
	sqlx::query(
		"\
UPDATE email_account_configs
SET
	last_check_time = $2,
	last_processed_email_id = COALESCE($3, last_processed_email_id),
	updated_at = $2
WHERE user_id = $1",
	)
	.bind(user_id)
	.bind(checked_at)
	.bind(last_processed_email_id)
	.execute(&db.pool)
	.await?;

	Ok(())
}
