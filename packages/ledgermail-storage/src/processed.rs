use std::collections::HashSet;

use time::OffsetDateTime;

use crate::{Result, db::Db};

/// Every message identifier this user has already consumed. Loaded once per
/// job so the retrieval pass can skip known mail without extra round trips.
pub async fn load_processed_ids(db: &Db, user_id: &str) -> Result<HashSet<String>> {
	let ids: Vec<String> = sqlx::query_scalar(
		"\
SELECT provider_message_id
FROM processed_messages
WHERE user_id = $1",
	)
	.bind(user_id)
	.fetch_all(&db.pool)
	.await?;

	Ok(ids.into_iter().collect())
}

/// Idempotent dedup commit. Returns false when the pair already existed, which
/// is not an error; the record is immutable either way.
pub async fn mark_processed(
	db: &Db,
	user_id: &str,
	provider_message_id: &str,
	now: OffsetDateTime,
) -> Result<bool> {
	let result = sqlx::query(
		"\
INSERT INTO processed_messages (user_id, provider_message_id, processed_at)
VALUES ($1, $2, $3)
ON CONFLICT DO NOTHING",
	)
	.bind(user_id)
	.bind(provider_message_id)
	.bind(now)
	.execute(&db.pool)
	.await?;

	Ok(result.rows_affected() == 1)
}
