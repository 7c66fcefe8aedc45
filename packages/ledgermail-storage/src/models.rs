use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
pub struct EmailAccountConfig {
	pub user_id: String,
	pub imap_host: String,
	pub imap_port: i32,
	pub imap_username: String,
	pub imap_password_enc: String,
	pub enabled: bool,
	pub polling_interval: String,
	pub bank_senders: Value,
	pub last_check_time: Option<OffsetDateTime>,
	pub last_processed_email_id: Option<String>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}
impl EmailAccountConfig {
	/// Sender list from the JSONB column. Non-string entries are dropped.
	pub fn bank_sender_list(&self) -> Vec<String> {
		self.bank_senders
			.as_array()
			.map(|values| {
				values.iter().filter_map(|value| value.as_str().map(str::to_string)).collect()
			})
			.unwrap_or_default()
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct ProcessingJob {
	pub job_id: Uuid,
	pub user_id: String,
	pub state: String,
	pub run_at: OffsetDateTime,
	pub lease_expires_at: Option<OffsetDateTime>,
	pub attempts: i32,
	pub last_error: Option<String>,
	pub result: Option<Value>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}
