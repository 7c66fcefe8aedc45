//! Mailbox account management and status reporting.

use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use crate::{AutomationService, Error, Result};
use ledgermail_domain::schedule::PollingInterval;
use ledgermail_providers::mailbox::MailboxCredentials;
use ledgermail_storage::{
	accounts::{self, AccountConfigUpsert},
	jobs,
	models::{EmailAccountConfig, ProcessingJob},
};

/// Settings for creating or updating a user's mailbox account.
#[derive(Clone, Debug)]
pub struct AccountUpsertRequest {
	pub user_id: String,
	pub imap_host: String,
	pub imap_port: u16,
	pub imap_username: String,
	pub imap_password: String,
	pub enabled: bool,
	pub polling_interval: String,
	pub bank_senders: Vec<String>,
}

/// Condensed view of the most recent processing job.
#[derive(Clone, Debug)]
pub struct JobSummary {
	pub job_id: Uuid,
	pub state: String,
	pub run_at: OffsetDateTime,
	pub attempts: i32,
	pub last_error: Option<String>,
	pub result: Option<Value>,
	pub updated_at: OffsetDateTime,
}
impl From<ProcessingJob> for JobSummary {
	fn from(job: ProcessingJob) -> Self {
		Self {
			job_id: job.job_id,
			state: job.state,
			run_at: job.run_at,
			attempts: job.attempts,
			last_error: job.last_error,
			result: job.result,
			updated_at: job.updated_at,
		}
	}
}
impl JobSummary {
	pub fn to_value(&self) -> Value {
		serde_json::json!({
			"job_id": self.job_id.to_string(),
			"state": self.state,
			"run_at": format_timestamp(self.run_at),
			"attempts": self.attempts,
			"last_error": self.last_error,
			"result": self.result,
			"updated_at": format_timestamp(self.updated_at),
		})
	}
}

/// Automation state for one user's account.
#[derive(Clone, Debug)]
pub struct AccountStatus {
	pub enabled: bool,
	pub email_address: String,
	pub polling_interval: String,
	pub last_check_time: Option<OffsetDateTime>,
	pub last_processed_email_id: Option<String>,
	pub pending_states: Vec<String>,
	pub latest_job: Option<JobSummary>,
}
impl AccountStatus {
	pub fn to_value(&self) -> Value {
		let status = if self.enabled { "enabled" } else { "disabled" };
		let has_state = |state: &str| self.pending_states.iter().any(|s| s == state);

		serde_json::json!({
			"status": status,
			"email_address": self.email_address,
			"polling_interval": self.polling_interval,
			"last_check_time": self.last_check_time.and_then(format_timestamp),
			"last_processed_email_id": self.last_processed_email_id,
			"has_scheduled_job": has_state("scheduled"),
			"has_queued_job": has_state("queued"),
			"has_running_job": has_state("running"),
			"has_pending_job": !self.pending_states.is_empty(),
			"latest_job": self.latest_job.as_ref().map(JobSummary::to_value),
		})
	}
}

fn format_timestamp(ts: OffsetDateTime) -> Option<String> {
	ts.format(&Rfc3339).ok()
}

impl AutomationService {
	/// Stores or replaces a user's mailbox configuration. The password is
	/// encrypted before it touches the database.
	pub async fn configure_account(
		&self,
		request: &AccountUpsertRequest,
		now: OffsetDateTime,
	) -> Result<()> {
		let user_id = request.user_id.trim();
		let imap_host = request.imap_host.trim();
		let imap_username = request.imap_username.trim();

		if user_id.is_empty() {
			return Err(Error::Configuration {
				message: "User id must not be empty.".to_string(),
			});
		}
		if imap_host.is_empty() {
			return Err(Error::Configuration {
				message: "IMAP host must not be empty.".to_string(),
			});
		}
		if imap_username.is_empty() {
			return Err(Error::Configuration {
				message: "IMAP username must not be empty.".to_string(),
			});
		}
		if request.imap_password.is_empty() {
			return Err(Error::Configuration {
				message: "Mailbox password must not be empty.".to_string(),
			});
		}

		let imap_password_enc = self.cipher.encrypt(&request.imap_password)?;
		let polling_interval = PollingInterval::parse(&request.polling_interval).as_str();
		let bank_senders = request
			.bank_senders
			.iter()
			.map(|sender| sender.trim().to_string())
			.filter(|sender| !sender.is_empty())
			.collect::<Vec<_>>();

		accounts::upsert_account_config(
			&self.db,
			&AccountConfigUpsert {
				user_id,
				imap_host,
				imap_port: i32::from(request.imap_port),
				imap_username,
				imap_password_enc: &imap_password_enc,
				enabled: request.enabled,
				polling_interval,
				bank_senders: &bank_senders,
			},
			now,
		)
		.await?;

		tracing::info!(user_id = %user_id, enabled = request.enabled, "Stored mailbox account configuration.");

		Ok(())
	}

	/// Returns the automation status for a user, or `None` when the user has
	/// no stored configuration.
	pub async fn account_status(&self, user_id: &str) -> Result<Option<AccountStatus>> {
		let Some(config) = accounts::fetch_account_config(&self.db, user_id).await? else {
			return Ok(None);
		};
		let pending_states = jobs::pending_states_for_user(&self.db, user_id).await?;
		let latest_job = jobs::latest_job_for_user(&self.db, user_id).await?.map(JobSummary::from);

		Ok(Some(AccountStatus {
			enabled: config.enabled,
			email_address: config.imap_username,
			polling_interval: config.polling_interval,
			last_check_time: config.last_check_time,
			last_processed_email_id: config.last_processed_email_id,
			pending_states,
			latest_job,
		}))
	}

	/// Verifies the stored credentials by logging into the mailbox. Works on
	/// disabled accounts too so credentials can be checked before enabling.
	pub async fn probe_mailbox(&self, user_id: &str) -> Result<()> {
		let Some(config) = accounts::fetch_account_config(&self.db, user_id).await? else {
			return Err(Error::Configuration {
				message: "Email automation is not configured for this user.".to_string(),
			});
		};
		let credentials = self.mailbox_credentials(&config)?;

		self.providers.mailbox.probe(credentials).await.map_err(|err| Error::Connectivity {
			message: format!("Mailbox connection failed: {err}"),
		})
	}

	pub(crate) fn mailbox_credentials(
		&self,
		config: &EmailAccountConfig,
	) -> Result<MailboxCredentials> {
		let port = u16::try_from(config.imap_port).map_err(|_| Error::Configuration {
			message: format!("Invalid IMAP port: {}.", config.imap_port),
		})?;
		let password =
			self.cipher.decrypt(&config.imap_password_enc).map_err(|_| Error::Credential {
				message: "Failed to decrypt the mailbox password.".to_string(),
			})?;

		Ok(MailboxCredentials {
			host: config.imap_host.clone(),
			port,
			username: config.imap_username.clone(),
			password,
		})
	}
}
