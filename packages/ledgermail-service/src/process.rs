//! Per-user email processing runs.

use serde_json::Value;
use time::{Duration, OffsetDateTime};

use crate::{AutomationService, Error, Result, mappings::AccountMappings, submit};
use ledgermail_providers::mailbox::{MailboxScan, ScanRequest};
use ledgermail_storage::{accounts, processed};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
	Success,
	Skipped,
	Error,
}

/// Outcome of one processing run, persisted as the job result.
#[derive(Clone, Debug)]
pub struct RunReport {
	pub status: RunStatus,
	pub reason: Option<String>,
	pub error: Option<String>,
	pub processed_count: u32,
	pub errors: Vec<String>,
}
impl RunReport {
	pub fn skipped(reason: &str) -> Self {
		Self {
			status: RunStatus::Skipped,
			reason: Some(reason.to_string()),
			error: None,
			processed_count: 0,
			errors: Vec::new(),
		}
	}

	pub fn error(message: String) -> Self {
		Self {
			status: RunStatus::Error,
			reason: None,
			error: Some(message),
			processed_count: 0,
			errors: Vec::new(),
		}
	}

	pub fn success(processed_count: u32, errors: Vec<String>) -> Self {
		Self { status: RunStatus::Success, reason: None, error: None, processed_count, errors }
	}

	pub fn status_label(&self) -> &'static str {
		match self.status {
			RunStatus::Success => "success",
			RunStatus::Skipped => "skipped",
			RunStatus::Error => "error",
		}
	}

	/// JSON shape stored on the job row and surfaced by status queries.
	pub fn to_value(&self) -> Value {
		match self.status {
			RunStatus::Skipped => serde_json::json!({
				"status": "skipped",
				"reason": self.reason,
			}),
			RunStatus::Error => serde_json::json!({
				"status": "error",
				"error": self.error,
			}),
			RunStatus::Success => serde_json::json!({
				"status": "success",
				"processed_count": self.processed_count,
				"errors": self.errors,
			}),
		}
	}
}

impl AutomationService {
	/// Runs one full retrieval and submission pass for a user.
	///
	/// Never returns an error: failures become an error report so the job
	/// row always records what happened.
	pub async fn run_user_job(&self, user_id: &str, now: OffsetDateTime) -> RunReport {
		match self.process_inbox(user_id, now).await {
			Ok(report) => report,
			Err(err) => {
				tracing::error!(error = %err, user_id = %user_id, "Email processing run failed.");

				RunReport::error(err.to_string())
			},
		}
	}

	async fn process_inbox(&self, user_id: &str, now: OffsetDateTime) -> Result<RunReport> {
		let Some(config) = accounts::fetch_account_config(&self.db, user_id).await? else {
			return Ok(RunReport::skipped("configuration_not_found_or_disabled"));
		};

		if !config.enabled {
			return Ok(RunReport::skipped("configuration_not_found_or_disabled"));
		}

		let credentials = self.mailbox_credentials(&config)?;
		let mut senders = config.bank_sender_list();

		if senders.is_empty() {
			senders = self.cfg.mailbox.default_bank_senders.clone();
		}

		let skip_ids = processed::load_processed_ids(&self.db, user_id).await?;
		let since = (now - Duration::days(self.cfg.mailbox.lookback_days)).date();
		let scan = self
			.providers
			.mailbox
			.scan(ScanRequest { credentials, senders, since, skip_ids })
			.await
			.map_err(|err| Error::Connectivity { message: format!("Mailbox scan failed: {err}") })?;
		let MailboxScan { messages, warnings } = scan;

		for warning in &warnings {
			tracing::warn!(user_id = %user_id, warning = %warning, "Mailbox scan warning.");
		}

		let mut errors = warnings;
		let mappings = self.load_account_mappings().await;
		let mut processed_count = 0_u32;
		let mut last_marked: Option<String> = None;

		for message in &messages {
			tracing::debug!(user_id = %user_id, message_id = %message.id, "Processing message.");

			let details = self.extract_transaction(&message.body, now).await;

			// Unusable extractions are marked processed so the same noise is
			// not re-sent to the extractor on every run.
			if !details.is_usable() {
				processed::mark_processed(&self.db, user_id, &message.id, now).await?;
				errors.push(format!("No usable transaction details in message {}.", message.id));

				last_marked = Some(message.id.clone());

				continue;
			}

			let resolved = mappings.resolve(&details);
			let payload = match submit::build_transaction_payload(
				&details,
				&resolved,
				&self.cfg.accounting.default_currency,
			) {
				Ok(payload) => payload,
				Err(err) => {
					tracing::warn!(error = %err, user_id = %user_id, message_id = %message.id, "Transaction payload rejected.");
					errors.push(format!("Error processing message {}: {err}", message.id));

					continue;
				},
			};

			// A failed submission leaves the message unmarked so the next
			// run retries it.
			match self.providers.ledger.submit_transaction(&self.cfg.accounting, &payload).await {
				Ok(_) => {
					processed::mark_processed(&self.db, user_id, &message.id, now).await?;

					processed_count += 1;
					last_marked = Some(message.id.clone());

					tracing::info!(user_id = %user_id, message_id = %message.id, "Transaction submitted.");
				},
				Err(err) => {
					tracing::warn!(error = %err, user_id = %user_id, message_id = %message.id, "Transaction submission failed.");
					errors.push(format!("Error processing message {}: {err}", message.id));
				},
			}
		}

		accounts::record_run_progress(&self.db, user_id, now, last_marked.as_deref()).await?;

		Ok(RunReport::success(processed_count, errors))
	}

	/// Fetches the mapping export, degrading to the built-in defaults when
	/// the accounting service is unreachable or the shape is unexpected.
	async fn load_account_mappings(&self) -> AccountMappings {
		match self.providers.ledger.fetch_account_mappings(&self.cfg.accounting).await {
			Ok(value) => match AccountMappings::from_value(&value) {
				Some(mappings) => mappings,
				None => {
					tracing::warn!("Account mapping export has an unexpected shape. Using defaults.");

					AccountMappings::default()
				},
			},
			Err(err) => {
				tracing::warn!(error = %err, "Failed to fetch account mappings. Using defaults.");

				AccountMappings::default()
			},
		}
	}
}
