//! Scheduling of per-user processing jobs.

use time::OffsetDateTime;
use uuid::Uuid;

use crate::{AutomationService, Error, Result};
use ledgermail_domain::schedule::{PollingInterval, job_id_for, next_run_at};
use ledgermail_storage::{accounts, jobs, models::EmailAccountConfig};

/// Counts from one scheduling sweep over all enabled accounts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScheduleCycleReport {
	pub scheduled: u32,
	pub skipped: u32,
}

impl AutomationService {
	/// Schedules the next run for every enabled account.
	///
	/// Accounts that already have a pending job are skipped; the per-user
	/// dedup constraint makes concurrent sweeps safe. A failure on one
	/// account is logged and does not stop the sweep.
	pub async fn run_schedule_cycle(&self, now: OffsetDateTime) -> Result<ScheduleCycleReport> {
		let configs = accounts::list_enabled_configs(&self.db).await?;
		let mut report = ScheduleCycleReport::default();

		for config in configs {
			match self.schedule_account(&config, now).await {
				Ok(true) => report.scheduled += 1,
				Ok(false) => report.skipped += 1,
				Err(err) => {
					tracing::error!(error = %err, user_id = %config.user_id, "Failed to schedule account.");

					report.skipped += 1;
				},
			}
		}

		Ok(report)
	}

	async fn schedule_account(
		&self,
		config: &EmailAccountConfig,
		now: OffsetDateTime,
	) -> Result<bool> {
		let interval = PollingInterval::parse(&config.polling_interval);
		let run_at = next_run_at(config.last_check_time, interval, now);
		let job_id = job_id_for(&config.user_id, run_at);
		let scheduled =
			jobs::schedule_job_if_absent(&self.db, job_id, &config.user_id, run_at, now).await?;

		if scheduled {
			tracing::info!(user_id = %config.user_id, job_id = %job_id, run_at = %run_at, "Scheduled email processing job.");
		}

		Ok(scheduled)
	}

	/// Queues an immediate run for one user, ahead of the regular schedule.
	///
	/// Fails with [`Error::Conflict`] when the user already has a pending
	/// job, so manual triggers cannot pile up.
	pub async fn trigger_user_job(&self, user_id: &str, now: OffsetDateTime) -> Result<Uuid> {
		let config = accounts::fetch_account_config(&self.db, user_id).await?;
		let enabled = config.map(|config| config.enabled).unwrap_or(false);

		if !enabled {
			return Err(Error::Configuration {
				message: "Email automation is not configured or disabled.".to_string(),
			});
		}

		let job_id = job_id_for(user_id, now);
		let queued = jobs::enqueue_job_now_if_absent(&self.db, job_id, user_id, now).await?;

		if !queued {
			return Err(Error::Conflict {
				message: "An email processing job is already pending for this user.".to_string(),
			});
		}

		tracing::info!(user_id = %user_id, job_id = %job_id, "Queued immediate email processing job.");

		Ok(job_id)
	}
}
