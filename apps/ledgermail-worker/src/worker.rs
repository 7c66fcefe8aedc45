use std::time::Duration as StdDuration;

use color_eyre::Result;
use time::{Duration, OffsetDateTime};
use tokio::time as tokio_time;

use ledgermail_service::AutomationService;
use ledgermail_storage::{db::Db, jobs};

const CLEANUP_INTERVAL_SECONDS: i64 = 60;
const MAX_JOB_ERROR_CHARS: usize = 1_024;
const REDACTED: &str = "[REDACTED]";
const SECRET_KEYS: [&str; 5] = ["api_key", "apikey", "password", "secret", "token"];

pub struct WorkerState {
	pub db: Db,
	pub service: AutomationService,
}

/// Claim loop. Each pass takes at most one due job, so several workers on
/// the same database spread the load without double-claiming.
pub async fn run_worker(state: WorkerState) -> Result<()> {
	let mut last_cleanup = OffsetDateTime::now_utc();

	loop {
		if let Err(err) = process_due_jobs_once(&state, OffsetDateTime::now_utc()).await {
			tracing::error!(error = %err, "Job processing failed.");
		}

		let now = OffsetDateTime::now_utc();

		if now - last_cleanup >= Duration::seconds(CLEANUP_INTERVAL_SECONDS) {
			if let Err(err) = reap_and_purge(&state, now).await {
				tracing::error!(error = %err, "Job table cleanup failed.");
			} else {
				last_cleanup = now;
			}
		}

		tokio_time::sleep(to_std_duration(Duration::milliseconds(
			state.service.cfg.worker.poll_interval_ms,
		)))
		.await;
	}
}

/// Claims and runs at most one job due at `now`. Exposed so tests can drive
/// the loop one step at a time.
pub async fn process_due_jobs_once(state: &WorkerState, now: OffsetDateTime) -> Result<()> {
	let lease_seconds = state.service.cfg.worker.lease_seconds;
	let Some(job) = jobs::claim_next_job(&state.db, now, lease_seconds).await? else {
		return Ok(());
	};
	let timeout_seconds = state.service.cfg.scheduler.job_timeout_seconds;
	let timeout = to_std_duration(Duration::seconds(timeout_seconds));

	match tokio_time::timeout(timeout, state.service.run_user_job(&job.user_id, now)).await {
		Ok(mut report) => {
			for error in &mut report.errors {
				*error = sanitize_job_error(error);
			}
			if let Some(error) = report.error.as_mut() {
				*error = sanitize_job_error(error);
			}

			jobs::mark_job_finished(&state.db, job.job_id, &report.to_value(), now).await?;
			tracing::info!(
				job_id = %job.job_id,
				user_id = %job.user_id,
				status = report.status_label(),
				processed_count = report.processed_count,
				"Email processing job finished.",
			);
		},
		Err(_) => {
			let message = format!("Job timed out after {timeout_seconds} seconds.");

			jobs::mark_job_failed(&state.db, job.job_id, &message, now).await?;
			tracing::error!(job_id = %job.job_id, user_id = %job.user_id, "Email processing job timed out.");
		},
	}

	Ok(())
}

async fn reap_and_purge(state: &WorkerState, now: OffsetDateTime) -> Result<()> {
	let reaped = jobs::reap_expired_leases(&state.db, now).await?;

	if reaped > 0 {
		tracing::info!(count = reaped, "Failed jobs with expired leases.");
	}

	let cutoff = now - Duration::hours(state.service.cfg.scheduler.retention_hours);
	let purged = jobs::purge_finished_jobs(&state.db, cutoff).await?;

	if purged > 0 {
		tracing::info!(count = purged, "Purged old terminal jobs.");
	}

	Ok(())
}

/// Strips credential-looking material from an error string before it lands
/// on the job row.
fn sanitize_job_error(text: &str) -> String {
	let mut words = Vec::new();
	let mut redact_next = false;

	for raw in text.split_whitespace() {
		if redact_next {
			redact_next = false;

			words.push(REDACTED.to_string());

			continue;
		}
		if raw.eq_ignore_ascii_case("bearer") {
			redact_next = true;

			words.push(raw.to_string());

			continue;
		}

		words.push(redact_secret_pair(raw).unwrap_or_else(|| raw.to_string()));
	}

	let mut out = words.join(" ");

	if out.chars().count() > MAX_JOB_ERROR_CHARS {
		out = out.chars().take(MAX_JOB_ERROR_CHARS).collect();
		out.push_str("...");
	}

	out
}

// Single-word `key=value` and `key:value` forms keep the key, lose the value.
fn redact_secret_pair(raw: &str) -> Option<String> {
	let lowered = raw.to_ascii_lowercase();

	if !SECRET_KEYS.iter().any(|key| lowered.contains(key)) {
		return None;
	}

	let sep = if raw.contains('=') {
		'='
	} else if raw.contains(':') {
		':'
	} else {
		return None;
	};
	let prefix = raw.split(sep).next().unwrap_or(raw);

	Some(format!("{prefix}{sep}{REDACTED}"))
}

fn to_std_duration(duration: Duration) -> StdDuration {
	let millis = duration.whole_milliseconds();

	if millis <= 0 {
		return StdDuration::from_millis(0);
	}

	StdDuration::from_millis(millis as u64)
}
