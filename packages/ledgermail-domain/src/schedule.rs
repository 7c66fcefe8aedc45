use time::{Duration, OffsetDateTime};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollingInterval {
	Hourly,
	Daily,
}
impl PollingInterval {
	/// Unrecognized labels fall back to hourly rather than stalling the account.
	pub fn parse(label: &str) -> Self {
		match label.trim().to_ascii_lowercase().as_str() {
			"daily" => Self::Daily,
			_ => Self::Hourly,
		}
	}

	pub fn as_duration(self) -> Duration {
		match self {
			Self::Hourly => Duration::hours(1),
			Self::Daily => Duration::days(1),
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Hourly => "hourly",
			Self::Daily => "daily",
		}
	}
}

/// Next scan moment for an account: one interval after the last completed
/// check, clamped to now so overdue accounts run immediately. Accounts that
/// never ran are due immediately.
pub fn next_run_at(
	last_check: Option<OffsetDateTime>,
	interval: PollingInterval,
	now: OffsetDateTime,
) -> OffsetDateTime {
	let Some(last_check) = last_check else {
		return now;
	};
	let due = last_check + interval.as_duration();

	if due < now { now } else { due }
}

/// Deterministic job identifier for a user's run slot. The same user and the
/// same second always map to the same id, which lets retried scheduling
/// attempts collapse onto one row.
pub fn job_id_for(user_id: &str, run_at: OffsetDateTime) -> Uuid {
	let name = format!("{user_id}:{}", run_at.unix_timestamp());

	Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
}
