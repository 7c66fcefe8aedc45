use serde::{Deserialize, Serialize};

/// Sentinel for a field the extractor could not determine.
pub const UNKNOWN: &str = "Unknown";

/// Transaction facts pulled out of one bank alert. Every field is a plain
/// string; absent or low-confidence fields carry [`UNKNOWN`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct TransactionDetails {
	pub amount: String,
	pub date: String,
	pub transaction_time: String,
	pub account_number: String,
	pub recipient: String,
	pub currency: String,
}

impl TransactionDetails {
	pub fn unknown() -> Self {
		Self {
			amount: UNKNOWN.to_string(),
			date: UNKNOWN.to_string(),
			transaction_time: UNKNOWN.to_string(),
			account_number: UNKNOWN.to_string(),
			recipient: UNKNOWN.to_string(),
			currency: UNKNOWN.to_string(),
		}
	}

	/// Submission needs at least an amount and a date; anything less is noise
	/// the pipeline records and moves past.
	pub fn is_usable(&self) -> bool {
		self.amount != UNKNOWN && self.date != UNKNOWN
	}
}
