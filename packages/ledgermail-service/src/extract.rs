//! LLM extraction of transaction details from bank alert bodies.
//!
//! The extractor sees a fixed few-shot conversation so it returns the same
//! JSON shape for every bank's alert wording. Everything the model returns
//! is re-checked here; missing or non-string fields degrade to `Unknown`
//! instead of failing the run.

use serde_json::Value;
use time::OffsetDateTime;

use crate::AutomationService;
use ledgermail_domain::{
	body, dates, money,
	transaction::{self, TransactionDetails},
};

/// Example alert bodies and the extraction each should produce. Sent as
/// alternating user/assistant turns ahead of the real message.
const FEW_SHOT_EXAMPLES: [(&str, &str); 4] = [
	(
		"Your HDFC Bank Credit Card ending 1234 was used for Rs.2,500.00 at AMAZON RETAIL INDIA \
		 on 2024-01-15 17:45:32. If not done by you, call 18002586161.",
		r#"{"amount": "2500.00", "date": "2024-01-15", "transaction_time": "17:45:32", "account_number": "XX1234", "recipient": "AMAZON RETAIL INDIA"}"#,
	),
	(
		"SBI Transaction Alert: Your account XX7890 has been debited by INR 1,200 on 12-Mar-2024 \
		 at 09:30:45 for payment to FLIPKART PVT LTD.",
		r#"{"amount": "1200", "date": "12-Mar-2024", "transaction_time": "09:30:45", "account_number": "XX7890", "recipient": "FLIPKART PVT LTD"}"#,
	),
	(
		"ICICI Bank: Rs 350.75 debited from your a/c XX5678 on 22 Apr 2024 for POS tx at SWIGGY. \
		 Avl Bal: Rs.12,456.80",
		r#"{"amount": "350.75", "date": "22 Apr 2024", "transaction_time": "Unknown", "account_number": "XX5678", "recipient": "SWIGGY"}"#,
	),
	(
		"Your ICICI Bank Credit Card XX9005 has been used for a transaction of USD 16.52 on May \
		 11, 2025 at 12:00:54. Info: SQSP* INV181442393.",
		r#"{"amount": "16.52", "date": "May 11, 2025", "transaction_time": "12:00:54", "account_number": "XX9005", "recipient": "SQSP* INV181442393"}"#,
	),
];

/// Builds the chat payload for one cleaned alert body.
pub fn build_extraction_messages(cleaned_body: &str) -> Vec<Value> {
	let system_prompt = "You are a specialized financial email parser. Extract transaction \
	                     details from bank notification emails. Extract these fields: the amount \
	                     (only the number, without currency symbols or commas), the date (in any \
	                     format), the transaction time (in HH:MM:SS format if available), the \
	                     account number (masked as XXnnnn), and the recipient or merchant name. \
	                     Return ONLY a valid JSON object with these fields: \"amount\", \
	                     \"date\", \"transaction_time\", \"account_number\", \"recipient\". If \
	                     any field cannot be found with high confidence, use \"Unknown\" as its \
	                     value. Follow these rules strictly: 1. Extract only the requested \
	                     fields. 2. Return values EXACTLY as they appear in the email, following \
	                     the format shown in the examples. 3. DO NOT make up or infer values not \
	                     clearly stated in the email.";
	let mut messages = Vec::with_capacity(FEW_SHOT_EXAMPLES.len() * 2 + 2);

	messages.push(serde_json::json!({ "role": "system", "content": system_prompt }));

	for (email, extraction) in FEW_SHOT_EXAMPLES {
		messages.push(serde_json::json!({ "role": "user", "content": email }));
		messages.push(serde_json::json!({ "role": "assistant", "content": extraction }));
	}

	messages.push(serde_json::json!({ "role": "user", "content": cleaned_body }));

	messages
}

/// Lifts the extractor's JSON into [`TransactionDetails`]. Only string
/// values are trusted; anything else becomes `Unknown`.
pub fn details_from_value(value: &Value) -> TransactionDetails {
	TransactionDetails {
		amount: string_field(value, "amount"),
		date: string_field(value, "date"),
		transaction_time: string_field(value, "transaction_time"),
		account_number: string_field(value, "account_number"),
		recipient: string_field(value, "recipient"),
		currency: transaction::UNKNOWN.to_string(),
	}
}

fn string_field(value: &Value, field: &str) -> String {
	value
		.get(field)
		.and_then(Value::as_str)
		.map(str::to_string)
		.unwrap_or_else(|| transaction::UNKNOWN.to_string())
}

impl AutomationService {
	/// Extracts and normalizes transaction details from one raw alert body.
	///
	/// Never fails: extraction problems are logged and produce all-`Unknown`
	/// details, which the caller records as an unusable message. USD amounts
	/// are converted to INR with the cached pair rate.
	pub async fn extract_transaction(
		&self,
		raw_body: &str,
		now: OffsetDateTime,
	) -> TransactionDetails {
		let cleaned = body::clean_email_body(raw_body);
		let mut details = match &self.cfg.extractor {
			Some(extractor_cfg) => {
				let messages = build_extraction_messages(&cleaned);

				match self.providers.extractor.extract(extractor_cfg, &messages).await {
					Ok(value) => details_from_value(&value),
					Err(err) => {
						tracing::warn!(error = %err, "Transaction extraction failed.");

						TransactionDetails::unknown()
					},
				}
			},
			None => {
				tracing::warn!("No extractor configured. Treating the message as unparseable.");

				TransactionDetails::unknown()
			},
		};

		details.currency = money::detect_currency(&cleaned).to_string();

		if details.amount != transaction::UNKNOWN {
			details.amount = money::strip_amount_separators(&details.amount);
		}
		if details.date != transaction::UNKNOWN {
			match dates::standardize_date(&details.date) {
				Some(date) => details.date = date,
				None => tracing::warn!(date = %details.date, "Unparseable date. Left unchanged."),
			}
		}
		if details.currency == "USD" && details.amount != transaction::UNKNOWN {
			let rate = self.resolve_rate("USD", "INR", now).await;

			if let Some(converted) = money::convert_amount(&details.amount, rate) {
				details.amount = converted;
				details.currency = "INR".to_string();
			}
		}

		details
	}

	/// Resolves a conversion rate through the TTL cache. Without an FX api
	/// key the configured fallback is cached and used; a provider failure
	/// falls back too but is not cached, so the next run retries.
	pub(crate) async fn resolve_rate(&self, from: &str, to: &str, now: OffsetDateTime) -> f64 {
		if let Some(rate) = self.rates.get(from, to, now) {
			return rate;
		}

		let Some(api_key) = self.cfg.fx.api_key.as_deref() else {
			tracing::warn!(from = %from, to = %to, "No FX api key configured. Using the fallback rate.");
			self.rates.put(from, to, self.cfg.fx.fallback_rate, now);

			return self.cfg.fx.fallback_rate;
		};

		match self.providers.rates.fetch_pair_rate(&self.cfg.fx, api_key, from, to).await {
			Ok(rate) => {
				self.rates.put(from, to, rate, now);

				rate
			},
			Err(err) => {
				tracing::warn!(error = %err, from = %from, to = %to, "FX lookup failed. Using the fallback rate.");

				self.cfg.fx.fallback_rate
			},
		}
	}
}
