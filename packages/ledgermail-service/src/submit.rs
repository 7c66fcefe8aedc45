//! Double-entry payload construction for the accounting API.

use serde_json::Value;

use crate::{Error, Result, mappings::ResolvedAccounts};
use ledgermail_domain::{dates, transaction, transaction::TransactionDetails};

/// Builds the two-posting transaction payload.
///
/// The date must normalize to ISO and the amount must parse as a positive
/// number; anything else is a [`Error::Submission`] the caller records
/// against the message. Both postings carry the configured ledger currency
/// since amounts were already converted upstream.
pub fn build_transaction_payload(
	details: &TransactionDetails,
	accounts: &ResolvedAccounts,
	default_currency: &str,
) -> Result<Value> {
	let amount: f64 = details.amount.parse().map_err(|_| Error::Submission {
		message: format!("Invalid transaction amount: {}.", details.amount),
	})?;

	if !amount.is_finite() || amount <= 0.0 {
		return Err(Error::Submission {
			message: format!("Invalid transaction amount: {}.", details.amount),
		});
	}

	let date = dates::to_iso_date(&details.date).ok_or_else(|| Error::Submission {
		message: format!("Unsupported transaction date: {}.", details.date),
	})?;
	let amount = amount.to_string();
	let payee = build_payee(&accounts.payee_name, &details.transaction_time);

	Ok(serde_json::json!({
		"date": date,
		"payee": payee,
		"postings": [
			{
				"account": accounts.from_account,
				"amount": format!("-{amount}"),
				"currency": default_currency,
			},
			{
				"account": accounts.to_account,
				"amount": amount,
				"currency": default_currency,
			},
		],
	}))
}

// The time is appended only when the extractor actually found one.
fn build_payee(payee_name: &str, transaction_time: &str) -> String {
	if transaction_time == transaction::UNKNOWN || transaction_time.trim().is_empty() {
		return payee_name.to_string();
	}

	format!("{payee_name} {transaction_time}")
}
