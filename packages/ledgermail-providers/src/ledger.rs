use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde_json::Value;

use crate::{Error, Result};

/// Downloads the bank-account and expense-account maps maintained by the
/// accounting service.
pub async fn fetch_account_mappings(cfg: &ledgermail_config::Accounting) -> Result<Value> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}/api/v1/mappings/export", cfg.api_base);
	let res = authorized(client.get(&url), cfg.bearer_token.as_deref()).send().await?;
	let status = res.status();

	if !status.is_success() {
		return Err(Error::InvalidResponse {
			message: format!("Accounting API returned {status}."),
		});
	}

	Ok(res.json().await?)
}

/// Posts one double-entry transaction. The caller decides what a retry means;
/// this function reports any non-success status as an error.
pub async fn submit_transaction(
	cfg: &ledgermail_config::Accounting,
	payload: &Value,
) -> Result<Value> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}/api/v1/transactions", cfg.api_base);
	let res =
		authorized(client.post(&url).json(payload), cfg.bearer_token.as_deref()).send().await?;
	let status = res.status();

	if !status.is_success() {
		return Err(Error::InvalidResponse {
			message: format!("Accounting API returned {status}."),
		});
	}

	Ok(res.json().await?)
}

fn authorized(request: RequestBuilder, bearer_token: Option<&str>) -> RequestBuilder {
	match bearer_token {
		Some(token) => request.bearer_auth(token),
		None => request,
	}
}
