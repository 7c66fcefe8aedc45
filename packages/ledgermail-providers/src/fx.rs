use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

/// Fetches the live conversion rate for one currency pair. The provider keys
/// requests by URL path, so the api key never goes into a header.
pub async fn fetch_pair_rate(
	cfg: &ledgermail_config::Fx,
	api_key: &str,
	from: &str,
	to: &str,
) -> Result<f64> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}/{}/pair/{}/{}", cfg.api_base, api_key, from, to);
	let res = client.get(&url).send().await?;
	let json: Value = res.error_for_status()?.json().await?;

	json.get("conversion_rate").and_then(|v| v.as_f64()).ok_or_else(|| Error::InvalidResponse {
		message: "FX response missing conversion_rate.".to_string(),
	})
}
