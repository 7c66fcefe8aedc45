use regex::Regex;

/// Bank alerts that never name a currency are treated as INR.
pub fn detect_currency(body: &str) -> &'static str {
	let mentions_usd =
		Regex::new(r"(?i)\bUSD\b").map(|re| re.is_match(body)).unwrap_or(false);

	if mentions_usd { "USD" } else { "INR" }
}

pub fn strip_amount_separators(amount: &str) -> String {
	amount.replace(',', "")
}

/// Multiplies a decimal amount string by `rate` and renders it with two
/// fractional digits. Returns `None` when the amount is not a number.
pub fn convert_amount(amount: &str, rate: f64) -> Option<String> {
	let value: f64 = amount.trim().parse().ok()?;

	Some(format!("{:.2}", value * rate))
}
