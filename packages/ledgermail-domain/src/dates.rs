use regex::Regex;
use time::{Date, Month};

const MONTH_NUMBERS: [(&str, &str); 12] = [
	("Jan", "01"),
	("Feb", "02"),
	("Mar", "03"),
	("Apr", "04"),
	("May", "05"),
	("Jun", "06"),
	("Jul", "07"),
	("Aug", "08"),
	("Sep", "09"),
	("Oct", "10"),
	("Nov", "11"),
	("Dec", "12"),
];

/// Normalizes a transaction date to `DD-MM-YYYY`.
///
/// Tries numeric day-first forms (`12/03/2024`, `1-1-99`) and then named-month
/// forms (`Apr 10, 2025`, `10 Apr 2025`). Two-digit years above 50 are read as
/// 19xx, the rest as 20xx. Returns `None` when no pattern applies so the caller
/// can keep the raw value.
pub fn standardize_date(raw: &str) -> Option<String> {
	let raw = raw.trim();

	if let Some(caps) = Regex::new(r"^(\d{1,2})[-/](\d{1,2})[-/](\d{2,4})$")
		.ok()
		.and_then(|re| re.captures(raw))
	{
		let day = &caps[1];
		let month = &caps[2];
		let year = &caps[3];
		let year = match year.len() {
			2 if year.parse::<u32>().ok()? > 50 => format!("19{year}"),
			2 => format!("20{year}"),
			4 => year.to_string(),
			_ => return None,
		};

		return Some(format!("{day:0>2}-{month:0>2}-{year}"));
	}

	if let Some(caps) = Regex::new(
		r"(?i)(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\s+(\d{1,2}),?\s+(\d{4})",
	)
	.ok()
	.and_then(|re| re.captures(raw))
	{
		let month = month_number(&caps[1]);
		let day = &caps[2];
		let year = &caps[3];

		return Some(format!("{day:0>2}-{month}-{year}"));
	}

	if let Some(caps) = Regex::new(
		r"(?i)(\d{1,2})\s+(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\s+(\d{4})",
	)
	.ok()
	.and_then(|re| re.captures(raw))
	{
		let day = &caps[1];
		let month = month_number(&caps[2]);
		let year = &caps[3];

		return Some(format!("{day:0>2}-{month}-{year}"));
	}

	None
}

/// Converts a `DD-MM-YY` or `DD-MM-YYYY` date to ISO `YYYY-MM-DD`, validating
/// that the calendar date exists. Two-digit years pivot at 69 (00-68 are 20xx).
pub fn to_iso_date(raw: &str) -> Option<String> {
	let parts: Vec<&str> = raw.trim().split('-').collect();

	if parts.len() != 3 {
		return None;
	}

	let day: u8 = parts[0].parse().ok()?;
	let month: u8 = parts[1].parse().ok()?;
	let year: i32 = match parts[2].len() {
		2 => {
			let short: i32 = parts[2].parse().ok()?;

			if short <= 68 { 2_000 + short } else { 1_900 + short }
		},
		4 => parts[2].parse().ok()?,
		_ => return None,
	};

	Date::from_calendar_date(year, Month::try_from(month).ok()?, day).ok()?;

	Some(format!("{year:04}-{month:02}-{day:02}"))
}

fn month_number(name: &str) -> &'static str {
	let prefix = &name[..3.min(name.len())];

	MONTH_NUMBERS
		.iter()
		.find(|(abbr, _)| abbr.eq_ignore_ascii_case(prefix))
		.map(|(_, number)| *number)
		.unwrap_or("01")
}
