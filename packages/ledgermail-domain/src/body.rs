use regex::Regex;

/// Strips the quoted-printable artifacts bank alert bodies commonly arrive with:
/// soft line breaks, `=20`/`=A0` escapes, and carriage returns.
pub fn clean_email_body(body: &str) -> String {
	let unfolded = Regex::new(r"=\s*\n")
		.map(|re| re.replace_all(body, "").into_owned())
		.unwrap_or_else(|_| body.to_string());

	unfolded.replace("=20", " ").replace("=A0", " ").replace('\r', "")
}
