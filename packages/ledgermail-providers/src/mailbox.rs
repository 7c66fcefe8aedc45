use std::{collections::HashSet, net::TcpStream};

use mailparse::{MailHeaderMap, ParsedMail};
use native_tls::{TlsConnector, TlsStream};
use time::Date;

use crate::{Error, Result};

const IMAP_MONTHS: [&str; 12] =
	["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];

#[derive(Clone, Debug)]
pub struct MailboxCredentials {
	pub host: String,
	pub port: u16,
	pub username: String,
	pub password: String,
}

#[derive(Clone, Debug)]
pub struct ScanRequest {
	pub credentials: MailboxCredentials,
	pub senders: Vec<String>,
	pub since: Date,
	pub skip_ids: HashSet<String>,
}

#[derive(Debug, Default)]
pub struct MailboxScan {
	pub messages: Vec<FetchedMessage>,
	pub warnings: Vec<String>,
}

/// One inbox message with a stable identifier. The id is the trimmed
/// Message-ID header when present, otherwise `{uid_validity}:{uid}`.
#[derive(Clone, Debug)]
pub struct FetchedMessage {
	pub id: String,
	pub body: String,
}

/// Searches the inbox for mail from the given senders and returns the text
/// bodies of every message not already in `skip_ids`. Failures scoped to one
/// sender or one message are reported as warnings instead of failing the scan.
pub async fn scan(request: ScanRequest) -> Result<MailboxScan> {
	tokio::task::spawn_blocking(move || scan_blocking(&request))
		.await
		.map_err(|err| Error::Mailbox { message: format!("Mailbox task panicked: {err}.") })?
}

/// Connects and authenticates without touching any mail.
pub async fn probe(credentials: MailboxCredentials) -> Result<()> {
	tokio::task::spawn_blocking(move || {
		let mut session = open_session(&credentials)?;
		let _ = session.logout();

		Ok(())
	})
	.await
	.map_err(|err| Error::Mailbox { message: format!("Mailbox task panicked: {err}.") })?
}

fn scan_blocking(request: &ScanRequest) -> Result<MailboxScan> {
	let mut session = open_session(&request.credentials)?;
	let mailbox = session.select("INBOX")?;
	let uid_validity = mailbox.uid_validity.unwrap_or(0);
	let since = imap_date(request.since);
	let mut scan = MailboxScan::default();
	let mut uids = HashSet::new();

	for sender in &request.senders {
		let query = format!(r#"FROM "{sender}" SINCE {since}"#);

		match session.uid_search(&query) {
			Ok(found) => uids.extend(found),
			Err(err) => {
				scan.warnings.push(format!("Search for sender {sender} failed: {err}."));
			},
		}
	}

	let mut uids = uids.into_iter().collect::<Vec<_>>();

	uids.sort_unstable();

	if uids.is_empty() {
		let _ = session.logout();

		return Ok(scan);
	}

	let set = uids.iter().map(u32::to_string).collect::<Vec<_>>().join(",");
	let messages = session.uid_fetch(&set, "(UID BODY.PEEK[])")?;
	let mut fetched = Vec::new();

	for message in messages.iter() {
		let Some(uid) = message.uid else { continue };
		let Some(raw) = message.body() else { continue };

		match parse_message(raw, uid, uid_validity) {
			Ok(parsed) =>
				if !request.skip_ids.contains(&parsed.id) {
					fetched.push((uid, parsed));
				},
			Err(err) => {
				scan.warnings
					.push(format!("Failed to parse message {uid_validity}:{uid}: {err}."));
			},
		}
	}

	let _ = session.logout();

	fetched.sort_by_key(|(uid, _)| *uid);

	scan.messages = fetched.into_iter().map(|(_, message)| message).collect();

	Ok(scan)
}

fn open_session(
	credentials: &MailboxCredentials,
) -> Result<imap::Session<TlsStream<TcpStream>>> {
	let tls = TlsConnector::builder().build()?;
	let client = imap::connect(
		(credentials.host.as_str(), credentials.port),
		credentials.host.as_str(),
		&tls,
	)?;

	client
		.login(credentials.username.as_str(), credentials.password.as_str())
		.map_err(|(err, _)| Error::from(err))
}

fn parse_message(raw: &[u8], uid: u32, uid_validity: u32) -> Result<FetchedMessage> {
	let parsed = mailparse::parse_mail(raw)?;
	let id = message_id(&parsed).unwrap_or_else(|| format!("{uid_validity}:{uid}"));
	let body = text_body(&parsed)?;

	Ok(FetchedMessage { id, body })
}

fn message_id(mail: &ParsedMail<'_>) -> Option<String> {
	let raw = mail.headers.get_first_value("Message-ID")?;
	let trimmed = raw.trim();

	if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

/// Bank alerts usually carry a text/plain part next to an HTML rendering.
/// Plain text wins; HTML is the fallback; attachments never count.
fn text_body(mail: &ParsedMail<'_>) -> Result<String> {
	if let Some(body) = find_body(mail, "text/plain")? {
		return Ok(body);
	}
	if let Some(body) = find_body(mail, "text/html")? {
		return Ok(body);
	}
	if mail.subparts.is_empty() {
		return Ok(mail.get_body()?);
	}

	Ok(String::new())
}

fn find_body(mail: &ParsedMail<'_>, mimetype: &str) -> Result<Option<String>> {
	if mail.ctype.mimetype.eq_ignore_ascii_case(mimetype) && !is_attachment(mail) {
		return Ok(Some(mail.get_body()?));
	}

	for part in &mail.subparts {
		if let Some(body) = find_body(part, mimetype)? {
			return Ok(Some(body));
		}
	}

	Ok(None)
}

fn is_attachment(mail: &ParsedMail<'_>) -> bool {
	let disposition =
		mail.headers.get_first_value("Content-Disposition").unwrap_or_default();

	disposition.to_ascii_lowercase().contains("attachment")
		|| mail.ctype.params.contains_key("name")
		|| mail.ctype.params.contains_key("filename")
}

fn imap_date(date: Date) -> String {
	format!("{:02}-{}-{}", date.day(), IMAP_MONTHS[date.month() as usize - 1], date.year())
}
