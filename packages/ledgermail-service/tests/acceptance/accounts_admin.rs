use std::sync::Arc;

use time::macros::datetime;

use ledgermail_service::{Error, Providers};
use ledgermail_storage::accounts;

use super::{FailingMailbox, RecordingLedger, StaticMailbox, StubExtractor, StubRates};

fn stub_providers() -> Providers {
	Providers::new(
		Arc::new(StaticMailbox::empty()),
		Arc::new(StubExtractor { payload: super::alert_extraction() }),
		Arc::new(StubRates { rate: 87.5 }),
		Arc::new(RecordingLedger::new(super::mapping_export())),
	)
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set LEDGERMAIL_PG_DSN to run."]
async fn configure_account_encrypts_and_normalizes() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping configure_account_encrypts_and_normalizes; set LEDGERMAIL_PG_DSN to run this test.");

		return;
	};
	let cfg = super::test_config(test_db.dsn().to_string());
	let service = super::build_service(cfg, stub_providers()).await;
	let now = datetime!(2026-02-10 10:00 UTC);
	let mut request = super::upsert_request("user-a");

	request.polling_interval = "DAILY".to_string();
	request.bank_senders =
		vec!["alerts@axisbank.com".to_string(), "  ".to_string(), "alerts@hdfcbank.net".to_string()];

	service.configure_account(&request, now).await.expect("Failed to configure account.");

	let stored = accounts::fetch_account_config(&service.db, "user-a")
		.await
		.expect("Failed to fetch configuration.")
		.expect("Expected a stored configuration.");

	assert_eq!(stored.imap_host, "imap.gmail.com");
	assert_eq!(stored.imap_port, 993);
	assert_eq!(stored.imap_username, "user-a@gmail.com");
	// The password is stored encrypted, never as the submitted plaintext.
	assert_ne!(stored.imap_password_enc, "app-password");
	assert!(!stored.imap_password_enc.contains("app-password"));
	assert_eq!(stored.polling_interval, "daily");
	assert_eq!(
		stored.bank_sender_list(),
		vec!["alerts@axisbank.com".to_string(), "alerts@hdfcbank.net".to_string()]
	);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set LEDGERMAIL_PG_DSN to run."]
async fn configure_account_rejects_blank_fields() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping configure_account_rejects_blank_fields; set LEDGERMAIL_PG_DSN to run this test.");

		return;
	};
	let cfg = super::test_config(test_db.dsn().to_string());
	let service = super::build_service(cfg, stub_providers()).await;
	let now = datetime!(2026-02-10 10:00 UTC);
	let request = super::upsert_request("  ");
	let result = service.configure_account(&request, now).await;

	assert!(matches!(result, Err(Error::Configuration { .. })));

	let mut request = super::upsert_request("user-a");

	request.imap_password = String::new();

	let result = service.configure_account(&request, now).await;

	assert!(matches!(result, Err(Error::Configuration { .. })));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set LEDGERMAIL_PG_DSN to run."]
async fn probe_reports_connectivity() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping probe_reports_connectivity; set LEDGERMAIL_PG_DSN to run this test.");

		return;
	};
	let cfg = super::test_config(test_db.dsn().to_string());
	let service = super::build_service(cfg, stub_providers()).await;
	let now = datetime!(2026-02-10 10:00 UTC);

	// No configuration yet.
	let result = service.probe_mailbox("user-a").await;

	assert!(matches!(result, Err(Error::Configuration { .. })));

	service
		.configure_account(&super::upsert_request("user-a"), now)
		.await
		.expect("Failed to configure account.");
	service.probe_mailbox("user-a").await.expect("Probe failed.");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set LEDGERMAIL_PG_DSN to run."]
async fn probe_surfaces_login_failures() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping probe_surfaces_login_failures; set LEDGERMAIL_PG_DSN to run this test.");

		return;
	};
	let providers = Providers::new(
		Arc::new(FailingMailbox),
		Arc::new(StubExtractor { payload: super::alert_extraction() }),
		Arc::new(StubRates { rate: 87.5 }),
		Arc::new(RecordingLedger::new(super::mapping_export())),
	);
	let cfg = super::test_config(test_db.dsn().to_string());
	let service = super::build_service(cfg, providers).await;
	let now = datetime!(2026-02-10 10:00 UTC);

	service
		.configure_account(&super::upsert_request("user-a"), now)
		.await
		.expect("Failed to configure account.");

	let result = service.probe_mailbox("user-a").await;

	assert!(matches!(result, Err(Error::Connectivity { .. })));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
