use std::sync::{Arc, atomic::Ordering};

use time::macros::datetime;

use ledgermail_service::Providers;

use super::{FailingExtractor, RecordingLedger, StaticMailbox, StubExtractor, StubRates};

#[tokio::test]
#[ignore = "Requires external Postgres. Set LEDGERMAIL_PG_DSN to run."]
async fn full_run_submits_and_marks_messages() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping full_run_submits_and_marks_messages; set LEDGERMAIL_PG_DSN to run this test.");

		return;
	};
	let ledger = Arc::new(RecordingLedger::new(super::mapping_export()));
	let providers = Providers::new(
		Arc::new(StaticMailbox::with_messages(vec![super::alert_message()])),
		Arc::new(StubExtractor { payload: super::alert_extraction() }),
		Arc::new(StubRates { rate: 87.5 }),
		ledger.clone(),
	);
	let cfg = super::test_config(test_db.dsn().to_string());
	let service = super::build_service(cfg, providers).await;
	let now = datetime!(2026-02-10 10:00 UTC);

	service
		.configure_account(&super::upsert_request("user-a"), now)
		.await
		.expect("Failed to configure account.");

	let report = service.run_user_job("user-a", now).await;

	assert_eq!(report.status_label(), "success");
	assert_eq!(report.processed_count, 1);
	assert!(report.errors.is_empty());
	assert_eq!(ledger.submission_count(), 1);

	let payload = ledger.last_submission().expect("Expected a submitted payload.");

	assert_eq!(payload["date"], "2024-03-12");
	assert_eq!(payload["payee"], "FLIPKART PVT LTD Online order 09:30:45");

	let postings = payload["postings"].as_array().expect("Expected postings.");

	assert_eq!(postings[0]["account"], "Assets:Bank:SBI");
	assert_eq!(postings[0]["amount"], "-1200");
	assert_eq!(postings[0]["currency"], "INR");
	assert_eq!(postings[1]["account"], "Expenses:Shopping");
	assert_eq!(postings[1]["amount"], "1200");

	let status = service
		.account_status("user-a")
		.await
		.expect("Failed to fetch status.")
		.expect("Expected a stored configuration.");

	assert_eq!(status.last_processed_email_id.as_deref(), Some(super::ALERT_ID));
	assert_eq!(status.last_check_time, Some(now));

	// The same message is deduplicated on the next run.
	let second = service.run_user_job("user-a", now).await;

	assert_eq!(second.processed_count, 0);
	assert!(second.errors.is_empty());
	assert_eq!(ledger.submission_count(), 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set LEDGERMAIL_PG_DSN to run."]
async fn failed_submissions_stay_unprocessed() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping failed_submissions_stay_unprocessed; set LEDGERMAIL_PG_DSN to run this test.");

		return;
	};
	let ledger = Arc::new(RecordingLedger::new(super::mapping_export()));

	ledger.fail_submissions.store(true, Ordering::SeqCst);

	let providers = Providers::new(
		Arc::new(StaticMailbox::with_messages(vec![super::alert_message()])),
		Arc::new(StubExtractor { payload: super::alert_extraction() }),
		Arc::new(StubRates { rate: 87.5 }),
		ledger.clone(),
	);
	let cfg = super::test_config(test_db.dsn().to_string());
	let service = super::build_service(cfg, providers).await;
	let now = datetime!(2026-02-10 10:00 UTC);

	service
		.configure_account(&super::upsert_request("user-a"), now)
		.await
		.expect("Failed to configure account.");

	let report = service.run_user_job("user-a", now).await;

	assert_eq!(report.status_label(), "success");
	assert_eq!(report.processed_count, 0);
	assert_eq!(report.errors.len(), 1);
	assert!(report.errors[0].starts_with("Error processing message"));

	let status = service
		.account_status("user-a")
		.await
		.expect("Failed to fetch status.")
		.expect("Expected a stored configuration.");

	// Nothing was marked processed, so the message is retried next run.
	assert_eq!(status.last_processed_email_id, None);
	assert_eq!(status.last_check_time, Some(now));

	ledger.fail_submissions.store(false, Ordering::SeqCst);

	let second = service.run_user_job("user-a", now).await;

	assert_eq!(second.processed_count, 1);
	assert!(second.errors.is_empty());
	assert_eq!(ledger.submission_count(), 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set LEDGERMAIL_PG_DSN to run."]
async fn unusable_messages_are_marked_processed() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping unusable_messages_are_marked_processed; set LEDGERMAIL_PG_DSN to run this test.");

		return;
	};
	let ledger = Arc::new(RecordingLedger::new(super::mapping_export()));
	let providers = Providers::new(
		Arc::new(StaticMailbox::with_messages(vec![super::alert_message()])),
		Arc::new(FailingExtractor),
		Arc::new(StubRates { rate: 87.5 }),
		ledger.clone(),
	);
	let cfg = super::test_config(test_db.dsn().to_string());
	let service = super::build_service(cfg, providers).await;
	let now = datetime!(2026-02-10 10:00 UTC);

	service
		.configure_account(&super::upsert_request("user-a"), now)
		.await
		.expect("Failed to configure account.");

	let report = service.run_user_job("user-a", now).await;

	assert_eq!(report.status_label(), "success");
	assert_eq!(report.processed_count, 0);
	assert_eq!(report.errors.len(), 1);
	assert!(report.errors[0].starts_with("No usable transaction details"));
	assert_eq!(ledger.submission_count(), 0);

	// Marked processed anyway, so the extractor is not retried on it.
	let second = service.run_user_job("user-a", now).await;

	assert_eq!(second.processed_count, 0);
	assert!(second.errors.is_empty());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set LEDGERMAIL_PG_DSN to run."]
async fn runs_without_configuration_are_skipped() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping runs_without_configuration_are_skipped; set LEDGERMAIL_PG_DSN to run this test.");

		return;
	};
	let providers = Providers::new(
		Arc::new(StaticMailbox::empty()),
		Arc::new(StubExtractor { payload: super::alert_extraction() }),
		Arc::new(StubRates { rate: 87.5 }),
		Arc::new(RecordingLedger::new(super::mapping_export())),
	);
	let cfg = super::test_config(test_db.dsn().to_string());
	let service = super::build_service(cfg, providers).await;
	let now = datetime!(2026-02-10 10:00 UTC);
	let report = service.run_user_job("user-a", now).await;

	assert_eq!(report.status_label(), "skipped");
	assert_eq!(report.to_value()["reason"], "configuration_not_found_or_disabled");

	let mut disabled = super::upsert_request("user-b");

	disabled.enabled = false;

	service.configure_account(&disabled, now).await.expect("Failed to configure account.");

	let report = service.run_user_job("user-b", now).await;

	assert_eq!(report.status_label(), "skipped");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set LEDGERMAIL_PG_DSN to run."]
async fn mailbox_failures_produce_an_error_report() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping mailbox_failures_produce_an_error_report; set LEDGERMAIL_PG_DSN to run this test.");

		return;
	};
	let providers = Providers::new(
		Arc::new(super::FailingMailbox),
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

	let report = service.run_user_job("user-a", now).await;

	assert_eq!(report.status_label(), "error");

	let value = report.to_value();

	assert!(
		value["error"]
			.as_str()
			.expect("Expected an error message.")
			.contains("Mailbox scan failed")
	);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
