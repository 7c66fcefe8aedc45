use std::sync::Arc;

use time::macros::datetime;

use ledgermail_service::{Error, Providers};

use super::{RecordingLedger, StaticMailbox, StubExtractor, StubRates};

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
async fn schedule_cycle_creates_one_job_per_enabled_account() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping schedule_cycle_creates_one_job_per_enabled_account; set LEDGERMAIL_PG_DSN to run this test.");

		return;
	};
	let cfg = super::test_config(test_db.dsn().to_string());
	let service = super::build_service(cfg, stub_providers()).await;
	let now = datetime!(2026-02-10 10:00 UTC);

	service
		.configure_account(&super::upsert_request("user-a"), now)
		.await
		.expect("Failed to configure account.");
	service
		.configure_account(&super::upsert_request("user-b"), now)
		.await
		.expect("Failed to configure account.");

	let mut disabled = super::upsert_request("user-c");

	disabled.enabled = false;

	service.configure_account(&disabled, now).await.expect("Failed to configure account.");

	let report = service.run_schedule_cycle(now).await.expect("Schedule cycle failed.");

	assert_eq!(report.scheduled, 2);
	assert_eq!(report.skipped, 0);

	// Accounts with a pending job are skipped on the next sweep.
	let second = service.run_schedule_cycle(now).await.expect("Schedule cycle failed.");

	assert_eq!(second.scheduled, 0);
	assert_eq!(second.skipped, 2);

	let status = service
		.account_status("user-a")
		.await
		.expect("Failed to fetch status.")
		.expect("Expected a stored configuration.");

	assert!(status.pending_states.contains(&"scheduled".to_string()));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set LEDGERMAIL_PG_DSN to run."]
async fn triggers_enqueue_for_enabled_accounts_only() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping triggers_enqueue_for_enabled_accounts_only; set LEDGERMAIL_PG_DSN to run this test.");

		return;
	};
	let cfg = super::test_config(test_db.dsn().to_string());
	let service = super::build_service(cfg, stub_providers()).await;
	let now = datetime!(2026-02-10 10:00 UTC);

	// No configuration at all.
	let result = service.trigger_user_job("user-a", now).await;

	assert!(matches!(result, Err(Error::Configuration { .. })));

	let mut disabled = super::upsert_request("user-b");

	disabled.enabled = false;

	service.configure_account(&disabled, now).await.expect("Failed to configure account.");

	let result = service.trigger_user_job("user-b", now).await;

	assert!(matches!(result, Err(Error::Configuration { .. })));

	service
		.configure_account(&super::upsert_request("user-a"), now)
		.await
		.expect("Failed to configure account.");
	service.trigger_user_job("user-a", now).await.expect("Failed to trigger job.");

	let status = service
		.account_status("user-a")
		.await
		.expect("Failed to fetch status.")
		.expect("Expected a stored configuration.");

	assert_eq!(status.pending_states, vec!["queued".to_string()]);

	// A second trigger collides with the pending job.
	let result = service.trigger_user_job("user-a", now).await;

	assert!(matches!(result, Err(Error::Conflict { .. })));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
