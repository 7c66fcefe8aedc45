use std::sync::Arc;

use time::macros::datetime;

use ledgermail_service::Providers;
use ledgermail_worker::worker::{WorkerState, process_due_jobs_once};

use super::{RecordingLedger, StaticMailbox, StubExtractor, StubRates};

#[tokio::test]
#[ignore = "Requires external Postgres. Set LEDGERMAIL_PG_DSN to run."]
async fn worker_runs_queued_jobs_to_completion() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping worker_runs_queued_jobs_to_completion; set LEDGERMAIL_PG_DSN to run this test.");

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
	service.trigger_user_job("user-a", now).await.expect("Failed to trigger job.");

	let state = WorkerState { db: service.db.clone(), service };

	process_due_jobs_once(&state, now).await.expect("Worker pass failed.");

	assert_eq!(ledger.submission_count(), 1);

	let status = state
		.service
		.account_status("user-a")
		.await
		.expect("Failed to fetch status.")
		.expect("Expected a stored configuration.");

	assert!(status.pending_states.is_empty());

	let latest = status.latest_job.expect("Expected a job record.");

	assert_eq!(latest.state, "finished");
	assert_eq!(
		latest.result,
		Some(serde_json::json!({
			"status": "success",
			"processed_count": 1,
			"errors": [],
		}))
	);

	// The dedup slot is free again.
	state
		.service
		.trigger_user_job("user-a", now + time::Duration::seconds(1))
		.await
		.expect("Failed to trigger a second job.");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set LEDGERMAIL_PG_DSN to run."]
async fn empty_queue_passes_are_noops() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping empty_queue_passes_are_noops; set LEDGERMAIL_PG_DSN to run this test.");

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
	let state = WorkerState { db: service.db.clone(), service };
	let now = datetime!(2026-02-10 10:00 UTC);

	process_due_jobs_once(&state, now).await.expect("Worker pass failed.");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
