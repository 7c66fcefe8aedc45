//! Email processing worker.
//!
//! Claims due jobs from the shared Postgres queue and runs them through the
//! automation service. Safe to run in parallel; claiming is lease-based.

pub mod worker;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(version, rename_all = "kebab", styles = ledgermail_cli::styles())]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: std::path::PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = ledgermail_config::load(&args.config)?;
	let filter = EnvFilter::new(config.service.log_level.clone());

	tracing_subscriber::fmt().with_env_filter(filter).init();

	let db = ledgermail_storage::db::Db::connect(&config.postgres).await?;

	db.ensure_schema().await?;

	let service = ledgermail_service::AutomationService::new(config, db.clone())?;
	let state = worker::WorkerState { db, service };

	worker::run_worker(state).await
}
