//! Scheduler and account administration binary.
//!
//! Without a subcommand it loops forever, scheduling the next processing
//! job for every enabled account. Subcommands cover one-off operations:
//! triggering an immediate run, inspecting status, probing credentials and
//! editing account configurations.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

use ledgermail_service::{AccountUpsertRequest, AutomationService};
use ledgermail_storage::db::Db;

#[derive(Debug, Parser)]
#[command(version, rename_all = "kebab", styles = ledgermail_cli::styles())]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Queue an immediate processing job for one user.
	Trigger {
		#[arg(long, value_name = "USER")]
		user: String,
	},
	/// Print the automation status for one user as JSON.
	Status {
		#[arg(long, value_name = "USER")]
		user: String,
	},
	/// Verify the stored mailbox credentials by logging in.
	Probe {
		#[arg(long, value_name = "USER")]
		user: String,
	},
	/// Create or update a user's mailbox account configuration.
	UpsertAccount {
		#[arg(long, value_name = "USER")]
		user: String,
		#[arg(long, value_name = "HOST")]
		host: String,
		#[arg(long, value_name = "PORT", default_value_t = 993)]
		port: u16,
		#[arg(long, value_name = "EMAIL")]
		username: String,
		#[arg(long, value_name = "PASSWORD")]
		password: String,
		#[arg(long, value_name = "INTERVAL", default_value = "hourly")]
		interval: String,
		/// Bank alert sender to scan for. Repeat for several senders.
		#[arg(long = "sender", value_name = "EMAIL")]
		senders: Vec<String>,
		/// Store the account without enabling automation.
		#[arg(long)]
		disabled: bool,
	},
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = ledgermail_config::load(&args.config)?;
	let filter = EnvFilter::new(config.service.log_level.clone());

	tracing_subscriber::fmt().with_env_filter(filter).init();

	let db = Db::connect(&config.postgres).await?;

	db.ensure_schema().await?;

	let service = AutomationService::new(config, db)?;

	match args.command {
		None => run_schedule_loop(service).await,
		Some(Command::Trigger { user }) => {
			let job_id = service.trigger_user_job(&user, OffsetDateTime::now_utc()).await?;

			println!("Queued email processing job {job_id} for user {user}.");

			Ok(())
		},
		Some(Command::Status { user }) => {
			match service.account_status(&user).await? {
				Some(status) =>
					println!("{}", serde_json::to_string_pretty(&status.to_value())?),
				None => println!("Email automation is not configured for user {user}."),
			}

			Ok(())
		},
		Some(Command::Probe { user }) => {
			service.probe_mailbox(&user).await?;

			println!("Mailbox connection for user {user} verified.");

			Ok(())
		},
		Some(Command::UpsertAccount {
			user,
			host,
			port,
			username,
			password,
			interval,
			senders,
			disabled,
		}) => {
			let request = AccountUpsertRequest {
				user_id: user.clone(),
				imap_host: host,
				imap_port: port,
				imap_username: username,
				imap_password: password,
				enabled: !disabled,
				polling_interval: interval,
				bank_senders: senders,
			};

			service.configure_account(&request, OffsetDateTime::now_utc()).await?;

			println!("Stored mailbox configuration for user {user}.");

			Ok(())
		},
	}
}

async fn run_schedule_loop(service: AutomationService) -> color_eyre::Result<()> {
	let cycle = std::time::Duration::from_secs(service.cfg.scheduler.cycle_seconds);

	loop {
		match service.run_schedule_cycle(OffsetDateTime::now_utc()).await {
			Ok(report) => {
				tracing::info!(
					scheduled = report.scheduled,
					skipped = report.skipped,
					"Schedule cycle complete.",
				);
			},
			Err(err) => {
				tracing::error!(error = %err, "Schedule cycle failed.");
			},
		}

		tokio::time::sleep(cycle).await;
	}
}
