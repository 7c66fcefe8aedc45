// crates.io
use clap::Parser;
// self
use ledgermail_scheduler::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	ledgermail_scheduler::run(args).await
}
