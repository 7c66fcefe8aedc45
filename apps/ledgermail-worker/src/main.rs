// crates.io
use clap::Parser;
// self
use ledgermail_worker::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	ledgermail_worker::run(args).await
}
