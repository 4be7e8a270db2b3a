use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = branchbook_api::Args::parse();

	branchbook_api::run(args).await
}
