use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = sm_api::Args::parse();

	sm_api::run(args).await
}
