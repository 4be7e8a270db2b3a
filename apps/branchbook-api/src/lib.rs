pub mod auth;
pub mod purge;
pub mod routes;
pub mod state;

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use clap::Parser;
use color_eyre::eyre;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use branchbook_storage::db::Db;

use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(
	version = branchbook_cli::VERSION,
	rename_all = "kebab",
	styles = branchbook_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = branchbook_config::load(&args.config)?;

	init_tracing(&config)?;

	let http_addr: SocketAddr = config.service.http_bind.parse()?;

	let db = Db::connect(&config.storage.postgres).await?;

	db.ensure_schema().await?;

	let purge_interval = Duration::from_secs(config.cache.purge_interval_secs);

	tokio::spawn(purge::run_cache_purge(db.pool.clone(), purge_interval));

	let state = AppState::new(config, &db);
	let app = routes::router(state);
	let http_listener = TcpListener::bind(http_addr).await?;

	tracing::info!(%http_addr, "HTTP server listening.");

	axum::serve(http_listener, app).await?;

	Ok(())
}

fn init_tracing(config: &branchbook_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).try_init().map_err(|err| eyre::eyre!(err))?;

	Ok(())
}
