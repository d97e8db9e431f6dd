use std::{
	net::{Ipv6Addr, SocketAddr},
	path::PathBuf,
	sync::Arc,
};

use anyhow::Context;
use clap::Parser;
use tn_core::{router, Config, ThumbnailService};
use tn_fetcher::HttpFetcher;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod utils;

const DEFAULT_LOG_FILTER: &str = "info,tn_core=debug,tn_fonts=debug";

#[derive(Parser, Debug)]
#[command(name = "tn-server")]
#[command(about = "Serves share thumbnails for assistants and models", long_about = None)]
struct Cli {
	/// JSON configuration file, defaults are used without one
	#[arg(long, env = "CONFIG_PATH")]
	config: Option<PathBuf>,
	#[arg(long, env = "PORT", default_value_t = 8080)]
	port: u16,
	/// Fills the font cache, assistants file and avatars directory when the config leaves them
	/// unset
	#[arg(long, env = "DATA_DIR")]
	data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
		)
		.init();

	let cli = Cli::parse();

	let mut config = match &cli.config {
		Some(path) => Config::load(path)
			.await
			.with_context(|| format!("loading config from {}", path.display()))?,
		None => Config::default(),
	};
	if let Some(data_dir) = &cli.data_dir {
		config = config.with_data_dir(data_dir);
	}

	let fetcher = HttpFetcher::new(config.fetcher()).context("building the http client")?;
	let service = ThumbnailService::initialize(&config, Arc::new(fetcher))
		.await
		.context("initializing the thumbnail service")?;

	info!(
		models = service.models().len(),
		font_cache = %service.font_cache().persistent().directory().display(),
		"Thumbnail service ready"
	);

	let app = router(Arc::new(service));

	// Listens on IPv6 and IPv4
	let addr = SocketAddr::from((Ipv6Addr::UNSPECIFIED, cli.port));
	let listener = TcpListener::bind(addr)
		.await
		.with_context(|| format!("binding {addr}"))?;

	info!("Listening on http://localhost:{}", cli.port);

	axum::serve(listener, app)
		.with_graceful_shutdown(utils::shutdown_signal())
		.await
		.context("serving http")?;

	info!("Shut down gracefully");

	Ok(())
}
