//! Weather responder link
//!
//! Polls the OpenWeatherMap current-weather endpoint while connected and
//! publishes every scalar member of the `main` object as a typed node.
//!
//! Usage:
//!   weatherlink --app-id <KEY> --http-port 4080
//!
//! The node tree is served over a local HTTP API; the link counts as
//! connected once that listener is bound and disconnects on Ctrl-C.

use std::{path::PathBuf, sync::Arc};
use anyhow::{Context, Result};
use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;
use weatherlink_link::{Link, LinkConfig, build_router};

#[derive(Parser, Debug)]
#[command(name = "weatherlink")]
#[command(about = "Weather responder link")]
struct Args {
    /// Path to a JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// URL of the weather document
    #[arg(long)]
    url: Option<String>,

    /// OpenWeatherMap API key
    #[arg(long, env = "OPENWEATHER_APPID")]
    app_id: Option<String>,

    /// Poll interval in seconds
    #[arg(long)]
    poll_interval: Option<u64>,

    /// HTTP API port
    #[arg(long)]
    http_port: Option<u16>,

    /// Name the link reports itself under
    #[arg(long)]
    name: Option<String>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn apply(self, config: &mut LinkConfig) {
        if let Some(url) = self.url {
            config.source.url = url;
        }
        if let Some(app_id) = self.app_id {
            config.source.app_id = Some(app_id);
        }
        if let Some(secs) = self.poll_interval {
            config.source.poll_interval_secs = secs;
        }
        if let Some(port) = self.http_port {
            config.http_port = port;
        }
        if let Some(name) = self.name {
            config.name = name;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let mut config = LinkConfig::load_or_default(args.config.as_deref())?;
    args.apply(&mut config);
    if config.source.app_id.is_none() {
        info!("No API key configured; requests go out without APPID");
    }

    let link = Arc::new(Link::from_config(&config).context("Invalid configuration")?);
    link.initialize().await.context("Failed to register static nodes")?;

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.http_port))
        .await
        .with_context(|| format!("Failed to bind HTTP port {}", config.http_port))?;
    info!("HTTP API listening on port {}", config.http_port);

    println!("\n========================================");
    println!("  {} v{}", config.name, env!("CARGO_PKG_VERSION"));
    println!("========================================");
    println!("  HTTP Port: {}", config.http_port);
    println!("  Interval:  {}s", config.source.poll_interval_secs);
    println!("========================================\n");

    link.connected();
    axum::serve(listener, build_router(link.clone()))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("HTTP server failed")?;
    link.disconnected();

    Ok(())
}
