/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use posterbox_server::config::{ServerConfig, DEFAULT_PLEX_SYNC_SECS};
use posterbox_server::plex::{CatalogSource, HttpPlexService};
use posterbox_server::publish::CatalogPublisher;
use posterbox_server::routes::{router, AppState};

const DEFAULT_PORT: u16 = 9931;

// ── CLI argument definition ───────────────────────────────────────────────────

/// Poster Box server.
///
/// Example:
///   posterbox-server posterbox.toml --port 9931
#[derive(Debug, Parser)]
#[command(
    name = "posterbox-server",
    about = "HTTP server for Poster Box displays",
    long_about = None,
)]
struct Cli {
    /// Path to the TOML server configuration file.
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Port for the HTTP server.
    #[arg(short = 'p', long = "port", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Force debug logging.
    #[arg(long = "debug", env = "POSTERBOX_DEBUG", hide = true)]
    debug: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Level is controlled by the RUST_LOG env-var unless --debug is given.
    let filter = if cli.debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Poster Box server starting up...");
    info!(config = %cli.config.display(), port = cli.port, "Configuration");

    if let Err(e) = run(cli).await {
        error!("{e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = ServerConfig::load_from_file(&cli.config)?;

    // ── Upstream ──────────────────────────────────────────────────────────────
    let (source, sync_interval) = match &config.plex {
        Some(plex) => {
            info!(
                host = %plex.host,
                libraries = ?plex.libraries,
                minimum_rating = plex.minimum_rating,
                sync_interval_secs = plex.sync_interval.as_secs(),
                "[Plex] Upstream configured"
            );
            let service: Arc<dyn CatalogSource> = Arc::new(HttpPlexService::new(plex.clone())?);
            (Some(service), plex.sync_interval)
        }
        None => {
            warn!("No plex section in configuration; /data.json will answer 425 Too Early");
            (
                None,
                std::time::Duration::from_secs(DEFAULT_PLEX_SYNC_SECS as u64),
            )
        }
    };

    // ── Publisher ─────────────────────────────────────────────────────────────
    let publisher = CatalogPublisher::new(config.render_settings, source.clone());
    let state = AppState {
        documents: publisher.subscribe(),
        source,
    };
    tokio::spawn(publisher.run(sync_interval));

    // ── HTTP server ───────────────────────────────────────────────────────────
    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("HTTP server failed")
}
