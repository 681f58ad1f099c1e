/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::process;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use posterbox::display::{DisplaySession, LogRenderer};
use posterbox::selector::{PosterSelector, StdRandom, DEFAULT_HISTORY_FRACTION};
use posterbox::sync::{HttpFetcher, SyncEngine};

// ── CLI argument definition ───────────────────────────────────────────────────

/// Poster Box display client.
///
/// Example:
///   posterbox-display --url http://posterbox.local:9931 --sync-interval-secs 15
#[derive(Debug, Parser)]
#[command(
    name = "posterbox-display",
    about = "Poster Box display client – cycles posters published by a Poster Box server",
    long_about = None,
)]
struct Cli {
    /// Base URL of the Poster Box server.
    #[arg(short = 'u', long = "url", default_value = "http://localhost:9931")]
    url: String,

    /// Seconds between catalog polls.
    #[arg(short = 'i', long = "sync-interval-secs", default_value_t = 15)]
    sync_interval_secs: u64,

    /// Duration of the slot-swap animation in milliseconds.
    #[arg(short = 't', long = "transition-ms", default_value_t = 1000)]
    transition_ms: u64,

    /// Fraction of the catalog kept out of rotation after being shown, in [0, 1).
    #[arg(long = "history-fraction", default_value_t = DEFAULT_HISTORY_FRACTION)]
    history_fraction: f64,

    /// Seed for poster selection (random if omitted).
    #[arg(long = "seed")]
    seed: Option<u64>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Poster Box display starting up...");

    let cli = Cli::parse();

    info!(
        url                = %cli.url,
        sync_interval_secs = cli.sync_interval_secs,
        transition_ms      = cli.transition_ms,
        history_fraction   = cli.history_fraction,
        seed               = ?cli.seed,
        "Configuration"
    );

    if cli.sync_interval_secs == 0 {
        error!("Sync interval must be positive");
        process::exit(1);
    }

    // ── Selector ──────────────────────────────────────────────────────────────
    let random = match cli.seed {
        Some(seed) => StdRandom::seeded(seed),
        None => StdRandom::from_entropy(),
    };
    let selector = match PosterSelector::new(random, cli.history_fraction) {
        Ok(selector) => selector,
        Err(e) => {
            error!("Invalid selector configuration: {e}");
            process::exit(1);
        }
    };

    // ── Sync engine ───────────────────────────────────────────────────────────
    let fetcher = match HttpFetcher::new(&cli.url) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            error!("Failed to set up catalog fetcher: {e:#}");
            process::exit(1);
        }
    };
    info!(url = fetcher.url(), "Polling catalog");

    let engine = SyncEngine::new(fetcher, Duration::from_secs(cli.sync_interval_secs));
    let session = DisplaySession::new(
        engine.subscribe(),
        selector,
        LogRenderer::new(&cli.url),
        Duration::from_millis(cli.transition_ms),
    );
    tokio::spawn(engine.run());

    // ── Display loop ──────────────────────────────────────────────────────────
    tokio::select! {
        result = session.run() => {
            if let Err(e) = result {
                error!("Display cycle stopped: {e}");
                process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
        }
    }
}
