mod challenge;
mod config;
mod detection;
mod http;
mod logging;
mod models;
mod tracker;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::challenge::store::ChallengeStore;
use crate::config::settings::Settings;
use crate::detection::signal_evaluator::SignalEvaluator;
use crate::http::server::BotDetectionServer;
use crate::tracker::visit_tracker::VisitTracker;

/// Initialise the `tracing` subscriber for internal diagnostics. The six
/// contractual `[tag]` JSON-line events (spec §6.3) go through
/// [`crate::logging`] directly to stdout and are independent of this.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},sentrygate=debug", level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_writer(std::io::stdout).with_target(true))
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ---------------------------------------------------------------
    // 1. Configuration
    // ---------------------------------------------------------------
    let settings = Settings::load_default()?;
    let settings = Arc::new(settings);

    // ---------------------------------------------------------------
    // 2. Logging
    // ---------------------------------------------------------------
    init_tracing(&settings.logging.level);
    info!("Starting sentrygate bot-detection engine");

    // ---------------------------------------------------------------
    // 3. Core services
    // ---------------------------------------------------------------
    let tracker = VisitTracker::new(
        settings.tracker.session_deadline_ms,
        settings.tracker.session_ttl_secs,
    );
    let challenges = Arc::new(ChallengeStore::new(&settings.challenge));
    let signal_evaluator = Arc::new(SignalEvaluator::new());

    info!(
        deadline_ms = settings.tracker.session_deadline_ms,
        challenge_ttl_secs = settings.challenge.ttl_secs,
        "detection services initialised"
    );

    // ---------------------------------------------------------------
    // 4. HTTP surface
    // ---------------------------------------------------------------
    // `PORT` wins over the config file's `server.port` per spec §6.4.
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(settings.server.port);
    let bind_addr = SocketAddr::from(([0, 0, 0, 0], port));

    let server = BotDetectionServer::new(
        settings.clone(),
        tracker,
        challenges,
        signal_evaluator,
        bind_addr,
    );

    info!("Serving static assets from {}", settings.server.static_dir);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.run().await {
            error!("HTTP server error: {}", e);
        }
    });

    // ---------------------------------------------------------------
    // 5. Wait for shutdown signal
    // ---------------------------------------------------------------
    tokio::signal::ctrl_c().await?;
    info!("Shutting down sentrygate...");

    server_handle.abort();

    info!("sentrygate shut down gracefully");
    Ok(())
}
