//! Beachcast server binary.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use beachcast::jobs;
use beachcast::limiter::RateLimiter;
use beachcast::scheduler::Scheduler;
use beachcast::server::{AppState, run_server};
use beachcast::sources::{TideService, WaterQualityService, WeatherService};

/// Upstream requests are bounded so a hung upstream cannot hold a cache
/// key's in-flight slot or a rate-limiter permit indefinitely.
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let host = std::env::var("BEACHCAST_HOST").unwrap_or_else(|_| "0.0.0.0".to_owned());
    let port = std::env::var("BEACHCAST_PORT").unwrap_or_else(|_| "3000".to_owned());
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .context("invalid BEACHCAST_HOST/BEACHCAST_PORT")?;

    let http = reqwest::Client::builder()
        .timeout(UPSTREAM_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;

    let limiter = Arc::new(RateLimiter::new());
    let tides = Arc::new(TideService::new(http.clone(), Arc::clone(&limiter)));
    let weather = Arc::new(WeatherService::new(http));
    let water_quality = Arc::new(WaterQualityService::new());

    let scheduler = Scheduler::new();
    jobs::setup_refresh_jobs(&scheduler, Arc::clone(&weather), Arc::clone(&water_quality));
    scheduler.start();

    let state = AppState::new(tides, weather, water_quality);
    tracing::info!("starting beachcast server v{}", env!("CARGO_PKG_VERSION"));
    run_server(addr, state).await?;

    scheduler.stop();
    Ok(())
}
