//! Beachcast
//!
//! A beach-conditions API server for a fixed set of Vancouver beaches,
//! built around a data-freshness and request-coordination core:
//!
//! - **TTL cache** with LRU eviction, hit/miss accounting, and single-flight
//!   request coalescing (N concurrent misses for one key trigger exactly one
//!   upstream fetch)
//! - **Token-bucket rate limiter** with a FIFO wait queue gating the
//!   rate-limited tide-station upstream
//! - **Scheduler** running named recurring jobs that pre-warm the cache for
//!   every known beach
//! - **Fetchers** for tide predictions, weather forecasts, and water-quality
//!   status, each with its own cache key scheme and TTL
//!
//! # Data flow
//!
//! ```text
//! Request → Fetcher → Cache (hit? return)
//!                      ↓ miss
//!                     In-flight registry (coalesce concurrent callers)
//!                      ↓ single fetch
//!                     [Rate limiter slot] → Upstream API → store + return
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use beachcast::limiter::RateLimiter;
//! use beachcast::sources::TideService;
//! use beachcast::beaches;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let http = reqwest::Client::new();
//!     let limiter = Arc::new(RateLimiter::new());
//!     let tides = TideService::new(http, limiter);
//!
//!     let beach = beaches::find("english-bay").ok_or_else(|| anyhow::anyhow!("unknown"))?;
//!     let data = tides.predictions(beach, "7735").await?;
//!     tracing::info!(predictions = data.predictions.len(), "fetched tides");
//!     Ok(())
//! }
//! ```

pub mod beaches;
pub mod cache;
pub mod error;
pub mod jobs;
pub mod limiter;
pub mod scheduler;
pub mod server;
pub mod sources;
pub mod types;

pub use beaches::{BEACHES, Beach, Location};
pub use cache::{Cache, CacheStats};
pub use error::AppError;
pub use limiter::{RateLimitConfig, RateLimitPermit, RateLimiter};
pub use scheduler::{JobHandler, Scheduler};
pub use server::{AppState, create_router, run_server};
pub use sources::{TideService, WaterQualityService, WeatherService};
pub use types::{
    ApiResponse, TideData, TidePrediction, WaterQualityLevel, WaterQualityStatus, WeatherCondition,
    WeatherForecast,
};

// Re-export async_trait for custom JobHandler implementations.
pub use async_trait::async_trait;
