//! Upstream data fetchers.
//!
//! Each fetcher wraps one integration behind `Cache::get_or_fetch` with its
//! own cache key scheme and TTL. Upstream payload mapping happens inside the
//! fetch closure, which stamps `fetched_at` at the moment of the successful
//! network response. Failures surface as [`AppError::Api`] and are never
//! retried here; retry is the next scheduler tick or the caller's next
//! request.
//!
//! [`AppError::Api`]: crate::error::AppError::Api

pub mod tides;
pub mod water_quality;
pub mod weather;

pub use tides::TideService;
pub use water_quality::WaterQualityService;
pub use weather::WeatherService;
