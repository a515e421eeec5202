//! Tide predictions from the IWLS station API.
//!
//! The only rate-limited upstream: the fetch closure holds an `"iwls"`
//! permit for the duration of the network call, and the permit's `Drop`
//! releases the slot whether the call succeeds or fails.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use crate::beaches::Beach;
use crate::cache::{Cache, CacheStats, DEFAULT_CAPACITY};
use crate::error::AppError;
use crate::limiter::RateLimiter;
use crate::types::{TideData, TideKind, TidePrediction};

const IWLS_BASE_URL: &str = "https://api-iwls.dfo-mpo.gc.ca/api/v1";

/// Tide predictions change slowly; an hour of staleness is acceptable.
const TIDE_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Rate-limiter resource name for the station API.
pub const IWLS_RESOURCE: &str = "iwls";

/// How far ahead to ask the station for high/low events.
const FORECAST_WINDOW_HOURS: i64 = 48;

/// Events returned per beach.
const MAX_PREDICTIONS: usize = 6;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IwlsEvent {
    event_date: String,
    value: f64,
    event_type: String,
}

/// Cached, rate-limited access to station tide predictions.
pub struct TideService {
    http: reqwest::Client,
    cache: Cache<TideData>,
    limiter: Arc<RateLimiter>,
}

impl TideService {
    #[must_use]
    pub fn new(http: reqwest::Client, limiter: Arc<RateLimiter>) -> Self {
        Self {
            http,
            cache: Cache::new(DEFAULT_CAPACITY),
            limiter,
        }
    }

    /// Predictions for `beach`'s station, from cache when fresh.
    pub async fn predictions(
        &self,
        beach: &Beach,
        station_id: &str,
    ) -> Result<TideData, AppError> {
        let key = format!("tides:{station_id}");
        let http = self.http.clone();
        let limiter = Arc::clone(&self.limiter);
        let station_id = station_id.to_owned();
        let beach_id = beach.id.to_owned();
        let beach_name = beach.name.to_owned();
        self.cache
            .get_or_fetch(&key, TIDE_CACHE_TTL, move || async move {
                let _slot = limiter.acquire_slot(IWLS_RESOURCE).await;
                fetch_predictions(&http, &station_id, &beach_id, &beach_name).await
            })
            .await
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

async fn fetch_predictions(
    http: &reqwest::Client,
    station_id: &str,
    beach_id: &str,
    beach_name: &str,
) -> Result<TideData, AppError> {
    let from = Utc::now();
    let to = from + chrono::Duration::hours(FORECAST_WINDOW_HOURS);
    let url = format!(
        "{IWLS_BASE_URL}/stations/{station_id}/data?time-series-code=wlp-hilo&from={}&to={}",
        from.format("%Y-%m-%dT%H:%M:%SZ"),
        to.format("%Y-%m-%dT%H:%M:%SZ"),
    );
    debug!(station = %station_id, "fetching tide predictions");

    let response = http.get(&url).send().await?;
    if !response.status().is_success() {
        return Err(AppError::Api(format!(
            "tide station API returned {}",
            response.status()
        )));
    }
    let events: Vec<IwlsEvent> = response.json().await?;

    let predictions = events
        .iter()
        .take(MAX_PREDICTIONS)
        .map(|event| TidePrediction {
            time: event.event_date.clone(),
            height: (event.value * 100.0).round() / 100.0,
            kind: if event.event_type.to_lowercase().contains("high") {
                TideKind::High
            } else {
                TideKind::Low
            },
        })
        .collect();

    Ok(TideData {
        beach_id: beach_id.to_owned(),
        station_id: station_id.to_owned(),
        station_name: format!("{beach_name} (Vancouver)"),
        predictions,
        fetched_at: Utc::now(),
    })
}
