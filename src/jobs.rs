//! Scheduled cache-warming jobs.
//!
//! The jobs call the same fetchers the request handlers use, so user-facing
//! requests observe a warm cache. A failure for one beach never aborts the
//! rest of the sweep; it is logged and the sweep continues. A run with any
//! failures reports an error so the scheduler logs the run as failed, but
//! nothing propagates beyond that log line.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::beaches::{BEACHES, Beach};
use crate::error::AppError;
use crate::scheduler::{JobHandler, Scheduler};
use crate::sources::{WaterQualityService, WeatherService};

/// Weather moves fast enough to warrant a half-hourly sweep.
pub const WEATHER_REFRESH_PERIOD: Duration = Duration::from_secs(30 * 60);

/// Water-quality samples change at most daily.
pub const WATER_QUALITY_REFRESH_PERIOD: Duration = Duration::from_secs(6 * 3600);

/// Register the standard refresh jobs. Call before `scheduler.start()`.
pub fn setup_refresh_jobs(
    scheduler: &Scheduler,
    weather: Arc<WeatherService>,
    water_quality: Arc<WaterQualityService>,
) {
    scheduler.schedule_job(
        "weather-refresh",
        WEATHER_REFRESH_PERIOD,
        Arc::new(WeatherRefreshJob { weather }),
    );
    scheduler.schedule_job(
        "water-quality-refresh",
        WATER_QUALITY_REFRESH_PERIOD,
        Arc::new(WaterQualityRefreshJob { water_quality }),
    );
}

struct WeatherRefreshJob {
    weather: Arc<WeatherService>,
}

#[async_trait]
impl JobHandler for WeatherRefreshJob {
    async fn run(&self) -> Result<(), AppError> {
        let failures = refresh_each("weather-refresh", BEACHES, |beach| {
            let weather = Arc::clone(&self.weather);
            async move { weather.forecast(beach).await.map(|_| ()) }
        })
        .await;
        sweep_result("weather", failures)
    }
}

struct WaterQualityRefreshJob {
    water_quality: Arc<WaterQualityService>,
}

#[async_trait]
impl JobHandler for WaterQualityRefreshJob {
    async fn run(&self) -> Result<(), AppError> {
        let failures = refresh_each("water-quality-refresh", BEACHES, |beach| {
            let water_quality = Arc::clone(&self.water_quality);
            async move { water_quality.status(beach).await.map(|_| ()) }
        })
        .await;
        sweep_result("water quality", failures)
    }
}

/// Run `refresh` for every beach with per-item isolation: a failure is
/// logged and the remaining beaches are still attempted. Returns the number
/// of failures.
async fn refresh_each<F, Fut>(job: &str, beaches: &'static [Beach], mut refresh: F) -> usize
where
    F: FnMut(&'static Beach) -> Fut,
    Fut: Future<Output = Result<(), AppError>>,
{
    let mut failures = 0;
    for beach in beaches {
        if let Err(error) = refresh(beach).await {
            warn!(job = %job, beach = %beach.id, %error, "refresh failed, continuing");
            failures += 1;
        }
    }
    failures
}

fn sweep_result(what: &str, failures: usize) -> Result<(), AppError> {
    if failures > 0 {
        return Err(AppError::Api(format!(
            "{what} refresh failed for {failures} of {} beaches",
            BEACHES.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn failing_beach_does_not_abort_the_sweep() {
        let attempts = AtomicUsize::new(0);
        let failures = refresh_each("test-refresh", BEACHES, |beach| {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst);
            let beach_id = beach.id;
            async move {
                if attempt == 2 {
                    Err(AppError::Api(format!("synthetic failure for {beach_id}")))
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert_eq!(attempts.load(Ordering::SeqCst), BEACHES.len());
        assert_eq!(failures, 1);
    }

    #[tokio::test]
    async fn clean_sweep_reports_success() {
        let failures = refresh_each("test-refresh", BEACHES, |_| async { Ok(()) }).await;
        assert_eq!(failures, 0);
        assert!(sweep_result("test", failures).is_ok());
    }

    #[test]
    fn failed_sweep_reports_an_error_without_panicking() {
        let result = sweep_result("test", 3);
        assert!(matches!(result, Err(AppError::Api(_))));
    }
}
