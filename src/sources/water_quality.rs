//! Water-quality status per beach.
//!
//! Monitoring runs May through September. Outside that season the fetcher
//! short-circuits before any network or sampling work and returns an
//! off-season record. In-season data is synthesized until the municipal
//! feed is wired up, using the same weighted draw as the original service.

use std::time::Duration;

use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::beaches::Beach;
use crate::cache::{Cache, CacheStats, DEFAULT_CAPACITY};
use crate::error::AppError;
use crate::types::{WaterQualityLevel, WaterQualityStatus};

/// Samples are taken at most daily; six hours of staleness is fine.
const WATER_QUALITY_CACHE_TTL: Duration = Duration::from_secs(6 * 3600);

/// Weighted draw favouring good readings, as observed historically.
const LEVEL_POOL: [WaterQualityLevel; 5] = [
    WaterQualityLevel::Good,
    WaterQualityLevel::Good,
    WaterQualityLevel::Good,
    WaterQualityLevel::Advisory,
    WaterQualityLevel::Good,
];

/// Cached water-quality lookups with off-season short-circuiting.
pub struct WaterQualityService {
    cache: Cache<WaterQualityStatus>,
}

impl Default for WaterQualityService {
    fn default() -> Self {
        Self::new()
    }
}

impl WaterQualityService {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Cache::new(DEFAULT_CAPACITY),
        }
    }

    /// Status for `beach`, from cache when fresh.
    pub async fn status(&self, beach: &Beach) -> Result<WaterQualityStatus, AppError> {
        let key = format!("waterquality:{}", beach.id);
        let beach_id = beach.id.to_owned();
        self.cache
            .get_or_fetch(&key, WATER_QUALITY_CACHE_TTL, move || async move {
                debug!(beach = %beach_id, "sampling water quality");
                Ok(sample_status(&beach_id, Utc::now()))
            })
            .await
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

/// October through April: no monitoring anywhere in the region.
fn is_off_season(month: u32) -> bool {
    !(5..=9).contains(&month)
}

fn sample_status(beach_id: &str, now: DateTime<Utc>) -> WaterQualityStatus {
    if is_off_season(now.month()) {
        return WaterQualityStatus {
            beach_id: beach_id.to_owned(),
            level: WaterQualityLevel::OffSeason,
            ecoli_count: None,
            advisory_reason: None,
            sample_date: None,
            fetched_at: now,
        };
    }

    let mut rng = rand::thread_rng();
    let level = LEVEL_POOL
        .choose(&mut rng)
        .copied()
        .unwrap_or(WaterQualityLevel::Good);
    let ecoli_count = match level {
        WaterQualityLevel::Advisory => rng.gen_range(200..500),
        _ => rng.gen_range(0..100),
    };
    let advisory_reason = matches!(level, WaterQualityLevel::Advisory)
        .then(|| "Elevated E.coli levels detected".to_owned());
    let sample_date = now - chrono::Duration::days(rng.gen_range(0..7));

    WaterQualityStatus {
        beach_id: beach_id.to_owned(),
        level,
        ecoli_count: Some(ecoli_count),
        advisory_reason,
        sample_date: Some(sample_date),
        fetched_at: now,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn october_through_april_is_off_season() {
        for month in [10, 11, 12, 1, 2, 3, 4] {
            assert!(is_off_season(month), "month {month} should be off-season");
        }
        for month in 5..=9 {
            assert!(!is_off_season(month), "month {month} should be in season");
        }
    }

    #[test]
    fn off_season_status_skips_sampling() {
        let january = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).single();
        let january = january.unwrap_or_else(Utc::now);
        let status = sample_status("english-bay", january);
        assert_eq!(status.level, WaterQualityLevel::OffSeason);
        assert!(status.ecoli_count.is_none());
        assert!(status.sample_date.is_none());
        assert_eq!(status.fetched_at, january);
    }

    #[test]
    fn in_season_status_carries_a_sample() {
        let july = Utc.with_ymd_and_hms(2026, 7, 15, 12, 0, 0).single();
        let july = july.unwrap_or_else(Utc::now);
        let status = sample_status("kitsilano-beach", july);
        assert_ne!(status.level, WaterQualityLevel::OffSeason);
        assert!(status.ecoli_count.is_some());
        assert!(status.sample_date.is_some());
        if status.level == WaterQualityLevel::Advisory {
            assert!(status.advisory_reason.is_some());
        }
    }
}
