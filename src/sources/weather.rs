//! Weather forecasts from Open-Meteo.

use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use crate::beaches::Beach;
use crate::cache::{Cache, CacheStats, DEFAULT_CAPACITY};
use crate::error::AppError;
use crate::types::{CurrentConditions, HourlyForecast, WeatherCondition, WeatherForecast};

const OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";

const WEATHER_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

const FORECAST_HOURS: usize = 24;

const COMPASS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    current: CurrentPayload,
    hourly: HourlyPayload,
}

#[derive(Debug, Deserialize)]
struct CurrentPayload {
    temperature_2m: f64,
    weather_code: u16,
    relative_humidity_2m: f64,
    wind_speed_10m: f64,
    wind_direction_10m: f64,
    uv_index: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct HourlyPayload {
    time: Vec<String>,
    temperature_2m: Vec<f64>,
    weather_code: Vec<u16>,
    precipitation_probability: Vec<Option<f64>>,
}

/// Cached access to per-beach forecasts.
pub struct WeatherService {
    http: reqwest::Client,
    cache: Cache<WeatherForecast>,
}

impl WeatherService {
    #[must_use]
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            cache: Cache::new(DEFAULT_CAPACITY),
        }
    }

    /// Forecast for `beach`, from cache when fresh.
    pub async fn forecast(&self, beach: &Beach) -> Result<WeatherForecast, AppError> {
        let key = format!("weather:{}", beach.id);
        let http = self.http.clone();
        let beach_id = beach.id.to_owned();
        let location = beach.location;
        self.cache
            .get_or_fetch(&key, WEATHER_CACHE_TTL, move || async move {
                fetch_forecast(&http, &beach_id, location.latitude, location.longitude).await
            })
            .await
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

async fn fetch_forecast(
    http: &reqwest::Client,
    beach_id: &str,
    latitude: f64,
    longitude: f64,
) -> Result<WeatherForecast, AppError> {
    let url = format!(
        "{OPEN_METEO_URL}?latitude={latitude}&longitude={longitude}\
         &current=temperature_2m,weather_code,relative_humidity_2m,wind_speed_10m,wind_direction_10m,uv_index\
         &hourly=temperature_2m,weather_code,precipitation_probability\
         &timezone=America/Vancouver&forecast_hours={FORECAST_HOURS}"
    );
    debug!(beach = %beach_id, "fetching weather forecast");

    let response = http.get(&url).send().await?;
    if !response.status().is_success() {
        return Err(AppError::Api(format!(
            "weather API returned {}",
            response.status()
        )));
    }
    let payload: OpenMeteoResponse = response.json().await?;

    let hourly = payload
        .hourly
        .time
        .iter()
        .take(FORECAST_HOURS)
        .enumerate()
        .map(|(i, time)| HourlyForecast {
            time: time.clone(),
            temperature: round_tenth(
                payload.hourly.temperature_2m.get(i).copied().unwrap_or(0.0),
            ),
            condition: condition_from_code(
                payload.hourly.weather_code.get(i).copied().unwrap_or(0),
            ),
            precipitation_probability: payload
                .hourly
                .precipitation_probability
                .get(i)
                .copied()
                .flatten()
                .unwrap_or(0.0),
        })
        .collect();

    Ok(WeatherForecast {
        beach_id: beach_id.to_owned(),
        current: CurrentConditions {
            temperature: round_tenth(payload.current.temperature_2m),
            condition: condition_from_code(payload.current.weather_code),
            humidity: payload.current.relative_humidity_2m,
            wind_speed: payload.current.wind_speed_10m.round(),
            wind_direction: compass_direction(payload.current.wind_direction_10m).to_owned(),
            uv_index: payload.current.uv_index.unwrap_or(0.0),
        },
        hourly,
        fetched_at: Utc::now(),
    })
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// WMO weather-code buckets.
fn condition_from_code(code: u16) -> WeatherCondition {
    match code {
        0..=1 => WeatherCondition::Sunny,
        2..=3 => WeatherCondition::PartlyCloudy,
        4..=48 => WeatherCondition::Cloudy,
        49..=67 => WeatherCondition::Rainy,
        68..=77 => WeatherCondition::Foggy,
        _ => WeatherCondition::Stormy,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn compass_direction(degrees: f64) -> &'static str {
    let index = ((degrees / 45.0).round() as usize) % COMPASS.len();
    COMPASS.get(index).copied().unwrap_or("N")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weather_codes_bucket_into_conditions() {
        assert_eq!(condition_from_code(0), WeatherCondition::Sunny);
        assert_eq!(condition_from_code(2), WeatherCondition::PartlyCloudy);
        assert_eq!(condition_from_code(45), WeatherCondition::Cloudy);
        assert_eq!(condition_from_code(61), WeatherCondition::Rainy);
        assert_eq!(condition_from_code(71), WeatherCondition::Foggy);
        assert_eq!(condition_from_code(95), WeatherCondition::Stormy);
    }

    #[test]
    fn wind_degrees_map_to_eight_point_compass() {
        assert_eq!(compass_direction(0.0), "N");
        assert_eq!(compass_direction(44.0), "NE");
        assert_eq!(compass_direction(90.0), "E");
        assert_eq!(compass_direction(225.0), "SW");
        assert_eq!(compass_direction(359.0), "N");
    }

    #[test]
    fn temperatures_round_to_one_decimal() {
        assert!((round_tenth(18.37) - 18.4).abs() < f64::EPSILON);
        assert!((round_tenth(-0.04) - 0.0).abs() < f64::EPSILON);
    }
}
