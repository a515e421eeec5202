//! Domain records produced by the data fetchers and the JSON response envelope.
//!
//! Every record carries the `fetched_at` timestamp of the moment its upstream
//! response was received. Cached reads return the record unchanged, so the
//! boundary layer can always report true data age to the client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// High or low water event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TideKind {
    High,
    Low,
}

/// A single predicted tide event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TidePrediction {
    /// Event time as reported by the tide station (ISO 8601).
    pub time: String,
    /// Water level in metres, rounded to two decimals.
    pub height: f64,
    #[serde(rename = "type")]
    pub kind: TideKind,
}

/// Tide predictions for one beach's station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TideData {
    pub beach_id: String,
    pub station_id: String,
    pub station_name: String,
    pub predictions: Vec<TidePrediction>,
    pub fetched_at: DateTime<Utc>,
}

impl TideData {
    /// Record returned for beaches without a tide station (e.g. lakes).
    #[must_use]
    pub fn not_applicable(beach_id: &str) -> Self {
        Self {
            beach_id: beach_id.to_owned(),
            station_id: String::new(),
            station_name: "N/A".to_owned(),
            predictions: Vec::new(),
            fetched_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeatherCondition {
    Sunny,
    PartlyCloudy,
    Cloudy,
    Rainy,
    Stormy,
    Foggy,
}

/// Conditions at the time of the fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentConditions {
    /// Degrees Celsius, rounded to one decimal.
    pub temperature: f64,
    pub condition: WeatherCondition,
    /// Relative humidity, percent.
    pub humidity: f64,
    /// Wind speed in km/h, rounded to the nearest integer.
    pub wind_speed: f64,
    /// Eight-point compass direction.
    pub wind_direction: String,
    pub uv_index: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyForecast {
    pub time: String,
    pub temperature: f64,
    pub condition: WeatherCondition,
    /// Percent chance of precipitation.
    pub precipitation_probability: f64,
}

/// Current conditions plus the next 24 hours for one beach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherForecast {
    pub beach_id: String,
    pub current: CurrentConditions,
    pub hourly: Vec<HourlyForecast>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaterQualityLevel {
    Good,
    Advisory,
    Closed,
    Unknown,
    OffSeason,
}

/// Water-quality monitoring status for one beach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterQualityStatus {
    pub beach_id: String,
    pub level: WaterQualityLevel,
    /// E. coli count per 100 ml, when a sample is available.
    pub ecoli_count: Option<u32>,
    pub advisory_reason: Option<String>,
    pub sample_date: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
}

/// Uniform JSON envelope for every API response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub cached: bool,
    pub cached_at: Option<DateTime<Utc>>,
}

impl<T> ApiResponse<T> {
    #[must_use]
    pub fn success(data: T, cached: bool, cached_at: Option<DateTime<Utc>>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            cached,
            cached_at,
        }
    }

    #[must_use]
    pub fn failure(error: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            cached: false,
            cached_at: None,
        }
    }
}
