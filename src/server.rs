//! HTTP surface: application state, router, and route handlers.
//!
//! Handlers are thin consumers of the fetchers: look up the beach, call the
//! fetcher, wrap the record in the response envelope. All failure mapping
//! lives in [`AppError`]'s `IntoResponse`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::beaches::{self, BEACHES, Beach};
use crate::error::AppError;
use crate::sources::{TideService, WaterQualityService, WeatherService};
use crate::types::{ApiResponse, TideData, WaterQualityStatus, WeatherForecast};

/// Shared application state: one instance of each fetcher.
#[derive(Clone)]
pub struct AppState {
    tides: Arc<TideService>,
    weather: Arc<WeatherService>,
    water_quality: Arc<WaterQualityService>,
}

impl AppState {
    #[must_use]
    pub fn new(
        tides: Arc<TideService>,
        weather: Arc<WeatherService>,
        water_quality: Arc<WaterQualityService>,
    ) -> Self {
        Self {
            tides,
            weather,
            water_quality,
        }
    }
}

/// Build the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/beaches", get(list_beaches))
        .route("/api/tides/:beach_id", get(tides))
        .route("/api/weather/:beach_id", get(weather))
        .route("/api/water-quality/:beach_id", get(water_quality))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the API until a shutdown signal arrives.
pub async fn run_server(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::warn!(%error, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => tracing::warn!(%error, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: DateTime<Utc>,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    })
}

async fn list_beaches() -> Json<ApiResponse<Vec<Beach>>> {
    Json(ApiResponse::success(BEACHES.to_vec(), false, None))
}

fn lookup_beach(beach_id: &str) -> Result<&'static Beach, AppError> {
    beaches::find(beach_id).ok_or_else(|| AppError::NotFound(beach_id.to_owned()))
}

async fn tides(
    State(state): State<AppState>,
    Path(beach_id): Path<String>,
) -> Result<Json<ApiResponse<TideData>>, AppError> {
    let beach = lookup_beach(&beach_id)?;
    let Some(station_id) = beach.tide_station_id else {
        // Lakes have no station; this is a successful empty answer, not an
        // error.
        return Ok(Json(ApiResponse::success(
            TideData::not_applicable(beach.id),
            false,
            None,
        )));
    };
    let data = state.tides.predictions(beach, station_id).await?;
    let fetched_at = data.fetched_at;
    Ok(Json(ApiResponse::success(data, true, Some(fetched_at))))
}

async fn weather(
    State(state): State<AppState>,
    Path(beach_id): Path<String>,
) -> Result<Json<ApiResponse<WeatherForecast>>, AppError> {
    let beach = lookup_beach(&beach_id)?;
    let forecast = state.weather.forecast(beach).await?;
    let fetched_at = forecast.fetched_at;
    Ok(Json(ApiResponse::success(forecast, true, Some(fetched_at))))
}

async fn water_quality(
    State(state): State<AppState>,
    Path(beach_id): Path<String>,
) -> Result<Json<ApiResponse<WaterQualityStatus>>, AppError> {
    let beach = lookup_beach(&beach_id)?;
    let status = state.water_quality.status(beach).await?;
    let fetched_at = status.fetched_at;
    Ok(Json(ApiResponse::success(status, true, Some(fetched_at))))
}
