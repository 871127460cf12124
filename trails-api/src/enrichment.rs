use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use trails_core::enrichment::{GeoPosition, TrafficEstimate, WeatherReport};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;
use crate::trips::load_trip;

/// Position of the coach, or "UNAVAILABLE" when the feed has nothing.
/// Enrichment lookups never fail the page they decorate.
#[derive(Debug, Serialize)]
struct PositionResponse {
    trip_id: Uuid,
    status: &'static str,
    position: Option<GeoPosition>,
}

#[derive(Debug, Serialize)]
struct ConditionsResponse {
    trip_id: Uuid,
    destination: String,
    weather: Option<WeatherReport>,
    traffic: Option<TrafficEstimate>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/trips/{id}/position", get(trip_position))
        .route("/v1/trips/{id}/conditions", get(trip_conditions))
}

/// GET /v1/trips/{id}/position — the tracking-map marker.
async fn trip_position(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PositionResponse>, AppError> {
    let trip = load_trip(&state, id).await?;

    let position = state.tracker.locate(trip.id, &trip.origin).await;
    let status = if position.is_some() { "LIVE" } else { "UNAVAILABLE" };

    Ok(Json(PositionResponse {
        trip_id: trip.id,
        status,
        position,
    }))
}

/// GET /v1/trips/{id}/conditions — destination weather plus a traffic
/// estimate; either may be absent.
async fn trip_conditions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ConditionsResponse>, AppError> {
    let trip = load_trip(&state, id).await?;

    let weather = state.weather.weather_for_city(&trip.destination).await;
    let traffic = state.tracker.traffic(trip.id).await;

    Ok(Json(ConditionsResponse {
        trip_id: trip.id,
        destination: trip.destination,
        weather,
        traffic,
    }))
}
