use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use trails_catalog::{Stop, Trip};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TripSearchQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: String,
}

#[derive(Debug, Serialize)]
pub struct TripResponse {
    pub id: Uuid,
    pub trip_number: String,
    pub origin: String,
    pub destination: String,
    pub departure: String,
    pub arrival: String,
    pub status: trails_catalog::TripStatus,
    pub category: trails_catalog::TripCategory,
    pub capacity: u32,
    pub fare: i64,
    pub currency: String,
    pub amenities: Vec<String>,
}

impl TripResponse {
    fn from_trip(trip: Trip, currency: &str) -> Self {
        Self {
            id: trip.id,
            trip_number: trip.trip_number,
            origin: trip.origin,
            destination: trip.destination,
            departure: trip.departure,
            arrival: trip.arrival,
            status: trip.status,
            category: trip.category,
            capacity: trip.capacity,
            fare: trip.fare.minor_units(),
            currency: currency.to_string(),
            amenities: trip.amenities,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub city: String,
}

impl StopResponse {
    fn from_stop(stop: Stop) -> Self {
        Self {
            id: stop.id,
            name: stop.name,
            location: stop.location,
            city: stop.city,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TripDetailResponse {
    #[serde(flatten)]
    pub trip: TripResponse,
    pub pickup_stops: Vec<StopResponse>,
    pub dropoff_stops: Vec<StopResponse>,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub trip_id: Uuid,
    pub travel_date: NaiveDate,
    pub capacity: u32,
    pub seat_map: Vec<String>,
    pub seats_taken: Vec<String>,
    pub seats_available: u32,
}

// ============================================================================
// Handlers
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/trips", get(search_trips))
        .route("/v1/trips/{id}", get(trip_detail))
        .route("/v1/trips/{id}/availability", get(trip_availability))
}

pub(crate) fn parse_travel_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::ValidationError(format!("Invalid travel date: {}", raw)))
}

pub(crate) async fn load_trip(state: &AppState, id: Uuid) -> Result<Trip, AppError> {
    state
        .trips
        .get_trip(id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError(format!("Trip not found: {}", id)))
}

/// GET /v1/trips?from=&to=
/// Without filters, the whole timetable (the landing page listing).
async fn search_trips(
    State(state): State<AppState>,
    Query(query): Query<TripSearchQuery>,
) -> Result<Json<Vec<TripResponse>>, AppError> {
    let trips = match (query.from, query.to) {
        (Some(from), Some(to)) => state
            .trips
            .find_trips(&from, &to)
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?,
        _ => state
            .trips
            .list_trips()
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?,
    };

    let currency = &state.business_rules.currency;
    Ok(Json(
        trips
            .into_iter()
            .map(|t| TripResponse::from_trip(t, currency))
            .collect(),
    ))
}

/// GET /v1/trips/{id}
/// Trip detail plus the boarding points for its endpoints.
async fn trip_detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TripDetailResponse>, AppError> {
    let trip = load_trip(&state, id).await?;

    let pickup_stops = state
        .stops
        .pickup_stops_for(&trip.origin)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    let dropoff_stops = state
        .stops
        .dropoff_stops_for(&trip.destination)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Json(TripDetailResponse {
        trip: TripResponse::from_trip(trip, &state.business_rules.currency),
        pickup_stops: pickup_stops.into_iter().map(StopResponse::from_stop).collect(),
        dropoff_stops: dropoff_stops.into_iter().map(StopResponse::from_stop).collect(),
    }))
}

/// GET /v1/trips/{id}/availability?date=
/// The seat map the visitor picks from: taken labels greyed out.
async fn trip_availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let trip = load_trip(&state, id).await?;
    let travel_date = parse_travel_date(&query.date)?;

    let seats_taken = state
        .ledger
        .booked_seat_labels(trip.id, travel_date)
        .await
        .map_err(AppError::from_ledger)?;
    let seats_available = state
        .ledger
        .available_seats(&trip, travel_date)
        .await
        .map_err(AppError::from_ledger)?;

    Ok(Json(AvailabilityResponse {
        trip_id: trip.id,
        travel_date,
        capacity: trip.capacity,
        seat_map: trip.seat_labels(),
        seats_taken: seats_taken.into_iter().collect(),
        seats_available,
    }))
}
