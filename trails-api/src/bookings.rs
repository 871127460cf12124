use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use trails_draft::DraftStep;
use trails_ledger::{LedgerError, Reservation, ReservationStatus};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::auth::TravellerClaims;
use crate::state::AppState;
use crate::trips::load_trip;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct CommitBookingRequest {
    payment_method: String,
}

#[derive(Debug, Serialize)]
struct ReservationResponse {
    reservation_id: Uuid,
    trip_id: Uuid,
    travel_date: NaiveDate,
    booked_at: DateTime<Utc>,
    seats: Vec<String>,
    total_fare: i64,
    currency: String,
    status: ReservationStatus,
    pickup_stop: Option<String>,
    dropoff_stop: Option<String>,
    payment_method: Option<String>,
}

impl ReservationResponse {
    fn from_reservation(reservation: Reservation, currency: &str) -> Self {
        Self {
            reservation_id: reservation.id,
            trip_id: reservation.trip_id,
            travel_date: reservation.travel_date,
            booked_at: reservation.booked_at,
            seats: reservation.seats,
            total_fare: reservation.total_fare.minor_units(),
            currency: currency.to_string(),
            status: reservation.status,
            pickup_stop: reservation.pickup_stop,
            dropoff_stop: reservation.dropoff_stop,
            payment_method: reservation.payment_method,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(commit_booking).get(list_bookings))
        .route("/v1/bookings/{id}/cancel", post(cancel_booking))
}

/// POST /v1/bookings
/// Turn the visitor's Priced draft into a Confirmed reservation.
async fn commit_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<TravellerClaims>,
    Json(req): Json<CommitBookingRequest>,
) -> Result<Json<ReservationResponse>, AppError> {
    let account_id = claims
        .account_id()
        .map_err(|_| AppError::AuthenticationError("Invalid token subject".to_string()))?;

    // 1. The draft must have been priced; anything earlier goes back to the
    //    wizard.
    let mut draft = state
        .sessions
        .load(&claims.sub)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::ValidationError("Booking information not found".to_string()))?;

    if draft.step() != DraftStep::Priced {
        return Err(AppError::ValidationError(format!(
            "Booking is not ready to confirm, resume at {:?}",
            draft.resume_step()
        )));
    }

    let (Some(trip_id), Some(search)) = (draft.trip_id, draft.search.clone()) else {
        return Err(AppError::ValidationError("Booking information not found".to_string()));
    };

    // 2. Commit against the ledger.
    let trip = load_trip(&state, trip_id).await?;
    let result = state
        .ledger
        .commit(
            account_id,
            &trip,
            search.travel_date,
            draft.seats.clone(),
            draft.pickup_stop.clone(),
            draft.dropoff_stop.clone(),
            Some(req.payment_method),
        )
        .await;

    let reservation = match result {
        Ok(reservation) => reservation,
        Err(err @ LedgerError::CapacityExceeded { .. }) => {
            // Someone else won the race for these seats: force reselection.
            draft.rewind_to_seats();
            let _ = state.sessions.save(&claims.sub, &draft).await;
            return Err(AppError::from_ledger(err));
        }
        Err(err) => return Err(AppError::from_ledger(err)),
    };

    // 3. The draft is finished business.
    draft.mark_committed().map_err(AppError::from_draft)?;
    state
        .sessions
        .clear(&claims.sub)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    info!("Booking confirmed: {}", reservation.id);

    Ok(Json(ReservationResponse::from_reservation(
        reservation,
        &state.business_rules.currency,
    )))
}

/// POST /v1/bookings/{id}/cancel — idempotent.
async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<TravellerClaims>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReservationResponse>, AppError> {
    let account_id = claims
        .account_id()
        .map_err(|_| AppError::AuthenticationError("Invalid token subject".to_string()))?;

    let reservation = state
        .ledger
        .cancel(id, account_id)
        .await
        .map_err(AppError::from_ledger)?;

    Ok(Json(ReservationResponse::from_reservation(
        reservation,
        &state.business_rules.currency,
    )))
}

/// GET /v1/bookings — the account's history, newest first.
async fn list_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<TravellerClaims>,
) -> Result<Json<Vec<ReservationResponse>>, AppError> {
    let account_id = claims
        .account_id()
        .map_err(|_| AppError::AuthenticationError("Invalid token subject".to_string()))?;

    let reservations = state
        .ledger
        .list_for_account(account_id)
        .await
        .map_err(AppError::from_ledger)?;

    let currency = &state.business_rules.currency;
    Ok(Json(
        reservations
            .into_iter()
            .map(|r| ReservationResponse::from_reservation(r, currency))
            .collect(),
    ))
}
