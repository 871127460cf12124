use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use trails_shared::Fare;
use uuid::Uuid;

/// Reservation status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Confirmed,
    Cancelled,
}

/// A claim on a set of seats for a trip on a specific travel date.
///
/// The seat list is retained after cancellation for the booking history;
/// only Confirmed reservations count against the seat map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub account_id: Uuid,
    pub trip_id: Uuid,
    pub travel_date: NaiveDate,
    pub booked_at: DateTime<Utc>,
    pub seats: Vec<String>,
    pub total_fare: Fare,
    pub status: ReservationStatus,
    pub pickup_stop: Option<String>,
    pub dropoff_stop: Option<String>,
    pub payment_method: Option<String>,
}

impl Reservation {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        account_id: Uuid,
        trip_id: Uuid,
        travel_date: NaiveDate,
        seats: Vec<String>,
        total_fare: Fare,
        pickup_stop: Option<String>,
        dropoff_stop: Option<String>,
        payment_method: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            trip_id,
            travel_date,
            booked_at: Utc::now(),
            seats,
            total_fare,
            status: ReservationStatus::Confirmed,
            pickup_stop,
            dropoff_stop,
            payment_method,
        }
    }

    pub fn seat_count(&self) -> u32 {
        self.seats.len() as u32
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == ReservationStatus::Confirmed
    }

    pub fn cancel(&mut self) {
        self.status = ReservationStatus::Cancelled;
    }
}
