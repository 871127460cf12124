use crate::reservation::{Reservation, ReservationStatus};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Seat already taken: {0}")]
    SeatTaken(String),

    #[error("Reservation not found: {0}")]
    NotFound(Uuid),

    #[error("Store failure: {0}")]
    Backend(String),
}

/// Persistence seam for the booking ledger.
///
/// `insert_confirmed` carries the atomicity contract: the disjointness
/// re-check and the insert happen as one unit, so the second of two
/// committers racing for a seat observes `SeatTaken`. The Postgres
/// implementation gets this from a transaction plus a unique index over
/// (trip_id, travel_date, seat_label); the in-memory one from a single
/// mutable borrow.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Union of seat labels held by Confirmed reservations on (trip, date).
    async fn seats_taken(
        &self,
        trip_id: Uuid,
        travel_date: NaiveDate,
    ) -> Result<BTreeSet<String>, StoreError>;

    /// Atomically verify seat disjointness and persist. Nothing is written
    /// when any requested seat is already held.
    async fn insert_confirmed(&self, reservation: &Reservation) -> Result<(), StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Reservation>, StoreError>;

    /// Flip to Cancelled and release the seat labels. A second call is a
    /// no-op returning the already-cancelled reservation.
    async fn mark_cancelled(&self, id: Uuid) -> Result<Reservation, StoreError>;

    /// All reservations for an account, newest booking first.
    async fn list_for_account(&self, account_id: Uuid) -> Result<Vec<Reservation>, StoreError>;
}

/// HashMap-backed store used by tests and local development.
#[derive(Default)]
pub struct MemoryReservationStore {
    reservations: RwLock<HashMap<Uuid, Reservation>>,
}

impl MemoryReservationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn taken_in<'a, I>(reservations: I, trip_id: Uuid, travel_date: NaiveDate) -> BTreeSet<String>
where
    I: Iterator<Item = &'a Reservation>,
{
    reservations
        .filter(|r| {
            r.trip_id == trip_id
                && r.travel_date == travel_date
                && r.status == ReservationStatus::Confirmed
        })
        .flat_map(|r| r.seats.iter().cloned())
        .collect()
}

#[async_trait]
impl ReservationStore for MemoryReservationStore {
    async fn seats_taken(
        &self,
        trip_id: Uuid,
        travel_date: NaiveDate,
    ) -> Result<BTreeSet<String>, StoreError> {
        let reservations = self.reservations.read().await;
        Ok(taken_in(reservations.values(), trip_id, travel_date))
    }

    async fn insert_confirmed(&self, reservation: &Reservation) -> Result<(), StoreError> {
        // Check and insert under one write lock: concurrent committers
        // serialize here, so the second one sees the first one's seats.
        let mut reservations = self.reservations.write().await;

        let taken = taken_in(
            reservations.values(),
            reservation.trip_id,
            reservation.travel_date,
        );
        if let Some(conflict) = reservation.seats.iter().find(|s| taken.contains(*s)) {
            return Err(StoreError::SeatTaken(conflict.clone()));
        }

        reservations.insert(reservation.id, reservation.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Reservation>, StoreError> {
        Ok(self.reservations.read().await.get(&id).cloned())
    }

    async fn mark_cancelled(&self, id: Uuid) -> Result<Reservation, StoreError> {
        let mut reservations = self.reservations.write().await;
        let reservation = reservations.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        reservation.cancel();
        Ok(reservation.clone())
    }

    async fn list_for_account(&self, account_id: Uuid) -> Result<Vec<Reservation>, StoreError> {
        let reservations = self.reservations.read().await;
        let mut mine: Vec<Reservation> = reservations
            .values()
            .filter(|r| r.account_id == account_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.booked_at.cmp(&a.booked_at));
        Ok(mine)
    }
}
