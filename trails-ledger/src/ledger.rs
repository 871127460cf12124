use crate::reservation::Reservation;
use crate::store::{ReservationStore, StoreError};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::sync::Arc;
use trails_catalog::Trip;
use tracing::info;
use uuid::Uuid;

/// The booking ledger: every seat claim goes through here.
///
/// Invariant enforced: for any (trip, travel date), the seat sets of all
/// Confirmed reservations are pairwise disjoint and their union never exceeds
/// the trip's capacity.
pub struct Ledger {
    store: Arc<dyn ReservationStore>,
}

impl Ledger {
    pub fn new(store: Arc<dyn ReservationStore>) -> Self {
        Self { store }
    }

    /// Seats still claimable on (trip, date): capacity minus the seats held
    /// by Confirmed reservations. Scoped per travel date, consistent with
    /// the seat-conflict check.
    pub async fn available_seats(&self, trip: &Trip, date: NaiveDate) -> Result<u32, LedgerError> {
        let taken = self.store.seats_taken(trip.id, date).await?;
        Ok(trip.capacity.saturating_sub(taken.len() as u32))
    }

    /// The seat labels to grey out on the seat map for (trip, date).
    pub async fn booked_seat_labels(
        &self,
        trip_id: Uuid,
        date: NaiveDate,
    ) -> Result<BTreeSet<String>, LedgerError> {
        Ok(self.store.seats_taken(trip_id, date).await?)
    }

    /// Commit a seat claim. All-or-nothing: on any rejection the ledger is
    /// untouched.
    #[allow(clippy::too_many_arguments)]
    pub async fn commit(
        &self,
        account_id: Uuid,
        trip: &Trip,
        date: NaiveDate,
        seats: Vec<String>,
        pickup_stop: Option<String>,
        dropoff_stop: Option<String>,
        payment_method: Option<String>,
    ) -> Result<Reservation, LedgerError> {
        // Requested labels as a set: duplicates in the request collapse.
        let requested: BTreeSet<String> = seats.into_iter().collect();
        if requested.is_empty() {
            return Err(LedgerError::NoSeatsRequested);
        }

        for label in &requested {
            if !trip.has_seat(label) {
                return Err(LedgerError::UnknownSeat(label.clone()));
            }
        }

        // Friendly pre-check; the store's insert re-checks atomically, so a
        // racing committer still fails there rather than corrupting the map.
        let taken = self.store.seats_taken(trip.id, date).await?;
        let conflicts: Vec<String> = requested.intersection(&taken).cloned().collect();
        if !conflicts.is_empty() {
            return Err(LedgerError::CapacityExceeded { seats: conflicts });
        }

        let requested: Vec<String> = requested.into_iter().collect();
        let total_fare = trip.fare.total_for(requested.len() as u32);
        let reservation = Reservation::new(
            account_id,
            trip.id,
            date,
            requested,
            total_fare,
            pickup_stop,
            dropoff_stop,
            payment_method,
        );

        self.store.insert_confirmed(&reservation).await?;

        info!(
            reservation_id = %reservation.id,
            trip = %trip.trip_number,
            date = %date,
            seats = reservation.seat_count(),
            "Reservation confirmed"
        );
        Ok(reservation)
    }

    /// Cancel a reservation on behalf of `requesting_account`. Idempotent:
    /// cancelling twice leaves the same state as cancelling once.
    pub async fn cancel(
        &self,
        reservation_id: Uuid,
        requesting_account: Uuid,
    ) -> Result<Reservation, LedgerError> {
        let reservation = self
            .store
            .get(reservation_id)
            .await?
            .ok_or(LedgerError::NotFound(reservation_id))?;

        if reservation.account_id != requesting_account {
            return Err(LedgerError::Unauthorized);
        }

        if !reservation.is_confirmed() {
            return Ok(reservation);
        }

        let cancelled = self.store.mark_cancelled(reservation_id).await?;
        info!(reservation_id = %reservation_id, "Reservation cancelled");
        Ok(cancelled)
    }

    /// The account's reservations, newest booking first.
    pub async fn list_for_account(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<Reservation>, LedgerError> {
        Ok(self.store.list_for_account(account_id).await?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("No seats requested")]
    NoSeatsRequested,

    #[error("No such seat on this coach: {0}")]
    UnknownSeat(String),

    #[error("Seats no longer available: {seats:?}")]
    CapacityExceeded { seats: Vec<String> },

    #[error("Reservation not found: {0}")]
    NotFound(Uuid),

    #[error("Reservation belongs to a different account")]
    Unauthorized,

    #[error("Ledger store failure: {0}")]
    Store(String),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SeatTaken(seat) => LedgerError::CapacityExceeded { seats: vec![seat] },
            StoreError::NotFound(id) => LedgerError::NotFound(id),
            StoreError::Backend(msg) => LedgerError::Store(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryReservationStore;
    use trails_catalog::{TripCategory, TripStatus};
    use trails_shared::Fare;

    fn sample_trip() -> Trip {
        Trip::new(
            "HT-101",
            "Dharampur",
            "Solan",
            "08:00 AM",
            "09:15 AM",
            TripStatus::OnTime,
            40,
            Fare::from_minor(15000),
            TripCategory::Standard,
            &["Air Conditioning"],
        )
    }

    fn ledger() -> Ledger {
        Ledger::new(Arc::new(MemoryReservationStore::new()))
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, 1).unwrap()
    }

    fn seats(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_commit_then_overlapping_commit_conflicts() {
        let ledger = ledger();
        let trip = sample_trip();
        let account = Uuid::new_v4();

        let first = ledger
            .commit(account, &trip, date(), seats(&["A1", "A2"]), None, None, None)
            .await
            .unwrap();
        assert_eq!(first.total_fare, Fare::from_minor(30000));
        assert_eq!(ledger.available_seats(&trip, date()).await.unwrap(), 38);

        let err = ledger
            .commit(account, &trip, date(), seats(&["A2", "A3"]), None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::CapacityExceeded { .. }));

        // All-or-nothing: the failed commit persisted nothing, A3 included.
        let taken = ledger.booked_seat_labels(trip.id, date()).await.unwrap();
        assert_eq!(taken, BTreeSet::from(["A1".to_string(), "A2".to_string()]));
        assert_eq!(ledger.list_for_account(account).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_capacity_is_scoped_per_travel_date() {
        let ledger = ledger();
        let trip = sample_trip();
        let account = Uuid::new_v4();
        let other_date = NaiveDate::from_ymd_opt(2025, 12, 2).unwrap();

        ledger
            .commit(account, &trip, date(), seats(&["A1"]), None, None, None)
            .await
            .unwrap();

        // The same seat on another date is a different claim entirely.
        ledger
            .commit(account, &trip, other_date, seats(&["A1"]), None, None, None)
            .await
            .unwrap();

        assert_eq!(ledger.available_seats(&trip, date()).await.unwrap(), 39);
        assert_eq!(ledger.available_seats(&trip, other_date).await.unwrap(), 39);
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent_and_releases_seats() {
        let ledger = ledger();
        let trip = sample_trip();
        let account = Uuid::new_v4();

        let reservation = ledger
            .commit(account, &trip, date(), seats(&["B1", "B2"]), None, None, None)
            .await
            .unwrap();

        let once = ledger.cancel(reservation.id, account).await.unwrap();
        assert_eq!(once.status, crate::ReservationStatus::Cancelled);

        let twice = ledger.cancel(reservation.id, account).await.unwrap();
        assert_eq!(twice.status, crate::ReservationStatus::Cancelled);

        // Released seats are claimable again on the same (trip, date).
        assert_eq!(ledger.available_seats(&trip, date()).await.unwrap(), 40);
        ledger
            .commit(account, &trip, date(), seats(&["B1"]), None, None, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_cross_account_cancel_is_unauthorized() {
        let ledger = ledger();
        let trip = sample_trip();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        let reservation = ledger
            .commit(owner, &trip, date(), seats(&["C1"]), None, None, None)
            .await
            .unwrap();

        let err = ledger.cancel(reservation.id, stranger).await.unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized));

        // Ledger unchanged.
        let kept = ledger.list_for_account(owner).await.unwrap();
        assert!(kept[0].is_confirmed());
    }

    #[tokio::test]
    async fn test_unknown_and_empty_seat_requests_rejected() {
        let ledger = ledger();
        let trip = sample_trip();
        let account = Uuid::new_v4();

        let err = ledger
            .commit(account, &trip, date(), vec![], None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NoSeatsRequested));

        let err = ledger
            .commit(account, &trip, date(), seats(&["Z9"]), None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::UnknownSeat(_)));

        assert_eq!(ledger.available_seats(&trip, date()).await.unwrap(), 40);
    }

    #[tokio::test]
    async fn test_listing_reflects_commits_and_cancels_in_order() {
        let ledger = ledger();
        let trip = sample_trip();
        let account = Uuid::new_v4();

        let labels = ["A1", "A2", "A3", "A4"];
        let mut ids = Vec::new();
        for label in labels {
            let r = ledger
                .commit(account, &trip, date(), seats(&[label]), None, None, None)
                .await
                .unwrap();
            ids.push(r.id);
        }

        ledger.cancel(ids[0], account).await.unwrap();
        ledger.cancel(ids[2], account).await.unwrap();

        let listed = ledger.list_for_account(account).await.unwrap();
        assert_eq!(listed.len(), 4);
        // Newest booking first.
        for pair in listed.windows(2) {
            assert!(pair[0].booked_at >= pair[1].booked_at);
        }
        let cancelled = listed.iter().filter(|r| !r.is_confirmed()).count();
        assert_eq!(cancelled, 2);

        // Disjointness invariant holds across the whole sequence.
        let taken = ledger.booked_seat_labels(trip.id, date()).await.unwrap();
        assert_eq!(taken, BTreeSet::from(["A2".to_string(), "A4".to_string()]));
    }

    #[tokio::test]
    async fn test_duplicate_labels_in_request_collapse() {
        let ledger = ledger();
        let trip = sample_trip();
        let account = Uuid::new_v4();

        let reservation = ledger
            .commit(account, &trip, date(), seats(&["A1", "A1"]), None, None, None)
            .await
            .unwrap();

        assert_eq!(reservation.seat_count(), 1);
        assert_eq!(reservation.total_fare, Fare::from_minor(15000));
    }
}
