use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use std::collections::BTreeSet;
use trails_ledger::store::{ReservationStore, StoreError};
use trails_ledger::{Reservation, ReservationStatus};
use trails_shared::Fare;
use uuid::Uuid;

pub struct PgReservations {
    pool: PgPool,
}

impl PgReservations {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ReservationRow {
    id: Uuid,
    account_id: Uuid,
    trip_id: Uuid,
    travel_date: NaiveDate,
    booked_at: DateTime<Utc>,
    seat_labels: String,
    total_fare_minor: i64,
    status: String,
    pickup_stop: Option<String>,
    dropoff_stop: Option<String>,
    payment_method: Option<String>,
}

impl ReservationRow {
    fn into_reservation(self) -> Reservation {
        Reservation {
            id: self.id,
            account_id: self.account_id,
            trip_id: self.trip_id,
            travel_date: self.travel_date,
            booked_at: self.booked_at,
            seats: self
                .seat_labels
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            total_fare: Fare::from_minor(self.total_fare_minor),
            status: match self.status.as_str() {
                "CANCELLED" => ReservationStatus::Cancelled,
                _ => ReservationStatus::Confirmed,
            },
            pickup_stop: self.pickup_stop,
            dropoff_stop: self.dropoff_stop,
            payment_method: self.payment_method,
        }
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

const RESERVATION_COLUMNS: &str = "id, account_id, trip_id, travel_date, booked_at, seat_labels, total_fare_minor, status, pickup_stop, dropoff_stop, payment_method";

#[async_trait]
impl ReservationStore for PgReservations {
    async fn seats_taken(
        &self,
        trip_id: Uuid,
        travel_date: NaiveDate,
    ) -> Result<BTreeSet<String>, StoreError> {
        let labels: Vec<(String,)> = sqlx::query_as(
            "SELECT seat_label FROM reservation_seats WHERE trip_id = $1 AND travel_date = $2",
        )
        .bind(trip_id)
        .bind(travel_date)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Ok(labels.into_iter().map(|(label,)| label).collect())
    }

    async fn insert_confirmed(&self, reservation: &Reservation) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        sqlx::query(
            r#"
            INSERT INTO reservations (id, account_id, trip_id, travel_date, booked_at, seat_labels, total_fare_minor, status, pickup_stop, dropoff_stop, payment_method)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'CONFIRMED', $8, $9, $10)
            "#,
        )
        .bind(reservation.id)
        .bind(reservation.account_id)
        .bind(reservation.trip_id)
        .bind(reservation.travel_date)
        .bind(reservation.booked_at)
        .bind(reservation.seats.join(","))
        .bind(reservation.total_fare.minor_units())
        .bind(&reservation.pickup_stop)
        .bind(&reservation.dropoff_stop)
        .bind(&reservation.payment_method)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        // One claim row per seat. The unique index over
        // (trip_id, travel_date, seat_label) rejects a racing committer
        // here, rolling back the whole transaction.
        for label in &reservation.seats {
            let inserted = sqlx::query(
                r#"
                INSERT INTO reservation_seats (reservation_id, trip_id, travel_date, seat_label)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(reservation.id)
            .bind(reservation.trip_id)
            .bind(reservation.travel_date)
            .bind(label)
            .execute(&mut *tx)
            .await;

            match inserted {
                Ok(_) => {}
                Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                    return Err(StoreError::SeatTaken(label.clone()));
                }
                Err(err) => return Err(backend(err)),
            }
        }

        tx.commit().await.map_err(backend)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Reservation>, StoreError> {
        let row: Option<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.map(ReservationRow::into_reservation))
    }

    async fn mark_cancelled(&self, id: Uuid) -> Result<Reservation, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let row: Option<ReservationRow> = sqlx::query_as(&format!(
            "UPDATE reservations SET status = 'CANCELLED' WHERE id = $1 RETURNING {RESERVATION_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(backend)?;

        let Some(row) = row else {
            return Err(StoreError::NotFound(id));
        };

        // Release the seat claims so the labels become bookable again.
        sqlx::query("DELETE FROM reservation_seats WHERE reservation_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        tx.commit().await.map_err(backend)?;
        Ok(row.into_reservation())
    }

    async fn list_for_account(&self, account_id: Uuid) -> Result<Vec<Reservation>, StoreError> {
        let rows: Vec<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE account_id = $1 ORDER BY booked_at DESC"
        ))
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Ok(rows.into_iter().map(ReservationRow::into_reservation).collect())
    }
}
