use async_trait::async_trait;
use sqlx::PgPool;
use trails_catalog::store::{StopStore, StoreResult, TripStore};
use trails_catalog::{Stop, Trip, TripCategory, TripStatus};
use trails_shared::Fare;
use uuid::Uuid;

pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct TripRow {
    id: Uuid,
    trip_number: String,
    origin: String,
    destination: String,
    departure: String,
    arrival: String,
    status: String,
    capacity: i32,
    fare_minor: i64,
    category: String,
    amenities: String,
}

impl TripRow {
    fn into_trip(self) -> Trip {
        Trip {
            id: self.id,
            trip_number: self.trip_number,
            origin: self.origin,
            destination: self.destination,
            departure: self.departure,
            arrival: self.arrival,
            status: match self.status.as_str() {
                "DELAYED" => TripStatus::Delayed,
                _ => TripStatus::OnTime,
            },
            capacity: self.capacity.max(0) as u32,
            fare: Fare::from_minor(self.fare_minor),
            category: match self.category.as_str() {
                "DELUXE" => TripCategory::Deluxe,
                "PREMIUM" => TripCategory::Premium,
                _ => TripCategory::Standard,
            },
            amenities: self
                .amenities
                .split(',')
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect(),
        }
    }
}

#[derive(sqlx::FromRow)]
struct StopRow {
    id: Uuid,
    name: String,
    location: String,
    city: String,
    is_pickup: bool,
    is_dropoff: bool,
}

impl StopRow {
    fn into_stop(self) -> Stop {
        Stop {
            id: self.id,
            name: self.name,
            location: self.location,
            city: self.city,
            is_pickup: self.is_pickup,
            is_dropoff: self.is_dropoff,
        }
    }
}

const TRIP_COLUMNS: &str = "id, trip_number, origin, destination, departure, arrival, status, capacity, fare_minor, category, amenities";

#[async_trait]
impl TripStore for PgCatalog {
    async fn find_trips(&self, origin: &str, destination: &str) -> StoreResult<Vec<Trip>> {
        let rows: Vec<TripRow> = sqlx::query_as(&format!(
            "SELECT {TRIP_COLUMNS} FROM trips WHERE origin = $1 AND destination = $2 ORDER BY trip_number"
        ))
        .bind(origin)
        .bind(destination)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(TripRow::into_trip).collect())
    }

    async fn get_trip(&self, id: Uuid) -> StoreResult<Option<Trip>> {
        let row: Option<TripRow> =
            sqlx::query_as(&format!("SELECT {TRIP_COLUMNS} FROM trips WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(TripRow::into_trip))
    }

    async fn list_trips(&self) -> StoreResult<Vec<Trip>> {
        let rows: Vec<TripRow> =
            sqlx::query_as(&format!("SELECT {TRIP_COLUMNS} FROM trips ORDER BY trip_number"))
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(TripRow::into_trip).collect())
    }
}

#[async_trait]
impl StopStore for PgCatalog {
    async fn pickup_stops_for(&self, city: &str) -> StoreResult<Vec<Stop>> {
        let rows: Vec<StopRow> = sqlx::query_as(
            "SELECT id, name, location, city, is_pickup, is_dropoff FROM stops WHERE city = $1 AND is_pickup ORDER BY name",
        )
        .bind(city)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(StopRow::into_stop).collect())
    }

    async fn dropoff_stops_for(&self, city: &str) -> StoreResult<Vec<Stop>> {
        let rows: Vec<StopRow> = sqlx::query_as(
            "SELECT id, name, location, city, is_pickup, is_dropoff FROM stops WHERE city = $1 AND is_dropoff ORDER BY name",
        )
        .bind(city)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(StopRow::into_stop).collect())
    }
}
