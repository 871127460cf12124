use crate::stop::Stop;
use crate::trip::{Trip, TripCategory, TripStatus};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use trails_shared::Fare;
use uuid::Uuid;

pub type StoreResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Read-only trip catalog lookups.
#[async_trait]
pub trait TripStore: Send + Sync {
    async fn find_trips(&self, origin: &str, destination: &str) -> StoreResult<Vec<Trip>>;

    async fn get_trip(&self, id: Uuid) -> StoreResult<Option<Trip>>;

    async fn list_trips(&self) -> StoreResult<Vec<Trip>>;
}

/// Read-only stop directory lookups.
#[async_trait]
pub trait StopStore: Send + Sync {
    async fn pickup_stops_for(&self, city: &str) -> StoreResult<Vec<Stop>>;

    async fn dropoff_stops_for(&self, city: &str) -> StoreResult<Vec<Stop>>;
}

/// In-memory catalog used by tests and local development.
#[derive(Default)]
pub struct MemoryCatalog {
    trips: RwLock<HashMap<Uuid, Trip>>,
    stops: RwLock<Vec<Stop>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_trip(&self, trip: Trip) {
        self.trips.write().await.insert(trip.id, trip);
    }

    pub async fn insert_stop(&self, stop: Stop) {
        self.stops.write().await.push(stop);
    }

    /// A catalog preloaded with the Himachal hill timetable, matching the
    /// seed migration.
    pub async fn with_sample_timetable() -> Self {
        let catalog = Self::new();

        let timetable = [
            Trip::new(
                "HT-101", "Dharampur", "Solan", "08:00 AM", "09:15 AM",
                TripStatus::OnTime, 40, Fare::from_minor(15000), TripCategory::Standard,
                &["Air Conditioning", "Comfortable Seats", "Water Bottle"],
            ),
            Trip::new(
                "HT-102", "Solan", "Barog", "09:30 AM", "10:15 AM",
                TripStatus::Delayed, 40, Fare::from_minor(10000), TripCategory::Deluxe,
                &["Air Conditioning", "Reclining Seats", "WiFi", "Snacks"],
            ),
            Trip::new(
                "HT-103", "Barog", "Dagshai", "11:00 AM", "12:00 PM",
                TripStatus::OnTime, 40, Fare::from_minor(12000), TripCategory::Premium,
                &["Air Conditioning", "Luxury Seats", "WiFi", "Entertainment", "Meals"],
            ),
            Trip::new(
                "HT-104", "Dagshai", "Dharampur", "01:30 PM", "02:45 PM",
                TripStatus::OnTime, 40, Fare::from_minor(15000), TripCategory::Standard,
                &["Air Conditioning", "Comfortable Seats", "Water Bottle"],
            ),
            Trip::new(
                "HT-105", "Dharampur", "Solan", "10:00 AM", "11:15 AM",
                TripStatus::OnTime, 40, Fare::from_minor(16000), TripCategory::Deluxe,
                &["Air Conditioning", "Reclining Seats", "WiFi", "Snacks"],
            ),
            Trip::new(
                "HT-106", "Dharampur", "Solan", "12:00 PM", "01:15 PM",
                TripStatus::OnTime, 40, Fare::from_minor(17000), TripCategory::Premium,
                &["Air Conditioning", "Luxury Seats", "WiFi", "Entertainment", "Meals"],
            ),
            Trip::new(
                "HT-107", "Solan", "Barog", "11:30 AM", "12:15 PM",
                TripStatus::OnTime, 40, Fare::from_minor(11000), TripCategory::Standard,
                &["Air Conditioning", "Comfortable Seats", "Water Bottle"],
            ),
            Trip::new(
                "HT-108", "Barog", "Dagshai", "02:00 PM", "03:00 PM",
                TripStatus::Delayed, 40, Fare::from_minor(13000), TripCategory::Deluxe,
                &["Air Conditioning", "Reclining Seats", "WiFi", "Snacks"],
            ),
        ];

        for trip in timetable {
            catalog.insert_trip(trip).await;
        }

        let stops = [
            Stop::new("Dharampur Main Bus Stand", "Central Dharampur", "Dharampur", true, true),
            Stop::new("Dharampur Railway Station", "Near Railway Station", "Dharampur", true, true),
            Stop::new("Dharampur Market", "Market Area", "Dharampur", true, true),
            Stop::new("Solan Bus Terminal", "Central Solan", "Solan", true, true),
            Stop::new("Solan Mall Road", "Mall Road", "Solan", true, true),
            Stop::new("Solan University", "Near University", "Solan", true, true),
            Stop::new("Barog Station", "Near Railway Station", "Barog", true, true),
            Stop::new("Barog Market", "Market Area", "Barog", true, true),
            Stop::new("Dagshai Main Stand", "Central Dagshai", "Dagshai", true, true),
            Stop::new("Dagshai Cantonment", "Cantonment Area", "Dagshai", true, true),
        ];

        for stop in stops {
            catalog.insert_stop(stop).await;
        }

        catalog
    }
}

#[async_trait]
impl TripStore for MemoryCatalog {
    async fn find_trips(&self, origin: &str, destination: &str) -> StoreResult<Vec<Trip>> {
        let trips = self.trips.read().await;
        let mut matches: Vec<Trip> = trips
            .values()
            .filter(|t| t.origin == origin && t.destination == destination)
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.trip_number.cmp(&b.trip_number));
        Ok(matches)
    }

    async fn get_trip(&self, id: Uuid) -> StoreResult<Option<Trip>> {
        Ok(self.trips.read().await.get(&id).cloned())
    }

    async fn list_trips(&self) -> StoreResult<Vec<Trip>> {
        let trips = self.trips.read().await;
        let mut all: Vec<Trip> = trips.values().cloned().collect();
        all.sort_by(|a, b| a.trip_number.cmp(&b.trip_number));
        Ok(all)
    }
}

#[async_trait]
impl StopStore for MemoryCatalog {
    async fn pickup_stops_for(&self, city: &str) -> StoreResult<Vec<Stop>> {
        let stops = self.stops.read().await;
        Ok(stops
            .iter()
            .filter(|s| s.city == city && s.is_pickup)
            .cloned()
            .collect())
    }

    async fn dropoff_stops_for(&self, city: &str) -> StoreResult<Vec<Stop>> {
        let stops = self.stops.read().await;
        Ok(stops
            .iter()
            .filter(|s| s.city == city && s.is_dropoff)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_find_trips_filters_by_endpoints() {
        let catalog = MemoryCatalog::with_sample_timetable().await;

        let trips = catalog.find_trips("Dharampur", "Solan").await.unwrap();
        assert_eq!(trips.len(), 3);
        assert!(trips.iter().all(|t| t.origin == "Dharampur" && t.destination == "Solan"));
        // Deterministic ordering for the results page.
        assert_eq!(trips[0].trip_number, "HT-101");

        let none = catalog.find_trips("Solan", "Dharampur").await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_stop_directory_by_city() {
        let catalog = MemoryCatalog::with_sample_timetable().await;

        let pickups = catalog.pickup_stops_for("Solan").await.unwrap();
        assert_eq!(pickups.len(), 3);
        assert!(pickups.iter().all(|s| s.city == "Solan"));

        let dropoffs = catalog.dropoff_stops_for("Barog").await.unwrap();
        assert_eq!(dropoffs.len(), 2);

        assert!(catalog.pickup_stops_for("Shimla").await.unwrap().is_empty());
    }
}
