use serde::{Deserialize, Serialize};
use trails_shared::Fare;
use uuid::Uuid;

/// Operational status shown next to a trip.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    OnTime,
    Delayed,
}

/// Service tier of the coach.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripCategory {
    Standard,
    Deluxe,
    Premium,
}

const SEATS_PER_ROW: u32 = 4;

/// One scheduled bus run between two named locations.
///
/// Capacity is fixed at creation; availability is always derived from the
/// booking ledger, never stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub trip_number: String,
    pub origin: String,
    pub destination: String,
    pub departure: String,
    pub arrival: String,
    pub status: TripStatus,
    pub capacity: u32,
    pub fare: Fare,
    pub category: TripCategory,
    pub amenities: Vec<String>,
}

impl Trip {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        trip_number: &str,
        origin: &str,
        destination: &str,
        departure: &str,
        arrival: &str,
        status: TripStatus,
        capacity: u32,
        fare: Fare,
        category: TripCategory,
        amenities: &[&str],
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            trip_number: trip_number.to_string(),
            origin: origin.to_string(),
            destination: destination.to_string(),
            departure: departure.to_string(),
            arrival: arrival.to_string(),
            status,
            capacity,
            fare,
            category,
            amenities: amenities.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Enumerate the physical seat labels for this coach: rows of four,
    /// lettered from the front ("A1".."A4", "B1".."B4", ...).
    pub fn seat_labels(&self) -> Vec<String> {
        (0..self.capacity)
            .map(|i| {
                let row = (b'A' + (i / SEATS_PER_ROW) as u8) as char;
                format!("{}{}", row, i % SEATS_PER_ROW + 1)
            })
            .collect()
    }

    /// Whether `label` names a seat that exists on this coach.
    pub fn has_seat(&self, label: &str) -> bool {
        let mut chars = label.chars();
        let (Some(row), Ok(number)) = (chars.next(), chars.as_str().parse::<u32>()) else {
            return false;
        };
        if !row.is_ascii_uppercase() || number == 0 || number > SEATS_PER_ROW {
            return false;
        }
        let index = (row as u32 - 'A' as u32) * SEATS_PER_ROW + (number - 1);
        index < self.capacity
    }
}
