use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named boarding/alighting point within a city.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stop {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub city: String,
    pub is_pickup: bool,
    pub is_dropoff: bool,
}

impl Stop {
    pub fn new(name: &str, location: &str, city: &str, is_pickup: bool, is_dropoff: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            location: location.to_string(),
            city: city.to_string(),
            is_pickup,
            is_dropoff,
        }
    }
}
