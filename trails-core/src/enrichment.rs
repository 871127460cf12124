use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current conditions for a city, as rendered on trip pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherReport {
    pub temperature_c: f64,
    pub description: String,
    pub humidity: u32,
    pub wind_speed: f64,
}

/// A point on the map for the live-tracking view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoPosition {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrafficCondition {
    Light,
    Moderate,
    Heavy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficEstimate {
    pub condition: TrafficCondition,
    pub delay_minutes: u32,
}

/// Weather lookup collaborator. Implementations must never raise into the
/// booking flow: any failure is reported as `None` and rendered as
/// "unavailable" by the caller.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn weather_for_city(&self, city: &str) -> Option<WeatherReport>;
}

/// Live-position and traffic collaborator, same degradation contract as
/// `WeatherProvider`.
#[async_trait]
pub trait TripTracker: Send + Sync {
    async fn locate(&self, trip_id: Uuid, origin_city: &str) -> Option<GeoPosition>;
    async fn traffic(&self, trip_id: Uuid) -> Option<TrafficEstimate>;
}

// Himachal hill-route coordinates used to seed the simulated feed.
const CITY_POSITIONS: &[(&str, f64, f64)] = &[
    ("Dharampur", 30.8970, 77.0220),
    ("Solan", 30.9045, 77.0967),
    ("Barog", 30.9565, 77.0672),
    ("Dagshai", 30.8840, 77.0520),
];

/// Canned weather table standing in for a real provider.
pub struct SimulatedWeather;

#[async_trait]
impl WeatherProvider for SimulatedWeather {
    async fn weather_for_city(&self, city: &str) -> Option<WeatherReport> {
        let report = match city {
            "Dharampur" => WeatherReport {
                temperature_c: 24.0,
                description: "clear sky".to_string(),
                humidity: 40,
                wind_speed: 3.1,
            },
            "Solan" => WeatherReport {
                temperature_c: 21.5,
                description: "scattered clouds".to_string(),
                humidity: 52,
                wind_speed: 2.4,
            },
            "Barog" => WeatherReport {
                temperature_c: 18.0,
                description: "light rain".to_string(),
                humidity: 74,
                wind_speed: 4.0,
            },
            "Dagshai" => WeatherReport {
                temperature_c: 19.5,
                description: "mist".to_string(),
                humidity: 68,
                wind_speed: 1.8,
            },
            _ => {
                tracing::debug!("No weather data for city: {}", city);
                return None;
            }
        };
        Some(report)
    }
}

/// Simulated GPS feed: the base coordinate of the origin city with a small
/// random walk so the marker moves between polls.
pub struct SimulatedTracker;

#[async_trait]
impl TripTracker for SimulatedTracker {
    async fn locate(&self, _trip_id: Uuid, origin_city: &str) -> Option<GeoPosition> {
        let (_, lat, lng) = CITY_POSITIONS
            .iter()
            .find(|(city, _, _)| *city == origin_city)?;

        let mut rng = rand::thread_rng();
        Some(GeoPosition {
            lat: lat + rng.gen_range(-0.01..0.01),
            lng: lng + rng.gen_range(-0.01..0.01),
        })
    }

    async fn traffic(&self, _trip_id: Uuid) -> Option<TrafficEstimate> {
        let mut rng = rand::thread_rng();
        let (condition, delay_minutes) = match rng.gen_range(0..3) {
            0 => (TrafficCondition::Light, 0),
            1 => (TrafficCondition::Moderate, rng.gen_range(5..=15)),
            _ => (TrafficCondition::Heavy, rng.gen_range(15..=30)),
        };
        Some(TrafficEstimate {
            condition,
            delay_minutes,
        })
    }
}
