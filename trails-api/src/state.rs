use std::sync::Arc;
use trails_catalog::{StopStore, TripStore};
use trails_core::enrichment::{TripTracker, WeatherProvider};
use trails_core::identity::{AccountStore, CredentialHasher};
use trails_draft::DraftSessions;
use trails_ledger::Ledger;
use trails_store::app_config::BusinessRules;
use trails_store::RedisClient;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountStore>,
    pub hasher: Arc<dyn CredentialHasher>,
    pub trips: Arc<dyn TripStore>,
    pub stops: Arc<dyn StopStore>,
    pub ledger: Arc<Ledger>,
    pub sessions: Arc<dyn DraftSessions>,
    pub weather: Arc<dyn WeatherProvider>,
    pub tracker: Arc<dyn TripTracker>,
    pub redis: Arc<RedisClient>,
    pub auth: AuthConfig,
    pub business_rules: BusinessRules,
}
