use std::net::SocketAddr;
use std::sync::Arc;
use trails_api::{
    app,
    state::{AppState, AuthConfig},
};
use trails_core::enrichment::{SimulatedTracker, SimulatedWeather};
use trails_core::identity::Argon2Hasher;
use trails_ledger::Ledger;
use trails_store::{PgAccounts, PgCatalog, PgReservations, RedisSessions};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trails_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = trails_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Trails API on port {}", config.server.port);

    // Postgres
    let db = trails_store::DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    // Redis (sessions + rate limiting)
    let redis_client = trails_store::RedisClient::new(&config.redis.url)
        .await
        .expect("Failed to connect to Redis");
    let redis_arc = Arc::new(redis_client);

    let sessions = RedisSessions::new(
        redis_arc.clone(),
        config.business_rules.draft_ttl_seconds,
    );

    let catalog = Arc::new(PgCatalog::new(db.pool.clone()));

    let app_state = AppState {
        accounts: Arc::new(PgAccounts::new(db.pool.clone())),
        hasher: Arc::new(Argon2Hasher),
        trips: catalog.clone(),
        stops: catalog,
        ledger: Arc::new(Ledger::new(Arc::new(PgReservations::new(db.pool.clone())))),
        sessions: Arc::new(sessions),
        weather: Arc::new(SimulatedWeather),
        tracker: Arc::new(SimulatedTracker),
        redis: redis_arc,
        business_rules: config.business_rules.clone(),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
