use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TravellerClaims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub exp: usize,
}

impl TravellerClaims {
    /// The authenticated account id. Tokens are only issued with a UUID
    /// subject, so a parse failure means a forged token.
    pub fn account_id(&self) -> Result<Uuid, StatusCode> {
        Uuid::parse_str(&self.sub).map_err(|_| StatusCode::UNAUTHORIZED)
    }
}

/// Bearer-token gate for the wizard and booking routes. Decoded claims are
/// injected into request extensions for handlers to pick up.
pub async fn traveller_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract token from Authorization header
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Decode and validate JWT
    let token_data = decode::<TravellerClaims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| StatusCode::UNAUTHORIZED)?;

    // 3. Check role
    if token_data.claims.role != "TRAVELLER" {
        return Err(StatusCode::FORBIDDEN);
    }

    // 4. Inject claims into request extensions
    req.extensions_mut().insert(token_data.claims);

    Ok(next.run(req).await)
}
