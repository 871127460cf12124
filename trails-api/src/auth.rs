use axum::{extract::State, routing::post, Json, Router};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::info;
use trails_core::identity::{Account, NewAccount};
use trails_shared::{redact_email, Masked};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::auth::TravellerClaims;
use crate::state::{AppState, AuthConfig};

// Passwords arrive wrapped so a debug-logged request can't leak them.
#[derive(Debug, Deserialize)]
struct SignupRequest {
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    password: Masked<String>,
    confirm_password: Masked<String>,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: Masked<String>,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    account_id: Uuid,
    first_name: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/auth/signup", post(signup))
        .route("/v1/auth/login", post(login))
}

fn issue_token(account: &Account, auth: &AuthConfig) -> Result<String, AppError> {
    let claims = TravellerClaims {
        sub: account.id.to_string(),
        email: account.email.clone(),
        role: "TRAVELLER".to_owned(),
        exp: (Utc::now() + Duration::seconds(auth.expiration as i64)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}

async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    // 1. Validate form fields
    if req.first_name.trim().is_empty()
        || req.last_name.trim().is_empty()
        || req.email.trim().is_empty()
        || req.phone.trim().is_empty()
    {
        return Err(AppError::ValidationError("All fields are required".to_string()));
    }
    if req.password.0 != req.confirm_password.0 {
        return Err(AppError::ValidationError("Passwords do not match".to_string()));
    }
    if req.password.0.len() < 8 {
        return Err(AppError::ValidationError(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    // 2. Hash the password and create the account
    let password_hash = state
        .hasher
        .hash(&req.password.0)
        .map_err(AppError::from_core)?;

    let account = state
        .accounts
        .create(NewAccount {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            phone: req.phone,
            password_hash,
        })
        .await
        .map_err(AppError::from_core)?;

    info!("Account created: {}", redact_email(&account.email));

    // 3. Sign the visitor straight in
    let token = issue_token(&account, &state.auth)?;

    Ok(Json(AuthResponse {
        token,
        account_id: account.id,
        first_name: account.first_name,
    }))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let account = state
        .accounts
        .find_by_email(&req.email)
        .await
        .map_err(AppError::from_core)?;

    // A missing account and a bad password answer identically.
    let Some(account) = account else {
        return Err(AppError::AuthenticationError("Invalid email or password".to_string()));
    };
    if !state.hasher.verify(&req.password.0, &account.password_hash) {
        return Err(AppError::AuthenticationError("Invalid email or password".to_string()));
    }

    info!("Login: {}", redact_email(&account.email));

    let token = issue_token(&account, &state.auth)?;

    Ok(Json(AuthResponse {
        token,
        account_id: account.id,
        first_name: account.first_name.clone(),
    }))
}
