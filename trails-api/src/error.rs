use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use trails_core::CoreError;
use trails_draft::DraftError;
use trails_ledger::LedgerError;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl AppError {
    pub fn from_ledger(err: LedgerError) -> Self {
        match err {
            LedgerError::CapacityExceeded { seats } => {
                AppError::ConflictError(format!("Seats no longer available: {}", seats.join(", ")))
            }
            LedgerError::Unauthorized => {
                AppError::AuthorizationError("Reservation belongs to a different account".to_string())
            }
            LedgerError::NotFound(id) => {
                AppError::NotFoundError(format!("Reservation not found: {}", id))
            }
            LedgerError::NoSeatsRequested => {
                AppError::ValidationError("Please select at least one seat".to_string())
            }
            LedgerError::UnknownSeat(label) => {
                AppError::ValidationError(format!("No such seat on this coach: {}", label))
            }
            LedgerError::Store(msg) => AppError::InternalServerError(msg),
        }
    }

    pub fn from_core(err: CoreError) -> Self {
        match err {
            CoreError::EmailTaken => {
                AppError::ConflictError("Email is already registered".to_string())
            }
            CoreError::NotFound(what) => AppError::NotFoundError(what),
            CoreError::ValidationError(msg) => AppError::ValidationError(msg),
            CoreError::CredentialError(msg) | CoreError::StoreError(msg) => {
                AppError::InternalServerError(msg)
            }
        }
    }

    pub fn from_draft(err: DraftError) -> Self {
        match err {
            DraftError::NoSeatsSelected => {
                AppError::ValidationError("Please select at least one seat".to_string())
            }
            DraftError::MissingField(field) => {
                AppError::ValidationError(format!("Missing required field: {}", field))
            }
            DraftError::OutOfOrder { required } => AppError::ValidationError(format!(
                "Wizard step out of order, resume at {:?}",
                required
            )),
            DraftError::AlreadyCommitted => {
                AppError::ValidationError("This booking is already confirmed".to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Anyhow(err.into())
    }
}
