use actix_web::{http::StatusCode, HttpResponse};

use crate::errors::AuthError;

pub fn json_error(status: StatusCode, error: &str, details: &str) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({
        "error": error,
        "details": details
    }))
}

/// Every renewal failure looks the same to the client; the reason is logged.
pub fn refresh_rejected(err: AuthError) -> HttpResponse {
    match &err {
        AuthError::DenylistUnavailable(_) | AuthError::Internal(_) => {
            tracing::error!("Token renewal failed: {}", err)
        }
        _ => tracing::warn!("Token renewal rejected: {}", err),
    }

    json_error(
        StatusCode::UNAUTHORIZED,
        "Refresh token invalid or revoked",
        "Please log in again",
    )
}
