use actix_web::{
    error::{InternalError, JsonPayloadError},
    http::StatusCode,
    web,
};

use crate::handlers::json_error::json_error;

const JSON_BODY_LIMIT: usize = 16 * 1024;

/// Malformed or oversized JSON bodies are answered in the same
/// `{"error", "details"}` shape as the handlers use.
pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(JSON_BODY_LIMIT)
            .error_handler(|err, _req| {
                let status = match &err {
                    JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
                        StatusCode::PAYLOAD_TOO_LARGE
                    }
                    JsonPayloadError::ContentType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    _ => StatusCode::BAD_REQUEST,
                };
                let response = json_error(status, "Invalid JSON payload", &err.to_string());
                InternalError::from_response(err, response).into()
            }),
    );
}
