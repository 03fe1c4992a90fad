use actix_web::{post, web, HttpResponse, Responder, ResponseError};
use crate::entities::token::RefreshTokenRequest;
use crate::entities::user::{LoginUser, LogoutRequest, NewUser};
use crate::errors::AuthError;
use crate::handlers::json_error::refresh_rejected;
use crate::AppState;

#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    user: web::Json<NewUser>
) -> impl Responder {
    match state.auth_handler.register(user.into_inner()).await {
        Ok(response) => HttpResponse::Created().json(response),
        Err(e) => e.error_response(),
    }
}

#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    user: web::Json<LoginUser>
) -> impl Responder {
    match state.auth_handler.login(user.into_inner()).await {
        Ok(auth_response) => HttpResponse::Ok().json(auth_response),
        Err(e) => e.error_response(),
    }
}

/// Rotating renewal: the presented refresh token is consumed.
#[post("/refresh")]
pub async fn refresh_token(
    state: web::Data<AppState>,
    request: web::Json<RefreshTokenRequest>,
) -> impl Responder {
    match state.token_renewal.renew_with_rotation(&request.refresh_token).await {
        Ok(auth_response) => HttpResponse::Ok().json(auth_response),
        Err(e) => refresh_rejected(e),
    }
}

/// Access-only renewal: the refresh token stays usable.
#[post("/refresh/access")]
pub async fn refresh_access_token(
    state: web::Data<AppState>,
    request: web::Json<RefreshTokenRequest>,
) -> impl Responder {
    match state.token_renewal.renew_access_only(&request.refresh_token).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => refresh_rejected(e),
    }
}

#[post("/logout")]
pub async fn logout(
    state: web::Data<AppState>,
    body: web::Json<LogoutRequest>
) -> impl Responder {
    match state.auth_handler.logout(&body.refresh_token).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({"message": "Logged out successfully"})),
        Err(AuthError::InvalidToken) => HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Refresh token cannot be revoked"
        })),
        Err(e) => e.error_response(),
    }
}
