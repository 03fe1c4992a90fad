use actix_web::{get, patch, post, web, HttpResponse, Responder, ResponseError};
use uuid::Uuid;

use crate::{
    entities::user::{NewUser, PublicUser},
    use_cases::extractors::{AdminUser, AuthenticatedUser},
    AppState,
};

#[get("/me")]
pub async fn me(user: AuthenticatedUser) -> impl Responder {
    HttpResponse::Ok().json(PublicUser::from(user.0))
}

#[post("/users")]
pub async fn create_admin(
    state: web::Data<AppState>,
    admin: AdminUser,
    user: web::Json<NewUser>,
) -> impl Responder {
    tracing::info!(by = %admin.0.id, "Creating administrator account");

    match state.auth_handler.register_admin(user.into_inner()).await {
        Ok(response) => HttpResponse::Created().json(response),
        Err(e) => e.error_response(),
    }
}

#[patch("/users/{user_id}/disable")]
pub async fn disable_user(
    state: web::Data<AppState>,
    admin: AdminUser,
    user_id: web::Path<Uuid>,
) -> impl Responder {
    match state.auth_handler.disable_user(user_id.into_inner(), &admin.0).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => e.error_response(),
    }
}

#[patch("/users/{user_id}/enable")]
pub async fn enable_user(
    state: web::Data<AppState>,
    admin: AdminUser,
    user_id: web::Path<Uuid>,
) -> impl Responder {
    match state.auth_handler.enable_user(user_id.into_inner(), &admin.0).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => e.error_response(),
    }
}
