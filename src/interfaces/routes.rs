use actix_web::web;

mod admin;
mod auth;
mod json_error;
mod users;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(auth::config_routes)
            .configure(admin::config_routes)
            .configure(users::config_routes)
    );

    cfg.configure(json_error::config_routes);
}
