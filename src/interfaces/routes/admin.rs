use actix_web::web;

use crate::handlers::users;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .service(users::create_admin)
            .service(users::disable_user)
            .service(users::enable_user)
    );
}
