use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{get, middleware::NormalizePath, web, App, HttpResponse, HttpServer, Responder};
use anyhow::Context;
use storefront_backend::{
    cache::{memory_denylist::InMemoryDenylist, redis_denylist::RedisDenylist},
    db::postgres::create_pool,
    middlewares::auth::AuthMiddleware,
    repositories::{denylist::DenylistRepository, sqlx_repo::SqlxUserRepo, user::UserRepository},
    routes::configure_routes,
    settings::{AppConfig, DenylistBackend, LogFormat},
    AppState,
};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;

#[get("/")]
async fn home() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Storefront API",
        "status": "Ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn build_denylist(config: &AppConfig) -> anyhow::Result<Arc<dyn DenylistRepository>> {
    match config.denylist_backend {
        DenylistBackend::Memory => {
            tracing::warn!("Using in-memory token denylist; revocations are not shared between instances");
            Ok(Arc::new(InMemoryDenylist::new()))
        }
        DenylistBackend::Redis => {
            let denylist = RedisDenylist::from_config(config)
                .context("Failed to create Redis pool")?;

            // Reads fail closed, so an unreachable Redis rejects refresh tokens
            // instead of blocking start-up.
            match denylist.ping().await {
                Ok(()) => tracing::info!("Redis denylist connection established."),
                Err(e) => tracing::error!("Redis denylist unreachable at start-up: {}", e),
            }

            Ok(Arc::new(denylist))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::warn!("Ctrl+C received, shutting down"),
        _ = terminate => tracing::warn!("SIGTERM received, shutting down"),
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = match AppConfig::new() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(config.log_format);
    tracing::info!("Loaded configuration: {:?}", config);

    let pool = create_pool(&config.database_url)
        .await
        .context("Failed to create database connection pool")?;

    let user_repo = Arc::new(SqlxUserRepo::new(pool));
    user_repo
        .check_connection()
        .await
        .context("Identity store is not reachable")?;

    let denylist = build_denylist(&config).await?;

    let app_state = web::Data::new(AppState::new(&config, user_repo, denylist));

    let server_addr = format!("{}:{}", config.host, config.port);
    let cors_origins = config.cors_origins();

    tracing::info!(
        "Starting {} v{} on {}",
        config.name,
        env!("CARGO_PKG_VERSION"),
        server_addr
    );

    let server = HttpServer::new(move || {
        let cors = cors_origins
            .iter()
            .fold(Cors::default(), |cors, origin| {
                if origin == "*" {
                    cors.allow_any_origin()
                } else {
                    cors.allowed_origin(origin)
                }
            })
            .allowed_methods(vec!["GET", "POST", "PATCH", "OPTIONS"])
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(app_state.clone())
            .wrap(AuthMiddleware)
            .wrap(NormalizePath::trim())
            .wrap(cors)
            .wrap(TracingLogger::default())
            .service(home)
            .configure(configure_routes)
    })
    .workers(config.worker_count)
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {}", server_addr))?
    .run();

    tokio::select! {
        res = server => res.context("HTTP server error")?,
        _ = shutdown_signal() => {},
    }

    Ok(())
}
