use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::resilience::RetryPolicy;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = RetryPolicy::STARTUP
        .run("Database connection", |_| true, || {
            PgPoolOptions::new()
                .max_connections(20)
                .connect(database_url)
        })
        .await?;

    info!("Database connection established.");
    Ok(pool)
}
