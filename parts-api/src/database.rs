use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use crate::config::DatabaseSettings;

/// Open the catalog database and bring its schema up to date.
pub async fn connect(settings: &DatabaseSettings) -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .connect_with(settings.connect_options())
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!(path = %settings.path, "Connected to catalog database");

    Ok(pool)
}
