use std::time::Duration;

use migration::{Migrator, MigratorTrait};
use server::ServerOptions;
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "mercato={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let Some(server) = settings.server else {
        tracing::warn!("no server settings found, nothing to run");
        return Ok(());
    };

    tracing::info!("Found server settings...");
    let session_ttl = server.session_ttl()?;
    let db = match parse_database(&server.database).await {
        Ok(db) => db,
        Err(err) => {
            tracing::error!("failed to initialize database: {err}");
            return Ok(());
        }
    };

    let engine = match engine::Engine::builder()
        .database(db)
        .session_ttl(session_ttl)
        .max_image_bytes(server.max_image_bytes)
        .build()
        .await
    {
        Ok(engine) => engine,
        Err(err) => {
            tracing::error!("failed to build engine from database: {err}");
            return Ok(());
        }
    };

    let options = ServerOptions {
        bind: server.bind.unwrap_or_else(|| "127.0.0.1".to_string()),
        port: server.port,
        request_timeout: Duration::from_secs(server.request_timeout_secs),
        max_body_bytes: ServerOptions::body_limit_for_image(server.max_image_bytes),
    };
    server::run(engine, options).await;

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
