use anyhow::Context;
use iron_blog::{config::LogFormat, db::PgStore, web::AppState, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("failed to load configuration")?;

    let registry = tracing_subscriber::registry().with(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "iron_blog=debug,tower_http=debug".into()),
    );
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!("Starting iron-blog");
    tracing::info!("Web server will listen on: {}", config.web_addr());

    let db_pool = iron_blog::db::create_pool(&config.database_url, config.max_connections)
        .await
        .context("failed to connect to the database")?;

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .context("failed to run migrations")?;

    let app_state = AppState::new(PgStore::new(db_pool), config.session_ttl());

    iron_blog::web::serve(config.web_addr(), app_state).await?;

    Ok(())
}
