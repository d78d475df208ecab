use chrono::Utc;
use mimalloc::MiMalloc;
use sqlbounce::{Config, SessionStorage, SqliteStorage, UserStorage};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.database_url,
        users_table = %cfg.users_table_name,
        sessions_table = %cfg.sessions_table_name,
        email_unique = cfg.email_unique,
        selective_updates = cfg.selective_updates,
    );

    let connect_opts =
        SqliteConnectOptions::from_str(cfg.database_url.as_str())?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;

    let storage = SqliteStorage::from_config(pool, &cfg)?;
    storage.init_users().await?;
    storage.init_sessions().await?;
    info!("user and session tables ready");

    let removed = storage.cleanup_sessions(Utc::now()).await?;
    info!(removed, "expired sessions purged");

    storage.pool().close().await;
    Ok(())
}
