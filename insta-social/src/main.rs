use std::sync::Arc;

use insta_shared::clients::db;
use insta_shared::middleware::{init_metrics, init_tracing};

use insta_social::config::AppConfig;
use insta_social::{build_router, run_migrations, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("insta-social");

    let config = AppConfig::load()?;
    let port = config.port;

    let pool = db::create_pool(&config.database_url, config.db_pool_size)?;

    if config.run_migrations {
        let mut conn = pool.get()?;
        run_migrations(&mut conn)?;
    }

    let metrics_handle = init_metrics()?;

    let state = Arc::new(AppState::new(pool, config, Some(metrics_handle)));
    let app = build_router(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "insta-social starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
