//! Oficina server: reads config from the environment (and `.env`), prepares the
//! database, mounts common and resource routes.
//!
//! Run from repo root: `cargo run -p oficina-server`

use axum::Router;
use oficina_sdk::{
    common_routes_with_ready, ensure_database_exists, ensure_shop_tables, resource_routes, AppState, PgDataService,
    ShopConfig,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("oficina_sdk=info,oficina_server=info")),
        )
        .init();
    let config = ShopConfig::load()?;

    ensure_database_exists(&config.database_url).await?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&config.database_url)
        .await?;
    ensure_shop_tables(&pool, &config.schema).await?;

    let state = AppState::new(Arc::new(PgDataService::new(pool)), &config.schema);
    let app = Router::new()
        .merge(common_routes_with_ready(state.clone()))
        .nest("/api/v1", resource_routes(state, config.body_limit_bytes));

    let listener = TcpListener::bind(config.listen_addr).await?;
    tracing::info!("oficina server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
