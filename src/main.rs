//! Bazaar API - e-commerce backend

use std::sync::Arc;

use anyhow::Result;
use bazaar_api::config::AppConfig;
use bazaar_api::engine::ReconciliationEngine;
use bazaar_api::gateway::RazorpayClient;
use bazaar_api::routes::{self, AppState};
use bazaar_api::store::PgStore;
use sqlx::postgres::PgPoolOptions;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let store = Arc::new(PgStore::new(db));
    let gateway = Arc::new(RazorpayClient::new(&config.gateway)?);
    let engine = ReconciliationEngine::new(store, gateway, config.gateway.key_secret.clone());
    let state = AppState {
        engine,
        jwt_secret: config.jwt_secret.clone(),
    };

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("bazaar-api listening on {}", config.bind_addr);
    axum::serve(tokio::net::TcpListener::bind(&config.bind_addr).await?, app).await?;
    Ok(())
}
