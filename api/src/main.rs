use actix_web::{web, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing::info;

use wd_api::{create_app, telemetry, AppState};
use wd_core::services::{
    CleanupConfig, CleanupScheduler, PermissionCache, RevocationStore, TokenService,
    TokenServiceConfig,
};
use wd_infra::{
    DatabasePool, MySqlPermissionRepository, MySqlPrincipalRepository, MySqlSessionRepository,
    MySqlTokenRepository,
};
use wd_shared::config::AppConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    telemetry::init_tracing(&config.logging).context("failed to install tracing subscriber")?;

    info!(environment = ?config.environment, "Starting Warden API server");

    let pool = DatabasePool::new(config.database.clone())
        .await
        .context("failed to connect to the database")?;
    let db = pool.get_pool().clone();

    let revocations = Arc::new(RevocationStore::new(&config.auth.revocation));
    let permission_cache = Arc::new(PermissionCache::new(&config.permission_cache));
    let token_service = Arc::new(TokenService::new(
        Arc::new(MySqlTokenRepository::new(db.clone())),
        Arc::new(MySqlSessionRepository::new(db.clone())),
        Arc::new(MySqlPrincipalRepository::new(db.clone())),
        Arc::new(MySqlPermissionRepository::new(db)),
        revocations,
        permission_cache,
        TokenServiceConfig::from_auth(&config.auth),
    ));

    let scheduler = CleanupScheduler::start(
        Arc::clone(&token_service),
        CleanupConfig::new(&config.auth, &config.permission_cache),
    );

    let state = web::Data::new(AppState::new(token_service));
    let bind_address = config.server.bind_address();
    info!(%bind_address, "Server will bind");

    let mut server = HttpServer::new(move || create_app(state.clone()))
        .shutdown_timeout(config.server.shutdown_timeout);
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }
    let result = server
        .bind(&bind_address)
        .with_context(|| format!("failed to bind {}", bind_address))?
        .run()
        .await;

    info!("HTTP server stopped, shutting down background tasks");
    scheduler.shutdown().await;
    pool.close().await;

    result.context("HTTP server error")
}
