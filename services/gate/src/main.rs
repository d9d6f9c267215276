use std::net::SocketAddr;

use sea_orm::Database;
use tracing::info;

use parlor_core::config::Config as _;
use parlor_core::tracing::init_tracing;
use parlor_gate::config::GateConfig;
use parlor_gate::router::build_router;
use parlor_gate::state::AppState;
use parlor_gate::usecase::cleanup::CleanupUseCase;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = GateConfig::from_env();
    let policy = config.policy();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let redis_cfg = deadpool_redis::Config::from_url(&config.redis_url);
    let redis = redis_cfg
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .expect("failed to create Redis pool");

    let state = AppState {
        db,
        redis,
        policy,
        cookie_domain: config.cookie_domain,
    };

    // Scheduled retention pass. The rate-limit counters ignore rows outside
    // their window either way, so this only reclaims storage.
    let cleanup = CleanupUseCase {
        attempts: state.attempt_ledger(),
        bans: state.ban_store(),
        policy: state.policy.clone(),
    };
    let period = std::time::Duration::from_secs(config.cleanup_interval_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = cleanup.execute(chrono::Utc::now()).await {
                tracing::warn!(error = %e, "rate-limit cleanup pass failed");
            }
        }
    });

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.gate_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("gate service listening on {addr}");
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("server error");
}
