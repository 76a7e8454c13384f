//! POS backend entry point: loads configuration, brings up the
//! control-plane and per-tenant storage, wires C1-C9, and serves the HTTP
//! and WebSocket surface described by spec.md §6.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use chrono::Duration as ChronoDuration;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use kugel_pos_core::bus::EventBus;
use kugel_pos_core::cart::CartEngine;
use kugel_pos_core::config::AppConfig;
use kugel_pos_core::gateway::state::AppState;
use kugel_pos_core::identity::JwtIssuer;
use kugel_pos_core::logging::init_logging;
use kugel_pos_core::snapshot::SnapshotScheduler;
use kugel_pos_core::stock::consumer::StockTranlogConsumer;
use kugel_pos_core::stock::StockEngine;
use kugel_pos_core::tenant::pool_cache::TenantPoolCache;
use kugel_pos_core::tenant::{TenantRegistry, TenantStore};
use kugel_pos_core::terminal::repository::TerminalRepository;
use kugel_pos_core::terminal::TerminalEngine;
use kugel_pos_core::ws::WsHub;

/// `config.database.url` is a template (`{tenant}` substituted per spec.md
/// §6's "one logical database per tenant"); the control-plane catalog
/// (tenants, snapshot schedules, leases, staff accounts) lives at the
/// reserved `"control"` slot of that same template.
fn control_plane_url(url_template: &str) -> String {
    url_template.replace("{tenant}", "control")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load_default()?;
    let _log_guard = init_logging(&config);
    info!("starting POS core");

    let control_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
        .connect(&control_plane_url(&config.database.url))
        .await?;

    let tenant_registry = TenantRegistry::new(control_pool.clone());
    tenant_registry.ensure_schema().await?;
    kugel_pos_core::identity::staff::StaffAccountRepository::ensure_schema(&control_pool).await?;
    kugel_pos_core::snapshot::repository::SnapshotScheduleRepository::ensure_schema(&control_pool).await?;

    let pool_cache = TenantPoolCache::new(
        config.database.url.clone(),
        config.database.max_cached_tenants,
        config.database.max_connections,
        config.database.min_connections,
        Duration::from_secs(config.database.acquire_timeout_secs),
    );
    let tenant_store = TenantStore::new(pool_cache);

    let jwt_issuer = JwtIssuer::new(config.auth.jwt_secret.clone(), config.auth.jwt_expiry_hours);
    let event_bus = EventBus::new(config.pipeline.idempotency_processing_ttl_seconds, config.pipeline.max_delivery_attempts as i32);
    let ws_hub = Arc::new(WsHub::new());

    let terminal_engine = Arc::new(TerminalEngine::new(tenant_store.clone(), event_bus.clone()));
    let cart_engine = Arc::new(CartEngine::new(tenant_store.clone(), event_bus.clone()));
    let stock_engine = Arc::new(
        StockEngine::new(tenant_store.clone(), ws_hub.clone()).with_alert_cooldown_secs(config.pipeline.alert_cooldown_seconds),
    );

    event_bus.register(Arc::new(StockTranlogConsumer::new(stock_engine.clone())));

    let snapshot_scheduler = Arc::new(SnapshotScheduler::new(
        tenant_registry.clone(),
        tenant_store.clone(),
        Duration::from_secs(60),
        ChronoDuration::seconds(120),
    ));
    tokio::spawn(snapshot_scheduler.clone().run());

    // One outbox dispatcher per known tenant; tenants register lazily
    // today (spec.md leaves tenant provisioning out of scope), so this
    // loop re-reads the registry on each pass to pick up newcomers.
    {
        let tenant_registry = tenant_registry.clone();
        let tenant_store = tenant_store.clone();
        let event_bus = event_bus.clone();
        tokio::spawn(async move {
            let mut known: std::collections::HashSet<String> = std::collections::HashSet::new();
            let mut interval = tokio::time::interval(Duration::from_secs(30));
            loop {
                interval.tick().await;
                let Ok(ids) = tenant_registry.list_ids().await else { continue };
                for tenant_id in ids {
                    if known.insert(tenant_id.to_string()) {
                        if let Ok(pool) = tenant_store.pool(&tenant_id).await {
                            let bus = event_bus.clone();
                            tokio::spawn(bus.run_dispatcher(pool, Duration::from_secs(5)));
                        }
                    }
                }
            }
        });
    }

    let state = Arc::new(AppState {
        jwt_issuer,
        tenant_store,
        tenant_registry: Arc::new(tenant_registry),
        event_bus,
        ws_hub,
        terminal_repo: TerminalRepository,
        terminal_engine,
        cart_engine,
        stock_engine,
        snapshot_scheduler,
    });

    let app = Router::new()
        .nest("/api/v1", kugel_pos_core::identity::routes::router())
        .nest("/api/v1", kugel_pos_core::terminal::routes::router(state.clone()))
        .nest("/api/v1", kugel_pos_core::cart::routes::router(state.clone()))
        .nest("/api/v1", kugel_pos_core::stock::routes::router(state.clone()))
        .nest("/api/v1", kugel_pos_core::snapshot::routes::router(state.clone()))
        .nest("/api/v1", kugel_pos_core::gateway::ingress::router())
        .merge(kugel_pos_core::ws::routes::router())
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", kugel_pos_core::gateway::openapi::ApiDoc::openapi()))
        .route("/api/v1/health", axum::routing::get(health))
        .with_state(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "POS core listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}
