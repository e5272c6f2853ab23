mod config;

use std::{net::SocketAddr, sync::Arc};

use axum::{Json, Router, extract::State, routing::get};
use redis_connection::{CacheStore, MemoryStore, RedisStore, connect_redis_db};
use sales_cache_warmer::CacheWarmer;
use sales_dao::{SalesDao, SalesStore};
use sales_http::SalesServices;
use serde::Serialize;
use sql_connection::{SqlConnect, connect_postgres_db};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::{OpenApi, ToSchema};
use utoipa_rapidoc::RapiDoc;

use crate::config::{AppConfig, CacheBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    info!("Initializing connection pools...");

    let db = connect_postgres_db(&config.database).await?;
    info!("PostgreSQL connection pool initialized");

    let cache: Arc<dyn CacheStore> = match &config.cache {
        CacheBackend::Redis(redis_config) => {
            Arc::new(RedisStore::new(connect_redis_db(redis_config)?))
        }
        CacheBackend::Memory(memory_config) => {
            Arc::new(MemoryStore::new(memory_config))
        }
    };
    info!(backend = config.cache.name(), "Cache backend initialized");

    let sales: Arc<dyn SalesStore> = Arc::new(SalesDao::new(db.clone()));

    if config.warmup_on_start {
        let warmer = CacheWarmer::new(sales.clone(), cache.clone());
        if let Err(e) = warmer.warm().await {
            if config.warmup_required {
                return Err(e.into());
            }
            warn!(error = %e, "Cache warm-up failed, starting cold");
        }
    }

    let services = SalesServices::new(sales, cache, config.aggregate_ttl);
    let health = HealthState {
        db,
        cache_backend: config.cache.name(),
    };

    let app = Router::new()
        .route("/health", get(health_check))
        .with_state(health)
        .merge(sales_http::routes(services))
        .merge(RapiDoc::new("/api-docs/openapi.json").path("/docs"))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    info!("ReelMetrics server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        sales_http::list_theaters,
        sales_http::get_movies_by_theater,
        sales_http::get_top_theater,
    ),
    components(
        schemas(
            HealthResponse,
            sales_responses::TheaterResponse,
            sales_responses::MovieSalesResponse,
            sales_responses::MoviesByTheaterResponse,
            sales_responses::TopTheaterResponse,
            sales_responses::MessageResponse,
            sales_responses::DataSource,
            common_errors::ApiErrorResponse,
            common_errors::ApiErrorInfo,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "theaters", description = "Theater listing"),
        (name = "sales", description = "Sales reports")
    ),
    info(
        title = "ReelMetrics API",
        description = "Movie theater sales reporting API",
        version = "1.0.0"
    )
)]
struct ApiDoc;

#[derive(Clone)]
struct HealthState {
    db: SqlConnect,
    cache_backend: &'static str,
}

#[derive(Debug, Serialize, ToSchema)]
struct HealthResponse {
    status: String,
    cache_backend: String,
    db_pool_size: usize,
    db_pool_available: usize,
    db_pool_max_size: usize,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check successful with connection pool status", body = HealthResponse)
    ),
    tag = "health"
)]
async fn health_check(
    State(health): State<HealthState>,
) -> Json<HealthResponse> {
    let pool = health.db.pool_status();

    Json(HealthResponse {
        status: "ok".to_string(),
        cache_backend: health.cache_backend.to_string(),
        db_pool_size: pool.size,
        db_pool_available: pool.available,
        db_pool_max_size: pool.max_size,
    })
}
