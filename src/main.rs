use axum::{Router, http::header, routing::get};
use dongip::api::{handlers::api_routes, openapi::ApiDoc};
use dongip::config::CONFIG;
use dongip::core::services::DongService;
use dongip::core::settlement::Currency;
use dongip::infrastructure::{
    cache::in_memory::InMemoryCache, audit::in_memory::InMemoryAuditTrail, storage::in_memory::InMemoryStorage,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&CONFIG.log_level))
        .init();
    info!("Starting with {:?}", *CONFIG);

    let cache = InMemoryCache::new();
    let storage = InMemoryStorage::with_hash_cost(CONFIG.bcrypt_cost);
    let audit = InMemoryAuditTrail::new();
    let service = DongService::new(storage, audit, cache, CONFIG.jwt_secret.clone())
        .with_token_ttl(Duration::from_secs(CONFIG.jwt_ttl_secs))
        .with_balance_cache_ttl(Duration::from_secs(CONFIG.balance_cache_ttl_secs))
        .with_default_currency(Currency::new(&CONFIG.default_currency)?);
    let service = Arc::new(service);

    let app = Router::new()
        .route("/", get(|| async { "OK" }))
        .nest("/api", api_routes(service))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CompressionLayer::new()) // Gzip compression
        .layer(TimeoutLayer::new(Duration::from_secs(30))) // 30-second timeout
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([http::Method::GET, http::Method::POST, http::Method::DELETE])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        )
        .layer(TraceLayer::new_for_http()); // Request tracing

    let addr = SocketAddr::from(([127, 0, 0, 1], CONFIG.port));
    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
