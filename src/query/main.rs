//! Query server for freight price lookups.
//!
//! Provides an HTTP API for price search over the stored shipment
//! records and for direct resolution of a raw address.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use waybill::elasticsearch::EsClient;
use waybill::goods::GoodsClassifier;
use waybill::models::ResolvedAddress;
use waybill::region::AddressResolver;
use waybill::scylla::ScyllaClient;

mod prices;
use prices::{execute_price_search, PriceParams, PriceReport};

#[derive(Parser, Debug)]
#[command(name = "query")]
#[command(about = "Freight price query server")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:3000")]
    listen: String,

    /// Elasticsearch URL
    #[arg(long, default_value = "http://localhost:9200")]
    es_url: String,

    /// Elasticsearch index name
    #[arg(long, default_value = "shipments")]
    index: String,

    /// ScyllaDB URL
    #[arg(long, default_value = "127.0.0.1")]
    scylla_url: String,

    /// Optional goods classification rules (TOML)
    #[arg(long)]
    goods_rules: Option<std::path::PathBuf>,
}

/// Application state shared across handlers
struct AppState {
    es_client: EsClient,
    resolver: AddressResolver<ScyllaClient>,
    classifier: GoodsClassifier,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Waybill Query Server");
    info!("Connecting to Elasticsearch at {}", args.es_url);

    let es_client = EsClient::new(&args.es_url, &args.index).await?;

    if !es_client.health_check().await? {
        anyhow::bail!("Elasticsearch cluster is not healthy");
    }

    let doc_count = es_client.doc_count().await?;
    info!(
        "Connected to index '{}' with {} documents",
        args.index, doc_count
    );

    info!("Connecting to ScyllaDB at {}", args.scylla_url);
    let scylla_client = ScyllaClient::new(&args.scylla_url).await?;

    // The resolver builds its region cache once, at startup.
    let resolver = AddressResolver::new(scylla_client).await?;

    let classifier = match &args.goods_rules {
        Some(path) => GoodsClassifier::load_from_file(path)?,
        None => GoodsClassifier::default(),
    };

    let state = Arc::new(AppState {
        es_client,
        resolver,
        classifier,
    });

    // Build router
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/v1/search", get(search_handler))
        .route("/v1/resolve", get(resolve_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Starting server on {}", args.listen);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthResponse>, StatusCode> {
    let healthy = state.es_client.health_check().await.unwrap_or(false);

    Ok(Json(HealthResponse {
        status: if healthy { "ok" } else { "degraded" },
        elasticsearch: healthy,
    }))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    elasticsearch: bool,
}

/// Price search over the stored shipments
async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQueryParams>,
) -> Result<Json<PriceReport>, (StatusCode, String)> {
    let price_params = PriceParams {
        location: params.location.clone(),
        goods_type: params.goods_type.clone(),
    };

    let report = execute_price_search(&state.es_client, &state.classifier, price_params)
        .await
        .map_err(|e| {
            tracing::error!("Price search failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    Ok(Json(report))
}

/// Resolve a raw address into province/city/area
async fn resolve_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResolveQueryParams>,
) -> Result<Json<ResolvedAddress>, (StatusCode, String)> {
    let resolved = state.resolver.resolve(&params.address).await.map_err(|e| {
        tracing::error!("Address resolution failed: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    Ok(Json(resolved))
}

#[derive(Deserialize)]
struct SearchQueryParams {
    /// Location fragment to match against stored region fields
    location: String,
    /// Optional goods type filter
    goods_type: Option<String>,
}

#[derive(Deserialize)]
struct ResolveQueryParams {
    /// Raw shipping address
    address: String,
}
