mod routes;
mod controllers;
mod services;
mod models;
mod api_docs;
mod shared_state;
mod config;
mod error;

use std::net::SocketAddr;
use std::sync::Arc;
use axum::{Router, routing::get, response::Html};
use crate::routes::estimate_routes::api_routes;
use utoipa::OpenApi;
use utoipa_scalar::Scalar;
use crate::api_docs::ApiDoc;
use crate::shared_state::AppState;
use crate::config::Config;
use crate::services::weather_service::OpenWeatherClient;

use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = if cfg!(feature = "verbose_log") {
    "rooftop_solar_estimator=debug,tower_http=debug"
} else {
    "rooftop_solar_estimator=info,tower_http=info"
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    // 1. Load configuration
    let path = Config::path();
    let config = match Config::load(&path) {
        Ok(c) => c,
        Err(e) => {
            error!(%path, "failed to load configuration: {e}");
            return;
        }
    };
    if config.weather.api_key.is_empty() {
        warn!("no OpenWeatherMap API key configured; weather lookups will fail");
    }
    info!(
        panel_area_m2 = config.estimator.panel_area_m2,
        panel_power_watts = config.estimator.panel_power_watts,
        clamp_factors = config.estimator.clamp_factors,
        "configuration loaded"
    );

    // 2. Shared state with the live weather client
    let weather = Arc::new(OpenWeatherClient::new(&config.weather));
    let state = AppState::new(&config, weather);

    // 3. Start Axum HTTP server
    let app = Router::new()
        .nest("/api", api_routes(state))
        .route("/scalar", get(|| async {
            Html(Scalar::new(ApiDoc::openapi()).to_html())
        }))
        .fallback_service(ServeDir::new("static"))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("API Server listening on http://{addr}");
    info!("Scalar UI: http://{addr}/scalar");

    if let Err(e) = axum_server::bind(addr).serve(app.into_make_service()).await {
        error!("server error: {e}");
    }
}
