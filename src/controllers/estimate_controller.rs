use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use tracing::{info, warn};

use crate::config::EstimatorConfig;
use crate::error::{EstimatorError, Result};
use crate::models::estimate::{
    CalculationResponse, Capacity, Coordinates, EstimateResponse, ManualRequest, MapView,
    ModelSetting, ModelSettingResponse, SearchQuery, ShapeRequest, SiteReport, SiteSnapshot,
    YieldModel,
};
use crate::services::energy_estimator::derive_capacity;
use crate::services::weather_service::{
    checked_coordinates, reading_with_defaults, resolve_location, strict_reading,
};
use crate::shared_state::AppState;

pub const WEATHER_UNAVAILABLE: &str = "Live weather data unavailable";

fn site_report(area_m2: f64, capacity: Capacity) -> SiteReport {
    SiteReport {
        area_m2,
        panel_count: capacity.panel_count,
        capacity_kw: capacity.capacity_kw,
    }
}

fn map_view(state: &AppState, at: Coordinates) -> MapView {
    MapView { latitude: at.latitude, longitude: at.longitude, zoom: state.map.search_zoom }
}

/// POST /api/site/shape
/// Estimate for a shape drawn on the map
///
/// Capacity is always returned. When the weather lookup at the map centre fails the
/// estimate is `null`, a message is set, and the previously stored site is kept.
#[utoipa::path(
    post,
    path = "/api/site/shape",
    request_body = ShapeRequest,
    responses(
        (status = 200, description = "Capacity, plus the estimate when weather was available", body = CalculationResponse),
        (status = 400, description = "Area or coordinates are invalid")
    )
)]
pub async fn submit_shape(
    State(state): State<AppState>,
    Json(req): Json<ShapeRequest>,
) -> Result<Json<CalculationResponse>> {
    let capacity = derive_capacity(&state.estimator, req.area_m2)?;
    let centre = checked_coordinates(req.latitude, req.longitude)?;
    let site = site_report(req.area_m2, capacity);
    let ticket = state.begin_request();

    let response = match state.weather.current_weather(centre).await {
        Ok(raw) => {
            let snapshot = SiteSnapshot { capacity, weather: reading_with_defaults(raw) };
            let applied = state.commit(ticket, site, snapshot);
            CalculationResponse {
                timestamp: Utc::now(),
                site,
                estimate: Some(state.estimate_for(&snapshot)),
                view: None,
                message: None,
                superseded: !applied,
            }
        }
        Err(e) => {
            warn!(error = %e, "weather lookup failed for drawn shape");
            CalculationResponse {
                timestamp: Utc::now(),
                site,
                estimate: None,
                view: None,
                message: Some(WEATHER_UNAVAILABLE.to_string()),
                superseded: false,
            }
        }
    };
    Ok(Json(response))
}

/// POST /api/site/manual
/// Estimate for a manually entered area and location
///
/// The location is either `"lat,lon"` or a place name. Any lookup failure rejects the
/// whole calculation and leaves the stored site untouched.
#[utoipa::path(
    post,
    path = "/api/site/manual",
    request_body = ManualRequest,
    responses(
        (status = 200, description = "Capacity, estimate and the map view to show", body = CalculationResponse),
        (status = 400, description = "Area or location missing or invalid"),
        (status = 404, description = "Location not found"),
        (status = 502, description = "Weather lookup failed")
    )
)]
pub async fn manual_calculation(
    State(state): State<AppState>,
    Json(req): Json<ManualRequest>,
) -> Result<Json<CalculationResponse>> {
    let (Some(area_m2), Some(location)) = (req.area_m2, req.location.filter(|l| !l.trim().is_empty())) else {
        return Err(EstimatorError::invalid("please enter both area and location"));
    };
    let capacity = derive_capacity(&state.estimator, area_m2)?;
    let ticket = state.begin_request();

    let at = resolve_location(state.weather.as_ref(), &location).await?;
    let weather = strict_reading(state.weather.current_weather(at).await?)?;

    let site = site_report(area_m2, capacity);
    let snapshot = SiteSnapshot { capacity, weather };
    let applied = state.commit(ticket, site, snapshot);
    info!(%location, panels = capacity.panel_count, applied, "manual calculation");

    Ok(Json(CalculationResponse {
        timestamp: Utc::now(),
        site,
        estimate: Some(state.estimate_for(&snapshot)),
        view: Some(map_view(&state, at)),
        message: None,
        superseded: !applied,
    }))
}

/// GET /api/locations/search
/// Resolve a location to a map view
#[utoipa::path(
    get,
    path = "/api/locations/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Where to centre the map", body = MapView),
        (status = 400, description = "Empty or malformed query"),
        (status = 404, description = "Location not found")
    )
)]
pub async fn search_location(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<MapView>> {
    let text = query.q.unwrap_or_default();
    if text.trim().is_empty() {
        return Err(EstimatorError::invalid("enter a location to search"));
    }
    let at = resolve_location(state.weather.as_ref(), &text).await?;
    Ok(Json(map_view(&state, at)))
}

/// GET /api/estimate
/// Current estimate for the stored site
///
/// Returns 204 until a site and its weather have been recorded.
#[utoipa::path(
    get,
    path = "/api/estimate",
    responses(
        (status = 200, description = "Current estimate", body = EstimateResponse),
        (status = 204, description = "No complete site yet")
    )
)]
pub async fn get_estimate(State(state): State<AppState>) -> Result<Json<EstimateResponse>> {
    let estimate = state.estimate()?;
    Ok(Json(EstimateResponse { timestamp: Utc::now(), site: state.site(), estimate }))
}

/// GET /api/settings/model
#[utoipa::path(
    get,
    path = "/api/settings/model",
    responses((status = 200, description = "Selected yield model", body = ModelSetting))
)]
pub async fn get_model_setting(State(state): State<AppState>) -> Json<ModelSetting> {
    Json(ModelSetting { advanced: state.model().is_advanced() })
}

/// POST /api/settings/model
/// Switch between the basic and advanced yield model
///
/// Recomputes from the stored site without any new lookup.
#[utoipa::path(
    post,
    path = "/api/settings/model",
    request_body = ModelSetting,
    responses((status = 200, description = "New setting and the recomputed estimate, if ready", body = ModelSettingResponse))
)]
pub async fn set_model_setting(
    State(state): State<AppState>,
    Json(setting): Json<ModelSetting>,
) -> Json<ModelSettingResponse> {
    let model = YieldModel::from_advanced(setting.advanced);
    let estimate = state.set_model(model);
    info!(?model, ready = estimate.is_some(), "yield model changed");
    Json(ModelSettingResponse { advanced: model.is_advanced(), estimate })
}

/// GET /api/config
#[utoipa::path(
    get,
    path = "/api/config",
    responses((status = 200, description = "Active estimator constants", body = EstimatorConfig))
)]
pub async fn get_estimator_config(State(state): State<AppState>) -> Json<EstimatorConfig> {
    Json(state.estimator.as_ref().clone())
}
