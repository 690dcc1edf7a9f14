use axum::{routing::{get, post}, Router};
use crate::controllers::estimate_controller::{
    // Site input
    submit_shape, manual_calculation, search_location,
    // Estimate
    get_estimate, get_estimator_config,
    // Settings
    get_model_setting, set_model_setting,
};
use crate::shared_state::AppState;

/// Build the `/api/*` sub-router.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/site/shape",        post(submit_shape))
        .route("/site/manual",       post(manual_calculation))
        .route("/locations/search",  get(search_location))
        .route("/estimate",          get(get_estimate))
        .route("/config",            get(get_estimator_config))
        .route("/settings/model",    get(get_model_setting).post(set_model_setting))
        .with_state(state)
}
