use utoipa::OpenApi;
use crate::controllers::estimate_controller;
use crate::models::estimate;
use crate::config;

#[derive(OpenApi)]
#[openapi(
    paths(
        estimate_controller::submit_shape,
        estimate_controller::manual_calculation,
        estimate_controller::search_location,
        estimate_controller::get_estimate,
        estimate_controller::get_model_setting,
        estimate_controller::set_model_setting,
        estimate_controller::get_estimator_config
    ),
    components(
        schemas(
            estimate::ShapeRequest,
            estimate::ManualRequest,
            estimate::CalculationResponse,
            estimate::EstimateResponse,
            estimate::EnergyEstimate,
            estimate::MapView,
            estimate::ModelSetting,
            estimate::ModelSettingResponse,
            config::EstimatorConfig
        )
    ),
    tags(
        (name = "rooftop-solar-estimator", description = "Rooftop Solar Potential Estimator API")
    )
)]
pub struct ApiDoc;
