pub mod energy_estimator;
pub mod weather_service;
