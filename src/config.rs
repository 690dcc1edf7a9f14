use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const CONFIG_PATH_ENV: &str = "SOLAR_ESTIMATOR_CONFIG";
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

fn default_port() -> u16 { 8080 }
fn default_weather_url() -> String { "https://api.openweathermap.org/data/2.5/weather".to_string() }
fn default_geocoding_url() -> String { "https://api.openweathermap.org/geo/1.0/direct".to_string() }
fn default_search_zoom() -> u8 { 17 }

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub estimator: EstimatorConfig,
    #[serde(default)]
    pub map: MapConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: default_port() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeatherConfig {
    /// OpenWeatherMap key; falls back to `OPENWEATHER_API_KEY` when empty
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_weather_url")]
    pub weather_url: String,
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            weather_url: default_weather_url(),
            geocoding_url: default_geocoding_url(),
        }
    }
}

/// Panel and grid constants used by the yield models.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, ToSchema)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Physical area per panel (m²)
    pub panel_area_m2: f64,
    /// Nameplate power per panel (W)
    pub panel_power_watts: f64,
    /// Spacing / layout overhead multiplier
    pub packing_factor: f64,
    /// Fraction of the raw roof area that is unusable
    pub setback_factor: f64,
    /// Reference insolation (hours/day)
    pub peak_sun_hours: f64,
    /// Emissions displaced per kWh (kg CO2)
    pub grid_co2_factor: f64,
    /// Clamp cloud factor to [0, 1] and temperature factor to >= 0
    pub clamp_factors: bool,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            panel_area_m2: 1.7,
            panel_power_watts: 400.0,
            packing_factor: 1.1,
            setback_factor: 0.10,
            peak_sun_hours: 5.0,
            grid_co2_factor: 0.82,
            clamp_factors: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MapConfig {
    /// Zoom level returned with resolved locations
    #[serde(default = "default_search_zoom")]
    pub search_zoom: u8,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self { search_zoom: default_search_zoom() }
    }
}

impl EstimatorConfig {
    /// Footprint and power constants must be positive and finite; setback must leave some roof.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("panel_area_m2", self.panel_area_m2),
            ("panel_power_watts", self.panel_power_watts),
            ("packing_factor", self.packing_factor),
            ("peak_sun_hours", self.peak_sun_hours),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("estimator.{name} must be a positive number, got {value}"));
            }
        }
        if !(0.0..1.0).contains(&self.setback_factor) {
            return Err(format!("estimator.setback_factor must be in [0, 1), got {}", self.setback_factor));
        }
        if !self.grid_co2_factor.is_finite() || self.grid_co2_factor < 0.0 {
            return Err(format!("estimator.grid_co2_factor must be non-negative, got {}", self.grid_co2_factor));
        }
        Ok(())
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_json(&content)?;
        config.apply_env();
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Config = serde_json::from_str(content)?;
        config.estimator.validate()?;
        Ok(config)
    }

    /// Config file path, honouring `SOLAR_ESTIMATOR_CONFIG`.
    pub fn path() -> String {
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
    }

    fn apply_env(&mut self) {
        if self.weather.api_key.is_empty() {
            if let Ok(key) = std::env::var(API_KEY_ENV) {
                self.weather.api_key = key;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.estimator, EstimatorConfig::default());
        assert_eq!(config.map.search_zoom, 17);
        assert!(config.weather.weather_url.ends_with("/data/2.5/weather"));
    }

    #[test]
    fn default_constants_are_valid() {
        assert_eq!(EstimatorConfig::default().validate(), Ok(()));
    }

    #[test]
    fn degenerate_constants_are_rejected() {
        for estimator in [
            r#"{ "packing_factor": 0 }"#,
            r#"{ "panel_area_m2": -1.7 }"#,
            r#"{ "panel_power_watts": 0 }"#,
            r#"{ "peak_sun_hours": -5 }"#,
            r#"{ "setback_factor": 1.0 }"#,
            r#"{ "setback_factor": -0.1 }"#,
            r#"{ "grid_co2_factor": -0.82 }"#,
        ] {
            let document = format!(r#"{{ "estimator": {estimator} }}"#);
            assert!(Config::from_json(&document).is_err(), "{estimator}");
        }
    }

    #[test]
    fn partial_estimator_section_keeps_other_constants() {
        let config = Config::from_json(
            r#"{ "server": { "port": 9000 }, "estimator": { "panel_power_watts": 450, "clamp_factors": true } }"#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.estimator.panel_power_watts, 450.0);
        assert!(config.estimator.clamp_factors);
        assert_eq!(config.estimator.panel_area_m2, 1.7);
        assert_eq!(config.estimator.grid_co2_factor, 0.82);
    }
}
