use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ─── Site & weather inputs ───────────────────────────────────────────────────

/// Panels that fit on the usable roof area and their nameplate capacity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Capacity {
    pub panel_count: u32,
    pub capacity_kw: f64,
}

/// Weather at the site, as reported by the lookup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WeatherReading {
    /// Cloud cover (%), expected in [0, 100]
    pub cloud_percent: f64,
    /// Ambient air temperature (°C)
    pub air_temp_c: f64,
}

/// Complete input for one estimate. Holding one means the readiness gate is open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SiteSnapshot {
    pub capacity: Capacity,
    pub weather: WeatherReading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum YieldModel {
    #[default]
    Basic,
    Advanced,
}

impl YieldModel {
    pub fn from_advanced(advanced: bool) -> Self {
        if advanced { Self::Advanced } else { Self::Basic }
    }

    pub fn is_advanced(self) -> bool {
        self == Self::Advanced
    }
}

// ─── Estimator output ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct EnergyYield {
    pub daily_kwh: f64,
    pub monthly_kwh: f64,
    pub yearly_kwh: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct Co2Offset {
    pub daily_kg: f64,
    pub monthly_kg: f64,
    pub yearly_kg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct EnergyEstimate {
    pub model: YieldModel,
    pub energy: EnergyYield,
    /// Absent while the daily yield is not positive
    pub co2: Option<Co2Offset>,
}

// ─── Locations ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Where the map should be centred after a location is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct MapView {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: u8,
}

// ─── OpenWeatherMap wire types ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CurrentWeatherResponse {
    pub clouds: Option<CloudsData>,
    pub main: Option<MainData>,
}

#[derive(Debug, Deserialize)]
pub struct CloudsData {
    pub all: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct MainData {
    pub temp: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodingMatch {
    pub lat: f64,
    pub lon: f64,
}

/// Partial weather as parsed; the caller decides how to fill the gaps.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawWeather {
    pub cloud_percent: Option<f64>,
    pub air_temp_c: Option<f64>,
}

impl From<CurrentWeatherResponse> for RawWeather {
    fn from(resp: CurrentWeatherResponse) -> Self {
        Self {
            cloud_percent: resp.clouds.and_then(|c| c.all),
            air_temp_c: resp.main.and_then(|m| m.temp),
        }
    }
}

// ─── REST API request / response types ───────────────────────────────────────

/// A shape drawn on the map; the area is computed client-side.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ShapeRequest {
    pub area_m2: f64,
    /// Map centre used for the weather lookup
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ManualRequest {
    pub area_m2: Option<f64>,
    /// Either `"lat,lon"` or a place name
    pub location: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// `"lat,lon"` or a place name
    pub q: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct ModelSetting {
    pub advanced: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct SiteReport {
    pub area_m2: f64,
    pub panel_count: u32,
    pub capacity_kw: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CalculationResponse {
    pub timestamp: DateTime<Utc>,
    pub site: SiteReport,
    /// `null` when live weather was unavailable
    pub estimate: Option<EnergyEstimate>,
    pub view: Option<MapView>,
    pub message: Option<String>,
    /// A newer request was issued meanwhile; this result was not stored
    pub superseded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ModelSettingResponse {
    pub advanced: bool,
    pub estimate: Option<EnergyEstimate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EstimateResponse {
    pub timestamp: DateTime<Utc>,
    pub site: Option<SiteReport>,
    pub estimate: EnergyEstimate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weather_response_with_missing_sections() {
        let resp: CurrentWeatherResponse = serde_json::from_str(r#"{ "main": { "temp": 31.5 } }"#).unwrap();
        let raw = RawWeather::from(resp);
        assert_eq!(raw.cloud_percent, None);
        assert_eq!(raw.air_temp_c, Some(31.5));
    }

    #[test]
    fn weather_response_full() {
        let resp: CurrentWeatherResponse = serde_json::from_str(
            r#"{ "clouds": { "all": 40 }, "main": { "temp": 22.0, "humidity": 60 }, "name": "Kolkata" }"#,
        )
        .unwrap();
        assert_eq!(RawWeather::from(resp), RawWeather { cloud_percent: Some(40.0), air_temp_c: Some(22.0) });
    }

    #[test]
    fn model_serialises_screaming_case() {
        assert_eq!(serde_json::to_string(&YieldModel::Advanced).unwrap(), "\"ADVANCED\"");
        assert_eq!(YieldModel::from_advanced(false), YieldModel::Basic);
    }
}
