use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::config::WeatherConfig;
use crate::error::{EstimatorError, Result};
use crate::models::estimate::{
    Coordinates, CurrentWeatherResponse, GeocodingMatch, RawWeather, WeatherReading,
};

/// Fallbacks used for the drawn-shape flow when the API omits a field.
const DEFAULT_CLOUD_PERCENT: f64 = 0.0;
const DEFAULT_AIR_TEMP_C: f64 = 25.0;

/// Weather and geocoding lookups; injected so the estimator never touches the network.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current_weather(&self, at: Coordinates) -> Result<RawWeather>;

    /// First match for a free-text place name.
    async fn geocode(&self, query: &str) -> Result<Coordinates>;
}

/// OpenWeatherMap current weather + direct geocoding.
pub struct OpenWeatherClient {
    client: Client,
    api_key: String,
    weather_url: String,
    geocoding_url: String,
}

impl OpenWeatherClient {
    pub fn new(config: &WeatherConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            weather_url: config.weather_url.clone(),
            geocoding_url: config.geocoding_url.clone(),
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    #[instrument(skip(self), fields(lat = at.latitude, lon = at.longitude))]
    async fn current_weather(&self, at: Coordinates) -> Result<RawWeather> {
        let response = self
            .client
            .get(&self.weather_url)
            .query(&[
                ("lat", at.latitude.to_string()),
                ("lon", at.longitude.to_string()),
                ("units", "metric".to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EstimatorError::lookup(format!("weather API responded with {status}")));
        }
        let raw = RawWeather::from(response.json::<CurrentWeatherResponse>().await?);
        debug!(cloud_percent = ?raw.cloud_percent, air_temp_c = ?raw.air_temp_c, "fetched weather");
        Ok(raw)
    }

    #[instrument(skip(self))]
    async fn geocode(&self, query: &str) -> Result<Coordinates> {
        let response = self
            .client
            .get(&self.geocoding_url)
            .query(&[("q", query), ("limit", "1"), ("appid", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EstimatorError::lookup(format!("geocoding API responded with {status}")));
        }
        let matches = response.json::<Vec<GeocodingMatch>>().await?;
        let first = matches
            .first()
            .ok_or_else(|| EstimatorError::not_found(format!("location not found: {query}")))?;
        debug!(lat = first.lat, lon = first.lon, "geocoded");
        Ok(Coordinates { latitude: first.lat, longitude: first.lon })
    }
}

// ─── Location parsing ────────────────────────────────────────────────────────

/// `"lat,lon"` is taken literally; anything else goes through the geocoder.
pub async fn resolve_location(provider: &dyn WeatherProvider, text: &str) -> Result<Coordinates> {
    let text = text.trim();
    if text.is_empty() {
        return Err(EstimatorError::invalid("location is empty"));
    }
    if text.contains(',') {
        return parse_coordinates(text);
    }
    provider.geocode(text).await
}

pub fn parse_coordinates(text: &str) -> Result<Coordinates> {
    let invalid = || EstimatorError::invalid(format!("expected \"lat,lon\", got {text:?}"));
    let (lat, lon) = text.split_once(',').ok_or_else(invalid)?;
    let latitude: f64 = lat.trim().parse().map_err(|_| invalid())?;
    let longitude: f64 = lon.trim().parse().map_err(|_| invalid())?;
    checked_coordinates(latitude, longitude)
}

/// Rejects NaN and out-of-range values.
pub fn checked_coordinates(latitude: f64, longitude: f64) -> Result<Coordinates> {
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(EstimatorError::invalid(format!("coordinates out of range: {latitude},{longitude}")));
    }
    Ok(Coordinates { latitude, longitude })
}

// ─── Reading completion ──────────────────────────────────────────────────────

/// Fills missing fields with clear sky at 25 °C.
pub fn reading_with_defaults(raw: RawWeather) -> WeatherReading {
    WeatherReading {
        cloud_percent: raw.cloud_percent.unwrap_or(DEFAULT_CLOUD_PERCENT),
        air_temp_c: raw.air_temp_c.unwrap_or(DEFAULT_AIR_TEMP_C),
    }
}

/// Both fields must be present.
pub fn strict_reading(raw: RawWeather) -> Result<WeatherReading> {
    match (raw.cloud_percent, raw.air_temp_c) {
        (Some(cloud_percent), Some(air_temp_c)) => Ok(WeatherReading { cloud_percent, air_temp_c }),
        _ => Err(EstimatorError::lookup("weather response is missing cloud cover or temperature")),
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakeWeather;
    use super::*;

    #[tokio::test]
    async fn coordinates_skip_the_geocoder() {
        let fake = FakeWeather::default();
        let at = resolve_location(&fake, " 22.5726, 88.3639 ").await.unwrap();
        assert_eq!(at, Coordinates { latitude: 22.5726, longitude: 88.3639 });
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn place_names_are_geocoded() {
        let fake = FakeWeather::default();
        fake.add_place("Kolkata", 22.57, 88.36);
        let at = resolve_location(&fake, "Kolkata").await.unwrap();
        assert_eq!(at.latitude, 22.57);
        assert_eq!(fake.calls(), vec!["geocode Kolkata".to_string()]);
    }

    #[tokio::test]
    async fn unknown_place_is_a_lookup_failure() {
        let fake = FakeWeather::default();
        let err = resolve_location(&fake, "Atlantis").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn malformed_or_empty_location_is_invalid() {
        let fake = FakeWeather::default();
        for text in ["", "   ", "north,east", "95,10", "10,"] {
            assert!(matches!(resolve_location(&fake, text).await, Err(EstimatorError::InvalidInput(_))), "{text:?}");
        }
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let reading = reading_with_defaults(RawWeather { cloud_percent: None, air_temp_c: Some(18.0) });
        assert_eq!(reading, WeatherReading { cloud_percent: 0.0, air_temp_c: 18.0 });
        let reading = reading_with_defaults(RawWeather::default());
        assert_eq!(reading, WeatherReading { cloud_percent: 0.0, air_temp_c: 25.0 });
    }

    #[test]
    fn strict_reading_requires_both_fields() {
        assert!(strict_reading(RawWeather { cloud_percent: Some(10.0), air_temp_c: None }).is_err());
        assert_eq!(
            strict_reading(RawWeather { cloud_percent: Some(10.0), air_temp_c: Some(30.0) }).unwrap(),
            WeatherReading { cloud_percent: 10.0, air_temp_c: 30.0 },
        );
    }

    #[tokio::test]
    #[ignore = "online test"]
    async fn test_openweather_ok() {
        let Ok(api_key) = std::env::var(crate::config::API_KEY_ENV) else { return };
        let client = OpenWeatherClient::new(&WeatherConfig { api_key, ..WeatherConfig::default() });
        let at = client.geocode("Kolkata").await.unwrap();
        let raw = client.current_weather(at).await.unwrap();
        assert!(raw.cloud_percent.is_some());
        assert!(raw.air_temp_c.is_some());
    }
}
