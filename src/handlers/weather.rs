use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::ServerConfig;
use crate::protocol::{GetWeatherParams, ToolResult};
use crate::registry::{parse_arguments, Tool, ToolDefinition, ToolError};

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,wind_speed_10m,precipitation,rain,showers,cloud_cover,apparent_temperature";

/// Failure of either outbound weather lookup.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("{service} request failed: {source}")]
    Http {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{service} returned an unexpected payload: {detail}")]
    Malformed { service: &'static str, detail: String },
}

impl From<WeatherError> for ToolError {
    fn from(e: WeatherError) -> Self {
        ToolError::Upstream(e.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Option<Vec<Location>>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentWeather,
}

/// The subset of Open-Meteo's `current` block we report.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentWeather {
    pub temperature_2m: f64,
    pub relative_humidity_2m: f64,
    pub wind_speed_10m: f64,
    pub precipitation: f64,
    pub cloud_cover: f64,
}

impl CurrentWeather {
    pub fn summary(&self) -> String {
        // `-0` prints with its sign; readings report it as plain `0`.
        let unsigned = |v: f64| v + 0.0;
        format!(
            "Temperature: {}°C\nHumidity: {}%\nWind: {} km/h\nPrecipitation: {} mm\nCloud Cover: {}%",
            unsigned(self.temperature_2m),
            unsigned(self.relative_humidity_2m),
            unsigned(self.wind_speed_10m),
            unsigned(self.precipitation),
            unsigned(self.cloud_cover),
        )
    }
}

/// Geocoding and forecast client. One best-effort call each: no retries,
/// no timeouts, no caching.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    geocoding_url: String,
    forecast_url: String,
}

impl WeatherClient {
    pub fn new(geocoding_url: impl Into<String>, forecast_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            geocoding_url: geocoding_url.into(),
            forecast_url: forecast_url.into(),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.geocoding_url.clone(), config.forecast_url.clone())
    }

    /// First geocoding match for `city`, or `None` when nothing matched.
    pub async fn geocode(&self, city: &str) -> Result<Option<Location>, WeatherError> {
        let request = self.http.get(&self.geocoding_url).query(&[
            ("name", city),
            ("count", "10"),
            ("language", "en"),
            ("format", "json"),
        ]);
        let response: GeocodingResponse = fetch_json(request, "geocoding").await?;
        Ok(response.results.and_then(|r| r.into_iter().next()))
    }

    pub async fn current(&self, location: Location) -> Result<CurrentWeather, WeatherError> {
        let latitude = location.latitude.to_string();
        let longitude = location.longitude.to_string();
        let request = self.http.get(&self.forecast_url).query(&[
            ("latitude", latitude.as_str()),
            ("longitude", longitude.as_str()),
            ("hourly", "temperature_2m"),
            ("current", CURRENT_FIELDS),
        ]);
        let response: ForecastResponse = fetch_json(request, "forecast").await?;
        Ok(response.current)
    }
}

async fn fetch_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    service: &'static str,
) -> Result<T, WeatherError> {
    let http_err = |source| WeatherError::Http { service, source };
    let body = request
        .send()
        .await
        .map_err(http_err)?
        .error_for_status()
        .map_err(http_err)?
        .bytes()
        .await
        .map_err(http_err)?;

    serde_json::from_slice(&body).map_err(|e| WeatherError::Malformed {
        service,
        detail: e.to_string(),
    })
}

/// `getWeather`: current conditions for a city by name.
pub struct GetWeatherTool {
    client: WeatherClient,
}

impl GetWeatherTool {
    pub fn new(client: WeatherClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetWeatherTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "getWeather".into(),
            title: Some("Get weather tool".into()),
            description: Some("Tool to get the weather for a city".into()),
            input_schema: json!({
                "type": "object",
                "required": ["city"],
                "properties": {
                    "city": {
                        "type": "string",
                        "description": "The name of the city to get the weather for"
                    }
                }
            }),
            output_schema: Some(json!({
                "type": "object",
                "required": ["result"],
                "properties": {
                    "result": { "type": "string" }
                }
            })),
        }
    }

    async fn call(&self, arguments: Value) -> Result<ToolResult, ToolError> {
        let params: GetWeatherParams = parse_arguments("getWeather", arguments)?;

        let Some(location) = self.client.geocode(&params.city).await? else {
            let text = format!("City {} not found.", params.city);
            return Ok(ToolResult::structured(text.clone(), json!({ "result": text })));
        };

        let summary = self.client.current(location).await?.summary();
        Ok(ToolResult::structured(summary.clone(), json!({ "result": summary })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_layout() {
        let current = CurrentWeather {
            temperature_2m: 21.5,
            relative_humidity_2m: 40.0,
            wind_speed_10m: 12.3,
            precipitation: 0.0,
            cloud_cover: 75.0,
        };
        assert_eq!(
            current.summary(),
            "Temperature: 21.5°C\nHumidity: 40%\nWind: 12.3 km/h\nPrecipitation: 0 mm\nCloud Cover: 75%"
        );
    }

    #[test]
    fn negative_zero_prints_unsigned() {
        let current = CurrentWeather {
            temperature_2m: -0.0,
            relative_humidity_2m: 55.0,
            wind_speed_10m: 0.0,
            precipitation: -0.0,
            cloud_cover: 0.0,
        };
        assert_eq!(
            current.summary(),
            "Temperature: 0°C\nHumidity: 55%\nWind: 0 km/h\nPrecipitation: 0 mm\nCloud Cover: 0%"
        );
    }
}
