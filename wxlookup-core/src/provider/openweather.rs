use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::debug;

use crate::{
    config::{Config, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS},
    error::LookupError,
    model::{Coordinates, ForecastEntry, ForecastList, LocationQuery, UNKNOWN},
};

use super::{CurrentConditions, WeatherProvider, unix_to_utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Weather,
    Forecast,
}

impl Endpoint {
    fn path(self) -> &'static str {
        match self {
            Endpoint::Weather => "data/2.5/weather",
            Endpoint::Forecast => "data/2.5/forecast",
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: String) -> Result<Self, LookupError> {
        Self::with_base_url(
            DEFAULT_BASE_URL,
            api_key,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, LookupError> {
        let http = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { api_key, base_url, http })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let api_key = config.resolve_api_key()?;
        Self::with_base_url(config.base_url(), api_key, config.timeout())
            .context("Failed to build OpenWeather HTTP client")
    }

    /// Single entry point for every OpenWeather call: build the URL, send,
    /// branch on HTTP status and `cod`, then decode the payload.
    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        query: &LocationQuery,
    ) -> Result<T, LookupError> {
        let url = format!("{}/{}", self.base_url, endpoint.path());

        let mut params = query.query_pairs();
        params.push(("appid", self.api_key.clone()));
        params.push(("units", "metric".to_string()));

        debug!(endpoint = endpoint.path(), %query, "sending OpenWeather request");

        let res = self.http.get(&url).query(&params).send().await?;
        let status = res.status();
        let body = res.text().await?;

        // Error bodies share the `{cod, message}` shape across endpoints.
        let envelope: OwStatus = serde_json::from_str(&body).unwrap_or_default();
        let cod_failed = envelope.cod.as_ref().is_some_and(|cod| !cod.is_success());

        if !status.is_success() || cod_failed {
            let message = envelope
                .message
                .and_then(|m| m.as_str().map(str::to_owned))
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| {
                    format!("request failed with status {}: {}", status, truncate_body(&body))
                });
            debug!(endpoint = endpoint.path(), %status, %message, "OpenWeather request failed");
            return Err(LookupError::Api { message });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// `cod` is a number on the weather endpoint and a string on forecast and
/// error bodies.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OwCod {
    Number(i64),
    Text(String),
}

impl OwCod {
    fn is_success(&self) -> bool {
        match self {
            OwCod::Number(n) => *n == 200,
            OwCod::Text(s) => s.trim().parse::<i64>().ok() == Some(200),
        }
    }
}

/// `message` is a string on errors but a number on successful forecasts.
#[derive(Debug, Default, Deserialize)]
struct OwStatus {
    cod: Option<OwCod>,
    message: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    name: String,
    coord: Option<OwCoord>,
    sys: Option<OwSys>,
    #[serde(default)]
    weather: Vec<OwWeather>,
    main: OwMain,
    dt: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    #[serde(default)]
    list: Vec<OwForecastEntry>,
}

impl From<OwCurrentResponse> for CurrentConditions {
    fn from(parsed: OwCurrentResponse) -> Self {
        Self {
            name: parsed.name,
            coordinates: parsed.coord.map(|c| Coordinates::new(c.lat, c.lon)),
            country: parsed.sys.and_then(|s| s.country),
            description: parsed.weather.into_iter().next().map(|w| w.description),
            temperature_celsius: parsed.main.temp,
            dt: parsed.dt,
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current(&self, query: &LocationQuery) -> Result<CurrentConditions, LookupError> {
        let parsed: OwCurrentResponse = self.fetch(Endpoint::Weather, query).await?;
        Ok(parsed.into())
    }

    async fn forecast(&self, query: &LocationQuery) -> Result<ForecastList, LookupError> {
        let parsed: OwForecastResponse = self.fetch(Endpoint::Forecast, query).await?;

        Ok(parsed
            .list
            .into_iter()
            .filter_map(|entry| {
                Some(ForecastEntry {
                    timestamp: unix_to_utc(entry.dt)?,
                    description: entry
                        .weather
                        .into_iter()
                        .next()
                        .map(|w| w.description)
                        .unwrap_or_else(|| UNKNOWN.to_string()),
                    temperature_celsius: entry.main.temp,
                })
            })
            .collect())
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> OpenWeatherClient {
        OpenWeatherClient::with_base_url(server.uri(), "TEST_KEY".into(), Duration::from_secs(5))
            .unwrap()
    }

    #[tokio::test]
    async fn current_by_city_sends_key_and_units() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("q", "London"))
            .and(query_param("appid", "TEST_KEY"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "cod": 200,
                "name": "London",
                "coord": {"lat": 51.5, "lon": -0.1},
                "sys": {"country": "GB"},
                "weather": [{"description": "clear sky"}],
                "main": {"temp": 15.2},
                "dt": 1700000000
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let current = client(&mock_server)
            .current(&LocationQuery::city("London"))
            .await
            .unwrap();

        assert_eq!(current.name, "London");
        assert_eq!(current.country.as_deref(), Some("GB"));
        assert_eq!(current.coordinates, Some(Coordinates::new(51.5, -0.1)));
        assert_eq!(current.description.as_deref(), Some("clear sky"));
        assert_eq!(current.temperature_celsius, 15.2);
        assert_eq!(current.dt, Some(1_700_000_000));
    }

    #[tokio::test]
    async fn current_by_coordinates_uses_lat_lon() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("lat", "48.85"))
            .and(query_param("lon", "2.35"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "cod": 200,
                "name": "Paris",
                "weather": [],
                "main": {"temp": 9.0}
            })))
            .mount(&mock_server)
            .await;

        let current = client(&mock_server)
            .current(&LocationQuery::coordinates(48.85, 2.35))
            .await
            .unwrap();

        assert_eq!(current.name, "Paris");
        assert!(current.country.is_none());
        assert!(current.description.is_none());
        assert!(current.dt.is_none());
    }

    #[tokio::test]
    async fn not_found_status_surfaces_upstream_message() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "cod": "404",
                "message": "city not found"
            })))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server)
            .current(&LocationQuery::city("Nowhereville"))
            .await
            .unwrap_err();

        match err {
            LookupError::Api { message } => assert_eq!(message, "city not found"),
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cod_in_ok_body_is_checked() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "cod": 404,
                "message": "city not found"
            })))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server)
            .current(&LocationQuery::city("Nowhereville"))
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Error: city not found");
    }

    #[tokio::test]
    async fn non_json_error_body_falls_back_to_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server)
            .current(&LocationQuery::city("London"))
            .await
            .unwrap_err();

        let msg = err.user_message();
        assert!(msg.contains("502"), "message should mention status: {msg}");
        assert!(msg.contains("bad gateway"));
    }

    #[tokio::test]
    async fn malformed_success_body_is_decode_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server)
            .current(&LocationQuery::city("London"))
            .await
            .unwrap_err();

        assert!(matches!(err, LookupError::Decode(_)));
    }

    #[tokio::test]
    async fn forecast_keeps_api_order_and_string_cod() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .and(query_param("q", "London"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "cod": "200",
                "list": [
                    {"dt": 1700010800, "weather": [{"description": "light rain"}], "main": {"temp": 12.0}},
                    {"dt": 1700021600, "weather": [{"description": "overcast clouds"}], "main": {"temp": 11.5}}
                ]
            })))
            .mount(&mock_server)
            .await;

        let list = client(&mock_server)
            .forecast(&LocationQuery::city("London"))
            .await
            .unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(list[0].timestamp.timestamp(), 1_700_010_800);
        assert_eq!(list[0].description, "light rain");
        assert_eq!(list[1].temperature_celsius, 11.5);
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = OpenWeatherClient::with_base_url(
            format!("http://{addr}"),
            "TEST_KEY".into(),
            Duration::from_secs(5),
        )
        .unwrap();

        let err = client.current(&LocationQuery::city("London")).await.unwrap_err();
        assert!(matches!(err, LookupError::Network(_)));
    }

    #[test]
    fn truncate_body_limits_length() {
        let long = "x".repeat(500);
        let out = truncate_body(&long);
        assert_eq!(out.len(), 203);
        assert!(out.ends_with("..."));

        assert_eq!(truncate_body("short"), "short");
    }
}
