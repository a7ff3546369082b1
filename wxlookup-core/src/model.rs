use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of forecast entries kept per lookup.
pub const FORECAST_LEN: usize = 5;

/// Placeholder for derived fields that could not be resolved.
pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Input of a single lookup: a free-form city name or a coordinate pair.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    City(String),
    Coordinates(Coordinates),
}

impl LocationQuery {
    pub fn city(name: impl Into<String>) -> Self {
        Self::City(name.into())
    }

    pub fn coordinates(lat: f64, lon: f64) -> Self {
        Self::Coordinates(Coordinates::new(lat, lon))
    }

    /// Query parameters identifying the location, without credentials.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::City(name) => vec![("q", name.clone())],
            Self::Coordinates(c) => vec![("lat", c.lat.to_string()), ("lon", c.lon.to_string())],
        }
    }
}

impl std::fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::City(name) => write!(f, "city '{name}'"),
            Self::Coordinates(c) => write!(f, "coordinates ({}, {})", c.lat, c.lon),
        }
    }
}

/// Current conditions for the resolved location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSnapshot {
    pub location_name: String,
    pub country_code: String,
    pub description: String,
    pub temperature_celsius: f64,
    pub observed_at: Option<DateTime<Utc>>,
    /// Formatted in the local time zone, or [`UNKNOWN`].
    pub local_date_time: String,
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastEntry {
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub temperature_celsius: f64,
}

pub type ForecastList = Vec<ForecastEntry>;

/// View-model consumed by the presentation layer.
///
/// Outside of an in-flight lookup exactly one of `weather` and `error` is set
/// (both are empty before the first lookup).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LookupState {
    pub weather: Option<WeatherSnapshot>,
    pub forecast: Option<ForecastList>,
    pub error: Option<String>,
    pub loading: bool,
}

impl LookupState {
    pub(crate) fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub(crate) fn succeed(weather: WeatherSnapshot, forecast: ForecastList) -> Self {
        Self {
            weather: Some(weather),
            forecast: Some(forecast),
            error: None,
            loading: false,
        }
    }

    pub(crate) fn fail(message: String) -> Self {
        Self {
            weather: None,
            forecast: None,
            error: Some(message),
            loading: false,
        }
    }

    pub fn is_settled(&self) -> bool {
        !self.loading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_query_pairs() {
        let q = LocationQuery::city("London");
        assert_eq!(q.query_pairs(), vec![("q", "London".to_string())]);
    }

    #[test]
    fn coordinate_query_pairs() {
        let q = LocationQuery::coordinates(51.5, -0.1);
        assert_eq!(
            q.query_pairs(),
            vec![("lat", "51.5".to_string()), ("lon", "-0.1".to_string())]
        );
    }

    #[test]
    fn begin_sets_loading_and_clears_error_only() {
        let mut state = LookupState::fail("Error: boom".into());
        state.begin();

        assert!(state.loading);
        assert!(state.error.is_none());
        assert!(state.weather.is_none());
    }

    #[test]
    fn fail_clears_results() {
        let state = LookupState::fail("Error: city not found".into());
        assert!(state.is_settled());
        assert!(state.weather.is_none());
        assert!(state.forecast.is_none());
        assert_eq!(state.error.as_deref(), Some("Error: city not found"));
    }
}
