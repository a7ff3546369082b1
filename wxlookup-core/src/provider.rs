use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

use crate::{
    error::LookupError,
    model::{Coordinates, ForecastList, LocationQuery, UNKNOWN},
};

pub mod openweather;

pub use openweather::OpenWeatherClient;

/// Current-weather payload, reduced to the fields a lookup consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub name: String,
    pub coordinates: Option<Coordinates>,
    pub country: Option<String>,
    pub description: Option<String>,
    pub temperature_celsius: f64,
    /// Observation time as a unix timestamp.
    pub dt: Option<i64>,
}

impl CurrentConditions {
    pub fn country_code(&self) -> String {
        self.country
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(UNKNOWN)
            .to_string()
    }

    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        self.dt.and_then(unix_to_utc)
    }

    pub fn description(&self) -> String {
        self.description.clone().unwrap_or_else(|| UNKNOWN.to_string())
    }
}

/// Remote source of weather data.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current(&self, query: &LocationQuery) -> Result<CurrentConditions, LookupError>;

    /// Full forecast as returned by the service, in chronological order.
    async fn forecast(&self, query: &LocationQuery) -> Result<ForecastList, LookupError>;
}

pub(crate) fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}
