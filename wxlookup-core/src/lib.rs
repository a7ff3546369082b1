//! Core library for the `wxlookup` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client behind the [`WeatherProvider`] seam
//! - The lookup orchestrator and the state it drives
//! - Plain-text rendering of that state
//!
//! It is used by `wxlookup-cli`, but can also back other front-ends.

pub mod config;
pub mod error;
pub mod geolocation;
pub mod model;
pub mod orchestrator;
pub mod provider;
pub mod render;

pub use config::Config;
pub use error::{LocationError, LookupError};
pub use geolocation::{FixedLocation, Geolocator};
pub use model::{
    Coordinates, ForecastEntry, ForecastList, LocationQuery, LookupState, WeatherSnapshot,
};
pub use orchestrator::WeatherOrchestrator;
pub use provider::{CurrentConditions, OpenWeatherClient, WeatherProvider};
