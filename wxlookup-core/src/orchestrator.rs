//! Lookup orchestration: one primary current-weather request, then the
//! forecast, merged into a shared [`LookupState`].
//!
//! Every lookup takes a generation number when it starts. A finished lookup
//! writes to the shared state only if it is still the newest one, so results
//! of superseded lookups are dropped instead of overwriting newer ones.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::LookupError,
    geolocation::Geolocator,
    model::{FORECAST_LEN, ForecastList, LocationQuery, LookupState, UNKNOWN, WeatherSnapshot},
    provider::{CurrentConditions, WeatherProvider},
    render::format_local_date_time,
};

#[derive(Debug)]
pub struct WeatherOrchestrator<P> {
    provider: P,
    state: RwLock<LookupState>,
    generation: AtomicU64,
    started: AtomicBool,
}

impl<P: WeatherProvider> WeatherOrchestrator<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            state: RwLock::new(LookupState::default()),
            generation: AtomicU64::new(0),
            started: AtomicBool::new(false),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Snapshot of the shared state as the presentation layer sees it.
    pub async fn state(&self) -> LookupState {
        self.state.read().await.clone()
    }

    pub async fn lookup_by_city(&self, city: &str) -> LookupState {
        self.lookup(LocationQuery::city(city)).await
    }

    pub async fn lookup_by_coordinates(&self, lat: f64, lon: f64) -> LookupState {
        self.lookup(LocationQuery::coordinates(lat, lon)).await
    }

    /// Run one lookup and return the state it produced.
    ///
    /// The returned value is this lookup's own outcome; the shared state only
    /// receives it when no newer lookup started in the meantime.
    #[instrument(skip_all, fields(query = %query))]
    pub async fn lookup(&self, query: LocationQuery) -> LookupState {
        let generation = self.begin().await;
        info!(generation, "lookup started");

        let outcome = match self.run(&query).await {
            Ok((weather, forecast)) => {
                info!(generation, location = %weather.location_name, "lookup succeeded");
                LookupState::succeed(weather, forecast)
            }
            Err(err) => {
                warn!(generation, error = %err, "lookup failed");
                LookupState::fail(err.user_message())
            }
        };

        self.apply(generation, &outcome).await;
        outcome
    }

    /// Geolocation-triggered lookup. Runs at most once per orchestrator;
    /// later calls return `None` without touching the state.
    pub async fn start<G: Geolocator + ?Sized>(&self, geolocator: &G) -> Option<LookupState> {
        if self.started.swap(true, Ordering::SeqCst) {
            debug!("geolocation lookup already performed");
            return None;
        }

        match geolocator.current_position().await {
            Ok(position) => Some(self.lookup(LocationQuery::Coordinates(position)).await),
            Err(err) => {
                let err = LookupError::from(err);
                warn!(error = %err, "skipping local weather lookup");

                let generation = self.begin().await;
                let outcome = LookupState::fail(err.user_message());
                self.apply(generation, &outcome).await;
                Some(outcome)
            }
        }
    }

    /// Country code for a position, or `"Unknown"` on any failure.
    pub async fn resolve_country(&self, lat: f64, lon: f64) -> String {
        match self.provider.current(&LocationQuery::coordinates(lat, lon)).await {
            Ok(current) => current.country_code(),
            Err(err) => {
                warn!(lat, lon, error = %err, "could not resolve country");
                UNKNOWN.to_string()
            }
        }
    }

    /// Observation time for a position in local time, or `"Unknown"`.
    pub async fn resolve_local_date_time(&self, lat: f64, lon: f64) -> String {
        match self.provider.current(&LocationQuery::coordinates(lat, lon)).await {
            Ok(current) => local_date_time(&current),
            Err(err) => {
                warn!(lat, lon, error = %err, "could not resolve local date/time");
                UNKNOWN.to_string()
            }
        }
    }

    async fn run(
        &self,
        query: &LocationQuery,
    ) -> Result<(WeatherSnapshot, ForecastList), LookupError> {
        let current = self.provider.current(query).await?;

        let mut forecast = self.provider.forecast(query).await?;
        forecast.truncate(FORECAST_LEN);

        Ok((snapshot(current), forecast))
    }

    /// Mark the shared state as loading and claim a new generation.
    async fn begin(&self) -> u64 {
        let mut state = self.state.write().await;
        state.begin();
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn apply(&self, generation: u64, outcome: &LookupState) {
        let mut state = self.state.write().await;

        let latest = self.generation.load(Ordering::SeqCst);
        if generation != latest {
            debug!(generation, latest, "discarding result of superseded lookup");
            return;
        }

        *state = outcome.clone();
    }
}

fn local_date_time(current: &CurrentConditions) -> String {
    current
        .observed_at()
        .map(format_local_date_time)
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Derive the snapshot, including country and local time, from the primary
/// payload.
fn snapshot(current: CurrentConditions) -> WeatherSnapshot {
    let country_code = current.country_code();
    if country_code == UNKNOWN {
        warn!(location = %current.name, "country missing from weather response");
    }

    let local_date_time = local_date_time(&current);
    if local_date_time == UNKNOWN {
        warn!(location = %current.name, "observation time missing from weather response");
    }

    WeatherSnapshot {
        description: current.description(),
        observed_at: current.observed_at(),
        location_name: current.name,
        temperature_celsius: current.temperature_celsius,
        coordinates: current.coordinates,
        country_code,
        local_date_time,
    }
}
