//! Plain-text rendering of a [`LookupState`], mirroring the widget's result
//! area: loading line, error line, current conditions, then the forecast.

use chrono::{DateTime, Local, TimeZone, Utc};
use std::fmt::{Display, Write};

use crate::model::{ForecastEntry, LookupState, WeatherSnapshot};

const DATE_TIME_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";
const DATE_FORMAT: &str = "%-m/%-d/%Y";

/// Timestamp in the machine's local time zone, e.g. `11/14/2023, 10:13:20 PM`.
pub fn format_local_date_time(at: DateTime<Utc>) -> String {
    format_date_time_in(at, &Local)
}

pub fn format_date_time_in<Tz>(at: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.with_timezone(tz).format(DATE_TIME_FORMAT).to_string()
}

pub fn format_date_in<Tz>(at: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.with_timezone(tz).format(DATE_FORMAT).to_string()
}

pub fn format_temperature(celsius: f64) -> String {
    format!("{celsius}°C")
}

pub fn header(weather: &WeatherSnapshot) -> String {
    format!("{}, {}", weather.location_name, weather.country_code)
}

/// Render the whole state using local-time forecast dates.
pub fn render(state: &LookupState) -> String {
    render_in(state, &Local)
}

pub fn render_in<Tz>(state: &LookupState, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut out = String::new();

    if state.loading {
        out.push_str("Loading...\n");
    }
    if let Some(error) = &state.error {
        let _ = writeln!(out, "{error}");
    }
    if let Some(weather) = &state.weather {
        let _ = writeln!(out, "{}", header(weather));
        let _ = writeln!(out, "{}", weather.description);
        let _ = writeln!(out, "{}", format_temperature(weather.temperature_celsius));
        let _ = writeln!(out, "{}", weather.local_date_time);
    }
    if let Some(forecast) = state.forecast.as_ref().filter(|f| !f.is_empty()) {
        out.push_str("\nForecast\n");
        for entry in forecast {
            let _ = writeln!(out, "{}", forecast_line(entry, tz));
        }
    }

    out
}

fn forecast_line<Tz>(entry: &ForecastEntry, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "  {:<12} {:<24} {}",
        format_date_in(entry.timestamp, tz),
        entry.description,
        format_temperature(entry.temperature_celsius)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LookupState;

    fn london() -> WeatherSnapshot {
        WeatherSnapshot {
            location_name: "London".into(),
            country_code: "GB".into(),
            description: "clear sky".into(),
            temperature_celsius: 15.2,
            observed_at: DateTime::from_timestamp(1_700_000_000, 0),
            local_date_time: "11/14/2023, 10:13:20 PM".into(),
            coordinates: None,
        }
    }

    #[test]
    fn formats_in_given_zone() {
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(format_date_time_in(at, &Utc), "11/14/2023, 10:13:20 PM");
        assert_eq!(format_date_in(at, &Utc), "11/14/2023");
    }

    #[test]
    fn temperature_uses_shortest_form() {
        assert_eq!(format_temperature(15.2), "15.2°C");
        assert_eq!(format_temperature(-3.0), "-3°C");
    }

    #[test]
    fn renders_current_conditions() {
        let state = LookupState {
            weather: Some(london()),
            forecast: Some(vec![ForecastEntry {
                timestamp: DateTime::from_timestamp(1_700_010_800, 0).unwrap(),
                description: "light rain".into(),
                temperature_celsius: 12.0,
            }]),
            error: None,
            loading: false,
        };

        let out = render_in(&state, &Utc);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[0], "London, GB");
        assert_eq!(lines[1], "clear sky");
        assert_eq!(lines[2], "15.2°C");
        assert_eq!(lines[3], "11/14/2023, 10:13:20 PM");
        assert!(out.contains("Forecast"));
        assert!(out.contains("11/15/2023"));
        assert!(out.contains("light rain"));
        assert!(out.contains("12°C"));
    }

    #[test]
    fn renders_error_without_results() {
        let state = LookupState::fail("Error: city not found".into());
        let out = render_in(&state, &Utc);

        assert_eq!(out, "Error: city not found\n");
    }

    #[test]
    fn renders_loading_indicator() {
        let state = LookupState { loading: true, ..Default::default() };
        assert_eq!(render_in(&state, &Utc), "Loading...\n");
    }
}
