use thiserror::Error;

/// Failure reported by a [`crate::Geolocator`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location unavailable")]
    Unavailable,
}

/// Why a lookup (or a single request inside it) failed.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("geolocation failed: {0}")]
    Geolocation(#[from] LocationError),

    /// The service answered with a non-success status or `cod`.
    #[error("weather API returned an error: {message}")]
    Api { message: String },

    #[error("request to weather API failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("could not decode weather API response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl LookupError {
    /// Text shown to the user in place of results.
    pub fn user_message(&self) -> String {
        match self {
            LookupError::Geolocation(_) => {
                "Geolocation error: Unable to retrieve your location".to_string()
            }
            LookupError::Api { message } => format!("Error: {message}"),
            LookupError::Network(_) | LookupError::Decode(_) => {
                "Network error: Unable to fetch the weather data".to_string()
            }
        }
    }
}
