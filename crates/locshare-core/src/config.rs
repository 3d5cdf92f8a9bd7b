//! Configuration for location sharing sessions.

use std::{env, fmt::Display, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Default collection endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://moxalise-api-vk3ygvyuia-ey.a.run.app/api/location";

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Options passed to every geolocation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionOptions {
    /// Ask the provider for its most accurate fix.
    pub high_accuracy: bool,
    /// Give up on the request after this long.
    pub timeout: Duration,
    /// Oldest cached fix the provider may return. Zero forces a fresh fix.
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::ZERO,
        }
    }
}

/// Settings for a sharing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharingConfig {
    /// Collection endpoint samples are POSTed to.
    pub endpoint: String,
    /// Period of the repeating send timer.
    pub send_interval: Duration,
    /// Geolocation request options.
    pub position: PositionOptions,
    /// Highest zoom level the map supports.
    pub max_zoom: f64,
    /// Zoom requested when flying to the user's location.
    pub fly_to_zoom: f64,
    /// Duration of the camera animation.
    pub fly_duration: Duration,
    /// How long a resumed session waits for the map before giving up on
    /// restoring the marker.
    pub map_ready_timeout: Duration,
    /// HTTP request timeout for the sink.
    pub request_timeout: Duration,
}

impl Default for SharingConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            send_interval: Duration::from_secs(5 * 60),
            position: PositionOptions::default(),
            max_zoom: 17.3,
            fly_to_zoom: 13.0,
            fly_duration: Duration::from_millis(1500),
            map_ready_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl SharingConfig {
    /// Load configuration from `LOCSHARE_*` environment variables.
    ///
    /// # Errors
    /// Returns error if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// # Errors
    /// Returns error if a value is present but cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(endpoint) = lookup("LOCSHARE_ENDPOINT") {
            config.endpoint = endpoint;
        } else {
            info!("LOCSHARE_ENDPOINT not set, using default: {}", config.endpoint);
        }
        if let Some(secs) = try_load::<u64, _>(&lookup, "LOCSHARE_INTERVAL_SECS")? {
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    key: "LOCSHARE_INTERVAL_SECS",
                    value: secs.to_string(),
                    reason: "interval must be positive".to_string(),
                });
            }
            config.send_interval = Duration::from_secs(secs);
        }
        if let Some(max_zoom) = try_load(&lookup, "LOCSHARE_MAX_ZOOM")? {
            config.max_zoom = max_zoom;
        }
        if let Some(secs) = try_load(&lookup, "LOCSHARE_MAP_READY_TIMEOUT_SECS")? {
            config.map_ready_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Zoom used when centering on the user, capped at `max_zoom`.
    #[must_use]
    pub fn capped_zoom(&self) -> f64 {
        self.fly_to_zoom.min(self.max_zoom)
    }
}

fn try_load<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        info!("{key} not set, using default");
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SharingConfig::default();
        assert_eq!(config.send_interval, Duration::from_secs(300));
        assert_eq!(config.position.timeout, Duration::from_secs(10));
        assert_eq!(config.position.maximum_age, Duration::ZERO);
        assert!(config.position.high_accuracy);
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_capped_zoom() {
        let mut config = SharingConfig::default();
        assert!((config.capped_zoom() - 13.0).abs() < f64::EPSILON);

        config.max_zoom = 10.0;
        assert!((config.capped_zoom() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = SharingConfig::from_lookup(lookup_from(&[
            ("LOCSHARE_ENDPOINT", "http://localhost:8080/api/location"),
            ("LOCSHARE_INTERVAL_SECS", "60"),
            ("LOCSHARE_MAX_ZOOM", "12.5"),
        ]))
        .unwrap();

        assert_eq!(config.endpoint, "http://localhost:8080/api/location");
        assert_eq!(config.send_interval, Duration::from_secs(60));
        assert!((config.max_zoom - 12.5).abs() < f64::EPSILON);
        assert_eq!(config.map_ready_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let err = SharingConfig::from_lookup(lookup_from(&[("LOCSHARE_INTERVAL_SECS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("LOCSHARE_INTERVAL_SECS"));

        assert!(
            SharingConfig::from_lookup(lookup_from(&[("LOCSHARE_INTERVAL_SECS", "0")])).is_err()
        );
    }
}
