//! Position fixes and the samples built from them.

use serde::{Deserialize, Serialize};

use crate::PhoneNumber;

/// Message attached to every sample.
pub const SAMPLE_MESSAGE: &str = "Location update";

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Extract coordinates from a persisted sample.
    ///
    /// Only `latitude` and `longitude` are read. Zero values count as
    /// missing, so `Ok(None)` is returned for them.
    ///
    /// # Errors
    /// Returns error if `raw` is not a JSON object with numeric coordinates.
    pub fn from_persisted(raw: &str) -> Result<Option<Self>, serde_json::Error> {
        let coords: Self = serde_json::from_str(raw)?;
        if coords.latitude == 0.0 || coords.longitude == 0.0 {
            return Ok(None);
        }
        Ok(Some(coords))
    }
}

/// A raw fix reported by a geolocation provider.
///
/// Optional readings are `None` when the device does not report them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub altitude: Option<f64>,
    pub altitude_accuracy: Option<f64>,
    pub heading: Option<f64>,
    pub speed: Option<f64>,
}

impl Position {
    /// A fix with only coordinates.
    #[must_use]
    pub const fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: None,
            altitude: None,
            altitude_accuracy: None,
            heading: None,
            speed: None,
        }
    }

    #[must_use]
    pub const fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// One captured position plus identity, sent to the sink and persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
    pub altitude: f64,
    pub altitude_accuracy: f64,
    pub heading: f64,
    pub speed: f64,
    pub phone_number: PhoneNumber,
    pub message: String,
}

impl LocationSample {
    /// Build a sample, normalizing missing or NaN readings to zero.
    #[must_use]
    pub fn from_position(position: &Position, phone_number: &PhoneNumber) -> Self {
        Self {
            latitude: position.latitude,
            longitude: position.longitude,
            accuracy: reading(position.accuracy),
            altitude: reading(position.altitude),
            altitude_accuracy: reading(position.altitude_accuracy),
            heading: reading(position.heading),
            speed: reading(position.speed),
            phone_number: phone_number.clone(),
            message: SAMPLE_MESSAGE.to_string(),
        }
    }

    #[must_use]
    pub const fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

fn reading(value: Option<f64>) -> f64 {
    value.filter(|v| !v.is_nan()).unwrap_or(0.0)
}
