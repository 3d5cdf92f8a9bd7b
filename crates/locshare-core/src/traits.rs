//! Collaborator traits consumed by a sharing session.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::{Coordinates, LocationSample, Position, PositionOptions};

pub use crate::ui::{Notice, PhoneEntry, SharingUi, StartControl, StopControl};

/// Persisted key holding the last phone number used to share.
pub const LAST_PHONE_NUMBER_KEY: &str = "lastPhoneNumber";
/// Persisted key holding the last sample, serialized as JSON.
pub const LAST_SENT_LOCATION_KEY: &str = "lastSentLocation";

/// Geolocation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("Geolocation is not supported on this platform")]
    Unsupported,
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location request timed out")]
    Timeout,
    #[error("Position unavailable: {0}")]
    Unavailable(String),
}

/// Trait for device geolocation.
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    /// Request a single position fix.
    async fn current_position(&self, options: &PositionOptions)
    -> Result<Position, PositionError>;
}

/// Handle to a marker placed on a map surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkerId(pub Uuid);

impl MarkerId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MarkerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Map error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("Map is not ready")]
    NotReady,
    #[error("Marker not found: {0}")]
    MarkerNotFound(MarkerId),
    #[error("Map error: {0}")]
    Internal(String),
}

/// Trait for the map rendering surface.
#[async_trait]
pub trait MapSurface: Send + Sync {
    /// Whether the map has finished initializing.
    fn is_ready(&self) -> bool;

    /// Resolve once the map is ready. Returns immediately if it already is.
    async fn ready(&self);

    /// Place a marker and return its handle.
    fn place_marker(&self, at: Coordinates) -> Result<MarkerId, MapError>;

    /// Remove a previously placed marker.
    fn remove_marker(&self, id: MarkerId) -> Result<(), MapError>;

    /// Animate the camera to `center`.
    fn fly_to(&self, center: Coordinates, zoom: f64, duration: Duration) -> Result<(), MapError>;
}

/// Sink error.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Could not encode sample: {0}")]
    Encode(String),
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("Unexpected status: {0}")]
    Status(u16),
    #[error("Invalid response body: {0}")]
    Decode(String),
}

/// Trait for the remote collection endpoint.
#[async_trait]
pub trait LocationSink: Send + Sync {
    /// Deliver one sample. Returns the decoded JSON response on success.
    async fn send(&self, sample: &LocationSample) -> Result<Value, SinkError>;
}

/// Storage error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Storage error: {0}")]
    Internal(String),
}

/// Trait for the durable key/value store backing session resumption.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Get a value by key.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Set a value, overwriting any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a value. Missing keys are not an error.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}
