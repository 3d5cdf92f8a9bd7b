//! Core abstractions for location sharing sessions.
//!
//! This crate provides the fundamental building blocks:
//! - `LocationSample` - One captured position plus the sharing identity
//! - `PhoneNumber` - Validated sharing identity
//! - `SharingConfig` - Interval, endpoint and geolocation settings
//! - `EventStore` - Broadcast + history of session events
//! - Collaborator traits (geolocation, map, sink, persisted state)
//! - `SharingUi` - Abstract UI surface

pub mod config;
pub mod event;
pub mod event_store;
pub mod phone;
pub mod sample;
pub mod traits;
pub mod ui;

pub use config::{ConfigError, PositionOptions, SharingConfig};
pub use event::SessionEvent;
pub use event_store::EventStore;
pub use phone::{PhoneNumber, validate_phone_number};
pub use sample::{Coordinates, LocationSample, Position};
pub use traits::{GeolocationProvider, LocationSink, MapSurface, StateStore};
pub use ui::{Notice, SharingUi};
