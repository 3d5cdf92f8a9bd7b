//! Transport layer for location samples.
//!
//! Provides:
//! - Wire protocol (JSON request body, response classification)
//! - HTTP sink (feature: http)

pub mod protocol;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::HttpSink;
pub use protocol::{CONTENT_TYPE_JSON, decode_response, encode_sample};
