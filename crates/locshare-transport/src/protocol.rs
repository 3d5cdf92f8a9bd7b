//! Wire protocol for the collection endpoint.
//!
//! The request body is the sample itself as a JSON object. A response
//! counts as accepted only with a 2xx status and a JSON body.

use locshare_core::{LocationSample, traits::SinkError};
use serde_json::Value;

/// Content type of requests and expected responses.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Encode a sample as a request body.
///
/// # Errors
/// Returns error if serialization fails.
pub fn encode_sample(sample: &LocationSample) -> Result<Vec<u8>, SinkError> {
    serde_json::to_vec(sample).map_err(|e| SinkError::Encode(e.to_string()))
}

/// Classify a response by status and body.
///
/// # Errors
/// Returns `Status` for non-2xx responses and `Decode` if the body is not
/// JSON.
pub fn decode_response(status: u16, body: &[u8]) -> Result<Value, SinkError> {
    if !(200..300).contains(&status) {
        return Err(SinkError::Status(status));
    }
    serde_json::from_slice(body).map_err(|e| SinkError::Decode(e.to_string()))
}
