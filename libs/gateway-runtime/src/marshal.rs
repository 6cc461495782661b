//! Content marshalers and their selection per request.

use std::collections::HashMap;
use std::sync::Arc;

use http::HeaderMap;
use http::header::{ACCEPT, CONTENT_TYPE, HeaderValue};
use thiserror::Error;

/// MIME key matching any request without a registered content type.
pub const MIME_WILDCARD: &str = "*";

#[derive(Error, Debug)]
pub enum MarshalError {
    #[error("{0}")]
    Decode(String),

    #[error("{0}")]
    Encode(String),
}

/// Converts between wire bytes and the JSON value model used for binding and
/// projection.
pub trait Marshaler: Send + Sync + 'static {
    /// `Content-Type` written on responses encoded by this marshaler.
    fn content_type(&self) -> HeaderValue;

    /// Decode a non-empty request body.
    ///
    /// # Errors
    /// Returns [`MarshalError::Decode`] when `bytes` is not valid input.
    fn decode(&self, bytes: &[u8]) -> Result<serde_json::Value, MarshalError>;

    /// Encode a response value.
    ///
    /// # Errors
    /// Returns [`MarshalError::Encode`] when the value cannot be written.
    fn encode(&self, value: &serde_json::Value) -> Result<Vec<u8>, MarshalError>;
}

/// JSON marshaler, compact by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMarshaler {
    pretty: bool,
}

impl JsonMarshaler {
    #[must_use]
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Marshaler for JsonMarshaler {
    fn content_type(&self) -> HeaderValue {
        HeaderValue::from_static("application/json")
    }

    fn decode(&self, bytes: &[u8]) -> Result<serde_json::Value, MarshalError> {
        serde_json::from_slice(bytes).map_err(|e| MarshalError::Decode(e.to_string()))
    }

    fn encode(&self, value: &serde_json::Value) -> Result<Vec<u8>, MarshalError> {
        let encoded = if self.pretty {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        };
        encoded.map_err(|e| MarshalError::Encode(e.to_string()))
    }
}

/// Marshalers keyed by MIME type.
#[derive(Clone)]
pub struct MarshalerRegistry {
    by_mime: HashMap<String, Arc<dyn Marshaler>>,
}

impl Default for MarshalerRegistry {
    fn default() -> Self {
        let mut by_mime: HashMap<String, Arc<dyn Marshaler>> = HashMap::new();
        by_mime.insert(MIME_WILDCARD.to_owned(), Arc::new(JsonMarshaler::default()));
        by_mime.insert("application/json".to_owned(), Arc::new(JsonMarshaler::default()));
        Self { by_mime }
    }
}

fn mime_of(value: &HeaderValue) -> Option<String> {
    let raw = value.to_str().ok()?;
    let mime = raw.split(';').next()?.trim();
    (!mime.is_empty()).then(|| mime.to_ascii_lowercase())
}

impl MarshalerRegistry {
    pub fn insert(&mut self, mime: impl Into<String>, marshaler: Arc<dyn Marshaler>) {
        self.by_mime.insert(mime.into().to_ascii_lowercase(), marshaler);
    }

    fn get(&self, mime: &str) -> Option<Arc<dyn Marshaler>> {
        self.by_mime.get(mime).cloned()
    }

    fn fallback(&self) -> Arc<dyn Marshaler> {
        self.get(MIME_WILDCARD)
            .unwrap_or_else(|| Arc::new(JsonMarshaler::default()))
    }

    /// Pick the inbound and outbound marshalers for a request.
    ///
    /// Inbound follows `Content-Type`. Outbound follows the first `Accept`
    /// entry with a registered marshaler and falls back to the inbound one.
    #[must_use]
    pub fn for_request(&self, headers: &HeaderMap) -> (Arc<dyn Marshaler>, Arc<dyn Marshaler>) {
        let inbound = headers
            .get(CONTENT_TYPE)
            .and_then(mime_of)
            .and_then(|mime| self.get(&mime))
            .unwrap_or_else(|| self.fallback());

        let outbound = headers
            .get_all(ACCEPT)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .filter_map(|entry| {
                let mime = entry.split(';').next()?.trim().to_ascii_lowercase();
                self.get(&mime)
            })
            .next()
            .unwrap_or_else(|| Arc::clone(&inbound));

        (inbound, outbound)
    }
}
