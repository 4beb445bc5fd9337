//! Cache Envelope Module
//!
//! The physically stored form of a cache entry: a JSON body carrying
//! bookkeeping metadata next to the original payload, with the original
//! content type relocated to a side header.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::{StrategyHint, Ttl};
use crate::error::{Result, WorkerError};
use crate::models::WorkerResponse;

// == Envelope Headers ==
/// Header carrying the payload's original content type while stored.
pub const ORIGINAL_CONTENT_TYPE_HEADER: &str = "X-Original-Content-Type";
/// Header mirroring the envelope expiry timestamp.
pub const TTL_HEADER: &str = "X-TTL";
/// Header mirroring the envelope access timestamp.
pub const ACCESS_TIME_HEADER: &str = "X-AccessTime";

// == Envelope Metadata ==
/// Bookkeeping stored alongside a cached payload.
///
/// `expiresAt` and `cacheTtl` travel as strings because JSON cannot carry
/// an infinite number; in memory "never expires" is `None`/`Ttl::Forever`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeMetadata {
    pub accessed_at: u64,
    #[serde(with = "wire_expiry")]
    pub expires_at: Option<u64>,
    #[serde(with = "wire_ttl")]
    pub cache_ttl: Ttl,
    pub cache_max_items: usize,
    pub cache_strategy: StrategyHint,
}

/// The stored entry body: metadata plus the payload value. The value is the
/// JSON-decoded body when the original content type was `application/json`,
/// otherwise the body as text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub metadata: EnvelopeMetadata,
    pub value: Value,
}

/// Wire form of an expiry timestamp.
fn expiry_to_wire(expires_at: Option<u64>) -> String {
    match expires_at {
        Some(ms) => ms.to_string(),
        None => "Infinity".to_string(),
    }
}

// == Seal ==
/// Wraps a response into its stored envelope form.
///
/// The body becomes the envelope JSON, `Content-Type` is forced to
/// `application/json`, and the original content type moves to
/// [`ORIGINAL_CONTENT_TYPE_HEADER`]. A JSON payload that fails to parse is
/// a write failure; the caller decides whether to surface it.
pub fn seal(response: &WorkerResponse, metadata: &EnvelopeMetadata) -> Result<WorkerResponse> {
    let content_type = response.content_type().unwrap_or("text/plain").to_string();

    let value = if content_type.contains("application/json") {
        serde_json::from_slice(&response.body)
            .map_err(|err| WorkerError::CacheWrite(format!("invalid JSON payload: {err}")))?
    } else {
        Value::String(response.body_text().into_owned())
    };

    let envelope = Envelope {
        metadata: metadata.clone(),
        value,
    };
    let body = serde_json::to_vec(&envelope)
        .map_err(|err| WorkerError::CacheWrite(err.to_string()))?;

    let mut sealed = WorkerResponse::new(response.status, response.headers.clone(), body);
    sealed.set_header("Content-Type", "application/json");
    sealed.set_header(ORIGINAL_CONTENT_TYPE_HEADER, content_type);
    sealed.set_header(TTL_HEADER, expiry_to_wire(metadata.expires_at));
    sealed.set_header(ACCESS_TIME_HEADER, metadata.accessed_at.to_string());
    Ok(sealed)
}

// == Reseal ==
/// Re-serializes an updated envelope into an already-sealed response,
/// refreshing the mirror headers.
pub fn reseal(sealed: &WorkerResponse, envelope: &Envelope) -> Result<WorkerResponse> {
    let body = serde_json::to_vec(envelope)
        .map_err(|err| WorkerError::CacheWrite(err.to_string()))?;
    let mut updated = WorkerResponse::new(sealed.status, sealed.headers.clone(), body);
    updated.set_header(TTL_HEADER, expiry_to_wire(envelope.metadata.expires_at));
    updated.set_header(ACCESS_TIME_HEADER, envelope.metadata.accessed_at.to_string());
    Ok(updated)
}

// == Unseal ==
/// Parses a sealed response and restores the payload response from it.
///
/// The restored response carries the original content type again, with the
/// mirror headers reflecting the stored metadata.
pub fn unseal(sealed: &WorkerResponse) -> Result<(Envelope, WorkerResponse)> {
    let envelope: Envelope = serde_json::from_slice(&sealed.body)
        .map_err(|err| WorkerError::CacheWrite(format!("corrupt envelope: {err}")))?;

    let content_type = sealed
        .header(ORIGINAL_CONTENT_TYPE_HEADER)
        .unwrap_or("application/json")
        .to_string();

    let body = match &envelope.value {
        Value::String(text) => text.clone().into_bytes(),
        value => serde_json::to_vec(value)
            .map_err(|err| WorkerError::CacheWrite(err.to_string()))?,
    };

    let mut restored = WorkerResponse::new(sealed.status, sealed.headers.clone(), body);
    restored.set_header("Content-Type", content_type);
    restored.set_header(TTL_HEADER, expiry_to_wire(envelope.metadata.expires_at));
    restored.set_header(
        ACCESS_TIME_HEADER,
        envelope.metadata.accessed_at.to_string(),
    );
    Ok((envelope, restored))
}

// == Wire Serde ==
mod wire_expiry {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &Option<u64>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::expiry_to_wire(*v))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Number(u64),
            Text(String),
        }

        match Wire::deserialize(d)? {
            Wire::Number(ms) => Ok(Some(ms)),
            Wire::Text(s) if s == "Infinity" => Ok(None),
            Wire::Text(s) => s
                .parse()
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("invalid expiry: {s}"))),
        }
    }
}

mod wire_ttl {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::cache::Ttl;

    pub fn serialize<S: Serializer>(v: &Ttl, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&v.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Ttl, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
