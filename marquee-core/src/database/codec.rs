//! Versioned JSON blobs stored in relational columns.
//!
//! Every blob is wrapped as `{"v": <version>, "data": ...}`. Readers treat a
//! missing column, an unknown version or a payload that fails to decode as
//! absent data rather than as an error.

use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::error::Result;

/// Current schema version written for every blob column.
pub const BLOB_SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    v: u32,
    data: &'a T,
}

#[derive(serde::Deserialize)]
struct Envelope<T> {
    v: u32,
    data: T,
}

#[derive(serde::Deserialize)]
struct VersionProbe {
    v: u32,
}

pub fn encode<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(&EnvelopeRef {
        v: BLOB_SCHEMA_VERSION,
        data: value,
    })?)
}

/// Encodes only non-empty collections so absent data stays `NULL`.
pub fn encode_list<T: Serialize>(values: &[T]) -> Result<Option<String>> {
    if values.is_empty() {
        return Ok(None);
    }
    encode(&values).map(Some)
}

pub fn decode<T: DeserializeOwned>(column: &str, raw: Option<&str>) -> Option<T> {
    let raw = raw?;
    match serde_json::from_str::<VersionProbe>(raw) {
        Ok(probe) if probe.v == BLOB_SCHEMA_VERSION => {}
        Ok(probe) => {
            debug!(
                "Ignoring {} blob with unsupported schema version {}",
                column, probe.v
            );
            return None;
        }
        Err(e) => {
            debug!("Ignoring unreadable {} blob: {}", column, e);
            return None;
        }
    }

    match serde_json::from_str::<Envelope<T>>(raw) {
        Ok(envelope) => Some(envelope.data),
        Err(e) => {
            debug!("Ignoring malformed {} blob: {}", column, e);
            None
        }
    }
}

pub fn decode_list<T: DeserializeOwned>(column: &str, raw: Option<&str>) -> Vec<T> {
    decode(column, raw).unwrap_or_default()
}
