//! Value codec
//!
//! Serializes values to a transport-safe string for the remote store and
//! decodes them back: JSON bytes, optionally DEFLATE-compressed, carried
//! as base64 text. Compression is applied uniformly to every value when
//! enabled - there is no size threshold.
//!
//! One codec configuration per deployment: a payload written with
//! compression on cannot be read with compression off. The engine derives
//! the codec from the current settings snapshot on every call.

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::Serialize;

use farmcache_domain::error::{Error, Result};

/// A value in its transport form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedValue {
    payload: String,
    compressed: bool,
}

impl EncodedValue {
    /// Wrap a payload read back from the remote store
    pub fn from_payload<S: Into<String>>(payload: S, compressed: bool) -> Self {
        Self {
            payload: payload.into(),
            compressed,
        }
    }

    /// The transport-safe payload string
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Consume into the payload string
    pub fn into_payload(self) -> String {
        self.payload
    }

    /// Whether the payload body is DEFLATE-compressed
    pub fn compressed(&self) -> bool {
        self.compressed
    }
}

/// Encoder/decoder for values crossing the remote boundary
#[derive(Debug, Clone, Copy)]
pub struct ValueCodec {
    compression: bool,
}

impl ValueCodec {
    /// Create a codec; `compression` applies to every value uniformly
    pub fn new(compression: bool) -> Self {
        Self { compression }
    }

    /// Encode a value for the remote store
    ///
    /// A value lacking the structural properties JSON serialization
    /// requires fails with [`Error::NotSerializable`].
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<EncodedValue> {
        let json = serde_json::to_vec(value).map_err(|e| Error::NotSerializable {
            message: format!("Failed to serialize value: {}", e),
            source: Some(Box::new(e)),
        })?;
        self.encode_bytes(&json)
    }

    /// Encode already-serialized JSON bytes
    pub fn encode_bytes(&self, json: &[u8]) -> Result<EncodedValue> {
        let body = if self.compression {
            compress(json)?
        } else {
            json.to_vec()
        };
        Ok(EncodedValue {
            payload: BASE64.encode(body),
            compressed: self.compression,
        })
    }

    /// Decode a payload back to a value
    pub fn decode<T: DeserializeOwned>(&self, payload: &str) -> Result<T> {
        let json = self.decode_bytes(payload)?;
        serde_json::from_slice(&json).map_err(|e| Error::CorruptData {
            message: format!("Failed to deserialize cached value: {}", e),
            source: Some(Box::new(e)),
        })
    }

    /// Decode a payload to its JSON bytes
    pub fn decode_bytes(&self, payload: &str) -> Result<Vec<u8>> {
        let body = BASE64.decode(payload).map_err(|e| Error::CorruptData {
            message: format!("Invalid base64 in cached value: {}", e),
            source: Some(Box::new(e)),
        })?;
        if self.compression {
            decompress(&body)
        } else {
            Ok(body)
        }
    }
}

fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).map_err(|e| Error::NotSerializable {
        message: format!("Failed to compress value: {}", e),
        source: Some(Box::new(e)),
    })?;
    encoder.finish().map_err(|e| Error::NotSerializable {
        message: format!("Failed to compress value: {}", e),
        source: Some(Box::new(e)),
    })
}

fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::CorruptData {
            message: format!("Failed to decompress cached value: {}", e),
            source: Some(Box::new(e)),
        })?;
    Ok(out)
}
