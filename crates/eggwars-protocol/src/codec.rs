//! Codec trait and implementations for persisting EggWars data.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The configuration loader and the statistics store don't care HOW their
//! data is serialized; they only need something that implements
//! [`Codec`].
//!
//! Currently we provide [`JsonCodec`], which writes pretty-printed JSON so
//! operators can hand-edit `arenas.json` and inspect `stats.json`.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because codecs live inside long-lived shared
/// managers that Tokio tasks touch from any thread.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Output is pretty-printed: persisted files are meant to be read by
/// humans.
///
/// ## Example
///
/// ```rust
/// use eggwars_protocol::{Codec, JsonCodec, Vec3};
///
/// let codec = JsonCodec;
/// let spawn = Vec3::new(50.0, 100.0, 0.0);
///
/// let bytes = codec.encode(&spawn).unwrap();
/// let decoded: Vec3 = codec.decode(&bytes).unwrap();
/// assert_eq!(spawn, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec_pretty(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
