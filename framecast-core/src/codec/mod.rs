//! Payload codecs for the fragmentation engine.
//!
//! A codec turns a typed value into the contiguous byte buffer that
//! gets fragmented, and back. Serialization failures surface as
//! [`Error::Encoding`]; deserialization failures after reassembly are
//! swallowed by the engine, which drops the frame per best-effort
//! semantics.

mod image;
mod text;

pub use image::{ImageCodec, ImageFrame};
pub use text::TextCodec;

use crate::error::Error;
use crate::header::PayloadType;

/// Serialize/deserialize hook for one payload kind.
///
/// Codecs are stateless; all reassembly bookkeeping lives in the
/// engine so both payload kinds share the same tested invariants.
pub trait PayloadCodec {
    /// The reassembled value type.
    type Value;

    /// Wire tag stamped on every fragment of this kind.
    const PAYLOAD_TYPE: PayloadType;

    fn to_bytes(value: &Self::Value) -> Result<Vec<u8>, Error>;
    fn from_bytes(bytes: &[u8]) -> Result<Self::Value, Error>;
}
