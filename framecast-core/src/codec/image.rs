//! Compressed image frame codec.
//!
//! An [`ImageFrame`] is a width/height pair plus tightly packed pixel
//! rows. On the wire the record is bincode-serialized with the pixel
//! data zstd-compressed, so a reordered or bit-flipped reassembly
//! fails decompression instead of yielding garbage pixels.

use serde::{Deserialize, Serialize};

use crate::codec::PayloadCodec;
use crate::error::Error;
use crate::header::PayloadType;

/// zstd level for screen-like content: fast with a usable ratio.
const COMPRESSION_LEVEL: i32 = 3;

/// One full image, ready to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFrame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Tightly packed rows, `width * height * 4` bytes (BGRA).
    pub data: Vec<u8>,
}

/// Wire record: dimensions in the clear, pixels compressed.
#[derive(Serialize, Deserialize)]
struct WireImage {
    width: u32,
    height: u32,
    compressed: Vec<u8>,
}

pub struct ImageCodec;

impl PayloadCodec for ImageCodec {
    type Value = ImageFrame;

    const PAYLOAD_TYPE: PayloadType = PayloadType::Image;

    fn to_bytes(value: &ImageFrame) -> Result<Vec<u8>, Error> {
        let compressed = zstd::encode_all(value.data.as_slice(), COMPRESSION_LEVEL)
            .map_err(|e| Error::Encoding(format!("zstd encode: {e}")))?;
        let wire = WireImage {
            width: value.width,
            height: value.height,
            compressed,
        };
        Ok(bincode::serialize(&wire)?)
    }

    fn from_bytes(bytes: &[u8]) -> Result<ImageFrame, Error> {
        let wire: WireImage = bincode::deserialize(bytes)?;
        let data = zstd::decode_all(wire.compressed.as_slice())
            .map_err(|e| Error::Encoding(format!("zstd decode: {e}")))?;
        Ok(ImageFrame {
            width: wire.width,
            height: wire.height,
            data,
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────
