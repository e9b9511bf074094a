//! Single-byte text codec.
//!
//! One byte per character: ASCII maps to itself, anything else encodes
//! as the replacement byte `0`. Decoding maps non-ASCII bytes to `?`.
//! Control verbs and chat text both travel this way.

use crate::codec::PayloadCodec;
use crate::error::Error;
use crate::header::PayloadType;

/// Byte written in place of a character with no single-byte mapping.
const REPLACEMENT_BYTE: u8 = 0;

pub struct TextCodec;

impl PayloadCodec for TextCodec {
    type Value = String;

    const PAYLOAD_TYPE: PayloadType = PayloadType::Control;

    fn to_bytes(value: &String) -> Result<Vec<u8>, Error> {
        Ok(value
            .chars()
            .map(|c| if c.is_ascii() { c as u8 } else { REPLACEMENT_BYTE })
            .collect())
    }

    fn from_bytes(bytes: &[u8]) -> Result<String, Error> {
        Ok(bytes
            .iter()
            .map(|&b| if b.is_ascii() { b as char } else { '?' })
            .collect())
    }
}

// ── Tests ────────────────────────────────────────────────────────
