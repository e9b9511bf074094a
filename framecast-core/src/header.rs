//! Fixed-size wire header for framecast packets.
//!
//! ## Wire format
//!
//! ```text
//! byte 0      payload type (1 = image, 2 = control/text, other = invalid)
//! bytes 1-2   frame number (u16, big-endian)
//! bytes 3-4   sequence number (u16, big-endian)
//! bytes 5-6   sequence length (u16, big-endian)
//! ```
//!
//! There is no length or checksum field: payload length is implied by
//! the datagram size, and header corruption is undetectable beyond an
//! invalid type tag. The sender's address is attached out-of-band on
//! receive and never travels on the wire.

use std::net::SocketAddr;

// ── PayloadType ──────────────────────────────────────────────────

/// What the payload bytes of a packet carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadType {
    /// A fragment of a compressed image frame.
    Image,
    /// A fragment of a control/text frame (`JOIN`, `LEAVE`).
    Control,
    /// Any unknown type tag. Consumers must discard these.
    Invalid,
}

impl PayloadType {
    /// Wire tag for this type.
    pub fn to_byte(self) -> u8 {
        match self {
            PayloadType::Image => 1,
            PayloadType::Control => 2,
            PayloadType::Invalid => 0xFF,
        }
    }

    /// Inverse of [`to_byte`](Self::to_byte). Unknown tags map to
    /// [`Invalid`](Self::Invalid) rather than failing.
    pub fn from_byte(b: u8) -> Self {
        match b {
            1 => PayloadType::Image,
            2 => PayloadType::Control,
            _ => PayloadType::Invalid,
        }
    }
}

// ── Header ───────────────────────────────────────────────────────

/// The 7-byte packet header.
///
/// Invariant for well-formed fragments: `sequence_number <
/// sequence_length`. The header itself does not enforce it; the
/// reassembly engine rejects violations.
#[derive(Debug, Clone)]
pub struct Header {
    payload_type: PayloadType,
    frame_number: u16,
    sequence_number: u16,
    sequence_length: u16,
    /// Datagram source, set on receive only.
    sender: Option<SocketAddr>,
}

impl Header {
    /// Encoded size on the wire.
    pub const SIZE: usize = 7;

    pub fn new(
        payload_type: PayloadType,
        frame_number: u16,
        sequence_number: u16,
        sequence_length: u16,
    ) -> Self {
        Self {
            payload_type,
            frame_number,
            sequence_number,
            sequence_length,
            sender: None,
        }
    }

    /// Serialize to bytes (big-endian).
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0] = self.payload_type.to_byte();
        buf[1..3].copy_from_slice(&self.frame_number.to_be_bytes());
        buf[3..5].copy_from_slice(&self.sequence_number.to_be_bytes());
        buf[5..7].copy_from_slice(&self.sequence_length.to_be_bytes());
        buf
    }

    /// Deserialize from bytes. Never fails: an unknown type tag yields
    /// [`PayloadType::Invalid`].
    pub fn decode(bytes: &[u8; Self::SIZE]) -> Self {
        Self {
            payload_type: PayloadType::from_byte(bytes[0]),
            frame_number: u16::from_be_bytes([bytes[1], bytes[2]]),
            sequence_number: u16::from_be_bytes([bytes[3], bytes[4]]),
            sequence_length: u16::from_be_bytes([bytes[5], bytes[6]]),
            sender: None,
        }
    }

    /// Attach the datagram source. Used by the receiving side only.
    pub(crate) fn set_sender(&mut self, sender: SocketAddr) {
        self.sender = Some(sender);
    }

    pub fn payload_type(&self) -> PayloadType {
        self.payload_type
    }

    pub fn frame_number(&self) -> u16 {
        self.frame_number
    }

    /// 0-based index of this fragment within its frame.
    pub fn sequence_number(&self) -> u16 {
        self.sequence_number
    }

    /// Total fragment count declared for the frame.
    pub fn sequence_length(&self) -> u16 {
        self.sequence_length
    }

    /// Source address of the datagram, if this header was received.
    pub fn sender(&self) -> Option<SocketAddr> {
        self.sender
    }
}

// ── Tests ────────────────────────────────────────────────────────
