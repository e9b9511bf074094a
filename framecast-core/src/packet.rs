//! A packet: one header plus opaque payload bytes.

use std::net::SocketAddr;

use bytes::Bytes;

use crate::error::Error;
use crate::header::{Header, PayloadType};

/// One datagram's worth of protocol data.
///
/// Immutable once built. Serializes deterministically to
/// `header_bytes ++ payload_bytes`, which is used verbatim as the
/// datagram body. The payload is reference-counted so forwarding one
/// packet to many peers does not copy it.
#[derive(Debug, Clone)]
pub struct Packet {
    header: Header,
    payload: Bytes,
}

impl Packet {
    /// Build a packet for sending.
    pub fn new(
        payload_type: PayloadType,
        frame_number: u16,
        sequence_number: u16,
        sequence_length: u16,
        payload: Bytes,
    ) -> Self {
        Self {
            header: Header::new(payload_type, frame_number, sequence_number, sequence_length),
            payload,
        }
    }

    /// Parse a received datagram.
    ///
    /// `data` must be the readable portion of the receive buffer: the
    /// first [`Header::SIZE`] bytes are the header, the rest is the
    /// payload. The sender's address is attached to the header for the
    /// receiving side. Fails with [`Error::TruncatedPacket`] when the
    /// datagram cannot even hold a header; this is a per-packet,
    /// non-fatal error.
    pub fn from_datagram(data: &[u8], sender: SocketAddr) -> Result<Self, Error> {
        if data.len() < Header::SIZE {
            return Err(Error::TruncatedPacket { length: data.len() });
        }

        let mut header_bytes = [0u8; Header::SIZE];
        header_bytes.copy_from_slice(&data[..Header::SIZE]);
        let mut header = Header::decode(&header_bytes);
        header.set_sender(sender);

        Ok(Self {
            header,
            payload: Bytes::copy_from_slice(&data[Header::SIZE..]),
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn payload_type(&self) -> PayloadType {
        self.header.payload_type()
    }

    /// Serialize for transmission as a single datagram body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Header::SIZE + self.payload.len());
        out.extend_from_slice(&self.header.encode());
        out.extend_from_slice(&self.payload);
        out
    }
}

// ── Tests ────────────────────────────────────────────────────────
