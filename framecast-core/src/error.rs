//! Domain-specific error types for the framecast protocol.
//!
//! All fallible operations return `Result<T, Error>`. Per-packet
//! failures are recoverable: a receive loop logs them and keeps
//! pulling datagrams.

use thiserror::Error;

/// The canonical error type for the framecast protocol.
#[derive(Debug, Error)]
pub enum Error {
    // ── Protocol Errors ──────────────────────────────────────────
    /// A datagram shorter than the fixed header cannot carry a packet.
    #[error("truncated datagram: {length} bytes")]
    TruncatedPacket { length: usize },

    /// A fragment's sequence number lies outside the total that the
    /// frame's first fragment declared.
    #[error("frame {frame}: sequence {sequence} outside declared total {declared}")]
    FrameSizeViolation {
        frame: u16,
        sequence: u16,
        declared: u16,
    },

    // ── Transport Errors ─────────────────────────────────────────
    /// The UDP layer reported an I/O error.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The socket was closed. Terminal for a receive loop, not an
    /// error to report.
    #[error("transport closed")]
    TransportClosed,

    /// The remote host name did not resolve to any address.
    #[error("unresolved host: {0}")]
    UnresolvedHost(String),

    /// `send` without an explicit destination requires a prior
    /// `connect`.
    #[error("no destination: socket is not connected")]
    NotConnected,

    // ── Configuration Errors ─────────────────────────────────────
    /// Invalid receive-loop or server configuration.
    #[error("configuration error: {0}")]
    Configuration(&'static str),

    // ── Serialization Errors ─────────────────────────────────────
    /// A payload could not be encoded or decoded.
    #[error("encoding error: {0}")]
    Encoding(String),
}

impl From<Box<bincode::ErrorKind>> for Error {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        Error::Encoding(e.to_string())
    }
}
