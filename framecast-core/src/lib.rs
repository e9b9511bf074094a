//! # framecast-core
//!
//! Core protocol library for the framecast image/text relay.
//!
//! This crate contains:
//! - **Wire codec**: [`Header`], [`PayloadType`] — the 7-byte datagram header
//! - **Framing**: [`Packet`] — header plus opaque payload bytes
//! - **Transport**: [`FrameSocket`] — best-effort UDP send/receive
//! - **Reassembly**: [`FrameAssembler`], generic over a [`PayloadCodec`]
//! - **Receive loop**: [`Receiver`] and the [`PacketHandler`] trait
//! - **Relay**: [`Relay`] — membership table and forwarding policy
//! - **Client helpers**: [`Session`], [`Publisher`], [`ImageStream`]
//! - **Error**: [`Error`] — typed, `thiserror`-based error hierarchy

pub mod client;
pub mod codec;
pub mod error;
pub mod header;
pub mod packet;
pub mod publisher;
pub mod reassembly;
pub mod receiver;
pub mod relay;
pub mod transport;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use client::{ImageStream, Session, StreamStats};
pub use codec::{ImageCodec, ImageFrame, PayloadCodec, TextCodec};
pub use error::Error;
pub use header::{Header, PayloadType};
pub use packet::Packet;
pub use publisher::Publisher;
pub use reassembly::FrameAssembler;
pub use receiver::{PacketHandler, Receiver};
pub use relay::{JOIN, LEAVE, Relay};
pub use transport::{FrameSocket, RECV_BUFFER_SIZE, SIZE_MAX};
