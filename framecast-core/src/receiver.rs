//! Continuous packet reception.
//!
//! A [`Receiver`] pulls packets off one socket and hands each to its
//! handler until the socket closes. Socket and buffer size are fixed
//! at construction — there is no way to rebind either afterwards.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::Error;
use crate::packet::Packet;
use crate::transport::FrameSocket;

/// Receives every packet pulled off a transport.
#[async_trait]
pub trait PacketHandler: Send + Sync {
    /// Called once per received packet, in arrival order. Handlers
    /// deal with their own failures; a packet that cannot be processed
    /// must not stop reception.
    async fn process(&self, packet: Packet);
}

/// Drives a [`FrameSocket`] until it closes, dispatching each packet
/// to the handler.
pub struct Receiver<H: PacketHandler> {
    socket: Arc<FrameSocket>,
    handler: H,
    buffer_size: usize,
}

impl<H: PacketHandler> Receiver<H> {
    /// `buffer_size` is the receive buffer length in bytes; it bounds
    /// the datagrams this loop can accept intact. Fails with
    /// [`Error::Configuration`] when zero.
    pub fn new(socket: Arc<FrameSocket>, buffer_size: usize, handler: H) -> Result<Self, Error> {
        if buffer_size == 0 {
            return Err(Error::Configuration("buffer size cannot be zero"));
        }
        Ok(Self {
            socket,
            handler,
            buffer_size,
        })
    }

    /// Run until the socket closes.
    ///
    /// A malformed or undeliverable datagram is logged and skipped;
    /// one bad datagram must not terminate reception. Only
    /// [`Error::TransportClosed`] ends the loop, and it ends it
    /// cleanly.
    pub async fn run(self) {
        let mut buffer = vec![0u8; self.buffer_size];
        loop {
            match self.socket.receive(&mut buffer).await {
                Ok(packet) => self.handler.process(packet).await,
                Err(Error::TransportClosed) => {
                    debug!("socket closed, receive loop exiting");
                    return;
                }
                Err(e) => warn!("dropping datagram: {e}"),
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
