//! Client-side session and stream helpers.
//!
//! The capture/display layer stays external: it supplies payload
//! values and consumes decoded ones. These helpers cover the protocol
//! side of a client — announcing membership to the relay and turning
//! received image packets back into frames.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::codec::{ImageCodec, ImageFrame, TextCodec};
use crate::error::Error;
use crate::header::PayloadType;
use crate::packet::Packet;
use crate::reassembly::FrameAssembler;
use crate::receiver::PacketHandler;
use crate::relay::{JOIN, LEAVE};
use crate::transport::FrameSocket;

// ── Session ──────────────────────────────────────────────────────

/// Membership handle for a relay session.
///
/// Joining announces this endpoint to the connected relay; leaving
/// retracts it. Each verb is sent once per session transition.
pub struct Session {
    socket: Arc<FrameSocket>,
    control: FrameAssembler<TextCodec>,
}

impl Session {
    pub fn new(socket: Arc<FrameSocket>) -> Self {
        Self {
            socket,
            control: FrameAssembler::new(),
        }
    }

    /// Send `JOIN` to the connected relay.
    pub async fn join(&self) -> Result<(), Error> {
        self.send_control(JOIN).await
    }

    /// Send `LEAVE` to the connected relay.
    pub async fn leave(&self) -> Result<(), Error> {
        self.send_control(LEAVE).await
    }

    async fn send_control(&self, verb: &str) -> Result<(), Error> {
        // Control frames carry no ordering meaning; the relay keys
        // nothing on their frame number.
        for packet in self.control.encode(&verb.to_string(), 1)? {
            self.socket.send(&packet).await?;
        }
        Ok(())
    }
}

// ── ImageStream ──────────────────────────────────────────────────

/// Counters published alongside decoded frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamStats {
    /// Completed frames decoded since start.
    pub frames: u64,
    /// Payload bytes received, fragments of never-completed frames
    /// included.
    pub bytes: u64,
}

/// Handler that reassembles image frames and publishes the latest one.
///
/// Decoded frames go out through a `watch` channel so a renderer can
/// always read the newest frame without blocking the receive loop. An
/// incomplete or corrupt frame simply never shows up — there is no
/// completion or timeout signal.
pub struct ImageStream {
    images: FrameAssembler<ImageCodec>,
    stats: Mutex<StreamStats>,
    frame_tx: watch::Sender<Option<ImageFrame>>,
    stats_tx: watch::Sender<StreamStats>,
}

impl ImageStream {
    pub fn new() -> Self {
        let (frame_tx, _) = watch::channel(None);
        let (stats_tx, _) = watch::channel(StreamStats::default());
        Self {
            images: FrameAssembler::new(),
            stats: Mutex::new(StreamStats::default()),
            frame_tx,
            stats_tx,
        }
    }

    /// Latest decoded frame; `None` until the first one completes.
    pub fn frames(&self) -> watch::Receiver<Option<ImageFrame>> {
        self.frame_tx.subscribe()
    }

    /// Running stream statistics.
    pub fn stats(&self) -> watch::Receiver<StreamStats> {
        self.stats_tx.subscribe()
    }
}

impl Default for ImageStream {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PacketHandler for ImageStream {
    async fn process(&self, packet: Packet) {
        if packet.payload_type() != PayloadType::Image {
            debug!("ignoring {:?} packet", packet.payload_type());
            return;
        }

        let completed = match self.images.decode(&packet) {
            Ok(completed) => completed,
            Err(e) => {
                warn!("image fragment rejected: {e}");
                return;
            }
        };

        let snapshot = {
            let mut stats = self.stats.lock();
            stats.bytes += packet.payload().len() as u64;
            if completed.is_some() {
                stats.frames += 1;
            }
            *stats
        };
        let _ = self.stats_tx.send(snapshot);

        if let Some(frame) = completed {
            let _ = self.frame_tx.send(Some(frame));
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
