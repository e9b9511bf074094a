//! Relay: membership table and forwarding policy.
//!
//! Peers join and leave with control frames; everything else is
//! forwarded verbatim to every joined peer except the sender. There
//! is no expiry or heartbeat — a peer that vanishes without `LEAVE`
//! stays in the table, and sends to it simply go nowhere.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, info, warn};

use crate::codec::TextCodec;
use crate::header::PayloadType;
use crate::packet::Packet;
use crate::reassembly::FrameAssembler;
use crate::receiver::PacketHandler;
use crate::transport::FrameSocket;

/// Control verb that adds the sender to the table.
pub const JOIN: &str = "JOIN";
/// Control verb that removes the sender from the table.
pub const LEAVE: &str = "LEAVE";

// ── Relay ────────────────────────────────────────────────────────

/// The relay's packet handler.
///
/// Dispatch is sequential (one receive loop), but the peer table is
/// concurrency-safe so additional sender tasks can share it. A join
/// or leave landing during a forward pass is observed or not — either
/// is acceptable, there is no snapshot isolation.
pub struct Relay {
    socket: Arc<FrameSocket>,
    /// Joined peers, keyed `"address:port"` — distinct clients on one
    /// host get distinct entries.
    peers: DashMap<String, SocketAddr>,
    control: FrameAssembler<TextCodec>,
}

impl Relay {
    pub fn new(socket: Arc<FrameSocket>) -> Self {
        Self {
            socket,
            peers: DashMap::new(),
            control: FrameAssembler::new(),
        }
    }

    /// Number of currently joined peers.
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    fn handle_control(&self, packet: &Packet, sender: SocketAddr) {
        let text = match self.control.decode(packet) {
            Ok(Some(text)) => text,
            // Frame still incomplete; keep collecting.
            Ok(None) => return,
            Err(e) => {
                warn!("rejected control fragment from {sender}: {e}");
                return;
            }
        };

        match text.as_str() {
            JOIN => {
                self.peers.insert(sender.to_string(), sender);
                info!("{sender} joined ({} peers)", self.peers.len());
            }
            LEAVE => {
                self.peers.remove(&sender.to_string());
                info!("{sender} left ({} peers)", self.peers.len());
            }
            other => debug!("ignoring control text {other:?} from {sender}"),
        }
    }

    async fn forward(&self, packet: &Packet, sender: SocketAddr) {
        let sender_key = sender.to_string();
        let targets: Vec<(String, SocketAddr)> = self
            .peers
            .iter()
            .filter(|entry| *entry.key() != sender_key)
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();

        for (key, addr) in targets {
            if let Err(e) = self.socket.send_to(packet, addr).await {
                warn!("forward to {key} failed: {e}");
            }
        }
    }
}

#[async_trait]
impl PacketHandler for Relay {
    async fn process(&self, packet: Packet) {
        let Some(sender) = packet.header().sender() else {
            debug!("dropping packet without sender metadata");
            return;
        };

        if packet.payload_type() == PayloadType::Control {
            // Control frames mutate the table and are never forwarded.
            self.handle_control(&packet, sender);
        } else {
            self.forward(&packet, sender).await;
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
