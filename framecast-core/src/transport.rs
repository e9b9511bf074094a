//! Best-effort UDP transport for framecast packets.
//!
//! A [`FrameSocket`] is a bound UDP endpoint that serializes packets
//! on send and parses them on receive. It is connectionless: `connect`
//! only records a default peer, no traffic is exchanged. Loss,
//! duplication, and reordering of datagrams are tolerated upstream by
//! dropping the affected frame, never corrected here.

use std::net::SocketAddr;

use tokio::net::{UdpSocket, lookup_host};
use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::header::Header;
use crate::packet::Packet;

// ── Constants ────────────────────────────────────────────────────

/// Largest advisable payload chunk per datagram.
///
/// Not enforced by the transport — the fragmentation engine splits
/// payloads against this bound so senders stay clear of IP-layer
/// fragmentation limits.
pub const SIZE_MAX: usize = 65_000 + Header::SIZE;

/// Receive buffers sized to this hold any UDP datagram intact.
pub const RECV_BUFFER_SIZE: usize = 65_535;

// ── FrameSocket ──────────────────────────────────────────────────

/// A bound UDP endpoint that sends and receives [`Packet`]s.
///
/// Closing is the sole cancellation primitive: it unblocks any
/// in-flight [`receive`](Self::receive) with
/// [`Error::TransportClosed`] and is idempotent.
pub struct FrameSocket {
    socket: UdpSocket,
    peer: Option<SocketAddr>,
    closed: CancellationToken,
}

impl FrameSocket {
    /// Bind a local endpoint. Port 0 picks any available port.
    pub async fn bind(port: u16) -> Result<Self, Error> {
        let socket = UdpSocket::bind(("0.0.0.0", port)).await?;
        Ok(Self {
            socket,
            peer: None,
            closed: CancellationToken::new(),
        })
    }

    /// Local address the socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.socket.local_addr()?)
    }

    /// Record the default remote peer used by [`send`](Self::send).
    ///
    /// Local bookkeeping only — there is no handshake. Fails with
    /// [`Error::UnresolvedHost`] when `host` does not resolve.
    pub async fn connect(&mut self, host: &str, port: u16) -> Result<(), Error> {
        let addr = lookup_host((host, port))
            .await
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| Error::UnresolvedHost(format!("{host}:{port}")))?;
        self.peer = Some(addr);
        Ok(())
    }

    /// Default peer recorded by [`connect`](Self::connect), if any.
    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Send a packet to the connected default peer.
    pub async fn send(&self, packet: &Packet) -> Result<(), Error> {
        let peer = self.peer.ok_or(Error::NotConnected)?;
        self.send_to(packet, peer).await
    }

    /// Send a packet to an explicit destination as a single datagram.
    ///
    /// Fire-and-forget: no acknowledgment, no backpressure. Only a
    /// locally signaled I/O failure surfaces as an error.
    pub async fn send_to(&self, packet: &Packet, dest: SocketAddr) -> Result<(), Error> {
        if self.closed.is_cancelled() {
            return Err(Error::TransportClosed);
        }
        self.socket.send_to(&packet.to_bytes(), dest).await?;
        Ok(())
    }

    /// Block until a datagram arrives, copy it into `buf`, and parse a
    /// [`Packet`] carrying the sender's address.
    ///
    /// Datagrams longer than `buf` are truncated by the OS; size the
    /// buffer with [`RECV_BUFFER_SIZE`]. Fails with
    /// [`Error::TransportClosed`] once [`close`](Self::close) is
    /// called, including while blocked.
    pub async fn receive(&self, buf: &mut [u8]) -> Result<Packet, Error> {
        tokio::select! {
            biased;
            _ = self.closed.cancelled() => Err(Error::TransportClosed),
            received = self.socket.recv_from(buf) => {
                let (length, sender) = received?;
                Packet::from_datagram(&buf[..length], sender)
            }
        }
    }

    /// Release the endpoint. Idempotent; pending and subsequent
    /// receives fail with [`Error::TransportClosed`].
    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}

// ── Tests ────────────────────────────────────────────────────────
