//! Fragmentation and reassembly of typed payloads.
//!
//! `encode` splits a serialized payload into bounded chunks, one
//! packet per chunk; `decode` collects fragments per (sender, frame)
//! until the declared total is present, then hands back the rebuilt
//! value. Completing a frame evicts every still-open frame from the
//! same sender with a smaller frame number: frame counters increase
//! over time, so anything older is stale and will never complete.
//!
//! A frame missing a fragment simply never produces output until a
//! newer frame evicts it. No timer, no retransmission.

use std::collections::{BTreeMap, HashMap};
use std::marker::PhantomData;
use std::net::SocketAddr;

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::trace;

use crate::codec::PayloadCodec;
use crate::error::Error;
use crate::packet::Packet;
use crate::transport::SIZE_MAX;

/// Reassembly state is per sender: frames relayed from different
/// peers may reuse frame numbers without cross-talk. Packets built
/// locally (no datagram source) share the `None` slot.
type SenderKey = Option<SocketAddr>;

// ── FrameAssembler ───────────────────────────────────────────────

/// Splits values into packets and rebuilds values from packets.
///
/// Generic over the payload codec, so image and text traffic share
/// one engine. Internally synchronized: a shared assembler may be fed
/// from any thread.
pub struct FrameAssembler<C: PayloadCodec> {
    open: Mutex<HashMap<SenderKey, BTreeMap<u16, FrameBuffer>>>,
    _codec: PhantomData<C>,
}

impl<C: PayloadCodec> FrameAssembler<C> {
    pub fn new() -> Self {
        Self {
            open: Mutex::new(HashMap::new()),
            _codec: PhantomData,
        }
    }

    /// Fragment `value` into sendable packets.
    ///
    /// The fragment count is `ceil(len / SIZE_MAX)` with a minimum of
    /// one; every chunk is `len / n` bytes except the last, which
    /// absorbs the remainder. Emission order matches sequence order,
    /// but receivers must rely on sequence numbers alone — packets may
    /// arrive in any order or not at all.
    pub fn encode(&self, value: &C::Value, frame_number: u16) -> Result<Vec<Packet>, Error> {
        let data = C::to_bytes(value)?;
        let total = data.len().div_ceil(SIZE_MAX).max(1);
        if total > u16::MAX as usize {
            return Err(Error::Encoding(format!(
                "payload of {} bytes needs {total} fragments, limit is {}",
                data.len(),
                u16::MAX
            )));
        }

        let buffer = Bytes::from(data);
        let base = buffer.len() / total;
        let mut packets = Vec::with_capacity(total);
        for sequence in 0..total {
            let start = sequence * base;
            let end = if sequence + 1 == total {
                buffer.len()
            } else {
                start + base
            };
            packets.push(Packet::new(
                C::PAYLOAD_TYPE,
                frame_number,
                sequence as u16,
                total as u16,
                buffer.slice(start..end),
            ));
        }
        Ok(packets)
    }

    /// Feed one received fragment.
    ///
    /// Returns `Ok(Some(value))` exactly when this fragment completes
    /// its frame, `Ok(None)` while the frame is still missing
    /// fragments — and also when a completed frame fails payload
    /// deserialization, in which case the frame is dropped for good.
    ///
    /// Fails with [`Error::FrameSizeViolation`] when the sequence
    /// number falls outside the frame's declared total; the fragment
    /// is rejected and all prior state is kept. Routing by payload
    /// type is the caller's job: the engine trusts that every packet
    /// it sees belongs to its codec.
    pub fn decode(&self, packet: &Packet) -> Result<Option<C::Value>, Error> {
        let header = packet.header();
        let frame_number = header.frame_number();

        let mut open = self.open.lock();
        let frames = open.entry(header.sender()).or_default();

        // The declared total is fixed by the first fragment seen.
        let declared = frames
            .get(&frame_number)
            .map(|buffer| buffer.declared)
            .unwrap_or_else(|| header.sequence_length());
        if header.sequence_number() >= declared {
            return Err(Error::FrameSizeViolation {
                frame: frame_number,
                sequence: header.sequence_number(),
                declared,
            });
        }

        let buffer = frames
            .entry(frame_number)
            .or_insert_with(|| FrameBuffer::new(declared));
        buffer.insert(header.sequence_number(), packet.payload().clone());

        if !buffer.is_complete() {
            return Ok(None);
        }

        let assembled = buffer.assemble();

        // This frame is done; it and everything older from the same
        // sender are stale now.
        let retained = frames.split_off(&frame_number);
        let evicted = frames.len();
        *frames = retained;
        frames.remove(&frame_number);
        if evicted > 0 {
            trace!("frame {frame_number} complete, evicted {evicted} stale frames");
        }
        drop(open);

        match C::from_bytes(&assembled) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                trace!("dropping frame {frame_number}: {e}");
                Ok(None)
            }
        }
    }
}

impl<C: PayloadCodec> Default for FrameAssembler<C> {
    fn default() -> Self {
        Self::new()
    }
}

// ── FrameBuffer ──────────────────────────────────────────────────

/// Collects the fragments of one frame.
///
/// Arrival order is irrelevant; a duplicate sequence number
/// overwrites in place.
struct FrameBuffer {
    declared: u16,
    parts: HashMap<u16, Bytes>,
}

impl FrameBuffer {
    fn new(declared: u16) -> Self {
        Self {
            declared,
            parts: HashMap::new(),
        }
    }

    fn insert(&mut self, sequence: u16, payload: Bytes) {
        self.parts.insert(sequence, payload);
    }

    fn is_complete(&self) -> bool {
        self.parts.len() == self.declared as usize
    }

    /// Concatenate fragments by ascending sequence number.
    fn assemble(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.parts.values().map(Bytes::len).sum());
        for sequence in 0..self.declared {
            if let Some(part) = self.parts.get(&sequence) {
                out.extend_from_slice(part);
            }
        }
        out
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{ImageCodec, TextCodec};
    use crate::header::PayloadType;
    use std::net::SocketAddr;

    fn peer(port: u16) -> SocketAddr {
        format!("127.0.0.1:{port}").parse().unwrap()
    }

    /// Round-trip a packet through serialization so it carries the
    /// given sender, as if it had come off the wire.
    fn received_from(packet: &Packet, sender: SocketAddr) -> Packet {
        Packet::from_datagram(&packet.to_bytes(), sender).unwrap()
    }

    #[test]
    fn single_fragment_roundtrip() {
        let assembler = FrameAssembler::<TextCodec>::new();
        let packets = assembler.encode(&String::from("JOIN"), 1).unwrap();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].header().sequence_length(), 1);
        assert_eq!(packets[0].payload_type(), PayloadType::Control);

        let decoded = assembler.decode(&packets[0]).unwrap();
        assert_eq!(decoded.as_deref(), Some("JOIN"));
    }

    #[test]
    fn empty_payload_still_emits_one_packet() {
        let assembler = FrameAssembler::<TextCodec>::new();
        let packets = assembler.encode(&String::new(), 0).unwrap();
        assert_eq!(packets.len(), 1);
        assert!(packets[0].payload().is_empty());

        assert_eq!(assembler.decode(&packets[0]).unwrap().as_deref(), Some(""));
    }

    #[test]
    fn multi_fragment_roundtrip_in_any_order() {
        let assembler = FrameAssembler::<TextCodec>::new();
        // Not divisible by the fragment count: the tail chunk carries
        // the remainder and no bytes go missing.
        let text: String = "abcdefg".chars().cycle().take(2 * SIZE_MAX + 5).collect();

        let mut packets = assembler.encode(&text, 3).unwrap();
        assert_eq!(packets.len(), 3);
        let sent: usize = packets.iter().map(|p| p.payload().len()).sum();
        assert_eq!(sent, text.len());

        packets.reverse();
        assert!(assembler.decode(&packets[0]).unwrap().is_none());
        assert!(assembler.decode(&packets[1]).unwrap().is_none());
        let decoded = assembler.decode(&packets[2]).unwrap();
        assert_eq!(decoded.as_deref(), Some(text.as_str()));
    }

    #[test]
    fn missing_fragment_never_completes() {
        let assembler = FrameAssembler::<TextCodec>::new();
        let text: String = "x".repeat(2 * SIZE_MAX);
        let packets = assembler.encode(&text, 9).unwrap();
        assert_eq!(packets.len(), 2);

        assert!(assembler.decode(&packets[0]).unwrap().is_none());
        // Duplicate of the same fragment does not count as progress.
        assert!(assembler.decode(&packets[0]).unwrap().is_none());

        let decoded = assembler.decode(&packets[1]).unwrap();
        assert_eq!(decoded.as_deref(), Some(text.as_str()));
    }

    #[test]
    fn sequence_outside_declared_total_is_rejected() {
        let assembler = FrameAssembler::<TextCodec>::new();
        let text: String = "y".repeat(2 * SIZE_MAX);
        let packets = assembler.encode(&text, 4).unwrap();
        assert!(assembler.decode(&packets[0]).unwrap().is_none());

        // Same frame number, but claiming a different shape.
        let rogue = Packet::new(PayloadType::Control, 4, 5, 9, Bytes::from_static(b"zz"));
        let err = assembler.decode(&rogue).unwrap_err();
        assert!(matches!(
            err,
            Error::FrameSizeViolation {
                frame: 4,
                sequence: 5,
                declared: 2,
            }
        ));

        // Prior state is intact: the real tail still completes it.
        let decoded = assembler.decode(&packets[1]).unwrap();
        assert_eq!(decoded.as_deref(), Some(text.as_str()));
    }

    #[test]
    fn sequence_equal_to_length_is_rejected() {
        let assembler = FrameAssembler::<TextCodec>::new();
        let rogue = Packet::new(PayloadType::Control, 0, 1, 1, Bytes::from_static(b"a"));
        assert!(matches!(
            assembler.decode(&rogue).unwrap_err(),
            Error::FrameSizeViolation { .. }
        ));
    }

    #[test]
    fn completing_a_frame_evicts_older_open_frames() {
        let assembler = FrameAssembler::<TextCodec>::new();

        // Frame 3 stays half-open.
        let stale: String = "s".repeat(2 * SIZE_MAX);
        let stale_packets = assembler.encode(&stale, 3).unwrap();
        assert!(assembler.decode(&stale_packets[0]).unwrap().is_none());

        // Frame 7 completes and sweeps frame 3 away.
        let packets = assembler.encode(&String::from("LEAVE"), 7).unwrap();
        assert_eq!(assembler.decode(&packets[0]).unwrap().as_deref(), Some("LEAVE"));
        assert!(assembler.open.lock().get(&None).is_none_or(|f| f.is_empty()));

        // The evicted frame starts from scratch: its old fragment is
        // gone, so the tail alone is not enough...
        assert!(assembler.decode(&stale_packets[1]).unwrap().is_none());
        // ...until the head arrives again.
        let decoded = assembler.decode(&stale_packets[0]).unwrap();
        assert_eq!(decoded.as_deref(), Some(stale.as_str()));
    }

    #[test]
    fn newer_open_frames_survive_completion() {
        let assembler = FrameAssembler::<TextCodec>::new();

        let newer: String = "n".repeat(2 * SIZE_MAX);
        let newer_packets = assembler.encode(&newer, 10).unwrap();
        assert!(assembler.decode(&newer_packets[0]).unwrap().is_none());

        let packets = assembler.encode(&String::from("JOIN"), 5).unwrap();
        assert_eq!(assembler.decode(&packets[0]).unwrap().as_deref(), Some("JOIN"));

        // Frame 10 was untouched and still completes.
        let decoded = assembler.decode(&newer_packets[1]).unwrap();
        assert_eq!(decoded.as_deref(), Some(newer.as_str()));
    }

    #[test]
    fn senders_do_not_share_frame_state() {
        let assembler = FrameAssembler::<TextCodec>::new();
        let text: String = "z".repeat(2 * SIZE_MAX);
        let packets = assembler.encode(&text, 1).unwrap();

        // Peer A and peer B each contribute one half of "the same"
        // frame number. Neither completes: the halves are not merged.
        let a = peer(4001);
        let b = peer(4002);
        assert!(assembler.decode(&received_from(&packets[0], a)).unwrap().is_none());
        assert!(assembler.decode(&received_from(&packets[1], b)).unwrap().is_none());

        // Each peer finishing its own frame works independently.
        let from_a = assembler.decode(&received_from(&packets[1], a)).unwrap();
        assert_eq!(from_a.as_deref(), Some(text.as_str()));
        let from_b = assembler.decode(&received_from(&packets[0], b)).unwrap();
        assert_eq!(from_b.as_deref(), Some(text.as_str()));
    }

    #[test]
    fn corrupt_payload_is_dropped_not_raised() {
        let assembler = FrameAssembler::<ImageCodec>::new();
        let garbage = Packet::new(PayloadType::Image, 2, 0, 1, Bytes::from_static(&[0xBA, 0xD0]));

        // Completes, fails to deserialize, reported as incomplete.
        assert!(assembler.decode(&garbage).unwrap().is_none());
        // And the frame state is gone, not stuck complete-but-corrupt.
        assert!(assembler.open.lock().get(&None).is_none_or(|f| f.is_empty()));
    }

    #[test]
    fn image_roundtrip_through_fragments() {
        let assembler = FrameAssembler::<ImageCodec>::new();

        // Pseudo-random pixels defeat compression, forcing multiple
        // fragments.
        let mut state = 0x2545F491u32;
        let data: Vec<u8> = (0..160 * 160 * 4)
            .map(|_| {
                state = state.wrapping_mul(1103515245).wrapping_add(12345);
                (state >> 16) as u8
            })
            .collect();
        let frame = crate::codec::ImageFrame {
            width: 160,
            height: 160,
            data,
        };

        let packets = assembler.encode(&frame, 0).unwrap();
        assert!(packets.len() > 1, "expected a multi-fragment frame");

        let mut result = None;
        for packet in &packets {
            if let Some(decoded) = assembler.decode(packet).unwrap() {
                assert!(result.is_none(), "frame completed more than once");
                result = Some(decoded);
            }
        }
        assert_eq!(result, Some(frame));
    }
}
