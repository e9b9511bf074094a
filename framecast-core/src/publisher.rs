//! Cadenced payload publishing.
//!
//! Runs the sender half of a client: pull a value from the producer,
//! fragment it under the next frame number, send every fragment to
//! the connected relay, then sleep out the rest of the interval.
//! Receivers lean on the frame counter increasing over time to evict
//! stale state, so one publisher instance per stream.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::Instant;

use crate::codec::PayloadCodec;
use crate::error::Error;
use crate::reassembly::FrameAssembler;
use crate::transport::FrameSocket;

/// Periodic producer-to-socket pump.
///
/// # Lifetime
///
/// Call [`run`](Self::run) to start the loop; it runs until
/// [`stop`](Self::stop) is called via a handle. Stopping is not
/// synchronous — at most the iteration in flight completes after the
/// request.
pub struct Publisher<C: PayloadCodec> {
    socket: Arc<FrameSocket>,
    assembler: FrameAssembler<C>,
    running: Arc<AtomicBool>,
    interval: Duration,
}

impl<C: PayloadCodec> Publisher<C> {
    /// `interval` is the pacing between successive frames.
    pub fn new(socket: Arc<FrameSocket>, interval: Duration) -> Self {
        Self {
            socket,
            assembler: FrameAssembler::new(),
            running: Arc::new(AtomicBool::new(false)),
            interval,
        }
    }

    /// A cloneable handle that can stop the loop from another task.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Signal the loop to stop.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Whether the loop is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run until stopped.
    ///
    /// `produce` supplies the next payload; returning `None` skips
    /// the iteration (nothing new to send). Frame numbers start at 0
    /// and advance once per published frame. Encode and send failures
    /// propagate to the caller and end the loop.
    pub async fn run<F>(&self, mut produce: F) -> Result<(), Error>
    where
        F: FnMut() -> Option<C::Value>,
    {
        self.running.store(true, Ordering::SeqCst);
        let mut frame_number: u16 = 0;

        while self.running.load(Ordering::SeqCst) {
            let started = Instant::now();

            if let Some(value) = produce() {
                let packets = self.assembler.encode(&value, frame_number)?;
                for packet in &packets {
                    self.socket.send(packet).await?;
                }
                frame_number = frame_number.wrapping_add(1);
            }

            let elapsed = started.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }

        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────
