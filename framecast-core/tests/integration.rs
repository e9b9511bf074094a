//! Integration tests — relay membership and forwarding, plus the full
//! fragment → relay → reassemble path over real UDP sockets on
//! localhost.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::time::timeout;

use framecast_core::{
    FrameAssembler, FrameSocket, ImageCodec, ImageFrame, ImageStream, Packet, PayloadType,
    RECV_BUFFER_SIZE, Receiver, Relay, Session,
};

// ── Helpers ──────────────────────────────────────────────────────

/// Spin up a relay on an OS-assigned port and run its receive loop in
/// a background task. Returns the relay's socket (for shutdown) and
/// its port.
async fn spawn_relay() -> (Arc<FrameSocket>, u16) {
    let socket = Arc::new(FrameSocket::bind(0).await.unwrap());
    let port = socket.local_addr().unwrap().port();

    let relay = Relay::new(Arc::clone(&socket));
    let receiver = Receiver::new(Arc::clone(&socket), RECV_BUFFER_SIZE, relay).unwrap();
    tokio::spawn(receiver.run());

    (socket, port)
}

/// A client socket connected to the relay.
async fn client(relay_port: u16) -> Arc<FrameSocket> {
    let mut socket = FrameSocket::bind(0).await.unwrap();
    socket.connect("127.0.0.1", relay_port).await.unwrap();
    Arc::new(socket)
}

/// Give the relay's receive loop time to drain what was just sent.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(150)).await;
}

/// Incompressible pixel data, so encoded frames span fragments.
fn noise_frame(side: u32) -> ImageFrame {
    let mut state = 0x2545_F491u32;
    let data = (0..side * side * 4)
        .map(|_| {
            state = state.wrapping_mul(1103515245).wrapping_add(12345);
            (state >> 16) as u8
        })
        .collect();
    ImageFrame {
        width: side,
        height: side,
        data,
    }
}

// ── Relay forwarding ─────────────────────────────────────────────

#[tokio::test]
async fn relay_forwards_to_joined_peers_except_the_sender() {
    let (relay_socket, relay_port) = spawn_relay().await;

    let a = client(relay_port).await;
    let b = client(relay_port).await;

    Session::new(Arc::clone(&a)).join().await.unwrap();
    Session::new(Arc::clone(&b)).join().await.unwrap();
    settle().await;

    // A non-control packet from A reaches B...
    let data = Packet::new(PayloadType::Image, 0, 0, 1, Bytes::from_static(&[5]));
    a.send(&data).await.unwrap();

    let mut buf = vec![0u8; RECV_BUFFER_SIZE];
    let received = timeout(Duration::from_secs(2), b.receive(&mut buf))
        .await
        .expect("forwarded packet never arrived")
        .unwrap();
    assert_eq!(received.payload_type(), PayloadType::Image);
    assert_eq!(received.header().frame_number(), 0);
    assert_eq!(received.payload().as_ref(), &[5]);

    // ...and is not echoed back to A.
    let mut buf_a = vec![0u8; RECV_BUFFER_SIZE];
    assert!(
        timeout(Duration::from_millis(300), a.receive(&mut buf_a))
            .await
            .is_err(),
        "sender received its own packet back"
    );

    a.close();
    b.close();
    relay_socket.close();
}

#[tokio::test]
async fn relay_stops_forwarding_after_leave() {
    let (relay_socket, relay_port) = spawn_relay().await;

    let a = client(relay_port).await;
    let b = client(relay_port).await;

    let session_a = Session::new(Arc::clone(&a));
    let session_b = Session::new(Arc::clone(&b));
    session_a.join().await.unwrap();
    session_b.join().await.unwrap();
    settle().await;

    session_b.leave().await.unwrap();
    settle().await;

    // With B gone there is nobody left to forward to.
    let data = Packet::new(PayloadType::Image, 1, 0, 1, Bytes::from_static(&[9]));
    a.send(&data).await.unwrap();

    let mut buf = vec![0u8; RECV_BUFFER_SIZE];
    assert!(
        timeout(Duration::from_millis(300), b.receive(&mut buf))
            .await
            .is_err(),
        "departed peer still received traffic"
    );

    a.close();
    b.close();
    relay_socket.close();
}

#[tokio::test]
async fn relay_never_forwards_control_packets() {
    let (relay_socket, relay_port) = spawn_relay().await;

    let a = client(relay_port).await;
    let b = client(relay_port).await;

    Session::new(Arc::clone(&b)).join().await.unwrap();
    settle().await;

    // A's JOIN mutates the table but must not reach B.
    Session::new(Arc::clone(&a)).join().await.unwrap();

    let mut buf = vec![0u8; RECV_BUFFER_SIZE];
    assert!(
        timeout(Duration::from_millis(300), b.receive(&mut buf))
            .await
            .is_err(),
        "control packet was forwarded"
    );

    a.close();
    b.close();
    relay_socket.close();
}

// ── End to end ───────────────────────────────────────────────────

#[tokio::test]
async fn image_frame_travels_sender_to_viewer() {
    let (relay_socket, relay_port) = spawn_relay().await;

    let sender = client(relay_port).await;
    let viewer = client(relay_port).await;

    Session::new(Arc::clone(&sender)).join().await.unwrap();
    Session::new(Arc::clone(&viewer)).join().await.unwrap();
    settle().await;

    // Viewer side: receive loop feeding an image stream.
    let stream = ImageStream::new();
    let mut frames = stream.frames();
    let viewer_loop = Receiver::new(Arc::clone(&viewer), RECV_BUFFER_SIZE, stream).unwrap();
    tokio::spawn(viewer_loop.run());

    // Sender side: fragment one frame and push it through the relay.
    let original = noise_frame(160);
    let encoder = FrameAssembler::<ImageCodec>::new();
    let packets = encoder.encode(&original, 0).unwrap();
    assert!(packets.len() > 1, "expected a multi-fragment frame");
    for packet in &packets {
        sender.send(packet).await.unwrap();
    }

    timeout(Duration::from_secs(3), frames.changed())
        .await
        .expect("no frame arrived")
        .unwrap();
    let received = frames.borrow().clone().expect("empty frame published");
    assert_eq!(received, original);

    sender.close();
    viewer.close();
    relay_socket.close();
}
