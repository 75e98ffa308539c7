//! Frame transport contract
//!
//! The engine never talks to a capture library directly. It injects frames
//! through [`FrameTransport::send`] and reads captured frames from a
//! [`FrameReceiver`] obtained with [`FrameTransport::subscribe`]. Every
//! subscriber sees every frame captured after it subscribed, so several
//! sessions can share one capture handle.

use crate::{Error, Packet, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

/// Raw frame injection and capture on one interface
#[async_trait]
pub trait FrameTransport: Send + Sync {
    /// Inject one raw frame (Ethernet header included)
    async fn send(&self, frame: &[u8]) -> Result<()>;

    /// Start receiving captured frames
    fn subscribe(&self) -> FrameReceiver;

    /// Name of the underlying interface
    fn name(&self) -> &str;
}

/// Receiving end of a transport subscription
#[derive(Debug)]
pub struct FrameReceiver {
    inner: broadcast::Receiver<Packet>,
}

impl FrameReceiver {
    pub fn new(inner: broadcast::Receiver<Packet>) -> Self {
        Self { inner }
    }

    /// A receiver whose transport has already shut down
    pub fn closed() -> Self {
        let (sender, inner) = broadcast::channel(1);
        drop(sender);
        Self { inner }
    }

    /// Wait for the next captured frame.
    ///
    /// Frames lost because this subscriber fell behind are logged and
    /// skipped. Fails once the transport has shut down.
    pub async fn recv(&mut self) -> Result<Packet> {
        loop {
            match self.inner.recv().await {
                Ok(packet) => return Ok(packet),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped = skipped, "Frame receiver lagged, frames dropped");
                }
                Err(RecvError::Closed) => {
                    return Err(Error::Capture("transport closed".to_string()));
                }
            }
        }
    }

    /// Wait at most `timeout` for the next frame; `Ok(None)` on expiry
    pub async fn recv_timeout(&mut self, timeout: Duration) -> Result<Option<Packet>> {
        match tokio::time::timeout(timeout, self.recv()).await {
            Ok(result) => result.map(Some),
            Err(_) => Ok(None),
        }
    }
}

/// Capture side of a transport: hands each captured frame to every subscriber.
///
/// Clones share the channel. Once [`FrameFanout::close`] is called every
/// subscriber, current or future, sees the transport as closed.
#[derive(Debug, Clone)]
pub struct FrameFanout {
    sender: Arc<Mutex<Option<broadcast::Sender<Packet>>>>,
}

impl FrameFanout {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(Mutex::new(Some(sender))),
        }
    }

    /// Deliver `packet` to current subscribers; `false` once closed
    pub fn publish(&self, packet: Packet) -> bool {
        match self.sender.lock().as_ref() {
            Some(sender) => {
                // No subscribers is fine: nobody is waiting for frames yet
                let _ = sender.send(packet);
                true
            }
            None => false,
        }
    }

    pub fn subscribe(&self) -> FrameReceiver {
        match self.sender.lock().as_ref() {
            Some(sender) => FrameReceiver::new(sender.subscribe()),
            None => FrameReceiver::closed(),
        }
    }

    pub fn close(&self) {
        self.sender.lock().take();
    }

    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_receiver_delivers_frames() {
        let (tx, rx) = broadcast::channel(4);
        let mut receiver = FrameReceiver::new(rx);

        tx.send(Packet::new("test0", vec![1u8, 2, 3])).unwrap();
        let packet = receiver.recv().await.unwrap();
        assert_eq!(packet.data(), &[1, 2, 3]);
    }

    #[tokio::test]
    async fn test_receiver_skips_lagged_frames() {
        let (tx, rx) = broadcast::channel(2);
        let mut receiver = FrameReceiver::new(rx);

        for i in 0..5u8 {
            tx.send(Packet::new("test0", vec![i])).unwrap();
        }

        // Oldest frames were overwritten; the receiver resumes at the oldest kept one
        let packet = receiver.recv().await.unwrap();
        assert_eq!(packet.data(), &[3]);
    }

    #[tokio::test]
    async fn test_receiver_reports_closed_transport() {
        let (tx, rx) = broadcast::channel::<Packet>(4);
        let mut receiver = FrameReceiver::new(rx);
        drop(tx);

        assert!(matches!(receiver.recv().await, Err(Error::Capture(_))));
    }

    #[tokio::test]
    async fn test_fanout_close_reaches_every_subscriber() {
        let fanout = FrameFanout::new(4);
        let mut early = fanout.subscribe();
        let publisher = fanout.clone();

        assert!(publisher.publish(Packet::new("test0", vec![7u8])));
        publisher.close();

        // Frames queued before the close are still delivered
        assert_eq!(early.recv().await.unwrap().data(), &[7]);
        assert!(matches!(early.recv().await, Err(Error::Capture(_))));

        let mut late = fanout.subscribe();
        assert!(matches!(late.recv().await, Err(Error::Capture(_))));
        assert!(fanout.is_closed());
        assert!(!fanout.publish(Packet::new("test0", vec![8u8])));
    }

    #[tokio::test(start_paused = true)]
    async fn test_receiver_timeout() {
        let (_tx, rx) = broadcast::channel::<Packet>(4);
        let mut receiver = FrameReceiver::new(rx);

        let result = receiver
            .recv_timeout(Duration::from_millis(50))
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
