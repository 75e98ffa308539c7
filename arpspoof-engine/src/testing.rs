//! In-memory transport for engine tests

use arpspoof_core::{Error, FrameFanout, FrameReceiver, FrameTransport, MacAddr, Packet, Result};
use arpspoof_packet::ArpFrame;
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

const LINK_NAME: &str = "sim0";

/// A link that records everything sent on it and answers ARP requests
/// for the hosts it knows about
pub struct SimulatedLink {
    hosts: Mutex<HashMap<Ipv4Addr, MacAddr>>,
    sent: Mutex<Vec<Bytes>>,
    frames: FrameFanout,
    fail_sends: AtomicBool,
    failures_left: AtomicUsize,
}

impl SimulatedLink {
    pub fn new() -> Self {
        Self {
            hosts: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            frames: FrameFanout::new(256),
            fail_sends: AtomicBool::new(false),
            failures_left: AtomicUsize::new(0),
        }
    }

    pub fn with_host(self, ip: Ipv4Addr, mac: MacAddr) -> Self {
        self.hosts.lock().insert(ip, mac);
        self
    }

    /// Deliver `frame` to every subscriber as if it had been captured
    pub fn inject(&self, frame: impl Into<Bytes>) {
        self.frames.publish(Packet::new(LINK_NAME, frame));
    }

    /// Close the link; subscribers see the transport as closed
    pub fn close(&self) {
        self.frames.close();
    }

    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::Relaxed);
    }

    /// Fail only the next `count` sends
    pub fn fail_next_sends(&self, count: usize) {
        self.failures_left.store(count, Ordering::Relaxed);
    }

    pub fn sent(&self) -> Vec<Bytes> {
        self.sent.lock().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }

    /// Sent frames that decode as ARP
    pub fn sent_arp(&self) -> Vec<ArpFrame> {
        self.sent
            .lock()
            .iter()
            .filter_map(|frame| ArpFrame::decode(frame).ok())
            .filter(|frame| frame.is_arp())
            .collect()
    }

    pub fn clear_sent(&self) {
        self.sent.lock().clear();
    }

    /// Yield until at least `count` frames have been sent or `timeout` passes
    pub async fn wait_for_sent(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.sent_count() < count {
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        true
    }

    fn answer(&self, frame: &[u8]) {
        let Ok(request) = ArpFrame::decode(frame) else {
            return;
        };
        if !request.is_arp() || !request.arp.is_request() {
            return;
        }

        let host = self.hosts.lock().get(&request.arp.target_proto_addr).copied();
        if let Some(mac) = host {
            let reply = ArpFrame::reply(
                mac,
                request.arp.sender_hw_addr,
                mac,
                request.arp.target_proto_addr,
                request.arp.sender_hw_addr,
                request.arp.sender_proto_addr,
            );
            self.inject(reply.encode());
        }
    }
}

#[async_trait]
impl FrameTransport for SimulatedLink {
    async fn send(&self, frame: &[u8]) -> Result<()> {
        if self.fail_sends.load(Ordering::Relaxed) {
            return Err(Error::send("simulated send failure"));
        }

        let transient = self
            .failures_left
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |left| left.checked_sub(1))
            .is_ok();
        if transient {
            return Err(Error::send("transient send failure"));
        }

        self.sent.lock().push(Bytes::copy_from_slice(frame));
        self.answer(frame);
        Ok(())
    }

    fn subscribe(&self) -> FrameReceiver {
        self.frames.subscribe()
    }

    fn name(&self) -> &str {
        LINK_NAME
    }
}
