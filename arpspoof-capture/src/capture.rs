//! pcap/pnet backed frame transport
//!
//! Frames are captured with pcap on a dedicated thread and fanned out to
//! every subscriber over a broadcast channel. Injection goes through a pnet
//! datalink sender so it never contends with the blocking capture loop.

use arpspoof_core::{Error, FrameFanout, FrameReceiver, FrameTransport, Packet, Result};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use pcap::{Active, Capture, Device};
use pnet_datalink::{Channel, DataLinkSender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::SystemTime;
use tracing::{debug, error, info, warn};

use crate::filters;
use crate::interface::{find_network_interface, InterfaceInfo};
use crate::stats::{CaptureStats, StatsAccumulator};

/// Default snapshot length (maximum bytes per packet)
const DEFAULT_SNAPLEN: i32 = 65535;

/// Default read timeout; bounds how long the capture thread takes to notice a shutdown
const DEFAULT_TIMEOUT_MS: i32 = 100;

/// Default number of frames buffered per subscriber
const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Configuration for packet capture
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Maximum bytes to capture per packet
    pub snaplen: i32,
    /// Read timeout in milliseconds
    pub timeout_ms: i32,
    /// Enable promiscuous mode
    pub promiscuous: bool,
    /// Buffer size (0 = default)
    pub buffer_size: i32,
    /// Enable immediate mode (deliver packets immediately)
    pub immediate_mode: bool,
    /// Frames buffered per subscriber before the slowest one starts losing frames
    pub channel_capacity: usize,
    /// BPF filter; `None` selects ARP and IPv4 not sent by this host
    pub filter: Option<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            snaplen: DEFAULT_SNAPLEN,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            promiscuous: true,
            buffer_size: 0,
            immediate_mode: true,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            filter: None,
        }
    }
}

/// Live capture and injection handle on one interface
pub struct PcapTransport {
    /// Interface name
    interface: String,
    /// Injection side
    sender: Mutex<Box<dyn DataLinkSender>>,
    /// Fan-out of captured frames, closed when the capture thread exits
    frames: FrameFanout,
    /// Capture thread keeps running while this is set
    running: Arc<AtomicBool>,
    /// Capture thread handle, joined on drop
    capture_thread: Mutex<Option<JoinHandle<()>>>,
    /// Statistics accumulator
    stats: StatsAccumulator,
}

impl PcapTransport {
    /// Open a live capture and an injection channel on `interface`.
    ///
    /// Every failure here is reported as [`Error::TransportOpen`].
    pub fn open(interface: &str, config: CaptureConfig) -> Result<Self> {
        let network_interface = find_network_interface(interface)
            .map_err(|e| Error::transport_open(interface, e.to_string()))?;
        let interface_info = InterfaceInfo::from(&network_interface);

        if !interface_info.is_up {
            return Err(Error::transport_open(interface, "interface is not up"));
        }

        let filter = config.filter.clone().unwrap_or_else(|| match interface_info.mac {
            Some(mac) => filters::relay_filter_excluding(&mac.to_string()),
            None => filters::relay_filter(),
        });

        let capture = Self::init_capture(interface, &config, &filter)?;

        let sender = match pnet_datalink::channel(&network_interface, Default::default()) {
            Ok(Channel::Ethernet(tx, _rx)) => tx,
            Ok(_) => return Err(Error::transport_open(interface, "unsupported channel type")),
            Err(e) => return Err(Error::transport_open(interface, e.to_string())),
        };

        let frames = FrameFanout::new(config.channel_capacity);
        let running = Arc::new(AtomicBool::new(true));
        let stats = StatsAccumulator::new();

        let capture_thread = Self::spawn_capture_thread(
            interface.to_string(),
            capture,
            frames.clone(),
            Arc::clone(&running),
            stats.clone(),
        )?;

        info!(interface = %interface, filter = %filter, "Transport opened");

        Ok(Self {
            interface: interface.to_string(),
            sender: Mutex::new(sender),
            frames,
            running,
            capture_thread: Mutex::new(Some(capture_thread)),
            stats,
        })
    }

    /// Initialize pcap capture
    fn init_capture(interface: &str, config: &CaptureConfig, filter: &str) -> Result<Capture<Active>> {
        debug!("Initializing pcap capture on {}", interface);

        let mut capture = Capture::from_device(Device::from(interface))
            .map_err(|e| Error::transport_open(interface, e.to_string()))?
            .promisc(config.promiscuous)
            .snaplen(config.snaplen)
            .timeout(config.timeout_ms)
            .immediate_mode(config.immediate_mode);

        if config.buffer_size > 0 {
            capture = capture.buffer_size(config.buffer_size);
        }

        let mut capture = capture
            .open()
            .map_err(|e| Error::transport_open(interface, e.to_string()))?;

        capture
            .filter(filter, true)
            .map_err(|e| Error::transport_open(interface, format!("invalid BPF filter: {}", e)))?;

        Ok(capture)
    }

    fn spawn_capture_thread(
        interface: String,
        mut capture: Capture<Active>,
        frames: FrameFanout,
        running: Arc<AtomicBool>,
        stats: StatsAccumulator,
    ) -> Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(format!("capture-{}", interface))
            .spawn(move || {
                run_capture_loop(
                    &interface,
                    || match capture.next_packet() {
                        Ok(packet) => NextFrame::Frame(Packet {
                            timestamp: SystemTime::now(),
                            interface: interface.clone(),
                            data: Bytes::copy_from_slice(packet.data),
                            wire_len: packet.header.len as usize,
                        }),
                        Err(pcap::Error::TimeoutExpired) => NextFrame::Idle,
                        Err(e) => NextFrame::Failed(e.to_string()),
                    },
                    &frames,
                    &running,
                    &stats,
                );

                if let Ok(stat) = capture.stats() {
                    stats.record_drops(u64::from(stat.dropped));
                }
            })
            .map_err(Error::Io)
    }

    /// Get current statistics
    pub fn stats(&self) -> CaptureStats {
        self.stats.snapshot()
    }

    /// Check if the capture thread is still delivering frames
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Stop capturing and wait for the capture thread to exit
    pub fn close(&self) {
        if self.running.swap(false, Ordering::Relaxed) {
            info!(interface = %self.interface, "Closing transport");
        }

        if let Some(handle) = self.capture_thread.lock().take() {
            if handle.join().is_err() {
                warn!(interface = %self.interface, "Capture thread panicked");
            }
        }
    }
}

#[async_trait]
impl FrameTransport for PcapTransport {
    async fn send(&self, frame: &[u8]) -> Result<()> {
        let mut sender = self.sender.lock();
        sender
            .send_to(frame, None)
            .ok_or_else(|| Error::send("insufficient buffer space"))?
            .map_err(|e| Error::send(e.to_string()))?;
        self.stats.record_sent();
        Ok(())
    }

    fn subscribe(&self) -> FrameReceiver {
        self.frames.subscribe()
    }

    fn name(&self) -> &str {
        &self.interface
    }
}

/// One step of the capture source
enum NextFrame {
    Frame(Packet),
    /// Read timeout expired without a frame
    Idle,
    Failed(String),
}

/// Publish frames from `next_frame` until stopped or the source fails.
///
/// On return the fan-out is closed, so every subscriber sees the transport
/// as gone instead of waiting for frames that will never come.
fn run_capture_loop(
    interface: &str,
    mut next_frame: impl FnMut() -> NextFrame,
    frames: &FrameFanout,
    running: &AtomicBool,
    stats: &StatsAccumulator,
) {
    while running.load(Ordering::Relaxed) {
        match next_frame() {
            NextFrame::Frame(packet) => {
                stats.record_packet(packet.len());
                frames.publish(packet);
            }
            NextFrame::Idle => continue,
            NextFrame::Failed(e) => {
                error!(interface = %interface, error = %e, "Packet capture error");
                break;
            }
        }
    }

    frames.close();
    running.store(false, Ordering::Relaxed);
    debug!(interface = %interface, "Capture thread finished");
}

impl Drop for PcapTransport {
    fn drop(&mut self) {
        self.close();
    }
}
