//! Capture statistics

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Statistics for the capture side of a transport
#[derive(Debug, Clone, Default)]
pub struct CaptureStats {
    /// Frames handed to subscribers
    pub packets_received: u64,
    /// Frames dropped by the kernel, as reported by pcap on shutdown
    pub packets_dropped: u64,
    /// Total bytes received
    pub bytes_received: u64,
    /// Frames injected
    pub packets_sent: u64,
    /// Capture duration
    pub duration: Duration,
    /// Packets per second
    pub packets_per_second: f64,
}

impl CaptureStats {
    /// Calculate drop rate as percentage
    pub fn drop_rate(&self) -> f64 {
        if self.packets_received == 0 {
            return 0.0;
        }
        (self.packets_dropped as f64 / self.packets_received as f64) * 100.0
    }

    /// Format statistics as human-readable string
    pub fn format(&self) -> String {
        format!(
            "Received: {} packets ({} bytes), Sent: {} packets, Dropped: {} packets ({:.2}%), Duration: {:.2}s, Rate: {:.2} pps",
            self.packets_received,
            self.bytes_received,
            self.packets_sent,
            self.packets_dropped,
            self.drop_rate(),
            self.duration.as_secs_f64(),
            self.packets_per_second,
        )
    }
}

/// Thread-safe statistics accumulator shared with the capture thread
#[derive(Debug, Clone)]
pub struct StatsAccumulator {
    packets_received: Arc<AtomicU64>,
    packets_dropped: Arc<AtomicU64>,
    bytes_received: Arc<AtomicU64>,
    packets_sent: Arc<AtomicU64>,
    start_time: Instant,
}

impl StatsAccumulator {
    pub fn new() -> Self {
        Self {
            packets_received: Arc::new(AtomicU64::new(0)),
            packets_dropped: Arc::new(AtomicU64::new(0)),
            bytes_received: Arc::new(AtomicU64::new(0)),
            packets_sent: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    /// Record a received packet
    pub fn record_packet(&self, size: usize) {
        self.packets_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received
            .fetch_add(size as u64, Ordering::Relaxed);
    }

    /// Record dropped packets
    pub fn record_drops(&self, count: u64) {
        self.packets_dropped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_sent(&self) {
        self.packets_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current statistics snapshot
    pub fn snapshot(&self) -> CaptureStats {
        let packets_received = self.packets_received.load(Ordering::Relaxed);
        let duration = self.start_time.elapsed();

        let secs = duration.as_secs_f64();
        let packets_per_second = if secs > 0.0 {
            packets_received as f64 / secs
        } else {
            0.0
        };

        CaptureStats {
            packets_received,
            packets_dropped: self.packets_dropped.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            packets_sent: self.packets_sent.load(Ordering::Relaxed),
            duration,
            packets_per_second,
        }
    }
}

impl Default for StatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
