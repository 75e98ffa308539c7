//! IPv4 to hardware address resolution over ARP

use arpspoof_core::{Error, FrameTransport, LocalIdentity, MacAddr, Result};
use arpspoof_packet::ArpFrame;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::cache::AddressCache;
use crate::config::EngineConfig;

static NEVER_CANCELLED: AtomicBool = AtomicBool::new(true);

/// Resolves addresses by broadcasting ARP requests and caching the answers
#[derive(Clone)]
pub struct AddressResolver {
    transport: Arc<dyn FrameTransport>,
    local: LocalIdentity,
    cache: AddressCache,
    timeout: Duration,
    attempts: u32,
    poll_interval: Duration,
}

impl AddressResolver {
    pub fn new(
        transport: Arc<dyn FrameTransport>,
        local: LocalIdentity,
        cache: AddressCache,
        config: &EngineConfig,
    ) -> Self {
        Self {
            transport,
            local,
            cache,
            timeout: config.resolve_timeout,
            attempts: config.resolve_attempts.max(1),
            poll_interval: config.poll_interval,
        }
    }

    pub fn cache(&self) -> &AddressCache {
        &self.cache
    }

    /// Resolve `ip`, answering from the cache when possible
    pub async fn resolve(&self, ip: Ipv4Addr) -> Result<MacAddr> {
        self.resolve_until(ip, &NEVER_CANCELLED).await
    }

    /// Resolve `ip`, giving up with [`Error::Interrupted`] once `running` clears
    pub async fn resolve_until(&self, ip: Ipv4Addr, running: &AtomicBool) -> Result<MacAddr> {
        if let Some(mac) = self.cache.lookup(ip) {
            trace!(ip = %ip, mac = %mac, "Address cache hit");
            return Ok(mac);
        }

        // Subscribe first so a fast reply cannot slip past us
        let mut frames = self.transport.subscribe();
        let request = ArpFrame::request(self.local.mac, self.local.ip, ip).encode();

        for attempt in 1..=self.attempts {
            if !running.load(Ordering::Relaxed) {
                return Err(Error::Interrupted(format!("resolution of {} cancelled", ip)));
            }

            // A failed send still uses up this attempt's window
            match self.transport.send(&request).await {
                Ok(()) => debug!(ip = %ip, attempt = attempt, "Sent ARP request"),
                Err(e) => warn!(ip = %ip, attempt = attempt, error = %e, "Failed to send ARP request"),
            }

            let deadline = Instant::now() + self.timeout;
            loop {
                if !running.load(Ordering::Relaxed) {
                    return Err(Error::Interrupted(format!("resolution of {} cancelled", ip)));
                }

                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    break;
                }

                let Some(packet) = frames
                    .recv_timeout(remaining.min(self.poll_interval))
                    .await?
                else {
                    continue;
                };

                if let Some(mac) = self.match_reply(packet.data(), ip) {
                    self.cache.insert(ip, mac);
                    debug!(ip = %ip, mac = %mac, "Resolved hardware address");
                    return Ok(mac);
                }
            }

            warn!(ip = %ip, attempt = attempt, of = self.attempts, "No ARP reply");
        }

        Err(Error::ResolutionTimeout {
            ip,
            attempts: self.attempts,
        })
    }

    /// Hardware address announced for `ip` by a frame not sent from this host
    fn match_reply(&self, data: &[u8], ip: Ipv4Addr) -> Option<MacAddr> {
        let frame = match ArpFrame::decode(data) {
            Ok(frame) => frame,
            Err(e) => {
                trace!(error = %e, "Skipping undecodable frame");
                return None;
            }
        };

        if frame.is_arp()
            && frame.arp.sender_proto_addr == ip
            && frame.ethernet.source != self.local.mac
        {
            Some(frame.arp.sender_hw_addr)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SimulatedLink;
    use arpspoof_packet::{ArpOperation, ARP_FRAME_LEN};

    const LOCAL_MAC: MacAddr = MacAddr([0x11; 6]);
    const LOCAL_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 0, 10);
    const HOST_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 0, 2);
    const HOST_MAC: MacAddr = MacAddr([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);

    fn resolver(link: Arc<SimulatedLink>, config: &EngineConfig) -> AddressResolver {
        AddressResolver::new(
            link,
            LocalIdentity::new(LOCAL_MAC, LOCAL_IP),
            AddressCache::new(),
            config,
        )
    }

    #[tokio::test]
    async fn test_resolve_and_cache() {
        let link = Arc::new(SimulatedLink::new().with_host(HOST_IP, HOST_MAC));
        let resolver = resolver(link.clone(), &EngineConfig::default());

        assert_eq!(resolver.resolve(HOST_IP).await.unwrap(), HOST_MAC);
        assert_eq!(resolver.cache().lookup(HOST_IP), Some(HOST_MAC));

        let sent = link.sent_arp();
        assert_eq!(sent.len(), 1);
        let request = sent[0];
        assert_eq!(request.ethernet.destination, MacAddr::BROADCAST);
        assert_eq!(request.ethernet.source, LOCAL_MAC);
        assert_eq!(request.arp.operation, ArpOperation::Request);
        assert_eq!(request.arp.sender_hw_addr, LOCAL_MAC);
        assert_eq!(request.arp.sender_proto_addr, LOCAL_IP);
        assert_eq!(request.arp.target_hw_addr, MacAddr::ZERO);
        assert_eq!(request.arp.target_proto_addr, HOST_IP);

        // Second call is answered from the cache
        assert_eq!(resolver.resolve(HOST_IP).await.unwrap(), HOST_MAC);
        assert_eq!(link.sent_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_timeout_after_all_attempts() {
        let link = Arc::new(SimulatedLink::new());
        let config = EngineConfig::default()
            .with_resolve_timeout(Duration::from_millis(200))
            .with_resolve_attempts(2);
        let resolver = resolver(link.clone(), &config);

        match resolver.resolve(HOST_IP).await {
            Err(Error::ResolutionTimeout { ip, attempts }) => {
                assert_eq!(ip, HOST_IP);
                assert_eq!(attempts, 2);
            }
            other => panic!("Expected ResolutionTimeout, got {:?}", other),
        }

        assert_eq!(link.sent_count(), 2);
        assert!(resolver.cache().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_own_frames_are_ignored() {
        let link = Arc::new(SimulatedLink::new());
        let config = EngineConfig::default()
            .with_resolve_timeout(Duration::from_millis(200))
            .with_resolve_attempts(1);
        let resolver = resolver(link.clone(), &config);

        let resolving = {
            let resolver = resolver.clone();
            tokio::spawn(async move { resolver.resolve(HOST_IP).await })
        };
        assert!(link.wait_for_sent(1, Duration::from_millis(100)).await);

        // A forged reply we sent ourselves for the same address
        let own = ArpFrame::reply(
            LOCAL_MAC,
            MacAddr::BROADCAST,
            LOCAL_MAC,
            HOST_IP,
            MacAddr::ZERO,
            LOCAL_IP,
        );
        link.inject(own.encode());

        assert!(matches!(
            resolving.await.unwrap(),
            Err(Error::ResolutionTimeout { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_skips_unrelated_and_short_frames() {
        let link = Arc::new(SimulatedLink::new());
        let resolver = resolver(link.clone(), &EngineConfig::default());

        let resolving = {
            let resolver = resolver.clone();
            tokio::spawn(async move { resolver.resolve(HOST_IP).await })
        };
        assert!(link.wait_for_sent(1, Duration::from_millis(100)).await);

        link.inject(vec![0u8; 20]);
        let other = ArpFrame::reply(
            MacAddr([0x44; 6]),
            LOCAL_MAC,
            MacAddr([0x44; 6]),
            Ipv4Addr::new(192, 168, 0, 3),
            LOCAL_MAC,
            LOCAL_IP,
        );
        link.inject(other.encode());

        // Padded reply from the right host
        let reply = ArpFrame::reply(HOST_MAC, LOCAL_MAC, HOST_MAC, HOST_IP, LOCAL_MAC, LOCAL_IP);
        let mut padded = reply.encode().to_vec();
        padded.resize(60, 0);
        assert!(padded.len() > ARP_FRAME_LEN);
        link.inject(padded);

        assert_eq!(resolving.await.unwrap().unwrap(), HOST_MAC);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_resolution() {
        let link = Arc::new(SimulatedLink::new());
        let resolver = resolver(link.clone(), &EngineConfig::default());
        let running = AtomicBool::new(false);

        assert!(matches!(
            resolver.resolve_until(HOST_IP, &running).await,
            Err(Error::Interrupted(_))
        ));
        assert_eq!(link.sent_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_failure_retries_next_attempt() {
        let link = Arc::new(SimulatedLink::new().with_host(HOST_IP, HOST_MAC));
        link.fail_next_sends(1);
        let config = EngineConfig::default()
            .with_resolve_timeout(Duration::from_millis(200))
            .with_resolve_attempts(3);
        let resolver = resolver(link.clone(), &config);

        assert_eq!(resolver.resolve(HOST_IP).await.unwrap(), HOST_MAC);
        assert_eq!(link.sent_count(), 1);
        assert_eq!(resolver.cache().lookup(HOST_IP), Some(HOST_MAC));
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_send_failing_times_out() {
        let link = Arc::new(SimulatedLink::new().with_host(HOST_IP, HOST_MAC));
        link.set_fail_sends(true);
        let config = EngineConfig::default()
            .with_resolve_timeout(Duration::from_millis(200))
            .with_resolve_attempts(2);
        let resolver = resolver(link.clone(), &config);

        assert!(matches!(
            resolver.resolve(HOST_IP).await,
            Err(Error::ResolutionTimeout { attempts: 2, .. })
        ));
        assert_eq!(link.sent_count(), 0);
    }
}
