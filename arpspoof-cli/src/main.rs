use arpspoof_capture::{list_interfaces, lookup_identity, PcapTransport};
use arpspoof_cli::Cli;
use arpspoof_core::Error;
use arpspoof_engine::{AddressCache, RelayEngine, SessionManager, SessionOutcome};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse_args();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    if cli.list_interfaces {
        return print_interfaces();
    }

    let interface = cli.interface.as_deref().ok_or("no interface given")?;
    let targets = cli.session_targets()?;

    let local = lookup_identity(interface)?;
    info!(interface = %interface, local = %local, "Using interface");

    let transport = Arc::new(PcapTransport::open(interface, cli.capture_config())?);
    let engine = RelayEngine::new(
        transport.clone(),
        local,
        AddressCache::new(),
        cli.engine_config(),
    );
    let manager = SessionManager::new(engine);
    manager.launch_all(&targets)?;

    let outcomes = tokio::select! {
        outcomes = manager.wait_all() => outcomes,
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                error!(error = %e, "Failed to listen for Ctrl-C");
            }
            info!("Interrupted, stopping sessions");
            manager.stop_all().await
        }
    };

    transport.close();
    info!(interface = %interface, "{}", transport.stats().format());

    let failed = report(&outcomes);
    if !outcomes.is_empty() && failed == outcomes.len() {
        return Err("every session failed".into());
    }

    Ok(())
}

/// Print one line per session; returns how many failed
fn report(outcomes: &[SessionOutcome]) -> usize {
    let mut failed = 0;

    for outcome in outcomes {
        match &outcome.result {
            Ok(stats) => println!(
                "{}: {} forged replies ({} on request), {} frames relayed, {} send errors",
                outcome.target,
                stats.spoofs_sent,
                stats.respoofs,
                stats.frames_relayed,
                stats.send_errors
            ),
            Err(Error::Interrupted(_)) => {
                warn!(pair = %outcome.target, "Stopped before addresses were resolved");
            }
            Err(e) => {
                error!(pair = %outcome.target, error = %e, "Session failed");
                failed += 1;
            }
        }
    }

    failed
}

fn print_interfaces() -> Result<(), Box<dyn std::error::Error>> {
    for iface in list_interfaces()? {
        let mac = iface
            .mac
            .map(|mac| mac.to_string())
            .unwrap_or_else(|| "-".to_string());
        let ipv4 = iface
            .primary_ipv4()
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "-".to_string());
        let status = if iface.is_capture_capable() {
            "usable"
        } else if iface.is_loopback {
            "loopback"
        } else {
            "down"
        };

        println!("{:<16} {:<18} {:<16} {}", iface.name, mac, ipv4, status);
    }
    Ok(())
}
