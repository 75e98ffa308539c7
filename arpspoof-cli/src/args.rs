//! CLI argument parsing

use arpspoof_capture::CaptureConfig;
use arpspoof_core::{Result, SessionTarget};
use arpspoof_engine::EngineConfig;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::net::Ipv4Addr;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "arpspoof")]
#[command(
    version,
    about = "ARP cache poisoning and IPv4 relay",
    long_about = "Tells each SENDER_IP that TARGET_IP is at this host's hardware address, \
                  then forwards the IPv4 traffic it receives from the sender to the real target."
)]
pub struct Cli {
    /// Network interface to use
    #[arg(value_name = "INTERFACE", required_unless_present = "list_interfaces")]
    pub interface: Option<String>,

    /// Victim and impersonated address pairs: SENDER_IP TARGET_IP [SENDER_IP TARGET_IP]...
    #[arg(
        value_name = "ADDRESSES",
        num_args = 2..,
        required_unless_present = "list_interfaces"
    )]
    pub addresses: Vec<Ipv4Addr>,

    /// Wait for an ARP reply, per attempt
    #[arg(long, value_name = "MS", default_value = "2000")]
    pub resolve_timeout: u64,

    /// ARP requests sent before an address is given up on
    #[arg(
        long,
        value_name = "N",
        default_value = "3",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub resolve_attempts: u32,

    /// Delay between an observed ARP request and the forged answer
    #[arg(long, value_name = "MS", default_value = "300")]
    pub respoof_delay: u64,

    /// Re-send the forged reply every SECS seconds (0 = only on ARP requests)
    #[arg(long, value_name = "SECS", default_value = "0")]
    pub refresh: u64,

    /// Leave the victims poisoned on exit
    #[arg(long)]
    pub no_restore: bool,

    /// Do not put the interface in promiscuous mode
    #[arg(long)]
    pub no_promisc: bool,

    /// Verbose output (-v, -vv, -vvv for increasing verbosity)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// List available network interfaces and exit
    #[arg(short = 'l', long)]
    pub list_interfaces: bool,
}

impl Cli {
    /// Parse command-line arguments, exiting with usage on error
    pub fn parse_args() -> Self {
        let cli = Self::parse();
        if let Err(e) = cli.validate() {
            e.exit();
        }
        cli
    }

    /// Checks clap cannot express: addresses must come in pairs
    pub fn validate(&self) -> std::result::Result<(), clap::Error> {
        if !self.list_interfaces && self.addresses.len() % 2 != 0 {
            return Err(Self::command().error(
                ErrorKind::WrongNumberOfValues,
                format!(
                    "addresses must come in SENDER_IP TARGET_IP pairs, got {}",
                    self.addresses.len()
                ),
            ));
        }
        Ok(())
    }

    pub fn session_targets(&self) -> Result<Vec<SessionTarget>> {
        SessionTarget::from_pairs(&self.addresses)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_resolve_timeout(Duration::from_millis(self.resolve_timeout))
            .with_resolve_attempts(self.resolve_attempts)
            .with_respoof_delay(Duration::from_millis(self.respoof_delay))
            .with_refresh_interval(Duration::from_secs(self.refresh))
            .with_restore(!self.no_restore)
    }

    pub fn capture_config(&self) -> CaptureConfig {
        CaptureConfig {
            promiscuous: !self.no_promisc,
            ..Default::default()
        }
    }

    /// Default log filter for the verbosity level; `RUST_LOG` takes precedence
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
