use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use ezsocket_frame::{Envelope, FrameConfig, ValueKind, DEFAULT_PACKET_SIZE};
use ezsocket_peer::{Connection, ConnectionConfig, PeerError, Role, StopHandle, TerminationPolicy};
use ezsocket_transport::{AddressFamily, RetryPolicy};

use crate::exit::{peer_error, CliError, CliResult, INTERNAL};
use crate::output::OutputFormat;

pub mod listen;
pub mod send;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Echo every value back to each connecting peer.
    Serve(ServeArgs),
    /// Send a value and read the echo back.
    Send(SendArgs),
    /// Print values received from connecting peers.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Host to bind (server) or connect to (client).
    #[arg(long, default_value = "127.0.0.1", env = "EZSOCKET_HOST")]
    pub host: String,
    /// TCP port.
    #[arg(long, short = 'p', env = "EZSOCKET_PORT")]
    pub port: u16,
    /// Address family used to resolve the host.
    #[arg(long, value_enum, default_value = "ipv4")]
    pub family: FamilyArg,
    /// Envelope prefix; must match the peer.
    #[arg(long, default_value = "", env = "EZSOCKET_PREFIX")]
    pub prefix: String,
    /// Envelope suffix; must match the peer.
    #[arg(long, default_value = "", env = "EZSOCKET_SUFFIX")]
    pub suffix: String,
    /// Maximum bytes per image packet (1..=65535).
    #[arg(long, default_value_t = DEFAULT_PACKET_SIZE)]
    pub packet_size: usize,
    /// Pause between image packets (e.g. 50us, 1ms, 0).
    #[arg(long, default_value = "50us")]
    pub packet_delay: String,
    /// Retry bind/connect at this interval (e.g. 500ms). Omit to fail fast.
    #[arg(long, value_name = "INTERVAL")]
    pub retry: Option<String>,
    /// Give up after this many bind/connect attempts.
    #[arg(long, requires = "retry")]
    pub retry_attempts: Option<u32>,
}

impl ConnectionArgs {
    pub fn to_config(&self, role: Role) -> CliResult<ConnectionConfig> {
        let frame = FrameConfig {
            envelope: Envelope::new(self.prefix.clone(), self.suffix.clone()),
            packet_size: self.packet_size,
            packet_delay: parse_duration(&self.packet_delay)?,
            ..FrameConfig::default()
        };

        let mut retry = match &self.retry {
            Some(interval) => RetryPolicy::every(parse_duration(interval)?),
            None => RetryPolicy::fail_fast(),
        };
        if let Some(attempts) = self.retry_attempts {
            retry = retry.with_max_attempts(attempts);
        }

        Ok(ConnectionConfig::new(self.host.clone(), self.port, role)
            .with_family(self.family.into())
            .with_frame_config(frame)
            .with_retry(retry))
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum FamilyArg {
    Ipv4,
    Ipv6,
    Any,
}

impl From<FamilyArg> for AddressFamily {
    fn from(value: FamilyArg) -> Self {
        match value {
            FamilyArg::Ipv4 => AddressFamily::Ipv4,
            FamilyArg::Ipv6 => AddressFamily::Ipv6,
            FamilyArg::Any => AddressFamily::Any,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Bool,
    Int,
    Float,
    String,
    IntList,
    FloatList,
    Image,
}

impl From<KindArg> for ValueKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Bool => ValueKind::Bool,
            KindArg::Int => ValueKind::Int,
            KindArg::Float => ValueKind::Float,
            KindArg::String => ValueKind::Str,
            KindArg::IntList => ValueKind::IntList,
            KindArg::FloatList => ValueKind::FloatList,
            KindArg::Image => ValueKind::Image,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Until interrupted.
    Indefinite,
    /// The client reports "Active"/"Stop" after every exchange.
    Negotiated,
    /// Exactly --count exchanges.
    Fixed,
}

impl PolicyArg {
    pub fn to_policy(self, count: u64) -> TerminationPolicy {
        match self {
            PolicyArg::Indefinite => TerminationPolicy::Indefinite,
            PolicyArg::Negotiated => TerminationPolicy::Negotiated,
            PolicyArg::Fixed => TerminationPolicy::FixedCount(count),
        }
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub conn: ConnectionArgs,
    /// Kind of value exchanged; must match the client.
    #[arg(long, value_enum, default_value = "string")]
    pub kind: KindArg,
    /// Loop termination policy; must match the client.
    #[arg(long, value_enum, default_value = "negotiated")]
    pub policy: PolicyArg,
    /// Exchanges per peer under --policy fixed.
    #[arg(long, default_value_t = 1)]
    pub count: u64,
    /// Exit after serving this many peers.
    #[arg(long)]
    pub max_peers: Option<u64>,
    /// Log iterations per second.
    #[arg(long)]
    pub ips: bool,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub conn: ConnectionArgs,
    /// Kind of value to send.
    #[arg(long, value_enum, default_value = "string")]
    pub kind: KindArg,
    /// Value text: 42, 3.14, hello, true, [1,2,3].
    #[arg(conflicts_with = "file")]
    pub value: Option<String>,
    /// Image file to send with --kind image.
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Loop termination policy; must match the server.
    #[arg(long, value_enum, default_value = "negotiated")]
    pub policy: PolicyArg,
    /// Number of exchanges (ignored with --policy indefinite).
    #[arg(long, default_value_t = 1)]
    pub count: u64,
    /// Log iterations per second.
    #[arg(long)]
    pub ips: bool,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    #[command(flatten)]
    pub conn: ConnectionArgs,
    /// Kind of value to read.
    #[arg(long, value_enum, default_value = "string")]
    pub kind: KindArg,
    /// Exit after printing N values.
    #[arg(long)]
    pub count: Option<u64>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `500ms`, `2s`, `50us` or a bare number of seconds. Zero is allowed.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::usage("duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("us") {
        (num, "us")
    } else if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .trim()
        .parse()
        .map_err(|_| CliError::usage(format!("invalid duration value: {input}")))?;

    Ok(match unit {
        "us" => Duration::from_micros(value),
        "ms" => Duration::from_millis(value),
        _ => Duration::from_secs(value),
    })
}

/// Route Ctrl-C to `stop`.
pub fn install_ctrlc_handler(stop: StopHandle) -> CliResult<()> {
    ctrlc::set_handler(move || {
        tracing::info!("interrupt received, stopping after the current exchange");
        stop.stop();
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

/// `ip:port` of the remote end for output rows.
pub fn peer_label(conn: &Connection) -> String {
    conn.peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// A peer hanging up ends its session normally; anything else is an error.
pub fn session_outcome<T>(result: Result<T, PeerError>, context: &str) -> CliResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_disconnect() => {
            tracing::info!(error = %err, "peer disconnected");
            Ok(None)
        }
        Err(err) => Err(peer_error(context, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("50us").unwrap(), Duration::from_micros(50));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("-1s").is_err());
    }

    #[test]
    fn connection_args_build_config() {
        let args = ConnectionArgs {
            host: "localhost".to_string(),
            port: 5000,
            family: FamilyArg::Any,
            prefix: "start".to_string(),
            suffix: "end".to_string(),
            packet_size: 128,
            packet_delay: "0".to_string(),
            retry: Some("250ms".to_string()),
            retry_attempts: Some(4),
        };
        let config = args.to_config(Role::Client).unwrap();
        assert_eq!(config.address(), "localhost:5000");
        assert_eq!(config.family, AddressFamily::Any);
        assert_eq!(config.frame.envelope, Envelope::new("start", "end"));
        assert_eq!(config.frame.packet_size, 128);
        assert_eq!(config.frame.packet_delay, Duration::ZERO);
        assert_eq!(
            config.retry,
            RetryPolicy::every(Duration::from_millis(250)).with_max_attempts(4)
        );
    }

    #[test]
    fn fixed_policy_carries_count() {
        assert_eq!(PolicyArg::Fixed.to_policy(7), TerminationPolicy::FixedCount(7));
        assert_eq!(PolicyArg::Negotiated.to_policy(7), TerminationPolicy::Negotiated);
    }
}
