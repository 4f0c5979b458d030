use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use stompwire_client::AckMode;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod info;
pub mod listen;
pub mod send;
pub mod version;

/// Port brokers conventionally listen on for STOMP.
pub const DEFAULT_PORT: u16 = 61613;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send a message to a destination.
    Send(SendArgs),
    /// Subscribe to a destination and print received messages.
    Listen(ListenArgs),
    /// Probe a broker and print negotiated session metadata.
    Info(InfoArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Info(args) => info::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Broker address as host[:port].
    pub address: String,
    /// Destination queue or topic, e.g. /queue/orders.
    #[arg(long, short = 'd')]
    pub destination: String,
    /// Raw string body.
    #[arg(long, conflicts_with = "file")]
    pub data: Option<String>,
    /// Read the body from a file.
    #[arg(long, conflicts_with = "data")]
    pub file: Option<PathBuf>,
    /// Extra frame header (repeatable).
    #[arg(long = "header", value_name = "NAME:VALUE")]
    pub headers: Vec<String>,
    /// Request a broker receipt and wait for it.
    #[arg(long)]
    pub receipt: bool,
    /// Login sent in the CONNECT frame.
    #[arg(long, default_value = "")]
    pub login: String,
    /// Passcode sent in the CONNECT frame.
    #[arg(long, default_value = "")]
    pub passcode: String,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Broker address as host[:port].
    pub address: String,
    /// Destination queue or topic to subscribe to.
    #[arg(long, short = 'd')]
    pub destination: String,
    /// Acknowledgement mode for the subscription.
    #[arg(long, default_value = "auto")]
    pub ack: AckArg,
    /// Exit after printing N messages.
    #[arg(long, value_name = "N", value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    pub count: Option<usize>,
    /// Login sent in the CONNECT frame.
    #[arg(long, default_value = "")]
    pub login: String,
    /// Passcode sent in the CONNECT frame.
    #[arg(long, default_value = "")]
    pub passcode: String,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Broker address as host[:port].
    pub address: String,
    /// Connect timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
    /// Login sent in the CONNECT frame.
    #[arg(long, default_value = "")]
    pub login: String,
    /// Passcode sent in the CONNECT frame.
    #[arg(long, default_value = "")]
    pub passcode: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build information.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum AckArg {
    Auto,
    Client,
    ClientIndividual,
}

impl AckArg {
    pub fn to_mode(self) -> AckMode {
        match self {
            AckArg::Auto => AckMode::Auto,
            AckArg::Client => AckMode::Client,
            AckArg::ClientIndividual => AckMode::ClientIndividual,
        }
    }
}

/// Splits `host[:port]` into its parts, defaulting the port to 61613.
///
/// Bare IPv6 literals keep their colons; bracket the host to attach an
/// explicit port, e.g. `[::1]:61613`.
pub fn parse_address(input: &str) -> CliResult<(String, u16)> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "address must not be empty"));
    }

    if let Some(rest) = input.strip_prefix('[') {
        let (host, tail) = rest
            .split_once(']')
            .ok_or_else(|| CliError::new(USAGE, format!("invalid address: {input}")))?;
        if host.is_empty() {
            return Err(CliError::new(USAGE, format!("invalid address: {input}")));
        }
        return match tail.strip_prefix(':') {
            Some(port) => Ok((host.to_string(), parse_port(input, port)?)),
            None if tail.is_empty() => Ok((host.to_string(), DEFAULT_PORT)),
            None => Err(CliError::new(USAGE, format!("invalid address: {input}"))),
        };
    }

    if input.matches(':').count() > 1 {
        return Ok((input.to_string(), DEFAULT_PORT));
    }

    match input.split_once(':') {
        Some(("", _)) => Err(CliError::new(USAGE, format!("invalid address: {input}"))),
        Some((host, port)) => Ok((host.to_string(), parse_port(input, port)?)),
        None => Ok((input.to_string(), DEFAULT_PORT)),
    }
}

fn parse_port(address: &str, port: &str) -> CliResult<u16> {
    port.parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid port in address: {address}")))
}

/// Parses `5s`, `500ms`, or a bare seconds count.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (digits, build): (&str, fn(u64) -> Duration) = match input.strip_suffix("ms") {
        Some(digits) => (digits, Duration::from_millis),
        None => (
            input.strip_suffix('s').unwrap_or(input),
            Duration::from_secs,
        ),
    };

    let value: u64 = digits
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }
    Ok(build(value))
}
