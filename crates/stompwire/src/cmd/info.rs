use std::time::{Duration, Instant};

use serde::Serialize;
use stompwire_client::StompConnection;
use stompwire_frame::headers::{SERVER, SESSION};
use stompwire_transport::{BrokerStream, TcpConnector, TransportError};

use crate::cmd::{parse_address, parse_duration, InfoArgs};
use crate::exit::{CliError, CliResult, SUCCESS, TIMEOUT};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct InfoOutput {
    address: String,
    version: String,
    session: Option<String>,
    server: Option<String>,
    handshake_ms: f64,
    connected: bool,
}

pub fn run(args: InfoArgs, format: OutputFormat) -> CliResult<i32> {
    let (host, port) = parse_address(&args.address)?;
    let timeout = parse_duration(&args.timeout)?;

    let stream = connect_until(&host, port, timeout)?;
    let mut conn = StompConnection::new();
    conn.open_stream(stream);

    let start = Instant::now();
    let reply = conn
        .connect(&args.login, &args.passcode)
        .map_err(|err| CliError::stomp("handshake failed", err))?;
    let handshake_ms = {
        let ms = start.elapsed().as_secs_f64() * 1000.0;
        (ms * 100.0).round() / 100.0
    };

    let out = InfoOutput {
        address: format!("{host}:{port}"),
        version: conn.version().to_string(),
        session: reply.headers().get(SESSION).map(str::to_string),
        server: reply.headers().get(SERVER).map(str::to_string),
        handshake_ms,
        connected: true,
    };

    conn.disconnect()
        .map_err(|err| CliError::stomp("disconnect failed", err))?;
    conn.close().map_err(|err| CliError::stomp("close failed", err))?;

    print_info(&out, format);
    Ok(SUCCESS)
}

fn connect_until(host: &str, port: u16, timeout: Duration) -> CliResult<BrokerStream> {
    let connector = TcpConnector::new().with_connect_timeout(timeout);
    let deadline = Instant::now() + timeout;
    loop {
        let err = match connector.connect(host, port) {
            Ok(stream) => return Ok(stream),
            Err(err) => err,
        };
        if !is_retryable_connect_error(&err) {
            return Err(CliError::transport("connect failed", err));
        }
        if Instant::now() >= deadline {
            return Err(CliError::new(
                TIMEOUT,
                format!("connect timed out after {timeout:?}"),
            ));
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}

fn is_retryable_connect_error(err: &TransportError) -> bool {
    match err {
        TransportError::Connect { source, .. } => {
            source.kind() == std::io::ErrorKind::ConnectionRefused
        }
        _ => false,
    }
}

fn print_info(out: &InfoOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let line = serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string());
            println!("{line}");
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("Broker Info:");
            println!("  Address:    {}", out.address);
            println!("  Protocol:   STOMP {}", out.version);
            println!(
                "  Session:    {}",
                out.session.as_deref().unwrap_or("unavailable")
            );
            println!(
                "  Server:     {}",
                out.server.as_deref().unwrap_or("unavailable")
            );
            println!("  Handshake:  {:.2}ms", out.handshake_ms);
        }
        OutputFormat::Raw => {
            println!("{}", out.version);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn retryable_only_for_connection_refused() {
        let refused = TransportError::Connect {
            host: "localhost".to_string(),
            port: 61613,
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        };
        assert!(is_retryable_connect_error(&refused));

        let reset = TransportError::Io(io::Error::from(io::ErrorKind::ConnectionReset));
        assert!(!is_retryable_connect_error(&reset));
    }
}
