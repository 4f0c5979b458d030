use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use stompwire_client::{Command, Headers, StompConnection, StompError};
use tracing::{debug, info};

use crate::cmd::{parse_address, AckArg, ListenArgs};
use crate::exit::{CliError, CliResult, FAILURE, INTERNAL, SUCCESS};
use crate::output::{print_frame, OutputFormat};

// Bounds how long Ctrl-C waits behind a blocking receive.
const POLL_TIMEOUT: Duration = Duration::from_millis(500);

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let (host, port) = parse_address(&args.address)?;

    let mut conn = StompConnection::new();
    conn.open(&host, port)
        .map_err(|err| CliError::stomp("connect failed", err))?;
    conn.connect(&args.login, &args.passcode)
        .map_err(|err| CliError::stomp("handshake failed", err))?;
    conn.subscribe_with(&args.destination, Some(args.ack.to_mode()), Headers::new())
        .map_err(|err| CliError::stomp("subscribe failed", err))?;
    info!(destination = %args.destination, "subscribed");

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut delivered = 0usize;

    while running.load(Ordering::SeqCst) {
        let frame = match conn.receive_with_timeout(POLL_TIMEOUT) {
            Ok(frame) => frame,
            Err(StompError::Timeout(_)) => continue,
            Err(err) => return Err(CliError::stomp("receive failed", err)),
        };

        match frame.command() {
            Command::Message => {}
            Command::Error => {
                let body = frame
                    .body()
                    .map(|b| String::from_utf8_lossy(b).into_owned())
                    .unwrap_or_default();
                return Err(CliError::new(FAILURE, format!("broker error: {body}")));
            }
            other => {
                debug!(command = %other, "ignoring non-message frame");
                continue;
            }
        }

        print_frame(&frame, format);
        delivered = delivered.saturating_add(1);

        if !matches!(args.ack, AckArg::Auto) {
            conn.ack_frame(&frame)
                .map_err(|err| CliError::stomp("ack failed", err))?;
        }

        if let Some(count) = args.count {
            if delivered >= count {
                break;
            }
        }
    }

    // The broker may already be gone when the loop ends.
    let _ = conn.disconnect();
    let _ = conn.close();
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))
        .map_err(|err| CliError::new(INTERNAL, format!("could not install signal handler: {err}")))
}
