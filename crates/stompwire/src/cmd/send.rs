use std::fs;

use stompwire_client::{Command, Frame, Headers, StompConnection};
use stompwire_frame::headers::{RECEIPT, RECEIPT_ID};

use crate::cmd::{parse_address, SendArgs};
use crate::exit::{CliError, CliResult, FAILURE, SUCCESS, USAGE};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let (host, port) = parse_address(&args.address)?;
    let body = resolve_body(&args)?;
    let mut extra = resolve_headers(&args.headers)?;

    let receipt_id = format!("stompwire-{}", std::process::id());
    if args.receipt {
        extra.insert(RECEIPT, receipt_id.as_str());
    }

    let mut conn = StompConnection::new();
    conn.open(&host, port)
        .map_err(|err| CliError::stomp("connect failed", err))?;
    conn.connect(&args.login, &args.passcode)
        .map_err(|err| CliError::stomp("handshake failed", err))?;
    conn.send_with(&args.destination, &body, None, extra)
        .map_err(|err| CliError::stomp("send failed", err))?;

    if args.receipt {
        let reply = conn
            .receive()
            .map_err(|err| CliError::stomp("receipt wait failed", err))?;
        expect_receipt(&reply, &receipt_id)?;
        print_frame(&reply, format);
    }

    conn.disconnect()
        .map_err(|err| CliError::stomp("disconnect failed", err))?;
    conn.close().map_err(|err| CliError::stomp("close failed", err))?;
    Ok(SUCCESS)
}

fn resolve_body(args: &SendArgs) -> CliResult<Vec<u8>> {
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(path) = &args.file {
        return fs::read(path).map_err(|err| {
            CliError::io(&format!("failed reading {}", path.display()), err)
        });
    }
    Ok(Vec::new())
}

fn resolve_headers(pairs: &[String]) -> CliResult<Headers> {
    let mut headers = Headers::new();
    for pair in pairs {
        let (name, value) = pair.split_once(':').ok_or_else(|| {
            CliError::new(USAGE, format!("--header expects NAME:VALUE, got {pair:?}"))
        })?;
        headers.insert(name.trim(), value.trim());
    }
    Ok(headers)
}

fn expect_receipt(frame: &Frame, receipt_id: &str) -> CliResult<()> {
    match frame.command() {
        Command::Receipt => match frame.headers().get(RECEIPT_ID) {
            Some(id) if id == receipt_id => Ok(()),
            other => Err(CliError::new(
                FAILURE,
                format!("broker answered receipt {other:?}, expected {receipt_id:?}"),
            )),
        },
        Command::Error => {
            let body = frame
                .body()
                .map(|b| String::from_utf8_lossy(b).into_owned())
                .unwrap_or_default();
            Err(CliError::new(FAILURE, format!("broker error: {body}")))
        }
        other => Err(CliError::new(
            FAILURE,
            format!("expected RECEIPT, broker sent {other}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_headers_parses_pairs_in_order() {
        let headers =
            resolve_headers(&["priority:4".to_string(), "type: report".to_string()]).unwrap();
        let entries: Vec<_> = headers.iter().collect();
        assert_eq!(entries, vec![("priority", "4"), ("type", "report")]);
    }

    #[test]
    fn resolve_headers_rejects_missing_separator() {
        assert!(resolve_headers(&["priority4".to_string()]).is_err());
    }

    #[test]
    fn expect_receipt_accepts_matching_id() {
        let frame = Frame::new(Command::Receipt).header(RECEIPT_ID, "r-1");
        assert!(expect_receipt(&frame, "r-1").is_ok());
    }

    #[test]
    fn expect_receipt_rejects_mismatched_id() {
        let frame = Frame::new(Command::Receipt).header(RECEIPT_ID, "r-2");
        assert!(expect_receipt(&frame, "r-1").is_err());
    }

    #[test]
    fn expect_receipt_surfaces_broker_error_body() {
        let frame = Frame::new(Command::Error).with_body("bad destination");
        let err = expect_receipt(&frame, "r-1").unwrap_err();
        assert!(err.reason.contains("bad destination"));
    }
}
