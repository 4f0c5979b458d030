mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::LogOptions;
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "stompwire", version, about = "STOMP client CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    #[command(flatten)]
    log: LogOptions,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    let cli = Cli::parse();
    cli.log.init();

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    match cmd::run(cli.command, format) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            err.code
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::AckArg;

    #[test]
    fn send_accepts_destination_and_body() {
        let cli = Cli::try_parse_from([
            "stompwire",
            "send",
            "broker:61613",
            "-d",
            "/queue/demo",
            "--data",
            "hi",
        ])
        .expect("args should parse");

        match cli.command {
            Command::Send(args) => {
                assert_eq!(args.address, "broker:61613");
                assert_eq!(args.destination, "/queue/demo");
                assert_eq!(args.data.as_deref(), Some("hi"));
            }
            other => panic!("wrong subcommand parsed: {other:?}"),
        }
    }

    #[test]
    fn data_and_file_are_mutually_exclusive() {
        let err = Cli::try_parse_from([
            "stompwire",
            "send",
            "broker",
            "-d",
            "/queue/demo",
            "--data",
            "hi",
            "--file",
            "body.bin",
        ])
        .expect_err("conflict should be rejected");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn listen_accepts_ack_mode_and_count() {
        let cli = Cli::try_parse_from([
            "stompwire",
            "listen",
            "broker",
            "-d",
            "/topic/alerts",
            "--ack",
            "client-individual",
            "--count",
            "5",
        ])
        .expect("args should parse");

        match cli.command {
            Command::Listen(args) => {
                assert!(matches!(args.ack, AckArg::ClientIndividual));
                assert_eq!(args.count, Some(5));
            }
            other => panic!("wrong subcommand parsed: {other:?}"),
        }
    }

    #[test]
    fn listen_rejects_zero_count() {
        let err = Cli::try_parse_from([
            "stompwire",
            "listen",
            "broker",
            "-d",
            "/topic/alerts",
            "--count",
            "0",
        ])
        .expect_err("zero count should be rejected");

        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn global_flags_may_follow_the_subcommand() {
        let cli = Cli::try_parse_from(["stompwire", "info", "broker", "--format", "raw"])
            .expect("args should parse");

        assert!(matches!(cli.format, Some(OutputFormat::Raw)));
        assert!(matches!(cli.command, Command::Info(_)));
    }
}
