use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use stompwire_client::Frame;
use stompwire_frame::headers::{DESTINATION, MESSAGE_ID};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    /// Interactive terminals get a table; pipes get JSON lines.
    pub fn default_for_stdout() -> Self {
        match std::io::stdout().is_terminal() {
            true => Self::Table,
            false => Self::Json,
        }
    }
}

#[derive(Serialize)]
struct HeaderOutput<'a> {
    name: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    command: &'a str,
    headers: Vec<HeaderOutput<'a>>,
    body_size: usize,
    body: String,
    timestamp: String,
}

impl<'a> FrameOutput<'a> {
    fn collect(frame: &'a Frame) -> Self {
        FrameOutput {
            command: frame.command().as_str(),
            headers: frame
                .headers()
                .iter()
                .map(|(name, value)| HeaderOutput { name, value })
                .collect(),
            body_size: frame.body().map_or(0, <[u8]>::len),
            body: body_preview(frame.body()),
            timestamp: now_unix_seconds(),
        }
    }
}

pub fn print_frame(frame: &Frame, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_frame_json(frame),
        OutputFormat::Table => print_frame_table(frame),
        OutputFormat::Pretty => print_frame_line(frame),
        OutputFormat::Raw => print_raw(frame.body().unwrap_or_default()),
    }
}

fn print_frame_json(frame: &Frame) {
    let line =
        serde_json::to_string(&FrameOutput::collect(frame)).unwrap_or_else(|_| "{}".to_string());
    println!("{line}");
}

fn print_frame_table(frame: &Frame) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["COMMAND", "DESTINATION", "MESSAGE-ID", "SIZE", "BODY"]);
    table.add_row(vec![
        frame.command().to_string(),
        frame.headers().get(DESTINATION).unwrap_or("-").to_string(),
        frame.headers().get(MESSAGE_ID).unwrap_or("-").to_string(),
        frame.body().map_or(0, <[u8]>::len).to_string(),
        body_preview(frame.body()),
    ]);
    println!("{table}");
}

fn print_frame_line(frame: &Frame) {
    let headers = frame
        .headers()
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join(" ");
    println!(
        "{} {} body={}",
        frame.command(),
        headers,
        body_preview(frame.body())
    );
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn body_preview(body: Option<&[u8]>) -> String {
    let bytes = match body {
        Some(bytes) => bytes,
        None => return String::new(),
    };
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", bytes.len()),
    }
}

fn now_unix_seconds() -> String {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs().to_string(),
        Err(_) => "0".to_string(),
    }
}
