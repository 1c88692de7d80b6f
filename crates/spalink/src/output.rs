use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use spalink_frame::{FrameOutcome, HexBytes, ProcessReport};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct OutcomeOutput<'a> {
    chunk: usize,
    kind: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload_size: Option<usize>,
    detail: String,
    timestamp: String,
}

/// Print every outcome produced by one chunk.
pub fn print_report(chunk: usize, report: &ProcessReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let timestamp = now_unix_seconds();
            for outcome in &report.outcomes {
                let payload = outcome.payload();
                let out = OutcomeOutput {
                    chunk,
                    kind: outcome.kind(),
                    payload: payload.map(|p| HexBytes(p.as_ref()).to_string()),
                    payload_size: payload.map(|p| p.len()),
                    detail: outcome.to_string(),
                    timestamp: timestamp.clone(),
                };
                println!(
                    "{}",
                    serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
        OutputFormat::Table => {
            if report.is_empty() {
                return;
            }
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CHUNK", "OUTCOME", "SIZE", "DETAIL"]);
            for outcome in &report.outcomes {
                table.add_row(vec![
                    chunk.to_string(),
                    outcome.kind().to_string(),
                    outcome
                        .payload()
                        .map(|p| p.len().to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    detail(outcome),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for outcome in &report.outcomes {
                println!("chunk={chunk} {}", detail(outcome));
            }
        }
    }
}

/// Print a single labelled byte string (checksum and encode commands).
pub fn print_bytes(label: &str, bytes: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({ label: HexBytes(bytes).to_string() });
            println!("{value}");
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![label.to_uppercase()])
                .add_row(vec![HexBytes(bytes).to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("{}", HexBytes(bytes));
        }
    }
}

fn detail(outcome: &FrameOutcome) -> String {
    match outcome {
        FrameOutcome::Valid(payload) => HexBytes(payload.as_ref()).to_string(),
        other => other.to_string(),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
