use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use ezsocket_frame::value::{format_float_list, format_int_list};
use ezsocket_frame::Value;
use ezsocket_peer::{LoopReport, Role};
use serde::Serialize;
use serde_json::json;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
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
struct ValueOutput<'a> {
    event: &'static str,
    kind: &'static str,
    value: serde_json::Value,
    peer: &'a str,
    iteration: u64,
    timestamp: String,
}

#[derive(Serialize)]
struct ReportOutput<'a> {
    event: &'static str,
    role: &'static str,
    peer: &'a str,
    iterations: u64,
    elapsed_ms: u128,
    ips: f64,
}

pub fn print_value(value: &Value, peer: &str, iteration: u64, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ValueOutput {
                event: "value-received",
                kind: value.kind().name(),
                value: value_json(value),
                peer,
                iteration,
                timestamp: now_unix_seconds(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "KIND", "PEER", "VALUE"])
                .add_row(vec![
                    iteration.to_string(),
                    value.kind().name().to_string(),
                    peer.to_string(),
                    value_text(value),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "#{iteration} kind={} peer={peer} value={}",
                value.kind(),
                value_text(value)
            );
        }
        OutputFormat::Raw => {
            let mut text = value_text(value);
            text.push('\n');
            print_raw(text.as_bytes());
        }
    }
}

pub fn print_report(report: &LoopReport, role: Role, peer: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ReportOutput {
                event: "loop-finished",
                role: role.name(),
                peer,
                iterations: report.iterations,
                elapsed_ms: report.elapsed.as_millis(),
                ips: report.ips(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ROLE", "PEER", "ITERATIONS", "ELAPSED", "IPS"])
                .add_row(vec![
                    role.name().to_string(),
                    peer.to_string(),
                    report.iterations.to_string(),
                    format!("{:.3}s", report.elapsed.as_secs_f64()),
                    format!("{:.1}", report.ips()),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{role} peer={peer} iterations={} elapsed={:.3}s ips={:.1}",
                report.iterations,
                report.elapsed.as_secs_f64(),
                report.ips()
            );
        }
        OutputFormat::Raw => {}
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize>(out: &T) {
    println!(
        "{}",
        serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
    );
}

/// Human-readable value text; lists use their wire form.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Bool(v) => v.to_string(),
        Value::Int(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Str(v) => v.clone(),
        Value::IntList(v) => format_int_list(v),
        Value::FloatList(v) => format_float_list(v).unwrap_or_else(|_| format!("{v:?}")),
        Value::Image(img) => format!("<image {}x{}>", img.width(), img.height()),
    }
}

fn value_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Bool(v) => json!(v),
        Value::Int(v) => json!(v),
        Value::Float(v) => float_json(*v),
        Value::Str(v) => json!(v),
        Value::IntList(v) => json!(v),
        Value::FloatList(v) => v.iter().map(|f| float_json(*f)).collect(),
        Value::Image(img) => json!({ "width": img.width(), "height": img.height() }),
    }
}

// Go through the shortest decimal text so 3.14f32 prints as 3.14, not 3.140000104904175.
fn float_json(value: f32) -> serde_json::Value {
    value
        .to_string()
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
