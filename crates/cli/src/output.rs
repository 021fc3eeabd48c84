//! Renderers and formatting helpers for the bound views.

use anyhow::{Context, Result};
use serde_json::Value;

use rainwatch_core::reshape::{DATE_FIELD, ID_FIELD, TIME_FIELD};
use rainwatch_core::{mk_array, Record};

use crate::cli::OutputFormat;

pub(crate) fn render_info(info: &Value, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(info),
        OutputFormat::Table => {
            let Some(fields) = info.as_object() else {
                return Ok(plain(info));
            };
            let width = fields.keys().map(String::len).max().unwrap_or(0);
            Ok(fields
                .iter()
                .map(|(key, value)| format!("{key:<width$}  {}", plain(value)))
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }
}

pub(crate) fn render_torrents(records: &[Record], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(records),
        OutputFormat::Table => {
            if records.is_empty() {
                return Ok("no torrents".to_string());
            }
            let mut lines = vec![format!(
                "{:<40} {:<11} {:>7} {:>10} {:>12} {:<28} NAME",
                "ID", "STATE", "PROG", "SIZE", "DOWN", "ADDED"
            )];
            for record in records {
                let added = match (text(record, DATE_FIELD), text(record, TIME_FIELD)) {
                    (Some(date), Some(time)) => format!("{date} {time}"),
                    _ => "-".to_string(),
                };
                lines.push(format!(
                    "{:<40} {:<11} {:>7} {:>10} {:>12} {:<28} {}",
                    text(record, ID_FIELD).unwrap_or("-"),
                    text(record, "state").unwrap_or("-"),
                    format!("{:.1}%", number(record, "progress")),
                    format_bytes(number(record, "total_size") as u64),
                    format!("{}/s", format_bytes(number(record, "download_rate") as u64)),
                    added,
                    text(record, "name").unwrap_or("<unnamed>"),
                ));
            }
            Ok(lines.join("\n"))
        }
    }
}

/// Result of a one-off request: a queued job or the affected torrents.
pub(crate) fn render_action(payload: &Value, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return to_json(payload);
    }
    if let Some(job) = payload.get("job").and_then(Value::as_u64) {
        return Ok(format!("queued as job {job}"));
    }
    match payload.as_object() {
        Some(torrents) => render_torrents(&mk_array(torrents), format),
        None => Ok(plain(payload)),
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to format JSON")
}

fn text<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record.get(field).and_then(Value::as_str)
}

fn number(record: &Record, field: &str) -> f64 {
    record.get(field).and_then(Value::as_f64).unwrap_or(0.0)
}

/// Strings without quotes, everything else as JSON.
fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;
    const TIB: f64 = GIB * 1024.0;
    let value = bytes as f64;
    if value >= TIB {
        format!("{:.2} TiB", value / TIB)
    } else if value >= GIB {
        format!("{:.2} GiB", value / GIB)
    } else if value >= MIB {
        format!("{:.2} MiB", value / MIB)
    } else if value >= KIB {
        format!("{:.2} KiB", value / KIB)
    } else {
        format!("{bytes} B")
    }
}
