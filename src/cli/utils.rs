//! Terminal output for CLI commands.
//!
//! JSON mode prints exactly one document per command: the command's report on
//! success, or `{"error": true, "code", "message"}` (the HTTP error shape) on
//! failure, with the partial report attached when there is one.

use serde::Serialize;
use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Print a finished report: serialized as-is for JSON, rendered lines for text.
pub fn output_report<T: Serialize>(
    output_format: &OutputFormat,
    report: &T,
    text_lines: impl FnOnce(&T) -> Vec<String>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Text => {
            for line in text_lines(report) {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

/// Print a command failure. Text mode writes to stderr.
pub fn output_failure(
    output_format: &OutputFormat,
    code: &str,
    message: &str,
    report: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut document = json!({
                "error": true,
                "code": code,
                "message": message,
            });
            if let Some(report) = report {
                document["report"] = report;
            }
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
        OutputFormat::Text => eprintln!("✗ {}", message),
    }
    Ok(())
}

/// `✓`/`✗` line with a padded label, as used by `check-env`.
pub fn check_line(ok: bool, label: &str, detail: &str) -> String {
    let mark = if ok { "✓" } else { "✗" };
    format!("{} {:<28} {}", mark, label, detail)
}
