//! Shared output helpers for text and JSON modes.

use colored::Colorize;
use serde::Serialize;

use crate::OutputFormat;

/// Print a serializable result.
///
/// JSON mode writes pretty-printed JSON to stdout and ignores `quiet`, since
/// scripts rely on it. Text mode callers format their own output.
pub fn print<T: Serialize>(value: &T, format: OutputFormat, quiet: bool) {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("{}: failed to serialize output: {}", "Error".red().bold(), e),
        },
        OutputFormat::Text => {
            if !quiet {
                if let Ok(json) = serde_json::to_string_pretty(value) {
                    println!("{}", json);
                }
            }
        }
    }
}

/// Print an informational line (text mode only).
pub fn info(message: &str, format: OutputFormat, quiet: bool) {
    if quiet || matches!(format, OutputFormat::Json) {
        return;
    }
    println!("{} {}", "→".blue(), message);
}

/// Print a success line (text mode only).
pub fn success(message: &str, format: OutputFormat, quiet: bool) {
    if quiet || matches!(format, OutputFormat::Json) {
        return;
    }
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning to stderr (text mode only).
pub fn warning(message: &str, format: OutputFormat, quiet: bool) {
    if quiet || matches!(format, OutputFormat::Json) {
        return;
    }
    eprintln!("{} {}", "!".yellow().bold(), message);
}
