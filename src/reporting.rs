// Reporting and output for chainprobe
// Writes the scan's result lists as JSON and CSV; rendering is left to consumers

use crate::models::ProbeResult;
use crate::scan::ScanReport;
use chrono::Local;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Escape CSV field to prevent formula injection attacks
/// Cells starting with =, +, -, @, or tab are prefixed with single quote
fn escape_csv_field(field: &str) -> String {
    let Some(first_char) = field.chars().next() else {
        return String::new();
    };
    let needs_escaping = matches!(first_char, '=' | '+' | '-' | '@' | '\t');

    if needs_escaping {
        format!("\"'{}\"", field.replace('"', "\"\""))
    } else if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn report_path(dir: &Path, extension: &str) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("chainprobe_report_{}.{}", timestamp, extension))
}

fn write_csv_row(out: &mut impl Write, suite: &str, result: &ProbeResult) -> std::io::Result<()> {
    writeln!(
        out,
        "{},{},{},{},{},{},{}",
        escape_csv_field(suite),
        escape_csv_field(result.label.as_deref().unwrap_or("")),
        escape_csv_field(&result.method),
        escape_csv_field(&result.url),
        result.status,
        result.elapsed.as_millis(),
        if result.success { "PASS" } else { "FAIL" }
    )
}

pub fn export_csv_in(dir: impl AsRef<Path>, report: &ScanReport) -> Result<PathBuf, std::io::Error> {
    let path = report_path(dir.as_ref(), "csv");
    let mut out = BufWriter::new(File::create(&path)?);

    writeln!(out, "Suite,Label,Method,URL,Status,ElapsedMs,Result")?;
    for result in &report.probes {
        write_csv_row(&mut out, "probe", result)?;
    }
    for result in &report.battery {
        write_csv_row(&mut out, "battery", result)?;
    }
    if let Some(lifecycle) = &report.lifecycle {
        for result in &lifecycle.results {
            write_csv_row(&mut out, "lifecycle", result)?;
        }
    }
    out.flush()?;
    Ok(path)
}

fn write_json(out: impl Write, report: &ScanReport) -> std::io::Result<()> {
    let mut out = BufWriter::new(out);
    serde_json::to_writer_pretty(&mut out, report)?;
    out.flush()
}

pub fn export_json_in(dir: impl AsRef<Path>, report: &ScanReport) -> Result<PathBuf, std::io::Error> {
    let path = report_path(dir.as_ref(), "json");
    write_json(File::create(&path)?, report)?;
    Ok(path)
}

pub fn export_csv(report: &ScanReport) -> Result<PathBuf, std::io::Error> {
    export_csv_in(".", report)
}

pub fn export_json(report: &ScanReport) -> Result<PathBuf, std::io::Error> {
    export_json_in(".", report)
}
