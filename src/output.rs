/// JSON output for a finished run

use crate::reconciler::ReconcileReport;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_OUTPUT_PATH: &str = "ticker_output.json";

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),

    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain array of packets in sequence order
    #[default]
    Packets,
    /// Summary counts, unrecovered sequences and packets
    Report,
}

/// Pretty-printed JSON to any writer
pub fn write_json<W: Write>(
    report: &ReconcileReport,
    format: OutputFormat,
    writer: W,
) -> Result<(), OutputError> {
    match format {
        OutputFormat::Packets => write_pretty(&report.packets, writer),
        OutputFormat::Report => write_pretty(report, writer),
    }
}

pub fn write_json_file(
    report: &ReconcileReport,
    format: OutputFormat,
    path: &Path,
) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    write_json(report, format, BufWriter::new(file))
}

fn write_pretty<T: Serialize + ?Sized, W: Write>(value: &T, mut writer: W) -> Result<(), OutputError> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::Packet;
    use crate::reconciler::{Unrecovered, UnrecoveredReason};

    fn report() -> ReconcileReport {
        ReconcileReport {
            received: 2,
            frames_decoded: 2,
            duplicates: 0,
            trailing_bytes: 0,
            max_sequence: 3,
            gaps: vec![(2, 2)],
            missing_total: 1,
            recovered: 0,
            unrecovered: vec![Unrecovered {
                sequence: 2,
                reason: UnrecoveredReason::NotReturned,
            }],
            out_of_range: vec![],
            packets: vec![
                Packet::new(*b"AAPL", b'B', 1, 10, 1),
                Packet::new(*b"AAPL", b'S', 2, 11, 3),
            ],
        }
    }

    #[test]
    fn test_packets_format_is_plain_array() {
        let mut buf = Vec::new();
        write_json(&report(), OutputFormat::Packets, &mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        let packets = value.as_array().unwrap();
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[1]["side"], "S");
        assert_eq!(packets[1]["sequence"], 3);
    }

    #[test]
    fn test_write_json_file_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("ticker_output.json");

        write_json_file(&report(), OutputFormat::Packets, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(value[0]["symbol"], "AAPL");
    }

    #[test]
    fn test_report_format_has_summary() {
        let mut buf = Vec::new();
        write_json(&report(), OutputFormat::Report, &mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(value["received"], 2);
        assert_eq!(value["gaps"], serde_json::json!([[2, 2]]));
        assert_eq!(value["missing_total"], 1);
        assert_eq!(value["out_of_range"], serde_json::json!([]));
        assert_eq!(value["unrecovered"][0]["reason"]["kind"], "not_returned");
        assert_eq!(value["packets"].as_array().unwrap().len(), 2);
    }
}
