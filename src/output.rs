//! Output formatting and persistence for enriched listings.
//!
//! Supports JSON summaries and delimited files, gzip-compressed when the
//! target path ends in `.gz`.

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use polars::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty(value: &impl std::fmt::Debug) {
    debug!("{:#?}", value);
}

/// Logs a value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Serializes `frame` with a header row into `writer`.
/// Missing values are written as empty fields.
pub fn write_delimited<W: Write>(mut writer: W, frame: &DataFrame, delimiter: u8) -> Result<W> {
    CsvWriter::new(&mut writer)
        .include_header(true)
        .with_separator(delimiter)
        .finish(&mut frame.clone())
        .context("writing delimited output")?;
    writer.flush()?;
    Ok(writer)
}

/// Writes `frame` to `path`, replacing any existing file.
pub fn write_frame(path: &Path, frame: &DataFrame, delimiter: u8) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let gzip = path.extension().and_then(|e| e.to_str()) == Some("gz");
    debug!(path = %path.display(), gzip, rows = frame.height(), "Writing frame");

    if gzip {
        let encoder = GzEncoder::new(file, Compression::default());
        write_delimited(encoder, frame, delimiter)?.finish()?;
    } else {
        write_delimited(file, frame, delimiter)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_delimited;
    use polars::df;

    fn frame() -> DataFrame {
        df!(
            "ASSETID" => ["A1", "A2"],
            "CUSEC" => [None, Some("2807901001")],
            "CUSEC_PRICE_mean" => [None, Some("150")]
        )
        .unwrap()
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&serde_json::json!({ "rows": 2 })).unwrap();
    }

    #[test]
    fn test_write_plain_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("enriched.csv");

        write_frame(&path, &frame(), b';').unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(
            lines,
            vec!["ASSETID;CUSEC;CUSEC_PRICE_mean", "A1;;", "A2;2807901001;150"]
        );
    }

    #[test]
    fn test_write_gzip_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/enriched.csv.gz");

        write_frame(&path, &frame(), b';').unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let parsed = parse_delimited(&bytes, b';').unwrap();
        assert!(parsed.equals_missing(&frame()));
    }
}
