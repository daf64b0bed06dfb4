//! Delimited-text parser for the dataset files.

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use polars::prelude::*;
use std::io::{Cursor, Read};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Cell values read as missing, besides empty fields.
const NULL_MARKERS: [&str; 3] = ["NA", "NaN", "nan"];

/// Returns `true` if `bytes` starts with a gzip header.
pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

/// Decompresses `bytes` if they are gzip, otherwise returns them unchanged.
pub fn decompress(bytes: &[u8]) -> Result<Vec<u8>> {
    if !is_gzip(bytes) {
        return Ok(bytes.to_vec());
    }
    let mut out = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut out)
        .context("gzip decompression failed")?;
    Ok(out)
}

fn read_csv(
    bytes: &[u8],
    delimiter: u8,
    infer_schema_length: Option<usize>,
) -> Result<DataFrame> {
    let raw = decompress(bytes)?;
    let null_values = NullValues::AllColumns(NULL_MARKERS.iter().map(|m| (*m).into()).collect());

    let options = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(infer_schema_length)
        .map_parse_options(|parse| {
            parse
                .with_separator(delimiter)
                .with_null_values(Some(null_values.clone()))
        });

    let frame = CsvReader::new(Cursor::new(raw))
        .with_options(options)
        .finish()
        .context("reading delimited table")?;
    Ok(frame)
}

/// Parses a delimited table with a header row, keeping every column as
/// text so that codes such as CUSEC keep their leading zeros.
///
/// Gzip input is detected and decompressed first.
///
/// # Errors
///
/// Returns an error on corrupt gzip data or malformed records.
pub fn parse_delimited(bytes: &[u8], delimiter: u8) -> Result<DataFrame> {
    read_csv(bytes, delimiter, Some(0))
}

/// Like [`parse_delimited`], with column types inferred from the data.
pub fn parse_inferred(bytes: &[u8], delimiter: u8) -> Result<DataFrame> {
    read_csv(bytes, delimiter, Some(100))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{column_names, f64_values, str_values};
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    const LISTINGS: &str = "ASSETID;PRICE;LATITUDE\nA1;100;40.4\nA2;;40.5\nA3;NA;40.6\n";

    #[test]
    fn test_parse_plain_semicolon_file() {
        let frame = parse_delimited(LISTINGS.as_bytes(), b';').unwrap();
        assert_eq!(column_names(&frame), vec!["ASSETID", "PRICE", "LATITUDE"]);
        assert_eq!(frame.height(), 3);
        assert_eq!(
            f64_values(&frame, "PRICE").unwrap(),
            vec![Some(100.0), None, None]
        );
    }

    #[test]
    fn test_codes_keep_leading_zeros() {
        let text = "CUSEC;WKT\n0801901001;POLYGON ((0 0, 1 0, 1 1, 0 0))\n";
        let frame = parse_delimited(text.as_bytes(), b';').unwrap();
        assert_eq!(
            str_values(&frame, "CUSEC").unwrap(),
            vec![Some("0801901001".to_string())]
        );
    }

    #[test]
    fn test_parse_gzip_file() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(LISTINGS.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        assert!(is_gzip(&compressed));
        let frame = parse_delimited(&compressed, b';').unwrap();
        assert_eq!(frame.height(), 3);
    }

    #[test]
    fn test_parse_quoted_wkt_with_commas() {
        let text = "CUSEC;WKT\n2807901001;\"POLYGON ((0 0, 1 0, 1 1, 0 0))\"\n";
        let frame = parse_delimited(text.as_bytes(), b';').unwrap();
        assert_eq!(
            str_values(&frame, "WKT").unwrap(),
            vec![Some("POLYGON ((0 0, 1 0, 1 1, 0 0))".to_string())]
        );
    }

    #[test]
    fn test_inferred_types() {
        let frame = parse_inferred(b"AREA,ROOMS\n60.5,2\n80,3\n", b',').unwrap();
        assert_eq!(frame.column("AREA").unwrap().dtype(), &DataType::Float64);
        assert_eq!(frame.column("ROOMS").unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn test_truncated_gzip_fails() {
        let bytes = [0x1f, 0x8b, 0x08, 0x00];
        assert!(parse_delimited(&bytes, b';').is_err());
    }
}
