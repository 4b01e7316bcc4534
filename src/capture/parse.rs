//! Capture line parser
//!
//! Parses the comma-separated field output produced by
//! `tshark -T fields -E separator=,` with the fields listed in
//! [`FIELDS`], in that order.

use std::str::FromStr;

use thiserror::Error;

use super::record::PacketRecord;

/// Capture fields, in column order
pub const FIELDS: [&str; 8] = [
    "frame.time_epoch",
    "ip.src",
    "ip.dst",
    "udp.srcport",
    "udp.dstport",
    "rtp.seq",
    "rtp.timestamp",
    "rtp.ssrc",
];

/// Error type for a malformed capture line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Wrong number of columns
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    /// A column failed to parse
    #[error("invalid value for {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },
    /// A required column is empty
    #[error("missing value for {0}")]
    MissingField(&'static str),
}

/// Parse one capture line
///
/// Returns `Ok(None)` for blank lines and the header row.
pub fn parse_line(line: &str) -> Result<Option<PacketRecord>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let columns: Vec<&str> = line.split(',').map(str::trim).collect();
    if columns.first() == Some(&FIELDS[0]) {
        return Ok(None);
    }

    if columns.len() != FIELDS.len() {
        return Err(ParseError::FieldCount {
            expected: FIELDS.len(),
            found: columns.len(),
        });
    }

    let capture_time: f64 = field(&columns, 0)?;
    if !capture_time.is_finite() {
        return Err(ParseError::InvalidField {
            field: FIELDS[0],
            value: columns[0].to_string(),
        });
    }

    let ssrc = columns[7];
    if ssrc.is_empty() {
        return Err(ParseError::MissingField(FIELDS[7]));
    }

    Ok(Some(PacketRecord {
        capture_time,
        source_addr: field(&columns, 1)?,
        destination_addr: field(&columns, 2)?,
        source_port: field(&columns, 3)?,
        destination_port: field(&columns, 4)?,
        sequence_number: field(&columns, 5)?,
        media_timestamp: field(&columns, 6)?,
        ssrc: ssrc.to_string(),
    }))
}

fn field<T: FromStr>(columns: &[&str], index: usize) -> Result<T, ParseError> {
    let value = columns[index];
    if value.is_empty() {
        return Err(ParseError::MissingField(FIELDS[index]));
    }

    value.parse().map_err(|_| ParseError::InvalidField {
        field: FIELDS[index],
        value: value.to_string(),
    })
}
