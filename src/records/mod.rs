//! JSON-lines record files.
//!
//! A record file holds a sequence of JSON objects separated by whitespace,
//! usually one per line. Each object is surfaced as a flat [`Record`]; no
//! schema is applied here, so missing keys simply show up as absent values.

mod parser;

pub use parser::{read_records, RecordError, RecordFile, Records};

/// A single flat key -> value record.
pub type Record = serde_json::Map<String, serde_json::Value>;
