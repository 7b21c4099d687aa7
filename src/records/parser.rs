use super::Record;
use serde_json::{Deserializer, Value};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while reading a record file.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed record {index} in {path:?} (line {line}, column {column}): {message}")]
    Parse {
        path: PathBuf,
        /// 1-based position of the record in the file.
        index: usize,
        line: usize,
        column: usize,
        message: String,
    },
}

/// A record file on disk.
///
/// Every call to [`RecordFile::records`] re-opens the file, so the sequence can
/// be read again from the start and yields the same records as long as the
/// file contents did not change.
#[derive(Debug, Clone)]
pub struct RecordFile {
    path: PathBuf,
}

impl RecordFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Lazily iterate the records of the file, in file order.
    pub fn records(&self) -> Result<Records<BufReader<File>>, RecordError> {
        let file = File::open(&self.path).map_err(|source| RecordError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(Records::new(self.path.clone(), BufReader::new(file)))
    }
}

/// Iterator over the records of one source.
///
/// Stops after the first error.
pub struct Records<R: Read> {
    path: PathBuf,
    stream: serde_json::StreamDeserializer<'static, serde_json::de::IoRead<R>, Value>,
    index: usize,
    failed: bool,
}

impl<R: Read> Records<R> {
    pub fn new(path: PathBuf, reader: R) -> Self {
        Self {
            path,
            stream: Deserializer::from_reader(reader).into_iter::<Value>(),
            index: 0,
            failed: false,
        }
    }

    fn parse_error(&self, line: usize, column: usize, message: String) -> RecordError {
        RecordError::Parse {
            path: self.path.clone(),
            index: self.index,
            line,
            column,
            message,
        }
    }
}

impl<R: Read> Iterator for Records<R> {
    type Item = Result<Record, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let next = self.stream.next()?;
        self.index += 1;

        let result = match next {
            Ok(Value::Object(record)) => Ok(record),
            Ok(other) => Err(self.parse_error(
                0,
                0,
                format!("expected a JSON object, found {}", json_kind(&other)),
            )),
            Err(e) if e.is_io() => Err(RecordError::Io {
                path: self.path.clone(),
                source: e.into(),
            }),
            Err(e) => Err(self.parse_error(e.line(), e.column(), e.to_string())),
        };
        self.failed = result.is_err();
        Some(result)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Read every record of the file at `path`, failing on the first IO or parse
/// error.
pub fn read_records(path: &Path) -> Result<Vec<Record>, RecordError> {
    RecordFile::new(path).records()?.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn records_of(text: &str) -> Vec<Result<Record, RecordError>> {
        Records::new(PathBuf::from("test.json"), text.as_bytes()).collect()
    }

    #[test]
    fn test_parses_records_in_file_order() {
        let records = records_of(
            "{\"page\": \"Home\", \"ts\": 1}\n{\"page\": \"NextSong\", \"ts\": 2}\n\n{\"page\": \"Logout\"}\n",
        );
        let pages: Vec<_> = records
            .into_iter()
            .map(|r| r.unwrap()["page"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(pages, vec!["Home", "NextSong", "Logout"]);
    }

    #[test]
    fn test_empty_input_has_no_records() {
        assert!(records_of("").is_empty());
        assert!(records_of("\n  \n").is_empty());
    }

    #[test]
    fn test_malformed_record_is_a_parse_error() {
        let records = records_of("{\"page\": \"Home\"}\n{\"page\": \n");
        assert_eq!(records.len(), 2);
        assert!(records[0].is_ok());
        match &records[1] {
            Err(RecordError::Parse { index, line, .. }) => {
                assert_eq!(*index, 2);
                assert!(*line >= 2);
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_object_record_is_a_parse_error() {
        let records = records_of("{\"a\": 1}\n[1, 2]\n{\"b\": 2}\n");
        // Iteration stops after the first failure
        assert_eq!(records.len(), 2);
        let err = records[1].as_ref().unwrap_err().to_string();
        assert!(err.contains("expected a JSON object, found an array"));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let result = RecordFile::new("/nonexistent/file.json").records();
        assert!(matches!(result, Err(RecordError::Io { .. })));
    }

    #[test]
    fn test_rereading_a_file_yields_identical_records() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"song_id\": \"SOZCTXZ12AB0182364\", \"duration\": 269.58}}").unwrap();
        writeln!(file, "{{\"song_id\": \"SOXVLOJ12AB0189215\", \"year\": 0}}").unwrap();

        let record_file = RecordFile::new(file.path());
        let first: Vec<Record> = record_file
            .records()
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        let second = read_records(file.path()).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }
}
