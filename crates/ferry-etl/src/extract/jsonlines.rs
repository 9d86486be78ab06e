//! JSON Lines sources: one tagged JSON object per line

use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{Extractor, RecordIter};
use crate::error::SourceFormatError;
use crate::record::RawRecord;

/// Extractor re-reading a JSON Lines file on every pass.
///
/// The whole file is checked once at open; later passes stream it line by
/// line, so only the records of the current batch are held in memory.
#[derive(Debug, Clone)]
pub struct JsonLinesExtractor {
    path: PathBuf,
    discriminator: String,
    records: usize,
}

impl JsonLinesExtractor {
    /// Open and validate a JSON Lines file.
    ///
    /// Every non-blank line must be an object whose `discriminator` field is
    /// a string.
    pub fn open(
        path: impl AsRef<Path>,
        discriminator: impl Into<String>,
    ) -> Result<Self, SourceFormatError> {
        let mut extractor = Self {
            path: path.as_ref().to_path_buf(),
            discriminator: discriminator.into(),
            records: 0,
        };

        let mut count = 0;
        for item in extractor.scan(None)? {
            item?;
            count += 1;
        }
        extractor.records = count;

        debug!(
            path = %extractor.path.display(),
            records = count,
            "Validated JSON Lines source"
        );
        Ok(extractor)
    }

    /// Number of records found at open
    pub fn len(&self) -> usize {
        self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    fn scan<'a>(&'a self, tag: Option<&'a str>) -> Result<LineRecords<'a>, SourceFormatError> {
        let file = File::open(&self.path).map_err(|e| {
            SourceFormatError::new(format!("Cannot read {}: {}", self.path.display(), e))
        })?;

        Ok(LineRecords {
            lines: BufReader::new(file).lines(),
            discriminator: &self.discriminator,
            tag,
            line: 0,
            position: 0,
            done: false,
        })
    }
}

impl Extractor for JsonLinesExtractor {
    fn records<'a>(&'a self, tag: Option<&'a str>) -> Result<RecordIter<'a>, SourceFormatError> {
        Ok(Box::new(self.scan(tag)?))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Lazy pass over the file; stops after the first error
struct LineRecords<'a> {
    lines: Lines<BufReader<File>>,
    discriminator: &'a str,
    tag: Option<&'a str>,
    line: usize,
    position: usize,
    done: bool,
}

impl LineRecords<'_> {
    fn fail(&mut self, message: String) -> Option<Result<RawRecord, SourceFormatError>> {
        self.done = true;
        Some(Err(SourceFormatError::new(format!(
            "Line {}: {}",
            self.line, message
        ))))
    }
}

impl Iterator for LineRecords<'_> {
    type Item = Result<RawRecord, SourceFormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let text = match self.lines.next()? {
                Ok(text) => text,
                Err(e) => {
                    self.line += 1;
                    return self.fail(e.to_string());
                }
            };
            self.line += 1;

            if text.trim().is_empty() {
                continue;
            }

            let mut fields = match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(fields)) => fields,
                Ok(_) => return self.fail("expected a JSON object".to_string()),
                Err(e) => return self.fail(format!("invalid JSON: {}", e)),
            };

            let record_tag = match fields.shift_remove(self.discriminator) {
                Some(Value::String(tag)) => tag,
                _ => {
                    let message = format!("missing string field '{}'", self.discriminator);
                    return self.fail(message);
                }
            };

            let position = self.position;
            self.position += 1;

            if self.tag.is_none_or(|t| t == record_tag) {
                return Some(Ok(RawRecord::new(position, fields)));
            }
        }
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn source(lines: &[&str]) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("source.jsonl");
        let mut file = File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        (dir, path)
    }

    #[test]
    fn test_filter_and_strip_discriminator() {
        let (_dir, path) = source(&[
            r#"{"model": "widget", "pk": 1, "name": "a"}"#,
            "",
            r#"{"model": "gadget", "pk": 2}"#,
            r#"{"model": "widget", "pk": 3, "name": "c"}"#,
        ]);
        let extractor = JsonLinesExtractor::open(&path, "model").unwrap();
        assert_eq!(extractor.len(), 3);

        let widgets: Vec<_> = extractor
            .records(Some("widget"))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(widgets.len(), 2);
        assert_eq!(widgets[1].position(), 2);
        assert_eq!(widgets[1].get("name"), Some(&json!("c")));
        assert!(widgets[0].get("model").is_none());
    }

    #[test]
    fn test_custom_discriminator() {
        let (_dir, path) = source(&[r#"{"type": "widget", "model": "X-1"}"#]);
        let extractor = JsonLinesExtractor::open(&path, "type").unwrap();

        let widgets: Vec<_> = extractor.records(Some("widget")).unwrap().collect();
        assert_eq!(widgets.len(), 1);
        assert_eq!(widgets[0].as_ref().unwrap().get("model"), Some(&json!("X-1")));
    }

    #[test]
    fn test_open_rejects_bad_line() {
        let (_dir, path) = source(&[r#"{"model": "widget"}"#, "[1, 2]"]);
        let err = JsonLinesExtractor::open(&path, "model").unwrap_err();
        assert_eq!(err.message, "Line 2: expected a JSON object");

        let (_dir, path) = source(&[r#"{"pk": 1}"#]);
        let err = JsonLinesExtractor::open(&path, "model").unwrap_err();
        assert_eq!(err.message, "Line 1: missing string field 'model'");
    }

    #[test]
    fn test_later_pass_error_is_yielded_once() {
        let (_dir, path) = source(&[r#"{"model": "widget", "pk": 1}"#]);
        let extractor = JsonLinesExtractor::open(&path, "model").unwrap();

        let rewritten = "{\"model\": \"widget\", \"pk\": 1}\nnot json\n{\"model\": \"widget\"}\n";
        std::fs::write(&path, rewritten).unwrap();

        let items: Vec<_> = extractor.records(Some("widget")).unwrap().collect();
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(items[1].as_ref().unwrap_err().message.starts_with("Line 2: invalid JSON"));
    }

    #[test]
    fn test_vanished_file_fails_pass() {
        let (dir, path) = source(&[r#"{"model": "widget"}"#]);
        let extractor = JsonLinesExtractor::open(&path, "model").unwrap();
        drop(dir);

        assert!(extractor.records(None).is_err());
    }
}
