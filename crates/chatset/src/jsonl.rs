//! Newline-delimited JSON codec for datasets.
//!
//! One `{"messages": [...]}` object per line, every line terminated by `\n`,
//! no enclosing array. Separators follow Python's `json.dumps` defaults
//! (`", "` and `": "`). Non-ASCII text is written as raw UTF-8, not `\uXXXX`.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::ser::Formatter;
use tracing::{debug, info};

use crate::error::{ChatsetError, Result};
use crate::schema::{Dataset, Exchange};

/// Compact JSON with a space after `,` and `:`.
pub(crate) struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

pub(crate) fn write_spaced<T: Serialize, W: io::Write>(writer: W, value: &T) -> Result<()> {
    let mut ser = serde_json::Serializer::with_formatter(writer, SpacedFormatter);
    value.serialize(&mut ser).map_err(|e| ChatsetError::Ser(e.to_string()))
}

pub(crate) fn to_spaced_string<T: Serialize>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    write_spaced(&mut buf, value)?;
    // serde_json only emits valid UTF-8
    String::from_utf8(buf).map_err(|e| ChatsetError::Ser(e.to_string()))
}

pub fn serialize_dataset(exchanges: &[Exchange]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    for ex in exchanges {
        write_spaced(&mut buf, ex)?;
        buf.push(b'\n');
    }
    Ok(buf)
}

pub fn write_dataset(path: &Path, exchanges: &[Exchange]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let bytes = serialize_dataset(exchanges)?;

    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(&bytes)?;
    out.flush()?;

    info!(path = %path.display(), examples = exchanges.len(), "dataset written");
    Ok(())
}

pub fn parse_dataset(bytes: &[u8]) -> Result<Dataset> {
    parse_lines(bytes)
}

pub fn read_dataset(path: &Path) -> Result<Dataset> {
    let f = File::open(path)?;
    let dataset = parse_lines(BufReader::new(f))?;
    info!(path = %path.display(), examples = dataset.len(), "dataset loaded");
    Ok(dataset)
}

/// BLAKE3 over the exact file bytes, hex-encoded.
pub fn dataset_hash(bytes: &[u8]) -> String {
    hex::encode(blake3::hash(bytes).as_bytes())
}

fn parse_lines<R: BufRead>(reader: R) -> Result<Dataset> {
    let mut out = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = line.map_err(|source| ChatsetError::Read { line: line_no, source })?;

        if line.trim().is_empty() {
            debug!(line = line_no, "skipping blank line");
            continue;
        }

        let ex: Exchange = serde_json::from_str(&line)
            .map_err(|source| ChatsetError::Json { line: line_no, source })?;
        out.push(ex);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Message, Role};

    fn sample() -> Vec<Exchange> {
        vec![
            Exchange {
                messages: vec![
                    Message::new(Role::System, "sys"),
                    Message::new(Role::User, "Review: \"quoted\"\nline"),
                    Message::new(Role::Assistant, "{\"rating\": 5, \"Sentiment\": \"positive\"}\n"),
                ],
            },
            Exchange {
                messages: vec![Message {
                    role: Role::User,
                    content: "named".into(),
                    name: Some("alice".into()),
                }],
            },
        ]
    }

    #[test]
    fn test_serialize_line_shape() {
        let ex = Exchange { messages: vec![Message::new(Role::User, "hi")] };
        let bytes = serialize_dataset(&[ex]).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "{\"messages\": [{\"role\": \"user\", \"content\": \"hi\"}]}\n"
        );
    }

    #[test]
    fn test_round_trip() {
        let data = sample();
        let bytes = serialize_dataset(&data).unwrap();
        assert_eq!(parse_dataset(&bytes).unwrap(), data);
    }

    #[test]
    fn test_every_line_newline_terminated() {
        let bytes = serialize_dataset(&sample()).unwrap();
        assert_eq!(bytes.last(), Some(&b'\n'));
        assert_eq!(bytes.iter().filter(|b| **b == b'\n').count(), 2);
        assert_ne!(bytes.first(), Some(&b'['));
    }

    #[test]
    fn test_serialize_deterministic() {
        let a = serialize_dataset(&sample()).unwrap();
        let b = serialize_dataset(&sample()).unwrap();
        assert_eq!(a, b);
        assert_eq!(dataset_hash(&a), dataset_hash(&b));
        assert_eq!(dataset_hash(&a).len(), 64);
    }

    #[test]
    fn test_empty_dataset_serializes_to_nothing() {
        assert!(serialize_dataset(&[]).unwrap().is_empty());
        assert!(parse_dataset(b"").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_utf8_reports_line_number() {
        let input = b"{\"messages\": []}\n\xff\xfe\n";
        match parse_dataset(input) {
            Err(ChatsetError::Read { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected Read error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_ascii_written_raw() {
        let ex = Exchange { messages: vec![Message::new(Role::User, "café")] };
        let bytes = serialize_dataset(&[ex]).unwrap();
        assert!(String::from_utf8(bytes).unwrap().contains("café"));
    }

    #[test]
    fn test_parse_reports_line_number() {
        let input = b"{\"messages\": []}\n\nnot json\n";
        match parse_dataset(input) {
            Err(ChatsetError::Json { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected Json error, got {other:?}"),
        }
    }
}
