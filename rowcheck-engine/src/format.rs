//! Delimited text format: options, row encoding, field splitting and a line
//! splitter that reassembles lines across read blocks.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Options for reading delimited text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadOptions {
    /// Field separator
    pub separator: char,
    /// First line of every file is a header
    pub header: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self { separator: ';', header: true }
    }
}

/// Options for writing delimited text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOptions {
    /// Field separator
    pub separator: char,
    /// Start every part file with a header line
    pub header: bool,
    /// Rows per part file
    pub rows_per_file: u64,
}

impl WriteOptions {
    /// Read options matching this layout
    pub fn read_options(&self) -> ReadOptions {
        ReadOptions { separator: self.separator, header: self.header }
    }
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { separator: ';', header: true, rows_per_file: 1_000_000 }
    }
}

/// Append one encoded row, terminated by `\n`, to `out`.
///
/// Fields holding the separator or a quote are quoted with inner quotes
/// doubled. Line breaks inside a field cannot be represented and are rejected.
pub fn encode_row<S: AsRef<str>>(
    fields: &[S],
    separator: char,
    out: &mut String,
) -> Result<(), String> {
    for (i, field) in fields.iter().enumerate() {
        let field = field.as_ref();
        if i > 0 {
            out.push(separator);
        }

        if field.contains(['\n', '\r']) {
            return Err(format!("field {i} contains a line break"));
        }

        if field.contains(separator) || field.contains('"') {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push('\n');
    Ok(())
}

/// Split one line into fields, unquoting quoted fields.
pub fn split_fields(line: &str, separator: char) -> Vec<Cow<'_, str>> {
    if !line.contains('"') {
        return line.split(separator).map(Cow::Borrowed).collect();
    }

    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else if c == '"' {
            in_quotes = true;
        } else if c == separator {
            fields.push(Cow::Owned(std::mem::take(&mut current)));
        } else {
            current.push(c);
        }
    }
    fields.push(Cow::Owned(current));
    fields
}

/// Splits a byte stream fed in arbitrary blocks into `\n` terminated lines.
///
/// Line numbers are one-based. A trailing `\r` is stripped.
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
    line_no: u64,
}

impl LineSplitter {
    /// Create a splitter positioned before the first line
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next block, calling `on_line` for every completed line
    pub fn push<E, F>(&mut self, block: &[u8], mut on_line: F) -> Result<(), E>
    where
        F: FnMut(u64, &[u8]) -> Result<(), E>,
    {
        let mut rest = block;
        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            let (segment, tail) = rest.split_at(pos);
            rest = &tail[1..];
            self.line_no += 1;

            if self.pending.is_empty() {
                on_line(self.line_no, strip_cr(segment))?;
            } else {
                self.pending.extend_from_slice(segment);
                let line = std::mem::take(&mut self.pending);
                on_line(self.line_no, strip_cr(&line))?;
            }
        }
        self.pending.extend_from_slice(rest);
        Ok(())
    }

    /// Flush a final line that had no terminating `\n`
    pub fn finish<E, F>(mut self, mut on_line: F) -> Result<(), E>
    where
        F: FnMut(u64, &[u8]) -> Result<(), E>,
    {
        if self.pending.is_empty() {
            return Ok(());
        }
        self.line_no += 1;
        let line = std::mem::take(&mut self.pending);
        on_line(self.line_no, strip_cr(&line))
    }
}

fn strip_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_lines(blocks: &[&[u8]]) -> Vec<(u64, String)> {
        let mut lines = Vec::new();
        let mut splitter = LineSplitter::new();
        for block in blocks {
            splitter
                .push::<(), _>(block, |no, line| {
                    lines.push((no, String::from_utf8_lossy(line).into_owned()));
                    Ok(())
                })
                .unwrap();
        }
        splitter
            .finish::<(), _>(|no, line| {
                lines.push((no, String::from_utf8_lossy(line).into_owned()));
                Ok(())
            })
            .unwrap();
        lines
    }

    #[test]
    fn test_encode_plain_row() {
        let mut out = String::new();
        encode_row(&["1", "abc", ""], ';', &mut out).unwrap();
        assert_eq!(out, "1;abc;\n");
    }

    #[test]
    fn test_encode_quotes_when_needed() {
        let mut out = String::new();
        encode_row(&["a;b", "say \"hi\""], ';', &mut out).unwrap();
        assert_eq!(out, "\"a;b\";\"say \"\"hi\"\"\"\n");

        let fields = split_fields(out.trim_end(), ';');
        assert_eq!(fields, vec!["a;b", "say \"hi\""]);
    }

    #[test]
    fn test_encode_rejects_line_breaks() {
        let mut out = String::new();
        assert!(encode_row(&["ok", "bad\nvalue"], ';', &mut out).is_err());
    }

    #[test]
    fn test_split_plain_fields_borrow() {
        let fields = split_fields("row_id;basic_data;more_data", ';');
        assert_eq!(fields, vec!["row_id", "basic_data", "more_data"]);
        assert!(fields.iter().all(|f| matches!(f, Cow::Borrowed(_))));
    }

    #[test]
    fn test_lines_reassembled_across_blocks() {
        let lines = collect_lines(&[b"row_id;x\n1;a", b"bc\r\n2;", b"d\n", b"3;e"]);
        assert_eq!(
            lines,
            vec![
                (1, "row_id;x".to_string()),
                (2, "1;abc".to_string()),
                (3, "2;d".to_string()),
                (4, "3;e".to_string()),
            ]
        );
    }

    #[test]
    fn test_block_boundary_on_newline() {
        let lines = collect_lines(&[b"a\n", b"\n", b"b\n"]);
        assert_eq!(lines, vec![(1, "a".into()), (2, "".into()), (3, "b".into())]);
    }
}
