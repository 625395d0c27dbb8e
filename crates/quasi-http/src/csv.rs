//! The restricted CSV dialect used for quasi http header sections.
//!
//! Values are quoted only when they contain a comma, a double quote or a
//! line break, and the empty string is always written as `""` so that a row
//! holding one empty value can be told apart from an empty row.

use crate::protocol::{CsvError, CsvValueError};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Eoi,
    Comma,
    Quote,
    Newline { len: usize },
}

fn is_special(c: u8) -> bool {
    matches!(c, b',' | b'"' | b'\r' | b'\n')
}

fn contains_special_characters(s: &str) -> bool {
    s.bytes().any(is_special)
}

/// Finds the next separator at or after `start`, returning its kind and
/// position. Inside a quoted value only a lone closing quote counts.
fn locate_next_token(csv: &[u8], start: usize, inside_quoted_value: bool) -> (Token, usize) {
    let mut i = start;
    while i < csv.len() {
        let c = csv[i];
        if inside_quoted_value {
            if c == b'"' {
                if csv.get(i + 1) == Some(&b'"') {
                    i += 2;
                    continue;
                }
                return (Token::Quote, i);
            }
        } else {
            match c {
                b',' => return (Token::Comma, i),
                b'\n' => return (Token::Newline { len: 1 }, i),
                b'\r' if csv.get(i + 1) == Some(&b'\n') => return (Token::Newline { len: 2 }, i),
                b'\r' => return (Token::Newline { len: 1 }, i),
                _ => {}
            }
        }
        i += 1;
    }
    (Token::Eoi, csv.len())
}

/// Parses a CSV string into rows of values.
///
/// Rows end at `\n`, `\r` or `\r\n`. Only a value whose first character is a
/// double quote is treated as quoted; such a value must be followed by a
/// comma, a line break or the end of input.
pub fn deserialize(csv: &str) -> Result<Vec<Vec<String>>, CsvError> {
    let bytes = csv.as_bytes();
    let mut parsed: Vec<Vec<String>> = Vec::new();
    let mut current_row: Vec<String> = Vec::new();
    let mut start = 0;
    let mut comma_last_seen = false;

    while start < bytes.len() {
        comma_last_seen = false;

        let (token, end) = if bytes[start] == b'"' {
            match locate_next_token(bytes, start + 1, true) {
                (Token::Quote, pos) => (Token::Quote, pos + 1),
                _ => {
                    return Err(CsvError::at(parsed.len(), current_row.len(), "ending double quote not found"));
                }
            }
        } else {
            locate_next_token(bytes, start, false)
        };

        // empty values between line breaks, or before the first line break,
        // do not create a column.
        let is_newline = matches!(token, Token::Newline { .. });
        if start < end || !is_newline || !current_row.is_empty() {
            let value = unescape_value(&csv[start..end])
                .map_err(|e| CsvError::at(parsed.len(), current_row.len(), e))?;
            current_row.push(value);
        }

        match token {
            Token::Comma => {
                comma_last_seen = true;
                start = end + 1;
            }
            Token::Quote => {
                start = end;
                match bytes.get(start) {
                    None => {}
                    Some(b',') => {
                        comma_last_seen = true;
                        start += 1;
                    }
                    Some(c @ (b'\n' | b'\r')) => {
                        parsed.push(std::mem::take(&mut current_row));
                        start += if *c == b'\r' && bytes.get(start + 1) == Some(&b'\n') { 2 } else { 1 };
                    }
                    Some(_) => {
                        let c = csv[start..].chars().next().unwrap_or_default();
                        return Err(CsvError::at(
                            parsed.len(),
                            current_row.len(),
                            format!("unexpected character '{c}' found at beginning"),
                        ));
                    }
                }
            }
            Token::Newline { len } => {
                parsed.push(std::mem::take(&mut current_row));
                start = end + len;
            }
            Token::Eoi => start = end,
        }
    }

    if comma_last_seen {
        current_row.push(String::new());
    }
    if !current_row.is_empty() {
        parsed.push(current_row);
    }

    trace!(rows = parsed.len(), "parsed csv");
    Ok(parsed)
}

/// Generates CSV text, terminating every row (including the last) with `\n`.
pub fn serialize<R, V>(rows: &[R]) -> String
where
    R: AsRef<[V]>,
    V: AsRef<str>,
{
    let mut csv = String::new();
    for row in rows {
        for (i, value) in row.as_ref().iter().enumerate() {
            if i > 0 {
                csv.push(',');
            }
            csv.push_str(&escape_value(value.as_ref()));
        }
        csv.push('\n');
    }
    csv
}

/// Escapes a single value. The empty string becomes `""`.
pub fn escape_value(raw: &str) -> String {
    if !contains_special_characters(raw) {
        if raw.is_empty() {
            return "\"\"".to_owned();
        }
        return raw.to_owned();
    }
    format!("\"{}\"", raw.replace('"', "\"\""))
}

/// Reverses [`escape_value`].
pub fn unescape_value(escaped: &str) -> Result<String, CsvValueError> {
    if !contains_special_characters(escaped) {
        return Ok(escaped.to_owned());
    }
    if escaped.len() < 2 || !escaped.starts_with('"') || !escaped.ends_with('"') {
        return Err(CsvValueError::MissingEnclosingQuotes(escaped.to_owned()));
    }

    let inner = &escaped[1..escaped.len() - 1];
    let mut unescaped = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        unescaped.push(c);
        if c == '"' && chars.next_if_eq(&'"').is_none() {
            return Err(CsvValueError::UnescapedQuote(escaped.to_owned()));
        }
    }
    Ok(unescaped)
}
