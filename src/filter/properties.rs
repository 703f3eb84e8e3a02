//! Property file loading.
//!
//! Understands the usual `.properties` grammar: `#` and `!` comment lines,
//! `=`, `:` or whitespace between key and value, a trailing backslash to
//! continue a line, and backslash escapes (`\t`, `\n`, `\r`, `\f`,
//! `\uXXXX`, and `\x` for any other `x`). Files are decoded as UTF-8,
//! falling back to ISO-8859-1 when the bytes are not valid UTF-8.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::FilterError;

/// The key/value pairs of one property file, in first-appearance order.
///
/// A key repeated within the file keeps its first position and takes the
/// last value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySource {
    path: PathBuf,
    entries: Vec<(String, String)>,
}

impl PropertySource {
    /// Reads and parses the property file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FilterError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| FilterError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let contents = decode(bytes);
        let source = Self::parse(path, &contents)?;
        debug!(
            path = %path.display(),
            keys = source.len(),
            "loaded property file"
        );
        Ok(source)
    }

    /// Parses property text; `path` is only used for error reporting.
    pub fn parse(path: impl AsRef<Path>, contents: &str) -> Result<Self, FilterError> {
        let path = path.as_ref().to_path_buf();
        let mut entries: Vec<(String, String)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for (line, logical) in logical_lines(contents) {
            let (key, value) = split_entry(&logical);
            let parse_error = |message: String| FilterError::Parse {
                path: path.clone(),
                line,
                message,
            };
            let key = unescape(key).map_err(parse_error)?;
            let value = unescape(value).map_err(parse_error)?;

            match index.get(&key) {
                Some(&at) => entries[at].1 = value,
                None => {
                    index.insert(key.clone(), entries.len());
                    entries.push((key, value));
                }
            }
        }

        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for PropertySource {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// UTF-8 when valid, otherwise ISO-8859-1 (every byte is the char of the
/// same value).
fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            debug!("property file is not UTF-8, reading as ISO-8859-1");
            e.into_bytes().into_iter().map(char::from).collect()
        }
    }
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0c')
}

/// Joins continued lines and drops blanks and comments.
///
/// Each logical line is paired with the 1-based number of the natural line
/// it starts on.
fn logical_lines(contents: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut current: Option<(usize, String)> = None;

    for (idx, natural) in contents.split('\n').enumerate() {
        let natural = natural.strip_suffix('\r').unwrap_or(natural);
        let trimmed = natural.trim_start_matches(is_blank);

        let (start, mut buf) = match current.take() {
            Some(pending) => pending,
            None => {
                if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                    continue;
                }
                (idx + 1, String::new())
            }
        };

        let trailing = trimmed.chars().rev().take_while(|&c| c == '\\').count();
        if trailing % 2 == 1 {
            buf.push_str(&trimmed[..trimmed.len() - 1]);
            current = Some((start, buf));
        } else {
            buf.push_str(trimmed);
            lines.push((start, buf));
        }
    }

    if let Some(pending) = current {
        lines.push(pending);
    }

    lines
}

/// Splits a logical line into its raw (still escaped) key and value.
fn split_entry(line: &str) -> (&str, &str) {
    let mut key_end = line.len();
    let mut value_start = line.len();
    let mut has_separator = false;
    let mut preceding_backslash = false;

    for (idx, c) in line.char_indices() {
        if !preceding_backslash && (c == '=' || c == ':') {
            key_end = idx;
            value_start = idx + 1;
            has_separator = true;
            break;
        }
        if !preceding_backslash && is_blank(c) {
            key_end = idx;
            value_start = idx + c.len_utf8();
            break;
        }
        preceding_backslash = c == '\\' && !preceding_backslash;
    }

    let mut rest = &line[value_start..];
    loop {
        rest = rest.trim_start_matches(is_blank);
        match rest.chars().next() {
            Some(c @ ('=' | ':')) if !has_separator => {
                has_separator = true;
                rest = &rest[c.len_utf8()..];
            }
            _ => break,
        }
    }

    (&line[..key_end], rest)
}

/// Decodes backslash escapes.
fn unescape(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let unit = read_code_unit(&mut chars)?;
                out.push(decode_unicode(unit, &mut chars)?);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    Ok(out)
}

fn read_code_unit(chars: &mut std::str::Chars<'_>) -> Result<u32, String> {
    let digits: String = chars.by_ref().take(4).collect();
    if digits.len() != 4 {
        return Err(format!("malformed \\uxxxx encoding: '\\u{digits}'"));
    }
    u32::from_str_radix(&digits, 16)
        .map_err(|_| format!("malformed \\uxxxx encoding: '\\u{digits}'"))
}

/// Turns a UTF-16 code unit into a char, pulling the low half of a
/// surrogate pair from the following `\uXXXX` when needed.
fn decode_unicode(unit: u32, chars: &mut std::str::Chars<'_>) -> Result<char, String> {
    if let Some(c) = char::from_u32(unit) {
        return Ok(c);
    }
    if !(0xD800..0xDC00).contains(&unit) {
        return Err(format!("unpaired surrogate \\u{unit:04X}"));
    }

    let mut lookahead = chars.clone();
    if lookahead.next() == Some('\\') && lookahead.next() == Some('u') {
        let low = read_code_unit(&mut lookahead)?;
        if (0xDC00..0xE000).contains(&low) {
            let combined = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
            if let Some(c) = char::from_u32(combined) {
                *chars = lookahead;
                return Ok(c);
            }
        }
    }
    Err(format!("unpaired surrogate \\u{unit:04X}"))
}
