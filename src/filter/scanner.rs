//! Placeholder scanning for `${name}` markers.
//!
//! A marker opens with `${`, takes at least one character of name and closes
//! at the first following `}` on the same line. Markers do not nest: in
//! `${a${b}}` the name is `a${b`. A marker preceded by an odd number of
//! backslashes is escaped; an even number means the backslashes escape each
//! other and the marker stays live.

use std::collections::BTreeSet;
use std::ops::Range;
use std::str::CharIndices;

/// One `${...}` marker found in a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder<'a> {
    /// Byte range of the whole marker, `${` through `}`.
    pub span: Range<usize>,
    /// The text between `${` and `}`, verbatim.
    pub name: &'a str,
    /// Whether the marker is preceded by an odd run of backslashes.
    pub escaped: bool,
}

#[derive(Debug, Clone, Copy)]
enum State {
    Text,
    Dollar { start: usize, escaped: bool },
    Open { start: usize, escaped: bool },
    Name { start: usize, escaped: bool },
}

/// Iterator over the markers of a text, left to right, escaped ones included.
#[derive(Debug, Clone)]
pub struct Placeholders<'a> {
    text: &'a str,
    chars: CharIndices<'a>,
    state: State,
    backslashes: usize,
}

/// Returns an iterator over every `${...}` marker in `text`.
pub fn placeholders(text: &str) -> Placeholders<'_> {
    Placeholders {
        text,
        chars: text.char_indices(),
        state: State::Text,
        backslashes: 0,
    }
}

/// Collects the distinct names of all live (non-escaped) markers, sorted.
pub fn scan(text: &str) -> BTreeSet<String> {
    placeholders(text)
        .filter(|p| !p.escaped)
        .map(|p| p.name.to_string())
        .collect()
}

impl<'a> Iterator for Placeholders<'a> {
    type Item = Placeholder<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((idx, ch)) = self.chars.next() {
            if let Some(found) = self.step(idx, ch) {
                return Some(found);
            }
        }
        None
    }
}

impl<'a> Placeholders<'a> {
    fn step(&mut self, idx: usize, ch: char) -> Option<Placeholder<'a>> {
        match self.state {
            State::Text => self.text_char(idx, ch),
            State::Dollar { start, escaped } => {
                if ch == '{' {
                    self.state = State::Open { start, escaped };
                } else {
                    self.text_char(idx, ch);
                }
            }
            // The name must hold at least one character, even a '}'.
            State::Open { start, escaped } => {
                if is_line_break(ch) {
                    self.text_char(idx, ch);
                } else {
                    self.state = State::Name { start, escaped };
                }
            }
            State::Name { start, escaped } => {
                if ch == '}' {
                    self.state = State::Text;
                    self.backslashes = 0;
                    return Some(Placeholder {
                        span: start..idx + 1,
                        name: &self.text[start + 2..idx],
                        escaped,
                    });
                }
                if is_line_break(ch) {
                    self.text_char(idx, ch);
                }
            }
        }
        None
    }

    fn text_char(&mut self, idx: usize, ch: char) {
        self.state = State::Text;
        match ch {
            '$' => {
                self.state = State::Dollar {
                    start: idx,
                    escaped: self.backslashes % 2 == 1,
                };
                self.backslashes = 0;
            }
            '\\' => self.backslashes += 1,
            _ => self.backslashes = 0,
        }
    }
}

/// Characters a placeholder name may not contain: `\n`, `\r`, NEL and the
/// Unicode line and paragraph separators.
fn is_line_break(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{0085}' | '\u{2028}' | '\u{2029}')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(text: &str) -> Vec<String> {
        scan(text).into_iter().collect()
    }

    #[test]
    fn test_plain_text_has_no_placeholders() {
        assert!(scan("").is_empty());
        assert!(scan("no markers here, just $ and { and }").is_empty());
        assert!(scan("$x {y} $ {z}").is_empty());
    }

    #[test]
    fn test_single_placeholder() {
        assert_eq!(names("a ${x} b"), vec!["x"]);
    }

    #[test]
    fn test_escaped_placeholder_is_skipped() {
        assert!(scan(r"a \${x} b").is_empty());
        assert!(scan(r"a \\\${x} b").is_empty());
    }

    #[test]
    fn test_double_backslash_keeps_marker_live() {
        assert_eq!(names(r"a \\${x} b"), vec!["x"]);
    }

    #[test]
    fn test_results_are_sorted_and_distinct() {
        assert_eq!(names("${b} ${a} ${b} ${c.d}"), vec!["a", "b", "c.d"]);
    }

    #[test]
    fn test_markers_do_not_nest() {
        assert_eq!(names("${a${b}}"), vec!["a${b"]);
    }

    #[test]
    fn test_empty_and_unclosed_markers_do_not_match() {
        assert!(scan("${}").is_empty());
        assert!(scan("${abc").is_empty());
        assert!(scan("${a\n}").is_empty());
    }

    #[test]
    fn test_unicode_line_breaks_end_a_name() {
        assert!(scan("${a\r}").is_empty());
        assert!(scan("${a\u{0085}b}").is_empty());
        assert!(scan("${a\u{2028}b}").is_empty());
        assert!(scan("${\u{2029}}").is_empty());
        assert_eq!(names("${a\u{2028}${b}"), vec!["b"]);
    }

    #[test]
    fn test_marker_after_broken_line_still_found() {
        assert_eq!(names("${a\n${b}"), vec!["b"]);
    }

    #[test]
    fn test_closing_brace_can_be_first_name_char() {
        assert_eq!(names("${}}"), vec!["}"]);
    }

    #[test]
    fn test_escaped_marker_consumes_its_span() {
        let found: Vec<_> = placeholders(r"\${a} ${b}").collect();
        assert_eq!(found.len(), 2);
        assert!(found[0].escaped);
        assert_eq!(found[0].span, 1..5);
        assert!(!found[1].escaped);
        assert_eq!(found[1].name, "b");
    }

    #[test]
    fn test_dollar_run_starts_at_last_dollar() {
        let found: Vec<_> = placeholders("$${x}").collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].span, 1..5);
        assert_eq!(found[0].name, "x");
    }

    #[test]
    fn test_multibyte_text_around_markers() {
        assert_eq!(names("héllo ${ünï} wörld"), vec!["ünï"]);
    }
}
