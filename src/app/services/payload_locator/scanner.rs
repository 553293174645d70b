//! String-aware balanced bracket scanner
//!
//! Walks the page text from an opening `[`, decoding the payload escaping on
//! the fly and tracking JSON string state on the decoded stream. Brackets
//! inside string literals are never counted, so a city named `"[x]"` cannot
//! end the array early or keep it open.

use super::MissingReason;
use crate::config::PayloadEncoding;
use std::iter::Peekable;
use std::str::Chars;

/// Decodes one payload character at a time
struct Decoder<'a> {
    chars: Peekable<Chars<'a>>,
    encoding: PayloadEncoding,
}

impl<'a> Decoder<'a> {
    fn new(text: &'a str, encoding: PayloadEncoding) -> Self {
        Self {
            chars: text.chars().peekable(),
            encoding,
        }
    }
}

impl Iterator for Decoder<'_> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if self.encoding == PayloadEncoding::Plain || c != '\\' {
            return Some(c);
        }

        // `\"` -> `"` and `\\` -> `\`; any other escape passes through untouched
        match self.chars.peek() {
            Some(&next @ ('"' | '\\')) => {
                self.chars.next();
                Some(next)
            }
            _ => Some(c),
        }
    }
}

/// JSON lexical state of the decoded stream
#[derive(Debug, Default)]
struct ScanState {
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl ScanState {
    /// Feed one decoded character; returns true once the outer array closed
    fn feed(&mut self, c: char) -> bool {
        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == '"' {
                self.in_string = false;
            }
            return false;
        }

        match c {
            '"' => self.in_string = true,
            '[' => self.depth += 1,
            ']' => {
                self.depth = self.depth.saturating_sub(1);
                return self.depth == 0;
            }
            _ => {}
        }
        false
    }
}

/// Isolate and decode the balanced array starting at the first character of `text`
///
/// `text` must begin with `[`. Returns the decoded JSON text of the array,
/// or [`MissingReason::Unbalanced`] when the text ends before the array closes.
pub fn scan_balanced_array(
    text: &str,
    encoding: PayloadEncoding,
) -> Result<String, MissingReason> {
    if !text.starts_with('[') {
        return Err(MissingReason::NoOpeningBracket);
    }

    let mut state = ScanState::default();
    let mut decoded = String::new();

    for c in Decoder::new(text, encoding) {
        decoded.push(c);
        if state.feed(c) {
            return Ok(decoded);
        }
    }

    Err(MissingReason::Unbalanced)
}
