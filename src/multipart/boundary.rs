// Copyright (c) 2024 The filedrop developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Splitting a buffered `multipart` body at its boundary delimiters.

use std::collections::VecDeque;

use log::debug;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum State {
    /// Nothing scanned yet; bytes before the first delimiter are preamble.
    Preamble,
    /// The close delimiter was found; `parts` holds the parts still to be handed out.
    Parts,
    /// Every part was handed out, or the body has no close delimiter.
    Done,
}

/// What follows the boundary token of a delimiter line.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Suffix {
    /// `--`: this was the close delimiter.
    Close,
    /// CRLF (after optional transport padding); the next part starts at this offset.
    Part(usize),
    /// The body ends right after the boundary, without the closing `--`.
    End,
}

/// A state machine yielding the raw bytes of each part of a `multipart` body.
///
/// Each yielded slice starts with the part's header block and ends just before the CRLF that
/// precedes the next delimiter. The search for that delimiter stops at its first occurrence, so
/// a payload which itself contains `\r\n--<boundary>` followed by `--` or CRLF is cut short there.
///
/// Parts are only yielded once the close delimiter `--<boundary>--` has been found. A body that
/// ends before it (an upload cut off in transit) yields no part at all.
#[derive(Debug)]
pub struct BoundaryScanner<'a> {
    body: &'a [u8],
    /// `\r\n--<boundary>`
    delimiter: Vec<u8>,
    /// Offsets of the parts found before the close delimiter.
    parts: VecDeque<(usize, usize)>,
    state: State,
}

impl<'a> BoundaryScanner<'a> {
    pub fn new(body: &'a [u8], boundary: &str) -> BoundaryScanner<'a> {
        let mut delimiter = Vec::with_capacity(boundary.len() + 4);
        delimiter.extend_from_slice(b"\r\n--");
        delimiter.extend_from_slice(boundary.as_bytes());

        BoundaryScanner {
            body,
            delimiter,
            parts: VecDeque::new(),
            state: State::Preamble,
        }
    }

    /// Returns the next part, or `None` once every part was returned.
    ///
    /// Returns `None` straight away if the body is not closed by `--<boundary>--`.
    pub fn next_part(&mut self) -> Option<&'a [u8]> {
        loop {
            match self.state {
                State::Done => return None,

                State::Preamble => self.scan(),

                State::Parts => {
                    match self.parts.pop_front() {
                        Some((start, end)) => return Some(&self.body[start..end]),
                        None => self.state = State::Done,
                    }
                },
            }
        }
    }

    /// Walks every delimiter of the body and queues the parts if the close delimiter is reached.
    fn scan(&mut self) {
        self.state = State::Done;

        let mut start = match self.first_delimiter() {
            Some(Suffix::Part(start)) => start,
            other => {
                debug!("No part before the end of the body: {:?}", other);
                return;
            }
        };

        let mut parts = VecDeque::new();

        loop {
            match self.next_delimiter(start) {
                Some((end, Suffix::Part(next))) => {
                    parts.push_back((start, end));
                    start = next;
                },
                Some((end, Suffix::Close)) => {
                    parts.push_back((start, end));
                    debug!("Found {} part(s)", parts.len());
                    self.parts = parts;
                    self.state = State::Parts;
                    return;
                },
                Some((_, Suffix::End)) | None => {
                    debug!("Body ends without a close delimiter after offset {}", start);
                    return;
                },
            }
        }
    }

    /// The first delimiter may sit at the very start of the body, without a leading CRLF.
    fn first_delimiter(&self) -> Option<Suffix> {
        let dash_boundary = &self.delimiter[2..];

        if self.body.starts_with(dash_boundary) {
            if let Some(suffix) = self.classify(dash_boundary.len()) {
                return Some(suffix);
            }
        }

        self.next_delimiter(0).map(|(_, suffix)| suffix)
    }

    /// Finds the next `\r\n--<boundary>` at or after `from` that really is a delimiter line.
    ///
    /// Returns the offset of its leading CRLF along with what follows it.
    fn next_delimiter(&self, from: usize) -> Option<(usize, Suffix)> {
        let mut search = from;

        while search < self.body.len() {
            let idx = search + twoway::find_bytes(&self.body[search..], &self.delimiter)?;

            if let Some(suffix) = self.classify(idx + self.delimiter.len()) {
                return Some((idx, suffix));
            }

            search = idx + 1;
        }

        None
    }

    fn classify(&self, after: usize) -> Option<Suffix> {
        let rest = &self.body[after..];

        if rest.is_empty() {
            return Some(Suffix::End);
        }

        if rest.starts_with(b"--") {
            return Some(Suffix::Close);
        }

        let padding = rest.iter().take_while(|&&b| b == b' ' || b == b'\t').count();
        let rest = &rest[padding..];

        if rest.starts_with(b"\r\n") {
            Some(Suffix::Part(after + padding + 2))
        } else if rest.is_empty() {
            Some(Suffix::End)
        } else {
            None
        }
    }
}
