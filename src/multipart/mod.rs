// Copyright (c) 2024 The filedrop developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Parsing of buffered `multipart/form-data` bodies.
//!
//! [`Multipart`](struct.Multipart.html) walks the parts of a body one at a time, and
//! [`extract_file`](fn.extract_file.html) picks the uploaded file out of them: the first part
//! declared as `form-data` with `name="file"`, a non-empty `filename` and a `Content-Type`.
//!
//! Parts are delimited by the first occurrence of the boundary. A file whose raw bytes contain
//! `\r\n--<boundary>` followed by `--` or a line break is therefore cut at that point; clients
//! are expected to choose a boundary that does not appear in the data.
//!
//! A body that is not closed by `--<boundary>--` has no parts: an upload cut off in transit is
//! never mistaken for a complete one.

use std::str::{self, Utf8Error};

use log::debug;
use percent_encoding::percent_decode_str;

pub use self::boundary::BoundaryScanner;
pub use self::field::{ContentDisposition, PartHeaders};

mod boundary;
mod field;

pub(crate) use self::field::split_header_value;

/// The form field the uploaded file is expected under.
pub const FILE_FIELD: &str = "file";

quick_error! {
    /// Error that can happen when processing a multipart body.
    #[derive(Debug)]
    pub enum MultipartError {
        /// The boundary declared by the request can't be used.
        Boundary(detail: String) {
            display("invalid multipart boundary: {}", detail)
        }
        /// The raw filename of the file part is not valid UTF-8.
        Filename(err: Utf8Error) {
            from()
            display("filename is not valid UTF-8: {}", err)
            cause(err)
        }
    }
}

/// A file extracted from a multipart body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedFile {
    /// The filename sent by the client, percent-decoded.
    ///
    /// ## Warning
    /// This is an arbitrary string chosen by the client. It may contain path separators or be
    /// an absolute path.
    pub filename: String,
    /// The `Content-Type` the client declared for the file.
    pub content_type: String,
    /// The bytes of the file, exactly as they appear in the body.
    pub payload: Vec<u8>,
}

/// One part of a multipart body.
#[derive(Debug)]
pub struct Part<'a> {
    pub headers: PartHeaders,
    /// The payload of the part, borrowed from the body.
    pub data: &'a [u8],
}

impl<'a> Part<'a> {
    /// The raw `name` parameter of the `Content-Disposition` header.
    pub fn name(&self) -> Option<&[u8]> {
        self.headers.disposition.as_ref().and_then(|d| d.name.as_deref())
    }

    /// The raw `filename` parameter of the `Content-Disposition` header.
    pub fn filename(&self) -> Option<&[u8]> {
        self.headers.disposition.as_ref().and_then(|d| d.filename.as_deref())
    }

    /// Returns `true` if this part carries an uploaded file under the `file` form field.
    pub fn is_file_upload(&self) -> bool {
        let form_data = self.headers.disposition.as_ref().map_or(false, ContentDisposition::is_form_data);

        form_data
            && self.name() == Some(FILE_FIELD.as_bytes())
            && self.filename().map_or(false, |f| !f.is_empty())
            && self.headers.content_type.is_some()
    }
}

/// Iterator over the parts of a buffered multipart body.
///
/// Parts whose header block can't be parsed are skipped.
#[derive(Debug)]
pub struct Multipart<'a> {
    scanner: BoundaryScanner<'a>,
}

impl<'a> Multipart<'a> {
    /// Prepares to read the parts of `body`, delimited by `boundary`.
    ///
    /// `boundary` is the value of the `boundary` parameter of the request's `Content-Type`,
    /// without the leading dashes.
    pub fn with_body(body: &'a [u8], boundary: &str) -> Result<Multipart<'a>, MultipartError> {
        if boundary.is_empty() {
            return Err(MultipartError::Boundary("the boundary is empty".to_owned()));
        }

        if boundary.bytes().any(|b| b == b'\r' || b == b'\n') {
            return Err(MultipartError::Boundary(format!("{:?} contains a line break", boundary)));
        }

        debug!("Boundary: {}", boundary);

        Ok(Multipart { scanner: BoundaryScanner::new(body, boundary) })
    }
}

impl<'a> Iterator for Multipart<'a> {
    type Item = Part<'a>;

    fn next(&mut self) -> Option<Part<'a>> {
        while let Some(raw) = self.scanner.next_part() {
            match PartHeaders::parse(raw) {
                Some((headers, data)) => return Some(Part { headers, data }),
                None => debug!("Skipping a part with unreadable headers ({} bytes)", raw.len()),
            }
        }

        None
    }
}

/// Extracts the uploaded file from a buffered `multipart/form-data` body.
///
/// Returns `Ok(None)` if no part carries a file under the `file` field. Only the first such part
/// is considered; the others are ignored.
///
/// # Example
///
/// ```
/// let body = b"--XyZ\r\n\
///     Content-Disposition: form-data; name=\"file\"; filename=\"my%20file.txt\"\r\n\
///     Content-Type: text/plain\r\n\
///     \r\n\
///     hello\r\n\
///     --XyZ--\r\n";
///
/// let file = filedrop::extract_file(body, "XyZ").unwrap().unwrap();
/// assert_eq!(file.filename, "my file.txt");
/// assert_eq!(file.content_type, "text/plain");
/// ```
pub fn extract_file(body: &[u8], boundary: &str) -> Result<Option<ExtractedFile>, MultipartError> {
    for part in Multipart::with_body(body, boundary)? {
        if !part.is_file_upload() {
            debug!("Ignoring part {:?}", part.name().map(String::from_utf8_lossy));
            continue;
        }

        let filename = match part.filename() {
            Some(raw) => decode_filename(raw)?,
            None => continue,
        };

        let content_type = part.headers.content_type.clone().unwrap_or_default();

        debug!("Found file {:?} ({}, {} bytes)", filename, content_type, part.data.len());

        return Ok(Some(ExtractedFile {
            filename,
            content_type,
            payload: part.data.to_vec(),
        }));
    }

    Ok(None)
}

/// The filename must be valid UTF-8; percent-escapes that don't decode to UTF-8 are replaced.
fn decode_filename(raw: &[u8]) -> Result<String, MultipartError> {
    let raw = str::from_utf8(raw)?;
    Ok(percent_decode_str(raw).decode_utf8_lossy().into_owned())
}
