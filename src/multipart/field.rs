// Copyright (c) 2024 The filedrop developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! `multipart` part header parsing.

use httparse::{Status, EMPTY_HEADER};
use log::debug;

/// Parts with more headers than this are skipped as unreadable. Browsers send two or three.
const MAX_PART_HEADERS: usize = 64;

/// The headers that (may) appear before the payload of a part.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PartHeaders {
    /// The `Content-Disposition` header, if present and readable.
    pub disposition: Option<ContentDisposition>,
    /// The raw `Content-Type` value, trimmed.
    pub content_type: Option<String>,
}

impl PartHeaders {
    /// Parses the header block at the start of `part`.
    ///
    /// Returns the headers along with the payload that follows the blank line, or `None` if the
    /// header block is malformed or never terminated.
    pub fn parse(part: &[u8]) -> Option<(PartHeaders, &[u8])> {
        let mut raw_headers = [EMPTY_HEADER; MAX_PART_HEADERS];

        let consumed = match httparse::parse_headers(part, &mut raw_headers) {
            Ok(Status::Complete((consumed, _))) => consumed,
            Ok(Status::Partial) => {
                debug!("Part header block is not terminated by a blank line");
                return None;
            },
            Err(err) => {
                debug!("Failed to parse part headers: {}", err);
                return None;
            },
        };

        let mut headers = PartHeaders::default();

        for header in raw_headers.iter().take_while(|h| !h.name.is_empty()) {
            if header.name.eq_ignore_ascii_case("Content-Disposition") {
                headers.disposition = ContentDisposition::parse(header.value);
            } else if header.name.eq_ignore_ascii_case("Content-Type") {
                headers.content_type = Some(String::from_utf8_lossy(trim(header.value)).into_owned());
            }
        }

        debug!("Parsed part headers: {:?}", headers);

        Some((headers, &part[consumed..]))
    }
}

/// The `Content-Disposition` header of a part.
///
/// Parameter values are kept as raw bytes: clients send them in whatever encoding they like.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentDisposition {
    /// The disposition type, lowercased (`form-data` for HTML forms).
    pub disposition_type: String,
    /// The `name` parameter: the name of the form field.
    pub name: Option<Vec<u8>>,
    /// The `filename` parameter, if the field carries a file.
    pub filename: Option<Vec<u8>>,
}

impl ContentDisposition {
    pub fn parse(value: &[u8]) -> Option<ContentDisposition> {
        let (disposition_type, params) = split_header_value(value);

        if disposition_type.is_empty() {
            debug!("Empty Content-Disposition value");
            return None;
        }

        let mut disposition = ContentDisposition {
            disposition_type: String::from_utf8_lossy(disposition_type).to_ascii_lowercase(),
            name: None,
            filename: None,
        };

        for (key, value) in params {
            match &key[..] {
                "name" if disposition.name.is_none() => disposition.name = Some(value),
                "filename" if disposition.filename.is_none() => disposition.filename = Some(value),
                _ => (),
            }
        }

        Some(disposition)
    }

    #[inline]
    pub fn is_form_data(&self) -> bool {
        self.disposition_type == "form-data"
    }
}

/// Splits a header value such as `form-data; name="file"` into its leading value and its
/// parameters.
///
/// Parameter names are lowercased. Quoted values run up to the next `"`; unquoted values run up to
/// the next `;` and are trimmed.
pub fn split_header_value(value: &[u8]) -> (&[u8], Vec<(String, Vec<u8>)>) {
    let first_end = value.iter().position(|&b| b == b';').unwrap_or(value.len());
    let first = trim(&value[..first_end]);

    let mut params = Vec::new();
    let mut rest = &value[first_end..];

    loop {
        rest = trim_start(rest);
        while let Some((&b';', tail)) = rest.split_first() {
            rest = trim_start(tail);
        }

        if rest.is_empty() {
            break;
        }

        let key_end = rest.iter().position(|&b| b == b'=' || b == b';').unwrap_or(rest.len());
        let key = String::from_utf8_lossy(trim(&rest[..key_end])).to_ascii_lowercase();
        rest = &rest[key_end..];

        let value = match rest.split_first() {
            Some((&b'=', tail)) => {
                let tail = trim_start(tail);

                match tail.split_first() {
                    Some((&b'"', quoted)) => {
                        let end = quoted.iter().position(|&b| b == b'"').unwrap_or(quoted.len());
                        rest = &quoted[(end + 1).min(quoted.len())..];
                        quoted[..end].to_vec()
                    },
                    _ => {
                        let end = tail.iter().position(|&b| b == b';').unwrap_or(tail.len());
                        rest = &tail[end..];
                        trim(&tail[..end]).to_vec()
                    },
                }
            },
            _ => Vec::new(),
        };

        // Anything between a closing quote and the next `;` is garbage.
        let garbage = rest.iter().position(|&b| b == b';').unwrap_or(rest.len());
        rest = &rest[garbage..];

        params.push((key, value));
    }

    (first, params)
}

fn is_whitespace(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

fn trim_start(s: &[u8]) -> &[u8] {
    let start = s.iter().position(|&b| !is_whitespace(b)).unwrap_or(s.len());
    &s[start..]
}

fn trim(s: &[u8]) -> &[u8] {
    let s = trim_start(s);
    let end = s.iter().rposition(|&b| !is_whitespace(b)).map_or(0, |idx| idx + 1);
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::{split_header_value, ContentDisposition, PartHeaders};

    #[test]
    fn parse_file_part_headers() {
        let part = b"Content-Disposition: form-data; name=\"file\"; filename=\"photo.png\"\r\n\
                     Content-Type: image/png\r\n\
                     \r\n\
                     \x89PNG";

        let (headers, payload) = PartHeaders::parse(part).unwrap();
        let disposition = headers.disposition.unwrap();

        assert!(disposition.is_form_data());
        assert_eq!(disposition.name.as_deref(), Some(&b"file"[..]));
        assert_eq!(disposition.filename.as_deref(), Some(&b"photo.png"[..]));
        assert_eq!(headers.content_type.as_deref(), Some("image/png"));
        assert_eq!(payload, b"\x89PNG");
    }

    #[test]
    fn header_names_are_case_insensitive() {
        let part = b"content-disposition: Form-Data; NAME=\"file\"; FileName=a.txt\r\n\
                     content-type:  text/plain \r\n\
                     \r\n\
                     abc";

        let (headers, payload) = PartHeaders::parse(part).unwrap();
        let disposition = headers.disposition.unwrap();

        assert!(disposition.is_form_data());
        assert_eq!(disposition.name.as_deref(), Some(&b"file"[..]));
        assert_eq!(disposition.filename.as_deref(), Some(&b"a.txt"[..]));
        assert_eq!(headers.content_type.as_deref(), Some("text/plain"));
        assert_eq!(payload, b"abc");
    }

    #[test]
    fn text_field_has_no_content_type() {
        let part = b"Content-Disposition: form-data; name=\"title\"\r\n\r\nhello";

        let (headers, payload) = PartHeaders::parse(part).unwrap();
        assert_eq!(headers.content_type, None);
        assert_eq!(headers.disposition.unwrap().filename, None);
        assert_eq!(payload, b"hello");
    }

    #[test]
    fn no_headers_at_all() {
        let (headers, payload) = PartHeaders::parse(b"\r\nraw").unwrap();
        assert_eq!(headers, PartHeaders::default());
        assert_eq!(payload, b"raw");
    }

    #[test]
    fn many_extra_headers() {
        let mut part = b"Content-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\
                         Content-Type: text/plain\r\n".to_vec();
        for i in 0..30 {
            part.extend_from_slice(format!("X-Extra-{}: {}\r\n", i, i).as_bytes());
        }
        part.extend_from_slice(b"\r\nabc");

        let (headers, payload) = PartHeaders::parse(&part).unwrap();
        assert_eq!(headers.content_type.as_deref(), Some("text/plain"));
        assert_eq!(headers.disposition.unwrap().filename.as_deref(), Some(&b"a.txt"[..]));
        assert_eq!(payload, b"abc");
    }

    #[test]
    fn unterminated_header_block() {
        assert!(PartHeaders::parse(b"Content-Disposition: form-data; name=\"file\"").is_none());
    }

    #[test]
    fn filename_is_not_mistaken_for_name() {
        let disposition = ContentDisposition::parse(b"form-data; filename=\"a.bin\"; name=\"upload\"").unwrap();
        assert_eq!(disposition.name.as_deref(), Some(&b"upload"[..]));
        assert_eq!(disposition.filename.as_deref(), Some(&b"a.bin"[..]));
    }

    #[test]
    fn quoted_values_keep_semicolons_and_spaces() {
        let (first, params) = split_header_value(b"form-data; name=\"file\"; filename=\" a;b .txt\"");
        assert_eq!(first, b"form-data");
        assert_eq!(params[0], ("name".to_owned(), b"file".to_vec()));
        assert_eq!(params[1], ("filename".to_owned(), b" a;b .txt".to_vec()));
    }

    #[test]
    fn empty_and_unterminated_values() {
        let (_, params) = split_header_value(b"form-data; name=\"file\"; filename=\"\"");
        assert_eq!(params[1], ("filename".to_owned(), Vec::new()));

        let (_, params) = split_header_value(b"form-data; name=\"fi");
        assert_eq!(params[0], ("name".to_owned(), b"fi".to_vec()));
    }
}
