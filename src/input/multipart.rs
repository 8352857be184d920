// Copyright (c) 2024 The filedrop developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! The `Content-Type` gate and body buffering of `multipart/form-data` requests.

use std::io::Read;

use log::debug;
use mime::Mime;

use crate::multipart::{split_header_value, MultipartError};
use crate::Request;
use crate::UploadError;

/// Upper bound for the buffer reserved from `Content-Length` before reading.
const MAX_PREALLOCATION: usize = 16 * 1024 * 1024;

/// Extracts the boundary from the value of a `Content-Type` header.
///
/// Returns `UploadError::UnsupportedContentType` if there is no header or if its media type is not
/// `multipart/form-data`, and `UploadError::Multipart` if the boundary is missing or empty.
///
/// # Example
///
/// ```
/// use filedrop::input::multipart_boundary;
///
/// let boundary = multipart_boundary(Some("multipart/form-data; boundary=XyZ")).unwrap();
/// assert_eq!(boundary, "XyZ");
///
/// assert!(multipart_boundary(Some("application/json")).is_err());
/// ```
pub fn multipart_boundary(content_type: Option<&str>) -> Result<String, UploadError> {
    let header = match content_type {
        Some(h) => h,
        None => return Err(UploadError::UnsupportedContentType(None)),
    };

    if !is_form_data(header) {
        return Err(UploadError::UnsupportedContentType(Some(header.to_owned())));
    }

    let (_, params) = split_header_value(header.as_bytes());

    let boundary = params.into_iter()
        .find(|(key, _)| key == "boundary")
        .map(|(_, value)| value);

    let boundary = match boundary {
        Some(b) => String::from_utf8_lossy(&b).into_owned(),
        None => return Err(MultipartError::Boundary("no boundary parameter".to_owned()).into()),
    };

    if boundary.is_empty() {
        return Err(MultipartError::Boundary("the boundary is empty".to_owned()).into());
    }

    debug!("Multipart boundary: {}", boundary);
    Ok(boundary)
}

fn is_form_data(header: &str) -> bool {
    let essence = header.split(';').next().unwrap_or("").trim().to_ascii_lowercase();

    match essence.parse::<Mime>() {
        Ok(m) => m.type_() == mime::MULTIPART && m.subtype() == mime::FORM_DATA,
        Err(_) => false,
    }
}

/// A `POST /save` request that passed the `Content-Type` gate, with its body fully read.
#[derive(Debug)]
pub struct UploadRequest {
    /// The raw value of the `Content-Type` header.
    pub content_type: Option<String>,
    /// The declared `Content-Length`, or 0 if absent or unreadable.
    pub content_length: usize,
    /// The whole body of the request.
    pub body: Vec<u8>,
}

impl UploadRequest {
    /// Reads the whole body of `request` into memory.
    ///
    /// Returns `UploadError::BodyAlreadyExtracted` if the body was taken before.
    pub fn read(request: &Request) -> Result<UploadRequest, UploadError> {
        let content_length = request.header("Content-Length")
            .and_then(|len| len.trim().parse::<usize>().ok())
            .unwrap_or(0);

        let mut data = match request.data() {
            Some(d) => d,
            None => return Err(UploadError::BodyAlreadyExtracted),
        };

        let mut body = Vec::with_capacity(content_length.min(MAX_PREALLOCATION));
        data.read_to_end(&mut body)?;

        if content_length != 0 && body.len() != content_length {
            debug!("Declared Content-Length {} but read {} bytes", content_length, body.len());
        }

        Ok(UploadRequest {
            content_type: request.header("Content-Type").map(str::to_owned),
            content_length,
            body,
        })
    }
}
