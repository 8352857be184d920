// Copyright (c) 2024 The filedrop developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

use std::io;

use crate::multipart::MultipartError;
use crate::Response;

quick_error! {
    /// Error that can happen while answering a `POST /save` request.
    #[derive(Debug)]
    pub enum UploadError {
        /// The `Content-Type` header is missing or does not declare `multipart/form-data`.
        UnsupportedContentType(content_type: Option<String>) {
            display("unsupported Content-Type: {:?}", content_type)
        }
        /// The body does not contain a `file` part.
        NoFileData {
            display("no file part in the multipart body")
        }
        /// The body of the request was already taken by someone else.
        BodyAlreadyExtracted {
            display("the request body was already extracted")
        }
        /// The multipart body or its boundary could not be processed.
        Multipart(err: MultipartError) {
            from()
            display("{}", err)
            cause(err)
        }
        /// Reading the body or writing the file failed.
        Io(err: io::Error) {
            from()
            display("I/O error: {}", err)
            cause(err)
        }
    }
}

impl UploadError {
    /// The status code sent back to the client for this error.
    pub fn status_code(&self) -> u16 {
        match *self {
            UploadError::UnsupportedContentType(_) | UploadError::NoFileData => 400,
            _ => 500,
        }
    }

    /// The plain text body sent back to the client for this error.
    pub fn message(&self) -> &'static str {
        match *self {
            UploadError::UnsupportedContentType(_) => "Unsupported Content-Type.",
            UploadError::NoFileData => "No file data found in the upload.",
            _ => "Error processing file upload.",
        }
    }

    /// Builds the response describing this error.
    pub fn to_response(&self) -> Response {
        Response::text(self.message()).with_status_code(self.status_code())
    }
}
