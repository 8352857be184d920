// Copyright (c) 2024 The filedrop developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! filedrop is a small HTTP receiver for `multipart/form-data` uploads.
//!
//! A client posts a form containing a `file` field to `/save`; the embedded file is extracted
//! from the request body and written to the upload directory:
//!
//! ```no_run
//! use filedrop::config::Config;
//! use filedrop::{Server, UploadService};
//!
//! let config = Config::default();
//! let service = UploadService::new(&config);
//!
//! let server = Server::new(config.addr(), move |request| service.handle(request)).unwrap();
//! server.run();
//! ```
//!
//! # Extracting a file
//!
//! The parsing itself lives in [the `multipart` module](multipart/index.html) and is a pure
//! function of the buffered body and the boundary declared in the `Content-Type` header:
//!
//! ```
//! let body = b"--XyZ\r\n\
//!     Content-Disposition: form-data; name=\"file\"; filename=\"notes.txt\"\r\n\
//!     Content-Type: text/plain\r\n\
//!     \r\n\
//!     hello\r\n\
//!     --XyZ--\r\n";
//!
//! let file = filedrop::extract_file(body, "XyZ").unwrap().unwrap();
//! assert_eq!(file.filename, "notes.txt");
//! assert_eq!(file.payload, b"hello");
//! ```
//!
//! # Answering requests
//!
//! [`UploadService`](struct.UploadService.html) routes every request: `OPTIONS` preflights,
//! `POST /save` uploads and `GET` requests for static files. All of its responses carry the
//! CORS headers from [the `cors` module](cors/index.html).

#![deny(unsafe_code)]

#[macro_use]
extern crate quick_error;

pub use crate::error::UploadError;
pub use crate::multipart::{extract_file, ExtractedFile};
pub use crate::response::{Response, ResponseBody};
pub use crate::server::Server;
pub use crate::upload::UploadService;

use std::io::Cursor;
use std::io::Read;
use std::io::Result as IoResult;
use std::marker::PhantomData;
use std::net::SocketAddr;
use std::sync::Mutex;

use percent_encoding::percent_decode;

pub mod assets;
pub mod config;
pub mod cors;
pub mod input;
pub mod log;
pub mod multipart;
pub mod save;
pub mod upload;

mod error;
mod response;
mod server;

/// Represents a request that the handler must answer to.
///
/// This can be either a real request (received by the HTTP server) or a mock object created with
/// `fake_http`.
pub struct Request {
    method: String,
    url: String,
    headers: Vec<(String, String)>,
    data: Mutex<Option<Box<dyn Read + Send>>>,
    remote_addr: SocketAddr,
}

impl Request {
    /// Builds a fake HTTP request to be used during tests.
    ///
    /// The remote address of the client will be `127.0.0.1:12345`.
    pub fn fake_http<U, M>(method: M, url: U, headers: Vec<(String, String)>, data: Vec<u8>)
                           -> Request where U: Into<String>, M: Into<String>
    {
        Request {
            method: method.into(),
            url: url.into(),
            headers,
            data: Mutex::new(Some(Box::new(Cursor::new(data)))),
            remote_addr: SocketAddr::from(([127, 0, 0, 1], 12345)),
        }
    }

    pub(crate) fn from_parts(method: String, url: String, headers: Vec<(String, String)>,
                             data: Box<dyn Read + Send>, remote_addr: SocketAddr) -> Request
    {
        Request {
            method,
            url,
            headers,
            data: Mutex::new(Some(data)),
            remote_addr,
        }
    }

    /// Returns the method of the request (`GET`, `POST`, etc.).
    #[inline]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the raw URL requested by the client. It is not decoded and thus can contain strings
    /// such as `%20`, and the query parameters such as `?p=hello`.
    ///
    /// See also `url()`.
    #[inline]
    pub fn raw_url(&self) -> &str {
        &self.url
    }

    /// Returns the URL requested by the client.
    ///
    /// Contrary to `raw_url`, special characters have been decoded and the query string
    /// (eg `?p=hello`) has been removed.
    ///
    /// If there is any non-unicode character in the URL, it will be replaced with `U+FFFD`.
    ///
    /// # Example
    ///
    /// ```
    /// use filedrop::Request;
    ///
    /// let request = Request::fake_http("GET", "/hello%20world?foo=bar", vec![], vec![]);
    /// assert_eq!(request.url(), "/hello world");
    /// ```
    pub fn url(&self) -> String {
        let url = self.url.as_bytes();
        let url = if let Some(pos) = url.iter().position(|&c| c == b'?') {
            &url[..pos]
        } else {
            url
        };

        percent_decode(url).decode_utf8_lossy().into_owned()
    }

    /// Returns the value of a header of the request.
    ///
    /// Returns `None` if no such header could be found.
    #[inline]
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| &v[..])
    }

    /// Returns the body of the request.
    ///
    /// The body can only be retrieved once. Returns `None` is the body has already been retrieved
    /// before.
    pub fn data(&self) -> Option<RequestBody> {
        let reader = self.data.lock().ok().and_then(|mut data| data.take());
        reader.map(|r| RequestBody { body: r, marker: PhantomData })
    }

    /// Returns the address of the client that made this request.
    #[inline]
    pub fn remote_addr(&self) -> &SocketAddr {
        &self.remote_addr
    }
}

/// Gives access to the body of a request.
///
/// In order to obtain this object, call `request.data()`.
pub struct RequestBody<'a> {
    body: Box<dyn Read + Send>,
    marker: PhantomData<&'a ()>,
}

impl<'a> Read for RequestBody<'a> {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        self.body.read(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::Request;
    use std::io::Read;

    #[test]
    fn header() {
        let request = Request::fake_http("GET", "/", vec![("Content-Type".to_owned(), "text/plain".to_owned())], vec![]);
        assert_eq!(request.header("Content-Type"), Some("text/plain"));
        assert_eq!(request.header("content-type"), Some("text/plain"));
        assert_eq!(request.header("Content-Length"), None);
    }

    #[test]
    fn body_twice() {
        let request = Request::fake_http("POST", "/save", vec![], vec![62, 62, 62]);

        let mut body = Vec::new();
        request.data().unwrap().read_to_end(&mut body).unwrap();
        assert_eq!(body, vec![62, 62, 62]);

        assert!(request.data().is_none());
    }

    #[test]
    fn url_strips_query() {
        let request = Request::fake_http("POST", "/save?p=hello", vec![], vec![]);
        assert_eq!(request.url(), "/save");
        assert_eq!(request.raw_url(), "/save?p=hello");
    }

    #[test]
    fn url_encode() {
        let request = Request::fake_http("GET", "/hello%20world", vec![], vec![]);
        assert_eq!(request.url(), "/hello world");
    }

    #[test]
    fn plus_in_url() {
        let request = Request::fake_http("GET", "/hello+world", vec![], vec![]);
        assert_eq!(request.url(), "/hello+world");
    }
}
