// Copyright (c) 2024 The filedrop developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

use std::error::Error;
use std::io;
use std::io::Read;
use std::net::SocketAddr;
use std::net::ToSocketAddrs;
use std::panic;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;

use log::{debug, error};

use crate::cors;
use crate::Request;
use crate::Response;

/// A listening server.
///
/// Every request is handed to the handler on a thread of its own. If the handler panics, the client
/// receives a 500 response carrying the CORS headers, and the other requests are not affected.
///
/// # Example
///
/// ```no_run
/// use filedrop::Server;
/// use filedrop::Response;
///
/// let server = Server::new("localhost:0", |request| {
///     Response::text("hello world")
/// }).unwrap();
/// println!("Listening on {:?}", server.server_addr());
/// server.run();
/// ```
pub struct Server<F> {
    server: tiny_http::Server,
    handler: Arc<AssertUnwindSafe<F>>,
}

impl<F> Server<F> where F: Send + Sync + 'static + Fn(&Request) -> Response {
    /// Builds a new `Server` object.
    ///
    /// After this function returns, the HTTP server is listening.
    ///
    /// Returns an error if there was an error while creating the listening socket, for example if
    /// the port is already in use.
    pub fn new<A>(addr: A, handler: F) -> Result<Server<F>, Box<dyn Error + Send + Sync>>
        where A: ToSocketAddrs
    {
        let server = tiny_http::Server::http(addr)?;

        Ok(Server {
            server,
            handler: Arc::new(AssertUnwindSafe(handler)),
        })
    }

    /// Returns the address of the listening socket.
    #[inline]
    pub fn server_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Runs the server forever, or until the listening socket is somehow force-closed by the
    /// operating system.
    #[inline]
    pub fn run(self) {
        for request in self.server.incoming_requests() {
            self.process(request);
        }
    }

    /// Processes all the client requests waiting to be processed, then returns.
    ///
    /// This function executes very quickly, as each client requests that needs to be processed
    /// is processed in a separate thread.
    #[inline]
    pub fn poll(&self) {
        while let Ok(Some(request)) = self.server.try_recv() {
            self.process(request);
        }
    }

    fn process(&self, request: tiny_http::Request) {
        let handler = self.handler.clone();

        thread::spawn(move || {
            let tiny_http_request;
            let request = {
                let url = request.url().to_owned();
                let method = request.method().as_str().to_owned();
                let headers = request.headers().iter()
                    .map(|h| (h.field.to_string(), h.value.as_str().to_owned()))
                    .collect();
                let remote_addr = request.remote_addr().copied()
                    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 0)));

                debug!("{} {} from {}", method, url, remote_addr);

                tiny_http_request = Arc::new(Mutex::new(Some(request)));
                let body = Box::new(RequestRead(tiny_http_request.clone()));

                Request::from_parts(method, url, headers, body, remote_addr)
            };

            let method = request.method().to_owned();
            let url = request.raw_url().to_owned();

            // The request isn't used anymore after a panic.
            let request = AssertUnwindSafe(request);
            let response = panic::catch_unwind(move || {
                let request = request;
                handler(&request)
            });

            let response = match response {
                Ok(r) => r,
                Err(_) => {
                    error!("The handler panicked while answering {} {}", method, url);
                    cors::apply(Response::text("Internal Server Error").with_status_code(500))
                }
            };

            let (res_data, res_len) = response.data.into_reader_and_size();
            let mut tiny_response = tiny_http::Response::empty(response.status_code)
                .with_data(res_data, res_len);

            for (key, value) in response.headers {
                if key.eq_ignore_ascii_case("Content-Length") {
                    continue;
                }

                match tiny_http::Header::from_bytes(key.as_bytes(), value.as_bytes()) {
                    Ok(header) => tiny_response.add_header(header),
                    Err(()) => debug!("Dropping invalid response header {:?}", key),
                }
            }

            let request = match tiny_http_request.lock() {
                Ok(mut r) => r.take(),
                Err(poisoned) => poisoned.into_inner().take(),
            };

            // Nothing can be done if the client went away.
            if let Some(request) = request {
                if let Err(err) = request.respond(tiny_response) {
                    debug!("Failed to send the response for {} {}: {}", method, url, err);
                }
            }
        });
    }
}

/// Puts a `tiny_http::Request` inside a `Box<dyn Read>`.
struct RequestRead(Arc<Mutex<Option<tiny_http::Request>>>);

impl Read for RequestRead {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut request = self.0.lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "request lock poisoned"))?;

        match request.as_mut() {
            Some(r) => r.as_reader().read(buf),
            None => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "request already answered")),
        }
    }
}
