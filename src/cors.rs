// Copyright (c) 2024 The filedrop developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Cross-origin headers.
//!
//! Uploads come from pages served by other origins, so every response allows any origin to `POST`
//! with a `Content-Type` header.

use crate::Response;

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "POST, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type";

/// Adds the CORS headers to `response`, replacing any existing ones.
pub fn apply(response: Response) -> Response {
    response
        .with_unique_header("Access-Control-Allow-Origin", ALLOW_ORIGIN)
        .with_unique_header("Access-Control-Allow-Methods", ALLOW_METHODS)
        .with_unique_header("Access-Control-Allow-Headers", ALLOW_HEADERS)
}
