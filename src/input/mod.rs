// Copyright (c) 2024 The filedrop developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Reading the input of an upload request.
//!
//! Before the body of a `POST /save` request is looked at, its `Content-Type` header must declare
//! `multipart/form-data` along with a boundary. See [`multipart_boundary`](fn.multipart_boundary.html).

pub use self::multipart::{multipart_boundary, UploadRequest};

pub mod multipart;
