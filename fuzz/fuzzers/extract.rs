// Copyright (c) 2024 The filedrop developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

#![no_main]

use filedrop::multipart::{Multipart, MultipartError};
use libfuzzer_sys::fuzz_target;

const BOUNDARY: &str = "--12--34--56";

fuzz_target!(|data: &[u8]| {
    if data.len() < BOUNDARY.len() {
        return;
    }

    // A lot of bodies will be malformed
    match filedrop::extract_file(data, BOUNDARY) {
        Ok(Some(file)) => assert!(file.payload.len() <= data.len()),
        Ok(None) | Err(MultipartError::Filename(_)) => (),
        Err(err) => panic!("This shouldn't have failed: {}", err),
    }

    let multipart = Multipart::with_body(data, BOUNDARY).expect("the boundary is valid");
    for part in multipart {
        assert!(part.data.len() <= data.len());
    }
});
