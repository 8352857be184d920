// Copyright (c) 2024 The filedrop developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Writing uploaded files to the upload directory.
//!
//! ### Warning: Do **not** trust user input!
//! The filename chosen by the client is joined onto the upload directory as-is. A filename such
//! as `../app.js` or `/etc/motd` escapes the directory and overwrites whatever the server process
//! is allowed to write. Such names are logged at the `warn` level but still honored, so run the
//! server under a user with restricted permissions.

use std::fs;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use log::warn;

use crate::ExtractedFile;

/// The result of writing an uploaded file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedFile {
    /// The path the file was written to.
    pub path: PathBuf,
    /// The filename sent by the client.
    pub filename: String,
    /// The number of bytes written.
    pub size: u64,
}

/// Creates `dir` if it does not exist yet.
///
/// Returns `true` if the directory was created, `false` if it was already there.
pub fn ensure_dir<P>(dir: P) -> io::Result<bool> where P: AsRef<Path> {
    let dir = dir.as_ref();

    if dir.is_dir() {
        return Ok(false);
    }

    fs::create_dir_all(dir)?;
    Ok(true)
}

/// Writes `file` to `dir`, under the filename sent by the client.
///
/// An existing file with the same name is truncated and overwritten. Parent directories are
/// not created.
pub fn save_in<P>(dir: P, file: &ExtractedFile) -> io::Result<SavedFile> where P: AsRef<Path> {
    if !is_plain_filename(&file.filename) {
        warn!("Filename {:?} is not a plain file name; it may be written outside of {}",
              file.filename, dir.as_ref().display());
    }

    let path = dir.as_ref().join(&file.filename);

    let mut out = OpenOptions::new().write(true).create(true).truncate(true).open(&path)?;
    out.write_all(&file.payload)?;
    out.flush()?;

    Ok(SavedFile {
        path,
        filename: file.filename.clone(),
        size: file.payload.len() as u64,
    })
}

/// Returns `true` if `filename` is a single, normal path component.
pub fn is_plain_filename(filename: &str) -> bool {
    let mut components = Path::new(filename).components();

    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => true,
        _ => false,
    }
}
