// Copyright (c) 2024 The filedrop developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Answering requests.

use std::path::{Path, PathBuf};

use log::{error, info, warn};

use crate::assets;
use crate::config::Config;
use crate::cors;
use crate::input::{multipart_boundary, UploadRequest};
use crate::multipart::extract_file;
use crate::save::{self, SavedFile};
use crate::Request;
use crate::Response;
use crate::UploadError;

/// The path uploads are posted to.
pub const SAVE_PATH: &str = "/save";

/// The request handler of the server.
///
/// # Example
///
/// ```
/// use filedrop::config::Config;
/// use filedrop::{Request, UploadService};
///
/// let service = UploadService::new(&Config::default());
///
/// let request = Request::fake_http("OPTIONS", "/save", vec![], vec![]);
/// let response = service.handle(&request);
/// assert_eq!(response.status_code, 200);
/// assert_eq!(response.header("Access-Control-Allow-Origin"), Some("*"));
/// ```
#[derive(Clone, Debug)]
pub struct UploadService {
    upload_dir: PathBuf,
    static_root: PathBuf,
}

impl UploadService {
    pub fn new(config: &Config) -> UploadService {
        UploadService {
            upload_dir: config.upload_dir.clone(),
            static_root: config.static_root.clone(),
        }
    }

    /// The directory uploaded files are written to.
    #[inline]
    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Answers `request`. Every response carries the CORS headers, and an access log entry is
    /// written for each request.
    pub fn handle(&self, request: &Request) -> Response {
        crate::log::log(request, || cors::apply(self.route(request)))
    }

    fn route(&self, request: &Request) -> Response {
        match request.method() {
            "OPTIONS" => Response::empty(200),
            "POST" if request.url() == SAVE_PATH => self.save(request),
            "GET" | "HEAD" => assets::match_assets(request, &self.static_root),
            method => unsupported_method(method),
        }
    }

    fn save(&self, request: &Request) -> Response {
        match self.try_save(request) {
            Ok(saved) => {
                info!("Successfully saved file: {} to {}", saved.filename, saved.path.display());
                Response::text(format!("File \"{}\" has been uploaded and saved to \"{}\".",
                                       saved.filename, self.upload_dir.display()))
            },
            Err(err) => {
                match err {
                    UploadError::UnsupportedContentType(ref content_type) => {
                        warn!("Received POST to /save with unsupported Content-Type: {}",
                              content_type.as_deref().unwrap_or(""));
                    },
                    UploadError::NoFileData => {
                        warn!("Could not find file data in the multipart form.");
                    },
                    ref err => {
                        error!("Error processing multipart/form-data: {}", err);
                    },
                }

                err.to_response()
            },
        }
    }

    fn try_save(&self, request: &Request) -> Result<SavedFile, UploadError> {
        let boundary = multipart_boundary(request.header("Content-Type"))?;
        let upload = UploadRequest::read(request)?;

        let file = match extract_file(&upload.body, &boundary)? {
            Some(f) => f,
            None => return Err(UploadError::NoFileData),
        };

        Ok(save::save_in(&self.upload_dir, &file)?)
    }
}

fn unsupported_method(method: &str) -> Response {
    Response::text(format!("Unsupported method ('{}')", method)).with_status_code(501)
}
