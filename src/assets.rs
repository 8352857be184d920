// Copyright (c) 2024 The filedrop developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Serving static files for `GET` and `HEAD` requests.

use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

use log::debug;

use crate::Request;
use crate::Response;

/// Searches inside `root` for a file that matches the URL of the request.
///
/// A directory is served through its `index.html`. Returns a 404 response if nothing matches, or
/// if the URL would resolve to something outside of `root` (for example `/../../foo.txt`).
///
/// The `Content-Type` is guessed from the extension of the file.
///
/// # Example
///
/// ```no_run
/// use filedrop::{Request, Response};
///
/// fn handle(request: &Request) -> Response {
///     filedrop::assets::match_assets(request, "public")
/// }
/// ```
pub fn match_assets<P>(request: &Request, root: P) -> Response where P: AsRef<Path> {
    let path = match find_asset(&request.url(), root.as_ref()) {
        Some(p) => p,
        None => return not_found(),
    };

    let file = match File::open(&path) {
        Ok(f) => f,
        Err(err) => {
            debug!("Could not open {}: {}", path.display(), err);
            return not_found();
        }
    };

    Response::from_file(content_type(&path), file)
}

/// Resolves the decoded URL path to an existing file under `root`.
fn find_asset(url: &str, root: &Path) -> Option<PathBuf> {
    let root = fs::canonicalize(root).ok()?;
    let potential = root.join(url.trim_start_matches('/'));

    let mut path = fs::canonicalize(&potential).ok()?;
    if !path.starts_with(&root) {
        debug!("Refusing {:?}: outside of {}", url, root.display());
        return None;
    }

    if path.is_dir() {
        path.push("index.html");
    }

    if path.is_file() {
        Some(path)
    } else {
        None
    }
}

/// Text types are declared as UTF-8.
fn content_type(path: &Path) -> String {
    let guess = mime_guess::from_path(path).first_or_octet_stream();

    if guess.type_() == mime::TEXT && guess.get_param(mime::CHARSET).is_none() {
        format!("{}; charset=utf-8", guess)
    } else {
        guess.to_string()
    }
}

fn not_found() -> Response {
    Response::text("File not found").with_status_code(404)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Read;

    use super::match_assets;
    use crate::Request;

    fn body(response: crate::Response) -> String {
        let (mut reader, _) = response.data.into_reader_and_size();
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn serves_file_with_guessed_type() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("hello.txt"), "hello").unwrap();
        fs::write(dir.path().join("data.bin"), [0u8, 1, 2]).unwrap();

        let response = match_assets(&Request::fake_http("GET", "/hello.txt", vec![], vec![]), dir.path());
        assert_eq!(response.status_code, 200);
        assert_eq!(response.header("Content-Type"), Some("text/plain; charset=utf-8"));
        assert_eq!(body(response), "hello");

        let response = match_assets(&Request::fake_http("GET", "/data.bin", vec![], vec![]), dir.path());
        assert_eq!(response.header("Content-Type"), Some("application/octet-stream"));
    }

    #[test]
    fn directory_index() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("index.html"), "<h1>upload</h1>").unwrap();

        let response = match_assets(&Request::fake_http("GET", "/", vec![], vec![]), dir.path());
        assert_eq!(response.status_code, 200);
        assert_eq!(response.header("Content-Type"), Some("text/html; charset=utf-8"));

        let response = match_assets(&Request::fake_http("GET", "/docs/", vec![], vec![]), dir.path());
        assert_eq!(response.status_code, 404);
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let response = match_assets(&Request::fake_http("GET", "/nope.txt", vec![], vec![]), dir.path());
        assert_eq!(response.status_code, 404);
        assert_eq!(body(response), "File not found");
    }

    #[test]
    fn stays_inside_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("public");
        fs::create_dir(&root).unwrap();
        fs::write(dir.path().join("secret.txt"), "secret").unwrap();

        for url in &["/../secret.txt", "/%2E%2E/secret.txt"] {
            let response = match_assets(&Request::fake_http("GET", *url, vec![], vec![]), &root);
            assert_eq!(response.status_code, 404, "{}", url);
        }
    }

    #[test]
    fn query_string_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.js"), "let x;").unwrap();

        let response = match_assets(&Request::fake_http("GET", "/app.js?v=3", vec![], vec![]), dir.path());
        assert_eq!(response.status_code, 200);
    }
}
