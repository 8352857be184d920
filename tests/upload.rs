// Copyright (c) 2024 The filedrop developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

use std::fs;
use std::io::Read;
use std::path::Path;

use filedrop::config::Config;
use filedrop::{Request, Response, UploadService};
use rand::Rng;
use tempfile::TempDir;

const BOUNDARY: &str = "----WebKitFormBoundary7MA4YWxkTrZu0gW";

struct Fixture {
    uploads: TempDir,
    public: TempDir,
    service: UploadService,
}

fn fixture() -> Fixture {
    let _ = env_logger::try_init();

    let uploads = tempfile::tempdir().unwrap();
    let public = tempfile::tempdir().unwrap();

    let config = Config {
        upload_dir: uploads.path().to_owned(),
        static_root: public.path().to_owned(),
        ..Config::default()
    };

    Fixture {
        service: UploadService::new(&config),
        uploads,
        public,
    }
}

fn form_body(filename: &str, content_type: &str, payload: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"title\"\r\n\
         \r\n\
         holiday\r\n\
         --{b}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\n\
         Content-Type: {c}\r\n\
         \r\n",
        b = BOUNDARY, f = filename, c = content_type
    ).into_bytes();
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn post(url: &str, content_type: Option<&str>, body: Vec<u8>) -> Request {
    let mut headers = vec![("Content-Length".to_owned(), body.len().to_string())];
    if let Some(c) = content_type {
        headers.push(("Content-Type".to_owned(), c.to_owned()));
    }
    Request::fake_http("POST", url, headers, body)
}

fn multipart_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

fn body_of(response: Response) -> String {
    let (mut reader, _) = response.data.into_reader_and_size();
    let mut out = String::new();
    reader.read_to_string(&mut out).unwrap();
    out
}

fn assert_cors(response: &Response) {
    assert_eq!(response.header("Access-Control-Allow-Origin"), Some("*"));
    assert_eq!(response.header("Access-Control-Allow-Methods"), Some("POST, OPTIONS"));
    assert_eq!(response.header("Access-Control-Allow-Headers"), Some("Content-Type"));
}

fn uploaded_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(dir).unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn upload_is_saved() {
    let fixture = fixture();
    let payload = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR\x00\x00";

    let request = post("/save", Some(&multipart_type()), form_body("photo.png", "image/png", payload));
    let response = fixture.service.handle(&request);

    assert_eq!(response.status_code, 200);
    assert_cors(&response);
    assert_eq!(response.header("Content-Type"), Some("text/plain; charset=utf-8"));
    assert_eq!(body_of(response), format!("File \"photo.png\" has been uploaded and saved to \"{}\".",
                                          fixture.uploads.path().display()));

    assert_eq!(fs::read(fixture.uploads.path().join("photo.png")).unwrap(), payload.to_vec());
}

#[test]
fn percent_encoded_filename() {
    let fixture = fixture();

    let request = post("/save", Some(&multipart_type()), form_body("my%20file.txt", "text/plain", b"hi"));
    let response = fixture.service.handle(&request);

    assert_eq!(response.status_code, 200);
    assert_eq!(uploaded_files(fixture.uploads.path()), vec!["my file.txt".to_owned()]);
}

#[test]
fn random_binary_payload() {
    let fixture = fixture();

    let mut payload = vec![0u8; 256 * 1024];
    rand::thread_rng().fill(&mut payload[..]);

    let request = post("/save", Some(&multipart_type()), form_body("blob.bin", "application/octet-stream", &payload));
    assert_eq!(fixture.service.handle(&request).status_code, 200);

    assert_eq!(fs::read(fixture.uploads.path().join("blob.bin")).unwrap(), payload);
}

#[test]
fn query_string_is_ignored() {
    let fixture = fixture();

    let request = post("/save?from=form", Some(&multipart_type()), form_body("a.txt", "text/plain", b"a"));
    assert_eq!(fixture.service.handle(&request).status_code, 200);
}

#[test]
fn unsupported_content_type() {
    let fixture = fixture();

    for content_type in &[Some("application/json"), None] {
        let request = post("/save", *content_type, b"{\"file\": \"photo.png\"}".to_vec());
        let response = fixture.service.handle(&request);

        assert_eq!(response.status_code, 400);
        assert_cors(&response);
        assert_eq!(body_of(response), "Unsupported Content-Type.");
    }

    assert!(uploaded_files(fixture.uploads.path()).is_empty());
}

#[test]
fn no_file_part() {
    let fixture = fixture();

    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nholiday\r\n--{b}--\r\n",
        b = BOUNDARY
    ).into_bytes();

    let response = fixture.service.handle(&post("/save", Some(&multipart_type()), body));
    assert_eq!(response.status_code, 400);
    assert_eq!(body_of(response), "No file data found in the upload.");
}

#[test]
fn missing_boundary() {
    let fixture = fixture();

    let body = form_body("photo.png", "image/png", b"x");
    let response = fixture.service.handle(&post("/save", Some("multipart/form-data"), body));

    assert_eq!(response.status_code, 500);
    assert_cors(&response);
    assert_eq!(body_of(response), "Error processing file upload.");
}

#[test]
fn options_preflight() {
    let fixture = fixture();

    for url in &["/save", "/anything/else"] {
        let response = fixture.service.handle(&Request::fake_http("OPTIONS", *url, vec![], vec![]));
        assert_eq!(response.status_code, 200);
        assert_cors(&response);
        assert_eq!(body_of(response), "");
    }
}

#[test]
fn unsupported_methods() {
    let fixture = fixture();

    let response = fixture.service.handle(&post("/upload", Some(&multipart_type()), form_body("a.txt", "text/plain", b"a")));
    assert_eq!(response.status_code, 501);
    assert_cors(&response);
    assert_eq!(body_of(response), "Unsupported method ('POST')");

    let response = fixture.service.handle(&Request::fake_http("DELETE", "/save", vec![], vec![]));
    assert_eq!(response.status_code, 501);
    assert_eq!(body_of(response), "Unsupported method ('DELETE')");

    assert!(uploaded_files(fixture.uploads.path()).is_empty());
}

#[test]
fn static_files() {
    let fixture = fixture();
    fs::write(fixture.public.path().join("index.html"), "<form></form>").unwrap();

    let response = fixture.service.handle(&Request::fake_http("GET", "/", vec![], vec![]));
    assert_eq!(response.status_code, 200);
    assert_cors(&response);
    assert_eq!(body_of(response), "<form></form>");

    let response = fixture.service.handle(&Request::fake_http("GET", "/missing.js", vec![], vec![]));
    assert_eq!(response.status_code, 404);
}

#[test]
fn unclosed_body_is_not_saved() {
    let fixture = fixture();

    let mut body = form_body("photo.png", "image/png", b"abc");
    let cut = body.len() - b"--\r\n".len();
    body.truncate(cut);

    let response = fixture.service.handle(&post("/save", Some(&multipart_type()), body));
    assert_eq!(response.status_code, 400);
    assert_eq!(body_of(response), "No file data found in the upload.");
    assert!(uploaded_files(fixture.uploads.path()).is_empty());
}
