// SPDX-License-Identifier: MPL-2.0
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use image_hd::web::runner::EnhancerCommand;
use image_hd::web::{router, ServerContext};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

const BOUNDARY: &str = "image-hd-test-boundary";

struct Part<'a> {
    name: &'a str,
    filename: Option<&'a str>,
    data: &'a [u8],
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part.filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                    part.name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name).as_bytes(),
            ),
        }
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn process_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/process")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

struct Harness {
    dir: TempDir,
    context: ServerContext,
}

impl Harness {
    fn new(program: PathBuf) -> Self {
        let dir = tempdir().expect("failed to create temp dir");
        let context = ServerContext {
            input_dir: dir.path().join("input"),
            output_dir: dir.path().join("output"),
            enhancer: EnhancerCommand {
                program,
                config: None,
                timeout: Duration::from_secs(30),
                debug_log: None,
            },
            max_upload_bytes: 1024 * 1024,
        };
        Self { dir, context }
    }

    fn app(&self) -> Router {
        router(self.context.clone())
    }

    fn input_files(&self) -> usize {
        std::fs::read_dir(&self.context.input_dir).map_or(0, Iterator::count)
    }
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("response should be JSON")
}

async fn error_of(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = json_body(response).await;
    (status, body["error"].as_str().unwrap_or_default().to_string())
}

fn png_bytes() -> Vec<u8> {
    let mut bytes = std::io::Cursor::new(Vec::new());
    image_rs::RgbImage::from_pixel(3, 3, image_rs::Rgb([120, 120, 120]))
        .write_to(&mut bytes, image_rs::ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}

#[tokio::test]
async fn index_serves_upload_page() {
    let harness = Harness::new(PathBuf::from("/nonexistent/image_hd"));
    let response = harness.app().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&body).contains("<form"));
}

#[tokio::test]
async fn missing_file_part_is_rejected() {
    let harness = Harness::new(PathBuf::from("/nonexistent/image_hd"));
    let request = process_request(&[Part {
        name: "mode",
        filename: None,
        data: b"enhance",
    }]);
    assert_eq!(
        error_of(harness.app(), request).await,
        (StatusCode::BAD_REQUEST, "No file uploaded".to_string())
    );
}

#[tokio::test]
async fn empty_filename_is_rejected() {
    let harness = Harness::new(PathBuf::from("/nonexistent/image_hd"));
    let request = process_request(&[Part {
        name: "file",
        filename: Some(""),
        data: b"",
    }]);
    assert_eq!(
        error_of(harness.app(), request).await,
        (StatusCode::BAD_REQUEST, "No file selected".to_string())
    );
}

#[tokio::test]
async fn unsupported_extension_writes_nothing() {
    let harness = Harness::new(PathBuf::from("/nonexistent/image_hd"));
    let request = process_request(&[Part {
        name: "file",
        filename: Some("anim.gif"),
        data: b"GIF89a",
    }]);
    assert_eq!(
        error_of(harness.app(), request).await,
        (StatusCode::BAD_REQUEST, "Unsupported file format".to_string())
    );
    assert_eq!(harness.input_files(), 0);
}

#[tokio::test]
async fn invalid_scale_is_rejected() {
    let harness = Harness::new(PathBuf::from("/nonexistent/image_hd"));
    let png = png_bytes();
    let request = process_request(&[
        Part {
            name: "file",
            filename: Some("a.png"),
            data: &png,
        },
        Part {
            name: "scale",
            filename: None,
            data: b"8",
        },
    ]);
    let (status, message) = error_of(harness.app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(message.contains("scale"));
    assert_eq!(harness.input_files(), 0);
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let mut harness = Harness::new(PathBuf::from("/nonexistent/image_hd"));
    harness.context.max_upload_bytes = 512;
    let big = vec![0u8; 4096];
    let request = process_request(&[Part {
        name: "file",
        filename: Some("big.png"),
        data: &big,
    }]);
    let response = harness.app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn download_rejects_traversal_and_missing_files() {
    let harness = Harness::new(PathBuf::from("/nonexistent/image_hd"));
    std::fs::create_dir_all(&harness.context.output_dir).unwrap();
    std::fs::write(harness.dir.path().join("secret.png"), b"x").unwrap();

    for uri in ["/download/..%2Fsecret.png", "/preview/..%2Fsecret.png", "/download/nope.png"] {
        let response = harness.app().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[cfg(unix)]
mod with_fake_enhancer {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    fn write_script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake_image_hd");
        std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn upload(png: &[u8]) -> Request<Body> {
        process_request(&[
            Part {
                name: "file",
                filename: Some("old photo.png"),
                data: png,
            },
            Part {
                name: "mode",
                filename: None,
                data: b"enhance",
            },
            Part {
                name: "scale",
                filename: None,
                data: b"2",
            },
        ])
    }

    #[tokio::test]
    async fn successful_job_is_downloadable_and_input_removed() {
        let tools = tempdir().unwrap();
        let script = write_script(
            tools.path(),
            "[ \"$3\" = --mode ] && [ \"$4\" = enhance ] && [ \"$6\" = 2 ] || exit 9\ncp \"$1\" \"$2\"\n",
        );
        let harness = Harness::new(script);
        let png = png_bytes();

        let response = harness.app().oneshot(upload(&png)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        let name = body["output_file"].as_str().unwrap().to_string();
        assert!(name.starts_with("old_photo_"), "{name}");
        assert!(name.ends_with("_output.png"), "{name}");
        assert_eq!(harness.input_files(), 0);

        let response = harness
            .app()
            .oneshot(get(&format!("/download/{name}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            format!("attachment; filename=\"hd_{name}\"").as_str()
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(bytes.as_ref(), png.as_slice());

        let response = harness
            .app()
            .oneshot(get(&format!("/preview/{name}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::CONTENT_DISPOSITION).is_none());
    }

    #[tokio::test]
    async fn failing_enhancer_reports_stderr() {
        let tools = tempdir().unwrap();
        let script = write_script(tools.path(), "echo '[ERROR] model missing' >&2\nexit 1\n");
        let harness = Harness::new(script);

        let (status, message) = error_of(harness.app(), upload(&png_bytes())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Processing failed: [ERROR] model missing");
        assert_eq!(harness.input_files(), 0);
    }

    #[tokio::test]
    async fn missing_output_reports_stdout() {
        let tools = tempdir().unwrap();
        let script = write_script(tools.path(), "echo 'nothing written'\n");
        let harness = Harness::new(script);

        let (status, message) = error_of(harness.app(), upload(&png_bytes())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Failed: nothing written");
    }

    #[tokio::test]
    async fn slow_enhancer_times_out() {
        let tools = tempdir().unwrap();
        let script = write_script(tools.path(), "sleep 30\n");
        let mut harness = Harness::new(script);
        harness.context.enhancer.timeout = Duration::from_millis(300);

        let (status, message) = error_of(harness.app(), upload(&png_bytes())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Processing timed out");
        assert_eq!(harness.input_files(), 0);
    }
}
