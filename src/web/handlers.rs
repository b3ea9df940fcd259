// SPDX-License-Identifier: MPL-2.0
//! Route handlers.

use super::error::{WebError, WebResult};
use super::job::{self, JobFiles};
use super::runner::RunError;
use super::AppState;
use crate::domain::{EnhanceMode, ScaleFactor};
use axum::extract::{Multipart, Path as UrlPath, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use rust_embed::RustEmbed;
use serde::Serialize;
use std::path::Path;

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Asset;

/// Body of a successful `/process` response.
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub success: bool,
    pub output_file: String,
    pub message: String,
}

/// A decoded `/process` form.
struct UploadForm {
    file: Option<(String, axum::body::Bytes)>,
    mode: EnhanceMode,
    scale: ScaleFactor,
}

pub async fn index() -> Response {
    match Asset::get("index.html") {
        Some(page) => Html(page.data.into_owned()).into_response(),
        None => (StatusCode::NOT_FOUND, "index.html not embedded").into_response(),
    }
}

async fn read_form(multipart: &mut Multipart) -> WebResult<UploadForm> {
    let mut form = UploadForm {
        file: None,
        mode: EnhanceMode::default(),
        scale: ScaleFactor::default(),
    };

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_owned();
                let data = field.bytes().await?;
                form.file = Some((filename, data));
            }
            Some("mode") => {
                form.mode = field
                    .text()
                    .await?
                    .parse::<EnhanceMode>()
                    .map_err(|e| WebError::bad_request(e.to_string()))?;
            }
            Some("scale") => {
                form.scale = field
                    .text()
                    .await?
                    .parse::<ScaleFactor>()
                    .map_err(|e| WebError::bad_request(e.to_string()))?;
            }
            _ => {}
        }
    }
    Ok(form)
}

/// `POST /process`: stores the upload, runs the enhancer on it and reports
/// the name of the result.
pub async fn process(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> WebResult<Json<ProcessResponse>> {
    let form = read_form(&mut multipart).await?;
    let (filename, data) = form.file.ok_or(WebError::NoFile)?;
    if filename.is_empty() {
        return Err(WebError::EmptyFilename);
    }
    let ext = job::allowed_extension(&filename).ok_or(WebError::UnsupportedFormat)?;

    tokio::fs::create_dir_all(&state.input_dir).await?;
    tokio::fs::create_dir_all(&state.output_dir).await?;

    let job = JobFiles::new(&state.input_dir, &state.output_dir, &filename, &ext, &job::job_id());
    tokio::fs::write(job.input(), &data).await?;
    tracing::info!(
        upload = %filename,
        bytes = data.len(),
        mode = %form.mode,
        scale = %form.scale,
        "received upload"
    );

    let result = state
        .enhancer
        .run(job.input(), job.output(), form.mode, form.scale)
        .await;

    let output = match result {
        Ok(output) => output,
        Err(RunError::Timeout(_)) => return Err(WebError::Timeout),
        Err(e @ RunError::Spawn { .. }) => return Err(WebError::Internal(e.to_string())),
    };

    if !output.success {
        return Err(WebError::ProcessFailed(output.failure_message()));
    }
    if !job.output().exists() {
        let stdout = output.stdout.trim();
        let detail = if stdout.is_empty() {
            "output file not found"
        } else {
            stdout
        };
        return Err(WebError::OutputMissing(detail.to_string()));
    }

    Ok(Json(ProcessResponse {
        success: true,
        output_file: job.output_name().to_string(),
        message: "Image processed successfully!".to_string(),
    }))
}

/// `GET /download/{filename}`: the result as an attachment.
pub async fn download(
    State(state): State<AppState>,
    UrlPath(filename): UrlPath<String>,
) -> WebResult<Response> {
    let disposition = format!(
        "attachment; filename=\"{}{filename}\"",
        crate::config::defaults::DOWNLOAD_NAME_PREFIX
    );
    serve_output(&state, &filename, Some(disposition)).await
}

/// `GET /preview/{filename}`: the result for inline display.
pub async fn preview(
    State(state): State<AppState>,
    UrlPath(filename): UrlPath<String>,
) -> WebResult<Response> {
    serve_output(&state, &filename, None).await
}

async fn serve_output(
    state: &AppState,
    filename: &str,
    disposition: Option<String>,
) -> WebResult<Response> {
    let path = job::resolve_output_file(&state.output_dir, filename).ok_or(WebError::NotFound)?;
    let bytes = tokio::fs::read(&path).await.map_err(|_| WebError::NotFound)?;

    let mut response = bytes.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(job::content_type(Path::new(filename))),
    );
    if let Some(disposition) = disposition {
        let value = HeaderValue::from_str(&disposition)
            .map_err(|e| WebError::Internal(e.to_string()))?;
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}
