// SPDX-License-Identifier: MPL-2.0
//! Download and integrity checks for colorization model files.
//!
//! Models are fetched from a configured URL into a `.part` file, which is
//! renamed into place once the transfer completes and passes the size check.
//! A BLAKE3 checksum, when configured, is verified afterwards.

use crate::config::defaults::MIN_MODEL_SIZE_BYTES;
use crate::media::colorize::{ColorizeError, ColorizeResult};
use std::io::Write;
use std::path::{Path, PathBuf};

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

/// Downloads a model from `url` to `dest`.
///
/// Returns the number of bytes downloaded.
///
/// # Errors
///
/// Returns an error if the request fails, the response is suspiciously
/// small, or the file cannot be written.
pub async fn download_model(
    url: &str,
    dest: &Path,
    mut progress_callback: impl FnMut(f32) + Send,
) -> ColorizeResult<u64> {
    use futures_util::StreamExt;

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::limited(10))
        .user_agent(concat!("image_hd/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ColorizeError::DownloadFailed(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ColorizeError::DownloadFailed(e.to_string()))?;

    if !response.status().is_success() {
        return Err(ColorizeError::DownloadFailed(format!(
            "HTTP status: {}",
            response.status()
        )));
    }

    let total_size = response.content_length().unwrap_or(0);
    if total_size > 0 && total_size < MIN_MODEL_SIZE_BYTES {
        return Err(ColorizeError::DownloadFailed(format!(
            "Response too small ({total_size} bytes), expected a model file"
        )));
    }

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let part = partial_path(dest);
    let mut file = std::fs::File::create(&part)?;

    let mut downloaded: u64 = 0;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                let _ = std::fs::remove_file(&part);
                return Err(ColorizeError::DownloadFailed(e.to_string()));
            }
        };
        file.write_all(&chunk)?;
        downloaded += chunk.len() as u64;

        if total_size > 0 {
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
            let progress = (downloaded as f64 / total_size as f64) as f32;
            progress_callback(progress);
        }
    }
    file.flush()?;
    drop(file);

    if downloaded < MIN_MODEL_SIZE_BYTES {
        let _ = std::fs::remove_file(&part);
        return Err(ColorizeError::DownloadFailed(format!(
            "Downloaded file too small ({downloaded} bytes)"
        )));
    }

    std::fs::rename(&part, dest)?;
    Ok(downloaded)
}

/// Computes the BLAKE3 hash (hex) of a file.
///
/// # Errors
///
/// Returns an error if the file is missing or cannot be read.
pub fn compute_model_hash(path: &Path) -> ColorizeResult<String> {
    if !path.exists() {
        return Err(ColorizeError::ModelNotFound(path.to_path_buf()));
    }
    let file = std::fs::File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    hasher.update_reader(file)?;
    Ok(hasher.finalize().to_hex().to_string())
}

/// Verifies a file against an expected BLAKE3 hash (hex, case-insensitive).
///
/// # Errors
///
/// Returns [`ColorizeError::ChecksumMismatch`] if the hashes differ.
pub fn verify_checksum(path: &Path, expected_hash: &str) -> ColorizeResult<()> {
    let actual = compute_model_hash(path)?;
    if !actual.eq_ignore_ascii_case(expected_hash.trim()) {
        return Err(ColorizeError::ChecksumMismatch {
            expected: expected_hash.to_string(),
            actual,
        });
    }
    Ok(())
}
