// SPDX-License-Identifier: MPL-2.0
//! Upload naming and per-request file bookkeeping.

use crate::config::defaults::{ALLOWED_EXTENSIONS, JOB_ID_LEN};
use std::path::{Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Reduces an uploaded filename to a safe, ASCII-only name.
///
/// Accented letters are decomposed (NFKD) so their base letter survives.
/// Path separators become word breaks, whitespace runs become `_`, anything
/// outside `[A-Za-z0-9._-]` is dropped, and leading or trailing `.`/`_` are
/// trimmed. The result may be empty.
#[must_use]
pub fn secure_filename(name: &str) -> String {
    let spaced: String = name
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

/// Returns the lowercase extension of `name` if uploads of that type are
/// accepted.
#[must_use]
pub fn allowed_extension(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Short random identifier that keeps concurrent uploads of the same name apart.
#[must_use]
pub fn job_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(JOB_ID_LEN);
    id
}

/// Input and output locations for one upload.
///
/// The input file is deleted when this value is dropped, so it never
/// outlives the request whatever the outcome.
#[derive(Debug)]
pub struct JobFiles {
    input: PathBuf,
    output: PathBuf,
    output_name: String,
}

impl JobFiles {
    /// Names the files for an upload called `filename` with extension `ext`.
    #[must_use]
    pub fn new(input_dir: &Path, output_dir: &Path, filename: &str, ext: &str, id: &str) -> Self {
        let sanitized = secure_filename(filename);
        let stem = Path::new(&sanitized)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("image");

        let output_name = format!("{stem}_{id}_output.{ext}");
        Self {
            input: input_dir.join(format!("{stem}_{id}_input.{ext}")),
            output: output_dir.join(&output_name),
            output_name,
        }
    }

    #[must_use]
    pub fn input(&self) -> &Path {
        &self.input
    }

    #[must_use]
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// File name of the result inside the output directory.
    #[must_use]
    pub fn output_name(&self) -> &str {
        &self.output_name
    }
}

impl Drop for JobFiles {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.input) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %self.input.display(), "failed to remove upload: {e}"),
        }
    }
}

/// Locates a result file by the name a client asked for.
///
/// Names with path separators or `..` never resolve.
#[must_use]
pub fn resolve_output_file(output_dir: &Path, name: &str) -> Option<PathBuf> {
    if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
        return None;
    }
    let path = output_dir.join(name);
    path.is_file().then_some(path)
}

/// MIME type for a served file, by extension.
#[must_use]
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("tif" | "tiff") => "image/tiff",
        _ => "application/octet-stream",
    }
}
