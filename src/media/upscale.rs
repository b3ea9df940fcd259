// SPDX-License-Identifier: MPL-2.0
//! Super-resolution through the Real-ESRGAN NCNN Vulkan executable.
//!
//! The executable is a prebuilt binary; this module only locates it and
//! drives it with the contract
//!
//! ```text
//! realesrgan-ncnn-vulkan -i <input> -o <output> -s <scale>
//! ```
//!
//! A non-zero exit status, a missing output file, or an output that is not a
//! decodable image are all failures.

use crate::app::paths;
use crate::config::defaults::REALESRGAN_EXECUTABLE;
use crate::domain::ScaleFactor;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Result type for upscale operations.
pub type UpscaleResult<T> = Result<T, UpscaleError>;

/// Errors that can occur while upscaling.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UpscaleError {
    /// The Real-ESRGAN executable could not be located.
    #[error("Executable not found: {0}")]
    ExecutableNotFound(String),
    /// The image to upscale does not exist.
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),
    /// The executable could not be started.
    #[error("Failed to start {}: {message}", program.display())]
    SpawnFailed { program: PathBuf, message: String },
    /// The executable exited unsuccessfully.
    #[error("Real-ESRGAN failed ({status}): {stderr}")]
    ProcessFailed { status: String, stderr: String },
    /// The executable succeeded but did not write the output file.
    #[error("Output file was not produced: {}", .0.display())]
    OutputMissing(PathBuf),
    /// The output file exists but is not a readable image.
    #[error("Output file is not a readable image: {0}")]
    OutputUnreadable(String),
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for UpscaleError {
    fn from(err: std::io::Error) -> Self {
        UpscaleError::Io(err.to_string())
    }
}

/// Places searched for the executable, in priority order.
///
/// Current directory, then next to the running binary (and its `bin/`),
/// then `<data_dir>/bin`, then every `PATH` entry.
#[must_use]
pub fn search_locations() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        dirs.push(exe_dir.join("bin"));
        dirs.insert(dirs.len() - 1, exe_dir);
    }
    if let Some(bin) = paths::bin_dir() {
        dirs.push(bin);
    }
    if let Some(path) = std::env::var_os("PATH") {
        dirs.extend(std::env::split_paths(&path));
    }
    dirs.into_iter()
        .map(|dir| dir.join(REALESRGAN_EXECUTABLE))
        .collect()
}

/// Resolves the executable to run.
///
/// An explicit path is used as-is and must exist; otherwise the first hit in
/// [`search_locations`] wins.
///
/// # Errors
///
/// Returns [`UpscaleError::ExecutableNotFound`] if nothing matches.
pub fn find_executable(explicit: Option<&Path>) -> UpscaleResult<PathBuf> {
    if let Some(path) = explicit {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(UpscaleError::ExecutableNotFound(path.display().to_string()))
        };
    }

    search_locations()
        .into_iter()
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| UpscaleError::ExecutableNotFound(REALESRGAN_EXECUTABLE.to_string()))
}

/// Runs the executable on `input`, writing the upscaled image to `output`.
///
/// Paths are made absolute because the process runs from the executable's
/// own directory (it loads its models relative to it). Returns the output
/// dimensions.
///
/// # Errors
///
/// See [`UpscaleError`].
pub fn run_realesrgan(
    executable: &Path,
    input: &Path,
    output: &Path,
    scale: ScaleFactor,
) -> UpscaleResult<(u32, u32)> {
    let input = std::path::absolute(input)?;
    let output = std::path::absolute(output)?;

    if !input.exists() {
        return Err(UpscaleError::InputNotFound(input));
    }

    tracing::info!(input = %input.display(), executable = %executable.display(), "upscaling");
    match image_rs::image_dimensions(&input) {
        Ok((w, h)) => tracing::info!("initial resolution: {w}x{h}"),
        Err(e) => tracing::warn!("could not read input dimensions: {e}"),
    }

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut command = Command::new(executable);
    command
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("-s")
        .arg(scale.to_string());
    if let Some(dir) = executable.parent().filter(|d| !d.as_os_str().is_empty()) {
        command.current_dir(dir);
    }

    let result = command.output().map_err(|e| UpscaleError::SpawnFailed {
        program: executable.to_path_buf(),
        message: e.to_string(),
    })?;

    if !result.status.success() {
        return Err(UpscaleError::ProcessFailed {
            status: result.status.to_string(),
            stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
        });
    }

    if !output.exists() {
        return Err(UpscaleError::OutputMissing(output));
    }

    let (width, height) = image_rs::image_dimensions(&output)
        .map_err(|e| UpscaleError::OutputUnreadable(e.to_string()))?;
    tracing::info!(output = %output.display(), "final resolution: {width}x{height}");
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upscale_error_display() {
        let err = UpscaleError::ProcessFailed {
            status: "exit status: 1".into(),
            stderr: "vkCreateInstance failed".into(),
        };
        assert_eq!(
            err.to_string(),
            "Real-ESRGAN failed (exit status: 1): vkCreateInstance failed"
        );
    }

    #[test]
    fn search_locations_all_end_with_executable_name() {
        let locations = search_locations();
        assert!(!locations.is_empty());
        assert!(locations
            .iter()
            .all(|p| p.file_name().is_some_and(|n| n == REALESRGAN_EXECUTABLE)));
    }

    #[test]
    fn explicit_missing_executable_is_an_error() {
        let err = find_executable(Some(Path::new("/nonexistent/realesrgan"))).unwrap_err();
        assert!(matches!(err, UpscaleError::ExecutableNotFound(p) if p.contains("nonexistent")));
    }

    #[test]
    fn explicit_existing_executable_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("my-esrgan");
        std::fs::write(&exe, b"").unwrap();
        assert_eq!(find_executable(Some(&exe)).unwrap(), exe);
    }

    #[test]
    fn missing_input_is_reported_before_spawning() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_realesrgan(
            Path::new("/nonexistent/realesrgan"),
            &dir.path().join("nope.png"),
            &dir.path().join("out.png"),
            ScaleFactor::X4,
        )
        .unwrap_err();
        assert!(matches!(err, UpscaleError::InputNotFound(_)));
    }

    #[cfg(unix)]
    mod subprocess {
        use super::*;
        use crate::test_utils::{solid_rgb, write_script};

        const COPY_SCRIPT: &str = r#"
while [ $# -gt 0 ]; do
  case "$1" in
    -i) in="$2"; shift 2 ;;
    -o) out="$2"; shift 2 ;;
    -s) scale="$2"; shift 2 ;;
    *) shift ;;
  esac
done
cp "$in" "$out"
printf '%s' "$scale" > "$out.scale"
pwd > "$out.cwd"
"#;

        #[test]
        fn passes_paths_and_scale_to_executable() {
            let dir = tempfile::tempdir().unwrap();
            let tool_dir = dir.path().join("tool");
            std::fs::create_dir_all(&tool_dir).unwrap();
            let exe = write_script(&tool_dir, "fake-esrgan", COPY_SCRIPT);

            let input = dir.path().join("in.png");
            solid_rgb(6, 4, [10, 20, 30]).save(&input).unwrap();
            let output = dir.path().join("nested").join("out.png");

            let dims = run_realesrgan(&exe, &input, &output, ScaleFactor::X2).unwrap();
            assert_eq!(dims, (6, 4));
            assert_eq!(
                std::fs::read_to_string(dir.path().join("nested/out.png.scale")).unwrap(),
                "2"
            );
            let cwd = std::fs::read_to_string(dir.path().join("nested/out.png.cwd")).unwrap();
            assert!(cwd.trim().ends_with("tool"));
        }

        #[test]
        fn non_zero_exit_carries_stderr() {
            let dir = tempfile::tempdir().unwrap();
            let exe = write_script(dir.path(), "failing", "echo 'no vulkan device' >&2\nexit 3\n");
            let input = dir.path().join("in.png");
            solid_rgb(2, 2, [0, 0, 0]).save(&input).unwrap();

            let err =
                run_realesrgan(&exe, &input, &dir.path().join("out.png"), ScaleFactor::X4).unwrap_err();
            match err {
                UpscaleError::ProcessFailed { stderr, .. } => assert_eq!(stderr, "no vulkan device"),
                other => panic!("expected ProcessFailed, got {other:?}"),
            }
        }

        #[test]
        fn success_without_output_is_a_failure() {
            let dir = tempfile::tempdir().unwrap();
            let exe = write_script(dir.path(), "silent", "exit 0\n");
            let input = dir.path().join("in.png");
            solid_rgb(2, 2, [0, 0, 0]).save(&input).unwrap();

            let err =
                run_realesrgan(&exe, &input, &dir.path().join("out.png"), ScaleFactor::X4).unwrap_err();
            assert!(matches!(err, UpscaleError::OutputMissing(_)));
        }

        #[test]
        fn garbage_output_is_unreadable() {
            let dir = tempfile::tempdir().unwrap();
            let exe = write_script(
                dir.path(),
                "garbage",
                "while [ $# -gt 0 ]; do [ \"$1\" = -o ] && out=\"$2\"; shift; done\necho junk > \"$out\"\n",
            );
            let input = dir.path().join("in.png");
            solid_rgb(2, 2, [0, 0, 0]).save(&input).unwrap();

            let err =
                run_realesrgan(&exe, &input, &dir.path().join("out.png"), ScaleFactor::X4).unwrap_err();
            assert!(matches!(err, UpscaleError::OutputUnreadable(_)));
        }
    }
}
