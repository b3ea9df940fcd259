// SPDX-License-Identifier: MPL-2.0
//! Runs the `image_hd` binary for one upload.

use crate::domain::{EnhanceMode, ScaleFactor};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// How the enhancer process should be invoked.
#[derive(Debug, Clone)]
pub struct EnhancerCommand {
    pub program: PathBuf,
    /// Settings file forwarded with `--config`.
    pub config: Option<PathBuf>,
    pub timeout: Duration,
    /// File the last invocation is recorded to, overwritten on every run.
    pub debug_log: Option<PathBuf>,
}

/// Prefix the `image_hd` binary puts on its failure line.
pub const ERROR_MARKER: &str = "[ERROR]";

/// Captured result of a finished enhancer process.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    /// The `[ERROR]` lines of stderr, or all of stderr when there are none,
    /// or stdout when stderr is empty.
    ///
    /// Log lines the enhancer writes to stderr are left out when it reported
    /// an `[ERROR]` line.
    #[must_use]
    pub fn failure_message(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            return self.stdout.trim().to_string();
        }
        let errors: Vec<&str> = stderr
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with(ERROR_MARKER))
            .collect();
        if errors.is_empty() {
            stderr.to_string()
        } else {
            errors.join("\n")
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("failed to start {program}: {message}")]
    Spawn { program: String, message: String },
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl EnhancerCommand {
    fn args(&self, input: &Path, output: &Path, mode: EnhanceMode, scale: ScaleFactor) -> Vec<String> {
        let mut args = vec![
            input.display().to_string(),
            output.display().to_string(),
            "--mode".to_string(),
            mode.to_string(),
            "--scale".to_string(),
            scale.to_string(),
        ];
        if let Some(config) = &self.config {
            args.push("--config".to_string());
            args.push(config.display().to_string());
        }
        args
    }

    /// Runs the enhancer and waits for it, up to the configured timeout.
    ///
    /// On timeout the child is killed, along with its process group on unix.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] if the process cannot start or does not finish
    /// in time. A non-zero exit is reported through [`RunOutput::success`].
    pub async fn run(
        &self,
        input: &Path,
        output: &Path,
        mode: EnhanceMode,
        scale: ScaleFactor,
    ) -> Result<RunOutput, RunError> {
        let args = self.args(input, output, mode, scale);
        let command_line = format!("{} {}", self.program.display(), args.join(" "));
        tracing::info!(command = %command_line, "starting enhancer");

        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own group, so the upscaler the enhancer starts can be killed with it.
        #[cfg(unix)]
        command.process_group(0);

        let child = command.spawn().map_err(|e| RunError::Spawn {
            program: self.program.display().to_string(),
            message: e.to_string(),
        })?;
        let pid = child.id();

        // Dropping the wait future on timeout drops the child, which kills it.
        let Ok(waited) = tokio::time::timeout(self.timeout, child.wait_with_output()).await else {
            tracing::error!(command = %command_line, "enhancer timed out after {:?}", self.timeout);
            if let Some(pid) = pid {
                kill_process_group(pid);
            }
            return Err(RunError::Timeout(self.timeout));
        };
        let output = waited.map_err(|e| RunError::Spawn {
            program: self.program.display().to_string(),
            message: e.to_string(),
        })?;

        let result = RunOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        tracing::info!(command = %command_line, code = ?result.code, "enhancer finished");
        tracing::debug!(stdout = %result.stdout, stderr = %result.stderr, "enhancer output");

        if let Some(path) = &self.debug_log {
            if let Err(e) = write_debug_log(path, &command_line, &result).await {
                tracing::warn!(path = %path.display(), "failed to write debug log: {e}");
            }
        }
        Ok(result)
    }
}

/// Kills every process in the group led by `pid`.
#[cfg(unix)]
fn kill_process_group(pid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: kill(2) takes no pointers; a negative pid addresses the group.
    if unsafe { libc::kill(-pgid, libc::SIGKILL) } != 0 {
        tracing::warn!(pgid, "failed to kill enhancer process group: {}", std::io::Error::last_os_error());
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}

async fn write_debug_log(path: &Path, command_line: &str, result: &RunOutput) -> std::io::Result<()> {
    let code = result
        .code
        .map_or_else(|| "terminated by signal".to_string(), |c| c.to_string());
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(
        format!(
            "Command: {command_line}\nReturn code: {code}\nSTDOUT:\n{}\nSTDERR:\n{}\n",
            result.stdout, result.stderr
        )
        .as_bytes(),
    )
    .await?;
    file.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(program: PathBuf, timeout: Duration) -> EnhancerCommand {
        EnhancerCommand {
            program,
            config: None,
            timeout,
            debug_log: None,
        }
    }

    #[test]
    fn args_follow_cli_contract() {
        let mut cmd = command(PathBuf::from("image_hd"), Duration::from_secs(1));
        cmd.config = Some(PathBuf::from("/etc/image_hd.toml"));
        let args = cmd.args(
            Path::new("/in/a.png"),
            Path::new("/out/a.png"),
            EnhanceMode::Both,
            ScaleFactor::X2,
        );
        assert_eq!(
            args,
            [
                "/in/a.png",
                "/out/a.png",
                "--mode",
                "both",
                "--scale",
                "2",
                "--config",
                "/etc/image_hd.toml"
            ]
        );
    }

    #[test]
    fn failure_message_prefers_stderr() {
        let mut out = RunOutput {
            success: false,
            code: Some(1),
            stdout: "progress\n".into(),
            stderr: "[ERROR] boom\n".into(),
        };
        assert_eq!(out.failure_message(), "[ERROR] boom");
        out.stderr.clear();
        assert_eq!(out.failure_message(), "progress");
    }

    #[test]
    fn failure_message_keeps_only_error_lines() {
        let out = RunOutput {
            success: false,
            code: Some(1),
            stdout: String::new(),
            stderr: "2026-10-16T10:00:00Z  INFO processing mode=both\n\
                     2026-10-16T10:00:00Z  INFO upscaling input=/in/a.png\n\
                     [ERROR] realesrgan-ncnn-vulkan not found\n"
                .into(),
        };
        assert_eq!(out.failure_message(), "[ERROR] realesrgan-ncnn-vulkan not found");
    }

    #[test]
    fn failure_message_without_marker_keeps_stderr() {
        let out = RunOutput {
            success: false,
            code: Some(101),
            stdout: String::new(),
            stderr: "thread 'main' panicked\n".into(),
        };
        assert_eq!(out.failure_message(), "thread 'main' panicked");
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let cmd = command(PathBuf::from("/nonexistent/image_hd"), Duration::from_secs(5));
        let err = cmd
            .run(Path::new("a"), Path::new("b"), EnhanceMode::Enhance, ScaleFactor::X4)
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::Spawn { .. }));
    }

    #[cfg(unix)]
    mod subprocess {
        use super::*;
        use crate::test_utils::write_script;

        #[tokio::test]
        async fn captures_output_and_writes_debug_log() {
            let dir = tempfile::tempdir().unwrap();
            let exe = write_script(dir.path(), "enhancer", "echo \"got $1 $3 $4\"\necho warn >&2\n");
            let mut cmd = command(exe, Duration::from_secs(10));
            let log = dir.path().join("debug.log");
            cmd.debug_log = Some(log.clone());

            let out = cmd
                .run(Path::new("in.png"), Path::new("out.png"), EnhanceMode::Colorize, ScaleFactor::X4)
                .await
                .unwrap();
            assert!(out.success);
            assert_eq!(out.stdout.trim(), "got in.png --mode colorize");
            assert_eq!(out.stderr.trim(), "warn");

            let log = std::fs::read_to_string(log).unwrap();
            assert!(log.contains("Return code: 0"));
            assert!(log.contains("STDERR:\nwarn"));
        }

        #[tokio::test]
        async fn non_zero_exit_is_reported() {
            let dir = tempfile::tempdir().unwrap();
            let exe = write_script(dir.path(), "enhancer", "echo '[ERROR] no model' >&2\nexit 1\n");
            let out = command(exe, Duration::from_secs(10))
                .run(Path::new("a"), Path::new("b"), EnhanceMode::Enhance, ScaleFactor::X4)
                .await
                .unwrap();
            assert!(!out.success);
            assert_eq!(out.code, Some(1));
            assert_eq!(out.failure_message(), "[ERROR] no model");
        }

        #[tokio::test]
        async fn slow_process_times_out() {
            let dir = tempfile::tempdir().unwrap();
            let exe = write_script(dir.path(), "enhancer", "sleep 30\n");
            let started = std::time::Instant::now();
            let err = command(exe, Duration::from_millis(200))
                .run(Path::new("a"), Path::new("b"), EnhanceMode::Enhance, ScaleFactor::X4)
                .await
                .unwrap_err();
            assert!(matches!(err, RunError::Timeout(_)));
            assert!(started.elapsed() < Duration::from_secs(10));
        }

        #[tokio::test]
        async fn timeout_kills_grandchildren() {
            let dir = tempfile::tempdir().unwrap();
            let late = dir.path().join("late.png");
            let exe = write_script(
                dir.path(),
                "enhancer",
                "(sleep 1; touch \"$2\") &\nsleep 30\n",
            );
            let err = command(exe, Duration::from_millis(200))
                .run(Path::new("a"), &late, EnhanceMode::Enhance, ScaleFactor::X4)
                .await
                .unwrap_err();
            assert!(matches!(err, RunError::Timeout(_)));

            tokio::time::sleep(Duration::from_millis(1500)).await;
            assert!(!late.exists(), "background process outlived the timeout");
        }
    }
}
