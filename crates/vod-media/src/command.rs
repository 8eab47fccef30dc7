//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output path (file or muxer target such as a playlist)
    output: PathBuf,
    /// Input arguments (before -i)
    input_args: Vec<String>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            log_level: "warning".to_string(),
        }
    }

    /// Add an input argument (before -i).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add an output argument (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set seek position (before input).
    pub fn seek(self, seconds: f64) -> Self {
        self.input_arg("-ss").input_arg(format!("{:.3}", seconds))
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Extract a single frame.
    pub fn single_frame(self) -> Self {
        self.output_arg("-vframes").output_arg("1")
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            self.log_level.clone(),
        ];

        args.extend(self.input_args.clone());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.clone());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands with cooperative cancellation.
pub struct FfmpegRunner {
    binary: String,
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl FfmpegRunner {
    /// Create a runner for the given ffmpeg binary.
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            cancel_rx: None,
        }
    }

    /// Set cancellation signal.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// Run an FFmpeg command to completion. Non-zero exit reports the
    /// captured stderr.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        which::which(&self.binary)
            .map_err(|_| MediaError::FfmpegNotFound(self.binary.clone()))?;

        let args = cmd.build_args();
        debug!("Running {} {}", self.binary, args.join(" "));

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        // Drain stderr concurrently so a chatty encode can't fill the pipe
        // and deadlock against wait().
        let stderr = child.stderr.take();
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            if let Some(mut stream) = stderr {
                let _ = stream.read_to_string(&mut buf).await;
            }
            buf
        });

        let status = self.wait_with_cancel(&mut child).await?;
        let stderr_text = stderr_task.await.unwrap_or_default();

        if status.success() {
            Ok(())
        } else {
            Err(MediaError::ffmpeg_failed(
                format!("{} exited with non-zero status", self.binary),
                Some(stderr_text),
                status.code(),
            ))
        }
    }

    async fn wait_with_cancel(&self, child: &mut Child) -> MediaResult<std::process::ExitStatus> {
        match self.cancel_rx.clone() {
            Some(mut cancel) => loop {
                tokio::select! {
                    status = child.wait() => return Ok(status?),
                    changed = cancel.changed() => {
                        if changed.is_err() || *cancel.borrow() {
                            warn!("Cancellation requested, killing {}", self.binary);
                            let _ = child.kill().await;
                            return Err(MediaError::Cancelled);
                        }
                    }
                }
            },
            None => Ok(child.wait().await?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_places_input_args_before_input() {
        let cmd = FfmpegCommand::new("in.mp4", "out.jpg")
            .seek(2.5)
            .single_frame();
        let args = cmd.build_args();

        let ss = args.iter().position(|a| a == "-ss").unwrap();
        let i = args.iter().position(|a| a == "-i").unwrap();
        assert!(ss < i);
        assert_eq!(args[ss + 1], "2.500");
        assert!(args.contains(&"-vframes".to_string()));
        assert_eq!(args.last().unwrap(), "out.jpg");
    }

    #[test]
    fn builder_defaults() {
        let args = FfmpegCommand::new("a", "b").build_args();
        assert_eq!(args[0], "-y");
        assert!(args.contains(&"-hide_banner".to_string()));
        assert!(args.contains(&"warning".to_string()));
    }
}
