//! Frame extraction.
//!
//! A [`FrameExtractor`] decodes one video into numbered still images inside
//! a staging directory, following a [`FramePattern`]. The default
//! implementation, [`FfmpegCommand`], runs the external `ffmpeg` program; with
//! the `libav` feature, [`LibavExtractor`](crate::LibavExtractor) decodes
//! in-process instead.
//!
//! Extractors only report how many frames they wrote. Whether zero frames is
//! acceptable is decided by the caller.

use std::{
    ffi::OsString,
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
    process::{Child, Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

use crate::{
    configuration::{ConversionOptions, FramePattern},
    error::StackError,
    ffmpeg::DecoderLogLevel,
};

/// How often a running decoder is polled while a timeout is armed.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// A service that splits one video into numbered frame files.
///
/// Implementations must be [`Send`] and [`Sync`]: with the `rayon` feature
/// one extractor is shared by every worker thread.
pub trait FrameExtractor: Send + Sync {
    /// Decode `source` into `staging_dir`, naming files after `pattern`
    /// starting at index 1.
    ///
    /// Returns the number of frame files present in `staging_dir` afterwards.
    ///
    /// # Errors
    ///
    /// - [`StackError::ExtractorUnavailable`] if the decoder cannot be used.
    /// - [`StackError::ExtractionFailed`] if decoding `source` fails.
    /// - [`StackError::ExtractionTimedOut`] if a configured timeout expires.
    fn extract(
        &self,
        source: &Path,
        staging_dir: &Path,
        pattern: &FramePattern,
    ) -> Result<u64, StackError>;
}

/// Runs the external `ffmpeg` program synchronously.
///
/// The invocation is equivalent to
/// `ffmpeg -hide_banner -nostdin -loglevel error -y -i <source> -start_number 1 <staging>/frame%06d.png`.
/// Standard error is captured and becomes the failure reason when `ffmpeg`
/// exits unsuccessfully.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    program: PathBuf,
    log_level: DecoderLogLevel,
    timeout: Option<Duration>,
}

impl Default for FfmpegCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegCommand {
    /// Use `ffmpeg` from `PATH` with no timeout.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            log_level: DecoderLogLevel::default(),
            timeout: None,
        }
    }

    /// Build from the decoder settings of `options`.
    pub fn from_options(options: &ConversionOptions) -> Self {
        Self {
            program: options.ffmpeg_program.clone(),
            log_level: options.decoder_log_level,
            timeout: options.extraction_timeout,
        }
    }

    /// Use a specific executable (a name looked up on `PATH`, or a path).
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Set `-loglevel`.
    #[must_use]
    pub fn with_log_level(mut self, level: DecoderLogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Kill `ffmpeg` if it runs longer than `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Locate the executable.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::ExtractorUnavailable`] if it cannot be found or
    /// is not executable.
    pub fn resolve_program(&self) -> Result<PathBuf, StackError> {
        which::which(&self.program).map_err(|error| StackError::ExtractorUnavailable {
            program: self.program.display().to_string(),
            reason: error.to_string(),
        })
    }

    fn arguments(&self, source: &Path, staging_dir: &Path, pattern: &FramePattern) -> Vec<OsString> {
        let mut arguments: Vec<OsString> = ["-hide_banner", "-nostdin", "-loglevel"]
            .into_iter()
            .map(OsString::from)
            .collect();
        arguments.push(self.log_level.as_arg().into());
        arguments.push("-y".into());
        arguments.push("-i".into());
        arguments.push(source.as_os_str().to_owned());
        arguments.push("-start_number".into());
        arguments.push("1".into());
        arguments.push(staging_dir.join(pattern.printf_pattern()).into_os_string());
        arguments
    }
}

impl FrameExtractor for FfmpegCommand {
    fn extract(
        &self,
        source: &Path,
        staging_dir: &Path,
        pattern: &FramePattern,
    ) -> Result<u64, StackError> {
        let program = self.resolve_program()?;
        log::debug!(
            "Extracting frames from {} into {} with {}",
            source.display(),
            staging_dir.display(),
            program.display()
        );

        let mut child = Command::new(&program)
            .args(self.arguments(source, staging_dir, pattern))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|error| StackError::ExtractorUnavailable {
                program: program.display().to_string(),
                reason: error.to_string(),
            })?;

        // Drain stderr on its own thread so a chatty decoder cannot block on
        // a full pipe while we wait for it.
        let stderr = child.stderr.take();
        let stderr_reader = thread::spawn(move || {
            let mut diagnostics = String::new();
            if let Some(mut stream) = stderr {
                let _ = stream.read_to_string(&mut diagnostics);
            }
            diagnostics
        });

        let status = wait_with_timeout(&mut child, self.timeout).map_err(|error| {
            StackError::ExtractionFailed {
                path: source.to_path_buf(),
                reason: format!("waiting for {} failed: {error}", program.display()),
            }
        })?;

        let Some(status) = status else {
            return Err(StackError::ExtractionTimedOut {
                path: source.to_path_buf(),
                timeout: self.timeout.unwrap_or_default(),
            });
        };

        let diagnostics = stderr_reader.join().unwrap_or_default();
        if !status.success() {
            return Err(StackError::ExtractionFailed {
                path: source.to_path_buf(),
                reason: failure_reason(status, &diagnostics),
            });
        }

        let count = count_frames(staging_dir, pattern)?;
        log::debug!("Extracted {count} frame(s) from {}", source.display());
        Ok(count)
    }
}

/// Count the files in `staging_dir` that follow `pattern`.
///
/// # Errors
///
/// Returns the I/O error if the directory cannot be listed.
pub fn count_frames(staging_dir: &Path, pattern: &FramePattern) -> io::Result<u64> {
    let mut count = 0;
    for entry in fs::read_dir(staging_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file()
            && entry.file_name().to_str().is_some_and(|name| pattern.matches(name))
        {
            count += 1;
        }
    }
    Ok(count)
}

/// Wait for `child`, killing it once `timeout` expires.
///
/// Returns `Ok(None)` if the child was killed.
fn wait_with_timeout(child: &mut Child, timeout: Option<Duration>) -> io::Result<Option<ExitStatus>> {
    let Some(timeout) = timeout else {
        return child.wait().map(Some);
    };

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn failure_reason(status: ExitStatus, diagnostics: &str) -> String {
    let last_lines: Vec<&str> = diagnostics
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    match last_lines.len() {
        0 => format!("decoder exited with {status}"),
        n => last_lines[n.saturating_sub(3)..].join("; "),
    }
}
