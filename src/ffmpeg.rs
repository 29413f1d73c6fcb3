//! Decoder log level configuration.
//!
//! FFmpeg has its own console logging, separate from the Rust
//! [`log`](https://crates.io/crates/log) facade this crate reports through.
//! [`DecoderLogLevel`] tunes that output: it becomes the `-loglevel` argument
//! of the external `ffmpeg` process, and, with the `libav` feature, the
//! process-wide libav log level.
//!
//! This does not affect Rust-side diagnostics; configure those with a `log`
//! backend such as `env_logger`.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// FFmpeg log verbosity, most quiet first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DecoderLogLevel {
    /// Print nothing.
    Quiet,
    /// Only unrecoverable errors.
    Fatal,
    /// Recoverable errors too. This is the default.
    #[default]
    Error,
    /// Warnings.
    Warning,
    /// Informational messages.
    Info,
    /// Verbose informational messages.
    Verbose,
    /// Debugging messages.
    Debug,
}

impl DecoderLogLevel {
    /// The value passed to `ffmpeg -loglevel`.
    pub fn as_arg(self) -> &'static str {
        match self {
            DecoderLogLevel::Quiet => "quiet",
            DecoderLogLevel::Fatal => "fatal",
            DecoderLogLevel::Error => "error",
            DecoderLogLevel::Warning => "warning",
            DecoderLogLevel::Info => "info",
            DecoderLogLevel::Verbose => "verbose",
            DecoderLogLevel::Debug => "debug",
        }
    }

    /// Apply this level to the in-process libav libraries.
    #[cfg(feature = "libav")]
    pub(crate) fn apply_to_libav(self) {
        use ffmpeg_next::util::log::Level;

        let level = match self {
            DecoderLogLevel::Quiet => Level::Quiet,
            DecoderLogLevel::Fatal => Level::Fatal,
            DecoderLogLevel::Error => Level::Error,
            DecoderLogLevel::Warning => Level::Warning,
            DecoderLogLevel::Info => Level::Info,
            DecoderLogLevel::Verbose => Level::Verbose,
            DecoderLogLevel::Debug => Level::Debug,
        };
        ffmpeg_next::util::log::set_level(level);
    }
}

impl Display for DecoderLogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_arg())
    }
}

impl FromStr for DecoderLogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "quiet" => Ok(DecoderLogLevel::Quiet),
            "fatal" | "panic" => Ok(DecoderLogLevel::Fatal),
            "error" => Ok(DecoderLogLevel::Error),
            "warning" | "warn" => Ok(DecoderLogLevel::Warning),
            "info" => Ok(DecoderLogLevel::Info),
            "verbose" => Ok(DecoderLogLevel::Verbose),
            "debug" | "trace" => Ok(DecoderLogLevel::Debug),
            other => Err(format!("unsupported decoder log level: {other}")),
        }
    }
}
