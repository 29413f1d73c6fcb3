//! Conversion configuration.
//!
//! [`ConversionOptions`] is a builder that threads the accepted extensions,
//! frame naming contract, pixel layout, compression, parallelism, decoder
//! settings and progress callback through the pipeline without widening
//! every function signature.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use vidstack::{ConversionOptions, PixelFormat, StackCompression};
//!
//! let options = ConversionOptions::new()
//!     .with_input_extension("mov")
//!     .with_pixel_format(PixelFormat::Gray8)
//!     .with_compression(StackCompression::Lzw)
//!     .with_extraction_timeout(Duration::from_secs(120));
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use image::DynamicImage;

use crate::ffmpeg::DecoderLogLevel;
use crate::normalize::clean_extension;
use crate::progress::{NoOpProgress, ProgressCallback};

/// Default accepted input extension.
pub const DEFAULT_INPUT_EXTENSION: &str = "mp4";
/// Default stack container extension.
pub const DEFAULT_OUTPUT_EXTENSION: &str = "tiff";

/// Pixel layout every loaded frame is converted to.
///
/// All pages of a stack share this layout, whatever quirks the individual
/// staged images had.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// 8-bit RGB (24 bpp). This is the default.
    #[default]
    Rgb8,
    /// 8-bit RGBA (32 bpp).
    Rgba8,
    /// 8-bit grayscale (8 bpp).
    Gray8,
}

impl PixelFormat {
    /// Convert a decoded image to this layout.
    pub fn apply(self, image: DynamicImage) -> DynamicImage {
        match self {
            PixelFormat::Rgb8 => DynamicImage::ImageRgb8(image.into_rgb8()),
            PixelFormat::Rgba8 => DynamicImage::ImageRgba8(image.into_rgba8()),
            PixelFormat::Gray8 => DynamicImage::ImageLuma8(image.into_luma8()),
        }
    }

    /// Number of bytes per pixel.
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
            PixelFormat::Gray8 => 1,
        }
    }
}

/// Lossless compression applied to every page of a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StackCompression {
    /// Deflate (zlib), balanced level. This is the default.
    #[default]
    Deflate,
    /// Lempel-Ziv-Welch.
    Lzw,
    /// PackBits run-length encoding.
    PackBits,
    /// No compression.
    Uncompressed,
}

/// Naming contract between the frame extractor and the frame loader.
///
/// Frames are written as `<prefix><index>.<extension>` with the index
/// zero-padded to a fixed number of digits and starting at 1. Because the
/// width is fixed, ascending lexicographic order of file names equals
/// temporal order; the loader relies on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePattern {
    prefix: String,
    digits: usize,
    extension: String,
}

impl Default for FramePattern {
    fn default() -> Self {
        Self {
            prefix: "frame".to_string(),
            digits: 6,
            extension: "png".to_string(),
        }
    }
}

impl FramePattern {
    /// Create a pattern. `digits` is clamped to at least 1.
    pub fn new(prefix: impl Into<String>, digits: usize, extension: &str) -> Self {
        Self {
            prefix: prefix.into(),
            digits: digits.max(1),
            extension: clean_extension(extension),
        }
    }

    /// Fixed width of the numeric part.
    pub fn digits(&self) -> usize {
        self.digits
    }

    /// Image file extension of staged frames.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// The printf-style pattern handed to the decoder, e.g. `frame%06d.png`.
    pub fn printf_pattern(&self) -> String {
        format!("{}%0{}d.{}", self.prefix, self.digits, self.extension)
    }

    /// File name of the frame with 1-based `index`.
    pub fn file_name(&self, index: u64) -> String {
        format!(
            "{}{:0width$}.{}",
            self.prefix,
            index,
            self.extension,
            width = self.digits
        )
    }

    /// The numeric part of `name` if it is a frame file of this pattern,
    /// whatever its width.
    pub(crate) fn index_digits<'a>(&self, name: &'a str) -> Option<&'a str> {
        let digits = name
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.extension.as_str())?
            .strip_suffix('.')?;
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            Some(digits)
        } else {
            None
        }
    }

    /// Returns `true` if `name` is a frame file of this pattern.
    pub fn matches(&self, name: &str) -> bool {
        self.index_digits(name).is_some()
    }
}

/// Configuration for a batch conversion.
///
/// All fields have defaults matching the classic tool: `.mp4` in, `.tiff`
/// out, RGB8 pages, Deflate compression, one job at a time, external
/// `ffmpeg` from `PATH`, no timeout.
#[derive(Clone)]
pub struct ConversionOptions {
    pub(crate) input_extension: String,
    pub(crate) output_extension: String,
    pub(crate) frame_pattern: FramePattern,
    pub(crate) pixel_format: PixelFormat,
    pub(crate) compression: StackCompression,
    pub(crate) workers: usize,
    pub(crate) extraction_timeout: Option<Duration>,
    pub(crate) ffmpeg_program: PathBuf,
    pub(crate) decoder_log_level: DecoderLogLevel,
    pub(crate) progress: Arc<dyn ProgressCallback>,
}

impl Debug for ConversionOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ConversionOptions")
            .field("input_extension", &self.input_extension)
            .field("output_extension", &self.output_extension)
            .field("frame_pattern", &self.frame_pattern.printf_pattern())
            .field("pixel_format", &self.pixel_format)
            .field("compression", &self.compression)
            .field("workers", &self.workers)
            .field("extraction_timeout", &self.extraction_timeout)
            .field("ffmpeg_program", &self.ffmpeg_program)
            .field("decoder_log_level", &self.decoder_log_level)
            .finish_non_exhaustive()
    }
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            input_extension: DEFAULT_INPUT_EXTENSION.to_string(),
            output_extension: DEFAULT_OUTPUT_EXTENSION.to_string(),
            frame_pattern: FramePattern::default(),
            pixel_format: PixelFormat::default(),
            compression: StackCompression::default(),
            workers: 1,
            extraction_timeout: None,
            ffmpeg_program: PathBuf::from("ffmpeg"),
            decoder_log_level: DecoderLogLevel::Error,
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Set the accepted input extension (case-insensitive, dot optional).
    #[must_use]
    pub fn with_input_extension(mut self, extension: &str) -> Self {
        self.input_extension = clean_extension(extension);
        self
    }

    /// Set the stack file extension.
    #[must_use]
    pub fn with_output_extension(mut self, extension: &str) -> Self {
        self.output_extension = clean_extension(extension);
        self
    }

    /// Set the staged frame naming contract.
    #[must_use]
    pub fn with_frame_pattern(mut self, pattern: FramePattern) -> Self {
        self.frame_pattern = pattern;
        self
    }

    /// Set the pixel layout of stack pages.
    #[must_use]
    pub fn with_pixel_format(mut self, format: PixelFormat) -> Self {
        self.pixel_format = format;
        self
    }

    /// Set the lossless compression of stack pages.
    #[must_use]
    pub fn with_compression(mut self, compression: StackCompression) -> Self {
        self.compression = compression;
        self
    }

    /// Set how many jobs may run at once. Clamped to a minimum of 1.
    ///
    /// Values above 1 only take effect when the `rayon` feature is enabled.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Kill the external decoder if it runs longer than `timeout`.
    #[must_use]
    pub fn with_extraction_timeout(mut self, timeout: Duration) -> Self {
        self.extraction_timeout = Some(timeout);
        self
    }

    /// Use a specific `ffmpeg` executable instead of the one on `PATH`.
    #[must_use]
    pub fn with_ffmpeg_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.ffmpeg_program = program.into();
        self
    }

    /// Set how chatty the decoder's own console output is.
    #[must_use]
    pub fn with_decoder_log_level(mut self, level: DecoderLogLevel) -> Self {
        self.decoder_log_level = level;
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// The accepted input extension.
    pub fn input_extension(&self) -> &str {
        &self.input_extension
    }

    /// The stack file extension.
    pub fn output_extension(&self) -> &str {
        &self.output_extension
    }

    /// The staged frame naming contract.
    pub fn frame_pattern(&self) -> &FramePattern {
        &self.frame_pattern
    }

    /// Maximum number of concurrent jobs.
    pub fn workers(&self) -> usize {
        self.workers
    }
}
