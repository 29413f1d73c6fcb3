//! Error types for the `vidstack` crate.
//!
//! This module defines [`StackError`], the unified error type returned by every
//! fallible pipeline operation, and [`Rejection`], the reason an input path was
//! skipped by the path normalizer. Errors carry the file they concern so a
//! batch report can say exactly which input failed and why.

use std::{io::Error as IoError, path::PathBuf, time::Duration};

use image::ImageError;
use thiserror::Error;
use tiff::TiffError;

/// Why a raw input path was not turned into a conversion job.
///
/// Rejections are not failures: the orchestrator skips the input and keeps
/// going. They only surface as diagnostic notices.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Rejection {
    /// Nothing was left after stripping whitespace and braces.
    #[error("empty path")]
    Empty,

    /// The path does not name an existing regular file.
    #[error("{path} is not an existing file")]
    NotAFile {
        /// The cleaned path that was checked.
        path: PathBuf,
    },

    /// The file exists but does not carry the accepted extension.
    #[error("{path} does not have the .{expected} extension")]
    UnsupportedExtension {
        /// The cleaned path that was checked.
        path: PathBuf,
        /// The extension the batch accepts.
        expected: String,
    },

    /// Another input of the batch already writes the same stack.
    #[error("{path} would overwrite {output}, which an earlier input already produces")]
    OutputConflict {
        /// The later input.
        path: PathBuf,
        /// The stack both inputs map to.
        output: PathBuf,
    },
}

/// The unified error type for all `vidstack` operations.
///
/// Extraction, load, and assembly errors are caught at the job boundary by
/// [`BatchConverter`](crate::BatchConverter) and recorded against the source
/// file; [`StackError::NoValidInput`] is the only batch-fatal variant.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StackError {
    /// Every input of the batch was rejected, so there is nothing to convert.
    #[error("No valid input: none of the {supplied} supplied path(s) is a .{extension} file")]
    NoValidInput {
        /// How many raw inputs the caller supplied.
        supplied: usize,
        /// The extension that was expected.
        extension: String,
    },

    /// An input path was rejected by the normalizer.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] Rejection),

    /// The external decoder could not be found or started.
    #[error("Frame extractor `{program}` is unavailable: {reason}")]
    ExtractorUnavailable {
        /// Program name or path that was looked up.
        program: String,
        /// Why it could not be used.
        reason: String,
    },

    /// The decoder ran but failed on this file.
    #[error("Failed to extract frames from {path}: {reason}")]
    ExtractionFailed {
        /// The source video.
        path: PathBuf,
        /// Decoder diagnostics.
        reason: String,
    },

    /// The decoder did not finish within the configured timeout.
    #[error("Frame extraction from {path} timed out after {timeout:?}")]
    ExtractionTimedOut {
        /// The source video.
        path: PathBuf,
        /// The timeout that expired.
        timeout: Duration,
    },

    /// The decoder finished but wrote no frames.
    #[error("No frames extracted from {path}")]
    NoFramesExtracted {
        /// The source video.
        path: PathBuf,
    },

    /// Staged frames were missing or could not be decoded.
    #[error("Failed to load frames from {path}: {reason}")]
    LoadError {
        /// The staging directory or the offending frame file.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// A staged frame has different dimensions from the first frame.
    #[error(
        "Frame {index} is {actual_width}x{actual_height}, expected {expected_width}x{expected_height}"
    )]
    FrameMismatch {
        /// Zero-based index of the offending frame.
        index: usize,
        /// Width of frame 0.
        expected_width: u32,
        /// Height of frame 0.
        expected_height: u32,
        /// Width of the offending frame.
        actual_width: u32,
        /// Height of the offending frame.
        actual_height: u32,
    },

    /// A frame sequence was built or assembled with no frames.
    #[error("Frame sequence is empty")]
    EmptyFrameSequence,

    /// The stack could not be written.
    #[error("Failed to write stack {path}: {reason}")]
    AssembleError {
        /// The intended output file.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while decoding a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// An error from the `tiff` crate while encoding or decoding a stack.
    #[error("TIFF error: {0}")]
    TiffError(#[from] TiffError),

    /// An error originating from the FFmpeg libraries.
    #[cfg(feature = "libav")]
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),
}

#[cfg(feature = "libav")]
impl From<ffmpeg_next::Error> for StackError {
    fn from(error: ffmpeg_next::Error) -> Self {
        StackError::FfmpegError(error.to_string())
    }
}
