//! # vidstack
//!
//! Convert video files into multi-page TIFF stacks, one stack per video.
//!
//! Each video is decoded into numbered still frames inside a job-exclusive
//! staging directory, the frames are loaded back in order with one pixel
//! layout, and the sequence is written as a single losslessly compressed
//! multi-page TIFF beside the source (`clip.mp4` → `clip.tiff`). Every job
//! cleans up its staging directory whatever happens, and one failing file
//! never stops the rest of the batch.
//!
//! ## Quick Start
//!
//! ```no_run
//! use vidstack::{BatchConverter, ConversionOptions};
//!
//! let converter = BatchConverter::new(ConversionOptions::new());
//! let report = converter.run(["/videos/a.mp4", "/videos/b.mp4"])?;
//!
//! if report.is_success() {
//!     println!("{report}");
//! } else {
//!     for (source, message) in &report.failed {
//!         eprintln!("{}: {message}", source.display());
//!     }
//! }
//! # Ok::<(), vidstack::StackError>(())
//! ```
//!
//! ### Drag-and-drop payloads
//!
//! ```no_run
//! use vidstack::{BatchConverter, ConversionOptions};
//!
//! let converter = BatchConverter::new(ConversionOptions::new());
//! let report = converter.run_payload("{/videos/my clip.mp4} /videos/other.mp4")?;
//! # Ok::<(), vidstack::StackError>(())
//! ```
//!
//! ## Pipeline
//!
//! - **Path normalization** ([`normalize`], [`split_payload`]): clean raw
//!   path strings and keep only existing files with the accepted extension
//! - **Staging** ([`StagingDirectory`]): a scoped `temp_frames_<name>`
//!   directory per job
//! - **Extraction** ([`FrameExtractor`], [`FfmpegCommand`]): decode the video
//!   into fixed-width numbered images ([`FramePattern`])
//! - **Loading** ([`load_frames`]): ordered, pixel-normalized
//!   [`FrameSequence`]
//! - **Assembly** ([`assemble`]): multi-page TIFF, Deflate by default
//! - **Orchestration** ([`BatchConverter`]): per-job failure isolation and
//!   a [`BatchReport`]
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `libav` | [`LibavExtractor`] decodes in-process through `ffmpeg-next` |
//! | `rayon` | Run jobs on a bounded worker pool ([`ConversionOptions::with_workers`]) |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! The default extractor runs the `ffmpeg` executable, which must be on
//! `PATH` or configured with [`ConversionOptions::with_ffmpeg_program`]. The
//! `libav` feature needs the FFmpeg development libraries instead.

pub mod assembler;
pub mod batch;
pub mod configuration;
pub mod error;
pub mod extractor;
pub mod ffmpeg;
#[cfg(feature = "libav")]
pub mod libav;
pub mod loader;
pub mod normalize;
pub mod progress;
pub mod report;
pub mod staging;

pub use assembler::{PageInfo, StackInfo, assemble, inspect_stack, read_stack, write_stack};
pub use batch::BatchConverter;
pub use configuration::{
    ConversionOptions, DEFAULT_INPUT_EXTENSION, DEFAULT_OUTPUT_EXTENSION, FramePattern,
    PixelFormat, StackCompression,
};
pub use error::{Rejection, StackError};
pub use extractor::{FfmpegCommand, FrameExtractor, count_frames};
pub use ffmpeg::DecoderLogLevel;
#[cfg(feature = "libav")]
pub use libav::LibavExtractor;
pub use loader::{FrameSequence, load_frames, staged_frame_paths};
pub use normalize::{normalize, split_payload};
pub use progress::{ProgressCallback, ProgressInfo};
pub use report::{BatchReport, ConversionJob, ConversionOutcome, JobState};
pub use staging::StagingDirectory;
