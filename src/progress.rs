//! Progress reporting for batch conversions.
//!
//! [`ProgressCallback`] observes a batch while it runs: every job state
//! transition is delivered as a [`ProgressInfo`] snapshot, and every rejected
//! input is announced through [`ProgressCallback::on_skipped`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use vidstack::{
//!     BatchConverter, ConversionOptions, ProgressCallback, ProgressInfo, Rejection,
//! };
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!(
//!             "[{}/{}] {}: {:?}",
//!             info.job_index + 1,
//!             info.job_total,
//!             info.source.display(),
//!             info.state,
//!         );
//!     }
//!
//!     fn on_skipped(&self, raw: &str, reason: &Rejection) {
//!         println!("skipped {raw}: {reason}");
//!     }
//! }
//!
//! let options = ConversionOptions::new().with_progress(Arc::new(PrintProgress));
//! let report = BatchConverter::new(options).run(["clip.mp4"])?;
//! # Ok::<(), vidstack::StackError>(())
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::Rejection;
use crate::report::JobState;

/// A snapshot of one job's progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Zero-based position of the job in the batch.
    pub job_index: usize,
    /// Number of jobs in the batch.
    pub job_total: usize,
    /// The source video of this job.
    pub source: PathBuf,
    /// The state the job just entered.
    pub state: JobState,
    /// Wall-clock time since the job left `Pending`.
    pub elapsed: Duration,
    /// Frames extracted so far, once known.
    pub frame_count: Option<u64>,
}

/// Trait for receiving progress updates during a batch.
///
/// Implementations must be [`Send`] and [`Sync`] because jobs may run on
/// worker threads when the `rayon` feature is enabled.
///
/// Callbacks observe but cannot halt the batch.
pub trait ProgressCallback: Send + Sync {
    /// Called whenever a job changes state.
    fn on_progress(&self, info: &ProgressInfo);

    /// Called once for every input that was not turned into a job.
    fn on_skipped(&self, _raw: &str, _reason: &Rejection) {}
}

/// Discards all notifications. This is the default callback.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Internal helper that tracks one job's timing and emits callbacks.
pub(crate) struct JobTracker {
    callback: Arc<dyn ProgressCallback>,
    job_index: usize,
    job_total: usize,
    source: PathBuf,
    start_time: Instant,
    frame_count: Option<u64>,
}

impl JobTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        job_index: usize,
        job_total: usize,
        source: &Path,
    ) -> Self {
        Self {
            callback,
            job_index,
            job_total,
            source: source.to_path_buf(),
            start_time: Instant::now(),
            frame_count: None,
        }
    }

    pub(crate) fn set_frame_count(&mut self, count: u64) {
        self.frame_count = Some(count);
    }

    /// Announce that the job entered `state`.
    pub(crate) fn enter(&self, state: JobState) {
        log::debug!(
            "[{}/{}] {} -> {state:?}",
            self.job_index + 1,
            self.job_total,
            self.source.display()
        );

        let info = ProgressInfo {
            job_index: self.job_index,
            job_total: self.job_total,
            source: self.source.clone(),
            state,
            elapsed: self.start_time.elapsed(),
            frame_count: self.frame_count,
        };
        self.callback.on_progress(&info);
    }
}
