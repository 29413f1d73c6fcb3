//! Batch conversion.
//!
//! [`BatchConverter`] is the entry point of the crate. Given raw input
//! strings it normalizes them, turns every usable one into a
//! [`ConversionJob`], and drives each job through extraction, loading, and
//! assembly inside its own [`StagingDirectory`]. Jobs are isolated from each
//! other: a failing job is recorded in the [`BatchReport`] and the batch moves
//! on.
//!
//! # Example
//!
//! ```no_run
//! use vidstack::{BatchConverter, ConversionOptions};
//!
//! let converter = BatchConverter::new(ConversionOptions::new());
//! let report = converter.run_payload("{/videos/my clip.mp4} /videos/other.mp4")?;
//! print!("{report}");
//! # Ok::<(), vidstack::StackError>(())
//! ```

use std::{collections::HashSet, sync::Arc};

use crate::{
    assembler::assemble,
    configuration::ConversionOptions,
    error::{Rejection, StackError},
    extractor::{FfmpegCommand, FrameExtractor},
    loader::load_frames,
    normalize::{normalize, split_payload},
    progress::JobTracker,
    report::{BatchReport, ConversionJob, ConversionOutcome, JobState},
    staging::StagingDirectory,
};

/// Converts batches of videos into stacks.
///
/// Cheap to share: the extractor is reference-counted and the options are
/// only read.
#[derive(Clone)]
pub struct BatchConverter {
    options: ConversionOptions,
    extractor: Arc<dyn FrameExtractor>,
}

impl std::fmt::Debug for BatchConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchConverter")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl BatchConverter {
    /// Create a converter that extracts frames with the external `ffmpeg`
    /// configured in `options`.
    pub fn new(options: ConversionOptions) -> Self {
        let extractor = Arc::new(FfmpegCommand::from_options(&options));
        Self { options, extractor }
    }

    /// Use a different frame extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn FrameExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// The options this converter runs with.
    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }

    /// Normalize `inputs` into jobs without running them.
    ///
    /// Rejected inputs are skipped with a notice; duplicates are planned
    /// once. An input whose staging directory or stack would collide with an
    /// earlier job's (`clip.mp4` next to `clip.MP4`) is skipped with a
    /// [`Rejection::OutputConflict`] notice.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::NoValidInput`] if no input survives.
    pub fn plan<I, S>(&self, inputs: I) -> Result<Vec<ConversionJob>, StackError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut jobs = Vec::new();
        let mut seen_sources = HashSet::new();
        let mut claimed = HashSet::new();
        let mut supplied = 0;

        for raw in inputs {
            supplied += 1;
            let raw = raw.as_ref();
            let path = match normalize(raw, &self.options.input_extension) {
                Ok(path) => path,
                Err(rejection) => {
                    log::info!("Skipping invalid file {raw:?}: {rejection}");
                    self.options.progress.on_skipped(raw, &rejection);
                    continue;
                }
            };

            if !seen_sources.insert(path.clone()) {
                log::debug!("Ignoring duplicate input {}", path.display());
                continue;
            }

            // Jobs must never share a staging directory or an output file.
            let job = ConversionJob::new(&path, &self.options.output_extension);
            if claimed.contains(&job.staging_dir) || claimed.contains(&job.output_path) {
                let rejection = Rejection::OutputConflict {
                    path,
                    output: job.output_path,
                };
                log::warn!("Skipping {raw:?}: {rejection}");
                self.options.progress.on_skipped(raw, &rejection);
                continue;
            }
            claimed.insert(job.staging_dir.clone());
            claimed.insert(job.output_path.clone());
            jobs.push(job);
        }

        if jobs.is_empty() {
            return Err(StackError::NoValidInput {
                supplied,
                extension: self.options.input_extension.clone(),
            });
        }

        Ok(jobs)
    }

    /// Convert every usable input and report the outcome of each job.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::NoValidInput`], before doing any work, if none
    /// of `inputs` is an existing file with the accepted extension. Job
    /// failures are not errors; they are listed in the report.
    pub fn run<I, S>(&self, inputs: I) -> Result<BatchReport, StackError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let jobs = self.plan(inputs)?;
        log::info!("Converting {} file(s)", jobs.len());

        let report: BatchReport = self.convert_all(&jobs).into_iter().collect();

        log::info!(
            "Batch finished: {} succeeded, {} failed",
            report.succeeded.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Split a drag-and-drop payload and [`run`](Self::run) it.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub fn run_payload(&self, payload: &str) -> Result<BatchReport, StackError> {
        self.run(split_payload(payload))
    }

    /// Run one job to a terminal state.
    ///
    /// `job_index` and `job_total` only feed progress notifications.
    pub fn convert(
        &self,
        job: &ConversionJob,
        job_index: usize,
        job_total: usize,
    ) -> ConversionOutcome {
        let mut tracker = JobTracker::new(
            Arc::clone(&self.options.progress),
            job_index,
            job_total,
            &job.source_path,
        );
        tracker.enter(JobState::Pending);

        let job_name = ConversionJob::job_name(&job.source_path);
        let (stage, result) = match StagingDirectory::acquire(job.base_dir(), &job_name) {
            Ok(staging) => {
                let mut stage = JobState::Pending;
                let result = self.run_stages(job, &staging, &mut tracker, &mut stage);

                tracker.enter(JobState::CleaningUp);
                if let Err(error) = staging.release() {
                    log::warn!(
                        "Failed to remove staging directory {}: {error}",
                        job.staging_dir.display()
                    );
                }
                (stage, result)
            }
            Err(error) => {
                tracker.enter(JobState::CleaningUp);
                (JobState::Pending, Err(StackError::IoError(error)))
            }
        };

        match result {
            Ok(()) => {
                tracker.enter(JobState::Succeeded);
                log::info!(
                    "Converted {} -> {}",
                    job.source_path.display(),
                    job.output_path.display()
                );
                ConversionOutcome::Success {
                    source: job.source_path.clone(),
                    output: job.output_path.clone(),
                }
            }
            Err(error) => {
                tracker.enter(JobState::Failed);
                log::error!(
                    "Error occurred with {} while {stage:?}: {error}",
                    job.source_path.display()
                );
                ConversionOutcome::Failure {
                    source: job.source_path.clone(),
                    stage,
                    message: error.to_string(),
                }
            }
        }
    }

    fn run_stages(
        &self,
        job: &ConversionJob,
        staging: &StagingDirectory,
        tracker: &mut JobTracker,
        stage: &mut JobState,
    ) -> Result<(), StackError> {
        let pattern = &self.options.frame_pattern;

        *stage = JobState::Extracting;
        tracker.enter(JobState::Extracting);
        let frame_count = self
            .extractor
            .extract(&job.source_path, staging.path(), pattern)?;
        if frame_count == 0 {
            return Err(StackError::NoFramesExtracted {
                path: job.source_path.clone(),
            });
        }
        tracker.set_frame_count(frame_count);

        *stage = JobState::Loading;
        tracker.enter(JobState::Loading);
        let frames = load_frames(staging.path(), pattern, self.options.pixel_format)?;

        *stage = JobState::Assembling;
        tracker.enter(JobState::Assembling);
        assemble(&frames, &job.output_path, self.options.compression)
    }

    #[cfg(feature = "rayon")]
    fn convert_all(&self, jobs: &[ConversionJob]) -> Vec<ConversionOutcome> {
        use rayon::{ThreadPoolBuilder, prelude::*};

        let total = jobs.len();
        if self.options.workers > 1 && total > 1 {
            match ThreadPoolBuilder::new()
                .num_threads(self.options.workers)
                .thread_name(|index| format!("vidstack-worker-{index}"))
                .build()
            {
                Ok(pool) => {
                    return pool.install(|| {
                        jobs.par_iter()
                            .enumerate()
                            .map(|(index, job)| self.convert(job, index, total))
                            .collect()
                    });
                }
                Err(error) => {
                    log::warn!("Could not start worker pool, converting sequentially: {error}");
                }
            }
        }

        self.convert_sequentially(jobs)
    }

    #[cfg(not(feature = "rayon"))]
    fn convert_all(&self, jobs: &[ConversionJob]) -> Vec<ConversionOutcome> {
        if self.options.workers > 1 {
            log::warn!("Parallel conversion requires the `rayon` feature; converting sequentially");
        }
        self.convert_sequentially(jobs)
    }

    fn convert_sequentially(&self, jobs: &[ConversionJob]) -> Vec<ConversionOutcome> {
        let total = jobs.len();
        jobs.iter()
            .enumerate()
            .map(|(index, job)| self.convert(job, index, total))
            .collect()
    }
}
