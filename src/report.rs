//! Jobs, outcomes, and the batch report.
//!
//! A [`ConversionJob`] describes the conversion of one source video. Each job
//! walks the [`JobState`] machine and ends in exactly one
//! [`ConversionOutcome`]; the outcomes of a batch are folded into a
//! [`BatchReport`], whose `Display` output is the single notice shown to the
//! user once the batch is done.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};

use crate::staging::StagingDirectory;

/// Lifecycle of a single conversion job.
///
/// `Pending → Extracting → Loading → Assembling → CleaningUp → Succeeded`,
/// or from any working state straight to `CleaningUp → Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    /// Created, nothing done yet.
    Pending,
    /// The decoder is writing frames into the staging directory.
    Extracting,
    /// Staged frames are being decoded into memory.
    Loading,
    /// The stack is being written.
    Assembling,
    /// The staging directory is being removed.
    CleaningUp,
    /// The stack was written.
    Succeeded,
    /// A stage failed; no stack was written.
    Failed,
}

impl JobState {
    /// Returns `true` for `Succeeded` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }
}

/// Paths involved in converting one source video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    /// The source video.
    pub source_path: PathBuf,
    /// The job's staging directory, next to the source.
    pub staging_dir: PathBuf,
    /// Where the stack is written: the source's directory and base name with
    /// the container extension.
    pub output_path: PathBuf,
}

impl ConversionJob {
    /// Derive the job for `source_path`, writing stacks with
    /// `output_extension`.
    pub fn new(source_path: &Path, output_extension: &str) -> Self {
        let base_dir = source_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let name = Self::job_name(source_path);

        Self {
            source_path: source_path.to_path_buf(),
            staging_dir: StagingDirectory::path_for(&base_dir, &name),
            output_path: source_path.with_extension(output_extension),
        }
    }

    /// The source's base name without extension, used to name the staging
    /// directory.
    pub fn job_name(source_path: &Path) -> String {
        source_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string())
    }

    /// The directory the staging directory and output live in.
    pub fn base_dir(&self) -> &Path {
        self.source_path.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Result of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    /// The stack was written to `output`.
    Success {
        /// The source video.
        source: PathBuf,
        /// The written stack.
        output: PathBuf,
    },
    /// The job failed during `stage`.
    Failure {
        /// The source video.
        source: PathBuf,
        /// The state the job was in when the error occurred.
        stage: JobState,
        /// Human-readable cause.
        message: String,
    },
}

impl ConversionOutcome {
    /// Returns `true` for [`ConversionOutcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, ConversionOutcome::Success { .. })
    }

    /// The source video of this outcome.
    pub fn source(&self) -> &Path {
        match self {
            ConversionOutcome::Success { source, .. }
            | ConversionOutcome::Failure { source, .. } => source,
        }
    }
}

/// Aggregate result of one batch run.
///
/// Both lists are in input order. Rejected inputs appear in neither.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Stacks that were written.
    pub succeeded: Vec<PathBuf>,
    /// Sources that failed, with the reason.
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchReport {
    /// Fold a job outcome into the report.
    pub fn record(&mut self, outcome: ConversionOutcome) {
        match outcome {
            ConversionOutcome::Success { output, .. } => self.succeeded.push(output),
            ConversionOutcome::Failure {
                source, message, ..
            } => self.failed.push((source, message)),
        }
    }

    /// Returns `true` if every job succeeded.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of jobs in the batch.
    pub fn job_count(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

impl FromIterator<ConversionOutcome> for BatchReport {
    fn from_iter<I: IntoIterator<Item = ConversionOutcome>>(iter: I) -> Self {
        let mut report = BatchReport::default();
        for outcome in iter {
            report.record(outcome);
        }
        report
    }
}

impl Display for BatchReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.is_success() {
            return writeln!(
                f,
                "All {} file(s) converted successfully.",
                self.succeeded.len()
            );
        }

        for (source, message) in &self.failed {
            writeln!(f, "[ERROR] {}: {message}", source.display())?;
        }
        writeln!(
            f,
            "{} of {} file(s) failed.",
            self.failed.len(),
            self.job_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_paths_are_colocated_with_source() {
        let job = ConversionJob::new(Path::new("/videos/clip.mp4"), "tiff");
        assert_eq!(job.output_path, PathBuf::from("/videos/clip.tiff"));
        assert_eq!(job.staging_dir, PathBuf::from("/videos/temp_frames_clip"));
        assert_eq!(job.base_dir(), Path::new("/videos"));
    }

    #[test]
    fn report_display_all_success() {
        let report: BatchReport = [ConversionOutcome::Success {
            source: PathBuf::from("/v/a.mp4"),
            output: PathBuf::from("/v/a.tiff"),
        }]
        .into_iter()
        .collect();
        assert!(report.is_success());
        assert_eq!(report.to_string(), "All 1 file(s) converted successfully.\n");
    }

    #[test]
    fn report_display_lists_failures() {
        let report: BatchReport = [
            ConversionOutcome::Success {
                source: PathBuf::from("/v/a.mp4"),
                output: PathBuf::from("/v/a.tiff"),
            },
            ConversionOutcome::Failure {
                source: PathBuf::from("/v/b.mp4"),
                stage: JobState::Extracting,
                message: "boom".to_string(),
            },
        ]
        .into_iter()
        .collect();
        assert!(!report.is_success());
        assert_eq!(report.job_count(), 2);
        let text = report.to_string();
        assert!(text.contains("[ERROR] /v/b.mp4: boom"));
        assert!(text.contains("1 of 2 file(s) failed."));
    }

    #[test]
    fn terminal_states() {
        assert!(JobState::Succeeded.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(!JobState::CleaningUp.is_terminal());
    }
}
