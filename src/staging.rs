//! Per-job staging directories.
//!
//! Every conversion job decodes its frames into a directory of its own,
//! created next to the source video and named after it
//! (`temp_frames_<name>`). [`StagingDirectory`] owns that directory for the
//! lifetime of the job and removes it, with everything in it, when it goes out
//! of scope. Whatever stage fails, the directory is gone by the time the job's
//! outcome is recorded.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Prefix of every staging directory name.
pub const STAGING_PREFIX: &str = "temp_frames_";

/// A scoped, job-exclusive staging directory.
///
/// Removal happens exactly once: either through [`release`](Self::release),
/// which hands the I/O result back to the caller, or through `Drop`, which
/// logs a failure and moves on.
#[derive(Debug)]
pub struct StagingDirectory {
    path: PathBuf,
    removed: bool,
}

impl StagingDirectory {
    /// Create (or reuse) `<base_dir>/temp_frames_<job_name>`.
    ///
    /// An already-existing directory is not an error. Anything left in it by
    /// an earlier, interrupted run is removed first so the extractor starts
    /// from an empty directory.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the directory cannot be cleared or created.
    pub fn acquire(base_dir: &Path, job_name: &str) -> io::Result<Self> {
        let path = Self::path_for(base_dir, job_name);

        if path.is_dir() {
            log::debug!("Clearing leftover staging directory {}", path.display());
            fs::remove_dir_all(&path)?;
        }
        fs::create_dir_all(&path)?;

        log::debug!("Acquired staging directory {}", path.display());
        Ok(Self {
            path,
            removed: false,
        })
    }

    /// Where the staging directory of `job_name` lives under `base_dir`.
    pub fn path_for(base_dir: &Path, job_name: &str) -> PathBuf {
        base_dir.join(format!("{STAGING_PREFIX}{job_name}"))
    }

    /// The directory's path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory now and report the outcome.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from removal. A directory that has already
    /// vanished counts as removed.
    pub fn release(mut self) -> io::Result<()> {
        self.removed = true;
        remove(&self.path)
    }
}

impl Drop for StagingDirectory {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;
        if let Err(error) = remove(&self.path) {
            log::warn!(
                "Failed to remove staging directory {}: {error}",
                self.path.display()
            );
        }
    }
}

fn remove(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            log::debug!("Removed staging directory {}", path.display());
            Ok(())
        }
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(error),
    }
}
