//! Frame loading.
//!
//! [`load_frames`] reads the images a [`FrameExtractor`](crate::FrameExtractor)
//! left in a staging directory and returns them as a [`FrameSequence`] in
//! temporal order, every frame converted to the same [`PixelFormat`].
//!
//! Order comes from the file names alone: the staged frames follow a
//! fixed-width [`FramePattern`], so ascending lexicographic order is frame
//! order. A name whose counter outgrew the fixed width would sort wrongly and
//! is refused instead.

use std::{
    fs,
    path::{Path, PathBuf},
};

use image::DynamicImage;

use crate::{
    configuration::{FramePattern, PixelFormat},
    error::StackError,
};

/// A non-empty, ordered run of decoded frames sharing one pixel layout and
/// one size.
#[derive(Debug, Clone)]
pub struct FrameSequence {
    frames: Vec<DynamicImage>,
}

impl FrameSequence {
    /// Wrap decoded frames, index 0 being the earliest.
    ///
    /// # Errors
    ///
    /// - [`StackError::EmptyFrameSequence`] if `frames` is empty.
    /// - [`StackError::FrameMismatch`] if a frame's size differs from the
    ///   first frame's.
    pub fn new(frames: Vec<DynamicImage>) -> Result<Self, StackError> {
        let first = frames.first().ok_or(StackError::EmptyFrameSequence)?;
        let (expected_width, expected_height) = (first.width(), first.height());

        if let Some((index, frame)) = frames
            .iter()
            .enumerate()
            .find(|(_, frame)| frame.width() != expected_width || frame.height() != expected_height)
        {
            return Err(StackError::FrameMismatch {
                index,
                expected_width,
                expected_height,
                actual_width: frame.width(),
                actual_height: frame.height(),
            });
        }

        Ok(Self { frames })
    }

    /// Number of frames. Never zero.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always `false`; present for API symmetry with collections.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// `(width, height)` shared by every frame.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.frames[0].width(), self.frames[0].height())
    }

    /// The frames in temporal order.
    pub fn frames(&self) -> &[DynamicImage] {
        &self.frames
    }

    /// Iterate over the frames in temporal order.
    pub fn iter(&self) -> std::slice::Iter<'_, DynamicImage> {
        self.frames.iter()
    }

    /// Give up the frames.
    pub fn into_frames(self) -> Vec<DynamicImage> {
        self.frames
    }
}

impl<'a> IntoIterator for &'a FrameSequence {
    type Item = &'a DynamicImage;
    type IntoIter = std::slice::Iter<'a, DynamicImage>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

/// List the frame files of `staging_dir` in temporal order.
///
/// # Errors
///
/// Returns [`StackError::LoadError`] if the directory cannot be read or a
/// frame name has more digits than `pattern` allows.
pub fn staged_frame_paths(
    staging_dir: &Path,
    pattern: &FramePattern,
) -> Result<Vec<PathBuf>, StackError> {
    let entries = fs::read_dir(staging_dir).map_err(|error| StackError::LoadError {
        path: staging_dir.to_path_buf(),
        reason: error.to_string(),
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let Some(digits) = pattern.index_digits(&name) else {
            continue;
        };
        if digits.len() != pattern.digits() {
            return Err(StackError::LoadError {
                path: entry.path(),
                reason: format!(
                    "frame number has {} digits, the naming contract fixes {}",
                    digits.len(),
                    pattern.digits()
                ),
            });
        }
        names.push(name);
    }

    names.sort_unstable();
    Ok(names
        .into_iter()
        .map(|name| staging_dir.join(name))
        .collect())
}

/// Decode every staged frame of `staging_dir` in order.
///
/// # Errors
///
/// - [`StackError::LoadError`] if no frame files are present, or any one of
///   them cannot be decoded. A single corrupt frame fails the whole load.
/// - [`StackError::FrameMismatch`] if frames differ in size.
pub fn load_frames(
    staging_dir: &Path,
    pattern: &FramePattern,
    pixel_format: PixelFormat,
) -> Result<FrameSequence, StackError> {
    let paths = staged_frame_paths(staging_dir, pattern)?;
    if paths.is_empty() {
        return Err(StackError::LoadError {
            path: staging_dir.to_path_buf(),
            reason: format!("no frames matching {}", pattern.printf_pattern()),
        });
    }

    log::debug!(
        "Loading {} frame(s) from {}",
        paths.len(),
        staging_dir.display()
    );

    let mut frames = Vec::with_capacity(paths.len());
    for path in &paths {
        let image = image::open(path).map_err(|error| StackError::LoadError {
            path: path.clone(),
            reason: error.to_string(),
        })?;
        frames.push(pixel_format.apply(image));
    }

    FrameSequence::new(frames)
}
