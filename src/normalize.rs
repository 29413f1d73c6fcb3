//! Input path normalization.
//!
//! Paths delivered by a drag-and-drop payload arrive mangled: wrapped in
//! braces when they contain spaces, several paths glued into one string,
//! Windows separators mixed in. [`normalize`] turns one raw string into a
//! usable absolute path or a [`Rejection`], and [`split_payload`] breaks a
//! multi-path payload apart.
//!
//! # Example
//!
//! ```no_run
//! use vidstack::{normalize, split_payload};
//!
//! for raw in split_payload("{/videos/my clip.mp4} /videos/other.mp4") {
//!     match normalize(&raw, "mp4") {
//!         Ok(path) => println!("will convert {}", path.display()),
//!         Err(rejection) => println!("skipping: {rejection}"),
//!     }
//! }
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::Rejection;

/// Clean and validate one raw path string.
///
/// Strips surrounding whitespace and braces, turns `\` into `/`, makes the
/// result absolute and canonical, and checks that it names an existing regular file whose
/// extension matches `accepted_extension` (case-insensitive, leading dot
/// optional).
///
/// # Errors
///
/// Returns a [`Rejection`] describing why the input is unusable. Rejections
/// are skips, not failures.
pub fn normalize(raw: &str, accepted_extension: &str) -> Result<PathBuf, Rejection> {
    let cleaned = raw
        .trim()
        .trim_matches(|c| c == '{' || c == '}')
        .trim()
        .replace('\\', "/");

    if cleaned.is_empty() {
        return Err(Rejection::Empty);
    }

    let path = absolute(Path::new(&cleaned));

    if !path.is_file() {
        return Err(Rejection::NotAFile { path });
    }

    if !has_extension(&path, accepted_extension) {
        return Err(Rejection::UnsupportedExtension {
            path,
            expected: clean_extension(accepted_extension),
        });
    }

    // Resolves `..` and symlinks so one file always yields one path.
    fs::canonicalize(&path).map_err(|_| Rejection::NotAFile { path })
}

/// Split a drag-and-drop payload into raw path strings.
///
/// Entries are separated by whitespace. An entry wrapped in braces is kept
/// whole, spaces included, which is how Tk-style drop payloads quote paths.
/// An unbalanced opening brace swallows the rest of the payload as one entry;
/// it will be rejected on its own without affecting earlier siblings.
pub fn split_payload(payload: &str) -> Vec<String> {
    let mut entries = Vec::new();
    let mut current = String::new();
    let mut in_braces = false;

    for character in payload.chars() {
        match character {
            '{' if !in_braces && current.is_empty() => in_braces = true,
            '}' if in_braces => {
                in_braces = false;
                entries.push(std::mem::take(&mut current));
            }
            c if c.is_whitespace() && !in_braces => {
                if !current.is_empty() {
                    entries.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }

    if !current.is_empty() {
        entries.push(current);
    }

    entries.retain(|entry| !entry.trim().is_empty());
    entries
}

/// Returns `true` if `path` ends in `extension`, ignoring ASCII case.
pub(crate) fn has_extension(path: &Path, extension: &str) -> bool {
    let expected = clean_extension(extension);
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(&expected))
}

/// Strip a leading dot and lowercase an extension.
pub(crate) fn clean_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_ascii_lowercase()
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
