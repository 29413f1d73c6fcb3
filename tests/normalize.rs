//! Path normalization integration tests.

use std::fs;

use tempfile::TempDir;
use vidstack::{Rejection, normalize, split_payload};

fn touch(dir: &TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, b"not really a video").expect("Failed to create file");
    path.canonicalize().expect("Failed to canonicalize")
}

#[test]
fn existing_file_is_accepted() {
    let dir = TempDir::new().unwrap();
    let path = touch(&dir, "clip.mp4");

    let normalized = normalize(path.to_str().unwrap(), "mp4").expect("Expected a path");
    assert_eq!(normalized, path);
    assert!(normalized.is_absolute());
}

#[test]
fn braces_and_whitespace_are_stripped() {
    let dir = TempDir::new().unwrap();
    let path = touch(&dir, "my clip.mp4");

    let raw = format!("  {{{}}}\n", path.display());
    assert_eq!(normalize(&raw, "mp4").unwrap(), path);
}

#[test]
fn extension_check_ignores_case() {
    let dir = TempDir::new().unwrap();
    let path = touch(&dir, "LOUD.MP4");

    assert_eq!(normalize(path.to_str().unwrap(), "mp4").unwrap(), path);
    assert_eq!(normalize(path.to_str().unwrap(), ".Mp4").unwrap(), path);
}

#[test]
fn backslashes_become_forward_slashes() {
    let dir = TempDir::new().unwrap();
    let path = touch(&dir, "clip.mp4");

    let raw = path.to_str().unwrap().replace('/', "\\");
    assert_eq!(normalize(&raw, "mp4").unwrap(), path);
}

#[test]
fn wrong_extension_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = touch(&dir, "clip.mov");

    match normalize(path.to_str().unwrap(), "mp4") {
        Err(Rejection::UnsupportedExtension { path: rejected, expected }) => {
            assert_eq!(rejected, path);
            assert_eq!(expected, "mp4");
        }
        other => panic!("Expected UnsupportedExtension, got: {other:?}"),
    }
}

#[test]
fn missing_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gone.mp4");

    assert!(matches!(
        normalize(path.to_str().unwrap(), "mp4"),
        Err(Rejection::NotAFile { .. })
    ));
}

#[test]
fn directory_is_rejected_even_with_matching_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("folder.mp4");
    fs::create_dir(&path).unwrap();

    assert!(matches!(
        normalize(path.to_str().unwrap(), "mp4"),
        Err(Rejection::NotAFile { .. })
    ));
}

#[test]
fn dot_dot_segments_resolve_to_the_same_file() {
    let dir = TempDir::new().unwrap();
    let path = touch(&dir, "clip.mp4");
    fs::create_dir(dir.path().join("sub")).unwrap();

    let roundabout = dir.path().join("sub").join("..").join("clip.mp4");
    assert_eq!(normalize(roundabout.to_str().unwrap(), "mp4").unwrap(), path);
}

#[test]
fn blank_input_is_rejected() {
    assert_eq!(normalize("", "mp4"), Err(Rejection::Empty));
    assert_eq!(normalize("   ", "mp4"), Err(Rejection::Empty));
}

#[test]
fn payload_entries_normalize_independently() {
    let dir = TempDir::new().unwrap();
    let spaced = touch(&dir, "with space.mp4");
    let plain = touch(&dir, "plain.mp4");
    let other = touch(&dir, "notes.txt");

    let payload = format!(
        "{{{}}} {} {}",
        spaced.display(),
        plain.display(),
        other.display()
    );
    let results: Vec<_> = split_payload(&payload)
        .iter()
        .map(|raw| normalize(raw, "mp4"))
        .collect();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap(), &spaced);
    assert_eq!(results[1].as_ref().unwrap(), &plain);
    assert!(results[2].is_err());
}
