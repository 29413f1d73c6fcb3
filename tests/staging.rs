//! Staging directory lifecycle tests.

use std::fs;

use tempfile::TempDir;
use vidstack::StagingDirectory;

#[test]
fn acquire_creates_named_directory_beside_source() {
    let base = TempDir::new().unwrap();

    let staging = StagingDirectory::acquire(base.path(), "clip").expect("Failed to acquire");
    assert_eq!(staging.path(), base.path().join("temp_frames_clip"));
    assert!(staging.path().is_dir());

    staging.release().expect("Failed to release");
    assert!(!base.path().join("temp_frames_clip").exists());
}

#[test]
fn drop_removes_directory_and_contents() {
    let base = TempDir::new().unwrap();
    let path = {
        let staging = StagingDirectory::acquire(base.path(), "clip").unwrap();
        fs::write(staging.path().join("frame000001.png"), b"x").unwrap();
        staging.path().to_path_buf()
    };

    assert!(!path.exists());
}

#[test]
fn acquire_reuses_and_clears_existing_directory() {
    let base = TempDir::new().unwrap();
    let leftover = base.path().join("temp_frames_clip");
    fs::create_dir(&leftover).unwrap();
    fs::write(leftover.join("frame000099.png"), b"stale").unwrap();

    let staging = StagingDirectory::acquire(base.path(), "clip").expect("Existing dir is fine");
    assert_eq!(fs::read_dir(staging.path()).unwrap().count(), 0);
}

#[test]
fn release_tolerates_vanished_directory() {
    let base = TempDir::new().unwrap();
    let staging = StagingDirectory::acquire(base.path(), "clip").unwrap();
    fs::remove_dir_all(staging.path()).unwrap();

    assert!(staging.release().is_ok());
}

#[test]
fn jobs_with_different_names_do_not_share_directories() {
    let base = TempDir::new().unwrap();
    let first = StagingDirectory::acquire(base.path(), "a").unwrap();
    let second = StagingDirectory::acquire(base.path(), "b").unwrap();

    assert_ne!(first.path(), second.path());
    fs::write(first.path().join("frame000001.png"), b"x").unwrap();
    assert_eq!(fs::read_dir(second.path()).unwrap().count(), 0);

    first.release().unwrap();
    assert!(second.path().is_dir());
}

#[test]
fn path_for_matches_acquired_path() {
    let base = TempDir::new().unwrap();
    let expected = StagingDirectory::path_for(base.path(), "clip");
    let staging = StagingDirectory::acquire(base.path(), "clip").unwrap();
    assert_eq!(staging.path(), expected);
}
