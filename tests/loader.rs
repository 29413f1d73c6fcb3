//! Frame loading tests.

use std::{fs, path::Path};

use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use tempfile::TempDir;
use vidstack::{
    FramePattern, FrameSequence, PixelFormat, StackError, load_frames, staged_frame_paths,
};

fn write_frame(dir: &Path, pattern: &FramePattern, index: u64, width: u32, height: u32) {
    let shade = (index % 256) as u8;
    RgbImage::from_pixel(width, height, Rgb([shade, 0, 255 - shade]))
        .save(dir.join(pattern.file_name(index)))
        .expect("Failed to write frame");
}

#[test]
fn frames_load_in_numeric_order() {
    let dir = TempDir::new().unwrap();
    let pattern = FramePattern::default();
    // Written out of order on purpose.
    for index in [3, 11, 1, 10, 2, 12, 4, 5, 6, 7, 8, 9] {
        write_frame(dir.path(), &pattern, index, 4, 3);
    }

    let frames = load_frames(dir.path(), &pattern, PixelFormat::Rgb8).expect("Failed to load");
    assert_eq!(frames.len(), 12);
    for (position, frame) in frames.iter().enumerate() {
        let expected = (position + 1) as u8;
        assert_eq!(frame.to_rgb8().get_pixel(0, 0)[0], expected);
    }
}

#[test]
fn unrelated_files_are_ignored() {
    let dir = TempDir::new().unwrap();
    let pattern = FramePattern::default();
    write_frame(dir.path(), &pattern, 1, 2, 2);
    write_frame(dir.path(), &pattern, 2, 2, 2);
    fs::write(dir.path().join("notes.txt"), b"hello").unwrap();
    fs::write(dir.path().join("frame000003.jpg"), b"other extension").unwrap();
    fs::create_dir(dir.path().join("frame000004.png")).unwrap();

    let paths = staged_frame_paths(dir.path(), &pattern).unwrap();
    assert_eq!(paths.len(), 2);
    assert!(paths[0].ends_with("frame000001.png"));
    assert!(paths[1].ends_with("frame000002.png"));
}

#[test]
fn empty_staging_directory_is_a_load_error() {
    let dir = TempDir::new().unwrap();
    match load_frames(dir.path(), &FramePattern::default(), PixelFormat::Rgb8) {
        Err(StackError::LoadError { .. }) => {}
        other => panic!("Expected LoadError, got: {other:?}"),
    }
}

#[test]
fn corrupt_frame_fails_the_whole_load() {
    let dir = TempDir::new().unwrap();
    let pattern = FramePattern::default();
    write_frame(dir.path(), &pattern, 1, 2, 2);
    fs::write(dir.path().join(pattern.file_name(2)), b"not a png").unwrap();
    write_frame(dir.path(), &pattern, 3, 2, 2);

    match load_frames(dir.path(), &pattern, PixelFormat::Rgb8) {
        Err(StackError::LoadError { path, .. }) => {
            assert!(path.ends_with("frame000002.png"));
        }
        other => panic!("Expected LoadError, got: {other:?}"),
    }
}

#[test]
fn mismatched_dimensions_are_rejected() {
    let dir = TempDir::new().unwrap();
    let pattern = FramePattern::default();
    write_frame(dir.path(), &pattern, 1, 4, 4);
    write_frame(dir.path(), &pattern, 2, 4, 4);
    write_frame(dir.path(), &pattern, 3, 5, 4);

    match load_frames(dir.path(), &pattern, PixelFormat::Rgb8) {
        Err(StackError::FrameMismatch {
            index,
            expected_width,
            actual_width,
            ..
        }) => {
            assert_eq!(index, 2);
            assert_eq!(expected_width, 4);
            assert_eq!(actual_width, 5);
        }
        other => panic!("Expected FrameMismatch, got: {other:?}"),
    }
}

#[test]
fn frame_numbers_wider_than_the_pattern_are_rejected() {
    let dir = TempDir::new().unwrap();
    let pattern = FramePattern::new("frame", 2, "png");
    write_frame(dir.path(), &pattern, 99, 2, 2);
    write_frame(dir.path(), &pattern, 100, 2, 2);

    assert!(matches!(
        load_frames(dir.path(), &pattern, PixelFormat::Rgb8),
        Err(StackError::LoadError { .. })
    ));
}

#[test]
fn pixel_format_is_applied_to_every_frame() {
    let dir = TempDir::new().unwrap();
    let pattern = FramePattern::default();
    RgbaImage::from_pixel(3, 3, Rgba([10, 20, 30, 128]))
        .save(dir.path().join(pattern.file_name(1)))
        .unwrap();
    write_frame(dir.path(), &pattern, 2, 3, 3);

    let rgb = load_frames(dir.path(), &pattern, PixelFormat::Rgb8).unwrap();
    assert!(rgb.iter().all(|frame| matches!(frame, DynamicImage::ImageRgb8(_))));

    let gray = load_frames(dir.path(), &pattern, PixelFormat::Gray8).unwrap();
    assert!(gray.iter().all(|frame| matches!(frame, DynamicImage::ImageLuma8(_))));
}

#[test]
fn frame_sequence_requires_frames() {
    assert!(matches!(
        FrameSequence::new(Vec::new()),
        Err(StackError::EmptyFrameSequence)
    ));

    let sequence = FrameSequence::new(vec![DynamicImage::new_rgb8(7, 5)]).unwrap();
    assert_eq!(sequence.len(), 1);
    assert_eq!(sequence.dimensions(), (7, 5));
}
