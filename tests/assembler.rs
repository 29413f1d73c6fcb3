//! Stack assembly tests.

use std::fs;

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use tempfile::TempDir;
use vidstack::{
    FrameSequence, StackCompression, StackError, assemble, inspect_stack, read_stack, write_stack,
};

/// Frames whose pixels encode their own position.
fn numbered_frames(count: u8, width: u32, height: u32) -> FrameSequence {
    let frames = (0..count)
        .map(|index| {
            DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
                Rgb([index, (x % 256) as u8, (y % 256) as u8])
            }))
        })
        .collect();
    FrameSequence::new(frames).expect("Failed to build sequence")
}

#[test]
fn pages_round_trip_in_order() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("clip.tiff");
    let frames = numbered_frames(5, 8, 6);

    assemble(&frames, &output, StackCompression::Deflate).expect("Failed to assemble");

    let pages = read_stack(&output).expect("Failed to read back");
    assert_eq!(pages.len(), 5);
    for (page, frame) in pages.iter().zip(frames.iter()) {
        assert_eq!(page.to_rgb8().as_raw(), frame.to_rgb8().as_raw());
    }
}

#[test]
fn single_frame_makes_single_page_stack() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("one.tiff");

    assemble(&numbered_frames(1, 4, 4), &output, StackCompression::Deflate).unwrap();

    let info = inspect_stack(&output).unwrap();
    assert_eq!(info.page_count(), 1);
    assert_eq!((info.pages[0].width, info.pages[0].height), (4, 4));
}

#[test]
fn every_compression_is_lossless() {
    let dir = TempDir::new().unwrap();
    let frames = numbered_frames(3, 16, 9);

    for compression in [
        StackCompression::Deflate,
        StackCompression::Lzw,
        StackCompression::PackBits,
        StackCompression::Uncompressed,
    ] {
        let output = dir.path().join(format!("{compression:?}.tiff"));
        assemble(&frames, &output, compression).unwrap();

        let pages = read_stack(&output).unwrap();
        assert_eq!(pages.len(), frames.len(), "{compression:?}");
        assert_eq!(pages[2].to_rgb8().as_raw(), frames.frames()[2].to_rgb8().as_raw());
    }
}

#[test]
fn existing_output_is_overwritten() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("clip.tiff");
    fs::write(&output, b"previous contents").unwrap();

    assemble(&numbered_frames(2, 4, 4), &output, StackCompression::Deflate).unwrap();

    assert_eq!(read_stack(&output).unwrap().len(), 2);
    assert!(!dir.path().join("clip.tiff.partial").exists());
}

#[test]
fn assembling_twice_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("clip.tiff");
    let frames = numbered_frames(4, 10, 10);

    assemble(&frames, &output, StackCompression::Deflate).unwrap();
    let first = fs::read(&output).unwrap();
    assemble(&frames, &output, StackCompression::Deflate).unwrap();
    let second = fs::read(&output).unwrap();

    assert_eq!(first, second);
}

#[test]
fn grayscale_pages_keep_their_layout() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("gray.tiff");
    let frames = vec![
        DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 2, Luma([7]))),
        DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 2, Luma([200]))),
    ];

    write_stack(&frames, &output, StackCompression::Lzw).unwrap();

    let pages = read_stack(&output).unwrap();
    assert!(matches!(pages[1], DynamicImage::ImageLuma8(_)));
    assert_eq!(pages[1].to_luma8().get_pixel(0, 0)[0], 200);
    assert_eq!(inspect_stack(&output).unwrap().pages[0].color_type, "Gray(8)");
}

#[test]
fn empty_slice_is_rejected_without_writing() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("empty.tiff");

    match write_stack(&[], &output, StackCompression::Deflate) {
        Err(StackError::EmptyFrameSequence) => {}
        other => panic!("Expected EmptyFrameSequence, got: {other:?}"),
    }
    assert!(!output.exists());
}

#[test]
fn unwritable_destination_is_an_assemble_error() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("missing").join("clip.tiff");

    match assemble(&numbered_frames(1, 2, 2), &output, StackCompression::Deflate) {
        Err(StackError::AssembleError { path, .. }) => assert_eq!(path, output),
        other => panic!("Expected AssembleError, got: {other:?}"),
    }
}

#[test]
fn reading_a_non_tiff_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bogus.tiff");
    fs::write(&path, b"definitely not a tiff").unwrap();

    assert!(read_stack(&path).is_err());
}
