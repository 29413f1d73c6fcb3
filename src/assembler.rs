//! Stack assembly and read-back.
//!
//! [`assemble`] encodes a [`FrameSequence`] as one multi-page TIFF: page 0 is
//! the first frame and every later frame is appended in order, each page
//! losslessly compressed. [`read_stack`] and [`inspect_stack`] read a stack
//! back page by page.
//!
//! # Example
//!
//! ```no_run
//! use vidstack::{PixelFormat, StackCompression, assemble, load_frames, read_stack};
//! use vidstack::FramePattern;
//!
//! let frames = load_frames("temp_frames_clip".as_ref(), &FramePattern::default(), PixelFormat::Rgb8)?;
//! assemble(&frames, "clip.tiff".as_ref(), StackCompression::Deflate)?;
//!
//! let pages = read_stack("clip.tiff".as_ref())?;
//! assert_eq!(pages.len(), frames.len());
//! # Ok::<(), vidstack::StackError>(())
//! ```

use std::{
    ffi::OsString,
    fmt::{Display, Formatter, Result as FmtResult},
    fs::{self, File},
    io::{BufReader, BufWriter, Read, Seek, Write},
    path::{Path, PathBuf},
};

use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};
use tiff::{
    ColorType, TiffResult,
    decoder::{Decoder, DecodingResult},
    encoder::{
        TiffEncoder, colortype,
        compression::{Compression, Deflate, DeflateLevel, Lzw, Packbits, Uncompressed},
    },
};

use crate::{configuration::StackCompression, error::StackError, loader::FrameSequence};

/// Size and layout of one stack page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    /// Page width in pixels.
    pub width: u32,
    /// Page height in pixels.
    pub height: u32,
    /// Color type as reported by the TIFF decoder, e.g. `RGB(8)`.
    pub color_type: String,
}

/// Page-level summary of a stack file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackInfo {
    /// The inspected file.
    pub path: PathBuf,
    /// One entry per page, in page order.
    pub pages: Vec<PageInfo>,
}

impl StackInfo {
    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

impl Display for StackInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, "{}: {} page(s)", self.path.display(), self.page_count())?;
        for (index, page) in self.pages.iter().enumerate() {
            writeln!(
                f,
                "  page {index}: {}x{} {}",
                page.width, page.height, page.color_type
            )?;
        }
        Ok(())
    }
}

/// Write `frames` as a multi-page TIFF at `output_path`.
///
/// An existing file at `output_path` is replaced. The stack is first written
/// next to it as `<name>.partial` and renamed into place, so a failed write
/// never leaves a truncated stack behind.
///
/// # Errors
///
/// Returns [`StackError::AssembleError`] if the file cannot be written.
pub fn assemble(
    frames: &FrameSequence,
    output_path: &Path,
    compression: StackCompression,
) -> Result<(), StackError> {
    write_stack(frames.frames(), output_path, compression)
}

/// Write any slice of frames as a multi-page TIFF.
///
/// Frames that are not RGB8, RGBA8 or GRAY8 are converted to RGB8.
///
/// # Errors
///
/// - [`StackError::EmptyFrameSequence`] if `frames` is empty.
/// - [`StackError::AssembleError`] if the file cannot be written.
pub fn write_stack(
    frames: &[DynamicImage],
    output_path: &Path,
    compression: StackCompression,
) -> Result<(), StackError> {
    if frames.is_empty() {
        return Err(StackError::EmptyFrameSequence);
    }

    let partial_path = partial_path(output_path);
    log::debug!(
        "Writing {} page(s) to {} ({compression:?})",
        frames.len(),
        partial_path.display()
    );

    let result = write_pages_to(&partial_path, frames, compression)
        .and_then(|()| fs::rename(&partial_path, output_path).map_err(StackError::from));

    if let Err(error) = result {
        let _ = fs::remove_file(&partial_path);
        return Err(StackError::AssembleError {
            path: output_path.to_path_buf(),
            reason: error.to_string(),
        });
    }

    log::info!("Stack saved: {}", output_path.display());
    Ok(())
}

/// Decode every page of a stack, in page order.
///
/// # Errors
///
/// Returns [`StackError::TiffError`] if the file is not a readable TIFF, or
/// [`StackError::LoadError`] for pages with a layout other than 8-bit RGB,
/// RGBA or grayscale.
pub fn read_stack(path: &Path) -> Result<Vec<DynamicImage>, StackError> {
    let mut decoder = Decoder::new(BufReader::new(File::open(path)?))?;
    let mut pages = Vec::new();

    loop {
        pages.push(decode_page(&mut decoder, path)?);
        if !decoder.more_images() {
            break;
        }
        decoder.next_image()?;
    }

    Ok(pages)
}

/// Describe every page of a stack without decoding pixel data.
///
/// # Errors
///
/// Returns [`StackError::TiffError`] if the file is not a readable TIFF.
pub fn inspect_stack(path: &Path) -> Result<StackInfo, StackError> {
    let mut decoder = Decoder::new(BufReader::new(File::open(path)?))?;
    let mut pages = Vec::new();

    loop {
        let (width, height) = decoder.dimensions()?;
        pages.push(PageInfo {
            width,
            height,
            color_type: format!("{:?}", decoder.colortype()?),
        });
        if !decoder.more_images() {
            break;
        }
        decoder.next_image()?;
    }

    Ok(StackInfo {
        path: path.to_path_buf(),
        pages,
    })
}

fn partial_path(output_path: &Path) -> PathBuf {
    let mut name = output_path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| OsString::from("stack"));
    name.push(".partial");
    output_path.with_file_name(name)
}

fn write_pages_to(
    path: &Path,
    frames: &[DynamicImage],
    compression: StackCompression,
) -> Result<(), StackError> {
    let mut writer = BufWriter::new(File::create(path)?);
    {
        let mut encoder = TiffEncoder::new(&mut writer)?;
        for frame in frames {
            write_page(&mut encoder, frame, compression)?;
        }
    }
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}

fn write_page<W: Write + Seek>(
    encoder: &mut TiffEncoder<W>,
    frame: &DynamicImage,
    compression: StackCompression,
) -> TiffResult<()> {
    match compression {
        StackCompression::Deflate => {
            write_compressed(encoder, frame, Deflate::with_level(DeflateLevel::Balanced))
        }
        StackCompression::Lzw => write_compressed(encoder, frame, Lzw::default()),
        StackCompression::PackBits => write_compressed(encoder, frame, Packbits::default()),
        StackCompression::Uncompressed => write_compressed(encoder, frame, Uncompressed::default()),
    }
}

fn write_compressed<W: Write + Seek, D: Compression>(
    encoder: &mut TiffEncoder<W>,
    frame: &DynamicImage,
    compression: D,
) -> TiffResult<()> {
    let (width, height) = (frame.width(), frame.height());
    match frame {
        DynamicImage::ImageRgb8(buffer) => encoder
            .write_image_with_compression::<colortype::RGB8, D>(
                width,
                height,
                compression,
                buffer.as_raw(),
            ),
        DynamicImage::ImageRgba8(buffer) => encoder
            .write_image_with_compression::<colortype::RGBA8, D>(
                width,
                height,
                compression,
                buffer.as_raw(),
            ),
        DynamicImage::ImageLuma8(buffer) => encoder
            .write_image_with_compression::<colortype::Gray8, D>(
                width,
                height,
                compression,
                buffer.as_raw(),
            ),
        other => encoder.write_image_with_compression::<colortype::RGB8, D>(
            width,
            height,
            compression,
            other.to_rgb8().as_raw(),
        ),
    }
}

fn decode_page<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    path: &Path,
) -> Result<DynamicImage, StackError> {
    let (width, height) = decoder.dimensions()?;
    let color_type = decoder.colortype()?;

    let unsupported = || StackError::LoadError {
        path: path.to_path_buf(),
        reason: format!("unsupported page layout {color_type:?}"),
    };

    let DecodingResult::U8(data) = decoder.read_image()? else {
        return Err(unsupported());
    };

    let image = match color_type {
        ColorType::RGB(8) => RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8),
        ColorType::RGBA(8) => {
            RgbaImage::from_raw(width, height, data).map(DynamicImage::ImageRgba8)
        }
        ColorType::Gray(8) => {
            GrayImage::from_raw(width, height, data).map(DynamicImage::ImageLuma8)
        }
        _ => None,
    };

    image.ok_or_else(unsupported)
}
