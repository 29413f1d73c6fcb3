//! In-process frame extraction through libav.
//!
//! [`LibavExtractor`] decodes the best video stream of a file with
//! `ffmpeg-next`, converts every frame to RGB24, and writes it under the same
//! [`FramePattern`] naming contract the external decoder follows. No `ffmpeg`
//! executable is needed, but FFmpeg development libraries must be installed.

use std::{
    path::Path,
    time::{Duration, Instant},
};

use ffmpeg_next::{
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::Pixel,
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::RgbImage;

use crate::{
    configuration::{ConversionOptions, FramePattern},
    error::StackError,
    extractor::FrameExtractor,
    ffmpeg::DecoderLogLevel,
};

/// Decodes videos in-process with libav.
///
/// A configured timeout is checked between packets, so a stalled demuxer
/// read can still overrun it.
#[derive(Debug, Clone, Default)]
pub struct LibavExtractor {
    log_level: DecoderLogLevel,
    timeout: Option<Duration>,
}

impl LibavExtractor {
    /// Create an extractor with the default libav log level.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the decoder settings of `options`, timeout included.
    pub fn from_options(options: &ConversionOptions) -> Self {
        Self {
            log_level: options.decoder_log_level,
            timeout: options.extraction_timeout,
        }
    }

    /// Give up on a file once decoding it takes longer than `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The configured timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl FrameExtractor for LibavExtractor {
    fn extract(
        &self,
        source: &Path,
        staging_dir: &Path,
        pattern: &FramePattern,
    ) -> Result<u64, StackError> {
        ffmpeg_next::init().map_err(|error| StackError::ExtractorUnavailable {
            program: "libav".to_string(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;
        self.log_level.apply_to_libav();

        log::debug!(
            "Decoding {} into {} with libav",
            source.display(),
            staging_dir.display()
        );

        let deadline = self.timeout.map(|timeout| (Instant::now() + timeout, timeout));
        decode_to_directory(source, staging_dir, pattern, deadline).map_err(|error| match error {
            StackError::FfmpegError(reason) => StackError::ExtractionFailed {
                path: source.to_path_buf(),
                reason,
            },
            other => other,
        })
    }
}

/// Destination of decoded frames: converter plus the running frame counter.
struct FrameWriter<'a> {
    scaler: ScalingContext,
    width: u32,
    height: u32,
    staging_dir: &'a Path,
    pattern: &'a FramePattern,
    written: u64,
}

impl FrameWriter<'_> {
    /// Pull every frame the decoder has ready and write it out.
    fn drain(&mut self, decoder: &mut VideoDecoder) -> Result<(), StackError> {
        let mut decoded_frame = VideoFrame::empty();
        let mut rgb_frame = VideoFrame::empty();

        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            self.scaler.run(&decoded_frame, &mut rgb_frame)?;

            let buffer = packed_rgb(&rgb_frame, self.width, self.height);
            let image = RgbImage::from_raw(self.width, self.height, buffer).ok_or_else(|| {
                StackError::FfmpegError(
                    "decoded frame buffer does not match its dimensions".to_string(),
                )
            })?;

            let index = self.written + 1;
            image.save(self.staging_dir.join(self.pattern.file_name(index)))?;
            self.written = index;
        }
        Ok(())
    }
}

fn decode_to_directory(
    source: &Path,
    staging_dir: &Path,
    pattern: &FramePattern,
    deadline: Option<(Instant, Duration)>,
) -> Result<u64, StackError> {
    let mut input_context = ffmpeg_next::format::input(&source)?;

    let stream = input_context
        .streams()
        .best(Type::Video)
        .ok_or_else(|| StackError::ExtractionFailed {
            path: source.to_path_buf(),
            reason: "no video stream found".to_string(),
        })?;
    let video_stream_index = stream.index();

    let decoder_context = CodecContext::from_parameters(stream.parameters())?;
    let mut decoder = decoder_context.decoder().video()?;

    let width = decoder.width();
    let height = decoder.height();
    let scaler = ScalingContext::get(
        decoder.format(),
        width,
        height,
        Pixel::RGB24,
        width,
        height,
        ScalingFlags::BILINEAR,
    )?;

    let mut writer = FrameWriter {
        scaler,
        width,
        height,
        staging_dir,
        pattern,
        written: 0,
    };

    for (stream, packet) in input_context.packets() {
        if let Some((_, timeout)) = deadline.filter(|(at, _)| Instant::now() >= *at) {
            return Err(StackError::ExtractionTimedOut {
                path: source.to_path_buf(),
                timeout,
            });
        }
        if stream.index() != video_stream_index {
            continue;
        }
        decoder.send_packet(&packet)?;
        writer.drain(&mut decoder)?;
    }

    decoder.send_eof()?;
    writer.drain(&mut decoder)?;

    Ok(writer.written)
}

/// Copy an RGB24 frame into a buffer without per-row padding.
fn packed_rgb(frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = frame.stride(0);
    let row_bytes = width as usize * 3;
    let data = frame.data(0);

    if stride == row_bytes {
        return data[..row_bytes * height as usize].to_vec();
    }

    let mut buffer = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        buffer.extend_from_slice(&data[start..start + row_bytes]);
    }
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_options_carries_the_timeout() {
        let options = ConversionOptions::new().with_extraction_timeout(Duration::from_secs(30));
        assert_eq!(
            LibavExtractor::from_options(&options).timeout(),
            Some(Duration::from_secs(30))
        );
        assert_eq!(LibavExtractor::new().timeout(), None);
    }
}
