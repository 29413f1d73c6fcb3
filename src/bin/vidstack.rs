use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use vidstack::{
    BatchConverter, BatchReport, ConversionOptions, DecoderLogLevel, FramePattern, PixelFormat,
    ProgressCallback, ProgressInfo, Rejection, StackCompression, inspect_stack,
};

#[cfg(feature = "libav")]
use vidstack::LibavExtractor;

const CLI_AFTER_HELP: &str = "Examples:\n  vidstack convert clip.mp4 other.mp4 --progress\n  vidstack convert --payload '{/videos/my clip.mp4} /videos/b.mp4'\n  vidstack convert take.mov --input-ext mov --compression lzw --jobs 4\n  vidstack inspect clip.tiff\n  vidstack completions zsh > _vidstack";

#[derive(Debug, Parser)]
#[command(
    name = "vidstack",
    version,
    about = "Convert video files into multi-page TIFF stacks",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging (overridden by RUST_LOG).
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar over the batch.
    #[arg(long, global = true)]
    progress: bool,

    /// Decoder log level (quiet, fatal, error, warning, info, verbose, debug).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Convert videos into stacks written beside each video.
    #[command(
        about = "Convert videos to TIFF stacks",
        after_help = "Examples:\n  vidstack convert a.mp4 b.mp4\n  vidstack convert --payload '{/videos/my clip.mp4}' --json"
    )]
    Convert {
        /// Input paths, as raw strings (braces and backslashes are cleaned up).
        inputs: Vec<String>,

        /// A raw drag-and-drop payload holding one or more paths.
        #[arg(long)]
        payload: Option<String>,

        /// Accepted input extension.
        #[arg(long, default_value = vidstack::DEFAULT_INPUT_EXTENSION)]
        input_ext: String,

        /// Stack file extension.
        #[arg(long, default_value = vidstack::DEFAULT_OUTPUT_EXTENSION)]
        output_ext: String,

        /// Page pixel format (rgb8, rgba8, gray8).
        #[arg(long, default_value = "rgb8")]
        pixel_format: String,

        /// Lossless page compression (deflate, lzw, packbits, none).
        #[arg(long, default_value = "deflate")]
        compression: String,

        /// Number of files converted at once (needs the `rayon` feature).
        #[arg(long, default_value_t = 1)]
        jobs: usize,

        /// Kill the decoder after this long (seconds, MM:SS or HH:MM:SS).
        #[arg(long)]
        timeout: Option<String>,

        /// Path to the ffmpeg executable.
        #[arg(long)]
        ffmpeg: Option<PathBuf>,

        /// Digits in staged frame file names.
        #[arg(long, default_value_t = 6)]
        frame_digits: usize,

        /// Decode in-process with libav instead of running ffmpeg.
        #[cfg(feature = "libav")]
        #[arg(long)]
        libav: bool,

        /// Print the batch report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the pages of a stack.
    #[command(about = "Inspect a TIFF stack")]
    Inspect {
        /// Stack file.
        stack: PathBuf,

        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_pixel_format(value: &str) -> Option<PixelFormat> {
    match value.to_ascii_lowercase().as_str() {
        "rgb8" | "rgb" => Some(PixelFormat::Rgb8),
        "rgba8" | "rgba" => Some(PixelFormat::Rgba8),
        "gray8" | "gray" | "greyscale" | "grayscale" => Some(PixelFormat::Gray8),
        _ => None,
    }
}

fn parse_compression(value: &str) -> Option<StackCompression> {
    match value.to_ascii_lowercase().as_str() {
        "deflate" | "zip" | "tiff_deflate" => Some(StackCompression::Deflate),
        "lzw" => Some(StackCompression::Lzw),
        "packbits" => Some(StackCompression::PackBits),
        "none" | "uncompressed" => Some(StackCompression::Uncompressed),
        _ => None,
    }
}

fn parse_duration(value: &str) -> Result<Duration, Box<dyn std::error::Error>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("time value cannot be empty".into());
    }
    let invalid = || format!("invalid time value: {trimmed}");

    if let Ok(seconds) = trimmed.parse::<f64>() {
        return seconds_to_duration(seconds).ok_or_else(|| invalid().into());
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [minutes, seconds] => (0, minutes.parse::<u64>()?, seconds.parse::<f64>()?),
        [hours, minutes, seconds] => (
            hours.parse::<u64>()?,
            minutes.parse::<u64>()?,
            seconds.parse::<f64>()?,
        ),
        _ => return Err(format!("invalid time format: {trimmed}").into()),
    };

    let whole = hours
        .checked_mul(3600)
        .and_then(|secs| minutes.checked_mul(60).and_then(|m| secs.checked_add(m)))
        .ok_or_else(invalid)?;
    seconds_to_duration(seconds)
        .and_then(|fraction| Duration::from_secs(whole).checked_add(fraction))
        .ok_or_else(|| invalid().into())
}

/// Negative values clamp to zero; NaN and out-of-range values are rejected.
fn seconds_to_duration(seconds: f64) -> Option<Duration> {
    if seconds.is_nan() {
        return None;
    }
    Duration::try_from_secs_f64(seconds.max(0.0)).ok()
}

fn init_logging(global: &GlobalOptions) {
    let default_filter = if global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_secs()
        .init();
}

/// Renders job progress as a bar and skipped inputs as notices.
struct TerminalProgress {
    bar: Option<ProgressBar>,
}

impl TerminalProgress {
    fn new(show_bar: bool) -> Result<Self, Box<dyn std::error::Error>> {
        let bar = if show_bar {
            let bar = ProgressBar::new(0);
            let style = ProgressStyle::with_template(
                "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}",
            )?;
            bar.set_style(style.progress_chars("##-"));
            Some(bar)
        } else {
            None
        };
        Ok(Self { bar })
    }

    fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let Some(bar) = &self.bar else {
            return;
        };
        bar.set_length(info.job_total as u64);
        let name = info
            .source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        bar.set_message(format!("{name}: {:?}", info.state));
        if info.state.is_terminal() {
            bar.inc(1);
        }
    }

    fn on_skipped(&self, raw: &str, reason: &Rejection) {
        let line = format!(
            "{} {}",
            "skipped:".yellow().bold(),
            format!("{raw} ({reason})").yellow()
        );
        match &self.bar {
            Some(bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }
}

fn print_report(report: &BatchReport, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        let payload = json!({
            "success": report.is_success(),
            "succeeded": report
                .succeeded
                .iter()
                .map(|path| path.display().to_string())
                .collect::<Vec<_>>(),
            "failed": report
                .failed
                .iter()
                .map(|(source, message)| json!({
                    "source": source.display().to_string(),
                    "error": message,
                }))
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    for output in &report.succeeded {
        println!("{} {}", "saved".green().bold(), output.display());
    }
    if report.is_success() {
        println!("{} {}", "success:".green().bold(), report.to_string().trim_end().green());
    } else {
        eprint!("{}", report.to_string().red());
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global);

    let decoder_log_level = match &cli.global.log_level {
        Some(level) => level.parse::<DecoderLogLevel>()?,
        None => DecoderLogLevel::default(),
    };

    match cli.command {
        Commands::Convert {
            inputs,
            payload,
            input_ext,
            output_ext,
            pixel_format,
            compression,
            jobs,
            timeout,
            ffmpeg,
            frame_digits,
            #[cfg(feature = "libav")]
            libav,
            json,
        } => {
            let pixel_format = parse_pixel_format(&pixel_format)
                .ok_or(format!("unsupported --pixel-format: {pixel_format}"))?;
            let compression = parse_compression(&compression)
                .ok_or(format!("unsupported --compression: {compression}"))?;

            let progress = Arc::new(TerminalProgress::new(cli.global.progress)?);

            let mut options = ConversionOptions::new()
                .with_input_extension(&input_ext)
                .with_output_extension(&output_ext)
                .with_pixel_format(pixel_format)
                .with_compression(compression)
                .with_workers(jobs)
                .with_frame_pattern(FramePattern::new("frame", frame_digits, "png"))
                .with_decoder_log_level(decoder_log_level)
                .with_progress(progress.clone());
            if let Some(timeout) = timeout {
                options = options.with_extraction_timeout(parse_duration(&timeout)?);
            }
            if let Some(program) = ffmpeg {
                options = options.with_ffmpeg_program(program);
            }

            #[allow(unused_mut)]
            let mut converter = BatchConverter::new(options);
            #[cfg(feature = "libav")]
            if libav {
                let extractor = LibavExtractor::from_options(converter.options());
                converter = converter.with_extractor(Arc::new(extractor));
            }

            let mut raw_inputs = inputs;
            if let Some(payload) = payload {
                raw_inputs.extend(vidstack::split_payload(&payload));
            }

            let result = converter.run(&raw_inputs);
            progress.finish();
            let report = result?;

            print_report(&report, json)?;
            if !report.is_success() {
                return Err(format!(
                    "{} of {} file(s) failed",
                    report.failed.len(),
                    report.job_count()
                )
                .into());
            }
        }
        Commands::Inspect { stack, json } => {
            let info = inspect_stack(&stack)?;
            if json {
                let payload = json!({
                    "path": info.path.display().to_string(),
                    "page_count": info.page_count(),
                    "pages": info.pages.iter().map(|page| json!({
                        "width": page.width,
                        "height": page.height,
                        "color_type": page.color_type,
                    })).collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print!("{info}");
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "vidstack", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_compression, parse_duration, parse_pixel_format};
    use vidstack::{PixelFormat, StackCompression};

    #[test]
    fn parse_pixel_format_aliases() {
        assert_eq!(parse_pixel_format("RGB"), Some(PixelFormat::Rgb8));
        assert_eq!(parse_pixel_format("rgba8"), Some(PixelFormat::Rgba8));
        assert_eq!(parse_pixel_format("grayscale"), Some(PixelFormat::Gray8));
        assert_eq!(parse_pixel_format("yuv420p"), None);
    }

    #[test]
    fn parse_compression_aliases() {
        assert_eq!(parse_compression("tiff_deflate"), Some(StackCompression::Deflate));
        assert_eq!(parse_compression("LZW"), Some(StackCompression::Lzw));
        assert_eq!(parse_compression("none"), Some(StackCompression::Uncompressed));
        assert_eq!(parse_compression("jpeg"), None);
    }

    #[test]
    fn parse_duration_formats() {
        assert_eq!(parse_duration("90").unwrap().as_secs(), 90);
        assert_eq!(parse_duration("01:30").unwrap().as_secs(), 90);
        assert_eq!(parse_duration("00:01:30.5").unwrap().as_millis(), 90_500);
        assert!(parse_duration("").is_err());
        assert!(parse_duration("1:2:3:4").is_err());
        assert!(parse_duration("inf").is_err());
        assert!(parse_duration("NaN").is_err());
        assert!(parse_duration("1e20").is_err());
        assert!(parse_duration("18446744073709551615:00:00").is_err());
        assert!(parse_duration("00:00:1e30").is_err());
    }
}
