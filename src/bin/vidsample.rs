use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use vidsample::{FfmpegLogLevel, IndexOptions, RateLimitedOptions, SampledFrames};

const CLI_AFTER_HELP: &str = "Examples:\n  vidsample probe clip.mp4 --json\n  vidsample sample clip.mp4 --frames 16 --fps-cap 10 --width 224 --height 224 --out clip.rgb\n  vidsample indices clip.mp4 --frames 0,30,60 --seek --png-dir frames --progress\n  vidsample completions zsh > _vidsample";

#[derive(Debug, Parser)]
#[command(
    name = "vidsample",
    version,
    about = "Sample fixed-size RGB frame tensors from encoded videos",
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
    /// Show additional output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar while writing PNG frames.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, fatal, error, warning, info, debug).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

/// Where to put the sampled tensor.
#[derive(Debug, Args, Clone, Default)]
struct OutputOptions {
    /// Write the raw N×H×W×3 tensor to this file.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Write every frame as a PNG into this directory.
    #[arg(long)]
    png_dir: Option<PathBuf>,

    /// Print the extraction summary as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print metadata for the video track.
    #[command(
        about = "Print video track metadata",
        after_help = "Examples:\n  vidsample probe clip.mp4\n  vidsample probe clip.mp4 --json"
    )]
    Probe {
        /// Input video path.
        input: PathBuf,

        /// Output metadata as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Rate-limited sampling.
    #[command(
        about = "Sample frames under a frame-rate cap",
        after_help = "Examples:\n  vidsample sample clip.mp4 --out clip.rgb\n  vidsample sample clip.mp4 --frames 8 --fps-cap 5 --no-random-seek --png-dir frames"
    )]
    Sample {
        /// Input video path.
        input: PathBuf,
        /// Number of frames in the output tensor.
        #[arg(long, default_value_t = vidsample::options::DEFAULT_FRAME_COUNT)]
        frames: usize,
        /// Maximum effective frame rate of the sampled frames.
        #[arg(long, default_value_t = vidsample::options::DEFAULT_FPS_CAP)]
        fps_cap: f64,
        /// Output width (0 derives it from the source).
        #[arg(long, default_value_t = 0)]
        width: u32,
        /// Output height (0 derives it from the source).
        #[arg(long, default_value_t = 0)]
        height: u32,
        /// Start at the beginning instead of a random point.
        #[arg(long)]
        no_random_seek: bool,
        /// Seed for the random start point.
        #[arg(long)]
        seed: Option<u64>,
        #[command(flatten)]
        output: OutputOptions,
    },

    /// Explicit frame indices.
    #[command(
        about = "Extract frames by index",
        after_help = "Examples:\n  vidsample indices clip.mp4 --frames 0,10,20 --out picked.rgb\n  vidsample indices clip.mp4 --frames 500,501,502 --seek --png-dir frames"
    )]
    Indices {
        /// Input video path.
        input: PathBuf,
        /// Comma-separated, non-decreasing frame indices.
        #[arg(long, value_delimiter = ',', required = true)]
        frames: Vec<u64>,
        /// Seek close to the first index instead of decoding from the start.
        #[arg(long)]
        seek: bool,
        /// Output width (0 derives it from the source).
        #[arg(long, default_value_t = 0)]
        width: u32,
        /// Output height (0 derives it from the source).
        #[arg(long, default_value_t = 0)]
        height: u32,
        #[command(flatten)]
        output: OutputOptions,
    },

    /// Generate shell completions.
    #[command(about = "Generate shell completion scripts")]
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(level) = &global.log_level {
        let parsed: FfmpegLogLevel = level.parse()?;
        vidsample::set_ffmpeg_log_level(parsed);
    }
    Ok(())
}

fn write_outputs(
    frames: &SampledFrames,
    output: &OutputOptions,
    global: &GlobalOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = &output.out {
        ensure_writable_path(path, global.overwrite)?;
        fs::write(path, frames.data())?;
        if global.verbose {
            eprintln!("wrote {} bytes -> {}", frames.data().len(), path.display());
        }
    }

    if let Some(directory) = &output.png_dir {
        fs::create_dir_all(directory)?;

        let progress_bar = if global.progress {
            let pb = ProgressBar::new(frames.frame_count() as u64);
            let style = ProgressStyle::with_template(
                "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}",
            )?;
            pb.set_style(style.progress_chars("##-"));
            Some(pb)
        } else {
            None
        };

        for index in 0..frames.frame_count() {
            let path = directory.join(png_name(index));
            ensure_writable_path(&path, global.overwrite)?;
            let image = frames
                .to_image(index)
                .ok_or_else(|| format!("frame {index} has no pixels to save"))?;
            image.save(&path)?;

            if let Some(pb) = &progress_bar {
                pb.inc(1);
            }
            if global.verbose {
                eprintln!("saved slot {index} -> {}", path.display());
            }
        }

        if let Some(pb) = progress_bar {
            pb.finish_with_message("done");
        }
    }

    if output.json {
        let payload = json!({
            "frame_count": frames.frame_count(),
            "width": frames.width(),
            "height": frames.height(),
            "has_video": frames.has_video(),
            "frames_written": frames.frames_written(),
            "frames_decoded": frames.frames_decoded(),
            "seek_distance": frames.seek_distance(),
            "bytes": frames.data().len(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if !frames.has_video() {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            "input has no video track; the tensor is blank".yellow()
        );
    } else {
        println!(
            "{} {}",
            "success:".green().bold(),
            format!(
                "{} frame(s) at {}x{} ({} decoded, {} tiled, seek {:.3}s)",
                frames.frame_count(),
                frames.width(),
                frames.height(),
                frames.frames_written(),
                frames.frame_count() - frames.frames_written().min(frames.frame_count()),
                frames.seek_distance()
            )
            .green()
        );
    }
    Ok(())
}

fn png_name(index: usize) -> String {
    format!("frame_{index:06}.png")
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Probe { input, json } => {
            let bytes = fs::read(&input)?;
            let info = vidsample::probe(&bytes)?;
            if json {
                let payload = json!({
                    "has_video": info.is_some(),
                    "video": info.as_ref().map(|info| json!({
                        "width": info.source_width,
                        "height": info.source_height,
                        "fps": info.frames_per_second,
                        "frame_count": info.frame_count,
                        "duration_seconds": info.duration_seconds(),
                        "time_base": format!("{}/{}", info.time_base.numerator(), info.time_base.denominator()),
                        "codec": info.codec,
                    })),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else if let Some(info) = info {
                println!(
                    "Video: {}x{} @ {:.2} fps [{}]",
                    info.source_width, info.source_height, info.frames_per_second, info.codec,
                );
                println!("Frames: {}", info.frame_count);
                println!("Duration: {:?}", info.duration());
            } else {
                println!("No video track");
            }
        }
        Commands::Sample {
            input,
            frames,
            fps_cap,
            width,
            height,
            no_random_seek,
            seed,
            output,
        } => {
            let bytes = fs::read(&input)?;
            let mut options = RateLimitedOptions::new()
                .with_frame_count(frames)
                .with_fps_cap(fps_cap)
                .with_resolution(width, height)
                .with_random_seek(!no_random_seek);
            if let Some(seed) = seed {
                options = options.with_seed(seed);
            }

            let sampled = vidsample::sample_frames(&bytes, &options)?;
            write_outputs(&sampled, &output, &cli.global)?;
        }
        Commands::Indices {
            input,
            frames,
            seek,
            width,
            height,
            output,
        } => {
            let bytes = fs::read(&input)?;
            let options = IndexOptions::new()
                .with_resolution(width, height)
                .with_seek(seek);

            let sampled = vidsample::sample_frame_indices(&bytes, &frames, &options)?;
            write_outputs(&sampled, &output, &cli.global)?;
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "vidsample", &mut std::io::stdout());
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
