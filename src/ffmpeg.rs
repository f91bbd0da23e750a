//! FFmpeg library setup and console verbosity.
//!
//! FFmpeg logs to stderr on its own, independently of the Rust
//! [`log`](https://crates.io/crates/log) facade this crate reports through.
//! Sampling runs in tight data-loading loops where FFmpeg's warnings about
//! damaged or unusual streams are mostly noise, so the first session lowers
//! FFmpeg's verbosity to [`FfmpegLogLevel::Error`] unless the caller picked
//! a level beforehand.
//!
//! ```no_run
//! use vidsample::FfmpegLogLevel;
//!
//! vidsample::set_ffmpeg_log_level(FfmpegLogLevel::Quiet);
//! ```

use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};

use ffmpeg_next::util::log::Level;

use crate::error::SampleError;

static DEFAULT_LEVEL: Once = Once::new();
static LEVEL_CHOSEN: AtomicBool = AtomicBool::new(false);

/// FFmpeg console verbosity, from silent to most talkative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    /// Print nothing.
    Quiet,
    /// Only errors the process cannot recover from.
    Fatal,
    /// Recoverable errors. This is the level sessions default to.
    Error,
    /// Warnings and errors (FFmpeg's own default).
    Warning,
    /// Informational messages.
    Info,
    /// Debugging output.
    Debug,
}

impl From<FfmpegLogLevel> for Level {
    fn from(level: FfmpegLogLevel) -> Self {
        match level {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Fatal => Level::Fatal,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Debug => Level::Debug,
        }
    }
}

impl std::str::FromStr for FfmpegLogLevel {
    type Err = SampleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "quiet" => Ok(FfmpegLogLevel::Quiet),
            "fatal" => Ok(FfmpegLogLevel::Fatal),
            "error" => Ok(FfmpegLogLevel::Error),
            "warning" | "warn" => Ok(FfmpegLogLevel::Warning),
            "info" => Ok(FfmpegLogLevel::Info),
            "debug" => Ok(FfmpegLogLevel::Debug),
            other => Err(SampleError::InvalidArgument(format!(
                "unknown FFmpeg log level '{other}'"
            ))),
        }
    }
}

/// Set FFmpeg's console verbosity.
///
/// Does not affect messages emitted through the `log` crate.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    LEVEL_CHOSEN.store(true, Ordering::Relaxed);
    ffmpeg_next::util::log::set_level(level.into());
}

/// Initialise FFmpeg (idempotent) and apply the default verbosity once.
pub(crate) fn ensure_initialized() -> Result<(), SampleError> {
    ffmpeg_next::init()
        .map_err(|error| SampleError::Open(format!("FFmpeg initialisation failed: {error}")))?;

    DEFAULT_LEVEL.call_once(|| {
        if !LEVEL_CHOSEN.load(Ordering::Relaxed) {
            ffmpeg_next::util::log::set_level(Level::Error);
        }
    });
    Ok(())
}
