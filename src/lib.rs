//! # vidsample
//!
//! Turn encoded video bytes into fixed-size RGB frame tensors for training
//! and evaluation pipelines.
//!
//! `vidsample` decodes a video held in memory and writes a dense
//! `N × H × W × 3` buffer of RGB24 frames, powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate. The output
//! always has exactly the requested number of frames: if the stream runs out
//! early, the frames that were decoded are tiled over the remaining slots.
//!
//! ## Quick Start
//!
//! ### Rate-limited sampling
//!
//! ```no_run
//! use vidsample::RateLimitedOptions;
//!
//! let bytes = std::fs::read("clip.mp4").unwrap();
//! let options = RateLimitedOptions::new()
//!     .with_frame_count(16)
//!     .with_fps_cap(10.0)
//!     .with_resolution(224, 224);
//!
//! let clip = vidsample::sample_frames(&bytes, &options).unwrap();
//! println!("started {:.2}s in", clip.seek_distance());
//! ```
//!
//! ### Specific frames
//!
//! ```no_run
//! use vidsample::IndexOptions;
//!
//! let bytes = std::fs::read("clip.mp4").unwrap();
//! let options = IndexOptions::new().with_seek(true);
//!
//! let frames = vidsample::sample_frame_indices(&bytes, &[100, 101, 150], &options).unwrap();
//! frames.to_image(0).unwrap().save("frame_100.png").unwrap();
//! ```
//!
//! ### Driving the engine yourself
//!
//! The sampler is decoupled from FFmpeg through the [`FrameSource`] trait.
//! [`sample`] runs a [`SampleRequest`] against any source and a
//! caller-provided buffer:
//!
//! ```no_run
//! use vidsample::{FfmpegSession, FrameSource, SampleRequest};
//!
//! let bytes = std::fs::read("clip.mp4").unwrap();
//! let mut session = FfmpegSession::open(&bytes, 64, 64).unwrap();
//! let request = SampleRequest::RateLimited { frame_count: 8, fps_cap: 5.0, random_seek: false };
//!
//! let mut tensor = vec![0u8; 8 * session.info().frame_size()];
//! let report = vidsample::sample(&mut session, &request, &mut tensor, &mut rand::rng()).unwrap();
//! println!("{} decoded, {} tiled", report.frames_written, report.frames_filled);
//! ```
//!
//! ## Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `rayon` | `sample_frames_parallel()` samples many videos across rayon threads |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod copy;
pub mod decoder;
pub mod error;
pub mod extract;
pub mod ffmpeg;
pub mod fill;
pub mod memory_io;
pub mod options;
#[cfg(feature = "rayon")]
mod rayon;
pub mod sampler;
pub mod seek;
pub mod source;

pub use decoder::FfmpegSession;
pub use error::SampleError;
pub use extract::{SampledFrames, probe, sample_frame_indices, sample_frames, sample_frames_with_rng};
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use fill::tile_written_frames;
pub use memory_io::EncodedVideoBuffer;
pub use options::{IndexOptions, RateLimitedOptions, resolve_dimensions};
#[cfg(feature = "rayon")]
pub use rayon::sample_frames_parallel;
pub use sampler::{RateLimiter, SampleReport, SampleRequest, sample};
pub use seek::SeekTarget;
pub use source::{CHANNELS, FrameRef, FrameSource, StreamInfo};
