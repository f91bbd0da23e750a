//! One-call extraction entry points.
//!
//! These functions own the whole lifecycle of a call: open an
//! [`FfmpegSession`] over the encoded bytes, allocate the output tensor, run
//! the sampler and hand back a [`SampledFrames`].
//!
//! An input without a usable video track is not an error: the result is a
//! zero-filled tensor with [`SampledFrames::has_video`] set to `false`.
//!
//! # Example
//!
//! ```no_run
//! use vidsample::{IndexOptions, RateLimitedOptions};
//!
//! let bytes = std::fs::read("clip.mp4")?;
//!
//! let clip = vidsample::sample_frames(&bytes, &RateLimitedOptions::new().with_resolution(112, 112))?;
//! assert_eq!(clip.data().len(), 32 * 112 * 112 * 3);
//!
//! let picked = vidsample::sample_frame_indices(&bytes, &[0, 10, 20], &IndexOptions::new())?;
//! picked.to_image(1).map(|image| image.save("frame_10.png"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use image::RgbImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::decoder::FfmpegSession;
use crate::error::SampleError;
use crate::options::{IndexOptions, RateLimitedOptions, resolve_dimensions};
use crate::sampler::{SampleReport, SampleRequest, sample};
use crate::source::{CHANNELS, FrameSource, StreamInfo};

/// A dense `frame_count × height × width × 3` RGB24 tensor plus statistics
/// about how it was filled.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct SampledFrames {
    data: Vec<u8>,
    frame_count: usize,
    width: u32,
    height: u32,
    seek_distance: f64,
    frames_decoded: u64,
    frames_written: usize,
    has_video: bool,
}

impl SampledFrames {
    /// The raw tensor bytes, frames back to back, rows top to bottom.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Take ownership of the raw tensor bytes.
    #[must_use]
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Number of frame slots in the tensor.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Frame width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Random seek offset in seconds (`0.0` if no seek happened).
    #[must_use]
    pub fn seek_distance(&self) -> f64 {
        self.seek_distance
    }

    /// Frames pulled from the decoder, kept or not.
    #[must_use]
    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    /// Slots holding decoded frames. The rest were tiled from these.
    #[must_use]
    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    /// Whether the input had a decodable video track.
    #[must_use]
    pub fn has_video(&self) -> bool {
        self.has_video
    }

    /// Bytes per frame.
    #[must_use]
    pub fn frame_size(&self) -> usize {
        self.width as usize * self.height as usize * CHANNELS
    }

    /// Bytes of frame `index`, or `None` if out of range.
    #[must_use]
    pub fn frame(&self, index: usize) -> Option<&[u8]> {
        if index >= self.frame_count {
            return None;
        }
        let size = self.frame_size();
        self.data.get(index * size..(index + 1) * size)
    }

    /// Iterate over the frames in slot order.
    pub fn frames(&self) -> impl Iterator<Item = &[u8]> + '_ {
        (0..self.frame_count).filter_map(|index| self.frame(index))
    }

    /// Copy frame `index` into an [`RgbImage`].
    #[must_use]
    pub fn to_image(&self, index: usize) -> Option<RgbImage> {
        let bytes = self.frame(index)?;
        RgbImage::from_raw(self.width, self.height, bytes.to_vec())
    }

    fn from_report(data: Vec<u8>, frame_count: usize, info: &StreamInfo, report: SampleReport) -> Self {
        Self {
            data,
            frame_count,
            width: info.width,
            height: info.height,
            seek_distance: report.seek_distance,
            frames_decoded: report.frames_decoded,
            frames_written: report.frames_written,
            has_video: true,
        }
    }

    fn blank(frame_count: usize, width: u32, height: u32) -> Result<Self, SampleError> {
        let frame_size = width as usize * height as usize * CHANNELS;
        Ok(Self {
            data: allocate_output(frame_count, frame_size)?,
            frame_count,
            width,
            height,
            seek_distance: 0.0,
            frames_decoded: 0,
            frames_written: 0,
            has_video: false,
        })
    }
}

/// Extract up to `options.frame_count()` frames at no more than
/// `options.fps_cap()` frames per second.
///
/// With a seed in `options` the random seek is reproducible; otherwise the
/// thread-local generator is used.
///
/// # Errors
///
/// - [`SampleError::InvalidArgument`] for a non-positive `fps_cap` or an
///   output size that overflows.
/// - [`SampleError::AllocationFailed`] if the tensor cannot be allocated.
/// - Decoder faults encountered while sampling.
///
/// Bytes that are not a readable container, like a container without a video
/// track, yield a zeroed tensor with [`SampledFrames::has_video`] `false`.
pub fn sample_frames(bytes: &[u8], options: &RateLimitedOptions) -> Result<SampledFrames, SampleError> {
    match options.seed {
        Some(seed) => sample_frames_with_rng(bytes, options, &mut StdRng::seed_from_u64(seed)),
        None => sample_frames_with_rng(bytes, options, &mut rand::rng()),
    }
}

/// [`sample_frames`] with an explicit random source. The seed in `options`,
/// if any, is ignored.
///
/// # Errors
///
/// Same as [`sample_frames`].
pub fn sample_frames_with_rng<R: Rng>(
    bytes: &[u8],
    options: &RateLimitedOptions,
    rng: &mut R,
) -> Result<SampledFrames, SampleError> {
    let request = SampleRequest::RateLimited {
        frame_count: options.frame_count,
        fps_cap: options.fps_cap,
        random_seek: options.random_seek,
    };
    run(bytes, options.width, options.height, &request, rng)
}

/// Extract the frames at `frame_indices`, one output slot per index.
///
/// Indices must be non-decreasing. A repeated index repeats the frame.
/// Indices past the end of the stream are filled by tiling the frames that
/// were found.
///
/// # Errors
///
/// - [`SampleError::InvalidArgument`] for decreasing indices or an output
///   size that overflows.
/// - [`SampleError::InvariantViolation`] if a seek lands past the first
///   requested frame or frame counting goes backwards.
/// - The open and decode errors of [`sample_frames`].
pub fn sample_frame_indices(
    bytes: &[u8],
    frame_indices: &[u64],
    options: &IndexOptions,
) -> Result<SampledFrames, SampleError> {
    let request = SampleRequest::ExplicitIndices {
        frame_indices: frame_indices.to_vec(),
        seek_first: options.should_seek,
    };
    // Never consulted in index mode.
    let mut rng = StdRng::seed_from_u64(0);
    run(bytes, options.width, options.height, &request, &mut rng)
}

/// Metadata of the video track `bytes` would be sampled from, or `None` if
/// there is no decodable video track.
///
/// # Errors
///
/// Returns [`SampleError::Open`] if the bytes are not a readable container.
pub fn probe(bytes: &[u8]) -> Result<Option<StreamInfo>, SampleError> {
    match FfmpegSession::open(bytes, 0, 0) {
        Ok(session) => Ok(Some(session.info().clone())),
        Err(SampleError::NoVideoStream) => Ok(None),
        Err(error) => Err(error),
    }
}

fn run<R: Rng>(
    bytes: &[u8],
    width: u32,
    height: u32,
    request: &SampleRequest,
    rng: &mut R,
) -> Result<SampledFrames, SampleError> {
    request.validate()?;
    let frame_count = request.frame_count();

    let mut session = match FfmpegSession::open(bytes, width, height) {
        Ok(session) => session,
        Err(error @ (SampleError::NoVideoStream | SampleError::Open(_))) => {
            log::debug!("{error}; returning {frame_count} blank frames");
            let (width, height) = resolve_dimensions(width, height, 0, 0);
            return SampledFrames::blank(frame_count, width, height);
        }
        Err(error) => return Err(error),
    };

    let mut data = allocate_output(frame_count, session.info().frame_size())?;
    let report = sample(&mut session, request, &mut data, rng)?;
    if report.frames_filled > 0 {
        log::debug!(
            "Stream ended after {} of {frame_count} frames; tiled {} slots",
            report.frames_written,
            report.frames_filled
        );
    }
    Ok(SampledFrames::from_report(data, frame_count, session.info(), report))
}

/// Allocate a zeroed tensor of `frame_count` frames of `frame_size` bytes.
pub(crate) fn allocate_output(frame_count: usize, frame_size: usize) -> Result<Vec<u8>, SampleError> {
    let total = frame_count.checked_mul(frame_size).ok_or_else(|| {
        SampleError::InvalidArgument(format!(
            "{frame_count} frames of {frame_size} bytes overflow the address space"
        ))
    })?;

    let mut data = Vec::new();
    data.try_reserve_exact(total)
        .map_err(|_| SampleError::AllocationFailed { bytes: total })?;
    data.resize(total, 0);
    Ok(data)
}
