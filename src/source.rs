//! The decoder contract consumed by the sampling engine.
//!
//! The engine never talks to FFmpeg directly. It drives a [`FrameSource`],
//! which hands out one decoded, already-scaled RGB24 frame at a time and can
//! perform an approximate seek. [`FfmpegSession`](crate::FfmpegSession) is
//! the production implementation; tests plug in synthetic sources.

use std::time::Duration;

use ffmpeg_next::Rational;

use crate::error::SampleError;

/// Number of interleaved colour channels in every output pixel.
pub const CHANNELS: usize = 3;

/// Metadata for the video track a [`FrameSource`] is bound to.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct StreamInfo {
    /// Time base that PTS values and [`duration`](StreamInfo::duration) are
    /// expressed in.
    pub time_base: Rational,
    /// PTS of the first frame in time-base units (zero when unknown).
    pub start_time: i64,
    /// Nominal track duration in time-base units.
    pub duration: i64,
    /// Nominal number of frames in the track.
    pub frame_count: u64,
    /// Nominal frame rate. Zero when the container does not report one.
    pub frames_per_second: f64,
    /// Width of the frames handed out by the source, in pixels.
    pub width: u32,
    /// Height of the frames handed out by the source, in pixels.
    pub height: u32,
    /// Coded width of the track before scaling.
    pub source_width: u32,
    /// Coded height of the track before scaling.
    pub source_height: u32,
    /// Codec name (e.g. `"h264"`).
    pub codec: String,
}

impl StreamInfo {
    /// Track duration in seconds.
    #[must_use]
    pub fn duration_seconds(&self) -> f64 {
        crate::seek::pts_to_seconds(self.duration, self.time_base)
    }

    /// Track duration as a [`Duration`], saturating at zero.
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.duration_seconds().max(0.0))
    }

    /// Number of bytes in one RGB24 output frame.
    #[must_use]
    pub fn frame_size(&self) -> usize {
        self.width as usize * self.height as usize * CHANNELS
    }
}

/// One decoded frame, borrowed from its [`FrameSource`].
///
/// The borrow ends before the next call to
/// [`decode_next`](FrameSource::decode_next), so the pixels must be copied out
/// while the handle is alive.
#[derive(Debug, Clone, Copy)]
pub struct FrameRef<'a> {
    /// Presentation timestamp in the track's time base, if the decoder knew it.
    pub pts: Option<i64>,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Distance in bytes between the starts of consecutive rows.
    pub stride: usize,
    /// Packed RGB24 rows, `stride` bytes apart.
    pub data: &'a [u8],
}

/// A decoder session bound to one video track.
///
/// Implementations are used from a single thread for the duration of one
/// extraction call.
pub trait FrameSource {
    /// Metadata of the bound track.
    fn info(&self) -> &StreamInfo;

    /// Decode the next displayable frame.
    ///
    /// Returns `Ok(None)` once the stream is exhausted, after any frames still
    /// buffered inside the codec have been delivered.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::Decode`] or [`SampleError::Ffmpeg`] when the
    /// bitstream cannot be decoded.
    fn decode_next(&mut self) -> Result<Option<FrameRef<'_>>, SampleError>;

    /// Seek to at or before `timestamp` (time-base units).
    ///
    /// The landing position is container dependent, usually the closest
    /// preceding keyframe.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::Seek`] when the container refuses the seek.
    fn seek_approx(&mut self, timestamp: i64) -> Result<(), SampleError>;
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn info(&self) -> &StreamInfo {
        (**self).info()
    }

    fn decode_next(&mut self) -> Result<Option<FrameRef<'_>>, SampleError> {
        (**self).decode_next()
    }

    fn seek_approx(&mut self, timestamp: i64) -> Result<(), SampleError> {
        (**self).seek_approx(timestamp)
    }
}
