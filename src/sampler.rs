//! The frame sampling engine.
//!
//! [`sample`] drives a [`FrameSource`] and writes the selected frames into a
//! caller-provided tensor buffer. Two policies are supported:
//!
//! - **Rate limited**: keep frames so that the effective frame rate never
//!   exceeds a cap, optionally starting from a random point in the track.
//! - **Explicit indices**: keep exactly the listed frame numbers, walking the
//!   stream (optionally after an approximate seek) and counting frames by
//!   strictly increasing PTS.
//!
//! Whenever the stream ends before the buffer is full, the frames already
//! written are tiled over the remainder (see [`crate::fill`]).

use rand::Rng;

use crate::copy::copy_frame;
use crate::error::SampleError;
use crate::fill::tile_written_frames;
use crate::seek;
use crate::source::{FrameRef, FrameSource};

/// What to extract from a stream.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleRequest {
    /// Keep up to `frame_count` frames, dropping frames so the kept sequence
    /// runs at no more than `fps_cap` frames per second.
    RateLimited {
        /// Number of frames in the output tensor.
        frame_count: usize,
        /// Upper bound on the effective frame rate of the kept frames.
        fps_cap: f64,
        /// Start from a random position instead of the beginning.
        random_seek: bool,
    },
    /// Keep the frames at the given (non-decreasing) indices.
    ExplicitIndices {
        /// Zero-based frame numbers, one per output slot.
        frame_indices: Vec<u64>,
        /// Seek close to the first index instead of decoding from the start.
        seek_first: bool,
    },
}

impl SampleRequest {
    /// Number of frame slots in the output tensor.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        match self {
            SampleRequest::RateLimited { frame_count, .. } => *frame_count,
            SampleRequest::ExplicitIndices { frame_indices, .. } => frame_indices.len(),
        }
    }

    /// Check the request's arguments.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::InvalidArgument`] for a non-positive or
    /// non-finite `fps_cap`, or for frame indices that decrease.
    pub fn validate(&self) -> Result<(), SampleError> {
        match self {
            SampleRequest::RateLimited { fps_cap, .. } => {
                if !fps_cap.is_finite() || *fps_cap <= 0.0 {
                    return Err(SampleError::InvalidArgument(format!(
                        "fps_cap must be a positive number, got {fps_cap}"
                    )));
                }
            }
            SampleRequest::ExplicitIndices { frame_indices, .. } => {
                if let Some(position) = frame_indices
                    .windows(2)
                    .position(|pair| pair[1] < pair[0])
                {
                    return Err(SampleError::InvalidArgument(format!(
                        "frame indices must be non-decreasing ({} follows {} at position {})",
                        frame_indices[position + 1],
                        frame_indices[position],
                        position + 1
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Fractional frame-dropping accumulator.
///
/// When the stream runs faster than the cap, every kept frame "owes"
/// `stream_fps / fps_cap - 1` dropped frames. The owed fraction accumulates
/// and whole frames are dropped as soon as it reaches one, which spreads the
/// drops as evenly as possible without consulting timestamps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimiter {
    per_frame_extra: f64,
    accumulated: f64,
}

impl RateLimiter {
    /// Create a limiter for a stream running at `stream_fps` with output
    /// capped at `fps_cap`.
    ///
    /// An unknown (zero or non-finite) stream rate, or a stream at or below
    /// the cap, keeps every frame.
    #[must_use]
    pub fn new(stream_fps: f64, fps_cap: f64) -> Self {
        let ratio = stream_fps / fps_cap;
        let per_frame_extra = if ratio.is_finite() && ratio > 1.0 {
            ratio - 1.0
        } else {
            0.0
        };
        Self {
            per_frame_extra,
            accumulated: 0.0,
        }
    }

    /// A limiter that never drops frames.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            per_frame_extra: 0.0,
            accumulated: 0.0,
        }
    }

    /// Frames dropped per kept frame, on average.
    #[must_use]
    pub fn per_frame_extra(&self) -> f64 {
        self.per_frame_extra
    }

    /// Fraction of a frame currently owed. Always in `[0, 1)` between calls.
    #[must_use]
    pub fn accumulated(&self) -> f64 {
        self.accumulated
    }

    /// Record one kept frame and return how many decoded frames to discard
    /// before the next keep.
    pub fn on_kept(&mut self) -> u32 {
        self.accumulated += self.per_frame_extra;
        let mut drops = 0;
        while self.accumulated >= 1.0 {
            self.accumulated -= 1.0;
            drops += 1;
        }
        drops
    }
}

/// Per-call bookkeeping for one extraction.
#[derive(Debug, Clone)]
pub struct SamplingState {
    /// Bytes written into the output so far.
    pub copied_bytes: usize,
    /// Output slots written with decoded (not tiled) frames.
    pub frames_written: usize,
    /// Drop accumulator (rate-limited mode only).
    pub limiter: RateLimiter,
}

impl SamplingState {
    fn new(limiter: RateLimiter) -> Self {
        Self {
            copied_bytes: 0,
            frames_written: 0,
            limiter,
        }
    }

    /// Copy `frame` into the next output slot.
    fn keep(
        &mut self,
        dest: &mut [u8],
        frame: &FrameRef<'_>,
        width: u32,
        height: u32,
    ) -> Result<(), SampleError> {
        if frame.width != width || frame.height != height {
            return Err(SampleError::FrameLayout(format!(
                "decoder produced a {}x{} frame, expected {width}x{height}",
                frame.width, frame.height
            )));
        }
        self.copied_bytes = copy_frame(dest, self.copied_bytes, frame)?;
        self.frames_written += 1;
        Ok(())
    }

    /// Write the previous output slot again (repeated frame index).
    fn repeat_previous(&mut self, dest: &mut [u8], frame_size: usize) {
        let start = self.copied_bytes - frame_size;
        dest.copy_within(start..self.copied_bytes, self.copied_bytes);
        self.copied_bytes += frame_size;
        self.frames_written += 1;
    }
}

/// Outcome of one extraction.
#[derive(Debug, Clone, Copy, PartialEq)]
#[must_use]
pub struct SampleReport {
    /// Slots written with decoded frames.
    pub frames_written: usize,
    /// Slots padded by repeating earlier frames.
    pub frames_filled: usize,
    /// Total frames pulled from the source, kept or not.
    pub frames_decoded: u64,
    /// Random seek offset in seconds, `0.0` when no seek happened.
    pub seek_distance: f64,
}

/// Run `request` against `source`, writing into `dest`.
///
/// `dest` must be exactly `request.frame_count()` frames of
/// `width * height * 3` bytes, where the dimensions are those reported by
/// `source.info()`. `rng` is only consulted for a random seek.
///
/// # Errors
///
/// - [`SampleError::InvalidArgument`] for a malformed request or a
///   mis-sized `dest`.
/// - Decoder faults propagated from the source.
/// - [`SampleError::InvariantViolation`] if an index seek lands after the
///   first requested frame.
pub fn sample<S, R>(
    source: &mut S,
    request: &SampleRequest,
    dest: &mut [u8],
    rng: &mut R,
) -> Result<SampleReport, SampleError>
where
    S: FrameSource + ?Sized,
    R: Rng,
{
    request.validate()?;

    let expected = request
        .frame_count()
        .checked_mul(source.info().frame_size())
        .ok_or_else(|| SampleError::InvalidArgument("output size overflows usize".into()))?;
    if dest.len() != expected {
        return Err(SampleError::InvalidArgument(format!(
            "output buffer is {} bytes, expected {expected}",
            dest.len()
        )));
    }

    match request {
        SampleRequest::RateLimited {
            frame_count,
            fps_cap,
            random_seek,
        } => sample_rate_limited(source, *frame_count, *fps_cap, *random_seek, dest, rng),
        SampleRequest::ExplicitIndices {
            frame_indices,
            seek_first,
        } => sample_indices(source, frame_indices, *seek_first, dest),
    }
}

fn sample_rate_limited<S, R>(
    source: &mut S,
    frame_count: usize,
    fps_cap: f64,
    random_seek: bool,
    dest: &mut [u8],
    rng: &mut R,
) -> Result<SampleReport, SampleError>
where
    S: FrameSource + ?Sized,
    R: Rng,
{
    let info = source.info();
    let (width, height) = (info.width, info.height);
    let frame_size = info.frame_size();
    if info.frames_per_second <= 0.0 {
        log::warn!("Stream reports no frame rate; keeping every decoded frame");
    }

    let mut state = SamplingState::new(RateLimiter::new(info.frames_per_second, fps_cap));
    let mut report = SampleReport {
        frames_written: 0,
        frames_filled: 0,
        frames_decoded: 0,
        seek_distance: 0.0,
    };

    if frame_count == 0 {
        return Ok(report);
    }

    // Frames before the seek target are pre-roll from the preceding keyframe.
    let mut skip_before = None;
    if random_seek {
        if let Some(target) = seek::random_seek(source, frame_count, fps_cap, rng)? {
            report.seek_distance = target.distance;
            skip_before = Some(target.timestamp);
        }
    }

    while state.frames_written < frame_count {
        let kept = loop {
            let Some(frame) = source.decode_next()? else {
                break false;
            };
            report.frames_decoded += 1;

            if let (Some(limit), Some(pts)) = (skip_before, frame.pts) {
                if pts < limit {
                    continue;
                }
            }

            state.keep(dest, &frame, width, height)?;
            break true;
        };

        if !kept {
            if state.frames_written == 0 && skip_before.is_some() {
                log::warn!("Ran out of frames while skipping pre-roll after seek");
            }
            break;
        }
        skip_before = None;

        if state.frames_written == frame_count {
            break;
        }

        let mut exhausted = false;
        for _ in 0..state.limiter.on_kept() {
            if source.decode_next()?.is_none() {
                exhausted = true;
                break;
            }
            report.frames_decoded += 1;
        }
        if exhausted {
            break;
        }
    }

    report.frames_written = state.frames_written;
    report.frames_filled = tile_written_frames(dest, state.frames_written, frame_size);
    Ok(report)
}

fn sample_indices<S>(
    source: &mut S,
    frame_indices: &[u64],
    seek_first: bool,
    dest: &mut [u8],
) -> Result<SampleReport, SampleError>
where
    S: FrameSource + ?Sized,
{
    let info = source.info();
    let (width, height) = (info.width, info.height);
    let frame_size = info.frame_size();
    let total_frames = info.frame_count;
    let start_time = info.start_time;
    let average_duration = seek::average_frame_duration(info);

    let mut state = SamplingState::new(RateLimiter::unlimited());
    let mut report = SampleReport {
        frames_written: 0,
        frames_filled: 0,
        frames_decoded: 0,
        seek_distance: 0.0,
    };

    let Some(&first_index) = frame_indices.first() else {
        return Ok(report);
    };

    // Index of the most recently decoded frame, and the PTS that counted it.
    let mut current_index: Option<u64> = None;
    let mut previous_pts: Option<i64> = None;
    let mut last_kept_index: Option<u64> = None;

    if seek_first {
        match average_duration {
            Some(average) => {
                let timestamp = start_time
                    .saturating_add(seek::frame_index_to_timestamp(first_index, average));
                log::debug!("Seeking to frame {first_index} (timestamp {timestamp})");
                source.seek_approx(timestamp)?;

                let Some(frame) = source.decode_next()? else {
                    log::warn!("No frames received after seeking to frame {first_index}");
                    return Ok(report);
                };
                report.frames_decoded += 1;

                let pts = frame.pts.ok_or_else(|| {
                    SampleError::InvariantViolation(
                        "first frame after a seek carries no timestamp".into(),
                    )
                })?;
                let landed = seek::pts_to_frame_index(pts.saturating_sub(start_time), average);
                if landed > first_index {
                    return Err(SampleError::InvariantViolation(format!(
                        "seek for frame {first_index} landed on frame {landed}"
                    )));
                }

                if landed == first_index {
                    state.keep(dest, &frame, width, height)?;
                    last_kept_index = Some(first_index);
                }
                current_index = Some(landed);
                previous_pts = Some(pts);
            }
            None => log::warn!(
                "Stream has no usable duration/frame count; decoding from the start instead of seeking"
            ),
        }
    }

    for &index in &frame_indices[state.frames_written..] {
        if total_frames > 0 && index > total_frames {
            log::warn!("Frame {index} is past the end of the stream ({total_frames} frames)");
            break;
        }

        if last_kept_index == Some(index) {
            state.repeat_previous(dest, frame_size);
            continue;
        }

        if current_index.is_some_and(|current| current >= index) {
            return Err(SampleError::InvariantViolation(format!(
                "decoder is already past frame {index}"
            )));
        }

        let reached = loop {
            let Some(frame) = source.decode_next()? else {
                break false;
            };
            report.frames_decoded += 1;

            // Only a strictly later PTS counts as a new frame; decoders may
            // hand the first frame after a seek out twice.
            let advances = match (frame.pts, previous_pts) {
                (Some(pts), Some(previous)) => pts > previous,
                _ => true,
            };
            if advances {
                current_index = Some(current_index.map_or(0, |current| current + 1));
                if frame.pts.is_some() {
                    previous_pts = frame.pts;
                }
            }

            if current_index == Some(index) {
                state.keep(dest, &frame, width, height)?;
                break true;
            }
        };

        if !reached {
            break;
        }
        last_kept_index = Some(index);
    }

    report.frames_written = state.frames_written;
    report.frames_filled = tile_written_frames(dest, state.frames_written, frame_size);
    Ok(report)
}
