//! Seek planning and timestamp arithmetic.
//!
//! Two starting strategies exist. Rate-limited sampling may jump to a random
//! point that still leaves room for the requested clip, and index sampling
//! jumps close to the first requested frame using the average frame duration.
//! Container seeks are approximate (they land on a preceding keyframe), so
//! the index path re-derives where it actually landed from the first decoded
//! PTS.

use ffmpeg_next::Rational;
use rand::Rng;

use crate::error::SampleError;
use crate::source::{FrameSource, StreamInfo};

const MICROSECONDS_PER_SECOND: f64 = 1_000_000.0;

/// Where a randomized seek was aimed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekTarget {
    /// Offset from the start of the track, in seconds.
    pub distance: f64,
    /// The same offset in track time-base units, including the track's
    /// start time.
    pub timestamp: i64,
}

/// Rescale a PTS value from stream time base to seconds.
#[must_use]
pub fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    if time_base.denominator() == 0 {
        return 0.0;
    }
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Convert a number of seconds into the stream's time base.
///
/// Seconds are first rounded to whole microseconds, then rescaled with
/// rounding toward negative infinity so the result never lands after the
/// requested point.
#[must_use]
pub fn seconds_to_stream_timestamp(seconds: f64, time_base: Rational) -> i64 {
    let numerator = i128::from(time_base.numerator());
    let denominator = i128::from(time_base.denominator());
    if numerator <= 0 || denominator <= 0 {
        return 0;
    }

    let microseconds = (seconds * MICROSECONDS_PER_SECOND + 0.5).floor() as i128;
    let scaled = (microseconds * denominator).div_euclid(numerator * 1_000_000);
    scaled.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

/// Length of the interval a random seek may land in, in seconds.
///
/// The window is the track duration minus the time `frame_count` frames take
/// at `min(stream fps, fps_cap)`. Returns `None` when the stream frame rate is
/// unknown or the clip would not fit after any positive offset.
#[must_use]
pub fn random_seek_window(info: &StreamInfo, frame_count: usize, fps_cap: f64) -> Option<f64> {
    let stream_fps = info.frames_per_second;
    if !stream_fps.is_finite() || stream_fps <= 0.0 {
        return None;
    }

    let frame_rate = stream_fps.min(fps_cap);
    let window = info.duration_seconds() - frame_count as f64 / frame_rate;
    (window > 0.0).then_some(window)
}

/// Draw a seek distance uniformly from `[0, window)`.
pub fn draw_seek_distance<R: Rng>(window: f64, rng: &mut R) -> f64 {
    rng.random_range(0.0..window)
}

/// Average duration of one frame in time-base units.
///
/// `None` when the track does not report both a duration and a frame count,
/// or when the integer quotient is zero.
#[must_use]
pub fn average_frame_duration(info: &StreamInfo) -> Option<i64> {
    if info.duration <= 0 || info.frame_count == 0 {
        return None;
    }
    let frame_count = i64::try_from(info.frame_count).ok()?;
    let average = info.duration / frame_count;
    (average > 0).then_some(average)
}

/// Approximate timestamp of frame `index`, relative to the track start.
#[must_use]
pub fn frame_index_to_timestamp(index: u64, average_frame_duration: i64) -> i64 {
    i64::try_from(index)
        .unwrap_or(i64::MAX)
        .saturating_mul(average_frame_duration)
}

/// Frame index a decoded frame most likely has, given its offset from the
/// track start.
#[must_use]
pub fn pts_to_frame_index(relative_pts: i64, average_frame_duration: i64) -> u64 {
    if average_frame_duration <= 0 {
        return 0;
    }
    (relative_pts.max(0) / average_frame_duration) as u64
}

/// Seek `source` to a random point that leaves room for `frame_count` frames.
///
/// Returns `Ok(None)` without touching the source when there is no room to
/// seek (short clip, unknown frame rate).
///
/// # Errors
///
/// Propagates [`SampleError::Seek`] from the source.
pub fn random_seek<S, R>(
    source: &mut S,
    frame_count: usize,
    fps_cap: f64,
    rng: &mut R,
) -> Result<Option<SeekTarget>, SampleError>
where
    S: FrameSource + ?Sized,
    R: Rng,
{
    let info = source.info();
    let Some(window) = random_seek_window(info, frame_count, fps_cap) else {
        log::debug!(
            "No room for a random seek ({:.3}s track, {frame_count} frames at cap {fps_cap})",
            info.duration_seconds()
        );
        return Ok(None);
    };

    let distance = draw_seek_distance(window, rng);
    let timestamp = info
        .start_time
        .saturating_add(seconds_to_stream_timestamp(distance, info.time_base));

    log::debug!("Random seek to {distance:.3}s (timestamp {timestamp}, window {window:.3}s)");
    source.seek_approx(timestamp)?;

    Ok(Some(SeekTarget {
        distance,
        timestamp,
    }))
}
