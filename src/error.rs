//! Error types for the `vidsample` crate.
//!
//! [`SampleError`] is returned by every fallible operation. Variants fall into
//! three groups: caller misuse (bad arguments, allocation), decoder faults
//! (FFmpeg could not open, seek, or decode the stream), and invariant
//! violations, where a [`FrameSource`](crate::FrameSource) broke its
//! approximate-seek contract.
//!
//! Unreadable input, a missing video track and an early end of stream are
//! *not* errors at the sampling entry points; see [`crate::sample_frames`].

use std::io::Error as IoError;

use ffmpeg_next::Error as FfmpegError;
use thiserror::Error;

/// The unified error type for all `vidsample` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SampleError {
    /// An extraction parameter was malformed (zero or non-finite fps cap,
    /// decreasing frame indices, an output size that overflows).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The output buffer could not be allocated.
    #[error("Failed to allocate {bytes} bytes for the output buffer")]
    AllocationFailed {
        /// Number of bytes that were requested.
        bytes: usize,
    },

    /// The encoded input could not be opened as a media container.
    ///
    /// Returned by [`crate::probe`]; the sampling entry points produce a
    /// blank buffer instead.
    #[error("Failed to open encoded video: {0}")]
    Open(String),

    /// The input does not contain a video stream.
    ///
    /// Only surfaced by the session layer; the extraction entry points turn
    /// this into an unspecified-content buffer instead.
    #[error("No video stream found in input")]
    NoVideoStream,

    /// The demuxer failed to read a packet for a reason other than the end
    /// of the input.
    #[error("Failed to read packet: {0}")]
    Demux(String),

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    Decode(String),

    /// The container refused a seek request.
    #[error("Failed to seek to timestamp {timestamp}: {reason}")]
    Seek {
        /// Target timestamp in stream time-base units.
        timestamp: i64,
        /// Underlying reason reported by the demuxer.
        reason: String,
    },

    /// A decoded frame did not have the layout the copy adapter expects.
    #[error("Decoded frame has an unexpected layout: {0}")]
    FrameLayout(String),

    /// The frame source violated its contract, e.g. a seek landed after the
    /// requested frame.
    #[error("Decoder contract violated: {0}")]
    InvariantViolation(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),
}

impl SampleError {
    /// Returns `true` if this error means the decoder collaborator broke its
    /// contract rather than the input being bad.
    #[must_use]
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, SampleError::InvariantViolation(_))
    }

    /// Returns `true` if this error was caused by the caller's arguments.
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            SampleError::InvalidArgument(_) | SampleError::AllocationFailed { .. }
        )
    }
}

impl From<FfmpegError> for SampleError {
    fn from(error: FfmpegError) -> Self {
        SampleError::Ffmpeg(error.to_string())
    }
}
