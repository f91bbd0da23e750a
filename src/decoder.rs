//! FFmpeg-backed [`FrameSource`].
//!
//! [`FfmpegSession`] demuxes an in-memory container, decodes its best video
//! stream and converts every frame to packed RGB24 at the requested size.

use std::ffi::c_int;

use ffmpeg_next::{
    Error as FfmpegError, Packet, Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::Pixel,
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
    util::error::EAGAIN,
};

use crate::error::SampleError;
use crate::memory_io::MemoryInput;
use crate::options::resolve_dimensions;
use crate::source::{FrameRef, FrameSource, StreamInfo};

/// A decoding session over one encoded video held in memory.
///
/// The session borrows the encoded bytes for its whole lifetime and is meant
/// to live for a single extraction call.
///
/// # Example
///
/// ```no_run
/// use vidsample::{FfmpegSession, FrameSource};
///
/// let bytes = std::fs::read("clip.mp4")?;
/// let mut session = FfmpegSession::open(&bytes, 224, 0)?;
/// println!("{} frames at {:.2} fps", session.info().frame_count, session.info().frames_per_second);
///
/// while let Some(frame) = session.decode_next()? {
///     println!("pts {:?}, {} bytes", frame.pts, frame.data.len());
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct FfmpegSession<'a> {
    input: MemoryInput<'a>,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    stream_index: usize,
    info: StreamInfo,
    decoded_frame: VideoFrame,
    scaled_frame: VideoFrame,
    current_pts: Option<i64>,
    eof_sent: bool,
}

impl<'a> FfmpegSession<'a> {
    /// Open `bytes` and prepare to decode its best video stream at
    /// `width`×`height` (zeros resolve against the source size, see
    /// [`resolve_dimensions`]).
    ///
    /// # Errors
    ///
    /// - [`SampleError::Open`] if the container cannot be probed.
    /// - [`SampleError::NoVideoStream`] if there is no video stream or its
    ///   codec cannot be opened.
    /// - [`SampleError::Ffmpeg`] if the colour converter cannot be created.
    pub fn open(bytes: &'a [u8], width: u32, height: u32) -> Result<Self, SampleError> {
        crate::ffmpeg::ensure_initialized()?;
        let input = MemoryInput::open(bytes)?;

        let stream = input
            .streams()
            .best(Type::Video)
            .ok_or(SampleError::NoVideoStream)?;
        let stream_index = stream.index();
        let time_base = stream.time_base();

        let decoder_context =
            CodecContext::from_parameters(stream.parameters()).map_err(|error| {
                log::warn!("Cannot read video codec parameters: {error}");
                SampleError::NoVideoStream
            })?;
        let decoder = decoder_context.decoder().video().map_err(|error| {
            log::warn!("Cannot open video decoder: {error}");
            SampleError::NoVideoStream
        })?;

        let frames_per_second = rational_to_f64(stream.avg_frame_rate())
            .or_else(|| rational_to_f64(stream.rate()))
            .unwrap_or(0.0);

        let start_time = match stream.start_time() {
            ffmpeg_sys_next::AV_NOPTS_VALUE => 0,
            start => start,
        };

        let duration = if stream.duration() > 0 {
            stream.duration()
        } else {
            container_duration_in(input.duration(), time_base)
        };

        let source_width = decoder.width();
        let source_height = decoder.height();
        let (width, height) = resolve_dimensions(width, height, source_width, source_height);

        let mut info = StreamInfo {
            time_base,
            start_time,
            duration,
            frame_count: 0,
            frames_per_second,
            width,
            height,
            source_width,
            source_height,
            codec: decoder
                .codec()
                .map(|codec| codec.name().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        };
        info.frame_count = match stream.frames() {
            frames if frames > 0 => frames as u64,
            _ if frames_per_second > 0.0 => {
                (info.duration_seconds().max(0.0) * frames_per_second) as u64
            }
            _ => 0,
        };

        let scaler = ScalingContext::get(
            decoder.format(),
            source_width,
            source_height,
            Pixel::RGB24,
            width,
            height,
            ScalingFlags::BILINEAR,
        )?;

        log::debug!(
            "Opened {} stream #{stream_index}: {source_width}x{source_height} -> {width}x{height}, \
             {frames_per_second:.3} fps, {} frames",
            info.codec,
            info.frame_count
        );

        Ok(Self {
            input,
            decoder,
            scaler,
            stream_index,
            info,
            decoded_frame: VideoFrame::empty(),
            scaled_frame: VideoFrame::empty(),
            current_pts: None,
            eof_sent: false,
        })
    }

    /// Index of the decoded stream inside the container.
    #[must_use]
    pub fn stream_index(&self) -> usize {
        self.stream_index
    }

    fn current_frame(&self) -> FrameRef<'_> {
        FrameRef {
            pts: self.current_pts,
            width: self.info.width,
            height: self.info.height,
            stride: self.scaled_frame.stride(0),
            data: self.scaled_frame.data(0),
        }
    }

    /// Feed the decoder one more packet of our stream, or end-of-stream.
    fn feed_decoder(&mut self) -> Result<(), SampleError> {
        let mut packet = Packet::empty();
        loop {
            if read_status(packet.read(&mut self.input))? {
                if packet.stream() != self.stream_index {
                    continue;
                }
                return self
                    .decoder
                    .send_packet(&packet)
                    .map_err(|error| SampleError::Decode(format!("send_packet failed: {error}")));
            }
            self.eof_sent = true;
            return self
                .decoder
                .send_eof()
                .map_err(|error| SampleError::Decode(format!("send_eof failed: {error}")));
        }
    }
}

impl FrameSource for FfmpegSession<'_> {
    fn info(&self) -> &StreamInfo {
        &self.info
    }

    fn decode_next(&mut self) -> Result<Option<FrameRef<'_>>, SampleError> {
        loop {
            match self.decoder.receive_frame(&mut self.decoded_frame) {
                Ok(()) => {
                    self.scaler.run(&self.decoded_frame, &mut self.scaled_frame)?;
                    self.current_pts = self
                        .decoded_frame
                        .pts()
                        .or_else(|| self.decoded_frame.timestamp());
                    return Ok(Some(self.current_frame()));
                }
                Err(FfmpegError::Eof) => return Ok(None),
                Err(FfmpegError::Other { errno: EAGAIN }) => {
                    if self.eof_sent {
                        return Ok(None);
                    }
                    self.feed_decoder()?;
                }
                Err(error) => {
                    return Err(SampleError::Decode(format!("receive_frame failed: {error}")));
                }
            }
        }
    }

    fn seek_approx(&mut self, timestamp: i64) -> Result<(), SampleError> {
        let stream_index = c_int::try_from(self.stream_index).map_err(|_| SampleError::Seek {
            timestamp,
            reason: "stream index out of range".to_string(),
        })?;

        // SAFETY: the format context is open for the lifetime of `self.input`.
        let status = unsafe {
            ffmpeg_sys_next::av_seek_frame(
                self.input.as_mut_ptr(),
                stream_index,
                timestamp,
                ffmpeg_sys_next::AVSEEK_FLAG_BACKWARD as c_int,
            )
        };
        if status < 0 {
            return Err(SampleError::Seek {
                timestamp,
                reason: FfmpegError::from(status).to_string(),
            });
        }

        self.decoder.flush();
        self.eof_sent = false;
        self.current_pts = None;
        log::debug!("Seeked stream #{} to timestamp {timestamp}", self.stream_index);
        Ok(())
    }
}

fn rational_to_f64(rate: Rational) -> Option<f64> {
    if rate.numerator() > 0 && rate.denominator() > 0 {
        Some(f64::from(rate.numerator()) / f64::from(rate.denominator()))
    } else {
        None
    }
}

/// Whether a packet read produced a packet (`true`) or hit the end of the
/// input (`false`). Any other demuxer failure is fatal.
fn read_status(result: Result<(), FfmpegError>) -> Result<bool, SampleError> {
    match result {
        Ok(()) => Ok(true),
        Err(FfmpegError::Eof) => Ok(false),
        Err(error) => Err(SampleError::Demux(error.to_string())),
    }
}

/// Rescale a container duration (microseconds) into `time_base` units.
fn container_duration_in(microseconds: i64, time_base: Rational) -> i64 {
    let (numerator, denominator) = (
        i128::from(time_base.numerator()),
        i128::from(time_base.denominator()),
    );
    if microseconds <= 0 || numerator <= 0 || denominator <= 0 {
        return 0;
    }
    let scaled = i128::from(microseconds) * denominator / (numerator * 1_000_000);
    i64::try_from(scaled).unwrap_or(i64::MAX)
}
