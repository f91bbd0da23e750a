//! Synthetic frame source shared by the integration tests.
//!
//! Frames are tiny and self-identifying: the first eight bytes of every frame
//! hold its index (little endian), so tests can read back which decoded
//! frame ended up in which output slot.

#![allow(dead_code)]

use ffmpeg_next::Rational;
use vidsample::{FrameRef, FrameSource, SampleError, StreamInfo};

/// Ticks per second of the synthetic time base.
pub const TIME_BASE_DENOMINATOR: i32 = 90_000;

pub const WIDTH: u32 = 2;
pub const HEIGHT: u32 = 2;
pub const FRAME_SIZE: usize = (WIDTH * HEIGHT * 3) as usize;

/// An in-memory "decoder" over a fixed list of frames.
pub struct SyntheticSource {
    info: StreamInfo,
    pts: Vec<Option<i64>>,
    frames: Vec<Vec<u8>>,
    stride: usize,
    position: usize,
    keyframe_interval: usize,
    duplicate_after_seek: bool,
    pending_duplicate: bool,
    seek_overshoot: usize,
    pub seeks: Vec<i64>,
    pub decoded: usize,
}

impl SyntheticSource {
    /// `frame_count` frames at `frames_per_second` (must divide 90 000),
    /// every frame a keyframe.
    pub fn new(frame_count: usize, frames_per_second: u32) -> Self {
        let frame_duration = i64::from(TIME_BASE_DENOMINATOR) / i64::from(frames_per_second);
        let pts = (0..frame_count)
            .map(|index| Some(index as i64 * frame_duration))
            .collect();
        let info = StreamInfo {
            time_base: Rational::new(1, TIME_BASE_DENOMINATOR),
            start_time: 0,
            duration: frame_count as i64 * frame_duration,
            frame_count: frame_count as u64,
            frames_per_second: f64::from(frames_per_second),
            width: WIDTH,
            height: HEIGHT,
            source_width: WIDTH,
            source_height: HEIGHT,
            codec: "synthetic".to_string(),
        };
        let mut source = Self {
            info,
            pts,
            frames: Vec::new(),
            stride: WIDTH as usize * 3,
            position: 0,
            keyframe_interval: 1,
            duplicate_after_seek: false,
            pending_duplicate: false,
            seek_overshoot: 0,
            seeks: Vec::new(),
            decoded: 0,
        };
        source.render();
        source
    }

    /// Shift every PTS (and the reported start time) by `offset` ticks.
    pub fn with_start_time(mut self, offset: i64) -> Self {
        self.info.start_time = offset;
        for pts in self.pts.iter_mut().flatten() {
            *pts += offset;
        }
        self
    }

    /// Seeks land on multiples of `interval` frames.
    pub fn with_keyframe_interval(mut self, interval: usize) -> Self {
        self.keyframe_interval = interval.max(1);
        self
    }

    /// The first frame after every seek is delivered twice.
    pub fn with_duplicate_after_seek(mut self) -> Self {
        self.duplicate_after_seek = true;
        self
    }

    /// Seeks land `frames` frames after the requested point, breaking the
    /// approximate-seek contract.
    pub fn with_seek_overshoot(mut self, frames: usize) -> Self {
        self.seek_overshoot = frames;
        self
    }

    /// Pad every row with `padding` extra bytes.
    pub fn with_row_padding(mut self, padding: usize) -> Self {
        self.stride = WIDTH as usize * 3 + padding;
        self.render();
        self
    }

    /// Report a different nominal frame rate than the one the PTS imply.
    pub fn with_reported_fps(mut self, frames_per_second: f64) -> Self {
        self.info.frames_per_second = frames_per_second;
        self
    }

    /// Report a different nominal frame count (e.g. a lying container).
    pub fn with_reported_frame_count(mut self, frame_count: u64) -> Self {
        self.info.frame_count = frame_count;
        self
    }

    /// Report a start time without shifting the frame timestamps.
    pub fn with_reported_start_time(mut self, start_time: i64) -> Self {
        self.info.start_time = start_time;
        self
    }

    /// Drop the PTS of frame `index`.
    pub fn without_pts_at(mut self, index: usize) -> Self {
        self.pts[index] = None;
        self
    }

    fn render(&mut self) {
        let row = WIDTH as usize * 3;
        self.frames = (0..self.pts.len())
            .map(|index| {
                let mut packed = vec![(index % 251) as u8; FRAME_SIZE];
                packed[..8].copy_from_slice(&(index as u64).to_le_bytes());

                let mut strided = vec![0xEE; self.stride * (HEIGHT as usize - 1) + row];
                for (y, chunk) in packed.chunks_exact(row).enumerate() {
                    strided[y * self.stride..y * self.stride + row].copy_from_slice(chunk);
                }
                strided
            })
            .collect();
    }
}

impl FrameSource for SyntheticSource {
    fn info(&self) -> &StreamInfo {
        &self.info
    }

    fn decode_next(&mut self) -> Result<Option<FrameRef<'_>>, SampleError> {
        if self.position >= self.frames.len() {
            return Ok(None);
        }

        let index = self.position;
        if self.pending_duplicate {
            self.pending_duplicate = false;
        } else {
            self.position += 1;
        }
        self.decoded += 1;

        Ok(Some(FrameRef {
            pts: self.pts[index],
            width: WIDTH,
            height: HEIGHT,
            stride: self.stride,
            data: &self.frames[index],
        }))
    }

    fn seek_approx(&mut self, timestamp: i64) -> Result<(), SampleError> {
        self.seeks.push(timestamp);

        let target = self
            .pts
            .iter()
            .rposition(|pts| pts.is_some_and(|pts| pts <= timestamp))
            .unwrap_or(0);
        let landed = target - target % self.keyframe_interval + self.seek_overshoot;
        self.position = landed.min(self.frames.len());
        self.pending_duplicate = self.duplicate_after_seek;
        Ok(())
    }
}

/// Frame index encoded in the first bytes of an output slot.
pub fn frame_id(slot: &[u8]) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&slot[..8]);
    u64::from_le_bytes(bytes)
}

/// Frame indices of every slot in a tensor.
pub fn frame_ids(tensor: &[u8]) -> Vec<u64> {
    tensor.chunks_exact(FRAME_SIZE).map(frame_id).collect()
}

/// Bytes of a fixture under `tests/fixtures`, if it has been generated.
pub fn fixture(name: &str) -> Option<Vec<u8>> {
    std::fs::read(format!("tests/fixtures/{name}")).ok()
}
