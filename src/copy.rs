//! Copying decoded frames into the output tensor.

use crate::error::SampleError;
use crate::source::{CHANNELS, FrameRef};

/// Copy one decoded RGB24 frame into `dest` starting at `copied_bytes`.
///
/// Decoded frames frequently carry per-row padding (stride > width × 3), so
/// rows are copied one at a time unless the frame is tightly packed. Returns
/// the byte offset just past the copied frame.
///
/// # Errors
///
/// Returns [`SampleError::FrameLayout`] if the frame's stride is shorter than
/// a row, its data is too short for its height, or `dest` has no room for it.
pub fn copy_frame(
    dest: &mut [u8],
    copied_bytes: usize,
    frame: &FrameRef<'_>,
) -> Result<usize, SampleError> {
    let row_bytes = frame.width as usize * CHANNELS;
    let height = frame.height as usize;
    let frame_bytes = row_bytes * height;

    if frame.stride < row_bytes {
        return Err(SampleError::FrameLayout(format!(
            "stride {} is shorter than a {}-byte row",
            frame.stride, row_bytes
        )));
    }

    let needed = match height {
        0 => 0,
        rows => (rows - 1) * frame.stride + row_bytes,
    };
    if frame.data.len() < needed {
        return Err(SampleError::FrameLayout(format!(
            "frame holds {} bytes but {needed} are needed for {height} rows",
            frame.data.len()
        )));
    }

    let end = copied_bytes + frame_bytes;
    let Some(target) = dest.get_mut(copied_bytes..end) else {
        return Err(SampleError::FrameLayout(format!(
            "output buffer of {} bytes cannot hold a frame at offset {copied_bytes}",
            dest.len()
        )));
    };

    if frame_bytes == 0 {
        return Ok(end);
    }
    if frame.stride == row_bytes {
        target.copy_from_slice(&frame.data[..frame_bytes]);
    } else {
        for (row, out_row) in target.chunks_exact_mut(row_bytes).enumerate() {
            let row_start = row * frame.stride;
            out_row.copy_from_slice(&frame.data[row_start..row_start + row_bytes]);
        }
    }

    Ok(end)
}
