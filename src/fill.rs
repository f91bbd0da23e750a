//! Shortfall padding for the output buffer.
//!
//! When the stream runs out before every requested frame has been written,
//! the frames that *were* written are repeated cyclically until the buffer is
//! full. This operates purely on bytes already in the buffer, so it can be
//! exercised without any decoder.

/// Tile the first `written_frames` frames of `dest` over the rest of the
/// buffer.
///
/// `dest` holds `dest.len() / frame_size` frame slots. Slots
/// `[written_frames, total)` are filled with copies of slots `0, 1, ..,
/// written_frames - 1, 0, 1, ..`, ending with a partial cycle when the
/// remainder is not a multiple of `written_frames`.
///
/// Returns the number of slots that were filled. Nothing is touched when
/// `written_frames` is zero, when `frame_size` is zero, or when the buffer is
/// already full.
///
/// # Example
///
/// ```
/// let mut dest = vec![1u8, 2, 0, 0, 0];
/// let filled = vidsample::fill::tile_written_frames(&mut dest, 2, 1);
/// assert_eq!(filled, 3);
/// assert_eq!(dest, [1, 2, 1, 2, 1]);
/// ```
pub fn tile_written_frames(dest: &mut [u8], written_frames: usize, frame_size: usize) -> usize {
    if written_frames == 0 || frame_size == 0 {
        return 0;
    }

    let total_frames = dest.len() / frame_size;
    if written_frames >= total_frames {
        return 0;
    }

    log::debug!(
        "Ran out of frames after {written_frames} of {total_frames}; looping written frames"
    );

    let cycle_bytes = written_frames * frame_size;
    let end = total_frames * frame_size;
    let mut copied_bytes = cycle_bytes;

    // Each pass copies at most one full cycle from the front of the buffer.
    while copied_bytes < end {
        let chunk = cycle_bytes.min(end - copied_bytes);
        dest.copy_within(0..chunk, copied_bytes);
        copied_bytes += chunk;
    }

    total_frames - written_frames
}
