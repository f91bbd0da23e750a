//! Demuxing straight from an in-memory byte slice.
//!
//! [`EncodedVideoBuffer`] is a read-only cursor over the caller's encoded
//! bytes. [`MemoryInput`] hands that cursor to FFmpeg through a custom
//! `AVIOContext`, so containers are probed and demuxed without touching the
//! filesystem.

use std::ffi::{c_int, c_void};
use std::io::{self, Read, Seek, SeekFrom};
use std::ops::{Deref, DerefMut};
use std::ptr;

use ffmpeg_next::Error as FfmpegError;
use ffmpeg_next::format::context::Input;
use ffmpeg_sys_next::{AVFormatContext, AVIOContext};

use crate::error::SampleError;

/// Size of the scratch buffer FFmpeg reads through.
const IO_BUFFER_SIZE: usize = 32 * 1024;

// `whence` values FFmpeg passes to the seek callback.
const SEEK_SET: c_int = 0;
const SEEK_CUR: c_int = 1;
const SEEK_END: c_int = 2;
const AVSEEK_SIZE: c_int = 0x10000;
const AVSEEK_FORCE: c_int = 0x20000;

/// Read-only cursor over an encoded video held in memory.
///
/// # Example
///
/// ```
/// use std::io::SeekFrom;
///
/// use vidsample::EncodedVideoBuffer;
///
/// let mut buffer = EncodedVideoBuffer::new(b"abcdef");
/// assert_eq!(buffer.read_next(4), b"abcd");
/// buffer.seek_to(SeekFrom::End(-1)).unwrap();
/// assert_eq!(buffer.read_next(4), b"f");
/// assert_eq!(buffer.size(), 6);
/// ```
#[derive(Debug, Clone)]
pub struct EncodedVideoBuffer<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> EncodedVideoBuffer<'a> {
    /// Wrap `bytes`, with the cursor at the start.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Total size of the encoded input in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Current cursor position.
    #[must_use]
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Return up to `n` bytes from the cursor and advance past them.
    ///
    /// Returns an empty slice at (or past) the end of the input.
    pub fn read_next(&mut self, n: usize) -> &'a [u8] {
        let start = self.offset.min(self.bytes.len());
        let end = start.saturating_add(n).min(self.bytes.len());
        self.offset = end;
        &self.bytes[start..end]
    }

    /// Move the cursor.
    ///
    /// Positions past the end are allowed and simply read as empty.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::InvalidInput`] if the target position would be
    /// negative or overflow.
    pub fn seek_to(&mut self, position: SeekFrom) -> io::Result<u64> {
        let target = match position {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::Current(delta) => self.offset as i128 + i128::from(delta),
            SeekFrom::End(delta) => self.bytes.len() as i128 + i128::from(delta),
        };

        let target = usize::try_from(target).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot seek to byte offset {target}"),
            )
        })?;
        self.offset = target;
        Ok(target as u64)
    }
}

impl Read for EncodedVideoBuffer<'_> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let chunk = self.read_next(out.len());
        out[..chunk.len()].copy_from_slice(chunk);
        Ok(chunk.len())
    }
}

impl Seek for EncodedVideoBuffer<'_> {
    fn seek(&mut self, position: SeekFrom) -> io::Result<u64> {
        self.seek_to(position)
    }
}

unsafe extern "C" fn read_packet(opaque: *mut c_void, buf: *mut u8, buf_size: c_int) -> c_int {
    // SAFETY: `opaque` is the boxed buffer owned by the `MemoryInput` that
    // also owns this AVIO context, and FFmpeg hands us `buf_size` writable
    // bytes at `buf`.
    unsafe {
        let buffer = &mut *opaque.cast::<EncodedVideoBuffer<'_>>();
        let chunk = buffer.read_next(usize::try_from(buf_size).unwrap_or(0));
        if chunk.is_empty() {
            return ffmpeg_sys_next::AVERROR_EOF;
        }
        ptr::copy_nonoverlapping(chunk.as_ptr(), buf, chunk.len());
        chunk.len() as c_int
    }
}

unsafe extern "C" fn seek_packet(opaque: *mut c_void, offset: i64, whence: c_int) -> i64 {
    // SAFETY: see `read_packet`.
    let buffer = unsafe { &mut *opaque.cast::<EncodedVideoBuffer<'_>>() };

    let whence = whence & !AVSEEK_FORCE;
    let position = match whence {
        AVSEEK_SIZE => return buffer.size() as i64,
        SEEK_SET => match u64::try_from(offset) {
            Ok(offset) => SeekFrom::Start(offset),
            Err(_) => return -1,
        },
        SEEK_CUR => SeekFrom::Current(offset),
        SEEK_END => SeekFrom::End(offset),
        _ => return -1,
    };

    match buffer.seek_to(position) {
        Ok(position) => position as i64,
        Err(_) => -1,
    }
}

/// Owns a custom AVIO context and its scratch buffer.
struct AvioHandle(*mut AVIOContext);

impl Drop for AvioHandle {
    fn drop(&mut self) {
        // SAFETY: the context was allocated by `avio_alloc_context` and is no
        // longer referenced by a format context (that is closed first).
        unsafe {
            if !self.0.is_null() {
                ffmpeg_sys_next::av_freep(ptr::addr_of_mut!((*self.0).buffer).cast());
                ffmpeg_sys_next::avio_context_free(&mut self.0);
            }
        }
    }
}

/// Owns the byte cursor FFmpeg reads through as an opaque pointer.
struct BufferHandle<'a>(*mut EncodedVideoBuffer<'a>);

impl<'a> BufferHandle<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self(Box::into_raw(Box::new(EncodedVideoBuffer::new(bytes))))
    }
}

impl Drop for BufferHandle<'_> {
    fn drop(&mut self) {
        // SAFETY: the pointer came from `Box::into_raw` and is freed once,
        // after the contexts that reference it.
        unsafe { drop(Box::from_raw(self.0)) };
    }
}

/// An FFmpeg demuxer reading from an [`EncodedVideoBuffer`].
///
/// Dereferences to [`Input`], so it can be used wherever the demuxer is
/// expected (stream lookup, packet reads). Fields drop in declaration order:
/// the format context closes before the AVIO context is freed, and the byte
/// cursor outlives both.
pub(crate) struct MemoryInput<'a> {
    input: Input,
    _avio: AvioHandle,
    _buffer: BufferHandle<'a>,
}

impl<'a> MemoryInput<'a> {
    /// Probe and open the container held in `bytes`.
    pub(crate) fn open(bytes: &'a [u8]) -> Result<Self, SampleError> {
        let buffer = BufferHandle::new(bytes);

        // SAFETY: every pointer below is checked for null before use, and
        // ownership is handed to RAII guards as soon as it exists. On
        // failure `avformat_open_input` frees the format context itself.
        unsafe {
            let io_buffer = ffmpeg_sys_next::av_malloc(IO_BUFFER_SIZE).cast::<u8>();
            if io_buffer.is_null() {
                return Err(SampleError::AllocationFailed {
                    bytes: IO_BUFFER_SIZE,
                });
            }

            let opaque = buffer.0;
            let avio = ffmpeg_sys_next::avio_alloc_context(
                io_buffer,
                IO_BUFFER_SIZE as c_int,
                0,
                opaque.cast(),
                Some(read_packet),
                None,
                Some(seek_packet),
            );
            if avio.is_null() {
                ffmpeg_sys_next::av_free(io_buffer.cast());
                return Err(SampleError::Open("Failed to allocate AVIO context".to_string()));
            }
            let avio = AvioHandle(avio);

            let mut format_context: *mut AVFormatContext = ffmpeg_sys_next::avformat_alloc_context();
            if format_context.is_null() {
                return Err(SampleError::Open(
                    "Failed to allocate format context".to_string(),
                ));
            }
            (*format_context).pb = avio.0;
            (*format_context).flags |= ffmpeg_sys_next::AVFMT_FLAG_CUSTOM_IO as c_int;

            let status = ffmpeg_sys_next::avformat_open_input(
                &mut format_context,
                c"".as_ptr(),
                ptr::null(),
                ptr::null_mut(),
            );
            if status < 0 {
                return Err(SampleError::Open(FfmpegError::from(status).to_string()));
            }

            let status =
                ffmpeg_sys_next::avformat_find_stream_info(format_context, ptr::null_mut());
            if status < 0 {
                ffmpeg_sys_next::avformat_close_input(&mut format_context);
                return Err(SampleError::Open(format!(
                    "Failed to read stream info: {}",
                    FfmpegError::from(status)
                )));
            }

            Ok(Self {
                input: Input::wrap(format_context),
                _avio: avio,
                _buffer: buffer,
            })
        }
    }
}

impl Deref for MemoryInput<'_> {
    type Target = Input;

    fn deref(&self) -> &Input {
        &self.input
    }
}

impl DerefMut for MemoryInput<'_> {
    fn deref_mut(&mut self) -> &mut Input {
        &mut self.input
    }
}
