//! Extraction options.
//!
//! [`RateLimitedOptions`] and [`IndexOptions`] are small builders for the two
//! extraction entry points. Defaults match the common data-loading setup:
//! 32 frames, capped at 25 fps, starting from a random point, at the source
//! resolution.
//!
//! # Example
//!
//! ```
//! use vidsample::RateLimitedOptions;
//!
//! let options = RateLimitedOptions::new()
//!     .with_resolution(224, 224)
//!     .with_frame_count(16)
//!     .with_fps_cap(15.0)
//!     .with_seed(42);
//! assert_eq!(options.frame_count(), 16);
//! ```

/// Default number of frames sampled by [`crate::sample_frames`].
pub const DEFAULT_FRAME_COUNT: usize = 32;

/// Default frame-rate cap for [`crate::sample_frames`].
pub const DEFAULT_FPS_CAP: f64 = 25.0;

/// Options for rate-limited extraction ([`crate::sample_frames`]).
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitedOptions {
    pub(crate) random_seek: bool,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) frame_count: usize,
    pub(crate) fps_cap: f64,
    pub(crate) seed: Option<u64>,
}

impl Default for RateLimitedOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimitedOptions {
    /// Options with default settings.
    pub fn new() -> Self {
        Self {
            random_seek: true,
            width: 0,
            height: 0,
            frame_count: DEFAULT_FRAME_COUNT,
            fps_cap: DEFAULT_FPS_CAP,
            seed: None,
        }
    }

    /// Start from a random position (default) or from the beginning.
    #[must_use]
    pub fn with_random_seek(mut self, random_seek: bool) -> Self {
        self.random_seek = random_seek;
        self
    }

    /// Output resolution. `0` for a dimension means "derive from the source";
    /// see [`resolve_dimensions`].
    #[must_use]
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Number of frames in the output tensor.
    #[must_use]
    pub fn with_frame_count(mut self, frame_count: usize) -> Self {
        self.frame_count = frame_count;
        self
    }

    /// Upper bound on the effective frame rate of the sampled frames.
    #[must_use]
    pub fn with_fps_cap(mut self, fps_cap: f64) -> Self {
        self.fps_cap = fps_cap;
        self
    }

    /// Seed the random seek so repeated calls pick the same start point.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Whether a random seek is requested.
    #[must_use]
    pub fn random_seek(&self) -> bool {
        self.random_seek
    }

    /// Requested `(width, height)`; zeros mean auto.
    #[must_use]
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of frames in the output tensor.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Frame-rate cap.
    #[must_use]
    pub fn fps_cap(&self) -> f64 {
        self.fps_cap
    }

    /// Seed for the random seek, if any.
    #[must_use]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

/// Options for explicit-index extraction ([`crate::sample_frame_indices`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexOptions {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) should_seek: bool,
}

impl IndexOptions {
    /// Options with default settings: source resolution, no seek.
    pub fn new() -> Self {
        Self::default()
    }

    /// Output resolution. `0` for a dimension means "derive from the source".
    #[must_use]
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Seek close to the first index instead of decoding from the start.
    ///
    /// Faster for indices deep into long videos, at the cost of relying on
    /// the average frame duration to locate frames.
    #[must_use]
    pub fn with_seek(mut self, should_seek: bool) -> Self {
        self.should_seek = should_seek;
        self
    }

    /// Requested `(width, height)`; zeros mean auto.
    #[must_use]
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Whether the first index is reached by seeking.
    #[must_use]
    pub fn should_seek(&self) -> bool {
        self.should_seek
    }
}

/// Resolve the output size from the requested and source sizes.
///
/// Both zero keeps the source size. One zero derives that dimension from the
/// other, preserving the source aspect ratio (never below 1). Both non-zero
/// are used as given.
#[must_use]
pub fn resolve_dimensions(
    width: u32,
    height: u32,
    source_width: u32,
    source_height: u32,
) -> (u32, u32) {
    match (width, height) {
        (0, 0) => (source_width, source_height),
        (w, 0) if source_width > 0 => {
            let ratio = f64::from(w) / f64::from(source_width);
            let h = (f64::from(source_height) * ratio).round() as u32;
            (w, h.max(1))
        }
        (0, h) if source_height > 0 => {
            let ratio = f64::from(h) / f64::from(source_height);
            let w = (f64::from(source_width) * ratio).round() as u32;
            (w.max(1), h)
        }
        (w, 0) => (w, source_height),
        (0, h) => (source_width, h),
        (w, h) => (w, h),
    }
}
