//! Batch extraction on the rayon thread pool.
//!
//! Every video gets its own demuxer and decoder on the worker that picks it
//! up, so there is no shared mutable state between extractions.

use ::rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};

use crate::error::SampleError;
use crate::extract::{SampledFrames, sample_frames};
use crate::options::RateLimitedOptions;

/// Run [`sample_frames`](crate::sample_frames) over many encoded videos in
/// parallel. Results come back in input order, one per video.
///
/// When `options` carries a seed, video `i` is sampled with seed
/// `seed + i` so the batch is reproducible without every clip starting at the
/// same relative offset.
///
/// # Example
///
/// ```no_run
/// use vidsample::RateLimitedOptions;
///
/// let videos: Vec<Vec<u8>> = ["a.mp4", "b.mp4"]
///     .iter()
///     .map(std::fs::read)
///     .collect::<Result<_, _>>()?;
/// let batch = vidsample::sample_frames_parallel(&videos, &RateLimitedOptions::new().with_seed(7));
/// assert_eq!(batch.len(), 2);
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn sample_frames_parallel<B>(
    videos: &[B],
    options: &RateLimitedOptions,
) -> Vec<Result<SampledFrames, SampleError>>
where
    B: AsRef<[u8]> + Sync,
{
    log::debug!("Sampling {} videos on the rayon pool", videos.len());
    videos
        .par_iter()
        .enumerate()
        .map(|(position, video)| {
            let options = match options.seed() {
                Some(seed) => options.clone().with_seed(seed.wrapping_add(position as u64)),
                None => options.clone(),
            };
            sample_frames(video.as_ref(), &options)
        })
        .collect()
}
