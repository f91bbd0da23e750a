//! Explicit-index sampling against a synthetic frame source.

mod common;

use common::{FRAME_SIZE, SyntheticSource, frame_ids};
use rand::SeedableRng;
use rand::rngs::StdRng;
use vidsample::{SampleError, SampleReport, SampleRequest, sample};

fn pick(
    source: &mut SyntheticSource,
    indices: &[u64],
    seek_first: bool,
) -> Result<(Vec<u8>, SampleReport), SampleError> {
    let mut tensor = vec![0u8; indices.len() * FRAME_SIZE];
    let request = SampleRequest::ExplicitIndices {
        frame_indices: indices.to_vec(),
        seek_first,
    };
    let report = sample(source, &request, &mut tensor, &mut StdRng::seed_from_u64(0))?;
    Ok((tensor, report))
}

// ── linear walk ────────────────────────────────────────────────────

#[test]
fn all_indices_match_linear_decode() {
    let mut source = SyntheticSource::new(20, 25);
    let indices: Vec<u64> = (0..20).collect();
    let (tensor, report) = pick(&mut source, &indices, false).unwrap();

    assert_eq!(frame_ids(&tensor), indices);
    assert_eq!(report.frames_written, 20);
    assert_eq!(report.frames_decoded, 20);
}

#[test]
fn sparse_indices_with_repeats() {
    let mut source = SyntheticSource::new(50, 25);
    let (tensor, report) = pick(&mut source, &[3, 7, 7, 12], false).unwrap();

    assert_eq!(frame_ids(&tensor), vec![3, 7, 7, 12]);
    assert_eq!(report.frames_written, 4);
    assert_eq!(report.frames_filled, 0);
    assert_eq!(report.frames_decoded, 13);
}

#[test]
fn leading_repeats_of_frame_zero() {
    let mut source = SyntheticSource::new(10, 25);
    let (tensor, _) = pick(&mut source, &[0, 0, 0, 1], false).unwrap();
    assert_eq!(frame_ids(&tensor), vec![0, 0, 0, 1]);
}

#[test]
fn missing_pts_still_counts_as_a_frame() {
    let mut source = SyntheticSource::new(10, 25).without_pts_at(3);
    let indices: Vec<u64> = (0..6).collect();
    let (tensor, _) = pick(&mut source, &indices, false).unwrap();
    assert_eq!(frame_ids(&tensor), indices);
}

#[test]
fn empty_index_list_is_a_no_op() {
    let mut source = SyntheticSource::new(10, 25);
    let (tensor, report) = pick(&mut source, &[], true).unwrap();

    assert!(tensor.is_empty());
    assert_eq!(report.frames_decoded, 0);
    assert!(source.seeks.is_empty());
}

// ── shortfall ──────────────────────────────────────────────────────

#[test]
fn index_past_frame_count_stops_and_tiles() {
    let mut source = SyntheticSource::new(10, 25);
    let (tensor, report) = pick(&mut source, &[2, 5, 15, 20], false).unwrap();

    assert_eq!(frame_ids(&tensor), vec![2, 5, 2, 5]);
    assert_eq!(report.frames_written, 2);
    assert_eq!(report.frames_filled, 2);
}

#[test]
fn stream_shorter_than_reported_is_tiled() {
    let mut source = SyntheticSource::new(10, 25).with_reported_frame_count(1000);
    let (tensor, report) = pick(&mut source, &[5, 50], false).unwrap();

    assert_eq!(frame_ids(&tensor), vec![5, 5]);
    assert_eq!(report.frames_written, 1);
}

#[test]
fn unknown_frame_count_walks_without_a_cutoff() {
    for seek_first in [false, true] {
        let mut source = SyntheticSource::new(100, 25).with_reported_frame_count(0);
        let (tensor, report) = pick(&mut source, &[5, 10, 10, 99], seek_first).unwrap();

        assert_eq!(frame_ids(&tensor), vec![5, 10, 10, 99]);
        assert_eq!(report.frames_written, 4);
        assert_eq!(report.frames_decoded, 100);
        assert!(source.seeks.is_empty());
    }
}

#[test]
fn unknown_frame_count_still_tiles_at_end_of_stream() {
    let mut source = SyntheticSource::new(10, 25).with_reported_frame_count(0);
    let (tensor, report) = pick(&mut source, &[3, 40, 50], false).unwrap();

    assert_eq!(frame_ids(&tensor), vec![3, 3, 3]);
    assert_eq!(report.frames_written, 1);
    assert_eq!(report.frames_filled, 2);
}

// ── seeking ────────────────────────────────────────────────────────

#[test]
fn seek_lands_on_keyframe_then_walks_forward() {
    let mut source = SyntheticSource::new(100, 25).with_keyframe_interval(10);
    let (tensor, report) = pick(&mut source, &[45, 46, 60], true).unwrap();

    assert_eq!(source.seeks, vec![45 * 3600]);
    assert_eq!(frame_ids(&tensor), vec![45, 46, 60]);
    // Decoding restarted at frame 40 instead of 0.
    assert_eq!(report.frames_decoded, 21);
}

#[test]
fn exact_seek_keeps_first_frame_directly() {
    let mut source = SyntheticSource::new(100, 25);
    let (tensor, report) = pick(&mut source, &[30, 31], true).unwrap();

    assert_eq!(frame_ids(&tensor), vec![30, 31]);
    assert_eq!(report.frames_decoded, 2);
}

#[test]
fn duplicate_frame_after_seek_does_not_advance_counter() {
    let mut source = SyntheticSource::new(100, 25)
        .with_keyframe_interval(10)
        .with_duplicate_after_seek();
    let (tensor, _) = pick(&mut source, &[45, 47], true).unwrap();
    assert_eq!(frame_ids(&tensor), vec![45, 47]);

    let mut source = SyntheticSource::new(100, 25).with_duplicate_after_seek();
    let (tensor, _) = pick(&mut source, &[30, 31], true).unwrap();
    assert_eq!(frame_ids(&tensor), vec![30, 31]);
}

#[test]
fn seek_accounts_for_start_time() {
    let mut source = SyntheticSource::new(100, 25)
        .with_start_time(9000)
        .with_keyframe_interval(4);
    let (tensor, _) = pick(&mut source, &[45, 90], true).unwrap();

    assert_eq!(source.seeks, vec![9000 + 45 * 3600]);
    assert_eq!(frame_ids(&tensor), vec![45, 90]);
}

#[test]
fn seeking_and_walking_agree() {
    let indices = [17, 18, 18, 33, 64, 99];
    let mut walked = SyntheticSource::new(100, 25);
    let mut seeked = SyntheticSource::new(100, 25).with_keyframe_interval(12);

    let (linear, _) = pick(&mut walked, &indices, false).unwrap();
    let (jumped, _) = pick(&mut seeked, &indices, true).unwrap();
    assert_eq!(linear, jumped);
}

// ── contract violations ────────────────────────────────────────────

#[test]
fn seek_landing_after_target_is_an_invariant_violation() {
    let mut source = SyntheticSource::new(100, 25).with_seek_overshoot(3);
    let error = pick(&mut source, &[20, 21], true).unwrap_err();

    assert!(error.is_invariant_violation(), "{error}");
    assert!(error.to_string().contains("landed on frame 23"));
}

#[test]
fn missing_pts_after_seek_is_an_invariant_violation() {
    let mut source = SyntheticSource::new(100, 25)
        .with_keyframe_interval(10)
        .without_pts_at(40);
    let error = pick(&mut source, &[45], true).unwrap_err();
    assert!(matches!(error, SampleError::InvariantViolation(_)));
}

#[test]
fn extreme_start_time_is_reported_not_overflowed() {
    let mut source = SyntheticSource::new(100, 25).with_reported_start_time(i64::MIN);
    let error = pick(&mut source, &[5], true).unwrap_err();

    assert!(error.is_invariant_violation(), "{error}");
    assert_eq!(source.seeks, vec![i64::MIN + 5 * 3600]);
}

#[test]
fn decreasing_indices_are_rejected() {
    let mut source = SyntheticSource::new(10, 25);
    let error = pick(&mut source, &[4, 2], false).unwrap_err();

    assert!(matches!(error, SampleError::InvalidArgument(_)));
    assert_eq!(source.decoded, 0);
}
