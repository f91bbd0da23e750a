//! Command-line integration tests for the `vidsample` binary.

use std::path::Path;
use std::process::Command;

fn vidsample() -> Command {
    Command::new(env!("CARGO_BIN_EXE_vidsample"))
}

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

#[test]
fn completions_mention_binary() {
    let output = vidsample().args(["completions", "bash"]).output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("vidsample"));
}

#[test]
fn probe_rejects_garbage() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let invalid = temporary_directory.path().join("invalid.mp4");
    std::fs::write(&invalid, b"this is not a media file").unwrap();

    let output = vidsample().arg("probe").arg(&invalid).output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("error"));
}

#[test]
fn sample_of_garbage_reports_blank_tensor() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let invalid = temporary_directory.path().join("invalid.mp4");
    std::fs::write(&invalid, b"this is not a media file").unwrap();

    let output = vidsample()
        .arg("sample")
        .arg(&invalid)
        .args(["--frames", "2", "--width", "4", "--height", "4", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["has_video"], false);
    assert_eq!(summary["bytes"], 2 * 4 * 4 * 3);
}

#[test]
fn unknown_log_level_is_rejected() {
    let output = vidsample()
        .args(["--log-level", "loud", "probe", "missing.mp4"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn sample_writes_tensor_and_pngs() {
    if !Path::new(SAMPLE_VIDEO).exists() {
        return;
    }

    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let tensor_path = temporary_directory.path().join("clip.rgb");
    let png_directory = temporary_directory.path().join("frames");

    let output = vidsample()
        .args(["sample", SAMPLE_VIDEO, "--frames", "4", "--width", "32", "--height", "24"])
        .args(["--no-random-seek", "--json", "--out"])
        .arg(&tensor_path)
        .arg("--png-dir")
        .arg(&png_directory)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["frame_count"], 4);
    assert_eq!(summary["has_video"], true);

    let tensor = std::fs::read(&tensor_path).unwrap();
    assert_eq!(tensor.len(), 4 * 32 * 24 * 3);

    let png_count = std::fs::read_dir(&png_directory).unwrap().count();
    assert_eq!(png_count, 4);
    let first = image::open(png_directory.join("frame_000000.png")).unwrap();
    assert_eq!(first.to_rgb8().as_raw().as_slice(), &tensor[..32 * 24 * 3]);
}

#[test]
fn existing_output_needs_overwrite() {
    if !Path::new(SAMPLE_VIDEO).exists() {
        return;
    }

    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let tensor_path = temporary_directory.path().join("picked.rgb");
    std::fs::write(&tensor_path, b"keep me").unwrap();

    let output = vidsample()
        .args(["indices", SAMPLE_VIDEO, "--frames", "0,1", "--width", "8", "--height", "8", "--out"])
        .arg(&tensor_path)
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert_eq!(std::fs::read(&tensor_path).unwrap(), b"keep me");

    let output = vidsample()
        .args(["indices", SAMPLE_VIDEO, "--frames", "0,1", "--width", "8", "--height", "8", "--out"])
        .arg(&tensor_path)
        .arg("--overwrite")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(std::fs::read(&tensor_path).unwrap().len(), 2 * 8 * 8 * 3);
}
