//! CLI integration tests
//!
//! These tests run the spritecut binary against generated sheets and check
//! exit codes, printed output and written frames.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use image::{Rgba, RgbaImage};
use tempfile::TempDir;

fn spritecut(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_spritecut"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute spritecut")
}

/// 4×2 grid of 32×32 cells, each fully filled with its own color.
fn write_packed_sheet(dir: &Path) -> PathBuf {
    let sheet = RgbaImage::from_fn(128, 64, |x, y| {
        let cell = (y / 32) * 4 + x / 32;
        Rgba([(cell * 30) as u8, 120, 60, 255])
    });
    let path = dir.join("packed.png");
    sheet.save(&path).unwrap();
    path
}

/// Three 16×16 sprites on a magenta key, no alpha.
fn write_keyed_sheet(dir: &Path) -> PathBuf {
    let mut sheet = RgbaImage::from_pixel(96, 32, Rgba([255, 0, 255, 255]));
    for i in 0..3u32 {
        for y in 8..24 {
            for x in i * 32 + 8..i * 32 + 24 {
                sheet.put_pixel(x, y, Rgba([20, 160, 40, 255]));
            }
        }
    }
    let path = dir.join("keyed.png");
    sheet.save(&path).unwrap();
    path
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_slice_grid_writes_frames() {
    let temp = TempDir::new().unwrap();
    let sheet = write_packed_sheet(temp.path());
    let out = temp.path().join("frames");

    let output = spritecut(&[
        "slice",
        sheet.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
        "--width",
        "32",
        "--height",
        "32",
    ]);

    assert!(output.status.success(), "slice failed: {}", stderr(&output));
    assert!(stdout(&output).contains("Extracted 8 frames"));
    for i in 0..8 {
        assert!(out.join(format!("frame_{:03}.png", i)).exists());
    }
    let frame4 = image::open(out.join("frame_004.png")).unwrap().to_rgba8();
    assert_eq!(frame4.dimensions(), (32, 32));
    assert_eq!(*frame4.get_pixel(0, 0), Rgba([120, 120, 60, 255]));
}

#[test]
fn test_slice_auto() {
    let temp = TempDir::new().unwrap();
    let sheet = write_packed_sheet(temp.path());
    let out = temp.path().join("auto");

    let output = spritecut(&["slice", sheet.to_str().unwrap(), "-o", out.to_str().unwrap(), "--auto"]);

    assert!(output.status.success(), "slice --auto failed: {}", stderr(&output));
    assert!(out.join("frame_007.png").exists());
    assert!(!out.join("frame_008.png").exists());
}

#[test]
fn test_slice_ccl_removes_background() {
    let temp = TempDir::new().unwrap();
    let sheet = write_keyed_sheet(temp.path());
    let out = temp.path().join("ccl");

    let output = spritecut(&["slice", sheet.to_str().unwrap(), "-o", out.to_str().unwrap(), "--mode", "ccl"]);

    assert!(output.status.success(), "ccl slice failed: {}", stderr(&output));
    assert!(stderr(&output).contains("3/3 sprites extracted"));
    let frame = image::open(out.join("frame_000.png")).unwrap().to_rgba8();
    assert_eq!(frame.dimensions(), (16, 16));
}

#[test]
fn test_slice_grid_needs_size() {
    let temp = TempDir::new().unwrap();
    let sheet = write_packed_sheet(temp.path());

    let output = spritecut(&["slice", sheet.to_str().unwrap(), "-o", temp.path().to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("--width and --height"));
}

#[test]
fn test_slice_invalid_grid_is_processing_error() {
    let temp = TempDir::new().unwrap();
    let sheet = write_packed_sheet(temp.path());

    let output = spritecut(&[
        "slice",
        sheet.to_str().unwrap(),
        "-o",
        temp.path().join("bad").to_str().unwrap(),
        "--width",
        "32",
        "--height",
        "32",
        "--offset-x",
        "120",
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("exceeds sheet width"));
}

#[test]
fn test_slice_rejects_unknown_mode() {
    let temp = TempDir::new().unwrap();
    let sheet = write_packed_sheet(temp.path());

    let output = spritecut(&["slice", sheet.to_str().unwrap(), "-o", "x", "--mode", "auto"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_detect_json() {
    let temp = TempDir::new().unwrap();
    let sheet = write_packed_sheet(temp.path());

    let output = spritecut(&["detect", sheet.to_str().unwrap(), "--json"]);

    assert!(output.status.success(), "detect failed: {}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["config"]["width"], 32);
    assert_eq!(json["config"]["height"], 32);
    assert_eq!(json["extracted_frames"], 8);
}

#[test]
fn test_detect_single_method() {
    let temp = TempDir::new().unwrap();
    let sheet = write_packed_sheet(temp.path());

    let output = spritecut(&["detect", sheet.to_str().unwrap(), "--method", "frame-size"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("Detected frame size: 32×32"));
}

#[test]
fn test_detect_spacing_needs_frame_size() {
    let temp = TempDir::new().unwrap();
    let sheet = write_packed_sheet(temp.path());

    let output = spritecut(&["detect", sheet.to_str().unwrap(), "--method", "spacing"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_detect_failure_exit_code() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("odd.png");
    RgbaImage::new(100, 37).save(&path).unwrap();

    let output = spritecut(&["detect", path.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Frame size detection failed"));
}

#[test]
fn test_bounds_json() {
    let temp = TempDir::new().unwrap();
    let sheet = write_keyed_sheet(temp.path());

    let output = spritecut(&["bounds", sheet.to_str().unwrap(), "--json"]);

    assert!(output.status.success(), "bounds failed: {}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["bounds"].as_array().unwrap().len(), 3);
    assert_eq!(json["bounds"][0]["x"], 8);
    assert_eq!(json["background"]["rgb"], serde_json::json!([255, 0, 255]));
}

#[test]
fn test_missing_input() {
    let output = spritecut(&["bounds", "/nonexistent/sheet.png"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).starts_with("Error: Cannot open sprite sheet"));
}

#[test]
fn test_invalid_config_file() {
    let temp = TempDir::new().unwrap();
    let sheet = write_packed_sheet(temp.path());
    let config = temp.path().join("spritecut.toml");
    std::fs::write(&config, "[ccl]\nmerge_threshold = -1\n").unwrap();

    let output = spritecut(&["bounds", sheet.to_str().unwrap(), "--config", config.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("merge_threshold"));
}
