//! Workspace round trips through the filesystem.

#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use vizor_io::{IoError, Workspace, load_image};
use vizor_pipeline::{FilterParameters, Flip, RgbImage};

fn write_gradient(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    RgbImage::from_fn(16, 8, |x, y| {
        image::Rgb([
            u8::try_from(x * 10).unwrap(),
            u8::try_from(y * 20).unwrap(),
            77,
        ])
    })
    .save(&path)
    .unwrap();
    path
}

#[test]
fn load_process_and_save_first() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_gradient(dir.path(), "first.png");
    let second = write_gradient(dir.path(), "second.bmp");
    let broken = dir.path().join("broken.jpg");
    std::fs::write(&broken, b"\xFF\xD8 truncated").unwrap();

    let mut ws = Workspace::new();
    let failures = ws.load(&[first.clone(), broken, second]);
    assert_eq!(failures.len(), 1);
    assert!(matches!(failures[0], IoError::Decode { .. }));
    assert_eq!(ws.len(), 2);
    assert_eq!(ws.source(1).unwrap().label, "second.bmp");

    ws.set_parameters(FilterParameters {
        invert: true,
        flip: Flip::Horizontal,
        ..FilterParameters::default()
    });

    let out = dir.path().join("out.png");
    ws.save_first(&out).unwrap();
    let saved = load_image(&out).unwrap().image;
    let original = load_image(&first).unwrap().image;
    assert_eq!(saved.dimensions(), (16, 8));
    // Flipped and inverted: saved (0, y) is the complement of original (15, y).
    let expected = original.get_pixel(15, 3).0.map(|v| 255 - v);
    assert_eq!(saved.get_pixel(0, 3).0, expected);
}

#[test]
fn reload_replaces_previous_set() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_gradient(dir.path(), "a.png");
    let b = write_gradient(dir.path(), "b.png");

    let mut ws = Workspace::new();
    assert!(ws.load(&[a, b.clone()]).is_empty());
    assert_eq!(ws.len(), 2);
    assert!(ws.load(&[b]).is_empty());
    assert_eq!(ws.len(), 1);
    assert_eq!(ws.source(0).unwrap().label, "b.png");
}
