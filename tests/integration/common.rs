//! Shared fixtures for integration tests.

#![allow(dead_code)]

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};
use pixel_mage::classifier::{ContentDigest, DigestAlgorithm};
use pixel_mage::config::{Config, Settings};
use std::fs;
use std::path::{Path, PathBuf};

/// Size large images are padded to, safely above the small-file threshold.
pub const LARGE_FILE_LEN: usize = 40_000;

/// A grayscale PNG with the given dimensions.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let pixels = vec![0u8; (width * height) as usize];
    let mut out = Vec::new();
    PngEncoder::new_with_quality(&mut out, CompressionType::Fast, FilterType::NoFilter)
        .write_image(&pixels, width, height, ExtendedColorType::L8)
        .unwrap();
    out
}

/// Write a PNG padded with trailing zeros to `LARGE_FILE_LEN` bytes.
pub fn write_large_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let mut bytes = png_bytes(width, height);
    if bytes.len() < LARGE_FILE_LEN {
        bytes.resize(LARGE_FILE_LEN, 0);
    }
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    path
}

/// Write a small file and return its md5 digest.
pub fn write_small_file(dir: &Path, name: &str, content: &[u8]) -> String {
    fs::write(dir.join(name), content).unwrap();
    DigestAlgorithm::Md5.digest(content)
}

/// Settings targeting `dir` with console output switched off.
pub fn settings_for(dir: &Path) -> Settings {
    Settings {
        target: dir.to_path_buf(),
        display_log: false,
        display_errors: false,
        ..Settings::default()
    }
}

/// Validated config targeting `dir`.
pub fn config_for(dir: &Path) -> Config {
    Config::from_settings(settings_for(dir)).unwrap()
}

/// Default cache file location for `dir`.
pub fn cache_path(dir: &Path) -> PathBuf {
    dir.join(".pixel_mage").join(".cache.json")
}

/// Parsed cache file.
pub fn read_cache(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

/// Files in the app folder whose name starts with `prefix`.
pub fn app_files(dir: &Path, prefix: &str) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir.join(".pixel_mage")) else {
        return Vec::new();
    };
    entries
        .map(|e| e.unwrap().path())
        .filter(|p| {
            p.file_name()
                .is_some_and(|n| n.to_string_lossy().starts_with(prefix))
        })
        .collect()
}
