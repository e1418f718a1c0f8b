//! Loading and writing grayscale images via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::OwnedImage;
use crate::util::{SpeedScanError, SpeedScanResult};
use std::path::Path;

/// Creates an owned image from a grayscale image buffer.
pub fn owned_from_gray_image(img: &image::GrayImage) -> SpeedScanResult<OwnedImage> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    OwnedImage::new(img.as_raw().clone(), width, height)
}

/// Converts a decoded frame of any color type to grayscale.
pub fn owned_from_dynamic_image(img: &image::DynamicImage) -> SpeedScanResult<OwnedImage> {
    owned_from_gray_image(&img.to_luma8())
}

/// Loads an image from disk and converts it to grayscale.
pub fn load_gray_image<P: AsRef<Path>>(path: P) -> SpeedScanResult<OwnedImage> {
    let img = image::open(path).map_err(|err| SpeedScanError::ImageIo {
        reason: err.to_string(),
    })?;
    owned_from_dynamic_image(&img)
}

/// Writes a grayscale image; the format follows the path's extension.
pub fn save_gray_image<P: AsRef<Path>>(img: &OwnedImage, path: P) -> SpeedScanResult<()> {
    let buffer = image::GrayImage::from_raw(
        img.width() as u32,
        img.height() as u32,
        img.data().to_vec(),
    )
    .ok_or(SpeedScanError::BufferTooSmall {
        needed: img.width() * img.height(),
        got: img.data().len(),
    })?;
    buffer.save(path).map_err(|err| SpeedScanError::ImageIo {
        reason: err.to_string(),
    })
}
