//! Frame source over a directory of extracted frame images.

use crate::frame::{Frame, FrameRate, FrameSource};
use crate::image::io::load_gray_image;
use crate::util::{SpeedScanError, SpeedScanResult};
use std::fs;
use std::path::{Path, PathBuf};

const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Reads frames from image files in file-name order.
///
/// Frames are expected to be zero-padded (`frame_000001.png`, ...) so that
/// lexical order is playback order. Color frames are converted to grayscale
/// as they are read.
pub struct ImageSequence {
    paths: std::vec::IntoIter<PathBuf>,
    rate: FrameRate,
    next_index: u64,
    total: u64,
    first: Option<PathBuf>,
}

impl ImageSequence {
    /// Lists the frames in `dir`; fails if it holds none.
    pub fn open<P: AsRef<Path>>(dir: P, rate: FrameRate) -> SpeedScanResult<Self> {
        let entries = fs::read_dir(dir.as_ref()).map_err(|err| SpeedScanError::ImageIo {
            reason: format!("{}: {err}", dir.as_ref().display()),
        })?;
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| SpeedScanError::ImageIo {
                reason: err.to_string(),
            })?;
            let path = entry.path();
            let is_frame = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if is_frame {
                paths.push(path);
            }
        }
        if paths.is_empty() {
            return Err(SpeedScanError::InvalidInput("frame directory holds no images"));
        }
        paths.sort();

        Ok(Self {
            total: paths.len() as u64,
            first: paths.first().cloned(),
            paths: paths.into_iter(),
            rate,
            next_index: 0,
        })
    }

    /// Numbers the first frame `index` instead of zero.
    pub fn starting_at(mut self, index: u64) -> Self {
        self.next_index = index;
        self
    }

    /// Width and height of the first frame, read from its header.
    pub fn dimensions(&self) -> SpeedScanResult<(usize, usize)> {
        let first = self
            .first
            .as_ref()
            .ok_or(SpeedScanError::InvalidInput("frame directory holds no images"))?;
        let (width, height) =
            image::image_dimensions(first).map_err(|err| SpeedScanError::ImageIo {
                reason: err.to_string(),
            })?;
        Ok((width as usize, height as usize))
    }
}

impl Iterator for ImageSequence {
    type Item = SpeedScanResult<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.paths.next()?;
        let index = self.next_index;
        self.next_index += 1;
        Some(load_gray_image(path).map(|image| Frame::new(index, image)))
    }
}

impl FrameSource for ImageSequence {
    fn frame_rate(&self) -> FrameRate {
        self.rate
    }

    fn frame_count(&self) -> Option<u64> {
        Some(self.total)
    }
}
