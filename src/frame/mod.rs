//! Frame streams fed to a detector set.
//!
//! A [`FrameSource`] is a single-pass iterator of grayscale frames with
//! strictly increasing indices, plus the rational frame rate needed to turn
//! those indices into timestamps. Decoding video is left to the caller; the
//! crate ships an in-memory source and, with `image-io`, a source reading a
//! directory of extracted frames.

use crate::image::OwnedImage;
use crate::summary::Timestamp;
use crate::util::{SpeedScanError, SpeedScanResult};

#[cfg(feature = "image-io")]
mod sequence;

#[cfg(feature = "image-io")]
pub use sequence::ImageSequence;

/// Rational frame rate in frames per second, e.g. `30000/1001`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameRate {
    num: u32,
    den: u32,
}

impl FrameRate {
    pub fn new(num: u32, den: u32) -> SpeedScanResult<Self> {
        if num == 0 || den == 0 {
            return Err(SpeedScanError::InvalidFrameRate { num, den });
        }
        Ok(Self { num, den })
    }

    /// Whole frames per second.
    pub fn from_fps(fps: u32) -> SpeedScanResult<Self> {
        Self::new(fps, 1)
    }

    pub fn num(&self) -> u32 {
        self.num
    }

    pub fn den(&self) -> u32 {
        self.den
    }

    pub fn as_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /// Time at which frame `index` is shown.
    pub fn timestamp(&self, index: u64) -> Timestamp {
        // Multiply before dividing so integer rates stay exact.
        Timestamp::from_seconds(index as f64 * self.den as f64 / self.num as f64)
    }
}

/// Decoded grayscale frame and its position in the stream.
#[derive(Clone, Debug)]
pub struct Frame {
    index: u64,
    image: OwnedImage,
}

impl Frame {
    pub fn new(index: u64, image: OwnedImage) -> Self {
        Self { index, image }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn image(&self) -> &OwnedImage {
        &self.image
    }
}

/// Sequential, non-seekable stream of frames.
pub trait FrameSource: Iterator<Item = SpeedScanResult<Frame>> {
    fn frame_rate(&self) -> FrameRate;

    /// Number of frames the source will yield, when known up front.
    fn frame_count(&self) -> Option<u64> {
        None
    }
}

/// Frames held in memory, indexed consecutively from a starting index.
pub struct MemoryFrames {
    frames: std::vec::IntoIter<OwnedImage>,
    rate: FrameRate,
    next_index: u64,
    total: u64,
}

impl MemoryFrames {
    pub fn new(frames: Vec<OwnedImage>, rate: FrameRate) -> Self {
        let total = frames.len() as u64;
        Self {
            frames: frames.into_iter(),
            rate,
            next_index: 0,
            total,
        }
    }

    /// Numbers the first frame `index` instead of zero.
    pub fn starting_at(mut self, index: u64) -> Self {
        self.next_index = index;
        self
    }
}

impl Iterator for MemoryFrames {
    type Item = SpeedScanResult<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        let image = self.frames.next()?;
        let index = self.next_index;
        self.next_index += 1;
        Some(Ok(Frame::new(index, image)))
    }
}

impl FrameSource for MemoryFrames {
    fn frame_rate(&self) -> FrameRate {
        self.rate
    }

    fn frame_count(&self) -> Option<u64> {
        Some(self.total)
    }
}
