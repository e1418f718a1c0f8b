//! Error types for speedscan.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias for speedscan operations.
pub type SpeedScanResult<T> = std::result::Result<T, SpeedScanError>;

/// Errors that can occur while building detectors, scanning frames or
/// summarizing a run.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SpeedScanError {
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Image dimensions are zero or overflow.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Stride is smaller than the row width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// The backing buffer cannot hold the described image.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// The indicator does not fit inside the frame.
    #[error("indicator {tpl_width}x{tpl_height} does not fit frame {img_width}x{img_height}")]
    IndicatorOutOfBounds {
        tpl_width: usize,
        tpl_height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// The indicator image cannot be normalized.
    #[error("degenerate template: {reason}")]
    DegenerateTemplate { reason: &'static str },
    /// An image could not be decoded or encoded.
    #[error("image i/o failed: {reason}")]
    ImageIo { reason: String },
    /// A template image required by the configuration does not exist.
    #[error("missing template image {}", path.display())]
    MissingTemplate { path: PathBuf },
    /// Frame rate numerator or denominator is zero.
    #[error("invalid frame rate {num}/{den}")]
    InvalidFrameRate { num: u32, den: u32 },
    /// A detector with the same name is already registered.
    #[error("detector `{name}` is already registered")]
    DuplicateDetector { name: String },
    /// A dependent detector references a detector that is not yet registered.
    #[error("detector `{name}` depends on unknown detector `{depends_on}`")]
    UnknownDependency { name: String, depends_on: String },
    /// No detector is registered under this name.
    #[error("unknown detector `{name}`")]
    UnknownDetector { name: String },
    /// Frame indices must strictly increase.
    #[error("frame index {got} does not follow {previous}")]
    FrameOrder { previous: u64, got: u64 },
    /// The frame cannot be scored against a detector's indicator.
    #[error("detector `{name}` rejected frame {frame_index}: {reason}")]
    InvalidFrame {
        name: String,
        frame_index: u64,
        reason: String,
    },
    /// The detector never reached its triggering state.
    #[error("detector `{name}` never triggered")]
    NotTriggered { name: String },
    /// The detector was disabled after rejecting a frame.
    #[error("detector `{name}` failed earlier in the scan")]
    DetectorFailed { name: String },
    /// The end marker was observed before the start marker.
    #[error("run ends at frame {end} before it starts at frame {start}")]
    EndBeforeStart { start: u64, end: u64 },
}
