//! speedscan times speedruns from their video.
//!
//! Each known on-screen marker (a door, a title card, a reward flare) gets a
//! [`Detector`] that scores its indicator image against every grayscale frame
//! and records when the marker first appears or disappears. A
//! [`DetectorSet`] runs the detectors frame by frame, and [`RunSummary`]
//! turns the trigger frames of the start and end detectors into timestamps
//! and a real-time duration.
//!
//! ```no_run
//! use speedscan::{
//!     scan_frames, DetectorSet, FrameRate, MarkerPolicy, MemoryFrames, RunSummary, Template,
//! };
//!
//! # fn main() -> speedscan::SpeedScanResult<()> {
//! # let (door, flare, title) = (vec![0u8, 255], vec![0u8, 255], vec![0u8, 255]);
//! # let frames = Vec::new();
//! let mut set = DetectorSet::new();
//! set.add("door", Template::new(door, 2, 1)?, None, MarkerPolicy::FirstAppearance)?;
//! set.add(
//!     "start",
//!     Template::new(flare, 2, 1)?,
//!     None,
//!     MarkerPolicy::DependentAppearance { depends_on: "door".into() },
//! )?;
//! set.add("end", Template::new(title, 2, 1)?, Some(0.6), MarkerPolicy::LastDisappearance)?;
//!
//! let rate = FrameRate::new(30000, 1001)?;
//! scan_frames(MemoryFrames::new(frames, rate), &mut set)?;
//! println!("{}", RunSummary::from_set(&set, "start", "end", rate)?);
//! # Ok(())
//! # }
//! ```
//!
//! Parallel scoring is available with the `rayon` feature, image loading and
//! capture export with `image-io`, and structured logs with `tracing`.

mod candidate;
pub mod detector;
pub mod frame;
pub mod image;
pub mod kernel;
pub mod scan;
pub mod set;
pub mod summary;
pub mod template;
mod trace;
pub mod util;

pub use candidate::topk::Peak;
pub use detector::{Capture, Detector, DetectorState, DEFAULT_THRESHOLD};
pub use frame::{Frame, FrameRate, FrameSource, MemoryFrames};
pub use image::{ImageView, OwnedImage};
pub use kernel::{ScoreMap, SimilarityMatcher, ZnccMatcher};
pub use scan::{scan_frames, ScanReport};
pub use set::{DetectorId, DetectorSet, MarkerPolicy};
pub use summary::{RunSummary, Timestamp};
pub use template::Template;
pub use util::{SpeedScanError, SpeedScanResult};

#[cfg(feature = "image-io")]
pub use frame::ImageSequence;
#[cfg(feature = "image-io")]
pub use template::TemplateLibrary;
