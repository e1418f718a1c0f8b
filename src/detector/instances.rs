//! Every simultaneous instance of an indicator, frame by frame.

use crate::candidate::topk::Peak;
use crate::detector::Capture;
use crate::image::ImageView;

/// Bounding box of one indicator instance in frame coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Location {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
    pub score: f32,
}

/// Instances found on one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct InstanceFrame {
    pub index: u64,
    pub locations: Vec<Location>,
}

/// Collects instance locations for every frame that has at least one.
///
/// The history is unbounded; its length is the number of frames with a hit.
#[derive(Clone, Debug)]
pub struct Instances {
    max_instances: usize,
    nms_radius: usize,
    frames: Vec<InstanceFrame>,
    first: Option<Capture>,
}

impl Instances {
    pub(crate) fn new(max_instances: usize, nms_radius: usize) -> Self {
        Self {
            max_instances,
            nms_radius,
            frames: Vec::new(),
            first: None,
        }
    }

    pub(crate) fn observe(
        &mut self,
        peaks: &[Peak],
        indicator_size: (usize, usize),
        frame: ImageView<'_, u8>,
        index: u64,
    ) -> bool {
        if peaks.is_empty() {
            return false;
        }
        let (width, height) = indicator_size;
        let locations = peaks
            .iter()
            .map(|peak| Location {
                x: peak.x,
                y: peak.y,
                width,
                height,
                score: peak.score,
            })
            .collect();
        if self.first.is_none() {
            self.first = Some(Capture::new(index, frame));
        }
        self.frames.push(InstanceFrame { index, locations });
        true
    }

    pub fn max_instances(&self) -> usize {
        self.max_instances
    }

    /// Suppression radius between reported instances, in pixels.
    pub fn nms_radius(&self) -> usize {
        self.nms_radius
    }

    /// Frames with at least one instance, in stream order.
    ///
    /// Nothing is dropped: a marker that stays on screen adds one entry per
    /// frame for the whole scan.
    pub fn frames(&self) -> &[InstanceFrame] {
        &self.frames
    }

    /// The first frame with an instance.
    pub fn first(&self) -> Option<&Capture> {
        self.first.as_ref()
    }
}
