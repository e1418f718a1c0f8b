//! Per-marker detectors.
//!
//! A [`Detector`] owns one indicator image, a similarity threshold and a
//! [`DetectorState`] describing which transition it is waiting for. Every
//! frame it scores its indicator against the frame, turns the score surface
//! into a presence decision and advances its state. States only move forward;
//! once a state is settled the detector stops scoring frames altogether.
//!
//! Dependent appearances hold a [`DetectorId`] into the owning
//! [`DetectorSet`](crate::DetectorSet) rather than a reference, and are told
//! by the set whether that dependency has triggered.

use std::fmt;

use crate::frame::FrameRate;
use crate::image::{ImageView, OwnedImage};
use crate::kernel::SimilarityMatcher;
use crate::set::DetectorId;
use crate::summary::Timestamp;
use crate::template::Template;
use crate::trace::{trace_event, trace_warn};
use crate::util::{SpeedScanError, SpeedScanResult};

mod appearance;
mod disappearance;
mod instances;

pub use appearance::Appearance;
pub use disappearance::{FirstDisappearance, LastDisappearance};
pub use instances::{InstanceFrame, Instances, Location};

/// Similarity a frame must reach for the indicator to count as present.
pub const DEFAULT_THRESHOLD: f32 = 0.8;

/// Frame recorded at a detector transition.
#[derive(Clone, Debug, PartialEq)]
pub struct Capture {
    index: u64,
    image: OwnedImage,
}

impl Capture {
    pub(crate) fn new(index: u64, frame: ImageView<'_, u8>) -> Self {
        Self {
            index,
            image: OwnedImage::from_view(frame),
        }
    }

    /// Frame index of the transition.
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn image(&self) -> &OwnedImage {
        &self.image
    }

    /// Export file name, `<marker>_<index>.png`.
    pub fn file_name(&self, marker: &str) -> String {
        format!("{marker}_{}.png", self.index)
    }
}

/// Transition policy and progress of a detector.
#[derive(Clone, Debug)]
pub enum DetectorState {
    /// Triggers on the first frame containing the indicator.
    FirstAppearance(Appearance),
    /// Like `FirstAppearance`, but frames are ignored until the dependency
    /// has triggered.
    DependentAppearance {
        appearance: Appearance,
        dependency: DetectorId,
    },
    /// Triggers when the indicator leaves the screen for the first time.
    FirstDisappearance(FirstDisappearance),
    /// Tracks the latest time the indicator left the screen.
    LastDisappearance(LastDisappearance),
    /// Records every instance of the indicator on every frame.
    MultipleInstances(Instances),
}

impl DetectorState {
    /// Short policy name, matching the CLI configuration.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FirstAppearance(_) => "first_appearance",
            Self::DependentAppearance { .. } => "dependent_appearance",
            Self::FirstDisappearance(_) => "first_disappearance",
            Self::LastDisappearance(_) => "last_disappearance",
            Self::MultipleInstances(_) => "multiple_instances",
        }
    }

    fn is_settled(&self) -> bool {
        match self {
            Self::FirstAppearance(state) => state.is_settled(),
            Self::DependentAppearance { appearance, .. } => appearance.is_settled(),
            Self::FirstDisappearance(state) => state.is_settled(),
            Self::LastDisappearance(_) | Self::MultipleInstances(_) => false,
        }
    }
}

/// Stateful detector for one marker.
#[derive(Clone, Debug)]
pub struct Detector {
    name: String,
    indicator: Template,
    threshold: f32,
    state: DetectorState,
    failure: Option<SpeedScanError>,
}

impl Detector {
    fn new(
        name: String,
        indicator: Template,
        threshold: f32,
        state: DetectorState,
    ) -> SpeedScanResult<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(SpeedScanError::InvalidInput("threshold must lie in [0, 1]"));
        }
        if name.is_empty() {
            return Err(SpeedScanError::InvalidInput("detector name must not be empty"));
        }
        Ok(Self {
            name,
            indicator,
            threshold,
            state,
            failure: None,
        })
    }

    pub fn first_appearance(
        name: impl Into<String>,
        indicator: Template,
        threshold: f32,
    ) -> SpeedScanResult<Self> {
        let state = DetectorState::FirstAppearance(Appearance::default());
        Self::new(name.into(), indicator, threshold, state)
    }

    pub(crate) fn dependent_appearance(
        name: impl Into<String>,
        indicator: Template,
        threshold: f32,
        dependency: DetectorId,
    ) -> SpeedScanResult<Self> {
        let state = DetectorState::DependentAppearance {
            appearance: Appearance::default(),
            dependency,
        };
        Self::new(name.into(), indicator, threshold, state)
    }

    pub fn first_disappearance(
        name: impl Into<String>,
        indicator: Template,
        threshold: f32,
    ) -> SpeedScanResult<Self> {
        let state = DetectorState::FirstDisappearance(FirstDisappearance::default());
        Self::new(name.into(), indicator, threshold, state)
    }

    pub fn last_disappearance(
        name: impl Into<String>,
        indicator: Template,
        threshold: f32,
    ) -> SpeedScanResult<Self> {
        let state = DetectorState::LastDisappearance(LastDisappearance::default());
        Self::new(name.into(), indicator, threshold, state)
    }

    /// Reports up to `max_instances` locations per frame.
    ///
    /// `nms_radius` defaults to half the indicator's smaller side.
    pub fn multiple_instances(
        name: impl Into<String>,
        indicator: Template,
        threshold: f32,
        max_instances: usize,
        nms_radius: Option<usize>,
    ) -> SpeedScanResult<Self> {
        if max_instances == 0 {
            return Err(SpeedScanError::InvalidInput("max_instances must be at least 1"));
        }
        let radius =
            nms_radius.unwrap_or_else(|| indicator.width().min(indicator.height()) / 2);
        let state = DetectorState::MultipleInstances(Instances::new(max_instances, radius));
        Self::new(name.into(), indicator, threshold, state)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn indicator(&self) -> &Template {
        &self.indicator
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn state(&self) -> &DetectorState {
        &self.state
    }

    /// The detector this one waits for, if any.
    pub fn dependency(&self) -> Option<DetectorId> {
        match self.state {
            DetectorState::DependentAppearance { dependency, .. } => Some(dependency),
            _ => None,
        }
    }

    /// The frame error that disabled this detector, if any.
    pub fn failure(&self) -> Option<&SpeedScanError> {
        self.failure.as_ref()
    }

    /// True when no further frame can change this detector.
    pub fn is_settled(&self) -> bool {
        self.failure.is_some() || self.state.is_settled()
    }

    /// Whether the detector has reached its triggering state.
    ///
    /// For `LastDisappearance` this only means some disappearance has been
    /// seen; a later one may still replace it.
    pub fn triggered(&self) -> bool {
        self.trigger_index().is_some()
    }

    /// Frame index the detector's timestamp refers to.
    pub fn trigger_index(&self) -> Option<u64> {
        match &self.state {
            DetectorState::FirstAppearance(_)
            | DetectorState::DependentAppearance { .. }
            | DetectorState::MultipleInstances(_) => self.appeared_at(),
            DetectorState::FirstDisappearance(_) | DetectorState::LastDisappearance(_) => {
                self.disappeared_at()
            }
        }
    }

    /// Index of the first frame the indicator was found on.
    pub fn appeared_at(&self) -> Option<u64> {
        let capture = match &self.state {
            DetectorState::FirstAppearance(state) => state.appeared(),
            DetectorState::DependentAppearance { appearance, .. } => appearance.appeared(),
            DetectorState::FirstDisappearance(state) => state.appeared(),
            DetectorState::LastDisappearance(state) => state.appeared(),
            DetectorState::MultipleInstances(state) => state.first(),
        };
        capture.map(Capture::index)
    }

    /// Index of the recorded disappearance, for disappearance policies.
    pub fn disappeared_at(&self) -> Option<u64> {
        let capture = match &self.state {
            DetectorState::FirstDisappearance(state) => state.disappeared(),
            DetectorState::LastDisappearance(state) => state.disappeared(),
            _ => None,
        };
        capture.map(Capture::index)
    }

    /// Time of the trigger frame.
    ///
    /// Fails with `NotTriggered` if the detector never triggered and with
    /// `DetectorFailed` if it was disabled by a bad frame.
    pub fn timestamp(&self, rate: FrameRate) -> SpeedScanResult<Timestamp> {
        if self.failure.is_some() {
            return Err(SpeedScanError::DetectorFailed {
                name: self.name.clone(),
            });
        }
        self.trigger_index()
            .map(|index| rate.timestamp(index))
            .ok_or_else(|| SpeedScanError::NotTriggered {
                name: self.name.clone(),
            })
    }

    /// Frames recorded at transitions, in stream order.
    pub fn captures(&self) -> Vec<&Capture> {
        let captures = match &self.state {
            DetectorState::FirstAppearance(state) => [state.appeared(), None],
            DetectorState::DependentAppearance { appearance, .. } => [appearance.appeared(), None],
            DetectorState::FirstDisappearance(state) => [state.appeared(), state.disappeared()],
            DetectorState::LastDisappearance(state) => [state.appeared(), state.disappeared()],
            DetectorState::MultipleInstances(state) => [state.first(), None],
        };
        captures.into_iter().flatten().collect()
    }

    /// Scores one frame and advances the state.
    ///
    /// `dependency_triggered` is only consulted by dependent appearances,
    /// which ignore the frame while it is false. A frame the matcher cannot
    /// score (e.g. smaller than the indicator) disables this detector; it is
    /// never an error for the caller.
    pub fn process<M: SimilarityMatcher + ?Sized>(
        &mut self,
        frame: ImageView<'_, u8>,
        frame_index: u64,
        matcher: &M,
        dependency_triggered: bool,
    ) {
        if self.is_settled() {
            return;
        }
        if matches!(self.state, DetectorState::DependentAppearance { .. }) && !dependency_triggered
        {
            return;
        }

        let surface = match matcher.score_surface(frame, &self.indicator) {
            Ok(surface) => surface,
            Err(err) => {
                let reason = err.to_string();
                trace_warn!(
                    "detector_failed",
                    detector = self.name.as_str(),
                    frame_index = frame_index,
                    reason = reason.as_str(),
                );
                self.failure = Some(SpeedScanError::InvalidFrame {
                    name: self.name.clone(),
                    frame_index,
                    reason,
                });
                return;
            }
        };

        let threshold = self.threshold;
        let changed = match &mut self.state {
            DetectorState::FirstAppearance(state)
            | DetectorState::DependentAppearance {
                appearance: state, ..
            } => state.observe(surface.any_at_least(threshold), frame, frame_index),
            DetectorState::FirstDisappearance(state) => {
                state.observe(surface.any_at_least(threshold), frame, frame_index)
            }
            DetectorState::LastDisappearance(state) => {
                state.observe(surface.any_at_least(threshold), frame, frame_index)
            }
            DetectorState::MultipleInstances(state) => {
                let peaks =
                    surface.peaks_at_least(threshold, state.nms_radius(), state.max_instances());
                let size = (self.indicator.width(), self.indicator.height());
                state.observe(&peaks, size, frame, frame_index)
            }
        };

        if changed {
            trace_event!(
                "detector_transition",
                detector = self.name.as_str(),
                kind = self.state.kind(),
                frame_index = frame_index,
                triggered = self.triggered(),
            );
        }
    }
}

fn fmt_index(index: Option<u64>) -> String {
    match index {
        Some(index) => format!("#{index}"),
        None => "-".to_string(),
    }
}

impl fmt::Display for Detector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let appeared = fmt_index(self.appeared_at());
        let disappeared = fmt_index(self.disappeared_at());
        match &self.state {
            DetectorState::FirstAppearance(_) | DetectorState::DependentAppearance { .. } => {
                write!(f, "{}: appeared at {appeared}", self.name)?
            }
            DetectorState::FirstDisappearance(_) => write!(
                f,
                "{}: appeared at {appeared}, disappeared at {disappeared}",
                self.name
            )?,
            DetectorState::LastDisappearance(_) => write!(
                f,
                "{}: first appeared at {appeared}, last disappeared at {disappeared}",
                self.name
            )?,
            DetectorState::MultipleInstances(state) => write!(
                f,
                "{}: instances on {} frames, first at {appeared}",
                self.name,
                state.frames().len()
            )?,
        }
        if let Some(err) = &self.failure {
            write!(f, " (failed: {err})")?;
        }
        Ok(())
    }
}
