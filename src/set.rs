//! Ordered collection of detectors driven one frame at a time.
//!
//! Each frame is processed in two phases. Detectors without a dependency go
//! first (fanned out over rayon when the set is parallel), then dependent
//! detectors run in insertion order. A dependency is always inserted before
//! its dependents, so when a dependent runs, its dependency has already
//! settled the current frame; a marker and the marker it waits for may
//! therefore trigger on the same frame.

use crate::detector::{Capture, Detector, DEFAULT_THRESHOLD};
use crate::frame::FrameRate;
use crate::image::ImageView;
use crate::kernel::{SimilarityMatcher, ZnccMatcher};
use crate::summary::Timestamp;
use crate::template::Template;
use crate::util::{SpeedScanError, SpeedScanResult};

/// Position of a detector inside its [`DetectorSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DetectorId(usize);

impl DetectorId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// How a new detector decides that it has triggered.
#[derive(Clone, Debug, PartialEq)]
pub enum MarkerPolicy {
    FirstAppearance,
    /// First appearance once the named detector has triggered.
    DependentAppearance { depends_on: String },
    FirstDisappearance,
    LastDisappearance,
    /// Every instance on every frame. One entry is kept per frame with a
    /// hit, so memory grows with the number of such frames.
    MultipleInstances {
        max_instances: usize,
        nms_radius: Option<usize>,
    },
}

/// Insertion-ordered `name -> Detector` mapping sharing one matcher.
pub struct DetectorSet<M = ZnccMatcher> {
    matcher: M,
    detectors: Vec<Detector>,
    parallel: bool,
    last_index: Option<u64>,
    frames_processed: u64,
}

impl DetectorSet<ZnccMatcher> {
    /// Empty set scoring with the default ZNCC matcher.
    pub fn new() -> Self {
        Self::with_matcher(ZnccMatcher::default())
    }
}

impl Default for DetectorSet<ZnccMatcher> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: SimilarityMatcher> DetectorSet<M> {
    pub fn with_matcher(matcher: M) -> Self {
        Self {
            matcher,
            detectors: Vec::new(),
            parallel: false,
            last_index: None,
            frames_processed: 0,
        }
    }

    /// Processes independent detectors concurrently. Ignored without the
    /// `rayon` feature.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Builds and registers a detector.
    ///
    /// `threshold` defaults to [`DEFAULT_THRESHOLD`]. A dependent appearance
    /// must name a detector that is already registered.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        indicator: Template,
        threshold: Option<f32>,
        policy: MarkerPolicy,
    ) -> SpeedScanResult<DetectorId> {
        let name = name.into();
        let threshold = threshold.unwrap_or(DEFAULT_THRESHOLD);
        let detector = match policy {
            MarkerPolicy::FirstAppearance => Detector::first_appearance(name, indicator, threshold)?,
            MarkerPolicy::DependentAppearance { depends_on } => {
                let dependency =
                    self.id_of(&depends_on)
                        .ok_or_else(|| SpeedScanError::UnknownDependency {
                            name: name.clone(),
                            depends_on,
                        })?;
                Detector::dependent_appearance(name, indicator, threshold, dependency)?
            }
            MarkerPolicy::FirstDisappearance => {
                Detector::first_disappearance(name, indicator, threshold)?
            }
            MarkerPolicy::LastDisappearance => {
                Detector::last_disappearance(name, indicator, threshold)?
            }
            MarkerPolicy::MultipleInstances {
                max_instances,
                nms_radius,
            } => Detector::multiple_instances(name, indicator, threshold, max_instances, nms_radius)?,
        };
        self.insert(detector)
    }

    /// Registers an already built detector.
    pub fn insert(&mut self, detector: Detector) -> SpeedScanResult<DetectorId> {
        if self.id_of(detector.name()).is_some() {
            return Err(SpeedScanError::DuplicateDetector {
                name: detector.name().to_string(),
            });
        }
        let id = DetectorId(self.detectors.len());
        if let Some(dependency) = detector.dependency() {
            if dependency >= id {
                return Err(SpeedScanError::UnknownDependency {
                    name: detector.name().to_string(),
                    depends_on: format!("#{}", dependency.index()),
                });
            }
        }
        self.detectors.push(detector);
        Ok(id)
    }

    pub fn id_of(&self, name: &str) -> Option<DetectorId> {
        self.detectors
            .iter()
            .position(|detector| detector.name() == name)
            .map(DetectorId)
    }

    pub fn get(&self, name: &str) -> Option<&Detector> {
        self.detectors.iter().find(|detector| detector.name() == name)
    }

    /// Detectors in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Detector> {
        self.detectors.iter()
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Index of the last frame accepted by [`process_frame`](Self::process_frame).
    pub fn last_frame_index(&self) -> Option<u64> {
        self.last_index
    }

    /// Runs every detector over one frame.
    ///
    /// Fails only when `frame_index` does not follow the previous frame;
    /// per-detector frame errors disable that detector and are reported
    /// through [`Detector::failure`].
    pub fn process_frame(&mut self, frame: ImageView<'_, u8>, frame_index: u64) -> SpeedScanResult<()> {
        if let Some(previous) = self.last_index {
            if frame_index <= previous {
                return Err(SpeedScanError::FrameOrder {
                    previous,
                    got: frame_index,
                });
            }
        }
        self.last_index = Some(frame_index);
        self.frames_processed += 1;

        self.process_independent(frame, frame_index);

        for idx in 0..self.detectors.len() {
            let Some(dependency) = self.detectors[idx].dependency() else {
                continue;
            };
            let ready = self.detectors[dependency.0].triggered();
            self.detectors[idx].process(frame, frame_index, &self.matcher, ready);
        }
        Ok(())
    }

    fn process_independent(&mut self, frame: ImageView<'_, u8>, frame_index: u64) {
        let matcher = &self.matcher;

        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            if self.parallel {
                self.detectors
                    .par_iter_mut()
                    .filter(|detector| detector.dependency().is_none())
                    .for_each(|detector| detector.process(frame, frame_index, matcher, false));
                return;
            }
        }

        for detector in self
            .detectors
            .iter_mut()
            .filter(|detector| detector.dependency().is_none())
        {
            detector.process(frame, frame_index, matcher, false);
        }
    }

    /// Timestamp of the named detector's trigger.
    pub fn timestamp(&self, name: &str, rate: FrameRate) -> SpeedScanResult<Timestamp> {
        self.get(name)
            .ok_or_else(|| SpeedScanError::UnknownDetector {
                name: name.to_string(),
            })?
            .timestamp(rate)
    }

    /// All recorded transition frames as `(detector name, capture)`.
    pub fn captures(&self) -> Vec<(&str, &Capture)> {
        self.detectors
            .iter()
            .flat_map(|detector| {
                detector
                    .captures()
                    .into_iter()
                    .map(move |capture| (detector.name(), capture))
            })
            .collect()
    }

    /// Writes every capture to `dir` as `<name>_<index>.png`.
    #[cfg(feature = "image-io")]
    pub fn export_captures<P: AsRef<std::path::Path>>(
        &self,
        dir: P,
    ) -> SpeedScanResult<Vec<std::path::PathBuf>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|err| SpeedScanError::ImageIo {
            reason: format!("{}: {err}", dir.display()),
        })?;
        let mut written = Vec::new();
        for (name, capture) in self.captures() {
            let path = dir.join(capture.file_name(name));
            crate::image::io::save_gray_image(capture.image(), &path)?;
            crate::trace::trace_event!(
                "capture_written",
                detector = name,
                frame_index = capture.index(),
            );
            written.push(path);
        }
        Ok(written)
    }
}
