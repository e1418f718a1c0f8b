//! Similarity scoring between frames and indicators.
//!
//! Detectors only depend on the [`SimilarityMatcher`] trait: give it a frame
//! and an indicator, get back a score for every placement of the indicator.
//! [`ZnccMatcher`] is the default implementation.

use crate::candidate::nms::nms_2d;
use crate::candidate::topk::{Peak, TopK};
use crate::image::ImageView;
use crate::template::Template;
use crate::util::{SpeedScanError, SpeedScanResult};

pub(crate) mod scalar;

#[cfg(feature = "rayon")]
pub mod rayon;

pub use scalar::ZnccMatcher;

/// Produces a similarity surface for an indicator over a frame.
///
/// Implementations must be `Sync` so a detector set can score several
/// detectors against the same frame in parallel.
pub trait SimilarityMatcher: Sync {
    /// Scores every placement of `indicator` inside `frame`.
    ///
    /// Returns `IndicatorOutOfBounds` when the indicator is larger than the
    /// frame in either dimension.
    fn score_surface(
        &self,
        frame: ImageView<'_, u8>,
        indicator: &Template,
    ) -> SpeedScanResult<ScoreMap>;
}

impl<M: SimilarityMatcher + ?Sized> SimilarityMatcher for &M {
    fn score_surface(
        &self,
        frame: ImageView<'_, u8>,
        indicator: &Template,
    ) -> SpeedScanResult<ScoreMap> {
        (**self).score_surface(frame, indicator)
    }
}

/// Row-major similarity scores, one per indicator placement.
///
/// Cell `(x, y)` holds the score of the indicator with its top-left corner at
/// `(x, y)` in the frame.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreMap {
    width: usize,
    height: usize,
    scores: Vec<f32>,
}

impl ScoreMap {
    pub fn new(scores: Vec<f32>, width: usize, height: usize) -> SpeedScanResult<Self> {
        let needed = width
            .checked_mul(height)
            .filter(|&n| n > 0)
            .ok_or(SpeedScanError::InvalidDimensions { width, height })?;
        if scores.len() != needed {
            return Err(SpeedScanError::BufferTooSmall {
                needed,
                got: scores.len(),
            });
        }
        Ok(Self {
            width,
            height,
            scores,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.scores.get(y * self.width + x).copied()
    }

    /// True when at least one cell reaches `threshold`.
    pub fn any_at_least(&self, threshold: f32) -> bool {
        self.scores.iter().any(|&score| score >= threshold)
    }

    /// Best-scoring placement.
    pub fn best(&self) -> Option<Peak> {
        let mut topk = TopK::new(1);
        for (idx, &score) in self.scores.iter().enumerate() {
            topk.push(Peak {
                x: idx % self.width,
                y: idx / self.width,
                score,
            });
        }
        topk.into_sorted_desc().pop()
    }

    /// Distinct placements scoring at least `threshold`.
    ///
    /// Neighbouring cells within `nms_radius` of a stronger one are dropped
    /// and at most `max_peaks` are kept, strongest first.
    pub fn peaks_at_least(&self, threshold: f32, nms_radius: usize, max_peaks: usize) -> Vec<Peak> {
        let mut above: Vec<Peak> = self
            .scores
            .iter()
            .enumerate()
            .filter(|(_, score)| **score >= threshold)
            .map(|(idx, &score)| Peak {
                x: idx % self.width,
                y: idx / self.width,
                score,
            })
            .collect();
        if above.is_empty() {
            return above;
        }

        // Suppression already leaves the peaks strongest first.
        let mut kept = nms_2d(&mut above, nms_radius);
        kept.truncate(max_peaks);
        kept
    }
}
