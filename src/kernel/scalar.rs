//! Scalar ZNCC surface, the reference similarity matcher.

use crate::image::ImageView;
use crate::kernel::{ScoreMap, SimilarityMatcher};
use crate::template::{Template, TemplatePlan};
use crate::util::{SpeedScanError, SpeedScanResult};

/// Zero-mean normalized cross-correlation matcher.
///
/// Scores lie in `[-1, 1]` and equal OpenCV's `TM_CCOEFF_NORMED`. Placements
/// whose frame window has variance at or below `min_var_i` (flat regions)
/// score `0.0`.
#[derive(Clone, Copy, Debug)]
pub struct ZnccMatcher {
    min_var_i: f32,
    parallel: bool,
}

impl Default for ZnccMatcher {
    fn default() -> Self {
        Self {
            min_var_i: 1e-6,
            parallel: false,
        }
    }
}

impl ZnccMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the window variance below which a placement scores zero.
    pub fn with_min_var_i(mut self, min_var_i: f32) -> Self {
        self.min_var_i = min_var_i;
        self
    }

    /// Scans rows in parallel. Ignored without the `rayon` feature.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn min_var_i(&self) -> f32 {
        self.min_var_i
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }
}

impl SimilarityMatcher for ZnccMatcher {
    fn score_surface(
        &self,
        frame: ImageView<'_, u8>,
        indicator: &Template,
    ) -> SpeedScanResult<ScoreMap> {
        #[cfg(feature = "rayon")]
        {
            if self.parallel {
                return crate::kernel::rayon::zncc_surface_par(
                    frame,
                    indicator.plan(),
                    self.min_var_i,
                );
            }
        }
        zncc_surface(frame, indicator.plan(), self.min_var_i)
    }
}

/// Placement range `(max_x, max_y)` of `tpl` inside `image`.
pub(crate) fn placement_range(
    image: ImageView<'_, u8>,
    tpl: &TemplatePlan,
) -> SpeedScanResult<(usize, usize)> {
    let img_width = image.width();
    let img_height = image.height();
    let tpl_width = tpl.width();
    let tpl_height = tpl.height();
    if img_width < tpl_width || img_height < tpl_height {
        return Err(SpeedScanError::IndicatorOutOfBounds {
            tpl_width,
            tpl_height,
            img_width,
            img_height,
        });
    }
    Ok((img_width - tpl_width, img_height - tpl_height))
}

/// Fills `out[x]` with the score of every placement on row `y`.
pub(crate) fn score_row(
    image: ImageView<'_, u8>,
    tpl: &TemplatePlan,
    y: usize,
    min_var_i: f32,
    out: &mut [f32],
) {
    let tpl_width = tpl.width();
    let tpl_height = tpl.height();
    let t_prime = tpl.t_prime();
    let var_t = tpl.var_t();
    let n = (tpl_width * tpl_height) as f32;

    for (x, cell) in out.iter_mut().enumerate() {
        let mut dot = 0.0f32;
        let mut sum_i = 0.0f32;
        let mut sum_i2 = 0.0f32;

        for ty in 0..tpl_height {
            let Some(img_row) = image.row(y + ty) else {
                break;
            };
            let base = ty * tpl_width;
            for (tx, &pixel) in img_row[x..x + tpl_width].iter().enumerate() {
                let value = pixel as f32;
                dot += t_prime[base + tx] * value;
                sum_i += value;
                sum_i2 += value * value;
            }
        }

        let var_i = sum_i2 - (sum_i * sum_i) / n;
        *cell = if var_i <= min_var_i {
            0.0
        } else {
            let score = dot / (var_t * var_i).sqrt();
            if score.is_finite() {
                score
            } else {
                0.0
            }
        };
    }
}

/// Scores every placement of `tpl` over `image`, one row at a time.
pub(crate) fn zncc_surface(
    image: ImageView<'_, u8>,
    tpl: &TemplatePlan,
    min_var_i: f32,
) -> SpeedScanResult<ScoreMap> {
    let (max_x, max_y) = placement_range(image, tpl)?;
    let width = max_x + 1;
    let height = max_y + 1;
    let mut scores = vec![0.0f32; width * height];
    for (y, row) in scores.chunks_mut(width).enumerate() {
        score_row(image, tpl, y, min_var_i, row);
    }
    ScoreMap::new(scores, width, height)
}
