//! Rayon-parallel ZNCC surface (feature-gated).
//!
//! Rows of the score map are independent, so each worker fills whole rows
//! with the same per-row routine as the scalar scan.

use crate::image::ImageView;
use crate::kernel::scalar::{placement_range, score_row};
use crate::kernel::ScoreMap;
use crate::template::TemplatePlan;
use crate::util::SpeedScanResult;
use rayon::prelude::*;

/// Row-parallel ZNCC surface; identical output to the scalar scan.
pub fn zncc_surface_par(
    image: ImageView<'_, u8>,
    tpl: &TemplatePlan,
    min_var_i: f32,
) -> SpeedScanResult<ScoreMap> {
    let (max_x, max_y) = placement_range(image, tpl)?;
    let width = max_x + 1;
    let height = max_y + 1;
    let mut scores = vec![0.0f32; width * height];
    scores
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| score_row(image, tpl, y, min_var_i, row));
    ScoreMap::new(scores, width, height)
}
