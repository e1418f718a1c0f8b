//! Zero-mean statistics for normalized cross-correlation.

use crate::image::ImageView;
use crate::util::{SpeedScanError, SpeedScanResult};

/// Precomputed zero-mean indicator buffer and its energy.
#[derive(Clone, Debug)]
pub struct TemplatePlan {
    width: usize,
    height: usize,
    mean: f32,
    var_t: f32,
    t_prime: Vec<f32>,
}

impl TemplatePlan {
    /// Builds a plan from an indicator view.
    ///
    /// Fails with `DegenerateTemplate` for a flat indicator, which would
    /// correlate with nothing.
    pub fn from_view(tpl: ImageView<'_, u8>) -> SpeedScanResult<Self> {
        let width = tpl.width();
        let height = tpl.height();
        let count = width
            .checked_mul(height)
            .ok_or(SpeedScanError::InvalidDimensions { width, height })?;

        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        for y in 0..height {
            let row = tpl.row(y).ok_or(SpeedScanError::InvalidDimensions { width, height })?;
            for &value in row {
                let v = value as f64;
                sum += v;
                sum_sq += v * v;
            }
        }

        let count_f = count as f64;
        let mean = sum / count_f;
        let variance = sum_sq / count_f - mean * mean;
        if variance <= 1e-8 {
            return Err(SpeedScanError::DegenerateTemplate {
                reason: "zero variance",
            });
        }

        let mut t_prime = Vec::with_capacity(count);
        let mut var_t = 0.0f64;
        for y in 0..height {
            let row = tpl.row(y).ok_or(SpeedScanError::InvalidDimensions { width, height })?;
            for &value in row {
                let centered = value as f64 - mean;
                var_t += centered * centered;
                t_prime.push(centered as f32);
            }
        }

        Ok(Self {
            width,
            height,
            mean: mean as f32,
            var_t: var_t as f32,
            t_prime,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Mean intensity of the indicator.
    pub fn mean(&self) -> f32 {
        self.mean
    }

    /// Sum of squared deviations from the mean.
    pub fn var_t(&self) -> f32 {
        self.var_t
    }

    /// Zero-mean indicator values in row-major order.
    pub fn t_prime(&self) -> &[f32] {
        &self.t_prime
    }
}

#[cfg(test)]
mod tests {
    use super::TemplatePlan;
    use crate::{ImageView, SpeedScanError};

    #[test]
    fn plan_centers_values() {
        let data = [10u8, 20, 30, 40];
        let plan = TemplatePlan::from_view(ImageView::from_slice(&data, 2, 2).unwrap()).unwrap();
        assert!((plan.mean() - 25.0).abs() < 1e-6);
        assert_eq!(plan.t_prime(), &[-15.0, -5.0, 5.0, 15.0]);
        assert!((plan.var_t() - 500.0).abs() < 1e-3);
    }

    #[test]
    fn flat_indicator_is_degenerate() {
        let data = [7u8; 9];
        let err = TemplatePlan::from_view(ImageView::from_slice(&data, 3, 3).unwrap()).unwrap_err();
        assert_eq!(
            err,
            SpeedScanError::DegenerateTemplate {
                reason: "zero variance"
            }
        );
    }
}
