//! Indicator images and their correlation plans.

use crate::image::{ImageView, OwnedImage};
use crate::util::SpeedScanResult;

#[cfg(feature = "image-io")]
mod library;
mod plan;

#[cfg(feature = "image-io")]
pub use library::TemplateLibrary;
pub use plan::TemplatePlan;

/// Owned indicator image with its precomputed correlation plan.
///
/// Loaded once before a scan starts and never modified afterwards.
#[derive(Clone, Debug)]
pub struct Template {
    img: OwnedImage,
    plan: TemplatePlan,
}

impl Template {
    /// Creates a template from a contiguous grayscale buffer.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> SpeedScanResult<Self> {
        Self::from_image(OwnedImage::new(data, width, height)?)
    }

    /// Creates a template from an already decoded image.
    pub fn from_image(img: OwnedImage) -> SpeedScanResult<Self> {
        let plan = TemplatePlan::from_view(img.view())?;
        Ok(Self { img, plan })
    }

    /// Returns a borrowed view of the template pixels.
    pub fn view(&self) -> ImageView<'_, u8> {
        self.img.view()
    }

    pub fn width(&self) -> usize {
        self.img.width()
    }

    pub fn height(&self) -> usize {
        self.img.height()
    }

    pub fn plan(&self) -> &TemplatePlan {
        &self.plan
    }
}
