//! First-appearance transition.

use crate::detector::Capture;
use crate::image::ImageView;

/// Records the first frame on which the indicator is found.
#[derive(Clone, Debug, Default)]
pub struct Appearance {
    appeared: Option<Capture>,
}

impl Appearance {
    pub(crate) fn observe(&mut self, found: bool, frame: ImageView<'_, u8>, index: u64) -> bool {
        if self.appeared.is_some() || !found {
            return false;
        }
        self.appeared = Some(Capture::new(index, frame));
        true
    }

    /// Once appeared nothing else can change.
    pub(crate) fn is_settled(&self) -> bool {
        self.appeared.is_some()
    }

    pub fn appeared(&self) -> Option<&Capture> {
        self.appeared.as_ref()
    }
}
