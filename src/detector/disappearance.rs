//! Appear-then-disappear transitions.
//!
//! A disappearance is recorded on the first frame where the indicator is
//! missing again after being seen.

use crate::detector::Capture;
use crate::image::ImageView;

/// Stops at the first disappearance.
#[derive(Clone, Debug, Default)]
pub enum FirstDisappearance {
    #[default]
    NotAppeared,
    Appeared { appeared: Capture },
    Disappeared { appeared: Capture, disappeared: Capture },
}

impl FirstDisappearance {
    pub(crate) fn observe(&mut self, found: bool, frame: ImageView<'_, u8>, index: u64) -> bool {
        match std::mem::take(self) {
            Self::NotAppeared if found => {
                *self = Self::Appeared {
                    appeared: Capture::new(index, frame),
                };
                true
            }
            Self::Appeared { appeared } if !found => {
                *self = Self::Disappeared {
                    appeared,
                    disappeared: Capture::new(index, frame),
                };
                true
            }
            unchanged => {
                *self = unchanged;
                false
            }
        }
    }

    pub(crate) fn is_settled(&self) -> bool {
        matches!(self, Self::Disappeared { .. })
    }

    pub fn appeared(&self) -> Option<&Capture> {
        match self {
            Self::NotAppeared => None,
            Self::Appeared { appeared } | Self::Disappeared { appeared, .. } => Some(appeared),
        }
    }

    pub fn disappeared(&self) -> Option<&Capture> {
        match self {
            Self::Disappeared { disappeared, .. } => Some(disappeared),
            _ => None,
        }
    }
}

/// Keeps the first appearance and the most recent disappearance.
///
/// Presence is tracked on every frame, so a marker that comes back and leaves
/// again moves the recorded disappearance forward. The result is only final
/// once the whole stream has been seen.
#[derive(Clone, Debug, Default)]
pub struct LastDisappearance {
    appeared: Option<Capture>,
    disappeared: Option<Capture>,
    on_screen: bool,
}

impl LastDisappearance {
    pub(crate) fn observe(&mut self, found: bool, frame: ImageView<'_, u8>, index: u64) -> bool {
        let mut changed = false;
        if self.appeared.is_none() && found {
            self.appeared = Some(Capture::new(index, frame));
            changed = true;
        } else if self.on_screen && !found {
            self.disappeared = Some(Capture::new(index, frame));
            changed = true;
        }
        self.on_screen = found;
        changed
    }

    pub fn appeared(&self) -> Option<&Capture> {
        self.appeared.as_ref()
    }

    pub fn disappeared(&self) -> Option<&Capture> {
        self.disappeared.as_ref()
    }

    /// Whether the indicator was found on the latest frame.
    pub fn on_screen(&self) -> bool {
        self.on_screen
    }
}
