//! Resolution-keyed indicator images on disk.

use std::path::{Path, PathBuf};

use crate::image::io::load_gray_image;
use crate::template::Template;
use crate::trace::trace_event;
use crate::util::{SpeedScanError, SpeedScanResult};

/// Indicator images laid out as `<root>/<height>p/<name>.png`.
///
/// Indicators are drawn at the size they appear in the video, so each video
/// height needs its own set.
#[derive(Clone, Debug)]
pub struct TemplateLibrary {
    root: PathBuf,
    resolution: usize,
}

impl TemplateLibrary {
    pub fn new<P: AsRef<Path>>(root: P, resolution: usize) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            resolution,
        }
    }

    /// Video height the library serves.
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Directory holding the indicators for this resolution.
    pub fn directory(&self) -> PathBuf {
        self.root.join(format!("{}p", self.resolution))
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.directory().join(format!("{name}.png"))
    }

    /// Loads one indicator; a missing file is `MissingTemplate`.
    pub fn load(&self, name: &str) -> SpeedScanResult<Template> {
        let path = self.path_of(name);
        if !path.is_file() {
            return Err(SpeedScanError::MissingTemplate { path });
        }
        let template = Template::from_image(load_gray_image(&path)?)?;
        trace_event!(
            "template_loaded",
            template = name,
            width = template.width(),
            height = template.height(),
        );
        Ok(template)
    }
}
