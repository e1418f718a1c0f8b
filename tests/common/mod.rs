#![allow(dead_code)]

//! Presence-coded frames for exercising detector policies without real
//! image matching.
//!
//! Each marker owns a column ("slot") of a one-row frame. A slot pixel of 255
//! means the marker is on screen. The last column carries the frame index so
//! that every frame is distinct.

use speedscan::{
    ImageView, OwnedImage, ScoreMap, SimilarityMatcher, SpeedScanError, SpeedScanResult, Template,
};

pub const FRAME_WIDTH: usize = 8;

/// Scores 1.0 when the indicator's slot is lit, 0.0 otherwise.
pub struct PresenceMatcher;

impl SimilarityMatcher for PresenceMatcher {
    fn score_surface(
        &self,
        frame: ImageView<'_, u8>,
        indicator: &Template,
    ) -> SpeedScanResult<ScoreMap> {
        let slot = *indicator.view().get(0, 0).unwrap() as usize;
        match frame.get(slot, 0) {
            Some(&value) => ScoreMap::new(vec![if value == 255 { 1.0 } else { 0.0 }], 1, 1),
            None => Err(SpeedScanError::IndicatorOutOfBounds {
                tpl_width: slot + 1,
                tpl_height: 1,
                img_width: frame.width(),
                img_height: frame.height(),
            }),
        }
    }
}

/// Indicator bound to `slot`.
pub fn marker(slot: u8) -> Template {
    Template::new(vec![slot, slot + 100], 2, 1).unwrap()
}

/// Frame `index` with the given slots lit.
pub fn frame(index: u64, lit: &[u8]) -> OwnedImage {
    let mut data = vec![0u8; FRAME_WIDTH];
    for &slot in lit {
        data[slot as usize] = 255;
    }
    data[FRAME_WIDTH - 1] = (index % 200) as u8;
    OwnedImage::new(data, FRAME_WIDTH, 1).unwrap()
}

/// Builder for frames where each slot is lit on a chosen set of frames.
pub struct Timeline {
    len: u64,
    schedule: Vec<(u8, Vec<u64>)>,
}

pub fn timeline(len: u64) -> Timeline {
    Timeline {
        len,
        schedule: Vec::new(),
    }
}

impl Timeline {
    pub fn lit(mut self, slot: u8, frames: &[u64]) -> Self {
        self.schedule.push((slot, frames.to_vec()));
        self
    }

    pub fn frames(&self) -> Vec<OwnedImage> {
        (0..self.len)
            .map(|index| {
                let lit: Vec<u8> = self
                    .schedule
                    .iter()
                    .filter(|(_, frames)| frames.contains(&index))
                    .map(|(slot, _)| *slot)
                    .collect();
                frame(index, &lit)
            })
            .collect()
    }
}

/// Frames for a single slot following a presence pattern.
pub fn presence(slot: u8, pattern: &[bool]) -> Vec<OwnedImage> {
    pattern
        .iter()
        .enumerate()
        .map(|(index, &on)| {
            let lit = if on { vec![slot] } else { Vec::new() };
            frame(index as u64, &lit)
        })
        .collect()
}
