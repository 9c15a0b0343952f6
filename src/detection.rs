use serde_derive::{Deserialize, Serialize};

use crate::bbox::Rect;
use crate::error::Error;

/// Oriented-box fields some upstream detectors emit alongside the
/// axis-aligned rectangle. Rotation is in radians.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    pub cx: f32,
    pub cy: f32,
    pub w: f32,
    pub h: f32,
    pub angle: f32,
}

/// One per-frame candidate observation from an upstream detector. Ephemeral;
/// consumed within a single frame cycle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct Detection {
    #[serde(flatten)]
    pub rect: Rect,
    #[serde(rename = "p")]
    pub confidence: f32,
    #[serde(rename = "c", default)]
    pub class: Option<i32>,
    #[serde(default)]
    pub oriented: Option<OrientedBox>,
    /// Track id assigned by the upstream source; -1 when the source does not
    /// itself track.
    #[serde(default = "default_source_id")]
    pub source_id: i32,
}

fn default_source_id() -> i32 {
    -1
}

impl Detection {
    pub fn new(rect: Rect, confidence: f32) -> Self {
        Self {
            rect,
            confidence,
            class: None,
            oriented: None,
            source_id: -1,
        }
    }

    /// Geometry and confidence sanity check. A detection failing this is
    /// dropped for the frame; it never reaches a track.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.rect.x.is_finite()
            || !self.rect.y.is_finite()
            || !self.rect.w.is_finite()
            || !self.rect.h.is_finite()
        {
            return Err(Error::BadDetection("non-finite rectangle".into()));
        }

        if self.rect.w <= 0.0 || self.rect.h <= 0.0 {
            return Err(Error::BadDetection(format!(
                "non-positive extent {}x{}",
                self.rect.w, self.rect.h
            )));
        }

        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(Error::BadDetection(format!(
                "confidence {} outside [0, 1]",
                self.confidence
            )));
        }

        Ok(())
    }

    #[inline]
    pub fn iou(&self, other: &Detection) -> f32 {
        self.rect.iou(&other.rect)
    }
}
