//! The validated, modality-tagged output record, the single contract this
//! core exposes to downstream consumers. A record that fails validation is
//! rejected at construction and never emitted.

use serde_derive::{Deserialize, Serialize};

use crate::bbox::{Edge, Rect};
use crate::error::Error;
use crate::math::clamp01;
use crate::track::Track;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Position2d,
    Position3d,
    Angular,
    BoundingBox,
    Velocity,
    MultiTarget,
    External,
    Raw,
}

/// Why a track was lost.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LossReason {
    PrimitiveFailure,
    LowConfidence,
    OutOfFrame,
}

/// Populated on the first failed frame, carried while not tracking, cleared
/// on re-acquisition.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FailureInfo {
    pub reason: LossReason,
    pub last_rect: Rect,
    pub predicted_rect: Rect,
    pub exit_edge: Option<Edge>,
    pub frames_lost: u32,
    pub confidence_at_loss: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OutputRecord {
    pub modality: Modality,
    pub timestamp: f32,
    pub tracking_active: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub position_2d: Option<[f32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub position_3d: Option<[f32; 3]>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub bbox: Option<[i32; 4]>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub confidence: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub velocity: Option<[f32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub targets: Option<Vec<Track>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub failure_info: Option<FailureInfo>,
}

impl OutputRecord {
    fn base(modality: Modality, timestamp: f32, tracking_active: bool) -> Self {
        Self {
            modality,
            timestamp,
            tracking_active,
            position_2d: None,
            position_3d: None,
            bbox: None,
            confidence: None,
            velocity: None,
            targets: None,
            failure_info: None,
        }
    }

    pub fn position_2d(
        timestamp: f32,
        position: [f32; 2],
        confidence: Option<f32>,
    ) -> Result<Self, Error> {
        let mut rec = Self::base(Modality::Position2d, timestamp, true);
        rec.position_2d = Some(position);
        rec.confidence = confidence;
        rec.validate()?;
        Ok(rec)
    }

    /// The 2D projection is derived from the 3D position, which keeps the
    /// consistency invariant true by construction.
    pub fn position_3d(
        timestamp: f32,
        position: [f32; 3],
        confidence: Option<f32>,
    ) -> Result<Self, Error> {
        let mut rec = Self::base(Modality::Position3d, timestamp, true);
        rec.position_3d = Some(position);
        rec.position_2d = Some([position[0], position[1]]);
        rec.confidence = confidence;
        rec.validate()?;
        Ok(rec)
    }

    /// Angular modality: position_2d holds (azimuth, elevation) in
    /// normalized units.
    pub fn angular(timestamp: f32, angles: [f32; 2], confidence: Option<f32>) -> Result<Self, Error> {
        let mut rec = Self::base(Modality::Angular, timestamp, true);
        rec.position_2d = Some(angles);
        rec.confidence = confidence;
        rec.validate()?;
        Ok(rec)
    }

    pub fn bounding_box(
        timestamp: f32,
        bbox: [i32; 4],
        confidence: f32,
        position_2d: Option<[f32; 2]>,
        velocity: Option<[f32; 2]>,
    ) -> Result<Self, Error> {
        let mut rec = Self::base(Modality::BoundingBox, timestamp, true);
        rec.bbox = Some(bbox);
        rec.confidence = Some(confidence);
        rec.position_2d = position_2d;
        rec.velocity = velocity;
        rec.validate()?;
        Ok(rec)
    }

    pub fn velocity_aware(
        timestamp: f32,
        position: [f32; 2],
        velocity: [f32; 2],
        confidence: Option<f32>,
    ) -> Result<Self, Error> {
        let mut rec = Self::base(Modality::Velocity, timestamp, true);
        rec.position_2d = Some(position);
        rec.velocity = Some(velocity);
        rec.confidence = confidence;
        rec.validate()?;
        Ok(rec)
    }

    pub fn multi_target(timestamp: f32, targets: Vec<Track>) -> Result<Self, Error> {
        let active = !targets.is_empty();
        let mut rec = Self::base(Modality::MultiTarget, timestamp, active);
        rec.targets = Some(targets);
        rec.validate()?;
        Ok(rec)
    }

    pub fn external(timestamp: f32, position: [f32; 2]) -> Result<Self, Error> {
        let mut rec = Self::base(Modality::External, timestamp, true);
        rec.position_2d = Some(position);
        rec.validate()?;
        Ok(rec)
    }

    pub fn raw(timestamp: f32) -> Result<Self, Error> {
        let rec = Self::base(Modality::Raw, timestamp, true);
        rec.validate()?;
        Ok(rec)
    }

    /// Loss-of-tracking record: a normal state, not a processing fault.
    /// Raw modality has no positional requirements, so the failure details
    /// and the predicted rectangle travel as the only payload.
    pub fn not_tracking(
        timestamp: f32,
        failure: FailureInfo,
        predicted: Option<Rect>,
    ) -> Result<Self, Error> {
        let mut rec = Self::base(Modality::Raw, timestamp, false);
        rec.bbox = predicted.map(|r| r.ltwh());
        rec.failure_info = Some(failure);
        rec.validate()?;
        Ok(rec)
    }

    fn require(&self, present: bool, field: &'static str) -> Result<(), Error> {
        if present {
            Ok(())
        } else {
            Err(Error::MissingField {
                modality: self.modality,
                field,
            })
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        match self.modality {
            Modality::Position2d | Modality::Angular | Modality::External => {
                self.require(self.position_2d.is_some(), "position_2d")?;
            }
            Modality::Position3d => {
                self.require(self.position_3d.is_some(), "position_3d")?;
                self.require(self.position_2d.is_some(), "position_2d")?;
            }
            Modality::BoundingBox => {
                self.require(self.bbox.is_some(), "bbox")?;
                self.require(self.confidence.is_some(), "confidence")?;
            }
            Modality::Velocity => {
                self.require(self.position_2d.is_some(), "position_2d")?;
                self.require(self.velocity.is_some(), "velocity")?;
            }
            Modality::MultiTarget => {
                self.require(self.targets.is_some(), "targets")?;
            }
            Modality::Raw => {}
        }

        if self.targets.is_some() && self.modality != Modality::MultiTarget {
            return Err(Error::UnexpectedField {
                modality: self.modality,
                field: "targets",
            });
        }

        if let Some(conf) = self.confidence {
            if !(0.0..=1.0).contains(&conf) {
                return Err(Error::OutOfRange {
                    field: "confidence",
                    value: conf,
                });
            }
        }

        if let Some([x, y]) = self.position_2d {
            for (axis, v) in [("position_2d.x", x), ("position_2d.y", y)] {
                if !(-2.0..=2.0).contains(&v) || !v.is_finite() {
                    return Err(Error::OutOfRange {
                        field: axis,
                        value: v,
                    });
                }
            }
        }

        // 3D-capable modalities: the 2D projection must equal the x,y
        // components of the 3D position.
        if let (Some(p2), Some(p3)) = (self.position_2d, self.position_3d) {
            if (p2[0] - p3[0]).abs() > 1e-5 || (p2[1] - p3[1]).abs() > 1e-5 {
                return Err(Error::InconsistentProjection);
            }
        }

        if self.tracking_active && self.failure_info.is_some() {
            return Err(Error::UnexpectedField {
                modality: self.modality,
                field: "failure_info",
            });
        }

        Ok(())
    }

    /// Confidence clamped into the unit interval for consumers that do not
    /// want to branch on absence.
    #[inline]
    pub fn confidence_or_zero(&self) -> f32 {
        clamp01(self.confidence.unwrap_or(0.0))
    }
}
