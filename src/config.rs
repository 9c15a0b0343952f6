//! Immutable configuration snapshots, one per component. Every constructor
//! in the crate takes its config by value at build time; invalid values are
//! fatal there, before any frame is processed.

use serde_derive::{Deserialize, Serialize};

use crate::error::Error;

fn ensure(cond: bool, msg: &str) -> Result<(), Error> {
    if cond {
        Ok(())
    } else {
        Err(Error::Config(msg.into()))
    }
}

/// Constant-acceleration Kalman filter noise. Values are variances.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EstimatorConfig {
    /// Process noise spectral density (jerk variance driving the model).
    pub process_var: f32,
    /// Measurement noise variance, pixels squared.
    pub measurement_var: f32,
    /// Initial position variance.
    pub init_pos_var: f32,
    /// Initial velocity variance.
    pub init_vel_var: f32,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            process_var: 4.0,
            measurement_var: 16.0,
            init_pos_var: 25.0,
            init_vel_var: 100.0,
        }
    }
}

impl EstimatorConfig {
    pub fn validate(&self) -> Result<(), Error> {
        ensure(self.process_var > 0.0, "process_var must be positive")?;
        ensure(
            self.measurement_var >= 0.0,
            "measurement_var must be non-negative",
        )?;
        ensure(self.init_pos_var > 0.0, "init_pos_var must be positive")?;
        ensure(self.init_vel_var > 0.0, "init_vel_var must be positive")
    }
}

/// Short-horizon linear motion prediction.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MotionConfig {
    /// Confirmed observations retained for velocity estimation.
    pub history_len: usize,
    /// EMA weight of the newest instantaneous velocity sample.
    pub velocity_alpha: f32,
    /// Confidence of a zero-elapsed prediction.
    pub base_confidence: f32,
    /// Linear confidence decay per second of elapsed time.
    pub decay_per_sec: f32,
    /// Confidence floor; predictions never report below this.
    pub min_confidence: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            history_len: 10,
            velocity_alpha: 0.4,
            base_confidence: 0.8,
            decay_per_sec: 1.2,
            min_confidence: 0.05,
        }
    }
}

impl MotionConfig {
    pub fn validate(&self) -> Result<(), Error> {
        ensure(self.history_len >= 2, "history_len must be at least 2")?;
        ensure(
            (0.0..=1.0).contains(&self.velocity_alpha),
            "velocity_alpha must be in [0, 1]",
        )?;
        ensure(
            (0.0..=1.0).contains(&self.base_confidence),
            "base_confidence must be in [0, 1]",
        )?;
        ensure(self.decay_per_sec >= 0.0, "decay_per_sec must be non-negative")?;
        ensure(
            self.min_confidence > 0.0 && self.min_confidence <= self.base_confidence,
            "min_confidence must be in (0, base_confidence]",
        )
    }
}

/// Appearance descriptor bank.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AppearanceConfig {
    /// Retained descriptors; oldest evicted first.
    pub bank_size: usize,
    /// Histogram bins per color channel.
    pub bins: usize,
    /// Minimum cosine similarity for a match.
    pub accept_threshold: f32,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            bank_size: 8,
            bins: 16,
            accept_threshold: 0.6,
        }
    }
}

impl AppearanceConfig {
    pub fn validate(&self) -> Result<(), Error> {
        ensure(self.bank_size >= 1, "bank_size must be at least 1")?;
        ensure(self.bins >= 2, "bins must be at least 2")?;
        ensure(
            (0.0..=1.0).contains(&self.accept_threshold),
            "accept_threshold must be in [0, 1]",
        )
    }
}

/// Candidate validation gates for the single-target machine. Each gate is
/// independently togglable; all are bypassed for the first `warmup_frames`
/// frames after a (re)start so a track without history is not falsely
/// rejected.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GateConfig {
    pub motion_gate: bool,
    /// Maximum deviation of a candidate center from the predicted center,
    /// as a fraction of the frame diagonal.
    pub motion_max_diag_fraction: f32,
    pub scale_gate: bool,
    /// Maximum relative area change against the previous frame.
    pub scale_max_ratio: f32,
    pub warmup_frames: u32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            motion_gate: true,
            motion_max_diag_fraction: 0.1,
            scale_gate: true,
            scale_max_ratio: 0.5,
            warmup_frames: 15,
        }
    }
}

impl GateConfig {
    pub fn validate(&self) -> Result<(), Error> {
        ensure(
            self.motion_max_diag_fraction > 0.0 && self.motion_max_diag_fraction <= 1.0,
            "motion_max_diag_fraction must be in (0, 1]",
        )?;
        ensure(
            self.scale_max_ratio > 0.0,
            "scale_max_ratio must be positive",
        )
    }
}

/// Redetection search.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RedetectConfig {
    /// Base search radius in pixels before uncertainty scaling.
    pub base_radius: f32,
    /// Search radius never shrinks below this.
    pub min_radius: f32,
    /// Cap on the uncertainty scale factor.
    pub max_uncertainty_scale: f32,
    /// Minimum template match score for acceptance.
    pub accept_threshold: f32,
    /// Scale factors tried around the last-known box size.
    pub scales: Vec<f32>,
    /// Full-rate search attempts before falling back to periodic retry.
    pub max_attempts: u32,
    /// Retry every this many frames once in the reduced-rate regime.
    pub retry_stride: u32,
    /// Keypoint verification engages when at least this many template
    /// keypoints exist; below it, template score alone governs.
    pub min_keypoints: usize,
    /// Minimum inlier ratio for the keypoint translation fit.
    pub keypoint_inlier_ratio: f32,
}

impl Default for RedetectConfig {
    fn default() -> Self {
        Self {
            base_radius: 60.0,
            min_radius: 30.0,
            max_uncertainty_scale: 4.0,
            accept_threshold: 0.55,
            scales: vec![0.9, 1.0, 1.1],
            max_attempts: 30,
            retry_stride: 5,
            min_keypoints: 6,
            keypoint_inlier_ratio: 0.5,
        }
    }
}

impl RedetectConfig {
    pub fn validate(&self) -> Result<(), Error> {
        ensure(self.base_radius > 0.0, "base_radius must be positive")?;
        ensure(self.min_radius > 0.0, "min_radius must be positive")?;
        ensure(
            self.max_uncertainty_scale >= 1.0,
            "max_uncertainty_scale must be at least 1",
        )?;
        ensure(
            (0.0..=1.0).contains(&self.accept_threshold),
            "accept_threshold must be in [0, 1]",
        )?;
        ensure(!self.scales.is_empty(), "scales must not be empty")?;
        ensure(
            self.scales.iter().all(|&s| s > 0.0),
            "scale factors must be positive",
        )?;
        ensure(self.retry_stride >= 1, "retry_stride must be at least 1")?;
        ensure(
            (0.0..=1.0).contains(&self.keypoint_inlier_ratio),
            "keypoint_inlier_ratio must be in [0, 1]",
        )
    }
}

/// Single-target tracker: confidence fusion, smoothing, loss and boundary
/// behavior, plus the per-component configs it owns.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TrackerConfig {
    /// Weight of the motion-consistency score in fusion.
    pub motion_weight: f32,
    /// Weight of the appearance-similarity score in fusion.
    pub appearance_weight: f32,
    /// EMA alpha applied to the fused confidence.
    pub smoothing_alpha: f32,
    /// Smoothed confidence below this (past warm-up) is a loss.
    pub loss_threshold: f32,
    /// Pixel margin from each frame edge for near-boundary handling.
    pub boundary_margin: f32,
    /// Confidence multiplier applied while near a boundary.
    pub boundary_penalty: f32,
    pub gates: GateConfig,
    pub estimator: EstimatorConfig,
    pub motion: MotionConfig,
    pub appearance: AppearanceConfig,
    pub redetect: RedetectConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            motion_weight: 0.5,
            appearance_weight: 0.5,
            smoothing_alpha: 0.3,
            loss_threshold: 0.35,
            boundary_margin: 20.0,
            boundary_penalty: 0.8,
            gates: GateConfig::default(),
            estimator: EstimatorConfig::default(),
            motion: MotionConfig::default(),
            appearance: AppearanceConfig::default(),
            redetect: RedetectConfig::default(),
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), Error> {
        ensure(self.motion_weight >= 0.0, "motion_weight must be non-negative")?;
        ensure(
            self.appearance_weight >= 0.0,
            "appearance_weight must be non-negative",
        )?;
        ensure(
            (self.motion_weight + self.appearance_weight - 1.0).abs() < 1e-3,
            "fusion weights must sum to 1.0",
        )?;
        ensure(
            self.smoothing_alpha > 0.0 && self.smoothing_alpha <= 1.0,
            "smoothing_alpha must be in (0, 1]",
        )?;
        ensure(
            (0.0..1.0).contains(&self.loss_threshold),
            "loss_threshold must be in [0, 1)",
        )?;
        ensure(
            self.boundary_margin >= 0.0,
            "boundary_margin must be non-negative",
        )?;
        ensure(
            self.boundary_penalty > 0.0 && self.boundary_penalty <= 1.0,
            "boundary_penalty must be in (0, 1]",
        )?;

        self.gates.validate()?;
        self.estimator.validate()?;
        self.motion.validate()?;
        self.appearance.validate()?;
        self.redetect.validate()
    }
}

/// Multi-object association engine.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SceneConfig {
    /// Weight of the geometric (IoU) term in the assignment cost.
    pub iou_weight: f32,
    /// Weight of the appearance term in the assignment cost.
    pub appearance_weight: f32,
    /// Assignments with cost above this are discarded.
    pub cost_threshold: f32,
    /// Consecutive matched frames before a new track is confirmed.
    pub confirm_frames: u32,
    /// Frames a lost track survives without re-identification.
    pub lost_buffer: u32,
    /// Unmatched detections below this confidence do not spawn tracks.
    pub spawn_threshold: f32,
    /// Misses tolerated by an unconfirmed track before fast pruning.
    pub tentative_miss_limit: u32,
    /// Minimum cosine similarity for lost-track re-identification.
    pub reid_threshold: f32,
    pub estimator: EstimatorConfig,
    pub motion: MotionConfig,
    pub appearance: AppearanceConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            iou_weight: 0.7,
            appearance_weight: 0.3,
            cost_threshold: 0.9,
            confirm_frames: 3,
            lost_buffer: 30,
            spawn_threshold: 0.4,
            tentative_miss_limit: 2,
            reid_threshold: 0.65,
            estimator: EstimatorConfig::default(),
            motion: MotionConfig::default(),
            appearance: AppearanceConfig::default(),
        }
    }
}

impl SceneConfig {
    pub fn validate(&self) -> Result<(), Error> {
        ensure(self.iou_weight >= 0.0, "iou_weight must be non-negative")?;
        ensure(
            self.appearance_weight >= 0.0,
            "appearance_weight must be non-negative",
        )?;
        ensure(
            self.iou_weight + self.appearance_weight > 0.0,
            "at least one cost weight must be positive",
        )?;
        ensure(
            self.cost_threshold > 0.0,
            "cost_threshold must be positive",
        )?;
        ensure(self.confirm_frames >= 1, "confirm_frames must be at least 1")?;
        ensure(self.lost_buffer >= 1, "lost_buffer must be at least 1")?;
        ensure(
            (0.0..=1.0).contains(&self.spawn_threshold),
            "spawn_threshold must be in [0, 1]",
        )?;
        ensure(
            (0.0..=1.0).contains(&self.reid_threshold),
            "reid_threshold must be in [0, 1]",
        )?;

        self.estimator.validate()?;
        self.motion.validate()?;
        self.appearance.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(TrackerConfig::default().validate().is_ok());
        assert!(SceneConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_fusion_weights() {
        let cfg = TrackerConfig {
            motion_weight: 0.9,
            appearance_weight: 0.3,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = TrackerConfig {
            motion_weight: -0.2,
            appearance_weight: 1.2,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_search_radius() {
        let cfg = RedetectConfig {
            base_radius: 0.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_degenerate_scene_config() {
        let cfg = SceneConfig {
            iou_weight: 0.0,
            appearance_weight: 0.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
