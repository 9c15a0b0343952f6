//! Short-horizon motion prediction for bridging detection gaps.
//!
//! Keeps a bounded history of confirmed observations and an exponentially
//! smoothed velocity. Predictions extrapolate linearly and hold the box size
//! constant; there is no scale extrapolation. They are meant for
//! single-digit-frame gaps, not multi-second occlusions, which the decaying
//! confidence reflects.

use nalgebra as na;

use crate::bbox::Rect;
use crate::config::MotionConfig;
use crate::ring::Ring;

#[derive(Debug, Clone)]
pub struct Prediction {
    pub center: na::Point2<f32>,
    pub rect: Rect,
    pub confidence: f32,
}

#[derive(Debug, Clone)]
pub struct MotionPredictor {
    cfg: MotionConfig,
    history: Ring<(f32, na::Point2<f32>)>,
    velocity: Option<na::Vector2<f32>>,
    size: (f32, f32),
}

impl MotionPredictor {
    pub fn new(cfg: MotionConfig) -> Self {
        let history = Ring::with_capacity(cfg.history_len);

        Self {
            cfg,
            history,
            velocity: None,
            size: (0.0, 0.0),
        }
    }

    /// Record one confirmed observation.
    pub fn observe(&mut self, ts: f32, rect: Rect) {
        let pos = rect.center();

        if let Some(&(prev_ts, prev_pos)) = self.history.front() {
            let dt = ts - prev_ts;
            if dt > 1e-6 {
                let inst = (pos - prev_pos) / dt;
                self.velocity = Some(match self.velocity {
                    Some(v) => v * (1.0 - self.cfg.velocity_alpha) + inst * self.cfg.velocity_alpha,
                    None => inst,
                });
            }
        }

        self.history.push((ts, pos));
        self.size = (rect.w, rect.h);
    }

    /// Extrapolate `elapsed` seconds past the newest observation. Returns
    /// `None` until at least one observation exists.
    pub fn predict(&self, elapsed: f32) -> Option<Prediction> {
        let &(_, last) = self.history.front()?;
        let elapsed = elapsed.max(0.0);

        let center = match self.velocity {
            Some(v) => last + v * elapsed,
            None => last,
        };

        let confidence = (self.cfg.base_confidence - self.cfg.decay_per_sec * elapsed)
            .max(self.cfg.min_confidence);

        Some(Prediction {
            center,
            rect: Rect::new(center.x, center.y, self.size.0, self.size.1),
            confidence,
        })
    }

    #[inline]
    pub fn velocity(&self) -> Option<na::Vector2<f32>> {
        self.velocity
    }

    #[inline]
    pub fn observations(&self) -> usize {
        self.history.len()
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.velocity = None;
    }
}
