//! Recovery search after tracking loss.
//!
//! The search window is centered on the last trusted position and scaled by
//! estimator uncertainty and time since loss. Inside the window a template
//! match runs at several scale factors; the best hit must clear the
//! acceptance threshold, and when the template carries enough keypoints a
//! translation-consistency check gates it further. Failure leaves the
//! caller free to retry on a later frame.

use nalgebra as na;

use crate::bbox::Rect;
use crate::config::RedetectConfig;
use crate::frame::Frame;
use crate::template::Template;

#[derive(Debug, Clone)]
pub struct RedetectMatch {
    pub rect: Rect,
    pub score: f32,
}

#[derive(Debug, Clone)]
pub struct Redetector {
    cfg: RedetectConfig,
    template: Option<Template>,
}

impl Redetector {
    pub fn new(cfg: RedetectConfig) -> Self {
        Self {
            cfg,
            template: None,
        }
    }

    /// Refresh the recovery template. Called on trusted frames only, under
    /// the same gating as appearance updates, so a drifting candidate never
    /// poisons the template either.
    pub fn remember(&mut self, frame: &Frame<'_>, rect: &Rect) {
        if let Some(tpl) = Template::capture(frame, rect) {
            self.template = Some(tpl);
        }
    }

    #[inline]
    pub fn has_template(&self) -> bool {
        self.template.is_some()
    }

    /// Window radius for the given uncertainty scale, clamped per config.
    pub fn search_radius(&self, uncertainty_scale: f32) -> f32 {
        let scale = uncertainty_scale.clamp(1.0, self.cfg.max_uncertainty_scale);
        (self.cfg.base_radius * scale).max(self.cfg.min_radius)
    }

    /// Scan the window for the best template match. Returns `None` when no
    /// candidate clears the acceptance threshold (or no template exists).
    pub fn search(
        &self,
        frame: &Frame<'_>,
        center: na::Point2<f32>,
        uncertainty_scale: f32,
    ) -> Option<RedetectMatch> {
        let tpl = self.template.as_ref()?;
        let radius = self.search_radius(uncertainty_scale);

        let mut best: Option<RedetectMatch> = None;

        for &scale in &self.cfg.scales {
            let w = tpl.width * scale;
            let h = tpl.height * scale;
            // Quarter-box stride balances coverage against cost; the NCC
            // peak is wide enough to survive it.
            let step = (w.min(h) / 4.0).max(2.0);

            let mut y = center.y - radius;
            while y <= center.y + radius {
                let mut x = center.x - radius;
                while x <= center.x + radius {
                    let rect = Rect::new(x, y, w, h).clamped(frame.width, frame.height);
                    let score = tpl.score(frame, &rect);

                    if score >= self.cfg.accept_threshold
                        && best.as_ref().map_or(true, |b| score > b.score)
                    {
                        best = Some(RedetectMatch { rect, score });
                    }

                    x += step;
                }
                y += step;
            }
        }

        let candidate = best?;

        // Keypoint verification only gates when enough keypoints exist;
        // otherwise the template score alone governs acceptance.
        if let Some(ratio) = tpl.verify(frame, &candidate.rect, self.cfg.min_keypoints) {
            if ratio < self.cfg.keypoint_inlier_ratio {
                log::debug!(
                    "redetection candidate rejected by keypoint check ({:.2} < {:.2})",
                    ratio,
                    self.cfg.keypoint_inlier_ratio
                );
                return None;
            }
        }

        Some(candidate)
    }
}
