//! Zero-mean intensity template used by the correlation primitive and the
//! redetection engine, plus a small keypoint layer for geometric
//! verification of redetection candidates.

use nalgebra as na;

use crate::bbox::Rect;
use crate::frame::Frame;

/// Template grid resolution. Regions are resampled to this size so the
/// correlation cost is independent of target scale.
const GRID: usize = 24;

/// Patch half-extent for keypoint descriptors, in grid cells.
const PATCH: i32 = 2;

/// Minimum-eigenvalue floor for a cell to qualify as a keypoint.
const CORNER_MIN_RESPONSE: f32 = 1.0;

/// Displacement tolerance (grid cells) for a keypoint to count as an inlier
/// of the translation fit.
const INLIER_TOLERANCE: f32 = 1.5;

#[derive(Debug, Clone, Copy)]
pub struct Keypoint {
    pub x: usize,
    pub y: usize,
}

#[derive(Debug, Clone)]
pub struct Template {
    /// Zero-mean, unit-norm luma grid.
    values: [f32; GRID * GRID],
    /// Size of the source region in pixels.
    pub width: f32,
    pub height: f32,
    keypoints: Vec<Keypoint>,
}

/// Resample the region's luminance onto a GRID×GRID grid.
fn sample_grid(frame: &Frame<'_>, rect: &Rect) -> [f32; GRID * GRID] {
    let mut grid = [0.0f32; GRID * GRID];
    let x0 = rect.xmin();
    let y0 = rect.ymin();
    let sx = rect.w / GRID as f32;
    let sy = rect.h / GRID as f32;

    for gy in 0..GRID {
        for gx in 0..GRID {
            let px = x0 + (gx as f32 + 0.5) * sx;
            let py = y0 + (gy as f32 + 0.5) * sy;
            grid[gy * GRID + gx] = frame.luma(px as i32, py as i32);
        }
    }

    grid
}

fn normalize(grid: &mut [f32; GRID * GRID]) -> bool {
    let mean = grid.iter().sum::<f32>() / grid.len() as f32;
    for v in grid.iter_mut() {
        *v -= mean;
    }

    let norm = grid.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm < 1e-3 {
        return false; // flat region, correlation undefined
    }

    for v in grid.iter_mut() {
        *v /= norm;
    }
    true
}

/// Cells whose structure-tensor response clears the corner floor, strongest
/// first, spaced at least one patch apart. The response is the minimum
/// eigenvalue of the 3x3-windowed gradient tensor, so straight edges score
/// near zero and only two-directional structure qualifies.
fn detect_keypoints(grid: &[f32; GRID * GRID]) -> Vec<Keypoint> {
    let gradient = |x: usize, y: usize| -> (f32, f32) {
        (
            grid[y * GRID + x + 1] - grid[y * GRID + x - 1],
            grid[(y + 1) * GRID + x] - grid[(y - 1) * GRID + x],
        )
    };

    let mut scored = Vec::new();

    for y in (PATCH as usize)..(GRID - PATCH as usize) {
        for x in (PATCH as usize)..(GRID - PATCH as usize) {
            let mut ixx = 0.0f32;
            let mut ixy = 0.0f32;
            let mut iyy = 0.0f32;
            for wy in (y - 1)..=(y + 1) {
                for wx in (x - 1)..=(x + 1) {
                    let (gx, gy) = gradient(wx, wy);
                    ixx += gx * gx;
                    ixy += gx * gy;
                    iyy += gy * gy;
                }
            }

            let trace = ixx + iyy;
            let det = ixx * iyy - ixy * ixy;
            let lambda_min = 0.5 * (trace - (trace * trace - 4.0 * det).max(0.0).sqrt());
            // Scale back up: the grid is unit-norm, gradients are tiny.
            let response = lambda_min * (GRID * GRID) as f32;
            if response >= CORNER_MIN_RESPONSE {
                scored.push((response, Keypoint { x, y }));
            }
        }
    }

    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut picked: Vec<Keypoint> = Vec::new();
    for (_, kp) in scored {
        let spaced = picked.iter().all(|p| {
            let dx = p.x as i32 - kp.x as i32;
            let dy = p.y as i32 - kp.y as i32;
            dx * dx + dy * dy > (PATCH * 2) * (PATCH * 2)
        });
        if spaced {
            picked.push(kp);
        }
        if picked.len() >= 24 {
            break;
        }
    }

    picked
}

impl Template {
    /// Capture a template from the region, or `None` when the region is too
    /// flat to correlate against.
    pub fn capture(frame: &Frame<'_>, rect: &Rect) -> Option<Self> {
        let mut values = sample_grid(frame, rect);
        if !normalize(&mut values) {
            return None;
        }

        let keypoints = detect_keypoints(&values);

        Some(Self {
            values,
            width: rect.w,
            height: rect.h,
            keypoints,
        })
    }

    #[inline]
    pub fn keypoint_count(&self) -> usize {
        self.keypoints.len()
    }

    /// Normalized cross-correlation of the template against the candidate
    /// region, mapped into [0, 1] (negative correlation scores zero).
    pub fn score(&self, frame: &Frame<'_>, rect: &Rect) -> f32 {
        let mut candidate = sample_grid(frame, rect);
        if !normalize(&mut candidate) {
            return 0.0;
        }

        let ncc: f32 = self
            .values
            .iter()
            .zip(candidate.iter())
            .map(|(a, b)| a * b)
            .sum();

        ncc.max(0.0)
    }

    /// Verify a candidate region by matching template keypoints into it and
    /// fitting a translation with a median-based robust step. Returns the
    /// inlier ratio of matched keypoints, or `None` when too few keypoints
    /// exist for the check to be meaningful.
    pub fn verify(
        &self,
        frame: &Frame<'_>,
        rect: &Rect,
        min_keypoints: usize,
    ) -> Option<f32> {
        if self.keypoints.len() < min_keypoints {
            return None;
        }

        let mut candidate = sample_grid(frame, rect);
        if !normalize(&mut candidate) {
            return Some(0.0);
        }

        let mut displacements: Vec<na::Vector2<f32>> = Vec::new();

        for kp in &self.keypoints {
            if let Some(d) = match_keypoint(&self.values, &candidate, kp) {
                displacements.push(d);
            }
        }

        if displacements.is_empty() {
            return Some(0.0);
        }

        // Median displacement per axis is robust to a minority of bad
        // matches; inliers are those close to it.
        let median = |mut v: Vec<f32>| -> f32 {
            v.sort_by(f32::total_cmp);
            v[v.len() / 2]
        };
        let mx = median(displacements.iter().map(|d| d.x).collect());
        let my = median(displacements.iter().map(|d| d.y).collect());
        let center = na::Vector2::new(mx, my);

        let inliers = displacements
            .iter()
            .filter(|d| (*d - center).norm() <= INLIER_TOLERANCE)
            .count();

        Some(inliers as f32 / self.keypoints.len() as f32)
    }
}

/// Best SSD match of the keypoint's patch within a small search neighborhood
/// of the candidate grid. Returns the displacement, or `None` when the patch
/// cannot be matched distinctively.
fn match_keypoint(
    template: &[f32; GRID * GRID],
    candidate: &[f32; GRID * GRID],
    kp: &Keypoint,
) -> Option<na::Vector2<f32>> {
    const SEARCH: i32 = 4;

    let mut best = f32::MAX;
    let mut best_d2 = i32::MAX;
    let mut best_at = (0i32, 0i32);

    for dy in -SEARCH..=SEARCH {
        for dx in -SEARCH..=SEARCH {
            let cx = kp.x as i32 + dx;
            let cy = kp.y as i32 + dy;
            if cx < PATCH
                || cy < PATCH
                || cx >= GRID as i32 - PATCH
                || cy >= GRID as i32 - PATCH
            {
                continue;
            }

            let mut ssd = 0.0f32;
            for py in -PATCH..=PATCH {
                for px in -PATCH..=PATCH {
                    let t = template
                        [(kp.y as i32 + py) as usize * GRID + (kp.x as i32 + px) as usize];
                    let c = candidate[(cy + py) as usize * GRID + (cx + px) as usize];
                    let d = t - c;
                    ssd += d * d;
                }
            }

            // Ties go to the smaller displacement, so a self-similar patch
            // does not report a spurious shift.
            let d2 = dx * dx + dy * dy;
            if ssd + 1e-6 < best || ((ssd - best).abs() <= 1e-6 && d2 < best_d2) {
                best = ssd;
                best_d2 = d2;
                best_at = (dx, dy);
            }
        }
    }

    if best == f32::MAX {
        None
    } else {
        Some(na::Vector2::new(best_at.0 as f32, best_at.1 as f32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::CHANNELS;

    /// Black frame with a white square whose top-left corner is at (sx, sy).
    fn square_frame(w: u32, h: u32, sx: usize, sy: usize, side: usize) -> Vec<u8> {
        let mut data = vec![20u8; w as usize * h as usize * CHANNELS];
        for y in sy..(sy + side).min(h as usize) {
            for x in sx..(sx + side).min(w as usize) {
                let off = (y * w as usize + x) * CHANNELS;
                data[off] = 230;
                data[off + 1] = 230;
                data[off + 2] = 230;
            }
        }
        data
    }

    #[test]
    fn matches_itself_perfectly() {
        let data = square_frame(128, 128, 40, 40, 30);
        let frame = Frame::new(128, 128, 0.0, &data).unwrap();
        let rect = Rect::new(55.0, 55.0, 48.0, 48.0);

        let tpl = Template::capture(&frame, &rect).unwrap();
        let score = tpl.score(&frame, &rect);
        approx::assert_abs_diff_eq!(score, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn shifted_region_scores_lower() {
        let data = square_frame(128, 128, 40, 40, 30);
        let frame = Frame::new(128, 128, 0.0, &data).unwrap();
        let rect = Rect::new(55.0, 55.0, 48.0, 48.0);

        let tpl = Template::capture(&frame, &rect).unwrap();
        let off = Rect::new(90.0, 90.0, 48.0, 48.0);
        assert!(tpl.score(&frame, &off) < tpl.score(&frame, &rect));
    }

    #[test]
    fn flat_region_yields_no_template() {
        let data = vec![50u8; 64 * 64 * CHANNELS];
        let frame = Frame::new(64, 64, 0.0, &data).unwrap();
        assert!(Template::capture(&frame, &Rect::new(32.0, 32.0, 20.0, 20.0)).is_none());
    }

    #[test]
    fn square_template_has_corner_keypoints() {
        let data = square_frame(128, 128, 40, 40, 30);
        let frame = Frame::new(128, 128, 0.0, &data).unwrap();
        let tpl = Template::capture(&frame, &Rect::new(55.0, 55.0, 48.0, 48.0)).unwrap();
        assert!(tpl.keypoint_count() > 0);

        // The square occupies grid cells ~4.5..19.5 per axis; every keypoint
        // must sit near one of its four corners, never on a straight edge.
        let corners = [(4.5f32, 4.5f32), (19.5, 4.5), (4.5, 19.5), (19.5, 19.5)];
        for kp in &tpl.keypoints {
            let near = corners.iter().any(|(cx, cy)| {
                let dx = kp.x as f32 - cx;
                let dy = kp.y as f32 - cy;
                dx * dx + dy * dy <= 9.0
            });
            assert!(near, "keypoint at ({}, {}) is not on a corner", kp.x, kp.y);
        }
    }

    #[test]
    fn verify_accepts_true_location() {
        let data = square_frame(128, 128, 40, 40, 30);
        let frame = Frame::new(128, 128, 0.0, &data).unwrap();
        let rect = Rect::new(55.0, 55.0, 48.0, 48.0);

        let tpl = Template::capture(&frame, &rect).unwrap();
        let ratio = tpl.verify(&frame, &rect, 1).unwrap();
        assert!(ratio > 0.5, "inlier ratio {}", ratio);
    }
}
