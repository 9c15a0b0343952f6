use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

/// Frame edge, used for boundary classification and exit reporting.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

/// Axis-aligned box in pixel space. (x, y) is the center, like the
/// detections the upstream sources produce.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    #[inline]
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// From left-top-width-height integer coordinates.
    #[inline]
    pub fn from_ltwh(l: i32, t: i32, w: i32, h: i32) -> Self {
        Self {
            x: l as f32 + w as f32 / 2.0,
            y: t as f32 + h as f32 / 2.0,
            w: w as f32,
            h: h as f32,
        }
    }

    /// To left-top-width-height integer coordinates (rounded).
    #[inline]
    pub fn ltwh(&self) -> [i32; 4] {
        [
            (self.x - self.w / 2.0).round() as i32,
            (self.y - self.h / 2.0).round() as i32,
            self.w.round() as i32,
            self.h.round() as i32,
        ]
    }

    #[inline]
    pub fn center(&self) -> na::Point2<f32> {
        na::Point2::new(self.x, self.y)
    }

    #[inline]
    pub fn centered_at(&self, p: na::Point2<f32>) -> Self {
        Self {
            x: p.x,
            y: p.y,
            ..*self
        }
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.w * self.h
    }

    #[inline]
    pub fn diag(&self) -> f32 {
        (self.w * self.w + self.h * self.h).sqrt()
    }

    #[inline(always)]
    pub fn xmin(&self) -> f32 {
        self.x - self.w / 2.0
    }

    #[inline(always)]
    pub fn xmax(&self) -> f32 {
        self.x + self.w / 2.0
    }

    #[inline(always)]
    pub fn ymin(&self) -> f32 {
        self.y - self.h / 2.0
    }

    #[inline(always)]
    pub fn ymax(&self) -> f32 {
        self.y + self.h / 2.0
    }

    pub fn iou(&self, other: &Rect) -> f32 {
        let i_xmin = self.xmin().max(other.xmin());
        let i_xmax = self.xmax().min(other.xmax());
        let i_ymin = self.ymin().max(other.ymin());
        let i_ymax = self.ymax().min(other.ymax());

        let i_area = (i_xmax - i_xmin).max(0.0) * (i_ymax - i_ymin).max(0.0);
        let u_area = self.area() + other.area() - i_area;

        if u_area <= 0.0 {
            0.0
        } else {
            i_area / u_area
        }
    }

    /// Frame-relative center in [-1, 1] per axis, origin at frame center.
    pub fn normalized_center(&self, frame_w: u32, frame_h: u32) -> (f32, f32) {
        let fw = frame_w as f32;
        let fh = frame_h as f32;

        (
            ((self.x - fw / 2.0) / (fw / 2.0)).clamp(-1.0, 1.0),
            ((self.y - fh / 2.0) / (fh / 2.0)).clamp(-1.0, 1.0),
        )
    }

    /// Edge the box touches or crosses, if any. Ties resolve in
    /// left, right, top, bottom order.
    pub fn exit_edge(&self, frame_w: u32, frame_h: u32) -> Option<Edge> {
        if self.xmin() <= 0.0 {
            Some(Edge::Left)
        } else if self.xmax() >= frame_w as f32 {
            Some(Edge::Right)
        } else if self.ymin() <= 0.0 {
            Some(Edge::Top)
        } else if self.ymax() >= frame_h as f32 {
            Some(Edge::Bottom)
        } else {
            None
        }
    }

    /// True when any side of the box lies within `margin` pixels of an edge
    /// (still fully inside the frame).
    pub fn near_boundary(&self, frame_w: u32, frame_h: u32, margin: f32) -> bool {
        self.exit_edge(frame_w, frame_h).is_none()
            && (self.xmin() < margin
                || self.ymin() < margin
                || self.xmax() > frame_w as f32 - margin
                || self.ymax() > frame_h as f32 - margin)
    }

    /// Clamp the center so the box stays inside the frame where possible.
    pub fn clamped(&self, frame_w: u32, frame_h: u32) -> Self {
        let fw = frame_w as f32;
        let fh = frame_h as f32;
        let w = self.w.min(fw);
        let h = self.h.min(fh);

        Self {
            x: self.x.clamp(w / 2.0, fw - w / 2.0),
            y: self.y.clamp(h / 2.0, fh - h / 2.0),
            w,
            h,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn iou_identity_and_disjoint() {
        let a = Rect::new(50.0, 50.0, 20.0, 20.0);
        assert_abs_diff_eq!(a.iou(&a), 1.0, epsilon = 1e-6);

        let b = Rect::new(500.0, 500.0, 20.0, 20.0);
        assert_abs_diff_eq!(a.iou(&b), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn iou_half_overlap() {
        let a = Rect::new(50.0, 50.0, 20.0, 20.0);
        let b = Rect::new(60.0, 50.0, 20.0, 20.0);
        // Intersection 10x20 = 200, union 800 - 200 = 600.
        assert_abs_diff_eq!(a.iou(&b), 200.0 / 600.0, epsilon = 1e-5);
    }

    #[test]
    fn normalized_center_range() {
        let r = Rect::new(320.0, 240.0, 50.0, 50.0);
        let (nx, ny) = r.normalized_center(640, 480);
        assert_abs_diff_eq!(nx, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(ny, 0.0, epsilon = 1e-6);

        let r = Rect::new(640.0, 0.0, 10.0, 10.0);
        let (nx, ny) = r.normalized_center(640, 480);
        assert_abs_diff_eq!(nx, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(ny, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn exit_and_boundary() {
        let inside = Rect::new(320.0, 240.0, 50.0, 50.0);
        assert_eq!(inside.exit_edge(640, 480), None);
        assert!(!inside.near_boundary(640, 480, 20.0));

        let near = Rect::new(30.0, 240.0, 50.0, 50.0);
        assert_eq!(near.exit_edge(640, 480), None);
        assert!(near.near_boundary(640, 480, 20.0));

        let out = Rect::new(10.0, 240.0, 50.0, 50.0);
        assert_eq!(out.exit_edge(640, 480), Some(Edge::Left));
    }

    #[test]
    fn ltwh_round_trip() {
        let r = Rect::from_ltwh(100, 100, 50, 50);
        assert_eq!(r.ltwh(), [100, 100, 50, 50]);
        assert_abs_diff_eq!(r.x, 125.0, epsilon = 1e-6);
    }
}
