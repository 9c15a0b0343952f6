//! Appearance descriptors and the per-track feature bank.
//!
//! A descriptor is a per-channel color histogram over a box region,
//! L2-normalized so cosine similarity reduces to a dot product. The bank is
//! a bounded ring; scoring is read-only so cross-track re-identification can
//! borrow another track's model without being able to mutate it.

use ndarray::Array1;

use crate::bbox::Rect;
use crate::config::AppearanceConfig;
use crate::frame::Frame;
use crate::math::clamp01;
use crate::ring::Ring;

pub type Descriptor = Array1<f32>;

/// Histogram descriptor of the region, or `None` when the region does not
/// overlap the frame.
pub fn extract(frame: &Frame<'_>, rect: &Rect, bins: usize) -> Option<Descriptor> {
    let x0 = rect.xmin().max(0.0) as i32;
    let x1 = (rect.xmax().min(frame.width as f32) as i32).max(x0);
    let y0 = rect.ymin().max(0.0) as i32;
    let y1 = (rect.ymax().min(frame.height as f32) as i32).max(y0);

    if x1 <= x0 || y1 <= y0 {
        return None;
    }

    let mut hist = Array1::<f32>::zeros(bins * 3);
    let bin_width = 256.0 / bins as f32;

    // Subsample large regions; a coarse histogram does not need every pixel.
    let step = (((x1 - x0).max(y1 - y0) / 64) as i32).max(1);

    for y in (y0..y1).step_by(step as usize) {
        for x in (x0..x1).step_by(step as usize) {
            let px = frame.pixel(x, y);
            for (ch, &v) in px.iter().enumerate() {
                let bin = ((v as f32 / bin_width) as usize).min(bins - 1);
                hist[ch * bins + bin] += 1.0;
            }
        }
    }

    let norm = hist.dot(&hist).sqrt();
    if norm <= 0.0 {
        return None;
    }

    Some(hist / norm)
}

/// Cosine similarity of two normalized descriptors, clamped to [0, 1].
pub fn cosine(a: &Descriptor, b: &Descriptor) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    clamp01(a.dot(b))
}

#[derive(Debug, Clone)]
pub struct AppearanceModel {
    bins: usize,
    accept_threshold: f32,
    bank: Ring<Descriptor>,
}

impl AppearanceModel {
    pub fn new(cfg: &AppearanceConfig) -> Self {
        Self {
            bins: cfg.bins,
            accept_threshold: cfg.accept_threshold,
            bank: Ring::with_capacity(cfg.bank_size),
        }
    }

    /// Extract a descriptor from the region and append it to the bank.
    /// Returns false when the region yields no descriptor.
    pub fn update(&mut self, frame: &Frame<'_>, rect: &Rect) -> bool {
        match extract(frame, rect, self.bins) {
            Some(desc) => {
                self.bank.push(desc);
                true
            }
            None => false,
        }
    }

    pub fn push_descriptor(&mut self, desc: Descriptor) {
        self.bank.push(desc);
    }

    pub fn describe(&self, frame: &Frame<'_>, rect: &Rect) -> Option<Descriptor> {
        extract(frame, rect, self.bins)
    }

    /// Best similarity of `desc` against the bank; 1.0 when the bank is
    /// still empty so fusion stays neutral right after a (re)start.
    pub fn similarity(&self, desc: &Descriptor) -> f32 {
        if self.bank.is_empty() {
            return 1.0;
        }

        self.bank
            .iter()
            .map(|d| cosine(d, desc))
            .fold(0.0f32, f32::max)
    }

    /// Candidate with the highest bank similarity, if it clears the
    /// acceptance threshold. Read-only: re-identification never mutates the
    /// bank it scores against.
    pub fn best_match(&self, candidates: &[Descriptor]) -> Option<(usize, f32)> {
        if self.bank.is_empty() {
            return None;
        }

        candidates
            .iter()
            .enumerate()
            .map(|(i, d)| (i, self.similarity(d)))
            .filter(|&(_, s)| s >= self.accept_threshold)
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }

    #[inline]
    pub fn bank_len(&self) -> usize {
        self.bank.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::CHANNELS;

    fn solid_frame(w: u32, h: u32, rgb: [u8; 3]) -> Vec<u8> {
        let mut data = vec![0u8; w as usize * h as usize * CHANNELS];
        for px in data.chunks_exact_mut(CHANNELS) {
            px.copy_from_slice(&rgb);
        }
        data
    }

    #[test]
    fn descriptor_is_normalized() {
        let data = solid_frame(32, 32, [200, 30, 90]);
        let frame = Frame::new(32, 32, 0.0, &data).unwrap();
        let desc = extract(&frame, &Rect::new(16.0, 16.0, 20.0, 20.0), 16).unwrap();

        let norm = desc.dot(&desc).sqrt();
        approx::assert_abs_diff_eq!(norm, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn similar_regions_score_high_dissimilar_low() {
        let red = solid_frame(32, 32, [220, 10, 10]);
        let blue = solid_frame(32, 32, [10, 10, 220]);
        let f_red = Frame::new(32, 32, 0.0, &red).unwrap();
        let f_blue = Frame::new(32, 32, 0.0, &blue).unwrap();

        let rect = Rect::new(16.0, 16.0, 24.0, 24.0);
        let mut model = AppearanceModel::new(&AppearanceConfig::default());
        assert!(model.update(&f_red, &rect));

        let same = model.describe(&f_red, &rect).unwrap();
        let other = model.describe(&f_blue, &rect).unwrap();

        assert!(model.similarity(&same) > 0.99);
        assert!(model.similarity(&other) < 0.5);
    }

    #[test]
    fn similarity_always_in_unit_interval() {
        let data = solid_frame(16, 16, [255, 255, 255]);
        let frame = Frame::new(16, 16, 0.0, &data).unwrap();
        let rect = Rect::new(8.0, 8.0, 12.0, 12.0);

        let mut model = AppearanceModel::new(&AppearanceConfig::default());
        model.update(&frame, &rect);

        let desc = model.describe(&frame, &rect).unwrap();
        let s = model.similarity(&(desc * 1000.0));
        assert!((0.0..=1.0).contains(&s));
    }

    #[test]
    fn bank_evicts_oldest() {
        let cfg = AppearanceConfig {
            bank_size: 2,
            ..Default::default()
        };
        let data = solid_frame(16, 16, [100, 100, 100]);
        let frame = Frame::new(16, 16, 0.0, &data).unwrap();
        let rect = Rect::new(8.0, 8.0, 10.0, 10.0);

        let mut model = AppearanceModel::new(&cfg);
        for _ in 0..5 {
            model.update(&frame, &rect);
        }
        assert_eq!(model.bank_len(), 2);
    }

    #[test]
    fn best_match_respects_threshold() {
        let red = solid_frame(32, 32, [220, 10, 10]);
        let blue = solid_frame(32, 32, [10, 10, 220]);
        let f_red = Frame::new(32, 32, 0.0, &red).unwrap();
        let f_blue = Frame::new(32, 32, 0.0, &blue).unwrap();
        let rect = Rect::new(16.0, 16.0, 24.0, 24.0);

        let mut model = AppearanceModel::new(&AppearanceConfig::default());
        model.update(&f_red, &rect);

        let red_desc = model.describe(&f_red, &rect).unwrap();
        let blue_desc = model.describe(&f_blue, &rect).unwrap();

        let (idx, score) = model.best_match(&[blue_desc.clone(), red_desc]).unwrap();
        assert_eq!(idx, 1);
        assert!(score > 0.9);

        assert!(model.best_match(&[blue_desc]).is_none());
    }

    #[test]
    fn off_frame_region_yields_none() {
        let data = solid_frame(16, 16, [10, 10, 10]);
        let frame = Frame::new(16, 16, 0.0, &data).unwrap();
        assert!(extract(&frame, &Rect::new(-50.0, -50.0, 10.0, 10.0), 8).is_none());
    }
}
