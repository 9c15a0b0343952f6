//! Upstream detection sources.
//!
//! The association engine only needs a per-frame list of candidate boxes;
//! [`Detector`] is the seam behind which a neural detector, a simulator, or
//! a recorded session can sit.

use crate::detection::Detection;
use crate::error::Error;
use crate::frame::Frame;

pub trait Detector {
    fn detect(&mut self, frame: &Frame<'_>) -> Result<Vec<Detection>, Error>;
}

/// Replays a pre-recorded detection sequence, one list per frame. Frames
/// past the end of the recording yield empty lists.
pub struct ReplayDetector {
    frames: Vec<Vec<Detection>>,
    cursor: usize,
}

impl ReplayDetector {
    pub fn new(frames: Vec<Vec<Detection>>) -> Self {
        Self { frames, cursor: 0 }
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.frames.len().saturating_sub(self.cursor)
    }
}

impl Detector for ReplayDetector {
    fn detect(&mut self, _frame: &Frame<'_>) -> Result<Vec<Detection>, Error> {
        let dets = self.frames.get(self.cursor).cloned().unwrap_or_default();
        self.cursor += 1;
        Ok(dets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::Rect;
    use crate::frame::CHANNELS;

    #[test]
    fn replay_yields_frames_in_order_then_empties() {
        let data = vec![0u8; 16 * 16 * CHANNELS];
        let frame = Frame::new(16, 16, 0.0, &data).unwrap();

        let mut det = ReplayDetector::new(vec![
            vec![Detection::new(Rect::new(4.0, 4.0, 2.0, 2.0), 0.8)],
            vec![],
        ]);

        assert_eq!(det.remaining(), 2);
        assert_eq!(det.detect(&frame).unwrap().len(), 1);
        assert_eq!(det.detect(&frame).unwrap().len(), 0);
        assert_eq!(det.detect(&frame).unwrap().len(), 0); // past the end
    }
}
