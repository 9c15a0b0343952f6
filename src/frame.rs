use crate::bbox::Rect;
use crate::error::Error;

/// Interleaved RGB, one byte per channel.
pub const CHANNELS: usize = 3;

/// One decoded video frame: a borrowed pixel buffer, its dimensions and a
/// capture timestamp in seconds. Construction validates that the declared
/// dimensions match the buffer length; a mismatched frame is rejected before
/// it can touch any tracker state.
pub struct Frame<'a> {
    pub width: u32,
    pub height: u32,
    pub timestamp: f32, // in seconds
    data: &'a [u8],
}

impl<'a> Frame<'a> {
    pub fn new(width: u32, height: u32, timestamp: f32, data: &'a [u8]) -> Result<Self, Error> {
        let expected = width as usize * height as usize * CHANNELS;

        if data.len() != expected || width == 0 || height == 0 {
            return Err(Error::FrameSize {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            timestamp,
            data,
        })
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        self.data
    }

    #[inline]
    pub fn diag(&self) -> f32 {
        let w = self.width as f32;
        let h = self.height as f32;
        (w * w + h * h).sqrt()
    }

    /// Pixel at (x, y), clamped to the frame bounds.
    #[inline]
    pub fn pixel(&self, x: i32, y: i32) -> [u8; 3] {
        let x = x.clamp(0, self.width as i32 - 1) as usize;
        let y = y.clamp(0, self.height as i32 - 1) as usize;
        let off = (y * self.width as usize + x) * CHANNELS;

        [self.data[off], self.data[off + 1], self.data[off + 2]]
    }

    /// Luminance at (x, y) in [0, 255].
    #[inline]
    pub fn luma(&self, x: i32, y: i32) -> f32 {
        let [r, g, b] = self.pixel(x, y);
        0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
    }

    #[inline]
    pub fn contains(&self, rect: &Rect) -> bool {
        rect.xmin() >= 0.0
            && rect.ymin() >= 0.0
            && rect.xmax() <= self.width as f32
            && rect.ymax() <= self.height as f32
    }
}
