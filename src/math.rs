use num_traits::Float;

/// Gaussian falloff: 1.0 at x = 0, decaying with scale `c`.
pub fn gauss<F: Float>(x: F, c: F) -> F {
    let two = F::from(2.0).unwrap();
    (-((x * x) / (two * c * c))).exp()
}

#[inline]
pub fn clamp01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

/// Single-pole exponential smoothing: alpha is the weight of the new sample.
#[inline]
pub fn ema(prev: f32, next: f32, alpha: f32) -> f32 {
    prev * (1.0 - alpha) + next * alpha
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn gauss_peaks_at_zero() {
        assert_abs_diff_eq!(gauss(0.0f32, 5.0), 1.0, epsilon = 1e-6);
        assert!(gauss(10.0f32, 5.0) < gauss(5.0f32, 5.0));
        assert!(gauss(100.0f32, 5.0) < 1e-3);
    }

    #[test]
    fn clamp01_bounds() {
        assert_eq!(clamp01(-3.0), 0.0);
        assert_eq!(clamp01(7.5), 1.0);
        assert_eq!(clamp01(0.25), 0.25);
    }

    #[test]
    fn ema_blends() {
        assert_abs_diff_eq!(ema(0.0, 1.0, 0.3), 0.3, epsilon = 1e-6);
        assert_abs_diff_eq!(ema(1.0, 1.0, 0.3), 1.0, epsilon = 1e-6);
    }
}
