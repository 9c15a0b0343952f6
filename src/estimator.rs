//! Constant-acceleration Kalman filter over a 2D pixel position.
//!
//! State vector x = [px, py, vx, vy, ax, ay]ᵀ. Predict runs every frame;
//! update only when a trusted measurement exists, so predict-only stepping
//! keeps the velocity usable through detection gaps.

use nalgebra as na;

use crate::config::EstimatorConfig;

type StateVec = na::Vector6<f32>;
type StateCov = na::Matrix6<f32>;

#[derive(Debug, Clone)]
pub struct PositionEstimator {
    x: StateVec,
    p: StateCov,
    process_var: f32,
    measurement_var: f32,
}

impl PositionEstimator {
    pub fn new(cfg: &EstimatorConfig, pos: na::Point2<f32>) -> Self {
        let mut p = StateCov::zeros();
        p[(0, 0)] = cfg.init_pos_var;
        p[(1, 1)] = cfg.init_pos_var;
        p[(2, 2)] = cfg.init_vel_var;
        p[(3, 3)] = cfg.init_vel_var;
        p[(4, 4)] = cfg.init_vel_var;
        p[(5, 5)] = cfg.init_vel_var;

        Self {
            x: StateVec::new(pos.x, pos.y, 0.0, 0.0, 0.0, 0.0),
            p,
            process_var: cfg.process_var,
            measurement_var: cfg.measurement_var,
        }
    }

    fn transition(dt: f32) -> StateCov {
        let mut f = StateCov::identity();
        let half_dt2 = 0.5 * dt * dt;

        // px += vx·dt + ax·dt²/2, vx += ax·dt (same per axis)
        f[(0, 2)] = dt;
        f[(1, 3)] = dt;
        f[(0, 4)] = half_dt2;
        f[(1, 5)] = half_dt2;
        f[(2, 4)] = dt;
        f[(3, 5)] = dt;
        f
    }

    /// Discrete white-noise acceleration blocks per axis.
    fn process_noise(dt: f32, q: f32) -> StateCov {
        let dt2 = dt * dt;
        let dt3 = dt2 * dt;
        let dt4 = dt3 * dt;

        let mut qm = StateCov::zeros();
        for i in 0..2usize {
            qm[(i, i)] = q * dt4 / 4.0;
            qm[(i + 2, i + 2)] = q * dt2;
            qm[(i + 4, i + 4)] = q;
            qm[(i, i + 2)] = q * dt3 / 2.0;
            qm[(i + 2, i)] = q * dt3 / 2.0;
            qm[(i, i + 4)] = q * dt2 / 2.0;
            qm[(i + 4, i)] = q * dt2 / 2.0;
            qm[(i + 2, i + 4)] = q * dt;
            qm[(i + 4, i + 2)] = q * dt;
        }
        qm
    }

    /// Advance the state by `dt` seconds. Returns the predicted position.
    pub fn predict(&mut self, dt: f32) -> na::Point2<f32> {
        let dt = dt.max(0.0);
        let f = Self::transition(dt);

        self.x = f * self.x;
        self.p = f * self.p * f.transpose() + Self::process_noise(dt, self.process_var);

        self.position()
    }

    /// Fold in a trusted position measurement. Returns the corrected
    /// position; on a numerically degenerate innovation covariance the
    /// measurement is skipped and the prediction stands.
    pub fn update(&mut self, z: na::Point2<f32>) -> na::Point2<f32> {
        // H picks the position block; S = H·P·Hᵀ + R is then the position
        // covariance plus measurement noise.
        let s = na::Matrix2::new(
            self.p[(0, 0)] + self.measurement_var,
            self.p[(0, 1)],
            self.p[(1, 0)],
            self.p[(1, 1)] + self.measurement_var,
        );

        let s_inv = match s.try_inverse() {
            Some(inv) => inv,
            None => {
                log::warn!("singular innovation covariance, skipping update");
                return self.position();
            }
        };

        let ph_t = na::Matrix6x2::from_fn(|r, c| self.p[(r, c)]);
        let k = ph_t * s_inv;

        let innovation = na::Vector2::new(z.x - self.x[0], z.y - self.x[1]);
        self.x += k * innovation;

        // Joseph form keeps P symmetric positive semi-definite.
        let mut kh = StateCov::zeros();
        for r in 0..6 {
            for c in 0..2 {
                kh[(r, c)] = k[(r, c)];
            }
        }
        let i_kh = StateCov::identity() - kh;
        let krk = k * na::Matrix2::identity() * self.measurement_var * k.transpose();
        self.p = i_kh * self.p * i_kh.transpose() + krk;

        self.position()
    }

    #[inline]
    pub fn position(&self) -> na::Point2<f32> {
        na::Point2::new(self.x[0], self.x[1])
    }

    #[inline]
    pub fn velocity(&self) -> na::Vector2<f32> {
        na::Vector2::new(self.x[2], self.x[3])
    }

    /// One-sigma position uncertainty, averaged over the two axes. Drives
    /// redetection window sizing.
    #[inline]
    pub fn position_std(&self) -> f32 {
        ((self.p[(0, 0)] + self.p[(1, 1)]) / 2.0).max(0.0).sqrt()
    }
}
