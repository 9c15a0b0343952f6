//! Single-target tracker state machine.
//!
//! Wraps a correlation-style tracking primitive behind the
//! [`TrackerPrimitive`] capability trait and owns everything around it:
//! confidence fusion, EMA smoothing, validation gates with drift-protected
//! appearance updates, boundary handling, and redetection triggering.
//!
//! States: `Uninitialized → Tracking ⇄ Lost → Redetecting → Tracking`,
//! terminal `Stopped`. Loss of tracking is a normal state surfaced through
//! the output record, never an error.

use nalgebra as na;

use crate::appearance::AppearanceModel;
use crate::bbox::Rect;
use crate::config::TrackerConfig;
use crate::error::Error;
use crate::estimator::PositionEstimator;
use crate::frame::Frame;
use crate::math::{clamp01, ema, gauss};
use crate::motion::MotionPredictor;
use crate::output::{FailureInfo, LossReason, OutputRecord};
use crate::redetect::{RedetectMatch, Redetector};
use crate::template::Template;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    Uninitialized,
    Tracking,
    Lost,
    Redetecting,
    Stopped,
}

/// One frame's worth of output from the wrapped primitive.
#[derive(Debug, Clone, Copy)]
pub struct PrimitiveResult {
    pub rect: Rect,
    pub confidence: f32,
    pub valid: bool,
}

/// Capability interface for the wrapped tracking primitive. The state
/// machine never branches on a concrete backend, only on this interface.
pub trait TrackerPrimitive {
    fn start(&mut self, frame: &Frame<'_>, rect: Rect) -> Result<(), Error>;
    fn track(&mut self, frame: &Frame<'_>) -> PrimitiveResult;
}

/// Built-in correlation primitive: NCC template matching in a local
/// neighborhood of the previous box.
pub struct NccPrimitive {
    template: Option<Template>,
    last: Rect,
    min_score: f32,
}

impl NccPrimitive {
    pub fn new() -> Self {
        Self {
            template: None,
            last: Rect::new(0.0, 0.0, 0.0, 0.0),
            min_score: 0.3,
        }
    }
}

impl Default for NccPrimitive {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackerPrimitive for NccPrimitive {
    fn start(&mut self, frame: &Frame<'_>, rect: Rect) -> Result<(), Error> {
        self.template = Template::capture(frame, &rect);
        self.last = rect;
        Ok(())
    }

    fn track(&mut self, frame: &Frame<'_>) -> PrimitiveResult {
        let tpl = match &self.template {
            Some(tpl) => tpl,
            None => {
                return PrimitiveResult {
                    rect: self.last,
                    confidence: 0.0,
                    valid: false,
                }
            }
        };

        let radius = (self.last.w.max(self.last.h) * 0.5).max(4.0);
        let step = (self.last.w.min(self.last.h) / 8.0).max(2.0);

        let mut best_score = 0.0f32;
        let mut best_rect = self.last;

        let mut dy = -radius;
        while dy <= radius {
            let mut dx = -radius;
            while dx <= radius {
                let rect = Rect::new(self.last.x + dx, self.last.y + dy, self.last.w, self.last.h)
                    .clamped(frame.width, frame.height);
                let score = tpl.score(frame, &rect);
                if score > best_score {
                    best_score = score;
                    best_rect = rect;
                }
                dx += step;
            }
            dy += step;
        }

        let valid = best_score >= self.min_score;
        if valid {
            self.last = best_rect;
        }

        PrimitiveResult {
            rect: best_rect,
            confidence: best_score,
            valid,
        }
    }
}

pub struct SingleTracker {
    cfg: TrackerConfig,
    primitive: Box<dyn TrackerPrimitive>,
    state: TrackState,
    rect: Rect,
    confidence: f32,
    estimator: PositionEstimator,
    motion: MotionPredictor,
    appearance: AppearanceModel,
    redetector: Redetector,
    frames_since_start: u32,
    last_ts: f32,
    lost_at: f32,
    prev_area: f32,
    failure: Option<FailureInfo>,
    redetect_attempts: u32,
}

impl SingleTracker {
    pub fn new(cfg: TrackerConfig, primitive: Box<dyn TrackerPrimitive>) -> Result<Self, Error> {
        cfg.validate()?;

        let estimator = PositionEstimator::new(&cfg.estimator, na::Point2::new(0.0, 0.0));
        let motion = MotionPredictor::new(cfg.motion.clone());
        let appearance = AppearanceModel::new(&cfg.appearance);
        let redetector = Redetector::new(cfg.redetect.clone());

        Ok(Self {
            cfg,
            primitive,
            state: TrackState::Uninitialized,
            rect: Rect::new(0.0, 0.0, 0.0, 0.0),
            confidence: 0.0,
            estimator,
            motion,
            appearance,
            redetector,
            frames_since_start: 0,
            last_ts: 0.0,
            lost_at: 0.0,
            prev_area: 0.0,
            failure: None,
            redetect_attempts: 0,
        })
    }

    /// Tracker with the built-in NCC correlation primitive.
    pub fn with_ncc(cfg: TrackerConfig) -> Result<Self, Error> {
        Self::new(cfg, Box::new(NccPrimitive::new()))
    }

    /// Begin tracking the target inside `rect`.
    pub fn start(&mut self, frame: &Frame<'_>, rect: Rect) -> Result<(), Error> {
        if self.state == TrackState::Stopped {
            return Err(Error::Stopped);
        }

        let fw = frame.width as f32;
        let fh = frame.height as f32;
        if rect.w <= 0.0
            || rect.h <= 0.0
            || rect.xmax() <= 0.0
            || rect.ymax() <= 0.0
            || rect.xmin() >= fw
            || rect.ymin() >= fh
        {
            return Err(Error::BadInitRect);
        }

        self.primitive.start(frame, rect)?;

        self.estimator = PositionEstimator::new(&self.cfg.estimator, rect.center());
        self.motion.clear();
        self.motion.observe(frame.timestamp, rect);
        self.appearance = AppearanceModel::new(&self.cfg.appearance);
        self.appearance.update(frame, &rect);
        self.redetector.remember(frame, &rect);

        self.rect = rect;
        self.prev_area = rect.area();
        self.confidence = 1.0;
        self.frames_since_start = 0;
        self.last_ts = frame.timestamp;
        self.failure = None;
        self.redetect_attempts = 0;

        log::debug!("tracker started at {:?}", rect.ltwh());
        self.state = TrackState::Tracking;

        Ok(())
    }

    /// Terminal stop; the tracker cannot be restarted afterwards.
    pub fn stop(&mut self) {
        log::debug!("tracker stopped (state was {:?})", self.state);
        self.state = TrackState::Stopped;
    }

    #[inline]
    pub fn state(&self) -> TrackState {
        self.state
    }

    #[inline]
    pub fn rect(&self) -> Rect {
        self.rect
    }

    #[inline]
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    #[inline]
    pub fn failure_info(&self) -> Option<&FailureInfo> {
        self.failure.as_ref()
    }

    #[inline]
    pub fn appearance(&self) -> &AppearanceModel {
        &self.appearance
    }

    /// Process one frame. Exactly one call per frame; returns the validated
    /// output record for it.
    pub fn process(&mut self, frame: &Frame<'_>) -> Result<OutputRecord, Error> {
        match self.state {
            TrackState::Uninitialized => Err(Error::NotStarted),
            TrackState::Stopped => Err(Error::Stopped),
            TrackState::Tracking => self.step_tracking(frame),
            TrackState::Lost | TrackState::Redetecting => self.step_redetecting(frame),
        }
    }

    fn step_tracking(&mut self, frame: &Frame<'_>) -> Result<OutputRecord, Error> {
        let ts = frame.timestamp;
        let dt = (ts - self.last_ts).max(1e-3);
        let predicted = self.estimator.predict(dt);
        self.frames_since_start += 1;

        let res = self.primitive.track(frame);
        if !res.valid {
            self.enter_lost(LossReason::PrimitiveFailure, None, ts, predicted);
            self.last_ts = ts;
            return self.loss_record(ts);
        }

        let candidate = res.rect;
        let warming = self.frames_since_start <= self.cfg.gates.warmup_frames;

        // Validation gates; bypassed during warm-up so a track without
        // history is not falsely rejected.
        let motion_ok = !self.cfg.gates.motion_gate || warming || {
            let dev = na::distance(&candidate.center(), &predicted);
            dev <= self.cfg.gates.motion_max_diag_fraction * frame.diag()
        };

        let scale_ok = !self.cfg.gates.scale_gate || warming || {
            (candidate.area() - self.prev_area).abs()
                <= self.cfg.gates.scale_max_ratio * self.prev_area.max(1.0)
        };

        let motion_score = self.motion_score(&candidate, dt);
        let appearance_score = self
            .appearance
            .describe(frame, &candidate)
            .map_or(0.0, |d| self.appearance.similarity(&d));

        let mut fused = clamp01(
            self.cfg.motion_weight * motion_score
                + self.cfg.appearance_weight * appearance_score,
        );

        // Correlation primitives degrade near edges before they actually
        // lose the target, so the boundary zone is a penalty, not a loss.
        if candidate.near_boundary(frame.width, frame.height, self.cfg.boundary_margin) {
            fused *= self.cfg.boundary_penalty;
        }

        self.confidence = clamp01(ema(self.confidence, fused, self.cfg.smoothing_alpha));

        if let Some(edge) = candidate.exit_edge(frame.width, frame.height) {
            self.rect = candidate;
            self.enter_lost(LossReason::OutOfFrame, Some(edge), ts, predicted);
            self.last_ts = ts;
            return self.loss_record(ts);
        }

        if motion_ok && scale_ok {
            self.estimator.update(candidate.center());
            self.motion.observe(ts, candidate);
            self.rect = candidate;
            self.prev_area = candidate.area();
        } else {
            // Measurement rejection: discard the candidate, advance by
            // prediction only. Not a loss and not an error.
            log::debug!(
                "candidate rejected (motion_ok={}, scale_ok={}), advancing by prediction",
                motion_ok,
                scale_ok
            );
            self.rect = self
                .rect
                .centered_at(predicted)
                .clamped(frame.width, frame.height);
        }

        // Drift protection: the appearance reference (and the recovery
        // template) update only when confidence AND motion gate AND scale
        // gate pass together.
        let confidence_ok = fused >= self.cfg.appearance.accept_threshold;
        if confidence_ok && motion_ok && scale_ok {
            self.appearance.update(frame, &self.rect);
            self.redetector.remember(frame, &self.rect);
        }

        if !warming && self.confidence < self.cfg.loss_threshold {
            self.enter_lost(LossReason::LowConfidence, None, ts, predicted);
            self.last_ts = ts;
            return self.loss_record(ts);
        }

        self.last_ts = ts;
        self.tracking_record(ts, frame.width, frame.height)
    }

    fn step_redetecting(&mut self, frame: &Frame<'_>) -> Result<OutputRecord, Error> {
        let ts = frame.timestamp;
        let dt = (ts - self.last_ts).max(1e-3);
        let predicted = self.estimator.predict(dt);

        let frames_lost = if let Some(f) = self.failure.as_mut() {
            f.frames_lost += 1;
            f.predicted_rect = f.predicted_rect.centered_at(predicted);
            f.frames_lost
        } else {
            0
        };

        // Bounded full-rate attempts, then reduced-rate periodic retry
        // instead of terminating.
        let due = if self.redetect_attempts < self.cfg.redetect.max_attempts {
            true
        } else {
            frames_lost % self.cfg.redetect.retry_stride == 0
        };

        if due {
            self.redetect_attempts += 1;

            let elapsed = (ts - self.lost_at).max(0.0);
            let scale = 1.0
                + self.estimator.position_std() / self.rect.diag().max(1.0)
                + elapsed;

            if let Some(m) = self.redetector.search(frame, predicted, scale) {
                match self.reacquire(frame, &m) {
                    Ok(()) => {
                        self.last_ts = ts;
                        return self.tracking_record(ts, frame.width, frame.height);
                    }
                    Err(err) => {
                        log::warn!("re-acquisition failed to restart primitive: {}", err);
                    }
                }
            }
        }

        self.last_ts = ts;
        self.loss_record(ts)
    }

    fn reacquire(&mut self, frame: &Frame<'_>, m: &RedetectMatch) -> Result<(), Error> {
        self.primitive.start(frame, m.rect)?;

        // Velocity from before the occlusion is stale; restart the motion
        // state from the re-acquired position.
        self.estimator = PositionEstimator::new(&self.cfg.estimator, m.rect.center());
        self.motion.clear();
        self.motion.observe(frame.timestamp, m.rect);

        self.rect = m.rect;
        self.prev_area = m.rect.area();
        self.confidence = clamp01(m.score);
        self.frames_since_start = 0;
        self.failure = None;
        self.redetect_attempts = 0;

        log::debug!("redetecting -> tracking (score {:.2})", m.score);
        self.state = TrackState::Tracking;

        Ok(())
    }

    /// 1.0 while displacement stays inside the expected-velocity envelope,
    /// smooth gaussian falloff outside it.
    fn motion_score(&self, candidate: &Rect, dt: f32) -> f32 {
        let disp = na::distance(&candidate.center(), &self.rect.center());
        let speed = self.estimator.velocity().norm();
        let envelope = speed * dt + 0.5 * self.rect.diag().max(1.0);

        if disp <= envelope {
            1.0
        } else {
            gauss(disp - envelope, envelope.max(1.0))
        }
    }

    fn enter_lost(
        &mut self,
        reason: LossReason,
        exit_edge: Option<crate::bbox::Edge>,
        ts: f32,
        predicted: na::Point2<f32>,
    ) {
        log::debug!("tracking -> lost ({:?})", reason);
        self.state = TrackState::Lost;

        self.failure = Some(FailureInfo {
            reason,
            last_rect: self.rect,
            predicted_rect: self.rect.centered_at(predicted),
            exit_edge,
            frames_lost: 0,
            confidence_at_loss: self.confidence,
        });

        log::debug!("lost -> redetecting");
        self.state = TrackState::Redetecting;
        self.lost_at = ts;
        self.redetect_attempts = 0;
    }

    fn tracking_record(&self, ts: f32, fw: u32, fh: u32) -> Result<OutputRecord, Error> {
        let (nx, ny) = self.rect.normalized_center(fw, fh);
        let vel = self.motion.velocity().map(|v| [v.x, v.y]);

        OutputRecord::bounding_box(
            ts,
            self.rect.ltwh(),
            clamp01(self.confidence),
            Some([nx, ny]),
            vel,
        )
    }

    fn loss_record(&self, ts: f32) -> Result<OutputRecord, Error> {
        let failure = match &self.failure {
            Some(f) => f.clone(),
            None => {
                // Redetecting without failure info cannot happen through
                // the public transitions; synthesize a minimal one.
                FailureInfo {
                    reason: LossReason::LowConfidence,
                    last_rect: self.rect,
                    predicted_rect: self.rect,
                    exit_edge: None,
                    frames_lost: 0,
                    confidence_at_loss: self.confidence,
                }
            }
        };

        let predicted = self
            .motion
            .predict((ts - self.lost_at).max(0.0))
            .map(|p| p.rect)
            .unwrap_or(failure.predicted_rect);

        OutputRecord::not_tracking(ts, failure, Some(predicted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::CHANNELS;
    use std::collections::VecDeque;

    /// Scripted primitive: replays a queue of results, repeating the last.
    struct Scripted {
        results: VecDeque<PrimitiveResult>,
        last: Option<PrimitiveResult>,
    }

    impl Scripted {
        fn new(results: Vec<PrimitiveResult>) -> Self {
            Self {
                results: results.into(),
                last: None,
            }
        }
    }

    impl TrackerPrimitive for Scripted {
        fn start(&mut self, _frame: &Frame<'_>, _rect: Rect) -> Result<(), Error> {
            Ok(())
        }

        fn track(&mut self, _frame: &Frame<'_>) -> PrimitiveResult {
            if let Some(next) = self.results.pop_front() {
                self.last = Some(next);
            }
            self.last.unwrap_or(PrimitiveResult {
                rect: Rect::new(0.0, 0.0, 1.0, 1.0),
                confidence: 0.0,
                valid: false,
            })
        }
    }

    fn ok(rect: Rect) -> PrimitiveResult {
        PrimitiveResult {
            rect,
            confidence: 0.9,
            valid: true,
        }
    }

    fn fail() -> PrimitiveResult {
        PrimitiveResult {
            rect: Rect::new(0.0, 0.0, 1.0, 1.0),
            confidence: 0.0,
            valid: false,
        }
    }

    fn black_frame_data() -> Vec<u8> {
        vec![0u8; 640 * 480 * CHANNELS]
    }

    fn tracker_with(results: Vec<PrimitiveResult>, cfg: TrackerConfig) -> SingleTracker {
        SingleTracker::new(cfg, Box::new(Scripted::new(results))).unwrap()
    }

    #[test]
    fn invalid_config_is_fatal_at_construction() {
        let cfg = TrackerConfig {
            motion_weight: -1.0,
            ..Default::default()
        };
        assert!(SingleTracker::new(cfg, Box::new(NccPrimitive::new())).is_err());
    }

    #[test]
    fn process_before_start_is_an_error() {
        let data = black_frame_data();
        let frame = Frame::new(640, 480, 0.0, &data).unwrap();
        let mut t = tracker_with(vec![], TrackerConfig::default());
        assert!(matches!(t.process(&frame).unwrap_err(), Error::NotStarted));
    }

    #[test]
    fn small_shift_keeps_tracking() {
        let data = black_frame_data();
        let f0 = Frame::new(640, 480, 0.0, &data).unwrap();
        let f1 = Frame::new(640, 480, 1.0 / 30.0, &data).unwrap();

        let shifted = Rect::from_ltwh(103, 101, 50, 50);
        let mut t = tracker_with(vec![ok(shifted)], TrackerConfig::default());

        t.start(&f0, Rect::from_ltwh(100, 100, 50, 50)).unwrap();
        let rec = t.process(&f1).unwrap();

        assert_eq!(t.state(), TrackState::Tracking);
        assert!(t.confidence() >= t.cfg.loss_threshold);
        assert_eq!(t.rect().ltwh(), [103, 101, 50, 50]);
        assert!(rec.tracking_active);
        assert_eq!(rec.bbox, Some([103, 101, 50, 50]));
    }

    #[test]
    fn primitive_failure_transitions_to_redetecting() {
        let data = black_frame_data();
        let f0 = Frame::new(640, 480, 0.0, &data).unwrap();
        let f1 = Frame::new(640, 480, 1.0 / 30.0, &data).unwrap();

        let mut t = tracker_with(vec![fail()], TrackerConfig::default());
        t.start(&f0, Rect::from_ltwh(100, 100, 50, 50)).unwrap();

        let rec = t.process(&f1).unwrap();

        assert_eq!(t.state(), TrackState::Redetecting);
        let info = t.failure_info().expect("failure info must be populated");
        assert_eq!(info.reason, LossReason::PrimitiveFailure);
        assert!(!rec.tracking_active);
        assert!(rec.failure_info.is_some());
    }

    #[test]
    fn motion_gate_rejects_jumps_after_warmup() {
        let data = black_frame_data();
        let f0 = Frame::new(640, 480, 0.0, &data).unwrap();

        let cfg = TrackerConfig {
            gates: crate::config::GateConfig {
                warmup_frames: 0,
                motion_max_diag_fraction: 0.05,
                ..Default::default()
            },
            ..Default::default()
        };

        // Jump of ~400 px on an 800 px diagonal, far past the 5% gate.
        let jump = Rect::from_ltwh(500, 300, 50, 50);
        let mut t = tracker_with(vec![ok(jump)], cfg);
        t.start(&f0, Rect::from_ltwh(100, 100, 50, 50)).unwrap();

        let f1 = Frame::new(640, 480, 1.0 / 30.0, &data).unwrap();
        t.process(&f1).unwrap();

        // Candidate discarded; the track advanced by prediction and stayed
        // near the start position.
        assert_eq!(t.state(), TrackState::Tracking);
        assert!((t.rect().x - 125.0).abs() < 10.0, "x = {}", t.rect().x);
    }

    #[test]
    fn appearance_update_is_a_three_way_and() {
        let data = black_frame_data();
        let f0 = Frame::new(640, 480, 0.0, &data).unwrap();

        let cfg = TrackerConfig {
            gates: crate::config::GateConfig {
                warmup_frames: 0,
                ..Default::default()
            },
            ..Default::default()
        };

        // Scale gate fails alone: same center, four times the area.
        let grown = Rect::new(125.0, 125.0, 100.0, 100.0);
        let mut t = tracker_with(vec![ok(grown)], cfg.clone());
        t.start(&f0, Rect::from_ltwh(100, 100, 50, 50)).unwrap();
        let bank_before = t.appearance().bank_len();

        let f1 = Frame::new(640, 480, 1.0 / 30.0, &data).unwrap();
        t.process(&f1).unwrap();
        assert_eq!(t.appearance().bank_len(), bank_before);

        // Motion gate fails alone: same size, far-away center.
        let jump = Rect::from_ltwh(500, 300, 50, 50);
        let mut t = tracker_with(vec![ok(jump)], cfg.clone());
        t.start(&f0, Rect::from_ltwh(100, 100, 50, 50)).unwrap();
        let bank_before = t.appearance().bank_len();
        t.process(&f1).unwrap();
        assert_eq!(t.appearance().bank_len(), bank_before);

        // All pass: the bank grows.
        let near = Rect::from_ltwh(102, 100, 50, 50);
        let mut t = tracker_with(vec![ok(near)], cfg);
        t.start(&f0, Rect::from_ltwh(100, 100, 50, 50)).unwrap();
        let bank_before = t.appearance().bank_len();
        t.process(&f1).unwrap();
        assert_eq!(t.appearance().bank_len(), bank_before + 1);
    }

    #[test]
    fn confidence_stays_in_unit_interval() {
        let data = black_frame_data();
        let f0 = Frame::new(640, 480, 0.0, &data).unwrap();
        let mut t = tracker_with(
            (0..40)
                .map(|i| ok(Rect::from_ltwh(100 + i, 100, 50, 50)))
                .collect(),
            TrackerConfig::default(),
        );
        t.start(&f0, Rect::from_ltwh(100, 100, 50, 50)).unwrap();

        for i in 1..=40 {
            let f = Frame::new(640, 480, i as f32 / 30.0, &data).unwrap();
            t.process(&f).unwrap();
            assert!((0.0..=1.0).contains(&t.confidence()));
        }
    }

    #[test]
    fn out_of_frame_exit_reports_edge() {
        let data = black_frame_data();
        let f0 = Frame::new(640, 480, 0.0, &data).unwrap();

        // Candidate crosses the left edge.
        let exiting = Rect::new(10.0, 240.0, 50.0, 50.0);
        let mut t = tracker_with(vec![ok(exiting)], TrackerConfig::default());
        t.start(&f0, Rect::new(40.0, 240.0, 50.0, 50.0)).unwrap();

        let f1 = Frame::new(640, 480, 1.0 / 30.0, &data).unwrap();
        let rec = t.process(&f1).unwrap();

        assert_eq!(t.state(), TrackState::Redetecting);
        let info = t.failure_info().unwrap();
        assert_eq!(info.reason, LossReason::OutOfFrame);
        assert_eq!(info.exit_edge, Some(crate::bbox::Edge::Left));
        assert!(!rec.tracking_active);
    }

    #[test]
    fn stop_is_terminal() {
        let data = black_frame_data();
        let f0 = Frame::new(640, 480, 0.0, &data).unwrap();
        let mut t = tracker_with(vec![], TrackerConfig::default());
        t.start(&f0, Rect::from_ltwh(100, 100, 50, 50)).unwrap();

        t.stop();
        assert_eq!(t.state(), TrackState::Stopped);
        assert!(matches!(t.process(&f0).unwrap_err(), Error::Stopped));
        assert!(matches!(
            t.start(&f0, Rect::from_ltwh(100, 100, 50, 50)).unwrap_err(),
            Error::Stopped
        ));
    }

    #[test]
    fn ncc_primitive_follows_moving_square() {
        // White square drifting right on a dark background.
        fn square(data: &mut [u8], sx: usize, sy: usize) {
            for y in sy..sy + 30 {
                for x in sx..sx + 30 {
                    let off = (y * 320 + x) * CHANNELS;
                    data[off] = 240;
                    data[off + 1] = 240;
                    data[off + 2] = 240;
                }
            }
        }

        let mut d0 = vec![15u8; 320 * 240 * CHANNELS];
        square(&mut d0, 100, 100);
        let f0 = Frame::new(320, 240, 0.0, &d0).unwrap();

        let mut prim = NccPrimitive::new();
        prim.start(&f0, Rect::new(115.0, 115.0, 40.0, 40.0)).unwrap();

        let mut d1 = vec![15u8; 320 * 240 * CHANNELS];
        square(&mut d1, 106, 100);
        let f1 = Frame::new(320, 240, 1.0 / 30.0, &d1).unwrap();

        let res = prim.track(&f1);
        assert!(res.valid);
        assert!((res.rect.x - 121.0).abs() < 6.0, "x = {}", res.rect.x);
    }
}
