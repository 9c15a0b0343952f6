//! Multi-object association engine.
//!
//! Per frame: predict all tracks forward, associate detections in two
//! cascade passes (confirmed tracks first, then tentative ones), attempt
//! appearance re-identification of lost tracks against what is left, spawn
//! new tracks from the remainder, and age out everything unmatched.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use munkres::{solve_assignment, WeightMatrix};
use nalgebra as na;

use crate::appearance::{self, AppearanceModel, Descriptor};
use crate::bbox::Rect;
use crate::config::SceneConfig;
use crate::detection::Detection;
use crate::error::Error;
use crate::estimator::PositionEstimator;
use crate::frame::Frame;
use crate::motion::MotionPredictor;
use crate::output::OutputRecord;
use crate::track::{Track, TrackPhase};

static SEQ_ID: AtomicU32 = AtomicU32::new(1);

/// Cost assigned to padding cells of the (square) assignment matrix. Must
/// dominate any real association cost.
const PAD_COST: f32 = 100_000.0;

/// Tie-break weight favoring higher-confidence detections between
/// otherwise equal-cost assignments. Small enough to never flip a
/// materially different pair.
const CONFIDENCE_TIEBREAK: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    New { age: u32 },
    Confirmed,
    Lost { frames: u32 },
}

struct SceneTrack {
    id: u32,
    rect: Rect,
    confidence: f32,
    status: Status,
    estimator: PositionEstimator,
    motion: MotionPredictor,
    appearance: AppearanceModel,
    class_votes: HashMap<i32, u32>,
    misses: u32,
    created_at: f32,
    updated_at: f32,
}

impl SceneTrack {
    fn new(cfg: &SceneConfig, det: &Detection, desc: Option<Descriptor>, ts: f32) -> Self {
        let mut appearance = AppearanceModel::new(&cfg.appearance);
        if let Some(desc) = desc {
            appearance.push_descriptor(desc);
        }

        let mut motion = MotionPredictor::new(cfg.motion.clone());
        motion.observe(ts, det.rect);

        let mut track = Self {
            id: SEQ_ID.fetch_add(1, Ordering::Relaxed),
            rect: det.rect,
            confidence: det.confidence,
            status: Status::New { age: 0 },
            estimator: PositionEstimator::new(&cfg.estimator, det.rect.center()),
            motion,
            appearance,
            class_votes: HashMap::new(),
            misses: 0,
            created_at: ts,
            updated_at: ts,
        };
        track.vote(det.class);
        track
    }

    fn vote(&mut self, class: Option<i32>) {
        if let Some(c) = class {
            *self.class_votes.entry(c).or_insert(0) += 1;
        }
    }

    /// Majority class over all matched detections.
    fn class(&self) -> Option<i32> {
        self.class_votes
            .iter()
            .max_by_key(|(_, &n)| n)
            .map(|(&c, _)| c)
    }

    fn absorb(&mut self, cfg: &SceneConfig, det: &Detection, desc: Option<Descriptor>, ts: f32) {
        self.estimator.update(det.rect.center());
        self.motion.observe(ts, det.rect);
        if let Some(desc) = desc {
            self.appearance.push_descriptor(desc);
        }
        self.vote(det.class);

        self.rect = det.rect;
        self.confidence = det.confidence;
        self.misses = 0;
        self.updated_at = ts;

        self.status = match self.status {
            Status::New { age } if age + 1 >= cfg.confirm_frames => {
                log::debug!("track {} confirmed", self.id);
                Status::Confirmed
            }
            Status::New { age } => Status::New { age: age + 1 },
            Status::Confirmed => Status::Confirmed,
            Status::Lost { .. } => {
                log::debug!("track {} re-identified", self.id);
                Status::Confirmed
            }
        };
    }

    fn miss(&mut self) {
        self.misses += 1;
        self.status = match self.status {
            Status::New { age } => Status::New { age },
            Status::Confirmed => {
                log::debug!("track {} lost", self.id);
                Status::Lost { frames: 1 }
            }
            Status::Lost { frames } => Status::Lost { frames: frames + 1 },
        };
    }

    /// Pixel radius inside which a detection may re-identify this track.
    fn reid_radius(&self) -> f32 {
        self.rect.diag() + 3.0 * self.estimator.position_std()
    }
}

pub struct Scene {
    cfg: SceneConfig,
    tracks: Vec<SceneTrack>,
    last_ts: f32,
}

impl Scene {
    pub fn new(cfg: SceneConfig) -> Result<Self, Error> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            tracks: Vec::new(),
            last_ts: 0.0,
        })
    }

    #[inline]
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Process one frame's detections and return the visible tracks
    /// (confirmed and lost; tentative tracks stay internal).
    pub fn step(&mut self, frame: &Frame<'_>, detections: &[Detection]) -> Vec<Track> {
        let ts = frame.timestamp;
        let dt = (ts - self.last_ts).max(1e-3);
        self.last_ts = ts;

        let dets: Vec<&Detection> = detections
            .iter()
            .filter(|d| match d.validate() {
                Ok(()) => true,
                Err(err) => {
                    log::warn!("dropping malformed detection: {}", err);
                    false
                }
            })
            .collect();

        let descriptors: Vec<Option<Descriptor>> = dets
            .iter()
            .map(|d| appearance::extract(frame, &d.rect, self.cfg.appearance.bins))
            .collect();

        // Advance every track to this frame before association so costs
        // compare detections against predicted positions.
        for track in &mut self.tracks {
            let predicted = track.estimator.predict(dt);
            if !matches!(track.status, Status::New { .. }) || track.misses > 0 {
                track.rect = track.rect.centered_at(predicted);
            }
        }

        let mut matched_tracks = vec![false; self.tracks.len()];
        let mut matched_dets = vec![false; dets.len()];

        // Cascade: confirmed tracks get first claim, tentative tracks
        // compete only for what remains. Lost tracks go through appearance
        // re-identification below instead.
        let confirmed: Vec<usize> = (0..self.tracks.len())
            .filter(|&i| matches!(self.tracks[i].status, Status::Confirmed))
            .collect();
        self.associate(&confirmed, &dets, &descriptors, &mut matched_tracks, &mut matched_dets, ts);

        let tentative: Vec<usize> = (0..self.tracks.len())
            .filter(|&i| matches!(self.tracks[i].status, Status::New { .. }))
            .collect();
        self.associate(&tentative, &dets, &descriptors, &mut matched_tracks, &mut matched_dets, ts);

        self.reidentify(&dets, &descriptors, &mut matched_tracks, &mut matched_dets, ts);

        // Spawn from whatever survived unclaimed.
        for (di, det) in dets.iter().enumerate() {
            if !matched_dets[di] && det.confidence >= self.cfg.spawn_threshold {
                let track = SceneTrack::new(&self.cfg, det, descriptors[di].clone(), ts);
                log::debug!("track {} spawned at {:?}", track.id, det.rect.ltwh());
                self.tracks.push(track);
                matched_tracks.push(true);
            }
        }

        for (ti, track) in self.tracks.iter_mut().enumerate() {
            if !matched_tracks[ti] {
                track.miss();
            }
        }

        // Single deletion point per frame.
        let cfg = &self.cfg;
        self.tracks.retain(|t| match t.status {
            Status::New { .. } => t.misses <= cfg.tentative_miss_limit,
            Status::Confirmed => true,
            Status::Lost { frames } => {
                let keep = frames <= cfg.lost_buffer;
                if !keep {
                    log::debug!("track {} deleted after {} lost frames", t.id, frames);
                }
                keep
            }
        });

        self.snapshot(frame)
    }

    /// One munkres pass over the given track indices and all unclaimed
    /// detections.
    fn associate(
        &mut self,
        track_idx: &[usize],
        dets: &[&Detection],
        descriptors: &[Option<Descriptor>],
        matched_tracks: &mut [bool],
        matched_dets: &mut [bool],
        ts: f32,
    ) {
        let free_dets: Vec<usize> = (0..dets.len()).filter(|&d| !matched_dets[d]).collect();
        if track_idx.is_empty() || free_dets.is_empty() {
            return;
        }

        let n = track_idx.len().max(free_dets.len());

        let mut mat = WeightMatrix::from_fn(n, |(r, c)| {
            if r < track_idx.len() && c < free_dets.len() {
                let track = &self.tracks[track_idx[r]];
                let det = dets[free_dets[c]];
                self.cost(track, det, descriptors[free_dets[c]].as_ref())
            } else {
                PAD_COST
            }
        });

        let res = match solve_assignment(&mut mat) {
            Ok(res) => res,
            Err(err) => {
                log::warn!("assignment failed: {:?}", err);
                return;
            }
        };

        for pos in res {
            if pos.row >= track_idx.len() || pos.column >= free_dets.len() {
                continue;
            }

            let ti = track_idx[pos.row];
            let di = free_dets[pos.column];

            // The solver reduces the matrix in place, so the original cost
            // is recomputed for the acceptance check.
            let cost = self.cost(&self.tracks[ti], dets[di], descriptors[di].as_ref());
            if cost > self.cfg.cost_threshold {
                continue;
            }
            self.tracks[ti].absorb(&self.cfg, dets[di], descriptors[di].clone(), ts);
            matched_tracks[ti] = true;
            matched_dets[di] = true;
        }
    }

    /// Combined geometric and appearance cost, lower is better. The
    /// confidence term only breaks exact ties.
    fn cost(&self, track: &SceneTrack, det: &Detection, desc: Option<&Descriptor>) -> f32 {
        let iou_term = 1.0 - track.rect.iou(&det.rect);
        let app_term = desc.map_or(0.5, |d| 1.0 - track.appearance.similarity(d));

        self.cfg.iou_weight * iou_term
            + self.cfg.appearance_weight * app_term
            + CONFIDENCE_TIEBREAK * (1.0 - det.confidence)
    }

    /// Appearance re-identification of lost tracks against unclaimed
    /// detections, gated by a motion-derived radius.
    fn reidentify(
        &mut self,
        dets: &[&Detection],
        descriptors: &[Option<Descriptor>],
        matched_tracks: &mut [bool],
        matched_dets: &mut [bool],
        ts: f32,
    ) {
        for ti in 0..self.tracks.len() {
            if !matches!(self.tracks[ti].status, Status::Lost { .. }) || matched_tracks[ti] {
                continue;
            }

            let radius = self.tracks[ti].reid_radius();
            let center = self.tracks[ti].rect.center();

            let candidates: Vec<(usize, Descriptor)> = (0..dets.len())
                .filter(|&di| {
                    !matched_dets[di]
                        && na::distance(&dets[di].rect.center(), &center) <= radius
                })
                .filter_map(|di| descriptors[di].clone().map(|d| (di, d)))
                .collect();

            let descs: Vec<Descriptor> = candidates.iter().map(|(_, d)| d.clone()).collect();
            let best = self.tracks[ti].appearance.best_match(&descs);

            if let Some((idx, score)) = best {
                if score >= self.cfg.reid_threshold {
                    let di = candidates[idx].0;
                    self.tracks[ti].absorb(&self.cfg, dets[di], descriptors[di].clone(), ts);
                    matched_tracks[ti] = true;
                    matched_dets[di] = true;
                }
            }
        }
    }

    /// [`step`](Self::step) followed by packaging into a multi-target
    /// output record.
    pub fn step_record(
        &mut self,
        frame: &Frame<'_>,
        detections: &[Detection],
    ) -> Result<OutputRecord, Error> {
        let tracks = self.step(frame, detections);
        OutputRecord::multi_target(frame.timestamp, tracks)
    }

    fn snapshot(&self, frame: &Frame<'_>) -> Vec<Track> {
        self.tracks
            .iter()
            .filter_map(|t| {
                let (phase, confidence, rect) = match t.status {
                    Status::New { .. } => return None,
                    Status::Confirmed => (TrackPhase::Confirmed, t.confidence, t.rect),
                    Status::Lost { .. } => {
                        // Coasting confidence decays with time since the
                        // last real observation, not a nominal frame rate.
                        let elapsed = (frame.timestamp - t.updated_at).max(0.0);
                        let (rect, decayed) = t
                            .motion
                            .predict(elapsed)
                            .map_or((t.rect, 0.0), |p| (p.rect, p.confidence));
                        (TrackPhase::Lost, decayed, rect)
                    }
                };

                Some(Track {
                    id: t.id,
                    rect,
                    center_norm: rect.normalized_center(frame.width, frame.height),
                    confidence,
                    phase,
                    velocity: t.motion.velocity().map(|v| (v.x, v.y)),
                    class: t.class(),
                    misses: t.misses,
                    created_at: t.created_at,
                    updated_at: t.updated_at,
                })
            })
            .collect()
    }
}
