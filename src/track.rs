use serde_derive::{Deserialize, Serialize};

use crate::bbox::Rect;

/// Lifecycle phase of a multi-object track as visible to consumers.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrackPhase {
    New,
    Confirmed,
    Lost,
}

/// One persistent target as reported by the association engine.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Track {
    pub id: u32,
    pub rect: Rect,
    /// Frame-relative center, [-1, 1] per axis, origin at frame center.
    pub center_norm: (f32, f32),
    pub confidence: f32,
    pub phase: TrackPhase,
    /// (x, y) in px/s.
    pub velocity: Option<(f32, f32)>,
    pub class: Option<i32>,
    /// Consecutive frames without a matched detection.
    pub misses: u32,
    pub created_at: f32,
    pub updated_at: f32,
}
