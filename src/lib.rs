//! Visual target tracking and re-acquisition.
//!
//! Two entry points, one per regime:
//!
//! * [`SingleTracker`] follows one designated target through a frame stream:
//!   a swappable correlation primitive wrapped in confidence fusion,
//!   validation gates, loss detection and autonomous redetection.
//! * [`Scene`] associates external per-frame detections into persistent
//!   multi-object tracks with confirm/lost lifecycle and appearance
//!   re-identification.
//!
//! Both emit validated [`OutputRecord`]s suitable for downstream guidance
//! consumers.

pub mod appearance;
pub mod bbox;
pub mod config;
pub mod detection;
pub mod detector;
pub mod error;
pub mod estimator;
pub mod frame;
pub mod math;
pub mod motion;
pub mod output;
pub mod redetect;
pub mod scene;
pub mod template;
pub mod track;
pub mod tracker;

mod ring;

pub use bbox::{Edge, Rect};
pub use config::{SceneConfig, TrackerConfig};
pub use detection::Detection;
pub use detector::{Detector, ReplayDetector};
pub use error::Error;
pub use frame::Frame;
pub use output::{FailureInfo, LossReason, Modality, OutputRecord};
pub use scene::Scene;
pub use track::{Track, TrackPhase};
pub use tracker::{NccPrimitive, PrimitiveResult, SingleTracker, TrackState, TrackerPrimitive};
