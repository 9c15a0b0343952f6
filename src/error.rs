use thiserror::Error;

use crate::output::Modality;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("frame buffer is {actual} bytes, expected {expected} for {width}x{height}")]
    FrameSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("detection has invalid geometry: {0}")]
    BadDetection(String),

    #[error("initial rectangle lies outside the frame")]
    BadInitRect,

    #[error("tracker has not been started")]
    NotStarted,

    #[error("tracker has been stopped")]
    Stopped,

    #[error("missing required field `{field}` for modality `{modality:?}`")]
    MissingField {
        modality: Modality,
        field: &'static str,
    },

    #[error("field `{field}` out of range: {value}")]
    OutOfRange { field: &'static str, value: f32 },

    #[error("position_3d does not project onto position_2d")]
    InconsistentProjection,

    #[error("field `{field}` is not allowed for modality `{modality:?}`")]
    UnexpectedField {
        modality: Modality,
        field: &'static str,
    },
}
