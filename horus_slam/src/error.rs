//! Error kinds for the SLAM core.

use thiserror::Error;

/// Errors that can surface from geometry, mapping, planning, and transport.
#[derive(Error, Debug)]
pub enum SlamError {
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("map is empty")]
    MapEmpty,

    #[error("planner exhausted its node budget without reaching the goal")]
    PlanUnreachable,

    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed wire frame: {0}")]
    MalformedFrame(String),
}

/// Convenience alias used throughout the crate.
pub type SlamResult<T> = std::result::Result<T, SlamError>;
