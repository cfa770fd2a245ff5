use thiserror::Error;

/// Reasons a simulation refuses to start. None of these are fatal to the host:
/// the caller gets the error instead of a running simulation, and nothing has
/// been spawned.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimulationError {
    #[error("viewport {width}x{height} has no area; nothing to simulate")]
    EmptyViewport { width: f32, height: f32 },

    #[error("invalid simulation settings: {0}")]
    InvalidSettings(&'static str),
}

pub type Result<T> = std::result::Result<T, SimulationError>;
