//! Scene validation errors.
//!
//! Programmer errors inside the step pipeline are assertions; only scene
//! construction and snapshot loading report errors to the caller.

use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub enum SceneError {
    /// A ball radius was not strictly positive.
    InvalidRadius { ball: usize, radius: f64 },
    /// A ball mass was not strictly positive.
    InvalidMass { ball: usize, mass: f64 },
    /// A plane normal could not be normalized.
    ZeroLengthNormal { context: &'static str },
    /// Per-ball arrays have different lengths.
    LengthMismatch { expected: usize, found: usize, field: &'static str },
    /// The two planes of a portal are not parallel and facing each other.
    InvalidPortal { portal: usize, reason: &'static str },
    /// A drum with a non-positive radius.
    InvalidDrum { drum: usize, radius: f64 },
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRadius { ball, radius } => {
                write!(f, "ball {ball} has invalid radius {radius}")
            }
            Self::InvalidMass { ball, mass } => write!(f, "ball {ball} has invalid mass {mass}"),
            Self::ZeroLengthNormal { context } => write!(f, "zero-length normal in {context}"),
            Self::LengthMismatch {
                expected,
                found,
                field,
            } => write!(f, "expected {expected} entries for {field}, found {found}"),
            Self::InvalidPortal { portal, reason } => write!(f, "portal {portal}: {reason}"),
            Self::InvalidDrum { drum, radius } => {
                write!(f, "drum {drum} has invalid radius {radius}")
            }
        }
    }
}

impl std::error::Error for SceneError {}
