//! Error types for the plane engine.

use thiserror::Error;

use crate::model::PointId;

/// Result type for plane engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the plane engine.
///
/// Degenerate geometry that is expected during interaction (a ray parallel to
/// the plane, a plane that misses the box) is not an error: those paths return
/// `None`. The variants here are either invalid input to a strict numerical
/// routine or a caller bug that must not be swallowed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A vector with (near) zero magnitude was normalized.
    #[error("cannot normalize a vector of zero magnitude")]
    DivideByZero,

    /// A polygon was requested from fewer than three points.
    #[error("polygon needs at least 3 points, got {count}")]
    TooFewPoints { count: usize },

    /// The points are collinear or enclose (near) zero area.
    #[error("points do not span a polygon of non-zero area")]
    DegeneratePolygon,

    /// The point id is not known to the point model.
    #[error("no point with id {0}")]
    KeyNotFound(PointId),

    /// The point id is already present in the point model.
    #[error("point id {0} is already in use")]
    DuplicatePoint(PointId),

    /// The point factory has no ids left to hand out.
    #[error("point ids are exhausted")]
    IdsExhausted,

    /// A scale component is zero, negative or not finite.
    #[error("scale components must be finite and positive")]
    InvalidScale,

    /// `end_macro` was called without a matching `begin_macro`.
    #[error("end_macro called with no open macro")]
    UnbalancedMacro,

    /// History was navigated while a macro was still being recorded.
    #[error("macro '{label}' is still open")]
    MacroOpen { label: String },
}
