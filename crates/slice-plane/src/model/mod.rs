//! Annotated points grouped by the plane attitude they were placed under.
//!
//! - [`PointModel`]: owns every point and the attitude -> ids reverse index
//! - [`CurveModel`]: an ordered, optionally closed run of point ids
//! - [`Selection`]: the set of selected ids and the click/region pick rules

mod curve;
mod point;
mod selection;

pub use curve::CurveModel;
pub use point::{AnnotatedPoint, PointFactory, PointId, PointModel, SequentialIds};
pub use selection::{Selection, SelectionMode};
