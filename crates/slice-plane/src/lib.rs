//! Cutting-plane engine for interactive image-stack segmentation.
//!
//! A [`Plane`] is positioned through an axis-aligned box (the image stack).
//! Its cut is available as a [`CrossSection`] polygon with a centroid, and
//! annotated points are grouped by the [`PlaneAttitude`] under which they
//! were placed. Every user-facing change goes through an undo stack.
//!
//! Most hosts only need [`Session`]: forward mouse events together with a
//! [`interaction::Viewport`] and read back the state for rendering.
//!
//! Some items are building blocks for hosts and are not driven by a
//! [`Session`]: [`model::CurveModel`] for hosts that trace outlines through
//! their points, and [`geometric_median`] for a robust centre of a point set.

pub mod algorithms;
mod cross_section;
mod cuboid;
mod error;
pub mod interaction;
pub mod model;
mod plane;
mod session;
pub mod undo;
pub mod vectorops;

pub use algorithms::{
    bound_coordinates_to_box, bound_coordinates_to_cuboid, calculate_centroid, geometric_median,
    intersect_line_plane, polygon_centroid,
};
pub use cross_section::CrossSection;
pub use cuboid::Cuboid;
pub use error::{Error, Result};
pub use plane::{ListenerId, Plane, PlaneAttitude, ATTITUDE_PRECISION};
pub use session::{Orientation, SegmentationState, Session, SessionConfig};
