//! Minimal 3-vector arithmetic.
//!
//! Thin named wrappers over nalgebra so the geometry code reads the same way
//! the algorithms are written down. `normalize` is the only fallible one.

use nalgebra::Vector3;

use crate::{Error, Result};

#[inline]
pub fn add(a: &Vector3<f64>, b: &Vector3<f64>) -> Vector3<f64> {
    a + b
}

#[inline]
pub fn sub(a: &Vector3<f64>, b: &Vector3<f64>) -> Vector3<f64> {
    a - b
}

#[inline]
pub fn mult(a: &Vector3<f64>, scalar: f64) -> Vector3<f64> {
    a * scalar
}

#[inline]
pub fn div(a: &Vector3<f64>, scalar: f64) -> Vector3<f64> {
    a / scalar
}

#[inline]
pub fn dot(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    a.dot(b)
}

#[inline]
pub fn cross(a: &Vector3<f64>, b: &Vector3<f64>) -> Vector3<f64> {
    a.cross(b)
}

#[inline]
pub fn magnitude(a: &Vector3<f64>) -> f64 {
    a.norm()
}

/// Returns `a` scaled to unit length.
///
/// # Errors
/// [`Error::DivideByZero`] if the magnitude of `a` is at or below `f64::EPSILON`.
pub fn normalize(a: &Vector3<f64>) -> Result<Vector3<f64>> {
    let norm = magnitude(a);
    if norm <= f64::EPSILON {
        return Err(Error::DivideByZero);
    }
    Ok(a / norm)
}

#[inline]
pub fn elementwise_mult(a: &Vector3<f64>, b: &Vector3<f64>) -> Vector3<f64> {
    a.component_mul(b)
}

/// Component-wise division. Components of `b` equal to zero produce
/// infinities, the same as scalar division.
#[inline]
pub fn elementwise_div(a: &Vector3<f64>, b: &Vector3<f64>) -> Vector3<f64> {
    a.component_div(b)
}
