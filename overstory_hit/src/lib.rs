// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overstory Hit: ray construction and per-shape intersection math.
//!
//! This crate is the geometric half of hit-testing. It knows nothing about
//! elements, touches, or frames; it answers one question: where does a ray
//! meet a shape, in the shape's own space?
//!
//! - [`Ray`]: world- or element-space ray, buildable from a normalized
//!   projective screen point and the frame's inverse matrices.
//! - [`ShapeKind`]: tagged shape descriptor — one variant per supported
//!   hit-test shape, carrying the per-shape parameters.
//! - [`intersect`]: the per-variant intersection function. Returns both the
//!   bounded hit and the persistent (bounds-ignored) hit that planar
//!   interactions use once a pointer slides off a finite shape.
//! - [`IntersectionPoint`]: the full per-pair intersection record the
//!   pipeline stores in its touch maps, identity-keyed by
//!   `(element_id, touch_id)`.
//!
//! ## Spaces
//!
//! Shapes are defined in *element space*: the unit rectangle/circle spans
//! `[-0.5, 0.5]`, the sphere has unit radius, the box is scaled by its
//! `size` parameter. Callers transform the world ray by an element's inverse
//! world matrix before intersecting, and map the results back out with the
//! forward matrix. *Surface space* is the shape's own 2D parameterization
//! (uv-like for planar shapes, polar for circular ones).

mod point;
mod ray;
mod shape;

pub mod intersect;

pub use intersect::{ElementRayHit, intersect};
pub use point::IntersectionPoint;
pub use ray::Ray;
pub use shape::{ShapeError, ShapeKind};
