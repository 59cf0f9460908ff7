// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shape descriptors.

use core::fmt;

use glam::{Vec2, Vec3};
use thiserror::Error;

/// Errors from shape construction.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    /// A textual shape name did not resolve to any known shape kind.
    #[error("no shape registered for kind `{0}`")]
    UnknownShapeKind(String),
}

/// A tagged shape descriptor.
///
/// Each variant carries the parameters its hit test needs; see
/// [`intersect`](crate::intersect::intersect) for the per-variant
/// semantics. All shapes live in element space: planar shapes span
/// `[-0.5, 0.5]` in the z=0 plane, the sphere has unit radius, and the box
/// spans half its `size` in each direction.
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeKind {
    /// Never hits. Used for grouping elements and sub-context hosts.
    None,
    /// The unbounded z=0 plane of the element.
    InfinitePlane,
    /// Unit rectangle: plane hit gated by `|x| ≤ 0.5 ∧ |y| ≤ 0.5`.
    Rectangle,
    /// Unit circle: plane hit gated by `‖xy‖ < 0.5`; polar surface space.
    Circle,
    /// Annular sector of the unit circle.
    Segment {
        /// Inner radius as a fraction of the outer radius, in `[0, 1]`.
        hole_radius: f32,
        /// Covered fraction of the full turn, signed, magnitude ≤ 1.
        cycles: f32,
        /// Angular offset of the sector start, radians.
        phase: f32,
    },
    /// Planar polygon, even-odd rule. Fewer than 3 vertices never hits.
    Polygon {
        /// Vertices in element-space plane coordinates.
        vertices: Vec<Vec2>,
    },
    /// Axis-aligned box centered on the origin.
    Box3 {
        /// Full extent per axis.
        size: Vec3,
    },
    /// Unit sphere centered on the origin.
    Sphere,
}

impl Default for ShapeKind {
    fn default() -> Self {
        Self::Rectangle
    }
}

impl ShapeKind {
    /// Resolve a textual shape name to a kind with default parameters.
    ///
    /// This is the seam hosts use when element descriptions arrive as text.
    /// Parameterized kinds come back with neutral parameters for the caller
    /// to fill in.
    pub fn parse(name: &str) -> Result<Self, ShapeError> {
        match name {
            "none" => Ok(Self::None),
            "infinite_plane" | "plane" => Ok(Self::InfinitePlane),
            "rectangle" => Ok(Self::Rectangle),
            "circle" => Ok(Self::Circle),
            "segment" => Ok(Self::Segment {
                hole_radius: 0.0,
                cycles: 1.0,
                phase: 0.0,
            }),
            "polygon" => Ok(Self::Polygon {
                vertices: Vec::new(),
            }),
            "box" => Ok(Self::Box3 { size: Vec3::ONE }),
            "sphere" => Ok(Self::Sphere),
            other => Err(ShapeError::UnknownShapeKind(other.to_owned())),
        }
    }

    /// The canonical name of this kind.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::InfinitePlane => "infinite_plane",
            Self::Rectangle => "rectangle",
            Self::Circle => "circle",
            Self::Segment { .. } => "segment",
            Self::Polygon { .. } => "polygon",
            Self::Box3 { .. } => "box",
            Self::Sphere => "sphere",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
