// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-pair intersection record.

use core::hash::{Hash, Hasher};

use glam::{Mat4, Vec2, Vec3};

/// One touch's intersection with one element.
///
/// Stored in the per-element touch maps and handed to event listeners and
/// behaviors. Carries the intersection in all three spaces plus the surface
/// tangent frame in both world and element variants.
///
/// Equality and hashing are defined by the `(element_id, touch_id)` pair
/// only: a record is *the* intersection of that pair for some frame, and a
/// newer record for the same pair replaces it in a map rather than
/// coexisting with it.
#[derive(Clone, Debug)]
pub struct IntersectionPoint {
    /// Id of the intersected element.
    pub element_id: i64,
    /// Id of the intersecting touch.
    pub touch_id: i32,
    /// Intersection in world space.
    pub world_point: Vec3,
    /// Intersection in element space.
    pub element_point: Vec3,
    /// Intersection in the shape's 2D surface parameterization.
    pub surface_point: Vec2,
    /// Surface tangent frame at the intersection, world space.
    pub world_frame: Mat4,
    /// Surface tangent frame at the intersection, element space.
    pub element_frame: Mat4,
}

impl PartialEq for IntersectionPoint {
    fn eq(&self, other: &Self) -> bool {
        self.element_id == other.element_id && self.touch_id == other.touch_id
    }
}

impl Eq for IntersectionPoint {}

impl Hash for IntersectionPoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.element_id.hash(state);
        self.touch_id.hash(state);
    }
}
