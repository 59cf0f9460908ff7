// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rays and screen-point unprojection.

use glam::{Mat4, Vec2, Vec3};

/// A ray with an origin and a (not necessarily unit) direction.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray {
    /// Ray origin.
    pub origin: Vec3,
    /// Ray direction. Unit length when built by [`Ray::from_screen`];
    /// transforming into element space scales it with the element.
    pub dir: Vec3,
}

impl Ray {
    /// Create a ray from an origin and direction.
    #[must_use]
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }

    /// The point at parameter `t`.
    #[must_use]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }

    /// Unproject a normalized projective screen point into a world ray.
    ///
    /// `inv_projection` is the inverse of the combined projection-aspect
    /// matrix, `inv_view` the inverse view. The near and far unprojections
    /// of the point define the ray; with identity matrices the ray starts
    /// at `(x, y, 0)` and points along +z.
    #[must_use]
    pub fn from_screen(point: Vec2, inv_projection: &Mat4, inv_view: &Mat4) -> Self {
        let near = inv_view.transform_point3(inv_projection.project_point3(point.extend(0.0)));
        let far = inv_view.transform_point3(inv_projection.project_point3(point.extend(1.0)));
        Self {
            origin: near,
            dir: (far - near).normalize_or_zero(),
        }
    }

    /// Transform the ray by a matrix (typically an inverse world matrix).
    ///
    /// The direction is deliberately not renormalized so that parameters
    /// stay comparable with world-space distances under uniform transforms.
    #[must_use]
    pub fn transformed(&self, m: &Mat4) -> Self {
        Self {
            origin: m.transform_point3(self.origin),
            dir: m.transform_vector3(self.dir),
        }
    }
}
