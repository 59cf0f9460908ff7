// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared plane projection helpers for the planar behaviors.

use glam::{Mat4, Vec2};
use overstory_hit::Ray;

/// Project a world ray onto the z=0 plane of `plane_inverse`'s frame.
///
/// Returns the 2D plane coordinates of the intersection, or `None` for
/// rays parallel to the plane. Negative parameters are allowed: gesture
/// deltas must stay continuous even when a ray leans past the horizon.
pub(crate) fn planar_point(ray: &Ray, plane_inverse: &Mat4) -> Option<Vec2> {
    let local = ray.transformed(plane_inverse);
    if local.dir.z.abs() < 1e-9 {
        return None;
    }
    let t = -local.origin.z / local.dir.z;
    Some(local.at(t).truncate())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn identity_plane_projection() {
        let ray = Ray::new(Vec3::new(0.3, -0.2, -1.0), Vec3::Z);
        let p = planar_point(&ray, &Mat4::IDENTITY).unwrap();
        assert!((p - Vec2::new(0.3, -0.2)).length() < 1e-6);
    }

    #[test]
    fn parallel_ray_has_no_projection() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, -1.0), Vec3::X);
        assert!(planar_point(&ray, &Mat4::IDENTITY).is_none());
    }

    #[test]
    fn translated_plane_shifts_coordinates() {
        let plane = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let ray = Ray::new(Vec3::new(0.0, 0.0, -1.0), Vec3::Z);
        let p = planar_point(&ray, &plane.inverse()).unwrap();
        assert!((p - Vec2::new(-1.0, 0.0)).length() < 1e-6);
    }
}
