// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-shape intersection functions.
//!
//! ## Overview
//!
//! [`intersect`] takes a shape descriptor and an element-space ray and
//! returns up to two hits:
//!
//! - The **bounded** hit: the ray meets the shape within its finite bounds.
//! - The **persistent** hit: for planar shapes, the intersection with the
//!   unbounded carrier plane regardless of bounds. Planar interactions use
//!   this to keep computing deltas after a pointer slides off the shape's
//!   edge mid-gesture. Volume shapes have no carrier plane and return
//!   `None` here on a miss.
//!
//! ## Surface spaces
//!
//! - Plane, rectangle, polygon: `element_xy * 2` (uv-like, `[-1, 1]` across
//!   the unit shape).
//! - Circle: polar `(angle, radius * 2)`.
//! - Segment: `(fraction along the sector, fraction across the annulus)`.
//! - Box: the face-local 2D coordinates normalized by the face extents.
//! - Sphere: `(azimuth, elevation)` radians.

use core::f32::consts::TAU;

use glam::{Mat4, Vec2, Vec3};
use overstory_transform::polar;

use crate::ray::Ray;
use crate::shape::ShapeKind;

/// Direction components smaller than this are treated as parallel.
const PARALLEL_EPSILON: f32 = 1e-9;

/// An element-space ray hit, before world-space conversion.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ElementRayHit {
    /// Ray parameter of the hit.
    pub t: f32,
    /// Hit point in element space.
    pub element_point: Vec3,
    /// Hit point in the shape's surface parameterization.
    pub surface_point: Vec2,
    /// Surface tangent frame at the hit, element space. The z axis is the
    /// surface normal.
    pub element_frame: Mat4,
}

/// Intersect `ray` (element space) with `shape`.
///
/// Returns `(bounded, persistent)`; see the module docs for the contract.
#[must_use]
pub fn intersect(shape: &ShapeKind, ray: &Ray) -> (Option<ElementRayHit>, Option<ElementRayHit>) {
    match shape {
        ShapeKind::None => (None, None),
        ShapeKind::InfinitePlane => {
            let hit = plane_hit(ray);
            (hit, hit)
        }
        ShapeKind::Rectangle => gated_plane_hit(ray, |p| p.x.abs() <= 0.5 && p.y.abs() <= 0.5),
        ShapeKind::Circle => {
            let Some(plane) = plane_hit(ray) else {
                return (None, None);
            };
            let xy = plane.element_point.truncate();
            let p = polar::to_polar(xy);
            let surface = Vec2::new(p.x, p.y * 2.0);
            let hit = ElementRayHit {
                surface_point: surface,
                ..plane
            };
            if p.y < 0.5 {
                (Some(hit), Some(hit))
            } else {
                (None, Some(hit))
            }
        }
        ShapeKind::Segment {
            hole_radius,
            cycles,
            phase,
        } => segment_hit(ray, *hole_radius, *cycles, *phase),
        ShapeKind::Polygon { vertices } => {
            if vertices.len() < 3 {
                return (None, None);
            }
            gated_plane_hit(ray, |p| point_in_polygon(p.truncate(), vertices))
        }
        ShapeKind::Box3 { size } => (box_hit(ray, *size), None),
        ShapeKind::Sphere => (sphere_hit(ray), None),
    }
}

/// Hit the unbounded z=0 plane; uv-like surface space.
fn plane_hit(ray: &Ray) -> Option<ElementRayHit> {
    if ray.dir.z.abs() < PARALLEL_EPSILON {
        return None;
    }
    let t = -ray.origin.z / ray.dir.z;
    if t < 0.0 {
        return None;
    }
    let p = ray.at(t);
    let element_point = Vec3::new(p.x, p.y, 0.0);
    Some(ElementRayHit {
        t,
        element_point,
        surface_point: element_point.truncate() * 2.0,
        element_frame: Mat4::from_translation(element_point),
    })
}

/// Plane hit gated by a bounds predicate; the ungated hit persists.
fn gated_plane_hit(
    ray: &Ray,
    in_bounds: impl Fn(Vec3) -> bool,
) -> (Option<ElementRayHit>, Option<ElementRayHit>) {
    match plane_hit(ray) {
        Some(hit) if in_bounds(hit.element_point) => (Some(hit), Some(hit)),
        Some(hit) => (None, Some(hit)),
        None => (None, None),
    }
}

fn segment_hit(
    ray: &Ray,
    hole_radius: f32,
    cycles: f32,
    phase: f32,
) -> (Option<ElementRayHit>, Option<ElementRayHit>) {
    let Some(plane) = plane_hit(ray) else {
        return (None, None);
    };
    let cycles = cycles.clamp(-1.0, 1.0);
    let inner = 0.5 * hole_radius.clamp(0.0, 1.0);
    let p = polar::to_polar(plane.element_point.truncate());

    // Sweep from `phase`, positive cycles counter-clockwise.
    let swept = polar::angle_delta(phase, p.x).rem_euclid(TAU);
    let (arc, along) = if cycles >= 0.0 {
        (cycles * TAU, swept)
    } else {
        (-cycles * TAU, (TAU - swept) % TAU)
    };

    let across_span = 0.5 - inner;
    let across = if across_span > 0.0 {
        (p.y - inner) / across_span
    } else {
        0.0
    };
    let along_fraction = if arc > 0.0 { along / arc } else { 0.0 };
    let hit = ElementRayHit {
        surface_point: Vec2::new(along_fraction, across),
        ..plane
    };

    let radial_ok = p.y >= inner && p.y <= 0.5;
    let angular_ok = along <= arc;
    if radial_ok && angular_ok {
        (Some(hit), Some(hit))
    } else {
        (None, Some(hit))
    }
}

/// Even-odd rule point-in-polygon test.
fn point_in_polygon(p: Vec2, vertices: &[Vec2]) -> bool {
    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let a = vertices[i];
        let b = vertices[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn box_hit(ray: &Ray, size: Vec3) -> Option<ElementRayHit> {
    let half = size * 0.5;
    let mut best: Option<(f32, usize, f32)> = None; // (t, axis, sign)

    for axis in 0..3 {
        for sign in [-1.0_f32, 1.0] {
            let d = axis_component(ray.dir, axis);
            if d.abs() < PARALLEL_EPSILON {
                continue;
            }
            // Only faces the ray enters from the outside.
            if d * sign >= 0.0 {
                continue;
            }
            let o = axis_component(ray.origin, axis);
            let h = axis_component(half, axis);
            let t = (sign * h - o) / d;
            if t < 0.0 {
                continue;
            }
            let p = ray.at(t);
            let (u_axis, v_axis) = other_axes(axis);
            if axis_component(p, u_axis).abs() > axis_component(half, u_axis)
                || axis_component(p, v_axis).abs() > axis_component(half, v_axis)
            {
                continue;
            }
            if best.is_none_or(|(bt, _, _)| t < bt) {
                best = Some((t, axis, sign));
            }
        }
    }

    let (t, axis, sign) = best?;
    let p = ray.at(t);
    let normal = axis_unit(axis) * sign;
    let (u_axis, v_axis) = other_axes(axis);
    let hu = axis_component(half, u_axis).max(PARALLEL_EPSILON);
    let hv = axis_component(half, v_axis).max(PARALLEL_EPSILON);
    Some(ElementRayHit {
        t,
        element_point: p,
        surface_point: Vec2::new(
            axis_component(p, u_axis) / hu,
            axis_component(p, v_axis) / hv,
        ),
        element_frame: frame_from_normal(p, normal),
    })
}

fn sphere_hit(ray: &Ray) -> Option<ElementRayHit> {
    // (at·at) t² + 2 (at·ot) t + (ot·ot − 1) = 0
    let a = ray.dir.dot(ray.dir);
    if a < PARALLEL_EPSILON {
        return None;
    }
    let b = ray.dir.dot(ray.origin);
    let c = ray.origin.dot(ray.origin) - 1.0;
    let discriminant = b * b - a * c;
    if discriminant < 0.0 {
        return None;
    }
    let sqrt = discriminant.sqrt();
    let t0 = (-b - sqrt) / a;
    let t1 = (-b + sqrt) / a;
    let t = if t0 >= 0.0 {
        t0
    } else if t1 >= 0.0 {
        t1
    } else {
        return None;
    };

    let p = ray.at(t);
    let normal = p.normalize_or_zero();
    Some(ElementRayHit {
        t,
        element_point: p,
        surface_point: Vec2::new(p.y.atan2(p.x), p.z.clamp(-1.0, 1.0).asin()),
        element_frame: frame_from_normal(p, normal),
    })
}

fn axis_component(v: Vec3, axis: usize) -> f32 {
    match axis {
        0 => v.x,
        1 => v.y,
        _ => v.z,
    }
}

fn axis_unit(axis: usize) -> Vec3 {
    match axis {
        0 => Vec3::X,
        1 => Vec3::Y,
        _ => Vec3::Z,
    }
}

fn other_axes(axis: usize) -> (usize, usize) {
    match axis {
        0 => (1, 2),
        1 => (0, 2),
        _ => (0, 1),
    }
}

/// An orthonormal tangent frame with z along `normal`, positioned at `p`.
fn frame_from_normal(p: Vec3, normal: Vec3) -> Mat4 {
    let seed = if normal.x.abs() > 0.9 { Vec3::Y } else { Vec3::X };
    let tangent = (seed - normal * seed.dot(normal)).normalize_or_zero();
    let bitangent = normal.cross(tangent);
    Mat4::from_cols(
        tangent.extend(0.0),
        bitangent.extend(0.0),
        normal.extend(0.0),
        p.extend(1.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down_ray(x: f32, y: f32) -> Ray {
        // From z = -1 looking along +z, like the identity-frame screen ray.
        Ray::new(Vec3::new(x, y, -1.0), Vec3::Z)
    }

    #[test]
    fn infinite_plane_always_hits() {
        let (hit, persistent) = intersect(&ShapeKind::InfinitePlane, &down_ray(7.0, -3.0));
        let hit = hit.unwrap();
        assert_eq!(hit.element_point, Vec3::new(7.0, -3.0, 0.0));
        assert_eq!(hit.surface_point, Vec2::new(14.0, -6.0));
        assert_eq!(persistent, Some(hit));
    }

    #[test]
    fn plane_misses_parallel_rays() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, -1.0), Vec3::X);
        let (hit, persistent) = intersect(&ShapeKind::InfinitePlane, &ray);
        assert!(hit.is_none());
        assert!(persistent.is_none());
    }

    #[test]
    fn plane_behind_ray_does_not_hit() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::Z);
        let (hit, _) = intersect(&ShapeKind::InfinitePlane, &ray);
        assert!(hit.is_none());
    }

    #[test]
    fn rectangle_gates_bounds_but_persists() {
        let (hit, _) = intersect(&ShapeKind::Rectangle, &down_ray(0.25, 0.25));
        assert!(hit.is_some());

        let (hit, persistent) = intersect(&ShapeKind::Rectangle, &down_ray(0.75, 0.0));
        assert!(hit.is_none(), "outside the unit rectangle");
        let p = persistent.unwrap();
        assert_eq!(p.element_point, Vec3::new(0.75, 0.0, 0.0));
    }

    #[test]
    fn rectangle_edge_is_inclusive() {
        let (hit, _) = intersect(&ShapeKind::Rectangle, &down_ray(0.5, -0.5));
        assert!(hit.is_some());
    }

    #[test]
    fn circle_gates_radius_and_reports_polar() {
        let (hit, _) = intersect(&ShapeKind::Circle, &down_ray(0.0, 0.25));
        let hit = hit.unwrap();
        // +y is a quarter turn; radius 0.25 doubles to 0.5.
        assert!((hit.surface_point.x - core::f32::consts::FRAC_PI_2).abs() < 1e-5);
        assert!((hit.surface_point.y - 0.5).abs() < 1e-5);

        let (miss, persistent) = intersect(&ShapeKind::Circle, &down_ray(0.5, 0.0));
        assert!(miss.is_none(), "the circular bound is exclusive");
        assert!(persistent.is_some());
    }

    #[test]
    fn segment_full_turn_is_an_annulus() {
        let shape = ShapeKind::Segment {
            hole_radius: 0.5,
            cycles: 1.0,
            phase: 0.0,
        };
        // Inner radius is 0.25: inside the hole misses, the ring hits.
        let (inside_hole, persistent) = intersect(&shape, &down_ray(0.1, 0.0));
        assert!(inside_hole.is_none());
        assert!(persistent.is_some());
        let (ring, _) = intersect(&shape, &down_ray(0.4, 0.0));
        assert!(ring.is_some());
    }

    #[test]
    fn segment_half_turn_gates_angle() {
        let shape = ShapeKind::Segment {
            hole_radius: 0.0,
            cycles: 0.5,
            phase: 0.0,
        };
        // Half a turn from phase 0 covers the upper half plane.
        let (above, _) = intersect(&shape, &down_ray(0.0, 0.25));
        assert!(above.is_some());
        let (below, _) = intersect(&shape, &down_ray(0.0, -0.25));
        assert!(below.is_none());
    }

    #[test]
    fn segment_negative_cycles_sweep_clockwise() {
        let shape = ShapeKind::Segment {
            hole_radius: 0.0,
            cycles: -0.5,
            phase: 0.0,
        };
        let (above, _) = intersect(&shape, &down_ray(0.0, 0.25));
        assert!(above.is_none());
        let (below, _) = intersect(&shape, &down_ray(0.0, -0.25));
        assert!(below.is_some());
    }

    #[test]
    fn polygon_even_odd() {
        let square = ShapeKind::Polygon {
            vertices: vec![
                Vec2::new(-0.4, -0.4),
                Vec2::new(0.4, -0.4),
                Vec2::new(0.4, 0.4),
                Vec2::new(-0.4, 0.4),
            ],
        };
        let (hit, _) = intersect(&square, &down_ray(0.0, 0.0));
        assert!(hit.is_some());
        let (miss, persistent) = intersect(&square, &down_ray(0.45, 0.0));
        assert!(miss.is_none());
        assert!(persistent.is_some());
    }

    #[test]
    fn polygon_under_three_vertices_short_circuits() {
        let degenerate = ShapeKind::Polygon {
            vertices: vec![Vec2::ZERO, Vec2::ONE],
        };
        let (hit, persistent) = intersect(&degenerate, &down_ray(0.0, 0.0));
        assert!(hit.is_none());
        assert!(persistent.is_none());
    }

    #[test]
    fn box_hits_nearest_entered_face() {
        let shape = ShapeKind::Box3 { size: Vec3::ONE };
        let ray = Ray::new(Vec3::new(0.0, 0.0, -2.0), Vec3::Z);
        let (hit, persistent) = intersect(&shape, &ray);
        let hit = hit.unwrap();
        assert!((hit.element_point.z + 0.5).abs() < 1e-6, "-z face is nearest");
        // The frame's z axis is the outward face normal.
        let normal = hit.element_frame.z_axis.truncate();
        assert!((normal - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
        assert!(persistent.is_none(), "volume shapes have no carrier plane");
    }

    #[test]
    fn box_from_inside_misses() {
        // Every face would be entered from the inside.
        let shape = ShapeKind::Box3 { size: Vec3::ONE };
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        let (hit, _) = intersect(&shape, &ray);
        assert!(hit.is_none());
    }

    #[test]
    fn sphere_nearest_root_wins() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, -3.0), Vec3::Z);
        let (hit, _) = intersect(&ShapeKind::Sphere, &ray);
        let hit = hit.unwrap();
        assert!((hit.t - 2.0).abs() < 1e-5);
        assert!((hit.element_point - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn sphere_inside_uses_far_root() {
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        let (hit, _) = intersect(&ShapeKind::Sphere, &ray);
        assert!((hit.unwrap().t - 1.0).abs() < 1e-5);
    }

    #[test]
    fn sphere_miss() {
        let ray = Ray::new(Vec3::new(2.0, 0.0, -3.0), Vec3::Z);
        let (hit, persistent) = intersect(&ShapeKind::Sphere, &ray);
        assert!(hit.is_none());
        assert!(persistent.is_none());
    }

    #[test]
    fn none_never_hits() {
        let (hit, persistent) = intersect(&ShapeKind::None, &down_ray(0.0, 0.0));
        assert!(hit.is_none());
        assert!(persistent.is_none());
    }
}
