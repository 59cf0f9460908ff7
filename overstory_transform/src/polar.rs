// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangular↔polar conversion.
//!
//! Circular surfaces report their surface coordinates in polar form, and
//! two-point gestures derive their rotation/scale deltas from the polar
//! coordinates of the touch pair. Angles are radians in `(-π, π]`, measured
//! counter-clockwise from +x.

use core::f32::consts::PI;

use glam::Vec2;

/// Convert a planar point to `(angle, radius)`.
#[must_use]
pub fn to_polar(p: Vec2) -> Vec2 {
    Vec2::new(p.y.atan2(p.x), p.length())
}

/// Convert `(angle, radius)` back to a planar point.
#[must_use]
pub fn from_polar(polar: Vec2) -> Vec2 {
    Vec2::new(polar.x.cos(), polar.x.sin()) * polar.y
}

/// The signed shortest angular difference `b - a`, wrapped to `(-π, π]`.
#[must_use]
pub fn angle_delta(a: f32, b: f32) -> f32 {
    let mut d = b - a;
    while d > PI {
        d -= 2.0 * PI;
    }
    while d <= -PI {
        d += 2.0 * PI;
    }
    d
}
