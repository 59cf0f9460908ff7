// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Exponential time-constant smoothing.
//!
//! A damper moves a value toward a target so that the remaining error decays
//! by `1/e` every `time` seconds, independent of frame rate. This is the
//! filter behind transform following and behavior flick decay.
//!
//! ## Minimal example
//!
//! ```
//! use overstory_transform::damper;
//!
//! let mut x = 0.0;
//! for _ in 0..60 {
//!     x = damper::toward(x, 1.0, 0.1, 1.0 / 60.0);
//! }
//! // After 1 s with a 0.1 s time constant the error is ~e^-10.
//! assert!((1.0 - x).abs() < 1e-3);
//! ```

use glam::{Quat, Vec2, Vec3};

/// The per-step blend factor for a time constant and frame delta.
///
/// Returns 1 (snap) for non-positive time constants.
#[must_use]
pub fn factor(time: f32, dt: f32) -> f32 {
    if time <= 0.0 {
        1.0
    } else {
        1.0 - (-dt / time).exp()
    }
}

/// Move a scalar toward `target`.
#[must_use]
pub fn toward(current: f32, target: f32, time: f32, dt: f32) -> f32 {
    current + (target - current) * factor(time, dt)
}

/// Move a 2D vector toward `target`.
#[must_use]
pub fn toward_vec2(current: Vec2, target: Vec2, time: f32, dt: f32) -> Vec2 {
    current.lerp(target, factor(time, dt))
}

/// Move a 3D vector toward `target`.
#[must_use]
pub fn toward_vec3(current: Vec3, target: Vec3, time: f32, dt: f32) -> Vec3 {
    current.lerp(target, factor(time, dt))
}

/// Move a rotation toward `target` along the shortest arc.
#[must_use]
pub fn toward_quat(current: Quat, target: Quat, time: f32, dt: f32) -> Quat {
    current.slerp(target, factor(time, dt)).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_time_snaps() {
        assert_eq!(toward(0.0, 5.0, 0.0, 1.0 / 60.0), 5.0);
        assert_eq!(factor(-1.0, 0.016), 1.0);
    }

    #[test]
    fn factor_is_frame_rate_independent() {
        // Two 1/120 steps should decay the same as one 1/60 step.
        let one = 1.0 - factor(0.25, 1.0 / 60.0);
        let half = 1.0 - factor(0.25, 1.0 / 120.0);
        assert!((one - half * half).abs() < 1e-6);
    }

    #[test]
    fn scalar_decay_is_monotone() {
        let mut x = 0.0_f32;
        let mut last_err = 1.0_f32;
        for _ in 0..30 {
            x = toward(x, 1.0, 0.2, 1.0 / 60.0);
            let err = 1.0 - x;
            assert!(err < last_err);
            last_err = err;
        }
    }

    #[test]
    fn vectors_follow_scalars() {
        let v = toward_vec3(Vec3::ZERO, Vec3::ONE, 0.1, 1.0 / 60.0);
        let s = toward(0.0, 1.0, 0.1, 1.0 / 60.0);
        assert!((v.x - s).abs() < 1e-6);
        assert!((v.y - s).abs() < 1e-6);
        assert!((v.z - s).abs() < 1e-6);
    }

    #[test]
    fn quat_converges() {
        let target = Quat::from_rotation_z(1.2);
        let mut q = Quat::IDENTITY;
        for _ in 0..600 {
            q = toward_quat(q, target, 0.05, 1.0 / 60.0);
        }
        assert!(q.dot(target).abs() > 0.9999);
    }
}
