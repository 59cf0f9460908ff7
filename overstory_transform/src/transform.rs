// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The transform triple: value form, shared form, and the apply mask.

use core::sync::atomic::{AtomicU64, Ordering};

use bitflags::bitflags;
use glam::{Mat4, Quat, Vec3};
use parking_lot::{Mutex, RwLock};

use crate::damper;

bitflags! {
    /// Selects which components of a transform an operation applies.
    ///
    /// Used by [`Transform::update_from`] and [`Transform::follow`] to
    /// restrict writes to a subset of translation, rotation, and scale.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct ApplyTransformMode: u8 {
        /// Apply the translation component.
        const TRANSLATION = 1;
        /// Apply the rotation component.
        const ROTATION = 2;
        /// Apply the scale component.
        const SCALE = 4;
        /// Apply all three components.
        const ALL = Self::TRANSLATION.bits() | Self::ROTATION.bits() | Self::SCALE.bits();
    }
}

impl Default for ApplyTransformMode {
    fn default() -> Self {
        Self::ALL
    }
}

/// The plain value form of a transform: translation, rotation, scale.
///
/// Descriptors carry this form; [`Transform`] wraps it with caching and
/// change tracking. The derived matrix applies scale, then rotation, then
/// translation to points.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Srt {
    /// Translation in parent space.
    pub translation: Vec3,
    /// Rotation in parent space.
    pub rotation: Quat,
    /// Per-axis scale.
    pub scale: Vec3,
}

impl Default for Srt {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Srt {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Create from a translation, leaving rotation and scale at identity.
    #[must_use]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// The composed matrix (scale, then rotation, then translation).
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Decompose a matrix back into the triple.
    ///
    /// Lossy for matrices with shear or projection.
    #[must_use]
    pub fn from_matrix(m: &Mat4) -> Self {
        let (scale, rotation, translation) = m.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Copy the components selected by `mask` from `other`.
    pub fn apply(&mut self, other: &Self, mask: ApplyTransformMode) {
        if mask.contains(ApplyTransformMode::TRANSLATION) {
            self.translation = other.translation;
        }
        if mask.contains(ApplyTransformMode::ROTATION) {
            self.rotation = other.rotation;
        }
        if mask.contains(ApplyTransformMode::SCALE) {
            self.scale = other.scale;
        }
    }
}

/// A shareable transform with a cached matrix and a change version.
///
/// All accessors take `&self`; the state lives behind fine-grained locks so
/// a transform can be read from hit-testing workers while its owner mutates
/// it only in its own frame step. Every setter invalidates the matrix cache
/// and bumps [`version`](Self::version); dependent caches (element world
/// matrices) compare versions lazily rather than receiving callbacks.
#[derive(Debug)]
pub struct Transform {
    state: RwLock<Srt>,
    cache: Mutex<Option<Mat4>>,
    version: AtomicU64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Transform {
    fn clone(&self) -> Self {
        Self::from_srt(self.srt())
    }
}

impl Transform {
    /// Create an identity transform.
    #[must_use]
    pub fn new() -> Self {
        Self::from_srt(Srt::IDENTITY)
    }

    /// Create from a value triple.
    #[must_use]
    pub fn from_srt(srt: Srt) -> Self {
        Self {
            state: RwLock::new(srt),
            cache: Mutex::new(None),
            version: AtomicU64::new(0),
        }
    }

    /// Snapshot the value triple.
    #[must_use]
    pub fn srt(&self) -> Srt {
        *self.state.read()
    }

    /// The translation component.
    #[must_use]
    pub fn translation(&self) -> Vec3 {
        self.state.read().translation
    }

    /// The rotation component.
    #[must_use]
    pub fn rotation(&self) -> Quat {
        self.state.read().rotation
    }

    /// The scale component.
    #[must_use]
    pub fn scale(&self) -> Vec3 {
        self.state.read().scale
    }

    /// Set the translation component.
    pub fn set_translation(&self, translation: Vec3) {
        self.state.write().translation = translation;
        self.touch();
    }

    /// Set the rotation component.
    pub fn set_rotation(&self, rotation: Quat) {
        self.state.write().rotation = rotation;
        self.touch();
    }

    /// Set the scale component.
    pub fn set_scale(&self, scale: Vec3) {
        self.state.write().scale = scale;
        self.touch();
    }

    /// Replace the whole triple.
    pub fn set_srt(&self, srt: Srt) {
        *self.state.write() = srt;
        self.touch();
    }

    /// The change version. Bumped by every setter.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Whether the derived matrix is currently cached.
    #[must_use]
    pub fn cached(&self) -> bool {
        self.cache.lock().is_some()
    }

    /// The composed local matrix, computing and caching it if stale.
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        let mut cache = self.cache.lock();
        if let Some(m) = *cache {
            return m;
        }
        let m = self.state.read().matrix();
        *cache = Some(m);
        m
    }

    /// Copy the components selected by `mask` from `other`.
    pub fn update_from(&self, other: &Srt, mask: ApplyTransformMode) {
        self.state.write().apply(other, mask);
        self.touch();
    }

    /// Move the selected components toward `target` with an exponential
    /// time-constant filter.
    ///
    /// `time` is the smoothing time constant in seconds and `dt` the frame
    /// delta; `time <= 0` snaps. Translation and scale interpolate linearly,
    /// rotation by slerp.
    pub fn follow(&self, target: &Srt, time: f32, dt: f32, mask: ApplyTransformMode) {
        let k = damper::factor(time, dt);
        {
            let mut st = self.state.write();
            if mask.contains(ApplyTransformMode::TRANSLATION) {
                st.translation = st.translation.lerp(target.translation, k);
            }
            if mask.contains(ApplyTransformMode::ROTATION) {
                st.rotation = st.rotation.slerp(target.rotation, k).normalize();
            }
            if mask.contains(ApplyTransformMode::SCALE) {
                st.scale = st.scale.lerp(target.scale, k);
            }
        }
        self.touch();
    }

    /// The translation composed with a view matrix.
    #[must_use]
    pub fn view_position(&self, view: &Mat4) -> Vec3 {
        view.transform_point3(self.translation())
    }

    /// The local matrix composed with a view matrix.
    #[must_use]
    pub fn view_matrix(&self, view: &Mat4) -> Mat4 {
        *view * self.matrix()
    }

    fn touch(&self) {
        *self.cache.lock() = None;
        self.version.fetch_add(1, Ordering::Release);
    }
}
