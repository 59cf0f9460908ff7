// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overstory Transform: spatial transform primitives for interaction pipelines.
//!
//! This crate provides the transform layer that the rest of the Overstory
//! workspace builds on:
//!
//! - [`Transform`]: a shareable translation/rotation/scale triple with a
//!   cached matrix and a change version that downstream caches compare
//!   against.
//! - [`Srt`]: the plain value form of the same triple, used in descriptors
//!   and snapshots.
//! - [`ApplyTransformMode`]: a component mask selecting which of the three
//!   components an update or a damped follow applies.
//! - [`damper`]: exponential time-constant smoothing for scalars, vectors,
//!   and rotations.
//! - [`polar`]: rectangular↔polar conversion for circular surface
//!   coordinates and two-point gesture deltas.
//!
//! ## Conventions
//!
//! Matrices are `glam` `f32` matrices. A transform's matrix applies scale,
//! then rotation, then translation to points
//! ([`Mat4::from_scale_rotation_translation`](glam::Mat4::from_scale_rotation_translation)),
//! and hierarchies compose as `world = parent_world * local`.
//!
//! ## Change tracking
//!
//! [`Transform`] does not call subscribers back. Every setter bumps a
//! monotonic [`version`](Transform::version); owners that cache derived
//! matrices (world matrices, inverses) record the version they computed from
//! and lazily recompute when it moves. This keeps invalidation a single
//! integer compare and makes the type freely shareable across the worker
//! threads of a frame.

pub mod damper;
pub mod polar;

mod transform;

pub use transform::{ApplyTransformMode, Srt, Transform};
