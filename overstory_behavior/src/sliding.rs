// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The canonical multi-touch sliding behavior.
//!
//! ## Gesture model
//!
//! Touches are projected onto a gesture plane and reduced to three deltas
//! per frame: a planar translation, a rotation angle, and a radius change.
//! With two or more touches the two fastest form the gesture pair; the
//! deltas come from the pair's averaged position and its polar
//! coordinates. A single touch is treated as a two-point gesture against
//! its mirror through the plane origin — which is also why a lone
//! draggable touch moves the element at half its planar velocity (the
//! pair average moves half as far as the touch).
//!
//! ## Flick
//!
//! Deltas are recorded into a one-second history ring. When the touch
//! count drops below the threshold, the delta from `flick_velocity_delay`
//! seconds ago seeds an inertial flick that decays toward zero with the
//! `flick_time` constant; limits keep applying during the decay.

use std::collections::VecDeque;
use std::sync::Arc;

use glam::{Mat4, Quat, Vec2, Vec3};
use overstory_core::{Behavior, Context, Element, TouchEntry};
use overstory_transform::{damper, polar};

use crate::plane::planar_point;

const SLIDING_ID: &str = "5a6e2d1c-9f4b-4c3e-8a70-21d5e0b9437f";

/// Deltas below this magnitude end a flick.
const FLICK_REST: f32 = 1e-4;

/// Which plane the gesture is measured in.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SlidePlane {
    /// A view-oriented plane through the element's position.
    #[default]
    ViewAligned,
    /// The element's own z=0 plane.
    OwnPlane,
    /// The parent's z=0 plane; falls back to view-aligned without a
    /// parent.
    ParentPlane,
}

/// Multi-touch drag/scale/rotate with flick inertia.
#[derive(Clone, Debug)]
pub struct Sliding {
    /// Translate the element with the gesture.
    pub draggable: bool,
    /// Per-axis translation gain in plane space.
    pub drag_coefficient: Vec2,
    /// Scale the element with the gesture's radius change.
    pub scalable: bool,
    /// Gain on the radius change.
    pub scale_coefficient: f32,
    /// Rotate the element with the gesture's angle change.
    pub pivotable: bool,
    /// Gain on the angle change.
    pub pivot_coefficient: f32,
    /// Touches required before the gesture engages.
    pub minimum_touches: usize,
    /// Clamp on the accumulated rotation angle, radians.
    pub rotation_limit: Option<(f32, f32)>,
    /// Planar box clamp on the element translation, parent space.
    pub translation_limit: Option<(Vec2, Vec2)>,
    /// Clamp on the uniform scale factor.
    pub scale_min_max: Option<(f32, f32)>,
    /// Flick decay time constant, seconds. Zero disables inertia.
    pub flick_time: f32,
    /// How far back in the history the flick seed is read, seconds.
    pub flick_velocity_delay: f32,
    /// Merge descendants' touching sets into the gesture.
    pub include_children: bool,
    /// The gesture plane.
    pub plane: SlidePlane,
}

impl Default for Sliding {
    fn default() -> Self {
        Self {
            draggable: true,
            drag_coefficient: Vec2::ONE,
            scalable: false,
            scale_coefficient: 1.0,
            pivotable: false,
            pivot_coefficient: 1.0,
            minimum_touches: 1,
            rotation_limit: None,
            translation_limit: None,
            scale_min_max: None,
            flick_time: 0.5,
            flick_velocity_delay: 0.1,
            include_children: false,
            plane: SlidePlane::default(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct HistorySample {
    time: f32,
    delta_pos: Vec2,
    delta_angle: f32,
    delta_radius: f32,
}

#[derive(Clone, Debug, Default)]
struct SlidingState {
    delta_pos: Vec2,
    delta_angle: f32,
    delta_radius: f32,
    total_angle: f32,
    flicking: bool,
    had_contact: bool,
    clock: f32,
    history: VecDeque<HistorySample>,
}

impl Behavior for Sliding {
    fn id(&self) -> &str {
        SLIDING_ID
    }

    fn behave(&self, element: &Arc<Element>, context: &Context) {
        let dt = context.delta_time();
        if dt <= 0.0 {
            return;
        }
        let mut state = element
            .behavior_state::<SlidingState>(SLIDING_ID)
            .unwrap_or_default();
        state.clock += dt;

        let plane = self.plane_matrix(element, context);
        let plane_inverse = plane.inverse();

        let touches = self.collect_touches(element);
        if !touches.is_empty() && touches.len() >= self.minimum_touches {
            if let Some((delta_pos, delta_angle, delta_radius)) =
                self.gesture_deltas(&touches, &plane_inverse)
            {
                state.flicking = false;
                state.had_contact = true;
                state.delta_pos = delta_pos;
                state.delta_angle = delta_angle;
                state.delta_radius = delta_radius;
                self.apply(element, &plane, &mut state, delta_pos, delta_angle, delta_radius);

                state.history.push_back(HistorySample {
                    time: state.clock,
                    delta_pos,
                    delta_angle,
                    delta_radius,
                });
                let horizon = state.clock - 1.0;
                while state.history.front().is_some_and(|s| s.time < horizon) {
                    state.history.pop_front();
                }
            }
        } else {
            if state.had_contact && !state.flicking && self.flick_time > 0.0 {
                let seed_time = state.clock - self.flick_velocity_delay;
                let seed = state
                    .history
                    .iter()
                    .rev()
                    .find(|s| s.time <= seed_time)
                    .or(state.history.front())
                    .copied();
                if let Some(seed) = seed {
                    state.delta_pos = seed.delta_pos;
                    state.delta_angle = seed.delta_angle;
                    state.delta_radius = seed.delta_radius;
                    state.flicking = true;
                }
            }
            if state.flicking {
                state.delta_pos = damper::toward_vec2(state.delta_pos, Vec2::ZERO, self.flick_time, dt);
                state.delta_angle = damper::toward(state.delta_angle, 0.0, self.flick_time, dt);
                state.delta_radius = damper::toward(state.delta_radius, 0.0, self.flick_time, dt);
                let (dp, da, dr) = (state.delta_pos, state.delta_angle, state.delta_radius);
                self.apply(element, &plane, &mut state, dp, da, dr);
                if dp.length() < FLICK_REST && da.abs() < FLICK_REST && dr.abs() < FLICK_REST {
                    state.flicking = false;
                    state.had_contact = false;
                    state.history.clear();
                }
            } else {
                state.had_contact = false;
                state.history.clear();
            }
        }

        element.set_behavior_state(SLIDING_ID, state);
    }
}

impl Sliding {
    fn plane_matrix(&self, element: &Arc<Element>, context: &Context) -> Mat4 {
        match self.plane {
            SlidePlane::OwnPlane => element.display_matrix(),
            SlidePlane::ParentPlane => match element.parent() {
                Some(parent) => parent.display_matrix(),
                None => Self::view_aligned(element, context),
            },
            SlidePlane::ViewAligned => Self::view_aligned(element, context),
        }
    }

    fn view_aligned(element: &Arc<Element>, context: &Context) -> Mat4 {
        let position = element.display_matrix().w_axis.truncate();
        Mat4::from_rotation_translation(context.view_orientation(), position)
    }

    fn collect_touches(&self, element: &Arc<Element>) -> Vec<TouchEntry> {
        let mut entries = element.touching();
        if self.include_children {
            collect_descendant_touches(element, &mut entries);
            entries.sort_by_key(|e| e.touch.key());
            entries.dedup_by_key(|e| e.touch.key());
        }
        entries
    }

    /// Reduce the touch set to `(Δposition, Δangle, Δradius)` in plane
    /// space.
    fn gesture_deltas(
        &self,
        touches: &[TouchEntry],
        plane_inverse: &Mat4,
    ) -> Option<(Vec2, f32, f32)> {
        if touches.len() == 1 {
            let touch = &touches[0].touch;
            let curr = planar_point(&touch.ray(), plane_inverse)?;
            let prev = planar_point(&touch.previous_ray(), plane_inverse)?;
            if self.draggable {
                // The pair average of the touch and its stationary image.
                return Some(((curr - prev) * 0.5, 0.0, 0.0));
            }
            if self.scalable || self.pivotable {
                // Two-point gesture against the mirror through the origin.
                let (angle, radius) = pair_polar(curr, -curr);
                let (prev_angle, prev_radius) = pair_polar(prev, -prev);
                return Some((
                    Vec2::ZERO,
                    polar::angle_delta(prev_angle, angle),
                    radius - prev_radius,
                ));
            }
            return None;
        }

        // Two or more: the two fastest touches form the gesture pair.
        let mut sorted: Vec<&TouchEntry> = touches.iter().collect();
        sorted.sort_by(|a, b| {
            b.touch
                .velocity()
                .length_squared()
                .partial_cmp(&a.touch.velocity().length_squared())
                .unwrap_or(core::cmp::Ordering::Equal)
        });
        let (a, b) = (&sorted[0].touch, &sorted[1].touch);
        let a_curr = planar_point(&a.ray(), plane_inverse)?;
        let a_prev = planar_point(&a.previous_ray(), plane_inverse)?;
        let b_curr = planar_point(&b.ray(), plane_inverse)?;
        let b_prev = planar_point(&b.previous_ray(), plane_inverse)?;

        let delta_pos = (a_curr + b_curr) * 0.5 - (a_prev + b_prev) * 0.5;
        let (angle, radius) = pair_polar(a_curr, b_curr);
        let (prev_angle, prev_radius) = pair_polar(a_prev, b_prev);
        Some((
            delta_pos,
            polar::angle_delta(prev_angle, angle),
            radius - prev_radius,
        ))
    }

    fn apply(
        &self,
        element: &Arc<Element>,
        plane: &Mat4,
        state: &mut SlidingState,
        delta_pos: Vec2,
        delta_angle: f32,
        delta_radius: f32,
    ) {
        let parent = element.parent();
        let transform = element.display_transform();

        if self.draggable && delta_pos != Vec2::ZERO {
            let scaled = delta_pos * self.drag_coefficient;
            let world_delta = plane.transform_vector3(scaled.extend(0.0));
            let local_delta = match &parent {
                Some(p) => p.inverse_display_matrix().transform_vector3(world_delta),
                None => world_delta,
            };
            let mut translation = transform.translation() + local_delta;
            if let Some((min, max)) = self.translation_limit {
                translation.x = translation.x.clamp(min.x, max.x);
                translation.y = translation.y.clamp(min.y, max.y);
            }
            transform.set_translation(translation);
        }

        if self.scalable && delta_radius != 0.0 {
            let factor = (1.0 + delta_radius * self.scale_coefficient).max(0.0);
            let mut scale = transform.scale() * factor;
            if let Some((lo, hi)) = self.scale_min_max {
                scale = scale.clamp(Vec3::splat(lo), Vec3::splat(hi));
            }
            transform.set_scale(scale);
        }

        if self.pivotable && delta_angle != 0.0 {
            let mut applied = delta_angle * self.pivot_coefficient;
            if let Some((lo, hi)) = self.rotation_limit {
                let next = (state.total_angle + applied).clamp(lo, hi);
                applied = next - state.total_angle;
            }
            if applied != 0.0 {
                state.total_angle += applied;
                let world_axis = plane.transform_vector3(Vec3::Z).normalize_or_zero();
                let axis = match &parent {
                    Some(p) => p
                        .inverse_display_matrix()
                        .transform_vector3(world_axis)
                        .normalize_or_zero(),
                    None => world_axis,
                };
                if axis.length_squared() > 0.5 {
                    let rotation = Quat::from_axis_angle(axis, applied) * transform.rotation();
                    transform.set_rotation(rotation.normalize());
                }
            }
        }
    }
}

fn collect_descendant_touches(element: &Arc<Element>, out: &mut Vec<TouchEntry>) {
    for child in element.children() {
        out.extend(child.touching());
        collect_descendant_touches(&child, out);
    }
}

/// Polar coordinates of a two-point gesture: the pair's direction angle
/// and half-distance (the radius around the pair midpoint).
fn pair_polar(a: Vec2, b: Vec2) -> (f32, f32) {
    let p = polar::to_polar(a - b);
    (p.x, p.y * 0.5)
}
