// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-pointer state.
//!
//! A [`Touch`] is one pointer (finger, pen tip, mouse) as seen by one
//! context. Touches are created on first sighting of an id in a frame's
//! input batch, updated while the id keeps appearing, and removed once the
//! id has been missing for more than the context's `consider_released_after`
//! frames.
//!
//! Identity is the `(id, context)` pair: ids are host-assigned and only
//! unique per input source, and a nested context may see the same id as its
//! host. Elements reference touches through that identity in their touch
//! maps.

use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3};
use overstory_hit::Ray;
use parking_lot::RwLock;

use crate::element::Element;

/// Host-assigned pointer id.
pub type TouchId = i32;

/// The identity of a touch: its id and the id of the owning context.
pub type TouchKey = (TouchId, u64);

/// One pointer sample in a frame's input batch.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TouchSample {
    /// Normalized projective screen position.
    pub point: Vec2,
    /// Host-assigned pointer id.
    pub id: TouchId,
    /// Reported force; compared against the context's minimum force.
    pub force: f32,
}

impl TouchSample {
    /// Create a sample.
    #[must_use]
    pub fn new(point: Vec2, id: TouchId, force: f32) -> Self {
        Self { point, id, force }
    }
}

/// Accumulated per-frame input from an attached pointing device.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MouseInput {
    /// Accumulated wheel movement, x horizontal, y vertical.
    pub wheel: Vec2,
    /// Buttons that went down.
    pub pressed: Vec<u8>,
    /// Buttons that went up.
    pub released: Vec<u8>,
}

impl MouseInput {
    fn is_empty(&self) -> bool {
        self.wheel == Vec2::ZERO && self.pressed.is_empty() && self.released.is_empty()
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct TouchState {
    pub point: Vec2,
    pub previous_point: Vec2,
    pub velocity: Vec2,
    pub force: f32,
    pub pressed: bool,
    pub frames_since_pressed: u32,
    pub expire_frames: u32,
    pub origin: Vec3,
    pub view_dir: Vec3,
    pub previous_origin: Vec3,
    pub previous_view_dir: Vec3,
    /// Whether a pointing device is attached.
    pub mouse_attached: bool,
    /// Host-written accumulator, moved into `mouse_frame` at the start of
    /// each frame.
    pub mouse_pending: MouseInput,
    /// The input the current frame's element phase reads.
    pub mouse_frame: MouseInput,
    /// The depth-ordered element chain this touch hovered this frame.
    pub attached_elements: Vec<Arc<Element>>,
}

/// One pointer as seen by one context.
#[derive(Debug)]
pub struct Touch {
    id: TouchId,
    context_id: u64,
    state: RwLock<TouchState>,
}

impl PartialEq for Touch {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Touch {}

impl Touch {
    pub(crate) fn new(id: TouchId, context_id: u64, point: Vec2, force: f32, minimum_force: f32) -> Self {
        let pressed = force >= minimum_force;
        Self {
            id,
            context_id,
            state: RwLock::new(TouchState {
                point,
                previous_point: point,
                force,
                pressed,
                ..TouchState::default()
            }),
        }
    }

    /// The host-assigned pointer id.
    #[must_use]
    pub fn id(&self) -> TouchId {
        self.id
    }

    /// The identity key: `(id, owning context)`.
    #[must_use]
    pub fn key(&self) -> TouchKey {
        (self.id, self.context_id)
    }

    /// Screen-space position, normalized projective coordinates.
    #[must_use]
    pub fn point(&self) -> Vec2 {
        self.state.read().point
    }

    /// Screen-space position at the previous frame.
    #[must_use]
    pub fn previous_point(&self) -> Vec2 {
        self.state.read().previous_point
    }

    /// Screen-space movement since the previous frame.
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.state.read().velocity
    }

    /// Latest reported force.
    #[must_use]
    pub fn force(&self) -> f32 {
        self.state.read().force
    }

    /// Whether the press latch is set. Latches once force reaches the
    /// context's minimum force and releases when it drops below.
    #[must_use]
    pub fn pressed(&self) -> bool {
        self.state.read().pressed
    }

    /// Frames since the press latch last rose.
    #[must_use]
    pub fn frames_since_pressed(&self) -> u32 {
        self.state.read().frames_since_pressed
    }

    /// Frames since this id was last present in an input batch.
    #[must_use]
    pub fn expire_frames(&self) -> u32 {
        self.state.read().expire_frames
    }

    /// Whether the touch counts as newly pressed.
    #[must_use]
    pub fn is_new(&self, consider_new_before: u32) -> bool {
        self.state.read().frames_since_pressed < consider_new_before
    }

    /// Whether the touch counts as released.
    #[must_use]
    pub fn is_expired(&self, consider_released_after: u32) -> bool {
        self.state.read().expire_frames > consider_released_after
    }

    /// World-space ray origin for the current frame.
    #[must_use]
    pub fn origin(&self) -> Vec3 {
        self.state.read().origin
    }

    /// World-space view direction for the current frame.
    #[must_use]
    pub fn view_dir(&self) -> Vec3 {
        self.state.read().view_dir
    }

    /// The world ray for the current frame.
    #[must_use]
    pub fn ray(&self) -> Ray {
        let state = self.state.read();
        Ray::new(state.origin, state.view_dir)
    }

    /// The world ray the touch had on the previous frame.
    #[must_use]
    pub fn previous_ray(&self) -> Ray {
        let state = self.state.read();
        Ray::new(state.previous_origin, state.previous_view_dir)
    }

    /// The depth-ordered chain of elements this touch hovered this frame.
    #[must_use]
    pub fn attached_elements(&self) -> Vec<Arc<Element>> {
        self.state.read().attached_elements.clone()
    }

    /// Whether a pointing device is attached to this touch.
    #[must_use]
    pub fn mouse_attached(&self) -> bool {
        self.state.read().mouse_attached
    }

    /// Attach or detach a pointing device.
    pub fn set_mouse_attached(&self, attached: bool) {
        let mut state = self.state.write();
        state.mouse_attached = attached;
        if !attached {
            state.mouse_pending = MouseInput::default();
            state.mouse_frame = MouseInput::default();
        }
    }

    /// Accumulate wheel movement for the next frame. Attaches the device.
    pub fn add_mouse_wheel(&self, delta: Vec2) {
        let mut state = self.state.write();
        state.mouse_attached = true;
        state.mouse_pending.wheel += delta;
    }

    /// Record a button transition for the next frame. Attaches the device.
    pub fn add_mouse_button(&self, button: u8, pressed: bool) {
        let mut state = self.state.write();
        state.mouse_attached = true;
        if pressed {
            state.mouse_pending.pressed.push(button);
        } else {
            state.mouse_pending.released.push(button);
        }
    }

    /// The mouse input visible to the current frame's element phase, if
    /// any.
    #[must_use]
    pub fn mouse_frame_input(&self) -> Option<MouseInput> {
        let state = self.state.read();
        if state.mouse_attached && !state.mouse_frame.is_empty() {
            Some(state.mouse_frame.clone())
        } else {
            None
        }
    }

    /// Per-frame bookkeeping: advance counters, rotate the mouse
    /// accumulator, clear the attached element chain.
    pub(crate) fn step(&self) {
        let mut state = self.state.write();
        state.expire_frames += 1;
        if state.pressed {
            state.frames_since_pressed = state.frames_since_pressed.saturating_add(1);
        }
        state.mouse_frame = core::mem::take(&mut state.mouse_pending);
        state.attached_elements.clear();
    }

    /// Fold a new input sample in: update position, velocity, force, and
    /// the press latch; reset the expiry counter.
    pub(crate) fn update_sample(&self, point: Vec2, force: f32, minimum_force: f32) {
        let mut state = self.state.write();
        state.previous_point = state.point;
        state.velocity = point - state.point;
        state.point = point;
        state.force = force;
        state.expire_frames = 0;
        let pressed = force >= minimum_force;
        if pressed && !state.pressed {
            state.frames_since_pressed = 0;
        }
        state.pressed = pressed;
    }

    /// Recompute the world ray from the current screen point, keeping the
    /// previous one around for `use_previous_position` hit tests.
    pub(crate) fn update_ray(&self, inv_projection: &Mat4, inv_view: &Mat4) {
        let mut state = self.state.write();
        state.previous_origin = state.origin;
        state.previous_view_dir = state.view_dir;
        let ray = Ray::from_screen(state.point, inv_projection, inv_view);
        state.origin = ray.origin;
        state.view_dir = ray.dir;
        // First frame: there is no meaningful previous ray yet.
        if state.previous_view_dir == Vec3::ZERO {
            let prev = Ray::from_screen(state.previous_point, inv_projection, inv_view);
            state.previous_origin = prev.origin;
            state.previous_view_dir = prev.dir;
        }
    }

    pub(crate) fn set_attached_elements(&self, elements: Vec<Arc<Element>>) {
        self.state.write().attached_elements = elements;
    }

    /// Forward the current frame's mouse input from a host touch, matched
    /// by id, into this (sub-context) touch's pending accumulator. The
    /// inner context's next frame step makes it visible.
    pub(crate) fn forward_mouse_from(&self, host: &Self) {
        let host_state = host.state.read();
        if !host_state.mouse_attached {
            return;
        }
        let mut state = self.state.write();
        state.mouse_attached = true;
        state.mouse_pending.wheel += host_state.mouse_frame.wheel;
        state
            .mouse_pending
            .pressed
            .extend_from_slice(&host_state.mouse_frame.pressed);
        state
            .mouse_pending
            .released
            .extend_from_slice(&host_state.mouse_frame.released);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(id: TouchId) -> Touch {
        Touch::new(id, 1, Vec2::ZERO, 1.0, -1.0)
    }

    #[test]
    fn identity_is_id_and_context() {
        let a = Touch::new(3, 1, Vec2::ZERO, 0.0, -1.0);
        let b = Touch::new(3, 1, Vec2::ONE, 1.0, -1.0);
        let c = Touch::new(3, 2, Vec2::ZERO, 0.0, -1.0);
        assert_eq!(a, b);
        assert_ne!(a, c, "same id in different contexts is a different touch");
    }

    #[test]
    fn new_touch_is_new_and_alive() {
        let t = touch(1);
        assert!(t.pressed());
        assert!(t.is_new(1));
        assert!(!t.is_expired(1));
        assert_eq!(t.expire_frames(), 0);
    }

    #[test]
    fn expiry_counts_frames_without_sightings() {
        let t = touch(1);
        t.step();
        assert_eq!(t.expire_frames(), 1);
        t.step();
        assert!(t.is_expired(1));
        // A sighting resets the counter.
        t.update_sample(Vec2::ONE, 1.0, -1.0);
        assert!(!t.is_expired(1));
    }

    #[test]
    fn velocity_is_point_delta() {
        let t = touch(1);
        t.update_sample(Vec2::new(0.1, 0.0), 1.0, -1.0);
        assert_eq!(t.velocity(), Vec2::new(0.1, 0.0));
        assert_eq!(t.previous_point(), Vec2::ZERO);
        assert_eq!(t.point(), Vec2::new(0.1, 0.0));
    }

    #[test]
    fn press_latch_resets_new_counter() {
        let t = Touch::new(1, 1, Vec2::ZERO, 0.0, 0.5);
        assert!(!t.pressed());
        t.step();
        t.step();
        assert_eq!(t.frames_since_pressed(), 0, "not counting while unpressed");
        t.update_sample(Vec2::ZERO, 1.0, 0.5);
        assert!(t.pressed());
        assert!(t.is_new(1));
        t.step();
        assert!(!t.is_new(1));
    }

    #[test]
    fn ray_follows_screen_point() {
        let t = touch(1);
        t.update_sample(Vec2::new(0.5, 0.5), 1.0, -1.0);
        t.update_ray(&Mat4::IDENTITY, &Mat4::IDENTITY);
        let ray = t.ray();
        assert!((ray.origin - Vec3::new(0.5, 0.5, 0.0)).length() < 1e-6);
        assert!((ray.dir - Vec3::Z).length() < 1e-6);
        // The previous ray is seeded from the previous point.
        let prev = t.previous_ray();
        assert!((prev.origin - Vec3::new(0.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn mouse_accumulator_rotates_per_frame() {
        let t = touch(1);
        t.add_mouse_wheel(Vec2::new(0.0, 2.0));
        t.add_mouse_wheel(Vec2::new(0.0, 1.0));
        assert!(t.mouse_frame_input().is_none(), "pending, not yet visible");
        t.step();
        let input = t.mouse_frame_input().unwrap();
        assert_eq!(input.wheel, Vec2::new(0.0, 3.0));
        t.step();
        assert!(t.mouse_frame_input().is_none(), "drained after one frame");
    }

    #[test]
    fn detaching_mouse_clears_input() {
        let t = touch(1);
        t.add_mouse_button(0, true);
        t.set_mouse_attached(false);
        t.step();
        assert!(t.mouse_frame_input().is_none());
        assert!(!t.mouse_attached());
    }
}
