// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-element events.
//!
//! Each element owns one [`ElementEvents`] for its whole lifetime; the
//! context rewires nothing on rebuilds because subscriptions live on the
//! element itself. All signals may fire from worker threads during the
//! parallel element phase, so handlers must be `Send + Sync` (see
//! [`Signal`]).
//!
//! The hit/touch lifecycle per touch is:
//!
//! - `hit_begin` when a touch's ray first meets the element, `hit_end`
//!   when it stops meeting it (slide-off) or the touch expires.
//! - `touch_begin` when a newly pressed touch starts interacting,
//!   `touch_end` when that touch releases or expires. `interaction_begin` /
//!   `interaction_end` bracket the outer transition between zero and more
//!   than zero interacting touches, and `interacting` fires every frame in
//!   between.

use std::sync::Arc;

use overstory_hit::IntersectionPoint;

use crate::signal::Signal;
use crate::touch::Touch;

/// Arguments for touch-related events.
#[derive(Clone, Debug)]
pub struct TouchEventArgs {
    /// The triggering touch.
    pub touch: Arc<Touch>,
    /// The touch's current intersection with the element, if it has one
    /// this frame. `None` after a slide-off.
    pub intersection: Option<IntersectionPoint>,
}

/// Arguments for wheel events from an attached pointing device.
#[derive(Clone, Debug)]
pub struct MouseWheelArgs {
    /// The touch the device is attached to.
    pub touch: Arc<Touch>,
    /// Wheel movement along the event's axis this frame.
    pub delta: f32,
}

/// Arguments for button events from an attached pointing device.
#[derive(Clone, Debug)]
pub struct MouseButtonArgs {
    /// The touch the device is attached to.
    pub touch: Arc<Touch>,
    /// The transitioning button.
    pub button: u8,
}

/// The full per-element event surface.
#[derive(Debug, Default)]
pub struct ElementEvents {
    /// First touch started interacting (empty → non-empty `touching`).
    pub interaction_begin: Signal<TouchEventArgs>,
    /// Last interacting touch ended (`touching` drained).
    pub interaction_end: Signal<TouchEventArgs>,
    /// A touch started interacting with the element.
    pub touch_begin: Signal<TouchEventArgs>,
    /// An interacting touch released or expired.
    pub touch_end: Signal<TouchEventArgs>,
    /// A touch's ray started hitting the element.
    pub hit_begin: Signal<TouchEventArgs>,
    /// A touch's ray stopped hitting the element.
    pub hit_end: Signal<TouchEventArgs>,
    /// Fired each frame while any touch interacts with the element.
    pub interacting: Signal<TouchEventArgs>,
    /// The element's child set was reconciled.
    pub children_updated: Signal<()>,
    /// Deletion began (the fade-out countdown is running).
    pub deletion_started: Signal<()>,
    /// The element is being removed from its context.
    pub deleting: Signal<()>,
    /// The fade-in (or a revival) completed.
    pub faded_in: Signal<()>,
    /// The element's frame step is about to run.
    pub main_loop_begin: Signal<()>,
    /// The element's frame step finished.
    pub main_loop_end: Signal<()>,
    /// Vertical wheel movement from an attached pointing device.
    pub vertical_mouse_wheel_change: Signal<MouseWheelArgs>,
    /// Horizontal wheel movement from an attached pointing device.
    pub horizontal_mouse_wheel_change: Signal<MouseWheelArgs>,
    /// Button press from an attached pointing device.
    pub mouse_button_pressed: Signal<MouseButtonArgs>,
    /// Button release from an attached pointing device.
    pub mouse_button_released: Signal<MouseButtonArgs>,
}
