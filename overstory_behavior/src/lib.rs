// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overstory Behavior: the shipped per-frame element mutators.
//!
//! Behaviors implement [`overstory_core::Behavior`] and attach to elements
//! through their prototypes. Each stores its per-element state in the
//! element's auxiliary value bag under its own id, so behavior instances
//! themselves stay stateless and freely shareable between elements.
//!
//! - [`Sliding`]: the canonical multi-touch drag/scale/rotate gesture with
//!   flick inertia.
//! - [`RaiseToTop`]: reorders sibling depths when an element (or a
//!   descendant) is touched. Runs in the serialized post-pass because it
//!   writes to siblings.
//! - [`ValueSlider2D`]: turns planar touch velocity into two float slots
//!   of the element's value bag.
//! - [`WheelScroll`]: scrolls the element from an attached mouse wheel,
//!   with flick decay.

mod plane;
mod raise;
mod slider;
mod sliding;
mod wheel;

pub use raise::RaiseToTop;
pub use slider::ValueSlider2D;
pub use sliding::{SlidePlane, Sliding};
pub use wheel::WheelScroll;
