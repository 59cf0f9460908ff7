// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overstory Core: a renderless 3D interaction pipeline.
//!
//! Overstory turns per-frame pointer samples into hover/hit/touch state on
//! a dynamic hierarchy of spatial elements. It draws nothing: hosts hand
//! the [`Context`] their camera matrices and input batch once per frame,
//! then read back transforms, fades, and events to drive their own
//! renderer.
//!
//! ## The pieces
//!
//! - [`Prototype`]: the stateless, host-owned description of an element
//!   tree. Hosts mutate prototypes and reconcile them into the context
//!   with [`Context::add_or_update_elements`].
//! - [`Element`]: the stateful per-context instance — transforms, fade
//!   lifecycle, touch maps, children, value bag, events.
//! - [`Touch`]: one pointer, shared by identity between the context's
//!   touch table and the element maps that reference it.
//! - [`Context`]: the per-frame pipeline; see [`Context::mainloop`] for
//!   the canonical step order.
//! - [`Behavior`]: per-frame element mutators; the shipped set lives in
//!   the `overstory_behavior` crate.
//! - [`SubContext`]: a nested context fed from intersections on a host
//!   element's surface.
//!
//! ## Minimal frame
//!
//! ```
//! use glam::{Mat4, Vec2};
//! use overstory_core::{Context, Prototype, TouchSample};
//! use overstory_hit::ShapeKind;
//!
//! let context = Context::new();
//! let panel = Prototype::with_shape("panel", ShapeKind::Rectangle);
//! context.add_or_update_elements(true, [&panel]);
//!
//! // One frame: a single pressed pointer in the middle of the screen.
//! let samples = [TouchSample::new(Vec2::ZERO, 7, 1.0)];
//! context
//!     .mainloop(&samples, Mat4::IDENTITY, Mat4::IDENTITY, Mat4::IDENTITY, 1.0 / 60.0)
//!     .unwrap();
//!
//! let element = context.find("panel")[0].clone();
//! assert!(element.hit());
//! assert!(element.touched());
//! ```
//!
//! ## Concurrency
//!
//! Within a frame, hit-testing may fan out across touches and the element
//! phase across elements (see [`ContextOptions::use_parallel`]). Event
//! handlers can therefore run on worker threads and must be
//! `Send + Sync`. The touch maps involved are individually locked; the
//! ordering rules are documented on [`Context::mainloop`] and
//! [`Element`].

mod behavior;
mod context;
mod element;
mod error;
mod events;
mod fade;
mod prototype;
mod query;
mod signal;
mod subcontext;
mod touch;
mod values;

pub use overstory_opaq::{MatchBy, PatternOptions};

pub use behavior::{Behavior, STATE_KEY_PREFIX, state_key};
pub use context::{Context, ContextOptions};
pub use element::{Element, TouchEntry};
pub use error::{FrameError, ShapeError};
pub use events::{ElementEvents, MouseButtonArgs, MouseWheelArgs, TouchEventArgs};
pub use fade::{FadePhase, FadeTiming};
pub use prototype::{ElementId, Prototype, SubContextOptions, next_element_id};
pub use signal::Signal;
pub use subcontext::SubContext;
pub use touch::{MouseInput, Touch, TouchId, TouchKey, TouchSample};
pub use values::{AttachedValues, AuxObject, AuxValue};
