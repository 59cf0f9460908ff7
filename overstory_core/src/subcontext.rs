// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Nested contexts fed from a host element's surface.
//!
//! An element with sub-context options carries a private inner [`Context`].
//! Each frame, after the host element's own step, the inner context is
//! driven with synthetic touches derived from the host's current hit (or
//! touch) intersections: the intersection's 2D coordinates — surface or
//! element space — become the inner screen points, and the original touch
//! ids and forces carry over, so an id seen by the outer context maps to
//! the same id inside. Attached pointing devices follow the same id match.
//!
//! The inner context uses identity view and projection: a point at
//! `(x, y)` rays straight down +z onto the inner elements. Hosts populate
//! it through [`Element::with_sub_context`] exactly like an outer context.
//! The outer context never traverses it for hit-testing or path queries.

use std::sync::Arc;

use glam::Mat4;
use tracing::warn;

use crate::context::{Context, ContextOptions};
use crate::element::Element;
use crate::prototype::SubContextOptions;
use crate::touch::TouchSample;

/// A per-element inner context.
#[derive(Debug)]
pub struct SubContext {
    context: Context,
    options: SubContextOptions,
}

impl SubContext {
    pub(crate) fn new(options: SubContextOptions) -> Self {
        // The inner pipeline runs inside the host element's (possibly
        // parallel) frame step; it must not fan out again.
        let context = Context::with_options(ContextOptions {
            use_parallel: false,
            ..ContextOptions::default()
        });
        Self { context, options }
    }

    /// The nested context.
    #[must_use]
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// How touches are derived from the host element.
    #[must_use]
    pub fn options(&self) -> SubContextOptions {
        self.options
    }

    pub(crate) fn set_options(&mut self, options: SubContextOptions) {
        self.options = options;
    }

    pub(crate) fn step(&mut self, host: &Arc<Element>, delta_time: f32) {
        let entries = if self.options.from_touching {
            host.touching()
        } else {
            host.hitting()
        };

        let mut samples = Vec::with_capacity(entries.len());
        for entry in &entries {
            let Some(ip) = entry.intersection.as_ref().or(entry.persistent.as_ref()) else {
                continue;
            };
            let point = if self.options.map_to_surface {
                ip.surface_point
            } else {
                ip.element_point.truncate()
            };
            samples.push(TouchSample::new(point, entry.touch.id(), entry.touch.force()));
            if let Some(inner) = self.context.touch_by_id(entry.touch.id()) {
                inner.forward_mouse_from(&entry.touch);
            }
        }

        if let Err(err) = self.context.mainloop(
            &samples,
            Mat4::IDENTITY,
            Mat4::IDENTITY,
            Mat4::IDENTITY,
            delta_time,
        ) {
            warn!(host = host.id(), %err, "sub-context frame failed");
        }
    }
}
