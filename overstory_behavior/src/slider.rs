// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Value slider: planar touch velocity into value-bag slots.

use std::sync::Arc;

use glam::Vec2;
use overstory_core::{Behavior, Context, Element};

use crate::plane::planar_point;

const SLIDER_ID: &str = "17c4b9de-2a85-4f61-9d0b-7e3f5a12c8d0";

/// Accumulates the fastest touching pointer's planar velocity into two
/// float slots of the element's value bag, optionally clamped.
///
/// The velocity is measured in the element's own plane, so the values
/// follow the finger regardless of how the element is oriented in the
/// world. The value vector grows as needed to reach the configured
/// indices.
#[derive(Clone, Copy, Debug)]
pub struct ValueSlider2D {
    /// Value-bag index receiving the x component.
    pub index_x: usize,
    /// Value-bag index receiving the y component.
    pub index_y: usize,
    /// Per-axis gain.
    pub coefficient: Vec2,
    /// Clamp applied to the accumulated values.
    pub clamp: Option<(Vec2, Vec2)>,
}

impl Default for ValueSlider2D {
    fn default() -> Self {
        Self {
            index_x: 0,
            index_y: 1,
            coefficient: Vec2::ONE,
            clamp: None,
        }
    }
}

impl Behavior for ValueSlider2D {
    fn id(&self) -> &str {
        SLIDER_ID
    }

    fn behave(&self, element: &Arc<Element>, _context: &Context) {
        let touching = element.touching();
        let Some(entry) = touching.iter().max_by(|a, b| {
            a.touch
                .velocity()
                .length_squared()
                .partial_cmp(&b.touch.velocity().length_squared())
                .unwrap_or(core::cmp::Ordering::Equal)
        }) else {
            return;
        };

        let plane_inverse = element.inverse_display_matrix();
        let Some(curr) = planar_point(&entry.touch.ray(), &plane_inverse) else {
            return;
        };
        let Some(prev) = planar_point(&entry.touch.previous_ray(), &plane_inverse) else {
            return;
        };
        let delta = (curr - prev) * self.coefficient;
        if delta == Vec2::ZERO {
            return;
        }

        element.update_values(|values| {
            let needed = self.index_x.max(self.index_y) + 1;
            if values.values.len() < needed {
                values.values.resize(needed, 0.0);
            }
            values.values[self.index_x] += delta.x;
            values.values[self.index_y] += delta.y;
            if let Some((min, max)) = self.clamp {
                values.values[self.index_x] = values.values[self.index_x].clamp(min.x, max.x);
                values.values[self.index_y] = values.values[self.index_y].clamp(min.y, max.y);
            }
        });
    }
}
