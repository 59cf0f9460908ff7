// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wheel scroll: attached-mouse wheel input with flick decay.

use std::sync::Arc;

use glam::Vec2;
use overstory_core::{Behavior, Context, Element};
use overstory_transform::damper;

const WHEEL_ID: &str = "a90d4e37-6c1f-48b2-95ab-f2e84d03b761";

/// Scrolls the element in its own plane from the wheel accumulators of
/// attached-mouse touches currently hitting it.
///
/// Wheel input sets a scroll velocity (units per second in the element's
/// plane); between inputs the velocity decays toward zero with the
/// `flick_time` constant, so releases keep gliding the way touch flicks
/// do.
#[derive(Clone, Copy, Debug)]
pub struct WheelScroll {
    /// Gain from wheel steps to plane units per second. `x` maps the
    /// horizontal wheel, `y` the vertical.
    pub coefficient: Vec2,
    /// Velocity decay time constant, seconds.
    pub flick_time: f32,
}

impl Default for WheelScroll {
    fn default() -> Self {
        Self {
            coefficient: Vec2::ONE,
            flick_time: 0.3,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct WheelState {
    velocity: Vec2,
}

impl Behavior for WheelScroll {
    fn id(&self) -> &str {
        WHEEL_ID
    }

    fn behave(&self, element: &Arc<Element>, context: &Context) {
        let dt = context.delta_time();
        if dt <= 0.0 {
            return;
        }
        let mut state = element
            .behavior_state::<WheelState>(WHEEL_ID)
            .unwrap_or_default();

        let mut wheel = Vec2::ZERO;
        for entry in element.hitting() {
            if let Some(input) = entry.touch.mouse_frame_input() {
                wheel += input.wheel;
            }
        }

        if wheel != Vec2::ZERO {
            state.velocity = wheel * self.coefficient;
        } else {
            state.velocity = damper::toward_vec2(state.velocity, Vec2::ZERO, self.flick_time, dt);
        }

        if state.velocity.length_squared() > 0.0 {
            let transform = element.display_transform();
            let translation = transform.translation() + (state.velocity * dt).extend(0.0);
            transform.set_translation(translation);
        }

        element.set_behavior_state(WHEEL_ID, state);
    }
}
