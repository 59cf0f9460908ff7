// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raise-to-top: bring a touched element in front of its siblings.

use std::sync::Arc;

use overstory_core::{Behavior, Context, Element};

const RAISE_ID: &str = "e3b1f7a2-64d8-4b0a-bb1e-0c5a9d82f614";

/// Reassigns sibling z depths when this element (or a descendant) starts
/// being touched: the touched element moves to `top`, the others stack
/// behind it at `top + k * distance` in their previous depth order.
///
/// Writes sibling transforms, so it reports itself
/// [`serialized`](Behavior::serialized) and the context runs it in the
/// post-pass after the parallel element phase.
#[derive(Clone, Copy, Debug)]
pub struct RaiseToTop {
    /// Depth assigned to the touched element.
    pub top: f32,
    /// Depth spacing between the remaining siblings.
    pub distance: f32,
}

impl Default for RaiseToTop {
    fn default() -> Self {
        Self {
            top: 0.0,
            distance: 0.01,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct RaiseState {
    was_touched: bool,
}

impl Behavior for RaiseToTop {
    fn id(&self) -> &str {
        RAISE_ID
    }

    fn serialized(&self) -> bool {
        true
    }

    fn behave(&self, element: &Arc<Element>, _context: &Context) {
        let touched = touched_with_descendants(element);
        let mut state = element
            .behavior_state::<RaiseState>(RAISE_ID)
            .unwrap_or_default();

        if touched && !state.was_touched {
            self.raise(element);
        }

        state.was_touched = touched;
        element.set_behavior_state(RAISE_ID, state);
    }
}

impl RaiseToTop {
    fn raise(&self, element: &Arc<Element>) {
        let Some(parent) = element.parent() else {
            return;
        };
        let mut siblings = parent.children();
        // Preserve the previous front-to-back order behind the raised one.
        siblings.sort_by(|a, b| {
            a.display_transform()
                .translation()
                .z
                .partial_cmp(&b.display_transform().translation().z)
                .unwrap_or(core::cmp::Ordering::Equal)
        });

        let mut k = 1;
        for sibling in &siblings {
            let transform = sibling.display_transform();
            let mut translation = transform.translation();
            if sibling.id() == element.id() {
                translation.z = self.top;
            } else {
                translation.z = self.top + k as f32 * self.distance;
                k += 1;
            }
            transform.set_translation(translation);
        }
    }
}

fn touched_with_descendants(element: &Arc<Element>) -> bool {
    if element.touched() {
        return true;
    }
    element
        .children()
        .iter()
        .any(touched_with_descendants)
}
