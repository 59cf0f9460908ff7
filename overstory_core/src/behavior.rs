// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The behavior contract.
//!
//! A behavior is stateless code plus a stable identity. The context runs
//! each element's behavior list, in order, once per frame during the
//! element phase; behaviors keep their per-element state in the element's
//! auxiliary value bag under [`state_key`]`(behavior.id())`.
//!
//! Behaviors that only touch their own element run inside the (possibly
//! parallel) element phase. A behavior that writes to *other* elements —
//! the canonical example reorders siblings — must report
//! [`serialized`](Behavior::serialized)` = true`; the context then runs it
//! in a serialized post-pass after the parallel phase instead.

use std::sync::Arc;

use crate::context::Context;
use crate::element::Element;

/// Reserved key prefix for behavior state in element value bags.
pub const STATE_KEY_PREFIX: &str = "Internal.Behavior:";

/// The auxiliary-bag key a behavior's per-element state lives under.
#[must_use]
pub fn state_key(behavior_id: &str) -> String {
    let mut key = String::with_capacity(STATE_KEY_PREFIX.len() + behavior_id.len());
    key.push_str(STATE_KEY_PREFIX);
    key.push_str(behavior_id);
    key
}

/// A per-frame element mutator.
pub trait Behavior: Send + Sync {
    /// Stable identity of the behavior (a GUID-like string). Also keys the
    /// behavior's per-element state slot.
    fn id(&self) -> &str;

    /// Run one frame's worth of work on `element`.
    fn behave(&self, element: &Arc<Element>, context: &Context);

    /// Whether this behavior writes to elements other than its own and
    /// must run in the serialized post-pass.
    fn serialized(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_key_is_prefixed() {
        assert_eq!(
            state_key("9f2c"),
            String::from("Internal.Behavior:9f2c")
        );
    }
}
