// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Prototypes: the stateless, host-owned element descriptions.
//!
//! A prototype tree is the host's source of truth. The context reconciles
//! it into its element instances with
//! [`Context::add_or_update_elements`](crate::Context::add_or_update_elements):
//! matching ids update in place, new ids instantiate, and (optionally)
//! missing ids start deletion. Prototypes stay plain data; nothing in them
//! changes during a frame.

use core::any::Any;
use core::fmt;
use core::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use hashbrown::HashMap;
use overstory_hit::ShapeKind;
use overstory_transform::{ApplyTransformMode, Srt};
use tracing::warn;

use crate::behavior::Behavior;
use crate::fade::FadeTiming;
use crate::values::AttachedValues;

/// Host-visible element id.
pub type ElementId = i64;

static NEXT_ID: AtomicI64 = AtomicI64::new(1);

/// Allocate a fresh element id.
#[must_use]
pub fn next_element_id() -> ElementId {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// How a nested context derives its touches from the host element.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SubContextOptions {
    /// Feed from the host's `touching` set instead of `hitting`.
    pub from_touching: bool,
    /// Map touches into the shape's 2D surface space instead of element
    /// space.
    pub map_to_surface: bool,
}

/// A stateless element description.
#[derive(Clone)]
pub struct Prototype {
    /// Identity; instances keep this id.
    pub id: ElementId,
    /// Display name, matched by path queries.
    pub name: String,
    /// Inactive elements are skipped by hit-testing.
    pub active: bool,
    /// Transparent elements do not occlude elements behind them.
    pub transparent: bool,
    /// Fade-in/out ramps and delays.
    pub fade: FadeTiming,
    /// Seconds for the display transform to catch up with descriptor
    /// updates; zero applies updates immediately.
    pub transformation_follow_time: f32,
    /// The element's transform relative to its parent.
    pub display_transform: Srt,
    /// Behaviors, run in order each frame.
    pub behaviors: Vec<Arc<dyn Behavior>>,
    /// Initial contents of the element's value bag.
    pub attached_values: Option<AttachedValues>,
    /// Opaque host object carried by the instance.
    pub environment: Option<Arc<dyn Any + Send + Sync>>,
    /// If set, the element only hits when its parent also hits.
    pub only_hit_if_parent_is_hit: bool,
    /// Which transform components descriptor updates apply.
    pub transform_application: ApplyTransformMode,
    /// Present when the element hosts a nested context.
    pub sub_context: Option<SubContextOptions>,
    /// Child prototypes by id.
    pub children: HashMap<ElementId, Prototype>,
    /// Back-reference to the parent prototype's id, if any.
    pub parent_id: Option<ElementId>,
    /// The hit-test shape.
    pub shape: ShapeKind,
    /// Set by hosts that batch updates; honored when the context is
    /// configured with `update_only_change_flagged`.
    pub change_flagged: bool,
}

impl fmt::Debug for Prototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prototype")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("shape", &self.shape)
            .field("active", &self.active)
            .field("transparent", &self.transparent)
            .field("behaviors", &self.behaviors.len())
            .field("children", &self.children.len())
            .finish_non_exhaustive()
    }
}

impl Prototype {
    /// Create a named prototype with a fresh id and default settings.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: next_element_id(),
            name: name.into(),
            active: true,
            transparent: false,
            fade: FadeTiming::default(),
            transformation_follow_time: 0.0,
            display_transform: Srt::IDENTITY,
            behaviors: Vec::new(),
            attached_values: None,
            environment: None,
            only_hit_if_parent_is_hit: false,
            transform_application: ApplyTransformMode::ALL,
            sub_context: None,
            children: HashMap::new(),
            parent_id: None,
            shape: ShapeKind::default(),
            change_flagged: false,
        }
    }

    /// Create a named prototype with an explicit shape.
    #[must_use]
    pub fn with_shape(name: impl Into<String>, shape: ShapeKind) -> Self {
        Self {
            shape,
            ..Self::new(name)
        }
    }

    /// Builder-style transform.
    #[must_use]
    pub fn at(mut self, transform: Srt) -> Self {
        self.display_transform = transform;
        self
    }

    /// Builder-style transparency.
    #[must_use]
    pub fn transparent(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }

    /// Builder-style behavior attachment.
    #[must_use]
    pub fn behave_with(mut self, behavior: Arc<dyn Behavior>) -> Self {
        self.behaviors.push(behavior);
        self
    }

    /// Add a child prototype, wiring its parent back-reference.
    ///
    /// A child whose id equals this prototype's id, or collides with an
    /// existing child, is rejected with a log line rather than an error;
    /// the tree stays as it was.
    pub fn add_child(&mut self, mut child: Self) -> Option<ElementId> {
        if child.id == self.id {
            warn!(id = child.id, "rejecting child with its parent's id");
            return None;
        }
        if self.children.contains_key(&child.id) {
            warn!(id = child.id, "rejecting duplicate child id");
            return None;
        }
        child.parent_id = Some(self.id);
        let id = child.id;
        self.children.insert(id, child);
        Some(id)
    }

    /// Builder-style [`add_child`](Self::add_child).
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        let _ = self.add_child(child);
        self
    }

    /// Deep-clone with fresh ids throughout the subtree.
    ///
    /// Used to stamp several instances out of one description without the
    /// copies reconciling onto each other.
    #[must_use]
    pub fn clone_with_new_ids(&self) -> Self {
        let mut copy = self.clone();
        copy.id = next_element_id();
        copy.parent_id = None;
        let children = core::mem::take(&mut copy.children);
        for (_, child) in children {
            let mut child = child.clone_with_new_ids();
            child.parent_id = Some(copy.id);
            copy.children.insert(child.id, child);
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_are_unique() {
        let a = Prototype::new("a");
        let b = Prototype::new("b");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn add_child_wires_parent() {
        let mut parent = Prototype::new("parent");
        let child = Prototype::new("child");
        let child_id = child.id;
        assert_eq!(parent.add_child(child), Some(child_id));
        assert_eq!(parent.children[&child_id].parent_id, Some(parent.id));
    }

    #[test]
    fn child_with_parent_id_is_rejected() {
        let mut parent = Prototype::new("parent");
        let mut child = Prototype::new("child");
        child.id = parent.id;
        assert_eq!(parent.add_child(child), None);
        assert!(parent.children.is_empty());
    }

    #[test]
    fn duplicate_child_id_is_rejected() {
        let mut parent = Prototype::new("parent");
        let first = Prototype::new("first");
        let mut second = Prototype::new("second");
        second.id = first.id;
        parent.add_child(first);
        assert_eq!(parent.add_child(second), None);
        assert_eq!(parent.children.len(), 1);
    }

    #[test]
    fn clone_with_new_ids_regenerates_the_subtree() {
        let tree = Prototype::new("root").with_child(Prototype::new("leaf"));
        let copy = tree.clone_with_new_ids();
        assert_ne!(copy.id, tree.id);
        assert_eq!(copy.children.len(), 1);
        let (old_leaf_id, _) = tree.children.iter().next().unwrap();
        let (new_leaf_id, new_leaf) = copy.children.iter().next().unwrap();
        assert_ne!(old_leaf_id, new_leaf_id);
        assert_eq!(new_leaf.parent_id, Some(copy.id));
        assert_eq!(new_leaf.name, "leaf");
    }
}
