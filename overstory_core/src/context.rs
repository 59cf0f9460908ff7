// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-frame pipeline.
//!
//! ## Overview
//!
//! A [`Context`] owns every element instance and touch for one viewport
//! and advances them once per host frame through [`Context::mainloop`]:
//!
//! 1. Fold the frame's view/projection/aspect matrices into the cached
//!    view state.
//! 2. Drop touches that have been missing too long.
//! 3. Advance per-touch frame counters.
//! 4. Detach fully-deleted elements and rebuild the flat traversal list
//!    when the tree changed.
//! 5. Ingest the frame's input samples, creating or updating touches.
//! 6. Clear every element's hover set.
//! 7. Hit-test each touch against the flat list, depth-sort its
//!    intersections, and keep the transparency-aware prefix.
//! 8. Run every element's frame step (events, fades, follows, behaviors),
//!    then the serialized behavior post-pass.
//!
//! Steps 7 and 8 optionally fan out over a thread pool — across touches
//! and across elements respectively, per the concurrency rules in the
//! crate docs. The call is not reentrant; hosts drive it from one place.

use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};
use hashbrown::HashMap;
use overstory_hit::IntersectionPoint;
use parking_lot::RwLock;
use rayon::prelude::*;
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::element::{Element, TouchEntry};
use crate::error::FrameError;
use crate::prototype::{ElementId, Prototype};
use crate::touch::{Touch, TouchId, TouchSample};

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Context configuration.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ContextOptions {
    /// Fan the hit-test and element phases out over a thread pool.
    pub use_parallel: bool,
    /// A touch counts as newly pressed for this many frames; only new
    /// touches begin interactions.
    pub consider_new_before: u32,
    /// A touch counts as released after this many frames without a
    /// sighting.
    pub consider_released_after: u32,
    /// Force threshold for the press latch. The default of `-1` latches
    /// every reported sample.
    pub minimum_force: f32,
    /// Only apply descriptor updates whose prototypes are change-flagged.
    pub update_only_change_flagged: bool,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            use_parallel: true,
            consider_new_before: 1,
            consider_released_after: 1,
            minimum_force: -1.0,
            update_only_change_flagged: false,
        }
    }
}

#[derive(Clone, Debug)]
struct ViewState {
    view_inverse: Mat4,
    projection_aspect_inverse: Mat4,
    view_projection: Mat4,
    view_position: Vec3,
    view_orientation: Quat,
    view_direction: Vec3,
    delta_time: f32,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            view_inverse: Mat4::IDENTITY,
            projection_aspect_inverse: Mat4::IDENTITY,
            view_projection: Mat4::IDENTITY,
            view_position: Vec3::ZERO,
            view_orientation: Quat::IDENTITY,
            view_direction: Vec3::Z,
            delta_time: 0.0,
        }
    }
}

/// The per-viewport pipeline and owner of all element instances.
#[derive(Debug)]
pub struct Context {
    id: u64,
    options: RwLock<ContextOptions>,
    touches: RwLock<HashMap<TouchId, Arc<Touch>>>,
    roots: RwLock<HashMap<ElementId, Arc<Element>>>,
    flat: RwLock<Vec<Arc<Element>>>,
    view: RwLock<ViewState>,
    elements_updated: Arc<AtomicBool>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Create a context with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(ContextOptions::default())
    }

    /// Create a context with explicit options.
    #[must_use]
    pub fn with_options(options: ContextOptions) -> Self {
        Self {
            id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed),
            options: RwLock::new(options),
            touches: RwLock::new(HashMap::new()),
            roots: RwLock::new(HashMap::new()),
            flat: RwLock::new(Vec::new()),
            view: RwLock::new(ViewState::default()),
            elements_updated: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The context's id; part of every owned touch's identity.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The current options.
    #[must_use]
    pub fn options(&self) -> ContextOptions {
        *self.options.read()
    }

    /// Replace the options. Takes effect at the next frame.
    pub fn set_options(&self, options: ContextOptions) {
        *self.options.write() = options;
    }

    /// The delta time of the current frame.
    #[must_use]
    pub fn delta_time(&self) -> f32 {
        self.view.read().delta_time
    }

    /// The inverse of the frame's view matrix.
    #[must_use]
    pub fn view_inverse(&self) -> Mat4 {
        self.view.read().view_inverse
    }

    /// The camera position extracted from the view.
    #[must_use]
    pub fn view_position(&self) -> Vec3 {
        self.view.read().view_position
    }

    /// The camera orientation extracted from the view.
    #[must_use]
    pub fn view_orientation(&self) -> Quat {
        self.view.read().view_orientation
    }

    /// The camera forward direction.
    #[must_use]
    pub fn view_direction(&self) -> Vec3 {
        self.view.read().view_direction
    }

    // --- element ownership ---

    /// Reconcile the root elements against a batch of prototypes.
    ///
    /// Prototypes whose ids exist update the matching instances; new ids
    /// instantiate (recursively, with their children). When
    /// `remove_missing` is set, roots absent from the batch start
    /// deletion. Duplicate ids within the batch are skipped with a log
    /// line.
    pub fn add_or_update_elements<'a, I>(&self, remove_missing: bool, prototypes: I)
    where
        I: IntoIterator<Item = &'a Prototype>,
    {
        let options = self.options();
        let mut seen: Vec<ElementId> = Vec::new();
        for proto in prototypes {
            if seen.contains(&proto.id) {
                warn!(id = proto.id, "skipping duplicate root id");
                continue;
            }
            seen.push(proto.id);
            let existing = self.roots.read().get(&proto.id).cloned();
            match existing {
                Some(element) => {
                    if !options.update_only_change_flagged || proto.change_flagged {
                        element.update_from(proto);
                    }
                }
                None => {
                    let element =
                        Element::instantiate(proto, self.id, self.elements_updated.clone());
                    self.roots.write().insert(proto.id, element);
                }
            }
        }
        if remove_missing {
            let missing: Vec<Arc<Element>> = self
                .roots
                .read()
                .values()
                .filter(|e| !seen.contains(&e.id()))
                .cloned()
                .collect();
            for element in missing {
                element.start_deletion();
            }
        }
        self.elements_updated.store(true, Ordering::Release);
    }

    /// Snapshot of the root elements.
    #[must_use]
    pub fn roots(&self) -> Vec<Arc<Element>> {
        self.roots.read().values().cloned().collect()
    }

    /// Snapshot of every element, in depth-first traversal order.
    #[must_use]
    pub fn elements(&self) -> Vec<Arc<Element>> {
        self.flat.read().clone()
    }

    /// Find any element by id.
    #[must_use]
    pub fn element_by_id(&self, id: ElementId) -> Option<Arc<Element>> {
        self.flat.read().iter().find(|e| e.id() == id).cloned()
    }

    /// The number of live elements.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.flat.read().len()
    }

    /// Snapshot of the touch table.
    #[must_use]
    pub fn touches(&self) -> Vec<Arc<Touch>> {
        self.touches.read().values().cloned().collect()
    }

    /// Look up a touch by id.
    #[must_use]
    pub fn touch_by_id(&self, id: TouchId) -> Option<Arc<Touch>> {
        self.touches.read().get(&id).cloned()
    }

    /// The number of live touches.
    #[must_use]
    pub fn touch_count(&self) -> usize {
        self.touches.read().len()
    }

    // --- the frame ---

    /// Advance one frame.
    ///
    /// `samples` is the frame's pointer batch; `view`, `projection`, and
    /// `aspect` are the host camera; `delta_time` is the frame delta in
    /// seconds. Not reentrant.
    ///
    /// # Errors
    ///
    /// [`FrameError::ConcurrencyViolation`] if an element transform was
    /// mutated by a foreign thread while hit-testing read it. Behavior
    /// panics and structural problems are logged, not returned.
    pub fn mainloop(
        &self,
        samples: &[TouchSample],
        view: Mat4,
        projection: Mat4,
        aspect: Mat4,
        delta_time: f32,
    ) -> Result<(), FrameError> {
        let options = self.options();

        // 1. Fold the camera into the cached view state.
        let view_inverse = view.inverse();
        let projection_aspect = projection * aspect.inverse();
        {
            let mut state = self.view.write();
            *state = ViewState {
                view_inverse,
                projection_aspect_inverse: projection_aspect.inverse(),
                view_projection: projection_aspect * view,
                view_position: view_inverse.w_axis.truncate(),
                view_orientation: Quat::from_mat4(&view_inverse),
                view_direction: view_inverse
                    .transform_vector3(Vec3::Z)
                    .normalize_or_zero(),
                delta_time,
            };
        }

        // 2. Drop touches that have been missing too long.
        self.touches
            .write()
            .retain(|_, touch| !touch.is_expired(options.consider_released_after));

        // 3. Advance per-touch frame counters.
        for touch in self.touches.read().values() {
            touch.step();
        }

        // 4. Detach fully-deleted elements; rebuild the flat list if the
        //    tree changed.
        self.sweep_deleted();
        if self.elements_updated.swap(false, Ordering::AcqRel) {
            self.rebuild_flat();
        }

        // 5. Ingest the input batch.
        {
            let mut touches = self.touches.write();
            for sample in samples {
                match touches.get(&sample.id) {
                    Some(touch) => {
                        touch.update_sample(sample.point, sample.force, options.minimum_force);
                    }
                    None => {
                        touches.insert(
                            sample.id,
                            Arc::new(Touch::new(
                                sample.id,
                                self.id,
                                sample.point,
                                sample.force,
                                options.minimum_force,
                            )),
                        );
                    }
                }
            }
        }

        let flat = self.flat.read().clone();

        // 6. Clear every element's hover set.
        for element in &flat {
            element.clear_hovering();
        }

        // 7. Hit-test each touch against the flat list.
        let touches: Vec<Arc<Touch>> = self.touches.read().values().cloned().collect();
        if options.use_parallel {
            let results: Vec<Result<(), FrameError>> = touches
                .par_iter()
                .map(|touch| self.hit_test_touch(touch, &flat))
                .collect();
            for result in results {
                result?;
            }
        } else {
            for touch in &touches {
                self.hit_test_touch(touch, &flat)?;
            }
        }

        // 8. Element phase, then the serialized behavior post-pass.
        if options.use_parallel {
            flat.par_iter().for_each(|element| element.mainloop_step(self));
        } else {
            for element in &flat {
                element.mainloop_step(self);
            }
        }
        for element in &flat {
            if element.has_serialized_behaviors() {
                element.run_serialized_behaviors(self);
            }
        }

        Ok(())
    }

    /// Hit-test one touch: build its world ray, test every active
    /// element, depth-sort, and keep the transparency-aware prefix.
    fn hit_test_touch(&self, touch: &Arc<Touch>, flat: &[Arc<Element>]) -> Result<(), FrameError> {
        let (projection_aspect_inverse, view_inverse, view_projection) = {
            let state = self.view.read();
            (
                state.projection_aspect_inverse,
                state.view_inverse,
                state.view_projection,
            )
        };
        touch.update_ray(&projection_aspect_inverse, &view_inverse);

        type Candidate = (usize, IntersectionPoint, Option<IntersectionPoint>, f32);
        let mut candidates: SmallVec<[Candidate; 8]> = SmallVec::new();
        for (index, element) in flat.iter().enumerate() {
            if !element.active() || element.delete_me() {
                continue;
            }
            let (hit, persistent) = element.checked_hit_test(touch)?;
            if let Some(ip) = hit {
                let depth = screen_depth(&view_projection, ip.world_point);
                candidates.push((index, ip, persistent, depth));
            }
        }

        // Nearest first by screen-space depth; NaN ties keep input order.
        candidates.sort_by(|a, b| a.3.partial_cmp(&b.3).unwrap_or(core::cmp::Ordering::Equal));

        // Transparent elements do not occlude; the first opaque element
        // terminates the chain.
        let mut attached: Vec<Arc<Element>> = Vec::new();
        for (index, ip, persistent, _) in candidates {
            let element = &flat[index];
            element.insert_hovering(TouchEntry {
                touch: touch.clone(),
                intersection: Some(ip),
                persistent,
            });
            attached.push(element.clone());
            if !element.transparent() {
                break;
            }
        }
        touch.set_attached_elements(attached);
        Ok(())
    }

    fn sweep_deleted(&self) {
        let flat = self.flat.read().clone();
        let mut removed = false;
        for element in &flat {
            if element.delete_me() && element.subtree_deleted() {
                element.emit_deleting();
                element.clear_touch_state();
                match element.parent() {
                    Some(parent) => parent.detach_child(element.id()),
                    None => {
                        self.roots.write().remove(&element.id());
                    }
                }
                removed = true;
            }
        }
        if removed {
            self.elements_updated.store(true, Ordering::Release);
        }
    }

    fn rebuild_flat(&self) {
        fn collect(element: &Arc<Element>, out: &mut Vec<Arc<Element>>) {
            out.push(element.clone());
            for child in element.children() {
                collect(&child, out);
            }
        }

        let mut flat = Vec::new();
        for root in self.roots.read().values() {
            collect(root, &mut flat);
        }
        debug!(context = self.id, elements = flat.len(), "rebuilt flat list");
        *self.flat.write() = flat;
    }
}

/// Screen-space depth of a world point: `z/w` in clip space.
fn screen_depth(view_projection: &Mat4, world: Vec3) -> f32 {
    let clip = *view_projection * world.extend(1.0);
    if clip.w.abs() < f32::EPSILON {
        f32::MAX
    } else {
        clip.z / clip.w
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_match_documented_defaults() {
        let options = ContextOptions::default();
        assert!(options.use_parallel);
        assert_eq!(options.consider_new_before, 1);
        assert_eq!(options.consider_released_after, 1);
        assert_eq!(options.minimum_force, -1.0);
        assert!(!options.update_only_change_flagged);
    }

    #[test]
    fn context_ids_are_unique() {
        assert_ne!(Context::new().id(), Context::new().id());
    }

    #[test]
    fn screen_depth_is_z_over_w() {
        let depth = screen_depth(&Mat4::IDENTITY, Vec3::new(0.0, 0.0, 0.75));
        assert!((depth - 0.75).abs() < 1e-6);
    }

    #[test]
    fn screen_depth_guards_degenerate_w() {
        let zero = Mat4::ZERO;
        assert_eq!(screen_depth(&zero, Vec3::ONE), f32::MAX);
    }
}
