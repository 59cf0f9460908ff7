// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Elements: the stateful per-context instances of prototypes.
//!
//! ## Overview
//!
//! An element is the context-owned realization of one [`Prototype`]. It
//! keeps what a frame needs and nothing a descriptor should own: the live
//! display transform (with its damped follow target), the cached world
//! matrix pair, the fade lifecycle, the three touch maps, children, and
//! the per-element value bag and event surface.
//!
//! ## Concurrency
//!
//! Elements are shared as `Arc<Element>` and written from two places: the
//! hit-test phase inserts into `hovering` (one worker per touch), and the
//! element phase mutates everything else (one worker per element, each
//! touching only its own element and — read-only — its ancestors). Every
//! map sits behind its own lock; no lock is held across an event emission.
//!
//! ## World matrices
//!
//! The cached world matrix revalidates lazily: it stores the transform
//! version and parent stamp it was computed from, and any read that
//! observes either moved recomputes. A transform mutation therefore never
//! walks the tree; descendants notice on their next read.

use core::any::Any;
use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};

use glam::Mat4;
use hashbrown::HashMap;
use overstory_hit::{ElementRayHit, IntersectionPoint, ShapeKind, intersect};
use overstory_transform::{ApplyTransformMode, Transform};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::behavior::Behavior;
use crate::context::Context;
use crate::error::FrameError;
use crate::events::{ElementEvents, MouseButtonArgs, MouseWheelArgs, TouchEventArgs};
use crate::fade::{FadePhase, FadeState, FadeTiming};
use crate::prototype::{ElementId, Prototype, SubContextOptions, next_element_id};
use crate::subcontext::SubContext;
use crate::touch::{Touch, TouchKey};
use crate::values::AttachedValues;

/// One touch's presence in an element touch map.
#[derive(Clone, Debug)]
pub struct TouchEntry {
    /// The touch itself.
    pub touch: Arc<Touch>,
    /// This frame's intersection, `None` once the touch slid off the
    /// shape while still interacting.
    pub intersection: Option<IntersectionPoint>,
    /// The bounds-ignored intersection planar behaviors keep using after
    /// a slide-off.
    pub persistent: Option<IntersectionPoint>,
}

/// Mirrors the scalar settings of the element's prototype.
#[derive(Clone, Debug)]
pub(crate) struct ElementConfig {
    pub name: String,
    pub active: bool,
    pub transparent: bool,
    pub only_hit_if_parent_is_hit: bool,
    pub transform_application: ApplyTransformMode,
    pub transformation_follow_time: f32,
    pub fade: FadeTiming,
    pub sub_context: Option<SubContextOptions>,
}

#[derive(Clone, Debug)]
struct WorldCache {
    matrix: Mat4,
    inverse: Mat4,
    local_version: u64,
    parent_stamp: u64,
    valid: bool,
}

impl WorldCache {
    fn new() -> Self {
        Self {
            matrix: Mat4::IDENTITY,
            inverse: Mat4::IDENTITY,
            local_version: 0,
            parent_stamp: 0,
            valid: false,
        }
    }
}

/// A stateful element instance. See the module docs.
pub struct Element {
    id: ElementId,
    context_id: u64,
    config: RwLock<ElementConfig>,
    shape: RwLock<ShapeKind>,
    display_transform: Transform,
    target_transform: Transform,
    world: Mutex<WorldCache>,
    world_stamp: AtomicU64,
    parent: RwLock<Weak<Element>>,
    children: RwLock<HashMap<ElementId, Arc<Element>>>,
    hovering: Mutex<HashMap<TouchKey, TouchEntry>>,
    hitting: Mutex<HashMap<TouchKey, TouchEntry>>,
    touching: Mutex<HashMap<TouchKey, TouchEntry>>,
    fade: Mutex<FadeState>,
    delete_me: AtomicBool,
    hit_flag: AtomicBool,
    touched_flag: AtomicBool,
    age: Mutex<f32>,
    value: RwLock<AttachedValues>,
    environment: RwLock<Option<Arc<dyn Any + Send + Sync>>>,
    behaviors: RwLock<Vec<Arc<dyn Behavior>>>,
    events: ElementEvents,
    sub_context: Mutex<Option<SubContext>>,
    tree_changed: Arc<AtomicBool>,
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = self.config.read();
        f.debug_struct("Element")
            .field("id", &self.id)
            .field("name", &config.name)
            .field("active", &config.active)
            .field("fade_phase", &self.fade.lock().phase())
            .field("children", &self.children.read().len())
            .finish_non_exhaustive()
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.context_id == other.context_id
    }
}

impl Eq for Element {}

impl Element {
    pub(crate) fn instantiate(
        proto: &Prototype,
        context_id: u64,
        tree_changed: Arc<AtomicBool>,
    ) -> Arc<Self> {
        let element = Arc::new(Self {
            id: proto.id,
            context_id,
            config: RwLock::new(ElementConfig {
                name: proto.name.clone(),
                active: proto.active,
                transparent: proto.transparent,
                only_hit_if_parent_is_hit: proto.only_hit_if_parent_is_hit,
                transform_application: proto.transform_application,
                transformation_follow_time: proto.transformation_follow_time,
                fade: proto.fade,
                sub_context: proto.sub_context,
            }),
            shape: RwLock::new(proto.shape.clone()),
            display_transform: Transform::from_srt(proto.display_transform),
            target_transform: Transform::from_srt(proto.display_transform),
            world: Mutex::new(WorldCache::new()),
            world_stamp: AtomicU64::new(1),
            parent: RwLock::new(Weak::new()),
            children: RwLock::new(HashMap::new()),
            hovering: Mutex::new(HashMap::new()),
            hitting: Mutex::new(HashMap::new()),
            touching: Mutex::new(HashMap::new()),
            fade: Mutex::new(FadeState::new()),
            delete_me: AtomicBool::new(false),
            hit_flag: AtomicBool::new(false),
            touched_flag: AtomicBool::new(false),
            age: Mutex::new(0.0),
            value: RwLock::new(proto.attached_values.clone().unwrap_or_default()),
            environment: RwLock::new(proto.environment.clone()),
            behaviors: RwLock::new(proto.behaviors.clone()),
            events: ElementEvents::default(),
            sub_context: Mutex::new(proto.sub_context.map(SubContext::new)),
            tree_changed,
        });
        for child_proto in proto.children.values() {
            if child_proto.id == proto.id {
                warn!(id = proto.id, "skipping child with its parent's id");
                continue;
            }
            let child = Self::instantiate(child_proto, context_id, element.tree_changed.clone());
            *child.parent.write() = Arc::downgrade(&element);
            element.children.write().insert(child.id, child);
        }
        element
    }

    /// The element's id; equal to the id of the prototype it realizes.
    #[must_use]
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// The element's display name.
    #[must_use]
    pub fn name(&self) -> String {
        self.config.read().name.clone()
    }

    /// Whether hit-testing considers this element.
    #[must_use]
    pub fn active(&self) -> bool {
        self.config.read().active
    }

    /// Whether this element lets rays pass through to elements behind it.
    #[must_use]
    pub fn transparent(&self) -> bool {
        self.config.read().transparent
    }

    /// The current hit-test shape.
    #[must_use]
    pub fn shape(&self) -> ShapeKind {
        self.shape.read().clone()
    }

    /// The live transform; what renderers should read.
    #[must_use]
    pub fn display_transform(&self) -> &Transform {
        &self.display_transform
    }

    /// The damped-follow target transform.
    #[must_use]
    pub fn target_transform(&self) -> &Transform {
        &self.target_transform
    }

    /// The element's world matrix.
    #[must_use]
    pub fn display_matrix(&self) -> Mat4 {
        self.world_matrices().0
    }

    /// The inverse of the element's world matrix.
    #[must_use]
    pub fn inverse_display_matrix(&self) -> Mat4 {
        self.world_matrices().1
    }

    /// The parent element, if any.
    #[must_use]
    pub fn parent(&self) -> Option<Arc<Self>> {
        self.parent.read().upgrade()
    }

    /// Snapshot of the children.
    #[must_use]
    pub fn children(&self) -> Vec<Arc<Self>> {
        self.children.read().values().cloned().collect()
    }

    /// Look up a child by id.
    #[must_use]
    pub fn child(&self, id: ElementId) -> Option<Arc<Self>> {
        self.children.read().get(&id).cloned()
    }

    /// The lifecycle phase.
    #[must_use]
    pub fn fade_phase(&self) -> FadePhase {
        self.fade.lock().phase()
    }

    /// The renderer-facing fade scalar in `[0, 1]`.
    #[must_use]
    pub fn element_fade(&self) -> f32 {
        self.fade.lock().element_fade()
    }

    /// Whether the element is flagged for removal at the next rebuild.
    #[must_use]
    pub fn delete_me(&self) -> bool {
        self.delete_me.load(Ordering::Acquire)
    }

    /// Whether any touch hit the element last frame.
    #[must_use]
    pub fn hit(&self) -> bool {
        self.hit_flag.load(Ordering::Acquire)
    }

    /// Whether any touch is interacting with the element.
    #[must_use]
    pub fn touched(&self) -> bool {
        self.touched_flag.load(Ordering::Acquire)
    }

    /// Seconds since the element was instantiated.
    #[must_use]
    pub fn age(&self) -> f32 {
        *self.age.lock()
    }

    /// The event surface.
    #[must_use]
    pub fn events(&self) -> &ElementEvents {
        &self.events
    }

    /// Snapshot of this frame's hover entries.
    #[must_use]
    pub fn hovering(&self) -> Vec<TouchEntry> {
        self.hovering.lock().values().cloned().collect()
    }

    /// Snapshot of the touches currently hitting the element.
    #[must_use]
    pub fn hitting(&self) -> Vec<TouchEntry> {
        self.hitting.lock().values().cloned().collect()
    }

    /// Snapshot of the touches currently interacting with the element.
    #[must_use]
    pub fn touching(&self) -> Vec<TouchEntry> {
        self.touching.lock().values().cloned().collect()
    }

    /// Read the value bag.
    #[must_use]
    pub fn values(&self) -> AttachedValues {
        self.value.read().clone()
    }

    /// Edit the value bag in place.
    pub fn update_values<R>(&self, f: impl FnOnce(&mut AttachedValues) -> R) -> R {
        f(&mut self.value.write())
    }

    /// The opaque host object attached to this element, if any.
    #[must_use]
    pub fn environment(&self) -> Option<Arc<dyn Any + Send + Sync>> {
        self.environment.read().clone()
    }

    /// Fetch a behavior's per-element state. Absence is not an error.
    #[must_use]
    pub fn behavior_state<T: Clone + Send + Sync + 'static>(&self, behavior_id: &str) -> Option<T> {
        self.value
            .read()
            .aux::<T>(&crate::behavior::state_key(behavior_id))
            .cloned()
    }

    /// Store a behavior's per-element state.
    pub fn set_behavior_state<T: Clone + Send + Sync + 'static>(
        &self,
        behavior_id: &str,
        state: T,
    ) {
        self.value
            .write()
            .set_aux(crate::behavior::state_key(behavior_id), state);
    }

    /// Run `f` with the element's nested context, if it hosts one.
    pub fn with_sub_context<R>(&self, f: impl FnOnce(&Context) -> R) -> Option<R> {
        self.sub_context.lock().as_ref().map(|sub| f(sub.context()))
    }

    // --- hit testing ---

    fn world_matrices(&self) -> (Mat4, Mat4) {
        let (m, inv, _) = self.world_matrices_stamped();
        (m, inv)
    }

    fn world_matrices_stamped(&self) -> (Mat4, Mat4, u64) {
        let parent = self.parent.read().upgrade();
        let (parent_matrix, parent_stamp) = match &parent {
            Some(p) => {
                let (m, _, stamp) = p.world_matrices_stamped();
                (m, stamp)
            }
            None => (Mat4::IDENTITY, 0),
        };
        let local_version = self.display_transform.version();
        let mut cache = self.world.lock();
        if !cache.valid
            || cache.local_version != local_version
            || cache.parent_stamp != parent_stamp
        {
            let matrix = parent_matrix * self.display_transform.matrix();
            cache.matrix = matrix;
            cache.inverse = matrix.inverse();
            cache.local_version = local_version;
            cache.parent_stamp = parent_stamp;
            cache.valid = true;
            self.world_stamp.fetch_add(1, Ordering::Release);
        }
        (
            cache.matrix,
            cache.inverse,
            self.world_stamp.load(Ordering::Acquire),
        )
    }

    /// The shape-only hit test, ignoring the parent gate.
    ///
    /// Returns `(hit, persistent)`: the bounded intersection, and the
    /// bounds-ignored one planar behaviors keep using after a slide-off.
    #[must_use]
    pub fn pure_hit_test(
        &self,
        touch: &Touch,
        use_previous_position: bool,
    ) -> (Option<IntersectionPoint>, Option<IntersectionPoint>) {
        let (matrix, inverse) = self.world_matrices();
        self.hit_with_matrices(touch, use_previous_position, &matrix, &inverse)
    }

    /// The full hit test: [`pure_hit_test`](Self::pure_hit_test) gated by
    /// `only_hit_if_parent_is_hit` against the parent's current-frame
    /// geometry.
    #[must_use]
    pub fn hit_test(
        &self,
        touch: &Touch,
        use_previous_position: bool,
    ) -> (Option<IntersectionPoint>, Option<IntersectionPoint>) {
        if self.config.read().only_hit_if_parent_is_hit
            && let Some(parent) = self.parent()
            && parent.pure_hit_test(touch, use_previous_position).0.is_none()
        {
            return (None, None);
        }
        self.pure_hit_test(touch, use_previous_position)
    }

    /// Hit test for the hit-test phase: fails the frame if the transform
    /// is observed mutating underneath the test.
    pub(crate) fn checked_hit_test(
        &self,
        touch: &Touch,
    ) -> Result<(Option<IntersectionPoint>, Option<IntersectionPoint>), FrameError> {
        let version_before = self.display_transform.version();
        let result = self.hit_test(touch, false);
        if self.display_transform.version() != version_before {
            return Err(FrameError::ConcurrencyViolation { element: self.id });
        }
        Ok(result)
    }

    fn hit_with_matrices(
        &self,
        touch: &Touch,
        use_previous_position: bool,
        matrix: &Mat4,
        inverse: &Mat4,
    ) -> (Option<IntersectionPoint>, Option<IntersectionPoint>) {
        let shape = self.shape.read().clone();
        let ray = if use_previous_position {
            touch.previous_ray()
        } else {
            touch.ray()
        };
        let element_ray = ray.transformed(inverse);
        let (hit, persistent) = intersect(&shape, &element_ray);
        (
            hit.map(|h| self.intersection_point(touch, matrix, &h)),
            persistent.map(|h| self.intersection_point(touch, matrix, &h)),
        )
    }

    fn intersection_point(
        &self,
        touch: &Touch,
        world_matrix: &Mat4,
        hit: &ElementRayHit,
    ) -> IntersectionPoint {
        IntersectionPoint {
            element_id: self.id,
            touch_id: touch.id(),
            world_point: world_matrix.transform_point3(hit.element_point),
            element_point: hit.element_point,
            surface_point: hit.surface_point,
            world_frame: *world_matrix * hit.element_frame,
            element_frame: hit.element_frame,
        }
    }

    pub(crate) fn clear_hovering(&self) {
        self.hovering.lock().clear();
    }

    pub(crate) fn insert_hovering(&self, entry: TouchEntry) {
        self.hovering.lock().insert(entry.touch.key(), entry);
    }

    // --- reconciliation ---

    /// Apply a prototype's settings to this instance.
    ///
    /// The display transform is written through the prototype's apply
    /// mask — into the follow target when a follow time is configured,
    /// directly otherwise. If the element was fading out, it revives per
    /// the lifecycle rules. Children are reconciled recursively with the
    /// prototype's child set as the source of truth.
    pub fn update_from(self: &Arc<Self>, proto: &Prototype) {
        debug_assert_eq!(self.id, proto.id, "update_from across ids");
        {
            let mut config = self.config.write();
            config.name = proto.name.clone();
            config.active = proto.active;
            config.transparent = proto.transparent;
            config.only_hit_if_parent_is_hit = proto.only_hit_if_parent_is_hit;
            config.transform_application = proto.transform_application;
            config.transformation_follow_time = proto.transformation_follow_time;
            config.fade = proto.fade;
            config.sub_context = proto.sub_context;
        }
        *self.shape.write() = proto.shape.clone();
        if let Some(values) = &proto.attached_values {
            self.value.write().fill_from(values);
        }
        *self.environment.write() = proto.environment.clone();
        *self.behaviors.write() = proto.behaviors.clone();

        self.target_transform
            .update_from(&proto.display_transform, proto.transform_application);
        if proto.transformation_follow_time <= 0.0 {
            self.display_transform
                .update_from(&proto.display_transform, proto.transform_application);
        }

        {
            let mut sub = self.sub_context.lock();
            match (proto.sub_context, sub.is_some()) {
                (Some(options), false) => *sub = Some(SubContext::new(options)),
                (Some(options), true) => {
                    if let Some(existing) = sub.as_mut() {
                        existing.set_options(options);
                    }
                }
                (None, true) => *sub = None,
                (None, false) => {}
            }
        }

        if self.fade.lock().revive() {
            debug!(id = self.id, "revived out of fade-out");
        }

        self.update_children(true, proto.children.values());
    }

    /// Reconcile this element's children against a set of prototypes.
    ///
    /// Matching ids update in place, new ids instantiate (wired to this
    /// element), and, when `remove_missing` is set, children absent from
    /// the input start deletion. A prototype reusing this element's own id
    /// or duplicating an id earlier in the batch is skipped with a log
    /// line.
    pub fn update_children<'a, I>(self: &Arc<Self>, remove_missing: bool, prototypes: I)
    where
        I: IntoIterator<Item = &'a Prototype>,
    {
        let mut seen: Vec<ElementId> = Vec::new();
        for proto in prototypes {
            if proto.id == self.id {
                warn!(id = proto.id, "skipping child with its parent's id");
                continue;
            }
            if seen.contains(&proto.id) {
                warn!(id = proto.id, "skipping duplicate child id");
                continue;
            }
            seen.push(proto.id);
            let existing = self.children.read().get(&proto.id).cloned();
            match existing {
                Some(child) => child.update_from(proto),
                None => {
                    let child =
                        Self::instantiate(proto, self.context_id, self.tree_changed.clone());
                    *child.parent.write() = Arc::downgrade(self);
                    self.children.write().insert(child.id, child);
                }
            }
        }
        if remove_missing {
            let missing: Vec<Arc<Self>> = self
                .children
                .read()
                .values()
                .filter(|c| !seen.contains(&c.id))
                .cloned()
                .collect();
            for child in missing {
                child.start_deletion();
            }
        }
        self.tree_changed.store(true, Ordering::Release);
        self.events.children_updated.emit(&());
    }

    /// Copy this element (and its subtree) back into a prototype.
    ///
    /// With `regenerate_ids`, the copy gets fresh ids throughout; it then
    /// instantiates alongside the original instead of reconciling onto it.
    #[must_use]
    pub fn to_prototype(&self, regenerate_ids: bool) -> Prototype {
        let config = self.config.read().clone();
        let mut proto = Prototype {
            id: if regenerate_ids {
                next_element_id()
            } else {
                self.id
            },
            name: config.name,
            active: config.active,
            transparent: config.transparent,
            fade: config.fade,
            transformation_follow_time: config.transformation_follow_time,
            display_transform: self.display_transform.srt(),
            behaviors: self.behaviors.read().clone(),
            attached_values: Some(self.value.read().clone()),
            environment: self.environment.read().clone(),
            only_hit_if_parent_is_hit: config.only_hit_if_parent_is_hit,
            transform_application: config.transform_application,
            sub_context: config.sub_context,
            children: HashMap::new(),
            parent_id: None,
            shape: self.shape.read().clone(),
            change_flagged: false,
        };
        for child in self.children.read().values() {
            let mut child_proto = child.to_prototype(regenerate_ids);
            child_proto.parent_id = Some(proto.id);
            proto.children.insert(child_proto.id, child_proto);
        }
        proto
    }

    // --- lifecycle ---

    /// Start deleting this element and, transitively, its children.
    ///
    /// Children enter fade-out first. Emits `deletion_started`; with a
    /// zero fade-out ramp and delay the element is flagged for removal in
    /// the same call.
    pub fn start_deletion(&self) {
        let children: Vec<Arc<Self>> = self.children.read().values().cloned().collect();
        for child in children {
            child.start_deletion();
        }
        let started = {
            let timing = self.config.read().fade;
            self.fade.lock().start_deletion(&timing)
        };
        if let Some(synchronous) = started {
            debug!(id = self.id, synchronous, "deletion started");
            if synchronous {
                self.delete_me.store(true, Ordering::Release);
            }
            self.events.deletion_started.emit(&());
        }
    }

    pub(crate) fn subtree_deleted(&self) -> bool {
        self.delete_me.load(Ordering::Acquire)
            && self
                .children
                .read()
                .values()
                .all(|child| child.subtree_deleted())
    }

    /// Silent cleanup at removal: deletion does not emit touch-end events.
    pub(crate) fn clear_touch_state(&self) {
        self.hovering.lock().clear();
        self.hitting.lock().clear();
        self.touching.lock().clear();
        self.hit_flag.store(false, Ordering::Release);
        self.touched_flag.store(false, Ordering::Release);
    }

    pub(crate) fn detach_child(&self, id: ElementId) {
        self.children.write().remove(&id);
    }

    pub(crate) fn emit_deleting(&self) {
        self.events.deleting.emit(&());
    }

    // --- the per-frame element step ---

    pub(crate) fn mainloop_step(self: &Arc<Self>, context: &Context) {
        self.events.main_loop_begin.emit(&());
        let dt = context.delta_time();
        let options = context.options();
        let released_after = options.consider_released_after;

        // (a) End interactions whose touch expired or released.
        let ended: Vec<TouchEntry> = {
            let mut touching = self.touching.lock();
            let mut ended = Vec::new();
            touching.retain(|_, entry| {
                if entry.touch.is_expired(released_after) || !entry.touch.pressed() {
                    ended.push(entry.clone());
                    false
                } else {
                    true
                }
            });
            ended
        };
        for entry in &ended {
            self.events.touch_end.emit(&TouchEventArgs {
                touch: entry.touch.clone(),
                intersection: entry.intersection.clone(),
            });
        }
        if let Some(last) = ended.last()
            && self.touching.lock().is_empty()
        {
            self.events.interaction_end.emit(&TouchEventArgs {
                touch: last.touch.clone(),
                intersection: None,
            });
        }

        // (b) End hits whose touch expired.
        let hit_ended: Vec<TouchEntry> = {
            let mut hitting = self.hitting.lock();
            let mut ended = Vec::new();
            hitting.retain(|_, entry| {
                if entry.touch.is_expired(released_after) {
                    ended.push(entry.clone());
                    false
                } else {
                    true
                }
            });
            ended
        };
        for entry in &hit_ended {
            self.events.hit_end.emit(&TouchEventArgs {
                touch: entry.touch.clone(),
                intersection: entry.intersection.clone(),
            });
        }

        // (c)+(d) Refresh intersections from the current frame. A hitting
        // touch that no longer hits slid off: the hit ends, while a
        // touching entry stays with an empty intersection slot.
        let slid_off: Vec<TouchEntry> = {
            let mut hitting = self.hitting.lock();
            let mut ended = Vec::new();
            hitting.retain(|_, entry| {
                let (hit, persistent) = self.hit_test(&entry.touch, false);
                match hit {
                    Some(ip) => {
                        entry.intersection = Some(ip);
                        entry.persistent = persistent;
                        true
                    }
                    None => {
                        ended.push(entry.clone());
                        false
                    }
                }
            });
            ended
        };
        for entry in &slid_off {
            self.events.hit_end.emit(&TouchEventArgs {
                touch: entry.touch.clone(),
                intersection: None,
            });
        }
        {
            let mut touching = self.touching.lock();
            for entry in touching.values_mut() {
                let (hit, persistent) = self.hit_test(&entry.touch, false);
                entry.intersection = hit;
                if persistent.is_some() {
                    entry.persistent = persistent;
                }
            }
        }

        // (e) Advance the fade lifecycle.
        let fade_result = {
            let timing = self.config.read().fade;
            self.fade.lock().step(dt, &timing)
        };
        if fade_result.faded_in {
            self.events.faded_in.emit(&());
        }
        if fade_result.deleted {
            self.delete_me.store(true, Ordering::Release);
        }

        // (f) Mouse-derived events from attached-mouse touches.
        let hitting_snapshot: Vec<TouchEntry> = self.hitting.lock().values().cloned().collect();
        for entry in &hitting_snapshot {
            let Some(input) = entry.touch.mouse_frame_input() else {
                continue;
            };
            if input.wheel.y != 0.0 {
                self.events.vertical_mouse_wheel_change.emit(&MouseWheelArgs {
                    touch: entry.touch.clone(),
                    delta: input.wheel.y,
                });
            }
            if input.wheel.x != 0.0 {
                self.events
                    .horizontal_mouse_wheel_change
                    .emit(&MouseWheelArgs {
                        touch: entry.touch.clone(),
                        delta: input.wheel.x,
                    });
            }
            for button in &input.pressed {
                self.events.mouse_button_pressed.emit(&MouseButtonArgs {
                    touch: entry.touch.clone(),
                    button: *button,
                });
            }
            for button in &input.released {
                self.events.mouse_button_released.emit(&MouseButtonArgs {
                    touch: entry.touch.clone(),
                    button: *button,
                });
            }
        }

        // (g) Damp the display transform toward its target.
        let (follow_time, apply_mask) = {
            let config = self.config.read();
            (
                config.transformation_follow_time,
                config.transform_application,
            )
        };
        if follow_time > 0.0 {
            self.display_transform
                .follow(&self.target_transform.srt(), follow_time, dt, apply_mask);
        }

        // (h) Interacting tick.
        let interacting = self.touching.lock().values().next().cloned();
        if let Some(entry) = interacting {
            self.events.interacting.emit(&TouchEventArgs {
                touch: entry.touch.clone(),
                intersection: entry.intersection.clone(),
            });
        }

        // (i) Behaviors, in list order. Panics are contained per element.
        let behaviors = self.behaviors.read().clone();
        for behavior in &behaviors {
            if behavior.serialized() {
                continue;
            }
            let outcome = catch_unwind(AssertUnwindSafe(|| behavior.behave(self, context)));
            if outcome.is_err() {
                warn!(
                    element = self.id,
                    behavior = behavior.id(),
                    "behavior panicked; skipping for this frame"
                );
            }
        }

        // (j) Wire this frame's hovers into hits and interactions.
        let hovering_snapshot: Vec<TouchEntry> = self.hovering.lock().values().cloned().collect();
        for entry in hovering_snapshot {
            let key = entry.touch.key();
            let newly_hit = {
                let mut hitting = self.hitting.lock();
                match hitting.get_mut(&key) {
                    Some(existing) => {
                        existing.intersection = entry.intersection.clone();
                        if entry.persistent.is_some() {
                            existing.persistent = entry.persistent.clone();
                        }
                        false
                    }
                    None => {
                        hitting.insert(key, entry.clone());
                        true
                    }
                }
            };
            if newly_hit {
                self.events.hit_begin.emit(&TouchEventArgs {
                    touch: entry.touch.clone(),
                    intersection: entry.intersection.clone(),
                });
            }
            self.fire_interaction_touch_begin(&entry, options.consider_new_before);
        }

        // Refresh the exposed flags from the reconciled maps.
        self.hit_flag
            .store(!self.hitting.lock().is_empty(), Ordering::Release);
        self.touched_flag
            .store(!self.touching.lock().is_empty(), Ordering::Release);

        *self.age.lock() += dt;

        // The nested context runs after the host element's own step.
        self.step_sub_context(dt);

        self.events.main_loop_end.emit(&());
    }

    /// Begin an interaction for a hovered touch if it qualifies: the touch
    /// must be newly pressed, pressed right now, and not already
    /// interacting here.
    fn fire_interaction_touch_begin(&self, entry: &TouchEntry, consider_new_before: u32) {
        if !entry.touch.pressed() || !entry.touch.is_new(consider_new_before) {
            return;
        }
        let key = entry.touch.key();
        let was_empty = {
            let mut touching = self.touching.lock();
            if touching.contains_key(&key) {
                return;
            }
            let was_empty = touching.is_empty();
            touching.insert(key, entry.clone());
            was_empty
        };
        let args = TouchEventArgs {
            touch: entry.touch.clone(),
            intersection: entry.intersection.clone(),
        };
        if was_empty {
            self.events.interaction_begin.emit(&args);
        }
        self.events.touch_begin.emit(&args);
    }

    pub(crate) fn run_serialized_behaviors(self: &Arc<Self>, context: &Context) {
        let behaviors = self.behaviors.read().clone();
        for behavior in &behaviors {
            if !behavior.serialized() {
                continue;
            }
            let outcome = catch_unwind(AssertUnwindSafe(|| behavior.behave(self, context)));
            if outcome.is_err() {
                warn!(
                    element = self.id,
                    behavior = behavior.id(),
                    "serialized behavior panicked; skipping for this frame"
                );
            }
        }
    }

    pub(crate) fn has_serialized_behaviors(&self) -> bool {
        self.behaviors.read().iter().any(|b| b.serialized())
    }

    fn step_sub_context(self: &Arc<Self>, dt: f32) {
        let mut guard = self.sub_context.lock();
        if let Some(sub) = guard.as_mut() {
            sub.step(self, dt);
        }
    }
}
