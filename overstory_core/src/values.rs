// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Attached values: the per-element user and behavior-state bag.
//!
//! Every element carries an [`AttachedValues`]: a vector of floats, a
//! vector of strings, and a map from string key to an opaque
//! [`AuxValue`]. Hosts use the float/string vectors for their own wiring;
//! behaviors store their per-element state in the auxiliary map under a
//! reserved key prefix (see [`crate::behavior::state_key`]).
//!
//! Auxiliary values are type-erased but owning: they can be cloned and can
//! absorb the state of another value of the same underlying type. The
//! owner that stored a value downcasts it back; nothing else inspects it.

use core::any::Any;
use core::fmt;

use hashbrown::HashMap;

/// Contract for values storable in the auxiliary map.
///
/// Blanket-implemented for every `Clone + Send + Sync + 'static` type, so
/// behavior state structs need no manual implementation.
pub trait AuxObject: Any + Send + Sync {
    /// Clone into a new boxed value.
    fn clone_boxed(&self) -> Box<dyn AuxObject>;
    /// Copy state from `other` if it has the same underlying type;
    /// otherwise leave `self` unchanged.
    fn update_from(&mut self, other: &dyn AuxObject);
    /// Upcast for downcasting.
    fn as_any(&self) -> &dyn Any;
    /// Upcast for mutable downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Clone + Send + Sync + 'static> AuxObject for T {
    fn clone_boxed(&self) -> Box<dyn AuxObject> {
        Box::new(self.clone())
    }

    fn update_from(&mut self, other: &dyn AuxObject) {
        if let Some(other) = other.as_any().downcast_ref::<T>() {
            *self = other.clone();
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A type-erased owning auxiliary value.
pub struct AuxValue {
    inner: Box<dyn AuxObject>,
}

impl AuxValue {
    /// Wrap a concrete value.
    #[must_use]
    pub fn new<T: Clone + Send + Sync + 'static>(value: T) -> Self {
        Self {
            inner: Box::new(value),
        }
    }

    /// Downcast to a reference of `T`, if that is the underlying type.
    #[must_use]
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.inner.as_any().downcast_ref()
    }

    /// Downcast to a mutable reference of `T`, if that is the underlying
    /// type.
    #[must_use]
    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.inner.as_any_mut().downcast_mut()
    }

    /// Copy state from another value of the same underlying type.
    pub fn update_from(&mut self, other: &Self) {
        self.inner.update_from(other.inner.as_ref());
    }
}

impl Clone for AuxValue {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone_boxed(),
        }
    }
}

impl fmt::Debug for AuxValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuxValue").finish_non_exhaustive()
    }
}

/// The per-element value bag.
#[derive(Clone, Debug, Default)]
pub struct AttachedValues {
    /// Host-owned float slots.
    pub values: Vec<f32>,
    /// Host-owned string slots.
    pub strings: Vec<String>,
    auxiliary: HashMap<String, AuxValue>,
}

impl AttachedValues {
    /// Create an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an auxiliary value and downcast it.
    #[must_use]
    pub fn aux<T: 'static>(&self, key: &str) -> Option<&T> {
        self.auxiliary.get(key).and_then(AuxValue::get)
    }

    /// Look up an auxiliary value mutably and downcast it.
    #[must_use]
    pub fn aux_mut<T: 'static>(&mut self, key: &str) -> Option<&mut T> {
        self.auxiliary.get_mut(key).and_then(AuxValue::get_mut)
    }

    /// Store an auxiliary value, replacing any previous one under `key`.
    pub fn set_aux<T: Clone + Send + Sync + 'static>(&mut self, key: impl Into<String>, value: T) {
        self.auxiliary.insert(key.into(), AuxValue::new(value));
    }

    /// Remove an auxiliary value. Returns whether one existed.
    pub fn remove_aux(&mut self, key: &str) -> bool {
        self.auxiliary.remove(key).is_some()
    }

    /// Whether any auxiliary value is stored under `key`.
    #[must_use]
    pub fn has_aux(&self, key: &str) -> bool {
        self.auxiliary.contains_key(key)
    }

    /// Copy the contents of `other` into this bag.
    ///
    /// The float and string vectors are resized to the source lengths
    /// (zero-filling any growth) before copying. Auxiliary values present
    /// in both bags are updated in place through
    /// [`AuxValue::update_from`]; values only in `other` are cloned in;
    /// values only in `self` are kept.
    pub fn fill_from(&mut self, other: &Self) {
        self.values.resize(other.values.len(), 0.0);
        self.values.copy_from_slice(&other.values);
        self.strings.resize(other.strings.len(), String::new());
        self.strings.clone_from_slice(&other.strings);

        for (key, value) in &other.auxiliary {
            if let Some(existing) = self.auxiliary.get_mut(key) {
                existing.update_from(value);
            } else {
                self.auxiliary.insert(key.clone(), value.clone());
            }
        }
    }
}
