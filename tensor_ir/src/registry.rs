// Copyright 2026 the Tensor VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-type structural-reduction registry.
//!
//! Each node type registers one reducer: a callback that compares two nodes
//! of that type by reducing them to comparisons of their children. The
//! registry is append-only after construction, so sharing it by reference
//! across threads is sound.

use alloc::boxed::Box;
use core::any::TypeId;

use hashbrown::HashMap;

use crate::object::{Object, ObjectRef};
use crate::reducer::SEqualReducer;

type ReduceFn = Box<dyn Fn(&dyn Object, &dyn Object, &mut SEqualReducer<'_, '_>) -> bool + Send + Sync>;

/// Registry of per-type structural reducers.
#[derive(Default)]
pub struct ReducerRegistry {
    reducers: HashMap<TypeId, ReduceFn>,
}

impl ReducerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in node set pre-registered.
    #[must_use]
    pub fn with_builtin_nodes() -> Self {
        let mut registry = Self::new();
        crate::nodes::register_builtin_nodes(&mut registry);
        crate::ndarray::register_ndarray(&mut registry);
        registry
    }

    /// Registers the structural reducer for node type `T`.
    ///
    /// The engine guarantees both operands have type `T` before dispatch.
    pub fn register<T: Object>(&mut self, f: fn(&T, &T, &mut SEqualReducer<'_, '_>) -> bool) {
        self.reducers.insert(
            TypeId::of::<T>(),
            Box::new(move |lhs: &dyn Object, rhs: &dyn Object, equal: &mut SEqualReducer<'_, '_>| {
                let (Some(lhs), Some(rhs)) = (
                    lhs.as_any().downcast_ref::<T>(),
                    rhs.as_any().downcast_ref::<T>(),
                ) else {
                    panic!("type-specific reducer invoked with mismatched node types");
                };
                f(lhs, rhs, equal)
            }),
        );
    }

    /// Returns `true` if node type `T` has a registered reducer.
    #[must_use]
    pub fn is_registered<T: Object>(&self) -> bool {
        self.reducers.contains_key(&TypeId::of::<T>())
    }

    /// Dispatches to the reducer registered for the nodes' type.
    ///
    /// # Panics
    ///
    /// Panics if the node type has no registered reducer.
    pub(crate) fn reduce(
        &self,
        lhs: &ObjectRef,
        rhs: &ObjectRef,
        equal: &mut SEqualReducer<'_, '_>,
    ) -> bool {
        let Some(f) = self.reducers.get(&lhs.node_type_id()) else {
            panic!(
                "structural equality of {} is not registered",
                lhs.type_key()
            );
        };
        f(lhs.get(), rhs.get(), equal)
    }
}
