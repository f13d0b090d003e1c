// Copyright 2026 the Tensor VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Polymorphic graph nodes with reference identity.

use alloc::sync::Arc;
use core::any::{Any, TypeId};
use core::fmt;

/// A polymorphic graph node.
///
/// Nodes are compared structurally by registered reducers; their *identity*
/// is the address of the allocation behind an [`ObjectRef`].
pub trait Object: fmt::Debug + 'static {
    /// A stable, human-readable name for the node type, used in
    /// diagnostics.
    fn type_key(&self) -> &'static str;

    /// Upcast for downcasting to the concrete node type.
    fn as_any(&self) -> &dyn Any;
}

/// A shared reference to an [`Object`].
#[derive(Clone)]
pub struct ObjectRef(Arc<dyn Object>);

impl ObjectRef {
    /// Allocates `node` and returns a reference to it.
    pub fn new<T: Object>(node: T) -> Self {
        Self(Arc::new(node))
    }

    /// Returns `true` if `self` and `other` point at the same node.
    #[must_use]
    pub fn same_as(&self, other: &ObjectRef) -> bool {
        self.addr() == other.addr()
    }

    /// Returns the node's type key.
    #[must_use]
    pub fn type_key(&self) -> &'static str {
        self.0.type_key()
    }

    /// Returns the [`TypeId`] of the concrete node type.
    #[must_use]
    pub fn node_type_id(&self) -> TypeId {
        self.0.as_any().type_id()
    }

    /// Downcasts to a concrete node type.
    #[must_use]
    pub fn downcast_ref<T: Object>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref()
    }

    /// Returns the node as a trait object.
    #[must_use]
    pub fn get(&self) -> &dyn Object {
        &*self.0
    }

    /// The node's address, used as its identity in equality maps.
    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Leaf(i64);

    impl Object for Leaf {
        fn type_key(&self) -> &'static str {
            "Leaf"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn identity_is_by_address() {
        let a = ObjectRef::new(Leaf(1));
        let b = ObjectRef::new(Leaf(1));
        let a2 = a.clone();
        assert!(a.same_as(&a2));
        assert!(!a.same_as(&b));
    }

    #[test]
    fn downcasting() {
        let a = ObjectRef::new(Leaf(7));
        assert_eq!(a.downcast_ref::<Leaf>().unwrap().0, 7);
        assert_eq!(a.type_key(), "Leaf");
        assert_eq!(a.node_type_id(), TypeId::of::<Leaf>());
    }
}
