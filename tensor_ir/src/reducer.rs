// Copyright 2026 the Tensor VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The reducer facade handed to per-type reducers.
//!
//! A reducer compares two nodes by reducing them to comparisons of their
//! children through this facade: typed leaf comparisons return immediately,
//! object comparisons enqueue work on the engine's task stack.
//!
//! Call sites pass an [`AttrLens`] naming the attribute being compared, so
//! mismatch paths can be synthesized without reflection. When path tracing
//! is disabled no path values are constructed at all.

use tensor_vm::dtype::DataType;

use crate::equal::SEqualHandler;
use crate::object::{Object, ObjectRef};
use crate::path::ObjectPathPair;
use crate::value::Value;

/// Names the attribute a reducer is currently comparing.
#[derive(Clone, Copy, Debug)]
pub enum AttrLens<'a> {
    /// A named field.
    Attr(&'a str),
    /// An array element of the current node.
    Index(usize),
    /// An element of a named array field.
    AttrIndex(&'a str, usize),
    /// Explicit precomputed paths.
    Paths(&'a ObjectPathPair),
}

/// Typed comparison helpers for a per-type reducer invocation.
pub struct SEqualReducer<'h, 'r> {
    handler: &'h mut SEqualHandler<'r>,
    current_paths: Option<ObjectPathPair>,
    map_free_vars: bool,
}

impl<'h, 'r> SEqualReducer<'h, 'r> {
    pub(crate) fn new(
        handler: &'h mut SEqualHandler<'r>,
        current_paths: Option<ObjectPathPair>,
        map_free_vars: bool,
    ) -> Self {
        Self {
            handler,
            current_paths,
            map_free_vars,
        }
    }

    fn paths_from_lens(&self, lens: &AttrLens<'_>) -> Option<ObjectPathPair> {
        let current = self.current_paths.as_ref()?;
        Some(match lens {
            AttrLens::Attr(name) => ObjectPathPair::new(
                current.lhs_path().attr(name),
                current.rhs_path().attr(name),
            ),
            AttrLens::Index(i) => ObjectPathPair::new(
                current.lhs_path().index(*i),
                current.rhs_path().index(*i),
            ),
            AttrLens::AttrIndex(name, i) => ObjectPathPair::new(
                current.lhs_path().attr(name).index(*i),
                current.rhs_path().attr(name).index(*i),
            ),
            AttrLens::Paths(paths) => (*paths).clone(),
        })
    }

    fn record_lens_mismatch(&mut self, lens: &AttrLens<'_>) {
        if let Some(paths) = self.paths_from_lens(lens) {
            self.handler.record_mismatch(paths);
        }
    }

    fn leaf<T: PartialEq + ?Sized>(&mut self, lens: AttrLens<'_>, lhs: &T, rhs: &T) -> bool {
        if lhs == rhs {
            return true;
        }
        self.record_lens_mismatch(&lens);
        false
    }

    /// Compares two booleans.
    pub fn bools(&mut self, lens: AttrLens<'_>, lhs: bool, rhs: bool) -> bool {
        self.leaf(lens, &lhs, &rhs)
    }

    /// Compares two signed integers.
    pub fn ints(&mut self, lens: AttrLens<'_>, lhs: i64, rhs: i64) -> bool {
        self.leaf(lens, &lhs, &rhs)
    }

    /// Compares two unsigned integers.
    pub fn uints(&mut self, lens: AttrLens<'_>, lhs: u64, rhs: u64) -> bool {
        self.leaf(lens, &lhs, &rhs)
    }

    /// Compares two floats (`==`, so NaN never equals NaN).
    pub fn floats(&mut self, lens: AttrLens<'_>, lhs: f64, rhs: f64) -> bool {
        self.leaf(lens, &lhs, &rhs)
    }

    /// Compares two strings.
    pub fn strs(&mut self, lens: AttrLens<'_>, lhs: &str, rhs: &str) -> bool {
        self.leaf(lens, lhs, rhs)
    }

    /// Compares two data types.
    pub fn dtypes(&mut self, lens: AttrLens<'_>, lhs: DataType, rhs: DataType) -> bool {
        self.leaf(lens, &lhs, &rhs)
    }

    /// Compares two optional integers.
    pub fn opt_ints(&mut self, lens: AttrLens<'_>, lhs: Option<i64>, rhs: Option<i64>) -> bool {
        self.leaf(lens, &lhs, &rhs)
    }

    /// Compares two optional floats.
    pub fn opt_floats(&mut self, lens: AttrLens<'_>, lhs: Option<f64>, rhs: Option<f64>) -> bool {
        self.leaf(lens, &lhs, &rhs)
    }

    /// Compares two small integer enums.
    pub fn enums(&mut self, lens: AttrLens<'_>, lhs: i32, rhs: i32) -> bool {
        self.leaf(lens, &lhs, &rhs)
    }

    /// Compares two tagged values. Identical tags are required; object
    /// values reduce recursively, everything else compares bitwise.
    pub fn any_values(&mut self, lens: AttrLens<'_>, lhs: &Value, rhs: &Value) -> bool {
        if !lhs.same_tag(rhs) {
            self.record_lens_mismatch(&lens);
            return false;
        }
        if let (Some(l), Some(r)) = (lhs.as_object(), rhs.as_object()) {
            return self.objects(lens, l, r);
        }
        if lhs.prim_bitwise_equal(rhs) {
            return true;
        }
        self.record_lens_mismatch(&lens);
        false
    }

    /// Compares two child objects.
    pub fn objects(&mut self, lens: AttrLens<'_>, lhs: &ObjectRef, rhs: &ObjectRef) -> bool {
        self.object_impl(lens, Some(lhs), Some(rhs), self.map_free_vars)
    }

    /// Compares two optional child objects.
    pub fn opt_objects(
        &mut self,
        lens: AttrLens<'_>,
        lhs: Option<&ObjectRef>,
        rhs: Option<&ObjectRef>,
    ) -> bool {
        self.object_impl(lens, lhs, rhs, self.map_free_vars)
    }

    /// Compares two child objects in definition position: free-variable
    /// remapping is enabled for the whole subtree.
    pub fn def_objects(&mut self, lens: AttrLens<'_>, lhs: &ObjectRef, rhs: &ObjectRef) -> bool {
        self.object_impl(lens, Some(lhs), Some(rhs), true)
    }

    fn object_impl(
        &mut self,
        lens: AttrLens<'_>,
        lhs: Option<&ObjectRef>,
        rhs: Option<&ObjectRef>,
        map_free_vars: bool,
    ) -> bool {
        if self.current_paths.is_none() {
            // Fast path: no tracing, no path values.
            return self.handler.se_equal_reduce(lhs, rhs, map_free_vars, None);
        }
        let new_paths = self.paths_from_lens(&lens);
        let ok = self
            .handler
            .se_equal_reduce(lhs, rhs, map_free_vars, new_paths.clone());
        if !ok {
            if let Some(paths) = new_paths {
                self.handler.record_mismatch(paths);
            }
        }
        ok
    }

    /// Free-variable equality: marks the current node as a graph node and
    /// accepts the pair iff they are the same node or remapping is enabled.
    pub fn free_vars<T: Object>(&mut self, lhs: &T, rhs: &T) -> bool {
        self.handler.mark_graph_node();
        core::ptr::eq(lhs, rhs) || self.map_free_vars
    }

    /// Marks the node currently being expanded as a graph node, so a
    /// successful comparison populates the remap maps.
    pub fn mark_graph_node(&mut self) {
        self.handler.mark_graph_node();
    }

    /// Returns the rhs a previously matched lhs node was mapped to, or the
    /// node itself when unmapped.
    #[must_use]
    pub fn map_lhs_to_rhs(&self, obj: &ObjectRef) -> ObjectRef {
        self.handler.map_lhs_to_rhs(obj)
    }

    /// Returns the paths from both roots to the nodes under comparison.
    ///
    /// # Panics
    ///
    /// Panics when path tracing is not enabled.
    #[must_use]
    pub fn get_current_paths(&self) -> &ObjectPathPair {
        match &self.current_paths {
            Some(paths) => paths,
            None => panic!("current object paths are only available when path tracing is enabled"),
        }
    }

    /// Records `paths` as the first mismatch if none is recorded yet.
    ///
    /// # Panics
    ///
    /// Panics when path tracing is not enabled.
    pub fn record_mismatch_paths(&mut self, paths: ObjectPathPair) {
        assert!(
            self.handler.is_path_tracing_enabled(),
            "mismatch paths can only be recorded when path tracing is enabled"
        );
        self.handler.record_mismatch(paths);
    }

    /// Enqueues a deferred failure carrying `paths`.
    pub fn defer_fail(&mut self, paths: ObjectPathPair) {
        self.handler.defer_fail(paths);
    }

    /// Returns `true` if mismatches should be deferred rather than
    /// reported immediately.
    #[must_use]
    pub fn is_fail_deferral_enabled(&self) -> bool {
        self.handler.is_fail_deferral_enabled()
    }

    /// Returns `true` if path tracing is enabled for this invocation.
    #[must_use]
    pub fn is_path_tracing_enabled(&self) -> bool {
        self.current_paths.is_some()
    }
}
