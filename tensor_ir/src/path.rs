// Copyright 2026 the Tensor VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Immutable paths into object graphs, used for mismatch reporting.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

/// One step of an [`ObjectPath`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSegment {
    /// The root of the graph.
    Root,
    /// A named attribute.
    Attr(String),
    /// An array element.
    Index(usize),
    /// An attribute or element that is absent on this side.
    Missing,
}

struct PathNode {
    parent: Option<ObjectPath>,
    segment: PathSegment,
    depth: usize,
}

/// An immutable, cheaply clonable location in an object graph.
///
/// Paths grow by appending segments; existing paths are never mutated.
#[derive(Clone)]
pub struct ObjectPath(Arc<PathNode>);

impl ObjectPath {
    /// The root path.
    #[must_use]
    pub fn root() -> Self {
        Self(Arc::new(PathNode {
            parent: None,
            segment: PathSegment::Root,
            depth: 0,
        }))
    }

    fn extend(&self, segment: PathSegment) -> Self {
        Self(Arc::new(PathNode {
            parent: Some(self.clone()),
            segment,
            depth: self.0.depth + 1,
        }))
    }

    /// Appends a named attribute segment.
    #[must_use]
    pub fn attr(&self, name: &str) -> Self {
        self.extend(PathSegment::Attr(name.into()))
    }

    /// Appends a named attribute segment, or [`PathSegment::Missing`] when
    /// the name is unknown or the attribute is absent.
    #[must_use]
    pub fn attr_opt(&self, name: Option<&str>) -> Self {
        match name {
            Some(name) => self.attr(name),
            None => self.extend(PathSegment::Missing),
        }
    }

    /// Appends an array-index segment.
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        self.extend(PathSegment::Index(index))
    }

    /// Returns this path's final segment.
    #[must_use]
    pub fn segment(&self) -> &PathSegment {
        &self.0.segment
    }

    /// Returns the parent path, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&ObjectPath> {
        self.0.parent.as_ref()
    }

    /// Number of segments below the root.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.depth
    }

    fn segments(&self) -> Vec<&PathSegment> {
        let mut out = Vec::with_capacity(self.0.depth + 1);
        let mut cur = Some(self);
        while let Some(path) = cur {
            out.push(path.segment());
            cur = path.parent();
        }
        out.reverse();
        out
    }
}

impl PartialEq for ObjectPath {
    fn eq(&self, other: &Self) -> bool {
        if self.0.depth != other.0.depth {
            return false;
        }
        let mut l = Some(self);
        let mut r = Some(other);
        while let (Some(lp), Some(rp)) = (l, r) {
            if Arc::ptr_eq(&lp.0, &rp.0) {
                return true;
            }
            if lp.segment() != rp.segment() {
                return false;
            }
            l = lp.parent();
            r = rp.parent();
        }
        true
    }
}

impl Eq for ObjectPath {}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in self.segments() {
            match segment {
                PathSegment::Root => write!(f, "<root>")?,
                PathSegment::Attr(name) => write!(f, ".{name}")?,
                PathSegment::Index(i) => write!(f, "[{i}]")?,
                PathSegment::Missing => write!(f, ".<missing>")?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// A pair of paths pointing at corresponding locations in two graphs.
#[derive(Clone, PartialEq, Eq)]
pub struct ObjectPathPair {
    lhs_path: ObjectPath,
    rhs_path: ObjectPath,
}

impl ObjectPathPair {
    /// Creates a pair from both sides.
    #[must_use]
    pub fn new(lhs_path: ObjectPath, rhs_path: ObjectPath) -> Self {
        Self { lhs_path, rhs_path }
    }

    /// The location in the left graph.
    #[must_use]
    pub fn lhs_path(&self) -> &ObjectPath {
        &self.lhs_path
    }

    /// The location in the right graph.
    #[must_use]
    pub fn rhs_path(&self) -> &ObjectPath {
        &self.rhs_path
    }
}

impl fmt::Debug for ObjectPathPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(lhs: {}, rhs: {})", self.lhs_path, self.rhs_path)
    }
}
