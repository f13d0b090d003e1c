// Copyright 2026 the Tensor VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `tensor_ir`: object graphs and graph-aware structural equality for the
//! tensor VM dialect.
//!
//! Nodes are [`Object`]s behind [`ObjectRef`]s; each node type registers a
//! structural reducer in a [`ReducerRegistry`]. The engine compares two
//! graphs without recursion, optionally remapping free variables, tracing
//! the path to the first mismatch, and deferring coarse failures so finer
//! ones win.
//!
//! ## Example
//!
//! ```
//! use tensor_ir::nodes::{Call, Function, Op, Var};
//! use tensor_ir::{ReducerRegistry, structural_equal};
//! use tensor_vm::dtype::DataType;
//!
//! let registry = ReducerRegistry::with_builtin_nodes();
//! let dtype = DataType::int(32, 1);
//!
//! let x = Var::new("x", dtype);
//! let f = Function::new(vec![x.clone()], Call::new(Op::new("relu"), vec![x]));
//! let y = Var::new("y", dtype);
//! let g = Function::new(vec![y.clone()], Call::new(Op::new("relu"), vec![y]));
//!
//! assert!(structural_equal(&registry, &f.into(), &g.into(), false));
//! ```

#![no_std]

extern crate alloc;

mod equal;
mod object;
mod path;
mod reducer;
mod registry;
mod value;

pub mod ndarray;
pub mod nodes;

pub use equal::{
    SEqualConfig, SEqualHandler, ScriptPrinter, StructuralMismatch, assert_structural_equal,
    first_structural_mismatch, structural_equal,
};
pub use object::{Object, ObjectRef};
pub use path::{ObjectPath, ObjectPathPair, PathSegment};
pub use reducer::{AttrLens, SEqualReducer};
pub use registry::ReducerRegistry;
pub use value::Value;
