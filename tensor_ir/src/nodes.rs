// Copyright 2026 the Tensor VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The built-in tensor-dialect node set and its structural reducers.
//!
//! Leaves (immediates, operators) compare their attributes directly.
//! Variables are free variables: their reducer marks the graph node so a
//! matched pair enters the remap maps. Interior nodes that can be shared
//! (calls, functions) mark themselves as well, so revisits of a matched
//! pair resolve by identity instead of re-expanding. Functions compare
//! parameters in definition position, which enables bijective renaming
//! when free-variable mapping is requested.

use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;

use tensor_vm::dtype::DataType;

use crate::object::{Object, ObjectRef};
use crate::path::ObjectPathPair;
use crate::reducer::{AttrLens, SEqualReducer};
use crate::registry::ReducerRegistry;
use crate::value::Value;

/// A variable. Variables are free: two variables match iff they are the
/// same node or remapping is enabled for the subtree.
#[derive(Debug)]
pub struct Var {
    /// Name hint; not structurally significant.
    pub name_hint: String,
    /// The variable's data type.
    pub dtype: DataType,
}

impl Var {
    /// Allocates a variable node.
    pub fn new(name_hint: &str, dtype: DataType) -> ObjectRef {
        ObjectRef::new(Self {
            name_hint: name_hint.into(),
            dtype,
        })
    }
}

/// An integer immediate.
#[derive(Debug)]
pub struct IntImm {
    /// The value's data type.
    pub dtype: DataType,
    /// The value.
    pub value: i64,
}

impl IntImm {
    /// Allocates an integer immediate node.
    pub fn new(dtype: DataType, value: i64) -> ObjectRef {
        ObjectRef::new(Self { dtype, value })
    }
}

/// A float immediate.
#[derive(Debug)]
pub struct FloatImm {
    /// The value's data type.
    pub dtype: DataType,
    /// The value.
    pub value: f64,
}

impl FloatImm {
    /// Allocates a float immediate node.
    pub fn new(dtype: DataType, value: f64) -> ObjectRef {
        ObjectRef::new(Self { dtype, value })
    }
}

/// A string immediate.
#[derive(Debug)]
pub struct StringImm {
    /// The value.
    pub value: String,
}

impl StringImm {
    /// Allocates a string immediate node.
    pub fn new(value: &str) -> ObjectRef {
        ObjectRef::new(Self {
            value: value.into(),
        })
    }
}

/// A primitive operator, compared by name.
#[derive(Debug)]
pub struct Op {
    /// The operator name.
    pub name: String,
}

impl Op {
    /// Allocates an operator node.
    pub fn new(name: &str) -> ObjectRef {
        ObjectRef::new(Self { name: name.into() })
    }
}

/// An operator application.
#[derive(Debug)]
pub struct Call {
    /// The callee (usually an [`Op`]).
    pub op: ObjectRef,
    /// Positional arguments.
    pub args: Vec<ObjectRef>,
}

impl Call {
    /// Allocates a call node.
    pub fn new(op: ObjectRef, args: Vec<ObjectRef>) -> ObjectRef {
        ObjectRef::new(Self { op, args })
    }
}

/// A tuple of expressions.
#[derive(Debug)]
pub struct Tuple {
    /// Tuple fields.
    pub fields: Vec<ObjectRef>,
}

impl Tuple {
    /// Allocates a tuple node.
    pub fn new(fields: Vec<ObjectRef>) -> ObjectRef {
        ObjectRef::new(Self { fields })
    }
}

/// A function expression.
#[derive(Debug)]
pub struct Function {
    /// Parameters, in definition position.
    pub params: Vec<ObjectRef>,
    /// Function body.
    pub body: ObjectRef,
    /// Sorted auxiliary attributes.
    pub attrs: Vec<(String, Value)>,
}

impl Function {
    /// Allocates a function node without attributes.
    pub fn new(params: Vec<ObjectRef>, body: ObjectRef) -> ObjectRef {
        ObjectRef::new(Self {
            params,
            body,
            attrs: Vec::new(),
        })
    }

    /// Allocates a function node with attributes.
    pub fn with_attrs(
        params: Vec<ObjectRef>,
        body: ObjectRef,
        attrs: Vec<(String, Value)>,
    ) -> ObjectRef {
        ObjectRef::new(Self { params, body, attrs })
    }
}

macro_rules! impl_object {
    ($ty:ident) => {
        impl Object for $ty {
            fn type_key(&self) -> &'static str {
                stringify!($ty)
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
}

impl_object!(Var);
impl_object!(IntImm);
impl_object!(FloatImm);
impl_object!(StringImm);
impl_object!(Op);
impl_object!(Call);
impl_object!(Tuple);
impl_object!(Function);

/// Compares two object arrays element-wise under attribute `attr`.
///
/// The common prefix reduces first. A length mismatch points at the first
/// element missing on the shorter side; with fail deferral it is postponed
/// so a finer element mismatch discovered inside the prefix wins.
pub fn array_objects_equal(
    equal: &mut SEqualReducer<'_, '_>,
    attr: &str,
    lhs: &[ObjectRef],
    rhs: &[ObjectRef],
    definition_position: bool,
) -> bool {
    let common = lhs.len().min(rhs.len());
    for i in 0..common {
        let lens = AttrLens::AttrIndex(attr, i);
        let ok = if definition_position {
            equal.def_objects(lens, &lhs[i], &rhs[i])
        } else {
            equal.objects(lens, &lhs[i], &rhs[i])
        };
        if !ok {
            return false;
        }
    }
    if lhs.len() == rhs.len() {
        return true;
    }
    if equal.is_path_tracing_enabled() {
        let current = equal.get_current_paths().clone();
        let lhs_path = if lhs.len() > common {
            current.lhs_path().attr(attr).index(common)
        } else {
            current.lhs_path().attr(attr).attr_opt(None)
        };
        let rhs_path = if rhs.len() > common {
            current.rhs_path().attr(attr).index(common)
        } else {
            current.rhs_path().attr(attr).attr_opt(None)
        };
        let paths = ObjectPathPair::new(lhs_path, rhs_path);
        if equal.is_fail_deferral_enabled() {
            equal.defer_fail(paths);
            return true;
        }
        equal.record_mismatch_paths(paths);
    }
    false
}

fn var_reduce(lhs: &Var, rhs: &Var, equal: &mut SEqualReducer<'_, '_>) -> bool {
    equal.dtypes(AttrLens::Attr("dtype"), lhs.dtype, rhs.dtype) && equal.free_vars(lhs, rhs)
}

fn int_imm_reduce(lhs: &IntImm, rhs: &IntImm, equal: &mut SEqualReducer<'_, '_>) -> bool {
    equal.dtypes(AttrLens::Attr("dtype"), lhs.dtype, rhs.dtype)
        && equal.ints(AttrLens::Attr("value"), lhs.value, rhs.value)
}

fn float_imm_reduce(lhs: &FloatImm, rhs: &FloatImm, equal: &mut SEqualReducer<'_, '_>) -> bool {
    equal.dtypes(AttrLens::Attr("dtype"), lhs.dtype, rhs.dtype)
        && equal.floats(AttrLens::Attr("value"), lhs.value, rhs.value)
}

fn string_imm_reduce(lhs: &StringImm, rhs: &StringImm, equal: &mut SEqualReducer<'_, '_>) -> bool {
    equal.strs(AttrLens::Attr("value"), &lhs.value, &rhs.value)
}

fn op_reduce(lhs: &Op, rhs: &Op, equal: &mut SEqualReducer<'_, '_>) -> bool {
    equal.strs(AttrLens::Attr("name"), &lhs.name, &rhs.name)
}

fn call_reduce(lhs: &Call, rhs: &Call, equal: &mut SEqualReducer<'_, '_>) -> bool {
    equal.mark_graph_node();
    equal.objects(AttrLens::Attr("op"), &lhs.op, &rhs.op)
        && array_objects_equal(equal, "args", &lhs.args, &rhs.args, false)
}

fn tuple_reduce(lhs: &Tuple, rhs: &Tuple, equal: &mut SEqualReducer<'_, '_>) -> bool {
    array_objects_equal(equal, "fields", &lhs.fields, &rhs.fields, false)
}

fn function_reduce(lhs: &Function, rhs: &Function, equal: &mut SEqualReducer<'_, '_>) -> bool {
    equal.mark_graph_node();
    if !array_objects_equal(equal, "params", &lhs.params, &rhs.params, true) {
        return false;
    }
    if !equal.objects(AttrLens::Attr("body"), &lhs.body, &rhs.body) {
        return false;
    }
    if !equal.ints(
        AttrLens::Attr("attrs"),
        lhs.attrs.len() as i64,
        rhs.attrs.len() as i64,
    ) {
        return false;
    }
    for (i, ((lk, lv), (rk, rv))) in lhs.attrs.iter().zip(rhs.attrs.iter()).enumerate() {
        let lens = AttrLens::AttrIndex("attrs", i);
        if !equal.strs(lens, lk, rk) || !equal.any_values(lens, lv, rv) {
            return false;
        }
    }
    true
}

/// Registers the reducers of every built-in node type.
pub fn register_builtin_nodes(registry: &mut ReducerRegistry) {
    registry.register::<Var>(var_reduce);
    registry.register::<IntImm>(int_imm_reduce);
    registry.register::<FloatImm>(float_imm_reduce);
    registry.register::<StringImm>(string_imm_reduce);
    registry.register::<Op>(op_reduce);
    registry.register::<Call>(call_reduce);
    registry.register::<Tuple>(tuple_reduce);
    registry.register::<Function>(function_reduce);
}
