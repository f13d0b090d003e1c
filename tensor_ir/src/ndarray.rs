// Copyright 2026 the Tensor VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tensor-valued leaf nodes and their structural equality.

use core::any::Any;

use tensor_vm::tensor::Tensor;

use crate::object::{Object, ObjectRef};
use crate::reducer::{AttrLens, SEqualReducer};
use crate::registry::ReducerRegistry;

/// A dense tensor leaf in an object graph.
#[derive(Debug)]
pub struct NDArray {
    /// The wrapped tensor.
    pub tensor: Tensor,
}

impl NDArray {
    /// Allocates a tensor node.
    pub fn new(tensor: Tensor) -> ObjectRef {
        ObjectRef::new(Self { tensor })
    }
}

impl Object for NDArray {
    fn type_key(&self) -> &'static str {
        "NDArray"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Structural equality of two tensors.
///
/// Shapes reduce dimension-by-dimension through `equal`; dtype compares as
/// a triple; `compare_data` additionally requires byte-identical packed
/// data.
///
/// # Panics
///
/// Non-CPU or non-contiguous input is a precondition violation, not a
/// `false` result.
pub fn ndarray_equal(
    lhs: &Tensor,
    rhs: &Tensor,
    equal: &mut SEqualReducer<'_, '_>,
    compare_data: bool,
) -> bool {
    assert!(lhs.device.is_cpu(), "can only compare CPU tensor");
    assert!(rhs.device.is_cpu(), "can only compare CPU tensor");
    assert!(lhs.is_contiguous(), "can only compare contiguous tensor");
    assert!(rhs.is_contiguous(), "can only compare contiguous tensor");

    if lhs.ndim() != rhs.ndim() {
        return false;
    }
    for i in 0..lhs.ndim() {
        if !equal.ints(AttrLens::AttrIndex("shape", i), lhs.shape[i], rhs.shape[i]) {
            return false;
        }
    }
    if lhs.dtype != rhs.dtype {
        return false;
    }
    if compare_data {
        lhs.data == rhs.data
    } else {
        true
    }
}

fn ndarray_reduce(lhs: &NDArray, rhs: &NDArray, equal: &mut SEqualReducer<'_, '_>) -> bool {
    if core::ptr::eq(lhs, rhs) {
        return true;
    }
    ndarray_equal(&lhs.tensor, &rhs.tensor, equal, true)
}

/// Registers the tensor node's reducer.
pub fn register_ndarray(registry: &mut ReducerRegistry) {
    registry.register::<NDArray>(ndarray_reduce);
}
