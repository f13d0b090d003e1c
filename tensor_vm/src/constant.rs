// Copyright 2026 the Tensor VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Constant-pool entries and their tagged wire encoding.
//!
//! Each constant is encoded as an `i32` type tag followed by a
//! tag-specific payload. The tag values are part of the binary format and
//! must never change.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use crate::dtype::DataType;
use crate::executable::ExecError;
use crate::format::{Reader, Writer};
use crate::tensor::Tensor;

/// A constant-pool entry.
#[derive(Clone, Debug, PartialEq)]
pub enum Constant {
    /// A dense tensor, encoded as a self-describing blob.
    Tensor(Tensor),
    /// A shape tuple.
    Shape(Vec<i64>),
    /// A UTF-8 string.
    String(String),
    /// A signed 64-bit integer.
    Int(i64),
    /// An IEEE-754 binary64 value (bit-exact on the wire).
    Float(f64),
    /// A data type.
    DataType(DataType),
}

impl Constant {
    /// Wire tag for [`Constant::Tensor`].
    pub const TAG_TENSOR: i32 = 0;
    /// Wire tag for [`Constant::Shape`].
    pub const TAG_SHAPE: i32 = 1;
    /// Wire tag for [`Constant::String`].
    pub const TAG_STRING: i32 = 2;
    /// Wire tag for [`Constant::Int`].
    pub const TAG_INT: i32 = 3;
    /// Wire tag for [`Constant::Float`].
    pub const TAG_FLOAT: i32 = 4;
    /// Wire tag for [`Constant::DataType`].
    pub const TAG_DATA_TYPE: i32 = 5;

    /// Returns this constant's wire tag.
    #[must_use]
    pub fn type_tag(&self) -> i32 {
        match self {
            Self::Tensor(_) => Self::TAG_TENSOR,
            Self::Shape(_) => Self::TAG_SHAPE,
            Self::String(_) => Self::TAG_STRING,
            Self::Int(_) => Self::TAG_INT,
            Self::Float(_) => Self::TAG_FLOAT,
            Self::DataType(_) => Self::TAG_DATA_TYPE,
        }
    }

    /// Writes the tag and payload.
    pub fn save(&self, w: &mut Writer) {
        w.write_i32_le(self.type_tag());
        match self {
            Self::Tensor(t) => t.save(w),
            Self::Shape(dims) => {
                w.write_u64_le(dims.len() as u64);
                for &d in dims {
                    w.write_i64_le(d);
                }
            }
            Self::String(s) => w.write_string(s),
            Self::Int(v) => w.write_i64_le(*v),
            Self::Float(v) => w.write_f64_le(*v),
            Self::DataType(dt) => dt.save(w),
        }
    }

    /// Reads one tagged constant.
    pub fn load(r: &mut Reader<'_>) -> Result<Self, ExecError> {
        let section = "constant";
        let tag = r
            .read_i32_le()
            .map_err(|_| ExecError::invalid_format(section))?;
        match tag {
            Self::TAG_TENSOR => Ok(Self::Tensor(Tensor::load(r).map_err(ExecError::Tensor)?)),
            Self::TAG_SHAPE => {
                let n = r
                    .read_len()
                    .map_err(|_| ExecError::invalid_format(section))?;
                let mut dims = Vec::with_capacity(n.min(64));
                for _ in 0..n {
                    dims.push(
                        r.read_i64_le()
                            .map_err(|_| ExecError::invalid_format(section))?,
                    );
                }
                Ok(Self::Shape(dims))
            }
            Self::TAG_STRING => Ok(Self::String(
                r.read_string()
                    .map_err(|_| ExecError::invalid_format(section))?
                    .to_string(),
            )),
            Self::TAG_INT => Ok(Self::Int(
                r.read_i64_le()
                    .map_err(|_| ExecError::invalid_format(section))?,
            )),
            Self::TAG_FLOAT => Ok(Self::Float(
                r.read_f64_le()
                    .map_err(|_| ExecError::invalid_format(section))?,
            )),
            Self::TAG_DATA_TYPE => Ok(Self::DataType(
                DataType::load(r).map_err(|_| ExecError::invalid_format(section))?,
            )),
            _ => Err(ExecError::UnsupportedConstantTag { tag }),
        }
    }
}

fn join_i64(dims: &[i64]) -> String {
    let mut out = String::new();
    for (i, d) in dims.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&d.to_string());
    }
    out
}

/// The compact rendering used by executable statistics.
impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tensor(t) => {
                if t.shape.is_empty() {
                    write!(f, "scalar")
                } else {
                    write!(f, "[{}]", join_i64(&t.shape))
                }
            }
            Self::Shape(dims) => write!(f, "shapetuple[{}]", join_i64(dims)),
            Self::String(s) => write!(f, "\"{s}\""),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::DataType(dt) => write!(f, "{dt}"),
        }
    }
}
