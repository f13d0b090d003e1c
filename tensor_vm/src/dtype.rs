// Copyright 2026 the Tensor VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scalar/vector data types for tensors and constants.

use core::fmt;

use crate::format::{DecodeError, Reader, Writer};

/// A data type: a type-code, a bit width, and a vector lane count.
///
/// The wire encoding is 4 bytes: `code: u8 | bits: u8 | lanes: u16 (LE)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DataType {
    /// Type code ([`DataType::INT`] and friends).
    pub code: u8,
    /// Bits per lane.
    pub bits: u8,
    /// Vector lanes (`1` for scalars).
    pub lanes: u16,
}

impl DataType {
    /// Signed integer type code.
    pub const INT: u8 = 0;
    /// Unsigned integer type code.
    pub const UINT: u8 = 1;
    /// IEEE-754 float type code.
    pub const FLOAT: u8 = 2;
    /// Opaque handle type code.
    pub const HANDLE: u8 = 3;
    /// bfloat type code.
    pub const BFLOAT: u8 = 4;

    /// Creates a data type from raw parts.
    #[must_use]
    pub const fn new(code: u8, bits: u8, lanes: u16) -> Self {
        Self { code, bits, lanes }
    }

    /// Creates a signed integer type.
    #[must_use]
    pub const fn int(bits: u8, lanes: u16) -> Self {
        Self::new(Self::INT, bits, lanes)
    }

    /// Creates an unsigned integer type.
    #[must_use]
    pub const fn uint(bits: u8, lanes: u16) -> Self {
        Self::new(Self::UINT, bits, lanes)
    }

    /// Creates a float type.
    #[must_use]
    pub const fn float(bits: u8, lanes: u16) -> Self {
        Self::new(Self::FLOAT, bits, lanes)
    }

    /// Bytes per element (`lanes` lanes of `bits` bits, rounded up).
    #[must_use]
    pub const fn elem_bytes(&self) -> usize {
        (self.bits as usize * self.lanes as usize).div_ceil(8)
    }

    /// Writes the 4-byte encoding.
    pub fn save(&self, w: &mut Writer) {
        w.write_u8(self.code);
        w.write_u8(self.bits);
        w.write_u16_le(self.lanes);
    }

    /// Reads the 4-byte encoding.
    pub fn load(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let code = r.read_u8()?;
        let bits = r.read_u8()?;
        let lanes = r.read_u16_le()?;
        Ok(Self { code, bits, lanes })
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `uint1` scalars are the canonical boolean.
        if self.code == Self::UINT && self.bits == 1 && self.lanes == 1 {
            return write!(f, "bool");
        }
        if self.code == Self::HANDLE && self.bits == 64 && self.lanes == 1 {
            return write!(f, "handle");
        }
        let name = match self.code {
            Self::INT => "int",
            Self::UINT => "uint",
            Self::FLOAT => "float",
            Self::HANDLE => "handle",
            Self::BFLOAT => "bfloat",
            _ => return write!(f, "code({}){}x{}", self.code, self.bits, self.lanes),
        };
        write!(f, "{name}{}", self.bits)?;
        if self.lanes > 1 {
            write!(f, "x{}", self.lanes)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn display_is_canonical() {
        assert_eq!(format!("{}", DataType::int(64, 1)), "int64");
        assert_eq!(format!("{}", DataType::float(32, 1)), "float32");
        assert_eq!(format!("{}", DataType::float(16, 4)), "float16x4");
        assert_eq!(format!("{}", DataType::uint(1, 1)), "bool");
        assert_eq!(format!("{}", DataType::new(DataType::HANDLE, 64, 1)), "handle");
    }

    #[test]
    fn wire_roundtrip() {
        let dt = DataType::float(32, 4);
        let mut w = Writer::new();
        dt.save(&mut w);
        let bytes = w.into_vec();
        assert_eq!(bytes, [2, 32, 4, 0]);
        assert_eq!(DataType::load(&mut Reader::new(&bytes)).unwrap(), dt);
    }

    #[test]
    fn elem_bytes_rounds_up() {
        assert_eq!(DataType::int(32, 1).elem_bytes(), 4);
        assert_eq!(DataType::uint(1, 1).elem_bytes(), 1);
        assert_eq!(DataType::int(8, 3).elem_bytes(), 3);
    }
}
