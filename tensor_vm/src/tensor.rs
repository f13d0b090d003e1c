// Copyright 2026 the Tensor VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dense tensors and their self-describing binary blob encoding.
//!
//! The blob layout is:
//!
//! ```text
//! u64 magic | u64 reserved | i32 device_type | i32 device_id | i32 ndim
//! | dtype (4 bytes) | ndim x i64 shape | i64 data_byte_size | raw data
//! ```
//!
//! Blobs always record the CPU device; loading rejects anything else.

use alloc::vec::Vec;
use core::fmt;

use crate::dtype::DataType;
use crate::format::{DecodeError, Reader, Writer};

/// Magic number identifying a serialized tensor blob.
pub const TENSOR_BLOB_MAGIC: u64 = 0xDD5E_40F0_96B4_A13F;

/// Device kinds a tensor can live on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum DeviceType {
    /// Host CPU.
    Cpu = 1,
    /// CUDA device.
    Cuda = 2,
    /// OpenCL device.
    OpenCl = 4,
    /// Vulkan device.
    Vulkan = 7,
    /// Metal device.
    Metal = 8,
    /// ROCm device.
    Rocm = 10,
}

impl DeviceType {
    /// Parses a device type from its wire value.
    #[must_use]
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            1 => Some(Self::Cpu),
            2 => Some(Self::Cuda),
            4 => Some(Self::OpenCl),
            7 => Some(Self::Vulkan),
            8 => Some(Self::Metal),
            10 => Some(Self::Rocm),
            _ => None,
        }
    }
}

/// A device: a kind plus an ordinal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Device {
    /// Device kind.
    pub device_type: DeviceType,
    /// Device ordinal.
    pub device_id: i32,
}

impl Device {
    /// The host CPU device.
    #[must_use]
    pub const fn cpu() -> Self {
        Self {
            device_type: DeviceType::Cpu,
            device_id: 0,
        }
    }

    /// Returns `true` if this is a CPU device.
    #[must_use]
    pub fn is_cpu(&self) -> bool {
        self.device_type == DeviceType::Cpu
    }
}

/// A tensor blob decode error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TensorError {
    /// The blob magic did not match.
    BadMagic,
    /// The blob records a device this loader does not accept.
    UnsupportedDevice {
        /// Raw device-type value from the blob.
        device_type: i32,
    },
    /// The recorded data size disagrees with shape and dtype.
    SizeMismatch {
        /// Size computed from shape and dtype.
        expected: u64,
        /// Size recorded in the blob.
        recorded: u64,
    },
    /// The byte stream was malformed.
    Decode(DecodeError),
}

impl fmt::Display for TensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadMagic => write!(f, "invalid tensor blob magic"),
            Self::UnsupportedDevice { device_type } => {
                write!(f, "tensor blob on unsupported device type {device_type}")
            }
            Self::SizeMismatch { expected, recorded } => write!(
                f,
                "tensor blob data size mismatch: expected {expected}, recorded {recorded}"
            ),
            Self::Decode(e) => write!(f, "tensor blob decode error: {e}"),
        }
    }
}

impl core::error::Error for TensorError {}

impl From<DecodeError> for TensorError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

/// A dense tensor with packed little-endian element data.
///
/// `strides` is in elements, not bytes; `None` means the canonical row-major
/// layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tensor {
    /// The device the tensor lives on.
    pub device: Device,
    /// Element data type.
    pub dtype: DataType,
    /// Dimension extents.
    pub shape: Vec<i64>,
    /// Optional element strides (`None` = contiguous row-major).
    pub strides: Option<Vec<i64>>,
    /// Packed element bytes.
    pub data: Vec<u8>,
}

impl Tensor {
    /// Creates a contiguous CPU tensor from parts.
    #[must_use]
    pub fn cpu(dtype: DataType, shape: Vec<i64>, data: Vec<u8>) -> Self {
        Self {
            device: Device::cpu(),
            dtype,
            shape,
            strides: None,
            data,
        }
    }

    /// Number of dimensions.
    #[must_use]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Number of elements (`1` for a scalar).
    #[must_use]
    pub fn num_elements(&self) -> i64 {
        self.shape.iter().product()
    }

    /// Total packed data size in bytes.
    #[must_use]
    pub fn data_bytes(&self) -> usize {
        self.num_elements().max(0) as usize * self.dtype.elem_bytes()
    }

    /// Returns `true` if the layout is canonical row-major.
    #[must_use]
    pub fn is_contiguous(&self) -> bool {
        let Some(strides) = &self.strides else {
            return true;
        };
        if strides.len() != self.shape.len() {
            return false;
        }
        let mut expected: i64 = 1;
        for k in (0..self.shape.len()).rev() {
            if self.shape[k] == 0 {
                return true;
            }
            if self.shape[k] != 1 && strides[k] != expected {
                return false;
            }
            expected *= self.shape[k];
        }
        true
    }

    /// Writes the self-describing blob.
    ///
    /// # Panics
    ///
    /// Panics if the tensor is not contiguous or its data length disagrees
    /// with shape and dtype.
    pub fn save(&self, w: &mut Writer) {
        assert!(self.is_contiguous(), "can only save contiguous tensor");
        assert_eq!(
            self.data.len(),
            self.data_bytes(),
            "tensor data length disagrees with shape and dtype"
        );
        w.write_u64_le(TENSOR_BLOB_MAGIC);
        w.write_u64_le(0); // reserved
        let cpu = Device::cpu();
        w.write_i32_le(cpu.device_type as i32);
        w.write_i32_le(cpu.device_id);
        w.write_i32_le(self.shape.len() as i32);
        self.dtype.save(w);
        for &dim in &self.shape {
            w.write_i64_le(dim);
        }
        w.write_i64_le(self.data.len() as i64);
        w.write_bytes(&self.data);
    }

    /// Reads a self-describing blob. Only CPU blobs are accepted.
    pub fn load(r: &mut Reader<'_>) -> Result<Self, TensorError> {
        if r.read_u64_le()? != TENSOR_BLOB_MAGIC {
            return Err(TensorError::BadMagic);
        }
        let _reserved = r.read_u64_le()?;
        let device_type = r.read_i32_le()?;
        let device_id = r.read_i32_le()?;
        if DeviceType::from_i32(device_type) != Some(DeviceType::Cpu) {
            return Err(TensorError::UnsupportedDevice { device_type });
        }
        let ndim = r.read_i32_le()?;
        let ndim = usize::try_from(ndim).map_err(|_| TensorError::Decode(DecodeError::OutOfBounds))?;
        let dtype = DataType::load(r)?;
        let mut shape = Vec::with_capacity(ndim.min(64));
        for _ in 0..ndim {
            shape.push(r.read_i64_le()?);
        }
        let tensor = Self {
            device: Device {
                device_type: DeviceType::Cpu,
                device_id,
            },
            dtype,
            shape,
            strides: None,
            data: Vec::new(),
        };
        let recorded = r.read_i64_le()?;
        let recorded = u64::try_from(recorded).map_err(|_| TensorError::Decode(DecodeError::OutOfBounds))?;
        let expected = tensor.data_bytes() as u64;
        if recorded != expected {
            return Err(TensorError::SizeMismatch { expected, recorded });
        }
        let data = r.read_bytes(recorded as usize)?.to_vec();
        Ok(Self { data, ..tensor })
    }
}
