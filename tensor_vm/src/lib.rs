// Copyright 2026 the Tensor VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `tensor_vm`: a serializable executable format for a register-based
//! tensor VM.
//!
//! An [`executable::Executable`] owns a typed constant pool, a function
//! table, and a flat instruction stream. It supports bit-exact save/load,
//! a human-readable disassembly dialect, and a builder-script dialect.
//!
//! ## Example
//!
//! ```
//! use tensor_vm::constant::Constant;
//! use tensor_vm::executable::{Executable, FuncInfo, FuncKind};
//! use tensor_vm::instruction::{Arg, Instruction};
//!
//! let mut exec = Executable::new();
//! exec.constants.push(Constant::Int(7));
//! exec.declare_function(FuncInfo {
//!     kind: FuncKind::VmFunc,
//!     name: "main".into(),
//!     start_instr: 0,
//!     end_instr: 1,
//!     num_args: 1,
//!     register_file_size: 2,
//!     param_names: vec!["x".into()],
//! });
//! exec.push_instruction(&Instruction::Ret { result: 0 });
//!
//! let bytes = exec.save_to_bytes();
//! let back = Executable::load_from_bytes(&bytes)?;
//! assert_eq!(back, exec);
//! assert!(back.as_text()?.contains("@main:"));
//! # Ok::<(), tensor_vm::executable::ExecError>(())
//! ```

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod constant;
pub mod disasm;
pub mod dtype;
pub mod executable;
#[cfg(feature = "std")]
pub mod file;
pub mod format;
pub mod instruction;
pub mod tensor;
