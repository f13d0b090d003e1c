// Copyright 2026 the Tensor VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The executable container and its binary encoding.
//!
//! An [`Executable`] owns a constant pool, a function table, and a flat
//! instruction buffer. The binary image is:
//!
//! ```text
//! u64 magic | lp-string version | globals | constants | code
//! ```
//!
//! and is emitted as a single length-prefixed outer string so it can be
//! embedded in a larger module blob.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use crate::constant::Constant;
use crate::format::{Reader, Writer};
use crate::instruction::{Arg, ExecWord, Index, Instruction, Opcode, RegName};
use crate::tensor::TensorError;

/// Magic number identifying a serialized executable.
pub const BYTECODE_MAGIC: u64 = 0xD225_DE2F_4214_151D;

/// The binary format version emitted and accepted by this crate.
pub const VM_VERSION: &str = "0.1.0";

/// An executable load/decode error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecError {
    /// A section of the binary image was malformed.
    InvalidFormat {
        /// The section that failed to decode.
        section: &'static str,
    },
    /// The constant pool contained an unknown type tag.
    UnsupportedConstantTag {
        /// The unrecognized tag.
        tag: i32,
    },
    /// A constant tensor blob was rejected.
    Tensor(TensorError),
    /// The function table contained an unknown kind value.
    UnknownFuncKind {
        /// The unrecognized kind.
        kind: i32,
    },
    /// An instruction began with an unknown opcode word.
    UnknownOpcode {
        /// The unrecognized opcode word.
        word: ExecWord,
    },
    /// A call argument carried an unknown kind tag.
    UnknownArgKind {
        /// The raw argument word.
        word: ExecWord,
    },
    /// An instruction index was outside the offset table.
    InstrOutOfBounds {
        /// The requested instruction index.
        index: Index,
    },
    /// An instruction ran past the end of the instruction buffer.
    TruncatedInstruction {
        /// The instruction whose words were missing.
        index: Index,
    },
}

impl ExecError {
    pub(crate) fn invalid_format(section: &'static str) -> Self {
        Self::InvalidFormat { section }
    }
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFormat { section } => {
                write!(f, "Invalid VM file format in the {section} section.")
            }
            Self::UnsupportedConstantTag { tag } => write!(
                f,
                "Constant pool can only contain tensor, shape, string, int, float and dtype \
                 constants, but got type tag {tag} when loading the VM constant pool."
            ),
            Self::Tensor(e) => write!(f, "constant tensor: {e}"),
            Self::UnknownFuncKind { kind } => write!(f, "unknown function kind {kind}"),
            Self::UnknownOpcode { word } => write!(f, "unknown opcode {word}"),
            Self::UnknownArgKind { word } => {
                write!(f, "unknown argument kind in word {word:#018x}")
            }
            Self::InstrOutOfBounds { index } => {
                write!(f, "instruction index {index} out of bounds")
            }
            Self::TruncatedInstruction { index } => {
                write!(f, "instruction {index} runs past the end of the buffer")
            }
        }
    }
}

impl core::error::Error for ExecError {}

impl From<TensorError> for ExecError {
    fn from(e: TensorError) -> Self {
        Self::Tensor(e)
    }
}

/// Kinds of callables in the function table. The numbering is part of the
/// binary format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum FuncKind {
    /// A function with bytecode in this executable.
    VmFunc = 0,
    /// A function delegating to a lower-IR callable.
    VmTirFunc = 1,
    /// An externally supplied closure.
    PackedFunc = 2,
}

impl FuncKind {
    /// Parses a function kind from its wire value.
    #[must_use]
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(Self::VmFunc),
            1 => Some(Self::VmTirFunc),
            2 => Some(Self::PackedFunc),
            _ => None,
        }
    }
}

/// Declaration of one callable in the function table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FuncInfo {
    /// What kind of callable this is.
    pub kind: FuncKind,
    /// Function name, unique within the table.
    pub name: String,
    /// First instruction index (half-open range; `0` for non-VM functions).
    pub start_instr: Index,
    /// One past the last instruction index.
    pub end_instr: Index,
    /// Number of arguments.
    pub num_args: Index,
    /// Registers needed to run the function.
    pub register_file_size: Index,
    /// Parameter names (length-consistent with `num_args` for VM functions).
    pub param_names: Vec<String>,
}

impl FuncInfo {
    fn save(&self, w: &mut Writer) {
        w.write_i32_le(self.kind as i32);
        w.write_string(&self.name);
        w.write_i64_le(self.start_instr);
        w.write_i64_le(self.end_instr);
        w.write_i64_le(self.num_args);
        w.write_i64_le(self.register_file_size);
        w.write_string_vec(&self.param_names);
    }

    fn load(r: &mut Reader<'_>) -> Result<Self, ExecError> {
        let section = "Global Section";
        let bad = || ExecError::invalid_format(section);
        let raw_kind = r.read_i32_le().map_err(|_| bad())?;
        let kind = FuncKind::from_i32(raw_kind).ok_or(ExecError::UnknownFuncKind { kind: raw_kind })?;
        Ok(Self {
            kind,
            name: r.read_string().map_err(|_| bad())?.to_string(),
            start_instr: r.read_i64_le().map_err(|_| bad())?,
            end_instr: r.read_i64_le().map_err(|_| bad())?,
            num_args: r.read_i64_le().map_err(|_| bad())?,
            register_file_size: r.read_i64_le().map_err(|_| bad())?,
            param_names: r.read_string_vec().map_err(|_| bad())?,
        })
    }
}

/// A serializable program for the tensor VM.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Executable {
    /// Constant pool.
    pub constants: Vec<Constant>,
    /// Function table.
    pub func_table: Vec<FuncInfo>,
    /// Name -> function-table index, reconstructed on load.
    func_map: BTreeMap<String, usize>,
    /// Word offset of each instruction in `instr_data`.
    pub instr_offset: Vec<Index>,
    /// Flat instruction buffer.
    pub instr_data: Vec<ExecWord>,
}

impl Executable {
    /// Creates an empty executable.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `info` to the function table and indexes it by name.
    ///
    /// # Panics
    ///
    /// Panics if the name is already declared.
    pub fn declare_function(&mut self, info: FuncInfo) {
        let prev = self.func_map.insert(info.name.clone(), self.func_table.len());
        assert!(prev.is_none(), "duplicate function name {:?}", info.name);
        self.func_table.push(info);
    }

    /// Returns `true` if `name` is declared in the function table.
    #[must_use]
    pub fn has_function(&self, name: &str) -> bool {
        self.func_map.contains_key(name)
    }

    /// Returns the function-table index of `name`.
    #[must_use]
    pub fn func_index(&self, name: &str) -> Option<usize> {
        self.func_map.get(name).copied()
    }

    /// Appends `instr` to the instruction buffer and offset table.
    pub fn push_instruction(&mut self, instr: &Instruction) {
        self.instr_offset.push(self.instr_data.len() as Index);
        self.instr_data.extend(instr.words());
    }

    fn word_at(&self, instr: Index, at: usize) -> Result<ExecWord, ExecError> {
        self.instr_data
            .get(at)
            .copied()
            .ok_or(ExecError::TruncatedInstruction { index: instr })
    }

    /// Decodes the instruction at index `i`.
    pub fn get_instruction(&self, i: Index) -> Result<Instruction, ExecError> {
        let oob = ExecError::InstrOutOfBounds { index: i };
        let idx = usize::try_from(i).map_err(|_| oob.clone())?;
        let offset = *self.instr_offset.get(idx).ok_or(oob)?;
        let offset =
            usize::try_from(offset).map_err(|_| ExecError::TruncatedInstruction { index: i })?;
        let word = self.word_at(i, offset)?;
        let op = Opcode::from_word(word).ok_or(ExecError::UnknownOpcode { word })?;
        match op {
            Opcode::Call => {
                let dst: RegName = self.word_at(i, offset + 1)?;
                let func_idx = self.word_at(i, offset + 2)?;
                let num_args = self.word_at(i, offset + 3)?;
                let num_args = usize::try_from(num_args)
                    .map_err(|_| ExecError::TruncatedInstruction { index: i })?;
                let mut args = Vec::with_capacity(num_args);
                for k in 0..num_args {
                    args.push(Arg::from_word(self.word_at(i, offset + 4 + k)?));
                }
                Ok(Instruction::Call {
                    dst,
                    func_idx,
                    args,
                })
            }
            Opcode::Ret => Ok(Instruction::Ret {
                result: self.word_at(i, offset + 1)?,
            }),
            Opcode::Goto => Ok(Instruction::Goto {
                pc_offset: self.word_at(i, offset + 1)?,
            }),
            Opcode::If => Ok(Instruction::If {
                cond: self.word_at(i, offset + 1)?,
                false_offset: self.word_at(i, offset + 2)?,
            }),
        }
    }

    /// Overwrites word `j` of instruction `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is outside the offset table or the word lies outside
    /// the instruction buffer.
    pub fn set_instruction_data(&mut self, i: Index, j: Index, val: ExecWord) {
        let idx = usize::try_from(i).ok().filter(|&k| k < self.instr_offset.len());
        let Some(idx) = idx else {
            panic!("instruction index {i} out of bounds");
        };
        let at = usize::try_from(self.instr_offset[idx] + j).ok();
        match at.filter(|&a| a < self.instr_data.len()) {
            Some(a) => self.instr_data[a] = val,
            None => panic!("instruction word {j} of instruction {i} out of bounds"),
        }
    }

    /// Renders a short summary of the constant pool and global functions.
    #[must_use]
    pub fn stats(&self) -> String {
        let mut os = String::from("Tensor VM executable statistics:\n");

        os.push_str(&alloc::format!("  Constant pool (# {}): [", self.constants.len()));
        for (i, c) in self.constants.iter().enumerate() {
            if i > 0 {
                os.push_str(", ");
            }
            os.push_str(&c.to_string());
        }
        os.push_str("]\n");

        os.push_str(&alloc::format!("  Globals (#{}): [", self.func_table.len()));
        for (i, func) in self.func_table.iter().enumerate() {
            if i > 0 {
                os.push_str(", ");
            }
            os.push_str(&func.name);
        }
        os.push_str("]\n");
        os
    }

    fn save_global_section(&self, w: &mut Writer) {
        w.write_u64_le(self.func_table.len() as u64);
        for func in &self.func_table {
            func.save(w);
        }
    }

    fn save_constant_section(&self, w: &mut Writer) {
        w.write_u64_le(self.constants.len() as u64);
        for c in &self.constants {
            c.save(w);
        }
    }

    fn save_code_section(&self, w: &mut Writer) {
        w.write_i64_vec(&self.instr_offset);
        w.write_i64_vec(&self.instr_data);
    }

    /// Serializes the executable image (header + sections).
    #[must_use]
    pub fn save_to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.write_u64_le(BYTECODE_MAGIC);
        w.write_string(VM_VERSION);
        self.save_global_section(&mut w);
        self.save_constant_section(&mut w);
        self.save_code_section(&mut w);
        w.into_vec()
    }

    /// Serializes the executable as one length-prefixed string into `w`,
    /// ready to be embedded in a larger module blob.
    pub fn save_to_binary(&self, w: &mut Writer) {
        w.write_lp_bytes(&self.save_to_bytes());
    }

    fn load_header(r: &mut Reader<'_>) -> Result<(), ExecError> {
        let magic = r
            .read_u64_le()
            .map_err(|_| ExecError::invalid_format("header"))?;
        if magic != BYTECODE_MAGIC {
            return Err(ExecError::invalid_format("header"));
        }
        let version = r
            .read_string()
            .map_err(|_| ExecError::invalid_format("version"))?;
        if version != VM_VERSION {
            return Err(ExecError::invalid_format("version"));
        }
        Ok(())
    }

    fn load_global_section(&mut self, r: &mut Reader<'_>) -> Result<(), ExecError> {
        let count = r
            .read_len()
            .map_err(|_| ExecError::invalid_format("Global Section"))?;
        for _ in 0..count {
            self.declare_function(FuncInfo::load(r)?);
        }
        Ok(())
    }

    fn load_constant_section(&mut self, r: &mut Reader<'_>) -> Result<(), ExecError> {
        let count = r
            .read_len()
            .map_err(|_| ExecError::invalid_format("constant"))?;
        for _ in 0..count {
            self.constants.push(Constant::load(r)?);
        }
        Ok(())
    }

    fn load_code_section(&mut self, r: &mut Reader<'_>) -> Result<(), ExecError> {
        self.instr_offset = r
            .read_i64_vec()
            .map_err(|_| ExecError::invalid_format("instr offset"))?;
        self.instr_data = r
            .read_i64_vec()
            .map_err(|_| ExecError::invalid_format("instr data"))?;
        Ok(())
    }

    /// Deserializes an executable image produced by [`Executable::save_to_bytes`].
    pub fn load_from_bytes(bytes: &[u8]) -> Result<Self, ExecError> {
        let mut r = Reader::new(bytes);
        Self::load_header(&mut r)?;
        let mut exec = Self::new();
        exec.load_global_section(&mut r)?;
        exec.load_constant_section(&mut r)?;
        exec.load_code_section(&mut r)?;
        Ok(exec)
    }

    /// Deserializes a length-prefixed executable written by
    /// [`Executable::save_to_binary`].
    pub fn load_from_binary(r: &mut Reader<'_>) -> Result<Self, ExecError> {
        let blob = r
            .read_lp_bytes()
            .map_err(|_| ExecError::invalid_format("header"))?;
        Self::load_from_bytes(blob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn sample_exec() -> Executable {
        let mut exec = Executable::new();
        exec.constants.push(Constant::Int(7));
        exec.constants.push(Constant::Shape(vec![2, 3]));
        exec.declare_function(FuncInfo {
            kind: FuncKind::PackedFunc,
            name: "ext".into(),
            start_instr: 0,
            end_instr: 0,
            num_args: 2,
            register_file_size: 0,
            param_names: vec![],
        });
        exec.declare_function(FuncInfo {
            kind: FuncKind::VmFunc,
            name: "main".into(),
            start_instr: 0,
            end_instr: 2,
            num_args: 1,
            register_file_size: 3,
            param_names: vec!["x".into()],
        });
        exec.push_instruction(&Instruction::Call {
            dst: 1,
            func_idx: 0,
            args: vec![Arg::register(0), Arg::const_idx(0)],
        });
        exec.push_instruction(&Instruction::Ret { result: 1 });
        exec
    }

    #[test]
    fn roundtrip_is_bit_exact() {
        let exec = sample_exec();
        let bytes = exec.save_to_bytes();
        let back = Executable::load_from_bytes(&bytes).unwrap();
        assert_eq!(back, exec);
        assert_eq!(back.save_to_bytes(), bytes);
    }

    #[test]
    fn outer_wrapping_roundtrip() {
        let exec = sample_exec();
        let mut w = Writer::new();
        exec.save_to_binary(&mut w);
        // Embeddable: trailing module content survives.
        w.write_u64_le(0x5151);
        let bytes = w.into_vec();
        let mut r = Reader::new(&bytes);
        let back = Executable::load_from_binary(&mut r).unwrap();
        assert_eq!(back, exec);
        assert_eq!(r.read_u64_le().unwrap(), 0x5151);
    }

    #[test]
    fn func_map_is_reconstructed() {
        let exec = sample_exec();
        let back = Executable::load_from_bytes(&exec.save_to_bytes()).unwrap();
        assert!(back.has_function("main"));
        assert!(back.has_function("ext"));
        assert!(!back.has_function("missing"));
        assert_eq!(back.func_index("main"), Some(1));
    }

    #[test]
    fn magic_mutation_names_the_header_section() {
        let mut bytes = sample_exec().save_to_bytes();
        bytes[0] ^= 1;
        let err = Executable::load_from_bytes(&bytes).unwrap_err();
        assert_eq!(err, ExecError::invalid_format("header"));
        assert_eq!(
            alloc::format!("{err}"),
            "Invalid VM file format in the header section."
        );
    }

    #[test]
    fn version_mutation_names_the_version_section() {
        let mut bytes = sample_exec().save_to_bytes();
        // First version byte sits after magic + version length.
        bytes[16] = b'9';
        let err = Executable::load_from_bytes(&bytes).unwrap_err();
        assert_eq!(err, ExecError::invalid_format("version"));
    }

    #[test]
    fn truncated_code_section_is_rejected() {
        let bytes = sample_exec().save_to_bytes();
        let err = Executable::load_from_bytes(&bytes[..bytes.len() - 4]).unwrap_err();
        assert_eq!(err, ExecError::invalid_format("instr data"));
    }

    #[test]
    fn get_instruction_decodes_the_stream() {
        let exec = sample_exec();
        match exec.get_instruction(0).unwrap() {
            Instruction::Call { dst, func_idx, args } => {
                assert_eq!(dst, 1);
                assert_eq!(func_idx, 0);
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected call, got {other:?}"),
        }
        assert_eq!(exec.get_instruction(1).unwrap(), Instruction::Ret { result: 1 });
        assert_eq!(
            exec.get_instruction(9).unwrap_err(),
            ExecError::InstrOutOfBounds { index: 9 }
        );
    }

    #[test]
    fn unknown_opcode_is_an_error() {
        let mut exec = sample_exec();
        exec.set_instruction_data(1, 0, 99);
        assert_eq!(
            exec.get_instruction(1).unwrap_err(),
            ExecError::UnknownOpcode { word: 99 }
        );
    }

    #[test]
    fn set_instruction_data_writes_in_place() {
        let mut exec = sample_exec();
        exec.set_instruction_data(1, 1, 2);
        assert_eq!(exec.get_instruction(1).unwrap(), Instruction::Ret { result: 2 });
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn set_instruction_data_checks_instruction_index() {
        sample_exec().set_instruction_data(5, 0, 0);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn set_instruction_data_checks_word_index() {
        sample_exec().set_instruction_data(1, 10, 0);
    }

    #[test]
    fn stats_lists_constants_and_globals() {
        let stats = sample_exec().stats();
        assert!(stats.contains("Constant pool (# 2): [7, shapetuple[2, 3]]"));
        assert!(stats.contains("Globals (#2): [ext, main]"));
    }

    #[test]
    fn stats_on_empty_executable() {
        let stats = Executable::new().stats();
        assert!(stats.contains("Constant pool (# 0): []"));
        assert!(stats.contains("Globals (#0): []"));
    }

    #[test]
    #[should_panic(expected = "duplicate function name")]
    fn duplicate_function_names_panic() {
        let mut exec = sample_exec();
        exec.declare_function(FuncInfo {
            kind: FuncKind::PackedFunc,
            name: "main".into(),
            start_instr: 0,
            end_instr: 0,
            num_args: 0,
            register_file_size: 0,
            param_names: vec![],
        });
    }
}
