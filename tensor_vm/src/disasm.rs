// Copyright 2026 the Tensor VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Disassembly of executables in two dialects.
//!
//! [`as_text`] renders an assembly-like listing; [`as_python`] renders the
//! same program as an imperative builder script. Both are pure functions of
//! the executable.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::executable::{ExecError, Executable, FuncKind};
use crate::instruction::{Arg, ArgKind, Instruction, RegName, VM_REGISTER, VOID_REGISTER};

fn reg_name(reg: RegName) -> String {
    if reg == VOID_REGISTER {
        "%void".to_string()
    } else if reg == VM_REGISTER {
        "%vm".to_string()
    } else {
        format!("%{reg}")
    }
}

fn func_name(exec: &Executable, index: i64) -> String {
    match usize::try_from(index).ok().and_then(|i| exec.func_table.get(i)) {
        Some(func) => func.name.clone(),
        None => format!("unknown_func_index({index})"),
    }
}

fn arg_text(exec: &Executable, arg: Arg) -> Result<String, ExecError> {
    match arg.kind() {
        Some(ArgKind::Register) => Ok(reg_name(arg.value())),
        Some(ArgKind::Immediate) => Ok(format!("i{}", arg.value())),
        Some(ArgKind::ConstIdx) => Ok(format!("c[{}]", arg.value())),
        Some(ArgKind::FuncIdx) => Ok(format!("f[{}]", func_name(exec, arg.value()))),
        None => Err(ExecError::UnknownArgKind {
            word: arg.as_word(),
        }),
    }
}

fn arg_python(exec: &Executable, arg: Arg) -> Result<String, ExecError> {
    match arg.kind() {
        Some(ArgKind::Register) => {
            if arg.value() == VM_REGISTER {
                Ok("ib.r(vm)".to_string())
            } else {
                Ok(format!("ib.r({})", arg.value()))
            }
        }
        Some(ArgKind::Immediate) => Ok(format!("ib.imm({})", arg.value())),
        Some(ArgKind::ConstIdx) => Ok(format!("ib.c({})", arg.value())),
        Some(ArgKind::FuncIdx) => {
            let index = arg.value();
            match usize::try_from(index).ok().and_then(|i| exec.func_table.get(i)) {
                Some(func) => Ok(format!("ib.f(\"{}\")", func.name)),
                None => Ok(format!("ib.unknown_func_index({index})")),
            }
        }
        None => Err(ExecError::UnknownArgKind {
            word: arg.as_word(),
        }),
    }
}

fn join_args(
    exec: &Executable,
    args: &[Arg],
    render: fn(&Executable, Arg) -> Result<String, ExecError>,
) -> Result<String, ExecError> {
    let parts: Vec<String> = args
        .iter()
        .map(|&a| render(exec, a))
        .collect::<Result<_, _>>()?;
    Ok(parts.join(", "))
}

/// Renders the assembly-like text dialect.
pub fn as_text(exec: &Executable) -> Result<String, ExecError> {
    let mut os = String::new();
    for func in &exec.func_table {
        match func.kind {
            FuncKind::PackedFunc => {
                os.push_str(&format!("@{} packed_func;\n\n", func.name));
                continue;
            }
            FuncKind::VmTirFunc => {
                os.push_str(&format!(
                    "@{} num_inputs={} vm_tir_func;\n\n",
                    func.name, func.num_args
                ));
                continue;
            }
            FuncKind::VmFunc => {}
        }
        os.push_str(&format!("@{}:\n", func.name));
        for idx in func.start_instr..func.end_instr {
            os.push_str("  ");
            match exec.get_instruction(idx)? {
                Instruction::Call {
                    dst,
                    func_idx,
                    args,
                } => {
                    os.push_str(&format!(
                        "{:<6}{:<16} in: {:<12} dst: {}\n",
                        "call",
                        func_name(exec, func_idx),
                        join_args(exec, &args, arg_text)?,
                        reg_name(dst)
                    ));
                }
                Instruction::Ret { result } => {
                    os.push_str(&format!("{:<6}{}\n", "ret ", reg_name(result)));
                }
                Instruction::Goto { pc_offset } => {
                    os.push_str(&format!("{:<6}{pc_offset}\n", "goto"));
                }
                Instruction::If { cond, false_offset } => {
                    os.push_str(&format!("{:<6}{}, {false_offset}\n", "If", reg_name(cond)));
                }
            }
        }
        os.push('\n');
    }
    Ok(os)
}

/// Renders the builder-script dialect. Non-VM functions are skipped.
pub fn as_python(exec: &Executable) -> Result<String, ExecError> {
    let mut os = String::from("ib = rx.Builder()\n");
    for func in &exec.func_table {
        if func.kind != FuncKind::VmFunc {
            continue;
        }
        os.push_str(&format!(
            "with ib.function(\"{}\", num_inputs={}):\n",
            func.name, func.num_args
        ));
        for idx in func.start_instr..func.end_instr {
            match exec.get_instruction(idx)? {
                Instruction::Call {
                    dst,
                    func_idx,
                    args,
                } => {
                    let callee = match usize::try_from(func_idx)
                        .ok()
                        .and_then(|i| exec.func_table.get(i))
                    {
                        Some(f) => format!("\"{}\"", f.name),
                        None => format!("ib.unknown_func_index({func_idx})"),
                    };
                    os.push_str(&format!(
                        "    ib.emit_call({callee}, args=[{}]",
                        join_args(exec, &args, arg_python)?
                    ));
                    if dst != VOID_REGISTER {
                        os.push_str(&format!(", dst=ib.r({dst})"));
                    }
                    os.push_str(")\n");
                }
                Instruction::Ret { result } => {
                    os.push_str(&format!("    ib.emit_ret(ib.r({result}))\n"));
                }
                Instruction::Goto { pc_offset } => {
                    os.push_str(&format!("    ib.emit_goto({pc_offset})\n"));
                }
                Instruction::If { cond, false_offset } => {
                    os.push_str(&format!("    ib.emit_if(ib.r({cond}), {false_offset})\n"));
                }
            }
        }
    }
    Ok(os)
}

impl Executable {
    /// Renders the assembly-like text dialect.
    pub fn as_text(&self) -> Result<String, ExecError> {
        as_text(self)
    }

    /// Renders the builder-script dialect.
    pub fn as_python(&self) -> Result<String, ExecError> {
        as_python(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executable::FuncInfo;
    use alloc::vec;

    fn vm_func(name: &str, start: i64, end: i64, num_args: i64) -> FuncInfo {
        FuncInfo {
            kind: FuncKind::VmFunc,
            name: name.into(),
            start_instr: start,
            end_instr: end,
            num_args,
            register_file_size: 4,
            param_names: (0..num_args).map(|i| format!("p{i}")).collect(),
        }
    }

    fn branchy_exec() -> Executable {
        let mut exec = Executable::new();
        exec.declare_function(FuncInfo {
            kind: FuncKind::PackedFunc,
            name: "ext".into(),
            start_instr: 0,
            end_instr: 0,
            num_args: 2,
            register_file_size: 0,
            param_names: vec![],
        });
        exec.declare_function(vm_func("main", 0, 4, 1));
        exec.push_instruction(&Instruction::Call {
            dst: 1,
            func_idx: 0,
            args: vec![Arg::register(0), Arg::immediate(3), Arg::const_idx(2)],
        });
        exec.push_instruction(&Instruction::If {
            cond: 1,
            false_offset: 2,
        });
        exec.push_instruction(&Instruction::Goto { pc_offset: 1 });
        exec.push_instruction(&Instruction::Ret { result: 1 });
        exec
    }

    #[test]
    fn text_dialect_renders_every_opcode() {
        let text = branchy_exec().as_text().unwrap();
        assert!(text.contains("@ext packed_func;"));
        assert!(text.contains("@main:"));
        assert!(text.contains("call"));
        assert!(text.contains("in: %0, i3, c[2]"));
        assert!(text.contains("dst: %1"));
        assert!(text.contains("If    %1, 2"));
        assert!(text.contains("goto  1"));
        assert!(text.contains("ret   %1"));
    }

    #[test]
    fn text_renders_special_registers() {
        let mut exec = Executable::new();
        exec.declare_function(vm_func("f", 0, 2, 0));
        exec.push_instruction(&Instruction::Call {
            dst: VOID_REGISTER,
            func_idx: 0,
            args: vec![Arg::register(VM_REGISTER)],
        });
        exec.push_instruction(&Instruction::Ret { result: 0 });
        let text = exec.as_text().unwrap();
        assert!(text.contains("in: %vm"));
        assert!(text.contains("dst: %void"));
    }

    #[test]
    fn text_marks_unknown_function_indices() {
        let mut exec = Executable::new();
        exec.declare_function(vm_func("f", 0, 1, 0));
        exec.push_instruction(&Instruction::Call {
            dst: 0,
            func_idx: 9,
            args: vec![],
        });
        let text = exec.as_text().unwrap();
        assert!(text.contains("unknown_func_index(9)"));
    }

    #[test]
    fn python_dialect_renders_builder_calls() {
        let py = branchy_exec().as_python().unwrap();
        assert!(py.starts_with("ib = rx.Builder()\n"));
        assert!(py.contains("with ib.function(\"main\", num_inputs=1):"));
        assert!(py.contains("ib.emit_call(\"ext\", args=[ib.r(0), ib.imm(3), ib.c(2)], dst=ib.r(1))"));
        assert!(py.contains("ib.emit_if(ib.r(1), 2)"));
        assert!(py.contains("ib.emit_goto(1)"));
        assert!(py.contains("ib.emit_ret(ib.r(1))"));
        // Declarations of non-VM functions are skipped.
        assert!(!py.contains("ext\", num_inputs"));
    }

    #[test]
    fn python_omits_void_destinations() {
        let mut exec = Executable::new();
        exec.declare_function(vm_func("f", 0, 2, 0));
        exec.push_instruction(&Instruction::Call {
            dst: VOID_REGISTER,
            func_idx: 0,
            args: vec![Arg::register(VM_REGISTER)],
        });
        exec.push_instruction(&Instruction::Ret { result: 0 });
        let py = exec.as_python().unwrap();
        assert!(py.contains("ib.emit_call(\"f\", args=[ib.r(vm)])\n"));
        assert!(!py.contains("dst=ib.r"));
    }

    #[test]
    fn unknown_arg_kind_is_an_error() {
        let mut exec = Executable::new();
        exec.declare_function(vm_func("f", 0, 1, 0));
        exec.push_instruction(&Instruction::Call {
            dst: 0,
            func_idx: 0,
            args: vec![Arg::from_word(9 << Arg::VALUE_BITS)],
        });
        assert!(matches!(
            exec.as_text().unwrap_err(),
            ExecError::UnknownArgKind { .. }
        ));
    }

    #[test]
    fn dialects_are_deterministic() {
        let exec = branchy_exec();
        assert_eq!(exec.as_text().unwrap(), exec.as_text().unwrap());
        assert_eq!(exec.as_python().unwrap(), exec.as_python().unwrap());
    }
}
