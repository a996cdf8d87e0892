//! WebAssembly text rendering.
//!
//! Produces a module with the image as an active data segment at address
//! 0, the narration sink as an imported five-parameter function, and one
//! exported entry function running the program body. Expressions are
//! printed in folded form, one operand per line.

use std::fmt::{self, Write};

use crate::config::EmitConfig;
use crate::instr::{Expr, Instruction};
use crate::program::Program;

/// Displays `program` as module text.
pub struct Wat<'a> {
    program: &'a Program,
    config: &'a EmitConfig,
}

impl<'a> Wat<'a> {
    /// Prepare to render `program` with the names in `config`.
    pub fn new(program: &'a Program, config: &'a EmitConfig) -> Self {
        Self { program, config }
    }
}

/// Render `program` to a string.
pub fn render(program: &Program, config: &EmitConfig) -> String {
    Wat::new(program, config).to_string()
}

impl fmt::Display for Wat<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (initial, max) = self.program.pages;
        let c = self.config;

        writeln!(f, "(module")?;
        writeln!(
            f,
            " (import \"{}\" \"{}\" (func $narrate (param i32 i32 i32 i32 i32)))",
            escape_name(&c.narrator_module),
            escape_name(&c.narrator_field)
        )?;
        writeln!(f, " (memory $mem {initial} {max})")?;
        write!(f, " (data (i32.const 0) \"")?;
        write_bytes(f, self.program.image.bytes())?;
        writeln!(f, "\")")?;
        writeln!(f, " (export \"{}\" (memory $mem))", escape_name(&c.memory_export))?;
        writeln!(f, " (export \"{}\" (func $entry))", escape_name(&c.entry_point))?;
        writeln!(f, " (func $entry (result i32)")?;
        for instr in &self.program.body {
            write_instr(f, instr, 2)?;
        }
        writeln!(f, " )")?;
        writeln!(f, ")")
    }
}

fn indent(f: &mut impl Write, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        f.write_char(' ')?;
    }
    Ok(())
}

fn write_instr(f: &mut impl Write, instr: &Instruction, depth: usize) -> fmt::Result {
    indent(f, depth)?;
    match instr {
        Instruction::Store {
            offset,
            addr,
            value,
        } => {
            write_memarg(f, "i32.store", *offset)?;
            f.write_char('\n')?;
            write_expr(f, addr, depth + 1)?;
            write_expr(f, value, depth + 1)?;
        }
        Instruction::Narrate(args) => {
            f.write_str("(call $narrate\n")?;
            for e in args.iter() {
                write_expr(f, e, depth + 1)?;
            }
        }
        Instruction::Return(e) => {
            f.write_str("(return\n")?;
            write_expr(f, e, depth + 1)?;
        }
    }
    indent(f, depth)?;
    f.write_str(")\n")
}

fn write_expr(f: &mut impl Write, expr: &Expr, depth: usize) -> fmt::Result {
    indent(f, depth)?;
    match expr {
        Expr::Const(v) => return writeln!(f, "(i32.const {})", *v as i32),
        Expr::Load { offset, addr } => {
            write_memarg(f, "i32.load", *offset)?;
            f.write_char('\n')?;
            write_expr(f, addr, depth + 1)?;
        }
        Expr::Add(l, r) => {
            f.write_str("(i32.add\n")?;
            write_expr(f, l, depth + 1)?;
            write_expr(f, r, depth + 1)?;
        }
    }
    indent(f, depth)?;
    f.write_str(")\n")
}

fn write_memarg(f: &mut impl Write, op: &str, offset: u32) -> fmt::Result {
    if offset == 0 {
        write!(f, "({op}")
    } else {
        write!(f, "({op} offset={offset}")
    }
}

fn write_bytes(f: &mut impl Write, bytes: &[u8]) -> fmt::Result {
    for &b in bytes {
        match b {
            0x20..=0x7e if b != b'"' && b != b'\\' => f.write_char(char::from(b))?,
            _ => write!(f, "\\{b:02x}")?,
        }
    }
    Ok(())
}

fn escape_name(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_escapes_non_printable_and_quotes() {
        let mut out = String::new();
        write_bytes(&mut out, b"a\"\\\x00\xff").unwrap();
        assert_eq!(out, "a\\22\\5c\\00\\ff");
    }

    #[test]
    fn constants_print_signed() {
        let mut out = String::new();
        write_expr(&mut out, &Expr::Const(u32::MAX), 0).unwrap();
        assert_eq!(out, "(i32.const -1)\n");
    }

    #[test]
    fn loads_fold_with_offset() {
        let mut out = String::new();
        write_expr(&mut out, &Expr::load_at(12, Expr::Const(21)), 1).unwrap();
        assert_eq!(out, " (i32.load offset=12\n  (i32.const 21)\n )\n");
    }
}
