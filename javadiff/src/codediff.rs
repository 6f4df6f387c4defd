//! Comparing method bodies.
//!
//! Two code bodies are semantically equivalent when their instruction
//! sequences match with constant pool operands resolved through each side's
//! own pool. The comparison is split the way reports want it: a structural
//! check over offsets, opcodes and raw non-pool operands, and a constants
//! check over the resolved pool operands. Only the latter can be suppressed
//! with the `pool` token, which is what makes a permuted constant pool a
//! non-difference while a changed immediate or branch target always shows.

use std::fmt::Write;

use classfile::attributes::{Code, LineNumber};
use classfile::insn::{Insn, Operand};
use classfile::pool::ConstantPool;

use crate::delta::{Delta, DeltaKind};
use crate::ignore::tokens;

pub fn diff_code(
	left: Option<&Code>,
	right: Option<&Code>,
	left_pool: &ConstantPool,
	right_pool: &ConstantPool,
) -> Delta {
	let children = match (left, right) {
		(None, None) => Vec::new(),
		(Some(_), None) => vec![Delta::removed(DeltaKind::Attribute, "body", "Code body")],
		(None, Some(_)) => vec![Delta::added(DeltaKind::Attribute, "body", "Code body")],
		(Some(left), Some(right)) => {
			let mut children = vec![
				Delta::leaf(
					DeltaKind::Attribute,
					"stack",
					"Stack size",
					Some(left.max_stack.to_string()),
					Some(right.max_stack.to_string()),
				),
				Delta::leaf(
					DeltaKind::Attribute,
					"locals",
					"Locals",
					Some(left.max_locals.to_string()),
					Some(right.max_locals.to_string()),
				),
				Delta::leaf(
					DeltaKind::Attribute,
					"exception_table",
					"Exception table",
					Some(format!("{:?}", left.exception_table)),
					Some(format!("{:?}", right.exception_table)),
				),
			];

			let structurally_equal = left.code.len() == right.code.len()
				&& structure(&left.instructions) == structure(&right.instructions);

			children.push(Delta::leaf(
				DeltaKind::Attribute,
				"body",
				"Code body",
				Some(structure(&left.instructions)),
				Some(structure(&right.instructions)),
			));

			// constants are only comparable over an identical structure
			if structurally_equal {
				children.push(
					Delta::leaf(
						DeltaKind::Attribute,
						"constants",
						"Code constants",
						Some(resolved(&left.instructions, left_pool)),
						Some(resolved(&right.instructions, right_pool)),
					)
					.with_token(tokens::POOL),
				);
			}

			children.push(
				Delta::leaf(
					DeltaKind::Attribute,
					"absolute_lines",
					"Absolute line numbers",
					Some(absolute_lines(left)),
					Some(absolute_lines(right)),
				)
				.with_token(tokens::LINES),
			);
			children.push(
				Delta::leaf(
					DeltaKind::Attribute,
					"relative_lines",
					"Relative line numbers",
					Some(relative_lines(left)),
					Some(relative_lines(right)),
				)
				.with_token(tokens::LINES),
			);

			children
		},
	};

	Delta::parent(DeltaKind::Code, "code", "Code", children)
}

/// The `(offset, mnemonic, raw operands)` sequence, constant pool indices
/// excluded. A changed immediate, local slot or branch target shows up
/// here, in the node no ignore token can suppress.
fn structure(instructions: &[Insn]) -> String {
	let mut out = String::new();
	for insn in instructions {
		let _ = write!(out, "{}: {}", insn.offset, insn.mnemonic());
		for operand in &insn.operands {
			match operand {
				Operand::Cp(_) => {},
				other => {
					let _ = write!(out, " {other:?}");
				},
			}
		}
		out.push('\n');
	}
	out
}

/// The constant pool operands in symbolic form, one line per instruction
/// that carries any. Permuting a pool leaves this rendering intact.
fn resolved(instructions: &[Insn], pool: &ConstantPool) -> String {
	let mut out = String::new();
	for insn in instructions {
		let indices: Vec<u16> = insn
			.operands
			.iter()
			.filter_map(|operand| match operand {
				Operand::Cp(index) => Some(*index),
				_ => None,
			})
			.collect();
		if indices.is_empty() {
			continue;
		}

		let _ = write!(out, "{}: {}", insn.offset, insn.mnemonic());
		for index in indices {
			match pool.symbolic(index) {
				Ok(symbolic) => {
					let _ = write!(out, " {{{symbolic}}}");
				},
				Err(_) => {
					let _ = write!(out, " {{bad cp #{index}}}");
				},
			}
		}
		out.push('\n');
	}
	out
}

fn absolute_lines(code: &Code) -> String {
	let lines = code.line_number_table().unwrap_or(&[]);
	let mut out = String::new();
	for LineNumber { start_pc, line } in lines {
		let _ = writeln!(out, "{start_pc}: {line}");
	}
	out
}

/// Line numbers relative to the method's first line, so that a method that
/// merely moved within its source file reads as unchanged.
fn relative_lines(code: &Code) -> String {
	let lines = code.line_number_table().unwrap_or(&[]);
	let first = lines.first().map(|l| l.line).unwrap_or(0);
	let mut out = String::new();
	for LineNumber { start_pc, line } in lines {
		let _ = writeln!(out, "{start_pc}: {}", line.wrapping_sub(first));
	}
	out
}
