//! Arithmetic, logic and branch-condition semantics.
//!
//! Register-register and immediate forms of the same operation share one
//! arm here, so `add`/`addi`, `sll`/`slli` and friends cannot drift apart.

use super::helpers::{as_signed, as_word};
use crate::encoding::Operation;

/// Shift amounts use the low four bits of the source.
const SHIFT_MASK: u16 = 0xF;

/// Computes the value written to `rd_rs1` for ALU operations.
///
/// `lhs` is the current value of `rd_rs1`; `rhs` is `rs2` or the extended
/// immediate. Returns `None` for operations that are not ALU operations.
#[must_use]
pub fn alu(operation: Operation, lhs: u16, rhs: u16) -> Option<u16> {
    let value = match operation {
        Operation::Add | Operation::Addi => lhs.wrapping_add(rhs),
        Operation::Sub => lhs.wrapping_sub(rhs),
        Operation::Slt | Operation::Slti => u16::from(as_signed(lhs) < as_signed(rhs)),
        Operation::Sltu | Operation::Sltui => u16::from(lhs < rhs),
        Operation::Sll | Operation::Slli => lhs << (rhs & SHIFT_MASK),
        Operation::Srl | Operation::Srli => lhs >> (rhs & SHIFT_MASK),
        Operation::Sra | Operation::Srai => as_word(as_signed(lhs) >> (rhs & SHIFT_MASK)),
        Operation::Or | Operation::Ori => lhs | rhs,
        Operation::And | Operation::Andi => lhs & rhs,
        Operation::Xor | Operation::Xori => lhs ^ rhs,
        Operation::Mv | Operation::Li => rhs,
        _ => return None,
    };
    Some(value)
}

/// Evaluates a branch condition on `rs1` and `rs2`.
///
/// `bz`/`bnz` ignore `rs2`. Returns `None` for non-branch operations.
#[must_use]
pub fn branch_taken(operation: Operation, rs1: u16, rs2: u16) -> Option<bool> {
    let taken = match operation {
        Operation::Beq => rs1 == rs2,
        Operation::Bne => rs1 != rs2,
        Operation::Bz => rs1 == 0,
        Operation::Bnz => rs1 != 0,
        Operation::Blt => as_signed(rs1) < as_signed(rs2),
        Operation::Bge => as_signed(rs1) >= as_signed(rs2),
        Operation::Bltu => rs1 < rs2,
        Operation::Bgeu => rs1 >= rs2,
        _ => return None,
    };
    Some(taken)
}
