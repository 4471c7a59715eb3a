//! Instruction disassembly for the Z16 ISA.
//!
//! Text is rendered from a [`DecodedInstruction`], so mnemonics, operand
//! roles and immediate signedness come from the same decode the executor
//! runs. Function-code combinations with no defined operation render as an
//! explicit `unknown` marker.

use crate::decoder::{DecodedInstruction, Decoder, Instruction};
use crate::encoding::{Operation, SHIFT_IMM_FUNCT3};
use crate::memory::read_u16_le;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single disassembled instruction row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisassemblyRow {
    /// Address the instruction was read from.
    pub addr: u16,
    /// Raw instruction word.
    pub raw_word: u16,
    /// Assembly text, e.g. `addi sp, -2`.
    pub text: String,
    /// Whether the word has no defined operation.
    pub is_unknown: bool,
}

/// Renders a decoded instruction as assembly text.
#[must_use]
pub fn disassemble(decoded: &DecodedInstruction) -> String {
    let Some(operation) = decoded.operation else {
        return format_unknown(decoded);
    };
    let mnemonic = operation.mnemonic();
    let imm = decoded
        .immediate()
        .map(|value| value.to_string())
        .unwrap_or_default();

    match decoded.instruction {
        Instruction::RegReg { rs2, rd_rs1, .. } => match operation {
            Operation::Jr => format!("{mnemonic} {rd_rs1}"),
            _ => format!("{mnemonic} {rd_rs1}, {rs2}"),
        },
        Instruction::Imm { rd_rs1, .. } => format!("{mnemonic} {rd_rs1}, {imm}"),
        Instruction::Branch { rs2, rs1, .. } => match operation {
            Operation::Bz | Operation::Bnz => format!("{mnemonic} {rs1}, {imm}"),
            _ => format!("{mnemonic} {rs1}, {rs2}, {imm}"),
        },
        Instruction::Store { base, src, .. } => format!("{mnemonic} {src}, {imm}({base})"),
        Instruction::Load { base, rd, .. } => format!("{mnemonic} {rd}, {imm}({base})"),
        Instruction::Jump { link: false, .. } => format!("{mnemonic} {imm}"),
        Instruction::Jump { rd, .. } | Instruction::Upper { rd, .. } => {
            format!("{mnemonic} {rd}, {imm}")
        }
        Instruction::System { .. } => format!("{mnemonic} {imm}"),
    }
}

fn format_unknown(decoded: &DecodedInstruction) -> String {
    match decoded.instruction {
        Instruction::Imm {
            imm7,
            rd_rs1,
            funct3: SHIFT_IMM_FUNCT3,
        } => format!("unknown shift {rd_rs1}, imm=0x{imm7:02X}"),
        Instruction::System { svc, reserved: 0 } => format!("ecall {svc} ; unknown service"),
        _ => unknown_marker(decoded),
    }
}

fn unknown_marker(decoded: &DecodedInstruction) -> String {
    format!(
        "unknown {} 0x{:04X}",
        decoded.instruction.format().name(),
        decoded.raw
    )
}

/// Disassembles the instruction word stored at `pc`.
///
/// Returns `None` when a full word cannot be read from `memory` at `pc`.
#[must_use]
pub fn disassemble_at(pc: u16, memory: &[u8]) -> Option<DisassemblyRow> {
    let raw_word = read_u16_le(memory, pc)?;
    let decoded = Decoder::decode(raw_word);
    Some(DisassemblyRow {
        addr: pc,
        raw_word,
        text: disassemble(&decoded),
        is_unknown: decoded.operation.is_none(),
    })
}

/// Produces up to `count` consecutive listing rows starting at `start`.
///
/// The listing stops early at the end of memory.
#[must_use]
pub fn disassemble_range(start: u16, count: usize, memory: &[u8]) -> Vec<DisassemblyRow> {
    let words_left = memory.len().saturating_sub(usize::from(start)) / 2;
    let mut rows = Vec::with_capacity(count.min(words_left));
    let mut pc = Some(start);

    while rows.len() < count {
        let Some(addr) = pc else { break };
        let Some(row) = disassemble_at(addr, memory) else {
            break;
        };
        rows.push(row);
        pc = addr.checked_add(2);
    }

    rows
}
