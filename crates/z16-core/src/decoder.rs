//! Instruction decoder for the Z16 ISA.
//!
//! Decoding is total: every 16-bit word maps to exactly one [`Instruction`]
//! variant chosen by the opcode. Function-code combinations with no defined
//! meaning still decode; they simply carry no [`Operation`] and surface as
//! unimplemented at execution time.

use std::fmt;

use crate::encoding::{
    classify_imm, classify_reg_reg, low_byte, lookup, BitField, InstructionFormat, Operation,
    Service, BRANCH_TABLE, FUNCT3, FUNCT4, IMM4, IMM7, IMM_HI, IMM_LO, LINK, LOAD_TABLE, OPCODE,
    RD_RS1, RS2, SHIFT_AMOUNT, STORE_TABLE, SVC, SYS_RESERVED,
};
use crate::fault::FaultCode;
use crate::state::Register;

/// A decoded instruction: one variant per format, carrying the raw fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Instruction {
    /// `funct4 | rs2 | rd_rs1 | funct3 | 000`
    RegReg {
        funct4: u8,
        rs2: Register,
        rd_rs1: Register,
        funct3: u8,
    },
    /// `imm7 | rd_rs1 | funct3 | 001`
    Imm {
        imm7: u8,
        rd_rs1: Register,
        funct3: u8,
    },
    /// `offset[4:1] | rs2 | rs1 | funct3 | 010`
    Branch {
        offset: u8,
        rs2: Register,
        rs1: Register,
        funct3: u8,
    },
    /// `imm4 | base | src | funct3 | 011`
    Store {
        imm4: u8,
        base: Register,
        src: Register,
        funct3: u8,
    },
    /// `imm4 | base | rd | funct3 | 100`
    Load {
        imm4: u8,
        base: Register,
        rd: Register,
        funct3: u8,
    },
    /// `link | imm[9:4] | rd | imm[3:1] | 101`
    Jump {
        link: bool,
        imm_hi: u8,
        rd: Register,
        imm_lo: u8,
    },
    /// `link | imm[15:10] | rd | imm[9:7] | 110`
    Upper {
        link: bool,
        imm_hi: u8,
        rd: Register,
        imm_lo: u8,
    },
    /// `svc | reserved | 111`
    System { svc: u16, reserved: u8 },
}

impl Instruction {
    /// Returns the format this variant belongs to.
    #[must_use]
    pub const fn format(self) -> InstructionFormat {
        match self {
            Self::RegReg { .. } => InstructionFormat::RegReg,
            Self::Imm { .. } => InstructionFormat::Imm,
            Self::Branch { .. } => InstructionFormat::Branch,
            Self::Store { .. } => InstructionFormat::Store,
            Self::Load { .. } => InstructionFormat::Load,
            Self::Jump { .. } => InstructionFormat::Jump,
            Self::Upper { .. } => InstructionFormat::Upper,
            Self::System { .. } => InstructionFormat::System,
        }
    }

    /// Re-packs the fields into the 16-bit word they were decoded from.
    #[must_use]
    pub fn encode(self) -> u16 {
        let word = OPCODE.insert(0, self.format().opcode());
        match self {
            Self::RegReg {
                funct4,
                rs2,
                rd_rs1,
                funct3,
            } => {
                let word = FUNCT4.insert(word, u16::from(funct4));
                let word = RS2.insert(word, rs2.bits());
                let word = RD_RS1.insert(word, rd_rs1.bits());
                FUNCT3.insert(word, u16::from(funct3))
            }
            Self::Imm {
                imm7,
                rd_rs1,
                funct3,
            } => {
                let word = IMM7.insert(word, u16::from(imm7));
                let word = RD_RS1.insert(word, rd_rs1.bits());
                FUNCT3.insert(word, u16::from(funct3))
            }
            Self::Branch {
                offset,
                rs2,
                rs1,
                funct3,
            } => pack_imm4_form(word, offset, rs2, rs1, funct3),
            Self::Store {
                imm4,
                base,
                src,
                funct3,
            } => pack_imm4_form(word, imm4, base, src, funct3),
            Self::Load {
                imm4,
                base,
                rd,
                funct3,
            } => pack_imm4_form(word, imm4, base, rd, funct3),
            Self::Jump {
                link,
                imm_hi,
                rd,
                imm_lo,
            }
            | Self::Upper {
                link,
                imm_hi,
                rd,
                imm_lo,
            } => {
                let word = LINK.insert(word, u16::from(link));
                let word = IMM_HI.insert(word, u16::from(imm_hi));
                let word = RD_RS1.insert(word, rd.bits());
                IMM_LO.insert(word, u16::from(imm_lo))
            }
            Self::System { svc, reserved } => {
                let word = SVC.insert(word, svc);
                SYS_RESERVED.insert(word, u16::from(reserved))
            }
        }
    }
}

fn pack_imm4_form(word: u16, imm4: u8, rs2: Register, rd_rs1: Register, funct3: u8) -> u16 {
    let word = IMM4.insert(word, u16::from(imm4));
    let word = RS2.insert(word, rs2.bits());
    let word = RD_RS1.insert(word, rd_rs1.bits());
    FUNCT3.insert(word, u16::from(funct3))
}

/// An immediate operand after sign or zero extension.
///
/// The executor and the disassembler both read operands through this type,
/// so the printed value is always the value that executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Immediate {
    /// Two's-complement value, printed with a sign.
    Signed(i16),
    /// Zero-extended value, printed unsigned.
    Unsigned(u16),
}

impl Immediate {
    /// Returns the 16-bit register pattern of this immediate.
    #[must_use]
    pub const fn as_word(self) -> u16 {
        match self {
            Self::Signed(value) => u16::from_ne_bytes(value.to_ne_bytes()),
            Self::Unsigned(value) => value,
        }
    }
}

impl fmt::Display for Immediate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signed(value) => write!(f, "{value}"),
            Self::Unsigned(value) => write!(f, "{value}"),
        }
    }
}

/// Sign-extends the low `bits` bits of `value` to 16 bits.
#[must_use]
pub const fn sign_extend(value: u16, bits: u32) -> i16 {
    let shift = 16 - bits;
    i16::from_ne_bytes((value << shift).to_ne_bytes()) >> shift
}

/// Signed 7-bit immediate of the immediate format.
#[must_use]
pub const fn imm7_signed(imm7: u8) -> i16 {
    sign_extend(imm7 as u16, 7)
}

/// Branch displacement: `offset` holds bits `[4:1]`, bit 0 is zero.
///
/// `0xF` becomes `0b11110`, which is `-2`.
#[must_use]
pub const fn branch_displacement(offset: u8) -> i16 {
    sign_extend((offset as u16) << 1, 5)
}

/// Signed 4-bit load/store offset.
#[must_use]
pub const fn memory_offset(imm4: u8) -> i16 {
    sign_extend(imm4 as u16, 4)
}

/// Signed 10-bit jump displacement assembled from `imm[9:4]` and `imm[3:1]`.
#[must_use]
pub const fn jump_offset(imm_hi: u8, imm_lo: u8) -> i16 {
    sign_extend(((imm_hi as u16) << 4) | ((imm_lo as u16) << 1), 10)
}

/// Upper immediate with `imm_hi` in bits `[15:10]` and `imm_lo` in `[9:7]`.
#[must_use]
pub const fn upper_immediate(imm_hi: u8, imm_lo: u8) -> u16 {
    ((imm_hi as u16) << 10) | ((imm_lo as u16) << 7)
}

/// A decoded instruction together with its raw word and resolved operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecodedInstruction {
    /// The fetched instruction word.
    pub raw: u16,
    /// Format variant with extracted fields.
    pub instruction: Instruction,
    /// Operation selected by the function codes, if defined.
    pub operation: Option<Operation>,
}

impl DecodedInstruction {
    /// Returns the immediate operand of the defined operation, extended the
    /// way the executor uses it.
    #[must_use]
    pub fn immediate(&self) -> Option<Immediate> {
        let operation = self.operation?;
        match self.instruction {
            Instruction::RegReg { .. } => None,
            Instruction::Imm { imm7, .. } => Some(match operation {
                Operation::Sltui => Immediate::Unsigned(u16::from(imm7)),
                Operation::Slli | Operation::Srli | Operation::Srai => {
                    Immediate::Unsigned(SHIFT_AMOUNT.extract(u16::from(imm7)))
                }
                _ => Immediate::Signed(imm7_signed(imm7)),
            }),
            Instruction::Branch { offset, .. } => {
                Some(Immediate::Signed(branch_displacement(offset)))
            }
            Instruction::Store { imm4, .. } | Instruction::Load { imm4, .. } => {
                Some(Immediate::Signed(memory_offset(imm4)))
            }
            Instruction::Jump { imm_hi, imm_lo, .. } => {
                Some(Immediate::Signed(jump_offset(imm_hi, imm_lo)))
            }
            Instruction::Upper { imm_hi, imm_lo, .. } => {
                Some(Immediate::Unsigned(upper_immediate(imm_hi, imm_lo)))
            }
            Instruction::System { svc, .. } => Some(Immediate::Unsigned(svc)),
        }
    }

    /// Fault reported when this instruction has no defined operation.
    #[must_use]
    pub const fn unimplemented_cause(&self) -> Option<FaultCode> {
        if self.operation.is_some() {
            return None;
        }
        match self.instruction {
            Instruction::System { reserved: 0, .. } => Some(FaultCode::UnimplementedService),
            _ => Some(FaultCode::UnimplementedOperation),
        }
    }
}

/// Instruction decoder for the Z16 ISA.
pub struct Decoder;

impl Decoder {
    /// Decodes a 16-bit instruction word. Never fails.
    #[must_use]
    pub fn decode(word: u16) -> DecodedInstruction {
        let instruction = Self::extract_fields(word);
        DecodedInstruction {
            raw: word,
            instruction,
            operation: Self::classify(instruction),
        }
    }

    /// Splits `word` into the fields of the format chosen by its opcode.
    #[must_use]
    pub fn extract_fields(word: u16) -> Instruction {
        let field = |bits: BitField| low_byte(bits.extract(word));
        let reg = |bits: BitField| Register::from_bits(bits.extract(word));

        match InstructionFormat::from_opcode(OPCODE.extract(word)) {
            InstructionFormat::RegReg => Instruction::RegReg {
                funct4: field(FUNCT4),
                rs2: reg(RS2),
                rd_rs1: reg(RD_RS1),
                funct3: field(FUNCT3),
            },
            InstructionFormat::Imm => Instruction::Imm {
                imm7: field(IMM7),
                rd_rs1: reg(RD_RS1),
                funct3: field(FUNCT3),
            },
            InstructionFormat::Branch => Instruction::Branch {
                offset: field(IMM4),
                rs2: reg(RS2),
                rs1: reg(RD_RS1),
                funct3: field(FUNCT3),
            },
            InstructionFormat::Store => Instruction::Store {
                imm4: field(IMM4),
                base: reg(RS2),
                src: reg(RD_RS1),
                funct3: field(FUNCT3),
            },
            InstructionFormat::Load => Instruction::Load {
                imm4: field(IMM4),
                base: reg(RS2),
                rd: reg(RD_RS1),
                funct3: field(FUNCT3),
            },
            InstructionFormat::Jump => Instruction::Jump {
                link: LINK.extract(word) != 0,
                imm_hi: field(IMM_HI),
                rd: reg(RD_RS1),
                imm_lo: field(IMM_LO),
            },
            InstructionFormat::Upper => Instruction::Upper {
                link: LINK.extract(word) != 0,
                imm_hi: field(IMM_HI),
                rd: reg(RD_RS1),
                imm_lo: field(IMM_LO),
            },
            InstructionFormat::System => Instruction::System {
                svc: SVC.extract(word),
                reserved: field(SYS_RESERVED),
            },
        }
    }

    /// Resolves the operation selected by the function-code fields.
    #[must_use]
    pub fn classify(instruction: Instruction) -> Option<Operation> {
        match instruction {
            Instruction::RegReg { funct4, funct3, .. } => classify_reg_reg(funct4, funct3),
            Instruction::Imm { imm7, funct3, .. } => classify_imm(funct3, imm7),
            Instruction::Branch { funct3, .. } => lookup(BRANCH_TABLE, funct3),
            Instruction::Store { funct3, .. } => lookup(STORE_TABLE, funct3),
            Instruction::Load { funct3, .. } => lookup(LOAD_TABLE, funct3),
            Instruction::Jump { link, .. } => Some(if link {
                Operation::Jal
            } else {
                Operation::J
            }),
            Instruction::Upper { link, .. } => Some(if link {
                Operation::Auipc
            } else {
                Operation::Lui
            }),
            Instruction::System { svc, reserved } => {
                if reserved != 0 {
                    return None;
                }
                Service::from_svc(svc).map(Operation::Ecall)
            }
        }
    }
}
