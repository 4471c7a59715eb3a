//! Instruction formats, bit-field layouts and function-code tables.
//!
//! Both the decoder and the disassembler read fields through the [`BitField`]
//! constants and resolve operations through the tables in this module, so
//! there is exactly one definition of what a bit pattern means.

/// A contiguous bit field inside a 16-bit instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitField {
    /// Bit position of the field's least significant bit.
    pub shift: u8,
    /// Field width in bits (`1..=15`).
    pub width: u8,
}

impl BitField {
    /// Creates a field descriptor.
    #[must_use]
    pub const fn new(shift: u8, width: u8) -> Self {
        Self { shift, width }
    }

    /// Right-aligned mask covering the field width.
    #[must_use]
    pub const fn mask(self) -> u16 {
        (1u16 << self.width) - 1
    }

    /// Extracts the field from `word`, right-aligned.
    #[must_use]
    pub const fn extract(self, word: u16) -> u16 {
        (word >> self.shift) & self.mask()
    }

    /// Returns `word` with `value` placed into this field.
    ///
    /// Bits of `value` beyond the field width are discarded.
    #[must_use]
    pub const fn insert(self, word: u16, value: u16) -> u16 {
        let cleared = word & !(self.mask() << self.shift);
        cleared | ((value & self.mask()) << self.shift)
    }
}

/// `[2:0]` opcode selecting the instruction format.
pub const OPCODE: BitField = BitField::new(0, 3);
/// `[5:3]` secondary function code.
pub const FUNCT3: BitField = BitField::new(3, 3);
/// `[8:6]` destination / first source register.
pub const RD_RS1: BitField = BitField::new(6, 3);
/// `[11:9]` second source / base-address register.
pub const RS2: BitField = BitField::new(9, 3);
/// `[15:12]` primary function code of the register-register format.
pub const FUNCT4: BitField = BitField::new(12, 4);
/// `[15:9]` immediate of the immediate format.
pub const IMM7: BitField = BitField::new(9, 7);
/// `[15:12]` branch offset bits `[4:1]` or load/store offset.
pub const IMM4: BitField = BitField::new(12, 4);
/// `[15]` link flag of the jump and upper formats.
pub const LINK: BitField = BitField::new(15, 1);
/// `[14:9]` high immediate bits of the jump and upper formats.
pub const IMM_HI: BitField = BitField::new(9, 6);
/// `[5:3]` low immediate bits of the jump and upper formats.
pub const IMM_LO: BitField = BitField::new(3, 3);
/// `[15:6]` 10-bit system service number.
pub const SVC: BitField = BitField::new(6, 10);
/// `[5:3]` reserved bits of the system format, must be zero.
pub const SYS_RESERVED: BitField = BitField::new(3, 3);

/// Shift-mode selector inside a 7-bit shift immediate (`imm7[6:4]`).
pub const SHIFT_MODE: BitField = BitField::new(4, 3);
/// Unsigned shift amount inside a 7-bit shift immediate (`imm7[3:0]`).
pub const SHIFT_AMOUNT: BitField = BitField::new(0, 4);

/// `funct3` value that turns the immediate format into a shift.
pub const SHIFT_IMM_FUNCT3: u8 = 0x3;

/// The eight instruction formats selected by the 3-bit opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum InstructionFormat {
    /// Register-register ALU and register jumps.
    RegReg = 0x0,
    /// Register-immediate ALU, shifts and `li`.
    Imm = 0x1,
    /// Conditional PC-relative branches.
    Branch = 0x2,
    /// Byte/word stores.
    Store = 0x3,
    /// Byte/word loads.
    Load = 0x4,
    /// PC-relative `j` / `jal`.
    Jump = 0x5,
    /// `lui` / `auipc`.
    Upper = 0x6,
    /// `ecall` system services.
    System = 0x7,
}

impl InstructionFormat {
    /// Converts an opcode into its format. Total over the 3-bit opcode space.
    #[must_use]
    pub const fn from_opcode(opcode: u16) -> Self {
        match opcode & 0x7 {
            0x0 => Self::RegReg,
            0x1 => Self::Imm,
            0x2 => Self::Branch,
            0x3 => Self::Store,
            0x4 => Self::Load,
            0x5 => Self::Jump,
            0x6 => Self::Upper,
            _ => Self::System,
        }
    }

    /// Returns the opcode value for this format.
    #[must_use]
    pub const fn opcode(self) -> u16 {
        self as u16
    }

    /// Short name used in "unknown" disassembly markers.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::RegReg => "r-type",
            Self::Imm => "i-type",
            Self::Branch => "b-type",
            Self::Store => "s-type",
            Self::Load => "l-type",
            Self::Jump => "j-type",
            Self::Upper => "u-type",
            Self::System => "sys",
        }
    }
}

/// System services reachable through `ecall`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Service {
    /// Print `a0` as a signed decimal integer.
    PrintInt = 1,
    /// Stop the simulation.
    Exit = 3,
    /// Print the NUL-terminated string whose address is in `a0`.
    PrintString = 5,
}

/// Defined service numbers.
pub const SERVICE_TABLE: &[(u16, Service)] = &[
    (1, Service::PrintInt),
    (3, Service::Exit),
    (5, Service::PrintString),
];

impl Service {
    /// Looks up a service number; `None` for undefined services.
    #[must_use]
    pub fn from_svc(svc: u16) -> Option<Self> {
        lookup(SERVICE_TABLE, svc)
    }

    /// Returns the service number.
    #[must_use]
    pub const fn svc(self) -> u16 {
        self as u16
    }
}

/// Every defined Z16 operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Operation {
    Add,
    Sub,
    Slt,
    Sltu,
    Sll,
    Srl,
    Sra,
    Or,
    And,
    Xor,
    Mv,
    Jr,
    Jalr,
    Addi,
    Slti,
    Sltui,
    Slli,
    Srli,
    Srai,
    Ori,
    Andi,
    Xori,
    Li,
    Beq,
    Bne,
    Bz,
    Bnz,
    Blt,
    Bge,
    Bltu,
    Bgeu,
    Sb,
    Sw,
    Lb,
    Lw,
    Lbu,
    J,
    Jal,
    Lui,
    Auipc,
    Ecall(Service),
}

impl Operation {
    /// Assembly mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Slt => "slt",
            Self::Sltu => "sltu",
            Self::Sll => "sll",
            Self::Srl => "srl",
            Self::Sra => "sra",
            Self::Or => "or",
            Self::And => "and",
            Self::Xor => "xor",
            Self::Mv => "mv",
            Self::Jr => "jr",
            Self::Jalr => "jalr",
            Self::Addi => "addi",
            Self::Slti => "slti",
            Self::Sltui => "sltui",
            Self::Slli => "slli",
            Self::Srli => "srli",
            Self::Srai => "srai",
            Self::Ori => "ori",
            Self::Andi => "andi",
            Self::Xori => "xori",
            Self::Li => "li",
            Self::Beq => "beq",
            Self::Bne => "bne",
            Self::Bz => "bz",
            Self::Bnz => "bnz",
            Self::Blt => "blt",
            Self::Bge => "bge",
            Self::Bltu => "bltu",
            Self::Bgeu => "bgeu",
            Self::Sb => "sb",
            Self::Sw => "sw",
            Self::Lb => "lb",
            Self::Lw => "lw",
            Self::Lbu => "lbu",
            Self::J => "j",
            Self::Jal => "jal",
            Self::Lui => "lui",
            Self::Auipc => "auipc",
            Self::Ecall(_) => "ecall",
        }
    }

    /// Format whose encoding carries this operation.
    #[must_use]
    pub const fn format(self) -> InstructionFormat {
        match self {
            Self::Add
            | Self::Sub
            | Self::Slt
            | Self::Sltu
            | Self::Sll
            | Self::Srl
            | Self::Sra
            | Self::Or
            | Self::And
            | Self::Xor
            | Self::Mv
            | Self::Jr
            | Self::Jalr => InstructionFormat::RegReg,
            Self::Addi
            | Self::Slti
            | Self::Sltui
            | Self::Slli
            | Self::Srli
            | Self::Srai
            | Self::Ori
            | Self::Andi
            | Self::Xori
            | Self::Li => InstructionFormat::Imm,
            Self::Beq
            | Self::Bne
            | Self::Bz
            | Self::Bnz
            | Self::Blt
            | Self::Bge
            | Self::Bltu
            | Self::Bgeu => InstructionFormat::Branch,
            Self::Sb | Self::Sw => InstructionFormat::Store,
            Self::Lb | Self::Lw | Self::Lbu => InstructionFormat::Load,
            Self::J | Self::Jal => InstructionFormat::Jump,
            Self::Lui | Self::Auipc => InstructionFormat::Upper,
            Self::Ecall(_) => InstructionFormat::System,
        }
    }

    /// Returns `true` when the operation sets the `PC` itself.
    #[must_use]
    pub const fn is_control_flow(self) -> bool {
        matches!(
            self.format(),
            InstructionFormat::Branch | InstructionFormat::Jump
        ) || matches!(self, Self::Jr | Self::Jalr)
    }
}

/// Register-register operations keyed by `(funct4, funct3)`.
///
/// Any pair not listed is an unimplemented operation.
pub const REG_REG_TABLE: &[(u8, u8, Operation)] = &[
    (0x0, 0x0, Operation::Add),
    (0x1, 0x0, Operation::Sub),
    (0x2, 0x1, Operation::Slt),
    (0x3, 0x2, Operation::Sltu),
    (0x4, 0x3, Operation::Sll),
    (0x5, 0x3, Operation::Srl),
    (0x6, 0x3, Operation::Sra),
    (0x7, 0x4, Operation::Or),
    (0x8, 0x5, Operation::And),
    (0x9, 0x6, Operation::Xor),
    (0xA, 0x7, Operation::Mv),
    (0xB, 0x0, Operation::Jr),
    (0xC, 0x0, Operation::Jalr),
];

/// Immediate-format operations keyed by `funct3`, excluding the shift group.
pub const IMM_TABLE: &[(u8, Operation)] = &[
    (0x0, Operation::Addi),
    (0x1, Operation::Slti),
    (0x2, Operation::Sltui),
    (0x4, Operation::Ori),
    (0x5, Operation::Andi),
    (0x6, Operation::Xori),
    (0x7, Operation::Li),
];

/// Immediate shifts keyed by the shift-mode bits `imm7[6:4]`.
pub const SHIFT_TABLE: &[(u8, Operation)] = &[
    (0x1, Operation::Slli),
    (0x2, Operation::Srli),
    (0x4, Operation::Srai),
];

/// Branches keyed by `funct3`.
pub const BRANCH_TABLE: &[(u8, Operation)] = &[
    (0x0, Operation::Beq),
    (0x1, Operation::Bne),
    (0x2, Operation::Bz),
    (0x3, Operation::Bnz),
    (0x4, Operation::Blt),
    (0x5, Operation::Bge),
    (0x6, Operation::Bltu),
    (0x7, Operation::Bgeu),
];

/// Stores keyed by `funct3`.
pub const STORE_TABLE: &[(u8, Operation)] = &[(0x0, Operation::Sb), (0x1, Operation::Sw)];

/// Loads keyed by `funct3`.
pub const LOAD_TABLE: &[(u8, Operation)] = &[
    (0x0, Operation::Lb),
    (0x1, Operation::Lw),
    (0x4, Operation::Lbu),
];

/// Looks up `key` in a single-key table.
#[must_use]
pub fn lookup<K: Copy + PartialEq, V: Copy>(table: &[(K, V)], key: K) -> Option<V> {
    table
        .iter()
        .find_map(|(entry_key, value)| (*entry_key == key).then_some(*value))
}

/// Resolves a register-register `(funct4, funct3)` pair.
#[must_use]
pub fn classify_reg_reg(funct4: u8, funct3: u8) -> Option<Operation> {
    REG_REG_TABLE
        .iter()
        .find_map(|(entry_funct4, entry_funct3, operation)| {
            ((*entry_funct4 == funct4) && (*entry_funct3 == funct3)).then_some(*operation)
        })
}

/// Resolves an immediate-format instruction from `funct3` and its `imm7`.
#[must_use]
pub fn classify_imm(funct3: u8, imm7: u8) -> Option<Operation> {
    if funct3 == SHIFT_IMM_FUNCT3 {
        let mode = SHIFT_MODE.extract(u16::from(imm7));
        lookup(SHIFT_TABLE, low_byte(mode))
    } else {
        lookup(IMM_TABLE, funct3)
    }
}

/// Truncates an already-masked field value to a byte.
#[must_use]
pub const fn low_byte(value: u16) -> u8 {
    value.to_le_bytes()[0]
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rstest::rstest;

    use super::{
        classify_imm, classify_reg_reg, lookup, BitField, InstructionFormat, Operation, Service,
        BRANCH_TABLE, IMM7, IMM_TABLE, LOAD_TABLE, REG_REG_TABLE, SERVICE_TABLE, SHIFT_TABLE,
        STORE_TABLE, SVC,
    };

    #[test]
    fn reg_reg_table_contains_unique_pairs() {
        let pairs: HashSet<_> = REG_REG_TABLE.iter().map(|(f4, f3, _)| (*f4, *f3)).collect();
        assert_eq!(pairs.len(), REG_REG_TABLE.len());
    }

    #[rstest]
    #[case(0x0, 0x0, "add")]
    #[case(0x1, 0x0, "sub")]
    #[case(0x2, 0x1, "slt")]
    #[case(0x3, 0x2, "sltu")]
    #[case(0x4, 0x3, "sll")]
    #[case(0x5, 0x3, "srl")]
    #[case(0x6, 0x3, "sra")]
    #[case(0x7, 0x4, "or")]
    #[case(0x8, 0x5, "and")]
    #[case(0x9, 0x6, "xor")]
    #[case(0xA, 0x7, "mv")]
    #[case(0xB, 0x0, "jr")]
    #[case(0xC, 0x0, "jalr")]
    fn reg_reg_function_codes(#[case] funct4: u8, #[case] funct3: u8, #[case] mnemonic: &str) {
        assert_eq!(
            classify_reg_reg(funct4, funct3).map(Operation::mnemonic),
            Some(mnemonic)
        );
    }

    #[test]
    fn single_key_function_codes() {
        let names = |table: &[(u8, Operation)]| -> Vec<(u8, &'static str)> {
            table.iter().map(|(key, op)| (*key, op.mnemonic())).collect()
        };
        assert_eq!(
            names(IMM_TABLE),
            [
                (0, "addi"),
                (1, "slti"),
                (2, "sltui"),
                (4, "ori"),
                (5, "andi"),
                (6, "xori"),
                (7, "li")
            ]
        );
        assert_eq!(names(SHIFT_TABLE), [(1, "slli"), (2, "srli"), (4, "srai")]);
        assert_eq!(
            names(BRANCH_TABLE),
            [
                (0, "beq"),
                (1, "bne"),
                (2, "bz"),
                (3, "bnz"),
                (4, "blt"),
                (5, "bge"),
                (6, "bltu"),
                (7, "bgeu")
            ]
        );
        assert_eq!(names(STORE_TABLE), [(0, "sb"), (1, "sw")]);
        assert_eq!(names(LOAD_TABLE), [(0, "lb"), (1, "lw"), (4, "lbu")]);
    }

    #[test]
    fn every_table_entry_resolves_to_its_own_format() {
        for (f4, f3, op) in REG_REG_TABLE {
            assert_eq!(classify_reg_reg(*f4, *f3), Some(*op));
            assert_eq!(op.format(), InstructionFormat::RegReg);
        }
        for (table, format) in [
            (IMM_TABLE, InstructionFormat::Imm),
            (SHIFT_TABLE, InstructionFormat::Imm),
            (BRANCH_TABLE, InstructionFormat::Branch),
            (STORE_TABLE, InstructionFormat::Store),
            (LOAD_TABLE, InstructionFormat::Load),
        ] {
            for (key, op) in table {
                assert_eq!(lookup(table, *key), Some(*op));
                assert_eq!(op.format(), format);
            }
        }
    }

    #[rstest]
    #[case(0x0, 0x1)]
    #[case(0x2, 0x0)]
    #[case(0xB, 0x1)]
    #[case(0xD, 0x0)]
    #[case(0xF, 0x7)]
    fn unassigned_reg_reg_pairs_are_unimplemented(#[case] funct4: u8, #[case] funct3: u8) {
        assert_eq!(classify_reg_reg(funct4, funct3), None);
    }

    #[rstest]
    #[case(0b001_0011, Some(Operation::Slli))]
    #[case(0b010_1111, Some(Operation::Srli))]
    #[case(0b100_0001, Some(Operation::Srai))]
    #[case(0b000_0001, None)]
    #[case(0b011_0001, None)]
    #[case(0b111_1111, None)]
    fn shift_mode_selects_shift_operation(#[case] imm7: u8, #[case] expected: Option<Operation>) {
        assert_eq!(classify_imm(0x3, imm7), expected);
    }

    #[test]
    fn undefined_loads_and_stores_are_unimplemented() {
        for funct3 in 2u8..=7 {
            assert_eq!(lookup(STORE_TABLE, funct3), None);
        }
        for funct3 in [2u8, 3, 5, 6, 7] {
            assert_eq!(lookup(LOAD_TABLE, funct3), None);
        }
    }

    #[test]
    fn services_resolve_only_for_documented_numbers() {
        for (svc, service) in SERVICE_TABLE {
            assert_eq!(Service::from_svc(*svc), Some(*service));
            assert_eq!(service.svc(), *svc);
        }
        assert_eq!(Service::from_svc(0), None);
        assert_eq!(Service::from_svc(0x3FF), None);
    }

    #[test]
    fn opcode_maps_to_all_eight_formats() {
        let formats: HashSet<_> = (0u16..8).map(InstructionFormat::from_opcode).collect();
        assert_eq!(formats.len(), 8);
        for opcode in 0u16..8 {
            assert_eq!(InstructionFormat::from_opcode(opcode).opcode(), opcode);
        }
    }

    #[test]
    fn bit_field_extract_and_insert_are_inverse() {
        let word = IMM7.insert(0, 0x55);
        assert_eq!(word, 0x55 << 9);
        assert_eq!(IMM7.extract(word), 0x55);
        assert_eq!(SVC.extract(SVC.insert(0, 0x3FF)), 0x3FF);

        let field = BitField::new(4, 2);
        assert_eq!(field.insert(0xFFFF, 0), 0xFFCF);
        assert_eq!(field.insert(0, 0xFF), 0x0030);
    }

    #[test]
    fn control_flow_operations_are_flagged() {
        assert!(Operation::Jr.is_control_flow());
        assert!(Operation::Jalr.is_control_flow());
        assert!(Operation::Beq.is_control_flow());
        assert!(Operation::Jal.is_control_flow());
        assert!(!Operation::Auipc.is_control_flow());
        assert!(!Operation::Ecall(Service::Exit).is_control_flow());
    }
}
