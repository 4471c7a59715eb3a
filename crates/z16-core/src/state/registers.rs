use std::fmt;

/// Number of architecturally visible general-purpose registers (`x0..x7`).
pub const GENERAL_REGISTER_COUNT: usize = 8;

/// ABI names of `x0..x7`, in register-index order.
pub const ABI_NAMES: [&str; GENERAL_REGISTER_COUNT] =
    ["t0", "ra", "sp", "s0", "s1", "t1", "a0", "a1"];

/// General-purpose register identifier, named by its ABI alias.
///
/// `T0` (`x0`) is an ordinary read/write register, not a hard-wired zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Register {
    T0 = 0,
    Ra = 1,
    Sp = 2,
    S0 = 3,
    S1 = 4,
    T1 = 5,
    A0 = 6,
    A1 = 7,
}

impl Register {
    /// Ordered list of all general-purpose registers.
    pub const ALL: [Self; GENERAL_REGISTER_COUNT] = [
        Self::T0,
        Self::Ra,
        Self::Sp,
        Self::S0,
        Self::S1,
        Self::T1,
        Self::A0,
        Self::A1,
    ];

    /// Returns the array index for this register (`0..=7`).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Decodes a 3-bit register field. Bits above the low three are ignored.
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        match bits & 0x7 {
            0 => Self::T0,
            1 => Self::Ra,
            2 => Self::Sp,
            3 => Self::S0,
            4 => Self::S1,
            5 => Self::T1,
            6 => Self::A0,
            _ => Self::A1,
        }
    }

    /// Returns the raw 3-bit field value for this register.
    #[must_use]
    pub const fn bits(self) -> u16 {
        self as u16
    }

    /// Returns the ABI alias used in assembly text.
    #[must_use]
    pub const fn abi_name(self) -> &'static str {
        ABI_NAMES[self.index()]
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abi_name())
    }
}

/// Architectural register state for one Z16 core: eight GPRs and the `PC`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ArchitecturalState {
    gpr: [u16; GENERAL_REGISTER_COUNT],
    pc: u16,
}

impl ArchitecturalState {
    /// Reads a general-purpose register.
    #[must_use]
    pub const fn gpr(&self, reg: Register) -> u16 {
        self.gpr[reg.index()]
    }

    /// Writes a general-purpose register.
    pub const fn set_gpr(&mut self, reg: Register, value: u16) {
        self.gpr[reg.index()] = value;
    }

    /// Returns the whole register file in index order.
    #[must_use]
    pub const fn gprs(&self) -> &[u16; GENERAL_REGISTER_COUNT] {
        &self.gpr
    }

    /// Reads the `PC` register.
    #[must_use]
    pub const fn pc(&self) -> u16 {
        self.pc
    }

    /// Writes the `PC` register.
    pub const fn set_pc(&mut self, value: u16) {
        self.pc = value;
    }
}
