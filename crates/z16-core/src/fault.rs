use thiserror::Error;

/// Fault classes used for diagnostics aggregation and policy decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// Load/store or string scan left the 64 KiB address space.
    Memory,
    /// Function-code combination has no defined operation.
    Decode,
    /// System call requested an undefined service.
    Service,
}

/// Stable simulator fault taxonomy.
///
/// None of these are architectural exceptions: Z16 has no trap mechanism, so
/// every fault is a simulator-level diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum FaultCode {
    /// Load/store effective address lies outside memory.
    #[error("load/store address outside the 64 KiB address space")]
    AddressOutOfRange = 0x01,
    /// `ecall 5` reached the end of memory without finding a NUL byte.
    #[error("string output reached end of memory without a terminator")]
    UnterminatedString = 0x02,
    /// Function-code bits select no defined operation.
    #[error("unimplemented operation")]
    UnimplementedOperation = 0x03,
    /// `ecall` with an undefined service number.
    #[error("unimplemented system service")]
    UnimplementedService = 0x04,
}

impl FaultCode {
    /// Converts a fault code to its stable byte value.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Converts the stable byte value back into a fault code.
    #[must_use]
    pub const fn from_u8(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(Self::AddressOutOfRange),
            0x02 => Some(Self::UnterminatedString),
            0x03 => Some(Self::UnimplementedOperation),
            0x04 => Some(Self::UnimplementedService),
            _ => None,
        }
    }

    /// Returns the diagnostics fault class for this fault code.
    #[must_use]
    pub const fn class(self) -> FaultClass {
        match self {
            Self::AddressOutOfRange | Self::UnterminatedString => FaultClass::Memory,
            Self::UnimplementedOperation => FaultClass::Decode,
            Self::UnimplementedService => FaultClass::Service,
        }
    }

    /// Faults that abort the simulation regardless of configured policy.
    ///
    /// The unimplemented kinds are recoverable and follow
    /// [`UnimplementedPolicy`](crate::UnimplementedPolicy).
    #[must_use]
    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::AddressOutOfRange | Self::UnterminatedString)
    }
}

/// Error returned when a run stops on a latched fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum SimError {
    /// A fault stopped the simulation at the instruction fetched from `pc`.
    #[error("{cause} (instruction at 0x{pc:04X})")]
    Fault {
        /// Fault that stopped execution.
        cause: FaultCode,
        /// Address of the offending instruction.
        pc: u16,
    },
}

#[cfg(test)]
mod tests {
    use super::{FaultClass, FaultCode, SimError};

    #[test]
    fn stable_code_roundtrip_is_bijective_for_defined_values() {
        for code in 0x01u8..=0x04 {
            let fault = FaultCode::from_u8(code).expect("defined taxonomy code");
            assert_eq!(fault.as_u8(), code);
        }
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert!(FaultCode::from_u8(0x00).is_none());
        assert!(FaultCode::from_u8(0x05).is_none());
        assert!(FaultCode::from_u8(0xFF).is_none());
    }

    #[test]
    fn only_memory_faults_are_fatal() {
        assert!(FaultCode::AddressOutOfRange.is_fatal());
        assert!(FaultCode::UnterminatedString.is_fatal());
        assert!(!FaultCode::UnimplementedOperation.is_fatal());
        assert!(!FaultCode::UnimplementedService.is_fatal());
    }

    #[test]
    fn class_mapping_matches_fault_taxonomy() {
        assert_eq!(FaultCode::AddressOutOfRange.class(), FaultClass::Memory);
        assert_eq!(FaultCode::UnterminatedString.class(), FaultClass::Memory);
        assert_eq!(FaultCode::UnimplementedOperation.class(), FaultClass::Decode);
        assert_eq!(FaultCode::UnimplementedService.class(), FaultClass::Service);
    }

    #[test]
    fn sim_error_names_the_offending_instruction_address() {
        let error = SimError::Fault {
            cause: FaultCode::AddressOutOfRange,
            pc: 0x01A4,
        };
        let text = error.to_string();
        assert!(text.contains("0x01A4"), "{text}");
        assert!(text.contains("outside the 64 KiB"), "{text}");
    }
}
