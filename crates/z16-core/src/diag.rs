//! Run diagnostics counters.

use crate::{FaultClass, FaultCode};

/// Saturating counters describing one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DiagCounters {
    /// Instructions whose effects were committed.
    pub retired_count: u64,
    /// Instructions skipped because their function codes are undefined.
    pub unimplemented_op_count: u64,
    /// `ecall`s skipped because their service number is undefined.
    pub unimplemented_service_count: u64,
    /// Address of the most recent skipped instruction.
    pub last_unimplemented_pc: Option<u16>,
    /// The last fault code that stopped the run, if any.
    pub last_fault_code: Option<FaultCode>,
    /// Address of the instruction that raised `last_fault_code`.
    pub last_fault_pc: u16,
}

impl DiagCounters {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one retired instruction.
    pub const fn record_retired(&mut self) {
        self.retired_count = self.retired_count.saturating_add(1);
    }

    /// Counts one skipped unimplemented instruction at `pc`.
    pub const fn record_unimplemented(&mut self, cause: FaultCode, pc: u16) {
        match cause.class() {
            FaultClass::Service => {
                self.unimplemented_service_count =
                    self.unimplemented_service_count.saturating_add(1);
            }
            FaultClass::Decode | FaultClass::Memory => {
                self.unimplemented_op_count = self.unimplemented_op_count.saturating_add(1);
            }
        }
        self.last_unimplemented_pc = Some(pc);
    }

    /// Records the fault that latched the core.
    pub const fn record_fault(&mut self, cause: FaultCode, pc: u16) {
        self.last_fault_code = Some(cause);
        self.last_fault_pc = pc;
    }

    /// Total recoverable warnings raised during the run.
    #[must_use]
    pub const fn warning_count(&self) -> u64 {
        self.unimplemented_op_count
            .saturating_add(self.unimplemented_service_count)
    }
}

#[cfg(test)]
mod tests {
    use super::DiagCounters;
    use crate::FaultCode;

    #[test]
    fn unimplemented_kinds_are_counted_separately() {
        let mut diag = DiagCounters::new();
        diag.record_unimplemented(FaultCode::UnimplementedOperation, 0x0010);
        diag.record_unimplemented(FaultCode::UnimplementedService, 0x0020);
        diag.record_unimplemented(FaultCode::UnimplementedService, 0x0030);

        assert_eq!(diag.unimplemented_op_count, 1);
        assert_eq!(diag.unimplemented_service_count, 2);
        assert_eq!(diag.warning_count(), 3);
        assert_eq!(diag.last_unimplemented_pc, Some(0x0030));
    }

    #[test]
    fn counters_saturate() {
        let mut diag = DiagCounters {
            retired_count: u64::MAX,
            unimplemented_op_count: u64::MAX,
            unimplemented_service_count: 1,
            ..DiagCounters::default()
        };
        diag.record_retired();
        diag.record_unimplemented(FaultCode::UnimplementedOperation, 0);

        assert_eq!(diag.retired_count, u64::MAX);
        assert_eq!(diag.unimplemented_op_count, u64::MAX);
        assert_eq!(diag.warning_count(), u64::MAX);
    }

    #[test]
    fn record_fault_keeps_latest() {
        let mut diag = DiagCounters::new();
        diag.record_fault(FaultCode::AddressOutOfRange, 0x0100);
        diag.record_fault(FaultCode::UnterminatedString, 0x0200);
        assert_eq!(diag.last_fault_code, Some(FaultCode::UnterminatedString));
        assert_eq!(diag.last_fault_pc, 0x0200);
    }
}
