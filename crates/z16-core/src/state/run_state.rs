use crate::FaultCode;

/// Why the fetch-execute loop stopped normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum HaltReason {
    /// The program executed `ecall 3`.
    Terminated,
    /// The `PC` ran off the end of memory.
    AddressSpaceExhausted,
}

/// Execution-state machine for host-observable core control flow.
///
/// `Halted` and `FaultLatched` are terminal until
/// [`CoreState::reset_canonical`](crate::CoreState::reset_canonical).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// Ready to execute the next instruction.
    #[default]
    Running,
    /// Stopped normally.
    Halted(HaltReason),
    /// Stopped on a fault; no further progress is possible.
    FaultLatched(FaultCode),
}

impl RunState {
    /// Returns the currently latched fault, if this state is fault-latched.
    #[must_use]
    pub const fn latched_fault(self) -> Option<FaultCode> {
        match self {
            Self::FaultLatched(cause) => Some(cause),
            Self::Running | Self::Halted(_) => None,
        }
    }

    /// Returns the halt reason, if the core halted normally.
    #[must_use]
    pub const fn halt_reason(self) -> Option<HaltReason> {
        match self {
            Self::Halted(reason) => Some(reason),
            Self::Running | Self::FaultLatched(_) => None,
        }
    }

    /// Returns `true` when no further instructions will execute.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::{HaltReason, RunState};
    use crate::FaultCode;

    #[test]
    fn run_state_default_is_running() {
        assert_eq!(RunState::default(), RunState::Running);
        assert!(!RunState::default().is_terminal());
    }

    #[test]
    fn accessors_report_only_their_variant() {
        let halted = RunState::Halted(HaltReason::Terminated);
        let latched = RunState::FaultLatched(FaultCode::AddressOutOfRange);

        assert_eq!(RunState::Running.latched_fault(), None);
        assert_eq!(halted.latched_fault(), None);
        assert_eq!(latched.latched_fault(), Some(FaultCode::AddressOutOfRange));

        assert_eq!(halted.halt_reason(), Some(HaltReason::Terminated));
        assert_eq!(latched.halt_reason(), None);

        assert!(halted.is_terminal());
        assert!(latched.is_terminal());
    }
}
