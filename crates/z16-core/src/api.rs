//! Public host-facing API contracts for embedding the simulator core.
//!
//! The core never performs I/O itself: instruction text goes to a
//! [`TraceSink`] and `ecall` output goes to a [`Console`].

use crate::memory::new_address_space;
use crate::{ArchitecturalState, DiagCounters, FaultCode, HaltReason, RunState};

/// What the core does when an instruction has no defined operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum UnimplementedPolicy {
    /// Log a warning, count it and advance `PC` by 2.
    #[default]
    SkipAndContinue,
    /// Latch the fault and stop the run.
    Halt,
}

/// Top-level immutable configuration for a core instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreConfig {
    /// Applies to undefined function codes and undefined services alike.
    pub unimplemented_policy: UnimplementedPolicy,
}

/// Complete host-visible state of one simulation instance.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreState {
    /// Register file and `PC`.
    pub arch: ArchitecturalState,
    /// Flat 64 KiB memory image.
    pub memory: Box<[u8]>,
    /// Current execution state.
    pub run_state: RunState,
    /// Run diagnostics.
    pub diag: DiagCounters,
}

impl Default for CoreState {
    fn default() -> Self {
        Self {
            arch: ArchitecturalState::default(),
            memory: new_address_space(),
            run_state: RunState::Running,
            diag: DiagCounters::default(),
        }
    }
}

impl CoreState {
    /// Creates a zeroed core with `image` loaded at address 0.
    #[must_use]
    pub fn with_image(image: &[u8]) -> Self {
        let mut state = Self::default();
        state.load_image_bytes(image);
        state
    }

    /// Copies `image` into memory starting at address 0.
    ///
    /// Bytes beyond the end of memory are ignored. Returns the number of
    /// bytes copied.
    pub fn load_image_bytes(&mut self, image: &[u8]) -> usize {
        let len = image.len().min(self.memory.len());
        self.memory[..len].copy_from_slice(&image[..len]);
        len
    }

    /// Applies canonical reset semantics.
    ///
    /// Registers and `PC` return to zero, diagnostics and run state are
    /// cleared. Memory is preserved so the same image can run again.
    pub fn reset_canonical(&mut self) {
        self.arch = ArchitecturalState::default();
        self.run_state = RunState::Running;
        self.diag = DiagCounters::default();
    }
}

/// Output status from one fetch-execute step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// Instruction effects were committed.
    Retired,
    /// The core is halted, either by this step or earlier.
    Halted(HaltReason),
    /// Instruction had no defined operation and was skipped.
    UnimplementedSkipped {
        /// Which unimplemented kind was skipped.
        cause: FaultCode,
    },
    /// A fault latched the core.
    Fault {
        /// Canonical fault code.
        cause: FaultCode,
        /// Address of the faulting instruction.
        pc: u16,
    },
}

/// Result of running a core until it halts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunOutcome {
    /// Number of steps executed during this run call.
    pub steps: u64,
    /// Why the run stopped.
    pub reason: HaltReason,
}

/// Trace events emitted in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TraceEvent {
    /// Emitted after fetch and decode, before execution.
    InstructionStart {
        /// Fetch address.
        pc: u16,
        /// Raw instruction word.
        raw_word: u16,
        /// Disassembly of `raw_word`.
        text: String,
    },
    /// A committed store.
    MemoryWrite {
        /// First byte written.
        addr: u16,
        /// Value stored (low byte only for `sb`).
        value: u16,
        /// Bytes written, 1 or 2.
        width: u8,
    },
    /// An unimplemented instruction was skipped.
    UnimplementedSkipped {
        /// Address of the skipped instruction.
        pc: u16,
        /// Raw instruction word.
        raw_word: u16,
        /// Which unimplemented kind was skipped.
        cause: FaultCode,
    },
    /// A fault latched the core.
    FaultRaised {
        /// Canonical fault code.
        cause: FaultCode,
        /// Address of the faulting instruction.
        pc: u16,
    },
}

/// Sink trait for trace hooks.
pub trait TraceSink {
    /// Records an event in execution order.
    fn on_event(&mut self, event: TraceEvent);
}

impl TraceSink for Vec<TraceEvent> {
    fn on_event(&mut self, event: TraceEvent) {
        self.push(event);
    }
}

/// Trace sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTrace;

impl TraceSink for NullTrace {
    fn on_event(&mut self, _event: TraceEvent) {}
}

/// Output channel for `ecall 1` and `ecall 5`.
pub trait Console {
    /// Writes one service call's output.
    fn write(&mut self, bytes: &[u8]);
}

impl Console for Vec<u8> {
    fn write(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}
