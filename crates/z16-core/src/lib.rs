//! Core instruction-set simulator for the Z16 16-bit architecture.

/// Flat 64 KiB memory model.
pub mod memory;
pub use memory::{
    fetch_in_bounds, new_address_space, read_c_string, read_u16_le, resolve_data_address,
    write_u16_le, write_u8, BYTE_ACCESS_BYTES, MEMORY_BYTES, WORD_ACCESS_BYTES,
};

/// Run diagnostics counters.
pub mod diag;
pub use diag::DiagCounters;

/// Public host-facing API contract and integration types.
pub mod api;
pub use api::{
    Console, CoreConfig, CoreState, NullTrace, RunOutcome, StepOutcome, TraceEvent, TraceSink,
    UnimplementedPolicy,
};

/// Architectural CPU state model primitives.
pub mod state;
pub use state::{
    ArchitecturalState, HaltReason, Register, RunState, ABI_NAMES, GENERAL_REGISTER_COUNT,
};

/// Instruction formats, field layouts and function-code tables.
pub mod encoding;
pub use encoding::{BitField, InstructionFormat, Operation, Service};

/// Total instruction decoder.
pub mod decoder;
pub use decoder::{DecodedInstruction, Decoder, Immediate, Instruction};

/// Assembly text rendering and memory listings.
pub mod disasm;
pub use disasm::{disassemble, disassemble_at, disassemble_range, DisassemblyRow};

/// Simulator fault taxonomy.
pub mod fault;
pub use fault::{FaultClass, FaultCode, SimError};

/// Binary image loading.
pub mod image;
pub use image::{load_image_file, LoadError};

/// Instruction execution pipeline.
pub mod execute;
pub use execute::{
    commit_execution, execute_instruction, run, step_one, ExecuteOutcome, ExecuteState,
    PendingWrite,
};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
