//! Architectural CPU state model primitives.

/// Register file types and storage model.
pub mod registers;
/// Fetch-loop run state.
pub mod run_state;

pub use registers::{ArchitecturalState, Register, ABI_NAMES, GENERAL_REGISTER_COUNT};
pub use run_state::{HaltReason, RunState};
