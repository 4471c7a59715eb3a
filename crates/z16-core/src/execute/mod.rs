//! Instruction execution pipeline for the Z16 ISA.
//!
//! Each instruction runs in two phases:
//! 1. Read source operands and compute every effect into an [`ExecuteState`]
//! 2. Commit: memory write, destination register, console output, `PC`
//!
//! A fault in phase 1 leaves the core untouched, so faults are precise.

#![allow(clippy::similar_names)]

mod alu;
mod helpers;

pub use alu::{alu, branch_taken};
pub use helpers::{as_signed, as_word, link_address, load_byte, load_word};

use crate::decoder::{DecodedInstruction, Instruction};
use crate::disasm::disassemble;
use crate::encoding::{Operation, Service};
use crate::memory::{
    fetch_in_bounds, read_c_string, read_u16_le, resolve_data_address, write_u16_le, write_u8,
};
use crate::{
    Console, CoreConfig, CoreState, Decoder, FaultCode, HaltReason, Register, RunOutcome,
    RunState, SimError, StepOutcome, TraceEvent, TraceSink, UnimplementedPolicy,
};

/// Outcome of executing a single instruction, before commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteOutcome {
    /// Effects computed; commit them.
    Retired,
    /// `ecall 3`: commit, then stop without advancing `PC`.
    Terminated,
    /// No defined operation for this word.
    Unimplemented {
        /// Which unimplemented kind.
        cause: FaultCode,
    },
    /// Execution faulted; nothing may be committed.
    Fault {
        /// Fault code.
        cause: FaultCode,
    },
}

/// A store waiting for commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingWrite {
    /// First byte address.
    pub addr: u16,
    /// Value to store; only the low byte for width 1.
    pub value: u16,
    /// 1 or 2 bytes.
    pub width: u8,
}

/// Side effects accumulated while executing one instruction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecuteState {
    /// Destination register for result.
    pub dest_reg: Option<Register>,
    /// Value to write to destination register.
    pub dest_value: Option<u16>,
    /// Store to apply.
    pub memory_write: Option<PendingWrite>,
    /// Control-flow target; `None` means the default `PC + 2` advance.
    pub next_pc: Option<u16>,
    /// Bytes to hand to the console.
    pub console_output: Option<Vec<u8>>,
    /// Stop after commit without advancing `PC`.
    pub halt: bool,
}

impl ExecuteState {
    const fn write_register(&mut self, reg: Register, value: u16) {
        self.dest_reg = Some(reg);
        self.dest_value = Some(value);
    }
}

/// Executes a decoded instruction against `state` without mutating it.
///
/// Returns both the execution outcome and the effects to commit. On fault
/// the effects must be discarded.
#[must_use]
pub fn execute_instruction(
    instr: &DecodedInstruction,
    state: &CoreState,
) -> (ExecuteOutcome, ExecuteState) {
    let mut exec = ExecuteState::default();

    let Some(operation) = instr.operation else {
        let cause = instr
            .unimplemented_cause()
            .unwrap_or(FaultCode::UnimplementedOperation);
        return (ExecuteOutcome::Unimplemented { cause }, exec);
    };
    if operation.format() != instr.instruction.format() {
        log::error!(
            "{} does not belong to the {} format of word 0x{:04X}",
            operation.mnemonic(),
            instr.instruction.format().name(),
            instr.raw
        );
        let cause = FaultCode::UnimplementedOperation;
        return (ExecuteOutcome::Unimplemented { cause }, exec);
    }
    let imm = instr.immediate().map_or(0, |value| value.as_word());
    let pc = state.arch.pc();

    let result = match instr.instruction {
        Instruction::RegReg { rs2, rd_rs1, .. } => {
            execute_reg_reg(operation, rs2, rd_rs1, state, &mut exec);
            Ok(())
        }
        Instruction::Imm { rd_rs1, .. } => {
            execute_imm(operation, rd_rs1, imm, state, &mut exec);
            Ok(())
        }
        Instruction::Branch { rs2, rs1, .. } => {
            execute_branch(operation, rs1, rs2, imm, state, &mut exec);
            Ok(())
        }
        Instruction::Store { base, src, .. } => {
            execute_store(operation, base, src, imm, state, &mut exec)
        }
        Instruction::Load { base, rd, .. } => {
            execute_load(operation, base, rd, imm, state, &mut exec)
        }
        Instruction::Jump { rd, .. } => {
            if operation == Operation::Jal {
                exec.write_register(rd, link_address(pc));
            }
            exec.next_pc = Some(pc.wrapping_add(imm));
            Ok(())
        }
        Instruction::Upper { rd, .. } => {
            let value = if operation == Operation::Auipc {
                pc.wrapping_add(imm)
            } else {
                imm
            };
            exec.write_register(rd, value);
            Ok(())
        }
        Instruction::System { .. } => match operation {
            Operation::Ecall(service) => execute_service(service, state, &mut exec),
            _ => Err(FaultCode::UnimplementedOperation),
        },
    };

    match result {
        Err(cause) => (ExecuteOutcome::Fault { cause }, ExecuteState::default()),
        Ok(()) if exec.halt => (ExecuteOutcome::Terminated, exec),
        Ok(()) => (ExecuteOutcome::Retired, exec),
    }
}

fn execute_reg_reg(
    operation: Operation,
    rs2: Register,
    rd_rs1: Register,
    state: &CoreState,
    exec: &mut ExecuteState,
) {
    let lhs = state.arch.gpr(rd_rs1);
    let rhs = state.arch.gpr(rs2);

    match operation {
        Operation::Jr => exec.next_pc = Some(lhs),
        Operation::Jalr => {
            exec.write_register(rd_rs1, link_address(state.arch.pc()));
            exec.next_pc = Some(rhs);
        }
        _ => {
            if let Some(value) = alu(operation, lhs, rhs) {
                exec.write_register(rd_rs1, value);
            }
        }
    }
}

fn execute_imm(
    operation: Operation,
    rd_rs1: Register,
    imm: u16,
    state: &CoreState,
    exec: &mut ExecuteState,
) {
    if let Some(value) = alu(operation, state.arch.gpr(rd_rs1), imm) {
        exec.write_register(rd_rs1, value);
    }
}

fn execute_branch(
    operation: Operation,
    rs1: Register,
    rs2: Register,
    displacement: u16,
    state: &CoreState,
    exec: &mut ExecuteState,
) {
    let taken = branch_taken(operation, state.arch.gpr(rs1), state.arch.gpr(rs2));
    if taken == Some(true) {
        exec.next_pc = Some(state.arch.pc().wrapping_add(displacement));
    }
}

fn execute_store(
    operation: Operation,
    base: Register,
    src: Register,
    offset: u16,
    state: &CoreState,
    exec: &mut ExecuteState,
) -> Result<(), FaultCode> {
    let width = helpers::access_width(operation == Operation::Sw);
    let addr = resolve_data_address(state.arch.gpr(base), as_signed(offset), width)?;
    let value = state.arch.gpr(src);
    exec.memory_write = Some(PendingWrite {
        addr,
        value: if width == 1 { value & 0x00FF } else { value },
        width,
    });
    Ok(())
}

fn execute_load(
    operation: Operation,
    base: Register,
    rd: Register,
    offset: u16,
    state: &CoreState,
    exec: &mut ExecuteState,
) -> Result<(), FaultCode> {
    let base = state.arch.gpr(base);
    let offset = as_signed(offset);
    let value = match operation {
        Operation::Lb => load_byte(&state.memory, base, offset, true)?,
        Operation::Lbu => load_byte(&state.memory, base, offset, false)?,
        _ => load_word(&state.memory, base, offset)?,
    };
    exec.write_register(rd, value);
    Ok(())
}

fn execute_service(
    service: Service,
    state: &CoreState,
    exec: &mut ExecuteState,
) -> Result<(), FaultCode> {
    let a0 = state.arch.gpr(Register::A0);
    match service {
        Service::PrintInt => {
            exec.console_output = Some(as_signed(a0).to_string().into_bytes());
        }
        Service::PrintString => {
            exec.console_output = Some(read_c_string(&state.memory, a0)?.to_vec());
        }
        Service::Exit => exec.halt = true,
    }
    Ok(())
}

/// Applies committed side effects to the core state.
///
/// Returns the halt reason when the core stops as a result of this
/// instruction: either `ecall 3`, or a sequential advance past `0xFFFE`.
/// Only call this for [`ExecuteOutcome::Retired`] or
/// [`ExecuteOutcome::Terminated`].
///
/// # Errors
///
/// Returns [`FaultCode::AddressOutOfRange`] when the pending store does not
/// fit in memory. Nothing is committed in that case.
pub fn commit_execution(
    state: &mut CoreState,
    exec: ExecuteState,
    console: &mut dyn Console,
    trace: &mut dyn TraceSink,
) -> Result<Option<HaltReason>, FaultCode> {
    if let Some(write) = exec.memory_write {
        if write.width == 1 {
            let [low, _] = write.value.to_le_bytes();
            write_u8(&mut state.memory, write.addr, low)?;
        } else {
            write_u16_le(&mut state.memory, write.addr, write.value)?;
        }
        trace.on_event(TraceEvent::MemoryWrite {
            addr: write.addr,
            value: write.value,
            width: write.width,
        });
    }

    if let (Some(reg), Some(value)) = (exec.dest_reg, exec.dest_value) {
        state.arch.set_gpr(reg, value);
    }

    if let Some(bytes) = exec.console_output {
        console.write(&bytes);
    }

    state.diag.record_retired();

    if exec.halt {
        return Ok(Some(HaltReason::Terminated));
    }
    match exec.next_pc {
        Some(target) => {
            state.arch.set_pc(target);
            Ok(None)
        }
        None => Ok(advance_pc(state)),
    }
}

/// Moves `PC` to the next sequential instruction.
///
/// Returns [`HaltReason::AddressSpaceExhausted`] and leaves `PC` unchanged
/// when there is no next address.
const fn advance_pc(state: &mut CoreState) -> Option<HaltReason> {
    match state.arch.pc().checked_add(2) {
        Some(next) => {
            state.arch.set_pc(next);
            None
        }
        None => Some(HaltReason::AddressSpaceExhausted),
    }
}

/// Executes exactly one fetch-decode-execute step.
///
/// Halted and fault-latched cores do not fetch; they report their terminal
/// state again.
pub fn step_one(
    state: &mut CoreState,
    console: &mut dyn Console,
    trace: &mut dyn TraceSink,
    config: &CoreConfig,
) -> StepOutcome {
    match state.run_state {
        RunState::Halted(reason) => return StepOutcome::Halted(reason),
        RunState::FaultLatched(cause) => {
            return StepOutcome::Fault {
                cause,
                pc: state.diag.last_fault_pc,
            };
        }
        RunState::Running => {}
    }

    let pc = state.arch.pc();
    let Some(raw_word) = fetch(pc, &state.memory) else {
        return halt(state, HaltReason::AddressSpaceExhausted);
    };

    let instruction = Decoder::decode(raw_word);
    let text = disassemble(&instruction);
    log::debug!("0x{pc:04X}: {text}");
    trace.on_event(TraceEvent::InstructionStart { pc, raw_word, text });

    let (outcome, exec_state) = execute_instruction(&instruction, state);

    match outcome {
        ExecuteOutcome::Retired | ExecuteOutcome::Terminated => {
            match commit_execution(state, exec_state, console, trace) {
                Ok(Some(reason)) => halt(state, reason),
                Ok(None) => StepOutcome::Retired,
                Err(cause) => latch_fault(state, trace, cause, pc),
            }
        }
        ExecuteOutcome::Unimplemented { cause } | ExecuteOutcome::Fault { cause } => {
            let skip = !cause.is_fatal()
                && config.unimplemented_policy == UnimplementedPolicy::SkipAndContinue;
            if !skip {
                return latch_fault(state, trace, cause, pc);
            }
            log::warn!("skipping {cause} at 0x{pc:04X} (word 0x{raw_word:04X})");
            state.diag.record_unimplemented(cause, pc);
            trace.on_event(TraceEvent::UnimplementedSkipped {
                pc,
                raw_word,
                cause,
            });
            match advance_pc(state) {
                Some(reason) => halt(state, reason),
                None => StepOutcome::UnimplementedSkipped { cause },
            }
        }
    }
}

/// Runs until the core halts or faults.
///
/// # Errors
///
/// Returns [`SimError::Fault`] naming the faulting instruction when a fault
/// latches, including a fault latched by an earlier call.
pub fn run(
    state: &mut CoreState,
    console: &mut dyn Console,
    trace: &mut dyn TraceSink,
    config: &CoreConfig,
) -> Result<RunOutcome, SimError> {
    let executed_before = executed_count(state);

    loop {
        match step_one(state, console, trace, config) {
            StepOutcome::Retired | StepOutcome::UnimplementedSkipped { .. } => {}
            StepOutcome::Halted(reason) => {
                return Ok(RunOutcome {
                    steps: executed_count(state).saturating_sub(executed_before),
                    reason,
                });
            }
            StepOutcome::Fault { cause, pc } => return Err(SimError::Fault { cause, pc }),
        }
    }
}

const fn executed_count(state: &CoreState) -> u64 {
    state
        .diag
        .retired_count
        .saturating_add(state.diag.warning_count())
}

fn fetch(pc: u16, memory: &[u8]) -> Option<u16> {
    if fetch_in_bounds(pc) {
        read_u16_le(memory, pc)
    } else {
        None
    }
}

fn halt(state: &mut CoreState, reason: HaltReason) -> StepOutcome {
    if reason == HaltReason::AddressSpaceExhausted {
        log::info!("PC 0x{:04X} reached the end of memory", state.arch.pc());
    }
    state.run_state = RunState::Halted(reason);
    StepOutcome::Halted(reason)
}

fn latch_fault(
    state: &mut CoreState,
    trace: &mut dyn TraceSink,
    cause: FaultCode,
    pc: u16,
) -> StepOutcome {
    log::error!("{cause} at 0x{pc:04X}");
    state.run_state = RunState::FaultLatched(cause);
    state.diag.record_fault(cause, pc);
    trace.on_event(TraceEvent::FaultRaised { cause, pc });
    StepOutcome::Fault { cause, pc }
}
