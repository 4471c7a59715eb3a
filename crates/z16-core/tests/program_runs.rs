//! Whole-program runs through the public `run` entry point.

use log as _;
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use tempfile as _;
use thiserror as _;

use z16_core::{
    run, CoreConfig, CoreState, FaultCode, HaltReason, Register, RunOutcome, RunState, SimError,
    TraceEvent, UnimplementedPolicy,
};

fn image(words: &[u16]) -> Vec<u8> {
    words.iter().flat_map(|word| word.to_le_bytes()).collect()
}

fn instruction_texts(events: &[TraceEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|event| match event {
            TraceEvent::InstructionStart { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

fn run_default(
    state: &mut CoreState,
) -> (Result<RunOutcome, SimError>, Vec<u8>, Vec<TraceEvent>) {
    let mut console: Vec<u8> = Vec::new();
    let mut events: Vec<TraceEvent> = Vec::new();
    let result = run(state, &mut console, &mut events, &CoreConfig::default());
    (result, console, events)
}

fn hello_program() -> CoreState {
    // li a0, 8 / ecall 5 / ecall 3 / pad, then "hi\0" at address 8
    let mut bytes = image(&[0x11B9, 0x0147, 0x00C7, 0x0000]);
    bytes.extend_from_slice(b"hi\0");
    CoreState::with_image(&bytes)
}

#[test]
fn hello_prints_string_and_terminates() {
    let mut state = hello_program();

    let (result, console, events) = run_default(&mut state);

    assert_eq!(
        result,
        Ok(RunOutcome {
            steps: 3,
            reason: HaltReason::Terminated
        })
    );
    assert_eq!(console, b"hi");
    assert_eq!(
        instruction_texts(&events),
        ["li a0, 8", "ecall 5", "ecall 3"]
    );
    assert_eq!(state.arch.pc(), 4);
    assert_eq!(state.run_state, RunState::Halted(HaltReason::Terminated));
}

#[test]
fn print_int_renders_signed_decimal() {
    // li a0, -7 / ecall 1 / ecall 3
    let mut state = CoreState::with_image(&image(&[0xF3B9, 0x0047, 0x00C7]));

    let (result, console, _) = run_default(&mut state);

    assert_eq!(result.map(|outcome| outcome.reason), Ok(HaltReason::Terminated));
    assert_eq!(console, b"-7");
    assert_eq!(state.arch.gpr(Register::A0), 0xFFF9);
}

#[test]
fn countdown_loop_branches_backwards_until_zero() {
    let mut state = CoreState::with_image(&image(&[
        0x0639, // li t0, 3
        0xFE01, // addi t0, -1
        0xF01A, // bnz t0, -2
        0xA1B8, // mv a0, t0
        0x0047, // ecall 1
        0x00C7, // ecall 3
    ]));

    let (result, console, events) = run_default(&mut state);

    assert_eq!(
        result,
        Ok(RunOutcome {
            steps: 10,
            reason: HaltReason::Terminated
        })
    );
    assert_eq!(console, b"0");
    assert_eq!(
        instruction_texts(&events)[..5],
        ["li t0, 3", "addi t0, -1", "bnz t0, -2", "addi t0, -1", "bnz t0, -2"]
    );
}

#[test]
fn trace_orders_memory_writes_after_their_instruction() {
    let mut state = CoreState::with_image(&image(&[
        0x0A39, // li t0, 5
        0x40B9, // li sp, 32
        0x0403, // sb t0, 0(sp)
        0x00C7, // ecall 3
    ]));

    let (result, _, events) = run_default(&mut state);

    assert!(result.is_ok());
    assert_eq!(
        events,
        [
            TraceEvent::InstructionStart {
                pc: 0,
                raw_word: 0x0A39,
                text: "li t0, 5".to_owned()
            },
            TraceEvent::InstructionStart {
                pc: 2,
                raw_word: 0x40B9,
                text: "li sp, 32".to_owned()
            },
            TraceEvent::InstructionStart {
                pc: 4,
                raw_word: 0x0403,
                text: "sb t0, 0(sp)".to_owned()
            },
            TraceEvent::MemoryWrite {
                addr: 0x0020,
                value: 5,
                width: 1
            },
            TraceEvent::InstructionStart {
                pc: 6,
                raw_word: 0x00C7,
                text: "ecall 3".to_owned()
            },
        ]
    );
    assert_eq!(state.memory[0x0020], 5);
}

#[test]
fn unterminated_string_faults_at_the_ecall() {
    // li a0, -1 / ecall 5 with a non-NUL last byte
    let mut state = CoreState::with_image(&image(&[0xFFB9, 0x0147]));
    state.memory[0xFFFF] = b'x';

    let (result, console, events) = run_default(&mut state);

    assert_eq!(
        result,
        Err(SimError::Fault {
            cause: FaultCode::UnterminatedString,
            pc: 2
        })
    );
    assert!(console.is_empty());
    assert_eq!(
        events.last(),
        Some(&TraceEvent::FaultRaised {
            cause: FaultCode::UnterminatedString,
            pc: 2
        })
    );
    assert_eq!(state.arch.pc(), 2);
    assert_eq!(state.diag.last_fault_pc, 2);
}

#[test]
fn zero_filled_memory_runs_to_the_end_of_the_address_space() {
    // 0x0000 decodes as `add t0, t0`
    let mut state = CoreState::default();

    let (result, _, events) = run_default(&mut state);

    assert_eq!(
        result,
        Ok(RunOutcome {
            steps: 0x8000,
            reason: HaltReason::AddressSpaceExhausted
        })
    );
    assert_eq!(state.arch.pc(), 0xFFFE);
    assert_eq!(events.len(), 0x8000);
    assert_eq!(state.diag.retired_count, 0x8000);
}

#[test]
fn unimplemented_words_are_skipped_and_counted() {
    // unknown r-type / ecall 7 / ecall 3
    let mut state = CoreState::with_image(&image(&[0xD000, (7 << 6) | 7, 0x00C7]));

    let (result, _, events) = run_default(&mut state);

    assert_eq!(
        result,
        Ok(RunOutcome {
            steps: 3,
            reason: HaltReason::Terminated
        })
    );
    assert_eq!(state.diag.unimplemented_op_count, 1);
    assert_eq!(state.diag.unimplemented_service_count, 1);
    assert_eq!(state.diag.last_unimplemented_pc, Some(2));
    assert_eq!(state.diag.retired_count, 1);
    assert!(events.contains(&TraceEvent::UnimplementedSkipped {
        pc: 0,
        raw_word: 0xD000,
        cause: FaultCode::UnimplementedOperation
    }));
    assert_eq!(
        instruction_texts(&events),
        ["unknown r-type 0xD000", "ecall 7 ; unknown service", "ecall 3"]
    );
}

#[test]
fn halt_policy_turns_unimplemented_into_an_error() {
    let mut state = CoreState::with_image(&image(&[0xD000, 0x00C7]));
    let config = CoreConfig {
        unimplemented_policy: UnimplementedPolicy::Halt,
    };

    let mut events: Vec<TraceEvent> = Vec::new();
    let result = run(&mut state, &mut Vec::<u8>::new(), &mut events, &config);

    assert_eq!(
        result,
        Err(SimError::Fault {
            cause: FaultCode::UnimplementedOperation,
            pc: 0
        })
    );
    assert_eq!(
        state.run_state,
        RunState::FaultLatched(FaultCode::UnimplementedOperation)
    );
}

#[test]
fn rerun_after_halt_reports_zero_new_steps() {
    let mut state = hello_program();
    let (first, _, _) = run_default(&mut state);
    let (second, console, events) = run_default(&mut state);

    assert_eq!(first.map(|outcome| outcome.steps), Ok(3));
    assert_eq!(
        second,
        Ok(RunOutcome {
            steps: 0,
            reason: HaltReason::Terminated
        })
    );
    assert!(console.is_empty());
    assert!(events.is_empty());
}

#[test]
fn canonical_reset_replays_the_same_program() {
    let mut state = hello_program();
    let (first, first_console, first_events) = run_default(&mut state);

    state.reset_canonical();
    let (second, second_console, second_events) = run_default(&mut state);

    assert_eq!(first, second);
    assert_eq!(first_console, second_console);
    assert_eq!(first_events, second_events);
}
