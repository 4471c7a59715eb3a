//! Deterministic run fingerprint used by CI cross-host comparison.

use log as _;
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use tempfile as _;
use thiserror as _;

use z16_core::{run, CoreConfig, CoreState, HaltReason, TraceEvent};

const PROGRAM: [u16; 12] = [
    0x0639, // li t0, 3
    0x40B9, // li sp, 32
    0xFE01, // addi t0, -1
    0x0403, // sb t0, 0(sp)
    0xE01A, // bnz t0, -4
    0xF3B9, // li a0, -7
    0x0047, // ecall 1
    0x19B9, // li a0, 12
    0x0147, // ecall 5
    0xD000, // unknown r-type
    0x00C7, // ecall 3
    0x0000,
];

fn hash_bytes(hash: &mut u64, bytes: &[u8]) {
    for byte in bytes {
        *hash ^= u64::from(*byte);
        *hash = hash.wrapping_mul(0x1000_0000_01B3);
    }
}

fn fingerprint() -> String {
    let mut image: Vec<u8> = PROGRAM.iter().flat_map(|word| word.to_le_bytes()).collect();
    image.resize(0x18, 0);
    image.extend_from_slice(b"ok\0");

    let mut state = CoreState::with_image(&image);
    let mut console: Vec<u8> = Vec::new();
    let mut events: Vec<TraceEvent> = Vec::new();
    let outcome = run(&mut state, &mut console, &mut events, &CoreConfig::default());

    let mut hash = 0xcbf2_9ce4_8422_2325_u64;
    match outcome {
        Ok(done) => {
            hash_bytes(&mut hash, &done.steps.to_le_bytes());
            let tag = match done.reason {
                HaltReason::Terminated => 0x10,
                HaltReason::AddressSpaceExhausted => 0x11,
            };
            hash_bytes(&mut hash, &[tag]);
        }
        Err(error) => hash_bytes(&mut hash, error.to_string().as_bytes()),
    }

    hash_bytes(&mut hash, &console);
    for event in &events {
        if let TraceEvent::InstructionStart { pc, text, .. } = event {
            hash_bytes(&mut hash, &pc.to_le_bytes());
            hash_bytes(&mut hash, text.as_bytes());
        }
    }
    for value in state.arch.gprs() {
        hash_bytes(&mut hash, &value.to_le_bytes());
    }
    hash_bytes(&mut hash, &state.arch.pc().to_le_bytes());
    hash_bytes(&mut hash, &state.diag.warning_count().to_le_bytes());
    hash_bytes(&mut hash, &state.memory);

    format!("{hash:016x}")
}

fn main() {
    println!("{}", fingerprint());
}
