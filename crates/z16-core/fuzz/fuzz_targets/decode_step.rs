#![no_main]

use libfuzzer_sys::fuzz_target;
use z16_core::{
    disassemble, disassemble_range, resolve_data_address, step_one, CoreConfig, CoreState,
    Decoder, NullTrace, Register, UnimplementedPolicy,
};

fuzz_target!(|data: &[u8]| {
    if data.len() < 6 {
        return;
    }

    let word = u16::from_le_bytes([data[0], data[1]]);
    let base = u16::from_le_bytes([data[2], data[3]]);
    let pc = u16::from_le_bytes([data[4], data[5]]) & !1;

    let decoded = Decoder::decode(word);
    let _ = disassemble(&decoded);
    assert_eq!(decoded.instruction.encode(), word);

    let mut state = CoreState::with_image(&data[6..]);
    state.arch.set_pc(pc);
    let at = usize::from(pc);
    state.memory[at..at + 2].copy_from_slice(&word.to_le_bytes());
    state.arch.set_gpr(Register::Sp, base);
    state.arch.set_gpr(Register::A0, base);

    let policy = if data[0] & 0x80 == 0 {
        UnimplementedPolicy::SkipAndContinue
    } else {
        UnimplementedPolicy::Halt
    };
    let config = CoreConfig {
        unimplemented_policy: policy,
    };
    let mut console: Vec<u8> = Vec::new();
    for _ in 0..64 {
        let _ = step_one(&mut state, &mut console, &mut NullTrace, &config);
    }

    let _ = disassemble_range(pc, 8, &state.memory);
    let _ = resolve_data_address(base, -8, 2);
});
