use super::{run_test, set_in_state, ExpectedState, ALL_REGISTERS};
use std::collections::HashMap;

#[test]
fn test_bit_register() {
    for r in ALL_REGISTERS {
        let ld = 0x06 | (r.to_opcode_bits() << 3);

        for bit in 0..8 {
            let opcode = 0x40 | (bit << 3) | r.to_opcode_bits();
            let n: u8 = rand::random();

            let mut expected_state = ExpectedState::empty();
            set_in_state(&mut expected_state, r, n);
            // H set, N clear, C untouched (set after boot)
            let expected_z_flag = u8::from(n & (1 << bit) == 0);
            expected_state.f = Some(0x30 | (expected_z_flag << 7));

            // LD <R>, <n>; BIT <b>, <R>
            run_test(&format!("{ld:02x}{n:02x}CB{opcode:02x}"), &expected_state);
        }
    }
}

#[test]
fn test_bit_indirect_hl() {
    run_test(
        // XOR A; LD HL, 0xC100; LD (HL), 0x08; BIT 3, (HL)
        "AF2100C13608CB5E",
        &ExpectedState {
            f: Some(0x20),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // XOR A; LD HL, 0xC100; LD (HL), 0x08; BIT 4, (HL)
        "AF2100C13608CB66",
        &ExpectedState {
            f: Some(0xA0),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn reset_set_register() {
    for r in ALL_REGISTERS {
        let ld = 0x06 | (r.to_opcode_bits() << 3);

        for bit in 0..8 {
            let n: u8 = rand::random();

            let res = 0x80 | (bit << 3) | r.to_opcode_bits();
            let mut expected_state = ExpectedState::empty();
            set_in_state(&mut expected_state, r, n & !(1 << bit));
            expected_state.f = Some(0xB0);

            // LD <R>, <n>; RES <b>, <R>
            run_test(&format!("{ld:02x}{n:02x}CB{res:02x}"), &expected_state);

            let set = 0xC0 | (bit << 3) | r.to_opcode_bits();
            let mut expected_state = ExpectedState::empty();
            set_in_state(&mut expected_state, r, n | (1 << bit));
            expected_state.f = Some(0xB0);

            // LD <R>, <n>; SET <b>, <R>
            run_test(&format!("{ld:02x}{n:02x}CB{set:02x}"), &expected_state);
        }
    }
}

#[test]
fn reset_set_indirect_hl() {
    run_test(
        concat!(
            "2100C1", // LD HL, 0xC100
            "36FF",   // LD (HL), 0xFF
            "CBBE",   // RES 7, (HL)
            "CB86",   // RES 0, (HL)
            "2101C1", // LD HL, 0xC101
            "CBE6",   // SET 4, (HL)
            "CBD6",   // SET 2, (HL)
        ),
        &ExpectedState {
            memory: hash_map! { 0xC100: 0x7E, 0xC101: 0x14 },
            ..ExpectedState::empty()
        },
    );
}
