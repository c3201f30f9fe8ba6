use super::{run_program, run_test, ExpectedState};
use std::collections::HashMap;

#[test]
fn jump() {
    run_test(
        concat!(
            "C35501", // 0x0150: JP 0x0155
            "0611",   // 0x0153: LD B, 0x11
            "0E22",   // 0x0155: LD C, 0x22
        ),
        &ExpectedState {
            b: Some(0x00),
            c: Some(0x22),
            ..ExpectedState::empty()
        },
    );

    run_test(
        concat!(
            "215601", // 0x0150: LD HL, 0x0156
            "E9",     // 0x0153: JP HL
            "0611",   // 0x0154: LD B, 0x11
            "0E22",   // 0x0156: LD C, 0x22
        ),
        &ExpectedState {
            b: Some(0x00),
            c: Some(0x22),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn jump_conditional() {
    run_test(
        concat!(
            "AF",     // 0x0150: XOR A
            "C25A01", // 0x0151: JP NZ, 0x015A
            "CA5901", // 0x0154: JP Z, 0x0159
            "0611",   // 0x0157: LD B, 0x11
            "0E22",   // 0x0159: LD C, 0x22
        ),
        &ExpectedState {
            b: Some(0x00),
            c: Some(0x22),
            ..ExpectedState::empty()
        },
    );

    run_test(
        concat!(
            "37",     // 0x0150: SCF
            "D25A01", // 0x0151: JP NC, 0x015A
            "DA5901", // 0x0154: JP C, 0x0159
            "0611",   // 0x0157: LD B, 0x11
            "0E22",   // 0x0159: LD C, 0x22
        ),
        &ExpectedState {
            b: Some(0x00),
            c: Some(0x22),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn relative_jump() {
    run_test(
        concat!(
            "1804", // 0x0150: JR 4
            "0E44", // 0x0152: LD C, 0x44
            "1804", // 0x0154: JR 4
            "0633", // 0x0156: LD B, 0x33
            "18F8", // 0x0158: JR -8
        ),
        &ExpectedState {
            b: Some(0x33),
            c: Some(0x44),
            ..ExpectedState::empty()
        },
    );

    run_test(
        concat!(
            "37",   // 0x0150: SCF
            "3002", // 0x0151: JR NC, 2
            "3802", // 0x0153: JR C, 2
            "0611", // 0x0155: LD B, 0x11
            "0E22", // 0x0157: LD C, 0x22
        ),
        &ExpectedState {
            b: Some(0x00),
            c: Some(0x22),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn call_return() {
    run_test(
        concat!(
            "3100D0", // 0x0150: LD SP, 0xD000
            "CD5A01", // 0x0153: CALL 0x015A
            "0655",   // 0x0156: LD B, 0x55
            "1803",   // 0x0158: JR 3
            "0E66",   // 0x015A: LD C, 0x66
            "C9",     // 0x015C: RET
        ),
        &ExpectedState {
            b: Some(0x55),
            c: Some(0x66),
            sp: Some(0xD000),
            memory: hash_map! { 0xCFFF: 0x01, 0xCFFE: 0x56 },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn call_return_conditional() {
    run_test(
        concat!(
            "3100D0", // 0x0150: LD SP, 0xD000
            "AF",     // 0x0153: XOR A
            "C45D01", // 0x0154: CALL NZ, 0x015D
            "CC5D01", // 0x0157: CALL Z, 0x015D
            "1805",   // 0x015A: JR 5
            "00",     // 0x015C: NOP
            "C0",     // 0x015D: RET NZ
            "0E77",   // 0x015E: LD C, 0x77
            "C8",     // 0x0160: RET Z
        ),
        &ExpectedState {
            c: Some(0x77),
            sp: Some(0xD000),
            memory: hash_map! { 0xCFFF: 0x01, 0xCFFE: 0x5A },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn restart() {
    for (opcode, vector) in [(0xC7_u8, 0x00_u16), (0xDF, 0x18), (0xEF, 0x28), (0xFF, 0x38)] {
        let result = run_program(&format!("3100D0{opcode:02x}"));

        assert_eq!(vector, result.cpu_registers.pc);
        assert_eq!(0xCFFE, result.cpu_registers.sp);
        assert_eq!(0x0154, result.address_space.read_address_u16(0xCFFE));
    }
}

#[test]
fn return_from_interrupt_handler() {
    let result = run_program(concat!(
        "3100D0", // 0x0150: LD SP, 0xD000
        "CD5801", // 0x0153: CALL 0x0158
        "1801",   // 0x0156: JR 1
        "D9",     // 0x0158: RETI
    ));

    assert!(result.cpu_registers.ime);
    assert_eq!(0xD000, result.cpu_registers.sp);
}
