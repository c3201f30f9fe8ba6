use super::{run_test, ExpectedState, ALL_REGISTERS};
use crate::cpu::registers::CpuRegister;
use std::collections::HashMap;

#[test]
fn add_immediate() {
    run_test(
        // LD A, 0x3A; ADD A, 0xC6
        "3E3AC6C6",
        &ExpectedState {
            a: Some(0x00),
            f: Some(0xB0),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD A, 0x12; ADD A, 0x34
        "3E12C634",
        &ExpectedState {
            a: Some(0x46),
            f: Some(0x00),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn add_register() {
    for r in ALL_REGISTERS.into_iter().filter(|&r| r != CpuRegister::A) {
        let load = 0x06 | (r.to_opcode_bits() << 3);
        let add = 0x80 | r.to_opcode_bits();

        // LD A, 0x0F; LD <R>, 0x01; ADD A, <R>
        run_test(
            &format!("3E0F{load:02x}01{add:02x}"),
            &ExpectedState {
                a: Some(0x10),
                f: Some(0x20),
                ..ExpectedState::empty()
            },
        );
    }

    run_test(
        // LD A, 0x80; ADD A, A
        "3E8087",
        &ExpectedState {
            a: Some(0x00),
            f: Some(0x90),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn add_indirect_hl() {
    run_test(
        // LD HL, 0xC000; LD (HL), 0x28; LD A, 0x19; ADD A, (HL)
        "2100C036283E1986",
        &ExpectedState {
            a: Some(0x41),
            f: Some(0x20),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn add_with_carry() {
    run_test(
        // SCF; LD A, 0xE1; ADC A, 0x0F
        "373EE1CE0F",
        &ExpectedState {
            a: Some(0xF1),
            f: Some(0x20),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // SCF; LD A, 0xFF; LD B, 0x00; ADC A, B
        "373EFF060088",
        &ExpectedState {
            a: Some(0x00),
            f: Some(0xB0),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // XOR A; LD A, 0xE1; ADC A, 0x1E
        "AF3EE1CE1E",
        &ExpectedState {
            a: Some(0xFF),
            f: Some(0x00),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn subtract() {
    run_test(
        // LD A, 0x3E; SUB 0x3E
        "3E3ED63E",
        &ExpectedState {
            a: Some(0x00),
            f: Some(0xC0),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD A, 0x3E; SUB 0x40
        "3E3ED640",
        &ExpectedState {
            a: Some(0xFE),
            f: Some(0x50),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD A, 0x10; LD E, 0x01; SUB E
        "3E101E0193",
        &ExpectedState {
            a: Some(0x0F),
            f: Some(0x60),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn subtract_with_carry() {
    run_test(
        // SCF; LD A, 0x3B; SBC A, 0x2A
        "373E3BDE2A",
        &ExpectedState {
            a: Some(0x10),
            f: Some(0x40),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // SCF; LD A, 0x3B; SBC A, 0x3A
        "373E3BDE3A",
        &ExpectedState {
            a: Some(0x00),
            f: Some(0xC0),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // SCF; LD A, 0x00; LD H, 0x00; SBC A, H
        "373E0026009C",
        &ExpectedState {
            a: Some(0xFF),
            f: Some(0x70),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn compare() {
    run_test(
        // LD A, 0x3C; CP 0x2F
        "3E3CFE2F",
        &ExpectedState {
            a: Some(0x3C),
            f: Some(0x60),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD A, 0x3C; CP 0x40
        "3E3CFE40",
        &ExpectedState {
            a: Some(0x3C),
            f: Some(0x50),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD A, 0x3C; LD B, 0x3C; CP B
        "3E3C063CB8",
        &ExpectedState {
            a: Some(0x3C),
            f: Some(0xC0),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn increment_decrement() {
    run_test(
        // XOR A; LD A, 0xFF; INC A
        "AF3EFF3C",
        &ExpectedState {
            a: Some(0x00),
            f: Some(0xA0),
            ..ExpectedState::empty()
        },
    );

    // Carry is left alone
    run_test(
        // SCF; LD D, 0x41; INC D
        "37164114",
        &ExpectedState {
            d: Some(0x42),
            f: Some(0x10),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // XOR A; LD A, 0x01; DEC A
        "AF3E013D",
        &ExpectedState {
            a: Some(0x00),
            f: Some(0xC0),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // XOR A; LD B, 0x10; DEC B
        "AF061005",
        &ExpectedState {
            b: Some(0x0F),
            f: Some(0x60),
            ..ExpectedState::empty()
        },
    );

    run_test(
        concat!(
            "2100C1", // LD HL, 0xC100
            "3640",   // LD (HL), 0x40
            "34",     // INC (HL)
            "35",     // DEC (HL)
            "35",     // DEC (HL)
        ),
        &ExpectedState {
            memory: hash_map! { 0xC100: 0x3F },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn add_hl_register_pair() {
    run_test(
        // XOR A; LD HL, 0x0FFF; LD BC, 0x0001; ADD HL, BC
        "AF21FF0F01010009",
        &ExpectedState {
            f: Some(0xA0),
            h: Some(0x10),
            l: Some(0x00),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // XOR A; LD HL, 0xFFFF; LD DE, 0x0001; ADD HL, DE
        "AF21FFFF11010019",
        &ExpectedState {
            f: Some(0xB0),
            h: Some(0x00),
            l: Some(0x00),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // XOR A; LD HL, 0x8A23; ADD HL, HL
        "AF21238A29",
        &ExpectedState {
            f: Some(0xB0),
            h: Some(0x14),
            l: Some(0x46),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // XOR A; LD SP, 0xC000; LD HL, 0x1000; ADD HL, SP
        "AF3100C021001039",
        &ExpectedState {
            f: Some(0x80),
            h: Some(0xD0),
            l: Some(0x00),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn increment_decrement_register_pair() {
    run_test(
        concat!(
            "01FFFF", // LD BC, 0xFFFF
            "03",     // INC BC
            "110000", // LD DE, 0x0000
            "1B",     // DEC DE
            "23",     // INC HL
            "33",     // INC SP
        ),
        &ExpectedState {
            // Flags untouched
            f: Some(0xB0),
            b: Some(0x00),
            c: Some(0x00),
            d: Some(0xFF),
            e: Some(0xFF),
            h: Some(0x01),
            l: Some(0x4E),
            sp: Some(0xFFFF),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn add_sp_immediate() {
    run_test(
        // LD SP, 0xC000; ADD SP, -2
        "3100C0E8FE",
        &ExpectedState {
            f: Some(0x00),
            sp: Some(0xBFFE),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD SP, 0xFFF8; ADD SP, 8
        "31F8FFE808",
        &ExpectedState {
            f: Some(0x30),
            sp: Some(0x0000),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn decimal_adjust() {
    run_test(
        // LD A, 0x45; ADD A, 0x38; DAA
        "3E45C63827",
        &ExpectedState {
            a: Some(0x83),
            f: Some(0x00),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD A, 0x83; SUB 0x38; DAA
        "3E83D63827",
        &ExpectedState {
            a: Some(0x45),
            f: Some(0x40),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD A, 0x99; ADD A, 0x01; DAA
        "3E99C60127",
        &ExpectedState {
            a: Some(0x00),
            f: Some(0x90),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn flag_operations() {
    run_test(
        // LD A, 0x35; CPL
        "3E352F",
        &ExpectedState {
            a: Some(0xCA),
            f: Some(0xF0),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // XOR A; SCF
        "AF37",
        &ExpectedState {
            f: Some(0x90),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // XOR A; SCF; CCF
        "AF373F",
        &ExpectedState {
            f: Some(0x80),
            ..ExpectedState::empty()
        },
    );

    // CCF clears N and H
    run_test(
        // LD A, 0x35; CPL; CCF
        "3E352F3F",
        &ExpectedState {
            f: Some(0x80),
            ..ExpectedState::empty()
        },
    );
}
