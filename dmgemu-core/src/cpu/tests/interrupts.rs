use super::{parse_hex, test_address_space};
use crate::cpu::{self, CpuRegisters, InterruptType};
use crate::memory::AddressSpace;

const IF_ADDRESS: u16 = 0xFF0F;
const IE_ADDRESS: u16 = 0xFFFF;

fn setup(program_hex: &str, enabled: u8) -> (CpuRegisters, AddressSpace) {
    let mut address_space = test_address_space(&parse_hex(program_hex));
    // VBlank is pending after boot
    address_space.write_address_u8(IF_ADDRESS, 0x00);
    address_space.write_address_u8(IE_ADDRESS, enabled);

    let mut cpu_registers = CpuRegisters::new();
    cpu_registers.pc = 0x0150;

    (cpu_registers, address_space)
}

fn step(cpu_registers: &mut CpuRegisters, address_space: &mut AddressSpace) -> u32 {
    cpu::step(cpu_registers, address_space).expect("test program should be valid")
}

#[test]
fn enable_takes_effect_after_next_instruction() {
    // EI; NOP; NOP
    let (mut cpu_registers, mut address_space) = setup("FB0000", 0x04);
    address_space.write_address_u8(IF_ADDRESS, 0x04);

    assert_eq!(1, step(&mut cpu_registers, &mut address_space));
    assert_eq!(0x0151, cpu_registers.pc);
    assert!(!cpu_registers.ime);

    assert_eq!(1 + cpu::ISR_CYCLES_REQUIRED, step(&mut cpu_registers, &mut address_space));
    assert_eq!(0x0050, cpu_registers.pc);
    assert!(!cpu_registers.ime);
    assert_eq!(0xFFFC, cpu_registers.sp);
    assert_eq!(0x0152, address_space.read_address_u16(cpu_registers.sp));
    assert!(!address_space.interrupt_controller().is_requested(InterruptType::Timer));
}

#[test]
fn disable_cancels_pending_enable() {
    // EI; DI; NOP
    let (mut cpu_registers, mut address_space) = setup("FBF300", 0x04);
    address_space.write_address_u8(IF_ADDRESS, 0x04);

    for _ in 0..3 {
        assert_eq!(1, step(&mut cpu_registers, &mut address_space));
    }

    assert_eq!(0x0153, cpu_registers.pc);
    assert!(!cpu_registers.ime);
    assert!(address_space.interrupt_controller().is_requested(InterruptType::Timer));
}

#[test]
fn disabled_interrupt_is_not_dispatched() {
    // NOP
    let (mut cpu_registers, mut address_space) = setup("00", 0x01);
    cpu_registers.ime = true;
    address_space.write_address_u8(IF_ADDRESS, 0x04);

    assert_eq!(1, step(&mut cpu_registers, &mut address_space));
    assert_eq!(0x0151, cpu_registers.pc);
    assert!(cpu_registers.ime);
}

#[test]
fn halt_wakes_without_dispatch_when_ime_clear() {
    // HALT; NOP
    let (mut cpu_registers, mut address_space) = setup("7600", 0x04);

    assert_eq!(1, step(&mut cpu_registers, &mut address_space));
    assert!(cpu_registers.halted);
    assert_eq!(0x0151, cpu_registers.pc);

    assert_eq!(1, step(&mut cpu_registers, &mut address_space));
    assert!(cpu_registers.halted);
    assert_eq!(0x0151, cpu_registers.pc);

    address_space.write_address_u8(IF_ADDRESS, 0x04);

    assert_eq!(1, step(&mut cpu_registers, &mut address_space));
    assert!(!cpu_registers.halted);
    assert_eq!(0x0151, cpu_registers.pc);
    assert!(address_space.interrupt_controller().is_requested(InterruptType::Timer));

    step(&mut cpu_registers, &mut address_space);
    assert_eq!(0x0152, cpu_registers.pc);
}

#[test]
fn halt_dispatches_when_ime_set() {
    // EI; HALT; NOP
    let (mut cpu_registers, mut address_space) = setup("FB7600", 0x01);

    step(&mut cpu_registers, &mut address_space);
    step(&mut cpu_registers, &mut address_space);
    assert!(cpu_registers.ime);
    assert!(cpu_registers.halted);

    assert_eq!(1, step(&mut cpu_registers, &mut address_space));
    assert!(cpu_registers.halted);

    address_space.write_address_u8(IF_ADDRESS, 0x01);

    assert_eq!(1 + cpu::ISR_CYCLES_REQUIRED, step(&mut cpu_registers, &mut address_space));
    assert!(!cpu_registers.halted);
    assert!(!cpu_registers.ime);
    assert_eq!(0x0040, cpu_registers.pc);
    assert_eq!(0x0152, address_space.read_address_u16(cpu_registers.sp));
}

#[test]
fn highest_priority_dispatched_first() {
    // NOP
    let (mut cpu_registers, mut address_space) = setup("00", 0x1F);
    cpu_registers.ime = true;
    address_space.write_address_u8(IF_ADDRESS, 0x12);

    step(&mut cpu_registers, &mut address_space);

    assert_eq!(0x0048, cpu_registers.pc);
    assert!(!address_space.interrupt_controller().is_requested(InterruptType::LcdStatus));
    assert!(address_space.interrupt_controller().is_requested(InterruptType::Joypad));
    assert_eq!(0xF0, address_space.read_address_u8(IF_ADDRESS));
}

#[test]
fn handler_addresses() {
    let expected = [0x0040, 0x0048, 0x0050, 0x0058, 0x0060];
    for (interrupt_type, address) in InterruptType::ALL.into_iter().zip(expected) {
        let (mut cpu_registers, mut address_space) = setup("00", 0x1F);
        cpu_registers.ime = true;
        address_space.write_address_u8(IF_ADDRESS, interrupt_type.bit());

        step(&mut cpu_registers, &mut address_space);

        assert_eq!(address, cpu_registers.pc, "{interrupt_type:?}");
    }
}
