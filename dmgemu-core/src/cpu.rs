pub(crate) mod instructions;
mod registers;


use crate::memory::AddressSpace;
use instructions::{parse_next_instruction, push_stack};

pub use instructions::ParseError;
pub use registers::CpuRegisters;

/// Machine cycles spent pushing the PC and jumping to an interrupt vector.
pub const ISR_CYCLES_REQUIRED: u32 = 5;

/// Interrupt sources in priority order, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptType {
    VBlank,
    LcdStatus,
    Timer,
    Serial,
    Joypad,
}

impl InterruptType {
    pub const ALL: [Self; 5] = [Self::VBlank, Self::LcdStatus, Self::Timer, Self::Serial, Self::Joypad];

    pub fn handler_address(self) -> u16 {
        match self {
            Self::VBlank => 0x0040,
            Self::LcdStatus => 0x0048,
            Self::Timer => 0x0050,
            Self::Serial => 0x0058,
            Self::Joypad => 0x0060,
        }
    }

    pub fn bit(self) -> u8 {
        match self {
            Self::VBlank => 0x01,
            Self::LcdStatus => 0x02,
            Self::Timer => 0x04,
            Self::Serial => 0x08,
            Self::Joypad => 0x10,
        }
    }
}

/// Run one CPU step: either a single instruction, or one idle cycle while halted. Pending
/// interrupts are serviced afterwards.
///
/// Returns the number of machine cycles consumed, including any interrupt dispatch. The bus is
/// ticked once per fetched instruction byte during the step; the caller ticks the remainder.
///
/// # Errors
///
/// Returns an error if the bytes at PC do not decode to a valid instruction.
pub fn step(
    cpu_registers: &mut CpuRegisters,
    address_space: &mut AddressSpace,
) -> Result<u32, ParseError> {
    let cycles_required = if cpu_registers.halted {
        1
    } else {
        let (instruction, pc) = parse_next_instruction(address_space, cpu_registers.pc)?;

        log::trace!(
            "Executing instruction {instruction} at {:04X}, registers: {cpu_registers:04X?}",
            cpu_registers.pc
        );

        let cycles_required = instruction.cycles_required(cpu_registers);

        // Opcode and operand fetches happen on the bus before the instruction executes
        for _ in 0..pc.wrapping_sub(cpu_registers.pc) {
            address_space.tick_m_cycle();
        }

        cpu_registers.pc = pc;
        instruction.execute(address_space, cpu_registers);

        if cpu_registers.ime_latch.advance() {
            cpu_registers.ime = true;
        }

        cycles_required
    };

    Ok(cycles_required + service_interrupt(cpu_registers, address_space))
}

/// Check for an interrupt that is both requested and enabled. Any such interrupt wakes the CPU
/// from HALT; it is only dispatched if IME is set.
///
/// Returns the machine cycles consumed by the dispatch, 0 if nothing was dispatched.
fn service_interrupt(cpu_registers: &mut CpuRegisters, address_space: &mut AddressSpace) -> u32 {
    let Some(interrupt_type) = address_space.interrupt_controller().highest_priority() else {
        return 0;
    };

    cpu_registers.halted = false;

    if !cpu_registers.ime {
        return 0;
    }

    log::trace!(
        "Interrupt type {interrupt_type:?} triggered, replacing previous PC of {:04X} with {:04X}",
        cpu_registers.pc,
        interrupt_type.handler_address()
    );

    address_space.interrupt_controller_mut().acknowledge(interrupt_type);
    cpu_registers.ime = false;

    push_stack(address_space, cpu_registers, cpu_registers.pc);
    cpu_registers.pc = interrupt_type.handler_address();

    ISR_CYCLES_REQUIRED
}
