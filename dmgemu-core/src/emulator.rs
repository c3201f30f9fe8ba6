use crate::cpu::{self, CpuRegisters, ParseError};
use crate::memory::{AddressSpace, BatteryError, Cartridge};
use crate::shared::SharedState;
use std::path::PathBuf;
use std::sync::Arc;

/// Everything owned by the simulation thread: CPU registers, the bus with all attached devices,
/// and the handle used to publish frames.
pub struct Emulator {
    cpu_registers: CpuRegisters,
    address_space: AddressSpace,
    shared: Arc<SharedState>,
    battery_path: PathBuf,
    last_frame: u32,
}

impl Emulator {
    pub fn new(cartridge: Cartridge, battery_path: PathBuf, shared: Arc<SharedState>) -> Self {
        let address_space = AddressSpace::new(cartridge, shared.buttons());

        Self {
            cpu_registers: CpuRegisters::new(),
            address_space,
            shared,
            battery_path,
            last_frame: 0,
        }
    }

    /// Execute one CPU step and advance the bus by the machine cycles it took.
    ///
    /// Returns whether a frame was completed and published during this step.
    ///
    /// # Errors
    ///
    /// Returns an error if the CPU hits an invalid opcode.
    pub fn step(&mut self) -> Result<bool, ParseError> {
        let cycles = cpu::step(&mut self.cpu_registers, &mut self.address_space)?;
        let remaining = cycles.saturating_sub(self.address_space.take_cycles_ticked());
        for _ in 0..remaining {
            self.address_space.tick_m_cycle();
        }

        let ppu = self.address_space.ppu();
        let frame = ppu.current_frame();
        if frame == self.last_frame {
            return Ok(false);
        }

        self.last_frame = frame;
        self.shared.publish_frame(ppu.frame_buffer(), frame);

        Ok(true)
    }

    /// Write cartridge RAM to the battery file if it changed since the last save.
    ///
    /// # Errors
    ///
    /// Returns an error if the battery file cannot be written.
    pub fn flush_battery(&mut self) -> Result<(), BatteryError> {
        let cartridge = self.address_space.cartridge_mut();
        if cartridge.needs_save() {
            cartridge.save_battery(&self.battery_path)?;
        }

        Ok(())
    }

    pub fn shared(&self) -> &SharedState {
        &self.shared
    }

    pub fn frames_completed(&self) -> u32 {
        self.last_frame
    }

    pub fn serial_output(&self) -> &str {
        self.address_space.serial_output()
    }

    #[cfg(test)]
    pub(crate) fn cpu_registers(&self) -> &CpuRegisters {
        &self.cpu_registers
    }
}
