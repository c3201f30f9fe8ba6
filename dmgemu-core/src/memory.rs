pub mod address;
pub mod cartridge;
pub mod ioregisters;
pub(crate) mod mapper;

use crate::cpu::InterruptType;
use crate::dma::Dma;
use crate::input::{ButtonState, Gamepad};
use crate::ppu::Ppu;
use crate::timer::Timer;
use ioregisters::{InterruptController, IoRegister, SerialPort};
use std::sync::Arc;

pub use cartridge::{BatteryError, Cartridge, CartridgeLoadError};

/// The CPU-visible 16-bit address space. Every memory access from the CPU and the DMA engine is
/// routed through here to the cartridge, RAM, video memory or an I/O device.
pub struct AddressSpace {
    cartridge: Cartridge,
    working_ram: [u8; 0x2000],
    hram: [u8; 0x7F],
    interrupts: InterruptController,
    serial: SerialPort,
    timer: Timer,
    dma: Dma,
    ppu: Ppu,
    gamepad: Gamepad,
    last_joypad_lines: u8,
    // Machine cycles ticked since the last `take_cycles_ticked`
    cycles_ticked: u32,
}

impl AddressSpace {
    pub fn new(cartridge: Cartridge, buttons: Arc<ButtonState>) -> Self {
        let gamepad = Gamepad::new(buttons);
        let last_joypad_lines = gamepad.read() & 0x0F;

        Self {
            cartridge,
            working_ram: [0; 0x2000],
            hram: [0; 0x7F],
            interrupts: InterruptController::new(),
            serial: SerialPort::default(),
            timer: Timer::new(),
            dma: Dma::default(),
            ppu: Ppu::new(),
            gamepad,
            last_joypad_lines,
            cycles_ticked: 0,
        }
    }

    pub fn read_address_u8(&self, address: u16) -> u8 {
        match address {
            0x0000..=address::ROM_END => self.cartridge.read_rom_address(address),
            address::VRAM_START..=address::VRAM_END => self.ppu.read_vram(address),
            address::EXTERNAL_RAM_START..=address::EXTERNAL_RAM_END => {
                self.cartridge.read_ram_address(address)
            }
            address::WORKING_RAM_START..=address::WORKING_RAM_END => {
                self.working_ram[usize::from(address - address::WORKING_RAM_START)]
            }
            // Echo RAM is not mirrored
            0xE000..=address::ECHO_RAM_END => 0x00,
            address::OAM_START..=address::OAM_END => {
                if self.dma.transferring() {
                    0xFF
                } else {
                    self.ppu.read_oam(address)
                }
            }
            0xFEA0..=address::UNUSABLE_END => 0x00,
            address::IO_REGISTERS_START..=address::IO_REGISTERS_END => {
                self.read_io_register(address)
            }
            address::HRAM_START..=address::HRAM_END => {
                self.hram[usize::from(address - address::HRAM_START)]
            }
            address::IE_REGISTER => self.interrupts.read_ie(),
        }
    }

    /// Little-endian 16-bit read.
    pub fn read_address_u16(&self, address: u16) -> u16 {
        let lsb = self.read_address_u8(address);
        let msb = self.read_address_u8(address.wrapping_add(1));
        u16::from_le_bytes([lsb, msb])
    }

    pub fn write_address_u8(&mut self, address: u16, value: u8) {
        match address {
            0x0000..=address::ROM_END => self.cartridge.write_rom_address(address, value),
            address::VRAM_START..=address::VRAM_END => self.ppu.write_vram(address, value),
            address::EXTERNAL_RAM_START..=address::EXTERNAL_RAM_END => {
                self.cartridge.write_ram_address(address, value);
            }
            address::WORKING_RAM_START..=address::WORKING_RAM_END => {
                self.working_ram[usize::from(address - address::WORKING_RAM_START)] = value;
            }
            0xE000..=address::ECHO_RAM_END => {}
            address::OAM_START..=address::OAM_END => {
                if !self.dma.transferring() {
                    self.ppu.write_oam(address, value);
                }
            }
            0xFEA0..=address::UNUSABLE_END => {}
            address::IO_REGISTERS_START..=address::IO_REGISTERS_END => {
                self.write_io_register(address, value);
            }
            address::HRAM_START..=address::HRAM_END => {
                self.hram[usize::from(address - address::HRAM_START)] = value;
            }
            address::IE_REGISTER => self.interrupts.write_ie(value),
        }
    }

    /// Little-endian 16-bit write. The high byte is written first, matching the order of a stack
    /// push.
    pub fn write_address_u16(&mut self, address: u16, value: u16) {
        let [lsb, msb] = value.to_le_bytes();
        self.write_address_u8(address.wrapping_add(1), msb);
        self.write_address_u8(address, lsb);
    }

    fn read_io_register(&self, address: u16) -> u8 {
        if let Some(register) = IoRegister::from_address(address) {
            return match register {
                IoRegister::JOYP => self.gamepad.read(),
                IoRegister::SB | IoRegister::SC => self.serial.read_register(register),
                IoRegister::IF => self.interrupts.read_if(),
                _ if register.is_timer_register() => self.timer.read_register(register),
                _ => self.ppu.lcd().read_register(register),
            };
        }

        match address {
            address::AUDIO_START..=address::AUDIO_END => 0x00,
            _ => {
                log::warn!("Unsupported I/O register read: {address:04X}");
                0x00
            }
        }
    }

    fn write_io_register(&mut self, address: u16, value: u8) {
        if let Some(register) = IoRegister::from_address(address) {
            match register {
                IoRegister::JOYP => self.gamepad.write(value),
                IoRegister::SB | IoRegister::SC => self.serial.write_register(register, value),
                IoRegister::IF => self.interrupts.write_if(value),
                IoRegister::DMA => {
                    self.ppu.lcd_mut().write_register(register, value);
                    self.dma.start(value);
                }
                _ if register.is_timer_register() => {
                    self.timer.write_register(register, value, &mut self.interrupts);
                }
                _ => self.ppu.lcd_mut().write_register(register, value),
            }
            return;
        }

        match address {
            address::AUDIO_START..=address::AUDIO_END
            | address::UNASSIGNED_IO_START..=address::IO_REGISTERS_END => {}
            _ => {
                log::warn!("Unsupported I/O register write: {address:04X} = {value:02X}");
            }
        }
    }

    /// Advance every bus device by one machine cycle: four timer and video ticks, one DMA byte,
    /// and the joypad edge check.
    pub fn tick_m_cycle(&mut self) {
        for _ in 0..4 {
            self.timer.tick(&mut self.interrupts);
            self.ppu.tick(&mut self.interrupts);
        }

        self.tick_dma();
        self.check_joypad_lines();
        self.cycles_ticked += 1;
    }

    /// Machine cycles already ticked by the CPU during the current step. Resets the count.
    pub fn take_cycles_ticked(&mut self) -> u32 {
        std::mem::take(&mut self.cycles_ticked)
    }

    fn tick_dma(&mut self) {
        if let Some((source, index)) = self.dma.tick() {
            let value = self.read_address_u8(source);
            self.ppu.dma_write_oam(index, value);
        }
    }

    fn check_joypad_lines(&mut self) {
        let lines = self.gamepad.read() & 0x0F;
        if self.last_joypad_lines & !lines != 0 {
            self.interrupts.request(InterruptType::Joypad);
        }
        self.last_joypad_lines = lines;
    }

    pub fn interrupt_controller(&self) -> &InterruptController {
        &self.interrupts
    }

    pub fn interrupt_controller_mut(&mut self) -> &mut InterruptController {
        &mut self.interrupts
    }

    pub fn ppu(&self) -> &Ppu {
        &self.ppu
    }

    pub fn cartridge_mut(&mut self) -> &mut Cartridge {
        &mut self.cartridge
    }

    pub fn serial_output(&self) -> &str {
        self.serial.output()
    }
}
