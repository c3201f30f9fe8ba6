use crate::cpu::InterruptType;

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoRegister {
    JOYP,
    SB,
    SC,
    DIV,
    TIMA,
    TMA,
    TAC,
    IF,
    LCDC,
    STAT,
    SCY,
    SCX,
    LY,
    LYC,
    DMA,
    BGP,
    OBP0,
    OBP1,
    WY,
    WX,
}

impl IoRegister {
    /// Return the hardware register corresponding to the given address.
    pub fn from_address(address: u16) -> Option<Self> {
        let register = match address {
            0xFF00 => Self::JOYP,
            0xFF01 => Self::SB,
            0xFF02 => Self::SC,
            0xFF04 => Self::DIV,
            0xFF05 => Self::TIMA,
            0xFF06 => Self::TMA,
            0xFF07 => Self::TAC,
            0xFF0F => Self::IF,
            0xFF40 => Self::LCDC,
            0xFF41 => Self::STAT,
            0xFF42 => Self::SCY,
            0xFF43 => Self::SCX,
            0xFF44 => Self::LY,
            0xFF45 => Self::LYC,
            0xFF46 => Self::DMA,
            0xFF47 => Self::BGP,
            0xFF48 => Self::OBP0,
            0xFF49 => Self::OBP1,
            0xFF4A => Self::WY,
            0xFF4B => Self::WX,
            _ => return None,
        };

        Some(register)
    }

    /// Return the address for this hardware register.
    #[cfg(test)]
    pub fn to_address(self) -> u16 {
        match self {
            Self::JOYP => 0xFF00,
            Self::SB => 0xFF01,
            Self::SC => 0xFF02,
            Self::DIV => 0xFF04,
            Self::TIMA => 0xFF05,
            Self::TMA => 0xFF06,
            Self::TAC => 0xFF07,
            Self::IF => 0xFF0F,
            Self::LCDC => 0xFF40,
            Self::STAT => 0xFF41,
            Self::SCY => 0xFF42,
            Self::SCX => 0xFF43,
            Self::LY => 0xFF44,
            Self::LYC => 0xFF45,
            Self::DMA => 0xFF46,
            Self::BGP => 0xFF47,
            Self::OBP0 => 0xFF48,
            Self::OBP1 => 0xFF49,
            Self::WY => 0xFF4A,
            Self::WX => 0xFF4B,
        }
    }

    /// Return whether this register belongs to the timer block (DIV/TIMA/TMA/TAC).
    pub fn is_timer_register(self) -> bool {
        matches!(self, Self::DIV | Self::TIMA | Self::TMA | Self::TAC)
    }
}

/// The IF and IE registers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterruptController {
    flags: u8,
    enabled: u8,
}

impl InterruptController {
    const UNUSED_BITS: u8 = 0xE0;

    pub fn new() -> Self {
        Self { flags: 0xE1 & !Self::UNUSED_BITS, enabled: 0x00 }
    }

    /// Set the IF bit for the given interrupt type.
    pub fn request(&mut self, interrupt_type: InterruptType) {
        self.flags |= interrupt_type.bit();
    }

    /// Clear the IF bit for the given interrupt type.
    pub fn acknowledge(&mut self, interrupt_type: InterruptType) {
        self.flags &= !interrupt_type.bit();
    }

    /// Bits that are both requested and enabled.
    pub fn pending(&self) -> u8 {
        self.flags & self.enabled & 0x1F
    }

    /// Returns the highest priority requested + enabled interrupt, or None if no enabled
    /// interrupts have been requested.
    pub fn highest_priority(&self) -> Option<InterruptType> {
        let pending = self.pending();
        InterruptType::ALL
            .into_iter()
            .find(|interrupt_type| pending & interrupt_type.bit() != 0)
    }

    #[cfg(test)]
    pub fn is_requested(&self, interrupt_type: InterruptType) -> bool {
        self.flags & interrupt_type.bit() != 0
    }

    pub fn read_if(&self) -> u8 {
        self.flags | Self::UNUSED_BITS
    }

    pub fn write_if(&mut self, value: u8) {
        self.flags = value & !Self::UNUSED_BITS;
    }

    pub fn read_ie(&self) -> u8 {
        self.enabled
    }

    pub fn write_ie(&mut self, value: u8) {
        self.enabled = value;
    }
}

impl Default for InterruptController {
    fn default() -> Self {
        Self::new()
    }
}

/// SB/SC without a link partner. Transfers complete immediately and the transferred bytes are
/// captured as text.
#[derive(Debug, Clone, Default)]
pub struct SerialPort {
    data: u8,
    control: u8,
    output: String,
}

impl SerialPort {
    const TRANSFER_START: u8 = 0x81;

    pub fn read_register(&self, register: IoRegister) -> u8 {
        match register {
            IoRegister::SB => self.data,
            IoRegister::SC => self.control | 0x7E,
            _ => 0xFF,
        }
    }

    pub fn write_register(&mut self, register: IoRegister, value: u8) {
        match register {
            IoRegister::SB => {
                self.data = value;
            }
            IoRegister::SC => {
                if value == Self::TRANSFER_START {
                    self.output.push(char::from(self.data));
                    self.control = value & 0x7F;
                } else {
                    self.control = value;
                }
            }
            _ => {}
        }
    }

    pub fn output(&self) -> &str {
        &self.output
    }
}
