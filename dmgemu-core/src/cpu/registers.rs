use dmgemu_proc_macros::EnumDisplay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumDisplay)]
pub enum CpuRegister {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
}

impl CpuRegister {
    /// Decode a 3-bit register field. Returns None for 0b110, which encodes (HL) rather than a
    /// register.
    fn from_bits(bits: u8) -> Option<Self> {
        match bits & 0x07 {
            0x00 => Some(Self::B),
            0x01 => Some(Self::C),
            0x02 => Some(Self::D),
            0x03 => Some(Self::E),
            0x04 => Some(Self::H),
            0x05 => Some(Self::L),
            0x07 => Some(Self::A),
            _ => None,
        }
    }

    /// Decode the register from bits 0-2 of an opcode.
    pub fn from_low_opcode_bits(opcode: u8) -> Option<Self> {
        Self::from_bits(opcode)
    }

    /// Decode the register from bits 3-5 of an opcode.
    pub fn from_mid_opcode_bits(opcode: u8) -> Option<Self> {
        Self::from_bits(opcode >> 3)
    }

    #[cfg(test)]
    pub fn to_opcode_bits(self) -> u8 {
        match self {
            Self::B => 0x00,
            Self::C => 0x01,
            Self::D => 0x02,
            Self::E => 0x03,
            Self::H => 0x04,
            Self::L => 0x05,
            Self::A => 0x07,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumDisplay)]
pub enum CpuRegisterPair {
    AF,
    BC,
    DE,
    HL,
    SP,
}

/// Deferred IME enable. EI requests it, the next instruction boundary arms it, and the boundary
/// after that sets IME.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImeLatch {
    requested: bool,
    armed: bool,
}

impl ImeLatch {
    pub fn request(&mut self) {
        self.requested = true;
    }

    pub fn cancel(&mut self) {
        *self = Self::default();
    }

    /// Advance the latch across one instruction boundary, returning true if IME should now be
    /// set.
    pub fn advance(&mut self) -> bool {
        let fire = self.armed;
        self.armed = self.requested;
        self.requested = false;
        fire
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuRegisters {
    pub accumulator: u8,
    pub flags: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub sp: u16,
    pub pc: u16,
    pub ime: bool,
    pub ime_latch: ImeLatch,
    pub halted: bool,
}

impl CpuRegisters {
    /// Register values as left by the DMG boot ROM.
    pub fn new() -> Self {
        Self {
            accumulator: 0x01,
            flags: 0xB0,
            b: 0x00,
            c: 0x13,
            d: 0x00,
            e: 0xD8,
            h: 0x01,
            l: 0x4D,
            sp: 0xFFFE,
            pc: 0x0100,
            ime: false,
            ime_latch: ImeLatch::default(),
            halted: false,
        }
    }

    pub fn af(&self) -> u16 {
        u16::from_be_bytes([self.accumulator, self.flags])
    }

    pub fn bc(&self) -> u16 {
        u16::from_be_bytes([self.b, self.c])
    }

    pub fn de(&self) -> u16 {
        u16::from_be_bytes([self.d, self.e])
    }

    pub fn hl(&self) -> u16 {
        u16::from_be_bytes([self.h, self.l])
    }

    pub fn set_hl(&mut self, hl: u16) {
        [self.h, self.l] = hl.to_be_bytes();
    }

    pub fn read_register(&self, register: CpuRegister) -> u8 {
        match register {
            CpuRegister::A => self.accumulator,
            CpuRegister::B => self.b,
            CpuRegister::C => self.c,
            CpuRegister::D => self.d,
            CpuRegister::E => self.e,
            CpuRegister::H => self.h,
            CpuRegister::L => self.l,
        }
    }

    pub fn set_register(&mut self, register: CpuRegister, value: u8) {
        *self.get_register_mut(register) = value;
    }

    fn get_register_mut(&mut self, register: CpuRegister) -> &mut u8 {
        match register {
            CpuRegister::A => &mut self.accumulator,
            CpuRegister::B => &mut self.b,
            CpuRegister::C => &mut self.c,
            CpuRegister::D => &mut self.d,
            CpuRegister::E => &mut self.e,
            CpuRegister::H => &mut self.h,
            CpuRegister::L => &mut self.l,
        }
    }

    pub fn read_register_pair(&self, register_pair: CpuRegisterPair) -> u16 {
        match register_pair {
            CpuRegisterPair::AF => self.af(),
            CpuRegisterPair::BC => self.bc(),
            CpuRegisterPair::DE => self.de(),
            CpuRegisterPair::HL => self.hl(),
            CpuRegisterPair::SP => self.sp,
        }
    }

    pub fn set_register_pair(&mut self, register_pair: CpuRegisterPair, value: u16) {
        match register_pair {
            CpuRegisterPair::AF => {
                // Low nibble of F is hardwired to 0
                let [a, f] = value.to_be_bytes();
                self.accumulator = a;
                self.flags = f & 0xF0;
            }
            CpuRegisterPair::BC => {
                [self.b, self.c] = value.to_be_bytes();
            }
            CpuRegisterPair::DE => {
                [self.d, self.e] = value.to_be_bytes();
            }
            CpuRegisterPair::HL => {
                self.set_hl(value);
            }
            CpuRegisterPair::SP => {
                self.sp = value;
            }
        }
    }

    pub fn set_flags(&mut self, z: bool, n: bool, h: bool, c: bool) {
        self.flags =
            (u8::from(z) << 7) | (u8::from(n) << 6) | (u8::from(h) << 5) | (u8::from(c) << 4);
    }

    /// Update only the flags that are Some, leaving the others as they were.
    pub fn set_some_flags(
        &mut self,
        z: Option<bool>,
        n: Option<bool>,
        h: Option<bool>,
        c: Option<bool>,
    ) {
        for (flag, bit) in [(z, 7), (n, 6), (h, 5), (c, 4)] {
            match flag {
                Some(true) => {
                    self.flags |= 1 << bit;
                }
                Some(false) => {
                    self.flags &= !(1 << bit);
                }
                None => {}
            }
        }
    }

    pub fn zero_flag(&self) -> bool {
        self.flags & 0x80 != 0
    }

    pub fn subtract_flag(&self) -> bool {
        self.flags & 0x40 != 0
    }

    pub fn half_carry_flag(&self) -> bool {
        self.flags & 0x20 != 0
    }

    pub fn carry_flag(&self) -> bool {
        self.flags & 0x10 != 0
    }
}

impl Default for CpuRegisters {
    fn default() -> Self {
        Self::new()
    }
}
