//
// Cartridge header addresses
//

pub const HEADER_START: usize = 0x0100;
pub const HEADER_CHECKSUM_START: usize = 0x0134;
pub const HEADER_CHECKSUM_END: usize = 0x014C;
pub const HEADER_END: usize = 0x0150;

//
// Address space boundaries
//

pub const ROM_END: u16 = 0x7FFF;

pub const SWITCHABLE_ROM_START: u16 = 0x4000;

pub const VRAM_START: u16 = 0x8000;
pub const VRAM_END: u16 = 0x9FFF;

pub const EXTERNAL_RAM_START: u16 = 0xA000;
pub const EXTERNAL_RAM_END: u16 = 0xBFFF;

pub const WORKING_RAM_START: u16 = 0xC000;
pub const WORKING_RAM_END: u16 = 0xDFFF;

pub const ECHO_RAM_END: u16 = 0xFDFF;

pub const OAM_START: u16 = 0xFE00;
pub const OAM_END: u16 = 0xFE9F;

pub const UNUSABLE_END: u16 = 0xFEFF;

pub const IO_REGISTERS_START: u16 = 0xFF00;
pub const IO_REGISTERS_END: u16 = 0xFF7F;

pub const HRAM_START: u16 = 0xFF80;
pub const HRAM_END: u16 = 0xFFFE;

pub const IE_REGISTER: u16 = 0xFFFF;

//
// I/O register sub-ranges
//

pub const AUDIO_START: u16 = 0xFF10;
pub const AUDIO_END: u16 = 0xFF3F;

/// CGB-only and unassigned registers; writes are dropped silently.
pub const UNASSIGNED_IO_START: u16 = 0xFF4C;
