use crate::memory::address;
use std::fmt::{self, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MapperType {
    None,
    Mbc1,
    Mbc3,
}

impl fmt::Display for MapperType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "ROM only"),
            Self::Mbc1 => write!(f, "MBC1"),
            Self::Mbc3 => write!(f, "MBC3"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MapperFeatures {
    pub(crate) has_ram: bool,
    pub(crate) has_battery: bool,
}

impl fmt::Display for MapperFeatures {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "has_ram={}, has_battery={}", self.has_ram, self.has_battery)
    }
}

/// Parse the cartridge type byte at 0x0147. Returns None for controllers that are not emulated.
pub(crate) fn parse_byte(mapper_byte: u8) -> Option<(MapperType, MapperFeatures)> {
    let (mapper_type, has_ram, has_battery) = match mapper_byte {
        0x00 => (MapperType::None, false, false),
        0x01 => (MapperType::Mbc1, false, false),
        0x02 => (MapperType::Mbc1, true, false),
        0x03 => (MapperType::Mbc1, true, true),
        // 0x0F and 0x10 also have a real-time clock, which is not emulated
        0x0F => (MapperType::Mbc3, false, true),
        0x10 | 0x13 => (MapperType::Mbc3, true, true),
        0x11 => (MapperType::Mbc3, false, false),
        0x12 => (MapperType::Mbc3, true, false),
        _ => return None,
    };

    Some((mapper_type, MapperFeatures { has_ram, has_battery }))
}

/// Bank controller registers.
///
/// Bank numbers are stored after masking to the controller's register width and coercing 0 to 1.
/// They are masked again to the image's bank count when mapped, and 0 is coerced to 1 after that
/// second mask, so the switchable window never maps bank 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Mapper {
    None,
    Mbc1 {
        rom_bank_bit_mask: u8,
        ram_enabled: bool,
        rom_bank_number: u8,
        // Last value written to 0x4000-0x5FFF, applied only in RAM banking mode
        ram_bank_value: u8,
        ram_bank_number: u8,
        ram_banking_mode: bool,
    },
    Mbc3 {
        rom_bank_bit_mask: u8,
        ram_enabled: bool,
        rom_bank_number: u8,
        ram_bank_number: u8,
    },
}

impl Mapper {
    pub(crate) fn new(mapper_type: MapperType, rom_size: usize) -> Self {
        let rom_banks = (rom_size >> 14).max(1);
        let rom_bank_bit_mask = (rom_banks.next_power_of_two() - 1).min(0x7F) as u8;

        log::debug!("setting ROM bank bit mask to {rom_bank_bit_mask:02X} for size {rom_size}");

        match mapper_type {
            MapperType::None => Self::None,
            MapperType::Mbc1 => Self::Mbc1 {
                rom_bank_bit_mask,
                ram_enabled: false,
                rom_bank_number: 0x01,
                ram_bank_value: 0x00,
                ram_bank_number: 0x00,
                ram_banking_mode: false,
            },
            MapperType::Mbc3 => Self::Mbc3 {
                rom_bank_bit_mask,
                ram_enabled: false,
                rom_bank_number: 0x01,
                ram_bank_number: 0x00,
            },
        }
    }

    /// Map a CPU address in 0x0000-0x7FFF to an offset into the ROM image.
    pub(crate) fn map_rom_address(&self, address: u16) -> u32 {
        match self {
            Self::None => u32::from(address),
            &Self::Mbc1 { rom_bank_bit_mask, rom_bank_number, .. }
            | &Self::Mbc3 { rom_bank_bit_mask, rom_bank_number, .. } => {
                if address < address::SWITCHABLE_ROM_START {
                    u32::from(address)
                } else {
                    let bank_number = coerce_bank_zero(rom_bank_number & rom_bank_bit_mask);
                    u32::from(address - address::SWITCHABLE_ROM_START)
                        + (u32::from(bank_number) << 14)
                }
            }
        }
    }

    // ROM writes don't modify the ROM, they set controller registers
    pub(crate) fn write_rom_address(&mut self, address: u16, value: u8) {
        match self {
            Self::None => {}
            Self::Mbc1 {
                ram_enabled,
                rom_bank_number,
                ram_bank_value,
                ram_bank_number,
                ram_banking_mode,
                ..
            } => match address {
                0x0000..=0x1FFF => {
                    *ram_enabled = value & 0x0F == 0x0A;
                    log::trace!("MBC1 RAM enabled: {ram_enabled}");
                }
                0x2000..=0x3FFF => {
                    *rom_bank_number = coerce_bank_zero(value & 0x1F);
                    log::debug!("MBC1 ROM bank changed to {rom_bank_number:02X}");
                }
                0x4000..=0x5FFF => {
                    *ram_bank_value = value & 0x03;
                    if *ram_banking_mode {
                        *ram_bank_number = *ram_bank_value;
                        log::debug!("MBC1 RAM bank changed to {ram_bank_number}");
                    }
                }
                _ => {
                    *ram_banking_mode = value & 0x01 != 0;
                    if *ram_banking_mode {
                        *ram_bank_number = *ram_bank_value;
                    }
                    log::debug!(
                        "MBC1 banking mode changed, RAM banking: {ram_banking_mode}, RAM bank: {ram_bank_number}"
                    );
                }
            },
            Self::Mbc3 { ram_enabled, rom_bank_number, ram_bank_number, .. } => match address {
                0x0000..=0x1FFF => {
                    *ram_enabled = value & 0x0F == 0x0A;
                    log::trace!("MBC3 RAM enabled: {ram_enabled}");
                }
                0x2000..=0x3FFF => {
                    *rom_bank_number = coerce_bank_zero(value & 0x7F);
                    log::debug!("MBC3 ROM bank changed to {rom_bank_number:02X}");
                }
                0x4000..=0x5FFF => {
                    *ram_bank_number = value & 0x03;
                    log::debug!("MBC3 RAM bank changed to {ram_bank_number}");
                }
                // Clock latch, not emulated
                _ => {}
            },
        }
    }

    /// Returns the external RAM bank currently mapped to 0xA000-0xBFFF, or None if RAM access is
    /// disabled or the controller has no RAM.
    pub(crate) fn ram_bank(&self) -> Option<usize> {
        match self {
            Self::None => None,
            &Self::Mbc1 { ram_enabled, ram_bank_number, .. }
            | &Self::Mbc3 { ram_enabled, ram_bank_number, .. } => {
                ram_enabled.then_some(usize::from(ram_bank_number))
            }
        }
    }
}

fn coerce_bank_zero(bank_number: u8) -> u8 {
    if bank_number == 0x00 {
        0x01
    } else {
        bank_number
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mbc1_mapper_rom() {
        // 256KB ROM
        let mut mapper = Mapper::new(MapperType::Mbc1, 1 << 18);

        assert_eq!(0x0000, mapper.map_rom_address(0x0000));
        assert_eq!(0x3FFF, mapper.map_rom_address(0x3FFF));
        assert_eq!(0x4000, mapper.map_rom_address(0x4000));
        assert_eq!(0x7FFF, mapper.map_rom_address(0x7FFF));

        mapper.write_rom_address(0x2000, 0x05);

        assert_eq!(0x3FFF, mapper.map_rom_address(0x3FFF));
        assert_eq!(0x14000, mapper.map_rom_address(0x4000));
        assert_eq!(0x15324, mapper.map_rom_address(0x5324));
        assert_eq!(0x17FFF, mapper.map_rom_address(0x7FFF));

        // Higher than the highest bank number, should get masked to 0x05
        mapper.write_rom_address(0x3FFF, 0x15);

        assert_eq!(0x14000, mapper.map_rom_address(0x4000));

        // Bank 0 should be treated as bank 1
        mapper.write_rom_address(0x2000, 0x00);

        assert_eq!(0x0000, mapper.map_rom_address(0x0000));
        assert_eq!(0x4000, mapper.map_rom_address(0x4000));

        // Masked to 5 bits before coercion: 0x20 becomes 0x00, then 0x01
        mapper.write_rom_address(0x2000, 0x20);

        assert_eq!(0x4000, mapper.map_rom_address(0x4000));
    }

    #[test]
    fn bank_count_mask_never_maps_bank_zero() {
        // 32KB ROM, 2 banks
        let mut mapper = Mapper::new(MapperType::Mbc1, 1 << 15);

        // 0x02 masks down to bank 0 on a 2-bank image
        mapper.write_rom_address(0x2000, 0x02);
        assert_eq!(0x4000, mapper.map_rom_address(0x4000));

        mapper.write_rom_address(0x2000, 0x03);
        assert_eq!(0x4000, mapper.map_rom_address(0x4000));

        // 128KB ROM, 8 banks
        let mut mapper = Mapper::new(MapperType::Mbc3, 1 << 17);
        mapper.write_rom_address(0x2000, 0x08);
        assert_eq!(0x4000, mapper.map_rom_address(0x4000));
    }

    #[test]
    fn mbc1_mapper_ram_banking_mode() {
        let mut mapper = Mapper::new(MapperType::Mbc1, 1 << 16);

        assert_eq!(None, mapper.ram_bank());

        // Low nibble must be 0xA
        mapper.write_rom_address(0x0000, 0x1A);
        assert_eq!(Some(0), mapper.ram_bank());

        // ROM banking mode, RAM bank select is latched but not applied
        mapper.write_rom_address(0x4000, 0x02);
        assert_eq!(Some(0), mapper.ram_bank());

        // Switching to RAM banking mode applies the latched value
        mapper.write_rom_address(0x6000, 0x01);
        assert_eq!(Some(2), mapper.ram_bank());

        mapper.write_rom_address(0x5FFF, 0x07);
        assert_eq!(Some(3), mapper.ram_bank());

        mapper.write_rom_address(0x0000, 0x00);
        assert_eq!(None, mapper.ram_bank());
    }

    #[test]
    fn mbc3_mapper() {
        // 2MB ROM
        let mut mapper = Mapper::new(MapperType::Mbc3, 1 << 21);

        mapper.write_rom_address(0x2000, 0x45);
        assert_eq!(0x114000, mapper.map_rom_address(0x4000));
        assert_eq!(0x117FFF, mapper.map_rom_address(0x7FFF));

        mapper.write_rom_address(0x2000, 0x80);
        assert_eq!(0x4000, mapper.map_rom_address(0x4000));

        mapper.write_rom_address(0x0000, 0x0A);
        mapper.write_rom_address(0x4000, 0x03);
        assert_eq!(Some(3), mapper.ram_bank());

        // Clock latch writes are accepted and ignored
        mapper.write_rom_address(0x6000, 0x01);
        assert_eq!(Some(3), mapper.ram_bank());
        assert_eq!(0x4000, mapper.map_rom_address(0x4000));
    }

    #[test]
    fn no_mapper() {
        let mut mapper = Mapper::new(MapperType::None, 1 << 15);

        mapper.write_rom_address(0x2000, 0x03);
        mapper.write_rom_address(0x0000, 0x0A);

        assert_eq!(0x5000, mapper.map_rom_address(0x5000));
        assert_eq!(None, mapper.ram_bank());
    }

    #[test]
    fn parse_types() {
        assert_eq!(Some(MapperType::None), parse_byte(0x00).map(|(t, _)| t));
        assert_eq!(
            Some((MapperType::Mbc1, MapperFeatures { has_ram: true, has_battery: true })),
            parse_byte(0x03)
        );
        assert_eq!(
            Some((MapperType::Mbc3, MapperFeatures { has_ram: false, has_battery: true })),
            parse_byte(0x0F)
        );
        assert_eq!(None, parse_byte(0x19));
    }
}
