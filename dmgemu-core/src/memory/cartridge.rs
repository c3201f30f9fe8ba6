use crate::memory::address;
use crate::memory::mapper::{self, Mapper, MapperType};
use std::path::{Path, PathBuf};
use std::{fs, io};
use thiserror::Error;

const RAM_BANK_SIZE: usize = 0x2000;

#[derive(Error, Debug)]
pub enum CartridgeLoadError {
    #[error("error reading cartridge file '{file_path}': {source}")]
    FileRead {
        file_path: String,
        #[source]
        source: io::Error,
    },
    #[error("cartridge image is only {len} bytes, too short to contain a header")]
    HeaderTooShort { len: usize },
}

#[derive(Error, Debug)]
pub enum BatteryError {
    #[error("error reading battery file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("error writing battery file '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("battery file '{}' is {len} bytes, expected {}", .path.display(), RAM_BANK_SIZE)]
    SizeMismatch { path: PathBuf, len: usize },
}

/// Fields of the header at 0x0100-0x014F.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartridgeHeader {
    pub title: String,
    pub new_licensee_code: u16,
    pub sgb_flag: u8,
    pub cartridge_type: u8,
    pub rom_size_code: u8,
    pub ram_size_code: u8,
    pub destination_code: u8,
    pub licensee_code: u8,
    pub version: u8,
    pub header_checksum: u8,
    pub global_checksum: u16,
}

impl CartridgeHeader {
    fn parse(rom: &[u8]) -> Result<Self, CartridgeLoadError> {
        if rom.len() < address::HEADER_END {
            return Err(CartridgeLoadError::HeaderTooShort { len: rom.len() });
        }

        let header = &rom[address::HEADER_START..address::HEADER_END];

        // Entry point and logo occupy 0x00-0x33 of the header
        let title_bytes = &header[0x34..0x44];
        let title_len = title_bytes.iter().position(|&b| b == 0).unwrap_or(title_bytes.len());
        let title = String::from_utf8_lossy(&title_bytes[..title_len]).into_owned();

        Ok(Self {
            title,
            new_licensee_code: u16::from_be_bytes([header[0x44], header[0x45]]),
            sgb_flag: header[0x46],
            cartridge_type: header[0x47],
            rom_size_code: header[0x48],
            ram_size_code: header[0x49],
            destination_code: header[0x4A],
            licensee_code: header[0x4B],
            version: header[0x4C],
            header_checksum: header[0x4D],
            global_checksum: u16::from_be_bytes([header[0x4E], header[0x4F]]),
        })
    }

    pub fn rom_size_kb(&self) -> u32 {
        32_u32.checked_shl(self.rom_size_code.into()).unwrap_or(0)
    }

    /// Number of 8KB external RAM banks declared by the RAM size code.
    pub fn ram_bank_count(&self) -> usize {
        match self.ram_size_code {
            0x02 => 1,
            0x03 => 4,
            0x04 => 16,
            0x05 => 8,
            _ => 0,
        }
    }

    pub fn type_name(&self) -> &'static str {
        cartridge_type_name(self.cartridge_type)
    }

    pub fn licensee_name(&self) -> &'static str {
        licensee_name(self.licensee_code)
    }
}

/// Running `x = x - byte - 1` over 0x0134-0x014C.
pub fn compute_header_checksum(rom: &[u8]) -> u8 {
    rom[address::HEADER_CHECKSUM_START..=address::HEADER_CHECKSUM_END]
        .iter()
        .fold(0_u8, |x, &b| x.wrapping_sub(b).wrapping_sub(1))
}

pub struct Cartridge {
    rom: Vec<u8>,
    header: CartridgeHeader,
    mapper: Mapper,
    ram_banks: Vec<Box<[u8; RAM_BANK_SIZE]>>,
    has_battery: bool,
    needs_save: bool,
}

impl Cartridge {
    /// Read a cartridge image from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is too short to contain a header.
    pub fn load(file_path: &str) -> Result<Self, CartridgeLoadError> {
        let rom = fs::read(Path::new(file_path)).map_err(|source| CartridgeLoadError::FileRead {
            file_path: file_path.into(),
            source,
        })?;

        log::info!("Loaded {} bytes from '{file_path}'", rom.len());

        Self::new(rom)
    }

    /// Build a cartridge from an in-memory image.
    ///
    /// # Errors
    ///
    /// Returns an error if the image is too short to contain a header.
    pub fn new(rom: Vec<u8>) -> Result<Self, CartridgeLoadError> {
        let header = CartridgeHeader::parse(&rom)?;

        let (mapper_type, features) = match mapper::parse_byte(header.cartridge_type) {
            Some(parsed) => parsed,
            None => {
                log::warn!(
                    "unsupported cartridge type {:02X} ({}), treating as ROM only",
                    header.cartridge_type,
                    header.type_name()
                );
                (MapperType::None, mapper::MapperFeatures { has_ram: false, has_battery: false })
            }
        };

        log::info!("Using mapper {mapper_type} with features {features}");

        let ram_banks = (0..header.ram_bank_count())
            .map(|_| Box::new([0; RAM_BANK_SIZE]))
            .collect();

        let cartridge = Self {
            mapper: Mapper::new(mapper_type, rom.len()),
            has_battery: features.has_battery,
            needs_save: false,
            ram_banks,
            header,
            rom,
        };
        cartridge.log_header();

        Ok(cartridge)
    }

    fn log_header(&self) {
        let header = self.header();

        log::info!("Title    : {}", header.title);
        log::info!("Type     : {:02X} ({})", header.cartridge_type, header.type_name());
        log::info!("ROM size : {} KB", header.rom_size_kb());
        log::info!("RAM size : {:X}", header.ram_size_code);
        log::info!("Licensee : {:02X} ({})", header.licensee_code, header.licensee_name());
        log::info!("Version  : {:X}", header.version);

        let checksum = compute_header_checksum(&self.rom);
        if checksum == header.header_checksum {
            log::info!("Checksum : {:02X} (PASSED)", header.header_checksum);
        } else {
            log::warn!(
                "Checksum : {:02X} (FAILED, computed {checksum:02X})",
                header.header_checksum
            );
        }
    }

    pub fn header(&self) -> &CartridgeHeader {
        &self.header
    }

    pub fn read_rom_address(&self, address: u16) -> u8 {
        let rom_address = self.mapper.map_rom_address(address);
        self.rom.get(rom_address as usize).copied().unwrap_or(0xFF)
    }

    pub fn write_rom_address(&mut self, address: u16, value: u8) {
        self.mapper.write_rom_address(address, value);
    }

    pub fn read_ram_address(&self, address: u16) -> u8 {
        let offset = usize::from(address - address::EXTERNAL_RAM_START);
        self.mapper
            .ram_bank()
            .and_then(|bank| self.ram_banks.get(bank))
            .map_or(0xFF, |bank| bank[offset])
    }

    pub fn write_ram_address(&mut self, address: u16, value: u8) {
        let offset = usize::from(address - address::EXTERNAL_RAM_START);
        let Some(bank) = self.mapper.ram_bank().and_then(|bank| self.ram_banks.get_mut(bank))
        else {
            return;
        };

        bank[offset] = value;
        if self.has_battery {
            self.needs_save = true;
        }
    }

    pub fn has_battery(&self) -> bool {
        self.has_battery
    }

    pub fn needs_save(&self) -> bool {
        self.needs_save
    }

    /// Write external RAM bank 0 to `path` and clear the needs-save flag. Does nothing for
    /// cartridges without battery-backed RAM.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_battery(&mut self, path: &Path) -> Result<(), BatteryError> {
        if !self.has_battery {
            return Ok(());
        }

        let Some(bank) = self.ram_banks.first() else {
            return Ok(());
        };

        fs::write(path, bank.as_slice())
            .map_err(|source| BatteryError::Write { path: path.into(), source })?;
        self.needs_save = false;

        log::info!("Saved battery RAM to '{}'", path.display());

        Ok(())
    }

    /// Load external RAM bank 0 from `path`. Returns false if there is no prior save.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or has the wrong size.
    pub fn load_battery(&mut self, path: &Path) -> Result<bool, BatteryError> {
        if !self.has_battery {
            return Ok(false);
        }

        let Some(bank) = self.ram_banks.first_mut() else {
            return Ok(false);
        };

        let contents = match fs::read(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::info!("No battery file at '{}', starting with empty RAM", path.display());
                return Ok(false);
            }
            Err(source) => return Err(BatteryError::Read { path: path.into(), source }),
        };

        if contents.len() != RAM_BANK_SIZE {
            return Err(BatteryError::SizeMismatch { path: path.into(), len: contents.len() });
        }

        bank.copy_from_slice(&contents);

        log::info!("Loaded battery RAM from '{}'", path.display());

        Ok(true)
    }
}

/// `<save_dir>/<ROM file name without extension>.battery`
pub fn battery_path(gb_file_path: &str, save_dir: &Path) -> PathBuf {
    let mut file_name = Path::new(gb_file_path).file_stem().unwrap_or_default().to_os_string();
    file_name.push(".battery");
    save_dir.join(file_name)
}

fn cartridge_type_name(cartridge_type: u8) -> &'static str {
    match cartridge_type {
        0x00 => "ROM ONLY",
        0x01 => "MBC1",
        0x02 => "MBC1+RAM",
        0x03 => "MBC1+RAM+BATTERY",
        0x05 => "MBC2",
        0x06 => "MBC2+BATTERY",
        0x08 => "ROM+RAM",
        0x09 => "ROM+RAM+BATTERY",
        0x0B => "MMM01",
        0x0C => "MMM01+RAM",
        0x0D => "MMM01+RAM+BATTERY",
        0x0F => "MBC3+TIMER+BATTERY",
        0x10 => "MBC3+TIMER+RAM+BATTERY",
        0x11 => "MBC3",
        0x12 => "MBC3+RAM",
        0x13 => "MBC3+RAM+BATTERY",
        0x19 => "MBC5",
        0x1A => "MBC5+RAM",
        0x1B => "MBC5+RAM+BATTERY",
        0x1C => "MBC5+RUMBLE",
        0x1D => "MBC5+RUMBLE+RAM",
        0x1E => "MBC5+RUMBLE+RAM+BATTERY",
        0x20 => "MBC6",
        0x22 => "MBC7+SENSOR+RUMBLE+RAM+BATTERY",
        _ => "unknown type",
    }
}

fn licensee_name(licensee_code: u8) -> &'static str {
    match licensee_code {
        0x00 => "None",
        0x01 => "Nintendo R&D1",
        0x08 => "Capcom",
        0x13 | 0x69 => "Electronic Arts",
        0x18 => "Hudson Soft",
        0x19 => "b-ai",
        0x20 => "kss",
        0x22 => "pow",
        0x24 => "PCM Complete",
        0x25 => "san-x",
        0x28 => "Kemco Japan",
        0x29 => "seta",
        0x30 => "Viacom",
        0x31 => "Nintendo",
        0x32 => "Bandai",
        0x33 | 0x93 => "Ocean/Acclaim",
        0x34 | 0x54 => "Konami",
        0x35 => "Hector",
        0x37 => "Taito",
        0x38 => "Hudson",
        0x39 => "Banpresto",
        0x41 => "Ubi Soft",
        0x42 => "Atlus",
        0x44 => "Malibu",
        0x46 => "angel",
        0x47 => "Bullet-Proof",
        0x49 => "irem",
        0x50 => "Absolute",
        0x51 => "Acclaim",
        0x52 => "Activision",
        0x53 => "American sammy",
        0x55 => "Hi tech entertainment",
        0x56 => "LJN",
        0x57 => "Matchbox",
        0x58 => "Mattel",
        0x59 => "Milton Bradley",
        0x60 => "Titus",
        0x61 => "Virgin",
        0x64 => "LucasArts",
        0x67 => "Ocean",
        0x70 => "Infogrames",
        0x71 => "Interplay",
        0x72 => "Broderbund",
        0x73 => "sculptured",
        0x75 => "sci",
        0x78 => "THQ",
        0x79 => "Accolade",
        0x80 => "misawa",
        0x83 => "lozc",
        0x86 => "Tokuma Shoten Intermedia",
        0x87 => "Tsukuda Original",
        0x91 => "Chunsoft",
        0x92 => "Video system",
        0x95 => "Varie",
        0x96 => "Yonezawa/s'pal",
        0x97 => "Kaneko",
        0x99 => "Pack in soft",
        0xA4 => "Konami (Yu-Gi-Oh!)",
        _ => "unknown licensee",
    }
}
