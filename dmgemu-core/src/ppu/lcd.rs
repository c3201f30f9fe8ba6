use crate::memory::ioregisters::IoRegister;

/// ARGB shades for colour indices 0-3, lightest first.
const COLORS_DEFAULT: [u32; 4] = [0xFFFF_FFFF, 0xFFAA_AAAA, 0xFF55_5555, 0xFF00_0000];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LcdMode {
    HBlank,
    VBlank,
    Oam,
    Transfer,
}

impl LcdMode {
    fn to_bits(self) -> u8 {
        match self {
            Self::HBlank => 0,
            Self::VBlank => 1,
            Self::Oam => 2,
            Self::Transfer => 3,
        }
    }

    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::HBlank,
            1 => Self::VBlank,
            2 => Self::Oam,
            _ => Self::Transfer,
        }
    }
}

/// STAT interrupt sources, bits 3-6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatSource {
    HBlank,
    VBlank,
    Oam,
    Lyc,
}

impl StatSource {
    fn bit(self) -> u8 {
        match self {
            Self::HBlank => 1 << 3,
            Self::VBlank => 1 << 4,
            Self::Oam => 1 << 5,
            Self::Lyc => 1 << 6,
        }
    }
}

/// Registers 0xFF40-0xFF4B along with the palette lookups derived from BGP/OBP0/OBP1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lcd {
    pub lcdc: u8,
    stat: u8,
    pub scroll_y: u8,
    pub scroll_x: u8,
    pub ly: u8,
    pub ly_compare: u8,
    dma: u8,
    bg_palette: u8,
    obj_palettes: [u8; 2],
    pub win_y: u8,
    pub win_x: u8,
    pub bg_colors: [u32; 4],
    pub sp1_colors: [u32; 4],
    pub sp2_colors: [u32; 4],
}

impl Lcd {
    pub fn new() -> Self {
        Self {
            lcdc: 0x91,
            stat: 0x00,
            scroll_y: 0,
            scroll_x: 0,
            ly: 0,
            ly_compare: 0,
            dma: 0x00,
            bg_palette: 0xFC,
            obj_palettes: [0xFF; 2],
            win_y: 0,
            win_x: 0,
            bg_colors: COLORS_DEFAULT,
            sp1_colors: COLORS_DEFAULT,
            sp2_colors: COLORS_DEFAULT,
        }
    }

    pub fn read_register(&self, register: IoRegister) -> u8 {
        match register {
            IoRegister::LCDC => self.lcdc,
            IoRegister::STAT => self.stat | 0x80,
            IoRegister::SCY => self.scroll_y,
            IoRegister::SCX => self.scroll_x,
            IoRegister::LY => self.ly,
            IoRegister::LYC => self.ly_compare,
            IoRegister::DMA => self.dma,
            IoRegister::BGP => self.bg_palette,
            IoRegister::OBP0 => self.obj_palettes[0],
            IoRegister::OBP1 => self.obj_palettes[1],
            IoRegister::WY => self.win_y,
            IoRegister::WX => self.win_x,
            _ => 0xFF,
        }
    }

    /// Write a register. Starting the OAM DMA transfer on a DMA write is up to the caller.
    pub fn write_register(&mut self, register: IoRegister, value: u8) {
        match register {
            IoRegister::LCDC => {
                self.lcdc = value;
            }
            IoRegister::STAT => {
                // Mode and LYC flag are read-only
                self.stat = (self.stat & 0x07) | (value & 0x78);
            }
            IoRegister::SCY => {
                self.scroll_y = value;
            }
            IoRegister::SCX => {
                self.scroll_x = value;
            }
            IoRegister::LYC => {
                self.ly_compare = value;
            }
            IoRegister::DMA => {
                self.dma = value;
            }
            IoRegister::BGP => {
                self.bg_palette = value;
                self.bg_colors = resolve_palette(value);
            }
            IoRegister::OBP0 => {
                self.obj_palettes[0] = value;
                self.sp1_colors = resolve_palette(value & 0xFC);
            }
            IoRegister::OBP1 => {
                self.obj_palettes[1] = value;
                self.sp2_colors = resolve_palette(value & 0xFC);
            }
            IoRegister::WY => {
                self.win_y = value;
            }
            IoRegister::WX => {
                self.win_x = value;
            }
            // LY is read-only
            _ => {}
        }
    }

    pub fn bgw_enabled(&self) -> bool {
        self.lcdc & 0x01 != 0
    }

    pub fn obj_enabled(&self) -> bool {
        self.lcdc & 0x02 != 0
    }

    pub fn obj_height(&self) -> u8 {
        if self.lcdc & 0x04 != 0 {
            16
        } else {
            8
        }
    }

    pub fn bg_map_area(&self) -> u16 {
        if self.lcdc & 0x08 != 0 {
            0x9C00
        } else {
            0x9800
        }
    }

    /// 0x8000 addressing uses unsigned tile indices, 0x8800 addressing signed ones.
    pub fn bgw_data_area(&self) -> u16 {
        if self.lcdc & 0x10 != 0 {
            0x8000
        } else {
            0x8800
        }
    }

    pub fn win_enabled(&self) -> bool {
        self.lcdc & 0x20 != 0
    }

    pub fn win_map_area(&self) -> u16 {
        if self.lcdc & 0x40 != 0 {
            0x9C00
        } else {
            0x9800
        }
    }

    pub fn mode(&self) -> LcdMode {
        LcdMode::from_bits(self.stat)
    }

    pub fn set_mode(&mut self, mode: LcdMode) {
        self.stat = (self.stat & !0x03) | mode.to_bits();
    }

    pub fn set_lyc_flag(&mut self, equal: bool) {
        if equal {
            self.stat |= 0x04;
        } else {
            self.stat &= !0x04;
        }
    }

    pub fn stat_interrupt_enabled(&self, source: StatSource) -> bool {
        self.stat & source.bit() != 0
    }
}

impl Default for Lcd {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_palette(palette: u8) -> [u32; 4] {
    std::array::from_fn(|i| COLORS_DEFAULT[usize::from((palette >> (2 * i)) & 0x03)])
}
