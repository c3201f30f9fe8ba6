mod fetcher;
pub mod lcd;
mod queue;

use crate::cpu::InterruptType;
use crate::memory::address;
use crate::memory::ioregisters::InterruptController;
use fetcher::PixelFetcher;
use lcd::{Lcd, LcdMode, StatSource};
use tinyvec::ArrayVec;

pub const LINES_PER_FRAME: u8 = 154;
pub const TICKS_PER_LINE: u32 = 456;
pub const YRES: u8 = 144;
pub const XRES: u8 = 160;

pub const FRAME_BUFFER_LEN: usize = XRES as usize * YRES as usize;

const OAM_SCAN_TICKS: u32 = 80;
const MAX_SPRITES_PER_LINE: usize = 10;

/// One 4-byte sprite attribute entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OamEntry {
    pub y: u8,
    pub x: u8,
    pub tile: u8,
    pub flags: u8,
}

impl OamEntry {
    fn from_bytes(bytes: &[u8]) -> Self {
        Self { y: bytes[0], x: bytes[1], tile: bytes[2], flags: bytes[3] }
    }

    /// If set, background colours 1-3 are drawn over this sprite.
    fn bg_priority(self) -> bool {
        self.flags & 0x80 != 0
    }

    fn y_flip(self) -> bool {
        self.flags & 0x40 != 0
    }

    fn x_flip(self) -> bool {
        self.flags & 0x20 != 0
    }

    /// OBP1 if set, OBP0 otherwise.
    fn use_obp1(self) -> bool {
        self.flags & 0x10 != 0
    }
}

/// Video RAM, OAM, the LCD registers and the scanline state machine.
pub struct Ppu {
    vram: Box<[u8; 0x2000]>,
    oam: [u8; 0xA0],
    lcd: Lcd,
    fetcher: PixelFetcher,
    line_sprites: ArrayVec<[OamEntry; MAX_SPRITES_PER_LINE]>,
    // Sprite height in effect when `line_sprites` was selected
    line_sprite_height: u8,
    window_line: u8,
    line_ticks: u32,
    current_frame: u32,
    frame_buffer: Box<[u32]>,
}

impl Ppu {
    pub fn new() -> Self {
        let mut lcd = Lcd::new();
        lcd.set_mode(LcdMode::Oam);

        Self {
            vram: Box::new([0; 0x2000]),
            oam: [0; 0xA0],
            lcd,
            fetcher: PixelFetcher::new(),
            line_sprites: ArrayVec::new(),
            line_sprite_height: 8,
            window_line: 0,
            line_ticks: 0,
            current_frame: 0,
            frame_buffer: vec![0; FRAME_BUFFER_LEN].into_boxed_slice(),
        }
    }

    /// Advance one clock cycle.
    pub fn tick(&mut self, interrupts: &mut InterruptController) {
        self.line_ticks += 1;

        match self.lcd.mode() {
            LcdMode::Oam => self.mode_oam(),
            LcdMode::Transfer => self.mode_transfer(interrupts),
            LcdMode::HBlank => self.mode_hblank(interrupts),
            LcdMode::VBlank => self.mode_vblank(interrupts),
        }
    }

    fn mode_oam(&mut self) {
        if self.line_ticks == 1 {
            self.load_line_sprites();
        }

        if self.line_ticks >= OAM_SCAN_TICKS {
            self.lcd.set_mode(LcdMode::Transfer);
            self.fetcher.start_line();
        }
    }

    fn mode_transfer(&mut self, interrupts: &mut InterruptController) {
        self.pipeline_process();

        if self.fetcher.line_complete() {
            self.fetcher.reset_fifo();
            self.enter_mode(LcdMode::HBlank, StatSource::HBlank, interrupts);
        }
    }

    fn mode_hblank(&mut self, interrupts: &mut InterruptController) {
        if self.line_ticks < TICKS_PER_LINE {
            return;
        }

        self.increment_ly(interrupts);

        if self.lcd.ly >= YRES {
            self.enter_mode(LcdMode::VBlank, StatSource::VBlank, interrupts);
            interrupts.request(InterruptType::VBlank);
            self.current_frame = self.current_frame.wrapping_add(1);
        } else {
            self.enter_mode(LcdMode::Oam, StatSource::Oam, interrupts);
        }

        self.line_ticks = 0;
    }

    fn mode_vblank(&mut self, interrupts: &mut InterruptController) {
        if self.line_ticks < TICKS_PER_LINE {
            return;
        }

        self.increment_ly(interrupts);

        if self.lcd.ly >= LINES_PER_FRAME {
            self.lcd.ly = 0;
            self.window_line = 0;
            self.update_lyc(interrupts);
            self.enter_mode(LcdMode::Oam, StatSource::Oam, interrupts);
        }

        self.line_ticks = 0;
    }

    fn enter_mode(
        &mut self,
        mode: LcdMode,
        stat_source: StatSource,
        interrupts: &mut InterruptController,
    ) {
        self.lcd.set_mode(mode);
        if self.lcd.stat_interrupt_enabled(stat_source) {
            interrupts.request(InterruptType::LcdStatus);
        }
    }

    fn increment_ly(&mut self, interrupts: &mut InterruptController) {
        if self.window_visible() {
            self.window_line = self.window_line.wrapping_add(1);
        }

        self.lcd.ly += 1;
        self.update_lyc(interrupts);
    }

    fn update_lyc(&mut self, interrupts: &mut InterruptController) {
        let equal = self.lcd.ly == self.lcd.ly_compare;
        self.lcd.set_lyc_flag(equal);

        if equal && self.lcd.stat_interrupt_enabled(StatSource::Lyc) {
            interrupts.request(InterruptType::LcdStatus);
        }
    }

    /// Whether the window covers any part of the current line.
    fn window_visible(&self) -> bool {
        self.lcd.win_enabled()
            && self.lcd.bgw_enabled()
            && self.lcd.win_x <= 166
            && self.lcd.win_y < YRES
            && self.lcd.ly >= self.lcd.win_y
    }

    /// Select up to 10 sprites overlapping the current line, ordered by X and then by OAM index.
    fn load_line_sprites(&mut self) {
        self.line_sprite_height = self.lcd.obj_height();
        let sprite_height = u16::from(self.line_sprite_height);
        let line = u16::from(self.lcd.ly) + 16;

        self.line_sprites.clear();

        for entry in self.oam.chunks_exact(4).map(OamEntry::from_bytes) {
            // X=0 hides the sprite
            if entry.x == 0 {
                continue;
            }

            if self.line_sprites.len() >= MAX_SPRITES_PER_LINE {
                break;
            }

            let y = u16::from(entry.y);
            if y <= line && y + sprite_height > line {
                let index = self
                    .line_sprites
                    .iter()
                    .position(|existing| existing.x > entry.x)
                    .unwrap_or(self.line_sprites.len());
                self.line_sprites.insert(index, entry);
            }
        }
    }

    pub fn read_vram(&self, address: u16) -> u8 {
        self.vram[usize::from(address - address::VRAM_START)]
    }

    pub fn write_vram(&mut self, address: u16, value: u8) {
        self.vram[usize::from(address - address::VRAM_START)] = value;
    }

    pub fn read_oam(&self, address: u16) -> u8 {
        self.oam[usize::from(address - address::OAM_START)]
    }

    pub fn write_oam(&mut self, address: u16, value: u8) {
        self.oam[usize::from(address - address::OAM_START)] = value;
    }

    /// OAM write from the DMA engine, addressed by byte index.
    pub fn dma_write_oam(&mut self, index: usize, value: u8) {
        if let Some(byte) = self.oam.get_mut(index) {
            *byte = value;
        }
    }

    pub fn lcd(&self) -> &Lcd {
        &self.lcd
    }

    pub fn lcd_mut(&mut self) -> &mut Lcd {
        &mut self.lcd
    }

    /// Number of frames completed so far. Incremented on entering V-blank.
    pub fn current_frame(&self) -> u32 {
        self.current_frame
    }

    /// 160x144 ARGB pixels, row-major.
    pub fn frame_buffer(&self) -> &[u32] {
        &self.frame_buffer
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}
