use super::queue::ArrayQueue;
use super::{OamEntry, Ppu, XRES};
use tinyvec::ArrayVec;

const MAX_SPRITES_PER_FETCH: usize = 3;
const SPRITE_TILE_BASE: u16 = 0x8000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchState {
    Tile,
    Data0,
    Data1,
    Idle,
    Push,
}

/// Background/window fetcher and the pixel FIFO it feeds.
#[derive(Debug, Clone)]
pub(super) struct PixelFetcher {
    state: FetchState,
    fifo: ArrayQueue<u32, 16>,
    // Pixels popped from the FIFO this line, including ones discarded for fine scroll
    line_x: u8,
    // Pixels written to the frame buffer this line
    pushed_x: u8,
    // X of the next tile to fetch, relative to the start of the first fetched tile
    fetch_x: u8,
    // X of the next pixel pushed into the FIFO
    fifo_x: u8,
    tile_index: u8,
    tile_row_offset: u16,
    bgw_data: [u8; 2],
    sprites: ArrayVec<[OamEntry; MAX_SPRITES_PER_FETCH]>,
    sprite_data: [u8; 2 * MAX_SPRITES_PER_FETCH],
}

impl PixelFetcher {
    pub(super) fn new() -> Self {
        Self {
            state: FetchState::Tile,
            fifo: ArrayQueue::new(),
            line_x: 0,
            pushed_x: 0,
            fetch_x: 0,
            fifo_x: 0,
            tile_index: 0,
            tile_row_offset: 0,
            bgw_data: [0; 2],
            sprites: ArrayVec::new(),
            sprite_data: [0; 2 * MAX_SPRITES_PER_FETCH],
        }
    }

    pub(super) fn start_line(&mut self) {
        *self = Self::new();
    }

    pub(super) fn reset_fifo(&mut self) {
        self.fifo.clear();
    }

    pub(super) fn line_complete(&self) -> bool {
        self.pushed_x >= XRES
    }
}

impl Ppu {
    /// One dot of pixel transfer: the fetcher advances on even dots, the FIFO shifts out a pixel
    /// every dot once it holds more than 8.
    pub(super) fn pipeline_process(&mut self) {
        if self.line_ticks & 1 == 0 {
            self.fetch_step();
        }

        self.push_pixel();
    }

    fn fetch_step(&mut self) {
        match self.fetcher.state {
            FetchState::Tile => {
                self.fetcher.sprites.clear();

                if self.lcd.bgw_enabled() {
                    self.load_tile_index();
                }

                if self.lcd.obj_enabled() && !self.line_sprites.is_empty() {
                    self.load_sprite_entries();
                }

                self.fetcher.fetch_x = self.fetcher.fetch_x.wrapping_add(8);
                self.fetcher.state = FetchState::Data0;
            }
            FetchState::Data0 => {
                self.fetcher.bgw_data[0] = self.read_vram(self.tile_data_address());
                self.load_sprite_data(0);
                self.fetcher.state = FetchState::Data1;
            }
            FetchState::Data1 => {
                self.fetcher.bgw_data[1] = self.read_vram(self.tile_data_address() + 1);
                self.load_sprite_data(1);
                self.fetcher.state = FetchState::Idle;
            }
            FetchState::Idle => {
                self.fetcher.state = FetchState::Push;
            }
            FetchState::Push => {
                if self.fifo_add() {
                    self.fetcher.state = FetchState::Tile;
                }
            }
        }
    }

    fn load_tile_index(&mut self) {
        let fetch_x = u16::from(self.fetcher.fetch_x);
        let win_x = u16::from(self.lcd.win_x);

        let (map_address, row) = if self.window_visible() && fetch_x + 7 >= win_x {
            let window_line = u16::from(self.window_line);
            let map_address = self.lcd.win_map_area() + (fetch_x + 7 - win_x) / 8 + 32 * (window_line / 8);
            (map_address, window_line % 8)
        } else {
            let map_x = u16::from(self.fetcher.fetch_x.wrapping_add(self.lcd.scroll_x));
            let map_y = u16::from(self.lcd.ly.wrapping_add(self.lcd.scroll_y));
            let map_address = self.lcd.bg_map_area() + map_x / 8 + 32 * (map_y / 8);
            (map_address, map_y % 8)
        };

        let tile_index = self.read_vram(map_address);
        self.fetcher.tile_index = if self.lcd.bgw_data_area() == 0x8800 {
            // Signed index relative to 0x9000
            tile_index.wrapping_add(128)
        } else {
            tile_index
        };
        self.fetcher.tile_row_offset = 2 * row;
    }

    fn tile_data_address(&self) -> u16 {
        self.lcd.bgw_data_area() + 16 * u16::from(self.fetcher.tile_index) + self.fetcher.tile_row_offset
    }

    fn load_sprite_entries(&mut self) {
        let fetch_x = i32::from(self.fetcher.fetch_x);
        let fine_scroll = i32::from(self.lcd.scroll_x % 8);

        for &entry in &self.line_sprites {
            if self.fetcher.sprites.len() >= MAX_SPRITES_PER_FETCH {
                break;
            }

            let sprite_x = i32::from(entry.x) - 8 + fine_scroll;
            let left_edge_in_tile = (fetch_x..fetch_x + 8).contains(&sprite_x);
            let right_edge_in_tile = (fetch_x..fetch_x + 8).contains(&(sprite_x + 8));
            if left_edge_in_tile || right_edge_in_tile {
                self.fetcher.sprites.push(entry);
            }
        }
    }

    fn load_sprite_data(&mut self, byte: usize) {
        let line = u16::from(self.lcd.ly) + 16;
        let sprite_height = u16::from(self.line_sprite_height);

        for i in 0..self.fetcher.sprites.len() {
            let entry = self.fetcher.sprites[i];

            let mut row_offset = 2 * (line - u16::from(entry.y));
            if entry.y_flip() {
                row_offset = 2 * sprite_height - 2 - row_offset;
            }

            let mut tile = entry.tile;
            if sprite_height == 16 {
                tile &= !0x01;
            }

            let address = SPRITE_TILE_BASE + 16 * u16::from(tile) + row_offset + byte as u16;
            self.fetcher.sprite_data[2 * i + byte] = self.read_vram(address);
        }
    }

    /// Push the fetched tile row into the FIFO. Fails while the FIFO still holds more than 8
    /// pixels.
    fn fifo_add(&mut self) -> bool {
        if self.fetcher.fifo.len() > 8 {
            return false;
        }

        let [low, high] = self.fetcher.bgw_data;
        for bit in (0..8).rev() {
            let bg_index = if self.lcd.bgw_enabled() {
                ((low >> bit) & 0x01) | (((high >> bit) & 0x01) << 1)
            } else {
                0
            };

            let mut color = self.lcd.bg_colors[usize::from(bg_index)];
            if self.lcd.obj_enabled() {
                if let Some(sprite_color) = self.sprite_pixel(bg_index) {
                    color = sprite_color;
                }
            }

            self.fetcher.fifo.push_back(color);
            self.fetcher.fifo_x = self.fetcher.fifo_x.wrapping_add(1);
        }

        true
    }

    /// Colour of the first opaque sprite pixel at the current FIFO position, unless the background
    /// wins priority.
    fn sprite_pixel(&self, bg_index: u8) -> Option<u32> {
        let fifo_x = i32::from(self.fetcher.fifo_x);
        let fine_scroll = i32::from(self.lcd.scroll_x % 8);

        for (i, entry) in self.fetcher.sprites.iter().enumerate() {
            let sprite_x = i32::from(entry.x) - 8 + fine_scroll;
            let offset = fifo_x - sprite_x;
            if !(0..8).contains(&offset) {
                continue;
            }

            let bit = if entry.x_flip() { offset } else { 7 - offset };
            let low = (self.fetcher.sprite_data[2 * i] >> bit) & 0x01;
            let high = (self.fetcher.sprite_data[2 * i + 1] >> bit) & 0x01;
            let color_index = usize::from(low | (high << 1));

            if color_index == 0 {
                continue;
            }

            if entry.bg_priority() && bg_index != 0 {
                return None;
            }

            let palette =
                if entry.use_obp1() { &self.lcd.sp2_colors } else { &self.lcd.sp1_colors };
            return Some(palette[color_index]);
        }

        None
    }

    fn push_pixel(&mut self) {
        if self.fetcher.fifo.len() <= 8 {
            return;
        }

        let Some(color) = self.fetcher.fifo.pop_front() else { return };

        if self.fetcher.line_x >= self.lcd.scroll_x % 8 && !self.fetcher.line_complete() {
            let index = usize::from(self.lcd.ly) * usize::from(XRES) + usize::from(self.fetcher.pushed_x);
            if let Some(pixel) = self.frame_buffer.get_mut(index) {
                *pixel = color;
            }
            self.fetcher.pushed_x += 1;
        }

        self.fetcher.line_x = self.fetcher.line_x.wrapping_add(1);
    }
}
