/// Bytes copied by one OAM DMA transfer.
const TRANSFER_LEN: u8 = 0xA0;

/// Machine cycles between the DMA register write and the first byte copied.
const START_DELAY: u8 = 2;

/// OAM DMA engine. Copies 160 bytes from `source * 0x100` into OAM, one byte per machine cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dma {
    active: bool,
    byte: u8,
    source: u8,
    start_delay: u8,
}

impl Dma {
    pub fn start(&mut self, source: u8) {
        log::trace!("OAM DMA started from {:04X}", u16::from(source) << 8);

        self.active = true;
        self.byte = 0;
        self.source = source;
        self.start_delay = START_DELAY;
    }

    /// Advance one machine cycle. Returns the (source address, OAM index) pair to copy this cycle,
    /// if any.
    pub fn tick(&mut self) -> Option<(u16, usize)> {
        if !self.active {
            return None;
        }

        if self.start_delay > 0 {
            self.start_delay -= 1;
            return None;
        }

        let copy = (u16::from_be_bytes([self.source, self.byte]), usize::from(self.byte));

        self.byte += 1;
        self.active = self.byte < TRANSFER_LEN;

        Some(copy)
    }

    pub fn transferring(&self) -> bool {
        self.active
    }
}
