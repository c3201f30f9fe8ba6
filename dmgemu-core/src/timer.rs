use crate::cpu::InterruptType;
use crate::memory::ioregisters::{InterruptController, IoRegister};

/// DIV value left by the DMG boot ROM.
const POST_BOOT_DIV: u16 = 0xAC00;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timer {
    div: u16,
    tima: u8,
    tma: u8,
    tac: u8,
}

impl Timer {
    pub fn new() -> Self {
        Self { div: POST_BOOT_DIV, tima: 0x00, tma: 0x00, tac: 0x00 }
    }

    /// Advance one clock cycle. TIMA increments on a falling edge of the DIV bit selected by TAC.
    pub fn tick(&mut self, interrupts: &mut InterruptController) {
        let prev_input = self.timer_input();
        self.div = self.div.wrapping_add(1);
        self.check_falling_edge(prev_input, interrupts);
    }

    /// The DIV bit selected by TAC, ANDed with the TAC enable bit.
    fn timer_input(&self) -> bool {
        let bit = match self.tac & 0x03 {
            0x00 => 9,
            0x01 => 3,
            0x02 => 5,
            _ => 7,
        };

        self.tac & 0x04 != 0 && self.div & (1 << bit) != 0
    }

    fn check_falling_edge(&mut self, prev_input: bool, interrupts: &mut InterruptController) {
        if !prev_input || self.timer_input() {
            return;
        }

        match self.tima.overflowing_add(1) {
            (tima, false) => {
                self.tima = tima;
            }
            (_, true) => {
                self.tima = self.tma;
                interrupts.request(InterruptType::Timer);
            }
        }
    }

    pub fn read_register(&self, register: IoRegister) -> u8 {
        match register {
            IoRegister::DIV => (self.div >> 8) as u8,
            IoRegister::TIMA => self.tima,
            IoRegister::TMA => self.tma,
            IoRegister::TAC => self.tac | 0xF8,
            _ => 0xFF,
        }
    }

    /// Writes to DIV and TAC can drop the timer input and increment TIMA.
    pub fn write_register(
        &mut self,
        register: IoRegister,
        value: u8,
        interrupts: &mut InterruptController,
    ) {
        let prev_input = self.timer_input();

        match register {
            // Any write clears the whole 16-bit divider
            IoRegister::DIV => {
                self.div = 0;
            }
            IoRegister::TIMA => {
                self.tima = value;
            }
            IoRegister::TMA => {
                self.tma = value;
            }
            IoRegister::TAC => {
                self.tac = value & 0x07;
            }
            _ => {}
        }

        self.check_falling_edge(prev_input, interrupts);
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn div_counts_clock_cycles() {
        let mut timer = Timer::new();
        let mut interrupts = InterruptController::new();
        assert_eq!(0xAC, timer.read_register(IoRegister::DIV));

        timer.write_register(IoRegister::DIV, 0x55, &mut interrupts);
        assert_eq!(0x00, timer.read_register(IoRegister::DIV));

        for _ in 0..255 {
            timer.tick(&mut interrupts);
        }
        assert_eq!(0x00, timer.read_register(IoRegister::DIV));

        timer.tick(&mut interrupts);
        assert_eq!(0x01, timer.read_register(IoRegister::DIV));
    }

    #[test]
    fn tima_frequencies() {
        for (tac, period) in [(0x04, 1024), (0x05, 16), (0x06, 64), (0x07, 256)] {
            let mut timer = Timer::new();
            let mut interrupts = InterruptController::new();
            timer.write_register(IoRegister::DIV, 0, &mut interrupts);
            timer.write_register(IoRegister::TAC, tac, &mut interrupts);

            for _ in 0..period - 1 {
                timer.tick(&mut interrupts);
            }
            assert_eq!(0x00, timer.read_register(IoRegister::TIMA), "TAC={tac:02X}");

            timer.tick(&mut interrupts);
            assert_eq!(0x01, timer.read_register(IoRegister::TIMA), "TAC={tac:02X}");

            for _ in 0..period * 3 {
                timer.tick(&mut interrupts);
            }
            assert_eq!(0x04, timer.read_register(IoRegister::TIMA), "TAC={tac:02X}");
        }
    }

    #[test]
    fn tima_disabled() {
        let mut timer = Timer::new();
        let mut interrupts = InterruptController::new();
        timer.write_register(IoRegister::TAC, 0x01, &mut interrupts);

        for _ in 0..1000 {
            timer.tick(&mut interrupts);
        }
        assert_eq!(0x00, timer.read_register(IoRegister::TIMA));
        assert_eq!(0xF9, timer.read_register(IoRegister::TAC));
    }

    #[test]
    fn tima_overflow_reloads_and_interrupts() {
        let mut timer = Timer::new();
        let mut interrupts = InterruptController::new();
        interrupts.write_if(0x00);
        timer.write_register(IoRegister::DIV, 0, &mut interrupts);
        timer.write_register(IoRegister::TAC, 0x05, &mut interrupts);
        timer.write_register(IoRegister::TMA, 0xAB, &mut interrupts);
        timer.write_register(IoRegister::TIMA, 0xFF, &mut interrupts);

        for _ in 0..15 {
            timer.tick(&mut interrupts);
        }
        assert!(!interrupts.is_requested(InterruptType::Timer));

        timer.tick(&mut interrupts);
        assert_eq!(0xAB, timer.read_register(IoRegister::TIMA));
        assert!(interrupts.is_requested(InterruptType::Timer));
    }

    #[test]
    fn div_write_falling_edge_increments_tima() {
        let mut timer = Timer::new();
        let mut interrupts = InterruptController::new();
        timer.write_register(IoRegister::DIV, 0, &mut interrupts);
        timer.write_register(IoRegister::TAC, 0x05, &mut interrupts);

        // Divider bit 3 set
        for _ in 0..8 {
            timer.tick(&mut interrupts);
        }
        assert_eq!(0x00, timer.read_register(IoRegister::TIMA));

        timer.write_register(IoRegister::DIV, 0, &mut interrupts);
        assert_eq!(0x01, timer.read_register(IoRegister::TIMA));

        // Bit 3 clear, no edge
        timer.write_register(IoRegister::DIV, 0, &mut interrupts);
        assert_eq!(0x01, timer.read_register(IoRegister::TIMA));
    }

    #[test]
    fn tac_disable_falling_edge_increments_tima() {
        let mut timer = Timer::new();
        let mut interrupts = InterruptController::new();
        timer.write_register(IoRegister::DIV, 0, &mut interrupts);
        timer.write_register(IoRegister::TAC, 0x05, &mut interrupts);

        for _ in 0..8 {
            timer.tick(&mut interrupts);
        }

        timer.write_register(IoRegister::TAC, 0x01, &mut interrupts);
        assert_eq!(0x01, timer.read_register(IoRegister::TIMA));
    }
}
