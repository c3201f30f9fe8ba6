use dmgemu_proc_macros::{EnumDisplay, EnumFromStr, StrDeserialize};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumDisplay, EnumFromStr, StrDeserialize)]
pub enum Button {
    Start,
    Select,
    A,
    B,
    Up,
    Down,
    Left,
    Right,
}

impl Button {
    pub const ALL: [Self; 8] = [
        Self::Start,
        Self::Select,
        Self::A,
        Self::B,
        Self::Up,
        Self::Down,
        Self::Left,
        Self::Right,
    ];

    fn mask(self) -> u8 {
        match self {
            Self::Start => 1 << 0,
            Self::Select => 1 << 1,
            Self::A => 1 << 2,
            Self::B => 1 << 3,
            Self::Up => 1 << 4,
            Self::Down => 1 << 5,
            Self::Left => 1 << 6,
            Self::Right => 1 << 7,
        }
    }
}

/// Pressed/released state of all eight buttons. Written by the frontend thread and read by the
/// gamepad latch on the emulation thread.
#[derive(Debug, Default)]
pub struct ButtonState(AtomicU8);

impl ButtonState {
    pub fn set(&self, button: Button, pressed: bool) {
        if pressed {
            self.0.fetch_or(button.mask(), Ordering::Relaxed);
        } else {
            self.0.fetch_and(!button.mask(), Ordering::Relaxed);
        }

        log::debug!("{button} {}", if pressed { "pressed" } else { "released" });
    }

    pub fn is_pressed(&self, button: Button) -> bool {
        self.0.load(Ordering::Relaxed) & button.mask() != 0
    }
}

/// The JOYP register. Bits 4 and 5 select the d-pad and the action buttons respectively, with 0
/// meaning selected; bits 0-3 read back 0 for pressed buttons in the selected groups.
#[derive(Debug)]
pub struct Gamepad {
    buttons: Arc<ButtonState>,
    actions_deselected: bool,
    directions_deselected: bool,
}

impl Gamepad {
    pub fn new(buttons: Arc<ButtonState>) -> Self {
        Self { buttons, actions_deselected: false, directions_deselected: false }
    }

    pub fn write(&mut self, value: u8) {
        self.actions_deselected = value & 0x20 != 0;
        self.directions_deselected = value & 0x10 != 0;
    }

    pub fn read(&self) -> u8 {
        let mut output = 0xCF;

        let mut clear_if_pressed = |button: Button, bit: u8| {
            if self.buttons.is_pressed(button) {
                output &= !(1 << bit);
            }
        };

        if !self.actions_deselected {
            clear_if_pressed(Button::Start, 3);
            clear_if_pressed(Button::Select, 2);
            clear_if_pressed(Button::B, 1);
            clear_if_pressed(Button::A, 0);
        }

        if !self.directions_deselected {
            clear_if_pressed(Button::Down, 3);
            clear_if_pressed(Button::Up, 2);
            clear_if_pressed(Button::Left, 1);
            clear_if_pressed(Button::Right, 0);
        }

        output
    }
}
