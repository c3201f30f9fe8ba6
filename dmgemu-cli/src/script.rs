use crate::config::InputEvent;
use dmgemu_core::{Button, SharedState};
use std::collections::HashSet;

/// Replays scripted button presses against the shared button state as frames complete.
pub struct InputScript {
    events: Vec<InputEvent>,
    pressed: HashSet<Button>,
}

impl InputScript {
    pub fn new(events: Vec<InputEvent>) -> Self {
        Self { events, pressed: HashSet::new() }
    }

    /// Press or release buttons so that exactly the buttons with an event covering `frame` are
    /// held. Only transitions are written to `shared`.
    pub fn update(&mut self, frame: u32, shared: &SharedState) {
        for button in Button::ALL {
            let should_press =
                self.events.iter().any(|event| event.button == button && event.is_active(frame));

            if should_press != self.pressed.contains(&button) {
                shared.set_button(button, should_press);
                if should_press {
                    self.pressed.insert(button);
                } else {
                    self.pressed.remove(&button);
                }
            }
        }
    }
}
