use super::{InputEvent, MouseButtons};

/// Pointer state accumulated from platform events.
#[derive(Debug, Default, Clone)]
pub struct InputState {
    pub buttons: MouseButtons,
    pub pointer: (f32, f32),
}

impl InputState {
    /// Updates the held buttons / pointer and builds the matching event.
    pub fn press(&mut self, button: MouseButtons) -> InputEvent {
        self.buttons.insert(button);
        let (x, y) = self.pointer;
        InputEvent::MouseDown {
            buttons: self.buttons,
            x,
            y,
        }
    }

    pub fn release(&mut self, button: MouseButtons) -> InputEvent {
        self.buttons.remove(button);
        let (x, y) = self.pointer;
        InputEvent::MouseUp {
            buttons: self.buttons,
            x,
            y,
        }
    }

    pub fn moved(&mut self, x: f32, y: f32) -> InputEvent {
        self.pointer = (x, y);
        InputEvent::MouseMove {
            buttons: self.buttons,
            x,
            y,
        }
    }
}
