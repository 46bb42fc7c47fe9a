use std::ops::BitOr;

/// Keys the runtime reports to applications.
///
/// Anything else arrives as `Unknown` with the platform key code.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Space,
    Enter,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    F1,
    F2,
    Unknown(u32),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// Set of held mouse buttons.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct MouseButtons(u8);

impl MouseButtons {
    pub const NONE: Self = Self(0);
    pub const LEFT: Self = Self(1);
    pub const RIGHT: Self = Self(1 << 1);
    pub const MIDDLE: Self = Self(1 << 2);

    pub fn contains(self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for MouseButtons {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Platform-agnostic input events, positions in physical pixels.
///
/// Button events carry the full set of buttons held *after* the change.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InputEvent {
    MouseDown { buttons: MouseButtons, x: f32, y: f32 },
    MouseUp { buttons: MouseButtons, x: f32, y: f32 },
    MouseMove { buttons: MouseButtons, x: f32, y: f32 },
    Key { key: Key, state: KeyState },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_tracks_held_buttons() {
        let mut held = MouseButtons::NONE;
        held.insert(MouseButtons::LEFT);
        held.insert(MouseButtons::RIGHT);
        assert!(held.contains(MouseButtons::LEFT | MouseButtons::RIGHT));

        held.remove(MouseButtons::LEFT);
        assert!(!held.contains(MouseButtons::LEFT));
        assert!(!held.contains(MouseButtons::NONE));
        held.remove(MouseButtons::RIGHT);
        assert!(held.is_empty());
    }
}
