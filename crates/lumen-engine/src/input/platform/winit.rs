use winit::event::{ElementState, MouseButton as WinitMouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::input::{InputEvent, InputState, Key, KeyState, MouseButtons};

/// Translates a winit `WindowEvent` into an engine `InputEvent`, updating
/// `state` on the way.
///
/// Returns `None` for events not represented by the input subsystem.
pub fn translate_window_event(state: &mut InputState, event: &WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::CursorMoved { position, .. } => {
            Some(state.moved(position.x as f32, position.y as f32))
        }

        WindowEvent::MouseInput { state: st, button, .. } => {
            let button = map_mouse_button(*button)?;
            Some(match st {
                ElementState::Pressed => state.press(button),
                ElementState::Released => state.release(button),
            })
        }

        WindowEvent::KeyboardInput { event, .. } if !event.repeat => {
            let st = match event.state {
                ElementState::Pressed => KeyState::Pressed,
                ElementState::Released => KeyState::Released,
            };
            Some(InputEvent::Key {
                key: map_key(event.physical_key),
                state: st,
            })
        }

        _ => None,
    }
}

fn map_mouse_button(b: WinitMouseButton) -> Option<MouseButtons> {
    match b {
        WinitMouseButton::Left => Some(MouseButtons::LEFT),
        WinitMouseButton::Right => Some(MouseButtons::RIGHT),
        WinitMouseButton::Middle => Some(MouseButtons::MIDDLE),
        _ => None,
    }
}

fn map_key(pk: PhysicalKey) -> Key {
    match pk {
        PhysicalKey::Code(code) => match code {
            KeyCode::Escape => Key::Escape,
            KeyCode::Space => Key::Space,
            KeyCode::Enter => Key::Enter,
            KeyCode::Digit1 => Key::Digit1,
            KeyCode::Digit2 => Key::Digit2,
            KeyCode::Digit3 => Key::Digit3,
            KeyCode::Digit4 => Key::Digit4,
            KeyCode::F1 => Key::F1,
            KeyCode::F2 => Key::F2,
            other => Key::Unknown(other as u32),
        },
        // NativeKeyCode has no stable numeric form in winit 0.30.
        PhysicalKey::Unidentified(_) => Key::Unknown(0),
    }
}
