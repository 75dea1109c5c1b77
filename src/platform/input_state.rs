use std::collections::HashSet;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Default)]
pub struct InputState {
    pub held_keys: HashSet<KeyCode>,
    pub close_requested: bool,
    pub focused: bool,
}

impl InputState {
    pub fn process_window_events(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput {
                event: KeyEvent {
                    physical_key: PhysicalKey::Code(code),
                    state,
                    ..
                },
                ..
            } => {
                self.record_key(*code, *state);
            }
            WindowEvent::CloseRequested => {
                self.close_requested = true;
            }
            WindowEvent::Focused(focused) => {
                self.focused = *focused;
                // Releases that happen while unfocused never reach us
                if !focused {
                    self.held_keys.clear();
                }
            }
            _ => {}
        }
    }

    pub fn record_key(&mut self, code: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                self.held_keys.insert(code);
            }
            ElementState::Released => {
                self.held_keys.remove(&code);
            }
        }
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.held_keys.contains(&code)
    }
}
