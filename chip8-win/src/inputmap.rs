use std::collections::VecDeque;

use chip8::{Input, KeyCode, KeyEvent, Poll};
use serde::Deserialize;
use smol_str::SmolStr;
use winit::event::{ElementState, VirtualKeyCode};

use crate::{actions::EXIT, error::AppError};

/// Key map shipped with the application.
static DEFAULT_KEYMAP: &str = include_str!("keymap.yaml");

/// Input mapper
///
/// Maps user input events to either Chip8 keycodes (suitable to be used in the VM),
/// or application specific named actions.
///
/// - *Chip8 Keycode*: These are the 16 keys of the old COSMAC VIP computer.
///   Stored in 8-bit integers and suitable to be passed to the virtual machine.
/// - *Named Action*: These are application specific input events that are
///   identified by a readable string.
///
/// Events are buffered as the windowing system delivers them, and handed
/// to the run loop when it polls.
#[derive(Debug)]
pub struct InputMap {
    /// Mapping of host keyboard keys to their meaning.
    keys: Box<[(VirtualKeyCode, InputKind)]>,
    /// Buffer of collected keypad events, as they happen.
    events: VecDeque<KeyEvent>,
    /// Set once the user asks to leave. Never cleared.
    quit: bool,
}

#[derive(Debug, Deserialize)]
struct InputDef {
    chip8: Option<KeyCode>,
    action: Option<SmolStr>,
    keyboard_keys: Option<Vec<VirtualKeyCode>>,
}

impl InputDef {
    fn kind(&self) -> Option<InputKind> {
        if let Some(key_code) = self.chip8 {
            Some(InputKind::Chip8(key_code))
        } else {
            self.action.clone().map(InputKind::Action)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind {
    Action(SmolStr),
    Chip8(KeyCode),
}

impl InputMap {
    /// Build the input map from the bundled key map.
    pub fn new() -> Result<Self, AppError> {
        Self::from_yaml(DEFAULT_KEYMAP)
    }

    /// Build the input map from a YAML list of input definitions.
    pub fn from_yaml(source: &str) -> Result<Self, AppError> {
        let defs: Vec<InputDef> = serde_yaml::from_str(source)?;
        log::debug!("loaded input definitions: {:#?}", defs);

        Ok(InputMap {
            keys: Self::build_keys(&defs),
            events: VecDeque::new(),
            quit: false,
        })
    }

    /// Flatten the definitions into one entry per keyboard key.
    fn build_keys(defs: &[InputDef]) -> Box<[(VirtualKeyCode, InputKind)]> {
        defs.iter()
            // lift the meaning and keycodes out of the definitions
            .filter_map(|def| Some((def.kind()?, def.keyboard_keys.as_ref()?)))
            // flatten borrowed keycodes into one iterator of copied keycodes
            .flat_map(|(kind, keys)| keys.iter().map(move |keycode| (*keycode, kind.clone())))
            .collect::<Vec<(VirtualKeyCode, InputKind)>>()
            .into_boxed_slice()
    }

    /// Given a user input keycode, map it to either a Chip8 key, or a named action.
    pub fn map_key(&self, key: VirtualKeyCode) -> Option<&InputKind> {
        self.keys
            .iter()
            .find(|(keycode, _)| *keycode == key)
            .map(|(_, kind)| kind)
    }

    /// Push key event into the input state.
    pub fn push_key(&mut self, keycode: VirtualKeyCode, state: ElementState) {
        let pressed = state == ElementState::Pressed;

        // Convert `winit` key to our input framework
        match self.map_key(keycode) {
            Some(InputKind::Chip8(key)) => {
                let key = *key;
                self.events.push_back(KeyEvent { key, pressed });
            }
            Some(InputKind::Action(name)) => {
                if pressed && name == EXIT {
                    log::info!("exit");
                    self.quit = true;
                }
            }
            None => {
                log::trace!("no input mapping for {keycode:?}");
            }
        }
    }

    /// Signal the run loop to stop, for example when the window is closed.
    pub fn request_quit(&mut self) {
        self.quit = true;
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = KeyEvent> + '_ {
        self.events.drain(..)
    }
}

impl Input for InputMap {
    fn poll(&mut self) -> Poll {
        Poll {
            events: self.drain_events().collect(),
            quit: self.quit,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_keymap() {
        let map = InputMap::new().unwrap();

        let expected = [
            (VirtualKeyCode::X, KeyCode::Key0),
            (VirtualKeyCode::Key1, KeyCode::Key1),
            (VirtualKeyCode::Key2, KeyCode::Key2),
            (VirtualKeyCode::Key3, KeyCode::Key3),
            (VirtualKeyCode::Q, KeyCode::Key4),
            (VirtualKeyCode::W, KeyCode::Key5),
            (VirtualKeyCode::E, KeyCode::Key6),
            (VirtualKeyCode::A, KeyCode::Key7),
            (VirtualKeyCode::S, KeyCode::Key8),
            (VirtualKeyCode::D, KeyCode::Key9),
            (VirtualKeyCode::Z, KeyCode::KeyA),
            (VirtualKeyCode::C, KeyCode::KeyB),
            (VirtualKeyCode::Key4, KeyCode::KeyC),
            (VirtualKeyCode::R, KeyCode::KeyD),
            (VirtualKeyCode::F, KeyCode::KeyE),
            (VirtualKeyCode::V, KeyCode::KeyF),
        ];
        for (vk, key) in expected {
            assert_eq!(map.map_key(vk), Some(&InputKind::Chip8(key)), "{vk:?}");
        }

        assert_eq!(
            map.map_key(VirtualKeyCode::Escape),
            Some(&InputKind::Action(SmolStr::new(EXIT)))
        );
        assert_eq!(map.map_key(VirtualKeyCode::Space), None);
    }

    #[test]
    fn test_poll_drains_events() {
        let mut map = InputMap::new().unwrap();

        map.push_key(VirtualKeyCode::W, ElementState::Pressed);
        map.push_key(VirtualKeyCode::Space, ElementState::Pressed);
        map.push_key(VirtualKeyCode::W, ElementState::Released);

        let poll = map.poll();
        assert_eq!(
            poll.events,
            [KeyEvent::down(KeyCode::Key5), KeyEvent::up(KeyCode::Key5)]
        );
        assert!(!poll.quit);
        assert_eq!(map.poll(), Poll::default());
    }

    #[test]
    fn test_exit_action_quits() {
        let mut map = InputMap::new().unwrap();

        map.push_key(VirtualKeyCode::Escape, ElementState::Released);
        assert!(!map.poll().quit);

        map.push_key(VirtualKeyCode::Escape, ElementState::Pressed);
        assert!(map.poll().quit);
        // stays set
        assert!(map.poll().quit);
    }

    #[test]
    fn test_invalid_keymap() {
        let source = "- chip8: 16\n  keyboard_keys: [X]\n";
        assert!(InputMap::from_yaml(source).is_err());
    }
}
