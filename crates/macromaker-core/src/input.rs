//! Keyboard and mouse input model
//!
//! Events are compact serde values so they can be written one per line.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Common key codes (macOS virtual key numbering)
pub mod key_codes {
    pub const A: u16 = 0;
    pub const S: u16 = 1;
    pub const D: u16 = 2;
    pub const F: u16 = 3;
    pub const H: u16 = 4;
    pub const G: u16 = 5;
    pub const Z: u16 = 6;
    pub const X: u16 = 7;
    pub const C: u16 = 8;
    pub const V: u16 = 9;
    pub const B: u16 = 11;
    pub const Q: u16 = 12;
    pub const W: u16 = 13;
    pub const E: u16 = 14;
    pub const R: u16 = 15;
    pub const Y: u16 = 16;
    pub const T: u16 = 17;
    pub const KEY_1: u16 = 18;
    pub const KEY_2: u16 = 19;
    pub const KEY_3: u16 = 20;
    pub const KEY_4: u16 = 21;
    pub const KEY_6: u16 = 22;
    pub const KEY_5: u16 = 23;
    pub const KEY_9: u16 = 25;
    pub const KEY_7: u16 = 26;
    pub const KEY_8: u16 = 28;
    pub const KEY_0: u16 = 29;
    pub const O: u16 = 31;
    pub const U: u16 = 32;
    pub const I: u16 = 34;
    pub const P: u16 = 35;
    pub const RETURN: u16 = 36;
    pub const L: u16 = 37;
    pub const J: u16 = 38;
    pub const K: u16 = 40;
    pub const N: u16 = 45;
    pub const M: u16 = 46;
    pub const TAB: u16 = 48;
    pub const SPACE: u16 = 49;
    pub const DELETE: u16 = 51;
    pub const ESCAPE: u16 = 53;
    pub const COMMAND: u16 = 55;
    pub const SHIFT: u16 = 56;
    pub const CAPS_LOCK: u16 = 57;
    pub const OPTION: u16 = 58;
    pub const CONTROL: u16 = 59;
    pub const F5: u16 = 96;
    pub const F6: u16 = 97;
    pub const F7: u16 = 98;
    pub const F3: u16 = 99;
    pub const F8: u16 = 100;
    pub const F9: u16 = 101;
    pub const F11: u16 = 103;
    pub const F10: u16 = 109;
    pub const F12: u16 = 111;
    pub const HOME: u16 = 115;
    pub const PAGE_UP: u16 = 116;
    pub const F4: u16 = 118;
    pub const END: u16 = 119;
    pub const F2: u16 = 120;
    pub const PAGE_DOWN: u16 = 121;
    pub const F1: u16 = 122;
    pub const ARROW_LEFT: u16 = 123;
    pub const ARROW_RIGHT: u16 = 124;
    pub const ARROW_DOWN: u16 = 125;
    pub const ARROW_UP: u16 = 126;
}

use key_codes as kc;

/// Display name and code for every named key. First name wins for display.
const KEY_NAMES: &[(&str, u16)] = &[
    ("Ctrl", kc::CONTROL),
    ("Alt", kc::OPTION),
    ("Shift", kc::SHIFT),
    ("Cmd", kc::COMMAND),
    ("A", kc::A),
    ("B", kc::B),
    ("C", kc::C),
    ("D", kc::D),
    ("E", kc::E),
    ("F", kc::F),
    ("G", kc::G),
    ("H", kc::H),
    ("I", kc::I),
    ("J", kc::J),
    ("K", kc::K),
    ("L", kc::L),
    ("M", kc::M),
    ("N", kc::N),
    ("O", kc::O),
    ("P", kc::P),
    ("Q", kc::Q),
    ("R", kc::R),
    ("S", kc::S),
    ("T", kc::T),
    ("U", kc::U),
    ("V", kc::V),
    ("W", kc::W),
    ("X", kc::X),
    ("Y", kc::Y),
    ("Z", kc::Z),
    ("0", kc::KEY_0),
    ("1", kc::KEY_1),
    ("2", kc::KEY_2),
    ("3", kc::KEY_3),
    ("4", kc::KEY_4),
    ("5", kc::KEY_5),
    ("6", kc::KEY_6),
    ("7", kc::KEY_7),
    ("8", kc::KEY_8),
    ("9", kc::KEY_9),
    ("Enter", kc::RETURN),
    ("Tab", kc::TAB),
    ("Space", kc::SPACE),
    ("Backspace", kc::DELETE),
    ("Escape", kc::ESCAPE),
    ("CapsLock", kc::CAPS_LOCK),
    ("F1", kc::F1),
    ("F2", kc::F2),
    ("F3", kc::F3),
    ("F4", kc::F4),
    ("F5", kc::F5),
    ("F6", kc::F6),
    ("F7", kc::F7),
    ("F8", kc::F8),
    ("F9", kc::F9),
    ("F10", kc::F10),
    ("F11", kc::F11),
    ("F12", kc::F12),
    ("Home", kc::HOME),
    ("End", kc::END),
    ("PageUp", kc::PAGE_UP),
    ("PageDown", kc::PAGE_DOWN),
    ("Left", kc::ARROW_LEFT),
    ("Right", kc::ARROW_RIGHT),
    ("Down", kc::ARROW_DOWN),
    ("Up", kc::ARROW_UP),
];

/// A device-level key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub const CTRL: KeyCode = KeyCode(kc::CONTROL);
    pub const ALT: KeyCode = KeyCode(kc::OPTION);
    pub const SHIFT: KeyCode = KeyCode(kc::SHIFT);
    pub const CMD: KeyCode = KeyCode(kc::COMMAND);

    /// Look up a key by human name (`"ctrl"`, `"r"`, `"f5"`, `"#42"`).
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        if let Some(raw) = lower.strip_prefix('#') {
            return raw.parse().ok().map(KeyCode);
        }
        let canonical = match lower.as_str() {
            "control" => "ctrl",
            "option" | "opt" => "alt",
            "command" | "super" | "meta" | "win" => "cmd",
            "return" => "enter",
            "esc" => "escape",
            "delete" => "backspace",
            "arrowup" => "up",
            "arrowdown" => "down",
            "arrowleft" => "left",
            "arrowright" => "right",
            other => other,
        };
        KEY_NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(canonical))
            .map(|&(_, code)| KeyCode(code))
    }

    pub fn name(&self) -> Option<&'static str> {
        KEY_NAMES.iter().find(|&&(_, code)| code == self.0).map(|&(n, _)| n)
    }

    pub fn is_modifier(&self) -> bool {
        matches!(*self, Self::CTRL | Self::ALT | Self::SHIFT | Self::CMD)
    }

    /// Sort key that puts modifiers first (Ctrl, Alt, Shift, Cmd), then the rest by code.
    pub(crate) fn display_rank(&self) -> (u8, u16) {
        match *self {
            Self::CTRL => (0, 0),
            Self::ALT => (0, 1),
            Self::SHIFT => (0, 2),
            Self::CMD => (0, 3),
            other => (1, other.0),
        }
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "#{}", self.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Concrete input payload carried by a recorded action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "e")]
pub enum InputEvent {
    #[serde(rename = "kp")]
    KeyPress {
        #[serde(rename = "k")]
        key: KeyCode,
    },

    #[serde(rename = "kr")]
    KeyRelease {
        #[serde(rename = "k")]
        key: KeyCode,
    },

    /// Absolute pointer position in screen coordinates
    #[serde(rename = "m")]
    MouseMove { x: i32, y: i32 },

    #[serde(rename = "mp")]
    MousePress {
        #[serde(rename = "b")]
        button: MouseButton,
    },

    #[serde(rename = "mr")]
    MouseRelease {
        #[serde(rename = "b")]
        button: MouseButton,
    },

    /// Wheel rotation in notches, positive is down
    #[serde(rename = "s")]
    Scroll {
        #[serde(rename = "n")]
        amount: i32,
    },
}

impl InputEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::KeyPress { .. } => "key_press",
            Self::KeyRelease { .. } => "key_release",
            Self::MouseMove { .. } => "mouse_move",
            Self::MousePress { .. } => "mouse_press",
            Self::MouseRelease { .. } => "mouse_release",
            Self::Scroll { .. } => "scroll",
        }
    }
}

/// An event as delivered by an event source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Milliseconds on the source's clock
    #[serde(rename = "at")]
    pub time_ms: u64,
    #[serde(flatten)]
    pub event: InputEvent,
}

impl RawEvent {
    pub fn new(time_ms: u64, event: InputEvent) -> Self {
        Self { time_ms, event }
    }

    pub fn key_press(time_ms: u64, key: KeyCode) -> Self {
        Self::new(time_ms, InputEvent::KeyPress { key })
    }

    pub fn key_release(time_ms: u64, key: KeyCode) -> Self {
        Self::new(time_ms, InputEvent::KeyRelease { key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names_and_aliases() {
        assert_eq!(KeyCode::from_name("ctrl"), Some(KeyCode::CTRL));
        assert_eq!(KeyCode::from_name("Control"), Some(KeyCode::CTRL));
        assert_eq!(KeyCode::from_name("option"), Some(KeyCode::ALT));
        assert_eq!(KeyCode::from_name("Command"), Some(KeyCode::CMD));
        assert_eq!(KeyCode::from_name("r"), Some(KeyCode(kc::R)));
        assert_eq!(KeyCode::from_name("F5"), Some(KeyCode(kc::F5)));
        assert_eq!(KeyCode::from_name("return"), Some(KeyCode(kc::RETURN)));
        assert_eq!(KeyCode::from_name("#200"), Some(KeyCode(200)));
        assert_eq!(KeyCode::from_name("hyper"), None);
    }

    #[test]
    fn display_falls_back_to_raw_code() {
        assert_eq!(KeyCode(kc::P).to_string(), "P");
        assert_eq!(KeyCode::CMD.to_string(), "Cmd");
        assert_eq!(KeyCode(200).to_string(), "#200");
        assert_eq!(KeyCode::from_name(&KeyCode(200).to_string()), Some(KeyCode(200)));
    }

    #[test]
    fn raw_event_wire_shape() {
        let e = RawEvent::key_press(120, KeyCode(kc::R));
        let json = serde_json::to_string(&e).unwrap();
        assert_eq!(json, r#"{"at":120,"e":"kp","k":15}"#);

        let back: RawEvent = serde_json::from_str(r#"{"at":5,"e":"mp","b":"right"}"#).unwrap();
        assert_eq!(
            back,
            RawEvent::new(5, InputEvent::MousePress { button: MouseButton::Right })
        );
    }
}
