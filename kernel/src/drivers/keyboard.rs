//! PS/2 keyboard
//!
//! Scancode set 1 is decoded by `pc-keyboard`; this driver only adds the
//! kernel's own chords (Alt+F1..F3, Ctrl+L) on top of it.

use super::pic;
use super::terminal::TerminalId;
use crate::arch::Port;
use pc_keyboard::{layouts, DecodedKey, HandleControl, KeyCode, KeyEvent, KeyState, ScancodeSet1};

const DATA: Port = Port::new(0x60);
const STATUS: Port = Port::new(0x64);

const OUTPUT_FULL: u8 = 0x01;

pub const IRQ: u8 = 1;

/// What a keystroke asks the kernel to do
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Char(u8),
    Backspace,
    Enter,
    Tab,
    SwitchTerminal(TerminalId),
    ClearScreen,
}

pub struct Keyboard {
    decoder: pc_keyboard::Keyboard<layouts::Us104Key, ScancodeSet1>,
    ctrl: bool,
    alt: bool,
}

impl Keyboard {
    pub fn new() -> Self {
        Self {
            decoder: pc_keyboard::Keyboard::new(ScancodeSet1::new(), layouts::Us104Key, HandleControl::Ignore),
            ctrl: false,
            alt: false,
        }
    }

    pub fn enable() {
        pic::enable_irq(IRQ);
    }

    /// Next byte from the controller, if one is waiting.
    pub fn read_scancode() -> Option<u8> {
        (STATUS.read() & OUTPUT_FULL != 0).then(|| DATA.read())
    }

    /// Feed one scancode byte; returns an action once a key press is complete.
    pub fn feed(&mut self, scancode: u8) -> Option<KeyAction> {
        let event = match self.decoder.add_byte(scancode) {
            Ok(Some(event)) => event,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("[Keyboard] bad scancode {:#x}: {:?}", scancode, e);
                return None;
            }
        };
        self.track_modifiers(&event);
        let chord = self.chord(&event);
        let decoded = self.decoder.process_keyevent(event);
        if chord.is_some() {
            return chord;
        }
        match decoded? {
            DecodedKey::Unicode('\n') => Some(KeyAction::Enter),
            DecodedKey::Unicode('\u{8}') => Some(KeyAction::Backspace),
            DecodedKey::Unicode('\t') => Some(KeyAction::Tab),
            DecodedKey::Unicode(c) if c.is_ascii() && !c.is_ascii_control() => Some(KeyAction::Char(c as u8)),
            _ => None,
        }
    }

    fn track_modifiers(&mut self, event: &KeyEvent) {
        let pressed = event.state != KeyState::Up;
        match event.code {
            KeyCode::LControl | KeyCode::RControl => self.ctrl = pressed,
            KeyCode::LAlt | KeyCode::RAltGr => self.alt = pressed,
            _ => {}
        }
    }

    fn chord(&self, event: &KeyEvent) -> Option<KeyAction> {
        if event.state != KeyState::Down {
            return None;
        }
        match event.code {
            KeyCode::F1 if self.alt => TerminalId::new(0).map(KeyAction::SwitchTerminal),
            KeyCode::F2 if self.alt => TerminalId::new(1).map(KeyAction::SwitchTerminal),
            KeyCode::F3 if self.alt => TerminalId::new(2).map(KeyAction::SwitchTerminal),
            KeyCode::L if self.ctrl => Some(KeyAction::ClearScreen),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(keyboard: &mut Keyboard, scancodes: &[u8]) -> Vec<KeyAction> {
        scancodes.iter().filter_map(|&s| keyboard.feed(s)).collect()
    }

    #[test]
    fn letters_shift_and_enter() {
        let mut keyboard = Keyboard::new();
        // a, LShift down, a, LShift up, Enter
        let actions = feed_all(&mut keyboard, &[0x1E, 0x9E, 0x2A, 0x1E, 0x9E, 0xAA, 0x1C, 0x9C]);
        assert_eq!(actions, vec![KeyAction::Char(b'a'), KeyAction::Char(b'A'), KeyAction::Enter]);
    }

    #[test]
    fn alt_function_keys_switch_terminals() {
        let mut keyboard = Keyboard::new();
        // LAlt down, F2, F2 release, LAlt up, F3 alone
        let actions = feed_all(&mut keyboard, &[0x38, 0x3C, 0xBC, 0xB8, 0x3D, 0xBD]);
        assert_eq!(actions, vec![KeyAction::SwitchTerminal(TerminalId::new(1).unwrap())]);
    }

    #[test]
    fn ctrl_l_clears_and_editing_keys_map() {
        let mut keyboard = Keyboard::new();
        // LCtrl down, L, L up, LCtrl up, Backspace, Tab
        let actions = feed_all(&mut keyboard, &[0x1D, 0x26, 0xA6, 0x9D, 0x0E, 0x8E, 0x0F, 0x8F]);
        assert_eq!(actions, vec![KeyAction::ClearScreen, KeyAction::Backspace, KeyAction::Tab]);
    }
}
