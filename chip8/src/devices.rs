//! IO device interface
use crate::{constants::*, display::Chip8DisplayBuffer};

/// Hooks to provide IO devices to the virtual machine run loop.
///
/// The machine never calls into a device while an instruction is executing.
pub trait Devices {
    /// Update the keypad with the current input state.
    ///
    /// Returning `false` signals the run loop to stop.
    fn poll(&mut self, keypad: &mut Keypad) -> bool;

    /// Blit the display buffer to screen output.
    fn draw(&mut self, display: Chip8DisplayBuffer<'_>);

    /// Turn the sound buzzer on or off.
    fn buzz(&mut self, state: bool);
}

/// Pressed state of the 16 key hexadecimal keypad.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Keypad {
    /// Pressed is a 1 bit, released is a 0 bit.
    state: u16,
}

impl Keypad {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn set_key(&mut self, key: KeyCode, pressed: bool) {
        let mask: u16 = 1 << key.as_u8();
        if pressed {
            self.state |= mask;
        } else {
            self.state &= !mask;
        }
    }

    /// Checks whether the given key id is pressed.
    ///
    /// Ids outside the keypad are never pressed.
    #[inline]
    pub fn is_key_down(&self, key_id: u8) -> bool {
        if key_id < KEY_COUNT {
            self.state & (1 << key_id) > 0
        } else {
            false
        }
    }

    /// Check whether any key is pressed down.
    #[inline(always)]
    pub fn any_key(&self) -> bool {
        self.state > 0
    }

    /// Retrieve the value of the first key that is pressed down.
    #[inline]
    pub fn first_key(&self) -> Option<u8> {
        if self.any_key() {
            Some(self.state.trailing_zeros() as u8)
        } else {
            None
        }
    }

    /// Clear the keyboard input state, setting all keys to up.
    #[inline(always)]
    pub fn clear(&mut self) {
        self.state = 0;
    }

    #[inline(always)]
    pub fn bits(&self) -> u16 {
        self.state
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum KeyCode {
    Key0 = 0,
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,
    KeyA,
    KeyB,
    KeyC,
    KeyD,
    KeyE,
    KeyF = 0xF,
}

impl KeyCode {
    pub const ALL: [KeyCode; KEY_COUNT as usize] = [
        Self::Key0,
        Self::Key1,
        Self::Key2,
        Self::Key3,
        Self::Key4,
        Self::Key5,
        Self::Key6,
        Self::Key7,
        Self::Key8,
        Self::Key9,
        Self::KeyA,
        Self::KeyB,
        Self::KeyC,
        Self::KeyD,
        Self::KeyE,
        Self::KeyF,
    ];

    #[inline(always)]
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

impl std::fmt::Display for KeyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let key_id = self.as_u8();
        write!(f, "k{key_id:x}")
    }
}

impl From<KeyCode> for u8 {
    fn from(keycode: KeyCode) -> Self {
        keycode.as_u8()
    }
}

impl TryFrom<u8> for KeyCode {
    type Error = InvalidKeyCode;

    fn try_from(key_id: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(key_id as usize)
            .copied()
            .ok_or(InvalidKeyCode)
    }
}

#[derive(Debug)]
pub struct InvalidKeyCode;

impl std::error::Error for InvalidKeyCode {}

impl std::fmt::Display for InvalidKeyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "keycode must be in range 0 <= keycode < 16")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_key_state() {
        let mut keypad = Keypad::default();

        keypad.set_key(KeyCode::Key0, true);
        assert_eq!(keypad.bits(), 0b00000000_00000001);
        assert!(keypad.is_key_down(0));
        assert!(!keypad.is_key_down(1));
        assert!(!keypad.is_key_down(7));

        keypad.set_key(KeyCode::Key7, true);
        assert_eq!(keypad.bits(), 0b00000000_10000001);
        assert!(keypad.is_key_down(0));
        assert!(!keypad.is_key_down(1));
        assert!(keypad.is_key_down(7));

        keypad.set_key(KeyCode::Key0, false);
        assert_eq!(keypad.bits(), 0b00000000_10000000);
        assert!(!keypad.is_key_down(0));
        assert!(!keypad.is_key_down(1));
        assert!(keypad.is_key_down(7));

        keypad.set_key(KeyCode::KeyF, true);
        assert_eq!(keypad.bits(), 0b10000000_10000000);
        assert!(keypad.is_key_down(7));
        assert!(keypad.is_key_down(15));

        // Out of range ids are never down.
        assert!(!keypad.is_key_down(16));
        assert!(!keypad.is_key_down(0xFF));
    }

    #[test]
    fn test_first_key() {
        let mut keypad = Keypad::new();
        assert_eq!(keypad.first_key(), None);

        keypad.set_key(KeyCode::KeyC, true);
        keypad.set_key(KeyCode::Key5, true);
        assert_eq!(keypad.first_key(), Some(5));

        keypad.clear();
        assert!(!keypad.any_key());
    }

    #[test]
    fn test_keycode_conversion() {
        for id in 0..KEY_COUNT {
            let key = KeyCode::try_from(id).unwrap();
            assert_eq!(u8::from(key), id);
        }
        assert!(KeyCode::try_from(KEY_COUNT).is_err());
        assert_eq!(KeyCode::KeyA.to_string(), "ka");
    }
}
