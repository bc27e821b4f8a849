use crate::config::SelectPolarity;
use serde::{Deserialize, Serialize};

/// Selector bit for the direction group (group 0).
pub const DIRECTIONS_SELECT_BIT: u8 = 0x10;
/// Selector bit for the action button group (group 1).
pub const ACTIONS_SELECT_BIT: u8 = 0x20;

const SELECTOR_MASK: u8 = DIRECTIONS_SELECT_BIT | ACTIONS_SELECT_BIT;

// Bits 6-7 are not connected and always read 1
const UNUSED_BITS: u8 = 0xC0;

const RELEASED_NIBBLE: u8 = 0x0F;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Up,
    Down,
    Left,
    Right,
    A,
    B,
    Start,
    Select,
}

/// Pressed/released state of every button, as tracked by the input-polling side of the
/// emulator. `true` means pressed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoypadState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub a: bool,
    pub b: bool,
    pub start: bool,
    pub select: bool,
}

impl JoypadState {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_field_mut(&mut self, button: Button) -> &mut bool {
        match button {
            Button::Up => &mut self.up,
            Button::Down => &mut self.down,
            Button::Left => &mut self.left,
            Button::Right => &mut self.right,
            Button::A => &mut self.a,
            Button::B => &mut self.b,
            Button::Start => &mut self.start,
            Button::Select => &mut self.select,
        }
    }

    pub fn set(&mut self, button: Button, pressed: bool) {
        *self.get_field_mut(button) = pressed;
        log::debug!("{button:?} pressed={pressed}, current state: {self:?}");
    }

    /// Convert to the active-low line levels the input matrix multiplexes.
    pub fn to_lines(&self) -> ButtonLines {
        ButtonLines {
            directions: active_low_nibble([self.right, self.left, self.up, self.down]),
            actions: active_low_nibble([self.a, self.b, self.select, self.start]),
        }
    }
}

fn active_low_nibble(pressed: [bool; 4]) -> u8 {
    pressed
        .iter()
        .enumerate()
        .fold(RELEASED_NIBBLE, |nibble, (bit, &pressed)| {
            if pressed {
                nibble & !(1 << bit)
            } else {
                nibble
            }
        })
}

/// Live levels of the two 4-bit button groups. A 0 bit means the button is pressed.
///
/// Directions: bit 0 = right, bit 1 = left, bit 2 = up, bit 3 = down.
/// Actions: bit 0 = A, bit 1 = B, bit 2 = select, bit 3 = start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonLines {
    pub directions: u8,
    pub actions: u8,
}

impl ButtonLines {
    pub fn new(directions: u8, actions: u8) -> Self {
        Self {
            directions: directions & RELEASED_NIBBLE,
            actions: actions & RELEASED_NIBBLE,
        }
    }
}

impl Default for ButtonLines {
    fn default() -> Self {
        Self::new(RELEASED_NIBBLE, RELEASED_NIBBLE)
    }
}

fn is_selected(selector: u8, bit: u8, polarity: SelectPolarity) -> bool {
    match polarity {
        SelectPolarity::ActiveHigh => selector & bit != 0,
        SelectPolarity::ActiveLow => selector & bit == 0,
    }
}

/// Only the two selector bits of a JOYP write are stored.
pub fn selector_bits(value: u8) -> u8 {
    value & SELECTOR_MASK
}

/// Compute the value the CPU reads from JOYP given the stored selector bits and the live button
/// lines. If both groups are selected their lines are wire-ANDed; if neither is, every line
/// reads released.
pub fn read_joyp(selector: u8, lines: ButtonLines, polarity: SelectPolarity) -> u8 {
    let selector = selector_bits(selector);

    let mut nibble = RELEASED_NIBBLE;
    if is_selected(selector, DIRECTIONS_SELECT_BIT, polarity) {
        nibble &= lines.directions;
    }
    if is_selected(selector, ACTIONS_SELECT_BIT, polarity) {
        nibble &= lines.actions;
    }

    UNUSED_BITS | selector | (nibble & RELEASED_NIBBLE)
}

/// A joypad interrupt is requested whenever any of the low 4 JOYP bits goes from 1 to 0.
pub fn should_flag_interrupt(old_joyp: u8, new_joyp: u8) -> bool {
    for bit in [0x01, 0x02, 0x04, 0x08] {
        if old_joyp & bit != 0 && new_joyp & bit == 0 {
            return true;
        }
    }
    false
}
