//! Buttons and the per-frame input mask.

use std::fmt;

/// Logical button on the Game Boy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    A,
    B,
    Select,
    Start,
    Right,
    Left,
    Up,
    Down,
}

impl Button {
    /// All eight buttons, in bit order.
    pub const ALL: [Self; 8] = [
        Self::A,
        Self::B,
        Self::Select,
        Self::Start,
        Self::Right,
        Self::Left,
        Self::Up,
        Self::Down,
    ];

    /// Return the bit position for this button in the input mask.
    ///
    /// Bits 0-3 are the action group (A, B, Select, Start), bits 4-7 the
    /// direction group (Right, Left, Up, Down), mirroring the P1 register's
    /// two nybbles.
    #[must_use]
    pub const fn bit(self) -> u8 {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::Select => 2,
            Self::Start => 3,
            Self::Right => 4,
            Self::Left => 5,
            Self::Up => 6,
            Self::Down => 7,
        }
    }

    /// Lowercase button name, as used in command names.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::A => "a",
            Self::B => "b",
            Self::Select => "select",
            Self::Start => "start",
            Self::Right => "right",
            Self::Left => "left",
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Input mask for one frame step: one bit per [`Button`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputState(u8);

impl InputState {
    /// No buttons held.
    pub const NONE: Self = Self(0);

    /// Mask with a single button held.
    #[must_use]
    pub const fn pressing(button: Button) -> Self {
        Self(1 << button.bit())
    }

    /// Add a held button to the mask.
    #[must_use]
    pub const fn with(self, button: Button) -> Self {
        Self(self.0 | (1 << button.bit()))
    }

    /// Whether the given button is held in this mask.
    #[must_use]
    pub const fn contains(self, button: Button) -> bool {
        self.0 & (1 << button.bit()) != 0
    }

    /// Whether no buttons are held.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Raw mask bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl From<Button> for InputState {
    fn from(button: Button) -> Self {
        Self::pressing(button)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_bits_are_distinct() {
        let mut seen = 0u8;
        for button in Button::ALL {
            let bit = 1 << button.bit();
            assert_eq!(seen & bit, 0, "duplicate bit for {button}");
            seen |= bit;
        }
        assert_eq!(seen, 0xFF);
    }

    #[test]
    fn mask_contains_held_buttons() {
        let mask = InputState::pressing(Button::A).with(Button::Up);
        assert!(mask.contains(Button::A));
        assert!(mask.contains(Button::Up));
        assert!(!mask.contains(Button::Start));
        assert!(!mask.is_empty());
        assert!(InputState::NONE.is_empty());
    }
}
