//! Command and response frame layout.
//!
//! The peripheral answers a poll with eight digital bits in a fixed order.
//! Five of them are mirrored onto lamps; the wiring below is a property of
//! the board, not something derived, so it is spelled out per button.

/// Command byte that asks the peripheral for its current state.
pub const POLL_COMMAND: u8 = 0x01;

/// Bits in the command and in the response frame.
pub const FRAME_BITS: usize = 8;

/// Buttons reported in the response frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Button {
    /// A button.
    A,
    /// B button.
    B,
    /// Z trigger.
    Z,
    /// Start button.
    Start,
    /// D-pad up.
    Up,
    /// D-pad down.
    Down,
    /// D-pad left.
    Left,
    /// D-pad right.
    Right,
}

/// Order in which the peripheral sends the buttons.
pub const RESPONSE_ORDER: [Button; FRAME_BITS] = [
    Button::A,
    Button::B,
    Button::Z,
    Button::Start,
    Button::Up,
    Button::Down,
    Button::Left,
    Button::Right,
];

impl Button {
    /// Position of this button in the response frame.
    #[inline]
    pub const fn position(self) -> usize {
        match self {
            Button::A => 0,
            Button::B => 1,
            Button::Z => 2,
            Button::Start => 3,
            Button::Up => 4,
            Button::Down => 5,
            Button::Left => 6,
            Button::Right => 7,
        }
    }

    /// Output line this button is mirrored to, `None` if it is discarded.
    #[inline]
    pub const fn lamp(self) -> Option<u8> {
        match self {
            Button::B => Some(7),
            Button::Up => Some(0),
            Button::Down => Some(3),
            Button::Left => Some(1),
            Button::Right => Some(2),
            Button::A | Button::Z | Button::Start => None,
        }
    }

    /// Returns the button name as a lowercase string.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_joybus::protocol::Button;
    ///
    /// assert_eq!(Button::Start.as_str(), "start");
    /// assert_eq!(Button::Left.as_str(), "left");
    /// ```
    pub const fn as_str(&self) -> &'static str {
        match self {
            Button::A => "a",
            Button::B => "b",
            Button::Z => "z",
            Button::Start => "start",
            Button::Up => "up",
            Button::Down => "down",
            Button::Left => "left",
            Button::Right => "right",
        }
    }
}

/// A decoded response frame.
///
/// Discarded positions are `None`: their bits were consumed to stay aligned
/// but never sampled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResponseFrame {
    bits: [Option<bool>; FRAME_BITS],
}

impl ResponseFrame {
    /// An empty frame with nothing sampled.
    pub const fn new() -> Self {
        Self {
            bits: [None; FRAME_BITS],
        }
    }

    /// Record the sampled level for `button`.
    pub fn set(&mut self, button: Button, pressed: bool) {
        self.bits[button.position()] = Some(pressed);
    }

    /// Sampled level for `button`, `None` if it was discarded.
    pub fn get(&self, button: Button) -> Option<bool> {
        self.bits[button.position()]
    }

    /// Whether `button` was sampled high.
    pub fn is_pressed(&self, button: Button) -> bool {
        self.get(button).unwrap_or(false)
    }

    /// Buttons sampled high, in frame order.
    pub fn pressed(&self) -> impl Iterator<Item = Button> + '_ {
        RESPONSE_ORDER
            .into_iter()
            .filter(move |button| self.is_pressed(*button))
    }
}

impl core::fmt::Display for ResponseFrame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for button in RESPONSE_ORDER {
            let c = match self.get(button) {
                Some(true) => '1',
                Some(false) => '0',
                None => '-',
            };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_matches_positions() {
        for (i, button) in RESPONSE_ORDER.iter().enumerate() {
            assert_eq!(button.position(), i);
        }
    }

    #[test]
    fn lamp_wiring() {
        assert_eq!(Button::A.lamp(), None);
        assert_eq!(Button::B.lamp(), Some(7));
        assert_eq!(Button::Z.lamp(), None);
        assert_eq!(Button::Start.lamp(), None);
        assert_eq!(Button::Up.lamp(), Some(0));
        assert_eq!(Button::Down.lamp(), Some(3));
        assert_eq!(Button::Left.lamp(), Some(1));
        assert_eq!(Button::Right.lamp(), Some(2));
    }

    #[test]
    fn lamps_are_distinct_and_leave_4_to_6_free() {
        let mut used = [false; 8];
        for button in RESPONSE_ORDER {
            if let Some(line) = button.lamp() {
                assert!(!used[line as usize], "line {line} wired twice");
                used[line as usize] = true;
            }
        }
        assert_eq!(used, [true, true, true, true, false, false, false, true]);
    }

    #[test]
    fn frame_get_set() {
        let mut frame = ResponseFrame::new();
        assert_eq!(frame.get(Button::B), None);

        frame.set(Button::B, true);
        frame.set(Button::Up, false);

        assert_eq!(frame.get(Button::B), Some(true));
        assert_eq!(frame.get(Button::Up), Some(false));
        assert!(frame.is_pressed(Button::B));
        assert!(!frame.is_pressed(Button::A));
    }

    #[test]
    fn frame_pressed_in_order() {
        let mut frame = ResponseFrame::new();
        frame.set(Button::Right, true);
        frame.set(Button::B, true);
        frame.set(Button::Down, false);

        let pressed: Vec<_> = frame.pressed().collect();
        assert_eq!(pressed, vec![Button::B, Button::Right]);
    }

    #[test]
    fn frame_display() {
        let mut frame = ResponseFrame::new();
        frame.set(Button::B, false);
        frame.set(Button::Up, true);
        frame.set(Button::Down, false);
        frame.set(Button::Left, true);
        frame.set(Button::Right, false);
        assert_eq!(format!("{frame}"), "-0--1010");
    }
}
