//! Waveform symbols on the bus.
//!
//! Every symbol starts with a falling edge. The value is carried by how long
//! the line stays low inside the cell:
//!
//! ```text
//!          tick: 0   1   2   3
//! Zero  (4 ticks)  ‾|___________|‾‾‾    low 75 %
//! One   (4 ticks)  ‾|___|‾‾‾‾‾‾‾‾‾‾‾    low 25 %
//! Stop  (3 ticks)  ‾|___|‾‾‾‾‾‾‾        low 1 tick, one tick shorter
//! ```

/// Ticks in a data bit cell.
pub const DATA_BIT_TICKS: u32 = 4;

/// Ticks in the stop symbol.
pub const STOP_BIT_TICKS: u32 = 3;

/// One symbol of the line code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Symbol {
    /// Data bit 0.
    Zero,
    /// Data bit 1.
    One,
    /// End of a host command.
    Stop,
}

impl Symbol {
    /// The data symbol for `bit`.
    #[inline]
    pub const fn from_bit(bit: bool) -> Self {
        if bit {
            Symbol::One
        } else {
            Symbol::Zero
        }
    }

    /// The data bit this symbol carries, `None` for [`Stop`](Self::Stop).
    #[inline]
    pub const fn bit(self) -> Option<bool> {
        match self {
            Symbol::Zero => Some(false),
            Symbol::One => Some(true),
            Symbol::Stop => None,
        }
    }

    /// Cell length in ticks.
    #[inline]
    pub const fn cell_ticks(self) -> u32 {
        match self {
            Symbol::Zero | Symbol::One => DATA_BIT_TICKS,
            Symbol::Stop => STOP_BIT_TICKS,
        }
    }

    /// Ticks the line is held low at the start of the cell.
    #[inline]
    pub const fn low_ticks(self) -> u32 {
        match self {
            Symbol::Zero => 3,
            Symbol::One | Symbol::Stop => 1,
        }
    }

    /// Line level during `tick` of the cell (`true` = released/high).
    #[inline]
    pub const fn level_at(self, tick: u32) -> bool {
        tick >= self.low_ticks()
    }

    /// Recover a symbol from a measured low time and cell length, in ticks.
    ///
    /// The stop symbol and a data 1 share the same low time; only the cell
    /// length tells them apart.
    pub const fn classify(low_ticks: u32, cell_ticks: u32) -> Option<Self> {
        match (low_ticks, cell_ticks) {
            (3, DATA_BIT_TICKS) => Some(Symbol::Zero),
            (1, DATA_BIT_TICKS) => Some(Symbol::One),
            (1, STOP_BIT_TICKS) => Some(Symbol::Stop),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn low_fraction(symbol: Symbol) -> f32 {
        let low = (0..symbol.cell_ticks())
            .filter(|&t| !symbol.level_at(t))
            .count();
        low as f32 / symbol.cell_ticks() as f32
    }

    #[test]
    fn zero_is_low_three_quarters() {
        assert_eq!(low_fraction(Symbol::Zero), 0.75);
    }

    #[test]
    fn one_is_low_one_quarter() {
        assert_eq!(low_fraction(Symbol::One), 0.25);
    }

    #[test]
    fn every_symbol_starts_low_and_ends_high() {
        for symbol in [Symbol::Zero, Symbol::One, Symbol::Stop] {
            assert!(!symbol.level_at(0), "{symbol:?}");
            assert!(symbol.level_at(symbol.cell_ticks() - 1), "{symbol:?}");
        }
    }

    #[test]
    fn stop_is_one_tick_shorter_than_data() {
        assert_eq!(Symbol::Stop.cell_ticks() + 1, Symbol::One.cell_ticks());
        assert_eq!(Symbol::Stop.low_ticks(), Symbol::One.low_ticks());
    }

    #[test]
    fn classify_recovers_each_symbol() {
        for symbol in [Symbol::Zero, Symbol::One, Symbol::Stop] {
            assert_eq!(
                Symbol::classify(symbol.low_ticks(), symbol.cell_ticks()),
                Some(symbol)
            );
        }
    }

    #[test]
    fn classify_tells_stop_from_one() {
        assert_ne!(Symbol::classify(1, 3), Symbol::classify(1, 4));
    }

    #[test]
    fn classify_rejects_garbage() {
        assert_eq!(Symbol::classify(0, 4), None);
        assert_eq!(Symbol::classify(2, 4), None);
        assert_eq!(Symbol::classify(3, 3), None);
        assert_eq!(Symbol::classify(1, 5), None);
    }

    #[test]
    fn bit_round_trip() {
        assert_eq!(Symbol::from_bit(true).bit(), Some(true));
        assert_eq!(Symbol::from_bit(false).bit(), Some(false));
        assert_eq!(Symbol::Stop.bit(), None);
    }
}
