//! Open-drain driver for the shared bus line.
//!
//! The bus is pulled up passively. The host may only pull it low or let it
//! go; actively driving it high would fight the peripheral and can damage
//! it. [`OpenDrainLine`] enforces that by latching the pin's output value to
//! 0 once and then only toggling direction:
//!
//! | Call | Direction | Latch | Line |
//! |------|-----------|-------|------|
//! | [`drive_low`](OpenDrainLine::drive_low) | output | 0 | low |
//! | [`release`](OpenDrainLine::release) | input | 0 | pulled high |
//!
//! There is deliberately no method that writes 1 to the latch.

use crate::traits::{GpioLine, PinDirection};

/// The single open-drain signal line shared with the peripheral.
#[derive(Debug)]
pub struct OpenDrainLine<P: GpioLine> {
    pin: P,
}

impl<P: GpioLine> OpenDrainLine<P> {
    /// Takes ownership of `pin`, latches its output value to 0 and releases it.
    ///
    /// # Errors
    ///
    /// Returns the pin's error if either register write fails.
    pub fn new(mut pin: P) -> Result<Self, P::Error> {
        pin.write(false)?;
        pin.set_direction(PinDirection::Input)?;
        Ok(Self { pin })
    }

    /// Pull the line to logic 0.
    #[inline(always)]
    pub fn drive_low(&mut self) -> Result<(), P::Error> {
        self.pin.set_direction(PinDirection::Output)
    }

    /// Float the line and let the pull-up bring it to logic 1.
    #[inline(always)]
    pub fn release(&mut self) -> Result<(), P::Error> {
        self.pin.set_direction(PinDirection::Input)
    }

    /// Release when `high`, drive low otherwise.
    #[inline(always)]
    pub fn set_level(&mut self, high: bool) -> Result<(), P::Error> {
        if high {
            self.release()
        } else {
            self.drive_low()
        }
    }

    /// Sample the line (`true` = high).
    #[inline(always)]
    pub fn read_level(&mut self) -> Result<bool, P::Error> {
        self.pin.read()
    }

    /// Release the line and hand back the pin.
    pub fn into_inner(mut self) -> Result<P, P::Error> {
        self.release()?;
        Ok(self.pin)
    }
}
