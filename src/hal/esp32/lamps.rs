//! Indicator lamps on eight ESP32 output pins.

use crate::traits::OutputPort;
use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};
use esp_idf_hal::sys::{EspError, ESP_ERR_INVALID_ARG};

/// Eight push-pull outputs, one per lamp line.
///
/// Every line starts low.
///
/// # Example
///
/// ```ignore
/// use rs_joybus::hal::esp32::Esp32Lamps;
/// use rs_joybus::traits::OutputPort;
///
/// let p = Peripherals::take()?.pins;
/// let mut lamps = Esp32Lamps::new([
///     p.gpio0.downgrade_output(),
///     p.gpio1.downgrade_output(),
///     p.gpio3.downgrade_output(),
///     p.gpio4.downgrade_output(),
///     p.gpio5.downgrade_output(),
///     p.gpio6.downgrade_output(),
///     p.gpio7.downgrade_output(),
///     p.gpio20.downgrade_output(),
/// ])?;
///
/// lamps.set_line(7, true)?;
/// ```
pub struct Esp32Lamps<'d> {
    lines: Vec<PinDriver<'d, AnyOutputPin, Output>>,
}

impl<'d> Esp32Lamps<'d> {
    /// Creates the port, indexed in the order the pins are given.
    ///
    /// # Errors
    ///
    /// Returns an error if any pin cannot be configured as an output.
    pub fn new(pins: [AnyOutputPin; 8]) -> Result<Self, EspError> {
        let mut lines = Vec::with_capacity(pins.len());
        for pin in pins {
            let mut driver = PinDriver::output(pin)?;
            driver.set_low()?;
            lines.push(driver);
        }
        Ok(Self { lines })
    }
}

impl OutputPort for Esp32Lamps<'_> {
    type Error = EspError;

    fn set_line(&mut self, line: u8, high: bool) -> Result<(), EspError> {
        let driver = self
            .lines
            .get_mut(line as usize)
            .ok_or_else(EspError::from_infallible::<{ ESP_ERR_INVALID_ARG as i32 }>)?;
        if high {
            driver.set_high()
        } else {
            driver.set_low()
        }
    }
}
