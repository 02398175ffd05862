//! Bus pin implementation using raw ESP-IDF GPIO calls.
//!
//! The HAL's `PinDriver` changes direction by consuming the driver, which
//! is far too slow for a 1 µs tick. These IDF calls are cheaper, but still
//! cost tens of cycles each: their cost is accounted for with
//! [`LINE_OP_CYCLES`] and [`POLL_LOOP_CYCLES`].
//!
//! [`LINE_OP_CYCLES`]: super::LINE_OP_CYCLES
//! [`POLL_LOOP_CYCLES`]: super::POLL_LOOP_CYCLES

use crate::traits::{GpioLine, PinDirection};
use esp_idf_hal::gpio::{AnyIOPin, Pin};
use esp_idf_hal::sys::{self, esp, EspError};

/// The controller data line on one ESP32 GPIO.
///
/// "Output" uses the open-drain output mode, so even a stray 1 in the latch
/// cannot drive the bus high.
///
/// # Example
///
/// ```ignore
/// use rs_joybus::hal::esp32::Esp32BusPin;
/// use rs_joybus::line::OpenDrainLine;
///
/// let peripherals = Peripherals::take()?;
/// let pin = Esp32BusPin::new(peripherals.pins.gpio10.downgrade())?;
/// let line = OpenDrainLine::new(pin)?;
/// ```
pub struct Esp32BusPin {
    _pin: AnyIOPin,
    gpio: i32,
}

impl Esp32BusPin {
    /// Takes the pin, resets it and enables the internal pull-up.
    ///
    /// The internal pull-up is weak; an external 1k resistor is still
    /// needed for clean edges.
    ///
    /// # Errors
    ///
    /// Returns an error if the IDF rejects the pin configuration.
    pub fn new(pin: AnyIOPin) -> Result<Self, EspError> {
        let gpio = pin.pin();
        // Safe: the pin is owned by this struct, nothing else configures it
        unsafe {
            esp!(sys::gpio_reset_pin(gpio))?;
            esp!(sys::gpio_set_pull_mode(gpio, sys::gpio_pull_mode_t_GPIO_PULLUP_ONLY))?;
            esp!(sys::gpio_set_direction(gpio, sys::gpio_mode_t_GPIO_MODE_INPUT))?;
        }
        Ok(Self { _pin: pin, gpio })
    }

    /// GPIO number of the bus pin.
    pub fn gpio(&self) -> i32 {
        self.gpio
    }
}

impl GpioLine for Esp32BusPin {
    type Error = EspError;

    #[inline(always)]
    fn set_direction(&mut self, dir: PinDirection) -> Result<(), EspError> {
        let mode = match dir {
            PinDirection::Input => sys::gpio_mode_t_GPIO_MODE_INPUT,
            PinDirection::Output => sys::gpio_mode_t_GPIO_MODE_INPUT_OUTPUT_OD,
        };
        // Safe: the pin is owned by this struct
        unsafe { esp!(sys::gpio_set_direction(self.gpio, mode)) }
    }

    #[inline(always)]
    fn write(&mut self, high: bool) -> Result<(), EspError> {
        // Safe: the pin is owned by this struct
        unsafe { esp!(sys::gpio_set_level(self.gpio, high as u32)) }
    }

    #[inline(always)]
    fn read(&mut self) -> Result<bool, EspError> {
        // Safe: plain read of the input register
        Ok(unsafe { sys::gpio_get_level(self.gpio) } != 0)
    }
}
