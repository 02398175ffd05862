//! Hardware abstraction traits for the bus line, lamp outputs and tick timing.
//!
//! This module defines the hardware interfaces that let rs-joybus run the
//! same protocol code against real pins and against the simulated bus.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`GpioLine`] | Direction, read and write capability of one pin |
//! | [`OutputPort`] | Eight level-latched indicator lines |
//! | [`TickTimer`] | Cycle-accurate busy-wait primitives |
//! | [`CriticalSection`] | Keeps interrupts off for a whole transaction |
//!
//! # Implementation
//!
//! For testing and desktop development, use the simulated bus from
//! [`crate::hal::mock`]. For ESP32 hardware, use the implementations from
//! `hal::esp32` (requires `esp32` feature).
//!
//! # Example
//!
//! ```rust
//! use rs_joybus::traits::{GpioLine, PinDirection};
//! use rs_joybus::hal::SimBus;
//!
//! let bus = SimBus::new(16_000_000);
//! let mut pin = bus.pin();
//! pin.write(false).unwrap();
//! pin.set_direction(PinDirection::Output).unwrap();
//! assert!(!pin.read().unwrap());
//! ```

/// Direction of a GPIO pin.
///
/// On an open-drain bus the direction doubles as the line state: an output
/// with a 0 latch pulls the line low, an input lets the pull-up win.
///
/// # Default
///
/// Defaults to [`Input`](Self::Input), which never disturbs the bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PinDirection {
    /// High impedance; the pin only samples.
    #[default]
    Input,
    /// The pin drives its value latch onto the line.
    Output,
}

impl PinDirection {
    /// Returns the direction as a lowercase string.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_joybus::traits::PinDirection;
    ///
    /// assert_eq!(PinDirection::Input.as_str(), "input");
    /// assert_eq!(PinDirection::Output.as_str(), "output");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            PinDirection::Input => "input",
            PinDirection::Output => "output",
        }
    }
}

/// Raw capability of a single bidirectional GPIO pin.
///
/// This is the register-level view: a direction bit, a value latch and an
/// input sample. Protocol code never uses it directly; it goes through
/// [`OpenDrainLine`](crate::line::OpenDrainLine), which keeps the latch at 0.
///
/// # Implementation Notes
///
/// - `write` only changes the value latch. It must not change direction.
/// - `read` returns the electrical level on the pin, whatever the direction.
/// - Every call sits inside cycle-counted code, so implementations should be
///   a single register access where the platform allows it.
pub trait GpioLine {
    /// Error type for pin operations.
    type Error;

    /// Switch the pin between input and output.
    fn set_direction(&mut self, dir: PinDirection) -> Result<(), Self::Error>;

    /// Set the output value latch.
    fn write(&mut self, high: bool) -> Result<(), Self::Error>;

    /// Sample the current line level (`true` = high).
    fn read(&mut self) -> Result<bool, Self::Error>;
}

/// Eight independent, level-latched output lines (the indicator lamps).
///
/// A line keeps its level until it is written again.
pub trait OutputPort {
    /// Error type for output operations.
    type Error;

    /// Number of lines on the port.
    const LINES: u8 = 8;

    /// Latch `high` onto output `line` (0-based).
    fn set_line(&mut self, line: u8, high: bool) -> Result<(), Self::Error>;

    /// Drive every line low.
    ///
    /// Used once at startup so the lamps begin in a known state.
    fn clear_all(&mut self) -> Result<(), Self::Error> {
        for line in 0..Self::LINES {
            self.set_line(line, false)?;
        }
        Ok(())
    }
}

/// Cycle-accurate busy-wait primitives.
///
/// None of these yield, sleep or consult an interrupt source. The caller is
/// responsible for the cycles it spent before the call: each primitive only
/// compensates for the fixed offset documented on it.
pub trait TickTimer {
    /// Wait out the rest of one tick.
    ///
    /// Assumes the caller just executed one line operation, whose cost
    /// [`TickTiming::line_op_cycles`] gives.
    ///
    /// [`TickTiming::line_op_cycles`]: crate::timing::TickTiming::line_op_cycles
    fn wait_full_tick(&mut self);

    /// Wait roughly a quarter tick so a sampled line can settle.
    fn wait_short_settle(&mut self);

    /// Consume one whole tick, with no line operation before it.
    fn skip_tick(&mut self);
}

/// Runs a closure with interrupts held off.
///
/// Any interrupt longer than a fraction of a tick corrupts a transaction, so
/// the poll loop wraps every command/response exchange in one of these.
pub trait CriticalSection {
    /// Run `f` without preemption.
    fn run<R>(&mut self, f: impl FnOnce() -> R) -> R;
}

/// Critical section that does nothing.
///
/// For hosts and simulations where nothing can preempt the poll loop.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCriticalSection;

impl CriticalSection for NoCriticalSection {
    #[inline]
    fn run<R>(&mut self, f: impl FnOnce() -> R) -> R {
        f()
    }
}
