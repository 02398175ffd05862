//! Trait definitions for hardware abstraction.
//!
//! This module defines the seams that allow rs-joybus to:
//! - Run on different hardware (ESP32, desktop simulation)
//! - Test bit-level protocol timing on a virtual clock
//!
//! # Hardware Abstraction
//!
//! The key hardware traits are:
//!
//! - [`GpioLine`]: Raw pin capability used by the open-drain bus driver
//! - [`OutputPort`]: Indicator lamps that mirror button state
//! - [`TickTimer`]: Busy-wait delays measured in protocol ticks
//! - [`CriticalSection`]: Interrupt masking around a transaction

pub mod hardware;

pub use hardware::*;
