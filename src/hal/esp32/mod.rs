//! ESP32-C3 SuperMini hardware abstraction layer for the controller bus.
//!
//! This module provides hardware implementations for the ESP32-C3 SuperMini board
//! polling a controller on one GPIO and driving eight indicator lamps.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32-C3 SuperMini (RISC-V 160MHz, 4MB Flash)
//! - **Bus**: controller data line on one GPIO, 1k pull-up to 3.3V
//! - **Lamps**: eight LEDs (or driver inputs), active high
//!
//! # Pin Assignments
//!
//! See the [`pins`] module for GPIO assignments matching the SuperMini layout.

mod critical;
mod lamps;
mod line;

pub use critical::Esp32CriticalSection;
pub use lamps::Esp32Lamps;
pub use line::Esp32BusPin;

/// Pin assignments for SuperMini ESP32-C3.
///
/// GPIO2, GPIO8 and GPIO9 are strapping pins and stay unused.
pub mod pins {
    // =========================================================================
    // Controller Bus
    // =========================================================================

    /// Controller data line (open-drain, external pull-up)
    pub const BUS_DATA: i32 = 10;

    // =========================================================================
    // Indicator Lamps
    // =========================================================================

    /// Lamp GPIOs, indexed by output line 0-7
    pub const LAMPS: [i32; 8] = [0, 1, 3, 4, 5, 6, 7, 20];
}

/// CPU clock of the ESP32-C3 at its default frequency.
pub const CPU_HZ: u32 = 160_000_000;

/// Cycles one `core::hint::spin_loop` iteration costs on the C3 core.
pub const SPIN_LOOP_CYCLES: u32 = 2;

/// Estimated cycles of one [`Esp32BusPin`] direction change.
///
/// `gpio_set_direction` validates its arguments and touches the input,
/// output-enable and open-drain registers, far more than one instruction.
/// Calibrate against a logic analyzer; the firmware takes an override from
/// `JOYBUS_LINE_OP_CYCLES` at compile time.
pub const LINE_OP_CYCLES: u32 = 120;

/// Estimated cycles of one [`Esp32BusPin`] read plus the loop branch.
pub const POLL_LOOP_CYCLES: u32 = 20;
