//! Shared configuration for desktop simulation and ESP32 firmware.
//!
//! Uses `heapless::String` for `no_std` compatibility while remaining
//! ergonomic to use on desktop with `std`.
//!
//! # Example
//!
//! ```rust
//! use rs_joybus::config::{BusConfig, Config, PollConfig};
//!
//! // Use defaults (4 MHz, 5 ms boot delay, 50 ms between polls)
//! let config = Config::default();
//! assert!(config.validate().is_ok());
//!
//! // Or customize
//! let config = Config::default()
//!     .with_bus(BusConfig::default().with_cpu_hz(160_000_000).with_response_timeout_us(200))
//!     .with_poll(PollConfig::default().with_interval_ms(16));
//! assert!(config.validate().is_ok());
//! ```

use heapless::String as HString;

use crate::protocol::{EdgeWait, TRANSACTION_TICKS};
use crate::timing::{TickTiming, INSTRUCTION_CYCLES, MIN_CPU_HZ, POLL_LOOP_CYCLES};

/// Maximum length for short config strings (device names)
pub const MAX_SHORT_STRING: usize = 64;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    for c in s.chars() {
        if hs.push(c).is_err() {
            break;
        }
    }
    hs
}

// ============================================================================
// Errors
// ============================================================================

/// A configuration the protocol cannot run with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The clock leaves too few cycles per tick.
    ClockTooSlow {
        /// Configured clock rate.
        cpu_hz: u32,
    },
    /// The inter-poll interval does not exceed one transaction.
    IntervalTooShort {
        /// Configured interval in microseconds.
        interval_us: u64,
        /// Duration of one transaction in microseconds.
        transaction_us: u64,
    },
    /// A spin loop iteration was declared to cost zero cycles.
    ZeroSpinCost,
    /// One line operation takes a whole tick or more.
    LineOpTooSlow {
        /// Configured line operation cost.
        line_op_cycles: u32,
        /// Cycles in one tick at the configured clock.
        cycles_per_tick: u32,
    },
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::ClockTooSlow { cpu_hz } => {
                write!(f, "clock {cpu_hz} Hz is below the {MIN_CPU_HZ} Hz minimum")
            }
            ConfigError::IntervalTooShort {
                interval_us,
                transaction_us,
            } => write!(
                f,
                "poll interval {interval_us} us does not exceed the {transaction_us} us transaction"
            ),
            ConfigError::ZeroSpinCost => write!(f, "spin loop cost must be at least one cycle"),
            ConfigError::LineOpTooSlow {
                line_op_cycles,
                cycles_per_tick,
            } => write!(
                f,
                "line operation of {line_op_cycles} cycles does not fit a {cycles_per_tick}-cycle tick"
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Bus clocking and edge-wait behavior
    pub bus: BusConfig,
    /// Poll loop timing
    pub poll: PollConfig,
    /// Device identification
    pub device: DeviceConfig,
}

impl Config {
    /// Set bus configuration
    pub fn with_bus(mut self, bus: BusConfig) -> Self {
        self.bus = bus;
        self
    }

    /// Set poll configuration
    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Set device configuration
    pub fn with_device(mut self, device: DeviceConfig) -> Self {
        self.device = device;
        self
    }

    /// Check that the protocol can run with this configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let timing = self.bus.timing();
        if !timing.is_supported() {
            return Err(ConfigError::ClockTooSlow {
                cpu_hz: self.bus.cpu_hz,
            });
        }
        if self.bus.spin_loop_cycles == 0 {
            return Err(ConfigError::ZeroSpinCost);
        }
        if !timing.line_op_fits() {
            return Err(ConfigError::LineOpTooSlow {
                line_op_cycles: timing.line_op_cycles(),
                cycles_per_tick: timing.cycles_per_tick(),
            });
        }
        let interval_us = self.poll.interval_ms as u64 * 1_000;
        let transaction_us = TRANSACTION_TICKS as u64;
        if interval_us <= transaction_us {
            return Err(ConfigError::IntervalTooShort {
                interval_us,
                transaction_us,
            });
        }
        Ok(())
    }
}

// ============================================================================
// Bus Config
// ============================================================================

/// Bus clocking configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BusConfig {
    /// CPU clock rate in Hz; all tick waits derive from it
    pub cpu_hz: u32,
    /// CPU cycles one busy-wait loop iteration costs
    pub spin_loop_cycles: u32,
    /// CPU cycles one bus pin direction change or write costs
    pub line_op_cycles: u32,
    /// CPU cycles one edge-wait iteration (read and branch) costs
    pub poll_loop_cycles: u32,
    /// Give up on a silent peripheral after this long (None = wait forever)
    pub response_timeout_us: Option<u32>,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            cpu_hz: 4_000_000,
            spin_loop_cycles: 1,
            line_op_cycles: INSTRUCTION_CYCLES,
            poll_loop_cycles: POLL_LOOP_CYCLES,
            response_timeout_us: None,
        }
    }
}

impl BusConfig {
    /// Set the CPU clock rate
    pub fn with_cpu_hz(mut self, hz: u32) -> Self {
        self.cpu_hz = hz;
        self
    }

    /// Set the per-iteration spin loop cost
    pub fn with_spin_loop_cycles(mut self, cycles: u32) -> Self {
        self.spin_loop_cycles = cycles;
        self
    }

    /// Set the cost of one bus pin operation
    pub fn with_line_op_cycles(mut self, cycles: u32) -> Self {
        self.line_op_cycles = cycles;
        self
    }

    /// Set the cost of one edge-wait iteration
    pub fn with_poll_loop_cycles(mut self, cycles: u32) -> Self {
        self.poll_loop_cycles = cycles;
        self
    }

    /// Bound every edge wait by a timeout
    pub fn with_response_timeout_us(mut self, us: u32) -> Self {
        self.response_timeout_us = Some(us);
        self
    }

    /// Wait for the peripheral forever (the default)
    pub fn without_response_timeout(mut self) -> Self {
        self.response_timeout_us = None;
        self
    }

    /// Tick timing for the configured clock
    pub fn timing(&self) -> TickTiming {
        TickTiming::from_cpu_hz(self.cpu_hz)
            .with_line_op_cycles(self.line_op_cycles)
            .with_poll_loop_cycles(self.poll_loop_cycles)
    }

    /// Edge-wait policy for the decoder
    pub fn edge_wait(&self) -> EdgeWait {
        EdgeWait::from_timeout_us(self.response_timeout_us, &self.timing())
    }
}

// ============================================================================
// Poll Config
// ============================================================================

/// Poll loop timing
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PollConfig {
    /// One-time settle delay before the first poll, in milliseconds
    pub boot_delay_ms: u32,
    /// Sleep between polls, in milliseconds
    pub interval_ms: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            boot_delay_ms: 5,
            interval_ms: 50,
        }
    }
}

impl PollConfig {
    /// Set the boot delay
    pub fn with_boot_delay_ms(mut self, ms: u32) -> Self {
        self.boot_delay_ms = ms;
        self
    }

    /// Set the inter-poll interval
    pub fn with_interval_ms(mut self, ms: u32) -> Self {
        self.interval_ms = ms;
        self
    }
}

// ============================================================================
// Device Config
// ============================================================================

/// Device identification configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceConfig {
    /// Human-readable device name
    pub name: ShortString,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: short_string("rs-joybus"),
        }
    }
}

impl DeviceConfig {
    /// Set the device name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = short_string(name);
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
