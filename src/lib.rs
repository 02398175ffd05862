//! # rs-joybus
//!
//! A master-side driver for the single-wire, open-drain controller bus.
//! It polls a game-controller peripheral and mirrors five of its buttons
//! onto indicator lamps.
//!
//! ## Features
//!
//! - **Hardware abstraction**: Traits for the bus pin, lamp port, tick timer and interrupt masking
//! - **Cycle-accurate timing**: Every wait derives from one configured clock rate
//! - **Open-drain discipline**: The bus line is only ever pulled low or released
//! - **Simulated bus**: A virtual-clock peripheral model for desktop tests
//! - **Optional timeout**: Baseline blocking behavior, or a bounded edge wait
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware abstractions
//! - `timing` - Tick arithmetic and the busy-wait timer
//! - `line` - Open-drain driver for the bus line
//! - `protocol` - Symbol waveforms, command encoder, response decoder
//! - `poll` - The poll loop that ties everything together
//! - `hal` - Concrete implementations (simulation for testing, esp32 for hardware)
//!
//! ## Example
//!
//! ```rust
//! use rs_joybus::{
//!     Config, OpenDrainLine, PollLoop,
//!     hal::{MockDelay, MockLamps, SimBus},
//! };
//!
//! let config = Config::default();
//! let bus = SimBus::new(config.bus.cpu_hz);
//!
//! // The peripheral reports B and Left pressed
//! bus.set_default_response(Some([false, true, false, false, false, false, true, false]));
//!
//! let line = OpenDrainLine::new(bus.pin()).unwrap();
//! let mut poll = PollLoop::new(line, bus.timer(), MockLamps::new(), MockDelay::new(), &config);
//!
//! // Boot, then poll twice
//! let stats = poll.run_until(|_, stats| stats.polls == 2).unwrap();
//! assert_eq!(stats.responses, 2);
//!
//! assert!(poll.lamps().level(7)); // B
//! assert!(poll.lamps().level(1)); // Left
//! assert!(!poll.lamps().level(0)); // Up
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Hardware abstraction layer with a simulated bus for testing.
pub mod hal;
/// Open-drain driver for the shared bus line.
pub mod line;
/// Poll loop that sends commands, reads responses and sleeps.
pub mod poll;
/// Bit-level protocol: symbols, command encoding, response decoding.
pub mod protocol;
/// Tick arithmetic and the busy-wait timer.
pub mod timing;
/// Core traits for hardware abstraction.
pub mod traits;

/// Shared configuration system for desktop and ESP32.
pub mod config;

/// Status message types for console and network reporting (serde-based).
#[cfg(feature = "serde")]
pub mod messages;

// Re-exports for convenience
pub use line::OpenDrainLine;
pub use poll::{PollError, PollLoop, PollOutcome, PollStats};
pub use protocol::{
    BusError, Button, CommandEncoder, EdgeWait, ResponseDecoder, ResponseFrame, Symbol,
    POLL_COMMAND, TRANSACTION_TICKS,
};
pub use timing::{CycleTimer, TickTiming};
pub use traits::{
    CriticalSection, GpioLine, NoCriticalSection, OutputPort, PinDirection, TickTimer,
};

// Config re-exports
pub use config::{BusConfig, Config, ConfigError, DeviceConfig, PollConfig};

// Message re-exports
#[cfg(feature = "serde")]
pub use messages::StatusMessage;

#[cfg(feature = "serde-json-core")]
pub use messages::parse_status_message;
