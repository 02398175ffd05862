//! Bit-level protocol: command encoding and response decoding.
//!
//! The encoder and decoder are short-lived views over the line and timer.
//! The poll loop builds a fresh pair for every transaction:
//!
//! ```rust
//! use rs_joybus::hal::{MockLamps, SimBus};
//! use rs_joybus::line::OpenDrainLine;
//! use rs_joybus::protocol::{Button, CommandEncoder, EdgeWait, ResponseDecoder};
//!
//! let bus = SimBus::new(16_000_000);
//! bus.set_default_response(Some([false, true, false, false, true, false, false, false]));
//!
//! let mut line = OpenDrainLine::new(bus.pin()).unwrap();
//! let mut timer = bus.timer();
//! let mut lamps = MockLamps::new();
//!
//! CommandEncoder::new(&mut line, &mut timer).send_poll_command().unwrap();
//! let frame = ResponseDecoder::new(&mut line, &mut timer, &mut lamps, EdgeWait::Forever)
//!     .read_frame()
//!     .unwrap();
//!
//! assert_eq!(frame.get(Button::B), Some(true));
//! assert!(lamps.level(7));
//! assert!(lamps.level(0));
//! ```

pub mod decoder;
pub mod encoder;
pub mod frame;
pub mod symbol;

pub use decoder::{EdgeWait, ResponseDecoder};
pub use encoder::CommandEncoder;
pub use frame::{Button, ResponseFrame, FRAME_BITS, POLL_COMMAND, RESPONSE_ORDER};
pub use symbol::{Symbol, DATA_BIT_TICKS, STOP_BIT_TICKS};

/// Ticks the host spends transmitting a command: 8 data bits and a stop symbol.
pub const COMMAND_TICKS: u32 = FRAME_BITS as u32 * DATA_BIT_TICKS + STOP_BIT_TICKS;

/// Ticks the peripheral spends on its response frame.
pub const RESPONSE_TICKS: u32 = FRAME_BITS as u32 * DATA_BIT_TICKS;

/// Ticks in one full poll transaction.
pub const TRANSACTION_TICKS: u32 = COMMAND_TICKS + RESPONSE_TICKS;

/// Failure of a bus transaction.
///
/// `L` is the bus pin's error type and `O` the lamp port's.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusError<L, O> {
    /// The bus pin reported an error.
    Line(L),
    /// The output port reported an error.
    Output(O),
    /// The peripheral did not produce the expected edge in time.
    ///
    /// Only returned when decoding with [`EdgeWait::Bounded`].
    NoResponse {
        /// Response position that was being read.
        button: Button,
    },
}

impl<L, O> BusError<L, O> {
    /// Whether this is a timeout rather than a hardware error.
    pub fn is_no_response(&self) -> bool {
        matches!(self, BusError::NoResponse { .. })
    }
}

impl<L: core::fmt::Debug, O: core::fmt::Debug> core::fmt::Display for BusError<L, O> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BusError::Line(e) => write!(f, "bus line error: {e:?}"),
            BusError::Output(e) => write!(f, "output port error: {e:?}"),
            BusError::NoResponse { button } => {
                write!(f, "no response from peripheral at bit '{}'", button.as_str())
            }
        }
    }
}

#[cfg(feature = "std")]
impl<L: core::fmt::Debug, O: core::fmt::Debug> std::error::Error for BusError<L, O> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_budget() {
        assert_eq!(COMMAND_TICKS, 35);
        assert_eq!(RESPONSE_TICKS, 32);
        assert_eq!(TRANSACTION_TICKS, 67);
    }

    #[test]
    fn bus_error_display() {
        let e: BusError<(), ()> = BusError::NoResponse { button: Button::Z };
        assert_eq!(e.to_string(), "no response from peripheral at bit 'z'");
        assert!(e.is_no_response());

        let e: BusError<u8, ()> = BusError::Line(3);
        assert_eq!(e.to_string(), "bus line error: 3");
        assert!(!e.is_no_response());
    }
}
