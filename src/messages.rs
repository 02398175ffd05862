//! Status messages for console or network reporting.
//!
//! These types are `no_std` compatible and can be serialized using
//! `serde-json-core` (feature `serde-json-core`) into a caller-provided
//! buffer, so the firmware can print a status line without allocating.
//!
//! # Example
//!
//! ```
//! use rs_joybus::config::DeviceConfig;
//! use rs_joybus::messages::StatusMessage;
//! use rs_joybus::poll::{PollOutcome, PollStats};
//! use rs_joybus::protocol::{Button, ResponseFrame};
//!
//! let mut frame = ResponseFrame::new();
//! frame.set(Button::B, true);
//!
//! let stats = PollStats { polls: 4, responses: 3, missed: 1 };
//! let msg = StatusMessage::new(&DeviceConfig::default(), stats, &PollOutcome::Response(frame));
//! assert_eq!(msg.pressed.as_slice(), &[Button::B]);
//!
//! #[cfg(feature = "serde-json-core")]
//! {
//!     let mut buf = [0u8; 256];
//!     let json = msg.to_json(&mut buf).unwrap();
//!     assert!(json.contains(r#""pressed":["b"]"#));
//! }
//! ```

use heapless::Vec as HVec;
use serde::{Deserialize, Serialize};

use crate::config::{DeviceConfig, ShortString};
use crate::poll::{PollOutcome, PollStats};
use crate::protocol::{Button, FRAME_BITS};

/// Snapshot of the poll loop after one step.
///
/// # JSON Examples
///
/// After a response with B held:
/// ```json
/// {"device":"rs-joybus","stats":{"polls":4,"responses":3,"missed":1},"pressed":["b"],"missed_at":null}
/// ```
///
/// After the peripheral went quiet at the first bit:
/// ```json
/// {"device":"rs-joybus","stats":{"polls":5,"responses":3,"missed":2},"pressed":[],"missed_at":"a"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    /// Device name from the configuration
    pub device: ShortString,
    /// Counters so far
    pub stats: PollStats,
    /// Mirrored buttons sampled high, in frame order
    pub pressed: HVec<Button, FRAME_BITS>,
    /// Bit at which the last transaction was abandoned, if it was
    pub missed_at: Option<Button>,
}

impl StatusMessage {
    /// Build a message from the outcome of the latest step.
    pub fn new(device: &DeviceConfig, stats: PollStats, outcome: &PollOutcome) -> Self {
        let (pressed, missed_at) = match outcome {
            PollOutcome::Response(frame) => (frame.pressed().collect(), None),
            PollOutcome::NoResponse(button) => (HVec::new(), Some(*button)),
        };
        Self {
            device: device.name.clone(),
            stats,
            pressed,
            missed_at,
        }
    }

    /// Serialize into `buf` and return the JSON text.
    ///
    /// Returns `None` if `buf` is too small.
    #[cfg(feature = "serde-json-core")]
    pub fn to_json<'b>(&self, buf: &'b mut [u8]) -> Option<&'b str> {
        let len = serde_json_core::to_slice(self, buf).ok()?;
        core::str::from_utf8(&buf[..len]).ok()
    }
}

/// Parse a status message, e.g. one relayed from a device.
///
/// Returns `None` if the JSON is malformed.
#[cfg(feature = "serde-json-core")]
pub fn parse_status_message(json: &[u8]) -> Option<StatusMessage> {
    serde_json_core::from_slice(json).ok().map(|(msg, _)| msg)
}
