//! Peripheral response decoding.
//!
//! Each response bit starts with the peripheral pulling the line low. The
//! decoder waits for that edge, waits one tick plus a short settle, and
//! samples once: a 1 has already been released by then, a 0 is still low.
//! It then waits for the line to come back high before the next bit.
//!
//! Bits whose value is not needed are still walked edge by edge. Skipping
//! one outright would leave the decoder waiting on the wrong edge for the
//! rest of the frame.

use super::frame::{Button, ResponseFrame, RESPONSE_ORDER};
use super::BusError;
use crate::line::OpenDrainLine;
use crate::timing::{TickTiming, TICK_US};
use crate::traits::{GpioLine, OutputPort, TickTimer};

/// How long an edge wait may spin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EdgeWait {
    /// Spin until the edge arrives, however long that takes.
    ///
    /// A disconnected or stuck peripheral hangs the decoder. This is the
    /// reference behavior.
    #[default]
    Forever,
    /// Give up after `max_polls` samples and report
    /// [`BusError::NoResponse`].
    Bounded {
        /// Samples taken before giving up.
        max_polls: u32,
    },
}

impl EdgeWait {
    /// Edge wait for an optional timeout in microseconds.
    ///
    /// `None` keeps the blocking behavior. A timeout is converted to a poll
    /// count from [`TickTiming::poll_loop_cycles`], so no clock is consulted
    /// while waiting.
    pub fn from_timeout_us(timeout_us: Option<u32>, timing: &TickTiming) -> Self {
        match timeout_us {
            None => EdgeWait::Forever,
            Some(us) => {
                let cycles = timing.ticks_to_cycles(us / TICK_US);
                let polls =
                    (cycles / timing.poll_loop_cycles() as u64).clamp(1, u32::MAX as u64);
                EdgeWait::Bounded {
                    max_polls: polls as u32,
                }
            }
        }
    }
}

/// Reads one response frame and mirrors it onto the lamps.
pub struct ResponseDecoder<'a, P: GpioLine, T: TickTimer, O: OutputPort> {
    line: &'a mut OpenDrainLine<P>,
    timer: &'a mut T,
    lamps: &'a mut O,
    edge_wait: EdgeWait,
}

impl<'a, P, T, O> ResponseDecoder<'a, P, T, O>
where
    P: GpioLine,
    T: TickTimer,
    O: OutputPort,
{
    /// Borrow the line, timer and lamps for one response.
    pub fn new(
        line: &'a mut OpenDrainLine<P>,
        timer: &'a mut T,
        lamps: &'a mut O,
        edge_wait: EdgeWait,
    ) -> Self {
        Self {
            line,
            timer,
            lamps,
            edge_wait,
        }
    }

    fn wait_for_level(
        &mut self,
        high: bool,
        button: Button,
    ) -> Result<(), BusError<P::Error, O::Error>> {
        match self.edge_wait {
            EdgeWait::Forever => loop {
                if self.line.read_level().map_err(BusError::Line)? == high {
                    return Ok(());
                }
            },
            EdgeWait::Bounded { max_polls } => {
                for _ in 0..max_polls {
                    if self.line.read_level().map_err(BusError::Line)? == high {
                        return Ok(());
                    }
                }
                Err(BusError::NoResponse { button })
            }
        }
    }

    /// Consume one response bit without sampling it.
    pub fn skip_read_bit(&mut self, button: Button) -> Result<(), BusError<P::Error, O::Error>> {
        self.wait_for_level(false, button)?;
        self.timer.wait_full_tick();
        self.timer.skip_tick();
        self.wait_for_level(true, button)
    }

    /// Sample one response bit and latch it onto output `lamp`.
    ///
    /// Returns the sampled level.
    pub fn read_and_output_bit(
        &mut self,
        button: Button,
        lamp: u8,
    ) -> Result<bool, BusError<P::Error, O::Error>> {
        self.wait_for_level(false, button)?;
        self.timer.wait_full_tick();
        self.timer.wait_short_settle();
        let bit = self.line.read_level().map_err(BusError::Line)?;
        self.lamps.set_line(lamp, bit).map_err(BusError::Output)?;
        self.wait_for_level(true, button)?;
        Ok(bit)
    }

    /// Walk the whole response frame in order, mirroring wired buttons.
    pub fn read_frame(&mut self) -> Result<ResponseFrame, BusError<P::Error, O::Error>> {
        let mut frame = ResponseFrame::new();
        for button in RESPONSE_ORDER {
            match button.lamp() {
                Some(lamp) => {
                    let bit = self.read_and_output_bit(button, lamp)?;
                    frame.set(button, bit);
                }
                None => self.skip_read_bit(button)?,
            }
        }
        Ok(frame)
    }
}
