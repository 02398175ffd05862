//! The poll loop that ties the bus, the lamps and the sleeps together.
//!
//! This module provides [`PollLoop`], the top-level component. It owns the
//! open-drain line, the tick timer, the lamp port and a millisecond delay,
//! and repeats one fixed sequence:
//!
//! 1. send the poll command
//! 2. read the eight response bits, mirroring the wired ones
//! 3. sleep for the inter-poll interval
//!
//! Steps 1 and 2 run inside a [`CriticalSection`]. Step 3 does not.
//!
//! # Example
//!
//! ```rust
//! use rs_joybus::{
//!     config::Config,
//!     hal::{MockDelay, MockLamps, SimBus},
//!     line::OpenDrainLine,
//!     poll::{PollLoop, PollOutcome},
//!     protocol::Button,
//! };
//!
//! let config = Config::default();
//! let bus = SimBus::new(config.bus.cpu_hz);
//! bus.set_default_response(Some([false, false, false, false, true, false, false, true]));
//!
//! let line = OpenDrainLine::new(bus.pin()).unwrap();
//! let mut poll = PollLoop::new(line, bus.timer(), MockLamps::new(), MockDelay::new(), &config);
//!
//! poll.boot();
//! let outcome = poll.step().unwrap();
//!
//! match outcome {
//!     PollOutcome::Response(frame) => assert!(frame.is_pressed(Button::Up)),
//!     PollOutcome::NoResponse(_) => unreachable!(),
//! }
//! assert!(poll.lamps().level(0)); // Up
//! assert!(poll.lamps().level(2)); // Right
//! assert_eq!(poll.delay().ms_calls, vec![5, 50]);
//! ```

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;

use crate::config::Config;
use crate::line::OpenDrainLine;
use crate::protocol::{BusError, Button, CommandEncoder, EdgeWait, ResponseDecoder, ResponseFrame};
use crate::traits::{CriticalSection, GpioLine, NoCriticalSection, OutputPort, TickTimer};

/// Error type of a poll loop over pin `P` and lamp port `O`.
pub type PollError<P, O> = BusError<<P as GpioLine>::Error, <O as OutputPort>::Error>;

/// Running counters since the loop was created.
///
/// Each counter wraps to zero after `u32::MAX`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PollStats {
    /// Poll commands sent.
    pub polls: u32,
    /// Responses read completely.
    pub responses: u32,
    /// Transactions abandoned because the peripheral went quiet.
    pub missed: u32,
}

/// Result of one poll cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    /// The full frame was read and mirrored.
    Response(ResponseFrame),
    /// The peripheral stopped answering at this bit. Lamps written before
    /// it keep their new levels.
    NoResponse(Button),
}

/// Polls the peripheral and mirrors its buttons onto the lamps.
///
/// # Type Parameters
///
/// - `P`: bus pin ([`GpioLine`])
/// - `T`: busy-wait timer ([`TickTimer`])
/// - `O`: lamp port ([`OutputPort`])
/// - `D`: millisecond sleeps ([`DelayNs`])
/// - `C`: interrupt masking ([`CriticalSection`]), none by default
pub struct PollLoop<P, T, O, D, C = NoCriticalSection>
where
    P: GpioLine,
    T: TickTimer,
    O: OutputPort,
    D: DelayNs,
    C: CriticalSection,
{
    line: OpenDrainLine<P>,
    timer: T,
    lamps: O,
    delay: D,
    critical_section: C,
    edge_wait: EdgeWait,
    boot_delay_ms: u32,
    interval_ms: u32,
    booted: bool,
    stats: PollStats,
}

impl<P, T, O, D> PollLoop<P, T, O, D>
where
    P: GpioLine,
    T: TickTimer,
    O: OutputPort,
    D: DelayNs,
{
    /// Create a poll loop from its collaborators.
    ///
    /// `timer` must already be calibrated for `config.bus`; only the edge
    /// wait and the poll delays are taken from `config` here.
    pub fn new(line: OpenDrainLine<P>, timer: T, lamps: O, delay: D, config: &Config) -> Self {
        Self {
            line,
            timer,
            lamps,
            delay,
            critical_section: NoCriticalSection,
            edge_wait: config.bus.edge_wait(),
            boot_delay_ms: config.poll.boot_delay_ms,
            interval_ms: config.poll.interval_ms,
            booted: false,
            stats: PollStats::default(),
        }
    }
}

impl<P, T, O, D, C> PollLoop<P, T, O, D, C>
where
    P: GpioLine,
    T: TickTimer,
    O: OutputPort,
    D: DelayNs,
    C: CriticalSection,
{
    /// Run every transaction inside `critical_section`.
    pub fn with_critical_section<C2: CriticalSection>(
        self,
        critical_section: C2,
    ) -> PollLoop<P, T, O, D, C2> {
        PollLoop {
            line: self.line,
            timer: self.timer,
            lamps: self.lamps,
            delay: self.delay,
            critical_section,
            edge_wait: self.edge_wait,
            boot_delay_ms: self.boot_delay_ms,
            interval_ms: self.interval_ms,
            booted: self.booted,
            stats: self.stats,
        }
    }

    /// Wait the boot delay so the peripheral can power up.
    ///
    /// Only the first call sleeps.
    pub fn boot(&mut self) {
        if !self.booted {
            self.delay.delay_ms(self.boot_delay_ms);
            self.booted = true;
        }
    }

    /// Send one poll command and read the response, without sleeping.
    ///
    /// # Errors
    ///
    /// Pin and lamp errors are returned as they occur.
    /// [`BusError::NoResponse`] is only possible with a bounded edge wait;
    /// with the default the call blocks until the peripheral answers.
    pub fn poll_once(&mut self) -> Result<ResponseFrame, PollError<P, O>> {
        let Self {
            line,
            timer,
            lamps,
            critical_section,
            edge_wait,
            ..
        } = self;
        let edge_wait = *edge_wait;

        let result = critical_section.run(|| -> Result<ResponseFrame, PollError<P, O>> {
            CommandEncoder::new(line, timer)
                .send_poll_command()
                .map_err(BusError::Line)?;
            ResponseDecoder::new(line, timer, lamps, edge_wait).read_frame()
        });

        let stats = &mut self.stats;
        stats.polls = stats.polls.wrapping_add(1);
        match &result {
            Ok(_) => stats.responses = stats.responses.wrapping_add(1),
            Err(e) if e.is_no_response() => stats.missed = stats.missed.wrapping_add(1),
            Err(_) => {}
        }
        result
    }

    /// One loop iteration: a transaction, then the inter-poll sleep.
    ///
    /// A missed response is not an error here. The sleep still happens and
    /// the next step retries.
    pub fn step(&mut self) -> Result<PollOutcome, PollError<P, O>> {
        let outcome = match self.poll_once() {
            Ok(frame) => PollOutcome::Response(frame),
            Err(BusError::NoResponse { button }) => PollOutcome::NoResponse(button),
            Err(e) => return Err(e),
        };
        self.delay.delay_ms(self.interval_ms);
        Ok(outcome)
    }

    /// Boot if needed, then step until `stop` returns true.
    ///
    /// `stop` sees each outcome and the counters after it.
    pub fn run_until<F>(&mut self, mut stop: F) -> Result<PollStats, PollError<P, O>>
    where
        F: FnMut(&PollOutcome, &PollStats) -> bool,
    {
        self.boot();
        loop {
            let outcome = self.step()?;
            if stop(&outcome, &self.stats) {
                return Ok(self.stats);
            }
        }
    }

    /// Boot if needed, then poll forever.
    ///
    /// Only returns on a pin or lamp error.
    pub fn run(&mut self) -> Result<Infallible, PollError<P, O>> {
        self.boot();
        loop {
            self.step()?;
        }
    }

    /// Counters so far.
    pub fn stats(&self) -> PollStats {
        self.stats
    }

    /// Whether the boot delay has run.
    pub fn is_booted(&self) -> bool {
        self.booted
    }

    /// Edge-wait policy used by the decoder.
    pub fn edge_wait(&self) -> EdgeWait {
        self.edge_wait
    }

    /// The lamp port.
    pub fn lamps(&self) -> &O {
        &self.lamps
    }

    /// The delay provider.
    pub fn delay(&self) -> &D {
        &self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BusConfig, PollConfig};
    use crate::hal::{MockDelay, MockLamps, SimBus, SimPin, SimTimer};

    type SimLoop = PollLoop<SimPin, SimTimer, MockLamps, MockDelay>;

    fn setup(config: &Config) -> (SimBus, SimLoop) {
        let bus = SimBus::new(config.bus.cpu_hz);
        let line = OpenDrainLine::new(bus.pin()).unwrap();
        let poll = PollLoop::new(line, bus.timer(), MockLamps::new(), MockDelay::new(), config);
        bus.clear_history();
        (bus, poll)
    }

    fn bounded() -> Config {
        Config::default().with_bus(BusConfig::default().with_response_timeout_us(20))
    }

    #[test]
    fn new_loop_is_not_booted() {
        let (_bus, poll) = setup(&Config::default());
        assert!(!poll.is_booted());
        assert_eq!(poll.stats(), PollStats::default());
        assert_eq!(poll.edge_wait(), EdgeWait::Forever);
    }

    #[test]
    fn boot_sleeps_once() {
        let (_bus, mut poll) = setup(&Config::default());
        poll.boot();
        poll.boot();
        assert!(poll.is_booted());
        assert_eq!(poll.delay().ms_calls, vec![5]);
    }

    #[test]
    fn poll_once_does_not_sleep() {
        let (bus, mut poll) = setup(&Config::default());
        bus.queue_response([false; 8]);

        poll.poll_once().unwrap();

        assert!(poll.delay().ms_calls.is_empty());
    }

    #[test]
    fn step_mirrors_frame_and_sleeps() {
        let (bus, mut poll) = setup(&Config::default());
        bus.queue_response([false, true, false, false, false, true, false, false]);

        let outcome = poll.step().unwrap();

        let PollOutcome::Response(frame) = outcome else {
            panic!("expected a response, got {outcome:?}");
        };
        assert!(frame.is_pressed(Button::B));
        assert!(frame.is_pressed(Button::Down));
        assert_eq!(poll.lamps().levels(), [false, false, false, true, false, false, false, true]);
        assert_eq!(poll.delay().ms_calls, vec![50]);
        assert_eq!(
            poll.stats(),
            PollStats {
                polls: 1,
                responses: 1,
                missed: 0
            }
        );
    }

    #[test]
    fn missed_response_is_counted_and_slept_through() {
        let (bus, mut poll) = setup(&bounded());
        bus.queue_silence();

        let outcome = poll.step().unwrap();

        assert_eq!(outcome, PollOutcome::NoResponse(Button::A));
        assert_eq!(poll.delay().ms_calls, vec![50]);
        assert_eq!(poll.stats().missed, 1);
        assert_eq!(poll.stats().responses, 0);
    }

    #[test]
    fn lamp_error_propagates_without_sleep() {
        let config = Config::default();
        let bus = SimBus::new(config.bus.cpu_hz);
        let line = OpenDrainLine::new(bus.pin()).unwrap();
        let lamps = MockLamps::new().fail_on(0);
        let mut poll = PollLoop::new(line, bus.timer(), lamps, MockDelay::new(), &config);
        bus.queue_response([true; 8]);

        let err = poll.step().unwrap_err();

        assert_eq!(err, BusError::Output(()));
        assert!(poll.delay().ms_calls.is_empty());
        assert_eq!(poll.stats().polls, 1);
        assert_eq!(poll.stats().missed, 0);
    }

    #[test]
    fn run_until_boots_then_steps() {
        let config = Config::default().with_poll(PollConfig::default().with_interval_ms(20));
        let (bus, mut poll) = setup(&config);
        bus.set_default_response(Some([true; 8]));

        let stats = poll.run_until(|_, stats| stats.polls == 3).unwrap();

        assert_eq!(stats.polls, 3);
        assert_eq!(stats.responses, 3);
        assert_eq!(poll.delay().ms_calls, vec![5, 20, 20, 20]);
    }

    #[test]
    fn run_until_sees_each_outcome() {
        let (bus, mut poll) = setup(&bounded());
        bus.queue_response([false; 8]);
        bus.queue_silence();
        bus.queue_response([true; 8]);

        let mut seen = Vec::new();
        poll.run_until(|outcome, _| {
            seen.push(*outcome);
            seen.len() == 3
        })
        .unwrap();

        assert!(matches!(seen[0], PollOutcome::Response(_)));
        assert_eq!(seen[1], PollOutcome::NoResponse(Button::A));
        assert!(matches!(seen[2], PollOutcome::Response(f) if f.is_pressed(Button::Right)));
    }

    #[test]
    fn transaction_runs_inside_critical_section() {
        let (bus, poll) = setup(&Config::default());
        let mut poll = poll.with_critical_section(bus.critical_section());
        bus.queue_response([false; 8]);

        poll.step().unwrap();

        assert_eq!(bus.sections_entered(), 1);
        assert_eq!(bus.unmasked_ops(), 0);
    }

    #[test]
    fn counters_wrap_instead_of_overflowing() {
        let (bus, mut poll) = setup(&bounded());
        bus.queue_response([false; 8]);
        bus.queue_silence();
        poll.stats = PollStats {
            polls: u32::MAX,
            responses: u32::MAX,
            missed: u32::MAX,
        };

        poll.step().unwrap();
        assert_eq!(
            poll.stats(),
            PollStats {
                polls: 0,
                responses: 0,
                missed: u32::MAX
            }
        );

        poll.step().unwrap();
        assert_eq!(
            poll.stats(),
            PollStats {
                polls: 1,
                responses: 0,
                missed: 0
            }
        );
    }
}
