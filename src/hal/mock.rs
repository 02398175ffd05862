//! Simulated bus and mock implementations for testing without hardware.
//!
//! The centerpiece is [`SimBus`], a virtual-clock model of the open-drain
//! line with a scripted peripheral on the other end. Pin, timer and critical
//! section handles created from one `SimBus` share its state, so protocol
//! code runs unmodified and every tick it spends is accounted in cycles.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`SimPin`] | [`GpioLine`] | Bus pin; records host edges and reads |
//! | [`SimTimer`] | [`TickTimer`] | Advances the virtual clock |
//! | [`SimCriticalSection`] | [`CriticalSection`] | Tracks masked regions |
//! | [`MockLamps`] | [`OutputPort`] | Eight latched lines with a write log |
//! | [`MockDelay`] | [`DelayNs`] | Records boot and inter-poll sleeps |
//!
//! # Cycle Model
//!
//! - Every pin write or direction change costs
//!   [`TickTiming::line_op_cycles`] and takes effect when it completes.
//! - Every read samples the line at the current cycle, then costs
//!   [`TickTiming::poll_loop_cycles`].
//! - Timer calls advance the clock by exactly the cycles [`TickTiming`]
//!   assigns them.
//!
//! # Peripheral Model
//!
//! The peripheral counts host falling edges. On the ninth (the stop symbol)
//! it answers with the next queued frame, starting three ticks after that
//! edge, i.e. where the stop symbol ends. Each response bit is a standard
//! 4-tick data symbol.
//!
//! # Example
//!
//! ```rust
//! use rs_joybus::hal::SimBus;
//! use rs_joybus::line::OpenDrainLine;
//! use rs_joybus::protocol::{CommandEncoder, Symbol};
//!
//! let bus = SimBus::new(16_000_000);
//! let mut line = OpenDrainLine::new(bus.pin()).unwrap();
//! let mut timer = bus.timer();
//!
//! CommandEncoder::new(&mut line, &mut timer).write_bit(true).unwrap();
//!
//! assert_eq!(bus.transmitted_symbols(), vec![Some(Symbol::One)]);
//! ```
//!
//! [`GpioLine`]: crate::traits::GpioLine
//! [`TickTimer`]: crate::traits::TickTimer
//! [`CriticalSection`]: crate::traits::CriticalSection
//! [`OutputPort`]: crate::traits::OutputPort
//! [`DelayNs`]: embedded_hal::delay::DelayNs

extern crate alloc;
use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use embedded_hal::delay::DelayNs;

use crate::protocol::{Symbol, DATA_BIT_TICKS, FRAME_BITS, STOP_BIT_TICKS};
use crate::timing::TickTiming;
use crate::traits::{CriticalSection, GpioLine, OutputPort, PinDirection, TickTimer};

/// Reads of an unchanging line after which the simulation gives up.
pub const DEFAULT_READ_BUDGET: u64 = 1_000_000;

/// A level change caused by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HostEdge {
    /// Cycle at which the change took effect.
    pub cycle: u64,
    /// `true` when the host started pulling low, `false` when it released.
    pub low: bool,
}

/// One sample of the line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineRead {
    /// Cycle at which the line was sampled.
    pub cycle: u64,
    /// Sampled level (`true` = high).
    pub level: bool,
}

#[derive(Clone, Debug)]
struct Response {
    start: u64,
    bits: Vec<bool>,
}

/// Recorded host edges played back by the peripheral, as offsets from `start`.
#[derive(Clone, Debug)]
struct Replay {
    start: u64,
    edges: Vec<(u64, bool)>,
}

impl Replay {
    fn low_at(&self, t: u64) -> bool {
        if t < self.start {
            return false;
        }
        let offset = t - self.start;
        self.edges
            .iter()
            .take_while(|(at, _)| *at <= offset)
            .last()
            .is_some_and(|(_, low)| *low)
    }
}

#[derive(Debug)]
struct SimState {
    timing: TickTiming,
    now: u64,
    direction: PinDirection,
    latch_high: bool,
    high_drive_count: usize,
    host_edges: Vec<HostEdge>,
    reads: Vec<LineRead>,
    read_budget: Option<u64>,
    stable_reads: u64,
    last_level: Option<bool>,
    command_falls: usize,
    response: Option<Response>,
    replay: Option<Replay>,
    queued: VecDeque<Option<[bool; FRAME_BITS]>>,
    default_response: Option<[bool; FRAME_BITS]>,
    hold_low: bool,
    masked: bool,
    sections_entered: usize,
    unmasked_ops: usize,
    tick_waits: usize,
    settle_waits: usize,
    skip_waits: usize,
}

impl SimState {
    fn host_low(&self) -> bool {
        self.direction == PinDirection::Output && !self.latch_high
    }

    fn peripheral_low(&self, t: u64) -> bool {
        if self.replay.as_ref().is_some_and(|r| r.low_at(t)) {
            return true;
        }
        let Some(response) = &self.response else {
            return false;
        };
        if t < response.start {
            return false;
        }
        let cell = self.timing.ticks_to_cycles(DATA_BIT_TICKS);
        let offset = t - response.start;
        let index = (offset / cell) as usize;
        match response.bits.get(index) {
            Some(&bit) => {
                let low = self.timing.ticks_to_cycles(Symbol::from_bit(bit).low_ticks());
                offset % cell < low
            }
            None => false,
        }
    }

    fn level_at(&self, t: u64) -> bool {
        !(self.host_low() || self.hold_low || self.peripheral_low(t))
    }

    fn note_op(&mut self) {
        if !self.masked {
            self.unmasked_ops += 1;
        }
    }

    fn update_drive(&mut self, was_low: bool) {
        if self.direction == PinDirection::Output && self.latch_high {
            self.high_drive_count += 1;
        }
        let is_low = self.host_low();
        if is_low == was_low {
            return;
        }
        self.host_edges.push(HostEdge {
            cycle: self.now,
            low: is_low,
        });
        if is_low {
            self.on_host_fall();
        }
    }

    fn on_host_fall(&mut self) {
        self.command_falls += 1;
        if self.command_falls < FRAME_BITS + 1 {
            return;
        }
        self.command_falls = 0;
        let next = self.queued.pop_front().unwrap_or(self.default_response);
        let start = self.now + self.timing.ticks_to_cycles(STOP_BIT_TICKS);
        self.response = next.map(|bits| Response {
            start,
            bits: bits.to_vec(),
        });
    }

    fn round_ticks(&self, cycles: u64) -> u32 {
        let tick = self.timing.cycles_per_tick() as u64;
        ((cycles + tick / 2) / tick) as u32
    }
}

// ============================================================================
// Simulated Bus
// ============================================================================

/// Virtual-clock model of the bus line and the peripheral behind it.
///
/// Cloning gives another handle to the same simulation.
#[derive(Clone, Debug)]
pub struct SimBus {
    state: Rc<RefCell<SimState>>,
}

impl SimBus {
    /// Creates an idle bus clocked at `cpu_hz`, with a silent peripheral.
    pub fn new(cpu_hz: u32) -> Self {
        Self::with_timing(TickTiming::from_cpu_hz(cpu_hz))
    }

    /// Creates an idle bus whose pin operations cost what `timing` says.
    pub fn with_timing(timing: TickTiming) -> Self {
        let state = SimState {
            timing,
            now: 0,
            direction: PinDirection::Input,
            latch_high: false,
            high_drive_count: 0,
            host_edges: Vec::new(),
            reads: Vec::new(),
            read_budget: Some(DEFAULT_READ_BUDGET),
            stable_reads: 0,
            last_level: None,
            command_falls: 0,
            response: None,
            replay: None,
            queued: VecDeque::new(),
            default_response: None,
            hold_low: false,
            masked: false,
            sections_entered: 0,
            unmasked_ops: 0,
            tick_waits: 0,
            settle_waits: 0,
            skip_waits: 0,
        };
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    /// Tick timing of the simulated clock.
    pub fn timing(&self) -> TickTiming {
        self.state.borrow().timing
    }

    /// A pin handle attached to the bus.
    pub fn pin(&self) -> SimPin {
        SimPin {
            state: Rc::clone(&self.state),
        }
    }

    /// A timer handle driving the virtual clock.
    pub fn timer(&self) -> SimTimer {
        SimTimer {
            state: Rc::clone(&self.state),
        }
    }

    /// A critical section handle that marks masked regions.
    pub fn critical_section(&self) -> SimCriticalSection {
        SimCriticalSection {
            state: Rc::clone(&self.state),
        }
    }

    /// Current virtual time in CPU cycles.
    pub fn now(&self) -> u64 {
        self.state.borrow().now
    }

    /// Current line level, without advancing time.
    pub fn level(&self) -> bool {
        let state = self.state.borrow();
        state.level_at(state.now)
    }

    /// Current pin direction.
    pub fn direction(&self) -> PinDirection {
        self.state.borrow().direction
    }

    /// Whether the pin's output latch holds a 1.
    pub fn latch_high(&self) -> bool {
        self.state.borrow().latch_high
    }

    /// Number of times the pin was left actively driving high.
    pub fn high_drive_count(&self) -> usize {
        self.state.borrow().high_drive_count
    }

    /// Every level change the host caused, in order.
    pub fn host_edges(&self) -> Vec<HostEdge> {
        self.state.borrow().host_edges.clone()
    }

    /// Every line sample, in order.
    pub fn reads(&self) -> Vec<LineRead> {
        self.state.borrow().reads.clone()
    }

    /// Forget recorded edges, reads and call counts. Time keeps running.
    pub fn clear_history(&self) {
        let mut state = self.state.borrow_mut();
        state.host_edges.clear();
        state.reads.clear();
        state.unmasked_ops = 0;
        state.sections_entered = 0;
        state.tick_waits = 0;
        state.settle_waits = 0;
        state.skip_waits = 0;
    }

    /// Answer the next poll with `bits` (A, B, Z, Start, Up, Down, Left, Right).
    pub fn queue_response(&self, bits: [bool; FRAME_BITS]) {
        self.state.borrow_mut().queued.push_back(Some(bits));
    }

    /// Stay silent for the next poll.
    pub fn queue_silence(&self) {
        self.state.borrow_mut().queued.push_back(None);
    }

    /// Answer used once the queue is empty; `None` means silence.
    pub fn set_default_response(&self, bits: Option<[bool; FRAME_BITS]>) {
        self.state.borrow_mut().default_response = bits;
    }

    /// Start sending `bits` `ticks` from now, regardless of any command.
    pub fn start_response_in(&self, ticks: u32, bits: &[bool]) {
        let mut state = self.state.borrow_mut();
        let start = state.now + state.timing.ticks_to_cycles(ticks);
        state.response = Some(Response {
            start,
            bits: bits.to_vec(),
        });
    }

    /// Play the host's recorded waveform back from the peripheral side,
    /// starting `ticks` from now.
    ///
    /// The first recorded host fall lands exactly at the start. Recorded
    /// edges are kept, and the command edge count restarts.
    pub fn replay_host_in(&self, ticks: u32) {
        let mut state = self.state.borrow_mut();
        let start = state.now + state.timing.ticks_to_cycles(ticks);
        let origin = state
            .host_edges
            .iter()
            .find(|e| e.low)
            .map_or(0, |e| e.cycle);
        let edges = state
            .host_edges
            .iter()
            .filter(|e| e.cycle >= origin)
            .map(|e| (e.cycle - origin, e.low))
            .collect();
        state.replay = Some(Replay { start, edges });
        state.command_falls = 0;
    }

    /// Cycle at which the current response begins, if one is scheduled.
    pub fn response_start(&self) -> Option<u64> {
        self.state.borrow().response.as_ref().map(|r| r.start)
    }

    /// Hold the line low from the peripheral side (stuck bus).
    pub fn hold_low(&self, held: bool) {
        self.state.borrow_mut().hold_low = held;
    }

    /// Reads of an unchanging line tolerated before panicking.
    ///
    /// `None` lets a stuck wait spin forever, like the hardware would.
    pub fn set_read_budget(&self, budget: Option<u64>) {
        self.state.borrow_mut().read_budget = budget;
    }

    /// Number of [`TickTimer::wait_full_tick`] calls.
    pub fn tick_count(&self) -> usize {
        self.state.borrow().tick_waits
    }

    /// Number of [`TickTimer::wait_short_settle`] calls.
    pub fn settle_count(&self) -> usize {
        self.state.borrow().settle_waits
    }

    /// Number of [`TickTimer::skip_tick`] calls.
    pub fn skip_count(&self) -> usize {
        self.state.borrow().skip_waits
    }

    /// Number of critical sections entered.
    pub fn sections_entered(&self) -> usize {
        self.state.borrow().sections_entered
    }

    /// Pin and timer operations performed outside a critical section.
    pub fn unmasked_ops(&self) -> usize {
        self.state.borrow().unmasked_ops
    }

    /// Decode what the host transmitted, one entry per falling edge.
    ///
    /// A symbol's cell ends at the next host falling edge or at the first
    /// read after it (the host turning the bus around), whichever is first.
    /// Durations are rounded to whole ticks and classified with
    /// [`Symbol::classify`]; `None` marks a malformed symbol.
    pub fn transmitted_symbols(&self) -> Vec<Option<Symbol>> {
        let state = self.state.borrow();
        let edges = &state.host_edges;
        let mut symbols = Vec::new();

        for (i, fall) in edges.iter().enumerate().filter(|(_, e)| e.low) {
            let rise = edges[i + 1..]
                .iter()
                .find(|e| !e.low)
                .map_or(state.now, |e| e.cycle);
            let next_fall = edges[i + 1..].iter().find(|e| e.low).map(|e| e.cycle);
            let first_read = state
                .reads
                .iter()
                .find(|r| r.cycle >= fall.cycle)
                .map(|r| r.cycle);
            let end = match (next_fall, first_read) {
                (Some(a), Some(b)) => a.min(b),
                (Some(a), None) | (None, Some(a)) => a,
                (None, None) => state.now,
            };

            let low = state.round_ticks(rise - fall.cycle);
            let cell = state.round_ticks(end - fall.cycle);
            symbols.push(Symbol::classify(low, cell));
        }
        symbols
    }
}

// ============================================================================
// Hardware Mocks
// ============================================================================

/// Bus pin attached to a [`SimBus`].
#[derive(Debug)]
pub struct SimPin {
    state: Rc<RefCell<SimState>>,
}

impl GpioLine for SimPin {
    type Error = ();

    fn set_direction(&mut self, dir: PinDirection) -> Result<(), ()> {
        let mut state = self.state.borrow_mut();
        state.note_op();
        state.now += state.timing.line_op_cycles() as u64;
        let was_low = state.host_low();
        state.direction = dir;
        state.update_drive(was_low);
        Ok(())
    }

    fn write(&mut self, high: bool) -> Result<(), ()> {
        let mut state = self.state.borrow_mut();
        state.note_op();
        state.now += state.timing.line_op_cycles() as u64;
        let was_low = state.host_low();
        state.latch_high = high;
        state.update_drive(was_low);
        Ok(())
    }

    fn read(&mut self) -> Result<bool, ()> {
        let mut state = self.state.borrow_mut();
        state.note_op();
        let now = state.now;
        let level = state.level_at(now);
        state.reads.push(LineRead { cycle: now, level });

        if state.last_level == Some(level) {
            state.stable_reads += 1;
        } else {
            state.stable_reads = 0;
            state.last_level = Some(level);
        }
        if let Some(budget) = state.read_budget {
            if state.stable_reads >= budget {
                panic!(
                    "bus line never changed level after {} reads",
                    state.stable_reads
                );
            }
        }

        state.now += state.timing.poll_loop_cycles() as u64;
        Ok(level)
    }
}

/// Tick timer advancing a [`SimBus`] clock.
#[derive(Debug)]
pub struct SimTimer {
    state: Rc<RefCell<SimState>>,
}

impl TickTimer for SimTimer {
    fn wait_full_tick(&mut self) {
        let mut state = self.state.borrow_mut();
        state.note_op();
        state.now += state.timing.full_tick_wait_cycles() as u64;
        state.tick_waits += 1;
    }

    fn wait_short_settle(&mut self) {
        let mut state = self.state.borrow_mut();
        state.note_op();
        state.now += state.timing.settle_cycles() as u64;
        state.settle_waits += 1;
    }

    fn skip_tick(&mut self) {
        let mut state = self.state.borrow_mut();
        state.note_op();
        state.now += state.timing.skip_tick_cycles() as u64;
        state.skip_waits += 1;
    }
}

/// Critical section that marks bus operations as masked.
#[derive(Debug)]
pub struct SimCriticalSection {
    state: Rc<RefCell<SimState>>,
}

impl CriticalSection for SimCriticalSection {
    fn run<R>(&mut self, f: impl FnOnce() -> R) -> R {
        {
            let mut state = self.state.borrow_mut();
            state.masked = true;
            state.sections_entered += 1;
        }
        let result = f();
        self.state.borrow_mut().masked = false;
        result
    }
}

/// Mock lamp port for testing.
///
/// Keeps the latched level of all eight lines and a log of every write.
///
/// # Example
///
/// ```rust
/// use rs_joybus::hal::MockLamps;
/// use rs_joybus::traits::OutputPort;
///
/// let mut lamps = MockLamps::new();
/// lamps.set_line(3, true).unwrap();
///
/// assert!(lamps.level(3));
/// assert_eq!(lamps.writes(), &[(3, true)]);
/// assert!(lamps.set_line(8, true).is_err());
/// ```
#[derive(Debug, Default)]
pub struct MockLamps {
    levels: [bool; 8],
    writes: Vec<(u8, bool)>,
    fail_line: Option<u8>,
}

impl MockLamps {
    /// Creates a port with every line low.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a port with preset levels.
    pub fn with_levels(levels: [bool; 8]) -> Self {
        Self {
            levels,
            ..Self::default()
        }
    }

    /// Make writes to `line` fail.
    pub fn fail_on(mut self, line: u8) -> Self {
        self.fail_line = Some(line);
        self
    }

    /// Latched level of `line`.
    pub fn level(&self, line: u8) -> bool {
        self.levels[line as usize]
    }

    /// Latched levels of all lines.
    pub fn levels(&self) -> [bool; 8] {
        self.levels
    }

    /// Every successful write, in order.
    pub fn writes(&self) -> &[(u8, bool)] {
        &self.writes
    }

    /// Forget the write log.
    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }
}

impl OutputPort for MockLamps {
    type Error = ();

    fn set_line(&mut self, line: u8, high: bool) -> Result<(), ()> {
        if line >= Self::LINES || self.fail_line == Some(line) {
            return Err(());
        }
        self.levels[line as usize] = high;
        self.writes.push((line, high));
        Ok(())
    }
}

/// Mock delay recording every sleep.
#[derive(Debug, Default)]
pub struct MockDelay {
    /// Millisecond delays requested, in order.
    pub ms_calls: Vec<u32>,
    /// Total delay in nanoseconds.
    pub total_ns: u64,
}

impl MockDelay {
    /// Creates a delay with nothing recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total delay in whole milliseconds.
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.ms_calls.push(ms);
        self.total_ns += ms as u64 * 1_000_000;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::{INSTRUCTION_CYCLES, POLL_LOOP_CYCLES};

    const TICK: u64 = 16;

    #[test]
    fn sim_bus_idle_high() {
        let bus = SimBus::new(16_000_000);
        assert!(bus.level());
        assert_eq!(bus.now(), 0);
        assert_eq!(bus.direction(), PinDirection::Input);
    }

    #[test]
    fn pin_ops_cost_cycles() {
        let bus = SimBus::new(16_000_000);
        let mut pin = bus.pin();

        pin.set_direction(PinDirection::Output).unwrap();
        assert_eq!(bus.now(), INSTRUCTION_CYCLES as u64);

        pin.read().unwrap();
        assert_eq!(bus.now(), (INSTRUCTION_CYCLES + POLL_LOOP_CYCLES) as u64);
    }

    #[test]
    fn pin_ops_cost_configured_cycles() {
        let timing = TickTiming::from_cpu_hz(16_000_000)
            .with_line_op_cycles(6)
            .with_poll_loop_cycles(4);
        let bus = SimBus::with_timing(timing);
        let mut pin = bus.pin();
        let mut timer = bus.timer();

        pin.set_direction(PinDirection::Output).unwrap();
        assert_eq!(bus.now(), 6);
        timer.wait_full_tick();
        assert_eq!(bus.now(), TICK);

        pin.read().unwrap();
        assert_eq!(bus.now(), TICK + 4);
    }

    #[test]
    fn timer_advances_clock() {
        let bus = SimBus::new(16_000_000);
        let mut timer = bus.timer();

        timer.wait_full_tick();
        assert_eq!(bus.now(), 14);
        timer.wait_short_settle();
        assert_eq!(bus.now(), 20);
        timer.skip_tick();
        assert_eq!(bus.now(), 36);

        assert_eq!(bus.tick_count(), 1);
        assert_eq!(bus.settle_count(), 1);
        assert_eq!(bus.skip_count(), 1);
    }

    #[test]
    fn output_with_high_latch_is_counted() {
        let bus = SimBus::new(16_000_000);
        let mut pin = bus.pin();

        pin.write(true).unwrap();
        assert_eq!(bus.high_drive_count(), 0);

        pin.set_direction(PinDirection::Output).unwrap();
        assert_eq!(bus.high_drive_count(), 1);
        assert!(bus.level());
    }

    #[test]
    fn host_edges_recorded_on_change_only() {
        let bus = SimBus::new(16_000_000);
        let mut pin = bus.pin();

        pin.set_direction(PinDirection::Output).unwrap();
        pin.set_direction(PinDirection::Output).unwrap();
        pin.set_direction(PinDirection::Input).unwrap();

        assert_eq!(
            bus.host_edges(),
            vec![
                HostEdge { cycle: 2, low: true },
                HostEdge { cycle: 6, low: false },
            ]
        );
    }

    #[test]
    fn scripted_response_waveform() {
        let bus = SimBus::new(16_000_000);
        bus.start_response_in(1, &[true, false]);
        let start = bus.response_start().unwrap();
        assert_eq!(start, TICK);

        let state = bus.state.borrow();
        let level_at = |cycle: u64| state.level_at(start + cycle);

        // One: low for the first tick only.
        assert!(!level_at(0));
        assert!(!level_at(TICK - 1));
        assert!(level_at(TICK));
        // Zero: low for three ticks.
        assert!(!level_at(4 * TICK));
        assert!(!level_at(7 * TICK - 1));
        assert!(level_at(7 * TICK));
        // Idle after the last bit.
        assert!(level_at(8 * TICK));
        assert!(level_at(100 * TICK));
    }

    #[test]
    fn ninth_fall_triggers_queued_response() {
        let bus = SimBus::new(16_000_000);
        bus.queue_response([true; 8]);
        let mut pin = bus.pin();

        for _ in 0..8 {
            pin.set_direction(PinDirection::Output).unwrap();
            pin.set_direction(PinDirection::Input).unwrap();
        }
        assert_eq!(bus.response_start(), None);

        pin.set_direction(PinDirection::Output).unwrap();
        let fall = bus.now();
        assert_eq!(bus.response_start(), Some(fall + 3 * TICK));
    }

    #[test]
    fn queued_silence_then_default() {
        let bus = SimBus::new(16_000_000);
        bus.queue_silence();
        bus.set_default_response(Some([false; 8]));
        let mut pin = bus.pin();

        let command = |pin: &mut SimPin| {
            for _ in 0..9 {
                pin.set_direction(PinDirection::Output).unwrap();
                pin.set_direction(PinDirection::Input).unwrap();
            }
        };

        command(&mut pin);
        assert_eq!(bus.response_start(), None);

        command(&mut pin);
        assert!(bus.response_start().is_some());
    }

    #[test]
    fn hold_low_forces_line_low() {
        let bus = SimBus::new(16_000_000);
        bus.hold_low(true);
        assert!(!bus.level());
        bus.hold_low(false);
        assert!(bus.level());
    }

    #[test]
    #[should_panic(expected = "bus line never changed level")]
    fn read_budget_panics() {
        let bus = SimBus::new(16_000_000);
        bus.set_read_budget(Some(5));
        let mut pin = bus.pin();
        for _ in 0..10 {
            pin.read().unwrap();
        }
    }

    #[test]
    fn critical_section_masks_ops() {
        let bus = SimBus::new(16_000_000);
        let mut pin = bus.pin();
        let mut cs = bus.critical_section();

        pin.read().unwrap();
        assert_eq!(bus.unmasked_ops(), 1);

        cs.run(|| pin.read().unwrap());
        assert_eq!(bus.unmasked_ops(), 1);
        assert_eq!(bus.sections_entered(), 1);
    }

    #[test]
    fn clear_history_keeps_time() {
        let bus = SimBus::new(16_000_000);
        let mut pin = bus.pin();
        pin.set_direction(PinDirection::Output).unwrap();
        pin.read().unwrap();

        bus.clear_history();

        assert!(bus.host_edges().is_empty());
        assert!(bus.reads().is_empty());
        assert_eq!(bus.now(), 5);
    }

    #[test]
    fn mock_lamps_default() {
        let lamps = MockLamps::new();
        assert_eq!(lamps.levels(), [false; 8]);
        assert!(lamps.writes().is_empty());
    }

    #[test]
    fn mock_lamps_fail_on() {
        let mut lamps = MockLamps::new().fail_on(2);
        assert!(lamps.set_line(1, true).is_ok());
        assert!(lamps.set_line(2, true).is_err());
        assert_eq!(lamps.writes(), &[(1, true)]);
    }

    #[test]
    fn mock_lamps_clear_writes_keeps_levels() {
        let mut lamps = MockLamps::with_levels([true; 8]);
        lamps.set_line(0, false).unwrap();
        lamps.clear_writes();
        assert!(lamps.writes().is_empty());
        assert!(!lamps.level(0));
        assert!(lamps.level(1));
    }

    #[test]
    fn mock_delay_records_ms() {
        let mut delay = MockDelay::new();
        delay.delay_ms(5);
        delay.delay_ms(50);
        delay.delay_us(1_000);

        assert_eq!(delay.ms_calls, vec![5, 50]);
        assert_eq!(delay.total_ms(), 56);
    }
}
