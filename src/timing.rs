//! Tick timing derived from the CPU clock rate.
//!
//! The bus runs on a 1 µs tick. Every waveform in the protocol is a whole
//! number of ticks, and every wait is a counted busy loop. [`TickTiming`]
//! turns the configured clock rate into those cycle counts once at startup;
//! [`CycleTimer`] spends them.
//!
//! # Example
//!
//! ```rust
//! use rs_joybus::timing::TickTiming;
//!
//! let timing = TickTiming::from_cpu_hz(16_000_000);
//! assert_eq!(timing.cycles_per_tick(), 16);
//! assert_eq!(timing.full_tick_wait_cycles(), 14); // 2 already spent on the pin write
//! assert_eq!(timing.settle_cycles(), 6);
//! ```

use crate::traits::TickTimer;

/// Default cost in cycles of one line operation before a tick wait.
///
/// A single I/O instruction on a core that toggles the pin directly. Targets
/// that go through a vendor GPIO call override it with
/// [`TickTiming::with_line_op_cycles`].
pub const INSTRUCTION_CYCLES: u32 = 2;

/// Default cost in cycles of one edge-wait loop iteration: the sample and
/// the branch back.
pub const POLL_LOOP_CYCLES: u32 = 3;

/// Slowest clock the protocol timing supports.
///
/// Below 4 MHz a tick has too few cycles left after the line operation to
/// sample reliably. Slow line operations raise the practical floor; see
/// [`TickTiming::line_op_fits`].
pub const MIN_CPU_HZ: u32 = 4_000_000;

/// Length of one protocol tick in microseconds.
pub const TICK_US: u32 = 1;

/// Cycle counts for one configured clock rate.
///
/// Besides the clock, two costs of the target shape every wait: the cycles a
/// line operation (direction change or pin write) takes, and the cycles one
/// edge-wait iteration takes. Both default to a bare I/O instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickTiming {
    cpu_hz: u32,
    cycles_per_tick: u32,
    base_settle_cycles: u32,
    line_op_cycles: u32,
    poll_loop_cycles: u32,
}

impl TickTiming {
    /// Derive tick timing from the CPU clock rate in Hz.
    pub const fn from_cpu_hz(cpu_hz: u32) -> Self {
        let settle = cpu_hz / 2_500_000;
        Self {
            cpu_hz,
            cycles_per_tick: cpu_hz / 1_000_000 * TICK_US,
            base_settle_cycles: if settle > 0 { settle } else { 1 },
            line_op_cycles: INSTRUCTION_CYCLES,
            poll_loop_cycles: POLL_LOOP_CYCLES,
        }
    }

    /// Set the cycles one line operation costs on the target.
    ///
    /// Subtracted from every [`TickTimer::wait_full_tick`].
    pub const fn with_line_op_cycles(mut self, cycles: u32) -> Self {
        self.line_op_cycles = cycles;
        self
    }

    /// Set the cycles one edge-wait iteration costs on the target (at least 1).
    pub const fn with_poll_loop_cycles(mut self, cycles: u32) -> Self {
        self.poll_loop_cycles = if cycles == 0 { 1 } else { cycles };
        self
    }

    /// The clock rate this timing was derived from.
    #[inline]
    pub const fn cpu_hz(&self) -> u32 {
        self.cpu_hz
    }

    /// Cycles in one tick.
    #[inline]
    pub const fn cycles_per_tick(&self) -> u32 {
        self.cycles_per_tick
    }

    /// Cycles one line operation costs.
    #[inline]
    pub const fn line_op_cycles(&self) -> u32 {
        self.line_op_cycles
    }

    /// Cycles one edge-wait iteration costs.
    #[inline]
    pub const fn poll_loop_cycles(&self) -> u32 {
        self.poll_loop_cycles
    }

    /// Cycles [`TickTimer::wait_full_tick`] spins for: the tick minus the
    /// line operation that precedes it.
    #[inline]
    pub const fn full_tick_wait_cycles(&self) -> u32 {
        self.cycles_per_tick.saturating_sub(self.line_op_cycles)
    }

    /// Cycles [`TickTimer::wait_short_settle`] spins for (about 0.4 µs, at least 1).
    ///
    /// In the decoder the tick wait before the settle follows a line read,
    /// not a line operation. When a line operation costs more than a read,
    /// the difference is added here so the sample still lands past the tick.
    #[inline]
    pub const fn settle_cycles(&self) -> u32 {
        self.base_settle_cycles + self.line_op_cycles.saturating_sub(self.poll_loop_cycles)
    }

    /// Cycles [`TickTimer::skip_tick`] consumes in total.
    #[inline]
    pub const fn skip_tick_cycles(&self) -> u32 {
        self.cycles_per_tick
    }

    /// Convert a tick count to cycles.
    #[inline]
    pub const fn ticks_to_cycles(&self, ticks: u32) -> u64 {
        ticks as u64 * self.cycles_per_tick as u64
    }

    /// Whether the clock is fast enough for the protocol.
    #[inline]
    pub const fn is_supported(&self) -> bool {
        self.cpu_hz >= MIN_CPU_HZ
    }

    /// Whether a line operation fits inside one tick with time to spare.
    #[inline]
    pub const fn line_op_fits(&self) -> bool {
        self.line_op_cycles < self.cycles_per_tick
    }
}

/// Busy-wait [`TickTimer`] built on a counted spin loop.
///
/// Each loop iteration is assumed to cost `spin_loop_cycles` CPU cycles;
/// counts are divided by that cost (rounding up) so the wall time stays
/// close to the cycle budget.
#[derive(Clone, Copy, Debug)]
pub struct CycleTimer {
    full_tick_spins: u32,
    settle_spins: u32,
    skip_tick_spins: u32,
}

impl CycleTimer {
    /// Creates a timer that assumes one cycle per spin iteration.
    pub const fn new(timing: TickTiming) -> Self {
        Self::with_loop_cost(timing, 1)
    }

    /// Creates a timer for cores where one spin iteration costs `spin_loop_cycles`.
    pub const fn with_loop_cost(timing: TickTiming, spin_loop_cycles: u32) -> Self {
        let cost = if spin_loop_cycles == 0 { 1 } else { spin_loop_cycles };
        Self {
            full_tick_spins: timing.full_tick_wait_cycles().div_ceil(cost),
            settle_spins: timing.settle_cycles().div_ceil(cost),
            skip_tick_spins: timing.skip_tick_cycles().div_ceil(cost),
        }
    }

    #[inline(always)]
    fn spin(iterations: u32) {
        for _ in 0..iterations {
            core::hint::spin_loop();
        }
    }
}

impl TickTimer for CycleTimer {
    #[inline(always)]
    fn wait_full_tick(&mut self) {
        Self::spin(self.full_tick_spins);
    }

    #[inline(always)]
    fn wait_short_settle(&mut self) {
        Self::spin(self.settle_spins);
    }

    #[inline(always)]
    fn skip_tick(&mut self) {
        Self::spin(self.skip_tick_spins);
    }
}
