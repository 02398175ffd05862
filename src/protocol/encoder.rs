//! Host command transmission.
//!
//! Every line operation below is followed by exactly one tick wait, so each
//! tick of a symbol is one `set_level` plus [`TickTimer::wait_full_tick`].
//! The cycles of the line operation are what `wait_full_tick` leaves out.

use super::frame::POLL_COMMAND;
use super::symbol::Symbol;
use crate::line::OpenDrainLine;
use crate::traits::{GpioLine, TickTimer};

/// Writes host commands onto the bus.
pub struct CommandEncoder<'a, P: GpioLine, T: TickTimer> {
    line: &'a mut OpenDrainLine<P>,
    timer: &'a mut T,
}

impl<'a, P: GpioLine, T: TickTimer> CommandEncoder<'a, P, T> {
    /// Borrow the line and timer for one command.
    pub fn new(line: &'a mut OpenDrainLine<P>, timer: &'a mut T) -> Self {
        Self { line, timer }
    }

    /// Drive one symbol: a line operation and a tick wait per tick.
    pub fn write_symbol(&mut self, symbol: Symbol) -> Result<(), P::Error> {
        for tick in 0..symbol.cell_ticks() {
            self.line.set_level(symbol.level_at(tick))?;
            self.timer.wait_full_tick();
        }
        Ok(())
    }

    /// Emit one 4-tick data symbol.
    ///
    /// Tick 1 low, ticks 2-3 at the bit level, tick 4 released.
    pub fn write_bit(&mut self, bit: bool) -> Result<(), P::Error> {
        self.write_symbol(Symbol::from_bit(bit))
    }

    /// Emit the 3-tick stop symbol that ends a command.
    ///
    /// Tick 1 low, ticks 2-3 released. The line stays released afterwards,
    /// handing the bus to the peripheral.
    pub fn write_stop_bit(&mut self) -> Result<(), P::Error> {
        self.write_symbol(Symbol::Stop)
    }

    /// Send `byte` MSB first, followed by the stop symbol.
    pub fn send_command(&mut self, byte: u8) -> Result<(), P::Error> {
        for shift in (0..8).rev() {
            self.write_bit((byte >> shift) & 1 == 1)?;
        }
        self.write_stop_bit()
    }

    /// Send the poll command (0x01).
    pub fn send_poll_command(&mut self) -> Result<(), P::Error> {
        self.send_command(POLL_COMMAND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::SimBus;
    use crate::protocol::symbol::{DATA_BIT_TICKS, STOP_BIT_TICKS};

    const CPU_HZ: u32 = 16_000_000;
    const TICK: u64 = 16;

    fn setup() -> (SimBus, OpenDrainLine<crate::hal::SimPin>, crate::hal::SimTimer) {
        let bus = SimBus::new(CPU_HZ);
        let line = OpenDrainLine::new(bus.pin()).unwrap();
        let timer = bus.timer();
        bus.clear_history();
        (bus, line, timer)
    }

    #[test]
    fn zero_bit_low_for_three_ticks() {
        let (bus, mut line, mut timer) = setup();
        let start = bus.now();

        CommandEncoder::new(&mut line, &mut timer)
            .write_bit(false)
            .unwrap();

        let edges = bus.host_edges();
        // One fall at the start, one rise before tick 4.
        let falls: Vec<_> = edges.iter().filter(|e| e.low).collect();
        let rises: Vec<_> = edges.iter().filter(|e| !e.low).collect();
        assert_eq!(falls.len(), 1);
        assert_eq!(rises.len(), 1);
        assert_eq!(rises[0].cycle - falls[0].cycle, 3 * TICK);
        assert_eq!(bus.now() - start, DATA_BIT_TICKS as u64 * TICK);
    }

    #[test]
    fn one_bit_low_for_one_tick() {
        let (bus, mut line, mut timer) = setup();
        let start = bus.now();

        CommandEncoder::new(&mut line, &mut timer)
            .write_bit(true)
            .unwrap();

        let edges = bus.host_edges();
        assert_eq!(edges.len(), 2);
        assert!(edges[0].low);
        assert!(!edges[1].low);
        assert_eq!(edges[1].cycle - edges[0].cycle, TICK);
        assert_eq!(bus.now() - start, DATA_BIT_TICKS as u64 * TICK);
    }

    #[test]
    fn stop_bit_is_three_ticks() {
        let (bus, mut line, mut timer) = setup();
        let start = bus.now();

        CommandEncoder::new(&mut line, &mut timer)
            .write_stop_bit()
            .unwrap();

        let edges = bus.host_edges();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[1].cycle - edges[0].cycle, TICK);
        assert_eq!(bus.now() - start, STOP_BIT_TICKS as u64 * TICK);
        assert!(line.read_level().unwrap());
    }

    #[test]
    fn poll_command_symbols() {
        let (bus, mut line, mut timer) = setup();

        CommandEncoder::new(&mut line, &mut timer)
            .send_poll_command()
            .unwrap();

        let symbols = bus.transmitted_symbols();
        assert_eq!(
            symbols,
            vec![
                Some(Symbol::Zero),
                Some(Symbol::Zero),
                Some(Symbol::Zero),
                Some(Symbol::Zero),
                Some(Symbol::Zero),
                Some(Symbol::Zero),
                Some(Symbol::Zero),
                Some(Symbol::One),
                Some(Symbol::Stop),
            ]
        );
    }

    #[test]
    fn send_command_msb_first() {
        let (bus, mut line, mut timer) = setup();

        CommandEncoder::new(&mut line, &mut timer)
            .send_command(0xA5)
            .unwrap();

        let bits: Vec<_> = bus
            .transmitted_symbols()
            .into_iter()
            .map(|s| s.and_then(Symbol::bit))
            .collect();
        assert_eq!(
            bits,
            vec![
                Some(true),
                Some(false),
                Some(true),
                Some(false),
                Some(false),
                Some(true),
                Some(false),
                Some(true),
                None,
            ]
        );
    }

    #[test]
    fn command_never_drives_high() {
        let (bus, mut line, mut timer) = setup();

        CommandEncoder::new(&mut line, &mut timer)
            .send_command(0xFF)
            .unwrap();

        assert_eq!(bus.high_drive_count(), 0);
    }
}
