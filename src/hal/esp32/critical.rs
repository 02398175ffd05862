//! Interrupt masking for bus transactions.

use crate::traits::CriticalSection;

/// Disables interrupts on the current core while a transaction runs.
///
/// A transaction is about 67 µs. The FreeRTOS tick and WiFi interrupts
/// are held off for that long and serviced afterwards.
#[derive(Clone, Copy, Debug, Default)]
pub struct Esp32CriticalSection;

impl Esp32CriticalSection {
    /// Creates a new critical section handle.
    pub fn new() -> Self {
        Self
    }
}

impl CriticalSection for Esp32CriticalSection {
    #[inline]
    fn run<R>(&mut self, f: impl FnOnce() -> R) -> R {
        esp_idf_hal::interrupt::free(f)
    }
}
