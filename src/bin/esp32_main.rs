//! ESP32-C3 SuperMini controller bus poller.
//!
//! This is the main entry point for the physical hardware. After a short
//! boot delay it polls the controller every 50ms and mirrors the buttons
//! onto the lamps:
//!
//! | Button | Lamp line |
//! |--------|-----------|
//! | B      | 7         |
//! | Up     | 0         |
//! | Down   | 3         |
//! | Left   | 1         |
//! | Right  | 2         |
//!
//! # Build
//!
//! ```bash
//! # Basic
//! cargo build --release --features esp32 --bin esp32_main
//!
//! # With JSON status lines on the console
//! cargo build --release --features esp32,serde-json-core --bin esp32_main
//! ```
//!
//! Set `JOYBUS_TIMEOUT_US` at compile time to stop waiting on a silent
//! controller after that many microseconds per edge. Set
//! `JOYBUS_LINE_OP_CYCLES` to the measured cost of one bus pin direction
//! change if the default estimate is off.

use anyhow::Context;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{IOPin, OutputPin};
use esp_idf_hal::peripherals::Peripherals;
use rs_joybus::hal::esp32::{
    pins, Esp32BusPin, Esp32CriticalSection, Esp32Lamps, CPU_HZ, LINE_OP_CYCLES,
    POLL_LOOP_CYCLES, SPIN_LOOP_CYCLES,
};
use rs_joybus::traits::OutputPort;
use rs_joybus::{BusConfig, Config, CycleTimer, OpenDrainLine, PollLoop, PollOutcome};

/// Print a status line every this many polls (every 5s at 50ms).
#[cfg(feature = "serde-json-core")]
const STATUS_INTERVAL: u32 = 100;

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();

    println!();
    println!("================================");
    println!("  rs-joybus SuperMini Poller");
    println!("================================");
    println!();

    // =========================================================================
    // Configuration
    // =========================================================================
    let line_op_cycles = match option_env!("JOYBUS_LINE_OP_CYCLES") {
        Some(cycles) => cycles
            .parse()
            .with_context(|| format!("JOYBUS_LINE_OP_CYCLES is not a number: {cycles}"))?,
        None => LINE_OP_CYCLES,
    };
    let mut bus = BusConfig::default()
        .with_cpu_hz(CPU_HZ)
        .with_spin_loop_cycles(SPIN_LOOP_CYCLES)
        .with_line_op_cycles(line_op_cycles)
        .with_poll_loop_cycles(POLL_LOOP_CYCLES);
    if let Some(us) = option_env!("JOYBUS_TIMEOUT_US") {
        let us = us
            .parse()
            .with_context(|| format!("JOYBUS_TIMEOUT_US is not a number: {us}"))?;
        bus = bus.with_response_timeout_us(us);
    }
    let config = Config::default().with_bus(bus);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    println!(
        "[OK] Config: {} @ {} MHz, poll every {} ms",
        config.device.name,
        config.bus.cpu_hz / 1_000_000,
        config.poll.interval_ms
    );
    println!(
        "[OK] Pin costs: {} cycles per line op, {} per edge poll",
        config.bus.line_op_cycles, config.bus.poll_loop_cycles
    );

    let peripherals = Peripherals::take()?;
    let p = peripherals.pins;

    // =========================================================================
    // Initialize Bus (open-drain on GPIO10)
    // =========================================================================
    let pin = Esp32BusPin::new(p.gpio10.downgrade())?;
    let line = OpenDrainLine::new(pin)?;
    println!("[OK] Bus initialized (GPIO{})", pins::BUS_DATA);

    // =========================================================================
    // Initialize Lamps (GPIO0/1/3/4/5/6/7/20)
    // =========================================================================
    let mut lamps = Esp32Lamps::new([
        p.gpio0.downgrade_output(),
        p.gpio1.downgrade_output(),
        p.gpio3.downgrade_output(),
        p.gpio4.downgrade_output(),
        p.gpio5.downgrade_output(),
        p.gpio6.downgrade_output(),
        p.gpio7.downgrade_output(),
        p.gpio20.downgrade_output(),
    ])?;
    lamps.clear_all()?;
    println!("[OK] Lamps initialized (GPIO{:?})", pins::LAMPS);

    // =========================================================================
    // Initialize Poll Loop
    // =========================================================================
    let timer = CycleTimer::with_loop_cost(config.bus.timing(), config.bus.spin_loop_cycles);
    let mut poll = PollLoop::new(line, timer, lamps, FreeRtos, &config)
        .with_critical_section(Esp32CriticalSection::new());

    match config.bus.response_timeout_us {
        Some(us) => println!("[OK] Response timeout: {} us per edge", us),
        None => println!("[SKIP] Response timeout disabled (blocks on a silent controller)"),
    }

    println!();
    println!("Booting ({} ms)...", config.poll.boot_delay_ms);
    poll.boot();
    println!("Starting poll loop...");
    println!();

    // =========================================================================
    // Main Poll Loop
    // =========================================================================
    loop {
        let outcome = poll
            .step()
            .map_err(|e| anyhow::anyhow!("Bus failure: {}", e))?;

        if let PollOutcome::NoResponse(button) = outcome {
            println!("[WARN] No response at bit '{}'", button.as_str());
        }

        #[cfg(feature = "serde-json-core")]
        if poll.stats().polls % STATUS_INTERVAL == 0 {
            let msg = rs_joybus::StatusMessage::new(&config.device, poll.stats(), &outcome);
            let mut buf = [0u8; 192];
            if let Some(json) = msg.to_json(&mut buf) {
                println!("[STATUS] {}", json);
            }
        }
    }
}
