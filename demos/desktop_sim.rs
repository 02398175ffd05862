//! Desktop simulation of the poll loop.
//!
//! Runs the real encoder, decoder and poll loop against the simulated bus,
//! with a scripted controller that walks through a few button presses and
//! goes quiet once. No hardware required.
//!
//! # Usage
//!
//! ```sh
//! cargo run --example desktop_sim
//! ```
//!
//! With JSON status lines:
//! ```sh
//! cargo run --example desktop_sim --features serde-json-core
//! ```

use rs_joybus::config::{BusConfig, Config, PollConfig};
use rs_joybus::hal::{MockDelay, MockLamps, SimBus};
use rs_joybus::{OpenDrainLine, PollLoop, PollOutcome, TRANSACTION_TICKS};

/// Frames the simulated controller answers with, in order (A, B, Z, Start,
/// Up, Down, Left, Right). `None` means the controller stays silent.
const SCRIPT: [(&str, Option<[bool; 8]>); 6] = [
    ("idle", Some([false; 8])),
    ("B", Some([false, true, false, false, false, false, false, false])),
    ("Up + Right", Some([false, false, false, false, true, false, false, true])),
    ("unplugged", None),
    ("A + Down (A is not wired)", Some([true, false, false, false, false, true, false, false])),
    ("everything", Some([true; 8])),
];

fn lamp_row(levels: [bool; 8]) -> String {
    levels
        .iter()
        .map(|&on| if on { '*' } else { '.' })
        .collect()
}

fn main() {
    println!("=================================");
    println!("  rs-joybus Desktop Simulation");
    println!("=================================");
    println!();

    // Central configuration - a bounded edge wait so "unplugged" does not hang
    let config = Config::default()
        .with_bus(
            BusConfig::default()
                .with_cpu_hz(16_000_000)
                .with_response_timeout_us(100),
        )
        .with_poll(PollConfig::default().with_interval_ms(50));

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    let bus = SimBus::new(config.bus.cpu_hz);
    for (_, frame) in SCRIPT {
        match frame {
            Some(bits) => bus.queue_response(bits),
            None => bus.queue_silence(),
        }
    }

    let line = OpenDrainLine::new(bus.pin()).expect("simulated pins do not fail");
    let mut poll = PollLoop::new(line, bus.timer(), MockLamps::new(), MockDelay::new(), &config)
        .with_critical_section(bus.critical_section());

    println!("Device:      {}", config.device.name);
    println!("Clock:       {} MHz", config.bus.cpu_hz / 1_000_000);
    println!("Transaction: {} ticks", TRANSACTION_TICKS);
    println!("Lamps:       line 0 (Up) ... line 7 (B)");
    println!();

    let mut step = 0;
    let mut last = None;
    let result = poll.run_until(|outcome, stats| {
        let (label, _) = SCRIPT[step];
        step += 1;
        last = Some(*outcome);
        match outcome {
            PollOutcome::Response(frame) => {
                println!("[{:>2}] {:<28} frame {}", stats.polls, label, frame)
            }
            PollOutcome::NoResponse(button) => println!(
                "[{:>2}] {:<28} [WARN] no response at '{}'",
                stats.polls,
                label,
                button.as_str()
            ),
        }
        step == SCRIPT.len()
    });

    let stats = match result {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("Bus failure: {}", e);
            std::process::exit(1);
        }
    };

    println!();
    println!("Lamps:  {}", lamp_row(poll.lamps().levels()));
    println!(
        "Polls:  {} ({} answered, {} missed)",
        stats.polls, stats.responses, stats.missed
    );
    println!(
        "Slept:  {} ms in {} delays",
        poll.delay().total_ms(),
        poll.delay().ms_calls.len()
    );
    println!("Bus:    {} us simulated", bus.now() / bus.timing().cycles_per_tick() as u64);

    let Some(last) = last else {
        return;
    };
    if let PollOutcome::Response(frame) = last {
        let pressed: Vec<_> = frame.pressed().map(|b| b.as_str()).collect();
        println!("Held:   {}", pressed.join(" "));
    }

    #[cfg(feature = "serde-json-core")]
    {
        let msg = rs_joybus::StatusMessage::new(&config.device, stats, &last);
        let mut buf = [0u8; 192];
        if let Some(json) = msg.to_json(&mut buf) {
            println!("Status: {}", json);
        }
    }
}
