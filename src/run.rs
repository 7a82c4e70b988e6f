use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use sdl2::event::Event;
use sdl2::keyboard::Keycode;

use vm8_core::constants::{CLOCK_SPEED, TIMER_RATE};
use vm8_core::{Error, Machine};
use vm8_display::Display;

use crate::keymap::keymap;

/// Fires at a fixed wall-clock interval, independently of how fast the
/// enclosing loop spins. Used to hold the timer tick at 60 Hz while the CPU
/// runs at its own clock.
struct IntervalTimer {
    interval: Duration,
    last_tick: Instant,
}

impl IntervalTimer {
    fn new(interval: Duration) -> Self {
        IntervalTimer {
            interval,
            last_tick: Instant::now(),
        }
    }

    fn tick(&mut self) -> bool {
        if self.last_tick.elapsed() >= self.interval {
            self.last_tick += self.interval;
            true
        } else {
            false
        }
    }
}

/// Drives the machine against SDL2 input and display.
///
/// Besides the hex pad, the host keys are:
/// - Space: pause/resume
/// - F5: soft reset (the loaded ROM survives)
/// - Escape or window close: quit
pub fn run(rom: PathBuf, trace: bool) -> Result<(), Error> {
    let mut machine = Machine::new();
    machine.set_trace(trace);

    // Load ROM
    let file = File::open(rom)?;
    let mut reader = BufReader::new(file);
    machine.load_rom(&mut reader)?;

    // Get SDL2 context
    let sdl: sdl2::Sdl = sdl2::init().unwrap();
    let mut display = Display::new(&sdl);
    let mut events = sdl.event_pump().unwrap();

    let cycle_time = Duration::from_nanos(CLOCK_SPEED);
    let mut last_cycle = Instant::now();
    let mut timers = IntervalTimer::new(Duration::from_secs(1) / TIMER_RATE);

    'event: loop {
        // If the machine changed the framebuffer, repaint
        if let Some(frame) = machine.take_frame() {
            display.render(&frame);
        }

        // Handle input
        for event in events.poll_iter() {
            match event {
                Event::Quit { .. } => break 'event,
                Event::KeyDown {
                    keycode: Some(key), ..
                } => match (key, keymap(key)) {
                    (_, Some(kc)) => machine.key_press(kc),
                    (Keycode::Space, _) => machine.toggle_pause(),
                    (Keycode::F5, _) => machine.reset(),
                    (Keycode::Escape, _) => break 'event,
                    _ => continue,
                },
                Event::KeyUp {
                    keycode: Some(key), ..
                } => match keymap(key) {
                    Some(kc) => machine.key_release(kc),
                    None => continue,
                },
                _ => continue,
            };
        }

        // Update state; timers run at their own cadence
        if !machine.is_paused() {
            if let Err(e) = machine.step() {
                eprintln!("execution halted: {}", e);
                break 'event;
            }
            if timers.tick() {
                machine.tick_timers();
            }
        }

        // Handle timing
        let current_time = Instant::now();
        let elapsed_cycle_time = current_time - last_cycle;
        if cycle_time > elapsed_cycle_time {
            std::thread::sleep(cycle_time - elapsed_cycle_time);
        }
        last_cycle = current_time;
    }

    Ok(())
}
