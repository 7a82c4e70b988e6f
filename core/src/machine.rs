use std::io::Read;

use crate::constants::MEMORY_SIZE;
use crate::error::Error;
use crate::instruction::Instruction;
use crate::operations;
use crate::state::{FrameBuffer, State};

/// The fetch-decode-execute engine wrapped around a machine state.
///
/// Supplies interfaces for:
/// - loading a program image
/// - advancing the CPU by single instructions
/// - ticking the countdown timers at the caller's cadence
/// - pressing and releasing hex pad keys
/// - consuming the framebuffer when it has changed
///
/// The machine is single-threaded and synchronous: the caller owns the
/// instruction cadence, the timer cadence, and all input/display plumbing.
/// Cancellation is simply ceasing to call `step`.
pub struct Machine {
    state: State,
    trace: bool,
}

impl Machine {
    pub fn new() -> Self {
        Machine {
            state: State::new(),
            trace: false,
        }
    }

    /// Loads a program image from a byte source.
    ///
    /// Surfaces `SourceUnavailable` when the source cannot be read and
    /// `ImageTooLarge` when the image does not fit above the load address.
    /// Both are fatal to the load attempt; the caller should not start
    /// execution after either.
    pub fn load_rom(&mut self, reader: &mut dyn Read) -> Result<(), Error> {
        let mut image = Vec::new();
        reader.read_to_end(&mut image)?;
        self.state.load_image(&image)
    }

    /// Soft reset: the loaded program survives, everything else restarts.
    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// Executes one fetch-decode-execute cycle.
    ///
    /// Does nothing once the machine has halted. A decode or execute error
    /// clears the running flag before being surfaced, so a broken program
    /// stops rather than skipping the offending instruction.
    pub fn step(&mut self) -> Result<(), Error> {
        if !self.state.running {
            return Ok(());
        }

        let word = self.fetch();
        self.state.opcode = word;

        let result = Instruction::decode(word).and_then(|instruction| {
            if self.trace {
                println!("{:04X}: {:04X}  {}", self.state.pc, word, instruction);
            }
            operations::execute(&mut self.state, instruction)
        });
        if result.is_err() {
            self.state.running = false;
        }
        result
    }

    /// Decrements both countdown timers, clamped at zero.
    ///
    /// Invoked by the caller at a fixed rate (conventionally 60 Hz),
    /// decoupled from instruction throughput; instruction execution never
    /// touches the timers.
    pub fn tick_timers(&mut self) {
        if self.state.delay_timer > 0 {
            self.state.delay_timer -= 1;
        }
        if self.state.sound_timer > 0 {
            self.state.sound_timer -= 1;
        }
    }

    /// Marks a hex pad key as down.
    pub fn key_press(&mut self, key: u8) {
        if let Some(slot) = self.state.keys.get_mut(key as usize) {
            *slot = true;
        }
    }

    /// Marks a hex pad key as up.
    pub fn key_release(&mut self, key: u8) {
        if let Some(slot) = self.state.keys.get_mut(key as usize) {
            *slot = false;
        }
    }

    /// Returns the framebuffer and consumes the changed flag, or `None`
    /// when nothing changed since the last take.
    pub fn take_frame(&mut self) -> Option<FrameBuffer> {
        if self.state.draw_flag {
            self.state.draw_flag = false;
            Some(self.state.frame_buffer)
        } else {
            None
        }
    }

    pub fn toggle_pause(&mut self) {
        self.state.paused = !self.state.paused;
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    /// The sound timer value, exposed for the host audio layer; a beep is
    /// conventionally audible while this is nonzero.
    pub fn sound_timer(&self) -> u8 {
        self.state.sound_timer
    }

    /// Enables per-cycle printing of the fetched word and its mnemonic.
    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    /// Reads the big-endian instruction word at the program counter.
    fn fetch(&self) -> u16 {
        let pc = self.state.pc as usize & (MEMORY_SIZE - 1);
        let high = u16::from(self.state.memory[pc]);
        let low = u16::from(self.state.memory[(pc + 1) & (MEMORY_SIZE - 1)]);
        high << 8 | low
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_combines_two_bytes_big_endian() {
        let mut machine = Machine::new();
        machine.state.memory[0x200..0x202].copy_from_slice(&[0xAA, 0xBB]);
        assert_eq!(machine.fetch(), 0xAABB);
    }

    #[test]
    fn test_load_rom_from_reader() {
        let mut machine = Machine::new();
        let image: &[u8] = &[0x60, 0x0A, 0x61, 0x05];
        machine.load_rom(&mut &image[..]).unwrap();
        assert_eq!(machine.state.memory[0x200..0x204], [0x60, 0x0A, 0x61, 0x05]);
    }

    #[test]
    fn test_load_rom_rejects_oversized_image() {
        let mut machine = Machine::new();
        let image = vec![0u8; 0xE00];
        match machine.load_rom(&mut &image[..]) {
            Err(Error::ImageTooLarge(0xE00)) => {}
            other => panic!("expected ImageTooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_arithmetic_scenario_over_three_cycles() {
        let mut machine = Machine::new();
        let image: &[u8] = &[0x60, 0x0A, 0x61, 0x05, 0x80, 0x14, 0x00, 0x00];
        machine.load_rom(&mut &image[..]).unwrap();

        machine.step().unwrap();
        machine.step().unwrap();
        machine.step().unwrap();

        assert_eq!(machine.state.v[0], 15);
        assert_eq!(machine.state.v[1], 5);
        assert_eq!(machine.state.v[0xF], 0);
        assert_eq!(machine.state.pc, 0x206);
    }

    #[test]
    fn test_unknown_opcode_halts_the_machine() {
        let mut machine = Machine::new();
        machine.state.memory[0x200..0x202].copy_from_slice(&[0xFF, 0xFF]);
        match machine.step() {
            Err(Error::UnknownOpcode(0xFFFF)) => {}
            other => panic!("expected UnknownOpcode, got {:?}", other),
        }
        assert!(!machine.is_running());

        // a halted machine no longer steps
        let pc = machine.state.pc;
        machine.step().unwrap();
        assert_eq!(machine.state.pc, pc);
    }

    #[test]
    fn test_fatal_operation_error_halts_the_machine() {
        let mut machine = Machine::new();
        machine.state.memory[0x200..0x202].copy_from_slice(&[0x00, 0xEE]);
        assert!(machine.step().is_err());
        assert!(!machine.is_running());
    }

    #[test]
    fn test_tick_timers_decrements_and_clamps() {
        let mut machine = Machine::new();
        machine.state.delay_timer = 2;
        machine.state.sound_timer = 1;

        machine.tick_timers();
        assert_eq!(machine.state.delay_timer, 1);
        assert_eq!(machine.state.sound_timer, 0);

        machine.tick_timers();
        machine.tick_timers();
        assert_eq!(machine.state.delay_timer, 0);
        assert_eq!(machine.state.sound_timer, 0);
    }

    #[test]
    fn test_take_frame_consumes_the_changed_flag() {
        let mut machine = Machine::new();
        assert!(machine.take_frame().is_none());

        machine.state.frame_buffer[0][0] = 1;
        machine.state.draw_flag = true;
        let frame = machine.take_frame().expect("frame should be available");
        assert_eq!(frame[0][0], 1);
        assert!(machine.take_frame().is_none());
    }

    #[test]
    fn test_key_wait_cycle_via_step() {
        let mut machine = Machine::new();
        machine.state.memory[0x200..0x202].copy_from_slice(&[0xF1, 0x0A]);

        machine.step().unwrap();
        machine.step().unwrap();
        assert_eq!(machine.state.pc, 0x200);

        machine.key_press(0x7);
        machine.step().unwrap();
        assert_eq!(machine.state.pc, 0x202);
        assert_eq!(machine.state.v[1], 0x7);
    }

    #[test]
    fn test_key_press_and_release_update_the_bank() {
        let mut machine = Machine::new();
        machine.key_press(0xE);
        assert!(machine.state.keys[0xE]);
        machine.key_release(0xE);
        assert!(!machine.state.keys[0xE]);
        // indices off the pad are ignored rather than panicking
        machine.key_press(0x42);
    }

    #[test]
    fn test_toggle_pause() {
        let mut machine = Machine::new();
        assert!(!machine.is_paused());
        machine.toggle_pause();
        assert!(machine.is_paused());
        machine.toggle_pause();
        assert!(!machine.is_paused());
    }

    #[test]
    fn test_reset_restarts_the_loaded_program() {
        let mut machine = Machine::new();
        let image: &[u8] = &[0x60, 0x0A, 0x61, 0x05];
        machine.load_rom(&mut &image[..]).unwrap();
        machine.step().unwrap();
        assert_eq!(machine.state.v[0], 0x0A);

        machine.reset();
        assert_eq!(machine.state.pc, 0x200);
        assert_eq!(machine.state.v[0], 0);
        machine.step().unwrap();
        assert_eq!(machine.state.v[0], 0x0A);
    }
}
