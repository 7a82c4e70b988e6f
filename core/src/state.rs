use crate::constants::{
    DISPLAY_HEIGHT, DISPLAY_WIDTH, MEMORY_SIZE, NUM_KEYS, NUM_REGISTERS, PROGRAM_START,
    SPRITE_SHEET, STACK_DEPTH,
};
use crate::error::Error;

/// The framebuffer is indexed as [y][x]; only the low bit of each cell is
/// meaningful
pub type FrameBuffer = [[u8; DISPLAY_WIDTH]; DISPLAY_HEIGHT];

/// The complete machine state
///
/// ## CPU
/// - (v) 16 8-bit registers V0..VF; VF doubles as the carry/borrow/collision
///   flag and is still usable as a general register
/// - (i) a 16-bit memory address register
/// - (pc) a 16-bit program counter, always even, starting at 0x200
/// - (sp) the call stack pointer, 0..=16
///
/// ## Memory
/// - 4096 bytes of addressable memory; the glyph font occupies 0..80 and
///   program images are loaded from 0x200
/// - a 16-slot call stack of return addresses
/// - a 64x32 1-bit framebuffer
///
/// ## Timers
/// - two 8-bit countdowns (delay & sound), decremented only by the
///   externally paced timer tick, never by instruction execution
///
/// ## Input
/// - the pressed state of the 16 hex pad keys, written only by the host
///   input layer
///
/// ## Control flags
/// - `running` is cleared by the engine on any fatal error
/// - `draw_flag` is set whenever the framebuffer changes and consumed by the
///   display
/// - `paused` and `key_captured` are bookkeeping for the host loop and the
///   wait-for-key instruction respectively
///
/// The state is a plain aggregate with no behavior beyond lifecycle
/// management; it is owned by the caller and passed by reference to every
/// operation.
pub struct State {
    pub memory: [u8; MEMORY_SIZE],
    pub v: [u8; NUM_REGISTERS],
    pub i: u16,
    pub pc: u16,
    pub stack: [u16; STACK_DEPTH],
    pub sp: u8,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub frame_buffer: FrameBuffer,
    pub keys: [bool; NUM_KEYS],
    pub opcode: u16,
    pub running: bool,
    pub draw_flag: bool,
    pub paused: bool,
    pub key_captured: bool,
}

impl State {
    /// Full initialization: everything zeroed, the font seeded at address 0,
    /// and the program counter at the load address.
    pub fn new() -> Self {
        let mut memory = [0; MEMORY_SIZE];
        memory[..SPRITE_SHEET.len()].copy_from_slice(&SPRITE_SHEET);

        State {
            memory,
            v: [0; NUM_REGISTERS],
            i: 0,
            pc: PROGRAM_START,
            stack: [0; STACK_DEPTH],
            sp: 0,
            delay_timer: 0,
            sound_timer: 0,
            frame_buffer: [[0; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
            keys: [false; NUM_KEYS],
            opcode: 0,
            running: true,
            draw_flag: false,
            paused: false,
            key_captured: false,
        }
    }

    /// Soft reset: identical to a full initialization except the program
    /// image resident from 0x200 onward is left in place, so the machine can
    /// restart without reloading its ROM. Memory between the font table and
    /// the load address is cleared.
    pub fn reset(&mut self) {
        self.memory[SPRITE_SHEET.len()..PROGRAM_START as usize]
            .iter_mut()
            .for_each(|byte| *byte = 0);
        self.v = [0; NUM_REGISTERS];
        self.i = 0;
        self.pc = PROGRAM_START;
        self.stack = [0; STACK_DEPTH];
        self.sp = 0;
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.frame_buffer = [[0; DISPLAY_WIDTH]; DISPLAY_HEIGHT];
        self.keys = [false; NUM_KEYS];
        self.opcode = 0;
        self.running = true;
        self.draw_flag = false;
        self.paused = false;
        self.key_captured = false;
    }

    /// Copies a program image verbatim into memory at the load address.
    ///
    /// Fails with `ImageTooLarge` when the image would spill past the end of
    /// addressable memory; nothing is copied in that case.
    pub fn load_image(&mut self, image: &[u8]) -> Result<(), Error> {
        let start = PROGRAM_START as usize;
        if image.len() > 0xFFF - start {
            return Err(Error::ImageTooLarge(image.len()));
        }
        self.memory[start..start + image.len()].copy_from_slice(image);
        Ok(())
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_seeds_font_and_pc() {
        let state = State::new();
        assert_eq!(state.memory[0..5], SPRITE_SHEET[0..5]);
        assert_eq!(state.memory[75..80], SPRITE_SHEET[75..80]);
        assert_eq!(state.pc, 0x200);
        assert_eq!(state.sp, 0);
        assert!(state.running);
        assert!(!state.draw_flag);
    }

    #[test]
    fn test_load_image_copies_at_program_start() {
        let mut state = State::new();
        state.load_image(&[0xAA, 0xBB, 0xCC]).unwrap();
        assert_eq!(state.memory[0x200..0x203], [0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn test_load_image_rejects_oversized_image() {
        let mut state = State::new();
        let image = vec![0; 0xE00];
        match state.load_image(&image) {
            Err(Error::ImageTooLarge(len)) => assert_eq!(len, 0xE00),
            other => panic!("expected ImageTooLarge, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_load_image_accepts_maximum_size() {
        let mut state = State::new();
        let image = vec![0x42; 0xDFF];
        assert!(state.load_image(&image).is_ok());
        assert_eq!(state.memory[0xFFE], 0x42);
    }

    #[test]
    fn test_reset_preserves_program_image() {
        let mut state = State::new();
        state.load_image(&[0x12, 0x34]).unwrap();
        state.v[3] = 0xFF;
        state.pc = 0x300;
        state.sp = 4;
        state.delay_timer = 9;
        state.keys[2] = true;
        state.frame_buffer[0][0] = 1;
        state.memory[100] = 0x55;

        state.reset();

        assert_eq!(state.memory[0x200..0x202], [0x12, 0x34]);
        assert_eq!(state.memory[100], 0);
        assert_eq!(state.memory[0..5], SPRITE_SHEET[0..5]);
        assert_eq!(state.v[3], 0);
        assert_eq!(state.pc, 0x200);
        assert_eq!(state.sp, 0);
        assert_eq!(state.delay_timer, 0);
        assert!(!state.keys[2]);
        assert_eq!(state.frame_buffer[0][0], 0);
        assert!(state.running);
    }
}
