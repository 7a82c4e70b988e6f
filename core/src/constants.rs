/// Horizontal framebuffer resolution in pixels
pub const DISPLAY_WIDTH: usize = 64;

/// Vertical framebuffer resolution in pixels
pub const DISPLAY_HEIGHT: usize = 32;

/// Total addressable memory in bytes
pub const MEMORY_SIZE: usize = 4096;

/// Number of general purpose registers (V0..VF)
pub const NUM_REGISTERS: usize = 16;

/// Number of call stack slots
pub const STACK_DEPTH: usize = 16;

/// Number of keys on the hex pad
pub const NUM_KEYS: usize = 16;

/// Address at which program images are loaded and execution begins
pub const PROGRAM_START: u16 = 0x200;

/// Width of one instruction in memory addresses
pub const INSTRUCTION_WIDTH: u16 = 0x2;

/// Bytes per font glyph; glyph for digit d starts at d * GLYPH_STRIDE
pub const GLYPH_STRIDE: u16 = 5;

/// Nanoseconds per CPU cycle (500 Hz)
pub const CLOCK_SPEED: u64 = 2_000_000;

/// Timer decrement rate in Hz, decoupled from the CPU clock
pub const TIMER_RATE: u32 = 60;

/// The built-in glyph font for hex digits 0..F.
///
/// Each glyph is 5 bytes tall and 4 bits wide (high nibble), stored at the
/// bottom of memory starting at address 0.
pub const SPRITE_SHEET: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
