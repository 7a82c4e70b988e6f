use std::fmt;
use std::io;

use crate::constants::{PROGRAM_START, STACK_DEPTH};

/// Everything that can go wrong inside the core.
///
/// `ImageTooLarge` and `SourceUnavailable` can only occur while loading a
/// program image, before execution starts. The remaining variants are fatal
/// to a running machine: the engine clears its running flag before
/// surfacing them, so a broken program never keeps stepping.
#[derive(Debug)]
pub enum Error {
    /// The fetched instruction word matches no defined operation
    UnknownOpcode(u16),
    /// The program image does not fit between 0x200 and the end of memory
    ImageTooLarge(usize),
    /// The program image bytes could not be read from their source
    SourceUnavailable(io::Error),
    /// A subroutine call was made with all 16 stack slots occupied
    StackOverflow,
    /// A return was executed with an empty call stack
    StackUnderflow,
    /// A sprite draw targeted a cell outside the 64x32 grid
    FramebufferOutOfBounds { x: usize, y: usize },
    /// A key-skip instruction read a register value above 0xF
    KeyOutOfRange(u8),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnknownOpcode(op) => write!(f, "unknown opcode {:#06X}", op),
            Error::ImageTooLarge(len) => write!(
                f,
                "program image is {} bytes but only {} fit above {:#05X}",
                len,
                0xFFF - PROGRAM_START,
                PROGRAM_START
            ),
            Error::SourceUnavailable(e) => write!(f, "unable to read program image: {}", e),
            Error::StackOverflow => {
                write!(f, "subroutine call exceeded the {} stack slots", STACK_DEPTH)
            }
            Error::StackUnderflow => write!(f, "subroutine return with an empty stack"),
            Error::FramebufferOutOfBounds { x, y } => {
                write!(f, "sprite draw outside the framebuffer at ({}, {})", x, y)
            }
            Error::KeyOutOfRange(key) => write!(f, "key index {:#04X} is not on the hex pad", key),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::SourceUnavailable(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::SourceUnavailable(e)
    }
}
