use std::fmt;

use crate::error::Error;

/// A decoded instruction word.
///
/// Instruction words are 16 bits, classified by their high nibble and, for
/// the 0x0/0x8/0xE/0xF families, sub-classified by the low byte or nibble.
/// Decoding extracts the operands up front:
/// - `x` / `y` are register indices from nibbles 2 and 3
/// - `kk` is the low byte immediate
/// - `nnn` is the low 12-bit address immediate
/// - `n` is the low nibble immediate
///
/// Separating decode from execution keeps the opcode table independently
/// testable; a word matching no pattern is an `UnknownOpcode` error rather
/// than a silent skip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Instruction {
    /// 00E0 - zero the framebuffer
    Clear,
    /// 00EE - return from subroutine
    Return,
    /// 1NNN - jump to NNN
    Jump { nnn: u16 },
    /// 2NNN - call subroutine at NNN
    Call { nnn: u16 },
    /// 3XKK - skip next instruction if VX == KK
    SkipEqImm { x: usize, kk: u8 },
    /// 4XKK - skip next instruction if VX != KK
    SkipNeImm { x: usize, kk: u8 },
    /// 5XY0 - skip next instruction if VX == VY
    SkipEqReg { x: usize, y: usize },
    /// 6XKK - VX = KK
    LoadImm { x: usize, kk: u8 },
    /// 7XKK - VX += KK, wrapping, no carry
    AddImm { x: usize, kk: u8 },
    /// 8XY0 - VX = VY
    Move { x: usize, y: usize },
    /// 8XY1 - VX |= VY
    Or { x: usize, y: usize },
    /// 8XY2 - VX &= VY
    And { x: usize, y: usize },
    /// 8XY3 - VX ^= VY
    Xor { x: usize, y: usize },
    /// 8XY4 - VX += VY, VF = carry
    AddReg { x: usize, y: usize },
    /// 8XY5 - VX -= VY, VF = no-borrow
    SubReg { x: usize, y: usize },
    /// 8XY6 - VX >>= 1, VF = shifted-out bit
    ShiftRight { x: usize },
    /// 8XY7 - VX = VY - VX, VF = no-borrow
    SubReversed { x: usize, y: usize },
    /// 8XYE - VX <<= 1, VF = shifted-out bit
    ShiftLeft { x: usize },
    /// 9XY0 - skip next instruction if VX != VY
    SkipNeReg { x: usize, y: usize },
    /// ANNN - I = NNN
    LoadIndex { nnn: u16 },
    /// BNNN - jump to NNN + V0
    JumpOffset { nnn: u16 },
    /// CXKK - VX = random byte & KK
    Random { x: usize, kk: u8 },
    /// DXYN - draw an N-row sprite from memory[I] at (VX, VY)
    Draw { x: usize, y: usize, n: u8 },
    /// EX9E - skip next instruction if key VX is down
    SkipKeyDown { x: usize },
    /// EXA1 - skip next instruction if key VX is up
    SkipKeyUp { x: usize },
    /// FX07 - VX = delay timer
    ReadDelay { x: usize },
    /// FX0A - poll for a key press into VX, repeating until one arrives
    WaitKey { x: usize },
    /// FX15 - delay timer = VX
    SetDelay { x: usize },
    /// FX18 - sound timer = VX
    SetSound { x: usize },
    /// FX1E - I += VX, wrapping, no flag
    AddIndex { x: usize },
    /// FX29 - I = font address of glyph VX
    LoadGlyph { x: usize },
    /// FX33 - memory[I..I+3] = BCD digits of VX
    StoreBcd { x: usize },
    /// FX55 - memory[I..=I+X] = V0..=VX; I += X+1
    StoreRegisters { x: usize },
    /// FX65 - V0..=VX = memory[I..=I+X]; I += X+1
    LoadRegisters { x: usize },
}

impl Instruction {
    /// Decodes an instruction word into an operation with its operands
    /// extracted, or `UnknownOpcode` if the nibble pattern matches nothing.
    pub fn decode(word: u16) -> Result<Self, Error> {
        let x = ((word & 0x0F00) >> 8) as usize;
        let y = ((word & 0x00F0) >> 4) as usize;
        let n = (word & 0x000F) as u8;
        let kk = (word & 0x00FF) as u8;
        let nnn = word & 0x0FFF;

        let nibbles = (((word & 0xF000) >> 12) as u8, x as u8, y as u8, n);

        match nibbles {
            (0x0, 0x0, 0xE, 0x0) => Ok(Instruction::Clear),
            (0x0, 0x0, 0xE, 0xE) => Ok(Instruction::Return),
            (0x1, ..) => Ok(Instruction::Jump { nnn }),
            (0x2, ..) => Ok(Instruction::Call { nnn }),
            (0x3, ..) => Ok(Instruction::SkipEqImm { x, kk }),
            (0x4, ..) => Ok(Instruction::SkipNeImm { x, kk }),
            (0x5, .., 0x0) => Ok(Instruction::SkipEqReg { x, y }),
            (0x6, ..) => Ok(Instruction::LoadImm { x, kk }),
            (0x7, ..) => Ok(Instruction::AddImm { x, kk }),
            (0x8, .., 0x0) => Ok(Instruction::Move { x, y }),
            (0x8, .., 0x1) => Ok(Instruction::Or { x, y }),
            (0x8, .., 0x2) => Ok(Instruction::And { x, y }),
            (0x8, .., 0x3) => Ok(Instruction::Xor { x, y }),
            (0x8, .., 0x4) => Ok(Instruction::AddReg { x, y }),
            (0x8, .., 0x5) => Ok(Instruction::SubReg { x, y }),
            (0x8, .., 0x6) => Ok(Instruction::ShiftRight { x }),
            (0x8, .., 0x7) => Ok(Instruction::SubReversed { x, y }),
            (0x8, .., 0xE) => Ok(Instruction::ShiftLeft { x }),
            (0x9, .., 0x0) => Ok(Instruction::SkipNeReg { x, y }),
            (0xA, ..) => Ok(Instruction::LoadIndex { nnn }),
            (0xB, ..) => Ok(Instruction::JumpOffset { nnn }),
            (0xC, ..) => Ok(Instruction::Random { x, kk }),
            (0xD, ..) => Ok(Instruction::Draw { x, y, n }),
            (0xE, _, 0x9, 0xE) => Ok(Instruction::SkipKeyDown { x }),
            (0xE, _, 0xA, 0x1) => Ok(Instruction::SkipKeyUp { x }),
            (0xF, _, 0x0, 0x7) => Ok(Instruction::ReadDelay { x }),
            (0xF, _, 0x0, 0xA) => Ok(Instruction::WaitKey { x }),
            (0xF, _, 0x1, 0x5) => Ok(Instruction::SetDelay { x }),
            (0xF, _, 0x1, 0x8) => Ok(Instruction::SetSound { x }),
            (0xF, _, 0x1, 0xE) => Ok(Instruction::AddIndex { x }),
            (0xF, _, 0x2, 0x9) => Ok(Instruction::LoadGlyph { x }),
            (0xF, _, 0x3, 0x3) => Ok(Instruction::StoreBcd { x }),
            (0xF, _, 0x5, 0x5) => Ok(Instruction::StoreRegisters { x }),
            (0xF, _, 0x6, 0x5) => Ok(Instruction::LoadRegisters { x }),
            _ => Err(Error::UnknownOpcode(word)),
        }
    }
}

/// Cowgod-style mnemonics, used by the execution trace
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Instruction::Clear => write!(f, "CLS"),
            Instruction::Return => write!(f, "RET"),
            Instruction::Jump { nnn } => write!(f, "JP {:#05X}", nnn),
            Instruction::Call { nnn } => write!(f, "CALL {:#05X}", nnn),
            Instruction::SkipEqImm { x, kk } => write!(f, "SE V{:X}, {:#04X}", x, kk),
            Instruction::SkipNeImm { x, kk } => write!(f, "SNE V{:X}, {:#04X}", x, kk),
            Instruction::SkipEqReg { x, y } => write!(f, "SE V{:X}, V{:X}", x, y),
            Instruction::LoadImm { x, kk } => write!(f, "LD V{:X}, {:#04X}", x, kk),
            Instruction::AddImm { x, kk } => write!(f, "ADD V{:X}, {:#04X}", x, kk),
            Instruction::Move { x, y } => write!(f, "LD V{:X}, V{:X}", x, y),
            Instruction::Or { x, y } => write!(f, "OR V{:X}, V{:X}", x, y),
            Instruction::And { x, y } => write!(f, "AND V{:X}, V{:X}", x, y),
            Instruction::Xor { x, y } => write!(f, "XOR V{:X}, V{:X}", x, y),
            Instruction::AddReg { x, y } => write!(f, "ADD V{:X}, V{:X}", x, y),
            Instruction::SubReg { x, y } => write!(f, "SUB V{:X}, V{:X}", x, y),
            Instruction::ShiftRight { x } => write!(f, "SHR V{:X}", x),
            Instruction::SubReversed { x, y } => write!(f, "SUBN V{:X}, V{:X}", x, y),
            Instruction::ShiftLeft { x } => write!(f, "SHL V{:X}", x),
            Instruction::SkipNeReg { x, y } => write!(f, "SNE V{:X}, V{:X}", x, y),
            Instruction::LoadIndex { nnn } => write!(f, "LD I, {:#05X}", nnn),
            Instruction::JumpOffset { nnn } => write!(f, "JP V0, {:#05X}", nnn),
            Instruction::Random { x, kk } => write!(f, "RND V{:X}, {:#04X}", x, kk),
            Instruction::Draw { x, y, n } => write!(f, "DRW V{:X}, V{:X}, {:X}", x, y, n),
            Instruction::SkipKeyDown { x } => write!(f, "SKP V{:X}", x),
            Instruction::SkipKeyUp { x } => write!(f, "SKNP V{:X}", x),
            Instruction::ReadDelay { x } => write!(f, "LD V{:X}, DT", x),
            Instruction::WaitKey { x } => write!(f, "LD V{:X}, K", x),
            Instruction::SetDelay { x } => write!(f, "LD DT, V{:X}", x),
            Instruction::SetSound { x } => write!(f, "LD ST, V{:X}", x),
            Instruction::AddIndex { x } => write!(f, "ADD I, V{:X}", x),
            Instruction::LoadGlyph { x } => write!(f, "LD F, V{:X}", x),
            Instruction::StoreBcd { x } => write!(f, "LD B, V{:X}", x),
            Instruction::StoreRegisters { x } => write!(f, "LD [I], V{:X}", x),
            Instruction::LoadRegisters { x } => write!(f, "LD V{:X}, [I]", x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_fixed_function_opcodes() {
        assert_eq!(Instruction::decode(0x00E0).unwrap(), Instruction::Clear);
        assert_eq!(Instruction::decode(0x00EE).unwrap(), Instruction::Return);
    }

    #[test]
    fn test_decode_address_operands() {
        assert_eq!(
            Instruction::decode(0x1ABC).unwrap(),
            Instruction::Jump { nnn: 0xABC }
        );
        assert_eq!(
            Instruction::decode(0x2123).unwrap(),
            Instruction::Call { nnn: 0x123 }
        );
        assert_eq!(
            Instruction::decode(0xA0F5).unwrap(),
            Instruction::LoadIndex { nnn: 0x0F5 }
        );
        assert_eq!(
            Instruction::decode(0xB321).unwrap(),
            Instruction::JumpOffset { nnn: 0x321 }
        );
    }

    #[test]
    fn test_decode_immediate_operands() {
        assert_eq!(
            Instruction::decode(0x6A42).unwrap(),
            Instruction::LoadImm { x: 0xA, kk: 0x42 }
        );
        assert_eq!(
            Instruction::decode(0x7B01).unwrap(),
            Instruction::AddImm { x: 0xB, kk: 0x01 }
        );
        assert_eq!(
            Instruction::decode(0xC3F0).unwrap(),
            Instruction::Random { x: 0x3, kk: 0xF0 }
        );
    }

    #[test]
    fn test_decode_register_pair_family() {
        assert_eq!(
            Instruction::decode(0x8120).unwrap(),
            Instruction::Move { x: 1, y: 2 }
        );
        assert_eq!(
            Instruction::decode(0x8121).unwrap(),
            Instruction::Or { x: 1, y: 2 }
        );
        assert_eq!(
            Instruction::decode(0x8124).unwrap(),
            Instruction::AddReg { x: 1, y: 2 }
        );
        assert_eq!(
            Instruction::decode(0x8346).unwrap(),
            Instruction::ShiftRight { x: 3 }
        );
        assert_eq!(
            Instruction::decode(0x834E).unwrap(),
            Instruction::ShiftLeft { x: 3 }
        );
    }

    #[test]
    fn test_decode_draw_operands() {
        assert_eq!(
            Instruction::decode(0xD125).unwrap(),
            Instruction::Draw { x: 1, y: 2, n: 5 }
        );
    }

    #[test]
    fn test_decode_key_and_timer_family() {
        assert_eq!(
            Instruction::decode(0xE19E).unwrap(),
            Instruction::SkipKeyDown { x: 1 }
        );
        assert_eq!(
            Instruction::decode(0xE1A1).unwrap(),
            Instruction::SkipKeyUp { x: 1 }
        );
        assert_eq!(
            Instruction::decode(0xF10A).unwrap(),
            Instruction::WaitKey { x: 1 }
        );
        assert_eq!(
            Instruction::decode(0xF533).unwrap(),
            Instruction::StoreBcd { x: 5 }
        );
        assert_eq!(
            Instruction::decode(0xF455).unwrap(),
            Instruction::StoreRegisters { x: 4 }
        );
        assert_eq!(
            Instruction::decode(0xF465).unwrap(),
            Instruction::LoadRegisters { x: 4 }
        );
    }

    #[test]
    fn test_decode_rejects_unknown_patterns() {
        for &word in &[0x0000u16, 0x00E1, 0x5121, 0x8128, 0xE1FF, 0xF1FF] {
            match Instruction::decode(word) {
                Err(Error::UnknownOpcode(w)) => assert_eq!(w, word),
                other => panic!("expected UnknownOpcode for {:#06X}, got {:?}", word, other),
            }
        }
    }

    #[test]
    fn test_display_renders_mnemonics() {
        assert_eq!(Instruction::decode(0x00E0).unwrap().to_string(), "CLS");
        assert_eq!(Instruction::decode(0x1ABC).unwrap().to_string(), "JP 0xABC");
        assert_eq!(
            Instruction::decode(0x8124).unwrap().to_string(),
            "ADD V1, V2"
        );
    }
}
