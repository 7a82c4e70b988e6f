use crate::constants::{
    DISPLAY_HEIGHT, DISPLAY_WIDTH, GLYPH_STRIDE, INSTRUCTION_WIDTH, MEMORY_SIZE, NUM_KEYS,
    STACK_DEPTH,
};
use crate::error::Error;
use crate::instruction::Instruction;
use crate::state::State;

/// Executes a single decoded instruction against the machine state.
///
/// Program counter advancement belongs to the individual operations, not the
/// caller: most advance by one instruction width, conditional skips by one or
/// two, and the control-transfer operations assign the counter directly.
/// The only operation that may leave the counter untouched is the
/// cooperative key wait.
pub fn execute(state: &mut State, instruction: Instruction) -> Result<(), Error> {
    match instruction {
        Instruction::Clear => clear(state),
        Instruction::Return => ret(state),
        Instruction::Jump { nnn } => jump(state, nnn),
        Instruction::Call { nnn } => call(state, nnn),
        Instruction::SkipEqImm { x, kk } => skip_eq_imm(state, x, kk),
        Instruction::SkipNeImm { x, kk } => skip_ne_imm(state, x, kk),
        Instruction::SkipEqReg { x, y } => skip_eq_reg(state, x, y),
        Instruction::SkipNeReg { x, y } => skip_ne_reg(state, x, y),
        Instruction::LoadImm { x, kk } => load_imm(state, x, kk),
        Instruction::AddImm { x, kk } => add_imm(state, x, kk),
        Instruction::Move { x, y } => mv(state, x, y),
        Instruction::Or { x, y } => or(state, x, y),
        Instruction::And { x, y } => and(state, x, y),
        Instruction::Xor { x, y } => xor(state, x, y),
        Instruction::AddReg { x, y } => add_reg(state, x, y),
        Instruction::SubReg { x, y } => sub_reg(state, x, y),
        Instruction::SubReversed { x, y } => sub_reversed(state, x, y),
        Instruction::ShiftRight { x } => shift_right(state, x),
        Instruction::ShiftLeft { x } => shift_left(state, x),
        Instruction::LoadIndex { nnn } => load_index(state, nnn),
        Instruction::JumpOffset { nnn } => jump_offset(state, nnn),
        Instruction::Random { x, kk } => random(state, x, kk),
        Instruction::Draw { x, y, n } => draw(state, x, y, n),
        Instruction::SkipKeyDown { x } => skip_key(state, x, true),
        Instruction::SkipKeyUp { x } => skip_key(state, x, false),
        Instruction::ReadDelay { x } => read_delay(state, x),
        Instruction::WaitKey { x } => wait_key(state, x),
        Instruction::SetDelay { x } => set_delay(state, x),
        Instruction::SetSound { x } => set_sound(state, x),
        Instruction::AddIndex { x } => add_index(state, x),
        Instruction::LoadGlyph { x } => load_glyph(state, x),
        Instruction::StoreBcd { x } => store_bcd(state, x),
        Instruction::StoreRegisters { x } => store_registers(state, x),
        Instruction::LoadRegisters { x } => load_registers(state, x),
    }
}

fn advance(state: &mut State) {
    state.pc += INSTRUCTION_WIDTH;
}

/// Memory addresses derived from the index register are masked into the 4 KB
/// address space so a wild index can never index past the memory array.
fn mem_addr(base: u16, offset: usize) -> usize {
    (base as usize + offset) & (MEMORY_SIZE - 1)
}

/// 00E0: zero every framebuffer cell
fn clear(state: &mut State) -> Result<(), Error> {
    state.frame_buffer = [[0; DISPLAY_WIDTH]; DISPLAY_HEIGHT];
    state.draw_flag = true;
    advance(state);
    Ok(())
}

/// 00EE: PC = stack.pop(), then step past the original call site
fn ret(state: &mut State) -> Result<(), Error> {
    if state.sp == 0 {
        return Err(Error::StackUnderflow);
    }
    state.sp -= 1;
    state.pc = state.stack[state.sp as usize];
    advance(state);
    Ok(())
}

/// 1NNN: PC = NNN
fn jump(state: &mut State, nnn: u16) -> Result<(), Error> {
    state.pc = nnn;
    Ok(())
}

/// 2NNN: stack.push(PC); PC = NNN
fn call(state: &mut State, nnn: u16) -> Result<(), Error> {
    if state.sp as usize == STACK_DEPTH {
        return Err(Error::StackOverflow);
    }
    state.stack[state.sp as usize] = state.pc;
    state.sp += 1;
    state.pc = nnn;
    Ok(())
}

/// Advances two widths when the condition holds, one otherwise
fn skip_if(state: &mut State, condition: bool) -> Result<(), Error> {
    state.pc += if condition {
        INSTRUCTION_WIDTH * 2
    } else {
        INSTRUCTION_WIDTH
    };
    Ok(())
}

/// 3XKK: skip when VX == KK
fn skip_eq_imm(state: &mut State, x: usize, kk: u8) -> Result<(), Error> {
    let condition = state.v[x] == kk;
    skip_if(state, condition)
}

/// 4XKK: skip when VX != KK
fn skip_ne_imm(state: &mut State, x: usize, kk: u8) -> Result<(), Error> {
    let condition = state.v[x] != kk;
    skip_if(state, condition)
}

/// 5XY0: skip when VX == VY
fn skip_eq_reg(state: &mut State, x: usize, y: usize) -> Result<(), Error> {
    let condition = state.v[x] == state.v[y];
    skip_if(state, condition)
}

/// 9XY0: skip when VX != VY
fn skip_ne_reg(state: &mut State, x: usize, y: usize) -> Result<(), Error> {
    let condition = state.v[x] != state.v[y];
    skip_if(state, condition)
}

/// 6XKK: VX = KK
fn load_imm(state: &mut State, x: usize, kk: u8) -> Result<(), Error> {
    state.v[x] = kk;
    advance(state);
    Ok(())
}

/// 7XKK: VX += KK, wrapping; this family never touches the flag register
fn add_imm(state: &mut State, x: usize, kk: u8) -> Result<(), Error> {
    state.v[x] = state.v[x].wrapping_add(kk);
    advance(state);
    Ok(())
}

/// 8XY0: VX = VY
fn mv(state: &mut State, x: usize, y: usize) -> Result<(), Error> {
    state.v[x] = state.v[y];
    advance(state);
    Ok(())
}

/// 8XY1: VX |= VY
fn or(state: &mut State, x: usize, y: usize) -> Result<(), Error> {
    state.v[x] |= state.v[y];
    advance(state);
    Ok(())
}

/// 8XY2: VX &= VY
fn and(state: &mut State, x: usize, y: usize) -> Result<(), Error> {
    state.v[x] &= state.v[y];
    advance(state);
    Ok(())
}

/// 8XY3: VX ^= VY
fn xor(state: &mut State, x: usize, y: usize) -> Result<(), Error> {
    state.v[x] ^= state.v[y];
    advance(state);
    Ok(())
}

/// 8XY4: VX += VY; VF = carry
///
/// The flag is written before the truncated store, so with X = 0xF the sum
/// wins over the carry.
fn add_reg(state: &mut State, x: usize, y: usize) -> Result<(), Error> {
    let (sum, carry) = state.v[x].overflowing_add(state.v[y]);
    state.v[0xF] = carry as u8;
    state.v[x] = sum;
    advance(state);
    Ok(())
}

/// 8XY5: VX -= VY; VF = 1 iff VX was strictly greater than VY
fn sub_reg(state: &mut State, x: usize, y: usize) -> Result<(), Error> {
    let (vx, vy) = (state.v[x], state.v[y]);
    state.v[0xF] = (vx > vy) as u8;
    state.v[x] = vx.wrapping_sub(vy);
    advance(state);
    Ok(())
}

/// 8XY7: VX = VY - VX; VF = 1 iff VY was strictly greater than VX
fn sub_reversed(state: &mut State, x: usize, y: usize) -> Result<(), Error> {
    let (vx, vy) = (state.v[x], state.v[y]);
    state.v[0xF] = (vy > vx) as u8;
    state.v[x] = vy.wrapping_sub(vx);
    advance(state);
    Ok(())
}

/// 8XY6: VF = low bit of VX before the shift; VX >>= 1
fn shift_right(state: &mut State, x: usize) -> Result<(), Error> {
    state.v[0xF] = state.v[x] & 0x1;
    state.v[x] >>= 1;
    advance(state);
    Ok(())
}

/// 8XYE: VF = high bit of VX before the shift; VX <<= 1
fn shift_left(state: &mut State, x: usize) -> Result<(), Error> {
    state.v[0xF] = (state.v[x] & 0x80) >> 7;
    state.v[x] <<= 1;
    advance(state);
    Ok(())
}

/// ANNN: I = NNN
fn load_index(state: &mut State, nnn: u16) -> Result<(), Error> {
    state.i = nnn;
    advance(state);
    Ok(())
}

/// BNNN: PC = NNN + V0
fn jump_offset(state: &mut State, nnn: u16) -> Result<(), Error> {
    state.pc = nnn + u16::from(state.v[0]);
    Ok(())
}

/// CXKK: VX = uniformly random byte & KK
fn random(state: &mut State, x: usize, kk: u8) -> Result<(), Error> {
    state.v[x] = rand::random::<u8>() & kk;
    advance(state);
    Ok(())
}

/// DXYN: XOR an N-row sprite from memory[I] onto the framebuffer at
/// (VX, VY); VF = 1 iff any on pixel was turned off.
///
/// The flag is reset before the scan and only ever promoted to 1 during it.
/// Any set sprite bit whose target lies outside the grid is a reported
/// contract violation; the bounds check runs over the whole sprite before
/// any cell is toggled, so a failed draw leaves the framebuffer untouched.
fn draw(state: &mut State, x: usize, y: usize, n: u8) -> Result<(), Error> {
    let origin_x = state.v[x] as usize;
    let origin_y = state.v[y] as usize;

    for row in 0..n as usize {
        let bits = state.memory[mem_addr(state.i, row)];
        for col in 0..8 {
            if bits & (0x80 >> col) == 0 {
                continue;
            }
            let (px, py) = (origin_x + col, origin_y + row);
            if px >= DISPLAY_WIDTH || py >= DISPLAY_HEIGHT {
                return Err(Error::FramebufferOutOfBounds { x: px, y: py });
            }
        }
    }

    state.v[0xF] = 0;
    for row in 0..n as usize {
        let bits = state.memory[mem_addr(state.i, row)];
        for col in 0..8 {
            if bits & (0x80 >> col) == 0 {
                continue;
            }
            let cell = &mut state.frame_buffer[origin_y + row][origin_x + col];
            state.v[0xF] |= *cell;
            *cell ^= 1;
        }
    }

    state.draw_flag = true;
    advance(state);
    Ok(())
}

/// EX9E / EXA1: skip when the key named by VX is down (resp. up)
fn skip_key(state: &mut State, x: usize, want_down: bool) -> Result<(), Error> {
    let key = state.v[x];
    if key as usize >= NUM_KEYS {
        return Err(Error::KeyOutOfRange(key));
    }
    let condition = state.keys[key as usize] == want_down;
    skip_if(state, condition)
}

/// FX07: VX = delay timer
fn read_delay(state: &mut State, x: usize) -> Result<(), Error> {
    state.v[x] = state.delay_timer;
    advance(state);
    Ok(())
}

/// FX0A: cooperative key wait.
///
/// Scans the key bank in index order; the last pressed key wins. When
/// nothing is down the program counter is left untouched so the engine
/// re-executes this same instruction on the next cycle. This is the only
/// instruction whose re-execution is expected.
fn wait_key(state: &mut State, x: usize) -> Result<(), Error> {
    state.key_captured = false;
    for (key, &pressed) in state.keys.iter().enumerate() {
        if pressed {
            state.v[x] = key as u8;
            state.key_captured = true;
        }
    }
    if state.key_captured {
        advance(state);
    }
    Ok(())
}

/// FX15: delay timer = VX
fn set_delay(state: &mut State, x: usize) -> Result<(), Error> {
    state.delay_timer = state.v[x];
    advance(state);
    Ok(())
}

/// FX18: sound timer = VX
fn set_sound(state: &mut State, x: usize) -> Result<(), Error> {
    state.sound_timer = state.v[x];
    advance(state);
    Ok(())
}

/// FX1E: I += VX at 16-bit width; no overflow flag
fn add_index(state: &mut State, x: usize) -> Result<(), Error> {
    state.i = state.i.wrapping_add(u16::from(state.v[x]));
    advance(state);
    Ok(())
}

/// FX29: I = address of the font glyph for the digit in VX
fn load_glyph(state: &mut State, x: usize) -> Result<(), Error> {
    state.i = u16::from(state.v[x]) * GLYPH_STRIDE;
    advance(state);
    Ok(())
}

/// FX33: memory[I..I+3] = hundreds, tens, ones digits of VX
fn store_bcd(state: &mut State, x: usize) -> Result<(), Error> {
    let value = state.v[x];
    state.memory[mem_addr(state.i, 0)] = value / 100;
    state.memory[mem_addr(state.i, 1)] = value / 10 % 10;
    state.memory[mem_addr(state.i, 2)] = value % 10;
    advance(state);
    Ok(())
}

/// FX55: memory[I..=I+X] = V0..=VX; I advances past the written range
fn store_registers(state: &mut State, x: usize) -> Result<(), Error> {
    for offset in 0..=x {
        state.memory[mem_addr(state.i, offset)] = state.v[offset];
    }
    state.i = state.i.wrapping_add(x as u16 + 1);
    advance(state);
    Ok(())
}

/// FX65: V0..=VX = memory[I..=I+X]; I advances past the read range
fn load_registers(state: &mut State, x: usize) -> Result<(), Error> {
    for offset in 0..=x {
        state.v[offset] = state.memory[mem_addr(state.i, offset)];
    }
    state.i = state.i.wrapping_add(x as u16 + 1);
    advance(state);
    Ok(())
}
