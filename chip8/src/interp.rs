//! Bytecode interpreter.
use log::{debug, error};
use rand::prelude::*;

use crate::{
    constants::*,
    cpu::Chip8Cpu,
    devices::KeyCode,
    display::Chip8DisplayBuffer,
    error::{Chip8Error, Chip8Result},
    memory::check_program_size,
    opcode::{Op, UnknownOpcode},
};

/// Outcome of a single executed instruction, used by the
/// run loop to decide what to do between steps.
#[derive(Debug, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Flow {
    Ok,
    /// The run loop was stopped by an external signal.
    Interrupt,
    /// Program counter has jumped to a new address.
    ///
    /// This is useful for the caller to avoid being
    /// blocked on infinite or long running loops.
    ///
    /// This is returned when the interpreter encounters:
    ///
    /// - 1nnn (`JP addr`)
    /// - 2nnn (`CALL addr`)
    /// - 00EE (`RET`)
    /// - Bnnn (`JP V0, addr`)
    Jump,
    /// The display buffer was changed.
    Draw,
    /// The sound timer was set.
    Sound,
    /// Wait for a keypress.
    ///
    /// This is triggered by the opcode `Fx0A` (`LD Vx, K`), which stops
    /// execution until a key is pressed, and loads the key value into `Vx`.
    KeyWait,
}

/// Fetch, decode and execute loop over the CPU state.
///
/// Executes exactly one instruction per call to [`Interpreter::step`].
/// Any error halts the interpreter, and it stays halted until
/// a program is loaded again.
pub struct Interpreter {
    cpu: Chip8Cpu,
    rng: StdRng,
    halted: bool,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Default::default()
    }

    /// Create an interpreter with a deterministic random source for `Cxnn`.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        let mut cpu = Chip8Cpu::new();
        cpu.registers.set_pc(MEM_START as Address);

        Self {
            cpu,
            rng,
            halted: false,
        }
    }

    /// Read-only view of the machine state.
    #[inline(always)]
    pub fn cpu(&self) -> &Chip8Cpu {
        &self.cpu
    }

    #[inline(always)]
    pub(crate) fn cpu_mut(&mut self) -> &mut Chip8Cpu {
        &mut self.cpu
    }

    #[inline]
    pub fn display(&self) -> Chip8DisplayBuffer<'_> {
        self.cpu.display.snapshot()
    }

    /// Reset the machine and load a program into memory.
    pub fn load(&mut self, bytecode: &[u8]) -> Chip8Result<()> {
        if !check_program_size(bytecode) {
            return Err(Chip8Error::LargeProgram {
                size: bytecode.len(),
                capacity: MEM_SIZE - MEM_START,
            });
        }

        // Start with clean memory to avoid leaking previous program.
        self.cpu.clear();

        self.cpu.memory.load(&FONTSET, FONTSET_START)?;
        self.cpu.memory.load_program(bytecode)?;

        // Reset the program counter to prepare for execution.
        self.cpu.registers.set_pc(MEM_START as Address);
        self.halted = false;

        debug!(
            "loaded {} byte program at 0x{:03X}",
            bytecode.len(),
            MEM_START
        );

        Ok(())
    }

    /// Stop execution. The interpreter stays halted until the next load.
    pub fn halt(&mut self) {
        if !self.halted {
            debug!("halt requested at 0x{:03X}", self.cpu.pc());
        }
        self.halted = true;
    }

    #[inline(always)]
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Sets the keyboard key input state.
    pub fn set_key(&mut self, key: KeyCode, pressed: bool) {
        self.cpu.keypad.set_key(key, pressed);
    }

    /// Count down both timers by one tick.
    ///
    /// Driven by an external clock, independent of instruction execution.
    pub fn tick_timers(&mut self) {
        self.cpu.tick_delay();
        self.cpu.tick_sound();
    }

    #[inline]
    pub fn delay_timer(&self) -> u8 {
        self.cpu.delay_timer
    }

    #[inline]
    pub fn sound_timer(&self) -> u8 {
        self.cpu.sound_timer
    }

    /// Execute a single instruction.
    ///
    /// On failure the interpreter is halted, and the program
    /// counter is left pointing at the faulting instruction.
    pub fn step(&mut self) -> Chip8Result<Flow> {
        if self.halted {
            return Err(Chip8Error::Halted);
        }

        let address = self.cpu.pc();

        match self.fetch_execute(address) {
            Ok(flow) => Ok(flow),
            Err(err) => {
                error!("halted at 0x{address:03X}: {err}");
                self.cpu.registers.set_pc(address);
                self.halted = true;
                Err(err)
            }
        }
    }

    fn fetch_execute(&mut self, address: Address) -> Chip8Result<Flow> {
        // Each instruction is two bytes, with the opcode identity in the first 4-bit nibble.
        let bytes = self.cpu.memory.read_word(address as usize)?;

        // Jump and call targets are absolute, so the counter
        // is moved past the instruction before it's executed.
        self.cpu.registers.advance_pc();

        let op = Op::try_from(bytes)
            .map_err(|UnknownOpcode(opcode)| Chip8Error::Decode { address, opcode })?;

        op_trace(address, bytes, &op);

        self.execute(op)
    }

    fn execute(&mut self, op: Op) -> Chip8Result<Flow> {
        let cpu = &mut self.cpu;
        let mut control_flow = Flow::Ok;

        match op {
            // 00E0 (CLS)
            //
            // Clear display
            Op::ClearScreen => {
                cpu.display.clear();
                control_flow = Flow::Draw;
            }
            // 00EE (RET)
            //
            // Return from a subroutine.
            // Set the program counter to the value at the top of the stack.
            Op::Return => {
                let pc = cpu.stack.pop()?;
                cpu.registers.set_pc(pc);
                control_flow = Flow::Jump;
            }
            // 1nnn (JP addr)
            //
            // Jump to address.
            Op::Jump { address } => {
                cpu.registers.set_pc(address);
                control_flow = Flow::Jump;
            }
            // 2nnn (CALL addr)
            //
            // Call subroutine at NNN. The program counter already
            // points at the instruction following the call.
            Op::Call { address } => {
                cpu.stack.push(cpu.registers.get_pc())?;
                cpu.registers.set_pc(address);
                control_flow = Flow::Jump;
            }
            // 3xnn (SE Vx, byte)
            //
            // Skip the next instruction if register VX equals value NN.
            Op::SkipEqByte { vx, nn } => {
                if cpu.v(vx) == nn {
                    cpu.registers.advance_pc();
                }
            }
            // 4xnn (SNE Vx, byte)
            //
            // Skip the next instruction if register VX does not equal value NN.
            Op::SkipNotEqByte { vx, nn } => {
                if cpu.v(vx) != nn {
                    cpu.registers.advance_pc();
                }
            }
            // 5xy0 (SE Vx, Vy)
            //
            // Skip the next instruction if register VX equals value VY.
            Op::SkipEq { vx, vy } => {
                if cpu.v(vx) == cpu.v(vy) {
                    cpu.registers.advance_pc();
                }
            }
            // 6xnn (LD Vx, byte)
            //
            // Set register VX to value NN.
            Op::LoadByte { vx, nn } => cpu.registers.set(vx, nn),
            // 7xnn (ADD Vx, byte)
            //
            // Add value NN to register VX. Carry flag is not set.
            Op::AddByte { vx, nn } => {
                let x = cpu.v(vx);
                cpu.registers.set(vx, x.wrapping_add(nn));
            }
            // ----------------------------------------------------------------
            // 8xy0 (LD Vx, Vy)
            Op::Load { vx, vy } => cpu.registers.set(vx, cpu.v(vy)),
            // 8xy1 (OR Vx, Vy)
            Op::Or { vx, vy } => cpu.registers.set(vx, cpu.v(vx) | cpu.v(vy)),
            // 8xy2 (AND Vx, Vy)
            Op::And { vx, vy } => cpu.registers.set(vx, cpu.v(vx) & cpu.v(vy)),
            // 8xy3 (XOR Vx, Vy)
            Op::Xor { vx, vy } => cpu.registers.set(vx, cpu.v(vx) ^ cpu.v(vy)),
            // 8xy4 (ADD Vx, Vy)
            //
            // Flag is written last, so it wins when VX is VF.
            Op::Add { vx, vy } => {
                let (result, carry) = cpu.v(vx).overflowing_add(cpu.v(vy));
                cpu.registers.set(vx, result);
                cpu.registers.set_flag(carry);
            }
            // 8xy5 (SUB Vx, Vy)
            //
            // VF is set to 0 when there is a borrow, set to 1 when there isn't.
            Op::Sub { vx, vy } => {
                let (result, borrow) = cpu.v(vx).overflowing_sub(cpu.v(vy));
                cpu.registers.set(vx, result);
                cpu.registers.set_flag(!borrow);
            }
            // 8xy6 (SHR Vx)
            //
            // VF is set to the bit shifted out.
            Op::ShiftRight { vx, .. } => {
                let x = cpu.v(vx);
                cpu.registers.set(vx, x >> 1);
                cpu.registers.set_flag(x & 1 == 1);
            }
            // 8xy7 (SUBN Vx, Vy)
            Op::SubReverse { vx, vy } => {
                let (result, borrow) = cpu.v(vy).overflowing_sub(cpu.v(vx));
                cpu.registers.set(vx, result);
                cpu.registers.set_flag(!borrow);
            }
            // 8xyE (SHL Vx)
            //
            // VF is set to the bit shifted out.
            Op::ShiftLeft { vx, .. } => {
                let x = cpu.v(vx);
                cpu.registers.set(vx, x << 1);
                cpu.registers.set_flag(x >> 7 == 1);
            }
            // ----------------------------------------------------------------
            // 9xy0 (SNE Vx, Vy)
            Op::SkipNotEq { vx, vy } => {
                if cpu.v(vx) != cpu.v(vy) {
                    cpu.registers.advance_pc();
                }
            }
            // Annn (LD I, addr)
            Op::LoadAddress { address } => cpu.registers.set_index(address),
            // Bnnn (JP V0, addr)
            Op::JumpOffset { address } => {
                cpu.registers.set_pc(address + cpu.v(0) as Address);
                control_flow = Flow::Jump;
            }
            // Cxnn (RND Vx, byte)
            //
            // Set register VX to the result of bitwise AND between a random number and NN.
            Op::Random { vx, nn } => {
                let value = self.rng.gen::<u8>() & nn;
                cpu.registers.set(vx, value);
            }
            // Dxyn (DRW Vx, Vy, nibble)
            //
            // Sprite is 8 pixels wide and N rows high, read from memory at address register I.
            //
            // If the drawing operation erases existing pixels in the display buffer, register VF is set to
            // 1, and set to 0 if no display bits are unset. This is used for collision detection.
            Op::Draw { vx, vy, n } => {
                let x = cpu.v(vx) as usize % DISPLAY_WIDTH;
                let y = cpu.v(vy) as usize % DISPLAY_HEIGHT;
                let rows = cpu
                    .memory
                    .slice(cpu.registers.get_index() as usize, n as usize)?;

                let is_erased = cpu.display.draw_sprite(x, y, rows);
                cpu.registers.set_flag(is_erased);
                control_flow = Flow::Draw;
            }
            // ----------------------------------------------------------------
            // Ex9E (SKP Vx)
            //
            // Skip the next instruction if the key in the low nibble of VX is down.
            Op::SkipKey { vx } => {
                if cpu.keypad.is_key_down(cpu.v(vx) & 0xF) {
                    cpu.registers.advance_pc();
                }
            }
            // ExA1 (SKNP Vx)
            Op::SkipNotKey { vx } => {
                if !cpu.keypad.is_key_down(cpu.v(vx) & 0xF) {
                    cpu.registers.advance_pc();
                }
            }
            // ----------------------------------------------------------------
            // Fx07 (LD Vx, DT)
            Op::LoadDelay { vx } => cpu.registers.set(vx, cpu.delay_timer),
            // Fx0A (LD Vx, K)
            //
            // Wait for a key press, store the value of the key in Vx.
            Op::WaitKey { vx } => match cpu.keypad.first_key() {
                Some(k) => cpu.registers.set(vx, k),
                None => {
                    // rewind the program counter to stall the machine
                    cpu.registers.rewind_pc();
                    control_flow = Flow::KeyWait;
                }
            },
            // Fx15 (LD DT, Vx)
            Op::SetDelay { vx } => cpu.delay_timer = cpu.v(vx),
            // Fx18 (LD ST, Vx)
            Op::SetSound { vx } => {
                cpu.sound_timer = cpu.v(vx);
                control_flow = Flow::Sound;
            }
            // Fx1E (ADD I, Vx)
            Op::AddAddress { vx } => {
                let addr = cpu.registers.get_index();
                cpu.registers
                    .set_index(addr.wrapping_add(cpu.v(vx) as Address));
            }
            // Fx29 (LD F, Vx)
            //
            // Set I = location of sprite for digit Vx.
            Op::LoadFont { vx } => {
                let digit = (cpu.v(vx) & 0xF) as usize;
                cpu.registers
                    .set_index((FONTSET_START + digit * FONTSET_HEIGHT) as Address);
            }
            // Fx33 (LD B, Vx)
            //
            // Store the binary-coded decimal representation of Vx
            // in the memory locations I, I+1, and I+2.
            #[rustfmt::skip]
            Op::StoreBcd { vx } => {
                let x = cpu.v(vx);
                let digits = cpu.memory.slice_mut(cpu.registers.get_index() as usize, 3)?;
                digits[0] = x / 100 % 10;
                digits[1] = x / 10  % 10;
                digits[2] = x       % 10;
            }
            // Fx55 (LD [I], Vx)
            //
            // Store registers V0 through Vx in memory starting at location I.
            // I is left unchanged.
            Op::StoreRegisters { vx } => {
                let count = vx as usize + 1;
                let dst = cpu
                    .memory
                    .slice_mut(cpu.registers.get_index() as usize, count)?;
                dst.copy_from_slice(&cpu.registers.as_slice()[..count]);
            }
            // Fx65 (LD Vx, [I])
            //
            // Read registers V0 through Vx from memory starting at location I.
            Op::LoadRegisters { vx } => {
                let count = vx as usize + 1;
                let src = cpu
                    .memory
                    .slice(cpu.registers.get_index() as usize, count)?;
                cpu.registers.as_mut_slice()[..count].copy_from_slice(src);
            }
        }

        Ok(control_flow)
    }
}

#[cfg(feature = "op_trace")]
#[inline]
fn op_trace(address: Address, bytes: [u8; 2], op: &Op) {
    log::trace!("{:04X}: {:02X}{:02X} {}", address, bytes[0], bytes[1], op);
}

#[cfg(not(feature = "op_trace"))]
#[inline]
fn op_trace(_: Address, _: [u8; 2], _: &Op) {}
