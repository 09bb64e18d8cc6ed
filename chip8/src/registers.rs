//! Register file.
use crate::constants::*;

/// Scalar CPU state.
#[derive(Debug, Default, Clone)]
pub struct Registers {
    /// General purpose registers for temporary values.
    ///
    /// Register 16 (VF) is used for either the carry flag or borrow switch depending on opcode.
    v: [u8; REGISTER_COUNT],
    /// Pointer register used for temporarily storing an address.
    ///
    /// Addresses are 12 bits, so the value is always within 0x000..=0xFFF.
    /// Writes are masked, which makes `Fx1E` wrap around the address space.
    index: Address,
    /// Program counter pointing to the next instruction in memory.
    pc: Address,
}

impl Registers {
    pub fn new() -> Self {
        Default::default()
    }

    /// Value of register `Vx`. Only the low nibble of `reg` is used.
    #[inline(always)]
    pub fn get(&self, reg: u8) -> u8 {
        self.v[reg as usize & 0xF]
    }

    #[inline(always)]
    pub fn set(&mut self, reg: u8, value: u8) {
        self.v[reg as usize & 0xF] = value;
    }

    /// Write the carry, borrow or collision flag into VF.
    #[inline(always)]
    pub fn set_flag(&mut self, flag: bool) {
        self.v[FLAG_REGISTER as usize] = flag as u8;
    }

    #[inline(always)]
    pub fn flag(&self) -> u8 {
        self.v[FLAG_REGISTER as usize]
    }

    #[inline(always)]
    pub fn get_index(&self) -> Address {
        self.index
    }

    /// Set the index register, keeping only the low 12 bits.
    #[inline(always)]
    pub fn set_index(&mut self, value: Address) {
        self.index = value & 0x0FFF;
    }

    #[inline(always)]
    pub fn get_pc(&self) -> Address {
        self.pc
    }

    #[inline(always)]
    pub fn set_pc(&mut self, value: Address) {
        self.pc = value;
    }

    /// Move the program counter past one instruction.
    #[inline(always)]
    pub fn advance_pc(&mut self) {
        self.pc = self.pc.wrapping_add(2);
    }

    /// Move the program counter back to the previous instruction.
    #[inline(always)]
    pub(crate) fn rewind_pc(&mut self) {
        self.pc = self.pc.wrapping_sub(2);
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.v
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.v
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
