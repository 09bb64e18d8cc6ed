//! Instruction decoding.
//!
//! Decoding happens in two stages. First the raw instruction word is split into
//! its nibble fields by [`Opcode`], which is pure and knows nothing about what
//! the fields mean. Then [`Op`] selects the instruction from the opcode family
//! and its sub-selector, rejecting any bit pattern that isn't defined.
//!
//! Both the interpreter and the disassembler decode through these types.
use std::fmt::{self, Formatter};

use crate::constants::Address;

/// Fields of a single 16-bit instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    /// Instruction family, the high nibble of the first byte.
    pub op: u8,
    /// Low nibble of the first byte, usually a register.
    pub x: u8,
    /// High nibble of the second byte, usually a register.
    pub y: u8,
    /// Low nibble of the second byte.
    pub n: u8,
    /// Second byte.
    pub nn: u8,
    /// 12-bit address made from `x`, `y` and `n`.
    pub nnn: Address,
}

impl Opcode {
    #[inline(always)]
    pub fn from_bytes(bytes: [u8; 2]) -> Self {
        let [a, b] = bytes;
        Self {
            op: a >> 4,                                // 0xF000
            x: a & 0xF,                                // 0x0F00
            y: b >> 4,                                 // 0x00F0
            n: b & 0xF,                                // 0x000F
            nn: b,                                     // 0x00FF
            nnn: (((a as u16) & 0xF) << 8) | b as u16, // 0x0FFF
        }
    }

    /// Original instruction word.
    #[inline(always)]
    pub fn to_u16(self) -> u16 {
        ((self.op as u16) << 12) | self.nnn
    }
}

impl From<u16> for Opcode {
    fn from(word: u16) -> Self {
        Self::from_bytes(word.to_be_bytes())
    }
}

/// Decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// 00E0 (CLS)
    ///
    /// Clear the screen.
    ClearScreen,
    /// 00EE (RET)
    ///
    /// Return from the sub-routine.
    Return,
    /// 1nnn (JP addr)
    ///
    /// Jump to the address in `nnn`.
    Jump { address: Address },
    /// 2nnn (CALL addr)
    ///
    /// Call the sub-routine at address `nnn`.
    Call { address: Address },
    /// 3xnn (SE Vx, byte)
    ///
    /// Skip the next instruction if register `Vx` equals value `nn`
    SkipEqByte { vx: u8, nn: u8 },
    /// 4xnn (SNE Vx, byte)
    ///
    /// Skip the next instruction if register `Vx` does not equal value `nn`.
    SkipNotEqByte { vx: u8, nn: u8 },
    /// 5xy0 (SE Vx, Vy)
    ///
    /// Skip the next instruction if register `Vx` equals register `Vy`.
    SkipEq { vx: u8, vy: u8 },
    /// 6xnn (LD Vx, byte)
    LoadByte { vx: u8, nn: u8 },
    /// 7xnn (ADD Vx, byte)
    ///
    /// Add byte to the value in register `Vx`, store the result in `Vx`.
    /// Carry flag is not touched.
    AddByte { vx: u8, nn: u8 },

    // ------------------------------------------------------------------------
    // Math
    /// 8xy0 (LD Vx, Vy)
    Load { vx: u8, vy: u8 },
    /// 8xy1 (OR Vx, Vy)
    Or { vx: u8, vy: u8 },
    /// 8xy2 (AND Vx, Vy)
    And { vx: u8, vy: u8 },
    /// 8xy3 (XOR Vx, Vy)
    Xor { vx: u8, vy: u8 },
    /// 8xy4 (ADD Vx, Vy)
    ///
    /// Overflow is wrapped. If overflowed, set VF to 1, else 0.
    Add { vx: u8, vy: u8 },
    /// 8xy5 (SUB Vx, Vy)
    ///
    /// VF is set to 0 when there is a borrow, set to 1 when there isn't.
    Sub { vx: u8, vy: u8 },
    /// 8xy6 (SHR Vx)
    ///
    /// VY is unused.
    ShiftRight { vx: u8, vy: u8 },
    /// 8xy7 (SUBN Vx, Vy)
    ///
    /// Subtracts VX from VY, and stores the result in VX.
    SubReverse { vx: u8, vy: u8 },
    /// 8xyE (SHL Vx)
    ///
    /// VY is unused.
    ShiftLeft { vx: u8, vy: u8 },

    /// 9xy0 (SNE Vx, Vy)
    SkipNotEq { vx: u8, vy: u8 },
    /// Annn (LD I, addr)
    ///
    /// Load address into register `I`.
    LoadAddress { address: Address },
    /// Bnnn (JP V0, addr)
    ///
    /// Jump to location nnn + V0.
    JumpOffset { address: Address },
    /// Cxnn (RND Vx, byte)
    Random { vx: u8, nn: u8 },
    /// Dxyn (DRW Vx, Vy, nibble)
    ///
    /// Draw sprite to the display buffer.
    Draw { vx: u8, vy: u8, n: u8 },

    // ------------------------------------------------------------------------
    // Input
    /// Ex9E (SKP Vx)
    SkipKey { vx: u8 },
    /// ExA1 (SKNP Vx)
    SkipNotKey { vx: u8 },

    // ------------------------------------------------------------------------
    // Timers and memory
    /// Fx07 (LD Vx, DT)
    LoadDelay { vx: u8 },
    /// Fx0A (LD Vx, K)
    WaitKey { vx: u8 },
    /// Fx15 (LD DT, Vx)
    SetDelay { vx: u8 },
    /// Fx18 (LD ST, Vx)
    SetSound { vx: u8 },
    /// Fx1E (ADD I, Vx)
    AddAddress { vx: u8 },
    /// Fx29 (LD F, Vx)
    LoadFont { vx: u8 },
    /// Fx33 (LD B, Vx)
    StoreBcd { vx: u8 },
    /// Fx55 (LD [I], Vx)
    StoreRegisters { vx: u8 },
    /// Fx65 (LD Vx, [I])
    LoadRegisters { vx: u8 },
}

/// Instruction word that doesn't match any defined opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownOpcode(pub u16);

impl std::error::Error for UnknownOpcode {}

impl fmt::Display for UnknownOpcode {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "unknown opcode {:04X}", self.0)
    }
}

impl TryFrom<Opcode> for Op {
    type Error = UnknownOpcode;

    fn try_from(opcode: Opcode) -> Result<Self, Self::Error> {
        let Opcode {
            op,
            x: vx,
            y: vy,
            n,
            nn,
            nnn,
        } = opcode;

        let decoded = match op {
            // Miscellaneous instructions identified by nn
            0x0 => match (vx, nn) {
                (0x0, 0xE0) => Op::ClearScreen,
                (0x0, 0xEE) => Op::Return,
                _ => return Err(UnknownOpcode(opcode.to_u16())),
            },
            0x1 => Op::Jump { address: nnn },
            0x2 => Op::Call { address: nnn },
            0x3 => Op::SkipEqByte { vx, nn },
            0x4 => Op::SkipNotEqByte { vx, nn },
            0x5 if n == 0x0 => Op::SkipEq { vx, vy },
            0x6 => Op::LoadByte { vx, nn },
            0x7 => Op::AddByte { vx, nn },
            // Arithmetic instructions identified by n
            0x8 => match n {
                0x0 => Op::Load { vx, vy },
                0x1 => Op::Or { vx, vy },
                0x2 => Op::And { vx, vy },
                0x3 => Op::Xor { vx, vy },
                0x4 => Op::Add { vx, vy },
                0x5 => Op::Sub { vx, vy },
                0x6 => Op::ShiftRight { vx, vy },
                0x7 => Op::SubReverse { vx, vy },
                0xE => Op::ShiftLeft { vx, vy },
                _ => return Err(UnknownOpcode(opcode.to_u16())),
            },
            0x9 if n == 0x0 => Op::SkipNotEq { vx, vy },
            0xA => Op::LoadAddress { address: nnn },
            0xB => Op::JumpOffset { address: nnn },
            0xC => Op::Random { vx, nn },
            0xD => Op::Draw { vx, vy, n },
            0xE => match nn {
                0x9E => Op::SkipKey { vx },
                0xA1 => Op::SkipNotKey { vx },
                _ => return Err(UnknownOpcode(opcode.to_u16())),
            },
            0xF => match nn {
                0x07 => Op::LoadDelay { vx },
                0x0A => Op::WaitKey { vx },
                0x15 => Op::SetDelay { vx },
                0x18 => Op::SetSound { vx },
                0x1E => Op::AddAddress { vx },
                0x29 => Op::LoadFont { vx },
                0x33 => Op::StoreBcd { vx },
                0x55 => Op::StoreRegisters { vx },
                0x65 => Op::LoadRegisters { vx },
                _ => return Err(UnknownOpcode(opcode.to_u16())),
            },
            _ => return Err(UnknownOpcode(opcode.to_u16())),
        };

        Ok(decoded)
    }
}

impl TryFrom<[u8; 2]> for Op {
    type Error = UnknownOpcode;

    #[inline]
    fn try_from(bytes: [u8; 2]) -> Result<Self, Self::Error> {
        Op::try_from(Opcode::from_bytes(bytes))
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Op::ClearScreen => write!(f, "CLS"),
            Op::Return => write!(f, "RET"),
            Op::Jump { address } => write!(f, "JP 0x{address:03X}"),
            Op::Call { address } => write!(f, "CALL 0x{address:03X}"),
            Op::SkipEqByte { vx, nn } => write!(f, "SE v{vx:X}, {nn}"),
            Op::SkipNotEqByte { vx, nn } => write!(f, "SNE v{vx:X}, {nn}"),
            Op::SkipEq { vx, vy } => write!(f, "SE v{vx:X}, v{vy:X}"),
            Op::LoadByte { vx, nn } => write!(f, "LD v{vx:X}, {nn}"),
            Op::AddByte { vx, nn } => write!(f, "ADD v{vx:X}, {nn}"),
            // ------
            Op::Load { vx, vy } => write!(f, "LD v{vx:X}, v{vy:X}"),
            Op::Or { vx, vy } => write!(f, "OR v{vx:X}, v{vy:X}"),
            Op::And { vx, vy } => write!(f, "AND v{vx:X}, v{vy:X}"),
            Op::Xor { vx, vy } => write!(f, "XOR v{vx:X}, v{vy:X}"),
            Op::Add { vx, vy } => write!(f, "ADD v{vx:X}, v{vy:X}"),
            Op::Sub { vx, vy } => write!(f, "SUB v{vx:X}, v{vy:X}"),
            Op::ShiftRight { vx, .. } => write!(f, "SHR v{vx:X}"),
            Op::SubReverse { vx, vy } => write!(f, "SUBN v{vx:X}, v{vy:X}"),
            Op::ShiftLeft { vx, .. } => write!(f, "SHL v{vx:X}"),
            // ------
            Op::SkipNotEq { vx, vy } => write!(f, "SNE v{vx:X}, v{vy:X}"),
            Op::LoadAddress { address } => write!(f, "LD I, 0x{address:03X}"),
            Op::JumpOffset { address } => write!(f, "JP v0, 0x{address:03X}"),
            Op::Random { vx, nn } => write!(f, "RND v{vx:X}, {nn}"),
            Op::Draw { vx, vy, n } => write!(f, "DRW v{vx:X}, v{vy:X}, {n}"),
            // ------
            Op::SkipKey { vx } => write!(f, "SKP v{vx:X}"),
            Op::SkipNotKey { vx } => write!(f, "SKNP v{vx:X}"),
            // ------
            Op::LoadDelay { vx } => write!(f, "LD v{vx:X}, DT"),
            Op::WaitKey { vx } => write!(f, "LD v{vx:X}, K"),
            Op::SetDelay { vx } => write!(f, "LD DT, v{vx:X}"),
            Op::SetSound { vx } => write!(f, "LD ST, v{vx:X}"),
            Op::AddAddress { vx } => write!(f, "ADD I, v{vx:X}"),
            Op::LoadFont { vx } => write!(f, "LD F, v{vx:X}"),
            Op::StoreBcd { vx } => write!(f, "LD B, v{vx:X}"),
            Op::StoreRegisters { vx } => write!(f, "LD [I], v{vx:X}"),
            Op::LoadRegisters { vx } => write!(f, "LD v{vx:X}, [I]"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_decompose() {
        let opcode = Opcode::from_bytes([0xD1, 0x23]);

        assert_eq!(opcode.op, 0xD);
        assert_eq!(opcode.x, 0x1);
        assert_eq!(opcode.y, 0x2);
        assert_eq!(opcode.n, 0x3);
        assert_eq!(opcode.nn, 0x23);
        assert_eq!(opcode.nnn, 0x123);
        assert_eq!(opcode.to_u16(), 0xD123);
        assert_eq!(Opcode::from(0xD123), opcode);
    }

    #[test]
    fn test_decode_families() {
        let cases: &[(u16, Op)] = &[
            (0x00E0, Op::ClearScreen),
            (0x00EE, Op::Return),
            (0x1ABC, Op::Jump { address: 0xABC }),
            (0x2F00, Op::Call { address: 0xF00 }),
            (0x3A42, Op::SkipEqByte { vx: 0xA, nn: 0x42 }),
            (0x4A42, Op::SkipNotEqByte { vx: 0xA, nn: 0x42 }),
            (0x5120, Op::SkipEq { vx: 1, vy: 2 }),
            (0x6B07, Op::LoadByte { vx: 0xB, nn: 7 }),
            (0x7B07, Op::AddByte { vx: 0xB, nn: 7 }),
            (0x8120, Op::Load { vx: 1, vy: 2 }),
            (0x8121, Op::Or { vx: 1, vy: 2 }),
            (0x8122, Op::And { vx: 1, vy: 2 }),
            (0x8123, Op::Xor { vx: 1, vy: 2 }),
            (0x8124, Op::Add { vx: 1, vy: 2 }),
            (0x8125, Op::Sub { vx: 1, vy: 2 }),
            (0x8126, Op::ShiftRight { vx: 1, vy: 2 }),
            (0x8127, Op::SubReverse { vx: 1, vy: 2 }),
            (0x812E, Op::ShiftLeft { vx: 1, vy: 2 }),
            (0x9120, Op::SkipNotEq { vx: 1, vy: 2 }),
            (0xA123, Op::LoadAddress { address: 0x123 }),
            (0xB123, Op::JumpOffset { address: 0x123 }),
            (0xC3FF, Op::Random { vx: 3, nn: 0xFF }),
            (0xD125, Op::Draw { vx: 1, vy: 2, n: 5 }),
            (0xE59E, Op::SkipKey { vx: 5 }),
            (0xE5A1, Op::SkipNotKey { vx: 5 }),
            (0xF407, Op::LoadDelay { vx: 4 }),
            (0xF40A, Op::WaitKey { vx: 4 }),
            (0xF415, Op::SetDelay { vx: 4 }),
            (0xF418, Op::SetSound { vx: 4 }),
            (0xF41E, Op::AddAddress { vx: 4 }),
            (0xF429, Op::LoadFont { vx: 4 }),
            (0xF433, Op::StoreBcd { vx: 4 }),
            (0xF455, Op::StoreRegisters { vx: 4 }),
            (0xF465, Op::LoadRegisters { vx: 4 }),
        ];

        for (word, expected) in cases {
            let decoded = Op::try_from(Opcode::from(*word));
            assert_eq!(decoded, Ok(*expected), "decoding {word:04X}");
        }
    }

    #[test]
    fn test_decode_unknown() {
        for word in [
            0x0000, 0x0123, 0x01E0, 0x5121, 0x8128, 0x812F, 0x9121, 0xE500, 0xF400, 0xFFFF,
        ] {
            assert_eq!(
                Op::try_from(Opcode::from(word)),
                Err(UnknownOpcode(word)),
                "decoding {word:04X}"
            );
        }
    }

    #[test]
    fn test_mnemonics() {
        assert_eq!(Op::try_from([0x00, 0xE0]).unwrap().to_string(), "CLS");
        assert_eq!(Op::try_from([0x12, 0x04]).unwrap().to_string(), "JP 0x204");
        assert_eq!(
            Op::try_from([0xD0, 0x14]).unwrap().to_string(),
            "DRW v0, v1, 4"
        );
        assert_eq!(
            Op::try_from([0xFA, 0x65]).unwrap().to_string(),
            "LD vA, [I]"
        );
    }
}
