//! Result and errors.
use std::fmt::{self, Display, Formatter};

use crate::constants::Address;

pub type Chip8Result<T> = std::result::Result<T, Chip8Error>;

#[derive(Debug)]
pub enum Chip8Error {
    /// Attempt to load a bytecode program that can't fit in memory.
    LargeProgram { size: usize, capacity: usize },
    /// Instruction word that doesn't match any known opcode.
    Decode { address: Address, opcode: u16 },
    /// Memory access outside of the address space.
    OutOfBounds { address: usize },
    /// Subroutine call nested deeper than the call stack allows.
    StackOverflow,
    /// Return instruction executed with an empty call stack.
    StackUnderflow,
    /// The interpreter was stopped, either by a previous fatal
    /// error or an external interrupt, and must be reloaded.
    Halted,
    Io(std::io::Error),
    Fmt(fmt::Error),
}

impl Chip8Error {
    /// Errors that leave the machine in a state where execution can't continue.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::OutOfBounds { .. } | Self::StackOverflow | Self::StackUnderflow | Self::Halted
        )
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

impl Display for Chip8Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::LargeProgram { size, capacity } => write!(
                f,
                "program too large for VM memory: {size} bytes, {capacity} available"
            ),
            Self::Decode { address, opcode } => {
                write!(f, "unknown opcode {opcode:04X} at address 0x{address:03X}")
            }
            Self::OutOfBounds { address } => {
                write!(f, "memory access out of bounds: 0x{address:04X}")
            }
            Self::StackOverflow => write!(f, "call stack overflow"),
            Self::StackUnderflow => write!(f, "call stack underflow"),
            Self::Halted => write!(f, "interpreter is halted"),
            Self::Io(err) => write!(f, "{}", err),
            Self::Fmt(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Chip8Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Fmt(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Chip8Error {
    fn from(err: std::io::Error) -> Self {
        Chip8Error::Io(err)
    }
}

impl From<fmt::Error> for Chip8Error {
    fn from(err: fmt::Error) -> Self {
        Chip8Error::Fmt(err)
    }
}
