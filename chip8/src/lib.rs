mod clock;
pub mod constants;
mod cpu;
mod devices;
mod disasm;
mod display;
mod error;
mod interp;
mod memory;
mod opcode;
mod registers;
mod stack;
mod vm;

pub use self::{error::Chip8Error, vm::Hz};

/// Version of the interpreter, reported by front ends.
pub const IMPL_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod prelude {
    pub use super::{
        cpu::Chip8Cpu,
        devices::{Devices, InvalidKeyCode, KeyCode, Keypad},
        disasm::Disassembler,
        display::{Chip8DisplayBuffer, Framebuffer},
        error::{Chip8Error, Chip8Result},
        interp::{Flow, Interpreter},
        memory::Memory,
        opcode::{Op, Opcode, UnknownOpcode},
        registers::Registers,
        stack::CallStack,
        vm::{Chip8Conf, Chip8Vm, Hz},
    };
}
