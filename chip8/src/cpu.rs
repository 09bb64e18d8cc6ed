//! CPU and memory state.
use crate::{
    constants::*, devices::Keypad, display::Framebuffer, memory::Memory, registers::Registers,
    stack::CallStack,
};

/// Core state for a chip8 interpreter.
///
/// Passive data holder. All mutation during execution goes
/// through the [`Interpreter`](crate::interp::Interpreter).
#[derive(Default)]
pub struct Chip8Cpu {
    // ------------------------------------------------------------------------
    // Registers
    pub registers: Registers,
    /// (DT) Delay timer that counts down to 0.
    pub delay_timer: u8,
    /// (ST) Sound timer that counts down to 0. When it has a non-zero value, a beep is played.
    pub sound_timer: u8,

    // ------------------------------------------------------------------------
    // Memory
    /// Main memory storage space.
    pub memory: Memory,
    /// Stack of return pointers used for jumping when a routine call finishes.
    pub stack: CallStack,
    /// Screen buffer that is drawn too.
    pub display: Framebuffer,

    // ------------------------------------------------------------------------
    // Input
    /// Keyboard input state.
    pub keypad: Keypad,
}

impl Chip8Cpu {
    pub fn new() -> Self {
        Default::default()
    }

    /// Return every component to its power-on state.
    pub fn clear(&mut self) {
        self.registers.clear();
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.memory.clear();
        self.stack.clear();
        self.display.clear();
        self.keypad.clear();
    }

    /// Count down the delay timer.
    #[inline]
    pub fn tick_delay(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
    }

    #[inline]
    pub fn tick_sound(&mut self) {
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    /// Whether the buzzer should be sounding.
    #[inline(always)]
    pub fn is_sound_active(&self) -> bool {
        self.sound_timer > 0
    }

    /// Value of register `Vx`.
    #[inline(always)]
    pub fn v(&self, reg: u8) -> u8 {
        self.registers.get(reg)
    }

    #[inline(always)]
    pub fn pc(&self) -> Address {
        self.registers.get_pc()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_timers_stop_at_zero() {
        let mut cpu = Chip8Cpu::new();
        cpu.delay_timer = 2;
        cpu.sound_timer = 1;
        assert!(cpu.is_sound_active());

        cpu.tick_delay();
        cpu.tick_sound();
        assert_eq!(cpu.delay_timer, 1);
        assert_eq!(cpu.sound_timer, 0);
        assert!(!cpu.is_sound_active());

        for _ in 0..3 {
            cpu.tick_delay();
            cpu.tick_sound();
        }
        assert_eq!(cpu.delay_timer, 0);
        assert_eq!(cpu.sound_timer, 0);
    }

    #[test]
    fn test_clear() {
        let mut cpu = Chip8Cpu::new();
        cpu.registers.set(3, 9);
        cpu.registers.set_pc(0x300);
        cpu.memory.write_byte(0x300, 0xFF).unwrap();
        cpu.stack.push(0x202).unwrap();
        cpu.display.draw_sprite(0, 0, &[0xFF]);
        cpu.delay_timer = 10;

        cpu.clear();

        assert_eq!(cpu.v(3), 0);
        assert_eq!(cpu.pc(), 0);
        assert_eq!(cpu.memory.read_byte(0x300).unwrap(), 0);
        assert!(cpu.stack.is_empty());
        assert_eq!(cpu.display.count_lit(), 0);
        assert_eq!(cpu.delay_timer, 0);
    }
}
