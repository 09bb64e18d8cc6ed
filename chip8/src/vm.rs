//! Virtual machine.
use std::{
    fmt::{self, Write},
    time::Duration,
};

use log::debug;

use crate::{
    clock::Clock,
    constants::*,
    devices::{Devices, KeyCode},
    display::Chip8DisplayBuffer,
    error::Chip8Result,
    interp::{Flow, Interpreter},
};

/// Run loop around the interpreter.
///
/// Paces instruction execution, counts down the timers on a wall clock
/// schedule that is independent of the instruction rate, and connects
/// the machine to its IO devices between instructions.
pub struct Chip8Vm {
    interp: Interpreter,
    clock: Clock,
    timer: Clock,
    /// Switch tracking whether the buzzer should be on or off.
    buzzer_state: bool,
    /// Interrupt for VM loop.
    trap: bool,
    conf: Chip8Conf,
}

impl Chip8Vm {
    pub fn new(conf: Chip8Conf) -> Self {
        let interp = match conf.seed {
            Some(seed) => Interpreter::with_seed(seed),
            None => Interpreter::new(),
        };

        Chip8Vm {
            interp,
            clock: Clock::new(conf.clock_frequency.unwrap_or_default().into()),
            timer: Clock::new(conf.timer_frequency.into()),
            buzzer_state: false,
            trap: false,
            conf,
        }
    }

    /// Configuration that was used to instantiate the VM.
    pub fn config(&self) -> &Chip8Conf {
        &self.conf
    }

    pub fn load_bytecode(&mut self, bytecode: &[u8]) -> Chip8Result<()> {
        self.interp.load(bytecode)?;
        self.trap = false;
        self.buzzer_state = false;
        self.reset();

        Ok(())
    }

    pub fn display_buffer(&self) -> Chip8DisplayBuffer<'_> {
        self.interp.display()
    }

    /// Read-only access to the interpreter state, for debuggers and tests.
    pub fn interpreter(&self) -> &Interpreter {
        &self.interp
    }
}

/// VM Configuration Parameters.
#[derive(Debug, Clone)]
pub struct Chip8Conf {
    /// Instruction rate. When absent or zero, instructions
    /// are executed as fast as possible.
    pub clock_frequency: Option<Hz>,
    /// Rate at which the delay and sound timers count down.
    ///
    /// Zero counts the timers down on every step.
    pub timer_frequency: Hz,
    /// Seed for the random number instruction. Seeded from
    /// system entropy when absent.
    pub seed: Option<u64>,
}

impl Default for Chip8Conf {
    fn default() -> Self {
        Self {
            clock_frequency: None,
            timer_frequency: Hz(DELAY_FREQUENCY),
            seed: None,
        }
    }
}

/// CPU clock frequency, in hertz (per second)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Hz(pub u64);

impl From<Hz> for Duration {
    fn from(freq: Hz) -> Self {
        if freq.0 == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(NANOS_IN_SECOND / freq.0)
        }
    }
}

/// Interpreter
impl Chip8Vm {
    /// Sets the keyboard key input state.
    pub fn set_key(&mut self, key: KeyCode, pressed: bool) {
        self.interp.set_key(key, pressed);
    }

    /// Clear the keyboard input state, setting all keys to up.
    pub fn clear_keys(&mut self) {
        self.interp.cpu_mut().keypad.clear()
    }

    /// Stop the run loop before the next instruction.
    pub fn interrupt(&mut self) {
        self.trap = true;
        self.interp.halt();
    }

    /// Clear internal state in preparation for a fresh startup.
    fn reset(&mut self) {
        self.clock.reset();
        self.timer.reset();
    }

    /// Run until the devices signal a stop, or the program fails.
    pub fn run<D: Devices>(&mut self, devices: &mut D) -> Chip8Result<Flow> {
        debug!("run loop started");
        self.reset();

        let result = self.run_devices(devices);

        // Don't leave the buzzer sounding after the machine stops.
        if self.buzzer_state {
            self.buzzer_state = false;
            devices.buzz(false);
        }

        debug!("run loop stopped");
        result
    }

    fn run_devices<D: Devices>(&mut self, devices: &mut D) -> Chip8Result<Flow> {
        loop {
            if !devices.poll(&mut self.interp.cpu_mut().keypad) {
                self.interrupt();
            }

            let flow = self.step()?;

            // Buzzer should be on while sound timer counts down,
            // then turned off when the timer reaches zero.
            let sound = self.interp.sound_timer() > 0;
            if sound != self.buzzer_state {
                self.buzzer_state = sound;
                devices.buzz(sound);
            }

            match flow {
                Flow::Interrupt => return Ok(flow),
                Flow::Draw => devices.draw(self.interp.display()),
                _ => {}
            }
        }
    }

    /// Execute up to `step_count` instructions.
    pub fn run_steps(&mut self, step_count: usize) -> Chip8Result<Flow> {
        self.reset();

        for _ in 0..step_count {
            if let Flow::Interrupt = self.step()? {
                return Ok(Flow::Interrupt);
            }
        }

        Ok(Flow::Ok)
    }

    /// Execute a single instruction, waiting for the CPU clock when throttled.
    pub fn step(&mut self) -> Chip8Result<Flow> {
        if self.trap {
            // Interrupt signal is set.
            return Ok(Flow::Interrupt);
        }

        self.clock.wait();

        // Count down timers by wall time, however slow the CPU clock is.
        for _ in 0..self.timer.tick() {
            self.interp.tick_timers();
        }

        self.interp.step()
    }
}

/// Troubleshooting
#[allow(dead_code)]
#[doc(hidden)]
impl Chip8Vm {
    /// Returns the contents of the memory as a human readable string.
    pub fn dump_ram(&self, count: usize) -> Result<String, std::fmt::Error> {
        let ram = self.interp.cpu().memory.as_slice();
        let end = (MEM_START + count).min(MEM_SIZE);
        let mut buf = String::new();

        for (i, op) in ram[MEM_START..end].chunks(2).enumerate() {
            match op {
                [a, b] => writeln!(buf, "{:04X}: {:02X}{:02X}", MEM_START + i * 2, a, b)?,
                [a] => writeln!(buf, "{:04X}: {:02X}", MEM_START + i * 2, a)?,
                _ => unreachable!("chunks are never empty"),
            }
        }

        Ok(buf)
    }

    pub fn dump_display(&self) -> Result<String, std::fmt::Error> {
        self.interp.cpu().display.dump()
    }

    pub fn dump_keys(&self) -> Result<String, fmt::Error> {
        let keypad = &self.interp.cpu().keypad;
        let mut buf = String::new();

        if keypad.any_key() {
            write!(buf, "keys: ")?;
            for i in 0..KEY_COUNT {
                if keypad.is_key_down(i) {
                    write!(buf, "k{i:x}")?;
                }
            }
        }

        Ok(buf)
    }
}
