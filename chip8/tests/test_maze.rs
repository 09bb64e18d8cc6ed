use chip8::{constants::*, prelude::*};

const MAZE: &[u8] = include_bytes!("../programs/maze");

/// Address of the final `JP 0x21C` that parks the program.
const MAZE_END: u16 = 0x21C;

fn maze_vm(seed: u64) -> Chip8Vm {
    let mut vm = Chip8Vm::new(Chip8Conf {
        seed: Some(seed),
        ..Default::default()
    });
    vm.load_bytecode(MAZE).unwrap();
    vm
}

fn lit(display: Chip8DisplayBuffer) -> usize {
    display.iter().filter(|px| **px).count()
}

#[test]
fn test_maze_draws_every_cell() {
    let mut vm = maze_vm(7);

    assert_eq!(vm.run_steps(2000).unwrap(), Flow::Ok);

    let cpu = vm.interpreter().cpu();
    assert_eq!(cpu.pc(), MAZE_END);
    // 16 by 8 cells, each a diagonal line of 4 pixels.
    assert_eq!(lit(vm.display_buffer()), 512);
    // Cells never overlap.
    assert_eq!(cpu.v(FLAG_REGISTER), 0);
    assert_eq!(cpu.v(1), 0x20);
    assert!(cpu.stack.is_empty());
}

#[test]
fn test_maze_seeded_is_deterministic() {
    let mut a = maze_vm(42);
    let mut b = maze_vm(42);

    a.run_steps(2000).unwrap();
    b.run_steps(2000).unwrap();

    assert_eq!(a.display_buffer(), b.display_buffer());
    assert_eq!(a.dump_display().unwrap(), b.dump_display().unwrap());
}

#[test]
fn test_maze_row_by_row() {
    let mut vm = maze_vm(3);

    // Each cell takes at most 8 instructions, so a row of 16
    // cells is never finished after 16 steps.
    vm.run_steps(16).unwrap();
    let partial = lit(vm.display_buffer());
    assert!(partial > 0 && partial < 64);
}

struct Recorder {
    polls: usize,
    frames: Vec<usize>,
}

impl Devices for Recorder {
    fn poll(&mut self, _keypad: &mut Keypad) -> bool {
        self.polls += 1;
        self.polls <= 3000
    }

    fn draw(&mut self, display: Chip8DisplayBuffer) {
        self.frames.push(lit(display));
    }

    fn buzz(&mut self, _state: bool) {}
}

#[test]
fn test_maze_run_loop() {
    let mut vm = maze_vm(11);
    let mut devices = Recorder {
        polls: 0,
        frames: Vec::new(),
    };

    assert_eq!(vm.run(&mut devices).unwrap(), Flow::Interrupt);

    // One frame per sprite, each adding 4 pixels.
    assert_eq!(devices.frames.len(), 128);
    assert_eq!(devices.frames.first(), Some(&4));
    assert_eq!(devices.frames.last(), Some(&512));
    assert!(devices.frames.windows(2).all(|w| w[1] == w[0] + 4));
    assert!(vm.interpreter().is_halted());
}
