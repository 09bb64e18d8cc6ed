//! Entrypoint for CLI
use std::{env, error::Error, fs, time::Instant};

use chip8::{prelude::*, IMPL_VERSION};
use log::{info, warn};

static USAGE: &str = r#"
usage: chip8 CMD FILE [STEPS]

commands:
    run     Run the target ROM file headless, then print the display
    dis     Disassemble the the target ROM into readable assembly

examples:
    chip8 run maze.rom
    chip8 run maze.rom 2000
    chip8 dis maze.rom
"#;

/// Step budget when none is given on the command line.
const DEFAULT_STEPS: usize = 10_000;

/// Devices for running without a window.
///
/// There is no keyboard to poll, so the machine is stopped
/// once the step budget is spent.
struct Headless {
    steps_left: usize,
    draws: usize,
}

impl Devices for Headless {
    fn poll(&mut self, _keypad: &mut Keypad) -> bool {
        if self.steps_left == 0 {
            return false;
        }
        self.steps_left -= 1;
        true
    }

    fn draw(&mut self, _display: Chip8DisplayBuffer<'_>) {
        self.draws += 1;
    }

    fn buzz(&mut self, state: bool) {
        info!("buzzer {}", if state { "on" } else { "off" });
    }
}

fn run_bytecode(filepath: impl AsRef<str>, steps: usize) -> Chip8Result<()> {
    println!("Running Bytecode Interpreter");

    let bytecode = fs::read(filepath.as_ref())?;

    let mut vm = Chip8Vm::new(Chip8Conf::default());
    vm.load_bytecode(bytecode.as_slice())?;

    let mut devices = Headless {
        steps_left: steps,
        draws: 0,
    };

    let start = Instant::now();
    let result = vm.run(&mut devices);
    let end = Instant::now();

    println!(
        "time taken: {}ms",
        end.duration_since(start).as_nanos() as f64 / 1000000.0
    ); // to millis
    println!("draw calls: {}", devices.draws);
    println!("{}", vm.dump_display()?);

    if let Err(err) = result {
        if err.is_decode() {
            warn!("program stopped on data that is not an instruction");
        }
        return Err(err);
    }

    Ok(())
}

fn run_disassembler(filepath: impl AsRef<str>) -> Chip8Result<()> {
    let bytecode = fs::read(filepath.as_ref())?;

    Disassembler::new(bytecode.as_slice()).print_bytecode()?;

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    simple_logger::SimpleLogger::new().env().init()?;

    match parse_args() {
        Some(Cmd::Run { filepath, steps }) => run_bytecode(filepath, steps)?,
        Some(Cmd::Dis { filepath }) => run_disassembler(filepath)?,
        None => {
            print_usage();
            // FreeBSD EX_USAGE (64)
            std::process::exit(64)
        }
    }

    Ok(())
}

fn parse_args() -> Option<Cmd> {
    let mut args = env::args().skip(1);
    match args.next() {
        Some(cmd) => {
            // don't format me T.T
            match cmd.as_str() {
                "run" => Some(Cmd::Run {
                    filepath: consume_arg(&mut args)?,
                    steps: match args.next() {
                        Some(arg) => arg.parse().ok()?,
                        None => DEFAULT_STEPS,
                    },
                }),
                "dis" => Some(Cmd::Dis {
                    filepath: consume_arg(&mut args)?,
                }),
                _ => None,
            }
        }
        None => None,
    }
}

/// Consumes the next argument. Missing arguments result in the usage text.
fn consume_arg(mut args: impl Iterator<Item = String>) -> Option<String> {
    args.next()
}

fn print_usage() {
    println!("Chip8 v{IMPL_VERSION}");
    println!("{USAGE}");
}

enum Cmd {
    /// Run file
    Run { filepath: String, steps: usize },
    /// Disassemble
    Dis { filepath: String },
}
