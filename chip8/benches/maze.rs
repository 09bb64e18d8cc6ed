use criterion::{black_box, criterion_group, criterion_main, Criterion};

use chip8::prelude::*;

static MAZE: &[u8] = include_bytes!("../programs/maze");

fn criterion_benchmark(c: &mut Criterion) {
    {
        let mut vm = Chip8Vm::new(Chip8Conf {
            seed: Some(1),
            ..Default::default()
        });

        c.bench_function("maze bytecode", |b| {
            b.iter(|| {
                vm.load_bytecode(MAZE).unwrap();
                let step_count = black_box(1000_usize);
                black_box(vm.run_steps(step_count))
            })
        });
    }

    c.bench_function("maze disassemble", |b| {
        b.iter(|| {
            let mut s = String::new();
            Disassembler::new(black_box(MAZE))
                .disassemble(&mut s)
                .unwrap();
            black_box(s)
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
