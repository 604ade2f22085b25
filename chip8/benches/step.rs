use criterion::{black_box, criterion_group, criterion_main, Criterion};

use chip8::prelude::*;

#[rustfmt::skip]
const PROGRAM: &[u8] = &[
    0xA2, 0x10, // 200: LD I, .sprite
    0xC0, 0x3F, // 202: RND v0, 0x3F
    0xC1, 0x1F, // 204: RND v1, 0x1F
    0xD0, 0x14, // 206: DRW v0, v1, 4
    0x72, 0x01, // 208: ADD v2, 1
    0x82, 0x34, // 20A: ADD v2, v3
    0xF2, 0x33, // 20C: LD B, v2
    0x12, 0x02, // 20E: JP 202
    0xF0, 0x90, // 210: .sprite
    0x90, 0xF0,
];

fn criterion_benchmark(c: &mut Criterion) {
    let mut vm = Chip8Vm::new(Chip8Conf {
        clock_frequency: None,
        rng_seed: Some(8),
    });
    vm.load_bytecode(PROGRAM).unwrap();

    c.bench_function("interpreter step", |b| {
        b.iter(|| {
            let step_count = black_box(1000_usize);
            black_box(vm.run_steps(step_count))
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
