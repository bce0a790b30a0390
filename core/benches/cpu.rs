// SPDX-License-Identifier: MPL-2.0

use criterion::{criterion_group, criterion_main, Criterion};
use vaxrun::{
    aout::{Header, SymbolTable, MAGIC},
    AOut, Config, Core,
};

fn program(text: &[u8]) -> Core {
    Core::new(AOut {
        header: Some(Header { magic: MAGIC, text: text.len() as u32, ..Header::default() }),
        text: text.to_vec(),
        data: Vec::new(),
        symbols: SymbolTable::default(),
    })
}

fn step(c: &mut Criterion) {
    // .word 0; 1: brb 1b
    let core = program(&[0x00, 0x00, 0x11, 0xfe]);
    let mut cpu = core.cpu(&["bench"], &Config::default()).unwrap();

    c.bench_function("cpu::step", |b| b.iter(|| cpu.step()));
}

fn run(c: &mut Criterion) {
    // .word 0; movl $1000,r0; 1: sobgtr r0,1b; ret
    let core = program(&[
        0x00, 0x00, 0xd0, 0x8f, 0xe8, 0x03, 0x00, 0x00, 0x50, 0xf5, 0x50, 0xfd, 0x04,
    ]);

    c.bench_function("core::run", |b| b.iter(|| core.run(&["bench"], &Config::default())));
}

fn disassemble(c: &mut Criterion) {
    let mut text = vec![0x00, 0x00];
    for _ in 0..512 {
        // movl $0x12345678,r0; addl3 4(ap),r0,-(sp); brb .+2
        text.extend([0xd0, 0x8f, 0x78, 0x56, 0x34, 0x12, 0x50]);
        text.extend([0xc1, 0xac, 0x04, 0x50, 0x7e]);
        text.extend([0x11, 0x00]);
    }
    text.push(0x04);
    let core = program(&text);

    c.bench_function("core::disassembly", |b| b.iter(|| core.disassembly()));
}

criterion_group!(benches, step, run, disassemble);
criterion_main!(benches);
