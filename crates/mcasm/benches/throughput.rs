//! Performance benchmarks for `mcasm`.
//!
//! Measures:
//! - Single instruction latency
//! - Straight-line emission throughput (instructions/s)
//! - Label-heavy workloads (forward fixups patched at bind)
//! - `load_immediate` sequence selection
//! - Decode and disassembly throughput
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use mcasm::riscv::{
    decode, Address, Assembler, AssemblerOptions, Disassembler, ExtensionSet, JumpDistance, Register::*, Xlen,
};

fn rv64(extensions: ExtensionSet) -> Assembler {
    Assembler::with_options(AssemblerOptions::new(Xlen::Rv64).with_extensions(extensions))
}

// ─── Single-Instruction Latency ──────────────────────────────────────────────

fn bench_single_instruction(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_instruction");

    group.bench_function("add", |b| {
        b.iter(|| {
            let mut asm = rv64(ExtensionSet::RV_G);
            asm.add(black_box(A0), A1, A2).unwrap();
            asm
        })
    });

    group.bench_function("add_compressed", |b| {
        b.iter(|| {
            let mut asm = rv64(ExtensionSet::RV_GC);
            asm.add(black_box(A0), A0, A2).unwrap();
            asm
        })
    });

    group.bench_function("ld", |b| {
        b.iter(|| {
            let mut asm = rv64(ExtensionSet::RV_G);
            asm.ld(A0, Address::new(black_box(A1), 8)).unwrap();
            asm
        })
    });

    group.finish();
}

// ─── Straight-Line Throughput ────────────────────────────────────────────────

fn emit_block(asm: &mut Assembler, n: usize) {
    for i in 0..n {
        match i % 6 {
            0 => asm.add(A0, A1, A2).unwrap(),
            1 => asm.addi(A3, A3, 1).unwrap(),
            2 => asm.sub(T0, T1, T2).unwrap(),
            3 => asm.ld(A4, Address::new(Sp, 16)).unwrap(),
            4 => asm.sd(A4, Address::new(Sp, 24)).unwrap(),
            _ => asm.mul(A5, A0, A3).unwrap(),
        }
    }
}

fn bench_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("throughput");

    for n in [100usize, 1_000, 10_000] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("rv64g_{n}"), |b| {
            b.iter(|| {
                let mut asm = rv64(ExtensionSet::RV_G);
                emit_block(&mut asm, black_box(n));
                asm.finalize().unwrap()
            })
        });
        group.bench_function(format!("rv64gc_{n}"), |b| {
            b.iter(|| {
                let mut asm = rv64(ExtensionSet::RV_GC);
                emit_block(&mut asm, black_box(n));
                asm.finalize().unwrap()
            })
        });
    }

    group.finish();
}

// ─── Label-Heavy Workloads ───────────────────────────────────────────────────

fn bench_labels(c: &mut Criterion) {
    let mut group = c.benchmark_group("labels");

    for n in [100usize, 1_000] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("forward_branches_{n}"), |b| {
            b.iter(|| {
                let mut asm = rv64(ExtensionSet::RV_GC);
                let labels: Vec<_> = (0..n).map(|_| asm.new_label()).collect();
                for &l in &labels {
                    asm.bnez(A0, l, JumpDistance::Near).unwrap();
                }
                for &l in &labels {
                    asm.addi(A0, A0, -1).unwrap();
                    asm.bind(l).unwrap();
                }
                asm.finalize().unwrap()
            })
        });
        group.bench_function(format!("one_label_many_uses_{n}"), |b| {
            b.iter(|| {
                let mut asm = rv64(ExtensionSet::RV_G);
                let exit = asm.new_label();
                for _ in 0..n {
                    asm.beqz(A0, exit, JumpDistance::Near).unwrap();
                }
                asm.bind(exit).unwrap();
                asm.finalize().unwrap()
            })
        });
    }

    group.finish();
}

// ─── load_immediate ──────────────────────────────────────────────────────────

fn bench_load_immediate(c: &mut Criterion) {
    let mut group = c.benchmark_group("load_immediate");

    for (name, value) in [
        ("small", 42i64),
        ("i32", 0x1234_5678),
        ("i64", 0x1234_5678_9ABC_DEF0),
        ("sparse", 0x8000_0000_0000_0001u64 as i64),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut asm = rv64(ExtensionSet::RV_GC);
                asm.load_immediate(A0, black_box(value)).unwrap();
                asm
            })
        });
    }

    group.finish();
}

// ─── Decode / Disassembly ────────────────────────────────────────────────────

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    let mut asm = rv64(ExtensionSet::RV_GC);
    emit_block(&mut asm, 1_000);
    asm.ret().unwrap();
    let code = asm.finalize().unwrap();

    group.throughput(Throughput::Bytes(code.size() as u64));
    group.bench_function("decode_1k", |b| {
        b.iter(|| {
            let bytes = black_box(code.bytes());
            let mut pos = 0;
            while let Some(d) = decode(&bytes[pos..], Xlen::Rv64) {
                pos += d.len;
            }
            pos
        })
    });
    group.bench_function("disassemble_1k", |b| {
        b.iter(|| Disassembler::new(Xlen::Rv64).disassemble_bytes(black_box(code.bytes())))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_single_instruction,
    bench_throughput,
    bench_labels,
    bench_load_immediate,
    bench_decode,
);
criterion_main!(benches);
