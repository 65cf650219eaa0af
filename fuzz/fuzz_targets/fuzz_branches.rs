#![no_main]
use libfuzzer_sys::fuzz_target;
use mcasm::riscv::{Assembler, AssemblerOptions, Disassembler, JumpDistance, Register::*, Xlen};

// Each byte is one operation: bind a label, branch to one, or pad.
fuzz_target!(|data: &[u8]| {
    for far in [false, true] {
        let mut asm = Assembler::with_options(AssemblerOptions::new(Xlen::Rv64).with_far_branches(far));
        let labels: Vec<_> = (0..8).map(|_| asm.new_label()).collect();
        for &b in data.iter().take(4096) {
            let label = labels[(b & 7) as usize];
            let distance = match (b >> 3) & 3 {
                0 => JumpDistance::Short,
                1 => JumpDistance::Near,
                _ => JumpDistance::Far,
            };
            let _ = match b >> 5 {
                0 if !asm.is_bound(label) => asm.bind(label),
                1 => asm.beq(A0, A1, label, distance),
                2 => asm.bnez(A2, label, distance),
                3 => asm.j(label, distance),
                4 => asm.call(label),
                5 => {
                    for _ in 0..(b & 31) * 64 {
                        asm.nop().expect("nop");
                    }
                    Ok(())
                }
                _ => asm.addi(A0, A0, i64::from(b & 31)),
            };
        }
        for &label in &labels {
            if !asm.is_bound(label) {
                // Out-of-range sites report an error but still bind.
                let _ = asm.bind(label);
            }
        }
        let code = asm.finalize().expect("every label is bound");
        let _ = Disassembler::new(Xlen::Rv64).disassemble_bytes(code.bytes());
    }
});
