//! Property-based tests using proptest.
//!
//! These tests verify emitter invariants across large, randomly generated
//! input spaces, complementing the targeted unit tests and the libfuzzer
//! targets. Execution properties live with the simulator in `mcasm-sim`.

use mcasm::riscv::{
    compress, decode, decode_word, expand, Assembler, AssemblerOptions, Disassembler, ExtensionSet,
    JumpDistance, Register, Register::*, Xlen,
};
use mcasm::AsmError;
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────

fn arb_xlen() -> impl Strategy<Value = Xlen> {
    prop_oneof![Just(Xlen::Rv32), Just(Xlen::Rv64)]
}

/// 32-bit words from the opcode groups that have compressed forms, with
/// small immediates so that a good share of them actually compress.
fn compressible_word() -> impl Strategy<Value = u32> {
    let opcode = prop::sample::select(vec![
        0b001_0011u32, // OP-IMM
        0b001_1011,    // OP-IMM-32
        0b011_0011,    // OP
        0b011_1011,    // OP-32
        0b011_0111,    // LUI
        0b000_0011,    // LOAD
        0b010_0011,    // STORE
        0b000_0111,    // LOAD-FP
        0b010_0111,    // STORE-FP
        0b110_0111,    // JALR
        0b110_1111,    // JAL
        0b110_0011,    // BRANCH
    ]);
    let funct7 = prop::sample::select(vec![0u32, 0x20, 0x01, 0x7F]);
    (
        opcode,
        0u32..32,
        0u32..8,
        0u32..32,
        0u32..32,
        funct7,
    )
        .prop_map(|(op, rd, f3, rs1, rs2, f7)| {
            op | (rd << 7) | (f3 << 12) | (rs1 << 15) | (rs2 << 20) | (f7 << 25)
        })
}

fn rv(xlen: Xlen, extensions: ExtensionSet) -> Assembler {
    Assembler::with_options(AssemblerOptions::new(xlen).with_extensions(extensions))
}

fn first_imm(asm: &Assembler) -> i64 {
    decode(asm.bytes(), asm.xlen())
        .expect("first instruction decodes")
        .instruction
        .imm
}

// ── Decoder robustness ──────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    /// The decoder and disassembler must NEVER panic on arbitrary bytes.
    #[test]
    fn no_panic_on_arbitrary_bytes(bytes in prop::collection::vec(any::<u8>(), 0..64), xlen in arb_xlen()) {
        let _ = decode(&bytes, xlen);
        let _ = Disassembler::new(xlen).disassemble_bytes(&bytes);
    }

    /// Every legal compressed halfword expands to a legal 32-bit word.
    #[test]
    fn expansions_are_legal(half in any::<u16>(), xlen in arb_xlen()) {
        if let Some(word) = expand(half, xlen) {
            prop_assert!(decode_word(word, xlen).is_some(), "{:#06x} -> {:#010x}", half, word);
            prop_assert_eq!(decode(&half.to_le_bytes(), xlen).map(|d| d.word), Some(word));
        }
    }

    /// A substitution is only ever made when it expands back to the exact word.
    #[test]
    fn compression_is_exact(word in compressible_word(), xlen in arb_xlen()) {
        if let Some(half) = compress(word, xlen) {
            prop_assert_eq!(expand(half, xlen), Some(word), "{:#010x} -> {:#06x}", word, half);
        }
    }
}

// ── load_immediate ──────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// RV64 sequences are deterministic and at most eight instructions.
    #[test]
    fn li_rv64_bounded_and_deterministic(value in any::<i64>()) {
        let mut a = rv(Xlen::Rv64, ExtensionSet::RV_G);
        let mut b = rv(Xlen::Rv64, ExtensionSet::RV_G);
        a.load_immediate(A0, value).unwrap();
        b.load_immediate(A0, value).unwrap();
        prop_assert_eq!(a.bytes(), b.bytes());
        prop_assert!(a.code_size() <= 32);
        if (-2048..2048).contains(&value) {
            prop_assert_eq!(a.code_size(), 4);
        } else if i32::try_from(value).is_ok() {
            prop_assert!(a.code_size() <= 8);
        }
    }

    /// RV32 accepts exactly the values that fit 32 bits, signed or unsigned.
    #[test]
    fn li_rv32_range(value in any::<i64>()) {
        let mut asm = rv(Xlen::Rv32, ExtensionSet::RV_G);
        let fits = i32::try_from(value).is_ok() || u32::try_from(value).is_ok();
        match asm.load_immediate(A0, value) {
            Ok(()) => {
                prop_assert!(fits);
                prop_assert!(asm.code_size() <= 8);
            }
            Err(AsmError::ImmediateOverflow { .. }) => {
                prop_assert!(!fits);
                prop_assert_eq!(asm.code_size(), 0);
            }
            Err(e) => prop_assert!(false, "unexpected error {}", e),
        }
    }

    /// With the pool allowed, nothing takes more than two instructions.
    #[test]
    fn li_with_pool_is_short(value in any::<i64>()) {
        let opts = AssemblerOptions::new(Xlen::Rv64)
            .with_extensions(ExtensionSet::RV_G)
            .with_constant_pool(true);
        let mut asm = Assembler::with_options(opts);
        asm.load_immediate(A0, value).unwrap();
        prop_assert!(asm.code_size() <= 8);
        prop_assert!(asm.pool().len() <= 1);
    }
}

// ── Labels ──────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A forward branch is patched with the exact distance to its label.
    #[test]
    fn forward_branch_distance(fill in 0usize..1000) {
        let mut asm = rv(Xlen::Rv64, ExtensionSet::RV_G);
        let target = asm.new_label();
        asm.bne(A0, A1, target, JumpDistance::Near).unwrap();
        for _ in 0..fill {
            asm.nop().unwrap();
        }
        asm.bind(target).unwrap();
        prop_assert_eq!(first_imm(&asm), 4 + 4 * fill as i64);
        prop_assert_eq!(asm.pending_uses(target), 0);
    }

    /// A backward jump over arbitrary compressed filler lands on its label.
    #[test]
    fn backward_jump_distance(fill in 0usize..3000, pre in 0usize..4) {
        let mut asm = rv(Xlen::Rv64, ExtensionSet::RV_GC);
        for _ in 0..pre {
            asm.c_nop().unwrap();
        }
        let top = asm.new_label();
        asm.bind(top).unwrap();
        for _ in 0..fill {
            asm.c_nop().unwrap();
        }
        let site = asm.code_size();
        asm.j(top, JumpDistance::Near).unwrap();
        let d = decode(&asm.bytes()[site..], Xlen::Rv64).unwrap();
        prop_assert_eq!(d.instruction.imm, -(2 * fill as i64));
        prop_assert!(!d.is_compressed());
    }

    /// Several forward uses of one label are all patched at bind time.
    #[test]
    fn many_uses_of_one_label(uses in 1usize..20, gap in 0usize..8) {
        let mut asm = rv(Xlen::Rv64, ExtensionSet::RV_G);
        let target = asm.new_label();
        let mut sites = Vec::new();
        for _ in 0..uses {
            sites.push(asm.code_size());
            asm.beqz(A0, target, JumpDistance::Near).unwrap();
            for _ in 0..gap {
                asm.nop().unwrap();
            }
        }
        prop_assert_eq!(asm.pending_uses(target), uses);
        asm.bind(target).unwrap();
        let end = asm.code_size() as i64;
        for site in sites {
            let d = decode(&asm.bytes()[site..], Xlen::Rv64).unwrap();
            prop_assert_eq!(d.instruction.imm, end - site as i64);
        }
        prop_assert!(asm.finalize().is_ok());
    }
}

// ── Alignment ───────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn align_reaches_boundary_and_is_idempotent(
        prefix in 0usize..32,
        shift in 1u32..7,
        offset in 0usize..64,
    ) {
        let mut asm = rv(Xlen::Rv64, ExtensionSet::RV_GC);
        for _ in 0..prefix {
            asm.c_nop().unwrap();
        }
        let boundary = 1usize << shift;
        let offset = offset * 2;
        let before = asm.code_size();
        let padding = asm.align(boundary, offset).unwrap();
        prop_assert_eq!(asm.code_size(), before + padding);
        prop_assert!(padding < boundary);
        prop_assert_eq!(asm.code_size() % boundary, offset % boundary);
        prop_assert_eq!(asm.align(boundary, offset).unwrap(), 0);
    }

    #[test]
    fn align_rejects_non_powers_of_two(boundary in 0usize..1000) {
        let mut asm = rv(Xlen::Rv64, ExtensionSet::RV_GC);
        let result = asm.align(boundary, 0);
        if boundary.is_power_of_two() {
            prop_assert!(result.is_ok());
        } else {
            prop_assert_eq!(result, Err(AsmError::InvalidAlignment { boundary, offset: 0 }));
        }
    }
}

#[test]
fn scratch_registers_are_distinct() {
    use mcasm::riscv::{PP, TMP, TMP2};
    let regs: [Register; 3] = [TMP, TMP2, PP];
    assert_ne!(regs[0], regs[1]);
    assert_ne!(regs[1], regs[2]);
    assert_ne!(regs[0], regs[2]);
}
