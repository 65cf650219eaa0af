//! Execution properties: whatever sequence the assembler picks, running it
//! must produce the requested value.

use mcasm::riscv::{Assembler, AssemblerOptions, Register, Register::*, Xlen};
use mcasm_sim::{Args, SimConfig, Simulator};
use proptest::prelude::*;

fn small_config() -> SimConfig {
    SimConfig::default()
        .with_memory_size(0x21_0000)
        .with_stack_size(0x1_0000)
}

/// Run `li rd, value; ret` and return `rd`.
fn run_li(xlen: Xlen, rd: Register, value: i64, pool: bool) -> u64 {
    let mut asm = Assembler::with_options(AssemblerOptions::new(xlen).with_constant_pool(pool));
    asm.li(rd, value).unwrap();
    asm.ret().unwrap();
    let code = asm.finalize().unwrap();
    let mut sim = Simulator::new(xlen, small_config());
    let program = sim.load(&code).unwrap();
    sim.call_with(&program, &Args::new()).unwrap();
    sim.hart().x(rd.num())
}

fn arb_rd() -> impl Strategy<Value = Register> {
    prop::sample::select(vec![A0, T0, T6, S11])
}

/// Values biased towards the shapes that take different `li` paths.
fn arb_i64() -> impl Strategy<Value = i64> {
    prop_oneof![
        any::<i64>(),
        -2048i64..2048,
        any::<i32>().prop_map(i64::from),
        (any::<i32>(), 12u32..44).prop_map(|(v, s)| (v as i64) << s),
        (any::<u16>(), any::<u16>()).prop_map(|(hi, lo)| ((hi as i64) << 48) | lo as i64),
    ]
}

proptest! {
    #[test]
    fn li_reproduces_value_rv64(value in arb_i64(), rd in arb_rd(), pool: bool) {
        prop_assert_eq!(run_li(Xlen::Rv64, rd, value, pool), value as u64);
    }

    #[test]
    fn li_reproduces_signed_value_rv32(value: i32, rd in arb_rd(), pool: bool) {
        prop_assert_eq!(run_li(Xlen::Rv32, rd, value as i64, pool), value as i64 as u64);
    }

    #[test]
    fn li_reproduces_unsigned_value_rv32(value: u32, rd in arb_rd()) {
        prop_assert_eq!(run_li(Xlen::Rv32, rd, value as i64, false) as u32, value);
    }

    #[test]
    fn add_matches_wrapping_add(a: u64, b: u64) {
        let mut asm = Assembler::new(Xlen::Rv64);
        asm.add(A0, A0, A1).unwrap();
        asm.ret().unwrap();
        let mut sim = Simulator::new(Xlen::Rv64, small_config());
        let program = sim.load(&asm.finalize().unwrap()).unwrap();
        prop_assert_eq!(sim.call(&program, &[a, b]).unwrap(), a.wrapping_add(b));
    }
}
