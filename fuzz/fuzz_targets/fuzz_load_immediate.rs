#![no_main]
use libfuzzer_sys::fuzz_target;
use mcasm::riscv::{Assembler, AssemblerOptions, Register, Xlen};
use mcasm_sim::{Args, SimConfig, Simulator};

fn config() -> SimConfig {
    SimConfig::default()
        .with_memory_size(0x21_0000)
        .with_stack_size(0x1_0000)
}

fuzz_target!(|input: (i64, u8, bool)| {
    let (value, reg, pool) = input;
    let Some(rd) = Register::from_num(u32::from(reg % 32)) else {
        return;
    };
    if matches!(rd, Register::Zero | Register::Ra | Register::Sp) {
        return;
    }
    for xlen in [Xlen::Rv32, Xlen::Rv64] {
        let value = match xlen {
            Xlen::Rv32 => value as i32 as i64,
            Xlen::Rv64 => value,
        };
        let mut asm = Assembler::with_options(AssemblerOptions::new(xlen).with_constant_pool(pool));
        asm.li(rd, value).expect("li");
        asm.ret().expect("ret");
        let code = asm.finalize().expect("finalize");
        let mut sim = Simulator::new(xlen, config());
        let program = sim.load(&code).expect("load");
        sim.call_with(&program, &Args::new()).expect("run");
        assert_eq!(sim.hart().x(rd.num()), value as u64, "li {rd}, {value:#x} on {xlen}");
    }
});
