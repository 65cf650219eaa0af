//! End-to-end tests: assemble with `mcasm`, run in the simulator and check
//! the architectural results.

use mcasm::riscv::{
    csr, fflags, Address, Assembler, AssemblerOptions, ExtensionSet, FRegister::*, JumpDistance,
    MemoryOrder, OperandSize, Register::*, RoundingMode, Xlen, TMP, TMP2,
};
use mcasm::{AsmError, ObjectRef};
use mcasm_sim::{Args, Program, SimConfig, SimError, Simulator, DATA_BASE};

// ─── Helpers ────────────────────────────────────────────────────────────

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn load_with(
    options: AssemblerOptions,
    config: SimConfig,
    build: impl FnOnce(&mut Assembler) -> Result<(), AsmError>,
) -> (Simulator, Program) {
    init();
    let mut asm = Assembler::with_options(options);
    build(&mut asm).expect("assemble");
    let code = asm.finalize().expect("finalize");
    let mut sim = Simulator::new(code.xlen(), config);
    let program = sim.load(&code).expect("load");
    (sim, program)
}

fn load(xlen: Xlen, build: impl FnOnce(&mut Assembler) -> Result<(), AsmError>) -> (Simulator, Program) {
    load_with(
        AssemblerOptions::new(xlen).with_extensions(ExtensionSet::RV_G),
        SimConfig::default(),
        build,
    )
}

// ─── Integer code ───────────────────────────────────────────────────────

#[test]
fn returns_argument_sum() {
    let (mut sim, p) = load(Xlen::Rv64, |asm| {
        asm.add(A0, A0, A1)?;
        asm.ret()
    });
    assert_eq!(sim.call(&p, &[40, 2]).unwrap(), 42);
    assert_eq!(sim.call(&p, &[u64::MAX, 1]).unwrap(), 0);
}

#[test]
fn counting_loop() {
    for xlen in [Xlen::Rv32, Xlen::Rv64] {
        let (mut sim, p) = load(xlen, |asm| {
            let top = asm.new_label();
            asm.li(A0, 0)?;
            asm.li(A1, 87)?;
            asm.bind(top)?;
            asm.addi(A0, A0, 2)?;
            asm.addi(A1, A1, -1)?;
            asm.bnez(A1, top, JumpDistance::Near)?;
            asm.ret()
        });
        let out = sim.call_with(&p, &Args::new()).unwrap();
        assert_eq!(out.a0, 174, "{xlen}");
        assert_eq!(out.steps, 2 + 87 * 3 + 1);
    }
}

#[test]
fn forward_branch_skips_trap() {
    for distance in [JumpDistance::Short, JumpDistance::Near, JumpDistance::Far] {
        let (mut sim, p) = load_with(AssemblerOptions::new(Xlen::Rv64), SimConfig::default(), |asm| {
            let over = asm.new_label();
            asm.li(A0, 7)?;
            asm.beqz(A1, over, distance)?;
            asm.trap()?;
            asm.bind(over)?;
            asm.addi(A0, A0, 1)?;
            asm.ret()
        });
        assert_eq!(sim.call(&p, &[0, 0]).unwrap(), 8, "{distance:?}");
        assert!(matches!(sim.call(&p, &[0, 1]), Err(SimError::IllegalInstruction { .. })));
    }
}

#[test]
fn rv32_results_are_sign_extended() {
    let (mut sim, p) = load(Xlen::Rv32, |asm| {
        asm.li(A0, i32::MAX as i64)?;
        asm.addi(A0, A0, 1)?;
        asm.li(A1, -5)?;
        asm.ret()
    });
    let out = sim.call_with(&p, &Args::new()).unwrap();
    assert_eq!(out.a0, i32::MIN as i64 as u64);
    assert_eq!(out.a1 as i64, -5);
}

#[test]
fn division_edge_cases() {
    let (mut sim, p) = load(Xlen::Rv64, |asm| {
        asm.div(A2, A0, A1)?;
        asm.rem(A3, A0, A1)?;
        asm.divu(A4, A0, A1)?;
        asm.remu(A5, A0, A1)?;
        asm.divw(A6, A0, A1)?;
        asm.remw(A7, A0, A1)?;
        asm.mv(A0, A2)?;
        asm.mv(A1, A3)?;
        asm.ret()
    });
    let mut run = |a: i64, b: i64| {
        let out = sim.call(&p, &[a as u64, b as u64]);
        let hart = sim.hart();
        let regs = [hart.x(10), hart.x(11), hart.x(14), hart.x(15), hart.x(16), hart.x(17)];
        out.unwrap();
        regs.map(|r| r as i64)
    };

    // div, rem, divu, remu, divw, remw
    assert_eq!(run(7, 0), [-1, 7, -1, 7, -1, 7]);
    assert_eq!(run(i64::MIN, -1), [i64::MIN, 0, 0, i64::MIN, 0, 0]);
    assert_eq!(run(-7, 2), [-3, -1, (-7i64 as u64 / 2) as i64, 1, -3, -1]);
    assert_eq!(run(i32::MIN as i64, -1), [1 << 31, 0, 0, i32::MIN as i64, i32::MIN as i64, 0]);
}

#[test]
fn recursive_calls_preserve_the_stack() {
    for xlen in [Xlen::Rv32, Xlen::Rv64] {
        let (mut sim, p) = load_with(AssemblerOptions::new(xlen), SimConfig::default(), |asm| {
            let fib = asm.new_label();
            let base = asm.new_label();
            asm.bind(fib)?;
            asm.li(T0, 2)?;
            asm.blt(A0, T0, base, JumpDistance::Near)?;
            asm.push_list(&[Ra, S1, S2])?;
            asm.mv(S1, A0)?;
            asm.addi(A0, S1, -1)?;
            asm.call(fib)?;
            asm.mv(S2, A0)?;
            asm.addi(A0, S1, -2)?;
            asm.call(fib)?;
            asm.add(A0, A0, S2)?;
            asm.pop_list(&[Ra, S1, S2])?;
            asm.ret()?;
            asm.bind(base)?;
            asm.ret()
        });
        assert_eq!(sim.call(&p, &[15]).unwrap(), 610, "{xlen}");
        let hart = sim.hart();
        assert_eq!(hart.x(2), sim.stack_top());
        assert_eq!(hart.x(9), 0);
        assert_eq!(hart.x(18), 0);
    }
}

#[test]
fn frames_nest() {
    let (mut sim, p) = load(Xlen::Rv64, |asm| {
        let callee = asm.new_label();
        asm.enter_frame(16)?;
        asm.sd(A0, Address::new(Sp, 8))?;
        asm.li(A0, 1)?;
        asm.call(callee)?;
        asm.ld(A1, Address::new(Sp, 8))?;
        asm.add(A0, A0, A1)?;
        asm.leave_frame()?;
        asm.ret()?;
        asm.bind(callee)?;
        asm.enter_frame(0)?;
        asm.addi(A0, A0, 100)?;
        asm.leave_frame()?;
        asm.ret()
    });
    assert_eq!(sim.call(&p, &[20]).unwrap(), 121);
    assert_eq!(sim.hart().x(8), 0);
    assert_eq!(sim.hart().x(2), sim.stack_top());
}

#[test]
fn far_branches_reach() {
    let options = AssemblerOptions::new(Xlen::Rv64)
        .with_extensions(ExtensionSet::RV_G)
        .with_far_branches(true);
    let (mut sim, p) = load_with(options, SimConfig::default(), |asm| {
        let skip = asm.new_label();
        asm.li(A2, 1)?;
        asm.beq(A0, A1, skip, JumpDistance::Far)?;
        for _ in 0..2000 {
            asm.addi(A2, A2, 1)?;
        }
        asm.bind(skip)?;
        asm.mv(A0, A2)?;
        asm.ret()
    });
    assert_eq!(sim.call(&p, &[3, 3]).unwrap(), 1);
    assert_eq!(sim.call(&p, &[3, 4]).unwrap(), 2001);
}

#[test]
fn compressed_code_executes() {
    let (mut sim, p) = load_with(AssemblerOptions::new(Xlen::Rv64), SimConfig::default(), |asm| {
        let top = asm.new_label();
        asm.li(A0, 0)?;
        asm.li(A1, 10)?;
        asm.bind(top)?;
        asm.addi(A0, A0, 3)?;
        asm.addi(A1, A1, -1)?;
        asm.c_bnez(A1, top)?;
        asm.ret()
    });
    assert_eq!(p.size(), 12);
    assert_eq!(sim.call(&p, &[]).unwrap(), 30);
}

// ─── Memory ─────────────────────────────────────────────────────────────

#[test]
fn indexed_addressing() {
    let (mut sim, p) = load(Xlen::Rv64, |asm| {
        asm.li(T0, 11)?;
        asm.store_to_address(T0, Address::post_index(A0, 8), OperandSize::Double)?;
        asm.li(T0, 22)?;
        asm.store_to_address(T0, Address::post_index(A0, 8), OperandSize::Double)?;
        asm.load_from_address(A1, Address::pre_index(A0, -8), OperandSize::Double)?;
        asm.li(T0, 33)?;
        asm.store_to_address(T0, Address::new(A0, 0x2000), OperandSize::Double)?;
        asm.load_from_address(A2, Address::new(A0, 0x2000), OperandSize::UnsignedByte)?;
        asm.add(A1, A1, A2)?;
        asm.ret()
    });
    let out = sim.call_with(&p, &Args::new().uint(DATA_BASE)).unwrap();
    assert_eq!(out.a0, DATA_BASE + 8);
    assert_eq!(out.a1, 22 + 33);
    assert_eq!(sim.read_u64(DATA_BASE).unwrap(), 11);
    assert_eq!(sim.read_u64(DATA_BASE + 8).unwrap(), 22);
    assert_eq!(sim.read_u64(DATA_BASE + 8 + 0x2000).unwrap(), 33);
}

#[test]
fn wide_write_back_stores_keep_their_data() {
    let (mut sim, p) = load(Xlen::Rv64, |asm| {
        asm.li(TMP2, 7)?;
        asm.store_to_address(TMP2, Address::pre_index(A0, 0x10000), OperandSize::Double)?;
        asm.store_to_address(TMP2, Address::post_index(A0, 0x10000), OperandSize::Double)?;
        asm.ret()
    });
    let out = sim.call_with(&p, &Args::new().uint(DATA_BASE)).unwrap();
    assert_eq!(out.a0, DATA_BASE + 0x20000);
    assert_eq!(sim.read_u64(DATA_BASE + 0x10000).unwrap(), 7);

    let mut asm = Assembler::new(Xlen::Rv64);
    assert!(matches!(
        asm.store_to_address(TMP, Address::pre_index(A0, 0x10000), OperandSize::Double),
        Err(AsmError::InvalidOperands { .. })
    ));
}

#[test]
fn narrow_loads_extend() {
    let (mut sim, p) = load(Xlen::Rv64, |asm| {
        asm.lb(A1, Address::base(A0))?;
        asm.lhu(A2, Address::base(A0))?;
        asm.lwu(A3, Address::base(A0))?;
        asm.lw(A0, Address::base(A0))?;
        asm.ret()
    });
    sim.write_memory(DATA_BASE, &[0x80, 0xFF, 0xFF, 0xFF]).unwrap();
    let out = sim.call_with(&p, &Args::new().uint(DATA_BASE)).unwrap();
    assert_eq!(out.a0 as i64, -128);
    assert_eq!(out.a1 as i64, -128);
    assert_eq!(sim.hart().x(12), 0xFF80);
    assert_eq!(sim.hart().x(13), 0xFFFF_FF80);
}

#[test]
fn atomics_and_reservations() {
    let (mut sim, p) = load(Xlen::Rv64, |asm| {
        let at = Address::base(A0);
        asm.li(T0, 5)?;
        asm.sw(T0, at)?;
        asm.li(T1, 3)?;
        asm.amoadd_w(A1, T1, at, MemoryOrder::Relaxed)?;
        asm.lr_w(T2, at, MemoryOrder::Acquire)?;
        asm.addi(T2, T2, 1)?;
        asm.sc_w(T3, T2, at, MemoryOrder::Release)?;
        asm.sc_w(T4, T2, at, MemoryOrder::Relaxed)?;
        asm.li(T0, -7)?;
        asm.amomin_w(A2, T0, at, MemoryOrder::AcqRel)?;
        asm.lw(A0, at)?;
        asm.ret()
    });
    let out = sim.call_with(&p, &Args::new().uint(DATA_BASE)).unwrap();
    assert_eq!(out.a0 as i64, -7);
    assert_eq!(out.a1, 5);
    let hart = sim.hart();
    assert_eq!(hart.x(12), 9);
    assert_eq!(hart.x(28), 0, "sc after lr succeeds");
    assert_ne!(hart.x(29), 0, "second sc has no reservation");
}

#[test]
fn doubleword_atomics() {
    let (mut sim, p) = load(Xlen::Rv64, |asm| {
        let at = Address::base(A0);
        asm.amoswap_d(A2, A1, at, MemoryOrder::Relaxed)?;
        asm.li(T0, 1)?;
        asm.amomaxu_d(A3, T0, at, MemoryOrder::Relaxed)?;
        asm.ld(A0, at)?;
        asm.mv(A1, A2)?;
        asm.ret()
    });
    sim.write_memory(DATA_BASE, &77u64.to_le_bytes()).unwrap();
    let out = sim.call_with(&p, &Args::new().uint(DATA_BASE).uint(u64::MAX - 1)).unwrap();
    assert_eq!(out.a1, 77);
    assert_eq!(out.a0, u64::MAX - 1);
    assert_eq!(sim.hart().x(13), u64::MAX - 1);
}

#[test]
fn misaligned_atomic_faults() {
    let (mut sim, p) = load(Xlen::Rv64, |asm| {
        asm.amoadd_w(A1, A1, Address::base(A0), MemoryOrder::Relaxed)?;
        asm.ret()
    });
    assert_eq!(
        sim.call(&p, &[DATA_BASE + 2, 1]),
        Err(SimError::MisalignedAccess { addr: DATA_BASE + 2, align: 4 })
    );
    assert_eq!(sim.call(&p, &[DATA_BASE, 1]), Ok(DATA_BASE));
    assert_eq!(sim.read_u64(DATA_BASE).unwrap(), 1);
}

// ─── Object pool ────────────────────────────────────────────────────────

#[test]
fn pool_constants_and_objects() {
    let options = AssemblerOptions::new(Xlen::Rv64).with_constant_pool(true);
    let (mut sim, p) = load_with(options, SimConfig::default(), |asm| {
        asm.li(A0, 0x1234_5678_9ABC_DEF0)?;
        asm.load_object(A1, ObjectRef::new(0xDEAD_BEEF))?;
        asm.li(A2, 0x1234_5678_9ABC_DEF0)?;
        asm.ret()
    });
    let out = sim.call_with(&p, &Args::new()).unwrap();
    assert_eq!(out.a0, 0x1234_5678_9ABC_DEF0);
    assert_eq!(out.a1, 0xDEAD_BEEF);
    assert_eq!(sim.hart().x(12), 0x1234_5678_9ABC_DEF0);
    assert_eq!(sim.read_u64(p.pool() + 8).unwrap(), 0xDEAD_BEEF);
}

#[test]
fn double_constants_on_both_widths() {
    for xlen in [Xlen::Rv32, Xlen::Rv64] {
        let (mut sim, p) = load(xlen, |asm| {
            asm.load_double_immediate(Fa0, 2.5)?;
            asm.fadd_d(Fa0, Fa0, Fa0, RoundingMode::Rne)?;
            asm.load_double_immediate(Fa1, 0.0)?;
            asm.fadd_d(Fa0, Fa0, Fa1, RoundingMode::Rne)?;
            asm.ret()
        });
        let out = sim.call_with(&p, &Args::new()).unwrap();
        assert_eq!(out.f64(), 5.0, "{xlen}");
        assert_eq!(out.fflags, 0);
    }
}

// ─── Floating point ─────────────────────────────────────────────────────

#[test]
fn double_arithmetic() {
    let (mut sim, p) = load(Xlen::Rv64, |asm| {
        asm.fmadd_d(Fa0, Fa0, Fa1, Fa2, RoundingMode::Rne)?;
        asm.fsqrt_d(Fa1, Fa1, RoundingMode::Rne)?;
        asm.ret()
    });
    let out = sim
        .call_with(&p, &Args::new().double(2.0).double(3.0).double(1.0))
        .unwrap();
    assert_eq!(out.f64(), 7.0);
    assert_eq!(f64::from_bits(sim.hart().f(11)), 3f64.sqrt());
    assert_eq!(out.fflags, fflags::NX);
}

#[test]
fn single_results_are_boxed() {
    let (mut sim, p) = load(Xlen::Rv64, |asm| {
        asm.fadd_s(Fa0, Fa0, Fa1, RoundingMode::Rne)?;
        asm.load_single_immediate(Fa1, 1.25)?;
        asm.fmul_s(Fa0, Fa0, Fa1, RoundingMode::Rne)?;
        asm.ret()
    });
    let out = sim.call_with(&p, &Args::new().single(1.5).single(2.0)).unwrap();
    assert_eq!(out.f32(), 4.375);
    assert_eq!(out.fa0 >> 32, 0xFFFF_FFFF);
}

#[test]
fn dynamic_rounding_follows_frm() {
    let (mut sim, p) = load(Xlen::Rv64, |asm| {
        asm.csrw(csr::FRM, A0)?;
        asm.fdiv_d(Fa0, Fa0, Fa1, RoundingMode::Dyn)?;
        asm.ret()
    });
    let mut div = |mode: u32| {
        let out = sim
            .call_with(&p, &Args::new().uint(mode as u64).double(1.0).double(3.0))
            .unwrap();
        assert_eq!(out.fflags, fflags::NX);
        out.f64()
    };
    let down = div(RoundingMode::Rdn.bits());
    let up = div(RoundingMode::Rup.bits());
    let nearest = div(RoundingMode::Rne.bits());
    assert_eq!(up.to_bits(), down.to_bits() + 1);
    assert_eq!(nearest, 1.0 / 3.0);
    assert!(nearest == up || nearest == down);

    assert_eq!(
        sim.call_with(&p, &Args::new().uint(5).double(1.0).double(3.0)),
        Err(SimError::IllegalInstruction { pc: p.entry() + 4, raw: 0x1AB5_7553 })
    );
}

#[test]
fn conversions_saturate_and_flag() {
    let (mut sim, p) = load(Xlen::Rv64, |asm| {
        asm.fcvt_w_d(A0, Fa0, RoundingMode::Rtz)?;
        asm.fcvt_l_d(A1, Fa1, RoundingMode::Rne)?;
        asm.ret()
    });
    let out = sim.call_with(&p, &Args::new().double(-2.7).double(2.5)).unwrap();
    assert_eq!(out.a0 as i64, -2);
    assert_eq!(out.a1, 2);
    assert_eq!(out.fflags, fflags::NX);

    let out = sim
        .call_with(&p, &Args::new().double(f64::NAN).double(1e30))
        .unwrap();
    assert_eq!(out.a0, i32::MAX as u64);
    assert_eq!(out.a1, i64::MAX as u64);
    assert_eq!(out.fflags, fflags::NV);
}

#[test]
fn integer_to_double_rounds() {
    let (mut sim, p) = load(Xlen::Rv64, |asm| {
        asm.fcvt_d_l(Fa0, A0, RoundingMode::Rne)?;
        asm.ret()
    });
    let out = sim.call_with(&p, &Args::new().int((1 << 53) + 1)).unwrap();
    assert_eq!(out.f64(), (1u64 << 53) as f64);
    assert_eq!(out.fflags, fflags::NX);
}

// ─── Traps and limits ───────────────────────────────────────────────────

#[test]
fn traps_stop_execution() {
    let (mut sim, p) = load(Xlen::Rv64, |asm| asm.trap());
    assert_eq!(
        sim.call(&p, &[]),
        Err(SimError::IllegalInstruction { pc: p.entry(), raw: 0 })
    );

    let (mut sim, p) = load(Xlen::Rv64, |asm| {
        asm.nop()?;
        asm.ebreak()
    });
    assert_eq!(sim.call(&p, &[]), Err(SimError::Breakpoint { pc: p.entry() + 4 }));

    let (mut sim, p) = load(Xlen::Rv64, |asm| asm.ecall());
    assert_eq!(sim.call(&p, &[]), Err(SimError::EnvironmentCall { pc: p.entry() }));

    let (mut sim, p) = load(Xlen::Rv64, |asm| asm.ld(A0, Address::base(Zero)));
    assert_eq!(sim.call(&p, &[]), Err(SimError::MemoryFault { addr: 0, size: 8 }));
}

#[test]
fn step_limit() {
    let config = SimConfig::default().with_step_limit(1000);
    let options = AssemblerOptions::new(Xlen::Rv64).with_extensions(ExtensionSet::RV_G);
    let (mut sim, p) = load_with(options, config, |asm| {
        let spin = asm.new_label();
        asm.bind(spin)?;
        asm.j(spin, JumpDistance::Near)
    });
    assert_eq!(sim.call(&p, &[]), Err(SimError::StepLimit { limit: 1000 }));
}

#[test]
fn counters_read_instret() {
    let (mut sim, p) = load(Xlen::Rv64, |asm| {
        asm.nop()?;
        asm.nop()?;
        asm.csrr(A0, csr::INSTRET)?;
        asm.csrr(A1, csr::CYCLE)?;
        asm.ret()
    });
    let out = sim.call_with(&p, &Args::new()).unwrap();
    assert_eq!(out.a0, 2);
    assert_eq!(out.a1, 3);
}
