//! # mcasm-sim — execute code emitted by `mcasm`
//!
//! A single-hart RV32/RV64 `IMAFDC` + `Zicsr Zba Zbb Zbs` interpreter used
//! as the test harness for the assembler: finalized [`Code`] is copied into
//! simulated memory, invoked with the standard calling convention and run
//! until it returns.
//!
//! ```rust
//! use mcasm::riscv::{Assembler, Register::*, Xlen};
//! use mcasm_sim::{SimConfig, Simulator};
//!
//! let mut asm = Assembler::new(Xlen::Rv64);
//! asm.add(A0, A0, A1)?;
//! asm.ret()?;
//! let code = asm.finalize()?;
//!
//! let mut sim = Simulator::new(Xlen::Rv64, SimConfig::default());
//! let program = sim.load(&code)?;
//! assert_eq!(sim.call(&program, &[40, 2])?, 42);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Memory map
//!
//! | Range | Contents |
//! |---|---|
//! | `[0, 0x1000)` | unmapped; [`RETURN_ADDRESS`] lives here |
//! | `[CODE_BASE, POOL_BASE)` | loaded code |
//! | `[POOL_BASE, DATA_BASE)` | object pools, addressed through `PP` |
//! | `[DATA_BASE, end - stack_size)` | scratch data for tests |
//! | `[end - stack_size, end)` | stack, growing down from `end` |

#![forbid(unsafe_code)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_lossless,
    clippy::cast_possible_wrap,
    clippy::unreadable_literal,
    clippy::too_many_lines,
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::enum_glob_use,
    clippy::uninlined_format_args
)]

/// Simulator error type.
pub mod error;
/// IEEE 754 arithmetic with explicit rounding.
pub mod fp;
/// Hart state and interpreter.
pub mod hart;
/// Simulated memory.
pub mod memory;

use log::debug;
use mcasm::riscv::{Code, FRegister, Register, Xlen, PP};

pub use error::SimError;
pub use hart::Hart;
pub use memory::Memory;

/// Where the first loaded program starts.
pub const CODE_BASE: u64 = 0x1_0000;
/// Where the first loaded object pool starts.
pub const POOL_BASE: u64 = 0x10_0000;
/// Start of the scratch data area.
pub const DATA_BASE: u64 = 0x20_0000;
/// `ra` on entry; reaching it ends the call.
pub const RETURN_ADDRESS: u64 = 0xF00;

/// Arguments passed in registers.
const ARG_REGISTERS: usize = 8;

/// Simulator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimConfig {
    /// Total simulated memory in bytes, including the guard area.
    pub memory_size: usize,
    /// Bytes reserved for the stack at the top of memory.
    pub stack_size: usize,
    /// Instructions a single call may execute.
    pub step_limit: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            memory_size: 0x40_0000,
            stack_size: 0x10_0000,
            step_limit: 50_000_000,
        }
    }
}

impl SimConfig {
    pub fn with_memory_size(mut self, bytes: usize) -> Self {
        self.memory_size = bytes;
        self
    }

    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = bytes;
        self
    }

    pub fn with_step_limit(mut self, steps: u64) -> Self {
        self.step_limit = steps;
        self
    }
}

/// A loaded program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Program {
    entry: u64,
    pool: u64,
    size: usize,
}

impl Program {
    /// Address of the first instruction.
    pub fn entry(&self) -> u64 {
        self.entry
    }

    /// Address of the object pool, the initial value of `PP`.
    pub fn pool(&self) -> u64 {
        self.pool
    }

    /// Code size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }
}

/// Register arguments for [`Simulator::call_with`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    ints: Vec<u64>,
    floats: Vec<u64>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Integer arguments `a0..` from a slice.
    pub fn ints(values: &[u64]) -> Self {
        Self {
            ints: values.to_vec(),
            floats: Vec::new(),
        }
    }

    /// Next integer argument.
    pub fn int(mut self, value: i64) -> Self {
        self.ints.push(value as u64);
        self
    }

    /// Next integer argument, unsigned.
    pub fn uint(mut self, value: u64) -> Self {
        self.ints.push(value);
        self
    }

    /// Next FP argument, double precision.
    pub fn double(mut self, value: f64) -> Self {
        self.floats.push(value.to_bits());
        self
    }

    /// Next FP argument, single precision (NaN-boxed).
    pub fn single(mut self, value: f32) -> Self {
        self.floats.push(fp::box_f32(value));
        self
    }
}

/// Register state after a call returned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    /// `a0`, sign-extended on RV32.
    pub a0: u64,
    /// `a1`, sign-extended on RV32.
    pub a1: u64,
    /// Raw bits of `fa0`.
    pub fa0: u64,
    /// Accrued `fflags`.
    pub fflags: u32,
    /// Instructions executed.
    pub steps: u64,
}

impl Outcome {
    /// `a0` as a signed value.
    pub fn signed(&self) -> i64 {
        self.a0 as i64
    }

    /// `fa0` as a double.
    pub fn f64(&self) -> f64 {
        f64::from_bits(self.fa0)
    }

    /// `fa0` as a NaN-boxed single.
    pub fn f32(&self) -> f32 {
        fp::unbox_f32(self.fa0)
    }
}

/// Memory plus one hart.
#[derive(Debug, Clone)]
pub struct Simulator {
    xlen: Xlen,
    config: SimConfig,
    memory: Memory,
    hart: Hart,
    next_code: u64,
    next_pool: u64,
}

fn align8(v: u64) -> u64 {
    (v + 7) & !7
}

impl Simulator {
    pub fn new(xlen: Xlen, config: SimConfig) -> Self {
        Self {
            xlen,
            config,
            memory: Memory::new(config.memory_size),
            hart: Hart::new(xlen),
            next_code: CODE_BASE,
            next_pool: POOL_BASE,
        }
    }

    pub fn xlen(&self) -> Xlen {
        self.xlen
    }

    pub fn config(&self) -> SimConfig {
        self.config
    }

    /// State of the hart after the last call.
    pub fn hart(&self) -> &Hart {
        &self.hart
    }

    /// Initial stack pointer.
    pub fn stack_top(&self) -> u64 {
        self.memory.end() & !15
    }

    /// End of the scratch data area.
    pub fn data_end(&self) -> u64 {
        self.memory.end().saturating_sub(self.config.stack_size as u64)
    }

    fn load_error(detail: String) -> SimError {
        SimError::Load { detail }
    }

    /// Copy `code` and its pool into memory. Programs loaded earlier stay
    /// valid.
    pub fn load(&mut self, code: &Code) -> Result<Program, SimError> {
        if code.xlen() != self.xlen {
            return Err(Self::load_error(format!(
                "code assembled for {} loaded into an {} simulator",
                code.xlen(),
                self.xlen
            )));
        }
        if self.data_end() < DATA_BASE {
            return Err(Self::load_error(format!(
                "{} bytes of memory leave no data area",
                self.config.memory_size
            )));
        }
        let entry = self.next_code;
        let code_end = entry + code.size() as u64;
        if code_end > POOL_BASE {
            return Err(Self::load_error(format!("{} bytes of code do not fit", code.size())));
        }
        let pool_bytes = code.pool_bytes();
        let pool = self.next_pool;
        let pool_end = pool + pool_bytes.len() as u64;
        if pool_end > DATA_BASE {
            return Err(Self::load_error(format!("{} bytes of pool do not fit", pool_bytes.len())));
        }
        self.memory.write_bytes(entry, code.bytes())?;
        self.memory.write_bytes(pool, &pool_bytes)?;
        self.next_code = align8(code_end);
        self.next_pool = align8(pool_end);
        debug!(
            "loaded {} bytes of code at {:#x}, {} pool bytes at {:#x}",
            code.size(),
            entry,
            pool_bytes.len(),
            pool
        );
        Ok(Program {
            entry,
            pool,
            size: code.size(),
        })
    }

    /// Copy bytes into simulated memory.
    pub fn write_memory(&mut self, addr: u64, bytes: &[u8]) -> Result<(), SimError> {
        self.memory.write_bytes(addr, bytes)
    }

    /// Read bytes back from simulated memory.
    pub fn read_memory(&self, addr: u64, len: usize) -> Result<Vec<u8>, SimError> {
        Ok(self.memory.slice(addr, len)?.to_vec())
    }

    /// Little-endian doubleword at `addr`.
    pub fn read_u64(&self, addr: u64) -> Result<u64, SimError> {
        self.memory.load(addr, 8)
    }

    /// Call `program` with integer arguments and return `a0`.
    pub fn call(&mut self, program: &Program, args: &[u64]) -> Result<u64, SimError> {
        Ok(self.call_with(program, &Args::ints(args))?.a0)
    }

    /// Call `program` and return the result registers.
    ///
    /// Registers are reset, `a0..a7`/`fa0..fa7` receive the arguments,
    /// `sp` points at the top of the stack, `ra` at [`RETURN_ADDRESS`] and
    /// `PP` at the program's pool.
    pub fn call_with(&mut self, program: &Program, args: &Args) -> Result<Outcome, SimError> {
        if args.ints.len() > ARG_REGISTERS || args.floats.len() > ARG_REGISTERS {
            return Err(Self::load_error(format!(
                "at most {} integer and {} FP register arguments",
                ARG_REGISTERS, ARG_REGISTERS
            )));
        }
        let hart = &mut self.hart;
        hart.reset();
        hart.set_x(Register::Sp.num(), self.memory.end() & !15);
        hart.set_x(Register::Ra.num(), RETURN_ADDRESS);
        hart.set_x(PP.num(), program.pool);
        for (i, &v) in args.ints.iter().enumerate() {
            hart.set_x(Register::A0.num() + i as u32, v);
        }
        for (i, &v) in args.floats.iter().enumerate() {
            hart.set_f(FRegister::Fa0.num() + i as u32, v);
        }
        hart.set_pc(program.entry);

        debug!("call {:#x} with {:?}", program.entry, args);
        let limit = self.config.step_limit;
        let mut steps = 0u64;
        while hart.pc() != RETURN_ADDRESS {
            if steps == limit {
                return Err(SimError::StepLimit { limit });
            }
            hart.step(&mut self.memory)?;
            steps += 1;
        }
        let outcome = Outcome {
            a0: hart.x(Register::A0.num()),
            a1: hart.x(Register::A1.num()),
            fa0: hart.f(FRegister::Fa0.num()),
            fflags: hart.fflags(),
            steps,
        };
        debug!("returned {:#x} after {} steps", outcome.a0, steps);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcasm::riscv::{Assembler, Register::*};

    #[test]
    fn programs_do_not_overlap() {
        let mut sim = Simulator::new(Xlen::Rv64, SimConfig::default());
        let mut first = Assembler::new(Xlen::Rv64);
        first.li(A0, 1).unwrap();
        first.ret().unwrap();
        first.add_immediate_to_pool(11);
        let mut second = Assembler::new(Xlen::Rv64);
        second.li(A0, 2).unwrap();
        second.ret().unwrap();
        let p1 = sim.load(&first.finalize().unwrap()).unwrap();
        let p2 = sim.load(&second.finalize().unwrap()).unwrap();
        assert_eq!(p1.entry(), CODE_BASE);
        assert_eq!(p2.entry(), CODE_BASE + 8);
        assert_eq!(p2.pool(), POOL_BASE + 8);
        assert_eq!(sim.read_u64(p1.pool()).unwrap(), 11);
        assert_eq!(sim.call(&p1, &[]).unwrap(), 1);
        assert_eq!(sim.call(&p2, &[]).unwrap(), 2);
    }

    #[test]
    fn load_rejects_wrong_width_and_tiny_memory() {
        let mut asm = Assembler::new(Xlen::Rv32);
        asm.ret().unwrap();
        let code = asm.finalize().unwrap();
        let mut sim = Simulator::new(Xlen::Rv64, SimConfig::default());
        assert!(matches!(sim.load(&code), Err(SimError::Load { .. })));
        let mut small = Simulator::new(Xlen::Rv32, SimConfig::default().with_memory_size(0x10_0000));
        assert!(matches!(small.load(&code), Err(SimError::Load { .. })));
    }

    #[test]
    fn too_many_arguments() {
        let mut sim = Simulator::new(Xlen::Rv64, SimConfig::default());
        let mut asm = Assembler::new(Xlen::Rv64);
        asm.ret().unwrap();
        let p = sim.load(&asm.finalize().unwrap()).unwrap();
        assert!(sim.call(&p, &[0; 9]).is_err());
    }
}
