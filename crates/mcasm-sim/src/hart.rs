//! Architectural state of one hart and the instruction interpreter.

use log::trace;
use mcasm::riscv::{csr, decode, Decoded, Op, RoundingMode, Xlen};

use crate::error::SimError;
use crate::fp::{self, box_f32, unbox_f32, BinOp, Compare, IntKind};
use crate::memory::Memory;

/// Registers, CSRs and the load reservation of a single hart.
///
/// Integer registers are stored sign-extended to 64 bits on RV32, so
/// signed comparisons work the same for both widths.
#[derive(Debug, Clone)]
pub struct Hart {
    xlen: Xlen,
    x: [u64; 32],
    f: [u64; 32],
    pc: u64,
    fflags: u32,
    frm: u32,
    instret: u64,
    reservation: Option<u64>,
}

fn sext32(v: u64) -> u64 {
    v as i32 as i64 as u64
}

fn zext32(v: u64) -> u64 {
    v & 0xFFFF_FFFF
}

impl Hart {
    pub fn new(xlen: Xlen) -> Self {
        Self {
            xlen,
            x: [0; 32],
            f: [0; 32],
            pc: 0,
            fflags: 0,
            frm: 0,
            instret: 0,
            reservation: None,
        }
    }

    /// Clear every register, CSR and the reservation.
    pub fn reset(&mut self) {
        *self = Self::new(self.xlen);
    }

    pub fn xlen(&self) -> Xlen {
        self.xlen
    }

    fn rv32(&self) -> bool {
        self.xlen == Xlen::Rv32
    }

    pub fn pc(&self) -> u64 {
        self.pc
    }

    pub fn set_pc(&mut self, pc: u64) {
        self.pc = pc;
    }

    /// Integer register `n`.
    pub fn x(&self, n: u32) -> u64 {
        self.x[n as usize & 31]
    }

    /// Write integer register `n`; writes to `x0` are dropped.
    pub fn set_x(&mut self, n: u32, value: u64) {
        let n = n as usize & 31;
        if n != 0 {
            self.x[n] = if self.rv32() { sext32(value) } else { value };
        }
    }

    /// Raw bits of FP register `n`.
    pub fn f(&self, n: u32) -> u64 {
        self.f[n as usize & 31]
    }

    pub fn set_f(&mut self, n: u32, bits: u64) {
        self.f[n as usize & 31] = bits;
    }

    /// Accrued exception flags.
    pub fn fflags(&self) -> u32 {
        self.fflags
    }

    /// Dynamic rounding mode field.
    pub fn frm(&self) -> u32 {
        self.frm
    }

    pub fn set_frm(&mut self, frm: u32) {
        self.frm = frm & 7;
    }

    /// Retired instructions.
    pub fn instret(&self) -> u64 {
        self.instret
    }

    fn fs(&self, n: u32) -> f32 {
        unbox_f32(self.f(n))
    }

    fn fd(&self, n: u32) -> f64 {
        f64::from_bits(self.f(n))
    }

    fn set_fs(&mut self, n: u32, v: f32) {
        self.set_f(n, box_f32(v));
    }

    fn set_fd(&mut self, n: u32, v: f64) {
        self.set_f(n, v.to_bits());
    }

    /// Value as an unsigned XLEN-bit quantity.
    fn u(&self, v: u64) -> u64 {
        if self.rv32() {
            zext32(v)
        } else {
            v
        }
    }

    fn shift_mask(&self) -> u64 {
        if self.rv32() {
            31
        } else {
            63
        }
    }

    fn addr(&self, base: u64, offset: i64) -> u64 {
        self.u(base.wrapping_add(offset as u64))
    }

    fn illegal(pc: u64, d: &Decoded) -> SimError {
        SimError::IllegalInstruction { pc, raw: d.raw }
    }

    /// Static rounding mode of `d`, or `frm` for the dynamic mode.
    fn rounding(&self, pc: u64, d: &Decoded) -> Result<RoundingMode, SimError> {
        match d.instruction.rounding_mode() {
            Some(RoundingMode::Dyn) => match RoundingMode::from_bits(self.frm) {
                Some(RoundingMode::Dyn) | None => Err(Self::illegal(pc, d)),
                Some(rm) => Ok(rm),
            },
            Some(rm) => Ok(rm),
            None => Err(Self::illegal(pc, d)),
        }
    }

    fn read_csr(&self, pc: u64, d: &Decoded, number: u32) -> Result<u64, SimError> {
        Ok(match number {
            csr::FFLAGS => self.fflags as u64,
            csr::FRM => self.frm as u64,
            csr::FCSR => ((self.frm << 5) | self.fflags) as u64,
            csr::CYCLE | csr::TIME | csr::INSTRET => self.instret,
            csr::CYCLEH | csr::TIMEH | csr::INSTRETH if self.rv32() => self.instret >> 32,
            _ => return Err(Self::illegal(pc, d)),
        })
    }

    fn write_csr(&mut self, pc: u64, d: &Decoded, number: u32, value: u64) -> Result<(), SimError> {
        match number {
            csr::FFLAGS => self.fflags = value as u32 & 0x1F,
            csr::FRM => self.frm = value as u32 & 7,
            csr::FCSR => {
                self.fflags = value as u32 & 0x1F;
                self.frm = (value as u32 >> 5) & 7;
            }
            _ => return Err(Self::illegal(pc, d)),
        }
        Ok(())
    }

    fn check_aligned(addr: u64, align: usize) -> Result<(), SimError> {
        if addr % align as u64 != 0 {
            return Err(SimError::MisalignedAccess { addr, align });
        }
        Ok(())
    }

    /// Fetch, decode and execute the instruction at `pc`.
    pub fn step(&mut self, mem: &mut Memory) -> Result<(), SimError> {
        let pc = self.pc;
        Self::check_aligned(pc, 2)?;
        let bytes = mem.fetch(pc)?;
        let Some(d) = decode(bytes, self.xlen) else {
            let half = u16::from_le_bytes([bytes[0], bytes[1]]) as u32;
            let raw = match bytes {
                [b0, b1, b2, b3] if half & 3 == 3 => u32::from_le_bytes([*b0, *b1, *b2, *b3]),
                _ => half,
            };
            return Err(SimError::IllegalInstruction { pc, raw });
        };
        trace!("{:#010x}: {}", pc, d.instruction.op.name());
        self.pc = self.execute(&d, pc, mem)?;
        self.instret += 1;
        Ok(())
    }

    fn execute(&mut self, d: &Decoded, pc: u64, mem: &mut Memory) -> Result<u64, SimError> {
        use Op::*;

        let ins = &d.instruction;
        let next = self.u(pc.wrapping_add(d.len as u64));
        let rv32 = self.rv32();
        let a = self.x(ins.rs1);
        let b = self.x(ins.rs2);
        let imm = ins.imm;
        let immu = imm as u64;
        let mask = self.shift_mask();
        let rd = ins.rd;

        let value = match ins.op {
            Lui => immu,
            Auipc => pc.wrapping_add(immu),
            Jal => {
                self.set_x(rd, next);
                return Ok(self.addr(pc, imm));
            }
            Jalr => {
                let target = self.addr(a, imm) & !1;
                self.set_x(rd, next);
                return Ok(target);
            }
            Beq | Bne | Blt | Bge | Bltu | Bgeu => {
                let taken = match ins.op {
                    Beq => a == b,
                    Bne => a != b,
                    Blt => (a as i64) < (b as i64),
                    Bge => (a as i64) >= (b as i64),
                    Bltu => self.u(a) < self.u(b),
                    _ => self.u(a) >= self.u(b),
                };
                return Ok(if taken { self.addr(pc, imm) } else { next });
            }

            Lb => mem.load(self.addr(a, imm), 1)? as i8 as i64 as u64,
            Lh => mem.load(self.addr(a, imm), 2)? as i16 as i64 as u64,
            Lw => sext32(mem.load(self.addr(a, imm), 4)?),
            Ld => mem.load(self.addr(a, imm), 8)?,
            Lbu => mem.load(self.addr(a, imm), 1)?,
            Lhu => mem.load(self.addr(a, imm), 2)?,
            Lwu => mem.load(self.addr(a, imm), 4)?,
            Sb | Sh | Sw | Sd => {
                let size = match ins.op {
                    Sb => 1,
                    Sh => 2,
                    Sw => 4,
                    _ => 8,
                };
                mem.store(self.addr(a, imm), size, b)?;
                return Ok(next);
            }

            Addi => a.wrapping_add(immu),
            Slti => ((a as i64) < imm) as u64,
            Sltiu => (self.u(a) < self.u(immu)) as u64,
            Xori => a ^ immu,
            Ori => a | immu,
            Andi => a & immu,
            Slli => a << (immu & mask),
            Srli => self.u(a) >> (immu & mask),
            Srai => ((a as i64) >> (immu & mask)) as u64,
            Add => a.wrapping_add(b),
            Sub => a.wrapping_sub(b),
            Sll => a << (b & mask),
            Slt => ((a as i64) < (b as i64)) as u64,
            Sltu => (self.u(a) < self.u(b)) as u64,
            Xor => a ^ b,
            Srl => self.u(a) >> (b & mask),
            Sra => ((a as i64) >> (b & mask)) as u64,
            Or => a | b,
            And => a & b,
            Addiw => sext32(a.wrapping_add(immu)),
            Slliw => sext32(((a as u32) << (immu & 31)) as u64),
            Srliw => sext32(((a as u32) >> (immu & 31)) as u64),
            Sraiw => ((a as i32) >> (immu & 31)) as i64 as u64,
            Addw => sext32(a.wrapping_add(b)),
            Subw => sext32(a.wrapping_sub(b)),
            Sllw => sext32(((a as u32) << (b & 31)) as u64),
            Srlw => sext32(((a as u32) >> (b & 31)) as u64),
            Sraw => ((a as i32) >> (b & 31)) as i64 as u64,
            Fence | FenceI => return Ok(next),
            Ecall => return Err(SimError::EnvironmentCall { pc }),
            Ebreak => return Err(SimError::Breakpoint { pc }),

            Mul => a.wrapping_mul(b),
            Mulh if rv32 => ((a as i32 as i64 * b as i32 as i64) >> 32) as u64,
            Mulh => ((a as i64 as i128 * b as i64 as i128) >> 64) as u64,
            Mulhsu if rv32 => ((a as i32 as i64 * zext32(b) as i64) >> 32) as u64,
            Mulhsu => ((a as i64 as i128 * b as i128) >> 64) as u64,
            Mulhu if rv32 => (zext32(a) * zext32(b)) >> 32,
            Mulhu => ((a as u128 * b as u128) >> 64) as u64,
            Div | Rem if b == 0 => {
                if ins.op == Div {
                    u64::MAX
                } else {
                    a
                }
            }
            Div if rv32 => (a as i32).wrapping_div(b as i32) as i64 as u64,
            Div => (a as i64).wrapping_div(b as i64) as u64,
            Rem if rv32 => (a as i32).wrapping_rem(b as i32) as i64 as u64,
            Rem => (a as i64).wrapping_rem(b as i64) as u64,
            Divu if b == 0 => u64::MAX,
            Divu => self.u(a) / self.u(b),
            Remu if b == 0 => a,
            Remu => self.u(a) % self.u(b),
            Mulw => sext32(a.wrapping_mul(b)),
            Divw | Remw if b as u32 == 0 => {
                if ins.op == Divw {
                    u64::MAX
                } else {
                    sext32(a)
                }
            }
            Divw => (a as i32).wrapping_div(b as i32) as i64 as u64,
            Remw => (a as i32).wrapping_rem(b as i32) as i64 as u64,
            Divuw | Remuw if b as u32 == 0 => {
                if ins.op == Divuw {
                    u64::MAX
                } else {
                    sext32(a)
                }
            }
            Divuw => sext32((a as u32 / b as u32) as u64),
            Remuw => sext32((a as u32 % b as u32) as u64),

            LrW | LrD => {
                let size = if ins.op == LrW { 4 } else { 8 };
                Self::check_aligned(a, size)?;
                let v = mem.load(a, size)?;
                self.reservation = Some(a);
                if size == 4 {
                    sext32(v)
                } else {
                    v
                }
            }
            ScW | ScD => {
                let size = if ins.op == ScW { 4 } else { 8 };
                Self::check_aligned(a, size)?;
                let ok = self.reservation.take() == Some(a);
                if ok {
                    mem.store(a, size, b)?;
                }
                (!ok) as u64
            }
            AmoswapW | AmoaddW | AmoxorW | AmoandW | AmoorW | AmominW | AmomaxW | AmominuW | AmomaxuW => {
                Self::check_aligned(a, 4)?;
                let old = sext32(mem.load(a, 4)?);
                let (o, s) = (old as i32, b as i32);
                let new = match ins.op {
                    AmoswapW => s,
                    AmoaddW => o.wrapping_add(s),
                    AmoxorW => o ^ s,
                    AmoandW => o & s,
                    AmoorW => o | s,
                    AmominW => o.min(s),
                    AmomaxW => o.max(s),
                    AmominuW => (o as u32).min(s as u32) as i32,
                    _ => (o as u32).max(s as u32) as i32,
                };
                mem.store(a, 4, new as u32 as u64)?;
                old
            }
            AmoswapD | AmoaddD | AmoxorD | AmoandD | AmoorD | AmominD | AmomaxD | AmominuD | AmomaxuD => {
                Self::check_aligned(a, 8)?;
                let old = mem.load(a, 8)?;
                let new = match ins.op {
                    AmoswapD => b,
                    AmoaddD => old.wrapping_add(b),
                    AmoxorD => old ^ b,
                    AmoandD => old & b,
                    AmoorD => old | b,
                    AmominD => (old as i64).min(b as i64) as u64,
                    AmomaxD => (old as i64).max(b as i64) as u64,
                    AmominuD => old.min(b),
                    _ => old.max(b),
                };
                mem.store(a, 8, new)?;
                old
            }

            Flw => {
                let v = mem.load(self.addr(a, imm), 4)?;
                self.set_f(rd, 0xFFFF_FFFF_0000_0000 | v);
                return Ok(next);
            }
            Fld => {
                let v = mem.load(self.addr(a, imm), 8)?;
                self.set_f(rd, v);
                return Ok(next);
            }
            Fsw => {
                mem.store(self.addr(a, imm), 4, self.f(ins.rs2))?;
                return Ok(next);
            }
            Fsd => {
                mem.store(self.addr(a, imm), 8, self.f(ins.rs2))?;
                return Ok(next);
            }
            _ => return self.execute_fp(d, pc, next),
        };
        self.set_x(rd, value);
        Ok(next)
    }

    /// FP computation, CSR access and the bit-manipulation extensions.
    fn execute_fp(&mut self, d: &Decoded, pc: u64, next: u64) -> Result<u64, SimError> {
        use Op::*;

        let ins = &d.instruction;
        let (rd, rs1, rs2, rs3) = (ins.rd, ins.rs1, ins.rs2, ins.rs3);
        let binop = |op: Op| match op {
            FaddS | FaddD => BinOp::Add,
            FsubS | FsubD => BinOp::Sub,
            FmulS | FmulD => BinOp::Mul,
            _ => BinOp::Div,
        };
        let fused_signs = |op: Op| match op {
            FmaddS | FmaddD => (false, false),
            FmsubS | FmsubD => (false, true),
            FnmsubS | FnmsubD => (true, false),
            _ => (true, true),
        };
        let kind = |op: Op| match op {
            FcvtWS | FcvtWD | FcvtSW | FcvtDW => IntKind::W,
            FcvtWuS | FcvtWuD | FcvtSWu | FcvtDWu => IntKind::Wu,
            FcvtLS | FcvtLD | FcvtSL | FcvtDL => IntKind::L,
            _ => IntKind::Lu,
        };
        let predicate = |op: Op| match op {
            FeqS | FeqD => Compare::Eq,
            FltS | FltD => Compare::Lt,
            _ => Compare::Le,
        };

        let flags = match ins.op {
            FaddS | FsubS | FmulS | FdivS => {
                let rm = self.rounding(pc, d)?;
                let (r, fl) = fp::binary(binop(ins.op), self.fs(rs1), self.fs(rs2), rm);
                self.set_fs(rd, r);
                fl
            }
            FaddD | FsubD | FmulD | FdivD => {
                let rm = self.rounding(pc, d)?;
                let (r, fl) = fp::binary(binop(ins.op), self.fd(rs1), self.fd(rs2), rm);
                self.set_fd(rd, r);
                fl
            }
            FmaddS | FmsubS | FnmsubS | FnmaddS => {
                let rm = self.rounding(pc, d)?;
                let (np, na) = fused_signs(ins.op);
                let (r, fl) = fp::fused(self.fs(rs1), self.fs(rs2), self.fs(rs3), np, na, rm);
                self.set_fs(rd, r);
                fl
            }
            FmaddD | FmsubD | FnmsubD | FnmaddD => {
                let rm = self.rounding(pc, d)?;
                let (np, na) = fused_signs(ins.op);
                let (r, fl) = fp::fused(self.fd(rs1), self.fd(rs2), self.fd(rs3), np, na, rm);
                self.set_fd(rd, r);
                fl
            }
            FsqrtS => {
                let rm = self.rounding(pc, d)?;
                let (r, fl) = fp::sqrt(self.fs(rs1), rm);
                self.set_fs(rd, r);
                fl
            }
            FsqrtD => {
                let rm = self.rounding(pc, d)?;
                let (r, fl) = fp::sqrt(self.fd(rs1), rm);
                self.set_fd(rd, r);
                fl
            }
            FsgnjS | FsgnjnS | FsgnjxS => {
                let (x, y) = (self.fs(rs1).to_bits(), self.fs(rs2).to_bits());
                let sign = match ins.op {
                    FsgnjS => y,
                    FsgnjnS => !y,
                    _ => x ^ y,
                } & 0x8000_0000;
                self.set_fs(rd, f32::from_bits((x & 0x7FFF_FFFF) | sign));
                0
            }
            FsgnjD | FsgnjnD | FsgnjxD => {
                let (x, y) = (self.f(rs1), self.f(rs2));
                let sign = match ins.op {
                    FsgnjD => y,
                    FsgnjnD => !y,
                    _ => x ^ y,
                } & (1 << 63);
                self.set_f(rd, (x & !(1 << 63)) | sign);
                0
            }
            FminS | FmaxS => {
                let (r, fl) = fp::min_max(self.fs(rs1), self.fs(rs2), ins.op == FmaxS);
                self.set_fs(rd, r);
                fl
            }
            FminD | FmaxD => {
                let (r, fl) = fp::min_max(self.fd(rs1), self.fd(rs2), ins.op == FmaxD);
                self.set_fd(rd, r);
                fl
            }
            FcvtSD => {
                let rm = self.rounding(pc, d)?;
                let (r, fl) = fp::narrow(self.fd(rs1), rm);
                self.set_fs(rd, r);
                fl
            }
            FcvtDS => {
                let (r, fl) = fp::widen(self.fs(rs1));
                self.set_fd(rd, r);
                fl
            }
            FeqS | FltS | FleS => {
                let (r, fl) = fp::compare(predicate(ins.op), self.fs(rs1), self.fs(rs2));
                self.set_x(rd, r as u64);
                fl
            }
            FeqD | FltD | FleD => {
                let (r, fl) = fp::compare(predicate(ins.op), self.fd(rs1), self.fd(rs2));
                self.set_x(rd, r as u64);
                fl
            }
            FcvtWS | FcvtWuS | FcvtLS | FcvtLuS => {
                let rm = self.rounding(pc, d)?;
                let (r, fl) = fp::to_int(self.fs(rs1), kind(ins.op), rm);
                self.set_x(rd, r);
                fl
            }
            FcvtWD | FcvtWuD | FcvtLD | FcvtLuD => {
                let rm = self.rounding(pc, d)?;
                let (r, fl) = fp::to_int(self.fd(rs1), kind(ins.op), rm);
                self.set_x(rd, r);
                fl
            }
            FcvtSW | FcvtSWu | FcvtSL | FcvtSLu => {
                let rm = self.rounding(pc, d)?;
                let (r, fl) = fp::from_int::<f32>(self.x(rs1), kind(ins.op), rm);
                self.set_fs(rd, r);
                fl
            }
            FcvtDW | FcvtDWu | FcvtDL | FcvtDLu => {
                let rm = self.rounding(pc, d)?;
                let (r, fl) = fp::from_int::<f64>(self.x(rs1), kind(ins.op), rm);
                self.set_fd(rd, r);
                fl
            }
            FmvXW => {
                self.set_x(rd, sext32(self.f(rs1)));
                0
            }
            FmvWX => {
                self.set_f(rd, 0xFFFF_FFFF_0000_0000 | zext32(self.x(rs1)));
                0
            }
            FmvXD => {
                self.set_x(rd, self.f(rs1));
                0
            }
            FmvDX => {
                self.set_f(rd, self.x(rs1));
                0
            }
            FclassS => {
                self.set_x(rd, fp::classify(self.fs(rs1)));
                0
            }
            FclassD => {
                self.set_x(rd, fp::classify(self.fd(rs1)));
                0
            }
            Csrrw | Csrrs | Csrrc | Csrrwi | Csrrsi | Csrrci => {
                self.execute_csr(d, pc)?;
                0
            }
            _ => {
                let value = self.execute_bitmanip(d);
                self.set_x(rd, value);
                0
            }
        };
        self.fflags |= flags;
        Ok(next)
    }

    fn execute_csr(&mut self, d: &Decoded, pc: u64) -> Result<(), SimError> {
        use Op::*;

        let ins = &d.instruction;
        let number = ins.imm as u32;
        let src = match ins.op {
            Csrrw | Csrrs | Csrrc => self.x(ins.rs1),
            _ => ins.rs1 as u64,
        };
        let writes = matches!(ins.op, Csrrw | Csrrwi) || ins.rs1 != 0;
        // csrrw with rd = x0 does not read.
        let old = if matches!(ins.op, Csrrw | Csrrwi) && ins.rd == 0 {
            0
        } else {
            self.read_csr(pc, d, number)?
        };
        if writes {
            let new = match ins.op {
                Csrrw | Csrrwi => src,
                Csrrs | Csrrsi => old | src,
                _ => old & !src,
            };
            self.write_csr(pc, d, number, new)?;
        }
        self.set_x(ins.rd, old);
        Ok(())
    }

    fn execute_bitmanip(&self, d: &Decoded) -> u64 {
        use Op::*;

        let ins = &d.instruction;
        let rv32 = self.rv32();
        let a = self.x(ins.rs1);
        let b = self.x(ins.rs2);
        let mask = self.shift_mask();
        let imm = ins.imm as u64;
        let rotate = |v: u64, by: u64, left: bool| -> u64 {
            if rv32 {
                let v = v as u32;
                let by = (by & 31) as u32;
                let r = if left { v.rotate_left(by) } else { v.rotate_right(by) };
                sext32(r as u64)
            } else {
                let by = (by & 63) as u32;
                if left {
                    v.rotate_left(by)
                } else {
                    v.rotate_right(by)
                }
            }
        };
        let rotate_w = |v: u64, by: u64, left: bool| -> u64 {
            let v = v as u32;
            let by = (by & 31) as u32;
            let r = if left { v.rotate_left(by) } else { v.rotate_right(by) };
            sext32(r as u64)
        };

        match ins.op {
            AddUw => b.wrapping_add(zext32(a)),
            Sh1add => (a << 1).wrapping_add(b),
            Sh2add => (a << 2).wrapping_add(b),
            Sh3add => (a << 3).wrapping_add(b),
            Sh1addUw => (zext32(a) << 1).wrapping_add(b),
            Sh2addUw => (zext32(a) << 2).wrapping_add(b),
            Sh3addUw => (zext32(a) << 3).wrapping_add(b),
            SlliUw => zext32(a) << (imm & 63),

            Andn => a & !b,
            Orn => a | !b,
            Xnor => !(a ^ b),
            Clz if rv32 => (a as u32).leading_zeros() as u64,
            Clz => a.leading_zeros() as u64,
            Ctz if rv32 => (a as u32).trailing_zeros() as u64,
            Ctz => a.trailing_zeros() as u64,
            Cpop => self.u(a).count_ones() as u64,
            Clzw => (a as u32).leading_zeros() as u64,
            Ctzw => (a as u32).trailing_zeros() as u64,
            Cpopw => (a as u32).count_ones() as u64,
            Max => (a as i64).max(b as i64) as u64,
            Min => (a as i64).min(b as i64) as u64,
            Maxu => self.u(a).max(self.u(b)),
            Minu => self.u(a).min(self.u(b)),
            SextB => a as i8 as i64 as u64,
            SextH => a as i16 as i64 as u64,
            ZextH => a as u16 as u64,
            Rol => rotate(a, b, true),
            Ror => rotate(a, b, false),
            Rori => rotate(a, imm, false),
            Rolw => rotate_w(a, b, true),
            Rorw => rotate_w(a, b, false),
            Roriw => rotate_w(a, imm, false),
            OrcB => {
                let bytes = self.u(a).to_le_bytes().map(|byte| if byte == 0 { 0 } else { 0xFF });
                u64::from_le_bytes(bytes)
            }
            Rev8 if rv32 => (a as u32).swap_bytes() as u64,
            Rev8 => a.swap_bytes(),

            Bclr => a & !(1 << (b & mask)),
            Bclri => a & !(1 << (imm & mask)),
            Bext => (self.u(a) >> (b & mask)) & 1,
            Bexti => (self.u(a) >> (imm & mask)) & 1,
            Binv => a ^ (1 << (b & mask)),
            Binvi => a ^ (1 << (imm & mask)),
            Bset => a | (1 << (b & mask)),
            Bseti => a | (1 << (imm & mask)),
            // Every other op is dispatched before reaching here.
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcasm::riscv::{Assembler, AssemblerOptions, ExtensionSet, Register::*};

    const BASE: u64 = 0x1000;

    fn run(xlen: Xlen, build: impl FnOnce(&mut Assembler)) -> Hart {
        let mut asm = Assembler::with_options(AssemblerOptions::new(xlen).with_extensions(ExtensionSet::RV_GCB));
        build(&mut asm);
        let code = asm.finalize().unwrap();
        let mut mem = Memory::new(0x4000);
        mem.write_bytes(BASE, code.bytes()).unwrap();
        let mut hart = Hart::new(xlen);
        hart.set_x(2, 0x4000);
        hart.set_pc(BASE);
        while hart.pc() < BASE + code.size() as u64 {
            hart.step(&mut mem).unwrap();
        }
        hart
    }

    #[test]
    fn rv32_registers_are_sign_extended() {
        let hart = run(Xlen::Rv32, |asm| {
            asm.li(A0, 0x8000_0000u32 as i64).unwrap();
            asm.srli(A1, A0, 4).unwrap();
            asm.srai(A2, A0, 4).unwrap();
        });
        assert_eq!(hart.x(10), 0xFFFF_FFFF_8000_0000);
        assert_eq!(hart.x(11), 0x0800_0000);
        assert_eq!(hart.x(12), 0xFFFF_FFFF_F800_0000);
    }

    #[test]
    fn multiply_high() {
        let hart = run(Xlen::Rv64, |asm| {
            asm.li(A0, -1).unwrap();
            asm.li(A1, 2).unwrap();
            asm.mulh(A2, A0, A1).unwrap();
            asm.mulhu(A3, A0, A1).unwrap();
            asm.mulhsu(A4, A0, A1).unwrap();
        });
        assert_eq!(hart.x(12), u64::MAX);
        assert_eq!(hart.x(13), 1);
        assert_eq!(hart.x(14), u64::MAX);
    }

    #[test]
    fn counters_and_fcsr() {
        let hart = run(Xlen::Rv64, |asm| {
            asm.nop().unwrap();
            asm.csrrwi(Zero, csr::FRM, 1).unwrap();
            asm.csrr(A0, csr::INSTRET).unwrap();
            asm.csrr(A1, csr::FCSR).unwrap();
        });
        assert_eq!(hart.x(10), 2);
        assert_eq!(hart.x(11), 1 << 5);
        assert_eq!(hart.frm(), 1);
        assert_eq!(hart.instret(), 4);
    }

    #[test]
    fn bit_manipulation() {
        let hart = run(Xlen::Rv64, |asm| {
            asm.li(A0, 0x0000_00F0).unwrap();
            asm.clz(A1, A0).unwrap();
            asm.ctz(A2, A0).unwrap();
            asm.cpop(A3, A0).unwrap();
            asm.orc_b(A4, A0).unwrap();
            asm.rori(A5, A0, 4).unwrap();
            asm.bexti(A6, A0, 4).unwrap();
            asm.sh3add(A7, A0, A0).unwrap();
        });
        assert_eq!(hart.x(11), 56);
        assert_eq!(hart.x(12), 4);
        assert_eq!(hart.x(13), 4);
        assert_eq!(hart.x(14), 0xFF);
        assert_eq!(hart.x(15), 0x0F);
        assert_eq!(hart.x(16), 1);
        assert_eq!(hart.x(17), 0xF0 * 9);
    }

    #[test]
    fn illegal_word_reports_raw_bits() {
        let mut mem = Memory::new(0x2000);
        mem.store(BASE, 4, 0xFFFF_FFFF).unwrap();
        let mut hart = Hart::new(Xlen::Rv64);
        hart.set_pc(BASE);
        assert_eq!(
            hart.step(&mut mem),
            Err(SimError::IllegalInstruction { pc: BASE, raw: 0xFFFF_FFFF })
        );
        hart.set_pc(BASE + 1);
        assert_eq!(
            hart.step(&mut mem),
            Err(SimError::MisalignedAccess { addr: BASE + 1, align: 2 })
        );
    }
}
