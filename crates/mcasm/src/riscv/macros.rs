//! Pseudo-instructions and multi-instruction macros built on the
//! primitive encoders.
//!
//! Macros that need scratch space clobber [`TMP`], or [`TMP2`] when
//! [`TMP`] is one of their operands.

use alloc::vec::Vec;

use crate::error::AsmError;
use crate::label::Label;
use crate::operand::{fits_signed, fits_unsigned, AddressMode};
use crate::pool::{ObjectPool, ObjectRef, PoolEntry};

use super::branch::JumpDistance;
use super::format::*;
use super::isa::{Condition, ExtensionSet, RoundingMode, Xlen};
use super::registers::{Address, FRegister, Register, FP, PP, TMP, TMP2};
use super::Assembler;

/// Width and signedness of an integer memory access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OperandSize {
    Byte,
    UnsignedByte,
    Half,
    UnsignedHalf,
    Word,
    UnsignedWord,
    Double,
}

impl OperandSize {
    /// The register-sized access for `xlen`.
    pub const fn native(xlen: Xlen) -> Self {
        match xlen {
            Xlen::Rv32 => OperandSize::Word,
            Xlen::Rv64 => OperandSize::Double,
        }
    }
}

// ── load_immediate expansion ────────────────────────────────────────────

/// Sign-extend the low 12 bits of `value`.
#[inline]
fn low12(value: i64) -> i32 {
    ((value as i32) << 20) >> 20
}

/// `lui`/`addi(w)` words for a value that fits 32 signed bits.
fn li_words_32(rd: u32, value: i32, rv64: bool, out: &mut Vec<u32>) {
    if fits_signed(value as i64, 12) {
        out.push(i_type(OP_IMM, rd, 0, 0, value));
        return;
    }
    let lo12 = low12(value as i64);
    let hi20 = value.wrapping_sub(lo12) as u32;
    out.push(u_type(OP_LUI, rd, hi20));
    if lo12 != 0 {
        // On RV64 `addiw` keeps the 32-bit wrap of `lui` + `lo12` sign-extended.
        let opcode = if rv64 { OP_IMM_W } else { OP_IMM };
        out.push(i_type(opcode, rd, 0, rd, lo12));
    }
}

/// The RV64 `li` expansion: peel off a signed 12-bit chunk, shift the
/// remainder down by its trailing zeros and recurse until it fits 32 bits.
/// At most eight words.
fn li_words_rv64(rd: u32, value: i64, out: &mut Vec<u32>) {
    if fits_signed(value, 32) {
        li_words_32(rd, value as i32, true, out);
        return;
    }
    let lo12 = low12(value);
    let remaining = value.wrapping_sub(lo12 as i64);
    let shamt = (remaining as u64).trailing_zeros().clamp(12, 63);
    li_words_rv64(rd, remaining >> shamt, out);
    out.push(i_type(OP_IMM, rd, 1, rd, shamt as i32));
    if lo12 != 0 {
        out.push(i_type(OP_IMM, rd, 0, rd, lo12));
    }
}

/// Words `load_immediate` emits inline for `value`, or `None` when the
/// value does not fit the register width.
pub(crate) fn li_words(xlen: Xlen, rd: Register, value: i64) -> Option<Vec<u32>> {
    let mut out = Vec::new();
    match xlen {
        Xlen::Rv64 => li_words_rv64(rd.num(), value, &mut out),
        Xlen::Rv32 => {
            if !fits_signed(value, 32) && !fits_unsigned(value, 32) {
                return None;
            }
            li_words_32(rd.num(), value as i32, false, &mut out);
        }
    }
    Some(out)
}

fn scratch_avoiding(reg: Register) -> Register {
    if reg == TMP {
        TMP2
    } else {
        TMP
    }
}

/// Reject `reg` when a wide displacement on `addr` needs the same scratch
/// register and would clobber it.
fn check_scratch(mnemonic: &'static str, reg: Register, addr: Address) -> Result<(), AsmError> {
    if reg == scratch_avoiding(addr.base_register()) && !fits_signed(addr.offset() as i64, 12) {
        return Err(AsmError::invalid(mnemonic, "data register is the scratch register"));
    }
    Ok(())
}

type ImmOp = fn(&mut Assembler, Register, Register, i64) -> Result<(), AsmError>;
type RegOp = fn(&mut Assembler, Register, Register, Register) -> Result<(), AsmError>;

impl Assembler {
    // ── moves and immediates ────────────────────────────────

    /// `addi zero, zero, 0`; `c.nop` when compressed.
    pub fn nop(&mut self) -> Result<(), AsmError> {
        self.emit32(NOP);
        Ok(())
    }

    /// Load `value` into `rd` with the shortest sequence.
    ///
    /// The sequence is deterministic: `addi` for 12-bit values, `lui` plus
    /// `addiw` (RV64) or `addi` (RV32) for 32-bit values, and on RV64 the
    /// recursive `lui`/`addi`/`slli` construction for wider values. When
    /// the constant pool is allowed and the inline sequence would take
    /// more than two instructions, one pool load is emitted instead.
    ///
    /// # Errors
    ///
    /// [`AsmError::ImmediateOverflow`] when `value` does not fit 32 bits
    /// on RV32 (signed or unsigned).
    pub fn load_immediate(&mut self, rd: Register, value: i64) -> Result<(), AsmError> {
        let words = li_words(self.xlen(), rd, value).ok_or(AsmError::ImmediateOverflow {
            mnemonic: "li",
            value,
            min: i32::MIN as i64,
            max: u32::MAX as i64,
        })?;
        if words.len() > 2 && self.constant_pool_allowed() {
            return self.load_immediate_from_pool(rd, value as u64);
        }
        for word in words {
            self.emit32(word);
        }
        Ok(())
    }

    /// Alias of [`Assembler::load_immediate`].
    pub fn li(&mut self, rd: Register, value: i64) -> Result<(), AsmError> {
        self.load_immediate(rd, value)
    }

    /// `rd = rs`: `c.mv` when compressed, `addi rd, rs, 0` otherwise.
    pub fn mv(&mut self, rd: Register, rs: Register) -> Result<(), AsmError> {
        if self.compressed() && rd != Register::Zero && rs != Register::Zero {
            return self.c_mv(rd, rs);
        }
        self.addi(rd, rs, 0)
    }

    /// `rd = !rs`.
    pub fn not(&mut self, rd: Register, rs: Register) -> Result<(), AsmError> {
        self.xori(rd, rs, -1)
    }

    /// `rd = -rs`.
    pub fn neg(&mut self, rd: Register, rs: Register) -> Result<(), AsmError> {
        self.sub(rd, Register::Zero, rs)
    }

    /// 32-bit negate, sign-extended.
    pub fn negw(&mut self, rd: Register, rs: Register) -> Result<(), AsmError> {
        self.subw(rd, Register::Zero, rs)
    }

    /// Sign-extend the low word.
    pub fn sext_w(&mut self, rd: Register, rs: Register) -> Result<(), AsmError> {
        self.addiw(rd, rs, 0)
    }

    /// Zero-extend the low byte.
    pub fn zext_b(&mut self, rd: Register, rs: Register) -> Result<(), AsmError> {
        self.andi(rd, rs, 0xFF)
    }

    /// Zero-extend the low word: `add.uw` with Zba, a shift pair otherwise.
    pub fn zext_w(&mut self, rd: Register, rs: Register) -> Result<(), AsmError> {
        self.require_rv64("zext.w")?;
        if self.extensions().contains(ExtensionSet::ZBA) {
            return self.add_uw(rd, rs, Register::Zero);
        }
        self.slli(rd, rs, 32)?;
        self.srli(rd, rd, 32)
    }

    /// `rd = (rs == 0)`.
    pub fn seqz(&mut self, rd: Register, rs: Register) -> Result<(), AsmError> {
        self.sltiu(rd, rs, 1)
    }

    /// `rd = (rs != 0)`.
    pub fn snez(&mut self, rd: Register, rs: Register) -> Result<(), AsmError> {
        self.sltu(rd, Register::Zero, rs)
    }

    /// `rd = (rs < 0)`.
    pub fn sltz(&mut self, rd: Register, rs: Register) -> Result<(), AsmError> {
        self.slt(rd, rs, Register::Zero)
    }

    /// `rd = (rs > 0)`.
    pub fn sgtz(&mut self, rd: Register, rs: Register) -> Result<(), AsmError> {
        self.slt(rd, Register::Zero, rs)
    }

    fn with_immediate(
        &mut self,
        rd: Register,
        rs: Register,
        imm: i64,
        imm_op: ImmOp,
        reg_op: RegOp,
    ) -> Result<(), AsmError> {
        if fits_signed(imm, 12) {
            return imm_op(self, rd, rs, imm);
        }
        let scratch = scratch_avoiding(rs);
        self.load_immediate(scratch, imm)?;
        reg_op(self, rd, rs, scratch)
    }

    /// `rd = rs + imm` for any `imm`.
    pub fn add_immediate(&mut self, rd: Register, rs: Register, imm: i64) -> Result<(), AsmError> {
        self.with_immediate(rd, rs, imm, Self::addi, Self::add)
    }

    /// `rd = rs & imm` for any `imm`.
    pub fn and_immediate(&mut self, rd: Register, rs: Register, imm: i64) -> Result<(), AsmError> {
        self.with_immediate(rd, rs, imm, Self::andi, Self::and)
    }

    /// `rd = rs | imm` for any `imm`.
    pub fn or_immediate(&mut self, rd: Register, rs: Register, imm: i64) -> Result<(), AsmError> {
        self.with_immediate(rd, rs, imm, Self::ori, Self::or)
    }

    /// `rd = rs ^ imm` for any `imm`.
    pub fn xor_immediate(&mut self, rd: Register, rs: Register, imm: i64) -> Result<(), AsmError> {
        self.with_immediate(rd, rs, imm, Self::xori, Self::xor)
    }

    // ── jumps ───────────────────────────────────────────────

    /// `jal ra, label`.
    pub fn jal_to(&mut self, label: Label, distance: JumpDistance) -> Result<(), AsmError> {
        self.jal(Register::Ra, label, distance)
    }

    /// `auipc ra` + `jalr ra`: call `label` anywhere within ±2 GiB.
    pub fn call(&mut self, label: Label) -> Result<(), AsmError> {
        self.pc_relative_pair(OP_JALR, 0, Register::Ra, Register::Ra, label)
    }

    /// `auipc tmp` + `jalr zero`: tail-call `label`.
    pub fn tail(&mut self, label: Label) -> Result<(), AsmError> {
        self.pc_relative_pair(OP_JALR, 0, Register::Zero, TMP, label)
    }

    /// Return through `ra`.
    pub fn ret(&mut self) -> Result<(), AsmError> {
        self.jalr(Register::Zero, Register::Ra, 0)
    }

    /// Jump to the address in `rs`.
    pub fn jr(&mut self, rs: Register) -> Result<(), AsmError> {
        self.jalr(Register::Zero, rs, 0)
    }

    /// Call the address in `rs`, linking through `ra`.
    pub fn jalr_reg(&mut self, rs: Register) -> Result<(), AsmError> {
        self.jalr(Register::Ra, rs, 0)
    }

    // ── branch aliases ──────────────────────────────────────

    pub fn beqz(&mut self, rs: Register, label: Label, distance: JumpDistance) -> Result<(), AsmError> {
        self.branch(Condition::Eq, rs, Register::Zero, label, distance)
    }

    pub fn bnez(&mut self, rs: Register, label: Label, distance: JumpDistance) -> Result<(), AsmError> {
        self.branch(Condition::Ne, rs, Register::Zero, label, distance)
    }

    pub fn blez(&mut self, rs: Register, label: Label, distance: JumpDistance) -> Result<(), AsmError> {
        self.branch(Condition::Ge, Register::Zero, rs, label, distance)
    }

    pub fn bgez(&mut self, rs: Register, label: Label, distance: JumpDistance) -> Result<(), AsmError> {
        self.branch(Condition::Ge, rs, Register::Zero, label, distance)
    }

    pub fn bltz(&mut self, rs: Register, label: Label, distance: JumpDistance) -> Result<(), AsmError> {
        self.branch(Condition::Lt, rs, Register::Zero, label, distance)
    }

    pub fn bgtz(&mut self, rs: Register, label: Label, distance: JumpDistance) -> Result<(), AsmError> {
        self.branch(Condition::Lt, Register::Zero, rs, label, distance)
    }

    pub fn bgt(&mut self, rs1: Register, rs2: Register, label: Label, distance: JumpDistance) -> Result<(), AsmError> {
        self.branch(Condition::Gt, rs1, rs2, label, distance)
    }

    pub fn ble(&mut self, rs1: Register, rs2: Register, label: Label, distance: JumpDistance) -> Result<(), AsmError> {
        self.branch(Condition::Le, rs1, rs2, label, distance)
    }

    pub fn bgtu(&mut self, rs1: Register, rs2: Register, label: Label, distance: JumpDistance) -> Result<(), AsmError> {
        self.branch(Condition::Gtu, rs1, rs2, label, distance)
    }

    pub fn bleu(&mut self, rs1: Register, rs2: Register, label: Label, distance: JumpDistance) -> Result<(), AsmError> {
        self.branch(Condition::Leu, rs1, rs2, label, distance)
    }

    /// Branch to `label` when `rs1 <cond> rs2`.
    pub fn compare_and_branch(
        &mut self,
        cond: Condition,
        rs1: Register,
        rs2: Register,
        label: Label,
        distance: JumpDistance,
    ) -> Result<(), AsmError> {
        self.branch(cond, rs1, rs2, label, distance)
    }

    /// Branch to `label` when `rs1 <cond> imm`. Zero compares against
    /// `zero`; any other value is materialized in a scratch register.
    pub fn compare_immediate_and_branch(
        &mut self,
        cond: Condition,
        rs1: Register,
        imm: i64,
        label: Label,
        distance: JumpDistance,
    ) -> Result<(), AsmError> {
        if imm == 0 {
            return self.branch(cond, rs1, Register::Zero, label, distance);
        }
        let scratch = scratch_avoiding(rs1);
        self.load_immediate(scratch, imm)?;
        self.branch(cond, rs1, scratch, label, distance)
    }

    // ── memory ──────────────────────────────────────────────

    /// An `Offset` address whose displacement fits 12 bits, materializing
    /// the upper part of a wider displacement in a scratch register.
    fn reachable(&mut self, mnemonic: &'static str, addr: Address) -> Result<Address, AsmError> {
        let offset = addr.offset() as i64;
        if fits_signed(offset, 12) {
            return Ok(addr);
        }
        let lo12 = low12(offset);
        let hi = offset - lo12 as i64;
        if !fits_signed(hi, 32) {
            return Err(AsmError::ImmediateOverflow {
                mnemonic,
                value: offset,
                min: i32::MIN as i64,
                max: 0x7FFF_F7FF,
            });
        }
        let base = addr.base_register();
        let scratch = scratch_avoiding(base);
        self.lui(scratch, hi)?;
        self.add(scratch, scratch, base)?;
        Ok(Address::new(scratch, lo12))
    }

    fn load_sized(&mut self, rd: Register, addr: Address, size: OperandSize) -> Result<(), AsmError> {
        match size {
            OperandSize::Byte => self.lb(rd, addr),
            OperandSize::UnsignedByte => self.lbu(rd, addr),
            OperandSize::Half => self.lh(rd, addr),
            OperandSize::UnsignedHalf => self.lhu(rd, addr),
            OperandSize::Word => self.lw(rd, addr),
            OperandSize::UnsignedWord => self.lwu(rd, addr),
            OperandSize::Double => self.ld(rd, addr),
        }
    }

    fn store_sized(&mut self, rs: Register, addr: Address, size: OperandSize) -> Result<(), AsmError> {
        match size {
            OperandSize::Byte | OperandSize::UnsignedByte => self.sb(rs, addr),
            OperandSize::Half | OperandSize::UnsignedHalf => self.sh(rs, addr),
            OperandSize::Word | OperandSize::UnsignedWord => self.sw(rs, addr),
            OperandSize::Double => self.sd(rs, addr),
        }
    }

    /// Load from any [`Address`]: displacements beyond 12 bits go through
    /// a scratch register, and the write-back modes update the base
    /// before (`PreIndex`) or after (`PostIndex`) the access.
    ///
    /// A data register that the wide-displacement path would use as scratch
    /// is rejected with [`AsmError::InvalidOperands`].
    pub fn load_from_address(&mut self, rd: Register, addr: Address, size: OperandSize) -> Result<(), AsmError> {
        let base = addr.base_register();
        match addr.mode() {
            AddressMode::Offset => {
                let addr = self.reachable("load", addr)?;
                self.load_sized(rd, addr, size)
            }
            AddressMode::PreIndex => {
                if rd == base {
                    return Err(AsmError::invalid("load", "write-back base equals destination"));
                }
                self.add_immediate(base, base, addr.offset() as i64)?;
                self.load_sized(rd, Address::base(base), size)
            }
            AddressMode::PostIndex => {
                if rd == base {
                    return Err(AsmError::invalid("load", "write-back base equals destination"));
                }
                check_scratch("load", rd, addr)?;
                self.load_sized(rd, Address::base(base), size)?;
                self.add_immediate(base, base, addr.offset() as i64)
            }
        }
    }

    /// Store to any [`Address`]; see [`Assembler::load_from_address`].
    pub fn store_to_address(&mut self, rs: Register, addr: Address, size: OperandSize) -> Result<(), AsmError> {
        let base = addr.base_register();
        match addr.mode() {
            AddressMode::Offset => {
                check_scratch("store", rs, addr)?;
                let addr = self.reachable("store", addr)?;
                self.store_sized(rs, addr, size)
            }
            AddressMode::PreIndex => {
                check_scratch("store", rs, addr)?;
                self.add_immediate(base, base, addr.offset() as i64)?;
                self.store_sized(rs, Address::base(base), size)
            }
            AddressMode::PostIndex => {
                check_scratch("store", rs, addr)?;
                self.store_sized(rs, Address::base(base), size)?;
                self.add_immediate(base, base, addr.offset() as i64)
            }
        }
    }

    fn word_bytes(&self) -> i64 {
        self.xlen().bytes() as i64
    }

    fn native(&self) -> OperandSize {
        OperandSize::native(self.xlen())
    }

    // ── stack and frames ────────────────────────────────────

    /// Push one register-sized value.
    pub fn push(&mut self, rs: Register) -> Result<(), AsmError> {
        let w = self.word_bytes();
        let size = self.native();
        self.addi(Register::Sp, Register::Sp, -w)?;
        self.store_sized(rs, Address::base(Register::Sp), size)
    }

    /// Pop one register-sized value.
    pub fn pop(&mut self, rd: Register) -> Result<(), AsmError> {
        let w = self.word_bytes();
        let size = self.native();
        self.load_sized(rd, Address::base(Register::Sp), size)?;
        self.addi(Register::Sp, Register::Sp, w)
    }

    /// Push `regs` with one stack adjustment. The first register ends up
    /// at the highest address, as if pushed first.
    pub fn push_list(&mut self, regs: &[Register]) -> Result<(), AsmError> {
        if regs.is_empty() {
            return Ok(());
        }
        let w = self.word_bytes();
        let n = regs.len() as i64;
        let size = self.native();
        self.add_immediate(Register::Sp, Register::Sp, -n * w)?;
        for (i, &reg) in regs.iter().enumerate() {
            let offset = (n - 1 - i as i64) * w;
            self.store_to_address(reg, Address::new(Register::Sp, offset as i32), size)?;
        }
        Ok(())
    }

    /// Restore registers saved by [`Assembler::push_list`] with the same
    /// list.
    pub fn pop_list(&mut self, regs: &[Register]) -> Result<(), AsmError> {
        if regs.is_empty() {
            return Ok(());
        }
        let w = self.word_bytes();
        let n = regs.len() as i64;
        let size = self.native();
        for (i, &reg) in regs.iter().enumerate().rev() {
            let offset = (n - 1 - i as i64) * w;
            self.load_from_address(reg, Address::new(Register::Sp, offset as i32), size)?;
        }
        self.add_immediate(Register::Sp, Register::Sp, n * w)
    }

    /// Save `ra` and `fp`, point `fp` at the caller's `sp` and reserve
    /// `frame_size` bytes below the saved pair. Frames are limited to
    /// `i32::MAX` bytes.
    pub fn enter_frame(&mut self, frame_size: usize) -> Result<(), AsmError> {
        let frame = i32::try_from(frame_size).map_err(|_| AsmError::ImmediateOverflow {
            mnemonic: "enter_frame",
            value: i64::try_from(frame_size).unwrap_or(i64::MAX),
            min: 0,
            max: i32::MAX as i64,
        })?;
        let w = self.word_bytes();
        let size = self.native();
        self.addi(Register::Sp, Register::Sp, -2 * w)?;
        self.store_sized(Register::Ra, Address::new(Register::Sp, w as i32), size)?;
        self.store_sized(FP, Address::base(Register::Sp), size)?;
        self.addi(FP, Register::Sp, 2 * w)?;
        if frame > 0 {
            self.add_immediate(Register::Sp, Register::Sp, -i64::from(frame))?;
        }
        Ok(())
    }

    /// Undo [`Assembler::enter_frame`].
    pub fn leave_frame(&mut self) -> Result<(), AsmError> {
        let w = self.word_bytes();
        let size = self.native();
        self.addi(Register::Sp, FP, -2 * w)?;
        self.load_sized(FP, Address::base(Register::Sp), size)?;
        self.load_sized(Register::Ra, Address::new(Register::Sp, w as i32), size)?;
        self.addi(Register::Sp, Register::Sp, 2 * w)
    }

    // ── addresses and the object pool ───────────────────────

    /// `auipc rd` + `addi rd`: the absolute address of `label`.
    pub fn load_label_address(&mut self, rd: Register, label: Label) -> Result<(), AsmError> {
        self.pc_relative_pair(OP_IMM, 0, rd, rd, label)
    }

    fn pool_address(&mut self, index: usize) -> Result<Address, AsmError> {
        let offset = ObjectPool::offset_of(index, self.xlen().bytes());
        let offset = i32::try_from(offset).map_err(|_| AsmError::ImmediateOverflow {
            mnemonic: "pool",
            value: offset as i64,
            min: 0,
            max: i32::MAX as i64,
        })?;
        self.reachable("pool", Address::new(PP, offset))
    }

    /// Load pool slot `index` through [`PP`].
    pub fn load_from_pool(&mut self, rd: Register, index: usize) -> Result<(), AsmError> {
        let addr = self.pool_address(index)?;
        let size = self.native();
        self.load_sized(rd, addr, size)
    }

    /// Load an object reference, registering it in the pool.
    pub fn load_object(&mut self, rd: Register, object: ObjectRef) -> Result<(), AsmError> {
        let index = self.add_object_to_pool(object);
        self.load_from_pool(rd, index)
    }

    /// Load `value` from the pool, registering it if needed.
    pub fn load_immediate_from_pool(&mut self, rd: Register, value: u64) -> Result<(), AsmError> {
        let index = self.add_immediate_to_pool(value);
        self.load_from_pool(rd, index)
    }

    /// Load a double constant. `+0.0` is moved from `zero`; anything else
    /// is loaded from the pool (two consecutive, 8-byte aligned slots on
    /// RV32).
    pub fn load_double_immediate(&mut self, fd: FRegister, value: f64) -> Result<(), AsmError> {
        self.require(ExtensionSet::D, "fld")?;
        let bits = value.to_bits();
        if bits == 0 {
            return if self.is_rv64() {
                self.fmv_d_x(fd, Register::Zero)
            } else {
                self.fcvt_d_w(fd, Register::Zero, RoundingMode::Dyn)
            };
        }
        let index = if self.is_rv64() {
            self.add_immediate_to_pool(bits)
        } else {
            if self.pool().len() % 2 == 1 {
                self.add_to_pool(PoolEntry::Immediate(0));
            }
            let lo = self.add_to_pool(PoolEntry::Immediate(bits & 0xFFFF_FFFF));
            self.add_to_pool(PoolEntry::Immediate(bits >> 32));
            lo
        };
        let addr = self.pool_address(index)?;
        self.fld(fd, addr)
    }

    /// Load a single constant through [`TMP`] and `fmv.w.x`.
    pub fn load_single_immediate(&mut self, fd: FRegister, value: f32) -> Result<(), AsmError> {
        self.require(ExtensionSet::F, "fmv.w.x")?;
        let bits = value.to_bits();
        if bits == 0 {
            return self.fmv_w_x(fd, Register::Zero);
        }
        self.load_immediate(TMP, bits as i32 as i64)?;
        self.fmv_w_x(fd, TMP)
    }

    // ── CSR aliases ─────────────────────────────────────────

    /// Read a CSR.
    pub fn csrr(&mut self, rd: Register, csr: u32) -> Result<(), AsmError> {
        self.csrrs(rd, csr, Register::Zero)
    }

    /// Write a CSR.
    pub fn csrw(&mut self, csr: u32, rs: Register) -> Result<(), AsmError> {
        self.csrrw(Register::Zero, csr, rs)
    }

    /// Set bits in a CSR.
    pub fn csrs(&mut self, csr: u32, rs: Register) -> Result<(), AsmError> {
        self.csrrs(Register::Zero, csr, rs)
    }

    /// Clear bits in a CSR.
    pub fn csrc(&mut self, csr: u32, rs: Register) -> Result<(), AsmError> {
        self.csrrc(Register::Zero, csr, rs)
    }
}
