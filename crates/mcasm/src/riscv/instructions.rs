//! Primitive instruction encoders: one method per mnemonic.
//!
//! Label-relative control flow lives in `branch.rs`; explicit compressed
//! forms in `compressed.rs`.

use alloc::format;

use crate::error::AsmError;
use crate::operand::{fits_signed, AddressMode};

use super::format::*;
use super::isa::{ExtensionSet, FenceSet, MemoryOrder, RoundingMode};
use super::registers::{Address, FRegister, Register};
use super::Assembler;

/// Validate a signed immediate of `bits` bits.
pub(crate) fn simm(mnemonic: &'static str, value: i64, bits: u32) -> Result<i32, AsmError> {
    if fits_signed(value, bits) {
        Ok(value as i32)
    } else {
        Err(AsmError::ImmediateOverflow {
            mnemonic,
            value,
            min: -(1i64 << (bits - 1)),
            max: (1i64 << (bits - 1)) - 1,
        })
    }
}

/// Validate a plain `offset(base)` operand with a 12-bit displacement.
pub(crate) fn mem_operand(mnemonic: &'static str, addr: Address) -> Result<(u32, i32), AsmError> {
    if addr.mode() != AddressMode::Offset {
        return Err(AsmError::invalid(
            mnemonic,
            "only offset addressing is encodable; use load_from_address/store_to_address for write-back modes",
        ));
    }
    let off = simm(mnemonic, addr.offset() as i64, 12)?;
    Ok((addr.base_register().num(), off))
}

/// Validate the `(base)` operand of an atomic: offset must be zero.
fn amo_operand(mnemonic: &'static str, addr: Address) -> Result<u32, AsmError> {
    if addr.mode() != AddressMode::Offset || addr.offset() != 0 {
        return Err(AsmError::invalid(
            mnemonic,
            "atomic memory operand must be (base) with zero offset",
        ));
    }
    Ok(addr.base_register().num())
}

/// Validate a 32-bit `lui`/`auipc` value: low 12 bits clear.
fn upper_imm(mnemonic: &'static str, value: i64) -> Result<u32, AsmError> {
    if !fits_signed(value, 32) {
        return Err(AsmError::ImmediateOverflow {
            mnemonic,
            value,
            min: i32::MIN as i64,
            max: 0x7FFF_F000,
        });
    }
    if value & 0xFFF != 0 {
        return Err(AsmError::MisalignedImmediate {
            mnemonic,
            value,
            align: 4096,
        });
    }
    Ok(value as u32)
}

fn csr_number(mnemonic: &'static str, csr: u32) -> Result<i32, AsmError> {
    if csr < 4096 {
        Ok(csr as i32)
    } else {
        Err(AsmError::ImmediateOverflow {
            mnemonic,
            value: csr as i64,
            min: 0,
            max: 4095,
        })
    }
}

fn uimm5(mnemonic: &'static str, value: u32) -> Result<u32, AsmError> {
    if value < 32 {
        Ok(value)
    } else {
        Err(AsmError::ImmediateOverflow {
            mnemonic,
            value: value as i64,
            min: 0,
            max: 31,
        })
    }
}

/// `fmt` field of an FP instruction.
const FMT_S: u32 = 0;
const FMT_D: u32 = 1;

// Encoders that differ only in their fixed fields are generated per family.

macro_rules! r_ops {
    ($($(#[$doc:meta])* $name:ident => ($mn:literal, $opcode:expr, $f3:expr, $f7:expr, $ext:expr, $rv64:expr);)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self, rd: Register, rs1: Register, rs2: Register) -> Result<(), AsmError> {
                self.require($ext, $mn)?;
                if $rv64 {
                    self.require_rv64($mn)?;
                }
                self.emit32(r_type($opcode, rd.num(), $f3, rs1.num(), rs2.num(), $f7));
                Ok(())
            }
        )*
    };
}

macro_rules! i_ops {
    ($($(#[$doc:meta])* $name:ident => ($mn:literal, $opcode:expr, $f3:expr, $rv64:expr);)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self, rd: Register, rs1: Register, imm: i64) -> Result<(), AsmError> {
                if $rv64 {
                    self.require_rv64($mn)?;
                }
                let imm = simm($mn, imm, 12)?;
                self.emit32(i_type($opcode, rd.num(), $f3, rs1.num(), imm));
                Ok(())
            }
        )*
    };
}

macro_rules! shift_ops {
    ($($(#[$doc:meta])* $name:ident => ($mn:literal, $opcode:expr, $f3:expr, $funct6:expr, $ext:expr, $word:expr);)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self, rd: Register, rs1: Register, shamt: u32) -> Result<(), AsmError> {
                self.require($ext, $mn)?;
                let shamt = self.shift_amount($mn, shamt, $word)?;
                let imm = (($funct6 as u32) << 6) | shamt;
                self.emit32(i_type($opcode, rd.num(), $f3, rs1.num(), imm as i32));
                Ok(())
            }
        )*
    };
}

macro_rules! unary_ops {
    ($($(#[$doc:meta])* $name:ident => ($mn:literal, $opcode:expr, $f3:expr, $imm:expr, $ext:expr, $rv64:expr);)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self, rd: Register, rs1: Register) -> Result<(), AsmError> {
                self.require($ext, $mn)?;
                if $rv64 {
                    self.require_rv64($mn)?;
                }
                self.emit32(i_type($opcode, rd.num(), $f3, rs1.num(), $imm));
                Ok(())
            }
        )*
    };
}

macro_rules! load_ops {
    ($($(#[$doc:meta])* $name:ident => ($mn:literal, $f3:expr, $rv64:expr);)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self, rd: Register, addr: Address) -> Result<(), AsmError> {
                if $rv64 {
                    self.require_rv64($mn)?;
                }
                let (base, off) = mem_operand($mn, addr)?;
                self.emit32(i_type(OP_LOAD, rd.num(), $f3, base, off));
                Ok(())
            }
        )*
    };
}

macro_rules! store_ops {
    ($($(#[$doc:meta])* $name:ident => ($mn:literal, $f3:expr, $rv64:expr);)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self, rs2: Register, addr: Address) -> Result<(), AsmError> {
                if $rv64 {
                    self.require_rv64($mn)?;
                }
                let (base, off) = mem_operand($mn, addr)?;
                self.emit32(s_type(OP_STORE, $f3, base, rs2.num(), off));
                Ok(())
            }
        )*
    };
}

macro_rules! amo_ops {
    ($($(#[$doc:meta])* $name:ident => ($mn:literal, $funct5:expr, $f3:expr);)*) => {
        $(
            $(#[$doc])*
            pub fn $name(
                &mut self,
                rd: Register,
                rs2: Register,
                addr: Address,
                order: MemoryOrder,
            ) -> Result<(), AsmError> {
                self.require(ExtensionSet::A, $mn)?;
                if $f3 == 3 {
                    self.require_rv64($mn)?;
                }
                let base = amo_operand($mn, addr)?;
                let (aq, rl) = order.bits();
                self.emit32(amo_type($funct5, aq, rl, rs2.num(), base, $f3, rd.num()));
                Ok(())
            }
        )*
    };
}

macro_rules! fp_arith_ops {
    ($($(#[$doc:meta])* $name:ident => ($mn:literal, $funct5:expr, $fmt:expr);)*) => {
        $(
            $(#[$doc])*
            pub fn $name(
                &mut self,
                rd: FRegister,
                rs1: FRegister,
                rs2: FRegister,
                rm: RoundingMode,
            ) -> Result<(), AsmError> {
                self.require_fmt($fmt, $mn)?;
                self.emit32(r_type(OP_FP, rd.num(), rm.bits(), rs1.num(), rs2.num(), ($funct5 << 2) | $fmt));
                Ok(())
            }
        )*
    };
}

macro_rules! fp_sign_ops {
    ($($(#[$doc:meta])* $name:ident => ($mn:literal, $funct5:expr, $f3:expr, $fmt:expr);)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self, rd: FRegister, rs1: FRegister, rs2: FRegister) -> Result<(), AsmError> {
                self.require_fmt($fmt, $mn)?;
                self.emit32(r_type(OP_FP, rd.num(), $f3, rs1.num(), rs2.num(), ($funct5 << 2) | $fmt));
                Ok(())
            }
        )*
    };
}

macro_rules! fp_fused_ops {
    ($($(#[$doc:meta])* $name:ident => ($mn:literal, $opcode:expr, $fmt:expr);)*) => {
        $(
            $(#[$doc])*
            pub fn $name(
                &mut self,
                rd: FRegister,
                rs1: FRegister,
                rs2: FRegister,
                rs3: FRegister,
                rm: RoundingMode,
            ) -> Result<(), AsmError> {
                self.require_fmt($fmt, $mn)?;
                self.emit32(r4_type($opcode, rd.num(), rm.bits(), rs1.num(), rs2.num(), $fmt, rs3.num()));
                Ok(())
            }
        )*
    };
}

macro_rules! fp_compare_ops {
    ($($(#[$doc:meta])* $name:ident => ($mn:literal, $f3:expr, $fmt:expr);)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self, rd: Register, rs1: FRegister, rs2: FRegister) -> Result<(), AsmError> {
                self.require_fmt($fmt, $mn)?;
                self.emit32(r_type(OP_FP, rd.num(), $f3, rs1.num(), rs2.num(), (0b10100 << 2) | $fmt));
                Ok(())
            }
        )*
    };
}

/// Float-to-integer conversions: `rd` integer, `rs1` float.
macro_rules! fcvt_to_int_ops {
    ($($(#[$doc:meta])* $name:ident => ($mn:literal, $sel:expr, $fmt:expr, $rv64:expr);)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self, rd: Register, rs1: FRegister, rm: RoundingMode) -> Result<(), AsmError> {
                self.require_fmt($fmt, $mn)?;
                if $rv64 {
                    self.require_rv64($mn)?;
                }
                self.emit32(r_type(OP_FP, rd.num(), rm.bits(), rs1.num(), $sel, (0b11000 << 2) | $fmt));
                Ok(())
            }
        )*
    };
}

/// Integer-to-float conversions: `rd` float, `rs1` integer.
macro_rules! fcvt_from_int_ops {
    ($($(#[$doc:meta])* $name:ident => ($mn:literal, $sel:expr, $fmt:expr, $rv64:expr);)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self, rd: FRegister, rs1: Register, rm: RoundingMode) -> Result<(), AsmError> {
                self.require_fmt($fmt, $mn)?;
                if $rv64 {
                    self.require_rv64($mn)?;
                }
                self.emit32(r_type(OP_FP, rd.num(), rm.bits(), rs1.num(), $sel, (0b11010 << 2) | $fmt));
                Ok(())
            }
        )*
    };
}

impl Assembler {
    fn shift_amount(&self, mnemonic: &'static str, shamt: u32, word: bool) -> Result<u32, AsmError> {
        let max = if word { 31 } else { self.xlen().max_shift() };
        if word {
            self.require_rv64(mnemonic)?;
        }
        if shamt > max {
            return Err(AsmError::ImmediateOverflow {
                mnemonic,
                value: shamt as i64,
                min: 0,
                max: max as i64,
            });
        }
        Ok(shamt)
    }

    fn require_fmt(&self, fmt: u32, mnemonic: &'static str) -> Result<(), AsmError> {
        if fmt == FMT_D {
            self.require(ExtensionSet::D, mnemonic)
        } else {
            self.require(ExtensionSet::F, mnemonic)
        }
    }

    // ── RV32I / RV64I ───────────────────────────────────────

    /// `lui rd, imm`: `imm` is the full value, a multiple of 4096.
    pub fn lui(&mut self, rd: Register, imm: i64) -> Result<(), AsmError> {
        let imm = upper_imm("lui", imm)?;
        self.emit32(u_type(OP_LUI, rd.num(), imm));
        Ok(())
    }

    /// `auipc rd, imm`: `imm` is the full value, a multiple of 4096.
    pub fn auipc(&mut self, rd: Register, imm: i64) -> Result<(), AsmError> {
        let imm = upper_imm("auipc", imm)?;
        self.emit32(u_type(OP_AUIPC, rd.num(), imm));
        Ok(())
    }

    /// `jalr rd, imm(rs1)`.
    pub fn jalr(&mut self, rd: Register, rs1: Register, imm: i64) -> Result<(), AsmError> {
        let imm = simm("jalr", imm, 12)?;
        self.emit32(i_type(OP_JALR, rd.num(), 0, rs1.num(), imm));
        Ok(())
    }

    load_ops! {
        /// Load a sign-extended byte.
        lb => ("lb", 0, false);
        /// Load a sign-extended halfword.
        lh => ("lh", 1, false);
        /// Load a word (sign-extended on RV64).
        lw => ("lw", 2, false);
        /// Load a doubleword.
        ld => ("ld", 3, true);
        /// Load a zero-extended byte.
        lbu => ("lbu", 4, false);
        /// Load a zero-extended halfword.
        lhu => ("lhu", 5, false);
        /// Load a zero-extended word.
        lwu => ("lwu", 6, true);
    }

    store_ops! {
        /// Store a byte.
        sb => ("sb", 0, false);
        /// Store a halfword.
        sh => ("sh", 1, false);
        /// Store a word.
        sw => ("sw", 2, false);
        /// Store a doubleword.
        sd => ("sd", 3, true);
    }

    i_ops! {
        /// `rd = rs1 + imm`.
        addi => ("addi", OP_IMM, 0, false);
        /// `rd = (rs1 < imm)` signed.
        slti => ("slti", OP_IMM, 2, false);
        /// `rd = (rs1 < imm)` unsigned, `imm` sign-extended first.
        sltiu => ("sltiu", OP_IMM, 3, false);
        xori => ("xori", OP_IMM, 4, false);
        ori => ("ori", OP_IMM, 6, false);
        andi => ("andi", OP_IMM, 7, false);
        /// 32-bit add, result sign-extended.
        addiw => ("addiw", OP_IMM_W, 0, true);
    }

    shift_ops! {
        slli => ("slli", OP_IMM, 1, 0b000000, ExtensionSet::I, false);
        srli => ("srli", OP_IMM, 5, 0b000000, ExtensionSet::I, false);
        srai => ("srai", OP_IMM, 5, 0b010000, ExtensionSet::I, false);
        slliw => ("slliw", OP_IMM_W, 1, 0b000000, ExtensionSet::I, true);
        srliw => ("srliw", OP_IMM_W, 5, 0b000000, ExtensionSet::I, true);
        sraiw => ("sraiw", OP_IMM_W, 5, 0b010000, ExtensionSet::I, true);
    }

    r_ops! {
        add => ("add", OP_REG, 0, 0b0000000, ExtensionSet::I, false);
        sub => ("sub", OP_REG, 0, 0b0100000, ExtensionSet::I, false);
        sll => ("sll", OP_REG, 1, 0b0000000, ExtensionSet::I, false);
        slt => ("slt", OP_REG, 2, 0b0000000, ExtensionSet::I, false);
        sltu => ("sltu", OP_REG, 3, 0b0000000, ExtensionSet::I, false);
        xor => ("xor", OP_REG, 4, 0b0000000, ExtensionSet::I, false);
        srl => ("srl", OP_REG, 5, 0b0000000, ExtensionSet::I, false);
        sra => ("sra", OP_REG, 5, 0b0100000, ExtensionSet::I, false);
        or => ("or", OP_REG, 6, 0b0000000, ExtensionSet::I, false);
        and => ("and", OP_REG, 7, 0b0000000, ExtensionSet::I, false);
        addw => ("addw", OP_REG_W, 0, 0b0000000, ExtensionSet::I, true);
        subw => ("subw", OP_REG_W, 0, 0b0100000, ExtensionSet::I, true);
        sllw => ("sllw", OP_REG_W, 1, 0b0000000, ExtensionSet::I, true);
        srlw => ("srlw", OP_REG_W, 5, 0b0000000, ExtensionSet::I, true);
        sraw => ("sraw", OP_REG_W, 5, 0b0100000, ExtensionSet::I, true);
    }

    /// `fence pred, succ`.
    pub fn fence(&mut self, pred: FenceSet, succ: FenceSet) -> Result<(), AsmError> {
        let imm = ((pred.bits() << 4) | succ.bits()) as i32;
        self.emit32(i_type(OP_FENCE, 0, 0, 0, imm));
        Ok(())
    }

    /// Instruction-stream fence.
    pub fn fence_i(&mut self) -> Result<(), AsmError> {
        self.emit32(i_type(OP_FENCE, 0, 1, 0, 0));
        Ok(())
    }

    /// Environment call.
    pub fn ecall(&mut self) -> Result<(), AsmError> {
        self.emit32(0x0000_0073);
        Ok(())
    }

    /// Breakpoint.
    pub fn ebreak(&mut self) -> Result<(), AsmError> {
        self.emit32(0x0010_0073);
        Ok(())
    }

    /// The all-zero word, architecturally illegal.
    pub fn trap(&mut self) -> Result<(), AsmError> {
        self.emit32_exact(0);
        Ok(())
    }

    // ── M ───────────────────────────────────────────────────

    r_ops! {
        mul => ("mul", OP_REG, 0, 1, ExtensionSet::M, false);
        mulh => ("mulh", OP_REG, 1, 1, ExtensionSet::M, false);
        mulhsu => ("mulhsu", OP_REG, 2, 1, ExtensionSet::M, false);
        mulhu => ("mulhu", OP_REG, 3, 1, ExtensionSet::M, false);
        /// Signed division; by zero yields all ones.
        div => ("div", OP_REG, 4, 1, ExtensionSet::M, false);
        /// Unsigned division; by zero yields all ones.
        divu => ("divu", OP_REG, 5, 1, ExtensionSet::M, false);
        /// Signed remainder; by zero yields the dividend.
        rem => ("rem", OP_REG, 6, 1, ExtensionSet::M, false);
        remu => ("remu", OP_REG, 7, 1, ExtensionSet::M, false);
        mulw => ("mulw", OP_REG_W, 0, 1, ExtensionSet::M, true);
        divw => ("divw", OP_REG_W, 4, 1, ExtensionSet::M, true);
        divuw => ("divuw", OP_REG_W, 5, 1, ExtensionSet::M, true);
        remw => ("remw", OP_REG_W, 6, 1, ExtensionSet::M, true);
        remuw => ("remuw", OP_REG_W, 7, 1, ExtensionSet::M, true);
    }

    // ── A ───────────────────────────────────────────────────

    /// Load-reserved word.
    pub fn lr_w(&mut self, rd: Register, addr: Address, order: MemoryOrder) -> Result<(), AsmError> {
        self.amoswap_like("lr.w", 0b00010, 2, rd, Register::Zero, addr, order)
    }

    /// Load-reserved doubleword.
    pub fn lr_d(&mut self, rd: Register, addr: Address, order: MemoryOrder) -> Result<(), AsmError> {
        self.require_rv64("lr.d")?;
        self.amoswap_like("lr.d", 0b00010, 3, rd, Register::Zero, addr, order)
    }

    /// Store-conditional word; `rd` is zero on success.
    pub fn sc_w(
        &mut self,
        rd: Register,
        rs2: Register,
        addr: Address,
        order: MemoryOrder,
    ) -> Result<(), AsmError> {
        self.amoswap_like("sc.w", 0b00011, 2, rd, rs2, addr, order)
    }

    /// Store-conditional doubleword; `rd` is zero on success.
    pub fn sc_d(
        &mut self,
        rd: Register,
        rs2: Register,
        addr: Address,
        order: MemoryOrder,
    ) -> Result<(), AsmError> {
        self.require_rv64("sc.d")?;
        self.amoswap_like("sc.d", 0b00011, 3, rd, rs2, addr, order)
    }

    fn amoswap_like(
        &mut self,
        mnemonic: &'static str,
        funct5: u32,
        funct3: u32,
        rd: Register,
        rs2: Register,
        addr: Address,
        order: MemoryOrder,
    ) -> Result<(), AsmError> {
        self.require(ExtensionSet::A, mnemonic)?;
        let base = amo_operand(mnemonic, addr)?;
        let (aq, rl) = order.bits();
        self.emit32(amo_type(funct5, aq, rl, rs2.num(), base, funct3, rd.num()));
        Ok(())
    }

    amo_ops! {
        amoswap_w => ("amoswap.w", 0b00001, 2);
        amoadd_w => ("amoadd.w", 0b00000, 2);
        amoxor_w => ("amoxor.w", 0b00100, 2);
        amoand_w => ("amoand.w", 0b01100, 2);
        amoor_w => ("amoor.w", 0b01000, 2);
        amomin_w => ("amomin.w", 0b10000, 2);
        amomax_w => ("amomax.w", 0b10100, 2);
        amominu_w => ("amominu.w", 0b11000, 2);
        amomaxu_w => ("amomaxu.w", 0b11100, 2);
        amoswap_d => ("amoswap.d", 0b00001, 3);
        amoadd_d => ("amoadd.d", 0b00000, 3);
        amoxor_d => ("amoxor.d", 0b00100, 3);
        amoand_d => ("amoand.d", 0b01100, 3);
        amoor_d => ("amoor.d", 0b01000, 3);
        amomin_d => ("amomin.d", 0b10000, 3);
        amomax_d => ("amomax.d", 0b10100, 3);
        amominu_d => ("amominu.d", 0b11000, 3);
        amomaxu_d => ("amomaxu.d", 0b11100, 3);
    }

    // ── F / D ───────────────────────────────────────────────

    /// Load a single.
    pub fn flw(&mut self, rd: FRegister, addr: Address) -> Result<(), AsmError> {
        self.require(ExtensionSet::F, "flw")?;
        let (base, off) = mem_operand("flw", addr)?;
        self.emit32(i_type(OP_LOAD_FP, rd.num(), 2, base, off));
        Ok(())
    }

    /// Load a double.
    pub fn fld(&mut self, rd: FRegister, addr: Address) -> Result<(), AsmError> {
        self.require(ExtensionSet::D, "fld")?;
        let (base, off) = mem_operand("fld", addr)?;
        self.emit32(i_type(OP_LOAD_FP, rd.num(), 3, base, off));
        Ok(())
    }

    /// Store a single.
    pub fn fsw(&mut self, rs2: FRegister, addr: Address) -> Result<(), AsmError> {
        self.require(ExtensionSet::F, "fsw")?;
        let (base, off) = mem_operand("fsw", addr)?;
        self.emit32(s_type(OP_STORE_FP, 2, base, rs2.num(), off));
        Ok(())
    }

    /// Store a double.
    pub fn fsd(&mut self, rs2: FRegister, addr: Address) -> Result<(), AsmError> {
        self.require(ExtensionSet::D, "fsd")?;
        let (base, off) = mem_operand("fsd", addr)?;
        self.emit32(s_type(OP_STORE_FP, 3, base, rs2.num(), off));
        Ok(())
    }

    fp_fused_ops! {
        /// `rd = rs1 * rs2 + rs3`, single rounding.
        fmadd_s => ("fmadd.s", OP_MADD, FMT_S);
        /// `rd = rs1 * rs2 - rs3`.
        fmsub_s => ("fmsub.s", OP_MSUB, FMT_S);
        /// `rd = -(rs1 * rs2) + rs3`.
        fnmsub_s => ("fnmsub.s", OP_NMSUB, FMT_S);
        /// `rd = -(rs1 * rs2) - rs3`.
        fnmadd_s => ("fnmadd.s", OP_NMADD, FMT_S);
        fmadd_d => ("fmadd.d", OP_MADD, FMT_D);
        fmsub_d => ("fmsub.d", OP_MSUB, FMT_D);
        fnmsub_d => ("fnmsub.d", OP_NMSUB, FMT_D);
        fnmadd_d => ("fnmadd.d", OP_NMADD, FMT_D);
    }

    fp_arith_ops! {
        fadd_s => ("fadd.s", 0b00000, FMT_S);
        fsub_s => ("fsub.s", 0b00001, FMT_S);
        fmul_s => ("fmul.s", 0b00010, FMT_S);
        fdiv_s => ("fdiv.s", 0b00011, FMT_S);
        fadd_d => ("fadd.d", 0b00000, FMT_D);
        fsub_d => ("fsub.d", 0b00001, FMT_D);
        fmul_d => ("fmul.d", 0b00010, FMT_D);
        fdiv_d => ("fdiv.d", 0b00011, FMT_D);
    }

    /// Square root of a single.
    pub fn fsqrt_s(&mut self, rd: FRegister, rs1: FRegister, rm: RoundingMode) -> Result<(), AsmError> {
        self.require(ExtensionSet::F, "fsqrt.s")?;
        self.emit32(r_type(OP_FP, rd.num(), rm.bits(), rs1.num(), 0, (0b01011 << 2) | FMT_S));
        Ok(())
    }

    /// Square root of a double.
    pub fn fsqrt_d(&mut self, rd: FRegister, rs1: FRegister, rm: RoundingMode) -> Result<(), AsmError> {
        self.require(ExtensionSet::D, "fsqrt.d")?;
        self.emit32(r_type(OP_FP, rd.num(), rm.bits(), rs1.num(), 0, (0b01011 << 2) | FMT_D));
        Ok(())
    }

    fp_sign_ops! {
        fsgnj_s => ("fsgnj.s", 0b00100, 0, FMT_S);
        fsgnjn_s => ("fsgnjn.s", 0b00100, 1, FMT_S);
        fsgnjx_s => ("fsgnjx.s", 0b00100, 2, FMT_S);
        /// Minimum; a single NaN operand yields the other operand.
        fmin_s => ("fmin.s", 0b00101, 0, FMT_S);
        fmax_s => ("fmax.s", 0b00101, 1, FMT_S);
        fsgnj_d => ("fsgnj.d", 0b00100, 0, FMT_D);
        fsgnjn_d => ("fsgnjn.d", 0b00100, 1, FMT_D);
        fsgnjx_d => ("fsgnjx.d", 0b00100, 2, FMT_D);
        fmin_d => ("fmin.d", 0b00101, 0, FMT_D);
        fmax_d => ("fmax.d", 0b00101, 1, FMT_D);
    }

    fp_compare_ops! {
        /// Quiet equality; unordered yields 0.
        feq_s => ("feq.s", 2, FMT_S);
        /// Signalling less-than; unordered yields 0.
        flt_s => ("flt.s", 1, FMT_S);
        fle_s => ("fle.s", 0, FMT_S);
        feq_d => ("feq.d", 2, FMT_D);
        flt_d => ("flt.d", 1, FMT_D);
        fle_d => ("fle.d", 0, FMT_D);
    }

    fcvt_to_int_ops! {
        fcvt_w_s => ("fcvt.w.s", 0, FMT_S, false);
        fcvt_wu_s => ("fcvt.wu.s", 1, FMT_S, false);
        fcvt_l_s => ("fcvt.l.s", 2, FMT_S, true);
        fcvt_lu_s => ("fcvt.lu.s", 3, FMT_S, true);
        fcvt_w_d => ("fcvt.w.d", 0, FMT_D, false);
        fcvt_wu_d => ("fcvt.wu.d", 1, FMT_D, false);
        fcvt_l_d => ("fcvt.l.d", 2, FMT_D, true);
        fcvt_lu_d => ("fcvt.lu.d", 3, FMT_D, true);
    }

    fcvt_from_int_ops! {
        fcvt_s_w => ("fcvt.s.w", 0, FMT_S, false);
        fcvt_s_wu => ("fcvt.s.wu", 1, FMT_S, false);
        fcvt_s_l => ("fcvt.s.l", 2, FMT_S, true);
        fcvt_s_lu => ("fcvt.s.lu", 3, FMT_S, true);
        fcvt_d_w => ("fcvt.d.w", 0, FMT_D, false);
        fcvt_d_wu => ("fcvt.d.wu", 1, FMT_D, false);
        fcvt_d_l => ("fcvt.d.l", 2, FMT_D, true);
        fcvt_d_lu => ("fcvt.d.lu", 3, FMT_D, true);
    }

    /// Narrow a double to a single.
    pub fn fcvt_s_d(&mut self, rd: FRegister, rs1: FRegister, rm: RoundingMode) -> Result<(), AsmError> {
        self.require(ExtensionSet::D, "fcvt.s.d")?;
        self.emit32(r_type(OP_FP, rd.num(), rm.bits(), rs1.num(), 1, (0b01000 << 2) | FMT_S));
        Ok(())
    }

    /// Widen a single to a double (exact).
    pub fn fcvt_d_s(&mut self, rd: FRegister, rs1: FRegister, rm: RoundingMode) -> Result<(), AsmError> {
        self.require(ExtensionSet::D, "fcvt.d.s")?;
        self.emit32(r_type(OP_FP, rd.num(), rm.bits(), rs1.num(), 0, (0b01000 << 2) | FMT_D));
        Ok(())
    }

    /// Move the bits of a single to an integer register, sign-extended.
    pub fn fmv_x_w(&mut self, rd: Register, rs1: FRegister) -> Result<(), AsmError> {
        self.require(ExtensionSet::F, "fmv.x.w")?;
        self.emit32(r_type(OP_FP, rd.num(), 0, rs1.num(), 0, (0b11100 << 2) | FMT_S));
        Ok(())
    }

    /// Move the low 32 bits of an integer register into a single.
    pub fn fmv_w_x(&mut self, rd: FRegister, rs1: Register) -> Result<(), AsmError> {
        self.require(ExtensionSet::F, "fmv.w.x")?;
        self.emit32(r_type(OP_FP, rd.num(), 0, rs1.num(), 0, (0b11110 << 2) | FMT_S));
        Ok(())
    }

    pub fn fmv_x_d(&mut self, rd: Register, rs1: FRegister) -> Result<(), AsmError> {
        self.require(ExtensionSet::D, "fmv.x.d")?;
        self.require_rv64("fmv.x.d")?;
        self.emit32(r_type(OP_FP, rd.num(), 0, rs1.num(), 0, (0b11100 << 2) | FMT_D));
        Ok(())
    }

    pub fn fmv_d_x(&mut self, rd: FRegister, rs1: Register) -> Result<(), AsmError> {
        self.require(ExtensionSet::D, "fmv.d.x")?;
        self.require_rv64("fmv.d.x")?;
        self.emit32(r_type(OP_FP, rd.num(), 0, rs1.num(), 0, (0b11110 << 2) | FMT_D));
        Ok(())
    }

    /// Classify a single into a one-hot 10-bit mask.
    pub fn fclass_s(&mut self, rd: Register, rs1: FRegister) -> Result<(), AsmError> {
        self.require(ExtensionSet::F, "fclass.s")?;
        self.emit32(r_type(OP_FP, rd.num(), 1, rs1.num(), 0, (0b11100 << 2) | FMT_S));
        Ok(())
    }

    pub fn fclass_d(&mut self, rd: Register, rs1: FRegister) -> Result<(), AsmError> {
        self.require(ExtensionSet::D, "fclass.d")?;
        self.emit32(r_type(OP_FP, rd.num(), 1, rs1.num(), 0, (0b11100 << 2) | FMT_D));
        Ok(())
    }

    // ── Zicsr ───────────────────────────────────────────────

    fn csr_reg(&mut self, mnemonic: &'static str, f3: u32, rd: Register, csr: u32, rs1: u32) -> Result<(), AsmError> {
        let csr = csr_number(mnemonic, csr)?;
        self.emit32(i_type(OP_SYSTEM, rd.num(), f3, rs1, csr));
        Ok(())
    }

    /// Atomic read/write CSR.
    pub fn csrrw(&mut self, rd: Register, csr: u32, rs1: Register) -> Result<(), AsmError> {
        self.csr_reg("csrrw", 1, rd, csr, rs1.num())
    }

    /// Atomic read and set bits in CSR.
    pub fn csrrs(&mut self, rd: Register, csr: u32, rs1: Register) -> Result<(), AsmError> {
        self.csr_reg("csrrs", 2, rd, csr, rs1.num())
    }

    /// Atomic read and clear bits in CSR.
    pub fn csrrc(&mut self, rd: Register, csr: u32, rs1: Register) -> Result<(), AsmError> {
        self.csr_reg("csrrc", 3, rd, csr, rs1.num())
    }

    pub fn csrrwi(&mut self, rd: Register, csr: u32, uimm: u32) -> Result<(), AsmError> {
        let uimm = uimm5("csrrwi", uimm)?;
        self.csr_reg("csrrwi", 5, rd, csr, uimm)
    }

    pub fn csrrsi(&mut self, rd: Register, csr: u32, uimm: u32) -> Result<(), AsmError> {
        let uimm = uimm5("csrrsi", uimm)?;
        self.csr_reg("csrrsi", 6, rd, csr, uimm)
    }

    pub fn csrrci(&mut self, rd: Register, csr: u32, uimm: u32) -> Result<(), AsmError> {
        let uimm = uimm5("csrrci", uimm)?;
        self.csr_reg("csrrci", 7, rd, csr, uimm)
    }

    // ── Zba ─────────────────────────────────────────────────

    r_ops! {
        /// `rd = rs2 + zext32(rs1)`.
        add_uw => ("add.uw", OP_REG_W, 0, 0b0000100, ExtensionSet::ZBA, true);
        sh1add => ("sh1add", OP_REG, 2, 0b0010000, ExtensionSet::ZBA, false);
        sh2add => ("sh2add", OP_REG, 4, 0b0010000, ExtensionSet::ZBA, false);
        sh3add => ("sh3add", OP_REG, 6, 0b0010000, ExtensionSet::ZBA, false);
        sh1add_uw => ("sh1add.uw", OP_REG_W, 2, 0b0010000, ExtensionSet::ZBA, true);
        sh2add_uw => ("sh2add.uw", OP_REG_W, 4, 0b0010000, ExtensionSet::ZBA, true);
        sh3add_uw => ("sh3add.uw", OP_REG_W, 6, 0b0010000, ExtensionSet::ZBA, true);
    }

    /// `rd = zext32(rs1) << shamt`.
    pub fn slli_uw(&mut self, rd: Register, rs1: Register, shamt: u32) -> Result<(), AsmError> {
        self.require(ExtensionSet::ZBA, "slli.uw")?;
        self.require_rv64("slli.uw")?;
        let shamt = self.shift_amount("slli.uw", shamt, false)?;
        let imm = (0b000010 << 6) | shamt;
        self.emit32(i_type(OP_IMM_W, rd.num(), 1, rs1.num(), imm as i32));
        Ok(())
    }

    // ── Zbb ─────────────────────────────────────────────────

    r_ops! {
        andn => ("andn", OP_REG, 7, 0b0100000, ExtensionSet::ZBB, false);
        orn => ("orn", OP_REG, 6, 0b0100000, ExtensionSet::ZBB, false);
        xnor => ("xnor", OP_REG, 4, 0b0100000, ExtensionSet::ZBB, false);
        max => ("max", OP_REG, 6, 0b0000101, ExtensionSet::ZBB, false);
        maxu => ("maxu", OP_REG, 7, 0b0000101, ExtensionSet::ZBB, false);
        min => ("min", OP_REG, 4, 0b0000101, ExtensionSet::ZBB, false);
        minu => ("minu", OP_REG, 5, 0b0000101, ExtensionSet::ZBB, false);
        rol => ("rol", OP_REG, 1, 0b0110000, ExtensionSet::ZBB, false);
        ror => ("ror", OP_REG, 5, 0b0110000, ExtensionSet::ZBB, false);
        rolw => ("rolw", OP_REG_W, 1, 0b0110000, ExtensionSet::ZBB, true);
        rorw => ("rorw", OP_REG_W, 5, 0b0110000, ExtensionSet::ZBB, true);
    }

    unary_ops! {
        /// Count leading zeros.
        clz => ("clz", OP_IMM, 1, 0x600, ExtensionSet::ZBB, false);
        /// Count trailing zeros.
        ctz => ("ctz", OP_IMM, 1, 0x601, ExtensionSet::ZBB, false);
        /// Population count.
        cpop => ("cpop", OP_IMM, 1, 0x602, ExtensionSet::ZBB, false);
        sext_b => ("sext.b", OP_IMM, 1, 0x604, ExtensionSet::ZBB, false);
        sext_h => ("sext.h", OP_IMM, 1, 0x605, ExtensionSet::ZBB, false);
        clzw => ("clzw", OP_IMM_W, 1, 0x600, ExtensionSet::ZBB, true);
        ctzw => ("ctzw", OP_IMM_W, 1, 0x601, ExtensionSet::ZBB, true);
        cpopw => ("cpopw", OP_IMM_W, 1, 0x602, ExtensionSet::ZBB, true);
        /// OR-combine within each byte.
        orc_b => ("orc.b", OP_IMM, 5, 0x287, ExtensionSet::ZBB, false);
    }

    /// Zero-extend a halfword.
    pub fn zext_h(&mut self, rd: Register, rs1: Register) -> Result<(), AsmError> {
        self.require(ExtensionSet::ZBB, "zext.h")?;
        let opcode = if self.is_rv64() { OP_REG_W } else { OP_REG };
        self.emit32(r_type(opcode, rd.num(), 4, rs1.num(), 0, 0b0000100));
        Ok(())
    }

    /// Reverse byte order.
    pub fn rev8(&mut self, rd: Register, rs1: Register) -> Result<(), AsmError> {
        self.require(ExtensionSet::ZBB, "rev8")?;
        let imm = if self.is_rv64() { 0x6B8 } else { 0x698 };
        self.emit32(i_type(OP_IMM, rd.num(), 5, rs1.num(), imm));
        Ok(())
    }

    shift_ops! {
        rori => ("rori", OP_IMM, 5, 0b011000, ExtensionSet::ZBB, false);
        roriw => ("roriw", OP_IMM_W, 5, 0b011000, ExtensionSet::ZBB, true);
    }

    // ── Zbs ─────────────────────────────────────────────────

    r_ops! {
        bclr => ("bclr", OP_REG, 1, 0b0100100, ExtensionSet::ZBS, false);
        bext => ("bext", OP_REG, 5, 0b0100100, ExtensionSet::ZBS, false);
        binv => ("binv", OP_REG, 1, 0b0110100, ExtensionSet::ZBS, false);
        bset => ("bset", OP_REG, 1, 0b0010100, ExtensionSet::ZBS, false);
    }

    shift_ops! {
        bclri => ("bclri", OP_IMM, 1, 0b010010, ExtensionSet::ZBS, false);
        bexti => ("bexti", OP_IMM, 5, 0b010010, ExtensionSet::ZBS, false);
        binvi => ("binvi", OP_IMM, 1, 0b011010, ExtensionSet::ZBS, false);
        bseti => ("bseti", OP_IMM, 1, 0b001010, ExtensionSet::ZBS, false);
    }

    /// Emit a pre-encoded 32-bit instruction word, compressed if possible.
    ///
    /// Only the length is checked: the low two bits must be `0b11`.
    pub fn emit_word(&mut self, word: u32) -> Result<(), AsmError> {
        if word & 3 != 3 {
            return Err(AsmError::invalid(
                "emit_word",
                &format!("{word:#010x} is not a 32-bit encoding"),
            ));
        }
        self.emit32(word);
        Ok(())
    }
}
