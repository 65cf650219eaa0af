//! C-extension (RVC) encodings.
//!
//! Every compressed form is built by one packer that returns `None` when
//! the operands do not fit it. [`compress`] maps a 32-bit word to the
//! 16-bit form that expands back to exactly that word; [`expand`] is its
//! inverse and also serves the decoder.

use crate::error::AsmError;
use crate::operand::{fits_signed, sign_extend};

use super::format::*;
use super::isa::{ExtensionSet, Xlen};
use super::registers::{Address, FRegister, Register};
use super::Assembler;

const SP: u32 = 2;
const RA: u32 = 1;

mod pack {
    use super::*;

    fn simm6(imm: i64) -> Option<(u16, u16)> {
        if fits_signed(imm, 6) {
            let v = imm as u16;
            Some(((v >> 5) & 1, v & 0x1F))
        } else {
            None
        }
    }

    pub(super) fn addi4spn(rd: u32, imm: i64) -> Option<u16> {
        let rd = compact_reg(rd)?;
        if imm <= 0 || imm >= 1024 || imm % 4 != 0 {
            return None;
        }
        let u = imm as u16;
        let imm8 = (((u >> 4) & 3) << 6) | (((u >> 6) & 0xF) << 2) | (((u >> 2) & 1) << 1) | ((u >> 3) & 1);
        Some(ciw_type(0b000, imm8, rd, C_OP_Q0))
    }

    /// CL/CS with a word-scaled offset (`c.lw`, `c.flw`, `c.sw`, `c.fsw`).
    pub(super) fn mem_w(funct3: u16, rd: u32, rs1: u32, off: i64, op: u16) -> Option<u16> {
        let rd = compact_reg(rd)?;
        let rs1 = compact_reg(rs1)?;
        if !(0..=124).contains(&off) || off % 4 != 0 {
            return None;
        }
        let u = off as u16;
        let hi3 = (u >> 3) & 7;
        let lo2 = (((u >> 2) & 1) << 1) | ((u >> 6) & 1);
        Some(cl_type(funct3, hi3, rs1, lo2, rd, op))
    }

    /// CL/CS with a doubleword-scaled offset (`c.ld`, `c.fld`, `c.sd`, `c.fsd`).
    pub(super) fn mem_d(funct3: u16, rd: u32, rs1: u32, off: i64, op: u16) -> Option<u16> {
        let rd = compact_reg(rd)?;
        let rs1 = compact_reg(rs1)?;
        if !(0..=248).contains(&off) || off % 8 != 0 {
            return None;
        }
        let u = off as u16;
        let hi3 = (u >> 3) & 7;
        let lo2 = (u >> 6) & 3;
        Some(cl_type(funct3, hi3, rs1, lo2, rd, op))
    }

    pub(super) fn addi(rd: u32, imm: i64) -> Option<u16> {
        if rd == 0 || imm == 0 {
            return None;
        }
        let (b5, lo) = simm6(imm)?;
        Some(ci_type(0b000, b5, rd as u16, lo, C_OP_Q1))
    }

    pub(super) fn addiw(rd: u32, imm: i64) -> Option<u16> {
        if rd == 0 {
            return None;
        }
        let (b5, lo) = simm6(imm)?;
        Some(ci_type(0b001, b5, rd as u16, lo, C_OP_Q1))
    }

    pub(super) fn li(rd: u32, imm: i64) -> Option<u16> {
        if rd == 0 {
            return None;
        }
        let (b5, lo) = simm6(imm)?;
        Some(ci_type(0b010, b5, rd as u16, lo, C_OP_Q1))
    }

    pub(super) fn addi16sp(imm: i64) -> Option<u16> {
        if imm == 0 || imm % 16 != 0 || !(-512..=496).contains(&imm) {
            return None;
        }
        let u = imm as u16;
        let b5 = (u >> 9) & 1;
        let lo = (((u >> 4) & 1) << 4) | (((u >> 6) & 1) << 3) | (((u >> 7) & 3) << 1) | ((u >> 5) & 1);
        Some(ci_type(0b011, b5, SP as u16, lo, C_OP_Q1))
    }

    /// `imm` is the full `lui` value.
    pub(super) fn lui(rd: u32, imm: i64) -> Option<u16> {
        if rd == 0 || rd == SP || imm == 0 || imm & 0xFFF != 0 {
            return None;
        }
        let (b5, lo) = simm6(imm >> 12)?;
        Some(ci_type(0b011, b5, rd as u16, lo, C_OP_Q1))
    }

    /// `c.srli` (`funct2 = 0`) and `c.srai` (`funct2 = 1`).
    pub(super) fn shift_right(funct2: u16, rd: u32, shamt: u32, xlen: Xlen) -> Option<u16> {
        let rd = compact_reg(rd)?;
        if shamt == 0 || shamt > xlen.max_shift() {
            return None;
        }
        let s = shamt as u16;
        Some(ci_type(0b100, s >> 5, (funct2 << 3) | rd, s & 0x1F, C_OP_Q1))
    }

    pub(super) fn andi(rd: u32, imm: i64) -> Option<u16> {
        let rd = compact_reg(rd)?;
        let (b5, lo) = simm6(imm)?;
        Some(ci_type(0b100, b5, (0b10 << 3) | rd, lo, C_OP_Q1))
    }

    /// CA-format register arithmetic.
    pub(super) fn arith(funct6: u16, funct2: u16, rd: u32, rs2: u32) -> Option<u16> {
        let rd = compact_reg(rd)?;
        let rs2 = compact_reg(rs2)?;
        Some(ca_type(funct6, rd, funct2, rs2, C_OP_Q1))
    }

    pub(super) fn j(funct3: u16, off: i64) -> Option<u16> {
        if !fits_signed(off, 12) || off % 2 != 0 {
            return None;
        }
        Some(cj_type(funct3, off as i32))
    }

    pub(super) fn branch(funct3: u16, rs1: u32, off: i64) -> Option<u16> {
        let rs1 = compact_reg(rs1)?;
        if !fits_signed(off, 9) || off % 2 != 0 {
            return None;
        }
        Some(cb_type(funct3, rs1, off as i32))
    }

    pub(super) fn slli(rd: u32, shamt: u32, xlen: Xlen) -> Option<u16> {
        if rd == 0 || shamt == 0 || shamt > xlen.max_shift() {
            return None;
        }
        let s = shamt as u16;
        Some(ci_type(0b000, s >> 5, rd as u16, s & 0x1F, C_OP_Q2))
    }

    /// `c.lwsp`/`c.flwsp`. `int` rejects `rd == zero`.
    pub(super) fn lwsp(funct3: u16, rd: u32, off: i64, int: bool) -> Option<u16> {
        if (int && rd == 0) || !(0..=252).contains(&off) || off % 4 != 0 {
            return None;
        }
        let u = off as u16;
        let lo = (((u >> 2) & 7) << 2) | ((u >> 6) & 3);
        Some(ci_type(funct3, (u >> 5) & 1, rd as u16, lo, C_OP_Q2))
    }

    /// `c.ldsp`/`c.fldsp`. `int` rejects `rd == zero`.
    pub(super) fn ldsp(funct3: u16, rd: u32, off: i64, int: bool) -> Option<u16> {
        if (int && rd == 0) || !(0..=504).contains(&off) || off % 8 != 0 {
            return None;
        }
        let u = off as u16;
        let lo = (((u >> 3) & 3) << 3) | ((u >> 6) & 7);
        Some(ci_type(funct3, (u >> 5) & 1, rd as u16, lo, C_OP_Q2))
    }

    pub(super) fn swsp(funct3: u16, rs2: u32, off: i64) -> Option<u16> {
        if !(0..=252).contains(&off) || off % 4 != 0 {
            return None;
        }
        let u = off as u16;
        let imm6 = (((u >> 2) & 0xF) << 2) | ((u >> 6) & 3);
        Some(css_type(funct3, imm6, rs2 as u16, C_OP_Q2))
    }

    pub(super) fn sdsp(funct3: u16, rs2: u32, off: i64) -> Option<u16> {
        if !(0..=504).contains(&off) || off % 8 != 0 {
            return None;
        }
        let u = off as u16;
        let imm6 = (((u >> 3) & 7) << 3) | ((u >> 6) & 7);
        Some(css_type(funct3, imm6, rs2 as u16, C_OP_Q2))
    }

    /// `c.jr` (`link = false`) and `c.jalr`.
    pub(super) fn jr(rs1: u32, link: bool) -> Option<u16> {
        if rs1 == 0 {
            return None;
        }
        Some(cr_type(if link { 0b1001 } else { 0b1000 }, rs1 as u16, 0, C_OP_Q2))
    }

    pub(super) fn mv(rd: u32, rs2: u32) -> Option<u16> {
        if rd == 0 || rs2 == 0 {
            return None;
        }
        Some(cr_type(0b1000, rd as u16, rs2 as u16, C_OP_Q2))
    }

    pub(super) fn add(rd: u32, rs2: u32) -> Option<u16> {
        if rd == 0 || rs2 == 0 {
            return None;
        }
        Some(cr_type(0b1001, rd as u16, rs2 as u16, C_OP_Q2))
    }

    pub(super) const EBREAK: u16 = 0x9002;
}

/// Compress a 32-bit instruction word.
///
/// Returns the 16-bit form whose expansion is exactly `word`, or `None`
/// when no compressed form fits.
pub fn compress(word: u32, xlen: Xlen) -> Option<u16> {
    let rv64 = xlen == Xlen::Rv64;
    let (rd, rs1, rs2, f3) = (rd(word), rs1(word), rs2(word), funct3(word));
    match opcode(word) {
        OP_IMM => {
            let imm = imm_i(word);
            match f3 {
                0 => {
                    if word == NOP {
                        return Some(C_NOP);
                    }
                    if rs1 == 0 {
                        return pack::li(rd, imm);
                    }
                    if rd == rs1 {
                        return pack::addi(rd, imm).or_else(|| {
                            if rd == SP {
                                pack::addi16sp(imm)
                            } else {
                                None
                            }
                        });
                    }
                    if rs1 == SP {
                        return pack::addi4spn(rd, imm);
                    }
                    None
                }
                1 if rd == rs1 && funct7(word) >> 1 == 0 => pack::slli(rd, (word >> 20) & 0x3F, xlen),
                5 if rd == rs1 => match funct7(word) >> 1 {
                    0b000000 => pack::shift_right(0, rd, (word >> 20) & 0x3F, xlen),
                    0b010000 => pack::shift_right(1, rd, (word >> 20) & 0x3F, xlen),
                    _ => None,
                },
                7 if rd == rs1 => pack::andi(rd, imm),
                _ => None,
            }
        }
        OP_IMM_W if rv64 && f3 == 0 && rd == rs1 => pack::addiw(rd, imm_i(word)),
        OP_LUI => pack::lui(rd, imm_u(word)),
        OP_REG => match (funct7(word), f3) {
            (0, 0) if rs1 == 0 => pack::mv(rd, rs2),
            (0, 0) if rd == rs1 => pack::add(rd, rs2),
            (0b0100000, 0) if rd == rs1 => pack::arith(0b100011, 0b00, rd, rs2),
            (0, 4) if rd == rs1 => pack::arith(0b100011, 0b01, rd, rs2),
            (0, 6) if rd == rs1 => pack::arith(0b100011, 0b10, rd, rs2),
            (0, 7) if rd == rs1 => pack::arith(0b100011, 0b11, rd, rs2),
            _ => None,
        },
        OP_REG_W if rv64 && rd == rs1 => match (funct7(word), f3) {
            (0b0100000, 0) => pack::arith(0b100111, 0b00, rd, rs2),
            (0, 0) => pack::arith(0b100111, 0b01, rd, rs2),
            _ => None,
        },
        OP_LOAD => {
            let off = imm_i(word);
            match f3 {
                2 if rs1 == SP => pack::lwsp(0b010, rd, off, true),
                2 => pack::mem_w(0b010, rd, rs1, off, C_OP_Q0),
                3 if rv64 && rs1 == SP => pack::ldsp(0b011, rd, off, true),
                3 if rv64 => pack::mem_d(0b011, rd, rs1, off, C_OP_Q0),
                _ => None,
            }
        }
        OP_LOAD_FP => {
            let off = imm_i(word);
            match f3 {
                2 if !rv64 && rs1 == SP => pack::lwsp(0b011, rd, off, false),
                2 if !rv64 => pack::mem_w(0b011, rd, rs1, off, C_OP_Q0),
                3 if rs1 == SP => pack::ldsp(0b001, rd, off, false),
                3 => pack::mem_d(0b001, rd, rs1, off, C_OP_Q0),
                _ => None,
            }
        }
        OP_STORE => {
            let off = imm_s(word);
            match f3 {
                2 if rs1 == SP => pack::swsp(0b110, rs2, off),
                2 => pack::mem_w(0b110, rs2, rs1, off, C_OP_Q0),
                3 if rv64 && rs1 == SP => pack::sdsp(0b111, rs2, off),
                3 if rv64 => pack::mem_d(0b111, rs2, rs1, off, C_OP_Q0),
                _ => None,
            }
        }
        OP_STORE_FP => {
            let off = imm_s(word);
            match f3 {
                2 if !rv64 && rs1 == SP => pack::swsp(0b111, rs2, off),
                2 if !rv64 => pack::mem_w(0b111, rs2, rs1, off, C_OP_Q0),
                3 if rs1 == SP => pack::sdsp(0b101, rs2, off),
                3 => pack::mem_d(0b101, rs2, rs1, off, C_OP_Q0),
                _ => None,
            }
        }
        OP_JAL => match rd {
            0 => pack::j(0b101, imm_j(word)),
            RA if !rv64 => pack::j(0b001, imm_j(word)),
            _ => None,
        },
        OP_JALR if f3 == 0 && imm_i(word) == 0 => match rd {
            0 => pack::jr(rs1, false),
            RA => pack::jr(rs1, true),
            _ => None,
        },
        OP_BRANCH if rs2 == 0 => match f3 {
            0 => pack::branch(0b110, rs1, imm_b(word)),
            1 => pack::branch(0b111, rs1, imm_b(word)),
            _ => None,
        },
        OP_SYSTEM if word == 0x0010_0073 => Some(pack::EBREAK),
        _ => None,
    }
}

/// Expand a 16-bit instruction to its 32-bit equivalent.
///
/// Returns `None` for illegal and reserved encodings and for halfwords
/// whose low two bits are `0b11` (not compressed).
pub fn expand(half: u16, xlen: Xlen) -> Option<u32> {
    if half == 0 {
        return None;
    }
    let rv64 = xlen == Xlen::Rv64;
    let h = half as u32;
    let f3 = (h >> 13) & 7;
    let rd_full = (h >> 7) & 0x1F;
    let rs2_full = (h >> 2) & 0x1F;
    let rd_p = ((h >> 2) & 7) + 8;
    let rs1_p = ((h >> 7) & 7) + 8;
    let ci_imm = sign_extend((((h >> 12) & 1) << 5 | ((h >> 2) & 0x1F)) as u64, 6);
    let ci_shamt = (((h >> 12) & 1) << 5) | ((h >> 2) & 0x1F);

    // CL/CS offsets.
    let off_w = (((h >> 10) & 7) << 3) | (((h >> 6) & 1) << 2) | (((h >> 5) & 1) << 6);
    let off_d = (((h >> 10) & 7) << 3) | (((h >> 5) & 3) << 6);

    match h & 3 {
        0b00 => match f3 {
            0b000 => {
                let imm = (((h >> 11) & 3) << 4) | (((h >> 7) & 0xF) << 6) | (((h >> 6) & 1) << 2) | (((h >> 5) & 1) << 3);
                if imm == 0 {
                    return None;
                }
                Some(i_type(OP_IMM, rd_p, 0, SP, imm as i32))
            }
            0b001 => Some(i_type(OP_LOAD_FP, rd_p, 3, rs1_p, off_d as i32)),
            0b010 => Some(i_type(OP_LOAD, rd_p, 2, rs1_p, off_w as i32)),
            0b011 if rv64 => Some(i_type(OP_LOAD, rd_p, 3, rs1_p, off_d as i32)),
            0b011 => Some(i_type(OP_LOAD_FP, rd_p, 2, rs1_p, off_w as i32)),
            0b101 => Some(s_type(OP_STORE_FP, 3, rs1_p, rd_p, off_d as i32)),
            0b110 => Some(s_type(OP_STORE, 2, rs1_p, rd_p, off_w as i32)),
            0b111 if rv64 => Some(s_type(OP_STORE, 3, rs1_p, rd_p, off_d as i32)),
            0b111 => Some(s_type(OP_STORE_FP, 2, rs1_p, rd_p, off_w as i32)),
            _ => None,
        },
        0b01 => match f3 {
            0b000 => Some(i_type(OP_IMM, rd_full, 0, rd_full, ci_imm as i32)),
            0b001 if rv64 => {
                if rd_full == 0 {
                    return None;
                }
                Some(i_type(OP_IMM_W, rd_full, 0, rd_full, ci_imm as i32))
            }
            0b001 => Some(j_type(RA, c_imm_cj(half) as i32)),
            0b010 => Some(i_type(OP_IMM, rd_full, 0, 0, ci_imm as i32)),
            0b011 if rd_full == SP => {
                let imm = (((h >> 12) & 1) << 9)
                    | (((h >> 6) & 1) << 4)
                    | (((h >> 5) & 1) << 6)
                    | (((h >> 3) & 3) << 7)
                    | (((h >> 2) & 1) << 5);
                let imm = sign_extend(imm as u64, 10);
                if imm == 0 {
                    return None;
                }
                Some(i_type(OP_IMM, SP, 0, SP, imm as i32))
            }
            0b011 => {
                if ci_imm == 0 {
                    return None;
                }
                Some(u_type(OP_LUI, rd_full, (ci_imm << 12) as u32))
            }
            0b100 => match (h >> 10) & 3 {
                0b00 | 0b01 => {
                    if !rv64 && ci_shamt >= 32 {
                        return None;
                    }
                    let funct6 = if (h >> 10) & 3 == 0 { 0 } else { 0b010000 };
                    Some(i_type(OP_IMM, rs1_p, 5, rs1_p, ((funct6 << 6) | ci_shamt) as i32))
                }
                0b10 => Some(i_type(OP_IMM, rs1_p, 7, rs1_p, ci_imm as i32)),
                _ => {
                    let rs2_p = rd_p;
                    match ((h >> 12) & 1, (h >> 5) & 3) {
                        (0, 0b00) => Some(r_type(OP_REG, rs1_p, 0, rs1_p, rs2_p, 0b0100000)),
                        (0, 0b01) => Some(r_type(OP_REG, rs1_p, 4, rs1_p, rs2_p, 0)),
                        (0, 0b10) => Some(r_type(OP_REG, rs1_p, 6, rs1_p, rs2_p, 0)),
                        (0, 0b11) => Some(r_type(OP_REG, rs1_p, 7, rs1_p, rs2_p, 0)),
                        (1, 0b00) if rv64 => Some(r_type(OP_REG_W, rs1_p, 0, rs1_p, rs2_p, 0b0100000)),
                        (1, 0b01) if rv64 => Some(r_type(OP_REG_W, rs1_p, 0, rs1_p, rs2_p, 0)),
                        _ => None,
                    }
                }
            },
            0b101 => Some(j_type(0, c_imm_cj(half) as i32)),
            0b110 => Some(b_type(0, rs1_p, 0, c_imm_cb(half) as i32)),
            _ => Some(b_type(1, rs1_p, 0, c_imm_cb(half) as i32)),
        },
        0b10 => match f3 {
            0b000 => {
                if !rv64 && ci_shamt >= 32 {
                    return None;
                }
                Some(i_type(OP_IMM, rd_full, 1, rd_full, ci_shamt as i32))
            }
            0b001 => {
                let off = (((h >> 12) & 1) << 5) | (((h >> 5) & 3) << 3) | (((h >> 2) & 7) << 6);
                Some(i_type(OP_LOAD_FP, rd_full, 3, SP, off as i32))
            }
            0b010 | 0b011 => {
                let off_w = (((h >> 12) & 1) << 5) | (((h >> 4) & 7) << 2) | (((h >> 2) & 3) << 6);
                let off_d = (((h >> 12) & 1) << 5) | (((h >> 5) & 3) << 3) | (((h >> 2) & 7) << 6);
                match (f3, rv64) {
                    (0b010, _) if rd_full != 0 => Some(i_type(OP_LOAD, rd_full, 2, SP, off_w as i32)),
                    (0b011, true) if rd_full != 0 => Some(i_type(OP_LOAD, rd_full, 3, SP, off_d as i32)),
                    (0b011, false) => Some(i_type(OP_LOAD_FP, rd_full, 2, SP, off_w as i32)),
                    _ => None,
                }
            }
            0b100 => match ((h >> 12) & 1, rd_full, rs2_full) {
                (0, 0, 0) => None,
                (0, rs1, 0) => Some(i_type(OP_JALR, 0, 0, rs1, 0)),
                (0, rd, rs2) => Some(r_type(OP_REG, rd, 0, 0, rs2, 0)),
                (_, 0, 0) => Some(0x0010_0073),
                (_, rs1, 0) => Some(i_type(OP_JALR, RA, 0, rs1, 0)),
                (_, rd, rs2) => Some(r_type(OP_REG, rd, 0, rd, rs2, 0)),
            },
            _ => {
                let off_w = (((h >> 9) & 0xF) << 2) | (((h >> 7) & 3) << 6);
                let off_d = (((h >> 10) & 7) << 3) | (((h >> 7) & 7) << 6);
                match (f3, rv64) {
                    (0b101, _) => Some(s_type(OP_STORE_FP, 3, SP, rs2_full, off_d as i32)),
                    (0b110, _) => Some(s_type(OP_STORE, 2, SP, rs2_full, off_w as i32)),
                    (_, true) => Some(s_type(OP_STORE, 3, SP, rs2_full, off_d as i32)),
                    (_, false) => Some(s_type(OP_STORE_FP, 2, SP, rs2_full, off_w as i32)),
                }
            }
        },
        _ => None,
    }
}

fn no_fit(mnemonic: &'static str) -> AsmError {
    AsmError::invalid(mnemonic, "operands do not fit the compressed encoding")
}

macro_rules! c_form {
    ($self:ident, $mn:literal, $packed:expr) => {{
        $self.require(ExtensionSet::C, $mn)?;
        let half = $packed.ok_or_else(|| no_fit($mn))?;
        $self.emit16(half);
        Ok(())
    }};
}

fn sp_offset(mnemonic: &'static str, addr: Address) -> Result<i64, AsmError> {
    if addr.base_register() != Register::Sp || addr.mode() != crate::operand::AddressMode::Offset {
        return Err(AsmError::invalid(mnemonic, "base register must be sp"));
    }
    Ok(addr.offset() as i64)
}

fn plain(mnemonic: &'static str, addr: Address) -> Result<(u32, i64), AsmError> {
    if addr.mode() != crate::operand::AddressMode::Offset {
        return Err(no_fit(mnemonic));
    }
    Ok((addr.base_register().num(), addr.offset() as i64))
}

/// Explicit compressed forms. Each fails with
/// [`AsmError::InvalidOperands`] when the operands do not fit.
impl Assembler {
    pub fn c_nop(&mut self) -> Result<(), AsmError> {
        c_form!(self, "c.nop", Some(C_NOP))
    }

    pub fn c_ebreak(&mut self) -> Result<(), AsmError> {
        c_form!(self, "c.ebreak", Some(pack::EBREAK))
    }

    pub fn c_lwsp(&mut self, rd: Register, addr: Address) -> Result<(), AsmError> {
        let off = sp_offset("c.lwsp", addr)?;
        c_form!(self, "c.lwsp", pack::lwsp(0b010, rd.num(), off, true))
    }

    pub fn c_ldsp(&mut self, rd: Register, addr: Address) -> Result<(), AsmError> {
        self.require_rv64("c.ldsp")?;
        let off = sp_offset("c.ldsp", addr)?;
        c_form!(self, "c.ldsp", pack::ldsp(0b011, rd.num(), off, true))
    }

    pub fn c_flwsp(&mut self, rd: FRegister, addr: Address) -> Result<(), AsmError> {
        if self.is_rv64() {
            return Err(AsmError::invalid("c.flwsp", "not available on RV64"));
        }
        self.require(ExtensionSet::F, "c.flwsp")?;
        let off = sp_offset("c.flwsp", addr)?;
        c_form!(self, "c.flwsp", pack::lwsp(0b011, rd.num(), off, false))
    }

    pub fn c_fldsp(&mut self, rd: FRegister, addr: Address) -> Result<(), AsmError> {
        self.require(ExtensionSet::D, "c.fldsp")?;
        let off = sp_offset("c.fldsp", addr)?;
        c_form!(self, "c.fldsp", pack::ldsp(0b001, rd.num(), off, false))
    }

    pub fn c_swsp(&mut self, rs2: Register, addr: Address) -> Result<(), AsmError> {
        let off = sp_offset("c.swsp", addr)?;
        c_form!(self, "c.swsp", pack::swsp(0b110, rs2.num(), off))
    }

    pub fn c_sdsp(&mut self, rs2: Register, addr: Address) -> Result<(), AsmError> {
        self.require_rv64("c.sdsp")?;
        let off = sp_offset("c.sdsp", addr)?;
        c_form!(self, "c.sdsp", pack::sdsp(0b111, rs2.num(), off))
    }

    pub fn c_fswsp(&mut self, rs2: FRegister, addr: Address) -> Result<(), AsmError> {
        if self.is_rv64() {
            return Err(AsmError::invalid("c.fswsp", "not available on RV64"));
        }
        self.require(ExtensionSet::F, "c.fswsp")?;
        let off = sp_offset("c.fswsp", addr)?;
        c_form!(self, "c.fswsp", pack::swsp(0b111, rs2.num(), off))
    }

    pub fn c_fsdsp(&mut self, rs2: FRegister, addr: Address) -> Result<(), AsmError> {
        self.require(ExtensionSet::D, "c.fsdsp")?;
        let off = sp_offset("c.fsdsp", addr)?;
        c_form!(self, "c.fsdsp", pack::sdsp(0b101, rs2.num(), off))
    }

    pub fn c_lw(&mut self, rd: Register, addr: Address) -> Result<(), AsmError> {
        let (base, off) = plain("c.lw", addr)?;
        c_form!(self, "c.lw", pack::mem_w(0b010, rd.num(), base, off, C_OP_Q0))
    }

    pub fn c_ld(&mut self, rd: Register, addr: Address) -> Result<(), AsmError> {
        self.require_rv64("c.ld")?;
        let (base, off) = plain("c.ld", addr)?;
        c_form!(self, "c.ld", pack::mem_d(0b011, rd.num(), base, off, C_OP_Q0))
    }

    pub fn c_flw(&mut self, rd: FRegister, addr: Address) -> Result<(), AsmError> {
        if self.is_rv64() {
            return Err(AsmError::invalid("c.flw", "not available on RV64"));
        }
        self.require(ExtensionSet::F, "c.flw")?;
        let (base, off) = plain("c.flw", addr)?;
        c_form!(self, "c.flw", pack::mem_w(0b011, rd.num(), base, off, C_OP_Q0))
    }

    pub fn c_fld(&mut self, rd: FRegister, addr: Address) -> Result<(), AsmError> {
        self.require(ExtensionSet::D, "c.fld")?;
        let (base, off) = plain("c.fld", addr)?;
        c_form!(self, "c.fld", pack::mem_d(0b001, rd.num(), base, off, C_OP_Q0))
    }

    pub fn c_sw(&mut self, rs2: Register, addr: Address) -> Result<(), AsmError> {
        let (base, off) = plain("c.sw", addr)?;
        c_form!(self, "c.sw", pack::mem_w(0b110, rs2.num(), base, off, C_OP_Q0))
    }

    pub fn c_sd(&mut self, rs2: Register, addr: Address) -> Result<(), AsmError> {
        self.require_rv64("c.sd")?;
        let (base, off) = plain("c.sd", addr)?;
        c_form!(self, "c.sd", pack::mem_d(0b111, rs2.num(), base, off, C_OP_Q0))
    }

    pub fn c_fsw(&mut self, rs2: FRegister, addr: Address) -> Result<(), AsmError> {
        if self.is_rv64() {
            return Err(AsmError::invalid("c.fsw", "not available on RV64"));
        }
        self.require(ExtensionSet::F, "c.fsw")?;
        let (base, off) = plain("c.fsw", addr)?;
        c_form!(self, "c.fsw", pack::mem_w(0b111, rs2.num(), base, off, C_OP_Q0))
    }

    pub fn c_fsd(&mut self, rs2: FRegister, addr: Address) -> Result<(), AsmError> {
        self.require(ExtensionSet::D, "c.fsd")?;
        let (base, off) = plain("c.fsd", addr)?;
        c_form!(self, "c.fsd", pack::mem_d(0b101, rs2.num(), base, off, C_OP_Q0))
    }

    pub fn c_jr(&mut self, rs1: Register) -> Result<(), AsmError> {
        c_form!(self, "c.jr", pack::jr(rs1.num(), false))
    }

    pub fn c_jalr(&mut self, rs1: Register) -> Result<(), AsmError> {
        c_form!(self, "c.jalr", pack::jr(rs1.num(), true))
    }

    pub fn c_li(&mut self, rd: Register, imm: i64) -> Result<(), AsmError> {
        c_form!(self, "c.li", pack::li(rd.num(), imm))
    }

    /// `imm` is the full value loaded by the equivalent `lui`.
    pub fn c_lui(&mut self, rd: Register, imm: i64) -> Result<(), AsmError> {
        c_form!(self, "c.lui", pack::lui(rd.num(), imm))
    }

    pub fn c_addi(&mut self, rd: Register, imm: i64) -> Result<(), AsmError> {
        c_form!(self, "c.addi", pack::addi(rd.num(), imm))
    }

    pub fn c_addiw(&mut self, rd: Register, imm: i64) -> Result<(), AsmError> {
        self.require_rv64("c.addiw")?;
        c_form!(self, "c.addiw", pack::addiw(rd.num(), imm))
    }

    pub fn c_addi16sp(&mut self, imm: i64) -> Result<(), AsmError> {
        c_form!(self, "c.addi16sp", pack::addi16sp(imm))
    }

    pub fn c_addi4spn(&mut self, rd: Register, imm: i64) -> Result<(), AsmError> {
        c_form!(self, "c.addi4spn", pack::addi4spn(rd.num(), imm))
    }

    pub fn c_slli(&mut self, rd: Register, shamt: u32) -> Result<(), AsmError> {
        let xlen = self.xlen();
        c_form!(self, "c.slli", pack::slli(rd.num(), shamt, xlen))
    }

    pub fn c_srli(&mut self, rd: Register, shamt: u32) -> Result<(), AsmError> {
        let xlen = self.xlen();
        c_form!(self, "c.srli", pack::shift_right(0, rd.num(), shamt, xlen))
    }

    pub fn c_srai(&mut self, rd: Register, shamt: u32) -> Result<(), AsmError> {
        let xlen = self.xlen();
        c_form!(self, "c.srai", pack::shift_right(1, rd.num(), shamt, xlen))
    }

    pub fn c_andi(&mut self, rd: Register, imm: i64) -> Result<(), AsmError> {
        c_form!(self, "c.andi", pack::andi(rd.num(), imm))
    }

    pub fn c_mv(&mut self, rd: Register, rs2: Register) -> Result<(), AsmError> {
        c_form!(self, "c.mv", pack::mv(rd.num(), rs2.num()))
    }

    pub fn c_add(&mut self, rd: Register, rs2: Register) -> Result<(), AsmError> {
        c_form!(self, "c.add", pack::add(rd.num(), rs2.num()))
    }

    pub fn c_sub(&mut self, rd: Register, rs2: Register) -> Result<(), AsmError> {
        c_form!(self, "c.sub", pack::arith(0b100011, 0b00, rd.num(), rs2.num()))
    }

    pub fn c_xor(&mut self, rd: Register, rs2: Register) -> Result<(), AsmError> {
        c_form!(self, "c.xor", pack::arith(0b100011, 0b01, rd.num(), rs2.num()))
    }

    pub fn c_or(&mut self, rd: Register, rs2: Register) -> Result<(), AsmError> {
        c_form!(self, "c.or", pack::arith(0b100011, 0b10, rd.num(), rs2.num()))
    }

    pub fn c_and(&mut self, rd: Register, rs2: Register) -> Result<(), AsmError> {
        c_form!(self, "c.and", pack::arith(0b100011, 0b11, rd.num(), rs2.num()))
    }

    pub fn c_subw(&mut self, rd: Register, rs2: Register) -> Result<(), AsmError> {
        self.require_rv64("c.subw")?;
        c_form!(self, "c.subw", pack::arith(0b100111, 0b00, rd.num(), rs2.num()))
    }

    pub fn c_addw(&mut self, rd: Register, rs2: Register) -> Result<(), AsmError> {
        self.require_rv64("c.addw")?;
        c_form!(self, "c.addw", pack::arith(0b100111, 0b01, rd.num(), rs2.num()))
    }
}

/// Blank `c.j`/`c.jal` awaiting a label fixup.
pub(crate) fn c_j_placeholder(link: bool) -> u16 {
    cj_type(if link { 0b001 } else { 0b101 }, 0)
}

/// Blank `c.beqz`/`c.bnez`; `None` when `rs1` is not compact.
pub(crate) fn c_branch_placeholder(bnez: bool, rs1: Register) -> Option<u16> {
    pack::branch(if bnez { 0b111 } else { 0b110 }, rs1.num(), 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::riscv::AssemblerOptions;
    use Register::*;

    fn halves(asm: &Assembler) -> alloc::vec::Vec<u16> {
        asm.bytes()
            .chunks(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect()
    }

    #[test]
    fn explicit_forms_known_encodings() {
        let mut a = Assembler::new(Xlen::Rv64);
        a.c_li(A0, 5).unwrap();
        a.c_addi(Sp, -16).unwrap();
        a.c_mv(A0, A1).unwrap();
        a.c_jr(Ra).unwrap();
        a.c_ldsp(Ra, Address::new(Sp, 8)).unwrap();
        a.c_sdsp(Ra, Address::new(Sp, 8)).unwrap();
        a.c_addi16sp(-64).unwrap();
        a.c_lw(A0, Address::new(A1, 4)).unwrap();
        a.c_sub(A0, A1).unwrap();
        assert_eq!(
            halves(&a),
            [0x4515, 0x1141, 0x852E, 0x8082, 0x60A2, 0xE406, 0x7139, 0x41C8, 0x8D0D]
        );
    }

    #[test]
    fn explicit_forms_reject_bad_operands() {
        let mut a = Assembler::new(Xlen::Rv64);
        assert!(matches!(
            a.c_addi(Zero, 1),
            Err(AsmError::InvalidOperands { mnemonic: "c.addi", .. })
        ));
        assert!(a.c_li(A0, 32).is_err());
        assert!(a.c_lw(A6, Address::new(A1, 0)).is_err());
        assert!(a.c_lw(A0, Address::new(A1, 2)).is_err());
        assert!(a.c_addi16sp(8).is_err());
        assert!(a.c_lui(Sp, 0x1000).is_err());
        assert!(a.c_jr(Zero).is_err());
        assert!(a.c_flw(FRegister::Fa0, Address::new(A1, 0)).is_err());
        assert_eq!(a.code_size(), 0);
    }

    #[test]
    fn explicit_forms_need_c() {
        let mut a = Assembler::with_options(
            AssemblerOptions::new(Xlen::Rv64).with_extensions(ExtensionSet::RV_G),
        );
        assert_eq!(
            a.c_nop(),
            Err(AsmError::UnsupportedExtension {
                mnemonic: "c.nop",
                extension: "C"
            })
        );
    }

    #[test]
    fn compress_expand_pairs() {
        let cases: &[(u32, u16)] = &[
            (0x0000_0013, 0x0001), // nop
            (0x0050_0513, 0x4515), // li a0, 5
            (0xFF01_0113, 0x1141), // addi sp, sp, -16
            (0x0000_8067, 0x8082), // ret
            (0x00B0_0533, 0x852E), // add a0, zero, a1
            (0x0081_3083, 0x60A2), // ld ra, 8(sp)
            (0x0011_3423, 0xE406), // sd ra, 8(sp)
            (0x0045_A503, 0x41C8), // lw a0, 4(a1)
            (0x0010_0073, 0x9002), // ebreak
        ];
        for &(word, half) in cases {
            assert_eq!(compress(word, Xlen::Rv64), Some(half), "{word:#010x}");
            assert_eq!(expand(half, Xlen::Rv64), Some(word), "{half:#06x}");
        }
    }

    #[test]
    fn no_substitution_when_operands_do_not_fit() {
        // addi a0, a1, 1: rd != rs1 and rs1 != sp
        assert_eq!(compress(0x0015_8513, Xlen::Rv64), None);
        // addi a0, a0, 64: immediate too wide
        assert_eq!(compress(0x0405_0513, Xlen::Rv64), None);
        // lw a6, 4(a1): rd not compact
        assert_eq!(compress(0x0045_A803, Xlen::Rv64), None);
        // ld on RV32 is not a thing
        assert_eq!(compress(0x0081_3083, Xlen::Rv32), None);
    }

    #[test]
    fn xlen_dependent_quadrants() {
        // jal ra, 8 compresses only on RV32.
        let jal = j_type(1, 8);
        let half = compress(jal, Xlen::Rv32).unwrap();
        assert_eq!(expand(half, Xlen::Rv32), Some(jal));
        assert_eq!(compress(jal, Xlen::Rv64), None);
        // The same quadrant-1 encoding is c.addiw on RV64.
        let addiw = i_type(OP_IMM_W, 10, 0, 10, 1);
        let half = compress(addiw, Xlen::Rv64).unwrap();
        assert_eq!(expand(half, Xlen::Rv64), Some(addiw));
    }

    #[test]
    fn reserved_encodings_do_not_expand() {
        assert_eq!(expand(0x0000, Xlen::Rv64), None);
        // c.addi4spn with zero immediate
        assert_eq!(expand(0x0004, Xlen::Rv64), None);
        // c.lui with zero immediate
        assert_eq!(expand(0x6501, Xlen::Rv64), None);
        // c.jr zero
        assert_eq!(expand(0x8002, Xlen::Rv64), None);
        // c.lwsp zero
        assert_eq!(expand(0x4002, Xlen::Rv64), None);
        // not compressed
        assert_eq!(expand(0x0013, Xlen::Rv64), None);
    }
}
