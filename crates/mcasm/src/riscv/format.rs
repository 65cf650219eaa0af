//! Bit-level instruction formats.
//!
//! ```text
//! R-type:  [funct7 | rs2 | rs1 | funct3 | rd  | opcode]
//! I-type:  [  imm[11:0]  | rs1 | funct3 | rd  | opcode]
//! S-type:  [imm[11:5]|rs2| rs1 | funct3 |imm[4:0]|opcode]
//! B-type:  [imm[12|10:5]|rs2|rs1|funct3|imm[4:1|11]|opcode]
//! U-type:  [      imm[31:12]             | rd  | opcode]
//! J-type:  [imm[20|10:1|11|19:12]        | rd  | opcode]
//! R4-type: [rs3 | fmt | rs2 | rs1 | rm | rd | opcode]
//! ```
//!
//! Compressed (C) formats, 16 bits:
//!
//! ```text
//! CR:  [funct4 | rd/rs1 | rs2 | op]
//! CI:  [funct3 | imm | rd/rs1 | imm | op]
//! CSS: [funct3 | imm | rs2 | op]
//! CIW: [funct3 | imm | rd' | op]
//! CL:  [funct3 | imm | rs1' | imm | rd' | op]
//! CS:  [funct3 | imm | rs1' | imm | rs2'| op]
//! CA:  [funct6 | rd'/rs1' | funct2 | rs2' | op]
//! CB:  [funct3 | offset | rs1' | offset | op]
//! CJ:  [funct3 | jump target | op]
//! ```

use crate::operand::sign_extend;

// ── Opcodes ─────────────────────────────────────────────────────────────

pub(crate) const OP_LUI: u32 = 0b011_0111;
pub(crate) const OP_AUIPC: u32 = 0b001_0111;
pub(crate) const OP_JAL: u32 = 0b110_1111;
pub(crate) const OP_JALR: u32 = 0b110_0111;
pub(crate) const OP_BRANCH: u32 = 0b110_0011;
pub(crate) const OP_LOAD: u32 = 0b000_0011;
pub(crate) const OP_STORE: u32 = 0b010_0011;
pub(crate) const OP_IMM: u32 = 0b001_0011;
pub(crate) const OP_REG: u32 = 0b011_0011;
pub(crate) const OP_IMM_W: u32 = 0b001_1011; // RV64I W-suffix immediate ops
pub(crate) const OP_REG_W: u32 = 0b011_1011; // RV64I W-suffix register ops
pub(crate) const OP_SYSTEM: u32 = 0b111_0011;
pub(crate) const OP_FENCE: u32 = 0b000_1111;
pub(crate) const OP_AMO: u32 = 0b010_1111;

pub(crate) const OP_LOAD_FP: u32 = 0b000_0111;
pub(crate) const OP_STORE_FP: u32 = 0b010_0111;
pub(crate) const OP_MADD: u32 = 0b100_0011;
pub(crate) const OP_MSUB: u32 = 0b100_0111;
pub(crate) const OP_NMSUB: u32 = 0b100_1011;
pub(crate) const OP_NMADD: u32 = 0b100_1111;
pub(crate) const OP_FP: u32 = 0b101_0011;

// C-extension quadrants (bits [1:0]).
pub(crate) const C_OP_Q0: u16 = 0b00;
pub(crate) const C_OP_Q1: u16 = 0b01;
pub(crate) const C_OP_Q2: u16 = 0b10;

/// Canonical `addi zero, zero, 0`.
pub(crate) const NOP: u32 = 0x0000_0013;
/// Canonical `c.nop`.
pub(crate) const C_NOP: u16 = 0x0001;

// ── 32-bit packers ──────────────────────────────────────────────────────

#[inline]
pub(crate) fn r_type(opcode: u32, rd: u32, funct3: u32, rs1: u32, rs2: u32, funct7: u32) -> u32 {
    (funct7 << 25) | (rs2 << 20) | (rs1 << 15) | (funct3 << 12) | (rd << 7) | opcode
}

#[inline]
pub(crate) fn i_type(opcode: u32, rd: u32, funct3: u32, rs1: u32, imm: i32) -> u32 {
    let imm = (imm as u32) & 0xFFF;
    (imm << 20) | (rs1 << 15) | (funct3 << 12) | (rd << 7) | opcode
}

#[inline]
pub(crate) fn s_type(opcode: u32, funct3: u32, rs1: u32, rs2: u32, imm: i32) -> u32 {
    let imm = imm as u32;
    let imm_hi = (imm >> 5) & 0x7F;
    let imm_lo = imm & 0x1F;
    (imm_hi << 25) | (rs2 << 20) | (rs1 << 15) | (funct3 << 12) | (imm_lo << 7) | opcode
}

#[inline]
pub(crate) fn b_type(funct3: u32, rs1: u32, rs2: u32, imm: i32) -> u32 {
    let imm = imm as u32;
    let bit12 = (imm >> 12) & 1;
    let bit11 = (imm >> 11) & 1;
    let bits10_5 = (imm >> 5) & 0x3F;
    let bits4_1 = (imm >> 1) & 0xF;
    (bit12 << 31)
        | (bits10_5 << 25)
        | (rs2 << 20)
        | (rs1 << 15)
        | (funct3 << 12)
        | (bits4_1 << 8)
        | (bit11 << 7)
        | OP_BRANCH
}

#[inline]
pub(crate) fn u_type(opcode: u32, rd: u32, imm: u32) -> u32 {
    (imm & 0xFFFF_F000) | (rd << 7) | opcode
}

#[inline]
pub(crate) fn j_type(rd: u32, imm: i32) -> u32 {
    let imm = imm as u32;
    let bit20 = (imm >> 20) & 1;
    let bits10_1 = (imm >> 1) & 0x3FF;
    let bit11 = (imm >> 11) & 1;
    let bits19_12 = (imm >> 12) & 0xFF;
    (bit20 << 31) | (bits10_1 << 21) | (bit11 << 20) | (bits19_12 << 12) | (rd << 7) | OP_JAL
}

/// `[funct5 | aq | rl | rs2 | rs1 | funct3 | rd | opcode]`
#[inline]
pub(crate) fn amo_type(
    funct5: u32,
    aq: bool,
    rl: bool,
    rs2: u32,
    rs1: u32,
    funct3: u32,
    rd: u32,
) -> u32 {
    (funct5 << 27)
        | ((aq as u32) << 26)
        | ((rl as u32) << 25)
        | (rs2 << 20)
        | (rs1 << 15)
        | (funct3 << 12)
        | (rd << 7)
        | OP_AMO
}

#[inline]
pub(crate) fn r4_type(opcode: u32, rd: u32, rm: u32, rs1: u32, rs2: u32, fmt: u32, rs3: u32) -> u32 {
    (rs3 << 27) | (fmt << 25) | (rs2 << 20) | (rs1 << 15) | (rm << 12) | (rd << 7) | opcode
}

// ── 32-bit field extractors ─────────────────────────────────────────────

#[inline]
pub(crate) const fn opcode(w: u32) -> u32 {
    w & 0x7F
}

#[inline]
pub(crate) const fn rd(w: u32) -> u32 {
    (w >> 7) & 0x1F
}

#[inline]
pub(crate) const fn funct3(w: u32) -> u32 {
    (w >> 12) & 0x7
}

#[inline]
pub(crate) const fn rs1(w: u32) -> u32 {
    (w >> 15) & 0x1F
}

#[inline]
pub(crate) const fn rs2(w: u32) -> u32 {
    (w >> 20) & 0x1F
}

#[inline]
pub(crate) const fn rs3(w: u32) -> u32 {
    w >> 27
}

#[inline]
pub(crate) const fn funct7(w: u32) -> u32 {
    w >> 25
}

#[inline]
pub(crate) const fn imm_i(w: u32) -> i64 {
    sign_extend((w >> 20) as u64, 12)
}

#[inline]
pub(crate) const fn imm_s(w: u32) -> i64 {
    sign_extend((((w >> 25) << 5) | ((w >> 7) & 0x1F)) as u64, 12)
}

#[inline]
pub(crate) const fn imm_b(w: u32) -> i64 {
    let v = ((w >> 31) << 12)
        | (((w >> 7) & 1) << 11)
        | (((w >> 25) & 0x3F) << 5)
        | (((w >> 8) & 0xF) << 1);
    sign_extend(v as u64, 13)
}

#[inline]
pub(crate) const fn imm_u(w: u32) -> i64 {
    (w & 0xFFFF_F000) as i32 as i64
}

#[inline]
pub(crate) const fn imm_j(w: u32) -> i64 {
    let v = ((w >> 31) << 20)
        | (((w >> 12) & 0xFF) << 12)
        | (((w >> 20) & 1) << 11)
        | (((w >> 21) & 0x3FF) << 1);
    sign_extend(v as u64, 21)
}

// ── Field patchers (fixup resolution) ───────────────────────────────────

/// Replace the B-type immediate of `word`.
#[inline]
pub(crate) fn patch_b(word: u32, imm: i32) -> u32 {
    let imm = imm as u32;
    let packed_hi = ((imm & 0x1000) << 19) | ((imm & 0x7E0) << 20);
    let packed_lo = ((imm & 0x1E) << 7) | ((imm & 0x800) >> 4);
    (word & 0x01FF_F07F) | packed_hi | packed_lo
}

/// Replace the J-type immediate of `word`.
#[inline]
pub(crate) fn patch_j(word: u32, imm: i32) -> u32 {
    let imm = imm as u32;
    let packed = ((imm & 0x0010_0000) << 11)
        | ((imm & 0x7FE) << 20)
        | ((imm & 0x800) << 9)
        | (imm & 0x000F_F000);
    (word & 0xFFF) | packed
}

/// Replace the U-type immediate of `word` with `hi20`.
#[inline]
pub(crate) fn patch_u(word: u32, hi20: u32) -> u32 {
    (word & 0xFFF) | (hi20 << 12)
}

/// Replace the I-type immediate of `word`.
#[inline]
pub(crate) fn patch_i(word: u32, imm: i32) -> u32 {
    (word & 0x000F_FFFF) | (((imm as u32) & 0xFFF) << 20)
}

/// Split a PC-relative displacement into an `auipc` upper part and a
/// sign-extended 12-bit lower part: `(hi20 << 12) + lo12 == rel`.
#[inline]
pub(crate) fn split_hi_lo(rel: i64) -> (u32, i32) {
    let hi20 = ((rel + 0x800) >> 12) as u32 & 0xF_FFFF;
    let lo12 = (rel as i32).wrapping_sub((hi20 << 12) as i32);
    (hi20, lo12)
}

// ── 16-bit packers ──────────────────────────────────────────────────────

/// Map a full register number (x8–x15) to its 3-bit compressed encoding.
#[inline]
pub(crate) fn compact_reg(r: u32) -> Option<u16> {
    if (8..=15).contains(&r) {
        Some((r - 8) as u16)
    } else {
        None
    }
}

#[inline]
pub(crate) fn cr_type(funct4: u16, rd_rs1: u16, rs2: u16, op: u16) -> u16 {
    (funct4 << 12) | (rd_rs1 << 7) | (rs2 << 2) | op
}

#[inline]
pub(crate) fn ci_type(funct3: u16, imm_bit5: u16, rd_rs1: u16, imm_lo5: u16, op: u16) -> u16 {
    (funct3 << 13) | ((imm_bit5 & 1) << 12) | (rd_rs1 << 7) | ((imm_lo5 & 0x1F) << 2) | op
}

#[inline]
pub(crate) fn css_type(funct3: u16, imm6: u16, rs2: u16, op: u16) -> u16 {
    (funct3 << 13) | ((imm6 & 0x3F) << 7) | (rs2 << 2) | op
}

#[inline]
pub(crate) fn ciw_type(funct3: u16, imm8: u16, rd_p: u16, op: u16) -> u16 {
    (funct3 << 13) | ((imm8 & 0xFF) << 5) | ((rd_p & 7) << 2) | op
}

#[inline]
pub(crate) fn cl_type(funct3: u16, imm_hi3: u16, rs1_p: u16, imm_lo2: u16, rd_p: u16, op: u16) -> u16 {
    (funct3 << 13)
        | ((imm_hi3 & 7) << 10)
        | ((rs1_p & 7) << 7)
        | ((imm_lo2 & 3) << 5)
        | ((rd_p & 7) << 2)
        | op
}

/// CS and CL share one layout.
#[inline]
pub(crate) fn cs_type(funct3: u16, imm_hi3: u16, rs1_p: u16, imm_lo2: u16, rs2_p: u16, op: u16) -> u16 {
    cl_type(funct3, imm_hi3, rs1_p, imm_lo2, rs2_p, op)
}

#[inline]
pub(crate) fn ca_type(funct6: u16, rd_rs1_p: u16, funct2: u16, rs2_p: u16, op: u16) -> u16 {
    (funct6 << 10) | ((rd_rs1_p & 7) << 7) | ((funct2 & 3) << 5) | ((rs2_p & 7) << 2) | op
}

/// `[funct3(3) | offset[8|4:3](3) | rs1'(3) | offset[7:6|2:1|5](5) | op(2)]`
#[inline]
pub(crate) fn cb_type(funct3: u16, rs1_p: u16, offset: i32) -> u16 {
    (funct3 << 13) | ((rs1_p & 7) << 7) | cb_offset_bits(offset) | C_OP_Q1
}

#[inline]
pub(crate) fn cb_offset_bits(offset: i32) -> u16 {
    let off = offset as u16;
    (((off >> 8) & 1) << 12)
        | (((off >> 3) & 3) << 10)
        | (((off >> 6) & 3) << 5)
        | (((off >> 1) & 3) << 3)
        | (((off >> 5) & 1) << 2)
}

/// `[funct3(3) | jump_target[11|4|9:8|10|6|7|3:1|5](11) | op(2)]`
#[inline]
pub(crate) fn cj_type(funct3: u16, offset: i32) -> u16 {
    (funct3 << 13) | cj_offset_bits(offset) | C_OP_Q1
}

#[inline]
pub(crate) fn cj_offset_bits(offset: i32) -> u16 {
    let off = offset as u16;
    (((off >> 11) & 1) << 12)
        | (((off >> 4) & 1) << 11)
        | (((off >> 8) & 3) << 9)
        | (((off >> 10) & 1) << 8)
        | (((off >> 6) & 1) << 7)
        | (((off >> 7) & 1) << 6)
        | (((off >> 1) & 7) << 3)
        | (((off >> 5) & 1) << 2)
}

/// Replace the CB-type branch offset of `half`.
#[inline]
pub(crate) fn patch_cb(half: u16, offset: i32) -> u16 {
    (half & 0xE383) | cb_offset_bits(offset)
}

/// Replace the CJ-type jump offset of `half`.
#[inline]
pub(crate) fn patch_cj(half: u16, offset: i32) -> u16 {
    (half & 0xE003) | cj_offset_bits(offset)
}

// ── 16-bit field extractors ─────────────────────────────────────────────

#[inline]
pub(crate) const fn c_imm_cb(h: u16) -> i64 {
    let h = h as u32;
    let v = (((h >> 12) & 1) << 8)
        | (((h >> 10) & 3) << 3)
        | (((h >> 5) & 3) << 6)
        | (((h >> 3) & 3) << 1)
        | (((h >> 2) & 1) << 5);
    sign_extend(v as u64, 9)
}

#[inline]
pub(crate) const fn c_imm_cj(h: u16) -> i64 {
    let h = h as u32;
    let v = (((h >> 12) & 1) << 11)
        | (((h >> 11) & 1) << 4)
        | (((h >> 9) & 3) << 8)
        | (((h >> 8) & 1) << 10)
        | (((h >> 7) & 1) << 6)
        | (((h >> 6) & 1) << 7)
        | (((h >> 3) & 7) << 1)
        | (((h >> 2) & 1) << 5);
    sign_extend(v as u64, 12)
}
