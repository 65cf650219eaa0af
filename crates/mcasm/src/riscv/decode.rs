//! Instruction decoder.
//!
//! Recognises every instruction the assembler can emit. Compressed
//! halfwords are expanded to their 32-bit equivalents first, so consumers
//! only ever see the base encodings.

use super::compressed::expand;
use super::format::*;
use super::isa::{MemoryOrder, RoundingMode, Xlen};

/// Operand shape of an [`Op`]; tells which fields of an [`Instruction`]
/// are meaningful and which register file they index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// `rd, imm` with `imm` the full upper value.
    Upper,
    /// `rd, offset`.
    Jump,
    /// `rd, imm(rs1)`.
    Jalr,
    /// `rs1, rs2, offset`.
    Branch,
    /// `rd, imm(rs1)`.
    Load,
    /// `rs2, imm(rs1)`.
    Store,
    /// `rd, rs1, imm`.
    RegImm,
    /// `rd, rs1, rs2`.
    Reg,
    /// `rd, rs1`.
    Unary,
    /// `pred, succ` in `imm`.
    Fence,
    /// No operands.
    Nullary,
    /// `rd, csr, rs1` with the CSR number in `imm`.
    Csr,
    /// `rd, csr, uimm` with the CSR number in `imm` and `uimm` in `rs1`.
    CsrImm,
    /// `rd, (rs1)`.
    LoadReserved,
    /// `rd, rs2, (rs1)`.
    Amo,
    /// `fd, imm(rs1)`.
    FLoad,
    /// `fs2, imm(rs1)`.
    FStore,
    /// `fd, fs1, fs2, rm`.
    FArith,
    /// `fd, fs1, fs2, fs3, rm`.
    FFused,
    /// `fd, fs1, fs2`.
    FSign,
    /// `fd, fs1, rm`.
    FUnary,
    /// `rd, fs1, fs2`.
    FCompare,
    /// `rd, fs1, rm`.
    FToInt,
    /// `fd, rs1, rm`.
    IntToF,
    /// `rd, fs1`.
    FMoveToInt,
    /// `fd, rs1`.
    FMoveFromInt,
}

macro_rules! ops {
    ($($variant:ident => ($name:literal, $layout:ident),)*) => {
        /// A decoded operation.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Op {
            $($variant,)*
        }

        impl Op {
            /// Assembly mnemonic.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Op::$variant => $name,)*
                }
            }

            /// Operand shape.
            pub const fn layout(self) -> Layout {
                match self {
                    $(Op::$variant => Layout::$layout,)*
                }
            }
        }
    };
}

ops! {
    Lui => ("lui", Upper),
    Auipc => ("auipc", Upper),
    Jal => ("jal", Jump),
    Jalr => ("jalr", Jalr),
    Beq => ("beq", Branch),
    Bne => ("bne", Branch),
    Blt => ("blt", Branch),
    Bge => ("bge", Branch),
    Bltu => ("bltu", Branch),
    Bgeu => ("bgeu", Branch),
    Lb => ("lb", Load),
    Lh => ("lh", Load),
    Lw => ("lw", Load),
    Ld => ("ld", Load),
    Lbu => ("lbu", Load),
    Lhu => ("lhu", Load),
    Lwu => ("lwu", Load),
    Sb => ("sb", Store),
    Sh => ("sh", Store),
    Sw => ("sw", Store),
    Sd => ("sd", Store),
    Addi => ("addi", RegImm),
    Slti => ("slti", RegImm),
    Sltiu => ("sltiu", RegImm),
    Xori => ("xori", RegImm),
    Ori => ("ori", RegImm),
    Andi => ("andi", RegImm),
    Slli => ("slli", RegImm),
    Srli => ("srli", RegImm),
    Srai => ("srai", RegImm),
    Add => ("add", Reg),
    Sub => ("sub", Reg),
    Sll => ("sll", Reg),
    Slt => ("slt", Reg),
    Sltu => ("sltu", Reg),
    Xor => ("xor", Reg),
    Srl => ("srl", Reg),
    Sra => ("sra", Reg),
    Or => ("or", Reg),
    And => ("and", Reg),
    Addiw => ("addiw", RegImm),
    Slliw => ("slliw", RegImm),
    Srliw => ("srliw", RegImm),
    Sraiw => ("sraiw", RegImm),
    Addw => ("addw", Reg),
    Subw => ("subw", Reg),
    Sllw => ("sllw", Reg),
    Srlw => ("srlw", Reg),
    Sraw => ("sraw", Reg),
    Fence => ("fence", Fence),
    FenceI => ("fence.i", Nullary),
    Ecall => ("ecall", Nullary),
    Ebreak => ("ebreak", Nullary),

    Mul => ("mul", Reg),
    Mulh => ("mulh", Reg),
    Mulhsu => ("mulhsu", Reg),
    Mulhu => ("mulhu", Reg),
    Div => ("div", Reg),
    Divu => ("divu", Reg),
    Rem => ("rem", Reg),
    Remu => ("remu", Reg),
    Mulw => ("mulw", Reg),
    Divw => ("divw", Reg),
    Divuw => ("divuw", Reg),
    Remw => ("remw", Reg),
    Remuw => ("remuw", Reg),

    LrW => ("lr.w", LoadReserved),
    ScW => ("sc.w", Amo),
    AmoswapW => ("amoswap.w", Amo),
    AmoaddW => ("amoadd.w", Amo),
    AmoxorW => ("amoxor.w", Amo),
    AmoandW => ("amoand.w", Amo),
    AmoorW => ("amoor.w", Amo),
    AmominW => ("amomin.w", Amo),
    AmomaxW => ("amomax.w", Amo),
    AmominuW => ("amominu.w", Amo),
    AmomaxuW => ("amomaxu.w", Amo),
    LrD => ("lr.d", LoadReserved),
    ScD => ("sc.d", Amo),
    AmoswapD => ("amoswap.d", Amo),
    AmoaddD => ("amoadd.d", Amo),
    AmoxorD => ("amoxor.d", Amo),
    AmoandD => ("amoand.d", Amo),
    AmoorD => ("amoor.d", Amo),
    AmominD => ("amomin.d", Amo),
    AmomaxD => ("amomax.d", Amo),
    AmominuD => ("amominu.d", Amo),
    AmomaxuD => ("amomaxu.d", Amo),

    Flw => ("flw", FLoad),
    Fsw => ("fsw", FStore),
    Fld => ("fld", FLoad),
    Fsd => ("fsd", FStore),
    FmaddS => ("fmadd.s", FFused),
    FmsubS => ("fmsub.s", FFused),
    FnmsubS => ("fnmsub.s", FFused),
    FnmaddS => ("fnmadd.s", FFused),
    FmaddD => ("fmadd.d", FFused),
    FmsubD => ("fmsub.d", FFused),
    FnmsubD => ("fnmsub.d", FFused),
    FnmaddD => ("fnmadd.d", FFused),
    FaddS => ("fadd.s", FArith),
    FsubS => ("fsub.s", FArith),
    FmulS => ("fmul.s", FArith),
    FdivS => ("fdiv.s", FArith),
    FaddD => ("fadd.d", FArith),
    FsubD => ("fsub.d", FArith),
    FmulD => ("fmul.d", FArith),
    FdivD => ("fdiv.d", FArith),
    FsqrtS => ("fsqrt.s", FUnary),
    FsqrtD => ("fsqrt.d", FUnary),
    FsgnjS => ("fsgnj.s", FSign),
    FsgnjnS => ("fsgnjn.s", FSign),
    FsgnjxS => ("fsgnjx.s", FSign),
    FsgnjD => ("fsgnj.d", FSign),
    FsgnjnD => ("fsgnjn.d", FSign),
    FsgnjxD => ("fsgnjx.d", FSign),
    FminS => ("fmin.s", FSign),
    FmaxS => ("fmax.s", FSign),
    FminD => ("fmin.d", FSign),
    FmaxD => ("fmax.d", FSign),
    FcvtSD => ("fcvt.s.d", FUnary),
    FcvtDS => ("fcvt.d.s", FUnary),
    FeqS => ("feq.s", FCompare),
    FltS => ("flt.s", FCompare),
    FleS => ("fle.s", FCompare),
    FeqD => ("feq.d", FCompare),
    FltD => ("flt.d", FCompare),
    FleD => ("fle.d", FCompare),
    FcvtWS => ("fcvt.w.s", FToInt),
    FcvtWuS => ("fcvt.wu.s", FToInt),
    FcvtLS => ("fcvt.l.s", FToInt),
    FcvtLuS => ("fcvt.lu.s", FToInt),
    FcvtWD => ("fcvt.w.d", FToInt),
    FcvtWuD => ("fcvt.wu.d", FToInt),
    FcvtLD => ("fcvt.l.d", FToInt),
    FcvtLuD => ("fcvt.lu.d", FToInt),
    FcvtSW => ("fcvt.s.w", IntToF),
    FcvtSWu => ("fcvt.s.wu", IntToF),
    FcvtSL => ("fcvt.s.l", IntToF),
    FcvtSLu => ("fcvt.s.lu", IntToF),
    FcvtDW => ("fcvt.d.w", IntToF),
    FcvtDWu => ("fcvt.d.wu", IntToF),
    FcvtDL => ("fcvt.d.l", IntToF),
    FcvtDLu => ("fcvt.d.lu", IntToF),
    FmvXW => ("fmv.x.w", FMoveToInt),
    FmvWX => ("fmv.w.x", FMoveFromInt),
    FmvXD => ("fmv.x.d", FMoveToInt),
    FmvDX => ("fmv.d.x", FMoveFromInt),
    FclassS => ("fclass.s", FMoveToInt),
    FclassD => ("fclass.d", FMoveToInt),

    Csrrw => ("csrrw", Csr),
    Csrrs => ("csrrs", Csr),
    Csrrc => ("csrrc", Csr),
    Csrrwi => ("csrrwi", CsrImm),
    Csrrsi => ("csrrsi", CsrImm),
    Csrrci => ("csrrci", CsrImm),

    AddUw => ("add.uw", Reg),
    Sh1add => ("sh1add", Reg),
    Sh2add => ("sh2add", Reg),
    Sh3add => ("sh3add", Reg),
    Sh1addUw => ("sh1add.uw", Reg),
    Sh2addUw => ("sh2add.uw", Reg),
    Sh3addUw => ("sh3add.uw", Reg),
    SlliUw => ("slli.uw", RegImm),

    Andn => ("andn", Reg),
    Orn => ("orn", Reg),
    Xnor => ("xnor", Reg),
    Clz => ("clz", Unary),
    Ctz => ("ctz", Unary),
    Cpop => ("cpop", Unary),
    Clzw => ("clzw", Unary),
    Ctzw => ("ctzw", Unary),
    Cpopw => ("cpopw", Unary),
    Max => ("max", Reg),
    Maxu => ("maxu", Reg),
    Min => ("min", Reg),
    Minu => ("minu", Reg),
    SextB => ("sext.b", Unary),
    SextH => ("sext.h", Unary),
    ZextH => ("zext.h", Unary),
    Rol => ("rol", Reg),
    Ror => ("ror", Reg),
    Rori => ("rori", RegImm),
    Rolw => ("rolw", Reg),
    Rorw => ("rorw", Reg),
    Roriw => ("roriw", RegImm),
    OrcB => ("orc.b", Unary),
    Rev8 => ("rev8", Unary),

    Bclr => ("bclr", Reg),
    Bclri => ("bclri", RegImm),
    Bext => ("bext", Reg),
    Bexti => ("bexti", RegImm),
    Binv => ("binv", Reg),
    Binvi => ("binvi", RegImm),
    Bset => ("bset", Reg),
    Bseti => ("bseti", RegImm),
}

/// A decoded instruction. Register fields hold raw register numbers;
/// [`Op::layout`] tells which ones apply and whether they index the
/// integer or the floating-point file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub op: Op,
    pub rd: u32,
    pub rs1: u32,
    pub rs2: u32,
    pub rs3: u32,
    /// Immediate, branch offset, shift amount or CSR number, sign-extended
    /// where the format is signed.
    pub imm: i64,
    /// Raw `funct3`, the rounding mode of FP operations.
    pub rm: u32,
    pub aq: bool,
    pub rl: bool,
}

impl Instruction {
    fn from_word(op: Op, word: u32, imm: i64) -> Self {
        Self {
            op,
            rd: rd(word),
            rs1: rs1(word),
            rs2: rs2(word),
            rs3: rs3(word),
            imm,
            rm: funct3(word),
            aq: (word >> 26) & 1 == 1,
            rl: (word >> 25) & 1 == 1,
        }
    }

    /// Rounding mode of an FP operation.
    pub fn rounding_mode(&self) -> Option<RoundingMode> {
        RoundingMode::from_bits(self.rm)
    }

    /// Ordering of an atomic.
    pub fn order(&self) -> MemoryOrder {
        MemoryOrder::from_bits(self.aq, self.rl)
    }
}

/// A decoded instruction together with its encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decoded {
    pub instruction: Instruction,
    /// Encoded length: 2 or 4.
    pub len: usize,
    /// The encoding as read, a halfword when compressed.
    pub raw: u32,
    /// The 32-bit equivalent of `raw`.
    pub word: u32,
}

impl Decoded {
    /// Whether the encoding was a compressed halfword.
    pub fn is_compressed(&self) -> bool {
        self.len == 2
    }
}

/// Decode the instruction at the start of `bytes`.
///
/// Returns `None` for truncated input, reserved or illegal encodings
/// (including the all-zero word), encodings longer than 32 bits and
/// RV64-only instructions when decoding RV32.
pub fn decode(bytes: &[u8], xlen: Xlen) -> Option<Decoded> {
    let half = u16::from_le_bytes([*bytes.first()?, *bytes.get(1)?]);
    if half & 3 != 3 {
        let word = expand(half, xlen)?;
        return Some(Decoded {
            instruction: decode_word(word, xlen)?,
            len: 2,
            raw: half as u32,
            word,
        });
    }
    let word = u32::from_le_bytes([half as u8, (half >> 8) as u8, *bytes.get(2)?, *bytes.get(3)?]);
    Some(Decoded {
        instruction: decode_word(word, xlen)?,
        len: 4,
        raw: word,
        word,
    })
}

/// Decode one 32-bit instruction word.
pub fn decode_word(word: u32, xlen: Xlen) -> Option<Instruction> {
    if word & 3 != 3 || word & 0x1C == 0x1C {
        return None;
    }
    let rv64 = xlen == Xlen::Rv64;
    let f3 = funct3(word);
    let f7 = funct7(word);
    let imm12 = word >> 20;
    let (op, imm) = match opcode(word) {
        OP_LUI => (Op::Lui, imm_u(word)),
        OP_AUIPC => (Op::Auipc, imm_u(word)),
        OP_JAL => (Op::Jal, imm_j(word)),
        OP_JALR if f3 == 0 => (Op::Jalr, imm_i(word)),
        OP_BRANCH => {
            let op = match f3 {
                0 => Op::Beq,
                1 => Op::Bne,
                4 => Op::Blt,
                5 => Op::Bge,
                6 => Op::Bltu,
                7 => Op::Bgeu,
                _ => return None,
            };
            (op, imm_b(word))
        }
        OP_LOAD => {
            let op = match (f3, rv64) {
                (0, _) => Op::Lb,
                (1, _) => Op::Lh,
                (2, _) => Op::Lw,
                (3, true) => Op::Ld,
                (4, _) => Op::Lbu,
                (5, _) => Op::Lhu,
                (6, true) => Op::Lwu,
                _ => return None,
            };
            (op, imm_i(word))
        }
        OP_STORE => {
            let op = match (f3, rv64) {
                (0, _) => Op::Sb,
                (1, _) => Op::Sh,
                (2, _) => Op::Sw,
                (3, true) => Op::Sd,
                _ => return None,
            };
            (op, imm_s(word))
        }
        OP_IMM => decode_op_imm(word, f3, imm12, rv64)?,
        OP_IMM_W if rv64 => decode_op_imm_w(word, f3, f7, imm12)?,
        OP_REG => (decode_op_reg(f3, f7, rs2(word), rv64)?, 0),
        OP_REG_W if rv64 => (decode_op_reg_w(f3, f7, rs2(word))?, 0),
        OP_FENCE => match f3 {
            0 => (Op::Fence, ((word >> 20) & 0xFF) as i64),
            1 => (Op::FenceI, 0),
            _ => return None,
        },
        OP_SYSTEM => {
            let op = match f3 {
                0 => match word {
                    0x0000_0073 => Op::Ecall,
                    0x0010_0073 => Op::Ebreak,
                    _ => return None,
                },
                1 => Op::Csrrw,
                2 => Op::Csrrs,
                3 => Op::Csrrc,
                5 => Op::Csrrwi,
                6 => Op::Csrrsi,
                7 => Op::Csrrci,
                _ => return None,
            };
            (op, imm12 as i64)
        }
        OP_AMO => (decode_amo(word, f3, rv64)?, 0),
        OP_LOAD_FP => match f3 {
            2 => (Op::Flw, imm_i(word)),
            3 => (Op::Fld, imm_i(word)),
            _ => return None,
        },
        OP_STORE_FP => match f3 {
            2 => (Op::Fsw, imm_s(word)),
            3 => (Op::Fsd, imm_s(word)),
            _ => return None,
        },
        OP_MADD | OP_MSUB | OP_NMSUB | OP_NMADD => {
            RoundingMode::from_bits(f3)?;
            let double = match (word >> 25) & 3 {
                0 => false,
                1 => true,
                _ => return None,
            };
            let op = match (opcode(word), double) {
                (OP_MADD, false) => Op::FmaddS,
                (OP_MSUB, false) => Op::FmsubS,
                (OP_NMSUB, false) => Op::FnmsubS,
                (OP_NMADD, false) => Op::FnmaddS,
                (OP_MADD, true) => Op::FmaddD,
                (OP_MSUB, true) => Op::FmsubD,
                (OP_NMSUB, true) => Op::FnmsubD,
                _ => Op::FnmaddD,
            };
            (op, 0)
        }
        OP_FP => (decode_op_fp(f3, f7, rs2(word), rv64)?, 0),
        _ => return None,
    };
    Some(Instruction::from_word(op, word, imm))
}

fn decode_op_imm(word: u32, f3: u32, imm12: u32, rv64: bool) -> Option<(Op, i64)> {
    let shamt = imm12 & 0x3F;
    if matches!(f3, 1 | 5) && !rv64 && shamt >= 32 {
        // shamt[5] is reserved on RV32
        return None;
    }
    let funct6 = imm12 >> 6;
    let shift = |op| Some((op, shamt as i64));
    match f3 {
        0 => Some((Op::Addi, imm_i(word))),
        2 => Some((Op::Slti, imm_i(word))),
        3 => Some((Op::Sltiu, imm_i(word))),
        4 => Some((Op::Xori, imm_i(word))),
        6 => Some((Op::Ori, imm_i(word))),
        7 => Some((Op::Andi, imm_i(word))),
        1 => match (imm12, funct6) {
            (0x600, _) => Some((Op::Clz, 0)),
            (0x601, _) => Some((Op::Ctz, 0)),
            (0x602, _) => Some((Op::Cpop, 0)),
            (0x604, _) => Some((Op::SextB, 0)),
            (0x605, _) => Some((Op::SextH, 0)),
            (_, 0b000000) => shift(Op::Slli),
            (_, 0b001010) => shift(Op::Bseti),
            (_, 0b010010) => shift(Op::Bclri),
            (_, 0b011010) => shift(Op::Binvi),
            _ => None,
        },
        _ => match (imm12, funct6) {
            (0x287, _) => Some((Op::OrcB, 0)),
            (0x6B8, _) if rv64 => Some((Op::Rev8, 0)),
            (0x698, _) if !rv64 => Some((Op::Rev8, 0)),
            (_, 0b000000) => shift(Op::Srli),
            (_, 0b010000) => shift(Op::Srai),
            (_, 0b011000) => shift(Op::Rori),
            (_, 0b010010) => shift(Op::Bexti),
            _ => None,
        },
    }
}

fn decode_op_imm_w(word: u32, f3: u32, f7: u32, imm12: u32) -> Option<(Op, i64)> {
    let shamt5 = (imm12 & 0x1F) as i64;
    match (f3, f7) {
        (0, _) => Some((Op::Addiw, imm_i(word))),
        (1, _) if imm12 == 0x600 => Some((Op::Clzw, 0)),
        (1, _) if imm12 == 0x601 => Some((Op::Ctzw, 0)),
        (1, _) if imm12 == 0x602 => Some((Op::Cpopw, 0)),
        (1, 0b0000000) => Some((Op::Slliw, shamt5)),
        (1, _) if imm12 >> 6 == 0b000010 => Some((Op::SlliUw, (imm12 & 0x3F) as i64)),
        (5, 0b0000000) => Some((Op::Srliw, shamt5)),
        (5, 0b0100000) => Some((Op::Sraiw, shamt5)),
        (5, 0b0110000) => Some((Op::Roriw, shamt5)),
        _ => None,
    }
}

fn decode_op_reg(f3: u32, f7: u32, rs2: u32, rv64: bool) -> Option<Op> {
    Some(match (f7, f3) {
        (0b0000000, 0) => Op::Add,
        (0b0100000, 0) => Op::Sub,
        (0b0000000, 1) => Op::Sll,
        (0b0000000, 2) => Op::Slt,
        (0b0000000, 3) => Op::Sltu,
        (0b0000000, 4) => Op::Xor,
        (0b0000000, 5) => Op::Srl,
        (0b0100000, 5) => Op::Sra,
        (0b0000000, 6) => Op::Or,
        (0b0000000, 7) => Op::And,
        (0b0000001, 0) => Op::Mul,
        (0b0000001, 1) => Op::Mulh,
        (0b0000001, 2) => Op::Mulhsu,
        (0b0000001, 3) => Op::Mulhu,
        (0b0000001, 4) => Op::Div,
        (0b0000001, 5) => Op::Divu,
        (0b0000001, 6) => Op::Rem,
        (0b0000001, 7) => Op::Remu,
        (0b0010000, 2) => Op::Sh1add,
        (0b0010000, 4) => Op::Sh2add,
        (0b0010000, 6) => Op::Sh3add,
        (0b0100000, 7) => Op::Andn,
        (0b0100000, 6) => Op::Orn,
        (0b0100000, 4) => Op::Xnor,
        (0b0000101, 4) => Op::Min,
        (0b0000101, 5) => Op::Minu,
        (0b0000101, 6) => Op::Max,
        (0b0000101, 7) => Op::Maxu,
        (0b0110000, 1) => Op::Rol,
        (0b0110000, 5) => Op::Ror,
        (0b0100100, 1) => Op::Bclr,
        (0b0100100, 5) => Op::Bext,
        (0b0110100, 1) => Op::Binv,
        (0b0010100, 1) => Op::Bset,
        (0b0000100, 4) if rs2 == 0 && !rv64 => Op::ZextH,
        _ => return None,
    })
}

fn decode_op_reg_w(f3: u32, f7: u32, rs2: u32) -> Option<Op> {
    Some(match (f7, f3) {
        (0b0000000, 0) => Op::Addw,
        (0b0100000, 0) => Op::Subw,
        (0b0000000, 1) => Op::Sllw,
        (0b0000000, 5) => Op::Srlw,
        (0b0100000, 5) => Op::Sraw,
        (0b0000001, 0) => Op::Mulw,
        (0b0000001, 4) => Op::Divw,
        (0b0000001, 5) => Op::Divuw,
        (0b0000001, 6) => Op::Remw,
        (0b0000001, 7) => Op::Remuw,
        (0b0000100, 0) => Op::AddUw,
        (0b0000100, 4) if rs2 == 0 => Op::ZextH,
        (0b0010000, 2) => Op::Sh1addUw,
        (0b0010000, 4) => Op::Sh2addUw,
        (0b0010000, 6) => Op::Sh3addUw,
        (0b0110000, 1) => Op::Rolw,
        (0b0110000, 5) => Op::Rorw,
        _ => return None,
    })
}

fn decode_amo(word: u32, f3: u32, rv64: bool) -> Option<Op> {
    let double = match (f3, rv64) {
        (2, _) => false,
        (3, true) => true,
        _ => return None,
    };
    let funct5 = word >> 27;
    if funct5 == 0b00010 && rs2(word) != 0 {
        return None;
    }
    let (w, d) = match funct5 {
        0b00010 => (Op::LrW, Op::LrD),
        0b00011 => (Op::ScW, Op::ScD),
        0b00001 => (Op::AmoswapW, Op::AmoswapD),
        0b00000 => (Op::AmoaddW, Op::AmoaddD),
        0b00100 => (Op::AmoxorW, Op::AmoxorD),
        0b01100 => (Op::AmoandW, Op::AmoandD),
        0b01000 => (Op::AmoorW, Op::AmoorD),
        0b10000 => (Op::AmominW, Op::AmominD),
        0b10100 => (Op::AmomaxW, Op::AmomaxD),
        0b11000 => (Op::AmominuW, Op::AmominuD),
        0b11100 => (Op::AmomaxuW, Op::AmomaxuD),
        _ => return None,
    };
    Some(if double { d } else { w })
}

fn decode_op_fp(f3: u32, f7: u32, rs2: u32, rv64: bool) -> Option<Op> {
    let double = match f7 & 3 {
        0 => false,
        1 => true,
        _ => return None,
    };
    let pick = |s: Op, d: Op| if double { d } else { s };
    let rounded = |op: Op| RoundingMode::from_bits(f3).map(|_| op);
    match f7 >> 2 {
        0b00000 => rounded(pick(Op::FaddS, Op::FaddD)),
        0b00001 => rounded(pick(Op::FsubS, Op::FsubD)),
        0b00010 => rounded(pick(Op::FmulS, Op::FmulD)),
        0b00011 => rounded(pick(Op::FdivS, Op::FdivD)),
        0b01011 if rs2 == 0 => rounded(pick(Op::FsqrtS, Op::FsqrtD)),
        0b00100 => match f3 {
            0 => Some(pick(Op::FsgnjS, Op::FsgnjD)),
            1 => Some(pick(Op::FsgnjnS, Op::FsgnjnD)),
            2 => Some(pick(Op::FsgnjxS, Op::FsgnjxD)),
            _ => None,
        },
        0b00101 => match f3 {
            0 => Some(pick(Op::FminS, Op::FminD)),
            1 => Some(pick(Op::FmaxS, Op::FmaxD)),
            _ => None,
        },
        0b01000 => match (double, rs2) {
            (false, 1) => rounded(Op::FcvtSD),
            (true, 0) => rounded(Op::FcvtDS),
            _ => None,
        },
        0b10100 => match f3 {
            0 => Some(pick(Op::FleS, Op::FleD)),
            1 => Some(pick(Op::FltS, Op::FltD)),
            2 => Some(pick(Op::FeqS, Op::FeqD)),
            _ => None,
        },
        0b11000 => {
            let op = match (rs2, rv64) {
                (0, _) => pick(Op::FcvtWS, Op::FcvtWD),
                (1, _) => pick(Op::FcvtWuS, Op::FcvtWuD),
                (2, true) => pick(Op::FcvtLS, Op::FcvtLD),
                (3, true) => pick(Op::FcvtLuS, Op::FcvtLuD),
                _ => return None,
            };
            rounded(op)
        }
        0b11010 => {
            let op = match (rs2, rv64) {
                (0, _) => pick(Op::FcvtSW, Op::FcvtDW),
                (1, _) => pick(Op::FcvtSWu, Op::FcvtDWu),
                (2, true) => pick(Op::FcvtSL, Op::FcvtDL),
                (3, true) => pick(Op::FcvtSLu, Op::FcvtDLu),
                _ => return None,
            };
            rounded(op)
        }
        0b11100 if rs2 == 0 => match (f3, double) {
            (0, false) => Some(Op::FmvXW),
            (0, true) if rv64 => Some(Op::FmvXD),
            (1, _) => Some(pick(Op::FclassS, Op::FclassD)),
            _ => None,
        },
        0b11110 if rs2 == 0 && f3 == 0 => match double {
            false => Some(Op::FmvWX),
            true if rv64 => Some(Op::FmvDX),
            true => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::riscv::{
        Assembler, AssemblerOptions, ExtensionSet, FRegister, MemoryOrder, Register::*,
    };

    fn one(word: u32) -> Instruction {
        decode_word(word, Xlen::Rv64).unwrap()
    }

    #[test]
    fn base_formats() {
        let ins = one(0x02A0_0513);
        assert_eq!((ins.op, ins.rd, ins.rs1, ins.imm), (Op::Addi, 10, 0, 42));
        let ins = one(0xFFDF_F06F);
        assert_eq!((ins.op, ins.rd, ins.imm), (Op::Jal, 0, -4));
        let ins = one(0x00B5_0863);
        assert_eq!((ins.op, ins.rs1, ins.rs2, ins.imm), (Op::Beq, 10, 11, 16));
        let ins = one(0x00B1_2423);
        assert_eq!((ins.op, ins.rs1, ins.rs2, ins.imm), (Op::Sw, 2, 11, 8));
        let ins = one(0x1234_5537);
        assert_eq!((ins.op, ins.imm), (Op::Lui, 0x1234_5000));
    }

    #[test]
    fn illegal_words() {
        assert_eq!(decode_word(0, Xlen::Rv64), None);
        assert_eq!(decode_word(0xFFFF_FFFF, Xlen::Rv64), None);
        // ld on RV32
        assert_eq!(decode_word(0x0081_3083, Xlen::Rv32), None);
        // slli a0, a0, 32 on RV32
        assert_eq!(decode_word(i_type(OP_IMM, 10, 1, 10, 32), Xlen::Rv32), None);
        // rounding mode 5 is reserved
        assert_eq!(decode_word(r_type(OP_FP, 1, 5, 2, 3, 0), Xlen::Rv64), None);
    }

    #[test]
    fn compressed_input_is_expanded() {
        let d = decode(&[0x82, 0x80], Xlen::Rv64).unwrap();
        assert!(d.is_compressed());
        assert_eq!(d.raw, 0x8082);
        assert_eq!(d.word, 0x0000_8067);
        assert_eq!(d.instruction.op, Op::Jalr);
        assert_eq!(decode(&[0x00, 0x00], Xlen::Rv64), None);
        assert_eq!(decode(&[0x13, 0x05], Xlen::Rv64), None);
        assert_eq!(decode(&[], Xlen::Rv64), None);
    }

    #[test]
    fn every_emitted_extension_decodes() {
        let mut asm = Assembler::with_options(
            AssemblerOptions::new(Xlen::Rv64).with_extensions(ExtensionSet::RV_GCB - ExtensionSet::C),
        );
        let addr = crate::riscv::Address::base(A1);
        asm.amoadd_d(A0, A2, addr, MemoryOrder::AcqRel).unwrap();
        asm.lr_w(A0, addr, MemoryOrder::Acquire).unwrap();
        asm.fmadd_d(FRegister::Fa0, FRegister::Fa1, FRegister::Fa2, FRegister::Fa3, RoundingMode::Rne)
            .unwrap();
        asm.fcvt_l_d(A0, FRegister::Fa0, RoundingMode::Rtz).unwrap();
        asm.csrrs(A0, crate::riscv::csr::FRM, Zero).unwrap();
        asm.rev8(A0, A1).unwrap();
        asm.slli_uw(A0, A1, 40).unwrap();
        asm.bexti(A0, A1, 63).unwrap();
        asm.zext_h(A0, A1).unwrap();
        asm.roriw(A0, A1, 7).unwrap();
        let ops: alloc::vec::Vec<_> = asm
            .bytes()
            .chunks(4)
            .map(|c| decode(c, Xlen::Rv64).map(|d| d.instruction.op))
            .collect();
        assert_eq!(
            ops,
            [
                Some(Op::AmoaddD),
                Some(Op::LrW),
                Some(Op::FmaddD),
                Some(Op::FcvtLD),
                Some(Op::Csrrs),
                Some(Op::Rev8),
                Some(Op::SlliUw),
                Some(Op::Bexti),
                Some(Op::ZextH),
                Some(Op::Roriw),
            ]
        );
        let amo = decode(&asm.bytes()[..4], Xlen::Rv64).unwrap().instruction;
        assert_eq!(amo.order(), MemoryOrder::AcqRel);
        let fcvt = decode(&asm.bytes()[12..16], Xlen::Rv64).unwrap().instruction;
        assert_eq!(fcvt.rounding_mode(), Some(RoundingMode::Rtz));
    }
}
