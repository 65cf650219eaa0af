//! Text disassembly.
//!
//! One line per instruction: the encoding as a right-aligned, 8-column
//! hex field (4 digits for compressed forms) followed by the mnemonic
//! text. Standard aliases (`li`, `mv`, `ret`, `beqz`, ...) replace the base
//! instruction when they apply and branch targets print as signed offsets
//! relative to the instruction.

use alloc::format;
use alloc::string::{String, ToString};
use core::fmt::Write;

use super::decode::{decode, Decoded, Instruction, Layout, Op};
use super::isa::{csr, FenceSet, RoundingMode, Xlen};
use super::registers::{FRegister, Register};
use crate::buffer::{Comment, Region, RegionKind};

/// Formats decoded instructions and whole code ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Disassembler {
    xlen: Xlen,
}

fn x(n: u32) -> &'static str {
    Register::from_num(n).map_or("?", Register::name)
}

fn f(n: u32) -> &'static str {
    FRegister::from_num(n).map_or("?", FRegister::name)
}

fn csr_name(number: i64) -> String {
    csr::name(number as u32).map_or_else(|| format!("{number:#x}"), ToString::to_string)
}

/// `s` or `d`, from the mnemonic.
fn fmt_suffix(op: Op) -> &'static str {
    let name = op.name();
    &name[name.len() - 1..]
}

fn alias(ins: &Instruction) -> Option<String> {
    let (rd, rs1, rs2, imm) = (ins.rd, ins.rs1, ins.rs2, ins.imm);
    Some(match ins.op {
        Op::Addi if rd == 0 && rs1 == 0 && imm == 0 => "nop".to_string(),
        Op::Addi if rs1 == 0 => format!("li {}, {}", x(rd), imm),
        Op::Addi if imm == 0 => format!("mv {}, {}", x(rd), x(rs1)),
        Op::Add if rs1 == 0 => format!("mv {}, {}", x(rd), x(rs2)),
        Op::Addiw if imm == 0 => format!("sext.w {}, {}", x(rd), x(rs1)),
        Op::Xori if imm == -1 => format!("not {}, {}", x(rd), x(rs1)),
        Op::Andi if imm == 0xFF => format!("zext.b {}, {}", x(rd), x(rs1)),
        Op::Sub if rs1 == 0 => format!("neg {}, {}", x(rd), x(rs2)),
        Op::Subw if rs1 == 0 => format!("negw {}, {}", x(rd), x(rs2)),
        Op::Sltiu if imm == 1 => format!("seqz {}, {}", x(rd), x(rs1)),
        Op::Sltu if rs1 == 0 => format!("snez {}, {}", x(rd), x(rs2)),
        Op::Slt if rs2 == 0 => format!("sltz {}, {}", x(rd), x(rs1)),
        Op::Slt if rs1 == 0 => format!("sgtz {}, {}", x(rd), x(rs2)),
        Op::Jal if rd == 0 => format!("j {imm:+}"),
        Op::Jal if rd == 1 => format!("jal {imm:+}"),
        Op::Jalr if rd == 0 && rs1 == 1 && imm == 0 => "ret".to_string(),
        Op::Jalr if rd == 0 && imm == 0 => format!("jr {}", x(rs1)),
        Op::Jalr if rd == 1 && imm == 0 => format!("jalr {}", x(rs1)),
        Op::Beq if rs2 == 0 => format!("beqz {}, {imm:+}", x(rs1)),
        Op::Bne if rs2 == 0 => format!("bnez {}, {imm:+}", x(rs1)),
        Op::Blt if rs2 == 0 => format!("bltz {}, {imm:+}", x(rs1)),
        Op::Bge if rs2 == 0 => format!("bgez {}, {imm:+}", x(rs1)),
        Op::Blt if rs1 == 0 => format!("bgtz {}, {imm:+}", x(rs2)),
        Op::Bge if rs1 == 0 => format!("blez {}, {imm:+}", x(rs2)),
        Op::Csrrs if rs1 == 0 => format!("csrr {}, {}", x(rd), csr_name(imm)),
        Op::Csrrw if rd == 0 => format!("csrw {}, {}", csr_name(imm), x(rs1)),
        Op::Csrrs if rd == 0 => format!("csrs {}, {}", csr_name(imm), x(rs1)),
        Op::Csrrc if rd == 0 => format!("csrc {}, {}", csr_name(imm), x(rs1)),
        Op::FsgnjS | Op::FsgnjD if rs1 == rs2 => {
            format!("fmv.{} {}, {}", fmt_suffix(ins.op), f(rd), f(rs1))
        }
        Op::FsgnjnS | Op::FsgnjnD if rs1 == rs2 => {
            format!("fneg.{} {}, {}", fmt_suffix(ins.op), f(rd), f(rs1))
        }
        Op::FsgnjxS | Op::FsgnjxD if rs1 == rs2 => {
            format!("fabs.{} {}, {}", fmt_suffix(ins.op), f(rd), f(rs1))
        }
        Op::Fence if imm == 0xFF => "fence".to_string(),
        _ => return None,
    })
}

fn with_rounding(mut text: String, ins: &Instruction) -> String {
    if let Some(rm) = ins.rounding_mode().filter(|rm| *rm != RoundingMode::Dyn) {
        text.push_str(", ");
        text.push_str(rm.name());
    }
    text
}

/// Mnemonic text of one instruction.
pub fn format_instruction(ins: &Instruction) -> String {
    if let Some(text) = alias(ins) {
        return text;
    }
    let (rd, rs1, rs2, imm) = (ins.rd, ins.rs1, ins.rs2, ins.imm);
    let name = ins.op.name();
    match ins.op.layout() {
        Layout::Upper => format!("{name} {}, {:#x}", x(rd), (imm >> 12) & 0xF_FFFF),
        Layout::Jump => format!("{name} {}, {imm:+}", x(rd)),
        Layout::Jalr | Layout::Load => format!("{name} {}, {imm}({})", x(rd), x(rs1)),
        Layout::Branch => format!("{name} {}, {}, {imm:+}", x(rs1), x(rs2)),
        Layout::Store => format!("{name} {}, {imm}({})", x(rs2), x(rs1)),
        Layout::RegImm => format!("{name} {}, {}, {imm}", x(rd), x(rs1)),
        Layout::Reg => format!("{name} {}, {}, {}", x(rd), x(rs1), x(rs2)),
        Layout::Unary => format!("{name} {}, {}", x(rd), x(rs1)),
        Layout::Fence => format!(
            "{name} {}, {}",
            FenceSet::from_bits_truncate((imm >> 4) as u32 & 0xF),
            FenceSet::from_bits_truncate(imm as u32 & 0xF)
        ),
        Layout::Nullary => name.to_string(),
        Layout::Csr => format!("{name} {}, {}, {}", x(rd), csr_name(imm), x(rs1)),
        Layout::CsrImm => format!("{name} {}, {}, {rs1}", x(rd), csr_name(imm)),
        Layout::LoadReserved => {
            format!("{name}{} {}, ({})", ins.order().suffix(), x(rd), x(rs1))
        }
        Layout::Amo => format!(
            "{name}{} {}, {}, ({})",
            ins.order().suffix(),
            x(rd),
            x(rs2),
            x(rs1)
        ),
        Layout::FLoad => format!("{name} {}, {imm}({})", f(rd), x(rs1)),
        Layout::FStore => format!("{name} {}, {imm}({})", f(rs2), x(rs1)),
        Layout::FArith => with_rounding(format!("{name} {}, {}, {}", f(rd), f(rs1), f(rs2)), ins),
        Layout::FFused => with_rounding(
            format!("{name} {}, {}, {}, {}", f(rd), f(rs1), f(rs2), f(ins.rs3)),
            ins,
        ),
        Layout::FSign => format!("{name} {}, {}, {}", f(rd), f(rs1), f(rs2)),
        Layout::FUnary => with_rounding(format!("{name} {}, {}", f(rd), f(rs1)), ins),
        Layout::FCompare => format!("{name} {}, {}, {}", x(rd), f(rs1), f(rs2)),
        Layout::FToInt => with_rounding(format!("{name} {}, {}", x(rd), f(rs1)), ins),
        Layout::IntToF => with_rounding(format!("{name} {}, {}", f(rd), x(rs1)), ins),
        Layout::FMoveToInt => format!("{name} {}, {}", x(rd), f(rs1)),
        Layout::FMoveFromInt => format!("{name} {}, {}", f(rd), x(rs1)),
    }
}

fn hex_field(raw: u32, len: usize) -> String {
    match len {
        1 => format!("{raw:02x}"),
        2 => format!("{raw:04x}"),
        _ => format!("{raw:08x}"),
    }
}

fn write_line(out: &mut String, raw: u32, len: usize, text: &str) {
    // Writing to a String cannot fail.
    let _ = writeln!(out, "{:>8}  {}", hex_field(raw, len), text);
}

/// Emit the next data unit of `bytes`: a word, then a halfword, then a byte.
fn write_data(out: &mut String, bytes: &[u8]) -> usize {
    match bytes {
        [a, b, c, d, ..] => {
            let word = u32::from_le_bytes([*a, *b, *c, *d]);
            write_line(out, word, 4, &format!(".word {word:#010x}"));
            4
        }
        [a, b, ..] => {
            let half = u16::from_le_bytes([*a, *b]) as u32;
            write_line(out, half, 2, &format!(".short {half:#06x}"));
            2
        }
        [a, ..] => {
            write_line(out, *a as u32, 1, &format!(".byte {:#04x}", a));
            1
        }
        [] => 0,
    }
}

impl Disassembler {
    /// Disassembler for `xlen` code.
    pub fn new(xlen: Xlen) -> Self {
        Self { xlen }
    }

    /// Register width the decoder assumes.
    pub fn xlen(&self) -> Xlen {
        self.xlen
    }

    /// Decode the instruction at the start of `bytes` and return its
    /// length together with its mnemonic text.
    pub fn instruction(&self, bytes: &[u8]) -> Option<(usize, String)> {
        decode(bytes, self.xlen).map(|d| (d.len, format_instruction(&d.instruction)))
    }

    /// One line for a decoded instruction.
    pub fn line(&self, decoded: &Decoded) -> String {
        let mut out = String::new();
        write_line(
            &mut out,
            decoded.raw,
            decoded.len,
            &format_instruction(&decoded.instruction),
        );
        out
    }

    fn write_instruction(&self, out: &mut String, bytes: &[u8]) -> usize {
        if let Some(d) = decode(bytes, self.xlen) {
            write_line(out, d.raw, d.len, &format_instruction(&d.instruction));
            return d.len;
        }
        match bytes {
            [0, 0, 0, 0, ..] => {
                write_line(out, 0, 4, "trap");
                4
            }
            [lo, ..] if lo & 3 != 3 => write_data(out, &bytes[..bytes.len().min(2)]),
            _ => write_data(out, bytes),
        }
    }

    /// Disassemble raw bytes, treating them all as instructions.
    pub fn disassemble_bytes(&self, bytes: &[u8]) -> String {
        self.disassemble(bytes, &[], &[], 0, bytes.len())
    }

    /// Disassemble `bytes[start..end]`, following `regions` to tell
    /// instructions from inline data and interleaving `comments` as
    /// `;; text` lines. Bytes outside every region are treated as
    /// instructions.
    pub fn disassemble(
        &self,
        bytes: &[u8],
        regions: &[Region],
        comments: &[Comment],
        start: usize,
        end: usize,
    ) -> String {
        let end = end.min(bytes.len());
        let mut out = String::new();
        let mut notes = comments
            .iter()
            .filter(|c| c.offset >= start && c.offset <= end)
            .peekable();
        let mut pos = start;
        while pos < end {
            while let Some(note) = notes.next_if(|c| c.offset <= pos) {
                let _ = writeln!(out, ";; {}", note.text);
            }
            let (kind, limit) = match regions.iter().find(|r| r.start <= pos && pos < r.end()) {
                Some(r) => (r.kind, r.end().min(end)),
                None => (
                    RegionKind::Instruction,
                    regions
                        .iter()
                        .map(|r| r.start)
                        .filter(|s| *s > pos)
                        .min()
                        .unwrap_or(end)
                        .min(end),
                ),
            };
            let unit = match kind {
                RegionKind::Instruction => self.write_instruction(&mut out, &bytes[pos..limit]),
                RegionKind::Data => write_data(&mut out, &bytes[pos..limit]),
            };
            pos += unit;
        }
        for note in notes {
            let _ = writeln!(out, ";; {}", note.text);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::riscv::{
        Address, Assembler, AssemblerOptions, ExtensionSet, FRegister::*, JumpDistance, MemoryOrder,
        Register::*,
    };

    fn rv64g() -> Assembler {
        Assembler::with_options(AssemblerOptions::new(Xlen::Rv64).with_extensions(ExtensionSet::RV_GCB - ExtensionSet::C))
    }

    fn text(asm: &Assembler) -> String {
        Disassembler::new(asm.xlen()).disassemble_bytes(asm.bytes())
    }

    #[test]
    fn aliases() {
        let mut asm = rv64g();
        asm.addi(A0, Zero, 42).unwrap();
        asm.addi(A1, A0, 0).unwrap();
        asm.addi(Zero, Zero, 0).unwrap();
        asm.xori(A0, A0, -1).unwrap();
        asm.sub(A0, Zero, A1).unwrap();
        asm.sltiu(A0, A1, 1).unwrap();
        asm.sltu(A0, Zero, A1).unwrap();
        asm.jalr(Zero, Ra, 0).unwrap();
        asm.jalr(Zero, T0, 0).unwrap();
        assert_eq!(
            text(&asm),
            "02a00513  li a0, 42\n\
             00050593  mv a1, a0\n\
             00000013  nop\n\
             fff54513  not a0, a0\n\
             40b00533  neg a0, a1\n\
             0015b513  seqz a0, a1\n\
             00b03533  snez a0, a1\n\
             00008067  ret\n\
             00028067  jr t0\n"
        );
    }

    #[test]
    fn branches_print_relative_targets() {
        let mut asm = rv64g();
        let top = asm.new_label();
        let out = asm.new_label();
        asm.bind(top).unwrap();
        asm.beqz(A0, out, JumpDistance::Near).unwrap();
        asm.blt(A0, A1, top, JumpDistance::Near).unwrap();
        asm.j(top, JumpDistance::Near).unwrap();
        asm.bind(out).unwrap();
        assert_eq!(
            text(&asm),
            "00050663  beqz a0, +12\n\
             feb54ee3  blt a0, a1, -4\n\
             ff9ff06f  j -8\n"
        );
    }

    #[test]
    fn memory_fp_and_atomics() {
        let mut asm = rv64g();
        asm.ld(A0, Address::new(Sp, -16)).unwrap();
        asm.sw(A1, Address::new(A0, 8)).unwrap();
        asm.fld(Fa0, Address::new(A0, 0)).unwrap();
        asm.fadd_d(Fa0, Fa1, Fa2, RoundingMode::Dyn).unwrap();
        asm.fcvt_w_d(A0, Fa0, RoundingMode::Rtz).unwrap();
        asm.amoadd_w(A0, A2, Address::base(A1), MemoryOrder::AcqRel).unwrap();
        asm.lr_d(A0, Address::base(A1), MemoryOrder::Acquire).unwrap();
        asm.lui(A0, 0x12345 << 12).unwrap();
        let lines: alloc::vec::Vec<_> = text(&asm).lines().map(|l| l[10..].to_string()).collect();
        assert_eq!(
            lines,
            [
                "ld a0, -16(sp)",
                "sw a1, 8(a0)",
                "fld fa0, 0(a0)",
                "fadd.d fa0, fa1, fa2",
                "fcvt.w.d a0, fa0, rtz",
                "amoadd.w.aqrl a0, a2, (a1)",
                "lr.d.aq a0, (a1)",
                "lui a0, 0x12345",
            ]
        );
    }

    #[test]
    fn compressed_hex_is_four_digits() {
        let mut asm = Assembler::new(Xlen::Rv64);
        asm.addi(A0, Zero, 5).unwrap();
        asm.ret().unwrap();
        assert_eq!(text(&asm), "    4515  li a0, 5\n    8082  ret\n");
    }

    #[test]
    fn trap_data_and_comments() {
        let mut asm = rv64g();
        asm.comment("entry");
        asm.trap().unwrap();
        asm.emit(0xDEAD_BEEFu32);
        asm.emit(0x1234u16);
        asm.comment("tail");
        asm.addi(A0, Zero, 1).unwrap();
        let code = asm.finalize().unwrap();
        assert_eq!(
            code.disassemble(),
            ";; entry\n\
             00000000  trap\n\
             deadbeef  .word 0xdeadbeef\n\
             \u{20}   1234  .short 0x1234\n\
             ;; tail\n\
             00100513  li a0, 1\n"
        );
    }

    #[test]
    fn undecodable_instruction_bytes_fall_back_to_data() {
        let dis = Disassembler::new(Xlen::Rv32);
        assert_eq!(dis.disassemble_bytes(&[0xFF, 0xFF, 0xFF, 0xFF]), "ffffffff  .word 0xffffffff\n");
        assert_eq!(dis.disassemble_bytes(&[0x00, 0x00]), "    0000  .short 0x0000\n");
        assert_eq!(dis.disassemble_bytes(&[0x13]), "      13  .byte 0x13\n");
        assert_eq!(dis.instruction(&[0x13, 0, 0, 0]), Some((4, "nop".to_string())));
    }
}
