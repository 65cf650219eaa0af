//! Label fixup kinds and their resolution for RISC-V.

use crate::buffer::CodeBuffer;
use crate::encoder::InstructionEncoder;
use crate::error::{ArchName, AsmError};

use super::format::{self, C_NOP, NOP};
use super::isa::{ExtensionSet, Xlen};

/// Encoding of a label-relative displacement field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Fixup {
    /// B-type conditional branch, ±4 KiB.
    Branch,
    /// J-type `jal`, ±1 MiB.
    Jump,
    /// CB-type `c.beqz`/`c.bnez`, ±256 B.
    CompressedBranch,
    /// CJ-type `c.j`/`c.jal`, ±2 KiB.
    CompressedJump,
    /// `auipc` followed by an I-type instruction (`jalr`, `addi`, `ld`),
    /// ±2 GiB relative to the `auipc`.
    PcRelative,
}

impl Fixup {
    /// Inclusive displacement range `(min, max)` of the field.
    pub const fn range(self) -> (i64, i64) {
        match self {
            Fixup::Branch => (-(1 << 12), (1 << 12) - 2),
            Fixup::Jump => (-(1 << 20), (1 << 20) - 2),
            Fixup::CompressedBranch => (-(1 << 8), (1 << 8) - 2),
            Fixup::CompressedJump => (-(1 << 11), (1 << 11) - 2),
            Fixup::PcRelative => (-(1 << 31) - 0x800, (1 << 31) - 0x801),
        }
    }

    /// Whether `disp` is encodable in the field.
    pub const fn fits(self, disp: i64) -> bool {
        let (min, max) = self.range();
        let aligned = matches!(self, Fixup::PcRelative) || disp % 2 == 0;
        disp >= min && disp <= max && aligned
    }

    pub(crate) fn check(self, at: usize, disp: i64) -> Result<(), AsmError> {
        if self.fits(disp) {
            Ok(())
        } else {
            Err(AsmError::BranchOutOfRange {
                at,
                disp,
                max: self.range().1,
            })
        }
    }
}

/// The RISC-V [`InstructionEncoder`]: target configuration plus fixup
/// resolution and padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiscvEncoder {
    pub(crate) xlen: Xlen,
    pub(crate) extensions: ExtensionSet,
}

impl RiscvEncoder {
    /// Encoder for `xlen` with `extensions` enabled.
    pub const fn new(xlen: Xlen, extensions: ExtensionSet) -> Self {
        Self { xlen, extensions }
    }

    /// Register width.
    pub const fn xlen(&self) -> Xlen {
        self.xlen
    }

    /// Enabled extensions.
    pub const fn extensions(&self) -> ExtensionSet {
        self.extensions
    }

    /// Whether compressed encodings may be emitted.
    pub const fn compressed(&self) -> bool {
        self.extensions.contains(ExtensionSet::C)
    }
}

impl InstructionEncoder for RiscvEncoder {
    type Fixup = Fixup;

    fn arch(&self) -> ArchName {
        self.xlen.arch_name()
    }

    fn min_instruction_size(&self) -> usize {
        if self.compressed() {
            2
        } else {
            4
        }
    }

    fn apply_fixup(
        &self,
        buffer: &mut CodeBuffer,
        site: usize,
        kind: Fixup,
        target: usize,
    ) -> Result<(), AsmError> {
        let disp = target as i64 - site as i64;
        kind.check(site, disp)?;
        match kind {
            Fixup::Branch => {
                let word = buffer.read_u32(site)?;
                buffer.write_u32(site, format::patch_b(word, disp as i32))
            }
            Fixup::Jump => {
                let word = buffer.read_u32(site)?;
                buffer.write_u32(site, format::patch_j(word, disp as i32))
            }
            Fixup::CompressedBranch => {
                let half = buffer.read_u16(site)?;
                buffer.write_u16(site, format::patch_cb(half, disp as i32))
            }
            Fixup::CompressedJump => {
                let half = buffer.read_u16(site)?;
                buffer.write_u16(site, format::patch_cj(half, disp as i32))
            }
            Fixup::PcRelative => {
                let (hi20, lo12) = format::split_hi_lo(disp);
                let auipc = buffer.read_u32(site)?;
                let low = buffer.read_u32(site + 4)?;
                buffer.write_u32(site, format::patch_u(auipc, hi20))?;
                buffer.write_u32(site + 4, format::patch_i(low, lo12))
            }
        }
    }

    fn emit_padding(&self, buffer: &mut CodeBuffer, len: usize) -> Result<(), AsmError> {
        let mut remaining = len;
        while remaining >= 4 {
            buffer.emit_instruction(&NOP.to_le_bytes());
            remaining -= 4;
        }
        if remaining == 2 && self.compressed() {
            buffer.emit_instruction(&C_NOP.to_le_bytes());
            remaining = 0;
        }
        if remaining != 0 {
            return Err(AsmError::InvalidAlignment {
                boundary: len,
                offset: remaining,
            });
        }
        Ok(())
    }
}
