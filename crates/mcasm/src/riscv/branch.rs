//! Label-relative control flow: conditional branches and `jal`.
//!
//! A reference to a bound label is encoded with its final displacement at
//! once. A reference to an unbound label emits the instruction with a
//! zero displacement and records a fixup site that `bind` patches later.
//! The encoding width never changes after emission, so the caller commits
//! to one up front with [`JumpDistance`].

use crate::error::AsmError;
use crate::label::Label;

use super::compressed::{c_branch_placeholder, c_j_placeholder};
use super::format::*;
use super::isa::{Condition, ExtensionSet};
use super::registers::{Register, TMP};
use super::{Assembler, Fixup};

/// Reach of a label-relative branch or jump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JumpDistance {
    /// Compressed form when `C` is enabled and the operands fit,
    /// otherwise the same as `Near`.
    Short,
    /// `B`-type (±4 KiB) or `J`-type (±1 MiB).
    #[default]
    Near,
    /// Conditional branches become an inverted branch over a `jal`
    /// (±1 MiB); jumps become `auipc` + `jalr` (±2 GiB).
    Far,
}

impl Assembler {
    fn effective(&self, distance: JumpDistance) -> JumpDistance {
        if self.far_branches() {
            JumpDistance::Far
        } else {
            distance
        }
    }

    /// Displacement from `site` to a bound `label`, or `None` after
    /// recording `site` as a pending use of an unbound one.
    fn target(&mut self, label: Label, site: usize, kind: Fixup) -> Result<Option<i64>, AsmError> {
        match self.labels().bound_position(label) {
            Some(position) => {
                let disp = position as i64 - site as i64;
                kind.check(site, disp)?;
                Ok(Some(disp))
            }
            None => {
                self.labels_mut().add_use(label, site, kind)?;
                Ok(None)
            }
        }
    }

    /// Displacement to a bound `label` when it fits `kind`, without
    /// recording anything.
    fn bound_fit(&self, label: Label, kind: Fixup) -> Option<Option<i64>> {
        match self.labels().bound_position(label) {
            Some(position) => {
                let disp = position as i64 - self.code_size() as i64;
                kind.fits(disp).then_some(Some(disp))
            }
            None => Some(None),
        }
    }

    /// Conditional branch to `label`. `Gt`, `Le`, `Gtu` and `Leu` are
    /// encoded with swapped operands.
    pub fn branch(
        &mut self,
        cond: Condition,
        rs1: Register,
        rs2: Register,
        label: Label,
        distance: JumpDistance,
    ) -> Result<(), AsmError> {
        let (funct3, swap) = cond.encoding();
        let (rs1, rs2) = if swap { (rs2, rs1) } else { (rs1, rs2) };
        let here = self.code_size();
        match self.effective(distance) {
            JumpDistance::Short => {
                if self.compressed() && rs2 == Register::Zero && funct3 <= 1 {
                    if let Some(half) = c_branch_placeholder(funct3 == 1, rs1) {
                        if let Some(resolved) = self.bound_fit(label, Fixup::CompressedBranch) {
                            return self.emit_compressed(half, label, here, resolved, Fixup::CompressedBranch);
                        }
                    }
                }
                self.near_branch(funct3, rs1, rs2, label, here)
            }
            JumpDistance::Near => self.near_branch(funct3, rs1, rs2, label, here),
            JumpDistance::Far => {
                let (inverted, _) = cond.negate().encoding();
                let disp = self.target(label, here + 4, Fixup::Jump)?.unwrap_or(0);
                self.emit32_exact(b_type(inverted, rs1.num(), rs2.num(), 8));
                self.emit32_exact(j_type(0, disp as i32));
                Ok(())
            }
        }
    }

    fn near_branch(
        &mut self,
        funct3: u32,
        rs1: Register,
        rs2: Register,
        label: Label,
        here: usize,
    ) -> Result<(), AsmError> {
        let disp = self.target(label, here, Fixup::Branch)?.unwrap_or(0);
        self.emit32_exact(b_type(funct3, rs1.num(), rs2.num(), disp as i32));
        Ok(())
    }

    fn emit_compressed(
        &mut self,
        blank: u16,
        label: Label,
        here: usize,
        resolved: Option<i64>,
        kind: Fixup,
    ) -> Result<(), AsmError> {
        let half = match resolved {
            Some(disp) => match kind {
                Fixup::CompressedBranch => patch_cb(blank, disp as i32),
                _ => patch_cj(blank, disp as i32),
            },
            None => {
                self.labels_mut().add_use(label, here, kind)?;
                blank
            }
        };
        self.emit16(half);
        Ok(())
    }

    /// `beq rs1, rs2, label`.
    pub fn beq(&mut self, rs1: Register, rs2: Register, label: Label, distance: JumpDistance) -> Result<(), AsmError> {
        self.branch(Condition::Eq, rs1, rs2, label, distance)
    }

    /// `bne rs1, rs2, label`.
    pub fn bne(&mut self, rs1: Register, rs2: Register, label: Label, distance: JumpDistance) -> Result<(), AsmError> {
        self.branch(Condition::Ne, rs1, rs2, label, distance)
    }

    /// `blt rs1, rs2, label` (signed).
    pub fn blt(&mut self, rs1: Register, rs2: Register, label: Label, distance: JumpDistance) -> Result<(), AsmError> {
        self.branch(Condition::Lt, rs1, rs2, label, distance)
    }

    /// `bge rs1, rs2, label` (signed).
    pub fn bge(&mut self, rs1: Register, rs2: Register, label: Label, distance: JumpDistance) -> Result<(), AsmError> {
        self.branch(Condition::Ge, rs1, rs2, label, distance)
    }

    /// `bltu rs1, rs2, label`.
    pub fn bltu(&mut self, rs1: Register, rs2: Register, label: Label, distance: JumpDistance) -> Result<(), AsmError> {
        self.branch(Condition::Ltu, rs1, rs2, label, distance)
    }

    /// `bgeu rs1, rs2, label`.
    pub fn bgeu(&mut self, rs1: Register, rs2: Register, label: Label, distance: JumpDistance) -> Result<(), AsmError> {
        self.branch(Condition::Geu, rs1, rs2, label, distance)
    }

    /// `jal rd, label`.
    ///
    /// The far form is `auipc` + `jalr`; it uses `rd` as the scratch
    /// register, or [`TMP`] when `rd` is `zero`.
    pub fn jal(&mut self, rd: Register, label: Label, distance: JumpDistance) -> Result<(), AsmError> {
        let here = self.code_size();
        match self.effective(distance) {
            JumpDistance::Short => {
                let link = match rd {
                    Register::Zero => Some(false),
                    Register::Ra if !self.is_rv64() => Some(true),
                    _ => None,
                };
                if let (true, Some(link)) = (self.compressed(), link) {
                    if let Some(resolved) = self.bound_fit(label, Fixup::CompressedJump) {
                        return self.emit_compressed(c_j_placeholder(link), label, here, resolved, Fixup::CompressedJump);
                    }
                }
                self.near_jump(rd, label, here)
            }
            JumpDistance::Near => self.near_jump(rd, label, here),
            JumpDistance::Far => {
                let scratch = if rd == Register::Zero { TMP } else { rd };
                self.pc_relative_pair(OP_JALR, 0, rd, scratch, label)
            }
        }
    }

    /// `j label`, i.e. `jal zero, label`.
    pub fn j(&mut self, label: Label, distance: JumpDistance) -> Result<(), AsmError> {
        self.jal(Register::Zero, label, distance)
    }

    fn near_jump(&mut self, rd: Register, label: Label, here: usize) -> Result<(), AsmError> {
        let disp = self.target(label, here, Fixup::Jump)?.unwrap_or(0);
        self.emit32_exact(j_type(rd.num(), disp as i32));
        Ok(())
    }

    /// `auipc scratch, %hi(label)` followed by the I-type instruction
    /// `opcode rd, %lo(label)(scratch)`, patched as one
    /// [`Fixup::PcRelative`] site.
    pub(crate) fn pc_relative_pair(
        &mut self,
        opcode: u32,
        funct3: u32,
        rd: Register,
        scratch: Register,
        label: Label,
    ) -> Result<(), AsmError> {
        let here = self.code_size();
        let disp = self.target(label, here, Fixup::PcRelative)?.unwrap_or(0);
        let (hi20, lo12) = split_hi_lo(disp);
        self.emit32_exact(u_type(OP_AUIPC, scratch.num(), hi20 << 12));
        self.emit32_exact(i_type(opcode, rd.num(), funct3, scratch.num(), lo12));
        Ok(())
    }

    /// `c.j label`.
    pub fn c_j(&mut self, label: Label) -> Result<(), AsmError> {
        self.require(ExtensionSet::C, "c.j")?;
        self.explicit_c_jump(c_j_placeholder(false), label)
    }

    /// `c.jal label` (RV32 only).
    pub fn c_jal(&mut self, label: Label) -> Result<(), AsmError> {
        self.require(ExtensionSet::C, "c.jal")?;
        if self.is_rv64() {
            return Err(AsmError::invalid("c.jal", "not available on RV64"));
        }
        self.explicit_c_jump(c_j_placeholder(true), label)
    }

    /// `c.beqz rs1, label`.
    pub fn c_beqz(&mut self, rs1: Register, label: Label) -> Result<(), AsmError> {
        self.explicit_c_branch("c.beqz", false, rs1, label)
    }

    /// `c.bnez rs1, label`.
    pub fn c_bnez(&mut self, rs1: Register, label: Label) -> Result<(), AsmError> {
        self.explicit_c_branch("c.bnez", true, rs1, label)
    }

    fn explicit_c_jump(&mut self, blank: u16, label: Label) -> Result<(), AsmError> {
        let here = self.code_size();
        let resolved = self.target(label, here, Fixup::CompressedJump)?;
        let half = resolved.map_or(blank, |disp| patch_cj(blank, disp as i32));
        self.emit16(half);
        Ok(())
    }

    fn explicit_c_branch(
        &mut self,
        mnemonic: &'static str,
        bnez: bool,
        rs1: Register,
        label: Label,
    ) -> Result<(), AsmError> {
        self.require(ExtensionSet::C, mnemonic)?;
        let blank = c_branch_placeholder(bnez, rs1)
            .ok_or_else(|| AsmError::invalid(mnemonic, "rs1 must be one of x8-x15"))?;
        let here = self.code_size();
        let resolved = self.target(label, here, Fixup::CompressedBranch)?;
        let half = resolved.map_or(blank, |disp| patch_cb(blank, disp as i32));
        self.emit16(half);
        Ok(())
    }
}
