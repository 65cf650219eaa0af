//! The per-architecture encoder interface.
//!
//! The architecture-independent parts of the assembler (the code buffer and
//! the label arena) only need three things from a target: how to patch a
//! pending label reference once the label is bound, how to pad the
//! instruction stream, and the smallest instruction size it can emit.

use core::fmt;

use crate::buffer::CodeBuffer;
use crate::error::{ArchName, AsmError};

/// Capability interface implemented once per target architecture.
pub trait InstructionEncoder {
    /// Encoding of a label-relative displacement field.
    type Fixup: Copy + fmt::Debug;

    /// The architecture this encoder emits.
    fn arch(&self) -> ArchName;

    /// Size in bytes of the smallest instruction the encoder may emit.
    fn min_instruction_size(&self) -> usize;

    /// Patch the reference at `site` so it targets byte offset `target`.
    ///
    /// # Errors
    ///
    /// [`AsmError::BranchOutOfRange`] if the displacement does not fit the
    /// field described by `kind`.
    fn apply_fixup(
        &self,
        buffer: &mut CodeBuffer,
        site: usize,
        kind: Self::Fixup,
        target: usize,
    ) -> Result<(), AsmError>;

    /// Append `len` bytes of no-op filler. `len` is a multiple of
    /// [`min_instruction_size`](Self::min_instruction_size).
    fn emit_padding(&self, buffer: &mut CodeBuffer, len: usize) -> Result<(), AsmError>;

    /// Pad until `(buffer.len() - offset) % boundary == 0` and return the
    /// number of filler bytes emitted. Already aligned emits nothing.
    ///
    /// # Errors
    ///
    /// [`AsmError::InvalidAlignment`] if `boundary` is not a power of two or
    /// the padding is not a whole number of instructions.
    fn align(
        &self,
        buffer: &mut CodeBuffer,
        boundary: usize,
        offset: usize,
    ) -> Result<usize, AsmError> {
        if boundary == 0 || !boundary.is_power_of_two() {
            return Err(AsmError::InvalidAlignment { boundary, offset });
        }
        let padding = (offset % boundary + boundary - buffer.len() % boundary) % boundary;
        if padding % self.min_instruction_size() != 0 {
            return Err(AsmError::InvalidAlignment { boundary, offset });
        }
        if padding > 0 {
            self.emit_padding(buffer, padding)?;
        }
        Ok(padding)
    }
}
