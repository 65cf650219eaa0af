//! Finalized code objects.

use alloc::string::String;
use alloc::vec::Vec;

use super::disasm::Disassembler;
use super::isa::{ExtensionSet, Xlen};
use crate::buffer::{CodeBuffer, Comment, Region};
use crate::pool::ObjectPool;

/// Immutable result of [`Assembler::finalize`](super::Assembler::finalize).
///
/// The bytes are position independent: every label reference is
/// PC-relative and every pool access goes through `PP`, so the code may be
/// copied anywhere as long as `PP` points at the pool laid out by
/// [`ObjectPool::to_bytes`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Code {
    bytes: Vec<u8>,
    pool: ObjectPool,
    regions: Vec<Region>,
    comments: Vec<Comment>,
    instruction_count: usize,
    xlen: Xlen,
    extensions: ExtensionSet,
}

impl Code {
    pub(crate) fn new(buffer: CodeBuffer, pool: ObjectPool, xlen: Xlen, extensions: ExtensionSet) -> Self {
        let instruction_count = buffer.instruction_count();
        let (bytes, regions, comments) = buffer.into_parts();
        Self {
            bytes,
            pool,
            regions,
            comments,
            instruction_count,
            xlen,
            extensions,
        }
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn pool(&self) -> &ObjectPool {
        &self.pool
    }

    /// Pool contents as `xlen`-wide little-endian words.
    pub fn pool_bytes(&self) -> Vec<u8> {
        self.pool.to_bytes(self.xlen.bytes())
    }

    /// Instruction and data runs.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn instruction_count(&self) -> usize {
        self.instruction_count
    }

    pub fn xlen(&self) -> Xlen {
        self.xlen
    }

    /// Extensions the code was assembled for.
    pub fn extensions(&self) -> ExtensionSet {
        self.extensions
    }

    /// Text listing of the whole object.
    pub fn disassemble(&self) -> String {
        self.disassemble_range(0, self.bytes.len())
    }

    /// Text listing of `[start, end)`. `start` should be an instruction
    /// boundary; the range is clamped to the code size.
    pub fn disassemble_range(&self, start: usize, end: usize) -> String {
        Disassembler::new(self.xlen).disassemble(&self.bytes, &self.regions, &self.comments, start, end)
    }
}
