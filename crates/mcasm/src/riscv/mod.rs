//! RISC-V (RV32 / RV64) assembler.
//!
//! [`Assembler`] owns the code buffer, the label arena and the object pool
//! of one code object. Instructions are emitted through one method per
//! mnemonic; every method validates its operands and either appends the
//! encoded instruction or returns an [`AsmError`] without touching the
//! buffer.
//!
//! When the `C` extension is enabled every 32-bit instruction whose
//! operands fit a 16-bit form is emitted compressed. Label-relative sites
//! are exempt: their width is chosen up front through [`JumpDistance`].
//!
//! ```rust
//! use mcasm::riscv::{Assembler, AssemblerOptions, ExtensionSet, JumpDistance, Register::*, Xlen};
//!
//! let opts = AssemblerOptions::new(Xlen::Rv64).with_extensions(ExtensionSet::RV_G);
//! let mut asm = Assembler::with_options(opts);
//! let done = asm.new_label();
//! asm.beqz(A0, done, JumpDistance::Near)?;
//! asm.addi(A0, A0, -1)?;
//! asm.bind(done)?;
//! asm.ret()?;
//! let code = asm.finalize()?;
//! assert_eq!(code.size(), 12);
//! # Ok::<(), mcasm::AsmError>(())
//! ```

mod branch;
mod code;
mod compressed;
pub mod decode;
pub mod disasm;
mod fixup;
mod format;
mod instructions;
pub mod isa;
mod macros;
mod registers;

pub use branch::JumpDistance;
pub use code::Code;
pub use compressed::{compress, expand};
pub use decode::{decode, decode_word, Decoded, Instruction, Layout, Op};
pub use disasm::Disassembler;
pub use fixup::{Fixup, RiscvEncoder};
pub use isa::{csr, fflags, Condition, ExtensionSet, FenceSet, MemoryOrder, RoundingMode, Xlen};
pub use macros::OperandSize;
pub use registers::{Address, FRegister, Register, FP, PP, TMP, TMP2};

use crate::buffer::{CodeBuffer, EmitValue};
use crate::encoder::InstructionEncoder;
use crate::error::AsmError;
use crate::label::{Label, Labels};
use crate::pool::{ObjectPool, ObjectRef, PoolEntry};

/// Assembler configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssemblerOptions {
    /// Register width.
    pub xlen: Xlen,
    /// Enabled extensions. `C` turns on compressed encodings.
    pub extensions: ExtensionSet,
    /// Force every label-relative branch and jump to its far form.
    pub far_branches: bool,
    /// Let `load_immediate` go through the object pool for constants that
    /// would otherwise take more than two instructions.
    pub constant_pool_allowed: bool,
}

impl Default for AssemblerOptions {
    fn default() -> Self {
        Self {
            xlen: Xlen::Rv64,
            extensions: ExtensionSet::RV_GC,
            far_branches: false,
            constant_pool_allowed: false,
        }
    }
}

impl AssemblerOptions {
    /// Defaults for `xlen`: `RV_GC`, near branches, no pool constants.
    pub fn new(xlen: Xlen) -> Self {
        Self {
            xlen,
            ..Self::default()
        }
    }

    /// Replace the extension set.
    pub fn with_extensions(mut self, extensions: ExtensionSet) -> Self {
        self.extensions = extensions;
        self
    }

    /// Set the far-branch switch.
    pub fn with_far_branches(mut self, far: bool) -> Self {
        self.far_branches = far;
        self
    }

    /// Set whether pool constants are allowed.
    pub fn with_constant_pool(mut self, allowed: bool) -> Self {
        self.constant_pool_allowed = allowed;
        self
    }
}

/// Emitter for one RISC-V code object.
#[derive(Debug, Clone)]
pub struct Assembler {
    encoder: RiscvEncoder,
    buffer: CodeBuffer,
    labels: Labels<Fixup>,
    pool: ObjectPool,
    far_branches: bool,
    constant_pool_allowed: bool,
}

impl Assembler {
    /// Assembler for `xlen` with the default options.
    pub fn new(xlen: Xlen) -> Self {
        Self::with_options(AssemblerOptions::new(xlen))
    }

    /// Assembler with explicit options.
    pub fn with_options(options: AssemblerOptions) -> Self {
        log::debug!(
            "new {} assembler, extensions {:?}, far_branches={}",
            options.xlen,
            options.extensions,
            options.far_branches
        );
        Self {
            encoder: RiscvEncoder::new(options.xlen, options.extensions | ExtensionSet::I),
            buffer: CodeBuffer::new(),
            labels: Labels::new(),
            pool: ObjectPool::new(),
            far_branches: options.far_branches,
            constant_pool_allowed: options.constant_pool_allowed,
        }
    }

    /// The active configuration.
    pub fn options(&self) -> AssemblerOptions {
        AssemblerOptions {
            xlen: self.encoder.xlen,
            extensions: self.encoder.extensions,
            far_branches: self.far_branches,
            constant_pool_allowed: self.constant_pool_allowed,
        }
    }

    /// Register width.
    pub fn xlen(&self) -> Xlen {
        self.encoder.xlen
    }

    /// Enabled extensions.
    pub fn extensions(&self) -> ExtensionSet {
        self.encoder.extensions
    }

    /// The target encoder.
    pub fn encoder(&self) -> &RiscvEncoder {
        &self.encoder
    }

    /// Whether `load_immediate` may use the object pool.
    pub fn constant_pool_allowed(&self) -> bool {
        self.constant_pool_allowed
    }

    /// Allow or forbid pool constants from here on.
    pub fn set_constant_pool_allowed(&mut self, allowed: bool) {
        self.constant_pool_allowed = allowed;
    }

    /// Current code size in bytes.
    pub fn code_size(&self) -> usize {
        self.buffer.len()
    }

    /// Number of instructions emitted so far.
    pub fn instruction_count(&self) -> usize {
        self.buffer.instruction_count()
    }

    /// The bytes emitted so far.
    pub fn bytes(&self) -> &[u8] {
        self.buffer.bytes()
    }

    // ── labels ──────────────────────────────────────────────

    /// Allocate a fresh, unbound label.
    pub fn new_label(&mut self) -> Label {
        self.labels.create()
    }

    /// Bind `label` to the current code size and patch its pending uses.
    ///
    /// A site that cannot reach the label is reported and left pending,
    /// so [`Assembler::finalize`] refuses the code.
    pub fn bind(&mut self, label: Label) -> Result<(), AsmError> {
        self.labels
            .bind(label, &mut self.buffer, &self.encoder)
            .map(|_| ())
    }

    /// The bound offset of `label`.
    pub fn label_position(&self, label: Label) -> Result<usize, AsmError> {
        self.labels.position(label)
    }

    /// Whether `label` is bound.
    pub fn is_bound(&self, label: Label) -> bool {
        self.labels.is_bound(label)
    }

    /// Number of reference sites still waiting for `label`.
    pub fn pending_uses(&self, label: Label) -> usize {
        self.labels.pending(label)
    }

    // ── buffer ──────────────────────────────────────────────

    /// Pad with `nop`/`c.nop` until `(code_size() - offset) % boundary == 0`.
    /// Returns the number of filler bytes.
    pub fn align(&mut self, boundary: usize, offset: usize) -> Result<usize, AsmError> {
        self.encoder.align(&mut self.buffer, boundary, offset)
    }

    /// Attach a comment to the current offset.
    pub fn comment(&mut self, text: &str) {
        self.buffer.comment(text);
    }

    /// Append a raw little-endian value as inline data.
    pub fn emit<T: EmitValue>(&mut self, value: T) {
        self.buffer.emit(value);
    }

    // ── object pool ─────────────────────────────────────────

    /// The object pool.
    pub fn pool(&self) -> &ObjectPool {
        &self.pool
    }

    /// Append `entry` to the pool; never deduplicates.
    pub fn add_to_pool(&mut self, entry: PoolEntry) -> usize {
        self.pool.add(entry)
    }

    /// Index of an equal pool entry, appending one if needed.
    pub fn find_or_add_to_pool(&mut self, entry: PoolEntry) -> usize {
        self.pool.find_or_add(entry)
    }

    /// Register an object reference in the pool.
    pub fn add_object_to_pool(&mut self, object: ObjectRef) -> usize {
        self.pool.find_or_add(PoolEntry::Object(object))
    }

    /// Register an untagged word in the pool.
    pub fn add_immediate_to_pool(&mut self, value: u64) -> usize {
        self.pool.find_or_add(PoolEntry::Immediate(value))
    }

    // ── finalization ────────────────────────────────────────

    /// Finish emission and hand off the immutable code object.
    ///
    /// # Errors
    ///
    /// [`AsmError::UnresolvedLabels`] if any label still has pending uses,
    /// including sites a failed [`Assembler::bind`] left unpatched.
    pub fn finalize(self) -> Result<Code, AsmError> {
        let unresolved = self.labels.unresolved();
        if unresolved > 0 {
            return Err(AsmError::UnresolvedLabels { count: unresolved });
        }
        log::debug!(
            "finalize: {} bytes, {} instructions, {} pool entries",
            self.buffer.len(),
            self.buffer.instruction_count(),
            self.pool.len()
        );
        Ok(Code::new(
            self.buffer,
            self.pool,
            self.encoder.xlen,
            self.encoder.extensions,
        ))
    }

    // ── emission primitives ─────────────────────────────────

    pub(crate) fn require(
        &self,
        extension: ExtensionSet,
        mnemonic: &'static str,
    ) -> Result<(), AsmError> {
        if self.encoder.extensions.contains(extension) {
            Ok(())
        } else {
            Err(AsmError::UnsupportedExtension {
                mnemonic,
                extension: extension.name(),
            })
        }
    }

    pub(crate) fn require_rv64(&self, mnemonic: &'static str) -> Result<(), AsmError> {
        if self.encoder.xlen == Xlen::Rv64 {
            Ok(())
        } else {
            Err(AsmError::UnsupportedExtension {
                mnemonic,
                extension: "RV64",
            })
        }
    }

    pub(crate) fn is_rv64(&self) -> bool {
        self.encoder.xlen == Xlen::Rv64
    }

    pub(crate) fn compressed(&self) -> bool {
        self.encoder.compressed()
    }

    /// Emit a 32-bit instruction, compressed when `C` is on and it fits.
    pub(crate) fn emit32(&mut self, word: u32) {
        if self.compressed() {
            if let Some(half) = compress(word, self.encoder.xlen) {
                self.emit16(half);
                return;
            }
        }
        self.emit32_exact(word);
    }

    /// Emit a 32-bit instruction exactly as given.
    pub(crate) fn emit32_exact(&mut self, word: u32) {
        self.buffer.emit_instruction(&word.to_le_bytes());
    }

    pub(crate) fn emit16(&mut self, half: u16) {
        self.buffer.emit_instruction(&half.to_le_bytes());
    }

    pub(crate) fn labels_mut(&mut self) -> &mut Labels<Fixup> {
        &mut self.labels
    }

    pub(crate) fn labels(&self) -> &Labels<Fixup> {
        &self.labels
    }

    pub(crate) fn far_branches(&self) -> bool {
        self.far_branches
    }
}
