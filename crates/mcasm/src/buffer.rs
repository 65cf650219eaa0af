//! Append-only code buffer.
//!
//! Besides the raw bytes the buffer keeps a region map that tells
//! instruction runs apart from inline data, so a disassembler can
//! resynchronise after a literal, and an optional list of code comments.

use alloc::string::String;
use alloc::vec::Vec;

use crate::error::AsmError;

/// Values that can be appended to a [`CodeBuffer`] as raw little-endian data.
pub trait EmitValue: Copy {
    /// Encoded size in bytes.
    const SIZE: usize;

    /// Append the little-endian encoding of `self` to `out`.
    fn write_le(self, out: &mut Vec<u8>);
}

macro_rules! impl_emit_value {
    ($($t:ty),*) => {
        $(
            impl EmitValue for $t {
                const SIZE: usize = core::mem::size_of::<$t>();

                #[inline]
                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_emit_value!(u8, u16, u32, u64, i8, i16, i32, i64);

/// What a run of bytes holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RegionKind {
    /// A run of instructions.
    Instruction,
    /// Inline data.
    Data,
}

/// A contiguous run of bytes of one [`RegionKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Region {
    /// First byte offset of the run.
    pub start: usize,
    /// Length in bytes.
    pub len: usize,
    /// Contents of the run.
    pub kind: RegionKind,
}

impl Region {
    /// One past the last byte of the run.
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// A code comment attached to a byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Comment {
    /// Offset the comment precedes.
    pub offset: usize,
    /// Comment text.
    pub text: String,
}

/// Growable byte storage for emitted machine code.
#[derive(Debug, Clone, Default)]
pub struct CodeBuffer {
    bytes: Vec<u8>,
    regions: Vec<Region>,
    comments: Vec<Comment>,
    instructions: usize,
}

impl CodeBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Current length in bytes; also the offset of the next emitted byte.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether nothing has been emitted.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The emitted bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The region map.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Comments in emission order.
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Number of instructions emitted.
    pub fn instruction_count(&self) -> usize {
        self.instructions
    }

    fn extend_region(&mut self, kind: RegionKind, len: usize) {
        let start = self.bytes.len() - len;
        match self.regions.last_mut() {
            Some(last) if last.kind == kind && last.end() == start => last.len += len,
            _ => self.regions.push(Region { start, len, kind }),
        }
    }

    /// Append one encoded instruction.
    pub fn emit_instruction(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
        self.instructions += 1;
        self.extend_region(RegionKind::Instruction, bytes.len());
    }

    /// Append a raw little-endian value as inline data.
    pub fn emit<T: EmitValue>(&mut self, value: T) {
        value.write_le(&mut self.bytes);
        self.extend_region(RegionKind::Data, T::SIZE);
    }

    /// Append raw bytes as inline data.
    pub fn emit_bytes(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        self.bytes.extend_from_slice(bytes);
        self.extend_region(RegionKind::Data, bytes.len());
    }

    /// Attach a comment to the current offset.
    pub fn comment(&mut self, text: &str) {
        self.comments.push(Comment {
            offset: self.bytes.len(),
            text: String::from(text),
        });
    }

    fn check(&self, offset: usize, size: usize) -> Result<(), AsmError> {
        if offset.checked_add(size).map_or(true, |end| end > self.bytes.len()) {
            return Err(AsmError::FixupOutOfBounds {
                offset,
                len: self.bytes.len(),
            });
        }
        Ok(())
    }

    /// Read a little-endian `u16` at `offset`.
    pub fn read_u16(&self, offset: usize) -> Result<u16, AsmError> {
        self.check(offset, 2)?;
        Ok(u16::from_le_bytes([self.bytes[offset], self.bytes[offset + 1]]))
    }

    /// Read a little-endian `u32` at `offset`.
    pub fn read_u32(&self, offset: usize) -> Result<u32, AsmError> {
        self.check(offset, 4)?;
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.bytes[offset..offset + 4]);
        Ok(u32::from_le_bytes(word))
    }

    /// Overwrite a little-endian `u16` at `offset`.
    pub fn write_u16(&mut self, offset: usize, value: u16) -> Result<(), AsmError> {
        self.check(offset, 2)?;
        self.bytes[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Overwrite a little-endian `u32` at `offset`.
    pub fn write_u32(&mut self, offset: usize, value: u32) -> Result<(), AsmError> {
        self.check(offset, 4)?;
        self.bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Split into bytes, regions and comments.
    pub fn into_parts(self) -> (Vec<u8>, Vec<Region>, Vec<Comment>) {
        (self.bytes, self.regions, self.comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_values_little_endian() {
        let mut buf = CodeBuffer::new();
        buf.emit(0x12u8);
        buf.emit(0x3456u16);
        buf.emit(0x789A_BCDEu32);
        buf.emit(-1i64);
        assert_eq!(buf.len(), 15);
        assert_eq!(
            &buf.bytes()[..7],
            &[0x12, 0x56, 0x34, 0xDE, 0xBC, 0x9A, 0x78]
        );
        assert_eq!(&buf.bytes()[7..], &[0xFF; 8]);
    }

    #[test]
    fn regions_merge_runs() {
        let mut buf = CodeBuffer::new();
        buf.emit_instruction(&[0x13, 0, 0, 0]);
        buf.emit_instruction(&[0x01, 0]);
        buf.emit(0xDEAD_BEEFu32);
        buf.emit(0u16);
        buf.emit_instruction(&[0x13, 0, 0, 0]);
        assert_eq!(
            buf.regions(),
            &[
                Region {
                    start: 0,
                    len: 6,
                    kind: RegionKind::Instruction
                },
                Region {
                    start: 6,
                    len: 6,
                    kind: RegionKind::Data
                },
                Region {
                    start: 12,
                    len: 4,
                    kind: RegionKind::Instruction
                },
            ]
        );
        assert_eq!(buf.instruction_count(), 3);
    }

    #[test]
    fn read_write_round_trip() {
        let mut buf = CodeBuffer::new();
        buf.emit(0u32);
        buf.emit(0u16);
        buf.write_u32(0, 0xCAFE_F00D).unwrap();
        buf.write_u16(4, 0xBEEF).unwrap();
        assert_eq!(buf.read_u32(0).unwrap(), 0xCAFE_F00D);
        assert_eq!(buf.read_u16(4).unwrap(), 0xBEEF);
    }

    #[test]
    fn out_of_bounds_access() {
        let mut buf = CodeBuffer::new();
        buf.emit(0u16);
        assert_eq!(
            buf.read_u32(0),
            Err(AsmError::FixupOutOfBounds { offset: 0, len: 2 })
        );
        assert!(buf.write_u16(1, 0).is_err());
        assert!(buf.read_u16(usize::MAX).is_err());
    }

    #[test]
    fn comments_record_offsets() {
        let mut buf = CodeBuffer::new();
        buf.comment("entry");
        buf.emit_instruction(&[0x13, 0, 0, 0]);
        buf.comment("after");
        assert_eq!(buf.comments()[0].offset, 0);
        assert_eq!(buf.comments()[1].offset, 4);
        assert_eq!(buf.comments()[1].text, "after");
    }
}
