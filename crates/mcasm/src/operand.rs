//! Architecture-independent operand scaffolding: memory addresses and
//! immediate range predicates.
//!
//! Register files are target specific and live next to their encoder
//! (see [`crate::riscv::Register`]). Operand values never touch the code
//! buffer; they are validated by the instruction that consumes them.

use core::fmt;

/// How an instruction consuming an [`Address`] treats its base register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AddressMode {
    /// `base + offset`, base unchanged.
    #[default]
    Offset,
    /// `base += offset`, then access `base`.
    PreIndex,
    /// Access `base`, then `base += offset`.
    PostIndex,
}

/// A memory operand: a base register, a signed byte displacement and an
/// addressing mode.
///
/// The value itself is immutable; write-back modes describe a side effect
/// of the instruction sequence that consumes the address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Address<R> {
    base: R,
    offset: i32,
    mode: AddressMode,
}

impl<R: Copy> Address<R> {
    /// `offset(base)`.
    pub const fn new(base: R, offset: i32) -> Self {
        Self {
            base,
            offset,
            mode: AddressMode::Offset,
        }
    }

    /// `0(base)`.
    pub const fn base(base: R) -> Self {
        Self::new(base, 0)
    }

    /// Pre-indexed: the base is advanced by `offset` before the access.
    pub const fn pre_index(base: R, offset: i32) -> Self {
        Self {
            base,
            offset,
            mode: AddressMode::PreIndex,
        }
    }

    /// Post-indexed: the base is advanced by `offset` after the access.
    pub const fn post_index(base: R, offset: i32) -> Self {
        Self {
            base,
            offset,
            mode: AddressMode::PostIndex,
        }
    }

    /// The base register.
    pub const fn base_register(&self) -> R {
        self.base
    }

    /// The byte displacement.
    pub const fn offset(&self) -> i32 {
        self.offset
    }

    /// The addressing mode.
    pub const fn mode(&self) -> AddressMode {
        self.mode
    }

    /// The same base with `delta` added to the displacement.
    pub const fn displaced(&self, delta: i32) -> Self {
        Self {
            base: self.base,
            offset: self.offset.wrapping_add(delta),
            mode: self.mode,
        }
    }
}

impl<R: fmt::Display> fmt::Display for Address<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            AddressMode::Offset => write!(f, "{}({})", self.offset, self.base),
            AddressMode::PreIndex => write!(f, "{}({})!", self.offset, self.base),
            AddressMode::PostIndex => write!(f, "({}), {}", self.base, self.offset),
        }
    }
}

/// Whether `value` is representable as a `bits`-wide two's-complement integer.
#[inline]
pub const fn fits_signed(value: i64, bits: u32) -> bool {
    if bits >= 64 {
        return true;
    }
    let min = -(1i64 << (bits - 1));
    let max = (1i64 << (bits - 1)) - 1;
    value >= min && value <= max
}

/// Whether `value` is representable as a `bits`-wide unsigned integer.
#[inline]
pub const fn fits_unsigned(value: i64, bits: u32) -> bool {
    if value < 0 {
        return false;
    }
    bits >= 63 || value < (1i64 << bits)
}

/// Sign-extend the low `bits` bits of `value`.
#[inline]
pub const fn sign_extend(value: u64, bits: u32) -> i64 {
    let shift = 64 - bits;
    ((value << shift) as i64) >> shift
}
