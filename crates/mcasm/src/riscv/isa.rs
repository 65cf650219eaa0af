//! ISA configuration and the small enumerations carried in instruction fields.

use core::fmt;

use bitflags::bitflags;

use crate::error::ArchName;

/// Base integer register width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Xlen {
    /// RV32: 32-bit registers and addresses.
    Rv32,
    /// RV64: 64-bit registers and addresses.
    #[default]
    Rv64,
}

impl Xlen {
    /// Register width in bits.
    pub const fn bits(self) -> u32 {
        match self {
            Xlen::Rv32 => 32,
            Xlen::Rv64 => 64,
        }
    }

    /// Register width in bytes.
    pub const fn bytes(self) -> usize {
        match self {
            Xlen::Rv32 => 4,
            Xlen::Rv64 => 8,
        }
    }

    /// Largest shift amount accepted by `slli`/`srli`/`srai`.
    pub const fn max_shift(self) -> u32 {
        self.bits() - 1
    }

    /// The error-side architecture name.
    pub const fn arch_name(self) -> ArchName {
        match self {
            Xlen::Rv32 => ArchName::Rv32,
            Xlen::Rv64 => ArchName::Rv64,
        }
    }
}

impl fmt::Display for Xlen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.arch_name(), f)
    }
}

bitflags! {
    /// Enabled ISA extensions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct ExtensionSet: u32 {
        /// Base integer ISA.
        const I = 1 << 0;
        /// Integer multiply/divide.
        const M = 1 << 1;
        /// Atomics.
        const A = 1 << 2;
        /// Single-precision floating point.
        const F = 1 << 3;
        /// Double-precision floating point.
        const D = 1 << 4;
        /// Compressed 16-bit encodings.
        const C = 1 << 5;
        /// Address-generation bit manipulation.
        const ZBA = 1 << 6;
        /// Basic bit manipulation.
        const ZBB = 1 << 7;
        /// Single-bit instructions.
        const ZBS = 1 << 8;

        /// `IMAFD`.
        const RV_G = Self::I.bits() | Self::M.bits() | Self::A.bits() | Self::F.bits() | Self::D.bits();
        /// `IMAFDC`.
        const RV_GC = Self::RV_G.bits() | Self::C.bits();
        /// `IMAFDC` plus `Zba Zbb Zbs`.
        const RV_GCB = Self::RV_GC.bits() | Self::ZBA.bits() | Self::ZBB.bits() | Self::ZBS.bits();
    }
}

impl Default for ExtensionSet {
    fn default() -> Self {
        ExtensionSet::RV_GC
    }
}

impl ExtensionSet {
    /// Human-readable name of a single extension flag.
    pub fn name(self) -> &'static str {
        match self {
            s if s == ExtensionSet::I => "I",
            s if s == ExtensionSet::M => "M",
            s if s == ExtensionSet::A => "A",
            s if s == ExtensionSet::F => "F",
            s if s == ExtensionSet::D => "D",
            s if s == ExtensionSet::C => "C",
            s if s == ExtensionSet::ZBA => "Zba",
            s if s == ExtensionSet::ZBB => "Zbb",
            s if s == ExtensionSet::ZBS => "Zbs",
            _ => "?",
        }
    }
}

/// Floating-point rounding mode (`rm` field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RoundingMode {
    /// Round to nearest, ties to even.
    Rne,
    /// Round towards zero.
    Rtz,
    /// Round down (towards negative infinity).
    Rdn,
    /// Round up (towards positive infinity).
    Rup,
    /// Round to nearest, ties to max magnitude.
    Rmm,
    /// Use the dynamic mode in `frm`.
    #[default]
    Dyn,
}

impl RoundingMode {
    /// The 3-bit field value.
    pub const fn bits(self) -> u32 {
        match self {
            RoundingMode::Rne => 0,
            RoundingMode::Rtz => 1,
            RoundingMode::Rdn => 2,
            RoundingMode::Rup => 3,
            RoundingMode::Rmm => 4,
            RoundingMode::Dyn => 7,
        }
    }

    /// Decode a 3-bit field value; 5 and 6 are reserved.
    pub const fn from_bits(bits: u32) -> Option<Self> {
        Some(match bits {
            0 => RoundingMode::Rne,
            1 => RoundingMode::Rtz,
            2 => RoundingMode::Rdn,
            3 => RoundingMode::Rup,
            4 => RoundingMode::Rmm,
            7 => RoundingMode::Dyn,
            _ => return None,
        })
    }

    /// Assembly spelling.
    pub const fn name(self) -> &'static str {
        match self {
            RoundingMode::Rne => "rne",
            RoundingMode::Rtz => "rtz",
            RoundingMode::Rdn => "rdn",
            RoundingMode::Rup => "rup",
            RoundingMode::Rmm => "rmm",
            RoundingMode::Dyn => "dyn",
        }
    }
}

/// Ordering constraint of an atomic memory operation (`aq`/`rl` bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MemoryOrder {
    /// Neither bit.
    #[default]
    Relaxed,
    /// `aq`.
    Acquire,
    /// `rl`.
    Release,
    /// `aq` and `rl`.
    AcqRel,
}

impl MemoryOrder {
    /// `(aq, rl)`.
    pub const fn bits(self) -> (bool, bool) {
        match self {
            MemoryOrder::Relaxed => (false, false),
            MemoryOrder::Acquire => (true, false),
            MemoryOrder::Release => (false, true),
            MemoryOrder::AcqRel => (true, true),
        }
    }

    /// Rebuild from the `aq`/`rl` bits.
    pub const fn from_bits(aq: bool, rl: bool) -> Self {
        match (aq, rl) {
            (false, false) => MemoryOrder::Relaxed,
            (true, false) => MemoryOrder::Acquire,
            (false, true) => MemoryOrder::Release,
            (true, true) => MemoryOrder::AcqRel,
        }
    }

    /// Mnemonic suffix (`""`, `".aq"`, `".rl"`, `".aqrl"`).
    pub const fn suffix(self) -> &'static str {
        match self {
            MemoryOrder::Relaxed => "",
            MemoryOrder::Acquire => ".aq",
            MemoryOrder::Release => ".rl",
            MemoryOrder::AcqRel => ".aqrl",
        }
    }
}

bitflags! {
    /// Predecessor/successor set of a `fence`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct FenceSet: u32 {
        /// Device input.
        const I = 0b1000;
        /// Device output.
        const O = 0b0100;
        /// Memory reads.
        const R = 0b0010;
        /// Memory writes.
        const W = 0b0001;
        /// `iorw`.
        const ALL = 0b1111;
        /// `rw`.
        const RW = 0b0011;
    }
}

impl fmt::Display for FenceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (flag, ch) in [
            (FenceSet::I, 'i'),
            (FenceSet::O, 'o'),
            (FenceSet::R, 'r'),
            (FenceSet::W, 'w'),
        ] {
            if self.contains(flag) {
                write!(f, "{}", ch)?;
            }
        }
        Ok(())
    }
}

/// Branch condition.
///
/// `Gt`, `Le`, `Gtu` and `Leu` have no encoding of their own; they are
/// emitted as the mirrored condition with swapped operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Condition {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// signed `<`
    Lt,
    /// signed `>=`
    Ge,
    /// unsigned `<`
    Ltu,
    /// unsigned `>=`
    Geu,
    /// signed `>`
    Gt,
    /// signed `<=`
    Le,
    /// unsigned `>`
    Gtu,
    /// unsigned `<=`
    Leu,
}

impl Condition {
    /// The condition that holds exactly when `self` does not.
    pub const fn negate(self) -> Self {
        match self {
            Condition::Eq => Condition::Ne,
            Condition::Ne => Condition::Eq,
            Condition::Lt => Condition::Ge,
            Condition::Ge => Condition::Lt,
            Condition::Ltu => Condition::Geu,
            Condition::Geu => Condition::Ltu,
            Condition::Gt => Condition::Le,
            Condition::Le => Condition::Gt,
            Condition::Gtu => Condition::Leu,
            Condition::Leu => Condition::Gtu,
        }
    }

    /// The `funct3` of the encodable condition and whether the operands
    /// must be swapped to reach it.
    pub const fn encoding(self) -> (u32, bool) {
        match self {
            Condition::Eq => (0b000, false),
            Condition::Ne => (0b001, false),
            Condition::Lt => (0b100, false),
            Condition::Ge => (0b101, false),
            Condition::Ltu => (0b110, false),
            Condition::Geu => (0b111, false),
            Condition::Gt => (0b100, true),
            Condition::Le => (0b101, true),
            Condition::Gtu => (0b110, true),
            Condition::Leu => (0b111, true),
        }
    }

    /// Branch mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Condition::Eq => "beq",
            Condition::Ne => "bne",
            Condition::Lt => "blt",
            Condition::Ge => "bge",
            Condition::Ltu => "bltu",
            Condition::Geu => "bgeu",
            Condition::Gt => "bgt",
            Condition::Le => "ble",
            Condition::Gtu => "bgtu",
            Condition::Leu => "bleu",
        }
    }
}

/// Control and status register numbers the assembler knows by name.
pub mod csr {
    /// Accrued floating-point exception flags.
    pub const FFLAGS: u32 = 0x001;
    /// Dynamic rounding mode.
    pub const FRM: u32 = 0x002;
    /// `frm` and `fflags` combined.
    pub const FCSR: u32 = 0x003;
    /// Cycle counter.
    pub const CYCLE: u32 = 0xC00;
    /// Real-time counter.
    pub const TIME: u32 = 0xC01;
    /// Retired-instruction counter.
    pub const INSTRET: u32 = 0xC02;
    /// Upper half of `cycle` (RV32).
    pub const CYCLEH: u32 = 0xC80;
    /// Upper half of `time` (RV32).
    pub const TIMEH: u32 = 0xC81;
    /// Upper half of `instret` (RV32).
    pub const INSTRETH: u32 = 0xC82;

    /// Assembly name of a CSR number, if it has one.
    pub fn name(csr: u32) -> Option<&'static str> {
        Some(match csr {
            FFLAGS => "fflags",
            FRM => "frm",
            FCSR => "fcsr",
            CYCLE => "cycle",
            TIME => "time",
            INSTRET => "instret",
            CYCLEH => "cycleh",
            TIMEH => "timeh",
            INSTRETH => "instreth",
            _ => return None,
        })
    }
}

/// `fflags` bits.
pub mod fflags {
    /// Inexact.
    pub const NX: u32 = 1 << 0;
    /// Underflow.
    pub const UF: u32 = 1 << 1;
    /// Overflow.
    pub const OF: u32 = 1 << 2;
    /// Divide by zero.
    pub const DZ: u32 = 1 << 3;
    /// Invalid operation.
    pub const NV: u32 = 1 << 4;
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn xlen_widths() {
        assert_eq!(Xlen::Rv32.bits(), 32);
        assert_eq!(Xlen::Rv64.bytes(), 8);
        assert_eq!(Xlen::Rv32.max_shift(), 31);
        assert_eq!(format!("{}", Xlen::Rv64), "RV64");
    }

    #[test]
    fn extension_presets() {
        assert!(ExtensionSet::RV_GC.contains(ExtensionSet::C));
        assert!(!ExtensionSet::RV_G.contains(ExtensionSet::C));
        assert!(ExtensionSet::RV_GCB.contains(ExtensionSet::ZBB | ExtensionSet::D));
        assert_eq!(ExtensionSet::ZBA.name(), "Zba");
    }

    #[test]
    fn rounding_mode_bits() {
        for rm in [
            RoundingMode::Rne,
            RoundingMode::Rtz,
            RoundingMode::Rdn,
            RoundingMode::Rup,
            RoundingMode::Rmm,
            RoundingMode::Dyn,
        ] {
            assert_eq!(RoundingMode::from_bits(rm.bits()), Some(rm));
        }
        assert_eq!(RoundingMode::from_bits(5), None);
    }

    #[test]
    fn memory_order_bits() {
        assert_eq!(MemoryOrder::AcqRel.bits(), (true, true));
        assert_eq!(MemoryOrder::from_bits(true, false), MemoryOrder::Acquire);
        assert_eq!(MemoryOrder::Release.suffix(), ".rl");
    }

    #[test]
    fn condition_encoding() {
        assert_eq!(Condition::Gt.encoding(), (0b100, true));
        assert_eq!(Condition::Geu.encoding(), (0b111, false));
        assert_eq!(Condition::Lt.negate(), Condition::Ge);
        assert_eq!(Condition::Leu.negate().negate(), Condition::Leu);
    }

    #[test]
    fn fence_set_display() {
        assert_eq!(format!("{}", FenceSet::ALL), "iorw");
        assert_eq!(format!("{}", FenceSet::RW), "rw");
        assert_eq!(format!("{}", FenceSet::R), "r");
    }

    #[test]
    fn csr_names() {
        assert_eq!(csr::name(csr::FRM), Some("frm"));
        assert_eq!(csr::name(0x7C0), None);
    }
}
