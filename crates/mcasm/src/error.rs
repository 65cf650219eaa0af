//! Error types for instruction emission, label binding, and finalization.

#[allow(unused_imports)]
use alloc::format;
use alloc::string::String;
use core::fmt;

use crate::label::Label;

/// The architecture an assembler instance emits code for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArchName {
    /// RISC-V 32-bit.
    Rv32,
    /// RISC-V 64-bit.
    Rv64,
}

impl fmt::Display for ArchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchName::Rv32 => write!(f, "RV32"),
            ArchName::Rv64 => write!(f, "RV64"),
        }
    }
}

/// Emission error.
///
/// The assembler is a trusted-input compiler component: every variant here
/// describes a bug in the code that drives it. Callers are expected to
/// propagate these with `?` and abandon the compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AsmError {
    /// The operand shape is not legal for the instruction.
    InvalidOperands {
        /// Mnemonic of the rejected instruction.
        mnemonic: &'static str,
        /// Description of why the operands are invalid.
        detail: String,
    },

    /// Immediate value exceeds the encodable range.
    ImmediateOverflow {
        /// Mnemonic of the rejected instruction.
        mnemonic: &'static str,
        /// The immediate value that overflowed.
        value: i64,
        /// Minimum allowed value.
        min: i64,
        /// Maximum allowed value.
        max: i64,
    },

    /// Immediate value is in range but not a multiple of the required alignment.
    MisalignedImmediate {
        /// Mnemonic of the rejected instruction.
        mnemonic: &'static str,
        /// The misaligned value.
        value: i64,
        /// Required alignment in bytes.
        align: i64,
    },

    /// A label-relative displacement does not fit the chosen encoding.
    BranchOutOfRange {
        /// Byte offset of the referencing instruction.
        at: usize,
        /// The displacement to the target.
        disp: i64,
        /// Maximum allowed displacement magnitude.
        max: i64,
    },

    /// A label was bound twice.
    LabelAlreadyBound {
        /// The rebound label.
        label: Label,
    },

    /// The position of a label was queried before it was bound.
    UnboundLabel {
        /// The unbound label.
        label: Label,
    },

    /// Code was finalized while labels still had unpatched references.
    UnresolvedLabels {
        /// Number of labels with pending references.
        count: usize,
    },

    /// The instruction belongs to an extension the assembler was not configured with.
    UnsupportedExtension {
        /// Mnemonic of the rejected instruction.
        mnemonic: &'static str,
        /// Name of the missing extension (e.g. `"M"`, `"RV64"`).
        extension: &'static str,
    },

    /// The alignment request cannot be satisfied with whole instructions.
    InvalidAlignment {
        /// Requested boundary.
        boundary: usize,
        /// Requested offset within the boundary.
        offset: usize,
    },

    /// A fixup site lies outside the emitted code.
    FixupOutOfBounds {
        /// Offset of the fixup site.
        offset: usize,
        /// Current code length.
        len: usize,
    },
}

impl AsmError {
    pub(crate) fn invalid(mnemonic: &'static str, detail: &str) -> Self {
        AsmError::InvalidOperands {
            mnemonic,
            detail: String::from(detail),
        }
    }
}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsmError::InvalidOperands { mnemonic, detail } => {
                write!(f, "{}: invalid operand combination: {}", mnemonic, detail)
            }
            AsmError::ImmediateOverflow {
                mnemonic,
                value,
                min,
                max,
            } => {
                write!(
                    f,
                    "{}: immediate value {} out of range [{}..{}]",
                    mnemonic, value, min, max
                )
            }
            AsmError::MisalignedImmediate {
                mnemonic,
                value,
                align,
            } => {
                write!(
                    f,
                    "{}: immediate value {} is not a multiple of {}",
                    mnemonic, value, align
                )
            }
            AsmError::BranchOutOfRange { at, disp, max } => {
                write!(
                    f,
                    "branch at offset {} out of range (displacement={}, max=±{})",
                    at, disp, max
                )
            }
            AsmError::LabelAlreadyBound { label } => {
                write!(f, "label {} is already bound", label)
            }
            AsmError::UnboundLabel { label } => {
                write!(f, "label {} queried before being bound", label)
            }
            AsmError::UnresolvedLabels { count } => {
                write!(f, "{} label(s) referenced but never bound", count)
            }
            AsmError::UnsupportedExtension {
                mnemonic,
                extension,
            } => {
                write!(
                    f,
                    "{}: requires the {} extension, which is not enabled",
                    mnemonic, extension
                )
            }
            AsmError::InvalidAlignment { boundary, offset } => {
                write!(
                    f,
                    "cannot align to offset {} modulo {} with whole instructions",
                    offset, boundary
                )
            }
            AsmError::FixupOutOfBounds { offset, len } => {
                write!(
                    f,
                    "fixup site {} out of bounds (code length {})",
                    offset, len
                )
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AsmError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::Label;

    #[test]
    fn arch_name_display() {
        assert_eq!(format!("{}", ArchName::Rv32), "RV32");
        assert_eq!(format!("{}", ArchName::Rv64), "RV64");
    }

    #[test]
    fn error_invalid_operands_display() {
        let err = AsmError::invalid("c.addi", "rd must not be zero");
        assert_eq!(
            format!("{}", err),
            "c.addi: invalid operand combination: rd must not be zero"
        );
    }

    #[test]
    fn error_immediate_overflow_display() {
        let err = AsmError::ImmediateOverflow {
            mnemonic: "addi",
            value: 4096,
            min: -2048,
            max: 2047,
        };
        assert_eq!(
            format!("{}", err),
            "addi: immediate value 4096 out of range [-2048..2047]"
        );
    }

    #[test]
    fn error_misaligned_immediate_display() {
        let err = AsmError::MisalignedImmediate {
            mnemonic: "c.addi16sp",
            value: 24,
            align: 16,
        };
        assert_eq!(
            format!("{}", err),
            "c.addi16sp: immediate value 24 is not a multiple of 16"
        );
    }

    #[test]
    fn error_branch_out_of_range_display() {
        let err = AsmError::BranchOutOfRange {
            at: 16,
            disp: 500000,
            max: 4094,
        };
        assert_eq!(
            format!("{}", err),
            "branch at offset 16 out of range (displacement=500000, max=±4094)"
        );
    }

    #[test]
    fn error_label_display() {
        let label = Label::from_index(3);
        assert_eq!(
            format!("{}", AsmError::LabelAlreadyBound { label }),
            "label L3 is already bound"
        );
        assert_eq!(
            format!("{}", AsmError::UnboundLabel { label }),
            "label L3 queried before being bound"
        );
    }

    #[test]
    fn error_unresolved_labels_display() {
        let err = AsmError::UnresolvedLabels { count: 2 };
        assert_eq!(format!("{}", err), "2 label(s) referenced but never bound");
    }

    #[test]
    fn error_unsupported_extension_display() {
        let err = AsmError::UnsupportedExtension {
            mnemonic: "mul",
            extension: "M",
        };
        assert_eq!(
            format!("{}", err),
            "mul: requires the M extension, which is not enabled"
        );
    }

    #[test]
    fn error_alignment_display() {
        let err = AsmError::InvalidAlignment {
            boundary: 16,
            offset: 1,
        };
        assert_eq!(
            format!("{}", err),
            "cannot align to offset 1 modulo 16 with whole instructions"
        );
    }
}
