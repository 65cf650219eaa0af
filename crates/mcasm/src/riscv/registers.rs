//! Integer and floating-point register files.

use core::fmt;

/// An integer register, named by its ABI role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Register {
    Zero = 0,
    Ra = 1,
    Sp = 2,
    Gp = 3,
    Tp = 4,
    T0 = 5,
    T1 = 6,
    T2 = 7,
    S0 = 8,
    S1 = 9,
    A0 = 10,
    A1 = 11,
    A2 = 12,
    A3 = 13,
    A4 = 14,
    A5 = 15,
    A6 = 16,
    A7 = 17,
    S2 = 18,
    S3 = 19,
    S4 = 20,
    S5 = 21,
    S6 = 22,
    S7 = 23,
    S8 = 24,
    S9 = 25,
    S10 = 26,
    S11 = 27,
    T3 = 28,
    T4 = 29,
    T5 = 30,
    T6 = 31,
}

const X_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

const X_REGS: [Register; 32] = {
    use Register::*;
    [
        Zero, Ra, Sp, Gp, Tp, T0, T1, T2, S0, S1, A0, A1, A2, A3, A4, A5, A6, A7, S2, S3, S4, S5,
        S6, S7, S8, S9, S10, S11, T3, T4, T5, T6,
    ]
};

impl Register {
    /// The 5-bit register number.
    #[inline]
    pub const fn num(self) -> u32 {
        self as u32
    }

    /// Register `x{n}`; `None` for `n >= 32`.
    pub const fn from_num(n: u32) -> Option<Self> {
        if n < 32 {
            Some(X_REGS[n as usize])
        } else {
            None
        }
    }

    /// ABI name.
    pub const fn name(self) -> &'static str {
        X_NAMES[self as usize]
    }

    /// Whether the register is one of `x8..=x15`, addressable by the
    /// 3-bit register fields of compressed instructions.
    pub const fn is_compact(self) -> bool {
        matches!(self as u8, 8..=15)
    }

    /// Function argument register `a{n}`.
    pub const fn arg(n: usize) -> Option<Self> {
        if n < 8 {
            Self::from_num(10 + n as u32)
        } else {
            None
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A floating-point register, named by its ABI role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum FRegister {
    Ft0 = 0,
    Ft1 = 1,
    Ft2 = 2,
    Ft3 = 3,
    Ft4 = 4,
    Ft5 = 5,
    Ft6 = 6,
    Ft7 = 7,
    Fs0 = 8,
    Fs1 = 9,
    Fa0 = 10,
    Fa1 = 11,
    Fa2 = 12,
    Fa3 = 13,
    Fa4 = 14,
    Fa5 = 15,
    Fa6 = 16,
    Fa7 = 17,
    Fs2 = 18,
    Fs3 = 19,
    Fs4 = 20,
    Fs5 = 21,
    Fs6 = 22,
    Fs7 = 23,
    Fs8 = 24,
    Fs9 = 25,
    Fs10 = 26,
    Fs11 = 27,
    Ft8 = 28,
    Ft9 = 29,
    Ft10 = 30,
    Ft11 = 31,
}

const F_NAMES: [&str; 32] = [
    "ft0", "ft1", "ft2", "ft3", "ft4", "ft5", "ft6", "ft7", "fs0", "fs1", "fa0", "fa1", "fa2",
    "fa3", "fa4", "fa5", "fa6", "fa7", "fs2", "fs3", "fs4", "fs5", "fs6", "fs7", "fs8", "fs9",
    "fs10", "fs11", "ft8", "ft9", "ft10", "ft11",
];

const F_REGS: [FRegister; 32] = {
    use FRegister::*;
    [
        Ft0, Ft1, Ft2, Ft3, Ft4, Ft5, Ft6, Ft7, Fs0, Fs1, Fa0, Fa1, Fa2, Fa3, Fa4, Fa5, Fa6, Fa7,
        Fs2, Fs3, Fs4, Fs5, Fs6, Fs7, Fs8, Fs9, Fs10, Fs11, Ft8, Ft9, Ft10, Ft11,
    ]
};

impl FRegister {
    /// The 5-bit register number.
    #[inline]
    pub const fn num(self) -> u32 {
        self as u32
    }

    /// Register `f{n}`; `None` for `n >= 32`.
    pub const fn from_num(n: u32) -> Option<Self> {
        if n < 32 {
            Some(F_REGS[n as usize])
        } else {
            None
        }
    }

    /// ABI name.
    pub const fn name(self) -> &'static str {
        F_NAMES[self as usize]
    }

    /// Whether the register is one of `f8..=f15`.
    pub const fn is_compact(self) -> bool {
        matches!(self as u8, 8..=15)
    }

    /// Floating-point argument register `fa{n}`.
    pub const fn arg(n: usize) -> Option<Self> {
        if n < 8 {
            Self::from_num(10 + n as u32)
        } else {
            None
        }
    }
}

impl fmt::Display for FRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Scratch register clobbered by pseudo-ops.
pub const TMP: Register = Register::T6;
/// Second scratch register clobbered by pseudo-ops.
pub const TMP2: Register = Register::T5;
/// Object-pool pointer.
pub const PP: Register = Register::S11;
/// Frame pointer.
pub const FP: Register = Register::S0;

/// A RISC-V memory operand.
pub type Address = crate::operand::Address<Register>;
