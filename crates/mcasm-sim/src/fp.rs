//! IEEE 754 binary32/binary64 arithmetic with explicit rounding modes and
//! accrued exception flags.
//!
//! Results are computed on the host in round-to-nearest together with the
//! exact rounding error (or its sign), then re-rounded to the requested
//! mode. Single-precision operands are widened to binary64 first, where
//! sums and products are exact enough for the error terms to be exact too.
//! Double-precision fused multiply-add rounds to nearest in every mode.

use std::cmp::Ordering;
use std::num::FpCategory;

use mcasm::riscv::{fflags, RoundingMode};

/// Host float types the simulator computes with.
pub trait Float: Copy + PartialEq + PartialOrd + core::fmt::Debug {
    const MAX: Self;
    const INFINITY: Self;
    /// Whether products of two values are exact in binary64.
    const WIDE: bool;

    fn from_f64(v: f64) -> Self;
    fn to_f64(self) -> f64;
    fn canonical_nan() -> Self;
    fn is_nan(self) -> bool;
    fn is_infinite(self) -> bool;
    fn is_sign_negative(self) -> bool;
    fn is_signaling(self) -> bool;
    fn category(self) -> FpCategory;
    fn neg(self) -> Self;
    /// Least significant significand bit is clear.
    fn is_even(self) -> bool;
    fn next_up(self) -> Self;

    fn next_down(self) -> Self {
        self.neg().next_up().neg()
    }
}

macro_rules! float_impl {
    ($t:ty, $bits:ty, $quiet:expr, $nan:expr, $wide:expr) => {
        impl Float for $t {
            const MAX: Self = <$t>::MAX;
            const INFINITY: Self = <$t>::INFINITY;
            const WIDE: bool = $wide;

            fn from_f64(v: f64) -> Self {
                v as $t
            }

            fn to_f64(self) -> f64 {
                self as f64
            }

            fn canonical_nan() -> Self {
                <$t>::from_bits($nan)
            }

            fn is_nan(self) -> bool {
                <$t>::is_nan(self)
            }

            fn is_infinite(self) -> bool {
                <$t>::is_infinite(self)
            }

            fn is_sign_negative(self) -> bool {
                <$t>::is_sign_negative(self)
            }

            fn is_signaling(self) -> bool {
                <$t>::is_nan(self) && self.to_bits() & $quiet == 0
            }

            fn category(self) -> FpCategory {
                self.classify()
            }

            fn neg(self) -> Self {
                -self
            }

            fn is_even(self) -> bool {
                self.to_bits() & 1 == 0
            }

            fn next_up(self) -> Self {
                if <$t>::is_nan(self) || self == <$t>::INFINITY {
                    return self;
                }
                if self == 0.0 {
                    return <$t>::from_bits(1);
                }
                let bits = self.to_bits();
                <$t>::from_bits(if self > 0.0 { bits + 1 } else { bits - 1 as $bits })
            }
        }
    };
}

float_impl!(f32, u32, 0x0040_0000, 0x7FC0_0000, true);
float_impl!(f64, u64, 0x0008_0000_0000_0000, 0x7FF8_0000_0000_0000, false);

/// NaN-box a single into a 64-bit FP register.
pub fn box_f32(v: f32) -> u64 {
    0xFFFF_FFFF_0000_0000 | v.to_bits() as u64
}

/// Read a single from a 64-bit FP register; improperly boxed values read as
/// the canonical NaN.
pub fn unbox_f32(reg: u64) -> f32 {
    if reg >> 32 == 0xFFFF_FFFF {
        f32::from_bits(reg as u32)
    } else {
        f32::canonical_nan()
    }
}

/// Result of an overflowing operation under `rm`.
fn overflow<F: Float>(negative: bool, rm: RoundingMode) -> F {
    let (inf, max) = if negative {
        (F::INFINITY.neg(), F::MAX.neg())
    } else {
        (F::INFINITY, F::MAX)
    };
    match rm {
        RoundingMode::Rtz => max,
        RoundingMode::Rdn if !negative => max,
        RoundingMode::Rup if negative => max,
        _ => inf,
    }
}

/// Round the exact value `hi + lo` to `F` under `rm`.
///
/// `hi` must be the binary64 round-to-nearest of the exact value and `lo`
/// the remaining error (exact, or at least of the right sign).
pub fn round<F: Float>(hi: f64, lo: f64, rm: RoundingMode) -> (F, u32) {
    let r = F::from_f64(hi);
    if r.is_nan() || hi.is_infinite() {
        return (r, 0);
    }
    if r.is_infinite() {
        return (overflow(hi < 0.0, rm), fflags::OF | fflags::NX);
    }
    let d = hi - r.to_f64();
    let off = if d != 0.0 { d } else { lo };
    if off == 0.0 {
        return (r, 0);
    }
    let up = off > 0.0;
    let other = if up { r.next_up() } else { r.next_down() };
    let half = ((other.to_f64() - r.to_f64()) / 2.0).abs();
    let beyond = if d != 0.0 {
        match d.abs().partial_cmp(&half) {
            Some(Ordering::Equal) if lo == 0.0 => Ordering::Equal,
            Some(Ordering::Equal) if (lo > 0.0) == up => Ordering::Greater,
            Some(Ordering::Equal) => Ordering::Less,
            Some(o) => o,
            None => Ordering::Less,
        }
    } else {
        lo.abs().partial_cmp(&half).unwrap_or(Ordering::Less)
    };
    let larger = if other.to_f64().abs() > r.to_f64().abs() { other } else { r };
    let smaller = if other.to_f64().abs() > r.to_f64().abs() { r } else { other };
    let out = match rm {
        RoundingMode::Rtz => smaller,
        RoundingMode::Rdn => {
            if up {
                r
            } else {
                other
            }
        }
        RoundingMode::Rup => {
            if up {
                other
            } else {
                r
            }
        }
        RoundingMode::Rmm => match beyond {
            Ordering::Less => r,
            Ordering::Greater => other,
            Ordering::Equal => larger,
        },
        RoundingMode::Rne | RoundingMode::Dyn => match beyond {
            Ordering::Less => r,
            Ordering::Greater => other,
            Ordering::Equal if r.is_even() => r,
            Ordering::Equal => other,
        },
    };
    let flags = if out.is_infinite() {
        fflags::OF | fflags::NX
    } else {
        fflags::NX
    };
    (out, flags)
}

fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    if !s.is_finite() {
        return (s, 0.0);
    }
    let bb = s - a;
    (s, (a - (s - bb)) + (b - bb))
}

fn two_prod(a: f64, b: f64) -> (f64, f64) {
    let p = a * b;
    if !p.is_finite() {
        return (p, 0.0);
    }
    (p, a.mul_add(b, -p))
}

fn quotient(a: f64, b: f64) -> (f64, f64) {
    let q = a / b;
    if !q.is_finite() || b == 0.0 {
        return (q, 0.0);
    }
    let rem = (-q).mul_add(b, a);
    (q, rem / b)
}

fn signaling<F: Float>(values: &[F]) -> u32 {
    if values.iter().any(|v| v.is_signaling()) {
        fflags::NV
    } else {
        0
    }
}

/// Round `hi + lo`, treating NaN as an invalid operation and infinity as
/// overflow when every input was finite.
fn finish<F: Float>(hi: f64, lo: f64, rm: RoundingMode, finite_inputs: bool, flags: u32) -> (F, u32) {
    if hi.is_nan() {
        return (F::canonical_nan(), flags | fflags::NV);
    }
    if hi.is_infinite() {
        if finite_inputs && flags & fflags::DZ == 0 {
            return (overflow(hi < 0.0, rm), flags | fflags::OF | fflags::NX);
        }
        return (F::from_f64(hi), flags);
    }
    let (r, f) = round::<F>(hi, lo, rm);
    (r, flags | f)
}

/// Two-operand arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

pub fn binary<F: Float>(op: BinOp, a: F, b: F, rm: RoundingMode) -> (F, u32) {
    let mut flags = signaling(&[a, b]);
    if a.is_nan() || b.is_nan() {
        return (F::canonical_nan(), flags);
    }
    let (x, y) = (a.to_f64(), b.to_f64());
    let (mut hi, lo) = match op {
        BinOp::Add => two_sum(x, y),
        BinOp::Sub => two_sum(x, -y),
        BinOp::Mul => two_prod(x, y),
        BinOp::Div => {
            if y == 0.0 && x != 0.0 && x.is_finite() {
                flags |= fflags::DZ;
            }
            quotient(x, y)
        }
    };
    if matches!(op, BinOp::Add | BinOp::Sub) && hi == 0.0 && lo == 0.0 {
        let y = if op == BinOp::Sub { -y } else { y };
        // An exact zero sum of opposite signs is -0 only when rounding down.
        if x.is_sign_negative() != y.is_sign_negative() || x != 0.0 {
            hi = if rm == RoundingMode::Rdn { -0.0 } else { 0.0 };
        }
    }
    finish(hi, lo, rm, x.is_finite() && y.is_finite(), flags)
}

pub fn sqrt<F: Float>(a: F, rm: RoundingMode) -> (F, u32) {
    let flags = signaling(&[a]);
    if a.is_nan() {
        return (F::canonical_nan(), flags);
    }
    let x = a.to_f64();
    if x < 0.0 {
        return (F::canonical_nan(), flags | fflags::NV);
    }
    let s = x.sqrt();
    if s == 0.0 || s.is_infinite() {
        return (F::from_f64(s), flags);
    }
    let rem = (-s).mul_add(s, x);
    finish(s, rem / (2.0 * s), rm, true, flags)
}

/// `±(a * b) ± c` with a single rounding.
pub fn fused<F: Float>(a: F, b: F, c: F, negate_product: bool, negate_addend: bool, rm: RoundingMode) -> (F, u32) {
    let mut flags = signaling(&[a, b, c]);
    let zero_times_inf = (a.category() == FpCategory::Zero && b.is_infinite())
        || (b.category() == FpCategory::Zero && a.is_infinite());
    if zero_times_inf {
        flags |= fflags::NV;
    }
    if a.is_nan() || b.is_nan() || c.is_nan() || zero_times_inf {
        return (F::canonical_nan(), flags);
    }
    let (mut x, y, mut z) = (a.to_f64(), b.to_f64(), c.to_f64());
    if negate_product {
        x = -x;
    }
    if negate_addend {
        z = -z;
    }
    let (hi, lo) = if F::WIDE {
        two_sum(x * y, z)
    } else {
        (x.mul_add(y, z), 0.0)
    };
    finish(hi, lo, rm, x.is_finite() && y.is_finite() && z.is_finite(), flags)
}

/// `fmin`/`fmax`: a single NaN operand is ignored, `-0 < +0`.
pub fn min_max<F: Float>(a: F, b: F, max: bool) -> (F, u32) {
    let flags = signaling(&[a, b]);
    let out = match (a.is_nan(), b.is_nan()) {
        (true, true) => F::canonical_nan(),
        (true, false) => b,
        (false, true) => a,
        (false, false) => {
            let (x, y) = (a.to_f64(), b.to_f64());
            if x == y {
                let a_neg = x.is_sign_negative();
                if max == a_neg {
                    b
                } else {
                    a
                }
            } else if (x < y) != max {
                a
            } else {
                b
            }
        }
    };
    (out, flags)
}

/// Comparison predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compare {
    Eq,
    Lt,
    Le,
}

/// `feq` is quiet; `flt` and `fle` signal on any NaN. Unordered is false.
pub fn compare<F: Float>(cmp: Compare, a: F, b: F) -> (bool, u32) {
    let any_nan = a.is_nan() || b.is_nan();
    let flags = match cmp {
        Compare::Eq => signaling(&[a, b]),
        Compare::Lt | Compare::Le if any_nan => fflags::NV,
        _ => 0,
    };
    let (x, y) = (a.to_f64(), b.to_f64());
    let out = match cmp {
        Compare::Eq => x == y,
        Compare::Lt => x < y,
        Compare::Le => x <= y,
    };
    (out, flags)
}

/// `fclass` bit mask.
pub fn classify<F: Float>(a: F) -> u64 {
    let neg = a.is_sign_negative();
    let bit = match a.category() {
        FpCategory::Nan if a.is_signaling() => 8,
        FpCategory::Nan => 9,
        FpCategory::Infinite if neg => 0,
        FpCategory::Normal if neg => 1,
        FpCategory::Subnormal if neg => 2,
        FpCategory::Zero if neg => 3,
        FpCategory::Zero => 4,
        FpCategory::Subnormal => 5,
        FpCategory::Normal => 6,
        FpCategory::Infinite => 7,
    };
    1 << bit
}

/// Integer side of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntKind {
    /// Signed 32-bit.
    W,
    /// Unsigned 32-bit.
    Wu,
    /// Signed 64-bit.
    L,
    /// Unsigned 64-bit.
    Lu,
}

impl IntKind {
    fn bounds(self) -> (f64, f64) {
        match self {
            IntKind::W => (-2147483648.0, 2147483647.0),
            IntKind::Wu => (0.0, 4294967295.0),
            // 2^63 and 2^64 are the first values out of range.
            IntKind::L => (-9223372036854775808.0, 9223372036854775808.0),
            IntKind::Lu => (0.0, 18446744073709551616.0),
        }
    }

    fn saturate(self, high: bool) -> i128 {
        match (self, high) {
            (IntKind::W, false) => i32::MIN as i128,
            (IntKind::W, true) => i32::MAX as i128,
            (IntKind::Wu, false) | (IntKind::Lu, false) => 0,
            (IntKind::Wu, true) => u32::MAX as i128,
            (IntKind::L, false) => i64::MIN as i128,
            (IntKind::L, true) => i64::MAX as i128,
            (IntKind::Lu, true) => u64::MAX as i128,
        }
    }

    /// Register image of `v`: 32-bit results are sign-extended.
    fn to_register(self, v: i128) -> u64 {
        match self {
            IntKind::W | IntKind::Wu => v as u32 as i32 as i64 as u64,
            IntKind::L | IntKind::Lu => v as u64,
        }
    }

    fn from_register(self, reg: u64) -> i128 {
        match self {
            IntKind::W => reg as i32 as i128,
            IntKind::Wu => reg as u32 as i128,
            IntKind::L => reg as i64 as i128,
            IntKind::Lu => reg as i128,
        }
    }
}

fn round_integral(x: f64, rm: RoundingMode) -> f64 {
    match rm {
        RoundingMode::Rtz => x.trunc(),
        RoundingMode::Rdn => x.floor(),
        RoundingMode::Rup => x.ceil(),
        RoundingMode::Rmm => x.round(),
        RoundingMode::Rne | RoundingMode::Dyn => x.round_ties_even(),
    }
}

/// Float to integer, saturating. NaN converts to the largest value.
pub fn to_int<F: Float>(a: F, kind: IntKind, rm: RoundingMode) -> (u64, u32) {
    if a.is_nan() {
        return (kind.to_register(kind.saturate(true)), fflags::NV);
    }
    let x = a.to_f64();
    let r = round_integral(x, rm);
    let (lo, hi) = kind.bounds();
    let inexact = if r != x { fflags::NX } else { 0 };
    let high_exclusive = matches!(kind, IntKind::L | IntKind::Lu);
    if r < lo {
        return (kind.to_register(kind.saturate(false)), fflags::NV);
    }
    if r > hi || (high_exclusive && r >= hi) {
        return (kind.to_register(kind.saturate(true)), fflags::NV);
    }
    (kind.to_register(r as i128), inexact)
}

/// Integer register to float.
pub fn from_int<F: Float>(reg: u64, kind: IntKind, rm: RoundingMode) -> (F, u32) {
    let v = kind.from_register(reg);
    let hi = v as f64;
    let lo = (v - hi as i128) as f64;
    round::<F>(hi, lo, rm)
}

/// `fcvt.s.d`.
pub fn narrow(a: f64, rm: RoundingMode) -> (f32, u32) {
    if a.is_nan() {
        return (f32::canonical_nan(), signaling(&[a]));
    }
    round::<f32>(a, 0.0, rm)
}

/// `fcvt.d.s`.
pub fn widen(a: f32) -> (f64, u32) {
    if a.is_nan() {
        return (f64::canonical_nan(), signaling(&[a]));
    }
    (a as f64, 0)
}
